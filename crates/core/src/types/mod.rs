//! Core types for Tripmate.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod account;
pub mod currency;
pub mod email;
pub mod id;

pub use account::{AccountType, LabelError, TagKind};
pub use currency::{CurrencyCode, CurrencyError, round_money};
pub use email::{Email, EmailError};
pub use id::*;
