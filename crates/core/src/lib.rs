//! Tripmate Core - Shared domain types.
//!
//! This crate provides the types shared by every Tripmate component:
//! - `server` - REST API for tourists, sellers, guides, governors and admins
//! - `cli` - Command-line tools for migrations, user bootstrap and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and parsing rules - no I/O, no database
//! access, no HTTP clients. Postgres encoding is available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Document identifiers, currency codes, emails and account roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
