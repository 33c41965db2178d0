//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use tripmate_core::{AccountType, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user and
/// gate routes by role without a database round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Role at login time.
    pub account_type: AccountType,
}

impl CurrentUser {
    /// Whether the user holds one of `roles`.
    #[must_use]
    pub fn has_role(&self, roles: &[AccountType]) -> bool {
        roles.contains(&self.account_type)
    }

    /// Whether the user is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.account_type == AccountType::Admin
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
