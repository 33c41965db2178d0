//! Authentication error types.

use thiserror::Error;

use tripmate_core::AccountType;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] tripmate_core::EmailError),

    /// Username empty or malformed.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but has not been accepted by an admin yet.
    #[error("account is pending approval")]
    NotAccepted,

    /// Username or email already taken.
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),

    /// The role cannot be chosen at registration.
    #[error("{0} accounts cannot be self-registered")]
    RoleNotAllowed(AccountType),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
