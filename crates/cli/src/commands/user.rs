//! User bootstrap commands.
//!
//! # Usage
//!
//! ```bash
//! # Create the first admin
//! tm-cli user create -u admin -p 'S3cure-pass' -t Admin -e admin@example.com
//! ```

use thiserror::Error;

use tripmate_core::AccountType;
use tripmate_server::db::PgUserStore;
use tripmate_server::models::Profile;
use tripmate_server::services::auth::{AuthError, AuthService, Registration};

use super::{CommandError, connect};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    /// Invalid account type.
    #[error("Invalid account type: {0}. Valid types: Tourist, Advertiser, Seller, TourGuide, TourismGovernor, Admin")]
    InvalidAccountType(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create an accepted user of any account type.
///
/// # Errors
///
/// Returns an error if the account type is unknown, the password fails
/// policy, or the username or email is taken.
pub async fn create(
    username: &str,
    password: &str,
    account_type: &str,
    email: Option<String>,
) -> Result<(), UserError> {
    let account_type: AccountType = account_type
        .parse()
        .map_err(|_| UserError::InvalidAccountType(account_type.to_owned()))?;

    let pool = connect().await?;
    let users = PgUserStore::new(pool);

    tracing::info!("Creating user: {} ({})", username, account_type);
    let user = AuthService::new(&users)
        .provision(Registration {
            username: username.to_owned(),
            email,
            password: password.to_owned(),
            account_type,
            profile: Profile::default(),
        })
        .await?;

    tracing::info!(user_id = %user.id, "User created");
    Ok(())
}
