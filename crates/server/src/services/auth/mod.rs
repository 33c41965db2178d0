//! Authentication service.
//!
//! Password registration and login for every account type.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use tracing::instrument;

use tripmate_core::{AccountType, Email};

use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, Profile, ProfileUpdate, User, UserUpdate};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length.
const MAX_USERNAME_LENGTH: usize = 64;

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
    pub account_type: AccountType,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Changes a user may make to their own account.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(flatten)]
    pub profile: ProfileUpdate,
}

/// Authentication service.
///
/// Handles user registration, login, and credential changes.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore) -> Self {
        Self { users }
    }

    /// Self-service registration.
    ///
    /// Tourists are accepted immediately; other roles wait for an admin.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RoleNotAllowed` for admin accounts.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username or email is taken.
    #[instrument(skip(self, registration), fields(username = %registration.username, account_type = %registration.account_type))]
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let account_type = registration.account_type;
        if account_type == AccountType::Admin {
            return Err(AuthError::RoleNotAllowed(account_type));
        }
        self.create(registration, account_type.accepted_on_registration())
            .await
    }

    /// Create an accepted account of any role, admins included.
    ///
    /// Used by operators bootstrapping the platform.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`], without the role restriction.
    #[instrument(skip(self, registration), fields(username = %registration.username, account_type = %registration.account_type))]
    pub async fn provision(&self, registration: Registration) -> Result<User, AuthError> {
        self.create(registration, true).await
    }

    async fn create(&self, registration: Registration, accepted: bool) -> Result<User, AuthError> {
        let username = validate_username(&registration.username)?;
        let email = registration.email.as_deref().map(Email::parse).transpose()?;
        validate_password(&registration.password)?;
        let password_hash = hash_password(&registration.password)?;

        let user = self
            .users
            .create(NewUser {
                account_type: registration.account_type,
                username,
                email,
                password_hash,
                accepted,
                profile: registration.profile,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(what) => AuthError::UserAlreadyExists(what),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, accepted, "User registered");
        Ok(user)
    }

    /// Login with a username or email and a password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the login/password is wrong.
    /// Returns `AuthError::NotAccepted` if an admin has not approved the account.
    #[instrument(skip(self, password))]
    pub async fn login(&self, login: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .get_by_login(login.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        if !user.accepted {
            return Err(AuthError::NotAccepted);
        }

        Ok(user)
    }

    /// Apply a user's changes to their own account.
    ///
    /// A new password is validated and re-hashed; the stored hash is only
    /// touched when one is supplied.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` for a new password that fails policy.
    /// Returns `AuthError::UserAlreadyExists` if the new email is taken.
    #[instrument(skip(self, user, update), fields(user_id = %user.id))]
    pub async fn update_account(
        &self,
        user: &User,
        update: AccountUpdate,
    ) -> Result<User, AuthError> {
        let email = update.email.as_deref().map(Email::parse).transpose()?;
        let password_hash = match update.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        self.users
            .update(
                user.id,
                UserUpdate {
                    email,
                    password_hash,
                    profile: update.profile,
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(what) => AuthError::UserAlreadyExists(what),
                other => AuthError::Repository(other),
            })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Trim and check a username.
fn validate_username(username: &str) -> Result<String, AuthError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("username is required".to_owned()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if username.contains('@') || username.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidUsername(
            "username cannot contain '@' or whitespace".to_owned(),
        ));
    }
    Ok(username.to_owned())
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AuthError::WeakPassword(
            "password must contain a number".to_owned(),
        ));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn registration(username: &str, account_type: AccountType) -> Registration {
        Registration {
            username: username.to_owned(),
            email: Some(format!("{username}@example.com")),
            password: "pyramids4ever".to_owned(),
            account_type,
            profile: Profile::default(),
        }
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("short1").is_err());
        assert!(validate_password("nodigitshere").is_err());
        assert!(validate_password("has1digit").is_ok());
    }

    #[test]
    fn test_hash_roundtrip() {
        let hash = hash_password("correct horse 1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse 1", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse 1", &hash),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_username_rules() {
        assert_eq!(validate_username("  salma ").unwrap(), "salma");
        assert!(validate_username("").is_err());
        assert!(validate_username("a@b").is_err());
        assert!(validate_username("two words").is_err());
    }

    #[tokio::test]
    async fn test_register_acceptance_by_role() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let tourist = auth
            .register(registration("omar", AccountType::Tourist))
            .await
            .unwrap();
        assert!(tourist.accepted);
        assert_ne!(tourist.password_hash, "pyramids4ever");

        let guide = auth
            .register(registration("hana", AccountType::TourGuide))
            .await
            .unwrap();
        assert!(!guide.accepted);

        let err = auth
            .register(registration("root", AccountType::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RoleNotAllowed(AccountType::Admin)));

        let admin = auth
            .provision(registration("root", AccountType::Admin))
            .await
            .unwrap();
        assert!(admin.accepted);
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register(registration("omar", AccountType::Tourist))
            .await
            .unwrap();

        let mut again = registration("omar", AccountType::Seller);
        again.email = None;
        let err = auth.register(again).await.unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register(registration("omar", AccountType::Tourist))
            .await
            .unwrap();

        assert!(auth.login("omar", "pyramids4ever").await.is_ok());
        assert!(auth.login("OMAR@example.com", "pyramids4ever").await.is_ok());
        assert!(matches!(
            auth.login("omar", "wrong-pass1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "pyramids4ever").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_waits_for_acceptance() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register(registration("karim", AccountType::Seller))
            .await
            .unwrap();

        assert!(matches!(
            auth.login("karim", "pyramids4ever").await,
            Err(AuthError::NotAccepted)
        ));
    }

    #[tokio::test]
    async fn test_password_change_rehashes() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let user = auth
            .register(registration("omar", AccountType::Tourist))
            .await
            .unwrap();

        let weak = AccountUpdate {
            password: Some("weak".to_owned()),
            ..AccountUpdate::default()
        };
        assert!(matches!(
            auth.update_account(&user, weak).await,
            Err(AuthError::WeakPassword(_))
        ));

        let renamed = auth
            .update_account(
                &user,
                AccountUpdate {
                    profile: ProfileUpdate {
                        name: Some("Omar".to_owned()),
                        ..ProfileUpdate::default()
                    },
                    ..AccountUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.password_hash, user.password_hash);

        auth.update_account(
            &user,
            AccountUpdate {
                password: Some("sphinx2024!".to_owned()),
                ..AccountUpdate::default()
            },
        )
        .await
        .unwrap();
        assert!(auth.login("omar", "sphinx2024!").await.is_ok());
        assert!(auth.login("omar", "pyramids4ever").await.is_err());
    }
}
