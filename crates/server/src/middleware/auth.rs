//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in user in route handlers, and
//! role checks on top of them.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use tripmate_core::{AccountType, UserId};

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires an authenticated user.
///
/// Rejects with 401 when nobody is logged in.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = || AppError::Unauthorized("Login required".to_string());

        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().ok_or_else(unauthorized)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(unauthorized)?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

impl CurrentUser {
    /// Reject with 403 unless the user holds one of `roles`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` when the role does not match.
    pub fn require_role(&self, roles: &[AccountType]) -> Result<(), AppError> {
        if self.has_role(roles) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "{} accounts cannot perform this action",
                self.account_type
            )))
        }
    }

    /// Reject with 403 unless the user created the resource or is an admin.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` for anyone else.
    pub fn require_owner(&self, owner: UserId) -> Result<(), AppError> {
        if self.id == owner || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only the creator can change this resource".to_string(),
            ))
        }
    }

    /// Whether the user may see hidden resources owned by `owner`.
    #[must_use]
    pub fn can_see_hidden(&self, owner: UserId) -> bool {
        self.id == owner || self.is_admin()
    }
}

/// Helper to set the current user in the session.
///
/// Cycles the session ID first so a pre-login session cannot be fixated.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(account_type: AccountType) -> CurrentUser {
        CurrentUser {
            id: UserId::generate(),
            username: "mona".to_string(),
            account_type,
        }
    }

    #[test]
    fn test_require_role() {
        let seller = user(AccountType::Seller);
        assert!(
            seller
                .require_role(&[AccountType::Seller, AccountType::Admin])
                .is_ok()
        );
        assert!(matches!(
            seller.require_role(&[AccountType::Tourist]),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_require_owner() {
        let guide = user(AccountType::TourGuide);
        assert!(guide.require_owner(guide.id).is_ok());
        assert!(guide.require_owner(UserId::generate()).is_err());

        let admin = user(AccountType::Admin);
        assert!(admin.require_owner(guide.id).is_ok());
        assert!(admin.can_see_hidden(guide.id));
        assert!(!guide.can_see_hidden(admin.id));
    }
}
