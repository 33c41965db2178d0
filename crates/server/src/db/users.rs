//! User store over `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use tripmate_core::{AccountType, Email, UserId};

use super::{RepositoryError, UserStore};
use crate::models::{NewUser, Profile, User, UserUpdate};

const USER_COLUMNS: &str = "id, account_type, accepted, username, email, password_hash, \
                            profile, wallet, loyalty_points, created_at, updated_at";

#[derive(FromRow)]
struct UserRow {
    id: UserId,
    account_type: String,
    accepted: bool,
    username: String,
    email: Option<String>,
    password_hash: String,
    profile: Json<Profile>,
    wallet: Decimal,
    loyalty_points: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let account_type: AccountType = r.account_type.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid account type in database: {e}"))
        })?;
        let email = r
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: r.id,
            account_type,
            accepted: r.accepted,
            username: r.username,
            email,
            password_hash: r.password_hash,
            profile: r.profile.0,
            wallet: r.wallet,
            loyalty_points: r.loyalty_points,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// `PostgreSQL` implementation of [`UserStore`].
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM tripmate.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO tripmate.user
                (id, account_type, accepted, username, email, password_hash, profile)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(UserId::generate())
        .bind(user.account_type.as_str())
        .bind(user.accepted)
        .bind(&user.username)
        .bind(user.email.as_ref().map(Email::as_str))
        .bind(&user.password_hash)
        .bind(Json(&user.profile))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "username or email"))?;

        row.try_into()
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_by_id(id).await
    }

    async fn get_by_login(&self, login: &str) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = if login.contains('@') {
            let Ok(email) = Email::parse(login) else {
                return Ok(None);
            };
            sqlx::query_as(&format!(
                "SELECT {USER_COLUMNS} FROM tripmate.user WHERE email = $1"
            ))
            .bind(email.as_str().to_owned())
            .fetch_optional(&self.pool)
            .await?
        } else {
            sqlx::query_as(&format!(
                "SELECT {USER_COLUMNS} FROM tripmate.user WHERE username = $1"
            ))
            .bind(login)
            .fetch_optional(&self.pool)
            .await?
        };

        row.map(User::try_from).transpose()
    }

    async fn list(&self, account_type: Option<AccountType>) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            r"
            SELECT {USER_COLUMNS} FROM tripmate.user
            WHERE $1::TEXT IS NULL OR account_type = $1
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(account_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn update(&self, id: UserId, update: UserUpdate) -> Result<User, RepositoryError> {
        // `profile || $n` merges only the keys present in the update.
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE tripmate.user
            SET email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                profile = profile || $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.email.as_ref().map(Email::as_str))
        .bind(update.password_hash.as_deref())
        .bind(Json(&update.profile))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email"))?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn set_accepted(&self, id: UserId, accepted: bool) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE tripmate.user SET accepted = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(accepted)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tripmate.user WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
