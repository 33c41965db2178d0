//! Persistence for the Tripmate API.
//!
//! Every entity is reached through an object-safe store trait so handlers
//! and services never see the backend. Two backends implement all of them:
//!
//! - `Pg*Store` types over `PostgreSQL` (schema `tripmate`)
//! - [`MemoryStore`], an in-process store used by `STORE_BACKEND=memory`
//!   and by tests
//!
//! ## Tables
//!
//! - `user` - Accounts, role, approval flag, profile (JSONB)
//! - `product` - Seller catalogue, reviews (JSONB)
//! - `cart_item` - One row per (user, product) with an insertion position
//! - `museum` - Historical places with ticket prices
//! - `activity` - Advertiser activities, tag ids as `TEXT[]`
//! - `itinerary` - Guide itineraries, activity stops as JSONB
//! - `tag` - Preference and historical tags
//! - `session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p tripmate-cli -- migrate
//! ```

pub mod activities;
pub mod carts;
pub mod itineraries;
pub mod memory;
pub mod museums;
pub mod products;
pub mod tags;
pub mod users;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use tripmate_core::{
    AccountType, ActivityId, ItineraryId, MuseumId, ProductId, TagId, UserId,
};

use crate::models::{
    Activity, ActivityFilter, ActivityInput, ActivityUpdate, Cart, CartLine, Itinerary,
    ItineraryFilter, ItineraryInput, ItineraryUpdate, Museum, MuseumInput, MuseumUpdate, NewUser,
    Product, ProductFilter, ProductInput, ProductUpdate, Review, Tag, TagInput, User, UserUpdate,
};

pub use activities::PgActivityStore;
pub use carts::PgCartStore;
pub use itineraries::PgItineraryStore;
pub use memory::MemoryStore;
pub use museums::PgMuseumStore;
pub use products::PgProductStore;
pub use tags::PgTagStore;
pub use users::PgUserStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_insert(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Duplicate username or email is a `Conflict`.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up by username, or by email when `login` contains `@`.
    async fn get_by_login(&self, login: &str) -> Result<Option<User>, RepositoryError>;

    async fn list(&self, account_type: Option<AccountType>) -> Result<Vec<User>, RepositoryError>;

    async fn update(&self, id: UserId, update: UserUpdate) -> Result<User, RepositoryError>;

    async fn set_accepted(&self, id: UserId, accepted: bool) -> Result<User, RepositoryError>;

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError>;
}

/// Seller products.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Fetch several products at once. Missing ids are skipped.
    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    async fn create(&self, seller: UserId, input: ProductInput)
    -> Result<Product, RepositoryError>;

    async fn update(&self, id: ProductId, update: ProductUpdate)
    -> Result<Product, RepositoryError>;

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError>;

    /// Append a review and recompute the average rating.
    async fn add_review(&self, id: ProductId, review: Review) -> Result<Product, RepositoryError>;
}

/// Per-user carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's cart, or `None` if the user does not exist.
    async fn get_cart(&self, user: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Insert or replace the line for `line.product`. A new line goes last.
    async fn put_line(&self, user: UserId, line: CartLine) -> Result<(), RepositoryError>;

    /// Remove the line for `product`. Returns whether a line was removed.
    async fn remove_line(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError>;
}

/// Museums and historical places.
#[async_trait]
pub trait MuseumStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Museum>, RepositoryError>;

    async fn list_by_creator(&self, creator: UserId) -> Result<Vec<Museum>, RepositoryError>;

    /// Museums carrying any of `tags`.
    async fn list_by_tags(&self, tags: &[TagId]) -> Result<Vec<Museum>, RepositoryError>;

    async fn get(&self, id: MuseumId) -> Result<Option<Museum>, RepositoryError>;

    async fn create(&self, creator: UserId, input: MuseumInput)
    -> Result<Museum, RepositoryError>;

    async fn update(&self, id: MuseumId, update: MuseumUpdate) -> Result<Museum, RepositoryError>;

    async fn delete(&self, id: MuseumId) -> Result<(), RepositoryError>;
}

/// Advertiser activities. Reads populate tags.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn list(&self, filter: &ActivityFilter) -> Result<Vec<Activity>, RepositoryError>;

    async fn list_by_creator(&self, creator: UserId) -> Result<Vec<Activity>, RepositoryError>;

    async fn get(&self, id: ActivityId) -> Result<Option<Activity>, RepositoryError>;

    async fn create(
        &self,
        creator: UserId,
        input: ActivityInput,
    ) -> Result<Activity, RepositoryError>;

    async fn update(
        &self,
        id: ActivityId,
        update: ActivityUpdate,
    ) -> Result<Activity, RepositoryError>;

    async fn delete(&self, id: ActivityId) -> Result<(), RepositoryError>;

    async fn set_flagged(&self, id: ActivityId, flagged: bool)
    -> Result<Activity, RepositoryError>;
}

/// Guide itineraries. Reads populate tags and stop activities.
#[async_trait]
pub trait ItineraryStore: Send + Sync {
    async fn list(&self, filter: &ItineraryFilter) -> Result<Vec<Itinerary>, RepositoryError>;

    async fn list_by_creator(&self, creator: UserId) -> Result<Vec<Itinerary>, RepositoryError>;

    async fn get(&self, id: ItineraryId) -> Result<Option<Itinerary>, RepositoryError>;

    async fn create(
        &self,
        creator: UserId,
        input: ItineraryInput,
    ) -> Result<Itinerary, RepositoryError>;

    async fn update(
        &self,
        id: ItineraryId,
        update: ItineraryUpdate,
    ) -> Result<Itinerary, RepositoryError>;

    async fn delete(&self, id: ItineraryId) -> Result<(), RepositoryError>;

    async fn set_flagged(
        &self,
        id: ItineraryId,
        flagged: bool,
    ) -> Result<Itinerary, RepositoryError>;

    async fn set_active(&self, id: ItineraryId, active: bool)
    -> Result<Itinerary, RepositoryError>;
}

/// Tags.
#[async_trait]
pub trait TagStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Tag>, RepositoryError>;

    async fn get_many(&self, ids: &[TagId]) -> Result<Vec<Tag>, RepositoryError>;

    /// Insert a tag. A duplicate name is a `Conflict`.
    async fn create(&self, input: TagInput) -> Result<Tag, RepositoryError>;

    async fn delete(&self, id: TagId) -> Result<(), RepositoryError>;
}

#[derive(Clone)]
enum Backend {
    Postgres(PgPool),
    Memory,
}

/// All stores, shared by handlers through `AppState`.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub carts: Arc<dyn CartStore>,
    pub museums: Arc<dyn MuseumStore>,
    pub activities: Arc<dyn ActivityStore>,
    pub itineraries: Arc<dyn ItineraryStore>,
    pub tags: Arc<dyn TagStore>,
    backend: Backend,
}

impl Stores {
    /// Stores backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            products: Arc::new(PgProductStore::new(pool.clone())),
            carts: Arc::new(PgCartStore::new(pool.clone())),
            museums: Arc::new(PgMuseumStore::new(pool.clone())),
            activities: Arc::new(PgActivityStore::new(pool.clone())),
            itineraries: Arc::new(PgItineraryStore::new(pool.clone())),
            tags: Arc::new(PgTagStore::new(pool.clone())),
            backend: Backend::Postgres(pool),
        }
    }

    /// Stores sharing one in-process [`MemoryStore`].
    #[must_use]
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            products: store.clone(),
            carts: store.clone(),
            museums: store.clone(),
            activities: store.clone(),
            itineraries: store.clone(),
            tags: store,
            backend: Backend::Memory,
        }
    }

    /// The connection pool, when backed by `PostgreSQL`.
    #[must_use]
    pub const fn pool(&self) -> Option<&PgPool> {
        match &self.backend {
            Backend::Postgres(pool) => Some(pool),
            Backend::Memory => None,
        }
    }

    /// Check the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match &self.backend {
            Backend::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            Backend::Memory => Ok(()),
        }
    }
}

/// Replace tag ids with their tags, dropping ids that no longer resolve.
pub(crate) fn populate_tags(ids: &[TagId], lookup: &HashMap<TagId, Tag>) -> Vec<Tag> {
    ids.iter().filter_map(|id| lookup.get(id).cloned()).collect()
}

/// Case-insensitive substring match used by name filters.
pub(crate) fn name_matches(name: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|n| name.to_lowercase().contains(&n.to_lowercase()))
}

/// Escape `%`, `_` and `\` for an `ILIKE` pattern.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("nile"), "%nile%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_name_matches() {
        assert!(name_matches("Khan el-Khalili", Some("KHAN")));
        assert!(name_matches("anything", None));
        assert!(!name_matches("Giza", Some("luxor")));
    }

    #[test]
    fn test_populate_tags_drops_dangling() {
        let tag = Tag {
            id: TagId::generate(),
            name: "history".to_string(),
            kind: tripmate_core::TagKind::Historical,
        };
        let lookup = HashMap::from([(tag.id, tag.clone())]);
        assert_eq!(
            populate_tags(&[TagId::generate(), tag.id], &lookup),
            vec![tag]
        );
    }
}
