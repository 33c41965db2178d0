//! Museum store over `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use tripmate_core::{MuseumId, TagId, UserId};

use super::{MuseumStore, RepositoryError};
use crate::models::{Museum, MuseumInput, MuseumUpdate, TicketPrices};

const MUSEUM_COLUMNS: &str = "id, name, description, location, opening_hours, pictures, \
                              price_foreigner, price_native, price_student, tags, created_by, \
                              created_at, updated_at";

#[derive(FromRow)]
struct MuseumRow {
    id: MuseumId,
    name: String,
    description: Option<String>,
    location: Option<String>,
    opening_hours: Option<String>,
    pictures: Vec<String>,
    price_foreigner: Option<Decimal>,
    price_native: Option<Decimal>,
    price_student: Option<Decimal>,
    tags: Vec<TagId>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MuseumRow> for Museum {
    fn from(r: MuseumRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            location: r.location,
            opening_hours: r.opening_hours,
            pictures: r.pictures,
            ticket_prices: TicketPrices {
                foreigner: r.price_foreigner,
                native: r.price_native,
                student: r.price_student,
            },
            tags: r.tags,
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// `PostgreSQL` implementation of [`MuseumStore`].
#[derive(Clone)]
pub struct PgMuseumStore {
    pool: PgPool,
}

impl PgMuseumStore {
    /// Create a new museum store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MuseumStore for PgMuseumStore {
    async fn list(&self) -> Result<Vec<Museum>, RepositoryError> {
        let rows: Vec<MuseumRow> = sqlx::query_as(&format!(
            "SELECT {MUSEUM_COLUMNS} FROM tripmate.museum ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Museum::from).collect())
    }

    async fn list_by_creator(&self, creator: UserId) -> Result<Vec<Museum>, RepositoryError> {
        let rows: Vec<MuseumRow> = sqlx::query_as(&format!(
            r"
            SELECT {MUSEUM_COLUMNS} FROM tripmate.museum
            WHERE created_by = $1
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(creator)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Museum::from).collect())
    }

    async fn list_by_tags(&self, tags: &[TagId]) -> Result<Vec<Museum>, RepositoryError> {
        let rows: Vec<MuseumRow> = sqlx::query_as(&format!(
            r"
            SELECT {MUSEUM_COLUMNS} FROM tripmate.museum
            WHERE tags && $1
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(tags)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Museum::from).collect())
    }

    async fn get(&self, id: MuseumId) -> Result<Option<Museum>, RepositoryError> {
        let row: Option<MuseumRow> = sqlx::query_as(&format!(
            "SELECT {MUSEUM_COLUMNS} FROM tripmate.museum WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Museum::from))
    }

    async fn create(
        &self,
        creator: UserId,
        input: MuseumInput,
    ) -> Result<Museum, RepositoryError> {
        let row: MuseumRow = sqlx::query_as(&format!(
            r"
            INSERT INTO tripmate.museum
                (id, name, description, location, opening_hours, pictures,
                 price_foreigner, price_native, price_student, tags, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {MUSEUM_COLUMNS}
            "
        ))
        .bind(MuseumId::generate())
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.location)
        .bind(&input.opening_hours)
        .bind(&input.pictures)
        .bind(input.ticket_prices.foreigner)
        .bind(input.ticket_prices.native)
        .bind(input.ticket_prices.student)
        .bind(&input.tags)
        .bind(creator)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update(&self, id: MuseumId, update: MuseumUpdate) -> Result<Museum, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE tripmate.museum SET updated_at = NOW()");

        if let Some(name) = update.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(description) = update.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(location) = update.location {
            query.push(", location = ").push_bind(location);
        }
        if let Some(hours) = update.opening_hours {
            query.push(", opening_hours = ").push_bind(hours);
        }
        if let Some(pictures) = update.pictures {
            query.push(", pictures = ").push_bind(pictures);
        }
        if let Some(prices) = update.ticket_prices {
            query
                .push(", price_foreigner = ")
                .push_bind(prices.foreigner)
                .push(", price_native = ")
                .push_bind(prices.native)
                .push(", price_student = ")
                .push_bind(prices.student);
        }
        if let Some(tags) = update.tags {
            query.push(", tags = ").push_bind(tags);
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(MUSEUM_COLUMNS);

        let row: Option<MuseumRow> = query
            .build_query_as()
            .fetch_optional(&self.pool)
            .await?;

        row.map(Museum::from).ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: MuseumId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tripmate.museum WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
