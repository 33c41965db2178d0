//! Product store over `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use tripmate_core::{ProductId, UserId};

use super::{ProductStore, RepositoryError, like_pattern};
use crate::models::{Product, ProductFilter, ProductInput, ProductUpdate, Review};

const PRODUCT_COLUMNS: &str = "id, name, description, picture, price, available_quantity, \
                               seller_id, reviews, average_rating, archived, created_at, updated_at";

#[derive(FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    picture: Option<String>,
    price: Option<Decimal>,
    available_quantity: Option<i32>,
    seller_id: UserId,
    reviews: Json<Vec<Review>>,
    average_rating: Option<Decimal>,
    archived: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let available_quantity = r
            .available_quantity
            .map(u32::try_from)
            .transpose()
            .map_err(|_| {
                RepositoryError::DataCorruption(format!("negative stock for product {}", r.id))
            })?;

        Ok(Self {
            id: r.id,
            name: r.name,
            description: r.description,
            picture: r.picture,
            price: r.price,
            available_quantity,
            seller_id: r.seller_id,
            reviews: r.reviews.0,
            average_rating: r.average_rating,
            archived: r.archived,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn stock_to_db(quantity: Option<u32>) -> Result<Option<i32>, RepositoryError> {
    quantity
        .map(i32::try_from)
        .transpose()
        .map_err(|_| RepositoryError::Conflict("available quantity out of range".to_owned()))
}

/// `PostgreSQL` implementation of [`ProductStore`].
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    /// Create a new product store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM tripmate.product
            WHERE ($1::TEXT IS NULL OR name ILIKE $1)
              AND ($2::TEXT IS NULL OR seller_id = $2)
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(filter.name.as_deref().map(like_pattern))
        .bind(filter.seller)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM tripmate.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM tripmate.product WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn create(
        &self,
        seller: UserId,
        input: ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row: ProductRow = sqlx::query_as(&format!(
            r"
            INSERT INTO tripmate.product
                (id, name, description, picture, price, available_quantity, seller_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(ProductId::generate())
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.picture)
        .bind(input.price)
        .bind(stock_to_db(input.available_quantity)?)
        .bind(seller)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE tripmate.product SET updated_at = NOW()");

        if let Some(name) = update.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(description) = update.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(picture) = update.picture {
            query.push(", picture = ").push_bind(picture);
        }
        if let Some(price) = update.price {
            query.push(", price = ").push_bind(price);
        }
        if let Some(quantity) = stock_to_db(update.available_quantity)? {
            query.push(", available_quantity = ").push_bind(quantity);
        }
        if let Some(archived) = update.archived {
            query.push(", archived = ").push_bind(archived);
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(PRODUCT_COLUMNS);

        let row: Option<ProductRow> = query
            .build_query_as()
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tripmate.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn add_review(&self, id: ProductId, review: Review) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(Json<Vec<Review>>,)> =
            sqlx::query_as("SELECT reviews FROM tripmate.product WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((Json(mut reviews),)) = current else {
            return Err(RepositoryError::NotFound);
        };

        reviews.push(review);
        let average = Product::rating_average(&reviews);

        let row: ProductRow = sqlx::query_as(&format!(
            r"
            UPDATE tripmate.product
            SET reviews = $2, average_rating = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(Json(&reviews))
        .bind(average)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }
}
