//! Cart store over `PostgreSQL`.
//!
//! Each cart line is a `cart_item` row keyed by `(user_id, product_id)`,
//! which keeps one line per product. `position` preserves insertion order.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use tripmate_core::{ProductId, UserId};

use super::{CartStore, RepositoryError};
use crate::models::{Cart, CartLine};

#[derive(FromRow)]
struct CartItemRow {
    product_id: ProductId,
    quantity: i32,
}

/// `PostgreSQL` implementation of [`CartStore`].
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Create a new cart store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lines of one cart in insertion order.
///
/// Concurrent first adds can share a `position`; `product_id` breaks the tie.
const SELECT_LINES: &str = r"
    SELECT product_id, quantity FROM tripmate.cart_item
    WHERE user_id = $1
    ORDER BY position ASC, product_id ASC
";

#[async_trait]
impl CartStore for PgCartStore {
    async fn get_cart(&self, user: UserId) -> Result<Option<Cart>, RepositoryError> {
        let exists: Option<(UserId,)> = sqlx::query_as("SELECT id FROM tripmate.user WHERE id = $1")
            .bind(user)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let rows: Vec<CartItemRow> = sqlx::query_as(SELECT_LINES)
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        let lines = rows
            .into_iter()
            .map(|r| {
                let quantity = u32::try_from(r.quantity).map_err(|_| {
                    RepositoryError::DataCorruption(format!(
                        "negative cart quantity for product {}",
                        r.product_id
                    ))
                })?;
                Ok(CartLine {
                    product: r.product_id,
                    quantity,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Some(Cart::from(lines)))
    }

    async fn put_line(&self, user: UserId, line: CartLine) -> Result<(), RepositoryError> {
        let quantity = i32::try_from(line.quantity)
            .map_err(|_| RepositoryError::Conflict("cart quantity out of range".to_owned()))?;

        sqlx::query(
            r"
            INSERT INTO tripmate.cart_item (user_id, product_id, quantity, position)
            VALUES (
                $1, $2, $3,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM tripmate.cart_item WHERE user_id = $1)
            )
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
            ",
        )
        .bind(user)
        .bind(line.product)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => RepositoryError::Database(other),
        })?;

        Ok(())
    }

    async fn remove_line(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM tripmate.cart_item WHERE user_id = $1 AND product_id = $2")
                .bind(user)
                .bind(product)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
