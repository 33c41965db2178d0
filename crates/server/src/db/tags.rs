//! Tag store over `PostgreSQL`, plus tag lookups used for population.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use tripmate_core::{TagId, TagKind};

use super::{RepositoryError, TagStore};
use crate::models::{Tag, TagInput};

#[derive(FromRow)]
struct TagRow {
    id: TagId,
    name: String,
    kind: String,
}

impl TryFrom<TagRow> for Tag {
    type Error = RepositoryError;

    fn try_from(r: TagRow) -> Result<Self, Self::Error> {
        let kind: TagKind = r.kind.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid tag kind in database: {e}"))
        })?;
        Ok(Self {
            id: r.id,
            name: r.name,
            kind,
        })
    }
}

/// Fetch the tags for `ids`, keyed by id.
pub(crate) async fn tag_lookup(
    pool: &PgPool,
    ids: &[TagId],
) -> Result<HashMap<TagId, Tag>, RepositoryError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<TagRow> =
        sqlx::query_as("SELECT id, name, kind FROM tripmate.tag WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;

    rows.into_iter()
        .map(|r| Tag::try_from(r).map(|t| (t.id, t)))
        .collect()
}

/// `PostgreSQL` implementation of [`TagStore`].
#[derive(Clone)]
pub struct PgTagStore {
    pool: PgPool,
}

impl PgTagStore {
    /// Create a new tag store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagStore for PgTagStore {
    async fn list(&self) -> Result<Vec<Tag>, RepositoryError> {
        let rows: Vec<TagRow> =
            sqlx::query_as("SELECT id, name, kind FROM tripmate.tag ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Tag::try_from).collect()
    }

    async fn get_many(&self, ids: &[TagId]) -> Result<Vec<Tag>, RepositoryError> {
        let lookup = tag_lookup(&self.pool, ids).await?;
        Ok(super::populate_tags(ids, &lookup))
    }

    async fn create(&self, input: TagInput) -> Result<Tag, RepositoryError> {
        let row: TagRow = sqlx::query_as(
            r"
            INSERT INTO tripmate.tag (id, name, kind)
            VALUES ($1, $2, $3)
            RETURNING id, name, kind
            ",
        )
        .bind(TagId::generate())
        .bind(input.name.trim())
        .bind(input.kind.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "tag"))?;

        row.try_into()
    }

    async fn delete(&self, id: TagId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tripmate.tag WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
