//! Activity store over `PostgreSQL`.
//!
//! Tags are stored as an id array and populated on every read.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use tripmate_core::{ActivityId, TagId, UserId};

use super::tags::tag_lookup;
use super::{ActivityStore, RepositoryError, like_pattern, populate_tags};
use crate::models::{Activity, ActivityFilter, ActivityInput, ActivityUpdate, Tag};

const ACTIVITY_COLUMNS: &str = "id, name, description, date, location, price, category, tags, \
                                special_discounts, booking_open, created_by, flagged, \
                                created_at, updated_at";

/// An activity as stored, with tag references unresolved.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ActivityRecord {
    pub id: ActivityId,
    pub name: String,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub tags: Vec<TagId>,
    pub special_discounts: Option<String>,
    pub booking_open: bool,
    pub created_by: UserId,
    pub flagged: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivityRecord {
    pub(crate) fn new(creator: UserId, input: ActivityInput) -> Self {
        let now = Utc::now();
        Self {
            id: ActivityId::generate(),
            name: input.name,
            description: input.description,
            date: input.date,
            location: input.location,
            price: input.price,
            category: input.category,
            tags: input.tags,
            special_discounts: input.special_discounts,
            booking_open: input.booking_open,
            created_by: creator,
            flagged: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply(&mut self, update: ActivityUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(date) = update.date {
            self.date = Some(date);
        }
        if let Some(location) = update.location {
            self.location = Some(location);
        }
        if let Some(price) = update.price {
            self.price = Some(price);
        }
        if let Some(category) = update.category {
            self.category = Some(category);
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(discounts) = update.special_discounts {
            self.special_discounts = Some(discounts);
        }
        if let Some(open) = update.booking_open {
            self.booking_open = open;
        }
        self.updated_at = Utc::now();
    }

    /// Whether the record passes `filter`.
    pub(crate) fn matches(&self, filter: &ActivityFilter) -> bool {
        (filter.include_flagged || !self.flagged)
            && super::name_matches(&self.name, filter.name.as_deref())
            && filter.category.as_deref().is_none_or(|c| {
                self.category
                    .as_deref()
                    .is_some_and(|own| own.eq_ignore_ascii_case(c))
            })
    }

    pub(crate) fn populate(self, tags: &HashMap<TagId, Tag>) -> Activity {
        Activity {
            tags: populate_tags(&self.tags, tags),
            id: self.id,
            name: self.name,
            description: self.description,
            date: self.date,
            location: self.location,
            price: self.price,
            category: self.category,
            special_discounts: self.special_discounts,
            booking_open: self.booking_open,
            created_by: self.created_by,
            flagged: self.flagged,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Populate the tags of `records` with one tag query.
async fn populate_all(
    pool: &PgPool,
    records: Vec<ActivityRecord>,
) -> Result<Vec<Activity>, RepositoryError> {
    let mut ids: Vec<TagId> = records.iter().flat_map(|r| r.tags.iter().copied()).collect();
    ids.sort_unstable();
    ids.dedup();

    let lookup = tag_lookup(pool, &ids).await?;
    Ok(records.into_iter().map(|r| r.populate(&lookup)).collect())
}

/// Fetch populated activities for `ids`, keyed by id. Used to populate
/// itinerary stops.
pub(crate) async fn activity_lookup(
    pool: &PgPool,
    ids: &[ActivityId],
) -> Result<HashMap<ActivityId, Activity>, RepositoryError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let records: Vec<ActivityRecord> = sqlx::query_as(&format!(
        "SELECT {ACTIVITY_COLUMNS} FROM tripmate.activity WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(populate_all(pool, records)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect())
}

/// `PostgreSQL` implementation of [`ActivityStore`].
#[derive(Clone)]
pub struct PgActivityStore {
    pool: PgPool,
}

impl PgActivityStore {
    /// Create a new activity store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_record(&self, id: ActivityId) -> Result<Option<ActivityRecord>, RepositoryError> {
        Ok(sqlx::query_as(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM tripmate.activity WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn populate_one(&self, record: ActivityRecord) -> Result<Activity, RepositoryError> {
        let lookup = tag_lookup(&self.pool, &record.tags).await?;
        Ok(record.populate(&lookup))
    }
}

#[async_trait]
impl ActivityStore for PgActivityStore {
    async fn list(&self, filter: &ActivityFilter) -> Result<Vec<Activity>, RepositoryError> {
        let records: Vec<ActivityRecord> = sqlx::query_as(&format!(
            r"
            SELECT {ACTIVITY_COLUMNS} FROM tripmate.activity
            WHERE ($1 OR NOT flagged)
              AND ($2::TEXT IS NULL OR name ILIKE $2)
              AND ($3::TEXT IS NULL OR LOWER(category) = LOWER($3))
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(filter.include_flagged)
        .bind(filter.name.as_deref().map(like_pattern))
        .bind(filter.category.as_deref())
        .fetch_all(&self.pool)
        .await?;

        populate_all(&self.pool, records).await
    }

    async fn list_by_creator(&self, creator: UserId) -> Result<Vec<Activity>, RepositoryError> {
        let records: Vec<ActivityRecord> = sqlx::query_as(&format!(
            r"
            SELECT {ACTIVITY_COLUMNS} FROM tripmate.activity
            WHERE created_by = $1
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(creator)
        .fetch_all(&self.pool)
        .await?;

        populate_all(&self.pool, records).await
    }

    async fn get(&self, id: ActivityId) -> Result<Option<Activity>, RepositoryError> {
        match self.fetch_record(id).await? {
            Some(record) => Ok(Some(self.populate_one(record).await?)),
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        creator: UserId,
        input: ActivityInput,
    ) -> Result<Activity, RepositoryError> {
        let record = ActivityRecord::new(creator, input);

        let saved: ActivityRecord = sqlx::query_as(&format!(
            r"
            INSERT INTO tripmate.activity
                (id, name, description, date, location, price, category, tags,
                 special_discounts, booking_open, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {ACTIVITY_COLUMNS}
            "
        ))
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(record.date)
        .bind(&record.location)
        .bind(record.price)
        .bind(&record.category)
        .bind(&record.tags)
        .bind(&record.special_discounts)
        .bind(record.booking_open)
        .bind(record.created_by)
        .fetch_one(&self.pool)
        .await?;

        self.populate_one(saved).await
    }

    async fn update(
        &self,
        id: ActivityId,
        update: ActivityUpdate,
    ) -> Result<Activity, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE tripmate.activity SET updated_at = NOW()");

        if let Some(name) = update.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(description) = update.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(date) = update.date {
            query.push(", date = ").push_bind(date);
        }
        if let Some(location) = update.location {
            query.push(", location = ").push_bind(location);
        }
        if let Some(price) = update.price {
            query.push(", price = ").push_bind(price);
        }
        if let Some(category) = update.category {
            query.push(", category = ").push_bind(category);
        }
        if let Some(tags) = update.tags {
            query.push(", tags = ").push_bind(tags);
        }
        if let Some(discounts) = update.special_discounts {
            query.push(", special_discounts = ").push_bind(discounts);
        }
        if let Some(open) = update.booking_open {
            query.push(", booking_open = ").push_bind(open);
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(ACTIVITY_COLUMNS);

        let record: Option<ActivityRecord> = query
            .build_query_as()
            .fetch_optional(&self.pool)
            .await?;

        self.populate_one(record.ok_or(RepositoryError::NotFound)?)
            .await
    }

    async fn delete(&self, id: ActivityId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tripmate.activity WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_flagged(
        &self,
        id: ActivityId,
        flagged: bool,
    ) -> Result<Activity, RepositoryError> {
        let record: Option<ActivityRecord> = sqlx::query_as(&format!(
            r"
            UPDATE tripmate.activity SET flagged = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ACTIVITY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(flagged)
        .fetch_optional(&self.pool)
        .await?;

        self.populate_one(record.ok_or(RepositoryError::NotFound)?)
            .await
    }
}
