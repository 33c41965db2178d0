//! Itinerary store over `PostgreSQL`.
//!
//! Stops are stored as a JSONB array of `{activity, duration}`. Reads
//! populate both tags and stop activities.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use tripmate_core::{ActivityId, ItineraryId, TagId, UserId};

use super::activities::activity_lookup;
use super::tags::tag_lookup;
use super::{ItineraryStore, RepositoryError, like_pattern, populate_tags};
use crate::models::{
    Activity, Itinerary, ItineraryFilter, ItineraryInput, ItineraryStop, ItineraryUpdate,
    StopRef, Tag,
};

const ITINERARY_COLUMNS: &str = "id, name, category, tags, activities, locations, timeline, \
                                 language, price, available_dates, accessibility, pick_up, \
                                 drop_off, created_by, flagged, active, created_at, updated_at";

/// An itinerary as stored, with tag and activity references unresolved.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ItineraryRecord {
    pub id: ItineraryId,
    pub name: String,
    pub category: Option<String>,
    pub tags: Vec<TagId>,
    pub activities: Json<Vec<StopRef>>,
    pub locations: Vec<String>,
    pub timeline: Option<String>,
    pub language: Option<String>,
    pub price: Option<Decimal>,
    pub available_dates: Vec<NaiveDate>,
    pub accessibility: Option<String>,
    pub pick_up: Option<String>,
    pub drop_off: Option<String>,
    pub created_by: UserId,
    pub flagged: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItineraryRecord {
    pub(crate) fn new(creator: UserId, input: ItineraryInput) -> Self {
        let now = Utc::now();
        Self {
            id: ItineraryId::generate(),
            name: input.name,
            category: input.category,
            tags: input.tags,
            activities: Json(input.activities),
            locations: input.locations,
            timeline: input.timeline,
            language: input.language,
            price: input.price,
            available_dates: input.available_dates,
            accessibility: input.accessibility,
            pick_up: input.pick_up,
            drop_off: input.drop_off,
            created_by: creator,
            flagged: false,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply(&mut self, update: ItineraryUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(category) = update.category {
            self.category = Some(category);
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(stops) = update.activities {
            self.activities = Json(stops);
        }
        if let Some(locations) = update.locations {
            self.locations = locations;
        }
        if let Some(timeline) = update.timeline {
            self.timeline = Some(timeline);
        }
        if let Some(language) = update.language {
            self.language = Some(language);
        }
        if let Some(price) = update.price {
            self.price = Some(price);
        }
        if let Some(dates) = update.available_dates {
            self.available_dates = dates;
        }
        if let Some(accessibility) = update.accessibility {
            self.accessibility = Some(accessibility);
        }
        if let Some(pick_up) = update.pick_up {
            self.pick_up = Some(pick_up);
        }
        if let Some(drop_off) = update.drop_off {
            self.drop_off = Some(drop_off);
        }
        self.updated_at = Utc::now();
    }

    /// Whether the record passes `filter`.
    pub(crate) fn matches(&self, filter: &ItineraryFilter) -> bool {
        (filter.include_hidden || (self.active && !self.flagged))
            && super::name_matches(&self.name, filter.name.as_deref())
            && filter.language.as_deref().is_none_or(|l| {
                self.language
                    .as_deref()
                    .is_some_and(|own| own.eq_ignore_ascii_case(l))
            })
            && filter
                .max_price
                .is_none_or(|max| self.price.is_some_and(|p| p <= max))
            && filter.tag.is_none_or(|t| self.tags.contains(&t))
            && filter
                .date
                .is_none_or(|d| self.available_dates.contains(&d))
    }

    pub(crate) fn activity_ids(&self) -> impl Iterator<Item = ActivityId> + '_ {
        self.activities.0.iter().map(|s| s.activity)
    }

    pub(crate) fn populate(
        self,
        tags: &HashMap<TagId, Tag>,
        activities: &HashMap<ActivityId, Activity>,
    ) -> Itinerary {
        Itinerary {
            tags: populate_tags(&self.tags, tags),
            activities: self
                .activities
                .0
                .into_iter()
                .map(|stop| ItineraryStop {
                    activity_id: stop.activity,
                    activity: activities.get(&stop.activity).cloned(),
                    duration: stop.duration,
                })
                .collect(),
            id: self.id,
            name: self.name,
            category: self.category,
            locations: self.locations,
            timeline: self.timeline,
            language: self.language,
            price: self.price,
            available_dates: self.available_dates,
            accessibility: self.accessibility,
            pick_up: self.pick_up,
            drop_off: self.drop_off,
            created_by: self.created_by,
            flagged: self.flagged,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// `PostgreSQL` implementation of [`ItineraryStore`].
#[derive(Clone)]
pub struct PgItineraryStore {
    pool: PgPool,
}

impl PgItineraryStore {
    /// Create a new itinerary store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn populate_all(
        &self,
        records: Vec<ItineraryRecord>,
    ) -> Result<Vec<Itinerary>, RepositoryError> {
        let mut tag_ids: Vec<TagId> = records.iter().flat_map(|r| r.tags.iter().copied()).collect();
        tag_ids.sort_unstable();
        tag_ids.dedup();

        let mut activity_ids: Vec<ActivityId> =
            records.iter().flat_map(|r| r.activity_ids()).collect();
        activity_ids.sort_unstable();
        activity_ids.dedup();

        let (tags, activities) = futures::try_join!(
            tag_lookup(&self.pool, &tag_ids),
            activity_lookup(&self.pool, &activity_ids),
        )?;

        Ok(records
            .into_iter()
            .map(|r| r.populate(&tags, &activities))
            .collect())
    }

    async fn populate_one(&self, record: ItineraryRecord) -> Result<Itinerary, RepositoryError> {
        let mut populated = self.populate_all(vec![record]).await?;
        populated.pop().ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl ItineraryStore for PgItineraryStore {
    async fn list(&self, filter: &ItineraryFilter) -> Result<Vec<Itinerary>, RepositoryError> {
        let records: Vec<ItineraryRecord> = sqlx::query_as(&format!(
            r"
            SELECT {ITINERARY_COLUMNS} FROM tripmate.itinerary
            WHERE ($1 OR (active AND NOT flagged))
              AND ($2::TEXT IS NULL OR name ILIKE $2)
              AND ($3::TEXT IS NULL OR LOWER(language) = LOWER($3))
              AND ($4::NUMERIC IS NULL OR price <= $4)
              AND ($5::TEXT IS NULL OR $5 = ANY(tags))
              AND ($6::DATE IS NULL OR $6 = ANY(available_dates))
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(filter.include_hidden)
        .bind(filter.name.as_deref().map(like_pattern))
        .bind(filter.language.as_deref())
        .bind(filter.max_price)
        .bind(filter.tag)
        .bind(filter.date)
        .fetch_all(&self.pool)
        .await?;

        self.populate_all(records).await
    }

    async fn list_by_creator(&self, creator: UserId) -> Result<Vec<Itinerary>, RepositoryError> {
        let records: Vec<ItineraryRecord> = sqlx::query_as(&format!(
            r"
            SELECT {ITINERARY_COLUMNS} FROM tripmate.itinerary
            WHERE created_by = $1
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(creator)
        .fetch_all(&self.pool)
        .await?;

        self.populate_all(records).await
    }

    async fn get(&self, id: ItineraryId) -> Result<Option<Itinerary>, RepositoryError> {
        let record: Option<ItineraryRecord> = sqlx::query_as(&format!(
            "SELECT {ITINERARY_COLUMNS} FROM tripmate.itinerary WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match record {
            Some(r) => Ok(Some(self.populate_one(r).await?)),
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        creator: UserId,
        input: ItineraryInput,
    ) -> Result<Itinerary, RepositoryError> {
        let record = ItineraryRecord::new(creator, input);

        let saved: ItineraryRecord = sqlx::query_as(&format!(
            r"
            INSERT INTO tripmate.itinerary
                (id, name, category, tags, activities, locations, timeline, language,
                 price, available_dates, accessibility, pick_up, drop_off, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {ITINERARY_COLUMNS}
            "
        ))
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.category)
        .bind(&record.tags)
        .bind(&record.activities)
        .bind(&record.locations)
        .bind(&record.timeline)
        .bind(&record.language)
        .bind(record.price)
        .bind(&record.available_dates)
        .bind(&record.accessibility)
        .bind(&record.pick_up)
        .bind(&record.drop_off)
        .bind(record.created_by)
        .fetch_one(&self.pool)
        .await?;

        self.populate_one(saved).await
    }

    async fn update(
        &self,
        id: ItineraryId,
        update: ItineraryUpdate,
    ) -> Result<Itinerary, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE tripmate.itinerary SET updated_at = NOW()");

        if let Some(name) = update.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(category) = update.category {
            query.push(", category = ").push_bind(category);
        }
        if let Some(tags) = update.tags {
            query.push(", tags = ").push_bind(tags);
        }
        if let Some(stops) = update.activities {
            query.push(", activities = ").push_bind(Json(stops));
        }
        if let Some(locations) = update.locations {
            query.push(", locations = ").push_bind(locations);
        }
        if let Some(timeline) = update.timeline {
            query.push(", timeline = ").push_bind(timeline);
        }
        if let Some(language) = update.language {
            query.push(", language = ").push_bind(language);
        }
        if let Some(price) = update.price {
            query.push(", price = ").push_bind(price);
        }
        if let Some(dates) = update.available_dates {
            query.push(", available_dates = ").push_bind(dates);
        }
        if let Some(accessibility) = update.accessibility {
            query.push(", accessibility = ").push_bind(accessibility);
        }
        if let Some(pick_up) = update.pick_up {
            query.push(", pick_up = ").push_bind(pick_up);
        }
        if let Some(drop_off) = update.drop_off {
            query.push(", drop_off = ").push_bind(drop_off);
        }
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(ITINERARY_COLUMNS);

        let record: Option<ItineraryRecord> = query
            .build_query_as()
            .fetch_optional(&self.pool)
            .await?;

        self.populate_one(record.ok_or(RepositoryError::NotFound)?)
            .await
    }

    async fn delete(&self, id: ItineraryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tripmate.itinerary WHERE id = $1")
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
        id: ItineraryId,
        flagged: bool,
    ) -> Result<Itinerary, RepositoryError> {
        let record: Option<ItineraryRecord> = sqlx::query_as(&format!(
            r"
            UPDATE tripmate.itinerary SET flagged = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ITINERARY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(flagged)
        .fetch_optional(&self.pool)
        .await?;

        self.populate_one(record.ok_or(RepositoryError::NotFound)?)
            .await
    }

    async fn set_active(
        &self,
        id: ItineraryId,
        active: bool,
    ) -> Result<Itinerary, RepositoryError> {
        let record: Option<ItineraryRecord> = sqlx::query_as(&format!(
            r"
            UPDATE tripmate.itinerary SET active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ITINERARY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?;

        self.populate_one(record.ok_or(RepositoryError::NotFound)?)
            .await
    }
}
