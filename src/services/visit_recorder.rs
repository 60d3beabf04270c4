// src/services/visit_recorder.rs
// DOCUMENTATION: Visit history store seam
// PURPOSE: Record rating decisions and answer "already rated today?"

use crate::db::VisitRepository;
use crate::errors::FoodieError;
use crate::models::{same_local_day, VisitRating, VisitRecord};
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use sqlx::PgPool;
use tokio::sync::RwLock;

/// Visit history store
/// DOCUMENTATION: Append-only apart from rating changes. No uniqueness is
/// enforced here; the once-per-day rule is checked by the caller before writing.
#[async_trait]
pub trait VisitRecorder: Send + Sync {
    /// Whether `user_id` has a visit to `place_name` on the local calendar day of `now`
    async fn has_visited_today(
        &self,
        user_id: &str,
        place_name: &str,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<bool, FoodieError>;

    async fn record(&self, visit: VisitRecord) -> Result<(), FoodieError>;

    /// Visits of a user in store order
    async fn list_visits(&self, user_id: &str) -> Result<Vec<VisitRecord>, FoodieError>;

    async fn update_rating(
        &self,
        user_id: &str,
        visit_id: &str,
        rating: VisitRating,
    ) -> Result<VisitRecord, FoodieError>;
}

/// UTC bounds [start, end) of the local calendar day containing `now`
pub fn local_day_bounds(now: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_midnight = now
        .with_timezone(&offset)
        .date_naive()
        .and_time(NaiveTime::default());
    let start_naive = local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
    let start = Utc.from_utc_datetime(&start_naive);
    (start, start + Duration::days(1))
}

/// Process-local store, used when no database is configured
#[derive(Default)]
pub struct InMemoryVisitRecorder {
    visits: RwLock<Vec<VisitRecord>>,
}

impl InMemoryVisitRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VisitRecorder for InMemoryVisitRecorder {
    async fn has_visited_today(
        &self,
        user_id: &str,
        place_name: &str,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<bool, FoodieError> {
        let visits = self.visits.read().await;
        Ok(visits.iter().any(|v| {
            v.user_id == user_id
                && v.place_name == place_name
                && same_local_day(v.timestamp_utc, now, offset)
        }))
    }

    async fn record(&self, visit: VisitRecord) -> Result<(), FoodieError> {
        log::debug!("Recording visit {} for {}", visit.id, visit.user_id);
        self.visits.write().await.push(visit);
        Ok(())
    }

    async fn list_visits(&self, user_id: &str) -> Result<Vec<VisitRecord>, FoodieError> {
        let visits = self.visits.read().await;
        Ok(visits
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_rating(
        &self,
        user_id: &str,
        visit_id: &str,
        rating: VisitRating,
    ) -> Result<VisitRecord, FoodieError> {
        let mut visits = self.visits.write().await;
        let visit = visits
            .iter_mut()
            .find(|v| v.user_id == user_id && v.id == visit_id)
            .ok_or_else(|| FoodieError::NotFound(format!("Visit {} not found", visit_id)))?;

        visit.rating = rating;
        Ok(visit.clone())
    }
}

/// PostgreSQL-backed store
pub struct PgVisitRecorder {
    pool: PgPool,
}

impl PgVisitRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitRecorder for PgVisitRecorder {
    async fn has_visited_today(
        &self,
        user_id: &str,
        place_name: &str,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<bool, FoodieError> {
        let (start, end) = local_day_bounds(now, offset);
        let visits = VisitRepository::visits_between(&self.pool, user_id, place_name, start, end).await?;
        Ok(!visits.is_empty())
    }

    async fn record(&self, visit: VisitRecord) -> Result<(), FoodieError> {
        VisitRepository::insert_visit(&self.pool, &visit).await
    }

    async fn list_visits(&self, user_id: &str) -> Result<Vec<VisitRecord>, FoodieError> {
        VisitRepository::list_by_user(&self.pool, user_id).await
    }

    async fn update_rating(
        &self,
        user_id: &str,
        visit_id: &str,
        rating: VisitRating,
    ) -> Result<VisitRecord, FoodieError> {
        VisitRepository::update_rating(&self.pool, user_id, visit_id, rating).await
    }
}
