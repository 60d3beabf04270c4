// src/db/visit_repository.rs
// DOCUMENTATION: Visit history database operations
// PURPOSE: Append, list and re-rate rows of visit_history

use crate::errors::FoodieError;
use crate::models::{VisitRating, VisitRecord};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

/// Row shape of visit_history
#[derive(Debug, Clone, FromRow)]
pub struct VisitRow {
    pub id: String,
    pub user_id: String,
    pub place_name: String,
    pub address: String,
    pub cuisine: String,
    pub all_cuisines: Vec<String>,
    pub rating: Option<i16>,
    pub visited_at: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
}

impl VisitRow {
    pub fn into_record(self) -> VisitRecord {
        VisitRecord {
            id: self.id,
            user_id: self.user_id,
            place_name: self.place_name,
            address: self.address,
            cuisine: self.cuisine,
            all_cuisines: self.all_cuisines,
            rating: VisitRating::from_db(self.rating),
            timestamp_utc: self.visited_at,
            lat: self.lat,
            lng: self.lng,
        }
    }
}

pub struct VisitRepository;

impl VisitRepository {
    /// Append a visit
    /// DOCUMENTATION: Plain INSERT; a write failure is retryable by the caller.
    pub async fn insert_visit(pool: &PgPool, visit: &VisitRecord) -> Result<(), FoodieError> {
        sqlx::query(
            r#"
            INSERT INTO visit_history (
                id, user_id, place_name, address, cuisine, all_cuisines,
                rating, visited_at, lat, lng
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&visit.id)
        .bind(&visit.user_id)
        .bind(&visit.place_name)
        .bind(&visit.address)
        .bind(&visit.cuisine)
        .bind(&visit.all_cuisines)
        .bind(visit.rating.to_db())
        .bind(visit.timestamp_utc)
        .bind(visit.lat)
        .bind(visit.lng)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to insert visit for {}: {}", visit.user_id, e);
            FoodieError::PersistenceFailure(format!("Insert visit failed: {}", e))
        })?;

        Ok(())
    }

    /// Visits of one user at one place within [from, to)
    pub async fn visits_between(
        pool: &PgPool,
        user_id: &str,
        place_name: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<VisitRecord>, FoodieError> {
        let rows = sqlx::query_as::<_, VisitRow>(
            r#"
            SELECT * FROM visit_history
            WHERE user_id = $1 AND place_name = $2
              AND visited_at >= $3 AND visited_at < $4
            "#,
        )
        .bind(user_id)
        .bind(place_name)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to read visits for {}: {}", user_id, e);
            FoodieError::DatabaseError(format!("Read visits failed: {}", e))
        })?;

        Ok(rows.into_iter().map(VisitRow::into_record).collect())
    }

    /// All visits of a user, in storage order
    pub async fn list_by_user(pool: &PgPool, user_id: &str) -> Result<Vec<VisitRecord>, FoodieError> {
        let rows = sqlx::query_as::<_, VisitRow>("SELECT * FROM visit_history WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to list visits for {}: {}", user_id, e);
                FoodieError::DatabaseError(format!("List visits failed: {}", e))
            })?;

        Ok(rows.into_iter().map(VisitRow::into_record).collect())
    }

    /// Change the rating of one visit
    pub async fn update_rating(
        pool: &PgPool,
        user_id: &str,
        visit_id: &str,
        rating: VisitRating,
    ) -> Result<VisitRecord, FoodieError> {
        let row = sqlx::query_as::<_, VisitRow>(
            r#"
            UPDATE visit_history
            SET rating = $3
            WHERE user_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(visit_id)
        .bind(rating.to_db())
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update visit {}: {}", visit_id, e);
            FoodieError::PersistenceFailure(format!("Update visit failed: {}", e))
        })?;

        row.map(VisitRow::into_record)
            .ok_or_else(|| FoodieError::NotFound(format!("Visit {} not found", visit_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_row_into_record() {
        let row = VisitRow {
            id: "1700000000000".to_string(),
            user_id: "u1".to_string(),
            place_name: "Dosa Corner".to_string(),
            address: "1 Main St".to_string(),
            cuisine: "South Indian".to_string(),
            all_cuisines: vec!["South Indian".to_string(), "Cafe".to_string()],
            rating: Some(0),
            visited_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            lat: 12.0,
            lng: 77.0,
        };

        let record = row.into_record();
        assert_eq!(record.rating, VisitRating::Disliked);
        assert_eq!(record.all_cuisines.len(), 2);
        assert_eq!(record.timestamp_utc.timestamp(), 1714564800);
    }
}
