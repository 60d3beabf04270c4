// src/models/visit.rs
// DOCUMENTATION: Visit history records
// PURPOSE: One rating decision per place/user/day and the DTOs around it

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::Destination;

/// Tag stored when a destination has no known cuisine
pub const UNKNOWN_CUISINE: &str = "Unknown Cuisine";

/// Tri-state visit rating. On the wire: 1 = liked, 0 = disliked, null = unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Option<u8>", try_from = "Option<u8>")]
pub enum VisitRating {
    Liked,
    Disliked,
    #[default]
    Unset,
}

impl VisitRating {
    /// Only liked/disliked may be submitted
    pub fn is_decision(&self) -> bool {
        !matches!(self, VisitRating::Unset)
    }

    pub fn to_db(self) -> Option<i16> {
        Option::<u8>::from(self).map(i16::from)
    }

    pub fn from_db(value: Option<i16>) -> Self {
        match value {
            Some(1) => VisitRating::Liked,
            Some(0) => VisitRating::Disliked,
            _ => VisitRating::Unset,
        }
    }
}

impl From<VisitRating> for Option<u8> {
    fn from(rating: VisitRating) -> Self {
        match rating {
            VisitRating::Liked => Some(1),
            VisitRating::Disliked => Some(0),
            VisitRating::Unset => None,
        }
    }
}

impl TryFrom<Option<u8>> for VisitRating {
    type Error = String;

    fn try_from(value: Option<u8>) -> Result<Self, Self::Error> {
        match value {
            Some(1) => Ok(VisitRating::Liked),
            Some(0) => Ok(VisitRating::Disliked),
            None => Ok(VisitRating::Unset),
            Some(other) => Err(format!("rating must be 0, 1 or null, got {}", other)),
        }
    }
}

/// A persisted visit
/// DOCUMENTATION: Created on the first rating submission for a place and day;
/// afterwards only `rating` changes. Never deleted by this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    /// Caller-generated write key: submission time in milliseconds
    pub id: String,
    pub user_id: String,
    pub place_name: String,
    pub address: String,
    /// Primary cuisine tag
    pub cuisine: String,
    pub all_cuisines: Vec<String>,
    pub rating: VisitRating,
    pub timestamp_utc: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
}

impl VisitRecord {
    /// Build the record written when the user rates an armed destination
    pub fn for_destination(
        user_id: &str,
        destination: &Destination,
        rating: VisitRating,
        now: DateTime<Utc>,
    ) -> Self {
        let cuisine = destination
            .cuisine
            .first()
            .cloned()
            .unwrap_or_else(|| UNKNOWN_CUISINE.to_string());

        Self {
            id: now.timestamp_millis().to_string(),
            user_id: user_id.to_string(),
            place_name: destination.name.clone(),
            address: destination.address.clone(),
            cuisine,
            all_cuisines: destination.cuisine.clone(),
            rating,
            timestamp_utc: now,
            lat: destination.position.lat,
            lng: destination.position.lng,
        }
    }
}

/// Whether two instants fall on the same calendar day at `offset`
pub fn same_local_day(a: DateTime<Utc>, b: DateTime<Utc>, offset: FixedOffset) -> bool {
    a.with_timezone(&offset).date_naive() == b.with_timezone(&offset).date_naive()
}

/// PUT /visits/{user_id}/{visit_id}
#[derive(Debug, Deserialize)]
pub struct UpdateVisitRequest {
    #[serde(default)]
    pub rating: VisitRating,
}

/// GET /visits/{user_id}
#[derive(Debug, Serialize)]
pub struct VisitHistoryResponse {
    pub visits: Vec<VisitRecord>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rating_wire_format() {
        assert_eq!(serde_json::to_value(VisitRating::Liked).unwrap(), 1);
        assert_eq!(serde_json::to_value(VisitRating::Disliked).unwrap(), 0);
        assert!(serde_json::to_value(VisitRating::Unset).unwrap().is_null());

        let parsed: VisitRating = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, VisitRating::Liked);
        assert!(serde_json::from_str::<VisitRating>("2").is_err());
    }

    #[test]
    fn test_rating_db_mapping() {
        assert_eq!(VisitRating::Disliked.to_db(), Some(0));
        assert_eq!(VisitRating::from_db(Some(1)), VisitRating::Liked);
        assert_eq!(VisitRating::from_db(None), VisitRating::Unset);
        assert_eq!(VisitRating::from_db(Some(7)), VisitRating::Unset);
    }

    #[test]
    fn test_same_local_day_uses_offset() {
        // 23:30 UTC and 00:30 UTC next day
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 3, 2, 0, 30, 0).unwrap();

        let utc = FixedOffset::east_opt(0).unwrap();
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();

        assert!(!same_local_day(late, early, utc));
        // Both are March 2nd in India
        assert!(same_local_day(late, early, ist));
    }

    #[test]
    fn test_update_request_defaults_to_unset() {
        let req: UpdateVisitRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.rating, VisitRating::Unset);
    }
}
