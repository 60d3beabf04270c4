// src/models/proximity.rs
// DOCUMENTATION: Proximity session request types
// PURPOSE: Destination description and the payloads the map client sends

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::{Coordinate, VisitRating, UNKNOWN};
use crate::errors::FoodieError;

/// Restaurant the user is navigating to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination {
    /// "Unknown" when the client did not know the name; such destinations never trigger
    pub name: String,
    pub address: String,
    pub position: Coordinate,
    pub cuisine: Vec<String>,
    pub rating: Option<f64>,
}

impl Destination {
    pub fn is_named(&self) -> bool {
        !self.name.trim().is_empty() && self.name != UNKNOWN
    }
}

/// Destination as sent by the client; cuisine may be missing, a string or a list
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DestinationRequest {
    pub name: Option<String>,
    pub address: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,

    #[serde(default)]
    pub cuisine: Option<Value>,

    pub rating: Option<f64>,
}

impl DestinationRequest {
    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    /// Cuisine only counts as known when it arrives as a list of tags.
    /// A bare string came from a previous lookup or a placeholder, so it is re-resolved.
    pub fn cuisine_hint(&self) -> Option<Vec<String>> {
        match &self.cuisine {
            Some(value @ Value::Array(_)) => Some(super::tags_from_value(value)),
            _ => None,
        }
    }
}

/// Why the device could not report a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationErrorKind {
    Denied,
    Timeout,
}

impl From<GeolocationErrorKind> for FoodieError {
    fn from(kind: GeolocationErrorKind) -> Self {
        match kind {
            GeolocationErrorKind::Denied => FoodieError::GeolocationDenied,
            GeolocationErrorKind::Timeout => FoodieError::GeolocationTimeout,
        }
    }
}

/// POST /proximity/{user_id}
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ArmRequest {
    #[validate]
    pub destination: DestinationRequest,

    /// Current fix; required unless `geolocation_error` is set
    pub position: Option<Coordinate>,

    pub geolocation_error: Option<GeolocationErrorKind>,

    /// User's offset from UTC, used for "visited today"
    #[validate(range(min = -840, max = 840))]
    pub utc_offset_minutes: Option<i32>,
}

impl ArmRequest {
    pub fn utc_offset(&self) -> FixedOffset {
        let seconds = self.utc_offset_minutes.unwrap_or(0) * 60;
        FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
    }

    /// The starting fix, or the geolocation error that prevents starting
    pub fn initial_fix(&self) -> Result<Coordinate, FoodieError> {
        if let Some(kind) = self.geolocation_error {
            return Err(kind.into());
        }
        match self.position {
            Some(position) if position.is_valid() => Ok(position),
            Some(_) => Err(FoodieError::ValidationError(
                "position is outside the valid coordinate range".to_string(),
            )),
            None => Err(FoodieError::GeolocationTimeout),
        }
    }
}

/// POST /proximity/{user_id}/position
#[derive(Debug, Clone, Deserialize)]
pub struct PositionReport {
    pub position: Option<Coordinate>,
    pub error: Option<GeolocationErrorKind>,
}

/// POST /proximity/{user_id}/rating
#[derive(Debug, Clone, Deserialize)]
pub struct RatingRequest {
    #[serde(default)]
    pub rating: VisitRating,
}
