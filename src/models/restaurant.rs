// src/models/restaurant.rs
// DOCUMENTATION: Restaurant data structures for both sources and the merged list
// PURPOSE: Raw wire shapes, the normalized candidate, and nearby query/response DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::Coordinate;

/// Display value used when a source omits a name or address
pub const UNKNOWN: &str = "Unknown";

/// Shown for candidates whose source has no photo
pub const PLACEHOLDER_PHOTO_URL: &str = "https://images.unsplash.com/photo-1517248135467-4c7edcad34c4?q=80&w=2940&auto=format&fit=crop";

/// Restaurant as returned by the owned directory (`GET /api/restaurants`)
/// DOCUMENTATION: Every field is optional on the wire; the aggregator decides
/// what is required. `rating` and the cuisine fields are kept as raw JSON
/// because owners have stored numbers, strings and lists in them over time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOwnedRecord {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub photo: Option<String>,

    #[serde(default)]
    pub location: Option<RawLocation>,

    /// Number or numeric string
    #[serde(default)]
    pub rating: Option<Value>,

    /// Preferred: list of tags
    #[serde(default)]
    pub cuisines: Option<Value>,

    /// Legacy: single tag, comma-separated string or list
    #[serde(default)]
    pub cuisine: Option<Value>,
}

/// Location object nested in owned records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLocation {
    #[serde(default)]
    pub lat: Option<f64>,

    #[serde(default)]
    pub lng: Option<f64>,
}

/// One place-search hit, already flattened from the provider's response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSearchResult {
    /// Provider identifier, used to drop repeated hits
    pub place_id: Option<String>,
    pub name: Option<String>,
    pub vicinity: Option<String>,
    pub rating: Option<f64>,
    /// Photo path served by this service when the provider returned a photo
    pub photo_url: Option<String>,
    /// `geometry.location`; hits without it are dropped
    pub location: Option<Coordinate>,
}

/// Where a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Owned,
    Search,
}

/// A restaurant normalized from either source, ready for display
/// DOCUMENTATION: Built fresh on every aggregation pass and never mutated
/// afterwards. `distance_km` is relative to that pass's origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantCandidate {
    /// Owned-directory id; present iff the restaurant has a browsable menu
    pub id: Option<String>,
    pub place_id: Option<String>,
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub cuisine: Vec<String>,
    pub position: Coordinate,
    pub distance_km: f64,
    pub photo_url: String,
    pub source: CandidateSource,
    pub has_menu: bool,
}

/// GET /nearby query parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NearbyQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,

    /// Defaults to the configured radius
    #[validate(range(min = 0.0, max = 50.0))]
    pub radius_km: Option<f64>,

    /// 0 disables the rating filter
    #[validate(range(min = 0.0, max = 5.0))]
    pub min_rating: Option<f64>,
}

impl NearbyQuery {
    pub fn origin(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// GET /nearby/nearest query parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NearestQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

/// Merged list plus any user-visible notices about unavailable sources
#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub restaurants: Vec<RestaurantCandidate>,
    pub total: usize,
    pub notices: Vec<String>,
}

/// Trim, drop blanks and duplicates, keep first-seen order
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|seen| seen == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Read cuisine tags out of a loosely-typed JSON value.
/// Strings are split on commas; lists may hold strings or nested strings.
pub fn tags_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => normalize_tags(s.split(',')),
        Value::Array(items) => normalize_tags(
            items
                .iter()
                .filter_map(Value::as_str)
                .flat_map(|s| s.split(',')),
        ),
        _ => Vec::new(),
    }
}

/// Ratings arrive as numbers, numeric strings, or not at all
pub fn rating_from_value(value: Option<&Value>) -> f64 {
    let rating = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if rating.is_finite() {
        rating
    } else {
        0.0
    }
}


/// Image bytes relayed from the place-search provider
#[derive(Debug, Clone, PartialEq)]
pub struct PlacePhoto {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// GET /photos/{reference} query parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PhotoQuery {
    #[validate(range(min = 1, max = 1600))]
    pub maxwidth: Option<u32>,
}
