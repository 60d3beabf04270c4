// src/services/google_places_client.rs
// DOCUMENTATION: Place-search client
// PURPOSE: Nearby restaurant search through Google Places, behind the PlacesClient seam

use crate::errors::FoodieError;
use crate::models::{Coordinate, PlacePhoto, RawSearchResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Google caps nearby search at 50 km
pub const MAX_SEARCH_RADIUS_M: u32 = 50_000;

/// Width requested for list thumbnails
pub const LIST_PHOTO_WIDTH: u32 = 100;

/// Largest width the provider serves
pub const MAX_PHOTO_WIDTH: u32 = 1600;

/// Parameters of one nearby search
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceSearchQuery {
    pub center: Coordinate,
    pub radius_meters: u32,
    pub category: String,
}

impl PlaceSearchQuery {
    /// Restaurant search around `center`
    pub fn restaurants(center: Coordinate, radius_km: f64) -> Self {
        let meters = (radius_km.max(0.0) * 1000.0).round() as u32;
        Self {
            center,
            radius_meters: meters.min(MAX_SEARCH_RADIUS_M),
            category: "restaurant".to_string(),
        }
    }
}

/// Place-search seam; fakes implement this in tests
#[async_trait]
pub trait PlacesClient: Send + Sync {
    async fn nearby_search(
        &self,
        query: &PlaceSearchQuery,
    ) -> Result<Vec<RawSearchResult>, FoodieError>;

    /// Fetch the image behind a photo reference returned by `nearby_search`
    async fn photo(&self, reference: &str, max_width: u32) -> Result<PlacePhoto, FoodieError>;
}

/// Public path of a provider photo. The provider key stays server-side.
pub fn photo_path(reference: &str, max_width: u32) -> String {
    format!("/photos/{}?maxwidth={}", reference, max_width)
}

/// Google Places API client
/// DOCUMENTATION: Handles authentication and API calls to Google Places
pub struct GooglePlacesClient {
    /// HTTP client for making requests
    client: Client,
    /// Google Places API key
    api_key: String,
    /// Base URL for Google Places API
    base_url: String,
}

/// Response from Google Places Nearby Search
#[derive(Debug, Deserialize, Serialize)]
pub struct GooglePlacesResponse {
    #[serde(default)]
    pub results: Vec<GooglePlace>,
    pub status: String,
    pub error_message: Option<String>,
}

/// Individual place from Google Places API.
/// Everything is optional so one odd entry cannot fail the whole page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GooglePlace {
    #[serde(default)]
    pub place_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vicinity: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub geometry: Option<GoogleGeometry>,
    #[serde(default)]
    pub photos: Option<Vec<GooglePhoto>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GoogleGeometry {
    #[serde(default)]
    pub location: Option<GoogleLocation>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GoogleLocation {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GooglePhoto {
    /// Photo reference (used to fetch actual photo)
    pub photo_reference: String,
}

impl GooglePlacesClient {
    /// Create new Google Places API client
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FoodieError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FoodieError::ExternalApiError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Flatten a Google place into the search-result shape
    pub fn to_search_result(&self, place: &GooglePlace) -> RawSearchResult {
        let location = place
            .geometry
            .as_ref()
            .and_then(|g| g.location.as_ref())
            .and_then(|l| Coordinate::try_new(l.lat, l.lng));

        let photo_url = place
            .photos
            .as_ref()
            .and_then(|photos| photos.first())
            .map(|photo| photo_path(&photo.photo_reference, LIST_PHOTO_WIDTH));

        RawSearchResult {
            place_id: place.place_id.clone(),
            name: place.name.clone(),
            vicinity: place.vicinity.clone(),
            rating: place.rating,
            photo_url,
            location,
        }
    }
}

#[async_trait]
impl PlacesClient for GooglePlacesClient {
    /// Perform nearby search for places
    /// DOCUMENTATION: OK and ZERO_RESULTS succeed; any other status is an error
    /// the caller is expected to absorb.
    async fn nearby_search(
        &self,
        query: &PlaceSearchQuery,
    ) -> Result<Vec<RawSearchResult>, FoodieError> {
        if self.api_key.is_empty() {
            return Err(FoodieError::SourceUnavailable(
                "place search is not configured".to_string(),
            ));
        }

        let url = format!("{}/nearbysearch/json", self.base_url);
        let location = format!("{},{}", query.center.lat, query.center.lng);
        let radius = query.radius_meters.to_string();

        let params = [
            ("location", location.as_str()),
            ("radius", radius.as_str()),
            ("type", query.category.as_str()),
            ("key", self.api_key.as_str()),
        ];

        log::debug!(
            "Google Places nearby search: lat={}, lng={}, radius={}",
            query.center.lat,
            query.center.lng,
            query.radius_meters
        );

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                log::error!("Google Places API request failed: {}", e);
                FoodieError::ExternalApiError(format!("Request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Google Places API error {}: {}", status, body);
            return Err(FoodieError::ExternalApiError(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let api_response: GooglePlacesResponse = response.json().await.map_err(|e| {
            log::error!("Failed to parse Google Places response: {}", e);
            FoodieError::ExternalApiError(format!("Parse error: {}", e))
        })?;

        match api_response.status.as_str() {
            "OK" | "ZERO_RESULTS" => {
                log::info!(
                    "Google Places search returned {} results",
                    api_response.results.len()
                );
                Ok(api_response
                    .results
                    .iter()
                    .map(|place| self.to_search_result(place))
                    .collect())
            }
            "OVER_QUERY_LIMIT" => {
                log::error!("Google Places API quota exceeded");
                Err(FoodieError::RateLimitExceeded)
            }
            other => {
                let msg = api_response
                    .error_message
                    .unwrap_or_else(|| format!("Unknown status: {}", other));
                log::error!("Google Places API returned {}: {}", other, msg);
                Err(FoodieError::ExternalApiError(msg))
            }
        }
    }

    /// Relay a Google photo
    /// DOCUMENTATION: Google answers with a redirect to the image; reqwest follows it.
    async fn photo(&self, reference: &str, max_width: u32) -> Result<PlacePhoto, FoodieError> {
        if self.api_key.is_empty() {
            return Err(FoodieError::SourceUnavailable(
                "place search is not configured".to_string(),
            ));
        }

        let url = format!("{}/photo", self.base_url);
        let max_width = max_width.clamp(1, MAX_PHOTO_WIDTH).to_string();
        let params = [
            ("maxwidth", max_width.as_str()),
            ("photoreference", reference),
            ("key", self.api_key.as_str()),
        ];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| FoodieError::ExternalApiError(format!("Photo request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::BAD_REQUEST {
            return Err(FoodieError::NotFound(format!("Photo {} not found", reference)));
        }
        if !status.is_success() {
            log::error!("Google Places photo error {}", status);
            return Err(FoodieError::ExternalApiError(format!("Photo error {}", status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FoodieError::ExternalApiError(format!("Photo read failed: {}", e)))?;

        Ok(PlacePhoto {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GooglePlacesClient {
        GooglePlacesClient::new("test_key", server.uri(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_query_radius_is_capped() {
        let center = Coordinate::new(12.0, 77.0);
        assert_eq!(PlaceSearchQuery::restaurants(center, 5.0).radius_meters, 5_000);
        assert_eq!(PlaceSearchQuery::restaurants(center, 80.0).radius_meters, 50_000);
        assert_eq!(PlaceSearchQuery::restaurants(center, 1.0).category, "restaurant");
    }

    #[test]
    fn test_to_search_result() {
        let client =
            GooglePlacesClient::new("k", "https://places.test/api", Duration::from_secs(1)).unwrap();

        let place = GooglePlace {
            place_id: Some("ChIJ123".to_string()),
            name: Some("Meghana Foods".to_string()),
            vicinity: Some("Residency Road".to_string()),
            rating: Some(4.4),
            geometry: Some(GoogleGeometry {
                location: Some(GoogleLocation { lat: 12.97, lng: 77.6 }),
            }),
            photos: Some(vec![GooglePhoto {
                photo_reference: "ref1".to_string(),
            }]),
        };

        let result = client.to_search_result(&place);

        assert_eq!(result.location, Some(Coordinate::new(12.97, 77.6)));
        assert_eq!(
            result.photo_url.as_deref(),
            Some("/photos/ref1?maxwidth=100")
        );
        assert_eq!(result.rating, Some(4.4));
    }

    #[test]
    fn test_to_search_result_without_geometry() {
        let client = GooglePlacesClient::new("k", "https://x", Duration::from_secs(1)).unwrap();
        let result = client.to_search_result(&GooglePlace::default());
        assert!(result.location.is_none());
        assert!(result.photo_url.is_none());
    }

    #[tokio::test]
    async fn test_nearby_search_ok() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/nearbysearch/json"))
            .and(query_param("type", "restaurant"))
            .and(query_param("radius", "5000"))
            .and(query_param("key", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "results": [
                    {
                        "place_id": "a",
                        "name": "Vidyarthi Bhavan",
                        "vicinity": "Gandhi Bazaar",
                        "rating": 4.6,
                        "geometry": {"location": {"lat": 12.945, "lng": 77.571}}
                    },
                    {
                        "place_id": "b",
                        "name": "No Geometry"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let results = client_for(&server)
            .nearby_search(&PlaceSearchQuery::restaurants(Coordinate::new(12.95, 77.57), 5.0))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name.as_deref(), Some("Vidyarthi Bhavan"));
        assert!(results[1].location.is_none());
    }

    #[tokio::test]
    async fn test_nearby_search_zero_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nearbysearch/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "ZERO_RESULTS", "results": []})),
            )
            .mount(&server)
            .await;

        let results = client_for(&server)
            .nearby_search(&PlaceSearchQuery::restaurants(Coordinate::new(0.0, 0.0), 1.0))
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_nearby_search_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nearbysearch/json"))
            .and(query_param("radius", "1000"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "OVER_QUERY_LIMIT", "results": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/nearbysearch/json"))
            .and(query_param("radius", "2000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid."
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let center = Coordinate::new(0.0, 0.0);

        assert_eq!(
            client
                .nearby_search(&PlaceSearchQuery::restaurants(center, 1.0))
                .await,
            Err(FoodieError::RateLimitExceeded)
        );
        assert_eq!(
            client
                .nearby_search(&PlaceSearchQuery::restaurants(center, 2.0))
                .await,
            Err(FoodieError::ExternalApiError(
                "The provided API key is invalid.".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_source_unavailable() {
        let client = GooglePlacesClient::new("", "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let result = client
            .nearby_search(&PlaceSearchQuery::restaurants(Coordinate::new(0.0, 0.0), 1.0))
            .await;
        assert!(matches!(result, Err(FoodieError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_photo_is_relayed_with_server_side_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/photo"))
            .and(query_param("photoreference", "ref1"))
            .and(query_param("maxwidth", "100"))
            .and(query_param("key", "test_key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/photo"))
            .and(query_param("photoreference", "gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);

        let photo = client.photo("ref1", LIST_PHOTO_WIDTH).await.unwrap();
        assert_eq!(photo.content_type, "image/png");
        assert_eq!(photo.bytes, vec![0x89, 0x50, 0x4e, 0x47]);

        let missing = client.photo("gone", LIST_PHOTO_WIDTH).await;
        assert!(matches!(missing, Err(FoodieError::NotFound(_))));
    }

    #[test]
    fn test_photo_path_has_no_key() {
        let path = photo_path("ref1", 400);
        assert_eq!(path, "/photos/ref1?maxwidth=400");
        assert!(!path.contains("key"));
    }
}
