// src/services/aggregator.rs
// DOCUMENTATION: Restaurant aggregation pass
// PURPOSE: Merge owned and searched restaurants into one filtered, enriched list

use crate::models::{
    rating_from_value, tags_from_value, CandidateSource, Coordinate, RawOwnedRecord,
    RawSearchResult, RestaurantCandidate, PLACEHOLDER_PHOTO_URL, UNKNOWN,
};
use crate::services::cuisine_resolver::CuisineResolver;
use crate::services::geo::{distance_km, distance_meters};
use std::collections::HashSet;

/// A search hit this close to an owned restaurant with the same name is the same place
pub const DUPLICATE_DISTANCE_M: f64 = 50.0;

/// Candidate before enrichment, with the cuisine tags its source supplied
struct Pending {
    candidate: RestaurantCandidate,
    hint: Option<Vec<String>>,
}

/// Restaurant aggregator
/// DOCUMENTATION: Stateless apart from the resolver it enriches through.
/// Every call builds a fresh list; nothing is shared between passes.
#[derive(Clone)]
pub struct RestaurantAggregator {
    resolver: CuisineResolver,
}

impl RestaurantAggregator {
    pub fn new(resolver: CuisineResolver) -> Self {
        Self { resolver }
    }

    /// Build the merged list around `origin`.
    /// Owned restaurants come first, then search hits, each in source order.
    /// Never fails: malformed records are dropped one by one.
    pub async fn aggregate(
        &self,
        owned: &[RawOwnedRecord],
        searched: &[RawSearchResult],
        origin: Coordinate,
        radius_km: f64,
        min_rating: f64,
    ) -> Vec<RestaurantCandidate> {
        let owned_pending: Vec<Pending> = owned
            .iter()
            .filter_map(|record| normalize_owned(record, origin))
            .filter(|p| passes_filters(&p.candidate, radius_km, min_rating))
            .collect();

        let mut seen_place_ids: HashSet<String> = HashSet::new();
        let search_pending: Vec<Pending> = searched
            .iter()
            .filter(|result| !below_min_rating(result.rating, min_rating))
            .filter_map(|result| normalize_search(result, origin))
            .filter(|p| passes_filters(&p.candidate, radius_km, min_rating))
            .filter(|p| !duplicates_owned(&p.candidate, &owned_pending))
            .filter(|p| match &p.candidate.place_id {
                Some(id) => seen_place_ids.insert(id.clone()),
                None => true,
            })
            .collect();

        let pending: Vec<Pending> = owned_pending.into_iter().chain(search_pending).collect();

        log::debug!(
            "Aggregation around ({}, {}): {} candidates after filtering",
            origin.lat,
            origin.lng,
            pending.len()
        );

        let requests: Vec<(Coordinate, Option<Vec<String>>)> = pending
            .iter()
            .map(|p| (p.candidate.position, p.hint.clone()))
            .collect();
        let cuisines = self.resolver.resolve_all(&requests).await;

        pending
            .into_iter()
            .zip(cuisines)
            .map(|(p, cuisine)| RestaurantCandidate {
                cuisine,
                ..p.candidate
            })
            .collect()
    }
}

fn below_min_rating(rating: Option<f64>, min_rating: f64) -> bool {
    matches!(rating, Some(r) if min_rating > 0.0 && r < min_rating)
}

fn passes_filters(candidate: &RestaurantCandidate, radius_km: f64, min_rating: f64) -> bool {
    candidate.distance_km <= radius_km && (min_rating == 0.0 || candidate.rating >= min_rating)
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn duplicates_owned(candidate: &RestaurantCandidate, owned: &[Pending]) -> bool {
    owned.iter().any(|o| {
        same_name(&o.candidate.name, &candidate.name)
            && distance_meters(o.candidate.position, candidate.position) <= DUPLICATE_DISTANCE_M
    })
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Owned records need a valid location; everything else has a display default
fn normalize_owned(record: &RawOwnedRecord, origin: Coordinate) -> Option<Pending> {
    let location = record.location.as_ref()?;
    let position = Coordinate::try_new(location.lat?, location.lng?)?;

    let cuisines = record
        .cuisines
        .as_ref()
        .map(tags_from_value)
        .filter(|tags| !tags.is_empty())
        .or_else(|| record.cuisine.as_ref().map(tags_from_value))
        .unwrap_or_default();

    let id = non_blank(record.id.as_ref());
    let has_menu = id.is_some();

    Some(Pending {
        candidate: RestaurantCandidate {
            id,
            place_id: None,
            name: non_blank(record.name.as_ref()).unwrap_or_else(|| UNKNOWN.to_string()),
            address: non_blank(record.address.as_ref()).unwrap_or_else(|| UNKNOWN.to_string()),
            rating: rating_from_value(record.rating.as_ref()),
            cuisine: Vec::new(),
            position,
            distance_km: distance_km(origin, position),
            photo_url: non_blank(record.photo.as_ref())
                .unwrap_or_else(|| PLACEHOLDER_PHOTO_URL.to_string()),
            source: CandidateSource::Owned,
            has_menu,
        },
        hint: Some(cuisines),
    })
}

/// Search hits need a location; everything else has a display default
fn normalize_search(result: &RawSearchResult, origin: Coordinate) -> Option<Pending> {
    let position = result.location.filter(Coordinate::is_valid)?;

    Some(Pending {
        candidate: RestaurantCandidate {
            id: None,
            place_id: non_blank(result.place_id.as_ref()),
            name: non_blank(result.name.as_ref()).unwrap_or_else(|| UNKNOWN.to_string()),
            address: non_blank(result.vicinity.as_ref()).unwrap_or_else(|| UNKNOWN.to_string()),
            rating: result.rating.filter(|r| r.is_finite()).unwrap_or(0.0),
            cuisine: Vec::new(),
            position,
            distance_km: distance_km(origin, position),
            photo_url: non_blank(result.photo_url.as_ref())
                .unwrap_or_else(|| PLACEHOLDER_PHOTO_URL.to_string()),
            source: CandidateSource::Search,
            has_menu: false,
        },
        hint: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawLocation;
    use crate::services::cuisine_resolver::tests::FakeLookup;
    use serde_json::json;
    use std::sync::Arc;

    fn aggregator(lookup: Arc<FakeLookup>) -> RestaurantAggregator {
        RestaurantAggregator::new(CuisineResolver::new(lookup, None))
    }

    fn owned(id: &str, name: &str, lat: f64, lng: f64, rating: f64) -> RawOwnedRecord {
        RawOwnedRecord {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            address: Some("1 Main St".to_string()),
            location: Some(RawLocation {
                lat: Some(lat),
                lng: Some(lng),
            }),
            rating: Some(json!(rating)),
            cuisines: Some(json!(["South Indian"])),
            ..Default::default()
        }
    }

    fn searched(place_id: &str, name: &str, lat: f64, lng: f64, rating: Option<f64>) -> RawSearchResult {
        RawSearchResult {
            place_id: Some(place_id.to_string()),
            name: Some(name.to_string()),
            vicinity: Some("Somewhere".to_string()),
            rating,
            photo_url: None,
            location: Some(Coordinate::new(lat, lng)),
        }
    }

    #[tokio::test]
    async fn test_reference_scenario() {
        let lookup = FakeLookup::answering(&["Cafe"]);
        let result = aggregator(lookup.clone())
            .aggregate(
                &[owned("r1", "Dosa Corner", 12.001, 77.0, 4.5)],
                &[searched("p1", "Far Away", 12.05, 77.05, Some(3.0))],
                Coordinate::new(12.0, 77.0),
                5.0,
                4.0,
            )
            .await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Dosa Corner");
        assert_eq!(result[0].distance_km, 0.11);
        assert_eq!(result[0].cuisine, vec!["South Indian"]);
        assert!(result[0].has_menu);
        // Owned tags were trusted and the search hit was filtered first
        assert_eq!(lookup.call_count(), 0);
    }

    #[tokio::test]
    async fn test_radius_filter() {
        let origin = Coordinate::new(0.0, 0.0);
        let result = aggregator(FakeLookup::answering(&["Thai"]))
            .aggregate(
                &[],
                &[
                    searched("in", "Inside", 0.0, 0.04, Some(4.0)),
                    searched("out", "Outside", 0.0, 0.06, Some(4.0)),
                ],
                origin,
                5.0,
                0.0,
            )
            .await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].place_id.as_deref(), Some("in"));
        assert!(result.iter().all(|c| c.distance_km <= 5.0));
    }

    #[tokio::test]
    async fn test_rating_filter_and_unrated_hits() {
        let origin = Coordinate::new(0.0, 0.0);
        let hits = [
            searched("a", "Good", 0.0, 0.001, Some(4.2)),
            searched("b", "Poor", 0.0, 0.002, Some(3.9)),
            searched("c", "Unrated", 0.0, 0.003, None),
        ];

        let strict = aggregator(FakeLookup::answering(&["Thai"]))
            .aggregate(&[], &hits, origin, 5.0, 4.0)
            .await;
        assert_eq!(strict.len(), 1);
        assert!(strict.iter().all(|c| c.rating >= 4.0));

        let open = aggregator(FakeLookup::answering(&["Thai"]))
            .aggregate(&[], &hits, origin, 5.0, 0.0)
            .await;
        assert_eq!(open.len(), 3);
        assert_eq!(open[2].rating, 0.0);
    }

    #[tokio::test]
    async fn test_owned_precede_search_results() {
        let origin = Coordinate::new(0.0, 0.0);
        let result = aggregator(FakeLookup::answering(&["Thai"]))
            .aggregate(
                &[
                    owned("r1", "First Owned", 0.0, 0.02, 4.0),
                    owned("r2", "Second Owned", 0.0, 0.01, 4.0),
                ],
                &[searched("p1", "Closest Search", 0.0, 0.0001, Some(5.0))],
                origin,
                10.0,
                0.0,
            )
            .await;

        let sources: Vec<CandidateSource> = result.iter().map(|c| c.source).collect();
        assert_eq!(
            sources,
            vec![CandidateSource::Owned, CandidateSource::Owned, CandidateSource::Search]
        );
        // Source order, not distance order
        assert_eq!(result[0].name, "First Owned");
    }

    #[tokio::test]
    async fn test_malformed_records_dropped() {
        let origin = Coordinate::new(0.0, 0.0);
        let no_location = RawOwnedRecord {
            id: Some("x".to_string()),
            name: Some("Nowhere".to_string()),
            ..Default::default()
        };
        let bad_lat = owned("y", "Off The Map", 95.0, 0.0, 4.0);
        let mut no_geometry = searched("z", "Lost", 0.0, 0.0, Some(4.0));
        no_geometry.location = None;

        let result = aggregator(FakeLookup::answering(&["Thai"]))
            .aggregate(
                &[no_location, bad_lat, owned("ok", "Fine", 0.0, 0.001, 4.0)],
                &[no_geometry],
                origin,
                5.0,
                0.0,
            )
            .await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_empty_inputs() {
        let lookup = FakeLookup::answering(&["Thai"]);
        let result = aggregator(lookup.clone())
            .aggregate(&[], &[], Coordinate::new(0.0, 0.0), 5.0, 0.0)
            .await;
        assert!(result.is_empty());
        assert_eq!(lookup.call_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicates_are_dropped() {
        let origin = Coordinate::new(0.0, 0.0);
        let result = aggregator(FakeLookup::answering(&["Thai"]))
            .aggregate(
                &[owned("r1", "Dosa Corner", 0.0, 0.001, 4.0)],
                &[
                    // Same place as the owned listing, ~10 m away
                    searched("p1", " dosa corner ", 0.0, 0.00109, Some(4.8)),
                    searched("p2", "Idli House", 0.0, 0.002, Some(4.0)),
                    searched("p2", "Idli House", 0.0, 0.002, Some(4.0)),
                ],
                origin,
                5.0,
                0.0,
            )
            .await;

        let names: Vec<&str> = result.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Dosa Corner", "Idli House"]);
    }

    #[tokio::test]
    async fn test_enrichment_and_fallback() {
        let origin = Coordinate::new(0.0, 0.0);
        let mut untagged = owned("r1", "Plain", 0.0, 0.001, 4.0);
        untagged.cuisines = None;
        untagged.cuisine = Some(json!("Unknown"));

        let lookup = FakeLookup::failing();
        let result = aggregator(lookup.clone())
            .aggregate(
                &[untagged],
                &[searched("p1", "Hit", 0.0, 0.002, Some(4.0))],
                origin,
                5.0,
                0.0,
            )
            .await;

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|c| c.cuisine == vec!["Unknown Cuisine"]));
        assert_eq!(lookup.call_count(), 2);
    }

    #[tokio::test]
    async fn test_legacy_cuisine_string_and_defaults() {
        let origin = Coordinate::new(0.0, 0.0);
        let record = RawOwnedRecord {
            id: None,
            name: Some("Legacy".to_string()),
            location: Some(RawLocation {
                lat: Some(0.0),
                lng: Some(0.001),
            }),
            rating: Some(json!("4.1")),
            cuisine: Some(json!("Chinese, Momos")),
            ..Default::default()
        };

        let result = aggregator(FakeLookup::answering(&["Thai"]))
            .aggregate(&[record], &[], origin, 5.0, 0.0)
            .await;

        assert_eq!(result[0].cuisine, vec!["Chinese", "Momos"]);
        assert_eq!(result[0].rating, 4.1);
        assert_eq!(result[0].address, UNKNOWN);
        assert_eq!(result[0].photo_url, PLACEHOLDER_PHOTO_URL);
        assert!(!result[0].has_menu);
    }
}
