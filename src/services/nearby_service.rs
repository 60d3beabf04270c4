// src/services/nearby_service.rs
// DOCUMENTATION: Business logic for the nearby list, nearest lookup and menus
// PURPOSE: Intermediary between handlers and the two restaurant sources

use crate::errors::FoodieError;
use crate::models::{Coordinate, MenuResponse, NearbyResponse, PlacePhoto, RestaurantCandidate};
use crate::services::aggregator::RestaurantAggregator;
use crate::services::directory_client::RestaurantDirectory;
use crate::services::google_places_client::{PlaceSearchQuery, PlacesClient};
use std::sync::Arc;

/// Search radius for the "nearest restaurant" lookup
pub const NEAREST_RADIUS_KM: f64 = 3.0;

pub const OWNED_UNAVAILABLE_NOTICE: &str =
    "Partner restaurants could not be loaded right now; showing other results.";
pub const SEARCH_UNAVAILABLE_NOTICE: &str =
    "Nearby search is unavailable right now; showing partner restaurants only.";
pub const MENU_UNAVAILABLE_NOTICE: &str = "The menu could not be loaded right now.";

#[derive(Clone)]
pub struct NearbyService {
    directory: Arc<dyn RestaurantDirectory>,
    places: Arc<dyn PlacesClient>,
    aggregator: RestaurantAggregator,
}

impl NearbyService {
    pub fn new(
        directory: Arc<dyn RestaurantDirectory>,
        places: Arc<dyn PlacesClient>,
        aggregator: RestaurantAggregator,
    ) -> Self {
        Self {
            directory,
            places,
            aggregator,
        }
    }

    /// Merged nearby list
    /// DOCUMENTATION: Both sources are fetched concurrently. A failing source
    /// contributes nothing and adds a notice; the other source still shows.
    pub async fn nearby(
        &self,
        origin: Coordinate,
        radius_km: f64,
        min_rating: f64,
    ) -> NearbyResponse {
        let query = PlaceSearchQuery::restaurants(origin, radius_km);
        let (owned, searched) = futures::join!(
            self.directory.list_restaurants(),
            self.places.nearby_search(&query)
        );

        let mut notices = Vec::new();

        let owned = owned.unwrap_or_else(|e| {
            log::warn!("Owned directory unavailable: {}", e);
            notices.push(OWNED_UNAVAILABLE_NOTICE.to_string());
            Vec::new()
        });

        let searched = searched.unwrap_or_else(|e| {
            log::warn!("Place search unavailable: {}", e);
            notices.push(SEARCH_UNAVAILABLE_NOTICE.to_string());
            Vec::new()
        });

        let restaurants = self
            .aggregator
            .aggregate(&owned, &searched, origin, radius_km, min_rating)
            .await;

        log::info!(
            "Nearby ({}, {}) r={}km min={}: {} restaurants, {} notices",
            origin.lat,
            origin.lng,
            radius_km,
            min_rating,
            restaurants.len(),
            notices.len()
        );

        NearbyResponse {
            total: restaurants.len(),
            restaurants,
            notices,
        }
    }

    /// First place-search hit within NEAREST_RADIUS_KM, cuisine resolved
    pub async fn nearest(&self, origin: Coordinate) -> Result<RestaurantCandidate, FoodieError> {
        let query = PlaceSearchQuery::restaurants(origin, NEAREST_RADIUS_KM);
        let results = self.places.nearby_search(&query).await.map_err(|e| {
            log::warn!("Nearest lookup failed: {}", e);
            FoodieError::SourceUnavailable(format!("place search failed: {}", e))
        })?;

        let first = results
            .iter()
            .find(|r| r.location.is_some())
            .ok_or_else(|| FoodieError::NotFound("No restaurant nearby".to_string()))?;

        self.aggregator
            .aggregate(&[], std::slice::from_ref(first), origin, NEAREST_RADIUS_KM, 0.0)
            .await
            .into_iter()
            .next()
            .ok_or_else(|| FoodieError::NotFound("No restaurant nearby".to_string()))
    }

    /// Image behind a search result's `photo_url`
    pub async fn photo(&self, reference: &str, max_width: u32) -> Result<PlacePhoto, FoodieError> {
        self.places.photo(reference, max_width).await
    }

    /// Menu of an owned restaurant; an unreachable directory yields an empty menu plus a notice
    pub async fn menu(&self, restaurant_id: &str) -> Result<MenuResponse, FoodieError> {
        let (items, notices) = match self.directory.menu(restaurant_id).await {
            Ok(items) => (items, Vec::new()),
            Err(FoodieError::NotFound(msg)) => return Err(FoodieError::NotFound(msg)),
            Err(e) => {
                log::warn!("Menu for {} unavailable: {}", restaurant_id, e);
                (Vec::new(), vec![MENU_UNAVAILABLE_NOTICE.to_string()])
            }
        };

        Ok(MenuResponse {
            restaurant_id: restaurant_id.to_string(),
            items,
            notices,
        })
    }
}
