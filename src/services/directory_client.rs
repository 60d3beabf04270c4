// src/services/directory_client.rs
// DOCUMENTATION: Owned restaurant directory client
// PURPOSE: Fetch owner-managed restaurant listings and their menus

use crate::errors::FoodieError;
use crate::models::{MenuItem, RawOwnedRecord};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Owned-directory seam
#[async_trait]
pub trait RestaurantDirectory: Send + Sync {
    /// Every listing; malformed entries are dropped, not reported
    async fn list_restaurants(&self) -> Result<Vec<RawOwnedRecord>, FoodieError>;

    /// Menu of one owned restaurant
    async fn menu(&self, restaurant_id: &str) -> Result<Vec<MenuItem>, FoodieError>;
}

/// HTTP client for the owned directory
pub struct HttpRestaurantDirectory {
    client: Client,
    base_url: String,
}

impl HttpRestaurantDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FoodieError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FoodieError::ExternalApiError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// GET a JSON array, keeping only the entries that parse as `T`
    async fn fetch_list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, FoodieError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            log::warn!("Directory request to {} failed: {}", url, e);
            FoodieError::SourceUnavailable(format!("directory unreachable: {}", e))
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(FoodieError::NotFound(format!("{} not found", url)));
            }
            status if !status.is_success() => {
                log::warn!("Directory returned {} for {}", status, url);
                return Err(FoodieError::SourceUnavailable(format!(
                    "directory returned {}",
                    status
                )));
            }
            _ => {}
        }

        let body: Value = response.json().await.map_err(|e| {
            log::warn!("Directory body from {} is not JSON: {}", url, e);
            FoodieError::SourceUnavailable(format!("directory returned invalid JSON: {}", e))
        })?;

        let Value::Array(entries) = body else {
            return Err(FoodieError::SourceUnavailable(
                "directory did not return a list".to_string(),
            ));
        };

        let total = entries.len();
        let parsed: Vec<T> = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();

        if parsed.len() < total {
            log::warn!(
                "Dropped {} malformed directory entries from {}",
                total - parsed.len(),
                url
            );
        }

        Ok(parsed)
    }
}

#[async_trait]
impl RestaurantDirectory for HttpRestaurantDirectory {
    async fn list_restaurants(&self) -> Result<Vec<RawOwnedRecord>, FoodieError> {
        let url = format!("{}/api/restaurants", self.base_url);
        let restaurants = self.fetch_list(&url).await.map_err(|e| match e {
            // The listing itself never 404s in a healthy directory
            FoodieError::NotFound(msg) => FoodieError::SourceUnavailable(msg),
            other => other,
        })?;

        log::info!("Directory returned {} restaurants", restaurants.len());
        Ok(restaurants)
    }

    async fn menu(&self, restaurant_id: &str) -> Result<Vec<MenuItem>, FoodieError> {
        let url = format!("{}/api/restaurants/{}/menu", self.base_url, restaurant_id);
        self.fetch_list(&url).await.map_err(|e| match e {
            FoodieError::NotFound(_) => {
                FoodieError::NotFound(format!("Restaurant {} not found", restaurant_id))
            }
            other => other,
        })
    }
}
