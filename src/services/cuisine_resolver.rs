// src/services/cuisine_resolver.rs
// DOCUMENTATION: Cuisine enrichment for restaurants that lack tags
// PURPOSE: Resolve cuisine tags by coordinate, absorbing every lookup failure

use crate::errors::FoodieError;
use crate::models::{normalize_tags, tags_from_value, Coordinate, UNKNOWN, UNKNOWN_CUISINE};
use crate::services::CuisineCache;
use async_trait::async_trait;
use futures::future::join_all;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Source of cuisine tags for a coordinate
#[async_trait]
pub trait CuisineLookup: Send + Sync {
    async fn lookup(&self, position: Coordinate) -> Result<Vec<String>, FoodieError>;
}

/// Body of `GET /api/foursquare/cuisine`
#[derive(Debug, Deserialize)]
struct CuisineLookupResponse {
    #[serde(default)]
    cuisine: Value,
}

/// HTTP cuisine lookup against the Foursquare proxy
/// DOCUMENTATION: One GET per call, no retries. Calls over the configured
/// per-second quota fail immediately instead of waiting.
pub struct HttpCuisineLookup {
    client: Client,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
}

impl HttpCuisineLookup {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        lookups_per_second: u32,
    ) -> Result<Self, FoodieError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FoodieError::ExternalApiError(format!("HTTP client: {}", e)))?;

        let per_second = NonZeroU32::new(lookups_per_second).ok_or_else(|| {
            FoodieError::InvalidInput("cuisine lookup quota must be positive".to_string())
        })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }
}

#[async_trait]
impl CuisineLookup for HttpCuisineLookup {
    async fn lookup(&self, position: Coordinate) -> Result<Vec<String>, FoodieError> {
        if self.limiter.check().is_err() {
            return Err(FoodieError::RateLimitExceeded);
        }

        let url = format!("{}/api/foursquare/cuisine", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("lat", position.lat), ("lng", position.lng)])
            .send()
            .await
            .map_err(|e| FoodieError::EnrichmentFailure(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FoodieError::EnrichmentFailure(format!(
                "Lookup returned {}",
                response.status()
            )));
        }

        let body: CuisineLookupResponse = response
            .json()
            .await
            .map_err(|e| FoodieError::EnrichmentFailure(format!("Parse error: {}", e)))?;

        let tags = tags_from_value(&body.cuisine);
        if tags.is_empty() {
            return Err(FoodieError::EnrichmentFailure(
                "Lookup returned no cuisine".to_string(),
            ));
        }
        Ok(tags)
    }
}

/// Cuisine resolver
/// DOCUMENTATION: Prefers tags the caller already trusts, then the cache,
/// then exactly one lookup. Any failure yields ["Unknown Cuisine"].
#[derive(Clone)]
pub struct CuisineResolver {
    lookup: Arc<dyn CuisineLookup>,
    cache: Option<Arc<CuisineCache>>,
}

impl CuisineResolver {
    pub fn new(lookup: Arc<dyn CuisineLookup>, cache: Option<Arc<CuisineCache>>) -> Self {
        Self { lookup, cache }
    }

    pub fn fallback() -> Vec<String> {
        vec![UNKNOWN_CUISINE.to_string()]
    }

    /// Hint usable as-is: non-empty and not the bare "Unknown" sentinel
    pub fn trusted_hint(hint: Option<&[String]>) -> Option<Vec<String>> {
        let tags = normalize_tags(hint?);
        match tags.as_slice() {
            [] => None,
            [only] if only == UNKNOWN => None,
            _ => Some(tags),
        }
    }

    pub async fn resolve(&self, position: Coordinate, hint: Option<&[String]>) -> Vec<String> {
        if let Some(tags) = Self::trusted_hint(hint) {
            return tags;
        }

        if let Some(cache) = &self.cache {
            if let Some(tags) = cache.get(position).await {
                return tags;
            }
        }

        match self.lookup.lookup(position).await {
            Ok(tags) => {
                if let Some(cache) = &self.cache {
                    cache.set(position, tags.clone()).await;
                }
                tags
            }
            Err(e) => {
                log::warn!(
                    "Cuisine lookup failed at ({}, {}): {}",
                    position.lat,
                    position.lng,
                    e
                );
                Self::fallback()
            }
        }
    }

    /// Resolve a batch concurrently; output order follows input order.
    /// Every future is created before any is polled.
    pub async fn resolve_all(&self, requests: &[(Coordinate, Option<Vec<String>>)]) -> Vec<Vec<String>> {
        let pending: Vec<_> = requests
            .iter()
            .map(|(position, hint)| self.resolve(*position, hint.as_deref()))
            .collect();
        join_all(pending).await
    }
}
