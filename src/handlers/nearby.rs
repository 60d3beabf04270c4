// src/handlers/nearby.rs
// DOCUMENTATION: HTTP handlers for nearby restaurants
// PURPOSE: Parse location queries, call NearbyService, return list or GeoJSON

use crate::config::Config;
use crate::errors::FoodieError;
use crate::models::{Coordinate, NearbyQuery, NearestQuery, RestaurantCandidate};
use crate::services::NearbyService;
use actix_web::{web, HttpResponse, Responder};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject};
use serde_json::Value;
use validator::Validate;

fn radius_and_rating(query: &NearbyQuery, config: &Config) -> (f64, f64) {
    (
        query.radius_km.unwrap_or(config.default_radius_km),
        query.min_rating.unwrap_or(0.0),
    )
}

/// GET /nearby
/// Owned and searched restaurants around a point, filtered and enriched
pub async fn nearby(
    service: web::Data<NearbyService>,
    config: web::Data<Config>,
    query: web::Query<NearbyQuery>,
) -> Result<impl Responder, FoodieError> {
    query.validate()?;

    let (radius_km, min_rating) = radius_and_rating(&query, &config);
    let response = service.nearby(query.origin(), radius_km, min_rating).await;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /nearby/geojson
/// Same list as /nearby as a FeatureCollection for map layers
pub async fn nearby_geojson(
    service: web::Data<NearbyService>,
    config: web::Data<Config>,
    query: web::Query<NearbyQuery>,
) -> Result<impl Responder, FoodieError> {
    query.validate()?;

    let (radius_km, min_rating) = radius_and_rating(&query, &config);
    let response = service.nearby(query.origin(), radius_km, min_rating).await;

    Ok(HttpResponse::Ok()
        .content_type("application/geo+json")
        .body(to_feature_collection(&response.restaurants).to_string()))
}

/// GET /nearby/nearest
pub async fn nearest(
    service: web::Data<NearbyService>,
    query: web::Query<NearestQuery>,
) -> Result<impl Responder, FoodieError> {
    query.validate()?;

    let origin = Coordinate::new(query.lat, query.lng);
    let restaurant = service.nearest(origin).await?;
    Ok(HttpResponse::Ok().json(restaurant))
}

/// One Point feature per restaurant; every other field becomes a property
pub fn to_feature_collection(restaurants: &[RestaurantCandidate]) -> FeatureCollection {
    let features = restaurants
        .iter()
        .map(|restaurant| {
            let point: geo_types::Point<f64> = restaurant.position.into();

            let properties: Option<JsonObject> = match serde_json::to_value(restaurant) {
                Ok(Value::Object(mut map)) => {
                    map.remove("position");
                    Some(map)
                }
                _ => None,
            };

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&point))),
                id: restaurant
                    .id
                    .clone()
                    .or_else(|| restaurant.place_id.clone())
                    .map(Id::String),
                properties,
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Configuration for nearby routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/nearby")
            .route("", web::get().to(nearby))
            .route("/geojson", web::get().to(nearby_geojson))
            .route("/nearest", web::get().to(nearest)),
    );
}
