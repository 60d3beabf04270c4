// src/handlers/proximity.rs
// DOCUMENTATION: HTTP handlers for arrival detection
// PURPOSE: Arm a destination, stream positions, answer or dismiss the rating prompt

use crate::errors::FoodieError;
use crate::models::{
    ArmRequest, Destination, DestinationRequest, PositionReport, RatingRequest, UNKNOWN,
};
use crate::services::{CuisineResolver, ProximityRegistry};
use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

fn text_or_unknown(value: Option<&String>) -> String {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

async fn build_destination(resolver: &CuisineResolver, req: &DestinationRequest) -> Destination {
    let position = req.position();
    let hint = req.cuisine_hint();
    let cuisine = resolver.resolve(position, hint.as_deref()).await;

    Destination {
        name: text_or_unknown(req.name.as_ref()),
        address: text_or_unknown(req.address.as_ref()),
        position,
        cuisine,
        rating: req.rating,
    }
}

/// POST /proximity/{user_id}
/// Arm a destination; needs the current fix or fails with the geolocation error
pub async fn arm(
    registry: web::Data<ProximityRegistry>,
    resolver: web::Data<CuisineResolver>,
    path: web::Path<String>,
    req: web::Json<ArmRequest>,
) -> Result<impl Responder, FoodieError> {
    req.validate()?;

    let user_id = path.into_inner();
    let initial_fix = req.initial_fix().map_err(|e| {
        log::info!("Cannot arm proximity for {}: {}", user_id, e);
        e
    })?;

    let destination = build_destination(&resolver, &req.destination).await;
    let snapshot = registry
        .arm(&user_id, destination, initial_fix, req.utc_offset())
        .await?;

    Ok(HttpResponse::Ok().json(snapshot))
}

/// GET /proximity/{user_id}
pub async fn snapshot(
    registry: web::Data<ProximityRegistry>,
    path: web::Path<String>,
) -> Result<impl Responder, FoodieError> {
    let snapshot = registry.snapshot(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// POST /proximity/{user_id}/position
/// Device errors during a session are ignored; the session keeps waiting
pub async fn report_position(
    registry: web::Data<ProximityRegistry>,
    path: web::Path<String>,
    req: web::Json<PositionReport>,
) -> Result<impl Responder, FoodieError> {
    let user_id = path.into_inner();

    if let Some(error) = req.error {
        log::debug!("Position error from {}: {:?}", user_id, error);
        let snapshot = registry.snapshot(&user_id).await?;
        return Ok(HttpResponse::Ok().json(snapshot));
    }

    let position = req
        .position
        .ok_or_else(|| FoodieError::InvalidInput("position or error is required".to_string()))?;
    position.validate()?;

    let snapshot = registry.report_position(&user_id, position).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// POST /proximity/{user_id}/rating
pub async fn submit_rating(
    registry: web::Data<ProximityRegistry>,
    path: web::Path<String>,
    req: web::Json<RatingRequest>,
) -> Result<impl Responder, FoodieError> {
    let visit = registry
        .submit_rating(&path.into_inner(), req.rating)
        .await?;
    Ok(HttpResponse::Created().json(visit))
}

/// POST /proximity/{user_id}/dismiss
pub async fn dismiss(
    registry: web::Data<ProximityRegistry>,
    path: web::Path<String>,
) -> Result<impl Responder, FoodieError> {
    let snapshot = registry.dismiss(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// DELETE /proximity/{user_id}
/// Clear the route; succeeds with or without an active session
pub async fn clear(
    registry: web::Data<ProximityRegistry>,
    path: web::Path<String>,
) -> impl Responder {
    let snapshot = registry.clear(&path.into_inner()).await;
    HttpResponse::Ok().json(snapshot)
}

/// Configuration for proximity routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/proximity")
            .route("/{user_id}", web::post().to(arm))
            .route("/{user_id}", web::get().to(snapshot))
            .route("/{user_id}", web::delete().to(clear))
            .route("/{user_id}/position", web::post().to(report_position))
            .route("/{user_id}/rating", web::post().to(submit_rating))
            .route("/{user_id}/dismiss", web::post().to(dismiss)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cuisine_resolver::tests::FakeLookup;
    use crate::services::{InMemoryVisitRecorder, VisitRecorder};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};
    use std::sync::Arc;

    macro_rules! init_app {
        ($recorder:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(ProximityRegistry::new($recorder, 100.0)))
                    .app_data(web::Data::new(CuisineResolver::new(
                        FakeLookup::answering(&["Cafe"]),
                        None,
                    )))
                    .configure(config),
            )
            .await
        };
    }

    fn arm_body(lat_offset: f64) -> Value {
        json!({
            "destination": {
                "name": "Dosa Corner",
                "address": "MG Road",
                "lat": 12.9716,
                "lng": 77.5946
            },
            "position": {"lat": 12.9716 + lat_offset, "lng": 77.5946},
            "utc_offset_minutes": 330
        })
    }

    #[actix_web::test]
    async fn test_arm_arrive_and_rate() {
        let recorder = Arc::new(InMemoryVisitRecorder::new());
        let app = init_app!(recorder.clone());

        let req = test::TestRequest::post()
            .uri("/proximity/u1")
            .set_json(arm_body(0.01))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "armed");
        assert_eq!(body["destination"]["cuisine"][0], "Cafe");

        let req = test::TestRequest::post()
            .uri("/proximity/u1/position")
            .set_json(json!({"position": {"lat": 12.9717, "lng": 77.5946}}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "triggered");
        assert_eq!(body["prompt_open"], true);

        let req = test::TestRequest::post()
            .uri("/proximity/u1/rating")
            .set_json(json!({"rating": 1}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        assert_eq!(recorder.list_visits("u1").await.unwrap().len(), 1);

        let req = test::TestRequest::get().uri("/proximity/u1").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "resolved");
    }

    #[actix_web::test]
    async fn test_geolocation_denied() {
        let app = init_app!(Arc::new(InMemoryVisitRecorder::new()));

        let req = test::TestRequest::post()
            .uri("/proximity/u1")
            .set_json(json!({
                "destination": {"name": "Dosa Corner", "lat": 12.9716, "lng": 77.5946},
                "geolocation_error": "denied"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_rating_without_prompt_is_conflict() {
        let app = init_app!(Arc::new(InMemoryVisitRecorder::new()));

        let req = test::TestRequest::post()
            .uri("/proximity/u1")
            .set_json(arm_body(0.01))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/proximity/u1/rating")
            .set_json(json!({"rating": 0}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_dismiss_and_clear() {
        let app = init_app!(Arc::new(InMemoryVisitRecorder::new()));

        // Armed right next to the destination
        let req = test::TestRequest::post()
            .uri("/proximity/u1")
            .set_json(arm_body(0.0001))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "triggered");

        let req = test::TestRequest::post().uri("/proximity/u1/dismiss").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["state"], "resolved");

        for _ in 0..2 {
            let req = test::TestRequest::delete().uri("/proximity/u1").to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["state"], "idle");
        }
    }

    #[actix_web::test]
    async fn test_position_errors_are_ignored() {
        let app = init_app!(Arc::new(InMemoryVisitRecorder::new()));

        let req = test::TestRequest::post()
            .uri("/proximity/u1")
            .set_json(arm_body(0.01))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/proximity/u1/position")
            .set_json(json!({"error": "timeout"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["state"], "armed");
    }
}
