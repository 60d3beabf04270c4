// src/handlers/visits.rs
// DOCUMENTATION: Visit history handlers
// PURPOSE: List a user's rated visits and change a past rating

use crate::errors::FoodieError;
use crate::models::{UpdateVisitRequest, VisitHistoryResponse};
use crate::services::VisitRecorder;
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

/// GET /visits/{user_id}
/// Newest first
pub async fn list_visits(
    recorder: web::Data<Arc<dyn VisitRecorder>>,
    path: web::Path<String>,
) -> Result<impl Responder, FoodieError> {
    let user_id = path.into_inner();
    let mut visits = recorder.list_visits(&user_id).await?;
    visits.sort_by(|a, b| b.timestamp_utc.cmp(&a.timestamp_utc));

    Ok(HttpResponse::Ok().json(VisitHistoryResponse {
        total: visits.len(),
        visits,
    }))
}

/// PUT /visits/{user_id}/{visit_id}
pub async fn update_visit(
    recorder: web::Data<Arc<dyn VisitRecorder>>,
    path: web::Path<(String, String)>,
    req: web::Json<UpdateVisitRequest>,
) -> Result<impl Responder, FoodieError> {
    let (user_id, visit_id) = path.into_inner();
    let visit = recorder
        .update_rating(&user_id, &visit_id, req.rating)
        .await?;

    log::info!("Visit {} of {} re-rated: {:?}", visit_id, user_id, req.rating);
    Ok(HttpResponse::Ok().json(visit))
}

/// Configuration for visit history routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/visits")
            .route("/{user_id}", web::get().to(list_visits))
            .route("/{user_id}/{visit_id}", web::put().to(update_visit)),
    );
}
