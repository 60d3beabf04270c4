// src/handlers/menu.rs
// DOCUMENTATION: Menu handler for owned restaurants

use crate::errors::FoodieError;
use crate::services::NearbyService;
use actix_web::{web, HttpResponse, Responder};

/// GET /restaurants/{id}/menu
pub async fn get_menu(
    service: web::Data<NearbyService>,
    path: web::Path<String>,
) -> Result<impl Responder, FoodieError> {
    let restaurant_id = path.into_inner();
    if restaurant_id.trim().is_empty() {
        return Err(FoodieError::InvalidInput("restaurant id is required".to_string()));
    }

    let menu = service.menu(&restaurant_id).await?;
    Ok(HttpResponse::Ok().json(menu))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/restaurants/{id}/menu", web::get().to(get_menu));
}
