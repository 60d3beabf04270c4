// src/handlers/photos.rs
// DOCUMENTATION: Photo relay for place-search results
// PURPOSE: Serve provider photos without handing the provider key to clients

use crate::errors::FoodieError;
use crate::models::PhotoQuery;
use crate::services::{NearbyService, LIST_PHOTO_WIDTH};
use actix_web::{http::header, web, HttpResponse, Responder};
use validator::Validate;

/// GET /photos/{reference}?maxwidth=
pub async fn get_photo(
    service: web::Data<NearbyService>,
    path: web::Path<String>,
    query: web::Query<PhotoQuery>,
) -> Result<impl Responder, FoodieError> {
    query.validate()?;

    let reference = path.into_inner();
    if !reference
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(FoodieError::InvalidInput("malformed photo reference".to_string()));
    }

    let photo = service
        .photo(&reference, query.maxwidth.unwrap_or(LIST_PHOTO_WIDTH))
        .await?;

    Ok(HttpResponse::Ok()
        .content_type(photo.content_type)
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(photo.bytes))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/photos/{reference}", web::get().to(get_photo));
}
