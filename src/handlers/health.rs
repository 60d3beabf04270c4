// src/handlers/health.rs
// DOCUMENTATION: Health check handler
// PURPOSE: Service status plus cuisine cache and session counters

use crate::config::Config;
use crate::services::{CuisineCache, ProximityRegistry};
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use std::sync::Arc;

pub async fn health_check(
    config: web::Data<Config>,
    cache: web::Data<Arc<CuisineCache>>,
    registry: web::Data<ProximityRegistry>,
) -> impl Responder {
    let cache_stats = cache.stats().await;

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "nomadic-foodie",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": config.environment,
        "visit_store": if config.uses_database() { "postgres" } else { "memory" },
        "cuisine_cache": cache_stats,
        "active_sessions": registry.session_count().await
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
