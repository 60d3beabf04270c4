// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, clients, visit store, and start HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use services::{
    start_cleanup_task, CuisineCache, CuisineResolver, GooglePlacesClient, HttpCuisineLookup,
    HttpRestaurantDirectory, InMemoryVisitRecorder, NearbyService, PgVisitRecorder,
    ProximityRegistry, RestaurantAggregator, VisitRecorder,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;

fn exit_on_error<T, E: std::fmt::Display>(result: Result<T, E>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::error!("Failed to initialize {}: {}", what, e);
            std::process::exit(1);
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            config.log_level.as_str()
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    if let Err(e) = config.validate() {
        log::error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!("Starting nomadic-foodie service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Visit history store
    let recorder: Arc<dyn VisitRecorder> = if config.uses_database() {
        let pool = exit_on_error(config::init_db_pool(&config).await, "database");
        Arc::new(PgVisitRecorder::new(pool))
    } else {
        Arc::new(InMemoryVisitRecorder::new())
    };

    // 5. Cuisine cache and resolver
    let cache = Arc::new(CuisineCache::new(config.cuisine_cache_ttl_secs));
    log::info!(
        "Initialized cuisine cache (TTL: {}s)",
        config.cuisine_cache_ttl_secs
    );

    // Start background cleanup task (runs every 5 minutes)
    start_cleanup_task(cache.clone(), 300);

    let timeout = Duration::from_secs(config.http_timeout_secs);
    let lookup = exit_on_error(
        HttpCuisineLookup::new(
            config.cuisine_base_url.clone(),
            timeout,
            config.cuisine_lookups_per_second,
        ),
        "cuisine lookup client",
    );
    let resolver = CuisineResolver::new(Arc::new(lookup), Some(cache.clone()));

    // 6. Restaurant sources
    let places = exit_on_error(
        GooglePlacesClient::new(
            config.google_places_api_key.clone(),
            config.places_base_url.clone(),
            timeout,
        ),
        "place search client",
    );
    let directory = exit_on_error(
        HttpRestaurantDirectory::new(config.directory_base_url.clone(), timeout),
        "restaurant directory client",
    );
    let nearby = NearbyService::new(
        Arc::new(directory),
        Arc::new(places),
        RestaurantAggregator::new(resolver.clone()),
    );

    // 7. Proximity sessions live as long as the server
    let registry = web::Data::new(ProximityRegistry::new(
        recorder.clone(),
        config.proximity_threshold_m,
    ));

    // 8. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();

    HttpServer::new(move || {
        App::new()
            // Application state
            .app_data(web::Data::new(config_clone.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(recorder.clone()))
            .app_data(web::Data::new(resolver.clone()))
            .app_data(web::Data::new(nearby.clone()))
            .app_data(registry.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::nearby_config)
            .configure(handlers::menu_config)
            .configure(handlers::photos_config)
            .configure(handlers::proximity_config)
            .configure(handlers::visits_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
