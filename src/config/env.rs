// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use dotenv::dotenv;
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1")
    pub server_address: String,

    /// Server listen port (default 8003)
    pub server_port: u16,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// PostgreSQL connection string for visit history.
    /// Empty means visits are kept in memory for the lifetime of the process.
    pub database_url: String,

    /// Maximum connections in database pool
    pub db_max_connections: u32,

    /// Connection timeout in seconds
    pub db_connection_timeout: u64,

    /// Google Places API Key
    pub google_places_api_key: String,

    /// Base URL of the Google Places web service
    pub places_base_url: String,

    /// Base URL of the owned restaurant directory (`/api/restaurants`)
    pub directory_base_url: String,

    /// Base URL of the cuisine lookup service (`/api/foursquare/cuisine`)
    pub cuisine_base_url: String,

    /// Timeout for every outbound HTTP call
    pub http_timeout_secs: u64,

    /// How long a resolved cuisine stays cached
    pub cuisine_cache_ttl_secs: u64,

    /// Outbound cuisine lookups allowed per second
    pub cuisine_lookups_per_second: u32,

    /// Search radius used when the request does not specify one
    pub default_radius_km: f64,

    /// Distance under which the user counts as arrived
    pub proximity_threshold_m: f64,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at application startup
    pub fn from_env() -> Self {
        dotenv().ok();

        Config {
            server_address: var_or("SERVER_ADDRESS", "127.0.0.1"),
            server_port: parse_or("SERVER_PORT", 8003),
            environment: var_or("ENVIRONMENT", "development"),
            log_level: var_or("LOG_LEVEL", "info"),
            database_url: var_or("DATABASE_URL", ""),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            db_connection_timeout: parse_or("DB_CONNECTION_TIMEOUT", 30),
            google_places_api_key: var_or("GOOGLE_PLACES_API_KEY", ""),
            places_base_url: var_or(
                "PLACES_BASE_URL",
                "https://maps.googleapis.com/maps/api/place",
            ),
            directory_base_url: var_or("DIRECTORY_BASE_URL", "http://localhost:5003"),
            cuisine_base_url: var_or("FOURSQUARE_SERVER_URL", "http://localhost:5003"),
            http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", 10),
            cuisine_cache_ttl_secs: parse_or("CUISINE_CACHE_TTL_SECS", 3600),
            cuisine_lookups_per_second: parse_or("CUISINE_LOOKUPS_PER_SECOND", 20),
            default_radius_km: parse_or("DEFAULT_RADIUS_KM", 10.0),
            proximity_threshold_m: parse_or("PROXIMITY_THRESHOLD_M", 100.0),
        }
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Ensures application can start safely
    pub fn validate(&self) -> Result<(), String> {
        if self.cuisine_lookups_per_second == 0 {
            return Err("CUISINE_LOOKUPS_PER_SECOND must be greater than zero".to_string());
        }

        if !(self.proximity_threshold_m > 0.0) {
            return Err("PROXIMITY_THRESHOLD_M must be a positive distance".to_string());
        }

        if !(self.default_radius_km > 0.0) {
            return Err("DEFAULT_RADIUS_KM must be a positive distance".to_string());
        }

        if self.google_places_api_key.is_empty() {
            log::warn!("GOOGLE_PLACES_API_KEY not configured - place search results will be empty");
        }

        if self.database_url.is_empty() {
            log::warn!("DATABASE_URL not configured - visit history is kept in memory only");
        }

        Ok(())
    }

    /// Whether visits should be persisted in PostgreSQL
    pub fn uses_database(&self) -> bool {
        !self.database_url.is_empty()
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Config {
            server_address: "127.0.0.1".to_string(),
            server_port: 8003,
            environment: "test".to_string(),
            log_level: "debug".to_string(),
            database_url: String::new(),
            db_max_connections: 1,
            db_connection_timeout: 1,
            google_places_api_key: String::new(),
            places_base_url: "http://127.0.0.1:9".to_string(),
            directory_base_url: "http://127.0.0.1:9".to_string(),
            cuisine_base_url: "http://127.0.0.1:9".to_string(),
            http_timeout_secs: 2,
            cuisine_cache_ttl_secs: 60,
            cuisine_lookups_per_second: 100,
            default_radius_km: 10.0,
            proximity_threshold_m: 100.0,
        }
    }
}
