// src/config/db.rs
// DOCUMENTATION: Database connection pool initialization
// PURPOSE: Setup the PostgreSQL pool backing visit history

use crate::config::Config;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Initialize PostgreSQL connection pool
/// DOCUMENTATION: Creates the pool and makes sure the visit_history table exists.
/// Only called when DATABASE_URL is configured.
pub async fn init_db_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    log::info!("Initializing visit history database pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connection_timeout))
        // Connection idle timeout (5 minutes)
        .idle_timeout(Duration::from_secs(300))
        // Connection lifetime (30 minutes before recycle)
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS visit_history (
            id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            place_name TEXT NOT NULL,
            address TEXT NOT NULL,
            cuisine TEXT NOT NULL,
            all_cuisines TEXT[] NOT NULL DEFAULT '{}',
            rating SMALLINT NULL,
            visited_at TIMESTAMPTZ NOT NULL,
            lat DOUBLE PRECISION NOT NULL,
            lng DOUBLE PRECISION NOT NULL,
            PRIMARY KEY (user_id, id)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    log::info!("Database pool initialized successfully");
    Ok(pool)
}
