//! Database connection and pool management
//!
//! Pool construction from [`DatabaseConfig`], embedded migrations and the
//! readiness check query.

use crate::config::DatabaseConfig;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const MIN_CONNECTIONS: u32 = 1;
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(MIN_CONNECTIONS.min(config.max_connections))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .test_before_acquire(true)
}

/// Connect a PostgreSQL pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let connect_options = PgConnectOptions::from_str(&config.url)?.application_name("tasktrack");
    let pool = pool_options(config).connect_with(connect_options).await?;

    info!(
        max_connections = config.max_connections,
        acquire_timeout_secs = config.acquire_timeout_secs,
        "Connected to PostgreSQL"
    );

    Ok(pool)
}

/// Apply pending migrations from `backend/migrations`
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}

/// Round-trip to the database, returning its clock
pub async fn health_check(pool: &PgPool) -> Result<DateTime<Utc>> {
    sqlx::query_scalar::<_, DateTime<Utc>>("SELECT NOW()")
        .fetch_one(pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Database health check failed");
            e.into()
        })
}
