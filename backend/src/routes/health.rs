//! Health check endpoints
//!
//! - /health - Basic health check
//! - /health/ready - Readiness check, round-trips to Postgres
//! - /health/live - Liveness check

use crate::{db, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::time::Instant;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

impl HealthResponse {
    fn new(status: &'static str) -> Self {
        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            checks: None,
        }
    }
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: CheckStatus,
}

/// Status of an individual check
#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub healthy: bool,
    pub latency_ms: u64,
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::new("healthy"))
}

/// Readiness check
///
/// Returns 503 while the database is unreachable. The failure cause is
/// logged by [`db::health_check`], not echoed to the caller.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let started = Instant::now();
    let healthy = db::health_check(state.db()).await.is_ok();
    let database = CheckStatus {
        healthy,
        latency_ms: started.elapsed().as_millis() as u64,
    };

    let mut response = HealthResponse::new(if healthy { "ready" } else { "not_ready" });
    response.checks = Some(HealthChecks { database });

    if healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Liveness check, OK whenever the server is running
pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse::new("alive"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_returns_healthy() {
        let response = health_check().await;
        assert_eq!(response.status, "healthy");
        assert!(!response.version.is_empty());
    }

    #[tokio::test]
    async fn test_liveness_check_returns_alive() {
        let response = liveness_check().await;
        assert_eq!(response.status, "alive");
        assert!(response.checks.is_none());
    }
}
