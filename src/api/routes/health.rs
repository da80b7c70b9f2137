//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe. The pull endpoints serve whatever state
/// exists even while the broker is unreachable, so the bus does not gate
/// readiness.
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let bus_ok = state.bus_status.is_connected();

    Json(HealthResponse {
        status: if bus_ok { "healthy" } else { "degraded" }.to_string(),
        bus: if bus_ok { "connected" } else { "disconnected" }.to_string(),
        clients: state.ws_connection_count().await,
        readings_applied: state.pipeline.applied_count(),
        messages_rejected: state.messages_rejected(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_independent_of_bus() {
        assert_eq!(readiness().await, StatusCode::OK);
    }
}
