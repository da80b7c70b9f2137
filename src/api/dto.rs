//! Data Transfer Objects
//!
//! Response types for the API endpoints that are not store types
//! serialized as-is.

use serde::Serialize;

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    /// "connected" or "disconnected"
    pub bus: String,
    /// Connected WebSocket clients
    pub clients: usize,
    /// Readings applied since startup
    pub readings_applied: u64,
    /// Bus messages discarded since startup
    pub messages_rejected: u64,
    pub uptime_seconds: u64,
    pub version: String,
}
