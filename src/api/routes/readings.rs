//! Reading Routes
//!
//! Pull-based, read-only access to the sensor state.
//!
//! - GET /api/current - Latest value per channel and `last_update`
//! - GET /api/history - Every channel's history
//! - GET /api/history/:channel - One channel's history

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::store::{CurrentReadings, HistoryMap, Reading};

/// GET /api/current
pub async fn get_current(State(state): State<Arc<AppState>>) -> Json<CurrentReadings> {
    tracing::debug!("Current readings requested");
    Json(state.store.current().await)
}

/// GET /api/history
pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<HistoryMap> {
    tracing::debug!("History requested");
    Json(state.store.history().await)
}

/// GET /api/history/:channel
///
/// 404 for channels that are not configured.
pub async fn get_channel_history(
    State(state): State<Arc<AppState>>,
    Path(channel): Path<String>,
) -> ApiResult<Json<Vec<Reading>>> {
    let history = state.store.channel_history(&channel).await?;
    Ok(Json(history))
}
