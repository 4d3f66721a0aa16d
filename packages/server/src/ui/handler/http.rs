//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use tilecast_shared::time::timestamp_to_rfc3339;

use crate::{
    infrastructure::dto::http::{HealthDto, StatsDto, TimeDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}

/// Current server time, read from the clock the sync dispatcher uses
pub async fn get_server_time(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimeDto>, StatusCode> {
    let now = state.get_server_time_usecase.execute();

    // Domain Model から DTO への変換
    match timestamp_to_rfc3339(now.value()) {
        Some(iso) => Ok(Json(TimeDto {
            server_time_ms: now.value(),
            iso,
        })),
        None => {
            tracing::error!("Server clock out of range: {}", now.value());
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Connection, code and pairing counters
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsDto> {
    let stats = state.get_stats_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(StatsDto {
        connections: stats.connections,
        admins: stats.admins,
        clients: stats.clients,
        live_codes: stats.live_codes,
        pending_approvals: stats.pending_approvals,
        pairs: stats.pairs,
    })
}
