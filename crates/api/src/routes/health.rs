//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use order_store::Backend;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub operator_sessions: usize,
}

/// GET /health: liveness plus the number of connected operator sessions.
pub async fn check<S: Backend>(State(state): State<Arc<AppState<S>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        operator_sessions: state.hub.active_sessions(),
    })
}
