//! Weekly lock status handler

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LockStatusResponse {
    pub locked: bool,
    pub next_available_at: Option<String>,
}

/// GET /api/v1/lock-status
///
/// Public, unauthenticated: clients poll this to render the weekend
/// countdown before offering skip/swap controls.
pub async fn lock_status(State(state): State<AppState>) -> Json<LockStatusResponse> {
    let status = state.subscriptions.lock_status();

    Json(LockStatusResponse {
        locked: status.locked,
        next_available_at: status.next_available_at.map(|t| t.to_rfc3339()),
    })
}
