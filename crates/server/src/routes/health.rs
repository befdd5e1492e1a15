//! Liveness and access-check handlers.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::middleware::RequireAccess;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not contact GitHub.
pub async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub valid: bool,
    /// True when no access secret is configured.
    pub open: bool,
}

/// Report that the supplied access secret passes the gate.
///
/// GET /api/access
///
/// Rejected with 403 `access_denied` otherwise, so the guest page can show
/// its "ask the host for the link" message.
pub async fn check_access(_: RequireAccess, State(state): State<AppState>) -> Json<AccessResponse> {
    Json(AccessResponse {
        valid: true,
        open: state.gate().is_open(),
    })
}
