//! Admin handlers: list, stats, overview, and clear.
//!
//! Every handler takes [`RequireAccess`] first, then [`RequireCredential`].

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use party_rsvp_core::{AggregateStats, Record};
use serde::Serialize;
use tracing::instrument;

use crate::db::Overview;
use crate::error::Result;
use crate::middleware::{RequireAccess, RequireCredential};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RsvpList {
    pub rsvps: Vec<Record>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared_at: Option<DateTime<Utc>>,
}

/// GET /api/admin/rsvps
#[instrument(skip_all)]
pub async fn list_rsvps(
    _: RequireAccess,
    RequireCredential(credential): RequireCredential,
    State(state): State<AppState>,
) -> Result<Json<RsvpList>> {
    let rsvps = state.repository().list(&credential).await?;
    Ok(Json(RsvpList {
        total: rsvps.len(),
        rsvps,
    }))
}

/// GET /api/admin/stats
#[instrument(skip_all)]
pub async fn stats(
    _: RequireAccess,
    RequireCredential(credential): RequireCredential,
    State(state): State<AppState>,
) -> Result<Json<AggregateStats>> {
    Ok(Json(state.repository().stats(&credential).await?))
}

/// GET /api/admin/overview
#[instrument(skip_all)]
pub async fn overview(
    _: RequireAccess,
    RequireCredential(credential): RequireCredential,
    State(state): State<AppState>,
) -> Result<Json<Overview>> {
    Ok(Json(state.repository().overview(&credential).await?))
}

/// POST /api/admin/clear
#[instrument(skip_all)]
pub async fn clear(
    _: RequireAccess,
    RequireCredential(credential): RequireCredential,
    State(state): State<AppState>,
) -> Result<Json<ClearResponse>> {
    let document = state.repository().clear_all(&credential).await?;
    tracing::warn!(source = %credential.source(), "All RSVPs cleared");
    Ok(Json(ClearResponse {
        success: true,
        message: "All RSVPs cleared",
        cleared_at: document.cleared_at,
    }))
}
