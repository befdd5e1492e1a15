//! Guest RSVP submission.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use party_rsvp_core::{Record, RecordInput, ValidationError};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::{AccessSecret, RequestCredentials};
use crate::state::AppState;

/// Response for a stored RSVP.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: &'static str,
    pub rsvp: Record,
}

/// Submit an RSVP.
///
/// POST /api/rsvp
///
/// The access gate is checked inside the workflow, after validation, so a bad
/// form is reported as such even without the secret. Credentials are only
/// resolved once both checks pass.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    access: AccessSecret,
    RequestCredentials(sources): RequestCredentials,
    body: std::result::Result<Json<RecordInput>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let Json(input) = body.map_err(|rejection| {
        ValidationError::new("body", format!("Invalid RSVP payload: {}", rejection.body_text()))
    })?;

    let record = state
        .submissions()
        .submit(input, access.as_deref(), &sources)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            message: "RSVP submitted successfully",
            rsvp: record,
        }),
    ))
}
