//! Session credential handlers.
//!
//! Lets an operator supply a GitHub token once and have it used for the rest
//! of the browser session, ahead of the deployment token.

use axum::{
    Json,
    extract::rejection::JsonRejection,
};
use party_rsvp_core::ValidationError;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::middleware::RequireAccess;
use crate::middleware::session::{clear_session_credential, set_session_credential};

#[derive(Deserialize)]
pub struct CredentialForm {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub stored: bool,
}

/// PUT /api/session/credential
pub async fn store_credential(
    _: RequireAccess,
    session: Session,
    body: std::result::Result<Json<CredentialForm>, JsonRejection>,
) -> Result<Json<SessionResponse>> {
    let Json(form) = body.map_err(|rejection| ValidationError::new("body", rejection.body_text()))?;
    let token = form.token.trim();
    if token.is_empty() {
        return Err(ValidationError::new("token", "Token is required").into());
    }

    set_session_credential(&session, &SecretString::from(token.to_owned()))
        .await
        .map_err(|e| AppError::Internal(format!("session store: {e}")))?;
    tracing::info!("Session credential stored");

    Ok(Json(SessionResponse {
        success: true,
        stored: true,
    }))
}

/// DELETE /api/session/credential
pub async fn forget_credential(
    _: RequireAccess,
    session: Session,
) -> Result<Json<SessionResponse>> {
    let removed = clear_session_credential(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session store: {e}")))?;
    if removed {
        tracing::info!("Session credential removed");
    }

    Ok(Json(SessionResponse {
        success: true,
        stored: false,
    }))
}
