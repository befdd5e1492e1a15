//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client with a JSON error body:
//!
//! ```json
//! {"error": {"kind": "validation_error", "message": "Name is required", "field": "contact_name"}}
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use party_rsvp_core::ValidationError;
use serde::Serialize;
use thiserror::Error;

use crate::services::SubmissionError;
use crate::store::StoreError;

/// Shown to callers when no write credential resolves.
pub const CREDENTIAL_MISSING_MESSAGE: &str = "No GitHub token available. Pass ?token=, store one with \
     PUT /api/session/credential, or set GITHUB_TOKEN on the server.";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Access secret missing or wrong.
    #[error("Access denied")]
    AccessDenied,

    /// No write credential could be resolved.
    #[error("Credential missing")]
    CredentialMissing,

    /// Remote store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Validation(e) => Self::Validation(e),
            SubmissionError::AccessDenied => Self::AccessDenied,
            SubmissionError::CredentialMissing => Self::CredentialMissing,
            SubmissionError::Store(e) => Self::Store(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
}

impl AppError {
    /// Machine-readable error kind for the response body.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::AccessDenied => "access_denied",
            Self::CredentialMissing => "credential_missing",
            Self::Store(StoreError::AuthRejected) => "auth_rejected",
            Self::Store(StoreError::RemoteUnavailable(_)) => "remote_unavailable",
            Self::Store(StoreError::MalformedPayload(_)) => "malformed_payload",
            Self::Store(StoreError::NotFound | StoreError::Internal(_)) | Self::Internal(_) => {
                "internal_error"
            }
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::CredentialMissing => StatusCode::UNAUTHORIZED,
            Self::Store(StoreError::AuthRejected) => StatusCode::BAD_GATEWAY,
            Self::Store(StoreError::RemoteUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Validation(e) => e.message.clone(),
            Self::AccessDenied => "Access denied. Use the link you were sent.".to_string(),
            Self::CredentialMissing => CREDENTIAL_MISSING_MESSAGE.to_string(),
            Self::Store(StoreError::AuthRejected) => {
                "GitHub rejected the token. Check that it is valid and has gist scope.".to_string()
            }
            Self::Store(StoreError::RemoteUnavailable(_)) => {
                "GitHub is unavailable right now. Please try again.".to_string()
            }
            Self::Store(StoreError::MalformedPayload(_)) => {
                "The stored RSVP list could not be read.".to_string()
            }
            Self::Store(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let field = match &self {
            Self::Validation(e) => Some(e.field),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind(),
                message: self.public_message(),
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T, E = AppError> = std::result::Result<T, E>;
