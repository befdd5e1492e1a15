//! GitHub Gist API client.
//!
//! The RSVP document lives in a single file of a private gist. This module
//! only knows how to create, fetch, and replace that file; document semantics
//! (envelope, metadata, lazy creation) live in [`crate::store`].
//!
//! # Authentication
//!
//! Every call takes the write credential explicitly. The credential is
//! resolved per request (see [`crate::services::credentials`]) so the client
//! itself holds no token.

pub mod client;
pub mod types;

pub use client::GistClient;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the Gist API.
#[derive(Debug, Error)]
pub enum GistError {
    /// Token missing, invalid, expired, or lacking the `gist` scope.
    #[error("GitHub rejected the token ({0})")]
    Unauthorized(StatusCode),

    /// The gist does not exist (or is not visible to this token).
    #[error("Gist not found")]
    NotFound,

    /// Timeout, connection failure, rate limit, or a 5xx from GitHub.
    #[error("Gist API unavailable: {0}")]
    Unavailable(String),

    /// Response body could not be decoded.
    #[error("Failed to decode Gist response: {0}")]
    Decode(String),

    /// Any other non-success response.
    #[error("Gist API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for GistError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}
