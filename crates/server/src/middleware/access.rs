//! Access-gate and credential extractors.
//!
//! Admin handlers list [`RequireAccess`] before [`RequireCredential`]; axum
//! runs extractors in argument order, so a caller without the access secret
//! is turned away before any credential is resolved.

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;

use super::session::session_credential;
use crate::error::AppError;
use crate::services::{CredentialSources, WriteCredential};
use crate::state::AppState;

/// Header alternative to the `access` query parameter.
pub const ACCESS_HEADER: &str = "x-access-token";

#[derive(Debug, Default, Deserialize)]
struct GateParams {
    access: Option<String>,
    token: Option<String>,
}

fn gate_params(parts: &Parts) -> GateParams {
    Query::<GateParams>::try_from_uri(&parts.uri)
        .map(|Query(params)| params)
        .unwrap_or_default()
}

/// Access secret supplied with the request, unchecked.
///
/// Taken from `?access=` or, failing that, the `X-Access-Token` header.
#[derive(Debug, Clone, Default)]
pub struct AccessSecret(pub Option<String>);

impl AccessSecret {
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for AccessSecret
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_query = gate_params(parts).access;
        let from_header = || {
            parts
                .headers
                .get(ACCESS_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        Ok(Self(from_query.or_else(from_header)))
    }
}

/// Extractor that rejects requests failing the access gate.
#[derive(Debug, Clone, Copy)]
pub struct RequireAccess;

impl FromRequestParts<AppState> for RequireAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(secret) = AccessSecret::from_request_parts(parts, state).await;
        if state.gate().check(secret.as_deref()) {
            Ok(Self)
        } else {
            Err(AppError::AccessDenied)
        }
    }
}

/// Every credential candidate for this request, not yet resolved.
///
/// Combines `?token=`, the session credential, and the deployment sources.
#[derive(Debug, Clone)]
pub struct RequestCredentials(pub CredentialSources);

impl FromRequestParts<AppState> for RequestCredentials {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let mut sources = state.deployment_credentials();
        sources.request = gate_params(parts).token.map(SecretString::from);
        if let Some(session) = parts.extensions.get::<Session>() {
            sources.session = session_credential(session).await;
        }
        Ok(Self(sources))
    }
}

/// Extractor that resolves the write credential or rejects with
/// `credential_missing`.
#[derive(Debug, Clone)]
pub struct RequireCredential(pub WriteCredential);

impl FromRequestParts<AppState> for RequireCredential {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(RequestCredentials(sources)) =
            RequestCredentials::from_request_parts(parts, state).await;
        let credential = sources
            .resolve_write_credential()
            .ok_or(AppError::CredentialMissing)?;
        tracing::debug!(source = %credential.source(), "Write credential resolved");
        Ok(Self(credential))
    }
}
