//! Gist API client.
//!
//! Wraps the three calls the document store needs: create, fetch, and replace
//! a single named file. Requests are bounded by the configured timeout so a
//! hung GitHub connection surfaces as [`GistError::Unavailable`].

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::GistError;
use super::types::{ApiErrorBody, CreateGist, FileContent, Gist, UpdateGist};
use crate::config::GistConfig;

/// GitHub REST API version header value.
const API_VERSION: &str = "2022-11-28";

/// User agent sent with every request (GitHub rejects requests without one).
const USER_AGENT: &str = concat!("party-rsvp/", env!("CARGO_PKG_VERSION"));

/// Client for the gist holding the RSVP document.
#[derive(Clone)]
pub struct GistClient {
    inner: Arc<GistClientInner>,
}

struct GistClientInner {
    client: reqwest::Client,
    api_base: String,
    filename: String,
    description: String,
}

impl std::fmt::Debug for GistClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GistClient")
            .field("api_base", &self.inner.api_base)
            .field("filename", &self.inner.filename)
            .finish_non_exhaustive()
    }
}

impl GistClient {
    /// Create a new Gist client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &GistConfig) -> Result<Self, GistError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(GistClientInner {
                client,
                api_base: config.api_base.trim_end_matches('/').to_string(),
                filename: config.filename.clone(),
                description: config.description.clone(),
            }),
        })
    }

    /// Create a private gist containing `content` and return its id.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or GitHub rejects it.
    #[instrument(skip(self, token, content), fields(bytes = content.len()))]
    pub async fn create(&self, token: &SecretString, content: &str) -> Result<String, GistError> {
        let body = CreateGist {
            description: &self.inner.description,
            public: false,
            files: self.single_file(content),
        };

        let response = self
            .inner
            .client
            .post(format!("{}/gists", self.inner.api_base))
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let gist: Gist = check(response).await?.json().await?;
        tracing::info!(gist_id = %gist.id, "Created gist");
        Ok(gist.id)
    }

    /// Fetch the document file from a gist.
    ///
    /// Returns `Ok(None)` when the gist exists but has no document file, and
    /// `Err(GistError::NotFound)` when the gist itself is gone.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or GitHub rejects it.
    #[instrument(skip(self, token), fields(gist_id = %gist_id))]
    pub async fn fetch(
        &self,
        token: &SecretString,
        gist_id: &str,
    ) -> Result<Option<String>, GistError> {
        let response = self
            .inner
            .client
            .get(format!("{}/gists/{gist_id}", self.inner.api_base))
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        let mut gist: Gist = check(response).await?.json().await?;
        let Some(file) = gist.files.remove(&self.inner.filename) else {
            tracing::warn!(filename = %self.inner.filename, "Gist has no document file");
            return Ok(None);
        };

        match (file.truncated, file.raw_url, file.content) {
            (true, Some(raw_url), _) => self.fetch_raw(token, &raw_url).await.map(Some),
            (_, _, content) => Ok(content),
        }
    }

    /// Replace the document file's content.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or GitHub rejects it.
    #[instrument(skip(self, token, content), fields(gist_id = %gist_id, bytes = content.len()))]
    pub async fn update(
        &self,
        token: &SecretString,
        gist_id: &str,
        content: &str,
    ) -> Result<(), GistError> {
        let body = UpdateGist {
            description: &self.inner.description,
            files: self.single_file(content),
        };

        let response = self
            .inner
            .client
            .patch(format!("{}/gists/{gist_id}", self.inner.api_base))
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    /// Download a truncated file in full.
    ///
    /// The gist itself was just fetched, so a 404 here means the raw download
    /// failed, not that the document is gone; it maps to
    /// [`GistError::Unavailable`].
    async fn fetch_raw(&self, token: &SecretString, raw_url: &str) -> Result<String, GistError> {
        tracing::debug!("Document truncated in gist response; fetching raw file");
        let response = self
            .inner
            .client
            .get(raw_url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        match check(response).await {
            Ok(response) => Ok(response.text().await?),
            Err(GistError::NotFound) => Err(GistError::Unavailable(
                "raw document file not found".to_string(),
            )),
            Err(e) => Err(e),
        }
    }

    fn single_file<'a>(&'a self, content: &'a str) -> BTreeMap<&'a str, FileContent<'a>> {
        BTreeMap::from([(self.inner.filename.as_str(), FileContent { content })])
    }
}

/// Map a non-success response to a [`GistError`].
async fn check(response: Response) -> Result<Response, GistError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // GitHub signals primary rate limiting with a 403 and an exhausted quota.
    let rate_limited = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|remaining| remaining == "0");

    let message = response
        .json::<ApiErrorBody>()
        .await
        .map(|body| body.message)
        .unwrap_or_default();

    tracing::debug!(status = %status, message = %message, "Gist API returned an error");

    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => GistError::Unavailable(format!("rate limited: {message}")),
        StatusCode::FORBIDDEN if rate_limited => {
            GistError::Unavailable(format!("rate limited: {message}"))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GistError::Unauthorized(status),
        StatusCode::NOT_FOUND => GistError::NotFound,
        s if s.is_server_error() => GistError::Unavailable(format!("{s}: {message}")),
        s => GistError::Api {
            status: s.as_u16(),
            message,
        },
    })
}
