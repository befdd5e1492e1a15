//! Integration test support for Party RSVP.
//!
//! Tests run against [`FakeGistApi`], an in-process stand-in for the GitHub
//! Gist endpoints the server uses, bound to an ephemeral port. The server's
//! `GIST_API_BASE` points at it, so the real client, store, repository, and
//! router are exercised end to end without network access.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p party-rsvp-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use party_rsvp_server::config::{ConfigError, ServerConfig};
use party_rsvp_server::services::{CredentialSource, WriteCredential};
use party_rsvp_server::state::AppState;
use party_rsvp_server::store::{ReferenceSlot, StoreReference};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};

/// Deployment token accepted by the fake.
pub const CONFIG_TOKEN: &str = "config-token";
/// Second accepted token, for session and request overrides.
pub const OTHER_TOKEN: &str = "other-token";
/// Token the fake rejects with 401.
pub const BAD_TOKEN: &str = "bad-token";
/// Access secret used by gated test deployments.
pub const ACCESS_SECRET: &str = "Bday-Kq7z-2025";
/// File name the fake and the server agree on.
pub const FILENAME: &str = "rsvps.json";

#[derive(Default)]
struct FakeState {
    base_url: String,
    gists: Mutex<HashMap<String, BTreeMap<String, String>>>,
    /// Gists served with a truncated file, mapped to whether `raw_url` works.
    truncated: Mutex<HashMap<String, bool>>,
    tokens_seen: Mutex<Vec<String>>,
    calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl FakeState {
    fn gists(&self) -> MutexGuard<'_, HashMap<String, BTreeMap<String, String>>> {
        self.gists.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn truncated(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        self.truncated
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// In-process fake of the Gist API.
#[derive(Clone)]
pub struct FakeGistApi {
    addr: SocketAddr,
    state: Arc<FakeState>,
}

#[derive(Deserialize)]
struct FilesBody {
    #[serde(default)]
    files: BTreeMap<String, FileBody>,
}

#[derive(Deserialize)]
struct FileBody {
    content: String,
}

impl FakeGistApi {
    /// Start the fake on `127.0.0.1:0`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake gist API");
        let addr = listener.local_addr().expect("Listener has no address");

        let state = Arc::new(FakeState {
            base_url: format!("http://{addr}"),
            ..FakeState::default()
        });
        let app = Router::new()
            .route("/gists", post(create_gist))
            .route("/gists/{id}", get(get_gist).patch(update_gist))
            .route("/raw/{id}", get(get_raw))
            .with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Base URL for `GIST_API_BASE`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of requests received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Number of gists that exist.
    #[must_use]
    pub fn gist_count(&self) -> usize {
        self.state.gists().len()
    }

    /// Bearer tokens received, in order.
    #[must_use]
    pub fn tokens_seen(&self) -> Vec<String> {
        self.state
            .tokens_seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Parsed document stored in gist `id`.
    #[must_use]
    pub fn document(&self, id: &str) -> Option<Value> {
        let gists = self.state.gists();
        let content = gists.get(id)?.get(FILENAME)?;
        serde_json::from_str(content).ok()
    }

    /// Put a gist in place directly, bypassing the API.
    pub fn insert(&self, id: &str, content: &str) {
        self.state.gists().insert(
            id.to_string(),
            BTreeMap::from([(FILENAME.to_string(), content.to_string())]),
        );
    }

    /// Delete a gist behind the server's back.
    pub fn delete(&self, id: &str) {
        self.state.gists().remove(id);
    }

    /// Serve gist `id` with its document file marked truncated.
    ///
    /// The full text is then only available from `raw_url`, which answers
    /// 404 unless `raw_available` is set.
    pub fn truncate(&self, id: &str, raw_available: bool) {
        self.state.truncated().insert(id.to_string(), raw_available);
    }
}

/// Start a listener that accepts connections and never answers.
///
/// Returns a base URL for `GIST_API_BASE`.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn start_unresponsive_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind unresponsive server");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _socket = socket;
                std::future::pending::<()>().await;
            });
        }
    });
    format!("http://{addr}")
}

/// Check the bearer token; `Err` carries the 401 response.
fn authorize(state: &FakeState, headers: &HeaderMap) -> Result<(), Response> {
    state.calls.fetch_add(1, Ordering::SeqCst);

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();

    state
        .tokens_seen
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push(token.clone());

    if token == CONFIG_TOKEN || token == OTHER_TOKEN {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Bad credentials"})),
        )
            .into_response())
    }
}

fn gist_json(state: &FakeState, id: &str, files: &BTreeMap<String, String>) -> Value {
    let truncated = state.truncated().contains_key(id);
    let files: serde_json::Map<String, Value> = files
        .iter()
        .map(|(name, content)| {
            let file = if truncated {
                let cut: String = content.chars().take(8).collect();
                json!({
                    "filename": name,
                    "content": cut,
                    "truncated": true,
                    "raw_url": format!("{}/raw/{id}", state.base_url),
                })
            } else {
                json!({"filename": name, "content": content, "truncated": false})
            };
            (name.clone(), file)
        })
        .collect();
    json!({"id": id, "files": files})
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response()
}

async fn create_gist(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<FilesBody>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }

    let id = format!("gist{}", state.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    let files: BTreeMap<String, String> = body
        .files
        .into_iter()
        .map(|(name, file)| (name, file.content))
        .collect();
    let response = gist_json(&state, &id, &files);
    state.gists().insert(id, files);

    (StatusCode::CREATED, Json(response)).into_response()
}

async fn get_gist(
    State(state): State<Arc<FakeState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }

    let gists = state.gists();
    gists.get(&id).map_or_else(not_found, |files| {
        Json(gist_json(&state, &id, files)).into_response()
    })
}

async fn get_raw(
    State(state): State<Arc<FakeState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }

    if state.truncated().get(&id) != Some(&true) {
        return not_found();
    }
    let gists = state.gists();
    gists
        .get(&id)
        .and_then(|files| files.get(FILENAME))
        .map_or_else(not_found, |content| content.clone().into_response())
}

async fn update_gist(
    State(state): State<Arc<FakeState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<FilesBody>,
) -> Response {
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }

    let mut gists = state.gists();
    let Some(files) = gists.get_mut(&id) else {
        return not_found();
    };
    for (name, file) in body.files {
        files.insert(name, file.content);
    }
    Json(gist_json(&state, &id, files)).into_response()
}

/// Server config pointed at `api`, with overrides applied on top.
///
/// Defaults: deployment token [`CONFIG_TOKEN`], no access secret, no SMTP.
///
/// # Errors
///
/// Returns `ConfigError` if an override is invalid.
pub fn config_for(api: &FakeGistApi, overrides: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("GIST_API_BASE".to_string(), api.base_url()),
        ("GIST_FILENAME".to_string(), FILENAME.to_string()),
        ("GIST_TIMEOUT_SECS".to_string(), "5".to_string()),
        ("GITHUB_TOKEN".to_string(), CONFIG_TOKEN.to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }
    ServerConfig::from_lookup(|key| vars.get(key).cloned())
}

/// App state over a fresh in-memory reference slot, seeded from `GIST_ID`.
///
/// # Panics
///
/// Panics if the config is invalid or the state cannot be built.
#[must_use]
pub fn state_for(api: &FakeGistApi, overrides: &[(&str, &str)]) -> AppState {
    let config = config_for(api, overrides).expect("valid test config");
    let slot = ReferenceSlot::new(config.gist.gist_id.clone().map(StoreReference::new));
    AppState::with_slot(config, slot).expect("state builds")
}

/// Credential equivalent to what the server resolves from `GITHUB_TOKEN`.
#[must_use]
pub fn config_credential() -> WriteCredential {
    WriteCredential::new(SecretString::from(CONFIG_TOKEN), CredentialSource::Config)
}
