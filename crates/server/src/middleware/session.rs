//! Session middleware configuration.
//!
//! Sessions only carry the operator's GitHub token between requests, so they
//! live in memory and vanish on restart. The cookie expires after
//! `SESSION_IDLE_MINUTES` of inactivity.

use secrecy::{ExposeSecret, SecretString};
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "rsvp_session";

/// Session key holding the write credential.
pub const SESSION_CREDENTIAL_KEY: &str = "github_token";

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &ServerConfig) -> SessionManagerLayer<MemoryStore> {
    let is_secure = config.base_url.starts_with("https://");
    let idle_secs = i64::try_from(config.session_idle.as_secs()).unwrap_or(i64::MAX);

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(idle_secs),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Read the session credential, if one was stored.
pub async fn session_credential(session: &Session) -> Option<SecretString> {
    session
        .get::<String>(SESSION_CREDENTIAL_KEY)
        .await
        .ok()
        .flatten()
        .map(SecretString::from)
}

/// Store a credential in the session.
///
/// # Errors
///
/// Returns error if the session store fails.
pub async fn set_session_credential(
    session: &Session,
    token: &SecretString,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(SESSION_CREDENTIAL_KEY, token.expose_secret())
        .await
}

/// Remove the session credential. Returns whether one was stored.
///
/// # Errors
///
/// Returns error if the session store fails.
pub async fn clear_session_credential(
    session: &Session,
) -> Result<bool, tower_sessions::session::Error> {
    Ok(session
        .remove::<String>(SESSION_CREDENTIAL_KEY)
        .await?
        .is_some())
}
