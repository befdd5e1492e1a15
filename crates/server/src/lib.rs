//! Party RSVP server library.
//!
//! RSVPs are kept in one JSON file inside a private GitHub gist. Guests
//! submit through `POST /api/rsvp` with a shared access secret; the host
//! reads and clears the list through the admin API.
//!
//! The crate is a library so the binary, the CLI, and the integration tests
//! build the same router and state.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod gist;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router with its middleware stack.
///
/// Sentry layers are added by the binary so tests don't need a hub.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let cors = cors_layer(state.config().frontend_url.as_deref());

    routes::routes()
        .layer(session_layer)
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the guest page. Without a configured frontend the API is
/// same-origin only.
fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(middleware::access::ACCESS_HEADER),
        ])
        .allow_credentials(true);

    match frontend_url
        .map(|url| url.trim_end_matches('/'))
        .and_then(|url| HeaderValue::from_str(url).ok())
    {
        Some(origin) => base.allow_origin(origin),
        None => base,
    }
}
