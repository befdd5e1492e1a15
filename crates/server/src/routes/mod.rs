//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness check
//! GET    /api/access              - Does the access secret pass the gate?
//!
//! # Guests
//! POST   /api/rsvp                - Submit an RSVP
//!
//! # Admin (access secret + write credential)
//! GET    /api/admin/rsvps         - All RSVPs
//! GET    /api/admin/stats         - Aggregate counts
//! GET    /api/admin/overview      - RSVPs and counts from one read
//! POST   /api/admin/clear         - Delete every RSVP
//!
//! # Session credential (access secret)
//! PUT    /api/session/credential  - Remember a GitHub token for this session
//! DELETE /api/session/credential  - Forget it
//! ```
//!
//! The access secret is read from `?access=` or `X-Access-Token`; the
//! request-level GitHub token from `?token=`.

pub mod admin;
pub mod health;
pub mod rsvp;
pub mod session;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the admin API router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/rsvps", get(admin::list_rsvps))
        .route("/stats", get(admin::stats))
        .route("/overview", get(admin::overview))
        .route("/clear", post(admin::clear))
}

/// Create the full API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/access", get(health::check_access))
        .route("/api/rsvp", post(rsvp::submit))
        .route(
            "/api/session/credential",
            put(session::store_credential).delete(session::forget_credential),
        )
        .nest("/api/admin", admin_routes())
}
