//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (frontend origin)
//! 5. Session layer (tower-sessions, in-memory store)

pub mod access;
pub mod request_id;
pub mod session;

pub use access::{AccessSecret, RequestCredentials, RequireAccess, RequireCredential};
pub use request_id::{RequestId, request_id_middleware};
pub use session::create_session_layer;
