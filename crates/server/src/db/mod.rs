//! Repositories over the remote document store.
//!
//! There is no database: RSVPs live in one gist file managed by
//! [`crate::store::DocumentStore`]. Repositories add record-level operations
//! on top of the whole-document read and write.

pub mod rsvps;

pub use rsvps::{Overview, RsvpRepository};
