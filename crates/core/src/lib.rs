//! Party RSVP Core - Shared domain types.
//!
//! This crate provides the types shared by every Party RSVP component:
//! - `server` - JSON API backed by a single remote Gist document
//! - `cli` - Operator tools (share link, export, stats, clear)
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clock reads. Callers pass timestamps in, which keeps validation
//! and aggregation trivially testable.
//!
//! # Modules
//!
//! - [`types`] - Record identifiers, emails, RSVP records, and aggregate stats

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
