//! Core types for Party RSVP.
//!
//! This module provides type-safe wrappers for RSVP domain concepts.

pub mod email;
pub mod id;
pub mod mode;
pub mod rsvp;
pub mod stats;

pub use email::{Email, EmailError};
pub use id::RecordId;
pub use mode::{Attendance, ContactMode};
pub use rsvp::{NewRecord, Record, RecordInput, ValidationError};
pub use stats::AggregateStats;
