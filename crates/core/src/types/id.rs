//! RSVP record identifiers.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned to a record when it is appended.
///
/// Identifiers are time-derived (`<unix millis>-<entropy hex>`) so they sort
/// roughly by submission time, but callers must only rely on uniqueness.
/// Records written by older deployments carry bare millisecond strings; those
/// deserialize unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build an identifier from the append time and a random suffix.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use party_rsvp_core::RecordId;
    ///
    /// let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    /// assert_eq!(RecordId::from_time(at, 0xbeef).as_str(), "1700000000123-0000beef");
    /// ```
    #[must_use]
    pub fn from_time(at: DateTime<Utc>, entropy: u32) -> Self {
        Self(format!("{}-{entropy:08x}", at.timestamp_millis()))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}
