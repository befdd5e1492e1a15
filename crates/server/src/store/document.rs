//! The document envelope stored in the gist file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entries plus store-level metadata.
///
/// Serialized as `{"rsvps": [...], "created_at": ..., "updated_at": ...}`,
/// the layout earlier deployments wrote, so existing gists keep working.
/// Metadata is optional on read because those deployments dropped
/// `created_at` on every update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document<T> {
    #[serde(rename = "rsvps", default = "Vec::new")]
    pub entries: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared_at: Option<DateTime<Utc>>,
}

impl<T> Default for Document<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            created_at: None,
            updated_at: None,
            cleared_at: None,
        }
    }
}

impl<T> Document<T> {
    /// A brand-new empty document created at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            entries: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
            cleared_at: None,
        }
    }

    /// Mark the document as modified at `now`.
    ///
    /// Backfills `created_at` for documents written without it.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
    }

    /// Empty copy that keeps `created_at` and stamps `cleared_at`.
    #[must_use]
    pub fn cleared(&self, now: DateTime<Utc>) -> Self {
        Self {
            entries: Vec::new(),
            created_at: Some(self.created_at.unwrap_or(now)),
            updated_at: Some(now),
            cleared_at: Some(now),
        }
    }
}
