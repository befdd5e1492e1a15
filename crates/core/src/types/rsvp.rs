//! RSVP records: raw submissions, validated candidates, and stored records.
//!
//! The flow is `RecordInput` (whatever the guest sent) → [`RecordInput::validate`]
//! → `NewRecord` (trimmed, attendance resolved) → `Record` (id and timestamps
//! assigned by the repository at append time).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::RecordId;
use super::mode::{Attendance, ContactMode};

/// A submission rejected before anything is stored.
///
/// `field` names the first field that failed, using the public field names of
/// [`RecordInput`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Raw RSVP submission.
///
/// Accepts both the current field names and the short names used by the
/// original form (`name`, `email`, `going`, `num_adults`, `num_kids`,
/// `message`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordInput {
    #[serde(default, alias = "name")]
    pub contact_name: Option<String>,
    #[serde(default, alias = "email")]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub child_name: Option<String>,
    #[serde(default, alias = "going")]
    pub attending: Attendance,
    #[serde(default, alias = "num_adults")]
    pub adult_count: u32,
    #[serde(default, alias = "num_kids")]
    pub kid_count: u32,
    #[serde(default, alias = "message")]
    pub note: Option<String>,
}

/// A validated submission waiting for an id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub contact_name: Option<String>,
    pub contact_email: Option<Email>,
    pub child_name: Option<String>,
    pub attending: bool,
    pub adult_count: u32,
    pub kid_count: u32,
    pub note: Option<String>,
}

/// One stored RSVP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, alias = "email", skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
    #[serde(alias = "going")]
    pub attending: bool,
    #[serde(default, alias = "num_adults")]
    pub adult_count: u32,
    #[serde(default, alias = "num_kids")]
    pub kid_count: u32,
    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(alias = "submitted_at")]
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Stamp a validated candidate with its id and append time.
    #[must_use]
    pub fn stamp(candidate: NewRecord, id: RecordId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            contact_name: candidate.contact_name,
            contact_email: candidate.contact_email.map(Email::into_inner),
            child_name: candidate.child_name,
            attending: candidate.attending,
            adult_count: candidate.adult_count,
            kid_count: candidate.kid_count,
            note: candidate.note,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adults plus kids.
    #[must_use]
    pub const fn party_size(&self) -> u32 {
        self.adult_count.saturating_add(self.kid_count)
    }
}

impl RecordInput {
    /// Validate and normalize a submission.
    ///
    /// Checks run in a fixed order (name, email, attendance) and the first
    /// failure is returned. Text fields are trimmed and blank optional fields
    /// become `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first invalid field.
    pub fn validate(self, mode: ContactMode) -> Result<NewRecord, ValidationError> {
        let contact_name = non_blank(self.contact_name)
            .ok_or_else(|| ValidationError::new("contact_name", "Name is required"))?;

        let contact_email = match non_blank(self.contact_email) {
            Some(raw) => Some(
                Email::parse(&raw)
                    .map_err(|e| ValidationError::new("contact_email", e.to_string()))?,
            ),
            None if mode.requires_email() => {
                return Err(ValidationError::new("contact_email", "Email is required"));
            }
            None => None,
        };

        let attending = self.attending.resolve().ok_or_else(|| {
            ValidationError::new("attending", "Please indicate if you are going")
        })?;

        Ok(NewRecord {
            contact_name: Some(contact_name),
            contact_email,
            child_name: non_blank(self.child_name),
            attending,
            adult_count: self.adult_count,
            kid_count: self.kid_count,
            note: non_blank(self.note),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}
