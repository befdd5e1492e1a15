//! RSVP submission workflow.
//!
//! `validate → access gate → resolve credential → append → notify`. Each step
//! runs only if the previous one passed, so a rejected submission never
//! touches the remote store. The notification runs detached and cannot fail
//! the submission.

use party_rsvp_core::{ContactMode, Record, RecordInput, ValidationError};
use thiserror::Error;
use tracing::instrument;

use super::access::AccessGate;
use super::credentials::CredentialSources;
use super::email::EmailService;
use crate::db::RsvpRepository;
use crate::store::StoreError;

/// Why a submission was rejected.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("invalid submission: {0}")]
    Validation(#[from] ValidationError),

    #[error("access denied")]
    AccessDenied,

    #[error("no write credential available")]
    CredentialMissing,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Runs submissions against one repository and access gate.
#[derive(Debug, Clone)]
pub struct SubmissionService {
    repository: RsvpRepository,
    gate: AccessGate,
    contact_mode: ContactMode,
    email: Option<EmailService>,
}

impl SubmissionService {
    #[must_use]
    pub const fn new(
        repository: RsvpRepository,
        gate: AccessGate,
        contact_mode: ContactMode,
        email: Option<EmailService>,
    ) -> Self {
        Self {
            repository,
            gate,
            contact_mode,
            email,
        }
    }

    /// Validate, authorize, and store one RSVP.
    ///
    /// # Errors
    ///
    /// - `Validation` naming the first bad field
    /// - `AccessDenied` if the access secret does not match
    /// - `CredentialMissing` if no write credential resolves
    /// - `Store` for remote failures, with the store's error kind kept
    #[instrument(skip_all, fields(record_id))]
    pub async fn submit(
        &self,
        input: RecordInput,
        access: Option<&str>,
        sources: &CredentialSources,
    ) -> Result<Record, SubmissionError> {
        let candidate = input.validate(self.contact_mode).inspect_err(|e| {
            tracing::info!(field = e.field, "RSVP rejected by validation");
        })?;

        if !self.gate.check(access) {
            tracing::warn!("RSVP rejected: access secret mismatch");
            return Err(SubmissionError::AccessDenied);
        }

        let credential = sources
            .resolve_write_credential()
            .ok_or(SubmissionError::CredentialMissing)?;
        tracing::debug!(source = %credential.source(), "Write credential resolved");

        let record = self.repository.append(&credential, candidate).await?;
        tracing::Span::current().record("record_id", tracing::field::display(&record.id));

        self.notify(&record);
        Ok(record)
    }

    /// Send the host notification on a detached task.
    fn notify(&self, record: &Record) {
        let Some(email) = self.email.clone() else {
            tracing::warn!(record_id = %record.id, "Email not configured; notification skipped");
            return;
        };

        let record = record.clone();
        tokio::spawn(async move {
            if let Err(e) = email.send_rsvp_notification(&record).await {
                tracing::warn!(record_id = %record.id, error = %e, "RSVP notification failed");
            }
        });
    }
}
