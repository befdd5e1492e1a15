//! Application state shared across handlers.

use std::sync::Arc;

use party_rsvp_core::Record;

use crate::config::ServerConfig;
use crate::db::RsvpRepository;
use crate::gist::{GistClient, GistError};
use crate::services::credentials::{CredentialSources, resolve_access_secret};
use crate::services::{AccessGate, EmailService, SubmissionService};
use crate::store::{DocumentStore, ReferenceSlot, StoreReference};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("gist client: {0}")]
    Gist(#[from] GistError),
    #[error("email transport: {0}")]
    Email(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    gate: AccessGate,
    repository: RsvpRepository,
    submissions: SubmissionService,
    email: Option<EmailService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("gate", &self.inner.gate)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build state from configuration.
    ///
    /// Loads the store reference from `GIST_REFERENCE_FILE` when configured,
    /// falling back to `GIST_ID`.
    ///
    /// # Errors
    ///
    /// Returns an error if the gist client or SMTP transport cannot be built.
    pub async fn new(config: ServerConfig) -> Result<Self, StateError> {
        let seed = config.gist.gist_id.clone().map(StoreReference::new);
        let slot = match &config.gist.reference_file {
            Some(path) => ReferenceSlot::persistent(path.clone(), seed).await,
            None => ReferenceSlot::new(seed),
        };
        Self::with_slot(config, slot)
    }

    /// Build state around an existing reference slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the gist client or SMTP transport cannot be built.
    pub fn with_slot(config: ServerConfig, slot: ReferenceSlot) -> Result<Self, StateError> {
        let client = GistClient::new(&config.gist)?;
        let repository = RsvpRepository::new(DocumentStore::<Record>::new(client, slot));
        let gate = AccessGate::new(resolve_access_secret(config.access_secret.as_ref()));

        let email = match &config.email {
            Some(email_config) => Some(EmailService::new(email_config)?),
            None => {
                tracing::warn!("SMTP not configured; RSVP notifications are disabled");
                None
            }
        };

        let submissions = SubmissionService::new(
            repository.clone(),
            gate.clone(),
            config.contact_mode,
            email.clone(),
        );

        if gate.is_open() {
            tracing::warn!("RSVP_ACCESS_SECRET not set; access gate is open");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                gate,
                repository,
                submissions,
                email,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn gate(&self) -> &AccessGate {
        &self.inner.gate
    }

    #[must_use]
    pub fn repository(&self) -> &RsvpRepository {
        &self.inner.repository
    }

    #[must_use]
    pub fn submissions(&self) -> &SubmissionService {
        &self.inner.submissions
    }

    /// Email service, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Credential sources available without a request (config and build).
    #[must_use]
    pub fn deployment_credentials(&self) -> CredentialSources {
        CredentialSources::from_deployment(self.inner.config.github_token.clone())
    }
}
