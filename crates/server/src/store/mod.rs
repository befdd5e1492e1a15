//! Document store over a single remote JSON blob.
//!
//! The whole RSVP list lives in one gist file. Every write replaces the file;
//! there is no partial update and no compare-and-swap.
//!
//! # Lost updates
//!
//! Appending is `read` followed by `write`: two round trips with nothing tying
//! them together. Two writers that read the same version will each write back
//! their own extension of it, and the second write silently drops the first
//! writer's entry. This is accepted for human-paced RSVP traffic. Adding a
//! version check belongs in a separate, explicitly requested change.
//!
//! # Stale references
//!
//! A 404 from the remote means the cached [`StoreReference`] is dead. `read`
//! drops it and reports an empty document; the next `write` creates a fresh
//! gist. Entries in the vanished gist are not recoverable.

pub mod document;
pub mod reference;

use std::marker::PhantomData;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

pub use document::Document;
pub use reference::{ReferenceSlot, StoreReference};

use crate::gist::{GistClient, GistError};
use crate::services::credentials::WriteCredential;

/// Errors surfaced by the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The credential was rejected (invalid, expired, or missing scope).
    #[error("remote store rejected the credential")]
    AuthRejected,

    /// The document is gone. Recovered internally; callers see this only from
    /// the raw client.
    #[error("store document not found")]
    NotFound,

    /// Transient failure (timeout, connection, rate limit, 5xx).
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The stored document could not be decoded.
    #[error("malformed store document: {0}")]
    MalformedPayload(String),

    /// Anything else.
    #[error("remote store error: {0}")]
    Internal(String),
}

impl From<GistError> for StoreError {
    fn from(err: GistError) -> Self {
        match err {
            GistError::Unauthorized(_) => Self::AuthRejected,
            GistError::NotFound => Self::NotFound,
            GistError::Unavailable(msg) => Self::RemoteUnavailable(msg),
            GistError::Decode(msg) => Self::MalformedPayload(msg),
            api @ GistError::Api { .. } => Self::Internal(api.to_string()),
        }
    }
}

/// Generic read/write/clear over one remote [`Document`].
pub struct DocumentStore<T> {
    client: GistClient,
    slot: ReferenceSlot,
    _entries: PhantomData<fn() -> T>,
}

impl<T> Clone for DocumentStore<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            slot: self.slot.clone(),
            _entries: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for DocumentStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("client", &self.client)
            .field("slot", &self.slot)
            .finish()
    }
}

impl<T> DocumentStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    #[must_use]
    pub const fn new(client: GistClient, slot: ReferenceSlot) -> Self {
        Self {
            client,
            slot,
            _entries: PhantomData,
        }
    }

    /// The injected reference holder.
    #[must_use]
    pub const fn reference_slot(&self) -> &ReferenceSlot {
        &self.slot
    }

    /// Create a new remote document and remember its reference.
    ///
    /// Only called when no reference is active; an existing reference is
    /// replaced, not merged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the remote rejects the create.
    pub async fn create(
        &self,
        credential: &WriteCredential,
        initial: &Document<T>,
    ) -> Result<StoreReference, StoreError> {
        let content = encode(initial)?;
        self.create_encoded(credential, &content).await
    }

    /// Fetch the current document.
    ///
    /// Returns an empty document when no reference is active, when the gist
    /// lacks the document file, or when the remote reports the gist missing
    /// (in which case the reference is invalidated first).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for auth, availability, and decode failures.
    #[instrument(skip(self, credential))]
    pub async fn read(&self, credential: &WriteCredential) -> Result<Document<T>, StoreError> {
        let Some(reference) = self.slot.get().await else {
            tracing::debug!("No store reference yet; reading as empty");
            return Ok(Document::default());
        };

        match self.client.fetch(credential.secret(), reference.as_str()).await {
            Ok(Some(content)) => decode(&content),
            Ok(None) => Ok(Document::default()),
            Err(GistError::NotFound) => {
                self.slot.invalidate(&reference).await;
                Ok(Document::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the whole remote document with `document`.
    ///
    /// Creates the document when no reference is active. If the update hits a
    /// 404 the dead reference is dropped and `document` goes into a new gist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for auth, availability, and remote failures. A
    /// failed write leaves the previous remote content untouched.
    #[instrument(skip(self, credential, document), fields(entries = document.entries.len()))]
    pub async fn write(
        &self,
        credential: &WriteCredential,
        document: &Document<T>,
    ) -> Result<StoreReference, StoreError> {
        let content = encode(document)?;

        let Some(reference) = self.slot.get().await else {
            return self.create_encoded(credential, &content).await;
        };

        match self
            .client
            .update(credential.secret(), reference.as_str(), &content)
            .await
        {
            Ok(()) => Ok(reference),
            Err(GistError::NotFound) => {
                self.slot.invalidate(&reference).await;
                self.create_encoded(credential, &content).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Empty the document, keeping `created_at` and stamping `cleared_at`.
    ///
    /// A store that does not exist yet is left alone rather than created just
    /// to be empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] from the underlying read or write.
    #[instrument(skip(self, credential))]
    pub async fn clear(&self, credential: &WriteCredential) -> Result<Document<T>, StoreError> {
        let current = self.read(credential).await?;
        if self.slot.get().await.is_none() {
            return Ok(current);
        }

        let cleared = current.cleared(Utc::now());
        self.write(credential, &cleared).await?;
        tracing::info!(removed = current.entries.len(), "Store cleared");
        Ok(cleared)
    }

    async fn create_encoded(
        &self,
        credential: &WriteCredential,
        content: &str,
    ) -> Result<StoreReference, StoreError> {
        let id = self.client.create(credential.secret(), content).await?;
        let reference = StoreReference::new(id);
        self.slot.set(reference.clone()).await;
        Ok(reference)
    }
}

fn encode<T: Serialize>(document: &Document<T>) -> Result<String, StoreError> {
    serde_json::to_string_pretty(document).map_err(|e| StoreError::Internal(e.to_string()))
}

fn decode<T: DeserializeOwned>(content: &str) -> Result<Document<T>, StoreError> {
    if content.trim().is_empty() {
        return Ok(Document::default());
    }
    serde_json::from_str(content).map_err(|e| StoreError::MalformedPayload(e.to_string()))
}
