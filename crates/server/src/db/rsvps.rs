//! RSVP repository over the gist document store.

use chrono::{DateTime, Utc};
use party_rsvp_core::{AggregateStats, NewRecord, Record, RecordId};
use serde::Serialize;
use tracing::instrument;

use crate::services::credentials::WriteCredential;
use crate::store::{Document, DocumentStore, StoreError};

/// Records plus stats from one read.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub rsvps: Vec<Record>,
    pub stats: AggregateStats,
}

/// Repository for RSVP records.
///
/// Every operation is one or two remote round trips; nothing is cached.
#[derive(Debug, Clone)]
pub struct RsvpRepository {
    store: DocumentStore<Record>,
}

impl RsvpRepository {
    /// Create a new RSVP repository.
    #[must_use]
    pub const fn new(store: DocumentStore<Record>) -> Self {
        Self { store }
    }

    /// The underlying document store.
    #[must_use]
    pub const fn store(&self) -> &DocumentStore<Record> {
        &self.store
    }

    /// All records in append order. Empty when no store exists yet.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the document cannot be read.
    pub async fn list(&self, credential: &WriteCredential) -> Result<Vec<Record>, StoreError> {
        Ok(self.store.read(credential).await?.entries)
    }

    /// Append a validated record and return it as stored.
    ///
    /// Read-modify-write: a concurrent append between the read and the write
    /// is lost (see [`crate::store`]).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` from the read or the write.
    #[instrument(skip(self, credential, candidate))]
    pub async fn append(
        &self,
        credential: &WriteCredential,
        candidate: NewRecord,
    ) -> Result<Record, StoreError> {
        let mut document = self.store.read(credential).await?;

        let now = Utc::now();
        let id = unique_id(&document.entries, now);
        let record = Record::stamp(candidate, id, now);

        document.entries.push(record.clone());
        document.touch(now);
        self.store.write(credential, &document).await?;

        tracing::info!(record_id = %record.id, total = document.entries.len(), "RSVP stored");
        Ok(record)
    }

    /// Remove every record, keeping the store's creation time.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` from the underlying clear.
    pub async fn clear_all(
        &self,
        credential: &WriteCredential,
    ) -> Result<Document<Record>, StoreError> {
        self.store.clear(credential).await
    }

    /// Aggregate counts over all records.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the document cannot be read.
    pub async fn stats(&self, credential: &WriteCredential) -> Result<AggregateStats, StoreError> {
        let records = self.list(credential).await?;
        Ok(AggregateStats::from_records(&records))
    }

    /// Records and their stats computed from the same read.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the document cannot be read.
    pub async fn overview(&self, credential: &WriteCredential) -> Result<Overview, StoreError> {
        let rsvps = self.list(credential).await?;
        let stats = AggregateStats::from_records(&rsvps);
        Ok(Overview { rsvps, stats })
    }
}

/// Time-derived id not already used by `existing`.
fn unique_id(existing: &[Record], now: DateTime<Utc>) -> RecordId {
    loop {
        let id = RecordId::from_time(now, rand::random::<u32>());
        if !existing.iter().any(|r| r.id == id) {
            return id;
        }
    }
}
