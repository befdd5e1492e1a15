//! Cached handle to the remote document.
//!
//! Lifecycle: absent → set (first create) → invalidated (remote 404) → set
//! again on the next write. The slot is injected into the document store
//! rather than being a global, so every test gets its own.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

/// Opaque identifier of the remote document (the gist id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreReference(String);

impl StoreReference {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Process-wide holder of the active [`StoreReference`].
///
/// Optionally mirrors the reference into a state file so a restarted process
/// keeps writing to the same gist. File errors are logged, never returned:
/// losing the state file only costs a fresh gist on the next write.
///
/// Updates are not atomic across processes. Two processes sharing a state
/// file can each create their own gist.
#[derive(Clone, Default)]
pub struct ReferenceSlot {
    inner: Arc<SlotInner>,
}

#[derive(Default)]
struct SlotInner {
    current: RwLock<Option<StoreReference>>,
    state_file: Option<PathBuf>,
}

impl fmt::Debug for ReferenceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceSlot")
            .field("state_file", &self.inner.state_file)
            .finish_non_exhaustive()
    }
}

impl ReferenceSlot {
    /// Create an in-memory slot, optionally pre-seeded.
    #[must_use]
    pub fn new(initial: Option<StoreReference>) -> Self {
        Self {
            inner: Arc::new(SlotInner {
                current: RwLock::new(initial),
                state_file: None,
            }),
        }
    }

    /// Create a slot backed by a state file.
    ///
    /// A reference already saved in the file takes precedence over `seed`,
    /// since it reflects the most recent recreation.
    pub async fn persistent(path: PathBuf, seed: Option<StoreReference>) -> Self {
        let saved = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Some(contents.trim().to_string()).filter(|id| !id.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read store reference file");
                None
            }
        };

        let initial = saved.map(StoreReference::new).or(seed);
        if let Some(reference) = &initial {
            tracing::info!(gist_id = %reference, "Loaded store reference");
        }

        Self {
            inner: Arc::new(SlotInner {
                current: RwLock::new(initial),
                state_file: Some(path),
            }),
        }
    }

    /// Current reference, if any.
    pub async fn get(&self) -> Option<StoreReference> {
        self.inner.current.read().await.clone()
    }

    /// Record a newly created reference.
    pub async fn set(&self, reference: StoreReference) {
        *self.inner.current.write().await = Some(reference.clone());

        if let Some(path) = &self.inner.state_file
            && let Err(e) = tokio::fs::write(path, reference.as_str()).await
        {
            tracing::warn!(path = %path.display(), error = %e, "Failed to persist store reference");
        }
    }

    /// Discard `stale` if it is still the active reference.
    ///
    /// Returns `false` when another caller already replaced it, in which case
    /// the newer reference is left alone.
    pub async fn invalidate(&self, stale: &StoreReference) -> bool {
        let mut current = self.inner.current.write().await;
        if current.as_ref() != Some(stale) {
            return false;
        }
        *current = None;
        drop(current);

        tracing::warn!(gist_id = %stale, "Store reference invalidated; a new gist will be created on next write");

        if let Some(path) = &self.inner.state_file
            && let Err(e) = tokio::fs::remove_file(path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove store reference file");
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let slot = ReferenceSlot::default();
        assert_eq!(slot.get().await, None);
        slot.set(StoreReference::new("abc")).await;
        assert_eq!(slot.get().await, Some(StoreReference::new("abc")));
    }

    #[tokio::test]
    async fn test_invalidate_only_matching_reference() {
        let slot = ReferenceSlot::new(Some(StoreReference::new("new")));
        assert!(!slot.invalidate(&StoreReference::new("old")).await);
        assert_eq!(slot.get().await, Some(StoreReference::new("new")));

        assert!(slot.invalidate(&StoreReference::new("new")).await);
        assert_eq!(slot.get().await, None);
    }

    #[tokio::test]
    async fn test_persistent_slot_survives_reload_and_invalidation_removes_file() {
        let path = std::env::temp_dir().join(format!("party-rsvp-ref-{}", uuid::Uuid::new_v4()));

        let slot = ReferenceSlot::persistent(path.clone(), None).await;
        slot.set(StoreReference::new("gist-1")).await;

        let reloaded = ReferenceSlot::persistent(path.clone(), Some(StoreReference::new("seed"))).await;
        assert_eq!(reloaded.get().await, Some(StoreReference::new("gist-1")));

        assert!(reloaded.invalidate(&StoreReference::new("gist-1")).await);
        assert!(!path.exists());

        let fresh = ReferenceSlot::persistent(path, Some(StoreReference::new("seed"))).await;
        assert_eq!(fresh.get().await, Some(StoreReference::new("seed")));
    }
}
