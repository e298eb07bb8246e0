//! Actor state manager: per-actor cache plus durable-store coordination
//!
//! All state reads and writes go through the state manager; no other
//! component touches the durable store directly. Mutations accumulate in a
//! local cache and are flushed as one batched transaction at lifecycle
//! boundaries, bounding host round trips to one per actor turn.
//!
//! The cache is exclusively owned by one actor instance and only ever
//! touched within that actor's single active turn, so it needs no locking.

use bytes::Bytes;
use indexmap::IndexMap;
use selkie_core::constants::{
    STATE_KEY_LENGTH_BYTES_MAX, STATE_SAVE_OPERATIONS_COUNT_MAX, STATE_VALUE_SIZE_BYTES_MAX,
};
use selkie_core::{ActorId, Error, Result};
use selkie_host::{HostClient, StateOperation};
use std::sync::Arc;
use tracing::debug;

/// How a cached entry differs from the durable store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StateChange {
    /// Entry matches the durable store (populated by read-through)
    Clean,
    /// Entry was set locally and not yet flushed
    Set,
    /// Entry was removed locally and not yet flushed (tombstone)
    Removed,
}

impl StateChange {
    fn is_dirty(self) -> bool {
        !matches!(self, StateChange::Clean)
    }
}

/// A cached state entry
///
/// Invariant: `Removed` entries have no value; `Clean` and `Set` entries
/// always have one.
#[derive(Debug, Clone)]
struct StateEntry {
    value: Option<Bytes>,
    change: StateChange,
}

impl StateEntry {
    fn clean(value: Bytes) -> Self {
        Self {
            value: Some(value),
            change: StateChange::Clean,
        }
    }

    fn set(value: Bytes) -> Self {
        Self {
            value: Some(value),
            change: StateChange::Set,
        }
    }

    fn removed() -> Self {
        Self {
            value: None,
            change: StateChange::Removed,
        }
    }
}

/// Per-actor state manager with dirty-tracking cache
///
/// Insertion order of mutations is preserved in the flush batch.
pub struct ActorStateManager {
    actor_type: String,
    id: ActorId,
    host: Arc<dyn HostClient>,
    cache: IndexMap<String, StateEntry>,
}

impl ActorStateManager {
    /// Create a state manager bound to one actor
    pub fn new(actor_type: impl Into<String>, id: ActorId, host: Arc<dyn HostClient>) -> Self {
        Self {
            actor_type: actor_type.into(),
            id,
            host,
            cache: IndexMap::new(),
        }
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidStateKey {
                key: key.to_string(),
                reason: "key must not be empty".into(),
            });
        }
        if key.len() > STATE_KEY_LENGTH_BYTES_MAX {
            return Err(Error::InvalidStateKey {
                key: key.to_string(),
                reason: format!(
                    "key length {} exceeds limit {}",
                    key.len(),
                    STATE_KEY_LENGTH_BYTES_MAX
                ),
            });
        }
        Ok(())
    }

    /// Get a state value
    ///
    /// Checks the local cache first; on a miss, fetches from the durable
    /// store through the host client and populates the cache. Host failures
    /// are not cached.
    pub async fn get(&mut self, key: &str) -> Result<Option<Bytes>> {
        Self::validate_key(key)?;

        if let Some(entry) = self.cache.get(key) {
            return match entry.change {
                StateChange::Removed => Ok(None),
                _ => Ok(entry.value.clone()),
            };
        }

        match self.host.get_state(&self.actor_type, &self.id, key).await {
            Ok(Some(value)) => {
                self.cache
                    .insert(key.to_string(), StateEntry::clean(value.clone()));
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(Error::state_access_failed(key, e.to_string())),
        }
    }

    /// Set a state value in the local cache
    ///
    /// No host call occurs until the next `save()`.
    pub fn set(&mut self, key: &str, value: impl Into<Bytes>) -> Result<()> {
        Self::validate_key(key)?;
        let value = value.into();

        if value.len() > STATE_VALUE_SIZE_BYTES_MAX {
            return Err(Error::StateValueTooLarge {
                size: value.len(),
                limit: STATE_VALUE_SIZE_BYTES_MAX,
            });
        }

        self.cache.insert(key.to_string(), StateEntry::set(value));
        Ok(())
    }

    /// Mark a state key as removed in the local cache (dirty tombstone)
    pub fn remove(&mut self, key: &str) -> Result<()> {
        Self::validate_key(key)?;
        self.cache.insert(key.to_string(), StateEntry::removed());
        Ok(())
    }

    /// Check whether a state key exists
    ///
    /// Like `get`, read-through on a cache miss.
    pub async fn contains(&mut self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Flush all dirty entries as a single batched transaction
    ///
    /// With no dirty entries this performs zero host calls. On success dirty
    /// flags are cleared and tombstones dropped; on failure the cache is
    /// left unchanged, so retrying `save()` is safe and idempotent. Callers
    /// must retry `save()`, not re-apply individual mutations.
    pub async fn save(&mut self) -> Result<()> {
        let operations: Vec<StateOperation> = self
            .cache
            .iter()
            .filter(|(_, entry)| entry.change.is_dirty())
            .map(|(key, entry)| match entry.change {
                StateChange::Set => StateOperation::Upsert {
                    key: key.clone(),
                    value: entry.value.clone().expect("Set entry has a value"),
                },
                StateChange::Removed => StateOperation::Delete { key: key.clone() },
                StateChange::Clean => unreachable!("dirty filter excludes Clean"),
            })
            .collect();

        if operations.is_empty() {
            debug!(actor_id = %self.id, "No dirty state entries, skipping flush");
            return Ok(());
        }

        assert!(
            operations.len() <= STATE_SAVE_OPERATIONS_COUNT_MAX,
            "state flush batch too large: {} operations",
            operations.len()
        );

        self.host
            .save_state(&self.actor_type, &self.id, &operations)
            .await
            .map_err(|e| Error::state_save_failed(e.to_string()))?;

        // Commit locally only after the host acknowledged the batch
        self.cache.retain(|_, entry| match entry.change {
            StateChange::Removed => false,
            _ => {
                entry.change = StateChange::Clean;
                true
            }
        });

        debug!(
            actor_id = %self.id,
            operations = operations.len(),
            "State flushed to host"
        );
        Ok(())
    }

    /// Discard the entire local cache without contacting the host
    ///
    /// Forces a fresh state view at activation/deactivation boundaries.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Number of dirty entries pending flush
    pub fn dirty_count(&self) -> usize {
        self.cache
            .values()
            .filter(|entry| entry.change.is_dirty())
            .count()
    }

    /// Number of cached entries (clean and dirty)
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selkie_host::MemoryHost;

    const ACTOR_TYPE: &str = "Test";

    fn manager(host: &MemoryHost) -> ActorStateManager {
        ActorStateManager::new(
            ACTOR_TYPE,
            ActorId::new("actor-1").unwrap(),
            Arc::new(host.clone()),
        )
    }

    #[tokio::test]
    async fn test_dirty_isolation() {
        // get after set returns the local value without a host round trip
        let host = MemoryHost::new();
        let mut state = manager(&host);

        state.set("k", Bytes::from("v")).unwrap();
        let value = state.get("k").await.unwrap();

        assert_eq!(value, Some(Bytes::from("v")));
        assert_eq!(host.get_state_calls(), 0);
    }

    #[tokio::test]
    async fn test_read_through_populates_cache() {
        let host = MemoryHost::new();
        let id = ActorId::new("actor-1").unwrap();
        host.seed_state(ACTOR_TYPE, &id, "k", Bytes::from("stored"))
            .await;

        let mut state = manager(&host);
        assert_eq!(state.get("k").await.unwrap(), Some(Bytes::from("stored")));
        assert_eq!(host.get_state_calls(), 1);

        // Second read is served from the cache
        assert_eq!(state.get("k").await.unwrap(), Some(Bytes::from("stored")));
        assert_eq!(host.get_state_calls(), 1);
    }

    #[tokio::test]
    async fn test_idempotent_save() {
        // A second save with no intervening mutations performs zero host calls
        let host = MemoryHost::new();
        let mut state = manager(&host);

        state.set("k", Bytes::from("v")).unwrap();
        state.save().await.unwrap();
        assert_eq!(host.save_state_calls(), 1);

        state.save().await.unwrap();
        assert_eq!(host.save_state_calls(), 1);
    }

    #[tokio::test]
    async fn test_save_flushes_batch_in_mutation_order() {
        let host = MemoryHost::new();
        let id = ActorId::new("actor-1").unwrap();
        let mut state = manager(&host);

        state.set("b", Bytes::from("2")).unwrap();
        state.set("a", Bytes::from("1")).unwrap();
        state.remove("c").unwrap();
        state.save().await.unwrap();

        assert_eq!(
            host.stored_state(ACTOR_TYPE, &id, "b").await,
            Some(Bytes::from("2"))
        );
        assert_eq!(
            host.stored_state(ACTOR_TYPE, &id, "a").await,
            Some(Bytes::from("1"))
        );
        assert!(host.stored_state(ACTOR_TYPE, &id, "c").await.is_none());
        assert_eq!(state.dirty_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_resets_view() {
        // A key set locally but never saved must be re-fetched after clear
        let host = MemoryHost::new();
        let id = ActorId::new("actor-1").unwrap();
        host.seed_state(ACTOR_TYPE, &id, "k", Bytes::from("stored"))
            .await;

        let mut state = manager(&host);
        state.set("k", Bytes::from("local")).unwrap();
        state.clear();

        assert_eq!(state.get("k").await.unwrap(), Some(Bytes::from("stored")));
        assert_eq!(host.get_state_calls(), 1);
    }

    #[tokio::test]
    async fn test_remove_masks_stored_value() {
        let host = MemoryHost::new();
        let id = ActorId::new("actor-1").unwrap();
        host.seed_state(ACTOR_TYPE, &id, "k", Bytes::from("stored"))
            .await;

        let mut state = manager(&host);
        state.remove("k").unwrap();
        assert_eq!(state.get("k").await.unwrap(), None);

        state.save().await.unwrap();
        assert!(host.stored_state(ACTOR_TYPE, &id, "k").await.is_none());
    }

    #[tokio::test]
    async fn test_save_failure_leaves_cache_unchanged() {
        let host = MemoryHost::new();
        let id = ActorId::new("actor-1").unwrap();
        let mut state = manager(&host);

        state.set("k", Bytes::from("v")).unwrap();
        host.set_fail_state_writes(true);

        let result = state.save().await;
        assert!(matches!(result, Err(Error::StateSaveFailed { .. })));
        assert_eq!(state.dirty_count(), 1);

        // Retrying save (not re-applying mutations) succeeds
        host.set_fail_state_writes(false);
        state.save().await.unwrap();
        assert_eq!(
            host.stored_state(ACTOR_TYPE, &id, "k").await,
            Some(Bytes::from("v"))
        );
        assert_eq!(state.dirty_count(), 0);
    }

    #[tokio::test]
    async fn test_get_failure_is_not_cached() {
        let host = MemoryHost::new();
        let id = ActorId::new("actor-1").unwrap();
        host.seed_state(ACTOR_TYPE, &id, "k", Bytes::from("stored"))
            .await;

        let mut state = manager(&host);
        host.set_fail_state_reads(true);
        let result = state.get("k").await;
        assert!(matches!(result, Err(Error::StateAccessFailed { .. })));

        host.set_fail_state_reads(false);
        assert_eq!(state.get("k").await.unwrap(), Some(Bytes::from("stored")));
    }

    #[tokio::test]
    async fn test_contains() {
        let host = MemoryHost::new();
        let id = ActorId::new("actor-1").unwrap();
        host.seed_state(ACTOR_TYPE, &id, "stored", Bytes::from("v"))
            .await;

        let mut state = manager(&host);
        assert!(state.contains("stored").await.unwrap());
        assert!(!state.contains("missing").await.unwrap());

        state.set("local", Bytes::from("v")).unwrap();
        assert!(state.contains("local").await.unwrap());

        state.remove("stored").unwrap();
        assert!(!state.contains("stored").await.unwrap());
    }

    #[tokio::test]
    async fn test_key_validation() {
        let host = MemoryHost::new();
        let mut state = manager(&host);

        assert!(matches!(
            state.get("").await,
            Err(Error::InvalidStateKey { .. })
        ));
        let long_key = "k".repeat(STATE_KEY_LENGTH_BYTES_MAX + 1);
        assert!(matches!(
            state.set(&long_key, Bytes::new()),
            Err(Error::InvalidStateKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_value_size_limit() {
        let host = MemoryHost::new();
        let mut state = manager(&host);

        let oversized = Bytes::from(vec![0u8; STATE_VALUE_SIZE_BYTES_MAX + 1]);
        assert!(matches!(
            state.set("k", oversized),
            Err(Error::StateValueTooLarge { .. })
        ));
    }
}
