//! Host runtime client boundary
//!
//! All calls are asynchronous and may fail with a transport or host-side
//! error. This layer performs no retries; retry policy, if any, belongs to
//! the transport implementation behind the trait.

use async_trait::async_trait;
use bytes::Bytes;
use selkie_core::{ActorId, Result};

/// A single mutation in a batched state flush
///
/// The durable store holds, per (actor type, actor id), an open-ended
/// mapping from string key to serialized value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateOperation {
    /// Insert or overwrite a key
    Upsert { key: String, value: Bytes },
    /// Remove a key
    Delete { key: String },
}

impl StateOperation {
    /// Get the key this operation targets
    pub fn key(&self) -> &str {
        match self {
            StateOperation::Upsert { key, .. } => key,
            StateOperation::Delete { key } => key,
        }
    }
}

/// Client for the external placement/state host
///
/// The one component through which all durable state, timer, and reminder
/// traffic flows. Shared read-only by all concurrently-executing turns.
#[async_trait]
pub trait HostClient: Send + Sync {
    /// Fetch one state value from the durable store
    async fn get_state(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        key: &str,
    ) -> Result<Option<Bytes>>;

    /// Apply a batch of state mutations as a single transaction
    ///
    /// Either all operations commit or none do.
    async fn save_state(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        operations: &[StateOperation],
    ) -> Result<()>;

    /// Register a durable reminder
    async fn register_reminder(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
        payload: Bytes,
    ) -> Result<()>;

    /// Unregister a durable reminder
    async fn unregister_reminder(&self, actor_type: &str, actor_id: &ActorId, name: &str)
        -> Result<()>;

    /// Register a timer
    async fn register_timer(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
        payload: Bytes,
    ) -> Result<()>;

    /// Unregister a timer
    async fn unregister_timer(&self, actor_type: &str, actor_id: &ActorId, name: &str)
        -> Result<()>;
}
