//! In-memory host implementation
//!
//! For testing and local development. Records per-operation call counts so
//! tests can assert on host traffic, and exposes fault switches to inject
//! failures per operation family.
//!
//! TigerStyle: Simple in-memory implementation with explicit accounting.

use crate::client::{HostClient, StateOperation};
use async_trait::async_trait;
use bytes::Bytes;
use selkie_core::{ActorId, Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Per-actor data: key -> value
type ActorData = HashMap<String, Bytes>;

/// Store data: "type:id" -> actor data
type StoreData = HashMap<String, ActorData>;

/// In-memory host
///
/// Holds durable state plus registered timer and reminder payloads, keyed by
/// (actor type, actor id). Cloneable; clones share the same store.
#[derive(Clone, Default)]
pub struct MemoryHost {
    state: Arc<RwLock<StoreData>>,
    timers: Arc<RwLock<StoreData>>,
    reminders: Arc<RwLock<StoreData>>,
    calls: Arc<CallCounts>,
    faults: Arc<Faults>,
}

#[derive(Default)]
struct CallCounts {
    get_state: AtomicU64,
    save_state: AtomicU64,
    register_timer: AtomicU64,
    unregister_timer: AtomicU64,
    register_reminder: AtomicU64,
    unregister_reminder: AtomicU64,
}

#[derive(Default)]
struct Faults {
    state_reads: AtomicBool,
    state_writes: AtomicBool,
    timer_calls: AtomicBool,
    reminder_calls: AtomicBool,
}

impl MemoryHost {
    /// Create a new in-memory host
    pub fn new() -> Self {
        Self::default()
    }

    fn actor_key(actor_type: &str, actor_id: &ActorId) -> String {
        format!("{}:{}", actor_type, actor_id)
    }

    fn check_fault(flag: &AtomicBool, operation: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(Error::host_call_failed(operation, "injected fault"));
        }
        Ok(())
    }

    // =========================================================================
    // Fault injection
    // =========================================================================

    /// Make all subsequent state reads fail
    pub fn set_fail_state_reads(&self, fail: bool) {
        self.faults.state_reads.store(fail, Ordering::SeqCst);
    }

    /// Make all subsequent state flushes fail
    pub fn set_fail_state_writes(&self, fail: bool) {
        self.faults.state_writes.store(fail, Ordering::SeqCst);
    }

    /// Make all subsequent timer calls fail
    pub fn set_fail_timer_calls(&self, fail: bool) {
        self.faults.timer_calls.store(fail, Ordering::SeqCst);
    }

    /// Make all subsequent reminder calls fail
    pub fn set_fail_reminder_calls(&self, fail: bool) {
        self.faults.reminder_calls.store(fail, Ordering::SeqCst);
    }

    // =========================================================================
    // Call accounting
    // =========================================================================

    /// Number of get_state calls received
    pub fn get_state_calls(&self) -> u64 {
        self.calls.get_state.load(Ordering::SeqCst)
    }

    /// Number of save_state calls received
    pub fn save_state_calls(&self) -> u64 {
        self.calls.save_state.load(Ordering::SeqCst)
    }

    /// Number of register_timer calls received
    pub fn register_timer_calls(&self) -> u64 {
        self.calls.register_timer.load(Ordering::SeqCst)
    }

    /// Number of unregister_timer calls received
    pub fn unregister_timer_calls(&self) -> u64 {
        self.calls.unregister_timer.load(Ordering::SeqCst)
    }

    /// Number of register_reminder calls received
    pub fn register_reminder_calls(&self) -> u64 {
        self.calls.register_reminder.load(Ordering::SeqCst)
    }

    /// Number of unregister_reminder calls received
    pub fn unregister_reminder_calls(&self) -> u64 {
        self.calls.unregister_reminder.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Store inspection
    // =========================================================================

    /// Seed a durable state value directly, bypassing accounting
    pub async fn seed_state(&self, actor_type: &str, actor_id: &ActorId, key: &str, value: Bytes) {
        let mut state = self.state.write().await;
        state
            .entry(Self::actor_key(actor_type, actor_id))
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Read a durable state value directly, bypassing accounting
    pub async fn stored_state(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        key: &str,
    ) -> Option<Bytes> {
        let state = self.state.read().await;
        state
            .get(&Self::actor_key(actor_type, actor_id))
            .and_then(|data| data.get(key))
            .cloned()
    }

    /// Names of timers currently registered for an actor
    pub async fn timer_names(&self, actor_type: &str, actor_id: &ActorId) -> Vec<String> {
        let timers = self.timers.read().await;
        timers
            .get(&Self::actor_key(actor_type, actor_id))
            .map(|data| data.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Names of reminders currently registered for an actor
    pub async fn reminder_names(&self, actor_type: &str, actor_id: &ActorId) -> Vec<String> {
        let reminders = self.reminders.read().await;
        reminders
            .get(&Self::actor_key(actor_type, actor_id))
            .map(|data| data.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HostClient for MemoryHost {
    async fn get_state(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        key: &str,
    ) -> Result<Option<Bytes>> {
        self.calls.get_state.fetch_add(1, Ordering::SeqCst);
        Self::check_fault(&self.faults.state_reads, "get_state")?;

        let state = self.state.read().await;
        Ok(state
            .get(&Self::actor_key(actor_type, actor_id))
            .and_then(|data| data.get(key))
            .cloned())
    }

    async fn save_state(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        operations: &[StateOperation],
    ) -> Result<()> {
        self.calls.save_state.fetch_add(1, Ordering::SeqCst);
        Self::check_fault(&self.faults.state_writes, "save_state")?;

        // All operations commit together under one write lock
        let mut state = self.state.write().await;
        let data = state
            .entry(Self::actor_key(actor_type, actor_id))
            .or_default();
        for op in operations {
            match op {
                StateOperation::Upsert { key, value } => {
                    data.insert(key.clone(), value.clone());
                }
                StateOperation::Delete { key } => {
                    data.remove(key);
                }
            }
        }

        debug!(
            actor_type,
            actor_id = %actor_id,
            operations = operations.len(),
            "State batch committed"
        );
        Ok(())
    }

    async fn register_reminder(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
        payload: Bytes,
    ) -> Result<()> {
        self.calls.register_reminder.fetch_add(1, Ordering::SeqCst);
        Self::check_fault(&self.faults.reminder_calls, "register_reminder")?;

        let mut reminders = self.reminders.write().await;
        reminders
            .entry(Self::actor_key(actor_type, actor_id))
            .or_default()
            .insert(name.to_string(), payload);
        Ok(())
    }

    async fn unregister_reminder(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
    ) -> Result<()> {
        self.calls
            .unregister_reminder
            .fetch_add(1, Ordering::SeqCst);
        Self::check_fault(&self.faults.reminder_calls, "unregister_reminder")?;

        let mut reminders = self.reminders.write().await;
        if let Some(data) = reminders.get_mut(&Self::actor_key(actor_type, actor_id)) {
            data.remove(name);
        }
        Ok(())
    }

    async fn register_timer(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
        payload: Bytes,
    ) -> Result<()> {
        self.calls.register_timer.fetch_add(1, Ordering::SeqCst);
        Self::check_fault(&self.faults.timer_calls, "register_timer")?;

        let mut timers = self.timers.write().await;
        timers
            .entry(Self::actor_key(actor_type, actor_id))
            .or_default()
            .insert(name.to_string(), payload);
        Ok(())
    }

    async fn unregister_timer(
        &self,
        actor_type: &str,
        actor_id: &ActorId,
        name: &str,
    ) -> Result<()> {
        self.calls.unregister_timer.fetch_add(1, Ordering::SeqCst);
        Self::check_fault(&self.faults.timer_calls, "unregister_timer")?;

        let mut timers = self.timers.write().await;
        if let Some(data) = timers.get_mut(&Self::actor_key(actor_type, actor_id)) {
            data.remove(name);
        }
        Ok(())
    }
}
