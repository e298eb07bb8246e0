//! Per-actor timer registry
//!
//! Maps timer name to definition, synchronized against concurrent access:
//! unlike the state cache, the registry is reachable from the owning turn
//! plus asynchronous unregister completions, which the host may deliver out
//! of order with a new register call for the same actor. The map is
//! therefore guarded by its own lock rather than relying on the turn-based
//! guarantee.
//!
//! The lock is never held across a host call.

use crate::context::RuntimeContext;
use bytes::Bytes;
use selkie_core::constants::{TIMERS_PER_ACTOR_COUNT_MAX, TIMER_NAME_LENGTH_BYTES_MAX};
use selkie_core::{ActorId, Error, Result, TimerDefinition};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

#[derive(Default)]
struct RegistryInner {
    timers: HashMap<String, TimerDefinition>,
    /// Definitions whose host unregistration completed, pending delivery of
    /// the actor's unregistered-timer hook at the next turn boundary
    unregistered: Vec<TimerDefinition>,
}

/// Registry of timers for one actor
///
/// Cloneable; clones share the same underlying map. Discarded together with
/// the owning actor instance on deactivation.
#[derive(Clone)]
pub struct TimerRegistry {
    id: ActorId,
    runtime: Arc<RuntimeContext>,
    inner: Arc<Mutex<RegistryInner>>,
}

impl TimerRegistry {
    /// Create a registry bound to one actor
    pub fn new(id: ActorId, runtime: Arc<RuntimeContext>) -> Self {
        Self {
            id,
            runtime,
            inner: Arc::new(Mutex::new(RegistryInner::default())),
        }
    }

    /// Register a timer against the host
    ///
    /// When `name` is absent or empty, a name is synthesized as
    /// `"<actorId>_Timer_<n>"` where n is the registry's current size plus
    /// one. Serialization or host failure leaves the registry untouched;
    /// re-registering an existing name overwrites its definition.
    pub async fn register(
        &self,
        name: Option<&str>,
        method_name: &str,
        payload: Bytes,
        due_time: Duration,
        period: Duration,
    ) -> Result<TimerDefinition> {
        if method_name.is_empty() {
            return Err(Error::InvalidOperation {
                operation: "timer target method must not be empty".into(),
            });
        }

        let name = {
            let inner = self.inner.lock().unwrap();
            if inner.timers.len() >= TIMERS_PER_ACTOR_COUNT_MAX {
                return Err(Error::TimerLimitExceeded {
                    count: inner.timers.len(),
                    limit: TIMERS_PER_ACTOR_COUNT_MAX,
                });
            }
            match name {
                Some(n) if !n.is_empty() => {
                    Self::validate_name(n)?;
                    n.to_string()
                }
                _ => format!("{}_Timer_{}", self.id, inner.timers.len() + 1),
            }
        };

        let timer = TimerDefinition::new(&name, method_name, payload, due_time, period);
        let serialized = self.runtime.serializer().serialize_timer(&timer)?;

        self.runtime
            .host()
            .register_timer(self.runtime.actor_type(), &self.id, &name, serialized)
            .await
            .map_err(|e| Error::TimerRegistrationFailed {
                name: name.clone(),
                reason: e.to_string(),
            })?;

        self.inner
            .lock()
            .unwrap()
            .timers
            .insert(name.clone(), timer.clone());

        debug!(actor_id = %self.id, timer = %name, "Timer registered");
        Ok(timer)
    }

    /// Unregister a timer against the host
    ///
    /// On success the local entry is removed and queued for the actor's
    /// unregistered-timer hook. If the host call fails the timer stays
    /// registered locally and the error is returned.
    pub async fn unregister(&self, name: &str) -> Result<TimerDefinition> {
        let timer = self
            .lookup(name)
            .ok_or_else(|| Error::TimerNotFound { name: name.into() })?;

        self.runtime
            .host()
            .unregister_timer(self.runtime.actor_type(), &self.id, name)
            .await
            .map_err(|e| Error::TimerUnregistrationFailed {
                name: name.into(),
                reason: e.to_string(),
            })?;

        let mut inner = self.inner.lock().unwrap();
        inner.timers.remove(name);
        inner.unregistered.push(timer.clone());

        debug!(actor_id = %self.id, timer = %name, "Timer unregistered");
        Ok(timer)
    }

    /// Look up a timer by name
    pub fn lookup(&self, name: &str) -> Option<TimerDefinition> {
        self.inner.lock().unwrap().timers.get(name).cloned()
    }

    /// Number of registered timers
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().timers.len()
    }

    /// Whether no timers are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain definitions pending the unregistered-timer hook
    pub(crate) fn take_unregistered(&self) -> Vec<TimerDefinition> {
        std::mem::take(&mut self.inner.lock().unwrap().unregistered)
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.len() > TIMER_NAME_LENGTH_BYTES_MAX {
            return Err(Error::InvalidTimerName {
                name: name.to_string(),
                reason: format!(
                    "name length {} exceeds limit {}",
                    name.len(),
                    TIMER_NAME_LENGTH_BYTES_MAX
                ),
            });
        }
        Ok(())
    }
}
