//! Runtime context and per-actor context
//!
//! `RuntimeContext` is the immutable, process-wide configuration bound at
//! actor-type registration time, shared read-only by all instances of that
//! type. `ActorContext` is the per-instance view handed to hooks and user
//! methods: identity plus the owned state manager and timer registry.

use crate::state::ActorStateManager;
use crate::timers::TimerRegistry;
use bytes::Bytes;
use selkie_core::{
    ActorId, ActorSerializer, ActorTrace, ActorTypeInformation, Error, ReminderParams, Result,
    TimerDefinition,
};
use selkie_host::HostClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

// =============================================================================
// RuntimeContext
// =============================================================================

/// Immutable runtime configuration for one registered actor type
///
/// Never mutated after construction; lifetime equals the process lifetime of
/// the registered type.
pub struct RuntimeContext {
    type_info: ActorTypeInformation,
    host: Arc<dyn HostClient>,
    serializer: Arc<dyn ActorSerializer>,
    trace: Arc<dyn ActorTrace>,
}

impl RuntimeContext {
    /// Create a runtime context
    pub fn new(
        type_info: ActorTypeInformation,
        host: Arc<dyn HostClient>,
        serializer: Arc<dyn ActorSerializer>,
        trace: Arc<dyn ActorTrace>,
    ) -> Self {
        Self {
            type_info,
            host,
            serializer,
            trace,
        }
    }

    /// Get the actor type name
    pub fn actor_type(&self) -> &str {
        self.type_info.name()
    }

    /// Get the actor type information
    pub fn type_info(&self) -> &ActorTypeInformation {
        &self.type_info
    }

    /// Get the host client
    pub fn host(&self) -> &Arc<dyn HostClient> {
        &self.host
    }

    /// Get the serializer
    pub fn serializer(&self) -> &dyn ActorSerializer {
        self.serializer.as_ref()
    }

    /// Get the trace sink
    pub fn trace(&self) -> &dyn ActorTrace {
        self.trace.as_ref()
    }
}

// =============================================================================
// MethodContext
// =============================================================================

/// How an invocation turn was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorCallType {
    /// A plain method invocation from the host
    Method,
    /// A timer firing
    Timer,
    /// A reminder firing
    Reminder,
}

/// Context of the method call bracketing an invocation turn
///
/// Passed to the pre/post invocation hooks so they can observe which method
/// ran and why, uniformly for plain invocations, timer fires, and reminder
/// fires.
#[derive(Debug, Clone)]
pub struct MethodContext {
    method_name: String,
    call_type: ActorCallType,
}

impl MethodContext {
    /// Context for a plain method invocation
    pub fn for_method(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            call_type: ActorCallType::Method,
        }
    }

    /// Context for a timer fire
    pub fn for_timer(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            call_type: ActorCallType::Timer,
        }
    }

    /// Context for a reminder fire
    pub fn for_reminder(reminder_name: impl Into<String>) -> Self {
        Self {
            method_name: reminder_name.into(),
            call_type: ActorCallType::Reminder,
        }
    }

    /// Get the method (or reminder) name
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Get the call type
    pub fn call_type(&self) -> ActorCallType {
        self.call_type
    }
}

// =============================================================================
// ActorContext
// =============================================================================

/// Per-instance context for hooks and user methods
///
/// Owns the actor's state manager and timer registry; shares the type's
/// runtime context. Created on activation and discarded with the instance.
pub struct ActorContext {
    id: ActorId,
    runtime: Arc<RuntimeContext>,
    state: ActorStateManager,
    timers: TimerRegistry,
}

impl ActorContext {
    /// Create a context for one actor instance
    pub fn new(id: ActorId, runtime: Arc<RuntimeContext>) -> Self {
        let state = ActorStateManager::new(
            runtime.actor_type().to_string(),
            id.clone(),
            runtime.host().clone(),
        );
        let timers = TimerRegistry::new(id.clone(), runtime.clone());

        Self {
            id,
            runtime,
            state,
            timers,
        }
    }

    /// Get the actor's id
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// Get the actor type name
    pub fn actor_type(&self) -> &str {
        self.runtime.actor_type()
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Get a state value (read-through on cache miss)
    pub async fn get_state(&mut self, key: &str) -> Result<Option<Bytes>> {
        self.state.get(key).await
    }

    /// Set a state value in the local cache
    pub fn set_state(&mut self, key: &str, value: impl Into<Bytes>) -> Result<()> {
        self.state.set(key, value)
    }

    /// Remove a state key (dirty tombstone in the local cache)
    pub fn remove_state(&mut self, key: &str) -> Result<()> {
        self.state.remove(key)
    }

    /// Check whether a state key exists
    pub async fn contains_state(&mut self, key: &str) -> Result<bool> {
        self.state.contains(key).await
    }

    /// Flush all dirty state entries to the host now
    ///
    /// The runtime already flushes at each turn boundary; explicit saves are
    /// only needed for mid-turn durability points.
    pub async fn save_state(&mut self) -> Result<()> {
        self.state.save().await
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Register a timer for this actor
    ///
    /// A name is synthesized when absent. Callable from any hook or user
    /// method while the instance is active.
    pub async fn register_timer(
        &self,
        name: Option<&str>,
        method_name: &str,
        payload: Bytes,
        due_time: Duration,
        period: Duration,
    ) -> Result<TimerDefinition> {
        self.timers
            .register(name, method_name, payload, due_time, period)
            .await
    }

    /// Unregister a timer by name
    pub async fn unregister_timer(&self, name: &str) -> Result<TimerDefinition> {
        self.timers.unregister(name).await
    }

    /// Look up a registered timer by name
    pub fn timer(&self, name: &str) -> Option<TimerDefinition> {
        self.timers.lookup(name)
    }

    // =========================================================================
    // Reminders
    // =========================================================================

    /// Register a durable reminder for this actor
    ///
    /// The parameters are serialized and handed to the host; nothing is
    /// retained in-process.
    pub async fn register_reminder(&self, name: &str, params: ReminderParams) -> Result<()> {
        if !self.runtime.type_info().remindable() {
            return Err(Error::ReminderRegistrationFailed {
                name: name.into(),
                reason: format!(
                    "actor type {} does not accept reminders",
                    self.runtime.actor_type()
                ),
            });
        }

        let serialized = self.runtime.serializer().serialize_reminder(&params)?;

        self.runtime
            .host()
            .register_reminder(self.runtime.actor_type(), &self.id, name, serialized)
            .await
            .map_err(|e| Error::ReminderRegistrationFailed {
                name: name.into(),
                reason: e.to_string(),
            })?;

        debug!(actor_id = %self.id, reminder = name, "Reminder registered");
        Ok(())
    }

    /// Unregister a durable reminder by name
    pub async fn unregister_reminder(&self, name: &str) -> Result<()> {
        self.runtime
            .host()
            .unregister_reminder(self.runtime.actor_type(), &self.id, name)
            .await
            .map_err(|e| Error::ReminderUnregistrationFailed {
                name: name.into(),
                reason: e.to_string(),
            })?;

        debug!(actor_id = %self.id, reminder = name, "Reminder unregistered");
        Ok(())
    }

    // =========================================================================
    // Internal
    // =========================================================================

    pub(crate) fn runtime(&self) -> &RuntimeContext {
        self.runtime.as_ref()
    }

    pub(crate) fn state_mut(&mut self) -> &mut ActorStateManager {
        &mut self.state
    }

    pub(crate) fn timers(&self) -> &TimerRegistry {
        &self.timers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selkie_core::{JsonSerializer, NoopTrace};
    use selkie_host::MemoryHost;

    fn context(host: &MemoryHost, type_info: ActorTypeInformation) -> ActorContext {
        let runtime = RuntimeContext::new(
            type_info,
            Arc::new(host.clone()),
            Arc::new(JsonSerializer::new()),
            Arc::new(NoopTrace),
        );
        ActorContext::new(ActorId::new("actor-1").unwrap(), Arc::new(runtime))
    }

    #[test]
    fn test_method_context_call_types() {
        assert_eq!(
            MethodContext::for_method("add").call_type(),
            ActorCallType::Method
        );
        assert_eq!(
            MethodContext::for_timer("tick").call_type(),
            ActorCallType::Timer
        );
        let reminder = MethodContext::for_reminder("expiry");
        assert_eq!(reminder.call_type(), ActorCallType::Reminder);
        assert_eq!(reminder.method_name(), "expiry");
    }

    #[tokio::test]
    async fn test_context_state_delegation() {
        let host = MemoryHost::new();
        let mut ctx = context(&host, ActorTypeInformation::new("Test").unwrap());

        ctx.set_state("k", Bytes::from("v")).unwrap();
        assert_eq!(ctx.get_state("k").await.unwrap(), Some(Bytes::from("v")));
        assert!(ctx.contains_state("k").await.unwrap());

        ctx.save_state().await.unwrap();
        assert_eq!(host.save_state_calls(), 1);
    }

    #[tokio::test]
    async fn test_register_reminder() {
        let host = MemoryHost::new();
        let ctx = context(&host, ActorTypeInformation::new("Test").unwrap());
        let id = ActorId::new("actor-1").unwrap();

        let params = ReminderParams::new(
            Bytes::from("data"),
            Duration::from_secs(1),
            Duration::from_secs(60),
        );
        ctx.register_reminder("expiry", params).await.unwrap();

        assert_eq!(
            host.reminder_names("Test", &id).await,
            vec!["expiry".to_string()]
        );

        ctx.unregister_reminder("expiry").await.unwrap();
        assert!(host.reminder_names("Test", &id).await.is_empty());
    }

    #[tokio::test]
    async fn test_register_reminder_rejected_for_non_remindable_type() {
        let host = MemoryHost::new();
        let ctx = context(
            &host,
            ActorTypeInformation::new("Test").unwrap().without_reminders(),
        );

        let params =
            ReminderParams::new(Bytes::new(), Duration::from_secs(1), Duration::from_secs(1));
        let result = ctx.register_reminder("expiry", params).await;

        assert!(matches!(
            result,
            Err(Error::ReminderRegistrationFailed { .. })
        ));
        assert_eq!(host.register_reminder_calls(), 0);
    }

    #[tokio::test]
    async fn test_register_reminder_host_failure() {
        let host = MemoryHost::new();
        let ctx = context(&host, ActorTypeInformation::new("Test").unwrap());

        host.set_fail_reminder_calls(true);
        let params =
            ReminderParams::new(Bytes::new(), Duration::from_secs(1), Duration::from_secs(1));
        let result = ctx.register_reminder("expiry", params).await;

        assert!(matches!(
            result,
            Err(Error::ReminderRegistrationFailed { .. })
        ));
    }
}
