//! Process-wide actor runtime
//!
//! TigerStyle: Single entry point, explicit configuration, clean shutdown.
//!
//! The runtime is the dispatcher boundary exposed to the web endpoint that
//! receives host callbacks: it maps actor type names to their managers and
//! routes activate/invoke/deactivate/fire-reminder/fire-timer requests to
//! the matching actor instance.

use crate::config::RuntimeConfig;
use crate::context::RuntimeContext;
use crate::handle::ActorHandle;
use crate::manager::{ActorFactory, ActorManager};
use bytes::Bytes;
use selkie_core::{
    ActorId, ActorSerializer, ActorTrace, ActorTypeInformation, Error, JsonSerializer, Result,
    TracingTrace,
};
use selkie_host::HostClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Builder for the actor runtime
///
/// The host client is required; the serializer defaults to JSON and the
/// trace sink to the tracing-backed one.
pub struct ActorRuntimeBuilder {
    host: Option<Arc<dyn HostClient>>,
    serializer: Arc<dyn ActorSerializer>,
    trace: Arc<dyn ActorTrace>,
    config: RuntimeConfig,
    registrations: Vec<(ActorTypeInformation, Arc<dyn ActorFactory>)>,
}

impl ActorRuntimeBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            host: None,
            serializer: Arc::new(JsonSerializer::new()),
            trace: Arc::new(TracingTrace::new()),
            config: RuntimeConfig::default(),
            registrations: Vec::new(),
        }
    }

    /// Set the host client
    pub fn with_host(mut self, host: Arc<dyn HostClient>) -> Self {
        self.host = Some(host);
        self
    }

    /// Set the serializer
    pub fn with_serializer(mut self, serializer: Arc<dyn ActorSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Set the trace sink
    pub fn with_trace(mut self, trace: Arc<dyn ActorTrace>) -> Self {
        self.trace = trace;
        self
    }

    /// Set the configuration
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an actor type
    pub fn register_actor(
        mut self,
        type_info: ActorTypeInformation,
        factory: Arc<dyn ActorFactory>,
    ) -> Self {
        self.registrations.push((type_info, factory));
        self
    }

    /// Build the runtime
    ///
    /// # Errors
    /// Fails when the host is missing, the configuration is invalid, or a
    /// type name is registered twice.
    pub fn build(self) -> Result<ActorRuntime> {
        let host = self.host.ok_or_else(|| Error::InvalidConfiguration {
            field: "host".into(),
            reason: "host client is required".into(),
        })?;

        self.config.validate()?;

        let mut managers = HashMap::new();
        for (type_info, factory) in self.registrations {
            let name = type_info.name().to_string();
            if managers.contains_key(&name) {
                return Err(Error::ActorTypeAlreadyRegistered { actor_type: name });
            }

            let context = Arc::new(RuntimeContext::new(
                type_info,
                host.clone(),
                self.serializer.clone(),
                self.trace.clone(),
            ));
            let manager = ActorManager::new(context, factory, self.config.mailbox_depth);
            managers.insert(name, manager);
        }

        info!(types = managers.len(), "Actor runtime built");
        Ok(ActorRuntime {
            managers,
            config: self.config,
        })
    }
}

impl Default for ActorRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide actor runtime
///
/// Immutable after build: the type registry never changes while serving.
pub struct ActorRuntime {
    managers: HashMap<String, ActorManager>,
    config: RuntimeConfig,
}

impl ActorRuntime {
    /// Create a builder
    pub fn builder() -> ActorRuntimeBuilder {
        ActorRuntimeBuilder::new()
    }

    fn manager(&self, actor_type: &str) -> Result<&ActorManager> {
        self.managers
            .get(actor_type)
            .ok_or_else(|| Error::ActorTypeNotRegistered {
                actor_type: actor_type.to_string(),
            })
    }

    /// Activate an actor, creating its instance
    pub async fn activate(&self, actor_type: &str, id: &ActorId) -> Result<()> {
        self.manager(actor_type)?.activate(id).await
    }

    /// Invoke a method on an active actor
    pub async fn invoke(
        &self,
        actor_type: &str,
        id: &ActorId,
        method: &str,
        payload: Bytes,
    ) -> Result<Bytes> {
        self.manager(actor_type)?.invoke(id, method, payload).await
    }

    /// Deactivate an actor and discard its instance
    pub async fn deactivate(&self, actor_type: &str, id: &ActorId) -> Result<()> {
        self.manager(actor_type)?.deactivate(id).await
    }

    /// Deliver a timer fire
    pub async fn fire_timer(
        &self,
        actor_type: &str,
        id: &ActorId,
        name: &str,
        payload: Bytes,
    ) -> Result<()> {
        self.manager(actor_type)?.fire_timer(id, name, payload).await
    }

    /// Deliver a reminder fire
    pub async fn fire_reminder(
        &self,
        actor_type: &str,
        id: &ActorId,
        name: &str,
        payload: Bytes,
    ) -> Result<()> {
        self.manager(actor_type)?
            .fire_reminder(id, name, payload)
            .await
    }

    /// Names of all registered actor types
    pub fn registered_types(&self) -> Vec<&str> {
        self.managers.keys().map(String::as_str).collect()
    }

    /// Check if an actor is active
    pub fn is_active(&self, actor_type: &str, id: &ActorId) -> Result<bool> {
        Ok(self.manager(actor_type)?.is_active(id))
    }

    /// Number of active actors of one type
    pub fn active_count(&self, actor_type: &str) -> Result<usize> {
        Ok(self.manager(actor_type)?.active_count())
    }

    /// Get the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Get a handle bound to one actor
    pub fn actor(self: &Arc<Self>, actor_type: &str, id: ActorId) -> Result<ActorHandle> {
        // Fail fast on unknown types instead of at first use
        self.manager(actor_type)?;
        Ok(ActorHandle::new(
            actor_type.to_string(),
            id,
            Arc::clone(self),
        ))
    }

    /// Deactivate every active actor of every type
    pub async fn shutdown(&self) {
        info!("Actor runtime shutting down");
        for manager in self.managers.values() {
            manager.deactivate_all().await;
        }
    }
}
