//! Actor trait and instance lifecycle
//!
//! TigerStyle: Explicit lifecycle states, strict per-turn step ordering.
//!
//! An instance runs exactly one activation/deactivation bracket:
//! activation, any number of invocation turns, deactivation, discard. Each
//! turn's steps form a strict sequential pipeline: every step completes
//! before the next begins, even though each is independently asynchronous.

use crate::context::{ActorCallType, ActorContext, MethodContext};
use async_trait::async_trait;
use bytes::Bytes;
use selkie_core::{ActorId, Error, Result, TimerDefinition};
use tracing::{debug, error, info, instrument, warn};

/// Category tag for trace sink messages
const TRACE_CATEGORY: &str = "Actor";

// =============================================================================
// Actor trait
// =============================================================================

/// Actor trait - implement to create actors
///
/// Execution is single-threaded per actor: no method body, hook, or state
/// flush for a given actor ever runs concurrently with another for the same
/// actor. All hooks default to no-ops; the runtime composes the fixed
/// lifecycle sequences around whatever the implementation supplies.
#[async_trait]
pub trait Actor: Send + Sync + 'static {
    /// Handle a method invocation
    ///
    /// Called for each method dispatched to the actor, including timer
    /// fires (which target a method by name).
    async fn invoke(
        &self,
        ctx: &mut ActorContext,
        method: &str,
        payload: Bytes,
    ) -> Result<Bytes>;

    /// Called after the actor has been activated, before its state is flushed
    async fn on_activate(&self, _ctx: &mut ActorContext) -> Result<()> {
        Ok(())
    }

    /// Called before the actor is deactivated
    async fn on_deactivate(&self, _ctx: &mut ActorContext) -> Result<()> {
        Ok(())
    }

    /// Called before every invocation turn
    async fn on_pre_invoke(&self, _ctx: &mut ActorContext, _call: &MethodContext) -> Result<()> {
        Ok(())
    }

    /// Called after every successful invocation, before the state flush
    async fn on_post_invoke(&self, _ctx: &mut ActorContext, _call: &MethodContext) -> Result<()> {
        Ok(())
    }

    /// Called when a reminder fires
    async fn on_reminder(
        &self,
        _ctx: &mut ActorContext,
        name: &str,
        _payload: Bytes,
    ) -> Result<()> {
        Err(Error::InvalidOperation {
            operation: format!("reminder {} fired but on_reminder is not implemented", name),
        })
    }

    /// Called after a timer has been unregistered against the host
    ///
    /// Failures are logged and never propagated.
    async fn on_timer_unregistered(
        &self,
        _ctx: &mut ActorContext,
        _timer: &TimerDefinition,
    ) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// LifecycleState
// =============================================================================

/// Actor instance lifecycle state
///
/// State transitions:
/// ```text
///   +---------------+
///   | Uninitialized |
///   +---------------+
///          |
///          v
///   +---------------+     (failed activation)
///   |  Activating   | ------------------+
///   +---------------+                   |
///          |                            |
///          v                            v
///   +---------------+          +---------------+
///   |    Active     |          |  Deactivated  |  (terminal)
///   +---------------+          +---------------+
///          |                            ^
///          v                            |
///   +---------------+                   |
///   | Deactivating  | ------------------+
///   +---------------+
/// ```
///
/// No transition skips a state. `Active` is the only state in which
/// user-visible method invocations are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Instance constructed, activation sequence not yet started
    #[default]
    Uninitialized,
    /// Activation sequence in progress
    Activating,
    /// Accepting invocation turns
    Active,
    /// Deactivation sequence in progress
    Deactivating,
    /// Terminal; the instance must be discarded
    Deactivated,
}

impl LifecycleState {
    /// Check if the instance can accept invocation turns
    pub fn can_invoke(&self) -> bool {
        matches!(self, LifecycleState::Active)
    }

    /// Check if a transition is valid
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        match (self, next) {
            (LifecycleState::Uninitialized, LifecycleState::Activating) => true,
            (LifecycleState::Activating, LifecycleState::Active) => true,
            // Failed activation: the instance is never promoted to Active
            (LifecycleState::Activating, LifecycleState::Deactivated) => true,
            (LifecycleState::Active, LifecycleState::Deactivating) => true,
            (LifecycleState::Deactivating, LifecycleState::Deactivated) => true,
            _ if *self == next => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Uninitialized => write!(f, "uninitialized"),
            LifecycleState::Activating => write!(f, "activating"),
            LifecycleState::Active => write!(f, "active"),
            LifecycleState::Deactivating => write!(f, "deactivating"),
            LifecycleState::Deactivated => write!(f, "deactivated"),
        }
    }
}

// =============================================================================
// ActorInstance
// =============================================================================

/// An actor instance bound to one activation/deactivation bracket
///
/// Exactly one instance exists per (type, id) at any time within a process;
/// the dispatcher enforces this by construction/discard discipline.
pub struct ActorInstance {
    actor: Box<dyn Actor>,
    context: ActorContext,
    lifecycle: LifecycleState,
}

impl ActorInstance {
    /// Create an instance in the `Uninitialized` state
    pub fn new(actor: Box<dyn Actor>, context: ActorContext) -> Self {
        Self {
            actor,
            context,
            lifecycle: LifecycleState::Uninitialized,
        }
    }

    /// Get the actor's id
    pub fn id(&self) -> &ActorId {
        self.context.id()
    }

    /// Get the current lifecycle state
    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    /// Run the activation sequence
    ///
    /// clear state cache, `on_activate` hook, trace, flush state - each step
    /// completes before the next begins. Any failure aborts the remaining
    /// steps and leaves the instance terminal: it is never promoted to
    /// `Active` and must be discarded by the dispatcher.
    #[instrument(skip(self), fields(actor_id = %self.context.id(), actor_type = %self.context.actor_type()), level = "info")]
    pub async fn activate(&mut self) -> Result<()> {
        assert!(
            self.lifecycle.can_transition_to(LifecycleState::Activating),
            "invalid state transition: {} -> activating",
            self.lifecycle
        );
        self.lifecycle = LifecycleState::Activating;
        self.trace("Activating ...");

        match self.run_activation_steps().await {
            Ok(()) => {
                self.lifecycle = LifecycleState::Active;
                info!(actor_id = %self.context.id(), "Actor activated");
                Ok(())
            }
            Err(e) => {
                self.lifecycle = LifecycleState::Deactivated;
                error!(actor_id = %self.context.id(), error = %e, "Activation failed");
                Err(e)
            }
        }
    }

    async fn run_activation_steps(&mut self) -> Result<()> {
        self.context.state_mut().clear();

        if let Err(e) = self.actor.on_activate(&mut self.context).await {
            return Err(self.step_error("on_activate", e));
        }

        self.trace("Activated");
        self.flush_state("save_state").await
    }

    /// Run one invocation turn for a plain method call
    pub async fn invoke(&mut self, method: &str, payload: Bytes) -> Result<Bytes> {
        self.run_turn(MethodContext::for_method(method), payload)
            .await
    }

    /// Run one invocation turn for a timer fire
    ///
    /// Resolves the timer's target method through the local registry. When
    /// the host delivers no payload, the locally registered payload is used.
    pub async fn fire_timer(&mut self, name: &str, payload: Bytes) -> Result<()> {
        let timer = self
            .context
            .timers()
            .lookup(name)
            .ok_or_else(|| Error::TimerNotFound { name: name.into() })?;

        let payload = if payload.is_empty() {
            timer.payload().clone()
        } else {
            payload
        };

        self.run_turn(MethodContext::for_timer(timer.method_name()), payload)
            .await
            .map(|_| ())
    }

    /// Run one invocation turn for a reminder fire
    pub async fn fire_reminder(&mut self, name: &str, payload: Bytes) -> Result<()> {
        self.run_turn(MethodContext::for_reminder(name), payload)
            .await
            .map(|_| ())
    }

    /// The uniform invocation turn pipeline
    ///
    /// pre-hook, dispatch, pending unregistered-timer hooks, post-hook,
    /// state flush. A failing hook or user method aborts the remaining steps
    /// and discards the un-flushed cache, so the failed turn's mutations can
    /// never reach a later flush. A failing flush leaves the cache intact
    /// for an idempotent retry.
    #[instrument(skip(self, payload), fields(actor_id = %self.context.id(), method = %call.method_name()), level = "debug")]
    async fn run_turn(&mut self, call: MethodContext, payload: Bytes) -> Result<Bytes> {
        assert!(
            self.lifecycle.can_invoke(),
            "cannot invoke actor {} in state {}",
            self.context.id(),
            self.lifecycle
        );

        if let Err(e) = self.actor.on_pre_invoke(&mut self.context, &call).await {
            self.context.state_mut().clear();
            return Err(self.step_error("on_pre_invoke", e));
        }

        let result = match call.call_type() {
            ActorCallType::Method | ActorCallType::Timer => {
                self.actor
                    .invoke(&mut self.context, call.method_name(), payload)
                    .await
            }
            ActorCallType::Reminder => self
                .actor
                .on_reminder(&mut self.context, call.method_name(), payload)
                .await
                .map(|_| Bytes::new()),
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.context.state_mut().clear();
                debug!(
                    actor_id = %self.context.id(),
                    method = %call.method_name(),
                    error = %e,
                    "Invocation failed, un-flushed state discarded"
                );
                return Err(e);
            }
        };

        self.deliver_unregistered_timer_hooks().await;

        if let Err(e) = self.actor.on_post_invoke(&mut self.context, &call).await {
            self.context.state_mut().clear();
            return Err(self.step_error("on_post_invoke", e));
        }

        self.flush_state("save_state").await?;
        Ok(response)
    }

    /// Run the deactivation sequence
    ///
    /// clear state cache, `on_deactivate` hook, trace, flush state. The
    /// instance is terminal afterwards regardless of outcome; no further
    /// calls are valid against it.
    #[instrument(skip(self), fields(actor_id = %self.context.id(), actor_type = %self.context.actor_type()), level = "info")]
    pub async fn deactivate(&mut self) -> Result<()> {
        if self.lifecycle == LifecycleState::Deactivated {
            return Ok(());
        }

        assert!(
            self.lifecycle.can_transition_to(LifecycleState::Deactivating),
            "invalid state transition: {} -> deactivating",
            self.lifecycle
        );
        self.lifecycle = LifecycleState::Deactivating;
        self.trace("Deactivating ...");

        let result = self.run_deactivation_steps().await;
        self.lifecycle = LifecycleState::Deactivated;

        match &result {
            Ok(()) => info!(actor_id = %self.context.id(), "Actor deactivated"),
            Err(e) => {
                error!(actor_id = %self.context.id(), error = %e, "Deactivation failed")
            }
        }
        result
    }

    async fn run_deactivation_steps(&mut self) -> Result<()> {
        self.context.state_mut().clear();

        if let Err(e) = self.actor.on_deactivate(&mut self.context).await {
            return Err(self.step_error("on_deactivate", e));
        }

        self.trace("Deactivated");
        self.flush_state("save_state").await
    }

    /// Deliver queued unregistered-timer hooks
    ///
    /// Hook failures are logged only, never propagated.
    async fn deliver_unregistered_timer_hooks(&mut self) {
        for timer in self.context.timers().take_unregistered() {
            if let Err(e) = self
                .actor
                .on_timer_unregistered(&mut self.context, &timer)
                .await
            {
                warn!(
                    actor_id = %self.context.id(),
                    timer = %timer.name(),
                    error = %e,
                    "on_timer_unregistered hook failed"
                );
            }
        }
    }

    /// Flush state unless the type has persistence disabled
    async fn flush_state(&mut self, step: &'static str) -> Result<()> {
        if !self.context.runtime().type_info().stateful() {
            return Ok(());
        }
        match self.context.state_mut().save().await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.step_error(step, e)),
        }
    }

    /// Emit a trace message; fire-and-forget, never part of the failure path
    fn trace(&self, message: &str) {
        self.context
            .runtime()
            .trace()
            .write_info(TRACE_CATEGORY, self.context.id().as_str(), message);
    }

    fn step_error(&self, step: &'static str, source: Error) -> Error {
        Error::lifecycle_step_failed(self.context.id().as_str(), step, source)
    }
}
