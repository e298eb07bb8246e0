//! Selkie Runtime
//!
//! Actor lifecycle, state coordination, and dispatch for Selkie virtual
//! actors.
//!
//! # Overview
//!
//! The runtime provides:
//! - Turn-based execution: at most one in-flight turn per actor id
//! - A strict activate / invoke / deactivate lifecycle pipeline per actor
//! - A per-actor state cache flushed as one batched transaction per turn
//! - Timer and reminder registration against the external host
//!
//! # TigerStyle
//! - Explicit lifecycle states, no transition skips a state
//! - Per-actor turn queues (no cross-turn locks)
//! - Bounded mailboxes (no silent drops)

pub mod config;
pub mod context;
pub mod handle;
pub mod instance;
pub mod manager;
pub mod runtime;
pub mod state;
pub mod timers;

pub use config::RuntimeConfig;
pub use context::{ActorCallType, ActorContext, MethodContext, RuntimeContext};
pub use handle::ActorHandle;
pub use instance::{Actor, ActorInstance, LifecycleState};
pub use manager::{ActorFactory, ActorManager, CloneFactory, FnFactory};
pub use runtime::{ActorRuntime, ActorRuntimeBuilder};
pub use state::ActorStateManager;
pub use timers::TimerRegistry;
