//! Trace sink for actor lifecycle messages
//!
//! The trace sink is a fire-and-forget side channel: implementations must
//! never fail the caller, and trace emission is never part of a lifecycle
//! sequence's failure path.

/// Sink for actor lifecycle trace messages
pub trait ActorTrace: Send + Sync {
    /// Emit an informational trace message
    ///
    /// Implementations must swallow their own failures.
    fn write_info(&self, category: &str, entity_id: &str, message: &str);
}

/// Trace sink that forwards to the `tracing` subscriber (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTrace;

impl TracingTrace {
    /// Create a new tracing-backed trace sink
    pub fn new() -> Self {
        Self
    }
}

impl ActorTrace for TracingTrace {
    fn write_info(&self, category: &str, entity_id: &str, message: &str) {
        tracing::info!(target: "selkie::trace", category, entity_id, "{}", message);
    }
}

/// Trace sink that discards all messages
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTrace;

impl ActorTrace for NoopTrace {
    fn write_info(&self, _category: &str, _entity_id: &str, _message: &str) {}
}
