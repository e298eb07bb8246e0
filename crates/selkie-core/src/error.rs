//! Error types for Selkie
//!
//! TigerStyle: Explicit error types with context, using thiserror.

use thiserror::Error;

/// Result type alias for Selkie operations
pub type Result<T> = std::result::Result<T, Error>;

/// Selkie error types
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Actor Errors
    // =========================================================================
    #[error("Actor type not registered: {actor_type}")]
    ActorTypeNotRegistered { actor_type: String },

    #[error("Actor type already registered: {actor_type}")]
    ActorTypeAlreadyRegistered { actor_type: String },

    #[error("Actor not active: {id}")]
    ActorNotActive { id: String },

    #[error("Actor already active: {id}")]
    ActorAlreadyActive { id: String },

    #[error("Actor deactivated: {id}")]
    ActorDeactivated { id: String },

    #[error("Invalid operation: {operation}")]
    InvalidOperation { operation: String },

    #[error("Lifecycle step {step} failed for actor {id}")]
    LifecycleStepFailed {
        id: String,
        step: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Actor mailbox full: {id}, depth: {depth}, max: {max}")]
    MailboxFull {
        id: String,
        depth: usize,
        max: usize,
    },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid actor ID: {id}, reason: {reason}")]
    InvalidActorId { id: String, reason: String },

    #[error("Actor ID too long: {length} bytes exceeds limit of {limit} bytes")]
    ActorIdTooLong { length: usize, limit: usize },

    #[error("Invalid actor type name: {name}, reason: {reason}")]
    InvalidActorTypeName { name: String, reason: String },

    #[error("Invalid state key: {key}, reason: {reason}")]
    InvalidStateKey { key: String, reason: String },

    #[error("State value too large: {size} bytes exceeds limit of {limit} bytes")]
    StateValueTooLarge { size: usize, limit: usize },

    #[error("Invalid timer name: {name}, reason: {reason}")]
    InvalidTimerName { name: String, reason: String },

    // =========================================================================
    // State Errors
    // =========================================================================
    #[error("State access failed for key {key}: {reason}")]
    StateAccessFailed { key: String, reason: String },

    #[error("State save failed: {reason}")]
    StateSaveFailed { reason: String },

    // =========================================================================
    // Scheduling Errors
    // =========================================================================
    #[error("Timer registration failed: {name}, reason: {reason}")]
    TimerRegistrationFailed { name: String, reason: String },

    #[error("Timer unregistration failed: {name}, reason: {reason}")]
    TimerUnregistrationFailed { name: String, reason: String },

    #[error("Timer not found: {name}")]
    TimerNotFound { name: String },

    #[error("Timer limit exceeded: {count} timers reaches limit of {limit}")]
    TimerLimitExceeded { count: usize, limit: usize },

    #[error("Reminder registration failed: {name}, reason: {reason}")]
    ReminderRegistrationFailed { name: String, reason: String },

    #[error("Reminder unregistration failed: {name}, reason: {reason}")]
    ReminderUnregistrationFailed { name: String, reason: String },

    // =========================================================================
    // Host & Serialization Errors
    // =========================================================================
    #[error("Host call failed: {operation}, reason: {reason}")]
    HostCallFailed { operation: String, reason: String },

    #[error("Serialization failed: {reason}")]
    SerializationFailed { reason: String },

    #[error("Deserialization failed: {reason}")]
    DeserializationFailed { reason: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {field}, reason: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {reason}")]
    Internal { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create an actor not active error
    pub fn actor_not_active(id: impl Into<String>) -> Self {
        Self::ActorNotActive { id: id.into() }
    }

    /// Create a state access error
    pub fn state_access_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StateAccessFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a state save error
    pub fn state_save_failed(reason: impl Into<String>) -> Self {
        Self::StateSaveFailed {
            reason: reason.into(),
        }
    }

    /// Create a host call error
    pub fn host_call_failed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HostCallFailed {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization_failed(reason: impl Into<String>) -> Self {
        Self::SerializationFailed {
            reason: reason.into(),
        }
    }

    /// Wrap a failed lifecycle step, aborting the remaining steps of its sequence
    pub fn lifecycle_step_failed(id: impl Into<String>, step: &'static str, source: Error) -> Self {
        Self::LifecycleStepFailed {
            id: id.into(),
            step,
            source: Box::new(source),
        }
    }

    /// Create an internal error
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Check if this error is retriable
    ///
    /// A failed state flush leaves the local cache untouched, so retrying
    /// `save()` is safe and idempotent.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::HostCallFailed { .. }
                | Self::StateAccessFailed { .. }
                | Self::StateSaveFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::actor_not_active("cart-42");
        assert!(err.to_string().contains("cart-42"));
    }

    #[test]
    fn test_error_is_retriable() {
        assert!(Error::state_save_failed("host unreachable").is_retriable());
        assert!(Error::host_call_failed("register_timer", "timeout").is_retriable());
        assert!(!Error::ActorNotActive { id: "a".into() }.is_retriable());
    }

    #[test]
    fn test_lifecycle_step_error_keeps_source() {
        let err = Error::lifecycle_step_failed(
            "cart-42",
            "on_activate",
            Error::internal("hook exploded"),
        );
        assert!(err.to_string().contains("on_activate"));
        let source = std::error::Error::source(&err).expect("source retained");
        assert!(source.to_string().contains("hook exploded"));
    }
}
