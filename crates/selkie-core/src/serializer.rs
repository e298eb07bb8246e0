//! Serialization seam for host-bound payloads
//!
//! Timer definitions and reminder parameters are serialized before being
//! handed to the host client. A serialization failure aborts the
//! registration; nothing is sent and nothing is registered locally.

use crate::error::{Error, Result};
use crate::scheduling::{ReminderParams, TimerDefinition};
use bytes::Bytes;

/// Serializer for host-bound actor payloads
///
/// Shared read-only by all instances of a registered actor type.
pub trait ActorSerializer: Send + Sync {
    /// Serialize a timer definition for the host's register-timer call
    fn serialize_timer(&self, timer: &TimerDefinition) -> Result<Bytes>;

    /// Serialize reminder parameters for the host's register-reminder call
    fn serialize_reminder(&self, params: &ReminderParams) -> Result<Bytes>;
}

/// JSON serializer backed by serde_json (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    /// Create a new JSON serializer
    pub fn new() -> Self {
        Self
    }
}

impl ActorSerializer for JsonSerializer {
    fn serialize_timer(&self, timer: &TimerDefinition) -> Result<Bytes> {
        serde_json::to_vec(timer)
            .map(Bytes::from)
            .map_err(|e| Error::SerializationFailed {
                reason: format!("timer {}: {}", timer.name(), e),
            })
    }

    fn serialize_reminder(&self, params: &ReminderParams) -> Result<Bytes> {
        serde_json::to_vec(params)
            .map(Bytes::from)
            .map_err(|e| Error::SerializationFailed {
                reason: e.to_string(),
            })
    }
}
