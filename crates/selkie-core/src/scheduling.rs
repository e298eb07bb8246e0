//! Scheduled callback definitions: timers and reminders
//!
//! A timer is a lighter-weight scheduled callback tracked locally for the
//! lifetime of an activation. A reminder is durable on the host side and is
//! never retained in-process: its parameters are constructed, serialized,
//! and handed to the host.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// ReminderParams
// =============================================================================

/// Parameters for a durable reminder registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderParams {
    /// Opaque payload delivered back when the reminder fires
    pub payload: Bytes,
    /// Delay before the first trigger
    pub due_time: Duration,
    /// Interval between subsequent triggers
    pub period: Duration,
}

impl ReminderParams {
    /// Create reminder parameters
    pub fn new(payload: impl Into<Bytes>, due_time: Duration, period: Duration) -> Self {
        Self {
            payload: payload.into(),
            due_time,
            period,
        }
    }
}

// =============================================================================
// TimerDefinition
// =============================================================================

/// Definition of an actor timer
///
/// The name is unique within the owning actor's registry; re-registering the
/// same name overwrites the previous definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerDefinition {
    name: String,
    method_name: String,
    payload: Bytes,
    due_time: Duration,
    period: Duration,
}

impl TimerDefinition {
    /// Create a timer definition
    pub fn new(
        name: impl Into<String>,
        method_name: impl Into<String>,
        payload: impl Into<Bytes>,
        due_time: Duration,
        period: Duration,
    ) -> Self {
        let name = name.into();
        let method_name = method_name.into();
        debug_assert!(!name.is_empty(), "timer name must not be empty");
        debug_assert!(!method_name.is_empty(), "method name must not be empty");

        Self {
            name,
            method_name,
            payload: payload.into(),
            due_time,
            period,
        }
    }

    /// Get the timer name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the target method name invoked when the timer fires
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Get the opaque payload delivered to the target method
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Get the delay before the first trigger
    pub fn due_time(&self) -> Duration {
        self.due_time
    }

    /// Get the interval between subsequent triggers
    pub fn period(&self) -> Duration {
        self.period
    }
}
