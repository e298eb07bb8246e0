//! Actor identity and type metadata
//!
//! TigerStyle: Explicit validation on construction, immutable after creation.

use crate::constants::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// ActorId
// =============================================================================

/// Unique identifier for an actor
///
/// An opaque string identity, unique within an actor type. Used as the cache
/// and registry key, and as the correlation token for all host calls.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Create a new ActorId with validation
    ///
    /// # Errors
    /// Returns error if the id is empty, exceeds the length limit, or
    /// contains invalid characters.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.is_empty() {
            return Err(Error::InvalidActorId {
                id,
                reason: "id must not be empty".into(),
            });
        }

        if id.len() > ACTOR_ID_LENGTH_BYTES_MAX {
            return Err(Error::ActorIdTooLong {
                length: id.len(),
                limit: ACTOR_ID_LENGTH_BYTES_MAX,
            });
        }

        // Valid characters: alphanumeric, dash, underscore, dot
        if !id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(Error::InvalidActorId {
                id,
                reason: "id contains invalid characters".into(),
            });
        }

        Ok(Self(id))
    }

    /// Create an ActorId without validation (for internal use only)
    ///
    /// # Safety
    /// Caller must ensure the id is valid.
    #[doc(hidden)]
    pub fn new_unchecked(id: String) -> Self {
        debug_assert!(!id.is_empty());
        debug_assert!(id.len() <= ACTOR_ID_LENGTH_BYTES_MAX);
        Self(id)
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ActorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// ActorTypeInformation
// =============================================================================

/// Metadata for a registered actor type
///
/// Created once at type registration and shared by all instances of that
/// type. Capability flags govern what the runtime does on behalf of the
/// type's instances:
/// - `stateful`: lifecycle sequences flush the state cache to the host
/// - `remindable`: instances may register durable reminders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorTypeInformation {
    name: String,
    stateful: bool,
    remindable: bool,
}

impl ActorTypeInformation {
    /// Create type information with both capabilities enabled
    ///
    /// # Errors
    /// Returns error if the type name is empty or exceeds the length limit.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(Error::InvalidActorTypeName {
                name,
                reason: "name must not be empty".into(),
            });
        }

        if name.len() > ACTOR_TYPE_NAME_LENGTH_BYTES_MAX {
            return Err(Error::InvalidActorTypeName {
                reason: format!(
                    "name length {} exceeds limit {}",
                    name.len(),
                    ACTOR_TYPE_NAME_LENGTH_BYTES_MAX
                ),
                name,
            });
        }

        Ok(Self {
            name,
            stateful: true,
            remindable: true,
        })
    }

    /// Disable state persistence for this type
    pub fn without_state(mut self) -> Self {
        self.stateful = false;
        self
    }

    /// Disable reminder registration for this type
    pub fn without_reminders(mut self) -> Self {
        self.remindable = false;
        self
    }

    /// Get the actor type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether lifecycle sequences persist state to the host
    pub fn stateful(&self) -> bool {
        self.stateful
    }

    /// Whether instances of this type may register reminders
    pub fn remindable(&self) -> bool {
        self.remindable
    }
}
