//! Runtime configuration
//!
//! TigerStyle: Explicit defaults, validation, reasonable limits.

use selkie_core::constants::{MAILBOX_DEPTH_DEFAULT, MAILBOX_DEPTH_MAX};
use selkie_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the actor runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Maximum queued turns per actor before callers are rejected
    #[serde(default = "default_mailbox_depth")]
    pub mailbox_depth: usize,
}

fn default_mailbox_depth() -> usize {
    MAILBOX_DEPTH_DEFAULT
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mailbox_depth: default_mailbox_depth(),
        }
    }
}

impl RuntimeConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.mailbox_depth == 0 {
            return Err(Error::InvalidConfiguration {
                field: "mailbox_depth".into(),
                reason: "must be positive".into(),
            });
        }
        if self.mailbox_depth > MAILBOX_DEPTH_MAX {
            return Err(Error::InvalidConfiguration {
                field: "mailbox_depth".into(),
                reason: format!(
                    "{} exceeds limit {}",
                    self.mailbox_depth, MAILBOX_DEPTH_MAX
                ),
            });
        }
        Ok(())
    }
}
