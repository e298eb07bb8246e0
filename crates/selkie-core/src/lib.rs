//! Selkie Core
//!
//! Core types, errors, and constants for the Selkie virtual actor runtime.
//!
//! # Overview
//!
//! Selkie is an in-process runtime for virtual actors: single-threaded units
//! of state and behavior, identified by type and id, whose lifecycle,
//! durable state, and scheduled callbacks are coordinated with an external
//! placement/state host.
//!
//! This crate holds the pieces shared across the workspace: actor identity
//! and type metadata, error types, explicit limits, the serializer and trace
//! seams, and telemetry bootstrap.
//!
//! # TigerStyle
//!
//! This crate follows [TigerStyle](https://github.com/tigerbeetle/tigerbeetle/blob/main/docs/TIGER_STYLE.md)
//! engineering principles:
//! - Safety > Performance > Developer Experience
//! - Explicit limits with big-endian naming (e.g., `ACTOR_ID_LENGTH_BYTES_MAX`)
//! - Explicit validation on construction

pub mod actor;
pub mod constants;
pub mod error;
pub mod scheduling;
pub mod serializer;
pub mod telemetry;
pub mod trace;

pub use actor::{ActorId, ActorTypeInformation};
pub use constants::*;
pub use error::{Error, Result};
pub use scheduling::{ReminderParams, TimerDefinition};
pub use serializer::{ActorSerializer, JsonSerializer};
pub use telemetry::{init_telemetry, TelemetryConfig};
pub use trace::{ActorTrace, NoopTrace, TracingTrace};
