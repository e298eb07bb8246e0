//! TigerStyle constants for Selkie
//!
//! All limits are explicit, use big-endian naming (most significant first),
//! and include units in the name.

// =============================================================================
// Actor Limits
// =============================================================================

/// Maximum length of an actor ID in bytes
pub const ACTOR_ID_LENGTH_BYTES_MAX: usize = 256;

/// Maximum length of an actor type name in bytes
pub const ACTOR_TYPE_NAME_LENGTH_BYTES_MAX: usize = 128;

// =============================================================================
// State Limits
// =============================================================================

/// Maximum length of a state key in bytes
pub const STATE_KEY_LENGTH_BYTES_MAX: usize = 256;

/// Maximum size of a single state value in bytes (1 MB)
pub const STATE_VALUE_SIZE_BYTES_MAX: usize = 1024 * 1024;

/// Maximum number of operations in a single state flush batch
pub const STATE_SAVE_OPERATIONS_COUNT_MAX: usize = 10_000;

// =============================================================================
// Scheduling Limits
// =============================================================================

/// Maximum length of a timer or reminder name in bytes
pub const TIMER_NAME_LENGTH_BYTES_MAX: usize = 256;

/// Maximum number of timers registered per actor
pub const TIMERS_PER_ACTOR_COUNT_MAX: usize = 1000;

// =============================================================================
// Dispatch Limits
// =============================================================================

/// Maximum depth of a per-actor turn queue
pub const MAILBOX_DEPTH_MAX: usize = 10_000;

/// Default depth of a per-actor turn queue
pub const MAILBOX_DEPTH_DEFAULT: usize = 1024;

// Compile-time assertions for constant validity
const _: () = {
    assert!(ACTOR_ID_LENGTH_BYTES_MAX >= 64);
    assert!(ACTOR_TYPE_NAME_LENGTH_BYTES_MAX >= 32);
    assert!(STATE_KEY_LENGTH_BYTES_MAX >= 64);
    assert!(STATE_VALUE_SIZE_BYTES_MAX <= 100 * 1024 * 1024); // <= 100 MB
    assert!(MAILBOX_DEPTH_DEFAULT <= MAILBOX_DEPTH_MAX);
};
