// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the crate.

// ==========================================================================
// Retry Budget Defaults
// ==========================================================================

// The retry budget bounds live beside `MaxRetries` in the domain layer so
// that layer stays self-contained; they are re-exported here with the rest
// of the configuration constants.
pub use crate::domain::retry::{DEFAULT_MAX_RETRIES, MAX_MAX_RETRIES, MIN_MAX_RETRIES};

// ==========================================================================
// Retry Delay Defaults
// ==========================================================================

/// Default delay between a failure and its retry attempt (in milliseconds).
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

/// Minimum retry delay (in milliseconds).
pub const MIN_RETRY_DELAY_MS: u64 = 50;

/// Maximum retry delay (in milliseconds).
pub const MAX_RETRY_DELAY_MS: u64 = 60_000;

// ==========================================================================
// Connectivity Defaults
// ==========================================================================

/// Whether connectivity gating is enabled by default.
pub const DEFAULT_CONNECTIVITY_ENABLED: bool = true;
