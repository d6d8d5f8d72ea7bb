// SPDX-License-Identifier: MPL-2.0
//! Derived presentation state.
//!
//! [`VisualState`] is recomputed from the controller's retry state after
//! every event; it is never stored by the controller itself. The precedence
//! order is fixed:
//!
//! 1. No resource bound → [`VisualState::Fallback`]
//! 2. Offline while connectivity gating is enabled → [`VisualState::Offline`]
//! 3. Attempt in flight, scheduled, or deferred → [`VisualState::RetryPending`]
//! 4. Failed with the retry budget exhausted → [`VisualState::Fallback`]
//! 5. Loaded → [`VisualState::Success`]

use std::fmt;

/// Terminal result of one load attempt, as reported by the fetch collaborator.
///
/// The retry policy treats every failure uniformly; the underlying error is
/// never inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The attempt yielded a renderable image.
    Success,
    /// The attempt failed for any reason.
    Failure,
}

/// What the rendering collaborator should present right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualState {
    /// Terminal placeholder: no resource, or no further automatic retries.
    Fallback,
    /// No network connectivity; pre-empts pending and in-flight attempts.
    Offline,
    /// An attempt is in flight or a retry is scheduled.
    ///
    /// `attempt` is the retry counter of the attempt being made (0 while the
    /// initial load is in flight), suitable for an "attempt/max" progress
    /// caption.
    RetryPending {
        /// Retry counter of the attempt in flight or about to run.
        attempt: u32,
        /// Configured retry budget.
        max_retries: u32,
    },
    /// The image loaded; render it.
    Success,
}

impl VisualState {
    /// Returns true if no further automatic action will occur in this state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, VisualState::Fallback | VisualState::Success)
    }
}

impl fmt::Display for VisualState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualState::Fallback => f.write_str("fallback"),
            VisualState::Offline => f.write_str("offline"),
            VisualState::RetryPending {
                attempt,
                max_retries,
            } => write!(f, "retrying {}/{}", attempt, max_retries),
            VisualState::Success => f.write_str("success"),
        }
    }
}
