// SPDX-License-Identifier: MPL-2.0
//! The retry/connectivity decision core.
//!
//! [`RetryController`] owns the retry state for one bound resource and
//! decides, after every event, what the rendering collaborator should show
//! and whether a new load attempt is dispatched. It is fully synchronous:
//! instead of arming timers or spawning fetches itself, every entry point
//! returns a [`Directive`] telling the surrounding event loop what to do.
//! This keeps the whole policy deterministic and clock-free under test;
//! [`crate::loader::ImageLoader`] is the production event loop.
//!
//! # State rules
//!
//! - Retry state is scoped per resource key. Rebinding to a different key
//!   resets the counter and invalidates any scheduled retry.
//! - The counter increments when a retry attempt is dispatched, not when a
//!   failure is reported, and never exceeds the configured budget.
//! - A success does NOT reset the counter. A resource that failed twice and
//!   then loaded starts its next failure already partway to exhaustion.
//!   This mirrors the long-standing shipped behavior; see `DESIGN.md`.
//! - Reconnecting after the budget is exhausted does not grant a fresh
//!   budget; the resource stays in fallback until rebound.

use crate::config::RetryConfig;
use crate::domain::{LoadOutcome, LoadRequest, MaxRetries, ResourceKey, VisualState};
use std::time::Duration;
use tracing::{debug, warn};

/// What the surrounding event loop must do after an entry point ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Nothing to do.
    None,
    /// Disarm the pending retry timer.
    CancelRetry,
    /// Arm the retry timer; call [`RetryController::retry_elapsed`] when it
    /// fires.
    ScheduleRetry(Duration),
    /// Start a fetch for this request now. Supersedes any armed retry timer
    /// and any fetch still in flight for the previous attempt.
    Dispatch(LoadRequest),
}

/// Where the current attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No attempt has been dispatched for the bound key.
    Idle,
    /// A fetch is in flight.
    InFlight,
    /// The last attempt loaded.
    Succeeded,
    /// The last attempt failed.
    Failed,
}

/// Retry state and decision logic for one bound resource at a time.
pub struct RetryController {
    key: Option<ResourceKey>,
    bound: bool,
    retry_count: u32,
    attempt_suffix: u32,
    max_retries: MaxRetries,
    retry_delay: Duration,
    connectivity_enabled: bool,
    is_connected: bool,
    phase: Phase,
    /// A retry timer is armed.
    retry_scheduled: bool,
    /// A scheduled retry fired while offline and dispatches on the next
    /// reconnect instead.
    retry_deferred: bool,
    /// The initial load was requested while offline and dispatches on the
    /// next reconnect.
    initial_deferred: bool,
}

impl RetryController {
    /// Creates a controller with the given policy configuration.
    ///
    /// Connectivity starts as "connected" until the first
    /// [`RetryController::report_connectivity_change`].
    #[must_use]
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            key: None,
            bound: false,
            retry_count: 0,
            attempt_suffix: 0,
            max_retries: config.max_retries(),
            retry_delay: config.retry_delay(),
            connectivity_enabled: config.connectivity_enabled,
            is_connected: true,
            phase: Phase::Idle,
            retry_scheduled: false,
            retry_deferred: false,
            initial_deferred: false,
        }
    }

    /// (Re)initializes retry state for a resource.
    ///
    /// Binding a different key resets the retry counter and invalidates any
    /// scheduled retry; binding the same key again is a no-op. `None` is the
    /// "no resource" case and presents as an immediate fallback with zero
    /// load requests.
    pub fn bind(&mut self, key: Option<ResourceKey>) -> Directive {
        if self.bound && self.key == key {
            return Directive::None;
        }

        self.bound = true;
        self.key = key;
        self.retry_count = 0;
        self.attempt_suffix = 0;
        self.retry_scheduled = false;
        self.retry_deferred = false;
        self.initial_deferred = false;
        self.phase = Phase::Idle;

        let Some(key) = self.key.clone() else {
            return Directive::CancelRetry;
        };

        if self.offline() {
            // No request while offline; the initial load fires on reconnect.
            debug!(key = %key, "bound while offline; deferring initial load");
            self.initial_deferred = true;
            return Directive::CancelRetry;
        }

        self.phase = Phase::InFlight;
        debug!(key = %key, "dispatching initial load");
        Directive::Dispatch(LoadRequest::new(key, 0))
    }

    /// Records the terminal outcome of the attempt in flight.
    pub fn report_outcome(&mut self, outcome: LoadOutcome) -> Directive {
        let Some(key) = self.key.clone() else {
            // Stale outcome from a torn-down binding.
            return Directive::None;
        };

        match outcome {
            LoadOutcome::Success => {
                self.phase = Phase::Succeeded;
                self.retry_deferred = false;
                if self.retry_scheduled {
                    self.retry_scheduled = false;
                    debug!(key = %key, "load succeeded; cancelling pending retry");
                    Directive::CancelRetry
                } else {
                    Directive::None
                }
            }
            LoadOutcome::Failure => {
                self.phase = Phase::Failed;
                if self.retry_count < self.max_retries.value() {
                    self.retry_scheduled = true;
                    debug!(
                        key = %key,
                        attempt = self.retry_count + 1,
                        max_retries = self.max_retries.value(),
                        delay_ms = self.retry_delay.as_millis() as u64,
                        "load failed; scheduling retry"
                    );
                    Directive::ScheduleRetry(self.retry_delay)
                } else {
                    warn!(
                        key = %key,
                        retries = self.retry_count,
                        "load failed; retry budget exhausted, falling back"
                    );
                    Directive::None
                }
            }
        }
    }

    /// Called when the armed retry timer fires.
    ///
    /// A timer that outlived a success, a rebind, or a bypassing reconnect
    /// is stale and ignored.
    pub fn retry_elapsed(&mut self) -> Directive {
        if !self.retry_scheduled {
            return Directive::None;
        }
        self.retry_scheduled = false;

        if self.offline() {
            // No request while offline; fire on the next reconnect instead.
            self.retry_deferred = true;
            return Directive::None;
        }
        self.dispatch_retry()
    }

    /// Records a connectivity transition from the connectivity source.
    ///
    /// A false→true transition with at least one failure on the current
    /// resource triggers an immediate retry, bypassing the delay, subject to
    /// the retry budget. Reconnection after exhaustion does nothing.
    pub fn report_connectivity_change(&mut self, connected: bool) -> Directive {
        let was_connected = self.is_connected;
        self.is_connected = connected;

        if !connected || was_connected {
            return Directive::None;
        }

        let Some(key) = self.key.clone() else {
            return Directive::None;
        };

        if self.initial_deferred {
            self.initial_deferred = false;
            self.phase = Phase::InFlight;
            debug!(key = %key, "connectivity restored; dispatching deferred initial load");
            return Directive::Dispatch(LoadRequest::new(key, self.attempt_suffix));
        }

        if self.retry_deferred {
            self.retry_deferred = false;
            debug!(key = %key, "connectivity restored; dispatching deferred retry");
            return self.dispatch_retry();
        }

        if self.phase == Phase::Failed
            && self.retry_count > 0
            && self.retry_count < self.max_retries.value()
        {
            // Bypass the armed delay, if any.
            self.retry_scheduled = false;
            debug!(key = %key, "connectivity restored; retrying immediately");
            return self.dispatch_retry();
        }

        Directive::None
    }

    /// The visual state derived from the current retry state.
    #[must_use]
    pub fn visual_state(&self) -> VisualState {
        if self.key.is_none() {
            return VisualState::Fallback;
        }
        if self.offline() {
            return VisualState::Offline;
        }

        let max_retries = self.max_retries.value();
        match self.phase {
            Phase::InFlight => VisualState::RetryPending {
                attempt: self.retry_count,
                max_retries,
            },
            Phase::Failed if self.retry_scheduled || self.retry_deferred => {
                VisualState::RetryPending {
                    attempt: self.retry_count + 1,
                    max_retries,
                }
            }
            Phase::Failed => VisualState::Fallback,
            Phase::Succeeded => VisualState::Success,
            // Idle with a key only happens while the initial load is
            // deferred offline, and the offline arm above pre-empts it.
            Phase::Idle => VisualState::Fallback,
        }
    }

    /// Retries attempted so far on the current resource.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Last known connectivity status.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    fn offline(&self) -> bool {
        self.connectivity_enabled && !self.is_connected
    }

    fn dispatch_retry(&mut self) -> Directive {
        let Some(key) = self.key.clone() else {
            return Directive::None;
        };
        debug_assert!(self.retry_count < self.max_retries.value());
        self.retry_count += 1;
        self.attempt_suffix += 1;
        self.phase = Phase::InFlight;
        Directive::Dispatch(LoadRequest::new(key, self.attempt_suffix))
    }
}
