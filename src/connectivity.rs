// SPDX-License-Identifier: MPL-2.0
//! Connectivity source boundary.
//!
//! The retry policy never probes the network itself. It consumes an
//! injectable [`ConnectivitySource`] so tests can simulate offline/online
//! transitions deterministically instead of depending on a process-wide
//! singleton. A real implementation should report "no network interfaces"
//! as disconnected and any other state as connected.

use tokio::sync::watch;

/// Capability providing connectivity status to the retry policy.
pub trait ConnectivitySource: Send + Sync {
    /// Point-in-time connectivity query.
    fn is_connected(&self) -> bool;

    /// Subscription delivering connectivity changes.
    ///
    /// The receiver's current value is the status at subscription time;
    /// subsequent changes wake the receiver.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Source with a fixed connectivity status that never changes.
///
/// Useful for callers that opt out of connectivity gating, or for tests
/// that only exercise the retry budget.
#[derive(Debug)]
pub struct StaticConnectivity {
    tx: watch::Sender<bool>,
}

impl StaticConnectivity {
    /// A source that always reports connected.
    #[must_use]
    pub fn online() -> Self {
        Self {
            tx: watch::Sender::new(true),
        }
    }

    /// A source that always reports disconnected.
    #[must_use]
    pub fn offline() -> Self {
        Self {
            tx: watch::Sender::new(false),
        }
    }
}

impl ConnectivitySource for StaticConnectivity {
    fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Hand-driven source for tests and demos.
///
/// Flip the status with [`SimulatedConnectivity::set_connected`] to deliver
/// a transition to every subscriber.
#[derive(Debug)]
pub struct SimulatedConnectivity {
    tx: watch::Sender<bool>,
}

impl SimulatedConnectivity {
    /// Creates a source with the given initial status.
    #[must_use]
    pub fn new(connected: bool) -> Self {
        Self {
            tx: watch::Sender::new(connected),
        }
    }

    /// Sets the connectivity status, notifying subscribers on change.
    pub fn set_connected(&self, connected: bool) {
        self.tx.send_if_modified(|status| {
            let changed = *status != connected;
            *status = connected;
            changed
        });
    }
}

impl ConnectivitySource for SimulatedConnectivity {
    fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
