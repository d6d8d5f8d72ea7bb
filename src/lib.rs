// SPDX-License-Identifier: MPL-2.0
//! `retry_lens` decides when a failed image load is retried, when it is
//! abandoned in favor of a fallback, and how connectivity transitions
//! interact with retry state.
//!
//! The crate does not fetch, decode, or render anything itself. Those
//! concerns live behind narrow boundary traits ([`ImageFetcher`],
//! [`ConnectivitySource`]) so the policy can be driven deterministically in
//! tests and embedded in any UI shell:
//!
//! - [`RetryController`] is the synchronous decision core. Every event entry
//!   point returns a [`Directive`] telling the caller what to do next.
//! - [`ImageLoader`] wraps the controller in a Tokio task that owns the
//!   retry timer, the in-flight fetch, and the connectivity subscription,
//!   and reports [`VisualState`] transitions over an event channel.

#![doc(html_root_url = "https://docs.rs/retry_lens/0.1.0")]

pub mod config;
pub mod connectivity;
pub mod controller;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod loader;

pub use config::RetryConfig;
pub use connectivity::{ConnectivitySource, SimulatedConnectivity, StaticConnectivity};
pub use controller::{Directive, RetryController};
pub use domain::{LoadOutcome, LoadRequest, MaxRetries, ResourceKey, VisualState};
pub use error::{Error, LoadFailure, Result};
pub use fetcher::ImageFetcher;
pub use loader::{ImageLoader, LoaderEvent};
