// SPDX-License-Identifier: MPL-2.0
//! Domain layer - pure retry-policy types with zero external dependencies.
//!
//! # Modules
//!
//! - [`request`]: Resource identity ([`ResourceKey`], [`LoadRequest`])
//! - [`retry`]: Retry budget ([`MaxRetries`])
//! - [`state`]: Derived presentation state ([`VisualState`], [`LoadOutcome`])

pub mod request;
pub mod retry;
pub mod state;

pub use request::{LoadRequest, ResourceKey};
pub use retry::MaxRetries;
pub use state::{LoadOutcome, VisualState};
