// SPDX-License-Identifier: MPL-2.0
//! Image fetch boundary.
//!
//! The retry policy hands each attempt to an external [`ImageFetcher`]
//! (typically a caching HTTP image loader) and only looks at whether the
//! attempt succeeded. Fetch errors are opaque [`LoadFailure`]s; the policy
//! treats them all uniformly.

use crate::domain::LoadRequest;
use crate::error::LoadFailure;
use std::future::Future;

/// Boundary to the external cached-image fetcher.
///
/// One call is one attempt. The request's [`LoadRequest::cache_key`] is the
/// cache-distinguishing identity: a fetcher backed by a cache must key its
/// entries on it so retries are not served from the failed entry.
///
/// Dropping the returned future cancels the attempt; the loader does this
/// when a resource is rebound or superseded by an immediate retry.
pub trait ImageFetcher: Send + Sync + 'static {
    /// Opaque renderable handed to the rendering collaborator on success.
    type Image: Send + 'static;

    /// Fetches one attempt of the requested resource.
    fn fetch(
        &self,
        request: LoadRequest,
    ) -> impl Future<Output = std::result::Result<Self::Image, LoadFailure>> + Send;
}
