// SPDX-License-Identifier: MPL-2.0
//! Resource identity types.
//!
//! A [`ResourceKey`] names the image being loaded (typically a URL) and
//! scopes all retry state: changing the key discards the old state. A
//! [`LoadRequest`] pairs a key with an attempt suffix so that caches keyed
//! on the resource identity alone do not short-circuit a retry.

use std::fmt;

/// Identifier of the image being loaded (e.g. a URL).
///
/// The key is guaranteed non-empty; an absent or empty identifier is the
/// "no resource" case, which callers represent as `Option::<ResourceKey>::None`.
///
/// # Example
///
/// ```
/// use retry_lens::ResourceKey;
///
/// let key = ResourceKey::new("https://example.com/cat.png").unwrap();
/// assert_eq!(key.as_str(), "https://example.com/cat.png");
///
/// // Empty identifiers mean "no resource"
/// assert!(ResourceKey::new("").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Creates a resource key, returning `None` for an empty identifier.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One logical image-load attempt handed to the fetch collaborator.
///
/// The attempt suffix starts at 0 for the initial load and increments with
/// every retry. [`LoadRequest::cache_key`] combines it with the resource key
/// so a fetcher backed by a cache re-fetches instead of replaying the failed
/// entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    key: ResourceKey,
    attempt: u32,
}

impl LoadRequest {
    /// Creates a request for the given attempt of a resource.
    #[must_use]
    pub fn new(key: ResourceKey, attempt: u32) -> Self {
        Self { key, attempt }
    }

    /// The resource being loaded.
    #[must_use]
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Attempt counter: 0 for the initial load, then 1, 2, ... per retry.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Cache-distinguishing identity for this attempt.
    ///
    /// The initial attempt uses the bare resource key so a warm cache still
    /// hits; retries append the attempt counter to force a distinct fetch.
    #[must_use]
    pub fn cache_key(&self) -> String {
        if self.attempt == 0 {
            self.key.as_str().to_string()
        } else {
            format!("{}#retry-{}", self.key, self.attempt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_rejected() {
        assert!(ResourceKey::new("").is_none());
        assert!(ResourceKey::new(String::new()).is_none());
    }

    #[test]
    fn non_empty_key_round_trips() {
        let key = ResourceKey::new("https://example.com/a.png").unwrap();
        assert_eq!(key.as_str(), "https://example.com/a.png");
        assert_eq!(key.to_string(), "https://example.com/a.png");
    }

    #[test]
    fn initial_attempt_uses_bare_key() {
        let key = ResourceKey::new("https://example.com/a.png").unwrap();
        let request = LoadRequest::new(key, 0);
        assert_eq!(request.cache_key(), "https://example.com/a.png");
    }

    #[test]
    fn retries_get_distinct_cache_keys() {
        let key = ResourceKey::new("img").unwrap();
        let first = LoadRequest::new(key.clone(), 1);
        let second = LoadRequest::new(key.clone(), 2);
        assert_eq!(first.cache_key(), "img#retry-1");
        assert_eq!(second.cache_key(), "img#retry-2");
        assert_ne!(first.cache_key(), second.cache_key());
        assert_ne!(first.cache_key(), LoadRequest::new(key, 0).cache_key());
    }
}
