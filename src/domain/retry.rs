// SPDX-License-Identifier: MPL-2.0
//! Retry budget domain type and its bounds.

/// Default number of automatic retries per bound resource.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Minimum retry budget (0 disables automatic retries).
pub const MIN_MAX_RETRIES: u32 = 0;

/// Maximum retry budget.
pub const MAX_MAX_RETRIES: u32 = 10;

/// Maximum number of automatic retries per bound resource.
///
/// This newtype enforces validity at the type level, ensuring the value is
/// always within the valid range (0–10). A budget of 0 disables automatic
/// retries entirely: the first failure goes straight to fallback.
///
/// # Example
///
/// ```
/// use retry_lens::MaxRetries;
///
/// let retries = MaxRetries::new(5);
/// assert_eq!(retries.value(), 5);
///
/// // Values outside range are clamped
/// let too_high = MaxRetries::new(100);
/// assert_eq!(too_high.value(), 10); // Clamped to max
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxRetries(u32);

impl MaxRetries {
    /// Creates a new retry budget, clamping to the valid range.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Self(value.clamp(MIN_MAX_RETRIES, MAX_MAX_RETRIES))
    }

    /// Returns the budget as u32.
    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }

    /// Returns true if automatic retries are disabled.
    #[must_use]
    pub fn is_disabled(self) -> bool {
        self.0 == 0
    }
}

impl Default for MaxRetries {
    fn default() -> Self {
        Self(DEFAULT_MAX_RETRIES)
    }
}
