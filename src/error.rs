// SPDX-License-Identifier: MPL-2.0
use std::fmt;

/// Crate-level error for the surfaces that can actually fail: configuration
/// I/O and talking to a loader task that has already shut down.
///
/// Load failures are deliberately NOT part of this enum. The retry policy
/// absorbs every [`LoadFailure`] locally; exhausting the retry budget is a
/// normal terminal state, never an error returned to a caller.
#[derive(Debug, Clone)]
pub enum Error {
    Io(String),
    Config(String),
    /// The loader task is no longer running.
    LoaderGone,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O Error: {}", e),
            Error::Config(e) => write!(f, "Config Error: {}", e),
            Error::LoaderGone => write!(f, "Loader task is not running"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Opaque failure reported by an image fetcher.
///
/// The retry policy treats all failures uniformly and never inspects the
/// message; it exists only for logging and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure(String);

impl LoadFailure {
    /// Wraps a fetcher error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The underlying message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load failed: {}", self.0)
    }
}

impl std::error::Error for LoadFailure {}
