//! Error types for the timeline engine and its collaborators.
//!
//! Errors follow a layered `thiserror` taxonomy composed with `?` and `From`.
//!
//! # Error Hierarchy
//!
//! - [`TimelineError`] - failures surfaced by `TimelineManager` operations
//!   - [`FetchError`] - the data-fetch collaborator rejected a page request
//!   - [`ConfigurationError`] - invalid construction parameters
//! - [`InputError`] - the feed file could not be opened or read
//!
//! # Recovery Strategy
//!
//! Configuration errors fail fast at construction and are never clamped.
//! Fetch errors are transient: they propagate to whoever asked for the page,
//! the single-flight guard is released regardless, and the next scroll that
//! reaches the tail retries. Bookkeeping races inside the engine (late
//! resize reports, unknown cells, double unmounts) are not errors at all and
//! never reach these types.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Cache capacity must be a positive integer.
    #[error("cache capacity must be positive (got {capacity})")]
    NonPositiveCapacity {
        /// The rejected capacity.
        capacity: usize,
    },

    /// Page size must be a positive integer.
    #[error("page size must be positive (got {page_size})")]
    NonPositivePageSize {
        /// The rejected page size.
        page_size: usize,
    },
}

/// Failure reported by a feed source while fetching a page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The source could not produce the page right now.
    ///
    /// Retrying is up to the caller; the engine never retries on its own.
    #[error("feed unavailable: {reason}")]
    Unavailable {
        /// Human-readable cause.
        reason: String,
    },
}

impl FetchError {
    /// Convenience constructor for [`FetchError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Failures surfaced by timeline manager and scroller operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// The data-fetch collaborator rejected the request.
    #[error("failed to fetch page: {0}")]
    Fetch(#[from] FetchError),

    /// Invalid engine configuration.
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Errors encountered when opening a feed file.
#[derive(Debug, Error)]
pub enum InputError {
    /// The feed file does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use vtimeline::model::error::InputError;
    ///
    /// let err = InputError::FileNotFound {
    ///     path: PathBuf::from("/tmp/missing.jsonl"),
    /// };
    /// assert!(err.to_string().contains("/tmp/missing.jsonl"));
    /// ```
    #[error("Feed file not found: {path}")]
    FileNotFound {
        /// The path that was attempted.
        path: PathBuf,
    },

    /// Generic I/O error while reading the feed.
    #[error("I/O error reading feed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_converts_into_timeline_error() {
        let err: TimelineError = FetchError::unavailable("offline").into();
        assert_eq!(
            err,
            TimelineError::Fetch(FetchError::Unavailable {
                reason: "offline".to_string()
            })
        );
        assert!(err.to_string().contains("offline"));
    }

    #[test]
    fn configuration_error_mentions_value() {
        let err = ConfigurationError::NonPositiveCapacity { capacity: 0 };
        assert!(err.to_string().contains("got 0"));
    }

    #[test]
    fn input_error_from_io() {
        let err: InputError = std::io::Error::other("boom").into();
        assert!(matches!(err, InputError::Io(_)));
    }
}
