//! Error types for `tiersearch`.
//!
//! Argument errors surface synchronously to the direct caller. Failures of a
//! child inside a fan-out never reach this type: the dispatching engine logs
//! them and degrades the result set instead.

use thiserror::Error;

/// Result type alias for `tiersearch` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `tiersearch` operations.
///
/// Error codes follow the pattern `TIER-XXX` for easy debugging.
#[derive(Error, Debug)]
pub enum Error {
    /// Empty document name on write or empty query word on search (TIER-001).
    #[error("[TIER-001] Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error (TIER-002).
    #[error("[TIER-002] Configuration error: {0}")]
    Config(String),

    /// Exact-match automaton could not be built (TIER-003).
    #[error("[TIER-003] Index error: {0}")]
    Index(String),

    /// Thread pool or worker thread could not be started (TIER-004).
    #[error("[TIER-004] Worker pool error: {0}")]
    WorkerPool(String),

    /// Internal error (TIER-005).
    ///
    /// Indicates an unexpected internal error. Please report if encountered.
    #[error("[TIER-005] Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code (e.g., "TIER-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "TIER-001",
            Self::Config(_) => "TIER-002",
            Self::Index(_) => "TIER-003",
            Self::WorkerPool(_) => "TIER-004",
            Self::Internal(_) => "TIER-005",
        }
    }

    /// Returns true if this error is recoverable.
    ///
    /// Only internal errors are considered non-recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    pub(crate) fn empty_argument(what: &str) -> Self {
        Self::InvalidArgument(format!("{what} must not be empty"))
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::WorkerPool(err.to_string())
    }
}

impl From<aho_corasick::BuildError> for Error {
    fn from(err: aho_corasick::BuildError) -> Self {
        Self::Index(err.to_string())
    }
}
