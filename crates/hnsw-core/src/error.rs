//! Error types for the HNSW engine.
//!
//! A single [`Error`] enum covers both storage backings; callers match on
//! [`Error::kind`] rather than the variant when they only care about the
//! error class (see spec §7).

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error kinds a caller may need to branch on (spec §7). `Error`
/// carries one of these plus a message; `kind()` recovers it without
/// matching on the full variant set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Precondition violated by the caller; the index is left unchanged.
    InvalidArgument,
    /// Index name collision, or an entry-point update observed
    /// inconsistent state.
    Conflict,
    /// Durable backing could not read or write.
    Io,
    /// Caller cancellation signal observed.
    Cancelled,
    /// An edge install partially failed and rollback also failed; the
    /// engine should refuse further writes until restarted.
    CorruptionPossible,
}

/// Errors produced by the engine and its storage backings.
#[derive(Error, Debug)]
pub enum Error {
    /// See [`ErrorKind::InvalidArgument`].
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// See [`ErrorKind::Conflict`].
    #[error("conflict: {0}")]
    Conflict(String),

    /// See [`ErrorKind::Io`].
    #[error("io error: {0}")]
    Io(String),

    /// See [`ErrorKind::Cancelled`].
    #[error("cancelled")]
    Cancelled,

    /// See [`ErrorKind::CorruptionPossible`].
    #[error("corruption possible, refusing further writes: {0}")]
    CorruptionPossible(String),
}

impl Error {
    /// Returns the error kind, useful for callers (e.g. the HTTP gateway)
    /// that only need the class of failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Io(_) => ErrorKind::Io,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::CorruptionPossible(_) => ErrorKind::CorruptionPossible,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
