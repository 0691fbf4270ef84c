use std::path::PathBuf;

use thiserror::Error;

/// Exit code for "the user picked nothing": distinct from every failure code.
pub const EXIT_NO_ACTION: i32 = 130;

/// Errors surfaced by the history engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The store could not be opened, or stayed locked past the retry budget.
    #[error("history store at {} is unavailable: {reason}", .path.display())]
    StoreUnavailable { path: PathBuf, reason: String },

    /// The file is not a usable history store. Never repaired automatically.
    #[error("history store at {} is corrupt: {reason}", .path.display())]
    CorruptStore { path: PathBuf, reason: String },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("usage: {0}")]
    Usage(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// The picked path disappeared between listing and selection.
    #[error("selected path no longer exists: {0}")]
    StaleSelection(String),

    #[error("selector failed: {0}")]
    Selector(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Process exit code for this error class.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidQuery(_) | Self::Usage(_) => 2,
            Self::StoreUnavailable { .. } => 3,
            Self::CorruptStore { .. } => 4,
            Self::Config(_)
            | Self::StaleSelection(_)
            | Self::Selector(_)
            | Self::Sqlite(_)
            | Self::Io(_) => 1,
        }
    }

    /// Whether retrying the same operation later can succeed.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}
