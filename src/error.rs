//! Error types shared by the store, search engine and dispatcher.
//!
//! [`Error`] is the classified outcome every failing command ends in. Only
//! [`Error::Storage`] is transient; parse failures and missing keys are final
//! and must never be retried.

use thiserror::Error;

use crate::command::ParseError;

/// Failures talking to the backing SQLite relation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// `SQLite` error (busy, I/O, constraint, ...).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Could not check a connection out of the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Could not prepare the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration { message: String },

    /// The blocking task running the statement panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(String),
}

/// Classified per-command failure.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed command text.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The operation targets a key with no rows.
    #[error("key not found: {0}")]
    NotFound(String),

    /// Transport or commit failure; the relation is unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Coarse classification of an [`Error`], used for replies and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    NotFound,
    Storage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(_) => ErrorKind::Parse,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether repeating the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(StorageError::Sqlite(err))
    }
}

impl From<r2d2::Error> for Error {
    fn from(err: r2d2::Error) -> Self {
        Error::Storage(StorageError::Pool(err))
    }
}

/// Convenience alias for results carrying a classified [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ParseErrorKind;

    #[test]
    fn only_storage_errors_are_retryable() {
        let parse = Error::from(ParseError::new(ParseErrorKind::UnknownCommand, "frob"));
        let missing = Error::NotFound("HTTP".to_string());
        let storage = Error::from(rusqlite::Error::QueryReturnedNoRows);

        assert!(!parse.is_retryable());
        assert!(!missing.is_retryable());
        assert!(storage.is_retryable());
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(Error::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::from(StorageError::Task("join".into())).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn sqlite_error_display() {
        let err = StorageError::Sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().contains("sqlite error"));
    }
}
