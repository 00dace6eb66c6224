//! Error type shared by the accessor and the model layer.

use rusqlite::ffi;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Anything the engine reports, passed through untouched
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// `update` was given a different number of columns and values
    #[error("different list lengths: {columns} columns, {values} values")]
    LengthMismatch { columns: usize, values: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no row with id {id} in {table}")]
    NotFound { table: String, id: i64 },
}

impl Error {
    /// True when the engine rejected a write because of a UNIQUE or PRIMARY KEY constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => {
                err.code == rusqlite::ErrorCode::ConstraintViolation
                    && matches!(
                        err.extended_code,
                        ffi::SQLITE_CONSTRAINT_UNIQUE
                            | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                            | ffi::SQLITE_CONSTRAINT_ROWID
                    )
            }
            _ => false,
        }
    }
}
