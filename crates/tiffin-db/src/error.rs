//! Database errors

use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// Record not found
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint rejected the write
    ///
    /// Surfaced separately so callers can map the one-open-subscription
    /// index violation to a domain conflict instead of a 500.
    #[error("unique constraint violation")]
    UniqueViolation,
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::UniqueViolation;
            }
        }
        Self::Sqlx(err)
    }
}

/// Result alias for database operations
pub type DbResult<T> = Result<T, DbError>;
