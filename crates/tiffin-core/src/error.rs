//! Core errors

use chrono::{DateTime, Utc};
use thiserror::Error;

use tiffin_db::DbError;

/// Errors surfaced by the subscription and delivery services
#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing or malformed caller input
    #[error("invalid input: {0}")]
    BadInput(String),

    /// Valid identity, but not the owner or required role
    #[error("forbidden")]
    Forbidden,

    /// Entity absent
    #[error("not found")]
    NotFound,

    /// Duplicate open subscription or an illegal state transition
    #[error("conflict: {0}")]
    Conflict(String),

    /// A cutoff window rejects the modification
    ///
    /// `next_available_at` is the reopening instant for the weekly
    /// lock; the per-delivery cutoff is monotonic and carries `None`.
    #[error("modifications are locked")]
    Locked {
        next_available_at: Option<DateTime<Utc>>,
    },

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadInput(_) => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict(_) => 409,
            Self::Locked { .. } => 423,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadInput(_) => "BAD_INPUT",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Locked { .. } => "LOCKED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => Self::NotFound,
            // The partial unique index on open subscriptions is the
            // backstop for the one-open-subscription-per-user rule.
            DbError::UniqueViolation => Self::Conflict(
                "an active or pending subscription already exists for this user".to_string(),
            ),
            DbError::Sqlx(e) => {
                tracing::error!("Database error: {}", e);
                Self::Database(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CoreError::BadInput("x".into()).status_code(), 400);
        assert_eq!(CoreError::Forbidden.status_code(), 403);
        assert_eq!(CoreError::NotFound.status_code(), 404);
        assert_eq!(CoreError::Conflict("x".into()).status_code(), 409);
        assert_eq!(
            CoreError::Locked {
                next_available_at: None
            }
            .status_code(),
            423
        );
    }

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let err: CoreError = DbError::UniqueViolation.into();
        assert!(matches!(err, CoreError::Conflict(_)));
    }
}
