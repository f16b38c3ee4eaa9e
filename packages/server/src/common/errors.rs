use thiserror::Error;

use super::types::IssueStatus;

/// Errors surfaced by the issue lifecycle engine.
///
/// Every operation returns one of these instead of panicking. Only `Database`
/// and `Internal` are considered fatal (store or connectivity failures); the
/// rest describe a request the caller can correct or retry.
#[derive(Error, Debug)]
pub enum CivicError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: IssueStatus, to: IssueStatus },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Constraint violation under concurrent mutation. Safe to retry once.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type CivicResult<T> = Result<T, CivicError>;

impl CivicError {
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        CivicError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Short machine-readable kind, used in API error bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            CivicError::Validation(_) => "validation_error",
            CivicError::InvalidTransition { .. } => "invalid_transition",
            CivicError::NotFound { .. } => "not_found",
            CivicError::Conflict(_) => "conflict",
            CivicError::Permission(_) => "permission_denied",
            CivicError::Database(_) => "database_error",
            CivicError::Internal(_) => "internal_error",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, CivicError::Database(_) | CivicError::Internal(_))
    }
}

impl From<sqlx::Error> for CivicError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return CivicError::Conflict(db_err.message().to_string());
            }
        }
        CivicError::Database(err)
    }
}
