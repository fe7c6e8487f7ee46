use thiserror::Error;

/// Failures raised by a data-access backend.
///
/// None of these are business rejections: callers treat them as fatal to the
/// current operation and may retry the whole operation.
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Stored {entity} {id} is malformed: {reason}")]
    InvalidRecord {
        entity: &'static str,
        id: String,
        reason: String,
    },

    #[error("Backend failure: {0}")]
    Backend(String),

    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DataAccessError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_record(entity: &'static str, id: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            entity,
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type DataAccessResult<T> = Result<T, DataAccessError>;
