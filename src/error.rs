use crate::admission::AdmissionError;
use crate::config::ConfigurationError;
use crate::data_access::DataAccessError;
use crate::state_machine::StateMachineError;
use thiserror::Error;

/// Top-level error type for premises operations.
///
/// Business rejections (an illegal transition, a failed admission check, a missing
/// permission) are recoverable by the caller and carry enough detail to be shown to
/// the end user. Configuration and data-access failures are fatal to the operation.
#[derive(Error, Debug)]
pub enum PremisesError {
    #[error("State machine error: {0}")]
    StateMachine(#[from] StateMachineError),

    #[error("Admission rejected: {0}")]
    Admission(#[from] AdmissionError),

    #[error("Data access error: {0}")]
    DataAccess(#[from] DataAccessError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Actor {actor_id} lacks required authority level {required_level}")]
    PermissionDenied { actor_id: i64, required_level: String },

    #[error("{entity_kind} {id} not found")]
    NotFound { entity_kind: &'static str, id: String },
}

impl PremisesError {
    /// Whether this error is a business rejection the caller should surface and
    /// allow the user to retry with corrected input.
    pub fn is_business_error(&self) -> bool {
        match self {
            Self::StateMachine(err) => err.is_business_error(),
            Self::Admission(err) => err.is_business_rejection(),
            Self::PermissionDenied { .. } | Self::NotFound { .. } => true,
            Self::DataAccess(_) | Self::Configuration(_) => false,
        }
    }

    pub fn not_found(entity_kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PremisesError>;
