use thiserror::Error;

/// Error types for lifecycle state machine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Illegal {entity_kind} transition from {from} to {to}")]
    IllegalTransition {
        entity_kind: &'static str,
        from: String,
        to: String,
    },

    #[error("Unknown {entity_kind} state: {name}")]
    UnknownState {
        entity_kind: &'static str,
        name: String,
    },

    #[error("Invalid {entity_kind} state registry: {reason}")]
    RegistryMisconfigured {
        entity_kind: &'static str,
        reason: String,
    },

    #[error("Operation {operation} is not permitted while {entity_kind} is {state}")]
    OperationNotPermitted {
        entity_kind: &'static str,
        state: String,
        operation: String,
    },

    #[error("Invalid argument for {operation}: {reason}")]
    InvalidOperationArgument { operation: String, reason: String },

    #[error("Settlement rejected for event {event_id}: {reason}")]
    SettlementRejected { event_id: i64, reason: String },
}

impl StateMachineError {
    /// Unknown states and broken registries point at wiring bugs, everything else
    /// is a rejection the caller can report to the user.
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::UnknownState { .. } | Self::RegistryMisconfigured { .. }
        )
    }
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;

/// Helper function to create illegal transition errors
pub fn illegal_transition(
    entity_kind: &'static str,
    from: impl ToString,
    to: impl ToString,
) -> StateMachineError {
    StateMachineError::IllegalTransition {
        entity_kind,
        from: from.to_string(),
        to: to.to_string(),
    }
}

/// Helper function to create operation-not-permitted errors
pub fn operation_not_permitted(
    entity_kind: &'static str,
    state: impl ToString,
    operation: impl ToString,
) -> StateMachineError {
    StateMachineError::OperationNotPermitted {
        entity_kind,
        state: state.to_string(),
        operation: operation.to_string(),
    }
}

/// Helper function to create argument validation errors
pub fn invalid_argument(operation: impl ToString, reason: impl Into<String>) -> StateMachineError {
    StateMachineError::InvalidOperationArgument {
        operation: operation.to_string(),
        reason: reason.into(),
    }
}
