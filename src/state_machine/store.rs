//! # Store Lifecycle
//!
//! Three states, every pair connected in both directions. Changes go through a
//! two-phase request/approve flow: the request only validates and issues an
//! application number; the approval re-validates against whatever state the store
//! is in by then and only then transitions.

use super::context::StateContext;
use super::errors::StateMachineResult;
use super::states::{shared_registry, LifecycleState};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Store operating states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    NormalOperation,
    Closed,
    UnderRenovation,
}

/// Store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOperation {
    AcceptCustomers,
    CollectRent,
    UpdateStoreInfo,
    RequestStatusChange,
}

impl LifecycleState for StoreState {
    type Operation = StoreOperation;

    const ENTITY_KIND: &'static str = "store";

    const ALL: &'static [Self] = &[Self::NormalOperation, Self::Closed, Self::UnderRenovation];

    fn allowed_transitions(&self) -> &'static [Self] {
        match self {
            Self::NormalOperation => &[Self::Closed, Self::UnderRenovation],
            Self::Closed => &[Self::NormalOperation, Self::UnderRenovation],
            Self::UnderRenovation => &[Self::NormalOperation, Self::Closed],
        }
    }

    fn allowed_operations(&self) -> &'static [StoreOperation] {
        use StoreOperation::*;
        match self {
            Self::NormalOperation => &[AcceptCustomers, CollectRent, UpdateStoreInfo, RequestStatusChange],
            Self::Closed => &[UpdateStoreInfo, RequestStatusChange],
            Self::UnderRenovation => &[CollectRent, UpdateStoreInfo, RequestStatusChange],
        }
    }

    shared_registry!(StoreState);
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NormalOperation => write!(f, "normal_operation"),
            Self::Closed => write!(f, "closed"),
            Self::UnderRenovation => write!(f, "under_renovation"),
        }
    }
}

impl std::str::FromStr for StoreState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal_operation" => Ok(Self::NormalOperation),
            "closed" => Ok(Self::Closed),
            "under_renovation" => Ok(Self::UnderRenovation),
            _ => Err(format!("Invalid store state: {s}")),
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptCustomers => write!(f, "accept_customers"),
            Self::CollectRent => write!(f, "collect_rent"),
            Self::UpdateStoreInfo => write!(f, "update_store_info"),
            Self::RequestStatusChange => write!(f, "request_status_change"),
        }
    }
}

/// Outcome of a store status request or approval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangeResult {
    pub success: bool,
    pub message: String,
    /// Issued only when a request is accepted for approval.
    pub application_no: Option<String>,
    pub current_state: StoreState,
    pub requested_state: StoreState,
}

/// Lifecycle context for one store
#[derive(Debug, Clone)]
pub struct StoreContext {
    application_prefix: String,
    inner: StateContext<StoreState>,
}

impl StoreContext {
    pub const DEFAULT_APPLICATION_PREFIX: &'static str = "SC";

    pub fn new(store_id: i64, state: StoreState) -> StateMachineResult<Self> {
        Ok(Self {
            application_prefix: Self::DEFAULT_APPLICATION_PREFIX.to_string(),
            inner: StateContext::new(store_id, state)?,
        })
    }

    pub fn from_persisted(store_id: i64, status: &str) -> StateMachineResult<Self> {
        Ok(Self {
            application_prefix: Self::DEFAULT_APPLICATION_PREFIX.to_string(),
            inner: StateContext::from_persisted(store_id, status)?,
        })
    }

    pub fn with_application_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.application_prefix = prefix.into();
        self
    }

    pub fn store_id(&self) -> i64 {
        self.inner.entity_id()
    }

    pub fn current_state(&self) -> StoreState {
        self.inner.current_state()
    }

    pub fn state_context(&self) -> &StateContext<StoreState> {
        &self.inner
    }

    pub fn state_context_mut(&mut self) -> &mut StateContext<StoreState> {
        &mut self.inner
    }

    pub fn can_perform_operation(&self, operation: StoreOperation) -> bool {
        self.inner.can_perform_operation(operation)
    }

    /// Validate a change and issue an application number. Never mutates state.
    pub fn request_status_change(&self, target: StoreState, reason: &str) -> StatusChangeResult {
        let current = self.current_state();

        if current == target {
            return StatusChangeResult {
                success: false,
                message: format!("Store {} is already {current}", self.store_id()),
                application_no: None,
                current_state: current,
                requested_state: target,
            };
        }

        if !self.inner.can_transition_to(target) {
            return StatusChangeResult {
                success: false,
                message: format!("Store cannot change from {current} to {target}"),
                application_no: None,
                current_state: current,
                requested_state: target,
            };
        }

        let application_no = self.next_application_no();
        tracing::info!(
            store_id = self.store_id(),
            from = %current,
            to = %target,
            reason = reason,
            application_no = %application_no,
            "Store status change requested"
        );

        StatusChangeResult {
            success: true,
            message: format!("Status change to {target} submitted for approval"),
            application_no: Some(application_no),
            current_state: current,
            requested_state: target,
        }
    }

    /// Apply or decline a previously requested change.
    ///
    /// The legality check is repeated because the store may have moved since the
    /// request was made.
    pub fn approve_status_change(
        &mut self,
        approved: bool,
        target: StoreState,
        reason: &str,
    ) -> StateMachineResult<StatusChangeResult> {
        let current = self.current_state();

        if !approved {
            return Ok(StatusChangeResult {
                success: false,
                message: format!("Status change to {target} was declined"),
                application_no: None,
                current_state: current,
                requested_state: target,
            });
        }

        if !self.inner.can_transition_to(target) {
            return Ok(StatusChangeResult {
                success: false,
                message: format!(
                    "Status change to {target} is no longer valid from {current}"
                ),
                application_no: None,
                current_state: current,
                requested_state: target,
            });
        }

        self.inner.transition_to_state(target, reason)?;
        Ok(StatusChangeResult {
            success: true,
            message: format!("Store {} is now {target}", self.store_id()),
            application_no: None,
            current_state: target,
            requested_state: target,
        })
    }

    fn next_application_no(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "{}-{}-{}-{}",
            self.application_prefix,
            self.store_id(),
            Utc::now().format("%Y%m%d%H%M%S"),
            &suffix[..8]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_does_not_mutate() {
        let ctx = StoreContext::new(4, StoreState::NormalOperation).unwrap();
        let result = ctx.request_status_change(StoreState::UnderRenovation, "refit");

        assert!(result.success);
        assert_eq!(ctx.current_state(), StoreState::NormalOperation);
        let application_no = result.application_no.unwrap();
        assert!(application_no.starts_with("SC-4-"));
    }

    #[test]
    fn test_request_to_same_state_rejected() {
        let ctx = StoreContext::new(4, StoreState::Closed).unwrap();
        let result = ctx.request_status_change(StoreState::Closed, "noop");
        assert!(!result.success);
        assert!(result.application_no.is_none());
    }

    #[test]
    fn test_approval_transitions() {
        let mut ctx = StoreContext::new(4, StoreState::NormalOperation).unwrap();
        let result = ctx
            .approve_status_change(true, StoreState::Closed, "approved by admin")
            .unwrap();
        assert!(result.success);
        assert_eq!(ctx.current_state(), StoreState::Closed);
    }

    #[test]
    fn test_declined_approval_keeps_state() {
        let mut ctx = StoreContext::new(4, StoreState::NormalOperation).unwrap();
        let result = ctx
            .approve_status_change(false, StoreState::Closed, "declined")
            .unwrap();
        assert!(!result.success);
        assert_eq!(ctx.current_state(), StoreState::NormalOperation);
    }

    #[test]
    fn test_approval_revalidates() {
        // Request made while operating; by approval time the store already closed.
        let mut ctx = StoreContext::new(4, StoreState::NormalOperation).unwrap();
        let request = ctx.request_status_change(StoreState::Closed, "end of lease");
        assert!(request.success);

        ctx.state_context_mut()
            .transition_to_state(StoreState::Closed, "emergency closure")
            .unwrap();

        let result = ctx
            .approve_status_change(true, StoreState::Closed, "end of lease")
            .unwrap();
        assert!(!result.success);
        assert_eq!(ctx.current_state(), StoreState::Closed);
    }

    #[test]
    fn test_custom_prefix() {
        let ctx = StoreContext::new(8, StoreState::Closed)
            .unwrap()
            .with_application_prefix("APP");
        let result = ctx.request_status_change(StoreState::NormalOperation, "reopen");
        assert!(result.application_no.unwrap().starts_with("APP-8-"));
    }

    #[test]
    fn test_operations_by_state() {
        let closed = StoreContext::new(1, StoreState::Closed).unwrap();
        assert!(!closed.can_perform_operation(StoreOperation::AcceptCustomers));
        assert!(closed.can_perform_operation(StoreOperation::RequestStatusChange));
    }
}
