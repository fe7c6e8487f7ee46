//! # Venue Event Lifecycle
//!
//! ```text
//! PendingApproval ──▶ Approved ──▶ InProgress ──▶ Ended ─ ─ settle
//!       │    │            │             │
//!       │    └──────▶ Cancelled ◀───────┘
//!       └──▶ Rejected
//! ```
//!
//! Rejected, Cancelled and Ended accept no further transitions. Ended still accepts
//! a single settlement, which attaches the fee breakdown without changing state.

use super::context::{StateContext, TransitionRecord};
use super::errors::{invalid_argument, operation_not_permitted, StateMachineError, StateMachineResult};
use super::states::{shared_registry, LifecycleState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueEventState {
    PendingApproval,
    Approved,
    Rejected,
    InProgress,
    Ended,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueEventOperation {
    Modify,
    Approve,
    Reject,
    Start,
    End,
    Cancel,
    Settle,
}

impl VenueEventState {
    /// Whether a reservation in this state still holds its time slot.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl LifecycleState for VenueEventState {
    type Operation = VenueEventOperation;

    const ENTITY_KIND: &'static str = "venue_event";

    const ALL: &'static [Self] = &[
        Self::PendingApproval,
        Self::Approved,
        Self::Rejected,
        Self::InProgress,
        Self::Ended,
        Self::Cancelled,
    ];

    fn allowed_transitions(&self) -> &'static [Self] {
        use VenueEventState::*;
        match self {
            PendingApproval => &[Approved, Rejected, Cancelled],
            Approved => &[InProgress, Cancelled],
            InProgress => &[Ended, Cancelled],
            Rejected | Ended | Cancelled => &[],
        }
    }

    fn allowed_operations(&self) -> &'static [VenueEventOperation] {
        use VenueEventOperation::*;
        match self {
            Self::PendingApproval => &[Modify, Approve, Reject, Cancel],
            Self::Approved => &[Modify, Start, Cancel],
            Self::InProgress => &[End, Cancel],
            Self::Ended => &[Settle],
            Self::Rejected | Self::Cancelled => &[],
        }
    }

    shared_registry!(VenueEventState);
}

impl fmt::Display for VenueEventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PendingApproval => write!(f, "pending_approval"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Ended => write!(f, "ended"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for VenueEventState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_approval" => Ok(Self::PendingApproval),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "in_progress" => Ok(Self::InProgress),
            "ended" => Ok(Self::Ended),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid venue event state: {s}")),
        }
    }
}

impl fmt::Display for VenueEventOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Modify => "modify",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Start => "start",
            Self::End => "end",
            Self::Cancel => "cancel",
            Self::Settle => "settle",
        };
        f.write_str(name)
    }
}

/// Fee breakdown attached to an ended event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub venue_fee_cents: i64,
    pub additional_service_fee_cents: i64,
    pub total_fee_cents: i64,
    pub settled_at: DateTime<Utc>,
}

/// Lifecycle context for one venue reservation
#[derive(Debug, Clone)]
pub struct VenueEventContext {
    settlement: Option<SettlementRecord>,
    inner: StateContext<VenueEventState>,
}

impl VenueEventContext {
    pub fn new(event_id: i64, state: VenueEventState) -> StateMachineResult<Self> {
        Ok(Self {
            settlement: None,
            inner: StateContext::new(event_id, state)?,
        })
    }

    pub fn from_persisted(
        event_id: i64,
        status: &str,
        settlement: Option<SettlementRecord>,
    ) -> StateMachineResult<Self> {
        Ok(Self {
            settlement,
            inner: StateContext::from_persisted(event_id, status)?,
        })
    }

    pub fn event_id(&self) -> i64 {
        self.inner.entity_id()
    }

    pub fn current_state(&self) -> VenueEventState {
        self.inner.current_state()
    }

    pub fn state_context(&self) -> &StateContext<VenueEventState> {
        &self.inner
    }

    pub fn state_context_mut(&mut self) -> &mut StateContext<VenueEventState> {
        &mut self.inner
    }

    pub fn settlement(&self) -> Option<&SettlementRecord> {
        self.settlement.as_ref()
    }

    /// Editing is only allowed before the event starts.
    pub fn can_modify(&self) -> bool {
        matches!(
            self.current_state(),
            VenueEventState::PendingApproval | VenueEventState::Approved
        )
    }

    pub fn can_settle(&self) -> bool {
        self.current_state() == VenueEventState::Ended
    }

    pub fn transition_to_state(
        &mut self,
        target: VenueEventState,
        reason: &str,
    ) -> StateMachineResult<TransitionRecord<VenueEventState>> {
        self.inner.transition_to_state(target, reason)
    }

    pub fn approve(&mut self, reason: &str) -> StateMachineResult<TransitionRecord<VenueEventState>> {
        self.transition_to_state(VenueEventState::Approved, reason)
    }

    pub fn reject(&mut self, reason: &str) -> StateMachineResult<TransitionRecord<VenueEventState>> {
        self.transition_to_state(VenueEventState::Rejected, reason)
    }

    pub fn start(&mut self, reason: &str) -> StateMachineResult<TransitionRecord<VenueEventState>> {
        self.transition_to_state(VenueEventState::InProgress, reason)
    }

    pub fn end(&mut self, reason: &str) -> StateMachineResult<TransitionRecord<VenueEventState>> {
        self.transition_to_state(VenueEventState::Ended, reason)
    }

    pub fn cancel(&mut self, reason: &str) -> StateMachineResult<TransitionRecord<VenueEventState>> {
        self.transition_to_state(VenueEventState::Cancelled, reason)
    }

    /// Attach the final fee breakdown. State is left as Ended.
    pub fn settle(
        &mut self,
        venue_fee_cents: i64,
        additional_service_fee_cents: i64,
    ) -> StateMachineResult<SettlementRecord> {
        if !self.can_settle() {
            return Err(operation_not_permitted(
                VenueEventState::ENTITY_KIND,
                self.current_state(),
                VenueEventOperation::Settle,
            ));
        }
        if self.settlement.is_some() {
            return Err(StateMachineError::SettlementRejected {
                event_id: self.event_id(),
                reason: "event is already settled".to_string(),
            });
        }
        if venue_fee_cents < 0 || additional_service_fee_cents < 0 {
            return Err(invalid_argument(
                VenueEventOperation::Settle,
                "fees cannot be negative",
            ));
        }
        let total_fee_cents = venue_fee_cents
            .checked_add(additional_service_fee_cents)
            .ok_or_else(|| invalid_argument(VenueEventOperation::Settle, "fee total overflows"))?;

        let record = SettlementRecord {
            venue_fee_cents,
            additional_service_fee_cents,
            total_fee_cents,
            settled_at: Utc::now(),
        };
        tracing::info!(
            event_id = self.event_id(),
            total_fee_cents = total_fee_cents,
            "Venue event settled"
        );
        self.settlement = Some(record.clone());
        Ok(record)
    }
}
