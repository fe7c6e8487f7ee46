//! # Retail Area Lifecycle
//!
//! A two-state lock over leasable floor space: `Vacant ⇄ Rented`, with the tenant
//! label attached while rented.

use super::context::StateContext;
use super::errors::{illegal_transition, invalid_argument, operation_not_permitted, StateMachineResult};
use super::states::{shared_registry, LifecycleState};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetailAreaState {
    Vacant,
    Rented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetailAreaOperation {
    Rent,
    AdjustRent,
    Release,
}

impl LifecycleState for RetailAreaState {
    type Operation = RetailAreaOperation;

    const ENTITY_KIND: &'static str = "retail_area";

    const ALL: &'static [Self] = &[Self::Vacant, Self::Rented];

    fn allowed_transitions(&self) -> &'static [Self] {
        match self {
            Self::Vacant => &[Self::Rented],
            Self::Rented => &[Self::Vacant],
        }
    }

    fn allowed_operations(&self) -> &'static [RetailAreaOperation] {
        match self {
            Self::Vacant => &[RetailAreaOperation::Rent, RetailAreaOperation::AdjustRent],
            Self::Rented => &[RetailAreaOperation::Release],
        }
    }

    shared_registry!(RetailAreaState);
}

impl fmt::Display for RetailAreaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vacant => write!(f, "vacant"),
            Self::Rented => write!(f, "rented"),
        }
    }
}

impl std::str::FromStr for RetailAreaState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vacant" => Ok(Self::Vacant),
            "rented" => Ok(Self::Rented),
            _ => Err(format!("Invalid retail area state: {s}")),
        }
    }
}

impl fmt::Display for RetailAreaOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rent => write!(f, "rent"),
            Self::AdjustRent => write!(f, "adjust_rent"),
            Self::Release => write!(f, "release"),
        }
    }
}

/// Lifecycle context for one leasable retail area
#[derive(Debug, Clone)]
pub struct RetailAreaContext {
    base_rent_cents: i64,
    tenant: Option<String>,
    inner: StateContext<RetailAreaState>,
}

impl RetailAreaContext {
    pub fn new(area_id: i64, base_rent_cents: i64, state: RetailAreaState) -> StateMachineResult<Self> {
        Ok(Self {
            base_rent_cents,
            tenant: None,
            inner: StateContext::new(area_id, state)?,
        })
    }

    pub fn from_persisted(
        area_id: i64,
        base_rent_cents: i64,
        status: &str,
        tenant: Option<String>,
    ) -> StateMachineResult<Self> {
        let inner = StateContext::from_persisted(area_id, status)?;
        // A vacant area never carries a tenant label.
        let tenant = match inner.current_state() {
            RetailAreaState::Rented => tenant,
            RetailAreaState::Vacant => None,
        };
        Ok(Self {
            base_rent_cents,
            tenant,
            inner,
        })
    }

    pub fn area_id(&self) -> i64 {
        self.inner.entity_id()
    }

    pub fn base_rent_cents(&self) -> i64 {
        self.base_rent_cents
    }

    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    pub fn current_state(&self) -> RetailAreaState {
        self.inner.current_state()
    }

    pub fn state_context(&self) -> &StateContext<RetailAreaState> {
        &self.inner
    }

    pub fn state_context_mut(&mut self) -> &mut StateContext<RetailAreaState> {
        &mut self.inner
    }

    pub fn is_available(&self) -> bool {
        self.current_state() == RetailAreaState::Vacant
    }

    /// Vacant -> Rented with `tenant` attached.
    pub fn rent(&mut self, tenant: &str) -> StateMachineResult<()> {
        let tenant = tenant.trim();
        if self.current_state() != RetailAreaState::Vacant {
            return Err(illegal_transition(
                RetailAreaState::ENTITY_KIND,
                self.current_state(),
                RetailAreaState::Rented,
            ));
        }
        if tenant.is_empty() {
            return Err(invalid_argument(RetailAreaOperation::Rent, "tenant is required"));
        }

        self.inner
            .transition_to_state(RetailAreaState::Rented, &format!("rented to {tenant}"))?;
        self.tenant = Some(tenant.to_string());
        Ok(())
    }

    /// Rented -> Vacant, clearing the tenant.
    pub fn release(&mut self) -> StateMachineResult<()> {
        if self.current_state() != RetailAreaState::Rented {
            return Err(illegal_transition(
                RetailAreaState::ENTITY_KIND,
                self.current_state(),
                RetailAreaState::Vacant,
            ));
        }

        let reason = match &self.tenant {
            Some(tenant) => format!("released by {tenant}"),
            None => "released".to_string(),
        };
        self.inner.transition_to_state(RetailAreaState::Vacant, &reason)?;
        self.tenant = None;
        Ok(())
    }

    /// Base rent can only be renegotiated between leases.
    pub fn adjust_base_rent(&mut self, base_rent_cents: i64) -> StateMachineResult<()> {
        if !self.inner.can_perform_operation(RetailAreaOperation::AdjustRent) {
            return Err(operation_not_permitted(
                RetailAreaState::ENTITY_KIND,
                self.current_state(),
                RetailAreaOperation::AdjustRent,
            ));
        }
        if base_rent_cents < 0 {
            return Err(invalid_argument(
                RetailAreaOperation::AdjustRent,
                "base rent cannot be negative",
            ));
        }
        self.base_rent_cents = base_rent_cents;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::StateMachineError;

    #[test]
    fn test_rent_and_release() {
        let mut area = RetailAreaContext::new(11, 250_000, RetailAreaState::Vacant).unwrap();
        area.rent("Blue Bottle Coffee").unwrap();
        assert_eq!(area.current_state(), RetailAreaState::Rented);
        assert_eq!(area.tenant(), Some("Blue Bottle Coffee"));

        area.release().unwrap();
        assert!(area.is_available());
        assert_eq!(area.tenant(), None);
    }

    #[test]
    fn test_double_rent_rejected() {
        let mut area = RetailAreaContext::new(11, 250_000, RetailAreaState::Vacant).unwrap();
        area.rent("First").unwrap();
        let err = area.rent("Second").unwrap_err();
        assert!(matches!(err, StateMachineError::IllegalTransition { .. }));
        assert_eq!(area.tenant(), Some("First"));
    }

    #[test]
    fn test_release_vacant_rejected() {
        let mut area = RetailAreaContext::new(11, 250_000, RetailAreaState::Vacant).unwrap();
        assert!(area.release().is_err());
        assert!(area.is_available());
    }

    #[test]
    fn test_blank_tenant_rejected() {
        let mut area = RetailAreaContext::new(11, 250_000, RetailAreaState::Vacant).unwrap();
        assert!(area.rent("   ").is_err());
        assert!(area.is_available());
    }

    #[test]
    fn test_adjust_rent_only_when_vacant() {
        let mut area = RetailAreaContext::new(11, 250_000, RetailAreaState::Vacant).unwrap();
        area.adjust_base_rent(300_000).unwrap();
        assert_eq!(area.base_rent_cents(), 300_000);

        area.rent("Tenant").unwrap();
        let err = area.adjust_base_rent(100).unwrap_err();
        assert!(matches!(err, StateMachineError::OperationNotPermitted { .. }));
        assert_eq!(area.base_rent_cents(), 300_000);
    }

    #[test]
    fn test_vacant_persisted_row_drops_stale_tenant() {
        let area =
            RetailAreaContext::from_persisted(2, 100, "vacant", Some("Ghost".to_string())).unwrap();
        assert_eq!(area.tenant(), None);
    }
}
