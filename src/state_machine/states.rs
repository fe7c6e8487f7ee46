//! # Lifecycle States
//!
//! The state abstraction shared by every entity kind, and the fixed registry of
//! legal states a context is allowed to occupy.
//!
//! States are closed enums. Each variant is a stateless value: its legal targets,
//! its permitted operations and its persisted name are pure functions of the variant,
//! so one registry per entity kind is shared by every context of that kind.

use super::errors::{StateMachineError, StateMachineResult};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// A named lifecycle state for one entity kind.
pub trait LifecycleState:
    Copy + Eq + Hash + fmt::Debug + fmt::Display + FromStr<Err = String> + Send + Sync + 'static
{
    /// Operation vocabulary for this entity kind.
    type Operation: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Entity kind name used in logs and errors.
    const ENTITY_KIND: &'static str;

    /// Every state of this kind.
    const ALL: &'static [Self];

    /// Directed edges out of this state.
    fn allowed_transitions(&self) -> &'static [Self];

    /// Operations permitted while in this state.
    fn allowed_operations(&self) -> &'static [Self::Operation];

    /// Process-wide registry shared by every context of this kind.
    fn registry() -> Arc<StateRegistry<Self>>;

    fn can_transition_to(&self, target: Self) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Check if this is a terminal state (no further transitions allowed)
    fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Hook invoked after this state becomes current.
    fn on_enter(&self, entity_id: i64) {
        debug!(
            entity_kind = Self::ENTITY_KIND,
            entity_id = entity_id,
            state = %self,
            "Entering state"
        );
    }

    /// Hook invoked before this state stops being current.
    fn on_exit(&self, entity_id: i64) {
        debug!(
            entity_kind = Self::ENTITY_KIND,
            entity_id = entity_id,
            state = %self,
            "Exiting state"
        );
    }
}

/// Fixed set of states a context of one kind may occupy.
///
/// Built once; never grows after construction.
#[derive(Debug, Clone)]
pub struct StateRegistry<S: LifecycleState> {
    states: Vec<S>,
}

impl<S: LifecycleState> StateRegistry<S> {
    /// Registry holding every variant of `S`.
    pub fn full() -> Self {
        Self {
            states: S::ALL.to_vec(),
        }
    }

    /// Registry restricted to `states`.
    ///
    /// Fails if the set is empty, has duplicates, or any registered state can reach
    /// a state outside the set.
    pub fn new(states: &[S]) -> StateMachineResult<Self> {
        if states.is_empty() {
            return Err(misconfigured::<S>("registry has no states".to_string()));
        }

        let unique: HashSet<S> = states.iter().copied().collect();
        if unique.len() != states.len() {
            return Err(misconfigured::<S>(
                "registry contains duplicate states".to_string(),
            ));
        }

        for state in states {
            if let Some(missing) = state
                .allowed_transitions()
                .iter()
                .find(|target| !unique.contains(target))
            {
                return Err(misconfigured::<S>(format!(
                    "{state} can transition to unregistered state {missing}"
                )));
            }
        }

        Ok(Self {
            states: states.to_vec(),
        })
    }

    /// Registry built without closure validation.
    #[cfg(test)]
    pub(crate) fn unchecked(states: &[S]) -> Self {
        Self {
            states: states.to_vec(),
        }
    }

    pub fn contains(&self, state: S) -> bool {
        self.states.contains(&state)
    }

    /// Resolve a persisted state name to a registered state.
    pub fn resolve(&self, name: &str) -> StateMachineResult<S> {
        let state = name
            .parse::<S>()
            .map_err(|_| unknown_state::<S>(name))?;
        if self.contains(state) {
            Ok(state)
        } else {
            Err(unknown_state::<S>(name))
        }
    }

    /// Verify `state` is registered.
    pub fn require(&self, state: S) -> StateMachineResult<S> {
        if self.contains(state) {
            Ok(state)
        } else {
            Err(unknown_state::<S>(&state.to_string()))
        }
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

fn unknown_state<S: LifecycleState>(name: &str) -> StateMachineError {
    StateMachineError::UnknownState {
        entity_kind: S::ENTITY_KIND,
        name: name.to_string(),
    }
}

fn misconfigured<S: LifecycleState>(reason: String) -> StateMachineError {
    StateMachineError::RegistryMisconfigured {
        entity_kind: S::ENTITY_KIND,
        reason,
    }
}

/// Declares the process-wide registry accessor for a state enum.
macro_rules! shared_registry {
    ($state:ty) => {
        fn registry() -> std::sync::Arc<$crate::state_machine::StateRegistry<$state>> {
            static REGISTRY: std::sync::OnceLock<
                std::sync::Arc<$crate::state_machine::StateRegistry<$state>>,
            > = std::sync::OnceLock::new();
            REGISTRY
                .get_or_init(|| std::sync::Arc::new($crate::state_machine::StateRegistry::full()))
                .clone()
        }
    };
}

pub(crate) use shared_registry;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{EquipmentState, RetailAreaState, VenueEventState};

    #[test]
    fn test_full_registry_contains_every_state() {
        let registry = StateRegistry::<EquipmentState>::full();
        assert_eq!(registry.len(), EquipmentState::ALL.len());
        for state in EquipmentState::ALL {
            assert!(registry.contains(*state));
        }
    }

    #[test]
    fn test_registry_rejects_open_transition_set() {
        // Running can reach Standby, which is not registered.
        let err = StateRegistry::new(&[EquipmentState::Running, EquipmentState::Discarded])
            .unwrap_err();
        assert!(matches!(err, StateMachineError::RegistryMisconfigured { .. }));
    }

    #[test]
    fn test_registry_rejects_empty_and_duplicates() {
        assert!(StateRegistry::<RetailAreaState>::new(&[]).is_err());
        assert!(StateRegistry::new(&[RetailAreaState::Vacant, RetailAreaState::Vacant]).is_err());
    }

    #[test]
    fn test_closed_subset_is_accepted() {
        let registry =
            StateRegistry::new(&[VenueEventState::Rejected, VenueEventState::Cancelled]).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("approved").is_err());
        assert_eq!(
            registry.resolve("rejected").unwrap(),
            VenueEventState::Rejected
        );
    }

    #[test]
    fn test_resolve_unknown_name() {
        let err = EquipmentState::registry().resolve("melted").unwrap_err();
        assert_eq!(
            err,
            StateMachineError::UnknownState {
                entity_kind: "equipment",
                name: "melted".to_string()
            }
        );
    }

    #[test]
    fn test_shared_registry_is_reused() {
        let a = EquipmentState::registry();
        let b = EquipmentState::registry();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
