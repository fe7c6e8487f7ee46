//! # State Context
//!
//! A per-operation view over one entity's persisted lifecycle state.
//!
//! A context is built from the status string loaded for a single request, mutated
//! only through [`StateContext::transition_to_state`], and dropped once the caller
//! has written [`StateContext::persisted_status`] back. Every successful transition
//! is appended to an in-memory audit trail the caller can publish.

use super::errors::{illegal_transition, StateMachineResult};
use super::states::{LifecycleState, StateRegistry};
use crate::logging::log_transition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Record of a single applied transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord<S> {
    pub entity_id: i64,
    pub from_state: S,
    pub to_state: S,
    pub reason: String,
    pub transitioned_at: DateTime<Utc>,
}

/// Lifecycle state holder for one entity.
#[derive(Debug, Clone)]
pub struct StateContext<S: LifecycleState> {
    entity_id: i64,
    current: S,
    registry: Arc<StateRegistry<S>>,
    history: Vec<TransitionRecord<S>>,
}

impl<S: LifecycleState> StateContext<S> {
    /// Create a context in `initial` using the shared registry for `S`.
    pub fn new(entity_id: i64, initial: S) -> StateMachineResult<Self> {
        Self::with_registry(entity_id, initial, S::registry())
    }

    /// Create a context over an explicit registry.
    pub fn with_registry(
        entity_id: i64,
        initial: S,
        registry: Arc<StateRegistry<S>>,
    ) -> StateMachineResult<Self> {
        let current = registry.require(initial)?;
        Ok(Self {
            entity_id,
            current,
            registry,
            history: Vec::new(),
        })
    }

    /// Create a context from a status string read from storage.
    pub fn from_persisted(entity_id: i64, status: &str) -> StateMachineResult<Self> {
        let registry = S::registry();
        let current = registry.resolve(status)?;
        Ok(Self {
            entity_id,
            current,
            registry,
            history: Vec::new(),
        })
    }

    pub fn entity_id(&self) -> i64 {
        self.entity_id
    }

    pub fn current_state(&self) -> S {
        self.current
    }

    pub fn can_transition_to(&self, target: S) -> bool {
        self.current.can_transition_to(target)
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// Move to `target`.
    ///
    /// Legality and registry membership are both checked before the exit hook runs,
    /// so a rejected transition leaves the context exactly as it was.
    pub fn transition_to_state(
        &mut self,
        target: S,
        reason: &str,
    ) -> StateMachineResult<TransitionRecord<S>> {
        let from = self.current;
        if !from.can_transition_to(target) {
            return Err(illegal_transition(S::ENTITY_KIND, from, target));
        }
        let target = self.registry.require(target)?;

        from.on_exit(self.entity_id);
        self.current = target;
        log_transition(S::ENTITY_KIND, self.entity_id, &from, &target, reason);
        target.on_enter(self.entity_id);

        let record = TransitionRecord {
            entity_id: self.entity_id,
            from_state: from,
            to_state: target,
            reason: reason.to_string(),
            transitioned_at: Utc::now(),
        };
        self.history.push(record.clone());
        Ok(record)
    }

    /// Membership test against the current state's operations. Does not execute anything.
    pub fn can_perform_operation(&self, operation: S::Operation) -> bool {
        self.current.allowed_operations().contains(&operation)
    }

    pub fn allowed_operations(&self) -> &'static [S::Operation] {
        self.current.allowed_operations()
    }

    /// Status string to write back to storage.
    pub fn persisted_status(&self) -> String {
        self.current.to_string()
    }

    pub fn history(&self) -> &[TransitionRecord<S>] {
        &self.history
    }

    /// Drain the audit trail accumulated by this context.
    pub fn take_history(&mut self) -> Vec<TransitionRecord<S>> {
        std::mem::take(&mut self.history)
    }
}
