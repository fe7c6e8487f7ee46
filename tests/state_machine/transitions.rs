use premises_core::state_machine::{
    EquipmentState, LifecycleState, RetailAreaState, StateContext, StateMachineError, StoreState,
    VenueEventState,
};
use proptest::prelude::*;

fn equipment_edges(from: EquipmentState) -> Vec<EquipmentState> {
    use EquipmentState::*;
    match from {
        Running => vec![Standby, Faulted, Offline, Discarded],
        Standby => vec![Running, Faulted, Offline, Discarded],
        Offline => vec![Standby, Running, Discarded],
        Faulted => vec![UnderMaintenance, Discarded],
        UnderMaintenance => vec![Running, Faulted, Discarded],
        Discarded => vec![],
    }
}

fn store_edges(from: StoreState) -> Vec<StoreState> {
    StoreState::ALL
        .iter()
        .copied()
        .filter(|to| *to != from)
        .collect()
}

fn retail_edges(from: RetailAreaState) -> Vec<RetailAreaState> {
    match from {
        RetailAreaState::Vacant => vec![RetailAreaState::Rented],
        RetailAreaState::Rented => vec![RetailAreaState::Vacant],
    }
}

fn venue_edges(from: VenueEventState) -> Vec<VenueEventState> {
    use VenueEventState::*;
    match from {
        PendingApproval => vec![Approved, Rejected, Cancelled],
        Approved => vec![InProgress, Cancelled],
        InProgress => vec![Ended, Cancelled],
        Rejected | Ended | Cancelled => vec![],
    }
}

/// Every ordered pair agrees with the expected table, and no state loops to itself.
fn assert_table<S: LifecycleState>(expected: fn(S) -> Vec<S>) {
    for &from in S::ALL {
        for &to in S::ALL {
            assert_eq!(
                from.can_transition_to(to),
                expected(from).contains(&to),
                "{} {from} -> {to}",
                S::ENTITY_KIND
            );
        }
        assert!(!from.can_transition_to(from), "{from} loops to itself");
    }
}

#[test]
fn test_transition_tables_match_exactly() {
    assert_table(equipment_edges);
    assert_table(store_edges);
    assert_table(retail_edges);
    assert_table(venue_edges);
}

#[test]
fn test_terminal_states() {
    assert!(EquipmentState::Discarded.is_terminal());
    assert!(VenueEventState::Rejected.is_terminal());
    assert!(VenueEventState::Ended.is_terminal());
    assert!(VenueEventState::Cancelled.is_terminal());
    assert!(!StoreState::ALL.iter().any(|state| state.is_terminal()));
    assert!(!RetailAreaState::ALL.iter().any(|state| state.is_terminal()));
}

#[test]
fn test_persisted_names_round_trip() {
    for state in VenueEventState::ALL {
        let context = StateContext::new(1, *state).unwrap();
        let restored = StateContext::<VenueEventState>::from_persisted(1, &context.persisted_status())
            .unwrap();
        assert_eq!(restored.current_state(), *state);
    }
    assert!(matches!(
        StateContext::<EquipmentState>::from_persisted(1, "melted"),
        Err(StateMachineError::UnknownState { .. })
    ));
}

fn any_state<S: LifecycleState>() -> impl Strategy<Value = S> {
    prop::sample::select(S::ALL.to_vec())
}

/// Illegal targets leave the context untouched; legal ones move it and log one record.
fn check_transition<S: LifecycleState>(from: S, to: S) -> Result<(), TestCaseError> {
    let mut context = StateContext::new(5, from).unwrap();
    match context.transition_to_state(to, "property") {
        Ok(record) => {
            prop_assert!(from.can_transition_to(to));
            prop_assert_eq!(context.current_state(), to);
            prop_assert_eq!(record.from_state, from);
            prop_assert_eq!(context.history().len(), 1);
        }
        Err(err) => {
            prop_assert!(!from.can_transition_to(to));
            let is_illegal = matches!(err, StateMachineError::IllegalTransition { .. });
            prop_assert!(is_illegal);
            prop_assert_eq!(context.current_state(), from);
            prop_assert!(context.history().is_empty());
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn equipment_transitions_follow_table(from in any_state::<EquipmentState>(), to in any_state::<EquipmentState>()) {
        check_transition(from, to)?;
    }

    #[test]
    fn store_transitions_follow_table(from in any_state::<StoreState>(), to in any_state::<StoreState>()) {
        check_transition(from, to)?;
    }

    #[test]
    fn retail_transitions_follow_table(from in any_state::<RetailAreaState>(), to in any_state::<RetailAreaState>()) {
        check_transition(from, to)?;
    }

    #[test]
    fn venue_transitions_follow_table(from in any_state::<VenueEventState>(), to in any_state::<VenueEventState>()) {
        check_transition(from, to)?;
    }

    /// Terminal states reject every target.
    #[test]
    fn terminal_states_reject_everything(
        terminal in prop::sample::select(vec![
            VenueEventState::Rejected,
            VenueEventState::Cancelled,
            VenueEventState::Ended,
        ]),
        to in any_state::<VenueEventState>(),
    ) {
        let mut context = StateContext::new(9, terminal).unwrap();
        prop_assert!(context.transition_to_state(to, "late").is_err());
        prop_assert_eq!(context.current_state(), terminal);
    }

    #[test]
    fn discarded_equipment_rejects_everything(to in any_state::<EquipmentState>()) {
        let mut context = StateContext::new(9, EquipmentState::Discarded).unwrap();
        prop_assert!(context.transition_to_state(to, "late").is_err());
        prop_assert_eq!(context.current_state(), EquipmentState::Discarded);
    }
}
