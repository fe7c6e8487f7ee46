use premises_core::state_machine::{StateMachineError, VenueEventContext, VenueEventState};

#[test]
fn test_full_lifecycle_then_settlement() {
    let mut event = VenueEventContext::new(12, VenueEventState::PendingApproval).unwrap();
    assert!(event.can_modify());

    event.approve("budget cleared").unwrap();
    assert!(event.can_modify());
    event.start("doors open").unwrap();
    assert!(!event.can_modify());
    assert!(!event.can_settle());
    event.end("doors closed").unwrap();
    assert!(event.can_settle());

    let settlement = event.settle(120_000, 35_050).unwrap();
    assert_eq!(settlement.total_fee_cents, 155_050);
    assert_eq!(event.current_state(), VenueEventState::Ended);
    assert_eq!(event.settlement(), Some(&settlement));
}

#[test]
fn test_settlement_only_once_and_only_when_ended() {
    let mut event = VenueEventContext::new(12, VenueEventState::InProgress).unwrap();
    assert!(event.settle(100, 0).is_err());

    event.end("wrap up").unwrap();
    event.settle(100, 0).unwrap();
    assert!(matches!(
        event.settle(100, 0),
        Err(StateMachineError::SettlementRejected { .. })
    ));
}

#[test]
fn test_negative_fees_rejected() {
    let mut event = VenueEventContext::new(12, VenueEventState::Ended).unwrap();
    assert!(matches!(
        event.settle(-1, 10),
        Err(StateMachineError::InvalidOperationArgument { .. })
    ));
    assert!(event.settlement().is_none());
}

#[test]
fn test_cancel_from_every_live_state() {
    for state in [
        VenueEventState::PendingApproval,
        VenueEventState::Approved,
        VenueEventState::InProgress,
    ] {
        let mut event = VenueEventContext::new(12, state).unwrap();
        event.cancel("partner withdrew").unwrap();
        assert_eq!(event.current_state(), VenueEventState::Cancelled);
        assert!(event.approve("too late").is_err());
    }
}
