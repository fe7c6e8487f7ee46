use premises_core::state_machine::{
    RetailAreaContext, RetailAreaState, StateMachineError, StoreContext, StoreState,
};

#[test]
fn test_store_request_then_approve() {
    let mut store = StoreContext::new(8, StoreState::NormalOperation)
        .unwrap()
        .with_application_prefix("REQ");

    let request = store.request_status_change(StoreState::Closed, "lease dispute");
    assert!(request.success);
    let application_no = request.application_no.unwrap();
    assert!(application_no.starts_with("REQ-8-"));
    assert_eq!(store.current_state(), StoreState::NormalOperation);

    let approval = store
        .approve_status_change(true, StoreState::Closed, "lease dispute")
        .unwrap();
    assert!(approval.success);
    assert_eq!(store.current_state(), StoreState::Closed);
}

#[test]
fn test_store_approval_revalidates_against_current_state() {
    let mut store = StoreContext::new(8, StoreState::NormalOperation).unwrap();
    let request = store.request_status_change(StoreState::Closed, "night closure");
    assert!(request.success);

    // Something else closed the store before the approval arrived.
    store
        .state_context_mut()
        .transition_to_state(StoreState::Closed, "fire drill")
        .unwrap();

    let approval = store
        .approve_status_change(true, StoreState::Closed, "night closure")
        .unwrap();
    assert!(!approval.success);
    assert_eq!(store.current_state(), StoreState::Closed);
    assert_eq!(store.state_context().history().len(), 1);
}

#[test]
fn test_store_declined_request_changes_nothing() {
    let mut store = StoreContext::new(8, StoreState::UnderRenovation).unwrap();
    let approval = store
        .approve_status_change(false, StoreState::NormalOperation, "not yet")
        .unwrap();
    assert!(!approval.success);
    assert_eq!(store.current_state(), StoreState::UnderRenovation);
}

#[test]
fn test_retail_area_is_a_two_state_lock() {
    let mut area = RetailAreaContext::new(3, 180_000, RetailAreaState::Vacant).unwrap();
    assert!(area.is_available());

    area.rent("Sunrise Coffee").unwrap();
    assert_eq!(area.current_state(), RetailAreaState::Rented);
    assert_eq!(area.tenant(), Some("Sunrise Coffee"));

    let second = area.rent("Rival Coffee");
    assert!(matches!(
        second,
        Err(StateMachineError::IllegalTransition { .. })
    ));
    assert_eq!(area.tenant(), Some("Sunrise Coffee"));

    area.release().unwrap();
    assert!(area.is_available());
    assert_eq!(area.tenant(), None);
    assert!(area.release().is_err());
}

#[test]
fn test_retail_rent_adjustment_only_while_vacant() {
    let mut area = RetailAreaContext::new(3, 180_000, RetailAreaState::Vacant).unwrap();
    area.adjust_base_rent(200_000).unwrap();
    assert_eq!(area.base_rent_cents(), 200_000);

    area.rent("Sunrise Coffee").unwrap();
    assert!(area.adjust_base_rent(150_000).is_err());
    assert_eq!(area.base_rent_cents(), 200_000);
}
