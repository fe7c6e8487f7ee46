use crate::common::*;
use async_trait::async_trait;
use premises_core::admission::vehicle_entry::{
    DUPLICATE_VEHICLE, ENTRY_EXECUTION, SPACE_EXISTENCE, SPACE_STATUS,
};
use premises_core::admission::venue_reservation::CAPACITY;
use premises_core::admission::{
    AdmissionError, AdmissionHandler, AdmissionResult, ChainBuilder, HandlerId,
    VehicleEntryChainBuilder, VehicleEntryRequest, VenueReservationChainBuilder,
};

/// Reserved spaces are off limits to regular entry.
struct ReservedSpaceHandler {
    reserved: i64,
}

#[async_trait]
impl AdmissionHandler<VehicleEntryRequest> for ReservedSpaceHandler {
    fn id(&self) -> HandlerId {
        "reserved_space"
    }

    async fn handle(&self, request: &mut VehicleEntryRequest) -> AdmissionResult<()> {
        if request.space_id == self.reserved {
            return Err(AdmissionError::ParkingSpaceOccupied {
                space_id: request.space_id,
                detail: "space is reserved".to_string(),
            });
        }
        Ok(())
    }
}

#[test]
fn test_empty_builder_cannot_build() {
    let builder: ChainBuilder<VehicleEntryRequest> = ChainBuilder::new("empty");
    assert!(matches!(builder.build(), Err(AdmissionError::EmptyChain)));

    let mut builder = VehicleEntryChainBuilder::with_default_handlers(seeded_store());
    builder.reset();
    assert!(matches!(builder.build(), Err(AdmissionError::EmptyChain)));
}

#[test]
fn test_removing_absent_handler_keeps_length() {
    let mut builder = VenueReservationChainBuilder::with_default_handlers(seeded_store());
    let before = builder.len();
    builder.remove_handler("no_such_handler");
    assert_eq!(builder.len(), before);

    builder.remove_handler(CAPACITY);
    assert_eq!(builder.len(), before - 1);
    assert!(!builder.contains(CAPACITY));
}

#[tokio::test]
async fn test_inserted_handler_runs_before_execution() {
    let store = seeded_store();
    let mut builder = VehicleEntryChainBuilder::with_default_handlers(store.clone());
    builder.insert_before(
        ENTRY_EXECUTION,
        ReservedSpaceHandler {
            reserved: FREE_SPACE,
        },
    );
    let chain = builder.build().unwrap();
    assert_eq!(
        chain.handler_ids(),
        vec![
            SPACE_EXISTENCE,
            DUPLICATE_VEHICLE,
            SPACE_STATUS,
            "reserved_space",
            ENTRY_EXECUTION
        ]
    );

    let vehicles_before = store.vehicles().len();
    let mut request = VehicleEntryRequest::new("NEW-500", FREE_SPACE);
    let err = chain.run(&mut request).await.unwrap_err();
    assert_eq!(err.to_string(), "space is reserved");
    assert_eq!(store.vehicles().len(), vehicles_before);

    let mut request = VehicleEntryRequest::new("NEW-500", SECOND_FREE_SPACE);
    chain.run(&mut request).await.unwrap();
    assert!(store.space(SECOND_FREE_SPACE).unwrap().occupied);
}

#[tokio::test]
async fn test_replaced_duplicate_check_changes_behaviour() {
    struct AllowEveryone;

    #[async_trait]
    impl AdmissionHandler<VehicleEntryRequest> for AllowEveryone {
        fn id(&self) -> HandlerId {
            "allow_everyone"
        }

        async fn handle(&self, _request: &mut VehicleEntryRequest) -> AdmissionResult<()> {
            Ok(())
        }
    }

    let store = seeded_store();
    let mut builder = VehicleEntryChainBuilder::with_default_handlers(store.clone());
    builder
        .replace_handler(DUPLICATE_VEHICLE, AllowEveryone)
        .remove_handler(ENTRY_EXECUTION);
    let chain = builder.build().unwrap();
    assert_eq!(chain.len(), 3);

    // Validation-only chain: the parked plate passes and nothing is written.
    let mut request = VehicleEntryRequest::new(PARKED_PLATE, FREE_SPACE);
    chain.run(&mut request).await.unwrap();
    assert!(request.entry.is_none());
    assert!(!store.space(FREE_SPACE).unwrap().occupied);
}
