use crate::common::*;
use chrono::Utc;
use premises_core::admission::{AdmissionError, VehicleEntryChainBuilder, VehicleEntryRequest};

#[tokio::test]
async fn test_missing_space_writes_nothing() {
    let store = seeded_store();
    let vehicles_before = store.vehicles().len();
    let records_before = store.parking_records().len();
    let chain = VehicleEntryChainBuilder::with_default_handlers(store.clone())
        .build()
        .unwrap();

    let mut request = VehicleEntryRequest::new("NEW-100", 9999);
    let err = chain.run(&mut request).await.unwrap_err();

    assert!(matches!(
        err,
        AdmissionError::ParkingSpaceNotFound { space_id: 9999 }
    ));
    assert_eq!(err.code(), Some(1001));
    assert_eq!(store.vehicles().len(), vehicles_before);
    assert_eq!(store.parking_records().len(), records_before);
    assert!(request.entry.is_none());
}

#[tokio::test]
async fn test_parked_plate_rejected_even_for_a_free_space() {
    let store = seeded_store();
    let chain = VehicleEntryChainBuilder::with_default_handlers(store.clone())
        .build()
        .unwrap();

    let mut request = VehicleEntryRequest::new(PARKED_PLATE, FREE_SPACE);
    let err = chain.run(&mut request).await.unwrap_err();

    assert!(matches!(err, AdmissionError::VehicleAlreadyInside { .. }));
    assert_eq!(err.code(), Some(1002));
    assert!(!store.space(FREE_SPACE).unwrap().occupied);
}

#[tokio::test]
async fn test_occupied_space_names_the_occupant() {
    let store = seeded_store();
    let chain = VehicleEntryChainBuilder::with_default_handlers(store.clone())
        .build()
        .unwrap();

    let mut request = VehicleEntryRequest::new("NEW-200", TAKEN_SPACE);
    let err = chain.run(&mut request).await.unwrap_err();

    assert_eq!(err.code(), Some(1003));
    assert!(err.to_string().contains(PARKED_PLATE));
    assert!(err.to_string().contains("B1-012"));
}

#[tokio::test]
async fn test_successful_entry_writes_exactly_once() {
    let store = seeded_store();
    let vehicles_before = store.vehicles().len();
    let records_before = store.parking_records().len();
    let chain = VehicleEntryChainBuilder::with_default_handlers(store.clone())
        .build()
        .unwrap();

    let before = Utc::now();
    let mut request = VehicleEntryRequest::new("NEW-300", FREE_SPACE);
    chain.run(&mut request).await.unwrap();
    let after = Utc::now();

    assert_eq!(store.vehicles().len(), vehicles_before + 1);
    let records = store.parking_records();
    assert_eq!(records.len(), records_before + 1);

    let record = records
        .iter()
        .find(|record| record.license_plate == "NEW-300")
        .unwrap();
    assert_eq!(record.space_id, FREE_SPACE);
    assert!(record.is_open());
    assert!(record.entry_time >= before && record.entry_time <= after);

    assert!(store.space(FREE_SPACE).unwrap().occupied);
    assert_eq!(store.commit_count(), 1);

    let receipt = request.entry.unwrap();
    assert_eq!(receipt.parking_record_id, record.record_id);
    assert_eq!(request.resolved_space.unwrap().space_no, "B1-010");
}

#[tokio::test]
async fn test_second_entry_of_same_plate_is_rejected() {
    let store = seeded_store();
    let chain = VehicleEntryChainBuilder::with_default_handlers(store.clone())
        .build()
        .unwrap();

    let mut first = VehicleEntryRequest::new("NEW-400", FREE_SPACE);
    chain.run(&mut first).await.unwrap();

    let mut second = VehicleEntryRequest::new("NEW-400", SECOND_FREE_SPACE);
    let err = chain.run(&mut second).await.unwrap_err();
    assert!(matches!(err, AdmissionError::VehicleAlreadyInside { .. }));
    assert!(!store.space(SECOND_FREE_SPACE).unwrap().occupied);
}
