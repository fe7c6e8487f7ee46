use crate::common::*;
use premises_core::admission::{
    AdmissionError, VenueReservationChainBuilder, VenueReservationRequest,
};
use premises_core::data_access::intervals_overlap;
use premises_core::state_machine::VenueEventState;
use proptest::prelude::*;

fn atrium_request(start: u32, end: u32) -> VenueReservationRequest {
    VenueReservationRequest::new(PARTNER, ATRIUM, at(start), at(end))
}

#[tokio::test]
async fn test_overlap_with_live_reservation_rejected() {
    let store = seeded_store();
    book_atrium(&store, at(11), at(13), VenueEventState::Approved);
    let chain = VenueReservationChainBuilder::with_default_handlers(store.clone())
        .build()
        .unwrap();

    let mut request = atrium_request(10, 12);
    let err = chain.run(&mut request).await.unwrap_err();
    assert!(matches!(err, AdmissionError::AreaAlreadyOccupied { .. }));
    assert_eq!(err.code(), Some(2003));
}

#[tokio::test]
async fn test_overlap_with_cancelled_reservation_allowed() {
    let store = seeded_store();
    book_atrium(&store, at(11), at(13), VenueEventState::Cancelled);
    let chain = VenueReservationChainBuilder::with_default_handlers(store.clone())
        .build()
        .unwrap();

    let mut request = atrium_request(10, 12);
    chain.run(&mut request).await.unwrap();
}

#[tokio::test]
async fn test_back_to_back_bookings_allowed() {
    let store = seeded_store();
    book_atrium(&store, at(12), at(14), VenueEventState::PendingApproval);
    let chain = VenueReservationChainBuilder::with_default_handlers(store.clone())
        .build()
        .unwrap();

    let mut request = atrium_request(10, 12);
    chain.run(&mut request).await.unwrap();
}

#[tokio::test]
async fn test_inverted_window_rejected() {
    let chain = VenueReservationChainBuilder::with_default_handlers(seeded_store())
        .build()
        .unwrap();
    let mut request = atrium_request(14, 10);
    let err = chain.run(&mut request).await.unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidTimeRange { .. }));
}

#[tokio::test]
async fn test_unknown_area_and_partner() {
    let chain = VenueReservationChainBuilder::with_default_handlers(seeded_store())
        .build()
        .unwrap();

    let mut request = VenueReservationRequest::new(PARTNER, 404, at(9), at(10));
    let err = chain.run(&mut request).await.unwrap_err();
    assert_eq!(err.code(), Some(2002));

    let mut request = VenueReservationRequest::new(404, ATRIUM, at(9), at(10));
    let err = chain.run(&mut request).await.unwrap_err();
    assert!(matches!(
        err,
        AdmissionError::CollaborationNotFound {
            collaboration_id: 404
        }
    ));
}

#[tokio::test]
async fn test_capacity_checked_only_when_headcount_given() {
    let chain = VenueReservationChainBuilder::with_default_handlers(seeded_store())
        .build()
        .unwrap();

    let mut without_headcount = atrium_request(9, 10);
    chain.run(&mut without_headcount).await.unwrap();

    let mut at_capacity = atrium_request(9, 10).with_expected_headcount(ATRIUM_CAPACITY);
    chain.run(&mut at_capacity).await.unwrap();

    let mut over_capacity = atrium_request(9, 10).with_expected_headcount(ATRIUM_CAPACITY + 1);
    let err = chain.run(&mut over_capacity).await.unwrap_err();
    assert!(matches!(
        err,
        AdmissionError::InsufficientCapacity {
            requested,
            capacity: ATRIUM_CAPACITY
        } if requested == ATRIUM_CAPACITY + 1
    ));
}

#[test]
fn test_chain_blocks_on_runtime() {
    let chain = VenueReservationChainBuilder::with_default_handlers(seeded_store())
        .build()
        .unwrap();
    let mut request = atrium_request(15, 16);
    tokio_test::block_on(chain.run(&mut request)).unwrap();
    assert!(request.resolved_area.is_some());
}

proptest! {
    /// Overlap is symmetric and matches the open-interval definition.
    #[test]
    fn overlap_predicate_is_symmetric(
        a_start in 0u32..23, a_len in 1u32..6,
        b_start in 0u32..23, b_len in 1u32..6,
    ) {
        let a_end = (a_start + a_len).min(23);
        let b_end = (b_start + b_len).min(23);
        prop_assume!(a_end > a_start && b_end > b_start);

        let forward = intervals_overlap(at(a_start), at(a_end), at(b_start), at(b_end));
        let backward = intervals_overlap(at(b_start), at(b_end), at(a_start), at(a_end));
        prop_assert_eq!(forward, backward);
        prop_assert_eq!(forward, a_start < b_end && a_end > b_start);
    }

    /// Any headcount above capacity is refused; anything up to it passes.
    #[test]
    fn capacity_boundary(headcount in 0i32..(ATRIUM_CAPACITY * 2)) {
        let chain = VenueReservationChainBuilder::with_default_handlers(seeded_store())
            .build()
            .unwrap();
        let mut request = atrium_request(9, 10).with_expected_headcount(headcount);
        let outcome = tokio_test::block_on(chain.run(&mut request));
        prop_assert_eq!(outcome.is_ok(), headcount <= ATRIUM_CAPACITY);
    }
}
