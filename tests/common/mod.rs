//! Shared fixtures for integration tests
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use premises_core::data_access::{AuthorityLevel, InMemoryStore};
use premises_core::state_machine::{
    EquipmentState, EquipmentType, RetailAreaState, StoreState, VenueEventState,
};
use std::sync::Arc;

pub const FRONT_DESK: i64 = 1;
pub const MANAGER: i64 = 2;
pub const ADMINISTRATOR: i64 = 3;
pub const STRANGER: i64 = 99;

pub const FREE_SPACE: i64 = 10;
pub const SECOND_FREE_SPACE: i64 = 11;
pub const TAKEN_SPACE: i64 = 12;
pub const PARKED_PLATE: &str = "PARK-001";

pub const ATRIUM: i64 = 20;
pub const ATRIUM_CAPACITY: i32 = 150;
pub const PARTNER: i64 = 30;

pub const AIR_CONDITIONER: i64 = 40;
pub const ELEVATOR: i64 = 41;
pub const SCRAPPED_LIGHT: i64 = 42;

pub const BOOKSHOP: i64 = 50;
pub const KIOSK: i64 = 60;

/// 2024-06-01 at `hour`:00 UTC
pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
}

/// A small, fully seeded premises
pub fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());

    store.add_staff(FRONT_DESK, "Front desk", AuthorityLevel::Staff);
    store.add_staff(MANAGER, "Operations manager", AuthorityLevel::Manager);
    store.add_staff(ADMINISTRATOR, "Property administrator", AuthorityLevel::Administrator);

    store.add_space(FREE_SPACE, "B1-010");
    store.add_space(SECOND_FREE_SPACE, "B1-011");
    store.add_space(TAKEN_SPACE, "B1-012");
    store.park_vehicle(TAKEN_SPACE, PARKED_PLATE, at(7));

    store.add_event_area(ATRIUM, "Atrium", ATRIUM_CAPACITY);
    store.add_collaboration(PARTNER, "Harbour Events Ltd");

    store.add_equipment(
        AIR_CONDITIONER,
        "AC level 2",
        EquipmentType::AirConditioner,
        EquipmentState::Running,
    );
    store.add_equipment(ELEVATOR, "Lift A", EquipmentType::Elevator, EquipmentState::Standby);
    store.add_equipment(
        SCRAPPED_LIGHT,
        "Lobby light",
        EquipmentType::Lighting,
        EquipmentState::Discarded,
    );

    store.add_store(BOOKSHOP, "Corner Books", StoreState::NormalOperation);
    store.add_retail_area(KIOSK, 250_000, RetailAreaState::Vacant, None);

    store
}

/// Book the atrium for `[start, end)` in the given state.
pub fn book_atrium(
    store: &InMemoryStore,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    state: VenueEventState,
) -> i64 {
    store.add_reservation(ATRIUM, PARTNER, start, end, state)
}
