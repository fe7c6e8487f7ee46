//! # Repository Traits
//!
//! The narrow data-access surface the admission chains and services consume.
//!
//! Operations that write more than one row go through a unit of work opened
//! with `begin`. Its writes become visible together on `save_changes`; a unit
//! dropped without saving leaves storage untouched.

use super::errors::DataAccessResult;
use super::models::{
    EquipmentRecord, EventArea, NewReservation, ParkingRecord, ParkingSpace, Reservation,
    RetailArea, StatusApplication, StoreRecord,
};
use crate::state_machine::SettlementRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait ParkingRepository: Send + Sync {
    async fn find_space(&self, space_id: i64) -> DataAccessResult<Option<ParkingSpace>>;

    /// Whether `license_plate` has a record with no exit time anywhere in the facility.
    async fn has_open_parking_record(&self, license_plate: &str) -> DataAccessResult<bool>;

    async fn find_open_parking_record(
        &self,
        license_plate: &str,
    ) -> DataAccessResult<Option<ParkingRecord>>;

    /// Plate of the vehicle currently parked in `space_id`, if any open record says so.
    async fn find_occupying_plate(&self, space_id: i64) -> DataAccessResult<Option<String>>;

    async fn begin(&self) -> DataAccessResult<Box<dyn ParkingUnitOfWork + '_>>;
}

/// Pending writes of one vehicle entry or exit.
#[async_trait]
pub trait ParkingUnitOfWork: Send {
    async fn insert_vehicle(
        &mut self,
        license_plate: &str,
        registered_at: DateTime<Utc>,
    ) -> DataAccessResult<i64>;

    /// Fails with `Conflict` if the plate or the space already has an open stay.
    async fn insert_parking_record(
        &mut self,
        vehicle_id: i64,
        space_id: i64,
        license_plate: &str,
        entry_time: DateTime<Utc>,
    ) -> DataAccessResult<i64>;

    async fn close_parking_record(
        &mut self,
        record_id: i64,
        exit_time: DateTime<Utc>,
    ) -> DataAccessResult<()>;

    async fn set_space_occupied(&mut self, space_id: i64, occupied: bool) -> DataAccessResult<()>;

    /// Commit every pending write. The unit cannot be reused afterwards.
    async fn save_changes(&mut self) -> DataAccessResult<()>;
}

#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn find_event_area(&self, area_id: i64) -> DataAccessResult<Option<EventArea>>;

    /// Any reservation on `area_id`, other than a cancelled one, overlapping `[start, end)`.
    async fn has_overlapping_reservation(
        &self,
        area_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DataAccessResult<bool>;

    async fn collaboration_exists(&self, collaboration_id: i64) -> DataAccessResult<bool>;

    async fn insert_reservation(&self, reservation: NewReservation) -> DataAccessResult<i64>;

    async fn find_reservation(&self, reservation_id: i64) -> DataAccessResult<Option<Reservation>>;

    async fn update_reservation_status(
        &self,
        reservation_id: i64,
        status: &str,
    ) -> DataAccessResult<()>;

    async fn save_settlement(
        &self,
        reservation_id: i64,
        settlement: &SettlementRecord,
    ) -> DataAccessResult<()>;
}

#[async_trait]
pub trait EquipmentRepository: Send + Sync {
    async fn find_equipment(&self, equipment_id: i64) -> DataAccessResult<Option<EquipmentRecord>>;

    async fn has_open_repair_order(&self, equipment_id: i64) -> DataAccessResult<bool>;

    async fn begin(&self) -> DataAccessResult<Box<dyn EquipmentUnitOfWork + '_>>;
}

/// Pending writes of one equipment status change and its repair order.
#[async_trait]
pub trait EquipmentUnitOfWork: Send {
    async fn update_equipment_status(
        &mut self,
        equipment_id: i64,
        status: &str,
    ) -> DataAccessResult<()>;

    /// Fails with `Conflict` if the equipment already has an open order.
    async fn insert_repair_order(
        &mut self,
        equipment_id: i64,
        description: &str,
        opened_at: DateTime<Utc>,
    ) -> DataAccessResult<i64>;

    /// Close the open repair order of `equipment_id` with the technician's verdict.
    async fn close_repair_order(
        &mut self,
        equipment_id: i64,
        successful: bool,
        closed_at: DateTime<Utc>,
    ) -> DataAccessResult<()>;

    async fn save_changes(&mut self) -> DataAccessResult<()>;
}

#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn find_store(&self, store_id: i64) -> DataAccessResult<Option<StoreRecord>>;

    async fn insert_status_application(
        &self,
        application: &StatusApplication,
    ) -> DataAccessResult<()>;

    async fn find_status_application(
        &self,
        application_no: &str,
    ) -> DataAccessResult<Option<StatusApplication>>;

    async fn begin(&self) -> DataAccessResult<Box<dyn StoreUnitOfWork + '_>>;
}

/// Pending writes of one status-change ruling.
#[async_trait]
pub trait StoreUnitOfWork: Send {
    async fn update_store_status(&mut self, store_id: i64, status: &str) -> DataAccessResult<()>;

    /// Fails with `Conflict` if the application was already resolved.
    async fn resolve_status_application(
        &mut self,
        application_no: &str,
        approved: bool,
        resolved_by: i64,
    ) -> DataAccessResult<()>;

    async fn save_changes(&mut self) -> DataAccessResult<()>;
}

#[async_trait]
pub trait RetailAreaRepository: Send + Sync {
    async fn find_retail_area(&self, area_id: i64) -> DataAccessResult<Option<RetailArea>>;

    async fn update_retail_area(&self, area: &RetailArea) -> DataAccessResult<()>;
}

#[async_trait]
pub trait StaffRepository: Send + Sync {
    /// Numeric authority level of `staff_id`, `None` for unknown staff.
    async fn find_staff_level(&self, staff_id: i64) -> DataAccessResult<Option<i32>>;
}
