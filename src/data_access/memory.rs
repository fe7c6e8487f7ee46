//! # In-Memory Store
//!
//! A process-local backend implementing every repository trait. Used as the test
//! double throughout the crate and usable as a single-process backend.
//!
//! Keyed tables live in `DashMap`s; the parking and reservation ledgers are
//! scanned as a whole, so they sit behind a `parking_lot::Mutex` each.
//!
//! Units of work stage their writes and apply them in `save_changes` under a
//! single commit lock: every staged write is checked against the committed
//! tables first, and one failure discards the whole batch. The one-open-stay
//! and one-open-repair-order rules are enforced there.

use super::authority::AuthorityLevel;
use super::errors::{DataAccessError, DataAccessResult};
use super::models::{
    intervals_overlap, Collaboration, EquipmentRecord, EventArea, NewReservation, ParkingRecord,
    ParkingSpace, Reservation, RepairOrder, RetailArea, Staff, StatusApplication, StoreRecord,
    Vehicle,
};
use super::repositories::{
    EquipmentRepository, EquipmentUnitOfWork, ParkingRepository, ParkingUnitOfWork,
    RetailAreaRepository, StaffRepository, StoreRepository, StoreUnitOfWork, VenueRepository,
};
use crate::state_machine::{
    EquipmentState, EquipmentType, RetailAreaState, SettlementRecord, StoreState, VenueEventState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

#[derive(Debug)]
pub struct InMemoryStore {
    next_id: AtomicI64,
    commits: AtomicU64,
    commit_lock: Mutex<()>,
    spaces: DashMap<i64, ParkingSpace>,
    vehicles: Mutex<Vec<Vehicle>>,
    parking_records: Mutex<Vec<ParkingRecord>>,
    event_areas: DashMap<i64, EventArea>,
    collaborations: DashMap<i64, Collaboration>,
    reservations: Mutex<Vec<Reservation>>,
    equipment: DashMap<i64, EquipmentRecord>,
    repair_orders: Mutex<Vec<RepairOrder>>,
    stores: DashMap<i64, StoreRecord>,
    applications: DashMap<String, StatusApplication>,
    retail_areas: DashMap<i64, RetailArea>,
    staff: DashMap<i64, Staff>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            commits: AtomicU64::new(0),
            commit_lock: Mutex::new(()),
            spaces: DashMap::new(),
            vehicles: Mutex::new(Vec::new()),
            parking_records: Mutex::new(Vec::new()),
            event_areas: DashMap::new(),
            collaborations: DashMap::new(),
            reservations: Mutex::new(Vec::new()),
            equipment: DashMap::new(),
            repair_orders: Mutex::new(Vec::new()),
            stores: DashMap::new(),
            applications: DashMap::new(),
            retail_areas: DashMap::new(),
            staff: DashMap::new(),
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    // Seeding

    pub fn add_space(&self, space_id: i64, space_no: &str) {
        self.spaces.insert(
            space_id,
            ParkingSpace {
                space_id,
                space_no: space_no.to_string(),
                occupied: false,
            },
        );
    }

    /// Park `license_plate` in `space_id` as if it had been admitted earlier.
    pub fn park_vehicle(&self, space_id: i64, license_plate: &str, entry_time: DateTime<Utc>) {
        let vehicle_id = self.allocate_id();
        self.vehicles.lock().push(Vehicle {
            vehicle_id,
            license_plate: license_plate.to_string(),
            registered_at: entry_time,
        });
        let record_id = self.allocate_id();
        self.parking_records.lock().push(ParkingRecord {
            record_id,
            vehicle_id,
            space_id,
            license_plate: license_plate.to_string(),
            entry_time,
            exit_time: None,
        });
        if let Some(mut space) = self.spaces.get_mut(&space_id) {
            space.occupied = true;
        }
    }

    /// Flag `space_id` as taken without any open stay behind it.
    pub fn mark_space_occupied(&self, space_id: i64) {
        if let Some(mut space) = self.spaces.get_mut(&space_id) {
            space.occupied = true;
        }
    }

    pub fn add_event_area(&self, area_id: i64, name: &str, capacity: i32) {
        self.event_areas.insert(
            area_id,
            EventArea {
                area_id,
                name: name.to_string(),
                capacity,
            },
        );
    }

    pub fn add_collaboration(&self, collaboration_id: i64, partner_name: &str) {
        self.collaborations.insert(
            collaboration_id,
            Collaboration {
                collaboration_id,
                partner_name: partner_name.to_string(),
            },
        );
    }

    pub fn add_reservation(
        &self,
        area_id: i64,
        collaboration_id: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        state: VenueEventState,
    ) -> i64 {
        let reservation_id = self.allocate_id();
        self.reservations.lock().push(Reservation {
            reservation_id,
            area_id,
            collaboration_id,
            start_time,
            end_time,
            expected_headcount: None,
            status: state.to_string(),
            settlement: None,
        });
        reservation_id
    }

    pub fn add_equipment(
        &self,
        equipment_id: i64,
        name: &str,
        equipment_type: EquipmentType,
        state: EquipmentState,
    ) {
        self.equipment.insert(
            equipment_id,
            EquipmentRecord {
                equipment_id,
                name: name.to_string(),
                equipment_type: equipment_type.to_string(),
                status: state.to_string(),
            },
        );
    }

    pub fn add_store(&self, store_id: i64, name: &str, state: StoreState) {
        self.stores.insert(
            store_id,
            StoreRecord {
                store_id,
                name: name.to_string(),
                status: state.to_string(),
            },
        );
    }

    pub fn add_retail_area(
        &self,
        area_id: i64,
        base_rent_cents: i64,
        state: RetailAreaState,
        tenant: Option<&str>,
    ) {
        self.retail_areas.insert(
            area_id,
            RetailArea {
                area_id,
                base_rent_cents,
                status: state.to_string(),
                tenant: tenant.map(str::to_string),
            },
        );
    }

    pub fn add_staff(&self, staff_id: i64, name: &str, level: AuthorityLevel) {
        self.staff.insert(
            staff_id,
            Staff {
                staff_id,
                name: name.to_string(),
                authority_level: level.as_i32(),
            },
        );
    }

    // Inspection

    pub fn space(&self, space_id: i64) -> Option<ParkingSpace> {
        self.spaces.get(&space_id).map(|space| space.clone())
    }

    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.vehicles.lock().clone()
    }

    pub fn parking_records(&self) -> Vec<ParkingRecord> {
        self.parking_records.lock().clone()
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.reservations.lock().clone()
    }

    pub fn equipment_record(&self, equipment_id: i64) -> Option<EquipmentRecord> {
        self.equipment.get(&equipment_id).map(|record| record.clone())
    }

    pub fn repair_orders(&self) -> Vec<RepairOrder> {
        self.repair_orders.lock().clone()
    }

    pub fn store_record(&self, store_id: i64) -> Option<StoreRecord> {
        self.stores.get(&store_id).map(|record| record.clone())
    }

    pub fn retail_area(&self, area_id: i64) -> Option<RetailArea> {
        self.retail_areas.get(&area_id).map(|area| area.clone())
    }

    /// Number of units of work committed so far
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }
}

fn already_saved() -> DataAccessError {
    DataAccessError::Backend("unit of work was already saved".to_string())
}

fn holds_slot(status: &str) -> bool {
    // Unreadable statuses keep their slot rather than silently freeing it.
    status
        .parse::<VenueEventState>()
        .map(|state| state.holds_slot())
        .unwrap_or(true)
}

#[async_trait]
impl ParkingRepository for InMemoryStore {
    async fn find_space(&self, space_id: i64) -> DataAccessResult<Option<ParkingSpace>> {
        Ok(self.space(space_id))
    }

    async fn has_open_parking_record(&self, license_plate: &str) -> DataAccessResult<bool> {
        Ok(self
            .parking_records
            .lock()
            .iter()
            .any(|record| record.is_open() && record.license_plate == license_plate))
    }

    async fn find_open_parking_record(
        &self,
        license_plate: &str,
    ) -> DataAccessResult<Option<ParkingRecord>> {
        Ok(self
            .parking_records
            .lock()
            .iter()
            .find(|record| record.is_open() && record.license_plate == license_plate)
            .cloned())
    }

    async fn find_occupying_plate(&self, space_id: i64) -> DataAccessResult<Option<String>> {
        Ok(self
            .parking_records
            .lock()
            .iter()
            .find(|record| record.is_open() && record.space_id == space_id)
            .map(|record| record.license_plate.clone()))
    }

    async fn begin(&self) -> DataAccessResult<Box<dyn ParkingUnitOfWork + '_>> {
        Ok(Box::new(MemoryParkingWork {
            store: self,
            pending: Vec::new(),
            saved: false,
        }))
    }
}

#[derive(Debug)]
enum ParkingWrite {
    Vehicle(Vehicle),
    OpenStay(ParkingRecord),
    CloseStay {
        record_id: i64,
        exit_time: DateTime<Utc>,
    },
    Occupancy {
        space_id: i64,
        occupied: bool,
    },
}

struct MemoryParkingWork<'a> {
    store: &'a InMemoryStore,
    pending: Vec<ParkingWrite>,
    saved: bool,
}

impl MemoryParkingWork<'_> {
    fn stage(&mut self, write: ParkingWrite) -> DataAccessResult<()> {
        if self.saved {
            return Err(already_saved());
        }
        self.pending.push(write);
        Ok(())
    }
}

#[async_trait]
impl ParkingUnitOfWork for MemoryParkingWork<'_> {
    async fn insert_vehicle(
        &mut self,
        license_plate: &str,
        registered_at: DateTime<Utc>,
    ) -> DataAccessResult<i64> {
        let vehicle_id = self.store.allocate_id();
        self.stage(ParkingWrite::Vehicle(Vehicle {
            vehicle_id,
            license_plate: license_plate.to_string(),
            registered_at,
        }))?;
        Ok(vehicle_id)
    }

    async fn insert_parking_record(
        &mut self,
        vehicle_id: i64,
        space_id: i64,
        license_plate: &str,
        entry_time: DateTime<Utc>,
    ) -> DataAccessResult<i64> {
        let record_id = self.store.allocate_id();
        self.stage(ParkingWrite::OpenStay(ParkingRecord {
            record_id,
            vehicle_id,
            space_id,
            license_plate: license_plate.to_string(),
            entry_time,
            exit_time: None,
        }))?;
        Ok(record_id)
    }

    async fn close_parking_record(
        &mut self,
        record_id: i64,
        exit_time: DateTime<Utc>,
    ) -> DataAccessResult<()> {
        self.stage(ParkingWrite::CloseStay {
            record_id,
            exit_time,
        })
    }

    async fn set_space_occupied(&mut self, space_id: i64, occupied: bool) -> DataAccessResult<()> {
        self.stage(ParkingWrite::Occupancy { space_id, occupied })
    }

    async fn save_changes(&mut self) -> DataAccessResult<()> {
        if self.saved {
            return Err(already_saved());
        }
        let store = self.store;
        let _commit = store.commit_lock.lock();

        let mut records = store.parking_records.lock().clone();
        let mut vehicles = Vec::new();
        let mut occupancy = Vec::new();
        for write in &self.pending {
            match write {
                ParkingWrite::Vehicle(vehicle) => vehicles.push(vehicle.clone()),
                ParkingWrite::OpenStay(stay) => {
                    if let Some(open) = records.iter().find(|record| {
                        record.is_open()
                            && (record.license_plate == stay.license_plate
                                || record.space_id == stay.space_id)
                    }) {
                        return Err(DataAccessError::Conflict(format!(
                            "parking record {} is still open for {} in space {}",
                            open.record_id, open.license_plate, open.space_id
                        )));
                    }
                    records.push(stay.clone());
                }
                ParkingWrite::CloseStay {
                    record_id,
                    exit_time,
                } => {
                    let record = records
                        .iter_mut()
                        .find(|record| record.record_id == *record_id)
                        .ok_or_else(|| DataAccessError::not_found("parking_record", record_id))?;
                    if !record.is_open() {
                        return Err(DataAccessError::Conflict(format!(
                            "parking record {record_id} is already closed"
                        )));
                    }
                    record.exit_time = Some(*exit_time);
                }
                ParkingWrite::Occupancy { space_id, occupied } => {
                    if !store.spaces.contains_key(space_id) {
                        return Err(DataAccessError::not_found("parking_space", space_id));
                    }
                    occupancy.push((*space_id, *occupied));
                }
            }
        }

        store.vehicles.lock().extend(vehicles);
        *store.parking_records.lock() = records;
        for (space_id, occupied) in occupancy {
            if let Some(mut space) = store.spaces.get_mut(&space_id) {
                space.occupied = occupied;
            }
        }
        self.saved = true;
        store.record_commit();
        Ok(())
    }
}

#[async_trait]
impl VenueRepository for InMemoryStore {
    async fn find_event_area(&self, area_id: i64) -> DataAccessResult<Option<EventArea>> {
        Ok(self.event_areas.get(&area_id).map(|area| area.clone()))
    }

    async fn has_overlapping_reservation(
        &self,
        area_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DataAccessResult<bool> {
        Ok(self.reservations.lock().iter().any(|reservation| {
            reservation.area_id == area_id
                && holds_slot(&reservation.status)
                && intervals_overlap(reservation.start_time, reservation.end_time, start, end)
        }))
    }

    async fn collaboration_exists(&self, collaboration_id: i64) -> DataAccessResult<bool> {
        Ok(self.collaborations.contains_key(&collaboration_id))
    }

    async fn insert_reservation(&self, reservation: NewReservation) -> DataAccessResult<i64> {
        let reservation_id = self.allocate_id();
        self.reservations.lock().push(Reservation {
            reservation_id,
            area_id: reservation.area_id,
            collaboration_id: reservation.collaboration_id,
            start_time: reservation.start_time,
            end_time: reservation.end_time,
            expected_headcount: reservation.expected_headcount,
            status: reservation.status,
            settlement: None,
        });
        Ok(reservation_id)
    }

    async fn find_reservation(&self, reservation_id: i64) -> DataAccessResult<Option<Reservation>> {
        Ok(self
            .reservations
            .lock()
            .iter()
            .find(|reservation| reservation.reservation_id == reservation_id)
            .cloned())
    }

    async fn update_reservation_status(
        &self,
        reservation_id: i64,
        status: &str,
    ) -> DataAccessResult<()> {
        let mut reservations = self.reservations.lock();
        let reservation = reservations
            .iter_mut()
            .find(|reservation| reservation.reservation_id == reservation_id)
            .ok_or_else(|| DataAccessError::not_found("reservation", reservation_id))?;
        reservation.status = status.to_string();
        Ok(())
    }

    async fn save_settlement(
        &self,
        reservation_id: i64,
        settlement: &SettlementRecord,
    ) -> DataAccessResult<()> {
        let mut reservations = self.reservations.lock();
        let reservation = reservations
            .iter_mut()
            .find(|reservation| reservation.reservation_id == reservation_id)
            .ok_or_else(|| DataAccessError::not_found("reservation", reservation_id))?;
        if reservation.settlement.is_some() {
            return Err(DataAccessError::Conflict(format!(
                "reservation {reservation_id} is already settled"
            )));
        }
        reservation.settlement = Some(settlement.clone());
        Ok(())
    }
}

#[async_trait]
impl EquipmentRepository for InMemoryStore {
    async fn find_equipment(&self, equipment_id: i64) -> DataAccessResult<Option<EquipmentRecord>> {
        Ok(self.equipment_record(equipment_id))
    }

    async fn has_open_repair_order(&self, equipment_id: i64) -> DataAccessResult<bool> {
        Ok(self
            .repair_orders
            .lock()
            .iter()
            .any(|order| order.equipment_id == equipment_id && order.closed_at.is_none()))
    }

    async fn begin(&self) -> DataAccessResult<Box<dyn EquipmentUnitOfWork + '_>> {
        Ok(Box::new(MemoryEquipmentWork {
            store: self,
            pending: Vec::new(),
            saved: false,
        }))
    }
}

#[derive(Debug)]
enum EquipmentWrite {
    Status {
        equipment_id: i64,
        status: String,
    },
    OpenOrder(RepairOrder),
    CloseOrder {
        equipment_id: i64,
        successful: bool,
        closed_at: DateTime<Utc>,
    },
}

struct MemoryEquipmentWork<'a> {
    store: &'a InMemoryStore,
    pending: Vec<EquipmentWrite>,
    saved: bool,
}

impl MemoryEquipmentWork<'_> {
    fn stage(&mut self, write: EquipmentWrite) -> DataAccessResult<()> {
        if self.saved {
            return Err(already_saved());
        }
        self.pending.push(write);
        Ok(())
    }
}

#[async_trait]
impl EquipmentUnitOfWork for MemoryEquipmentWork<'_> {
    async fn update_equipment_status(
        &mut self,
        equipment_id: i64,
        status: &str,
    ) -> DataAccessResult<()> {
        self.stage(EquipmentWrite::Status {
            equipment_id,
            status: status.to_string(),
        })
    }

    async fn insert_repair_order(
        &mut self,
        equipment_id: i64,
        description: &str,
        opened_at: DateTime<Utc>,
    ) -> DataAccessResult<i64> {
        let repair_order_id = self.store.allocate_id();
        self.stage(EquipmentWrite::OpenOrder(RepairOrder {
            repair_order_id,
            equipment_id,
            description: description.to_string(),
            opened_at,
            closed_at: None,
            successful: None,
        }))?;
        Ok(repair_order_id)
    }

    async fn close_repair_order(
        &mut self,
        equipment_id: i64,
        successful: bool,
        closed_at: DateTime<Utc>,
    ) -> DataAccessResult<()> {
        self.stage(EquipmentWrite::CloseOrder {
            equipment_id,
            successful,
            closed_at,
        })
    }

    async fn save_changes(&mut self) -> DataAccessResult<()> {
        if self.saved {
            return Err(already_saved());
        }
        let store = self.store;
        let _commit = store.commit_lock.lock();

        let mut orders = store.repair_orders.lock().clone();
        let mut statuses = Vec::new();
        for write in &self.pending {
            match write {
                EquipmentWrite::Status {
                    equipment_id,
                    status,
                } => {
                    if !store.equipment.contains_key(equipment_id) {
                        return Err(DataAccessError::not_found("equipment", equipment_id));
                    }
                    statuses.push((*equipment_id, status.clone()));
                }
                EquipmentWrite::OpenOrder(order) => {
                    if orders.iter().any(|existing| {
                        existing.equipment_id == order.equipment_id && existing.closed_at.is_none()
                    }) {
                        return Err(DataAccessError::Conflict(format!(
                            "equipment {} already has an open repair order",
                            order.equipment_id
                        )));
                    }
                    orders.push(order.clone());
                }
                EquipmentWrite::CloseOrder {
                    equipment_id,
                    successful,
                    closed_at,
                } => {
                    let order = orders
                        .iter_mut()
                        .find(|order| {
                            order.equipment_id == *equipment_id && order.closed_at.is_none()
                        })
                        .ok_or_else(|| {
                            DataAccessError::not_found("open repair order", equipment_id)
                        })?;
                    order.closed_at = Some(*closed_at);
                    order.successful = Some(*successful);
                }
            }
        }

        *store.repair_orders.lock() = orders;
        for (equipment_id, status) in statuses {
            if let Some(mut record) = store.equipment.get_mut(&equipment_id) {
                record.status = status;
            }
        }
        self.saved = true;
        store.record_commit();
        Ok(())
    }
}

#[async_trait]
impl StoreRepository for InMemoryStore {
    async fn find_store(&self, store_id: i64) -> DataAccessResult<Option<StoreRecord>> {
        Ok(self.store_record(store_id))
    }

    async fn insert_status_application(
        &self,
        application: &StatusApplication,
    ) -> DataAccessResult<()> {
        if self.applications.contains_key(&application.application_no) {
            return Err(DataAccessError::Conflict(format!(
                "application {} already exists",
                application.application_no
            )));
        }
        self.applications
            .insert(application.application_no.clone(), application.clone());
        Ok(())
    }

    async fn find_status_application(
        &self,
        application_no: &str,
    ) -> DataAccessResult<Option<StatusApplication>> {
        Ok(self
            .applications
            .get(application_no)
            .map(|application| application.clone()))
    }

    async fn begin(&self) -> DataAccessResult<Box<dyn StoreUnitOfWork + '_>> {
        Ok(Box::new(MemoryStoreWork {
            store: self,
            pending: Vec::new(),
            saved: false,
        }))
    }
}

#[derive(Debug)]
enum StoreWrite {
    Status {
        store_id: i64,
        status: String,
    },
    Resolve {
        application_no: String,
        approved: bool,
        resolved_by: i64,
    },
}

struct MemoryStoreWork<'a> {
    store: &'a InMemoryStore,
    pending: Vec<StoreWrite>,
    saved: bool,
}

#[async_trait]
impl StoreUnitOfWork for MemoryStoreWork<'_> {
    async fn update_store_status(&mut self, store_id: i64, status: &str) -> DataAccessResult<()> {
        if self.saved {
            return Err(already_saved());
        }
        self.pending.push(StoreWrite::Status {
            store_id,
            status: status.to_string(),
        });
        Ok(())
    }

    async fn resolve_status_application(
        &mut self,
        application_no: &str,
        approved: bool,
        resolved_by: i64,
    ) -> DataAccessResult<()> {
        if self.saved {
            return Err(already_saved());
        }
        self.pending.push(StoreWrite::Resolve {
            application_no: application_no.to_string(),
            approved,
            resolved_by,
        });
        Ok(())
    }

    async fn save_changes(&mut self) -> DataAccessResult<()> {
        if self.saved {
            return Err(already_saved());
        }
        let store = self.store;
        let _commit = store.commit_lock.lock();

        for write in &self.pending {
            match write {
                StoreWrite::Status { store_id, .. } => {
                    if !store.stores.contains_key(store_id) {
                        return Err(DataAccessError::not_found("store", store_id));
                    }
                }
                StoreWrite::Resolve { application_no, .. } => {
                    let application = store.applications.get(application_no).ok_or_else(|| {
                        DataAccessError::not_found("status_application", application_no)
                    })?;
                    if !application.is_pending() {
                        return Err(DataAccessError::Conflict(format!(
                            "application {application_no} was already resolved"
                        )));
                    }
                }
            }
        }

        for write in &self.pending {
            match write {
                StoreWrite::Status { store_id, status } => {
                    if let Some(mut record) = store.stores.get_mut(store_id) {
                        record.status = status.clone();
                    }
                }
                StoreWrite::Resolve {
                    application_no,
                    approved,
                    resolved_by,
                } => {
                    if let Some(mut application) = store.applications.get_mut(application_no) {
                        application.approved = Some(*approved);
                        application.resolved_by = Some(*resolved_by);
                    }
                }
            }
        }
        self.saved = true;
        store.record_commit();
        Ok(())
    }
}

#[async_trait]
impl RetailAreaRepository for InMemoryStore {
    async fn find_retail_area(&self, area_id: i64) -> DataAccessResult<Option<RetailArea>> {
        Ok(self.retail_area(area_id))
    }

    async fn update_retail_area(&self, area: &RetailArea) -> DataAccessResult<()> {
        let mut stored = self
            .retail_areas
            .get_mut(&area.area_id)
            .ok_or_else(|| DataAccessError::not_found("retail_area", area.area_id))?;
        *stored = area.clone();
        Ok(())
    }
}

#[async_trait]
impl StaffRepository for InMemoryStore {
    async fn find_staff_level(&self, staff_id: i64) -> DataAccessResult<Option<i32>> {
        Ok(self.staff.get(&staff_id).map(|staff| staff.authority_level))
    }
}
