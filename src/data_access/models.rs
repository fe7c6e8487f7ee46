//! Persisted record shapes exchanged with the data-access backends.
//!
//! Lifecycle statuses are carried as their persisted snake_case names; the
//! services parse them into typed states when building a context.

use crate::state_machine::SettlementRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single parking bay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingSpace {
    pub space_id: i64,
    pub space_no: String,
    pub occupied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_id: i64,
    pub license_plate: String,
    pub registered_at: DateTime<Utc>,
}

/// One stay of a vehicle in a space. Open while `exit_time` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingRecord {
    pub record_id: i64,
    pub vehicle_id: i64,
    pub space_id: i64,
    pub license_plate: String,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
}

impl ParkingRecord {
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }
}

/// A reservable venue area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventArea {
    pub area_id: i64,
    pub name: String,
    pub capacity: i32,
}

/// A partner organisation that books venue events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaboration {
    pub collaboration_id: i64,
    pub partner_name: String,
}

/// Venue reservation as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: i64,
    pub area_id: i64,
    pub collaboration_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub expected_headcount: Option<i32>,
    pub status: String,
    pub settlement: Option<SettlementRecord>,
}

/// Reservation insert payload (without generated fields)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    pub area_id: i64,
    pub collaboration_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub expected_headcount: Option<i32>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub equipment_id: i64,
    pub name: String,
    pub equipment_type: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOrder {
    pub repair_order_id: i64,
    pub equipment_id: i64,
    pub description: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub successful: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub store_id: i64,
    pub name: String,
    pub status: String,
}

/// Pending or resolved store status-change application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusApplication {
    pub application_no: String,
    pub store_id: i64,
    pub requested_status: String,
    pub reason: String,
    pub requested_by: i64,
    pub requested_at: DateTime<Utc>,
    /// `Some(approved)` once an administrator has ruled on it.
    pub approved: Option<bool>,
    pub resolved_by: Option<i64>,
}

impl StatusApplication {
    pub fn is_pending(&self) -> bool {
        self.approved.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetailArea {
    pub area_id: i64,
    pub base_rent_cents: i64,
    pub status: String,
    pub tenant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub staff_id: i64,
    pub name: String,
    pub authority_level: i32,
}

/// Half-open interval overlap: `[a_start, a_end)` meets `[b_start, b_end)`.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}
