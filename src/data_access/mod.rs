//! # Data Access
//!
//! The injected persistence surface: narrow repository traits, the permission
//! predicate, record models, and two backends (in-memory and PostgreSQL).

pub mod authority;
pub mod errors;
pub mod memory;
pub mod models;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod repositories;

pub use authority::{AuthorityChecker, AuthorityLevel, StaffAuthorityChecker};
pub use errors::{DataAccessError, DataAccessResult};
pub use memory::InMemoryStore;
pub use models::{
    intervals_overlap, Collaboration, EquipmentRecord, EventArea, NewReservation, ParkingRecord,
    ParkingSpace, RepairOrder, Reservation, RetailArea, Staff, StatusApplication, StoreRecord,
    Vehicle,
};
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use repositories::{
    EquipmentRepository, EquipmentUnitOfWork, ParkingRepository, ParkingUnitOfWork,
    RetailAreaRepository, StaffRepository, StoreRepository, StoreUnitOfWork, VenueRepository,
};
