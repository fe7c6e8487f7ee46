//! # Admission Control
//!
//! Fail-fast validation chains guarding shared physical resources: vehicle
//! entry into parking spaces and venue time-slot reservations.

pub mod builder;
pub mod errors;
pub mod handler;
pub mod vehicle_entry;
pub mod venue_reservation;

pub use builder::ChainBuilder;
pub use errors::{AdmissionError, AdmissionResult};
pub use handler::{AdmissionChain, AdmissionHandler, HandlerId};
pub use vehicle_entry::{EntryReceipt, VehicleEntryChainBuilder, VehicleEntryRequest};
pub use venue_reservation::{VenueReservationChainBuilder, VenueReservationRequest};
