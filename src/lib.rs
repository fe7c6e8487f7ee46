#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Premises Core
//!
//! Lifecycle state machines and admission-control chains for a property-management
//! back office.
//!
//! ## Overview
//!
//! The back office manages finite, shared physical resources: parking spaces, venues,
//! equipment and retail space. This crate is the admission-control layer that sits in
//! front of them. It answers two questions for the surrounding application:
//!
//! - **Is this state change legal?** Four lifecycle state machines (equipment, store,
//!   retail area, venue event) own the legal transition graphs and record an auditable
//!   trail for every transition.
//! - **May this actor take this resource now?** Two ordered, fail-fast validation chains
//!   (vehicle entry, venue reservation) check every precondition before anything is
//!   written, and reject with a stable, code-bearing error otherwise.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - State graphs, the shared transition engine, and per-kind contexts
//! - [`admission`] - Handler chains, the chain builder, and the two admission chains
//! - [`data_access`] - The injected data-access interface, plus in-memory and PostgreSQL stores
//! - [`services`] - Facades that gate, validate, transition, persist, and publish
//! - [`events`] - Transition event publishing for audit consumers
//! - [`config`] - Layered configuration loading
//! - [`logging`] - Structured logging initialisation and helpers
//! - [`error`] - Crate-level error type
//!
//! ## Quick Start
//!
//! ```rust
//! use premises_core::state_machine::{EquipmentContext, EquipmentOperation, EquipmentState, EquipmentType, OperationArgs};
//!
//! let mut ac = EquipmentContext::new(7, EquipmentType::AirConditioner, EquipmentState::Running).unwrap();
//! let result = ac.perform_operation(EquipmentOperation::EmergencyStop, &OperationArgs::default()).unwrap();
//!
//! assert!(result.status_changed);
//! assert_eq!(ac.current_state(), EquipmentState::Faulted);
//! assert!(ac.can_create_repair_order());
//! ```

pub mod admission;
pub mod config;
pub mod data_access;
pub mod error;
pub mod events;
pub mod logging;
pub mod services;
pub mod state_machine;

pub use admission::{AdmissionChain, AdmissionError, AdmissionHandler, ChainBuilder};
pub use config::{ConfigManager, PremisesConfig};
pub use error::{PremisesError, Result};
pub use events::{EventPublisher, PublishedEvent, TransitionEvent};
pub use services::Services;
pub use state_machine::{LifecycleState, StateContext, StateMachineError};
