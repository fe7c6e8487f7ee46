// State machine module for premises lifecycle management
//
// One shared transition engine (`StateContext`) over closed state enums, with a
// domain context per entity kind layering its own operations on top.

pub mod context;
pub mod equipment;
pub mod errors;
pub mod retail_area;
pub mod states;
pub mod store;
pub mod venue_event;

// Re-export main types for convenient access
pub use context::{StateContext, TransitionRecord};
pub use equipment::{
    EquipmentContext, EquipmentOperation, EquipmentState, EquipmentType, OperationArgs,
    OperationResult,
};
pub use errors::{StateMachineError, StateMachineResult};
pub use retail_area::{RetailAreaContext, RetailAreaOperation, RetailAreaState};
pub use states::{LifecycleState, StateRegistry};
pub use store::{StatusChangeResult, StoreContext, StoreOperation, StoreState};
pub use venue_event::{SettlementRecord, VenueEventContext, VenueEventOperation, VenueEventState};
