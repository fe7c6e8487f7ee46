pub mod publisher;

// Re-export key types for convenience
pub use publisher::{EventPublisher, PublishError, PublishedEvent, TransitionEvent};

/// Event names published by the service facades
pub mod constants {
    pub const VEHICLE_ENTERED: &str = "parking.vehicle_entered";
    pub const VEHICLE_EXITED: &str = "parking.vehicle_exited";
    pub const RESERVATION_CREATED: &str = "venue.reservation_created";
    pub const RESERVATION_SETTLED: &str = "venue.reservation_settled";
    pub const REPAIR_ORDER_OPENED: &str = "equipment.repair_order_opened";
    pub const STATUS_CHANGE_REQUESTED: &str = "store.status_change_requested";
    pub const STATUS_CHANGE_RESOLVED: &str = "store.status_change_resolved";
}

/// `<entity_kind>.transitioned`
pub fn transition_event_name(entity_kind: &str) -> String {
    format!("{entity_kind}.transitioned")
}
