//! # Service Facades
//!
//! Each facade gates the caller through the [`AuthorityChecker`], loads the
//! persisted status, runs the admission chain or lifecycle context, writes the
//! result back, and publishes an audit event. The state machines and chains
//! underneath stay permission-agnostic.

pub mod equipment;
pub mod parking;
pub mod retail_area;
pub mod store;
pub mod venue;

pub use equipment::EquipmentService;
pub use parking::ParkingService;
pub use retail_area::RetailAreaService;
pub use store::StoreService;
pub use venue::VenueService;

use crate::config::PremisesConfig;
use crate::data_access::{
    AuthorityChecker, AuthorityLevel, EquipmentRepository, ParkingRepository,
    RetailAreaRepository, StaffAuthorityChecker, StaffRepository, StoreRepository,
    VenueRepository,
};
use crate::error::{PremisesError, Result};
use crate::events::EventPublisher;
use crate::logging::log_error;
use crate::state_machine::{LifecycleState, TransitionRecord};
use serde_json::Value;
use std::sync::Arc;

/// Every facade wired to one backend
#[derive(Debug)]
pub struct Services {
    pub parking: ParkingService,
    pub venue: VenueService,
    pub equipment: EquipmentService,
    pub store: StoreService,
    pub retail_area: RetailAreaService,
    publisher: EventPublisher,
}

impl Services {
    pub fn new<B>(backend: Arc<B>, config: &PremisesConfig) -> Result<Self>
    where
        B: ParkingRepository
            + VenueRepository
            + EquipmentRepository
            + StoreRepository
            + RetailAreaRepository
            + StaffRepository
            + 'static,
    {
        let staff: Arc<dyn StaffRepository> = backend.clone();
        let authority: Arc<dyn AuthorityChecker> = Arc::new(StaffAuthorityChecker::new(staff));
        let publisher = EventPublisher::from_config(&config.events);

        Ok(Self {
            parking: ParkingService::new(
                backend.clone(),
                Arc::clone(&authority),
                publisher.clone(),
            )?,
            venue: VenueService::new(backend.clone(), Arc::clone(&authority), publisher.clone())?,
            equipment: EquipmentService::new(
                backend.clone(),
                Arc::clone(&authority),
                publisher.clone(),
            )
            .with_limits(config.equipment.clone()),
            store: StoreService::new(backend.clone(), Arc::clone(&authority), publisher.clone())
                .with_application_prefix(config.store.application_prefix.clone()),
            retail_area: RetailAreaService::new(backend, authority, publisher.clone()),
            publisher,
        })
    }

    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }
}

pub(crate) async fn require_authority(
    checker: &dyn AuthorityChecker,
    actor_id: i64,
    required_level: AuthorityLevel,
) -> Result<()> {
    if checker.check_authority(actor_id, required_level).await? {
        return Ok(());
    }
    tracing::warn!(
        actor_id = actor_id,
        required_level = %required_level,
        "Permission denied"
    );
    Err(PremisesError::PermissionDenied {
        actor_id,
        required_level: required_level.to_string(),
    })
}

/// Audit events are published after the write; a failure here is logged, not returned.
pub(crate) async fn publish_event(publisher: &EventPublisher, name: &str, context: Value) {
    if let Err(err) = publisher.publish(name, context).await {
        log_error("events", name, &err.to_string(), None);
    }
}

pub(crate) async fn publish_history<S: LifecycleState>(
    publisher: &EventPublisher,
    records: &[TransitionRecord<S>],
) {
    if let Err(err) = publisher.publish_transitions(records).await {
        log_error("events", S::ENTITY_KIND, &err.to_string(), None);
    }
}
