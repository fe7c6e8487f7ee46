//! # Vehicle Entry Chain
//!
//! Default order: space existence, duplicate vehicle, space status, entry
//! execution. Only the last handler writes; it runs once every precondition
//! has passed.

use super::builder::ChainBuilder;
use super::errors::{AdmissionError, AdmissionResult};
use super::handler::{AdmissionHandler, HandlerId};
use crate::data_access::{ParkingRepository, ParkingSpace};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const CHAIN_NAME: &str = "vehicle_entry";

pub const SPACE_EXISTENCE: HandlerId = "space_existence";
pub const DUPLICATE_VEHICLE: HandlerId = "duplicate_vehicle";
pub const SPACE_STATUS: HandlerId = "space_status";
pub const ENTRY_EXECUTION: HandlerId = "entry_execution";

/// What the entry execution handler wrote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryReceipt {
    pub vehicle_id: i64,
    pub parking_record_id: i64,
    pub space_id: i64,
    pub license_plate: String,
    pub entry_time: DateTime<Utc>,
}

/// Request threaded through the vehicle entry chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleEntryRequest {
    pub license_plate: String,
    pub space_id: i64,
    /// Filled by the space existence check.
    pub resolved_space: Option<ParkingSpace>,
    /// Filled by entry execution.
    pub entry: Option<EntryReceipt>,
}

impl VehicleEntryRequest {
    pub fn new(license_plate: impl Into<String>, space_id: i64) -> Self {
        Self {
            license_plate: license_plate.into(),
            space_id,
            resolved_space: None,
            entry: None,
        }
    }
}

/// Use the cached space, resolving it when an earlier check was removed.
async fn space_for(
    repo: &dyn ParkingRepository,
    request: &mut VehicleEntryRequest,
) -> AdmissionResult<ParkingSpace> {
    if let Some(space) = &request.resolved_space {
        return Ok(space.clone());
    }
    let space = repo
        .find_space(request.space_id)
        .await?
        .ok_or(AdmissionError::ParkingSpaceNotFound {
            space_id: request.space_id,
        })?;
    request.resolved_space = Some(space.clone());
    Ok(space)
}

pub struct SpaceExistenceHandler {
    repo: Arc<dyn ParkingRepository>,
}

impl SpaceExistenceHandler {
    pub fn new(repo: Arc<dyn ParkingRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AdmissionHandler<VehicleEntryRequest> for SpaceExistenceHandler {
    fn id(&self) -> HandlerId {
        SPACE_EXISTENCE
    }

    fn description(&self) -> &'static str {
        "parking space must exist"
    }

    async fn handle(&self, request: &mut VehicleEntryRequest) -> AdmissionResult<()> {
        request.resolved_space = None;
        space_for(self.repo.as_ref(), request).await.map(|_| ())
    }
}

pub struct DuplicateVehicleHandler {
    repo: Arc<dyn ParkingRepository>,
}

impl DuplicateVehicleHandler {
    pub fn new(repo: Arc<dyn ParkingRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AdmissionHandler<VehicleEntryRequest> for DuplicateVehicleHandler {
    fn id(&self) -> HandlerId {
        DUPLICATE_VEHICLE
    }

    fn description(&self) -> &'static str {
        "vehicle must not already be parked anywhere in the facility"
    }

    async fn handle(&self, request: &mut VehicleEntryRequest) -> AdmissionResult<()> {
        if self
            .repo
            .has_open_parking_record(&request.license_plate)
            .await?
        {
            return Err(AdmissionError::VehicleAlreadyInside {
                license_plate: request.license_plate.clone(),
            });
        }
        Ok(())
    }
}

pub struct SpaceStatusHandler {
    repo: Arc<dyn ParkingRepository>,
}

impl SpaceStatusHandler {
    pub fn new(repo: Arc<dyn ParkingRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AdmissionHandler<VehicleEntryRequest> for SpaceStatusHandler {
    fn id(&self) -> HandlerId {
        SPACE_STATUS
    }

    fn description(&self) -> &'static str {
        "parking space must be free"
    }

    async fn handle(&self, request: &mut VehicleEntryRequest) -> AdmissionResult<()> {
        let space = space_for(self.repo.as_ref(), request).await?;
        if !space.occupied {
            return Ok(());
        }

        let detail = match self.repo.find_occupying_plate(space.space_id).await? {
            Some(plate) => format!(
                "Parking space {} is occupied by {plate}",
                space.space_no
            ),
            None => format!("Parking space {} is occupied", space.space_no),
        };
        Err(AdmissionError::ParkingSpaceOccupied {
            space_id: space.space_id,
            detail,
        })
    }
}

/// Terminal handler: records the entry and marks the space occupied.
pub struct EntryExecutionHandler {
    repo: Arc<dyn ParkingRepository>,
}

impl EntryExecutionHandler {
    pub fn new(repo: Arc<dyn ParkingRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AdmissionHandler<VehicleEntryRequest> for EntryExecutionHandler {
    fn id(&self) -> HandlerId {
        ENTRY_EXECUTION
    }

    fn description(&self) -> &'static str {
        "record the vehicle and its parking stay"
    }

    async fn handle(&self, request: &mut VehicleEntryRequest) -> AdmissionResult<()> {
        let entry_time = Utc::now();
        let mut work = self.repo.begin().await?;
        let vehicle_id = work
            .insert_vehicle(&request.license_plate, entry_time)
            .await?;
        let parking_record_id = work
            .insert_parking_record(
                vehicle_id,
                request.space_id,
                &request.license_plate,
                entry_time,
            )
            .await?;
        work.set_space_occupied(request.space_id, true).await?;
        work.save_changes().await?;

        tracing::info!(
            license_plate = %request.license_plate,
            space_id = request.space_id,
            parking_record_id = parking_record_id,
            "Vehicle admitted"
        );

        request.entry = Some(EntryReceipt {
            vehicle_id,
            parking_record_id,
            space_id: request.space_id,
            license_plate: request.license_plate.clone(),
            entry_time,
        });
        Ok(())
    }
}

pub struct VehicleEntryChainBuilder;

impl VehicleEntryChainBuilder {
    /// Builder pre-loaded with the default vehicle entry handlers.
    pub fn with_default_handlers(
        repo: Arc<dyn ParkingRepository>,
    ) -> ChainBuilder<VehicleEntryRequest> {
        let mut builder = ChainBuilder::new(CHAIN_NAME);
        builder
            .add(SpaceExistenceHandler::new(Arc::clone(&repo)))
            .add(DuplicateVehicleHandler::new(Arc::clone(&repo)))
            .add(SpaceStatusHandler::new(Arc::clone(&repo)))
            .add(EntryExecutionHandler::new(repo));
        builder
    }
}
