use super::{publish_event, require_authority};
use crate::admission::{
    AdmissionChain, AdmissionError, EntryReceipt, VehicleEntryChainBuilder, VehicleEntryRequest,
};
use crate::data_access::{AuthorityChecker, AuthorityLevel, ParkingRecord, ParkingRepository};
use crate::error::Result;
use crate::events::{constants, EventPublisher};
use chrono::Utc;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// Vehicle entry and exit
pub struct ParkingService {
    repo: Arc<dyn ParkingRepository>,
    authority: Arc<dyn AuthorityChecker>,
    publisher: EventPublisher,
    entry_chain: AdmissionChain<VehicleEntryRequest>,
}

impl ParkingService {
    pub const REQUIRED_LEVEL: AuthorityLevel = AuthorityLevel::Staff;

    pub fn new(
        repo: Arc<dyn ParkingRepository>,
        authority: Arc<dyn AuthorityChecker>,
        publisher: EventPublisher,
    ) -> Result<Self> {
        let entry_chain = VehicleEntryChainBuilder::with_default_handlers(Arc::clone(&repo)).build()?;
        Ok(Self {
            repo,
            authority,
            publisher,
            entry_chain,
        })
    }

    /// Swap in a customised entry chain.
    pub fn with_entry_chain(mut self, entry_chain: AdmissionChain<VehicleEntryRequest>) -> Self {
        self.entry_chain = entry_chain;
        self
    }

    pub fn entry_chain(&self) -> &AdmissionChain<VehicleEntryRequest> {
        &self.entry_chain
    }

    pub async fn admit_vehicle(
        &self,
        actor_id: i64,
        license_plate: &str,
        space_id: i64,
    ) -> Result<EntryReceipt> {
        require_authority(self.authority.as_ref(), actor_id, Self::REQUIRED_LEVEL).await?;

        let mut request = VehicleEntryRequest::new(license_plate.trim(), space_id);
        self.entry_chain.run(&mut request).await?;
        let receipt = request.entry.ok_or_else(|| AdmissionError::IncompleteChain {
            chain: self.entry_chain.name().to_string(),
        })?;

        publish_event(
            &self.publisher,
            constants::VEHICLE_ENTERED,
            json!({
                "license_plate": receipt.license_plate,
                "space_id": receipt.space_id,
                "parking_record_id": receipt.parking_record_id,
                "entry_time": receipt.entry_time,
                "actor_id": actor_id,
            }),
        )
        .await;
        Ok(receipt)
    }

    /// Close the vehicle's open stay and free its space.
    pub async fn release_vehicle(&self, actor_id: i64, license_plate: &str) -> Result<ParkingRecord> {
        require_authority(self.authority.as_ref(), actor_id, Self::REQUIRED_LEVEL).await?;

        let license_plate = license_plate.trim();
        let record = self
            .repo
            .find_open_parking_record(license_plate)
            .await?
            .ok_or_else(|| AdmissionError::VehicleNotInside {
                license_plate: license_plate.to_string(),
            })?;

        let exit_time = Utc::now();
        let mut work = self.repo.begin().await?;
        work.close_parking_record(record.record_id, exit_time)
            .await?;
        work.set_space_occupied(record.space_id, false).await?;
        work.save_changes().await?;

        tracing::info!(
            license_plate = %license_plate,
            space_id = record.space_id,
            "Vehicle released"
        );
        publish_event(
            &self.publisher,
            constants::VEHICLE_EXITED,
            json!({
                "license_plate": license_plate,
                "space_id": record.space_id,
                "parking_record_id": record.record_id,
                "exit_time": exit_time,
                "actor_id": actor_id,
            }),
        )
        .await;

        Ok(ParkingRecord {
            exit_time: Some(exit_time),
            ..record
        })
    }
}

impl fmt::Debug for ParkingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParkingService")
            .field("entry_chain", &self.entry_chain)
            .finish_non_exhaustive()
    }
}
