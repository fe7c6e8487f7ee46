//! # Venue Reservation Chain
//!
//! Default order: time validity, area existence, occupancy conflict,
//! collaboration existence, capacity. The chain only validates; the caller
//! writes the reservation after it succeeds.

use super::builder::ChainBuilder;
use super::errors::{AdmissionError, AdmissionResult};
use super::handler::{AdmissionHandler, HandlerId};
use crate::data_access::{EventArea, VenueRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const CHAIN_NAME: &str = "venue_reservation";

pub const TIME_VALIDITY: HandlerId = "time_validity";
pub const AREA_EXISTENCE: HandlerId = "area_existence";
pub const OCCUPANCY_CONFLICT: HandlerId = "occupancy_conflict";
pub const COLLABORATION_EXISTENCE: HandlerId = "collaboration_existence";
pub const CAPACITY: HandlerId = "capacity";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueReservationRequest {
    pub collaboration_id: i64,
    pub area_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Capacity is only checked when a headcount is supplied.
    pub expected_headcount: Option<i32>,
    /// Filled by the area existence check.
    pub resolved_area: Option<EventArea>,
}

impl VenueReservationRequest {
    pub fn new(
        collaboration_id: i64,
        area_id: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            collaboration_id,
            area_id,
            start_time,
            end_time,
            expected_headcount: None,
            resolved_area: None,
        }
    }

    pub fn with_expected_headcount(mut self, headcount: i32) -> Self {
        self.expected_headcount = Some(headcount);
        self
    }
}

async fn area_for(
    repo: &dyn VenueRepository,
    request: &mut VenueReservationRequest,
) -> AdmissionResult<EventArea> {
    if let Some(area) = &request.resolved_area {
        return Ok(area.clone());
    }
    let area = repo
        .find_event_area(request.area_id)
        .await?
        .ok_or(AdmissionError::EventAreaNotFound {
            area_id: request.area_id,
        })?;
    request.resolved_area = Some(area.clone());
    Ok(area)
}

pub struct TimeValidityHandler;

#[async_trait]
impl AdmissionHandler<VenueReservationRequest> for TimeValidityHandler {
    fn id(&self) -> HandlerId {
        TIME_VALIDITY
    }

    fn description(&self) -> &'static str {
        "end time must be after start time"
    }

    async fn handle(&self, request: &mut VenueReservationRequest) -> AdmissionResult<()> {
        if request.end_time <= request.start_time {
            return Err(AdmissionError::InvalidTimeRange {
                start: request.start_time,
                end: request.end_time,
            });
        }
        Ok(())
    }
}

pub struct AreaExistenceHandler {
    repo: Arc<dyn VenueRepository>,
}

impl AreaExistenceHandler {
    pub fn new(repo: Arc<dyn VenueRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AdmissionHandler<VenueReservationRequest> for AreaExistenceHandler {
    fn id(&self) -> HandlerId {
        AREA_EXISTENCE
    }

    fn description(&self) -> &'static str {
        "event area must exist"
    }

    async fn handle(&self, request: &mut VenueReservationRequest) -> AdmissionResult<()> {
        request.resolved_area = None;
        area_for(self.repo.as_ref(), request).await.map(|_| ())
    }
}

pub struct OccupancyConflictHandler {
    repo: Arc<dyn VenueRepository>,
}

impl OccupancyConflictHandler {
    pub fn new(repo: Arc<dyn VenueRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AdmissionHandler<VenueReservationRequest> for OccupancyConflictHandler {
    fn id(&self) -> HandlerId {
        OCCUPANCY_CONFLICT
    }

    fn description(&self) -> &'static str {
        "no live reservation may overlap the requested window"
    }

    async fn handle(&self, request: &mut VenueReservationRequest) -> AdmissionResult<()> {
        if self
            .repo
            .has_overlapping_reservation(request.area_id, request.start_time, request.end_time)
            .await?
        {
            return Err(AdmissionError::AreaAlreadyOccupied {
                area_id: request.area_id,
                start: request.start_time,
                end: request.end_time,
            });
        }
        Ok(())
    }
}

pub struct CollaborationExistenceHandler {
    repo: Arc<dyn VenueRepository>,
}

impl CollaborationExistenceHandler {
    pub fn new(repo: Arc<dyn VenueRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AdmissionHandler<VenueReservationRequest> for CollaborationExistenceHandler {
    fn id(&self) -> HandlerId {
        COLLABORATION_EXISTENCE
    }

    fn description(&self) -> &'static str {
        "collaboration partner must exist"
    }

    async fn handle(&self, request: &mut VenueReservationRequest) -> AdmissionResult<()> {
        if !self
            .repo
            .collaboration_exists(request.collaboration_id)
            .await?
        {
            return Err(AdmissionError::CollaborationNotFound {
                collaboration_id: request.collaboration_id,
            });
        }
        Ok(())
    }
}

pub struct CapacityHandler {
    repo: Arc<dyn VenueRepository>,
}

impl CapacityHandler {
    pub fn new(repo: Arc<dyn VenueRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl AdmissionHandler<VenueReservationRequest> for CapacityHandler {
    fn id(&self) -> HandlerId {
        CAPACITY
    }

    fn description(&self) -> &'static str {
        "expected headcount must fit the area"
    }

    async fn handle(&self, request: &mut VenueReservationRequest) -> AdmissionResult<()> {
        let Some(requested) = request.expected_headcount else {
            return Ok(());
        };
        let area = area_for(self.repo.as_ref(), request).await?;
        if requested > area.capacity {
            return Err(AdmissionError::InsufficientCapacity {
                requested,
                capacity: area.capacity,
            });
        }
        Ok(())
    }
}

pub struct VenueReservationChainBuilder;

impl VenueReservationChainBuilder {
    /// Builder pre-loaded with the default venue reservation handlers.
    pub fn with_default_handlers(
        repo: Arc<dyn VenueRepository>,
    ) -> ChainBuilder<VenueReservationRequest> {
        let mut builder = ChainBuilder::new(CHAIN_NAME);
        builder
            .add(TimeValidityHandler)
            .add(AreaExistenceHandler::new(Arc::clone(&repo)))
            .add(OccupancyConflictHandler::new(Arc::clone(&repo)))
            .add(CollaborationExistenceHandler::new(Arc::clone(&repo)))
            .add(CapacityHandler::new(repo));
        builder
    }
}
