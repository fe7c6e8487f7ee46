use super::{publish_event, publish_history, require_authority};
use crate::admission::{AdmissionChain, VenueReservationChainBuilder, VenueReservationRequest};
use crate::data_access::{
    AuthorityChecker, AuthorityLevel, NewReservation, Reservation, VenueRepository,
};
use crate::error::{PremisesError, Result};
use crate::events::{constants, EventPublisher};
use crate::state_machine::{
    SettlementRecord, TransitionRecord, VenueEventContext, VenueEventState,
};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// Venue reservations: admission, lifecycle, settlement
pub struct VenueService {
    repo: Arc<dyn VenueRepository>,
    authority: Arc<dyn AuthorityChecker>,
    publisher: EventPublisher,
    reservation_chain: AdmissionChain<VenueReservationRequest>,
}

impl VenueService {
    pub const RESERVE_LEVEL: AuthorityLevel = AuthorityLevel::Staff;
    pub const APPROVAL_LEVEL: AuthorityLevel = AuthorityLevel::Manager;

    pub fn new(
        repo: Arc<dyn VenueRepository>,
        authority: Arc<dyn AuthorityChecker>,
        publisher: EventPublisher,
    ) -> Result<Self> {
        let reservation_chain =
            VenueReservationChainBuilder::with_default_handlers(Arc::clone(&repo)).build()?;
        Ok(Self {
            repo,
            authority,
            publisher,
            reservation_chain,
        })
    }

    pub fn with_reservation_chain(
        mut self,
        reservation_chain: AdmissionChain<VenueReservationRequest>,
    ) -> Self {
        self.reservation_chain = reservation_chain;
        self
    }

    /// Approving, rejecting and settling need a manager; the rest is front-desk work.
    pub fn required_level_for(target: VenueEventState) -> AuthorityLevel {
        match target {
            VenueEventState::Approved | VenueEventState::Rejected => Self::APPROVAL_LEVEL,
            _ => Self::RESERVE_LEVEL,
        }
    }

    /// Validate the request and store it pending approval.
    pub async fn reserve(
        &self,
        actor_id: i64,
        mut request: VenueReservationRequest,
    ) -> Result<Reservation> {
        require_authority(self.authority.as_ref(), actor_id, Self::RESERVE_LEVEL).await?;

        self.reservation_chain.run(&mut request).await?;

        let status = VenueEventState::PendingApproval.to_string();
        let reservation_id = self
            .repo
            .insert_reservation(NewReservation {
                area_id: request.area_id,
                collaboration_id: request.collaboration_id,
                start_time: request.start_time,
                end_time: request.end_time,
                expected_headcount: request.expected_headcount,
                status: status.clone(),
            })
            .await?;

        tracing::info!(
            reservation_id = reservation_id,
            area_id = request.area_id,
            collaboration_id = request.collaboration_id,
            "Venue reservation created"
        );
        publish_event(
            &self.publisher,
            constants::RESERVATION_CREATED,
            json!({
                "reservation_id": reservation_id,
                "area_id": request.area_id,
                "collaboration_id": request.collaboration_id,
                "start_time": request.start_time,
                "end_time": request.end_time,
                "actor_id": actor_id,
            }),
        )
        .await;

        Ok(Reservation {
            reservation_id,
            area_id: request.area_id,
            collaboration_id: request.collaboration_id,
            start_time: request.start_time,
            end_time: request.end_time,
            expected_headcount: request.expected_headcount,
            status,
            settlement: None,
        })
    }

    pub async fn reservation(&self, reservation_id: i64) -> Result<Reservation> {
        self.repo
            .find_reservation(reservation_id)
            .await?
            .ok_or_else(|| PremisesError::not_found("reservation", reservation_id))
    }

    pub async fn transition_reservation(
        &self,
        actor_id: i64,
        reservation_id: i64,
        target: VenueEventState,
        reason: &str,
    ) -> Result<TransitionRecord<VenueEventState>> {
        require_authority(
            self.authority.as_ref(),
            actor_id,
            Self::required_level_for(target),
        )
        .await?;

        let mut context = self.load_context(reservation_id).await?;
        let record = context.transition_to_state(target, reason)?;
        self.repo
            .update_reservation_status(
                reservation_id,
                &context.state_context().persisted_status(),
            )
            .await?;

        publish_history(&self.publisher, context.state_context().history()).await;
        Ok(record)
    }

    /// Attach the final fees to an ended event.
    pub async fn settle(
        &self,
        actor_id: i64,
        reservation_id: i64,
        venue_fee_cents: i64,
        additional_service_fee_cents: i64,
    ) -> Result<SettlementRecord> {
        require_authority(self.authority.as_ref(), actor_id, Self::APPROVAL_LEVEL).await?;

        let mut context = self.load_context(reservation_id).await?;
        let settlement = context.settle(venue_fee_cents, additional_service_fee_cents)?;
        self.repo.save_settlement(reservation_id, &settlement).await?;

        publish_event(
            &self.publisher,
            constants::RESERVATION_SETTLED,
            json!({
                "reservation_id": reservation_id,
                "total_fee_cents": settlement.total_fee_cents,
                "actor_id": actor_id,
            }),
        )
        .await;
        Ok(settlement)
    }

    async fn load_context(&self, reservation_id: i64) -> Result<VenueEventContext> {
        let reservation = self.reservation(reservation_id).await?;
        Ok(VenueEventContext::from_persisted(
            reservation_id,
            &reservation.status,
            reservation.settlement,
        )?)
    }
}

impl fmt::Debug for VenueService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueService")
            .field("reservation_chain", &self.reservation_chain)
            .finish_non_exhaustive()
    }
}
