use super::{publish_event, publish_history, require_authority};
use crate::config::EquipmentConfig;
use crate::data_access::{AuthorityChecker, AuthorityLevel, DataAccessError, EquipmentRepository};
use crate::error::{PremisesError, Result};
use crate::events::{constants, EventPublisher};
use crate::state_machine::{
    EquipmentContext, EquipmentOperation, EquipmentState, EquipmentType, OperationArgs,
    OperationResult,
};
use chrono::Utc;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// Equipment operations and the repair-order lifecycle
pub struct EquipmentService {
    repo: Arc<dyn EquipmentRepository>,
    authority: Arc<dyn AuthorityChecker>,
    publisher: EventPublisher,
    limits: EquipmentConfig,
}

impl EquipmentService {
    pub const REQUIRED_LEVEL: AuthorityLevel = AuthorityLevel::Staff;

    pub fn new(
        repo: Arc<dyn EquipmentRepository>,
        authority: Arc<dyn AuthorityChecker>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            repo,
            authority,
            publisher,
            limits: EquipmentConfig::default(),
        }
    }

    pub fn with_limits(mut self, limits: EquipmentConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Run `operation` and persist any resulting state change.
    ///
    /// A refused operation comes back as `success == false` with nothing written.
    pub async fn operate(
        &self,
        actor_id: i64,
        equipment_id: i64,
        operation: EquipmentOperation,
        args: &OperationArgs,
    ) -> Result<OperationResult> {
        require_authority(self.authority.as_ref(), actor_id, Self::REQUIRED_LEVEL).await?;

        let mut context = self.load_context(equipment_id).await?;
        let result = context.perform_operation(operation, args)?;
        if result.status_changed {
            self.persist(&context, &result).await?;
        }

        tracing::info!(
            equipment_id = equipment_id,
            operation = %operation,
            success = result.success,
            state = %result.current_state,
            "Equipment operation handled"
        );
        Ok(result)
    }

    /// Close maintenance with the technician's verdict.
    pub async fn report_repair(
        &self,
        actor_id: i64,
        equipment_id: i64,
        successful: bool,
    ) -> Result<OperationResult> {
        let args = OperationArgs {
            repair_successful: Some(successful),
            ..OperationArgs::default()
        };
        self.operate(actor_id, equipment_id, EquipmentOperation::CompleteRepair, &args)
            .await
    }

    /// Operations available right now for this equipment's type and state.
    pub async fn allowed_operations(&self, equipment_id: i64) -> Result<Vec<EquipmentOperation>> {
        Ok(self.load_context(equipment_id).await?.allowed_operations())
    }

    async fn load_context(&self, equipment_id: i64) -> Result<EquipmentContext> {
        let record = self
            .repo
            .find_equipment(equipment_id)
            .await?
            .ok_or_else(|| PremisesError::not_found("equipment", equipment_id))?;
        let equipment_type: EquipmentType = record
            .equipment_type
            .parse()
            .map_err(|reason: String| DataAccessError::invalid_record("equipment", equipment_id, reason))?;

        Ok(
            EquipmentContext::from_persisted(equipment_id, equipment_type, &record.status)?
                .with_limits(self.limits.clone()),
        )
    }

    async fn persist(&self, context: &EquipmentContext, result: &OperationResult) -> Result<()> {
        let equipment_id = context.equipment_id();
        let now = Utc::now();

        let opens_order = (result.previous_state, result.current_state)
            == (EquipmentState::Faulted, EquipmentState::UnderMaintenance);
        if opens_order && self.repo.has_open_repair_order(equipment_id).await? {
            return Err(DataAccessError::Conflict(format!(
                "equipment {equipment_id} already has an open repair order"
            ))
            .into());
        }

        let mut work = self.repo.begin().await?;
        let mut opened_order = None;
        match (result.previous_state, result.current_state) {
            (EquipmentState::Faulted, EquipmentState::UnderMaintenance) => {
                opened_order = Some(
                    work.insert_repair_order(equipment_id, "Repair after fault", now)
                        .await?,
                );
            }
            (EquipmentState::UnderMaintenance, next) => {
                work.close_repair_order(equipment_id, next == EquipmentState::Running, now)
                    .await?;
            }
            _ => {}
        }
        work.update_equipment_status(equipment_id, &context.state_context().persisted_status())
            .await?;
        work.save_changes().await?;

        if let Some(repair_order_id) = opened_order {
            publish_event(
                &self.publisher,
                constants::REPAIR_ORDER_OPENED,
                json!({
                    "equipment_id": equipment_id,
                    "repair_order_id": repair_order_id,
                }),
            )
            .await;
        }
        publish_history(&self.publisher, context.state_context().history()).await;
        Ok(())
    }
}

impl fmt::Debug for EquipmentService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EquipmentService")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}
