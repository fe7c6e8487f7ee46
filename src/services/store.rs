use super::{publish_event, publish_history, require_authority};
use crate::data_access::{
    AuthorityChecker, AuthorityLevel, DataAccessError, StatusApplication, StoreRepository,
};
use crate::error::{PremisesError, Result};
use crate::events::{constants, EventPublisher};
use crate::state_machine::{StatusChangeResult, StoreContext, StoreState};
use chrono::Utc;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// Two-phase store status changes
pub struct StoreService {
    repo: Arc<dyn StoreRepository>,
    authority: Arc<dyn AuthorityChecker>,
    publisher: EventPublisher,
    application_prefix: String,
}

impl StoreService {
    pub const REQUEST_LEVEL: AuthorityLevel = AuthorityLevel::Manager;
    pub const APPROVAL_LEVEL: AuthorityLevel = AuthorityLevel::Administrator;

    pub fn new(
        repo: Arc<dyn StoreRepository>,
        authority: Arc<dyn AuthorityChecker>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            repo,
            authority,
            publisher,
            application_prefix: StoreContext::DEFAULT_APPLICATION_PREFIX.to_string(),
        }
    }

    pub fn with_application_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.application_prefix = prefix.into();
        self
    }

    /// File a change for approval. The store's status is not touched.
    pub async fn request_status_change(
        &self,
        actor_id: i64,
        store_id: i64,
        target: StoreState,
        reason: &str,
    ) -> Result<StatusChangeResult> {
        require_authority(self.authority.as_ref(), actor_id, Self::REQUEST_LEVEL).await?;

        let context = self.load_context(store_id).await?;
        let result = context.request_status_change(target, reason);

        if let Some(application_no) = &result.application_no {
            self.repo
                .insert_status_application(&StatusApplication {
                    application_no: application_no.clone(),
                    store_id,
                    requested_status: target.to_string(),
                    reason: reason.to_string(),
                    requested_by: actor_id,
                    requested_at: Utc::now(),
                    approved: None,
                    resolved_by: None,
                })
                .await?;
            publish_event(
                &self.publisher,
                constants::STATUS_CHANGE_REQUESTED,
                json!({
                    "application_no": application_no,
                    "store_id": store_id,
                    "requested_state": target.to_string(),
                    "actor_id": actor_id,
                }),
            )
            .await;
        }
        Ok(result)
    }

    /// Rule on a pending application, re-validating against the store's current state.
    pub async fn approve_status_change(
        &self,
        actor_id: i64,
        application_no: &str,
        approved: bool,
    ) -> Result<StatusChangeResult> {
        require_authority(self.authority.as_ref(), actor_id, Self::APPROVAL_LEVEL).await?;

        let application = self
            .repo
            .find_status_application(application_no)
            .await?
            .ok_or_else(|| PremisesError::not_found("status_application", application_no))?;
        let target: StoreState = application.requested_status.parse().map_err(|reason: String| {
            DataAccessError::invalid_record("status_application", application_no, reason)
        })?;
        let mut context = self.load_context(application.store_id).await?;

        if !application.is_pending() {
            return Ok(StatusChangeResult {
                success: false,
                message: format!("Application {application_no} was already resolved"),
                application_no: Some(application_no.to_string()),
                current_state: context.current_state(),
                requested_state: target,
            });
        }

        let mut result = context.approve_status_change(approved, target, &application.reason)?;
        let mut work = self.repo.begin().await?;
        if result.success {
            work.update_store_status(
                application.store_id,
                &context.state_context().persisted_status(),
            )
            .await?;
        }
        work.resolve_status_application(application_no, result.success, actor_id)
            .await?;
        work.save_changes().await?;

        if result.success {
            publish_history(&self.publisher, context.state_context().history()).await;
        }
        publish_event(
            &self.publisher,
            constants::STATUS_CHANGE_RESOLVED,
            json!({
                "application_no": application_no,
                "store_id": application.store_id,
                "applied": result.success,
                "actor_id": actor_id,
            }),
        )
        .await;

        result.application_no = Some(application_no.to_string());
        Ok(result)
    }

    async fn load_context(&self, store_id: i64) -> Result<StoreContext> {
        let record = self
            .repo
            .find_store(store_id)
            .await?
            .ok_or_else(|| PremisesError::not_found("store", store_id))?;
        Ok(StoreContext::from_persisted(store_id, &record.status)?
            .with_application_prefix(self.application_prefix.clone()))
    }
}

impl fmt::Debug for StoreService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreService")
            .field("application_prefix", &self.application_prefix)
            .finish_non_exhaustive()
    }
}
