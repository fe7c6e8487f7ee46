use super::{publish_history, require_authority};
use crate::data_access::{AuthorityChecker, AuthorityLevel, RetailArea, RetailAreaRepository};
use crate::error::{PremisesError, Result};
use crate::events::EventPublisher;
use crate::state_machine::RetailAreaContext;
use std::fmt;
use std::sync::Arc;

/// Leasing of retail areas
pub struct RetailAreaService {
    repo: Arc<dyn RetailAreaRepository>,
    authority: Arc<dyn AuthorityChecker>,
    publisher: EventPublisher,
}

impl RetailAreaService {
    pub const REQUIRED_LEVEL: AuthorityLevel = AuthorityLevel::Manager;

    pub fn new(
        repo: Arc<dyn RetailAreaRepository>,
        authority: Arc<dyn AuthorityChecker>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            repo,
            authority,
            publisher,
        }
    }

    pub async fn rent(&self, actor_id: i64, area_id: i64, tenant: &str) -> Result<RetailArea> {
        require_authority(self.authority.as_ref(), actor_id, Self::REQUIRED_LEVEL).await?;
        let mut context = self.load_context(area_id).await?;
        context.rent(tenant)?;
        self.persist(&context).await
    }

    pub async fn release(&self, actor_id: i64, area_id: i64) -> Result<RetailArea> {
        require_authority(self.authority.as_ref(), actor_id, Self::REQUIRED_LEVEL).await?;
        let mut context = self.load_context(area_id).await?;
        context.release()?;
        self.persist(&context).await
    }

    /// Reprice a vacant area.
    pub async fn adjust_base_rent(
        &self,
        actor_id: i64,
        area_id: i64,
        base_rent_cents: i64,
    ) -> Result<RetailArea> {
        require_authority(self.authority.as_ref(), actor_id, Self::REQUIRED_LEVEL).await?;
        let mut context = self.load_context(area_id).await?;
        context.adjust_base_rent(base_rent_cents)?;
        self.persist(&context).await
    }

    async fn load_context(&self, area_id: i64) -> Result<RetailAreaContext> {
        let area = self
            .repo
            .find_retail_area(area_id)
            .await?
            .ok_or_else(|| PremisesError::not_found("retail_area", area_id))?;
        Ok(RetailAreaContext::from_persisted(
            area_id,
            area.base_rent_cents,
            &area.status,
            area.tenant,
        )?)
    }

    async fn persist(&self, context: &RetailAreaContext) -> Result<RetailArea> {
        let area = RetailArea {
            area_id: context.area_id(),
            base_rent_cents: context.base_rent_cents(),
            status: context.state_context().persisted_status(),
            tenant: context.tenant().map(str::to_string),
        };
        self.repo.update_retail_area(&area).await?;
        publish_history(&self.publisher, context.state_context().history()).await;
        Ok(area)
    }
}

impl fmt::Debug for RetailAreaService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetailAreaService").finish_non_exhaustive()
    }
}
