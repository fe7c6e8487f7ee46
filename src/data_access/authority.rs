//! Permission predicate consumed by the service facades.
//!
//! The state machines and admission chains never check permissions themselves;
//! callers gate access through an [`AuthorityChecker`] before invoking them.

use super::errors::DataAccessResult;
use super::repositories::StaffRepository;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Ordered staff authority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityLevel {
    Staff = 1,
    Manager = 2,
    Administrator = 3,
}

impl AuthorityLevel {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for AuthorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Staff => write!(f, "staff"),
            Self::Manager => write!(f, "manager"),
            Self::Administrator => write!(f, "administrator"),
        }
    }
}

#[async_trait]
pub trait AuthorityChecker: Send + Sync {
    async fn check_authority(
        &self,
        actor_id: i64,
        required_level: AuthorityLevel,
    ) -> DataAccessResult<bool>;
}

/// Grants access when the actor's stored level is at least the required one.
pub struct StaffAuthorityChecker {
    staff: Arc<dyn StaffRepository>,
}

impl StaffAuthorityChecker {
    pub fn new(staff: Arc<dyn StaffRepository>) -> Self {
        Self { staff }
    }
}

impl fmt::Debug for StaffAuthorityChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaffAuthorityChecker").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthorityChecker for StaffAuthorityChecker {
    async fn check_authority(
        &self,
        actor_id: i64,
        required_level: AuthorityLevel,
    ) -> DataAccessResult<bool> {
        let granted = match self.staff.find_staff_level(actor_id).await? {
            Some(level) => level >= required_level.as_i32(),
            None => false,
        };
        tracing::debug!(
            actor_id = actor_id,
            required_level = %required_level,
            granted = granted,
            "Authority check"
        );
        Ok(granted)
    }
}
