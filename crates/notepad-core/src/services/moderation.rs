use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::require_admin;
use crate::domain::User;
use crate::error::DomainError;
use crate::pagination::{Page, PageRequest};
use crate::ports::{UserFilter, UserRepository};

/// The user-management panel: listing, blocking and role changes.
pub struct ModerationService {
    users: Arc<dyn UserRepository>,
}

impl ModerationService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn list_users(
        &self,
        actor: &User,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Page<User>, DomainError> {
        require_admin(actor)?;
        Ok(self.users.list(filter, page).await?)
    }

    pub async fn get_user(&self, actor: &User, id: Uuid) -> Result<User, DomainError> {
        require_admin(actor)?;
        self.load(id).await
    }

    pub async fn block(
        &self,
        actor: &User,
        target_id: Uuid,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<User, DomainError> {
        let mut target = self.load_other(actor, target_id).await?;
        target.block_until(until, now)?;

        let target = self.users.update(target).await?;
        tracing::info!(actor_id = %actor.id, user_id = %target.id, %until, "User blocked");
        Ok(target)
    }

    pub async fn unblock(
        &self,
        actor: &User,
        target_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<User, DomainError> {
        let mut target = self.load_other(actor, target_id).await?;
        target.unblock(now);

        let target = self.users.update(target).await?;
        tracing::info!(actor_id = %actor.id, user_id = %target.id, "User unblocked");
        Ok(target)
    }

    pub async fn toggle_role(
        &self,
        actor: &User,
        target_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<User, DomainError> {
        let mut target = self.load_other(actor, target_id).await?;
        target.toggle_role(now);

        let target = self.users.update(target).await?;
        tracing::info!(actor_id = %actor.id, user_id = %target.id, role = %target.role, "User role changed");
        Ok(target)
    }

    /// Clear lapsed block stamps. Run periodically by the scheduler.
    pub async fn sweep_expired_blocks(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let cleared = self.users.clear_expired_blocks(now).await?;
        if cleared > 0 {
            tracing::info!(cleared, "Cleared expired user blocks");
        }
        Ok(cleared)
    }

    async fn load(&self, id: Uuid) -> Result<User, DomainError> {
        self.users.find_by_id(id).await?.ok_or(DomainError::NotFound {
            entity_type: "User",
            id,
        })
    }

    async fn load_other(&self, actor: &User, target_id: Uuid) -> Result<User, DomainError> {
        require_admin(actor)?;
        if actor.id == target_id {
            return Err(DomainError::Forbidden(
                "Administrators cannot moderate their own account".to_string(),
            ));
        }
        self.load(target_id).await
    }
}
