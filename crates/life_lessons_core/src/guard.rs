//! crates/life_lessons_core/src/guard.rs
//!
//! Per-resource ownership checks for lessons and comments.

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult};
use crate::domain::ResourceKind;
use crate::ports::{ContentStore, PortError};

#[derive(Clone)]
pub struct OwnershipGuard {
    content: Arc<dyn ContentStore>,
}

impl OwnershipGuard {
    pub fn new(content: Arc<dyn ContentStore>) -> Self {
        Self { content }
    }

    /// Reports whether `account_id` owns the resource.
    ///
    /// `Ok(false)` is an ordinary answer, not a fault. A malformed or unknown
    /// id fails with `AuthError::NotFound`.
    pub async fn check_ownership(
        &self,
        account_id: Uuid,
        resource_id: &str,
        kind: ResourceKind,
    ) -> AuthResult<bool> {
        let id = parse_resource_id(resource_id, kind)?;

        let owner_id = match kind {
            ResourceKind::Lesson => self.content.get_lesson(id).await.map(|l| l.owner_id),
            ResourceKind::Comment => self.content.get_comment(id).await.map(|c| c.owner_id),
        }
        .map_err(|e| match e {
            PortError::NotFound(_) => AuthError::NotFound(format!("{kind} {resource_id}")),
            other => AuthError::Store(other),
        })?;

        Ok(owner_id == account_id)
    }
}

pub fn parse_resource_id(raw: &str, kind: ResourceKind) -> AuthResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AuthError::NotFound(format!("{kind} {raw}")))
}
