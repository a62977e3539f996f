//! Invitation entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Invitation, InvitationStatus, Role};
use domain::StoreError;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the invitations table.
#[derive(Debug, Clone, FromRow)]
pub struct InvitationEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub role: String,
    pub token_hash: String,
    pub invited_by: Uuid,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<InvitationEntity> for Invitation {
    type Error = StoreError;

    fn try_from(entity: InvitationEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            organization_id: entity.organization_id,
            email: entity.email,
            role: Role::from_str(&entity.role).map_err(StoreError::Query)?,
            token_hash: entity.token_hash,
            invited_by: entity.invited_by,
            status: InvitationStatus::from_str(&entity.status).map_err(StoreError::Query)?,
            expires_at: entity.expires_at,
            accepted_at: entity.accepted_at,
            created_at: entity.created_at,
        })
    }
}
