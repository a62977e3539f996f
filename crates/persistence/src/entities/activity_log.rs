//! Activity log entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{ActivityLog, AuditAction, TargetType};
use domain::StoreError;
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the activity_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityLogEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub target_id: Option<Uuid>,
    pub target_type: Option<String>,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ActivityLogEntity> for ActivityLog {
    type Error = StoreError;

    fn try_from(entity: ActivityLogEntity) -> Result<Self, Self::Error> {
        let target_type = entity
            .target_type
            .as_deref()
            .map(TargetType::from_str)
            .transpose()
            .map_err(StoreError::Query)?;
        Ok(Self {
            id: entity.id,
            organization_id: entity.organization_id,
            actor_id: entity.actor_id,
            action: AuditAction::from_str(&entity.action).map_err(StoreError::Query)?,
            target_id: entity.target_id,
            target_type,
            metadata: entity.metadata,
            created_at: entity.created_at,
        })
    }
}
