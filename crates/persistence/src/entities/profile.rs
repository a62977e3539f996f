//! Profile entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Profile, Role};
use domain::StoreError;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the profiles table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub role: String,
    pub full_name: Option<String>,
    pub email: String,
    pub created_by: Option<Uuid>,
    pub is_active: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileEntity> for Profile {
    type Error = StoreError;

    fn try_from(entity: ProfileEntity) -> Result<Self, Self::Error> {
        let role = Role::from_str(&entity.role).map_err(StoreError::Query)?;
        Ok(Self {
            id: entity.id,
            organization_id: entity.organization_id,
            role,
            full_name: entity.full_name,
            email: entity.email,
            created_by: entity.created_by,
            is_active: entity.is_active,
            last_seen_at: entity.last_seen_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}
