//! Repository for profile database operations.
//!
//! Uniqueness of active emails per organization is enforced by the
//! `profiles_org_email_active_key` partial index, not by these queries.

use async_trait::async_trait;
use domain::models::{NewProfile, Profile};
use domain::repositories::ProfileRepository;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ProfileEntity;
use crate::error::map_sqlx_error;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_profile(entity: Option<ProfileEntity>) -> Result<Option<Profile>, StoreError> {
    entity.map(Profile::try_from).transpose()
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn find_active_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let timer = QueryTimer::new("profiles.find_active_by_id");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            SELECT id, organization_id, role, full_name, email, created_by, is_active,
                   last_seen_at, created_at, updated_at
            FROM profiles
            WHERE id = $1 AND is_active = true
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result.is_ok());

        into_profile(result.map_err(map_sqlx_error)?)
    }

    async fn find_active_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<Profile>, StoreError> {
        let timer = QueryTimer::new("profiles.find_active_by_email");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            SELECT id, organization_id, role, full_name, email, created_by, is_active,
                   last_seen_at, created_at, updated_at
            FROM profiles
            WHERE organization_id = $1 AND lower(email) = lower($2) AND is_active = true
            "#,
        )
        .bind(organization_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result.is_ok());

        into_profile(result.map_err(map_sqlx_error)?)
    }

    async fn insert(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        let timer = QueryTimer::new("profiles.insert");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            INSERT INTO profiles (id, organization_id, role, full_name, email, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, organization_id, role, full_name, email, created_by, is_active,
                      last_seen_at, created_at, updated_at
            "#,
        )
        .bind(profile.id)
        .bind(profile.organization_id)
        .bind(profile.role.as_str())
        .bind(profile.full_name)
        .bind(profile.email)
        .bind(profile.created_by)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result.is_ok());

        Profile::try_from(result.map_err(map_sqlx_error)?)
    }

    async fn deactivate(&self, organization_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("profiles.deactivate");
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET is_active = false, updated_at = NOW()
            WHERE id = $1 AND organization_id = $2 AND is_active = true
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .execute(&self.pool)
        .await;
        timer.finish(result.is_ok());

        Ok(result.map_err(map_sqlx_error)?.rows_affected() > 0)
    }
}
