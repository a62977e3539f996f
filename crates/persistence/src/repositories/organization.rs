//! Repository for organization lookups.

use async_trait::async_trait;
use domain::models::Organization;
use domain::repositories::OrganizationRepository;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::OrganizationEntity;
use crate::error::map_sqlx_error;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct PgOrganizationRepository {
    pool: PgPool,
}

impl PgOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        let timer = QueryTimer::new("organizations.find_by_id");
        let result = sqlx::query_as::<_, OrganizationEntity>(
            r#"
            SELECT id, name, slug, created_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result.is_ok());

        Ok(result.map_err(map_sqlx_error)?.map(Organization::from))
    }
}
