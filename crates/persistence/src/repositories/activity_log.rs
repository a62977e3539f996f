//! Repository for the append-only activity log.

use async_trait::async_trait;
use domain::models::{ActivityLog, NewActivityLog};
use domain::repositories::ActivityLogRepository;
use domain::StoreError;
use sqlx::PgPool;

use crate::entities::ActivityLogEntity;
use crate::error::map_sqlx_error;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct PgActivityLogRepository {
    pool: PgPool,
}

impl PgActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PgActivityLogRepository {
    async fn append(&self, entry: NewActivityLog) -> Result<ActivityLog, StoreError> {
        let timer = QueryTimer::new("activity_logs.append");
        let result = sqlx::query_as::<_, ActivityLogEntity>(
            r#"
            INSERT INTO activity_logs
                (organization_id, actor_id, action, target_id, target_type, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, organization_id, actor_id, action, target_id, target_type,
                      metadata, created_at
            "#,
        )
        .bind(entry.organization_id)
        .bind(entry.actor_id)
        .bind(entry.action.as_str())
        .bind(entry.target_id)
        .bind(entry.target_type.map(|t| t.as_str()))
        .bind(entry.metadata)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result.is_ok());

        ActivityLog::try_from(result.map_err(map_sqlx_error)?)
    }
}
