//! Repository for invitation database operations.
//!
//! Terminal transitions are single conditional updates on
//! `status = 'pending'`, so exactly one of a concurrent accept and revoke
//! can win. The `invitations_org_email_pending_key` partial index keeps one
//! pending row per (organization, email).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{Invitation, InvitationFilter, InvitationStatus, NewInvitation};
use domain::repositories::InvitationRepository;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::InvitationEntity;
use crate::error::map_sqlx_error;
use crate::metrics::QueryTimer;

const INVITATION_COLUMNS: &str = "id, organization_id, email, role, token_hash, invited_by, \
                                  status, expires_at, accepted_at, created_at";

#[derive(Clone)]
pub struct PgInvitationRepository {
    pool: PgPool,
}

impl PgInvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_invitations(entities: Vec<InvitationEntity>) -> Result<Vec<Invitation>, StoreError> {
    entities.into_iter().map(Invitation::try_from).collect()
}

fn into_invitation(entity: Option<InvitationEntity>) -> Result<Option<Invitation>, StoreError> {
    entity.map(Invitation::try_from).transpose()
}

#[async_trait]
impl InvitationRepository for PgInvitationRepository {
    async fn insert_pending(
        &self,
        invitation: NewInvitation,
        now: DateTime<Utc>,
    ) -> Result<Invitation, StoreError> {
        let timer = QueryTimer::new("invitations.insert_pending");
        let result: Result<InvitationEntity, sqlx::Error> = async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                r#"
                UPDATE invitations
                SET status = 'expired'
                WHERE organization_id = $1 AND lower(email) = lower($2)
                  AND status = 'pending' AND expires_at <= $3
                "#,
            )
            .bind(invitation.organization_id)
            .bind(&invitation.email)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            let row = sqlx::query_as::<_, InvitationEntity>(&format!(
                r#"
                INSERT INTO invitations
                    (organization_id, email, role, token_hash, invited_by, status,
                     expires_at, created_at)
                VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7)
                RETURNING {INVITATION_COLUMNS}
                "#
            ))
            .bind(invitation.organization_id)
            .bind(&invitation.email)
            .bind(invitation.role.as_str())
            .bind(&invitation.token_hash)
            .bind(invitation.invited_by)
            .bind(invitation.expires_at)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok(row)
        }
        .await;
        timer.finish(result.is_ok());

        Invitation::try_from(result.map_err(map_sqlx_error)?)
    }

    async fn find_by_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Invitation>, StoreError> {
        let timer = QueryTimer::new("invitations.find_by_id");
        let result = sqlx::query_as::<_, InvitationEntity>(&format!(
            "SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1 AND organization_id = $2"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result.is_ok());

        into_invitation(result.map_err(map_sqlx_error)?)
    }

    async fn find_live_pending(
        &self,
        organization_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, StoreError> {
        let timer = QueryTimer::new("invitations.find_live_pending");
        let result = sqlx::query_as::<_, InvitationEntity>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM invitations
            WHERE organization_id = $1 AND lower(email) = lower($2)
              AND status = 'pending' AND expires_at > $3
            "#
        ))
        .bind(organization_id)
        .bind(email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result.is_ok());

        into_invitation(result.map_err(map_sqlx_error)?)
    }

    async fn find_redeemable_by_token_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, StoreError> {
        let timer = QueryTimer::new("invitations.find_redeemable_by_token_hash");
        let result = sqlx::query_as::<_, InvitationEntity>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM invitations
            WHERE token_hash = $1 AND status = 'pending' AND expires_at > $2
            "#
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result.is_ok());

        into_invitation(result.map_err(map_sqlx_error)?)
    }

    async fn mark_accepted(
        &self,
        id: Uuid,
        accepted_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("invitations.mark_accepted");
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'accepted', accepted_at = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(accepted_at)
        .execute(&self.pool)
        .await;
        timer.finish(result.is_ok());

        Ok(result.map_err(map_sqlx_error)?.rows_affected() == 1)
    }

    async fn mark_revoked(&self, organization_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("invitations.mark_revoked");
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'revoked'
            WHERE id = $1 AND organization_id = $2 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .execute(&self.pool)
        .await;
        timer.finish(result.is_ok());

        Ok(result.map_err(map_sqlx_error)?.rows_affected() == 1)
    }

    async fn expire_stale(
        &self,
        organization_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let timer = QueryTimer::new("invitations.expire_stale");
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'expired'
            WHERE organization_id = $1 AND status = 'pending' AND expires_at <= $2
            "#,
        )
        .bind(organization_id)
        .bind(now)
        .execute(&self.pool)
        .await;
        timer.finish(result.is_ok());

        let swept = result.map_err(map_sqlx_error)?.rows_affected();
        if swept > 0 {
            tracing::debug!(%organization_id, swept, "Marked stale invitations expired");
        }
        Ok(swept)
    }

    async fn list(
        &self,
        organization_id: Uuid,
        filter: InvitationFilter,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Invitation>, StoreError> {
        let timer = QueryTimer::new("invitations.list");
        let result = match filter {
            InvitationFilter::All => {
                sqlx::query_as::<_, InvitationEntity>(&format!(
                    r#"
                    SELECT {INVITATION_COLUMNS}
                    FROM invitations
                    WHERE organization_id = $1
                    ORDER BY created_at DESC
                    LIMIT $2
                    "#
                ))
                .bind(organization_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            InvitationFilter::Only(InvitationStatus::Pending) => {
                sqlx::query_as::<_, InvitationEntity>(&format!(
                    r#"
                    SELECT {INVITATION_COLUMNS}
                    FROM invitations
                    WHERE organization_id = $1 AND status = 'pending' AND expires_at > $3
                    ORDER BY created_at DESC
                    LIMIT $2
                    "#
                ))
                .bind(organization_id)
                .bind(limit)
                .bind(now)
                .fetch_all(&self.pool)
                .await
            }
            InvitationFilter::Only(InvitationStatus::Expired) => {
                sqlx::query_as::<_, InvitationEntity>(&format!(
                    r#"
                    SELECT {INVITATION_COLUMNS}
                    FROM invitations
                    WHERE organization_id = $1
                      AND (status = 'expired' OR (status = 'pending' AND expires_at <= $3))
                    ORDER BY created_at DESC
                    LIMIT $2
                    "#
                ))
                .bind(organization_id)
                .bind(limit)
                .bind(now)
                .fetch_all(&self.pool)
                .await
            }
            InvitationFilter::Only(status) => {
                sqlx::query_as::<_, InvitationEntity>(&format!(
                    r#"
                    SELECT {INVITATION_COLUMNS}
                    FROM invitations
                    WHERE organization_id = $1 AND status = $3
                    ORDER BY created_at DESC
                    LIMIT $2
                    "#
                ))
                .bind(organization_id)
                .bind(limit)
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
        };
        timer.finish(result.is_ok());

        into_invitations(result.map_err(map_sqlx_error)?)
    }
}
