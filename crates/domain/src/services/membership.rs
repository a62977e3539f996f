//! Membership lifecycle: logical deactivation of a member.

use super::audit::audit_helpers;
use super::context::CoreContext;
use super::role_policy::can_deactivate;
use crate::error::CoreError;
use crate::models::{Caller, DeactivateMemberRequest, DeactivatedMember};

#[derive(Clone)]
pub struct MembershipService {
    ctx: CoreContext,
}

impl MembershipService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// Deactivate a member and sign them out everywhere.
    ///
    /// The profile flag is authoritative. If signing out fails the member
    /// stays deactivated, the audit entry records `sessions_revoked: false`
    /// and the caller receives `CoreError::Upstream`.
    pub async fn deactivate(
        &self,
        caller: &Caller,
        request: DeactivateMemberRequest,
    ) -> Result<DeactivatedMember, CoreError> {
        let target_id = request
            .target_user_id
            .ok_or_else(|| CoreError::Validation("target_user_id is required".to_string()))?;
        if target_id == caller.user_id {
            return Err(CoreError::Validation(
                "You cannot deactivate your own account".to_string(),
            ));
        }

        let organization_id = caller.organization_id;
        let target = self
            .ctx
            .profiles
            .find_active_by_id(target_id)
            .await?
            .filter(|p| p.organization_id == organization_id)
            .ok_or_else(|| CoreError::NotFound("Member not found".to_string()))?;

        if !can_deactivate(caller.role, target.role) {
            return Err(CoreError::Authorization(format!(
                "A {} cannot deactivate a {}",
                caller.role, target.role
            )));
        }

        if !self.ctx.profiles.deactivate(organization_id, target.id).await? {
            return Err(CoreError::NotFound("Member not found".to_string()));
        }

        let sessions_revoked = match self.ctx.identity.sign_out_user(target.id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    organization_id = %organization_id,
                    user_id = %target.id,
                    error = %e,
                    "Failed to revoke sessions of deactivated member"
                );
                false
            }
        };

        self.ctx
            .audit()
            .record(audit_helpers::user_deactivated(
                organization_id,
                caller.user_id,
                target.id,
                &target.email,
                target.role,
                sessions_revoked,
            ))
            .await;

        tracing::info!(
            organization_id = %organization_id,
            user_id = %target.id,
            role = %target.role,
            deactivated_by = %caller.user_id,
            sessions_revoked,
            "Member deactivated"
        );

        if !sessions_revoked {
            return Err(CoreError::Upstream(format!(
                "{} was deactivated but their sessions could not be revoked",
                target.display_name()
            )));
        }

        Ok(DeactivatedMember {
            user_id: target.id,
            message: format!("{} has been deactivated", target.display_name()),
            sessions_revoked,
        })
    }
}
