//! Account provisioning.
//!
//! Creating an account spans two systems: the identity provider and the
//! profile store. The identity is created first; if the profile insert
//! then fails the identity is deleted again. When that delete fails too the
//! caller gets `CoreError::RollbackFailure` naming the orphaned identity.
//! The writes run on a spawned task so a cancelled request cannot stop
//! between them.

use shared::validation::{
    normalize_email, validate_email_address, validate_full_name, validate_password,
};
use std::future::Future;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::audit::audit_helpers;
use super::context::CoreContext;
use super::identity::NewIdentity;
use super::role_policy::can_provision_directly;
use crate::error::{CoreError, StoreError};
use crate::models::{
    Caller, CreateMemberRequest, NewProfile, Profile, ProfileSummary, ProvisionAccount, Role,
};

const DUPLICATE_MEMBER: &str = "A member with this email already exists in this organization";

#[derive(Clone)]
pub struct ProvisioningService {
    ctx: CoreContext,
}

impl ProvisioningService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// Create a member directly, without an invitation. Creator only.
    pub async fn create_member(
        &self,
        caller: &Caller,
        request: CreateMemberRequest,
    ) -> Result<ProfileSummary, CoreError> {
        if !can_provision_directly(caller.role) {
            return Err(CoreError::Authorization(
                "Only the organization creator can create accounts directly".to_string(),
            ));
        }
        request.validate()?;
        let role = Role::from_str(&request.role).map_err(CoreError::Validation)?;

        let profile = self
            .provision(ProvisionAccount {
                organization_id: caller.organization_id,
                email: request.email,
                password: request.password,
                full_name: request.full_name,
                role,
                created_by: Some(caller.user_id),
            })
            .await?;

        self.ctx
            .audit()
            .record(audit_helpers::user_created(
                caller.organization_id,
                caller.user_id,
                profile.id,
                &profile.email,
                profile.role,
            ))
            .await;

        tracing::info!(
            organization_id = %profile.organization_id,
            user_id = %profile.id,
            role = %profile.role,
            created_by = %caller.user_id,
            "Member account created"
        );

        Ok(profile.into())
    }

    /// Create the identity and its profile as one unit.
    ///
    /// Validation happens before the identity provider is contacted. The
    /// writes run on their own task, so they finish even if the caller
    /// stops waiting.
    pub async fn provision(&self, account: ProvisionAccount) -> Result<Profile, CoreError> {
        let account = self.prepare(account).await?;
        let service = self.clone();
        run_detached(async move { service.create_account(account).await }).await
    }

    /// Validate and normalize `account`, failing fast on an existing member.
    pub(crate) async fn prepare(
        &self,
        account: ProvisionAccount,
    ) -> Result<ProvisionAccount, CoreError> {
        validate_email_address(&account.email)?;
        validate_password(&account.password)?;
        validate_full_name(&account.full_name)?;
        if !account.role.is_assignable() {
            return Err(CoreError::Validation(
                "Role must be 'admin' or 'player'".to_string(),
            ));
        }

        let email = normalize_email(&account.email);
        if self
            .ctx
            .profiles
            .find_active_by_email(account.organization_id, &email)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(DUPLICATE_MEMBER.to_string()));
        }

        Ok(ProvisionAccount {
            email,
            full_name: account.full_name.trim().to_string(),
            ..account
        })
    }

    /// Create the identity, then the profile, deleting the identity again
    /// when the profile insert fails. Expects a prepared account.
    pub(crate) async fn create_account(
        &self,
        account: ProvisionAccount,
    ) -> Result<Profile, CoreError> {
        let user_id = self
            .ctx
            .identity
            .create_user(NewIdentity {
                email: account.email.clone(),
                password: account.password,
                full_name: account.full_name.clone(),
                role: account.role,
                organization_id: account.organization_id,
            })
            .await?;

        let inserted = self
            .ctx
            .profiles
            .insert(NewProfile {
                id: user_id,
                organization_id: account.organization_id,
                role: account.role,
                full_name: Some(account.full_name),
                email: account.email,
                created_by: account.created_by,
            })
            .await;

        match inserted {
            Ok(profile) => Ok(profile),
            Err(e) => {
                let original = match e {
                    StoreError::UniqueViolation(_) => {
                        CoreError::Conflict(DUPLICATE_MEMBER.to_string())
                    }
                    other => CoreError::from(other),
                };
                Err(self.compensate_identity(user_id, original).await)
            }
        }
    }

    /// Delete an identity created by a step that later failed.
    ///
    /// Returns the error the caller should see: `original` when the delete
    /// succeeded, `RollbackFailure` when it did not.
    pub(crate) async fn compensate_identity(&self, user_id: Uuid, original: CoreError) -> CoreError {
        match self.ctx.identity.delete_user(user_id).await {
            Ok(()) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %original,
                    "Rolled back identity after failed provisioning"
                );
                original
            }
            Err(rollback) => {
                tracing::error!(
                    reconcile = true,
                    orphaned_identity = %user_id,
                    original = %original,
                    rollback = %rollback,
                    "Identity rollback failed; manual reconciliation required"
                );
                CoreError::RollbackFailure {
                    original: original.to_string(),
                    rollback: rollback.to_string(),
                    orphaned_identity: user_id,
                }
            }
        }
    }
}

/// Drive a multi-step write to completion on its own task.
///
/// Dropping the returned future (request timeout, client disconnect) does
/// not cancel `task`, so a write is never separated from its compensation.
pub(crate) async fn run_detached<T, F>(task: F) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, CoreError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(task).await.map_err(|e| {
        tracing::error!(error = %e, "Detached write task did not complete");
        CoreError::Upstream("Account setup was interrupted".to_string())
    })?
}
