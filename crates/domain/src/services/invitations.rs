//! Invitation lifecycle: issue, list, revoke and redeem.
//!
//! ```text
//! pending --redeem--> accepted
//! pending --revoke--> revoked
//! pending --(expires_at passes)--> expired   (derived on read)
//! ```
//!
//! The token is the only credential for redemption. It is handed out once,
//! inside the invite URL, and only its SHA-256 digest is stored.

use chrono::{Duration, Utc};
use shared::crypto::{generate_invitation_token, hash_invitation_token};
use shared::validation::{normalize_email, validate_expires_hours};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::audit::audit_helpers;
use super::context::CoreContext;
use super::provisioning::{run_detached, ProvisioningService};
use super::role_policy::{can_assign_role, can_invite};
use crate::error::{CoreError, StoreError};
use crate::models::{
    AcceptInvitationRequest, AcceptedInvitation, Caller, CreateInvitationRequest, Invitation,
    InvitationResponse, InvitationStatus, ListInvitationsQuery, NewInvitation, Profile,
    ProvisionAccount, RevokeOutcome, Role,
};

const PENDING_EXISTS: &str = "A pending invitation already exists for this email";

/// Settings for issuing invitations.
#[derive(Debug, Clone)]
pub struct InvitationSettings {
    /// Public base URL of the web client, without a trailing slash.
    pub site_url: String,
    /// Lifetime used when a request does not choose one.
    pub default_expires_hours: u32,
}

impl InvitationSettings {
    pub fn invite_url(&self, token: &str) -> String {
        format!(
            "{}/invite/accept?token={}",
            self.site_url.trim_end_matches('/'),
            token
        )
    }
}

#[derive(Clone)]
pub struct InvitationService {
    ctx: CoreContext,
    provisioning: ProvisioningService,
    settings: InvitationSettings,
}

impl InvitationService {
    pub fn new(ctx: CoreContext, settings: InvitationSettings) -> Self {
        let provisioning = ProvisioningService::new(ctx.clone());
        Self {
            ctx,
            provisioning,
            settings,
        }
    }

    fn require_inviter(caller: &Caller) -> Result<(), CoreError> {
        if can_invite(caller.role) {
            Ok(())
        } else {
            Err(CoreError::Authorization(
                "Only creators and admins can manage invitations".to_string(),
            ))
        }
    }

    /// Issue a pending invitation and return it with its invite URL.
    pub async fn issue(
        &self,
        caller: &Caller,
        request: CreateInvitationRequest,
    ) -> Result<InvitationResponse, CoreError> {
        Self::require_inviter(caller)?;
        request.validate()?;
        let role = Role::from_str(&request.role).map_err(CoreError::Validation)?;
        if !can_assign_role(caller.role, role) {
            return Err(CoreError::Authorization(format!(
                "A {} cannot invite a {}",
                caller.role, role
            )));
        }
        let expires_hours = request
            .expires_hours
            .unwrap_or(self.settings.default_expires_hours);
        validate_expires_hours(expires_hours)?;

        let organization_id = caller.organization_id;
        let email = normalize_email(&request.email);

        if self
            .ctx
            .organizations
            .find_by_id(organization_id)
            .await?
            .is_none()
        {
            return Err(CoreError::NotFound("Organization not found".to_string()));
        }

        if self
            .ctx
            .profiles
            .find_active_by_email(organization_id, &email)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(
                "This person is already a member of the organization".to_string(),
            ));
        }

        let now = Utc::now();
        if self
            .ctx
            .invitations
            .find_live_pending(organization_id, &email, now)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(PENDING_EXISTS.to_string()));
        }

        let token = generate_invitation_token();
        let invitation = self
            .ctx
            .invitations
            .insert_pending(
                NewInvitation {
                    organization_id,
                    email,
                    role,
                    token_hash: hash_invitation_token(&token),
                    invited_by: caller.user_id,
                    expires_at: now + Duration::hours(i64::from(expires_hours)),
                },
                now,
            )
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => CoreError::Conflict(PENDING_EXISTS.to_string()),
                other => other.into(),
            })?;

        self.ctx
            .audit()
            .record(audit_helpers::invitation_sent(
                organization_id,
                caller.user_id,
                invitation.id,
                &invitation.email,
                invitation.role,
                expires_hours,
            ))
            .await;

        tracing::info!(
            organization_id = %organization_id,
            invitation_id = %invitation.id,
            role = %invitation.role,
            invited_by = %caller.user_id,
            expires_at = %invitation.expires_at,
            "Invitation issued"
        );

        Ok(InvitationResponse::from_invitation(&invitation, now)
            .with_invite_url(self.settings.invite_url(&token)))
    }

    /// Most recent invitations of the caller's organization.
    pub async fn list(
        &self,
        caller: &Caller,
        query: ListInvitationsQuery,
    ) -> Result<Vec<InvitationResponse>, CoreError> {
        Self::require_inviter(caller)?;
        let filter = query.filter().map_err(CoreError::Validation)?;
        let now = Utc::now();

        match self
            .ctx
            .invitations
            .expire_stale(caller.organization_id, now)
            .await
        {
            Ok(0) => {}
            Ok(corrected) => tracing::debug!(
                organization_id = %caller.organization_id,
                corrected,
                "Corrected stale invitations to expired"
            ),
            Err(e) => tracing::warn!(
                organization_id = %caller.organization_id,
                error = %e,
                "Failed to correct stale invitations"
            ),
        }

        let invitations = self
            .ctx
            .invitations
            .list(caller.organization_id, filter, query.limit(), now)
            .await?;

        Ok(invitations
            .iter()
            .map(|i| InvitationResponse::from_invitation(i, now))
            .collect())
    }

    /// Revoke a pending invitation. Revoking twice is a no-op.
    pub async fn revoke(
        &self,
        caller: &Caller,
        invitation_id: Uuid,
    ) -> Result<RevokeOutcome, CoreError> {
        Self::require_inviter(caller)?;
        let organization_id = caller.organization_id;

        let invitation = self
            .ctx
            .invitations
            .find_by_id(organization_id, invitation_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Invitation not found".to_string()))?;

        match invitation.effective_status(Utc::now()) {
            InvitationStatus::Revoked => return Ok(RevokeOutcome::AlreadyRevoked),
            InvitationStatus::Accepted => {
                return Err(CoreError::Conflict(
                    "Invitation has already been accepted".to_string(),
                ))
            }
            InvitationStatus::Expired => {
                return Err(CoreError::Conflict("Invitation has expired".to_string()))
            }
            InvitationStatus::Pending => {}
        }

        if !self
            .ctx
            .invitations
            .mark_revoked(organization_id, invitation_id)
            .await?
        {
            // Lost a race with a concurrent redeem or revoke.
            let current = self
                .ctx
                .invitations
                .find_by_id(organization_id, invitation_id)
                .await?;
            return match current.map(|i| i.status) {
                Some(InvitationStatus::Revoked) => Ok(RevokeOutcome::AlreadyRevoked),
                _ => Err(CoreError::Conflict(
                    "Invitation is no longer pending".to_string(),
                )),
            };
        }

        self.ctx
            .audit()
            .record(audit_helpers::invitation_revoked(
                organization_id,
                caller.user_id,
                invitation_id,
                &invitation.email,
            ))
            .await;

        tracing::info!(
            organization_id = %organization_id,
            invitation_id = %invitation_id,
            revoked_by = %caller.user_id,
            "Invitation revoked"
        );

        Ok(RevokeOutcome::Revoked)
    }

    /// Exchange a token plus credentials for a new profile.
    ///
    /// The profile insert happens before the invitation is marked accepted.
    /// If the conditional accept loses to a concurrent revoke the new
    /// profile and identity are undone.
    pub async fn redeem(
        &self,
        request: AcceptInvitationRequest,
    ) -> Result<AcceptedInvitation, CoreError> {
        request.validate()?;

        let invitation = self
            .ctx
            .invitations
            .find_redeemable_by_token_hash(&hash_invitation_token(&request.token), Utc::now())
            .await?
            .ok_or_else(|| {
                CoreError::NotFound("Invitation not found or has expired".to_string())
            })?;

        let account = self
            .provisioning
            .prepare(ProvisionAccount {
                organization_id: invitation.organization_id,
                email: invitation.email.clone(),
                password: request.password,
                full_name: request.full_name,
                role: invitation.role,
                created_by: Some(invitation.invited_by),
            })
            .await?;

        let service = self.clone();
        run_detached(async move { service.complete_redemption(invitation, account).await }).await
    }

    /// Provision the invited account and mark the invitation accepted.
    ///
    /// The profile insert strictly precedes the status update.
    async fn complete_redemption(
        &self,
        invitation: Invitation,
        account: ProvisionAccount,
    ) -> Result<AcceptedInvitation, CoreError> {
        let profile = self.provisioning.create_account(account).await?;

        if !self
            .ctx
            .invitations
            .mark_accepted(invitation.id, Utc::now())
            .await?
        {
            let original = CoreError::Conflict("Invitation is no longer pending".to_string());
            return Err(self.undo_redemption(&invitation, &profile, original).await);
        }

        self.ctx
            .audit()
            .record(audit_helpers::invitation_accepted(
                invitation.organization_id,
                profile.id,
                invitation.id,
                &profile.email,
                profile.role,
            ))
            .await;

        tracing::info!(
            organization_id = %invitation.organization_id,
            invitation_id = %invitation.id,
            user_id = %profile.id,
            role = %profile.role,
            "Invitation accepted"
        );

        Ok(AcceptedInvitation {
            email: profile.email,
            profile_id: profile.id,
        })
    }

    async fn undo_redemption(
        &self,
        invitation: &Invitation,
        profile: &Profile,
        original: CoreError,
    ) -> CoreError {
        if let Err(e) = self
            .ctx
            .profiles
            .deactivate(invitation.organization_id, profile.id)
            .await
        {
            tracing::error!(
                reconcile = true,
                orphaned_identity = %profile.id,
                invitation_id = %invitation.id,
                error = %e,
                "Failed to deactivate profile of a lost redemption; manual reconciliation required"
            );
            return CoreError::RollbackFailure {
                original: original.to_string(),
                rollback: e.to_string(),
                orphaned_identity: profile.id,
            };
        }
        self.provisioning
            .compensate_identity(profile.id, original)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditAction, Organization};
    use crate::repositories::MockStore;
    use crate::services::identity::MockIdentityProvider;
    use std::sync::Arc;

    const SITE_URL: &str = "https://roster.test";

    struct Harness {
        store: Arc<MockStore>,
        identity: Arc<MockIdentityProvider>,
        service: InvitationService,
        org: Organization,
        creator: Caller,
        admin: Caller,
        player: Caller,
    }

    fn harness() -> Harness {
        let store = Arc::new(MockStore::new());
        let identity = Arc::new(MockIdentityProvider::new());
        let org = store.seed_organization("Club", "club");
        let creator = Caller::from(&store.seed_profile(org.id, Role::Creator, "owner@club.test"));
        let admin = Caller::from(&store.seed_profile(org.id, Role::Admin, "admin@club.test"));
        let player = Caller::from(&store.seed_profile(org.id, Role::Player, "player@club.test"));
        let service = InvitationService::new(
            CoreContext::with_mocks(store.clone(), identity.clone()),
            InvitationSettings {
                site_url: format!("{}/", SITE_URL),
                default_expires_hours: 72,
            },
        );
        Harness {
            store,
            identity,
            service,
            org,
            creator,
            admin,
            player,
        }
    }

    fn invite(email: &str, role: &str, hours: Option<u32>) -> CreateInvitationRequest {
        CreateInvitationRequest {
            email: email.to_string(),
            role: role.to_string(),
            expires_hours: hours,
        }
    }

    fn accept(token: &str) -> AcceptInvitationRequest {
        AcceptInvitationRequest {
            token: token.to_string(),
            password: "12345678".to_string(),
            full_name: "New Player".to_string(),
        }
    }

    fn token_of(response: &InvitationResponse) -> String {
        let url = response.invite_url.clone().unwrap();
        url.split("token=").nth(1).unwrap().to_string()
    }

    fn stale_invitation(h: &Harness, email: &str, token: &str) -> Invitation {
        let now = Utc::now();
        Invitation {
            id: Uuid::new_v4(),
            organization_id: h.org.id,
            email: email.to_string(),
            role: Role::Player,
            token_hash: hash_invitation_token(token),
            invited_by: h.creator.user_id,
            status: InvitationStatus::Pending,
            expires_at: now - Duration::hours(1),
            accepted_at: None,
            created_at: now - Duration::hours(25),
        }
    }

    #[tokio::test]
    async fn test_issue_and_redeem_scenario() {
        let h = harness();

        let issued = h
            .service
            .issue(&h.creator, invite("A@X.com", "player", Some(24)))
            .await
            .unwrap();
        assert_eq!(issued.status, InvitationStatus::Pending);
        assert_eq!(issued.email, "a@x.com");
        assert!(issued
            .invite_url
            .as_deref()
            .unwrap()
            .starts_with("https://roster.test/invite/accept?token="));
        let lifetime = issued.expires_at - issued.created_at;
        assert_eq!(lifetime, Duration::hours(24));

        let token = token_of(&issued);
        let stored = h.store.invitation(issued.id).unwrap();
        assert_ne!(stored.token_hash, token);
        assert_eq!(stored.token_hash, hash_invitation_token(&token));

        let accepted = h.service.redeem(accept(&token)).await.unwrap();
        assert_eq!(accepted.email, "a@x.com");

        let profile = h.store.profile(accepted.profile_id).unwrap();
        assert_eq!(profile.role, Role::Player);
        assert_eq!(profile.created_by, Some(h.creator.user_id));
        let stored = h.store.invitation(issued.id).unwrap();
        assert_eq!(stored.status, InvitationStatus::Accepted);
        assert!(stored.accepted_at.is_some());

        let again = h.service.redeem(accept(&token)).await.unwrap_err();
        assert!(matches!(again, CoreError::NotFound(_)));

        let actions: Vec<_> = h.store.activity_logs().iter().map(|l| l.action).collect();
        assert_eq!(
            actions,
            vec![AuditAction::InvitationSent, AuditAction::InvitationAccepted]
        );
        let accepted_log = &h.store.activity_logs()[1];
        assert_eq!(accepted_log.actor_id, Some(profile.id));
    }

    #[tokio::test]
    async fn test_issue_default_expiry() {
        let h = harness();
        let issued = h
            .service
            .issue(&h.admin, invite("b@x.com", "player", None))
            .await
            .unwrap();
        assert_eq!(issued.expires_at - issued.created_at, Duration::hours(72));
    }

    #[tokio::test]
    async fn test_admin_may_invite_admin_but_not_creator() {
        let h = harness();
        assert!(h
            .service
            .issue(&h.admin, invite("c@x.com", "admin", None))
            .await
            .is_ok());

        let err = h
            .service
            .issue(&h.admin, invite("d@x.com", "creator", None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(_) | CoreError::Authorization(_)
        ));
    }

    #[tokio::test]
    async fn test_player_cannot_invite() {
        let h = harness();
        let err = h
            .service
            .issue(&h.player, invite("e@x.com", "player", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Authorization(_)));
        assert!(h.store.invitations().is_empty());
    }

    #[tokio::test]
    async fn test_issue_rejects_bad_input() {
        let h = harness();
        for request in [
            invite("not-an-email", "player", None),
            invite("f@x.com", "player", Some(12)),
            invite("f@x.com", "superuser", None),
        ] {
            let err = h.service.issue(&h.creator, request).await.unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)), "{err:?}");
        }
        assert!(h.store.invitations().is_empty());
    }

    #[tokio::test]
    async fn test_issue_conflicts() {
        let h = harness();
        let err = h
            .service
            .issue(&h.creator, invite("player@club.test", "player", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        h.service
            .issue(&h.creator, invite("g@x.com", "player", None))
            .await
            .unwrap();
        let err = h
            .service
            .issue(&h.admin, invite("G@x.com", "admin", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_reissue_after_expiry_corrects_stale_row() {
        let h = harness();
        let stale = stale_invitation(&h, "h@x.com", "old-token");
        h.store.seed_invitation(stale.clone());

        let fresh = h
            .service
            .issue(&h.creator, invite("h@x.com", "player", None))
            .await
            .unwrap();

        assert_eq!(fresh.status, InvitationStatus::Pending);
        assert_eq!(
            h.store.invitation(stale.id).unwrap().status,
            InvitationStatus::Expired
        );
    }

    #[tokio::test]
    async fn test_expired_invitation_never_redeemable() {
        let h = harness();
        h.store
            .seed_invitation(stale_invitation(&h, "i@x.com", "expired-token"));

        let err = h.service.redeem(accept("expired-token")).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert_eq!(h.identity.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_redeem_unknown_token_not_found() {
        let h = harness();
        let err = h.service.redeem(accept("nope")).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_redeem_validates_before_lookup() {
        let h = harness();
        let mut request = accept("whatever");
        request.password = "short".to_string();
        assert!(matches!(
            h.service.redeem(request).await,
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_redeem_conflicts_with_existing_member() {
        let h = harness();
        let issued = h
            .service
            .issue(&h.creator, invite("j@x.com", "player", None))
            .await
            .unwrap();
        h.store.seed_profile(h.org.id, Role::Player, "j@x.com");

        let err = h.service.redeem(accept(&token_of(&issued))).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(h.identity.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_redeem_losing_to_revoke_is_compensated() {
        let h = harness();
        let issued = h
            .service
            .issue(&h.creator, invite("k@x.com", "player", None))
            .await
            .unwrap();
        h.store.set_revoke_before_accept(true);

        let err = h.service.redeem(accept(&token_of(&issued))).await.unwrap_err();

        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(h.identity.account_count(), 0);
        assert!(h
            .store
            .profiles()
            .iter()
            .all(|p| p.email != "k@x.com" || !p.is_active));
        assert_eq!(
            h.store.invitation(issued.id).unwrap().status,
            InvitationStatus::Revoked
        );
    }

    #[tokio::test]
    async fn test_redeem_compensation_failure_is_rollback_failure() {
        let h = harness();
        let issued = h
            .service
            .issue(&h.creator, invite("l@x.com", "player", None))
            .await
            .unwrap();
        h.store.set_revoke_before_accept(true);
        h.identity.set_fail_delete(true);

        let err = h.service.redeem(accept(&token_of(&issued))).await.unwrap_err();
        assert!(matches!(err, CoreError::RollbackFailure { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redeem_single_winner() {
        let h = harness();
        let issued = h
            .service
            .issue(&h.creator, invite("m@x.com", "player", None))
            .await
            .unwrap();
        let token = token_of(&issued);

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let service = h.service.clone();
                let token = token.clone();
                tokio::spawn(async move { service.redeem(accept(&token)).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(e) => assert!(
                    matches!(e, CoreError::Conflict(_) | CoreError::NotFound(_)),
                    "{e:?}"
                ),
            }
        }

        assert_eq!(successes, 1);
        let active = h
            .store
            .profiles()
            .into_iter()
            .filter(|p| p.email == "m@x.com" && p.is_active)
            .count();
        assert_eq!(active, 1);
        assert_eq!(
            h.store.invitation(issued.id).unwrap().status,
            InvitationStatus::Accepted
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_provision_and_redeem_single_winner() {
        let h = harness();
        let provisioning = ProvisioningService::new(CoreContext::with_mocks(
            h.store.clone(),
            h.identity.clone(),
        ));

        for round in 0..8 {
            let email = format!("race{round}@x.com");
            let issued = h
                .service
                .issue(&h.creator, invite(&email, "player", None))
                .await
                .unwrap();
            let token = token_of(&issued);
            let accounts_before = h.identity.account_count();

            let redeem = {
                let service = h.service.clone();
                tokio::spawn(async move { service.redeem(accept(&token)).await })
            };
            let direct = {
                let provisioning = provisioning.clone();
                let account = ProvisionAccount {
                    organization_id: h.org.id,
                    email: email.clone(),
                    password: "password1".to_string(),
                    full_name: "Direct Player".to_string(),
                    role: Role::Player,
                    created_by: Some(h.creator.user_id),
                };
                tokio::spawn(async move { provisioning.provision(account).await })
            };

            let redeemed = redeem.await.unwrap();
            let provisioned = direct.await.unwrap();
            match (&redeemed, &provisioned) {
                (Ok(_), Err(CoreError::Conflict(_))) => assert_eq!(
                    h.store.invitation(issued.id).unwrap().status,
                    InvitationStatus::Accepted
                ),
                (Err(CoreError::Conflict(_)), Ok(_)) => assert_eq!(
                    h.store.invitation(issued.id).unwrap().status,
                    InvitationStatus::Pending
                ),
                other => panic!("expected exactly one winner, got {other:?}"),
            }

            let active = h
                .store
                .profiles()
                .into_iter()
                .filter(|p| p.email == email && p.is_active)
                .count();
            assert_eq!(active, 1);
            // The loser's identity, if it got that far, was deleted again.
            assert_eq!(h.identity.account_count(), accounts_before + 1);
        }
    }

    #[tokio::test]
    async fn test_revoke_pending_then_again() {
        let h = harness();
        let issued = h
            .service
            .issue(&h.creator, invite("n@x.com", "player", None))
            .await
            .unwrap();

        assert_eq!(
            h.service.revoke(&h.admin, issued.id).await.unwrap(),
            RevokeOutcome::Revoked
        );
        assert_eq!(
            h.service.revoke(&h.admin, issued.id).await.unwrap(),
            RevokeOutcome::AlreadyRevoked
        );

        let revoked_entries = h
            .store
            .activity_logs()
            .iter()
            .filter(|l| l.action == AuditAction::InvitationRevoked)
            .count();
        assert_eq!(revoked_entries, 1);

        let err = h.service.redeem(accept(&token_of(&issued))).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_revoke_terminal_states_conflict() {
        let h = harness();
        let issued = h
            .service
            .issue(&h.creator, invite("o@x.com", "player", None))
            .await
            .unwrap();
        h.service.redeem(accept(&token_of(&issued))).await.unwrap();
        assert!(matches!(
            h.service.revoke(&h.creator, issued.id).await,
            Err(CoreError::Conflict(_))
        ));

        let stale = stale_invitation(&h, "p@x.com", "stale");
        h.store.seed_invitation(stale.clone());
        assert!(matches!(
            h.service.revoke(&h.creator, stale.id).await,
            Err(CoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_revoke_authorization_and_scope() {
        let h = harness();
        let issued = h
            .service
            .issue(&h.creator, invite("q@x.com", "player", None))
            .await
            .unwrap();

        assert!(matches!(
            h.service.revoke(&h.player, issued.id).await,
            Err(CoreError::Authorization(_))
        ));

        let other_org = h.store.seed_organization("Other", "other");
        let outsider =
            Caller::from(&h.store.seed_profile(other_org.id, Role::Creator, "x@other.test"));
        assert!(matches!(
            h.service.revoke(&outsider, issued.id).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            h.service.revoke(&h.creator, Uuid::new_v4()).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_reports_effective_status() {
        let h = harness();
        let stale = stale_invitation(&h, "r@x.com", "stale");
        h.store.seed_invitation(stale.clone());
        let fresh = h
            .service
            .issue(&h.creator, invite("s@x.com", "admin", None))
            .await
            .unwrap();

        let all = h
            .service
            .list(&h.admin, ListInvitationsQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, fresh.id);
        assert_eq!(all[1].status, InvitationStatus::Expired);
        assert!(all.iter().all(|i| i.invite_url.is_none()));
        assert_eq!(
            h.store.invitation(stale.id).unwrap().status,
            InvitationStatus::Expired
        );

        let pending = h
            .service
            .list(
                &h.admin,
                ListInvitationsQuery {
                    status: Some("pending".to_string()),
                    limit: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, fresh.id);
    }

    #[tokio::test]
    async fn test_list_requires_inviter_and_valid_filter() {
        let h = harness();
        assert!(matches!(
            h.service.list(&h.player, ListInvitationsQuery::default()).await,
            Err(CoreError::Authorization(_))
        ));
        assert!(matches!(
            h.service
                .list(
                    &h.admin,
                    ListInvitationsQuery {
                        status: Some("bogus".to_string()),
                        limit: None
                    }
                )
                .await,
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_issue() {
        let h = harness();
        h.store.set_fail_activity_log(true);
        assert!(h
            .service
            .issue(&h.creator, invite("t@x.com", "player", None))
            .await
            .is_ok());
        assert!(h.store.activity_logs().is_empty());
    }

    #[test]
    fn test_invite_url_trims_trailing_slash() {
        let settings = InvitationSettings {
            site_url: "https://a.test/".to_string(),
            default_expires_hours: 72,
        };
        assert_eq!(
            settings.invite_url("abc"),
            "https://a.test/invite/accept?token=abc"
        );
    }
}
