//! In-memory store for development and testing.
//!
//! A single lock guards all tables, so every check-then-write below is
//! atomic in the same way the database constraints make it atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{
    ActivityLogRepository, InvitationRepository, OrganizationRepository, ProfileRepository,
    StoreHealth,
};
use crate::error::StoreError;
use crate::models::{
    ActivityLog, Invitation, InvitationFilter, InvitationStatus, NewActivityLog, NewInvitation,
    NewProfile, Organization, Profile, Role,
};

#[derive(Debug, Default)]
struct MockState {
    organizations: HashMap<Uuid, Organization>,
    profiles: Vec<Profile>,
    invitations: Vec<Invitation>,
    activity_logs: Vec<ActivityLog>,
}

/// Mock store implementing every repository trait.
///
/// Fault flags let tests force individual writes to fail.
#[derive(Debug, Default)]
pub struct MockStore {
    state: Mutex<MockState>,
    fail_profile_insert: AtomicBool,
    fail_activity_log: AtomicBool,
    revoke_before_accept: AtomicBool,
    unavailable: AtomicBool,
}

impl MockStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("mock store offline".to_string()));
        }
        Ok(())
    }

    /// Make every profile insert fail with a query error.
    pub fn set_fail_profile_insert(&self, fail: bool) {
        self.fail_profile_insert.store(fail, Ordering::SeqCst);
    }

    /// Make every activity log append fail.
    pub fn set_fail_activity_log(&self, fail: bool) {
        self.fail_activity_log.store(fail, Ordering::SeqCst);
    }

    /// Revoke the invitation right before a conditional accept, as a
    /// concurrent revoke would.
    pub fn set_revoke_before_accept(&self, enabled: bool) {
        self.revoke_before_accept.store(enabled, Ordering::SeqCst);
    }

    /// Make every call fail as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn seed_organization(&self, name: &str, slug: &str) -> Organization {
        let organization = Organization {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
            created_at: Utc::now(),
        };
        self.state()
            .organizations
            .insert(organization.id, organization.clone());
        organization
    }

    /// Insert an active profile directly, bypassing provisioning.
    pub fn seed_profile(&self, organization_id: Uuid, role: Role, email: &str) -> Profile {
        let now = Utc::now();
        let profile = Profile {
            id: Uuid::new_v4(),
            organization_id,
            role,
            full_name: None,
            email: shared::validation::normalize_email(email),
            created_by: None,
            is_active: true,
            last_seen_at: None,
            created_at: now,
            updated_at: now,
        };
        self.state().profiles.push(profile.clone());
        profile
    }

    /// Insert an invitation row as-is, bypassing every constraint.
    pub fn seed_invitation(&self, invitation: Invitation) {
        self.state().invitations.push(invitation);
    }

    pub fn profiles(&self) -> Vec<Profile> {
        self.state().profiles.clone()
    }

    pub fn profile(&self, id: Uuid) -> Option<Profile> {
        self.state().profiles.iter().find(|p| p.id == id).cloned()
    }

    pub fn invitations(&self) -> Vec<Invitation> {
        self.state().invitations.clone()
    }

    pub fn invitation(&self, id: Uuid) -> Option<Invitation> {
        self.state().invitations.iter().find(|i| i.id == id).cloned()
    }

    pub fn activity_logs(&self) -> Vec<ActivityLog> {
        self.state().activity_logs.clone()
    }
}

fn matches_filter(invitation: &Invitation, filter: InvitationFilter, now: DateTime<Utc>) -> bool {
    match filter {
        InvitationFilter::All => true,
        InvitationFilter::Only(status) => invitation.effective_status(now) == status,
    }
}

#[async_trait]
impl OrganizationRepository for MockStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, StoreError> {
        self.check_available()?;
        Ok(self.state().organizations.get(&id).cloned())
    }
}

#[async_trait]
impl ProfileRepository for MockStore {
    async fn find_active_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.check_available()?;
        Ok(self
            .state()
            .profiles
            .iter()
            .find(|p| p.id == id && p.is_active)
            .cloned())
    }

    async fn find_active_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<Profile>, StoreError> {
        self.check_available()?;
        let email = email.to_lowercase();
        Ok(self
            .state()
            .profiles
            .iter()
            .find(|p| p.organization_id == organization_id && p.is_active && p.email == email)
            .cloned())
    }

    async fn insert(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        self.check_available()?;
        if self.fail_profile_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Query("simulated profile insert failure".to_string()));
        }

        let mut state = self.state();
        let email = profile.email.to_lowercase();
        if state.profiles.iter().any(|p| p.id == profile.id) {
            return Err(StoreError::UniqueViolation("profiles_pkey".to_string()));
        }
        if state.profiles.iter().any(|p| {
            p.organization_id == profile.organization_id && p.is_active && p.email == email
        }) {
            return Err(StoreError::UniqueViolation(
                "profiles_org_email_active_key".to_string(),
            ));
        }
        let now = Utc::now();
        let row = Profile {
            id: profile.id,
            organization_id: profile.organization_id,
            role: profile.role,
            full_name: profile.full_name,
            email,
            created_by: profile.created_by,
            is_active: true,
            last_seen_at: None,
            created_at: now,
            updated_at: now,
        };
        state.profiles.push(row.clone());
        Ok(row)
    }

    async fn deactivate(&self, organization_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut state = self.state();
        match state
            .profiles
            .iter_mut()
            .find(|p| p.id == id && p.organization_id == organization_id && p.is_active)
        {
            Some(profile) => {
                profile.is_active = false;
                profile.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl InvitationRepository for MockStore {
    async fn insert_pending(
        &self,
        invitation: NewInvitation,
        now: DateTime<Utc>,
    ) -> Result<Invitation, StoreError> {
        self.check_available()?;
        let mut state = self.state();
        let email = invitation.email.to_lowercase();

        for row in state.invitations.iter_mut().filter(|i| {
            i.organization_id == invitation.organization_id
                && i.email == email
                && i.status == InvitationStatus::Pending
                && i.expires_at <= now
        }) {
            row.status = InvitationStatus::Expired;
        }

        if state.invitations.iter().any(|i| {
            i.organization_id == invitation.organization_id
                && i.email == email
                && i.status == InvitationStatus::Pending
        }) {
            return Err(StoreError::UniqueViolation(
                "invitations_org_email_pending_key".to_string(),
            ));
        }
        if state
            .invitations
            .iter()
            .any(|i| i.token_hash == invitation.token_hash)
        {
            return Err(StoreError::UniqueViolation(
                "invitations_token_hash_key".to_string(),
            ));
        }

        let row = Invitation {
            id: Uuid::new_v4(),
            organization_id: invitation.organization_id,
            email,
            role: invitation.role,
            token_hash: invitation.token_hash,
            invited_by: invitation.invited_by,
            status: InvitationStatus::Pending,
            expires_at: invitation.expires_at,
            accepted_at: None,
            created_at: now,
        };
        state.invitations.push(row.clone());
        Ok(row)
    }

    async fn find_by_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Invitation>, StoreError> {
        self.check_available()?;
        Ok(self
            .state()
            .invitations
            .iter()
            .find(|i| i.id == id && i.organization_id == organization_id)
            .cloned())
    }

    async fn find_live_pending(
        &self,
        organization_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, StoreError> {
        self.check_available()?;
        let email = email.to_lowercase();
        Ok(self
            .state()
            .invitations
            .iter()
            .find(|i| i.organization_id == organization_id && i.email == email && i.is_redeemable(now))
            .cloned())
    }

    async fn find_redeemable_by_token_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, StoreError> {
        self.check_available()?;
        Ok(self
            .state()
            .invitations
            .iter()
            .find(|i| i.token_hash == token_hash && i.is_redeemable(now))
            .cloned())
    }

    async fn mark_accepted(
        &self,
        id: Uuid,
        accepted_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let revoke_first = self.revoke_before_accept.load(Ordering::SeqCst);
        let mut state = self.state();
        let Some(row) = state.invitations.iter_mut().find(|i| i.id == id) else {
            return Ok(false);
        };
        if revoke_first && row.status == InvitationStatus::Pending {
            row.status = InvitationStatus::Revoked;
        }
        if row.status != InvitationStatus::Pending {
            return Ok(false);
        }
        row.status = InvitationStatus::Accepted;
        row.accepted_at = Some(accepted_at);
        Ok(true)
    }

    async fn mark_revoked(&self, organization_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut state = self.state();
        match state.invitations.iter_mut().find(|i| {
            i.id == id
                && i.organization_id == organization_id
                && i.status == InvitationStatus::Pending
        }) {
            Some(row) => {
                row.status = InvitationStatus::Revoked;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn expire_stale(
        &self,
        organization_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut state = self.state();
        let mut corrected = 0;
        for row in state.invitations.iter_mut().filter(|i| {
            i.organization_id == organization_id
                && i.status == InvitationStatus::Pending
                && i.expires_at <= now
        }) {
            row.status = InvitationStatus::Expired;
            corrected += 1;
        }
        Ok(corrected)
    }

    async fn list(
        &self,
        organization_id: Uuid,
        filter: InvitationFilter,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Invitation>, StoreError> {
        self.check_available()?;
        let state = self.state();
        // Newest insert first; the stable sort keeps that order for ties.
        let mut rows: Vec<Invitation> = state
            .invitations
            .iter()
            .rev()
            .filter(|i| i.organization_id == organization_id && matches_filter(i, filter, now))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(usize::try_from(limit.max(0)).unwrap_or(0));
        Ok(rows)
    }
}

#[async_trait]
impl ActivityLogRepository for MockStore {
    async fn append(&self, entry: NewActivityLog) -> Result<ActivityLog, StoreError> {
        self.check_available()?;
        if self.fail_activity_log.load(Ordering::SeqCst) {
            return Err(StoreError::Query("simulated activity log failure".to_string()));
        }
        let row = ActivityLog {
            id: Uuid::new_v4(),
            organization_id: entry.organization_id,
            actor_id: entry.actor_id,
            action: entry.action,
            target_id: entry.target_id,
            target_type: entry.target_type,
            metadata: entry.metadata,
            created_at: Utc::now(),
        };
        self.state().activity_logs.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl StoreHealth for MockStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
