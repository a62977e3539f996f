//! Store abstractions the domain services depend on.
//!
//! The relational store is the correctness boundary for concurrency:
//! implementations must enforce at most one active profile per
//! (organization, email), at most one pending invitation per
//! (organization, email), and make the pending-to-terminal transitions
//! conditional on the row still being pending.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    ActivityLog, Invitation, InvitationFilter, NewActivityLog, NewInvitation, NewProfile,
    Organization, Profile,
};

pub use memory::MockStore;

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, StoreError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Active profile with this id, in any organization.
    async fn find_active_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    /// Active profile for a normalized email within an organization.
    async fn find_active_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<Profile>, StoreError>;

    /// Inserts an active profile.
    ///
    /// Fails with `StoreError::UniqueViolation` when an active profile
    /// already exists for the (organization, email) pair.
    async fn insert(&self, profile: NewProfile) -> Result<Profile, StoreError>;

    /// Marks the profile inactive if it is still active.
    ///
    /// Returns `false` when no active profile matched.
    async fn deactivate(&self, organization_id: Uuid, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Inserts a pending invitation.
    ///
    /// Pending rows for the same pair whose expiry is at or before `now`
    /// are corrected to `expired` in the same call. Fails with
    /// `StoreError::UniqueViolation` if a live pending invitation remains.
    async fn insert_pending(
        &self,
        invitation: NewInvitation,
        now: DateTime<Utc>,
    ) -> Result<Invitation, StoreError>;

    async fn find_by_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Invitation>, StoreError>;

    /// Pending, unexpired invitation for a normalized email.
    async fn find_live_pending(
        &self,
        organization_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, StoreError>;

    /// Pending, unexpired invitation whose token digest matches.
    async fn find_redeemable_by_token_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Invitation>, StoreError>;

    /// Conditional `pending -> accepted`. Returns `false` if the row was
    /// no longer pending.
    async fn mark_accepted(&self, id: Uuid, accepted_at: DateTime<Utc>)
        -> Result<bool, StoreError>;

    /// Conditional `pending -> revoked`. Returns `false` if the row was
    /// no longer pending.
    async fn mark_revoked(&self, organization_id: Uuid, id: Uuid) -> Result<bool, StoreError>;

    /// Corrects stale pending rows of an organization to `expired`.
    async fn expire_stale(&self, organization_id: Uuid, now: DateTime<Utc>)
        -> Result<u64, StoreError>;

    /// Most recent invitations first, filtered by effective status at `now`.
    async fn list(
        &self,
        organization_id: Uuid,
        filter: InvitationFilter,
        limit: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Invitation>, StoreError>;
}

#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn append(&self, entry: NewActivityLog) -> Result<ActivityLog, StoreError>;
}

/// Connectivity probe used by health checks.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}
