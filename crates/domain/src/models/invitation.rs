//! Invitation domain models.
//!
//! An invitation offers a pre-assigned role in an organization to an email
//! address for a bounded time. Expiry is derived when reading: a stored
//! `pending` row whose `expires_at` has passed is reported as `expired`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_email_address, validate_full_name, validate_password};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::role::{validate_assignable_role, Role};

/// Default number of invitations returned by a listing.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Maximum number of invitations returned by a listing.
pub const MAX_LIST_LIMIT: i64 = 100;

/// Stored invitation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
    Revoked,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Expired => "expired",
            InvitationStatus::Revoked => "revoked",
        }
    }
}

impl FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "expired" => Ok(InvitationStatus::Expired),
            "revoked" => Ok(InvitationStatus::Revoked),
            _ => Err(format!("Unknown invitation status: {}", s)),
        }
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Invitation domain model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub role: Role,
    /// SHA-256 hex digest of the token; the token itself is never stored.
    pub token_hash: String,
    pub invited_by: Uuid,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Status as observed at `now`, with expiry applied.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        match self.status {
            InvitationStatus::Pending if self.expires_at <= now => InvitationStatus::Expired,
            status => status,
        }
    }

    /// Whether the invitation can still be redeemed at `now`.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == InvitationStatus::Pending
    }
}

/// Input for inserting a pending invitation.
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub organization_id: Uuid,
    pub email: String,
    pub role: Role,
    pub token_hash: String,
    pub invited_by: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Request to issue an invitation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateInvitationRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_email_address"))]
    pub email: String,

    /// "admin" or "player".
    #[serde(default)]
    #[validate(custom(function = "validate_assignable_role"))]
    pub role: String,

    /// One of 24, 48, 72 or 168. Defaults to the configured lifetime.
    #[serde(default, alias = "expiresHours")]
    pub expires_hours: Option<u32>,
}

/// Invitation as returned to callers. Never carries the token digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitationResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_url: Option<String>,
}

impl InvitationResponse {
    /// Builds the public view, reporting the effective status at `now`.
    pub fn from_invitation(invitation: &Invitation, now: DateTime<Utc>) -> Self {
        Self {
            id: invitation.id,
            email: invitation.email.clone(),
            role: invitation.role,
            status: invitation.effective_status(now),
            expires_at: invitation.expires_at,
            created_at: invitation.created_at,
            accepted_at: invitation.accepted_at,
            invite_url: None,
        }
    }

    pub fn with_invite_url(mut self, url: String) -> Self {
        self.invite_url = Some(url);
        self
    }
}

/// Request to redeem an invitation token.
#[derive(Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct AcceptInvitationRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Invitation token is required"))]
    pub token: String,

    #[serde(default)]
    #[validate(custom(function = "validate_password"))]
    pub password: String,

    #[serde(default, alias = "fullName")]
    #[validate(custom(function = "validate_full_name"))]
    pub full_name: String,
}

impl std::fmt::Debug for AcceptInvitationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceptInvitationRequest")
            .field("token", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// Result of a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AcceptedInvitation {
    pub email: String,
    #[serde(skip)]
    pub profile_id: Uuid,
}

/// Outcome of a revocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The invitation moved from pending to revoked.
    Revoked,
    /// The invitation was already revoked; nothing changed.
    AlreadyRevoked,
}

/// Status filter for listing invitations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvitationFilter {
    #[default]
    All,
    Only(InvitationStatus),
}

impl FromStr for InvitationFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "all" => Ok(InvitationFilter::All),
            other => InvitationStatus::from_str(other).map(InvitationFilter::Only),
        }
    }
}

/// Query parameters for listing invitations.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct ListInvitationsQuery {
    /// "pending", "accepted", "expired", "revoked" or "all" (default).
    pub status: Option<String>,

    /// Number of invitations to return (default: 50, max: 100).
    pub limit: Option<i64>,
}

impl ListInvitationsQuery {
    /// Get the limit (clamped to 1-100).
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
    }

    pub fn filter(&self) -> Result<InvitationFilter, String> {
        match self.status.as_deref() {
            None => Ok(InvitationFilter::All),
            Some(s) => InvitationFilter::from_str(s),
        }
    }
}
