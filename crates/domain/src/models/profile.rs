//! Profile domain models.
//!
//! A profile is the organization-scoped record of an identity held by the
//! external identity provider. Its id is the provider's account id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_email_address, validate_full_name, validate_password};
use uuid::Uuid;
use validator::Validate;

use super::role::{validate_assignable_role, Role};

/// Profile domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Profile {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub role: Role,
    pub full_name: Option<String>,
    /// Stored normalized (trimmed, lowercase).
    pub email: String,
    /// `None` for system-provisioned profiles.
    pub created_by: Option<Uuid>,
    pub is_active: bool,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Name shown to other members, falling back to the email.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// Input for inserting a profile row.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub role: Role,
    pub full_name: Option<String>,
    pub email: String,
    pub created_by: Option<Uuid>,
}

/// Public view of a profile returned by provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ProfileSummary {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
}

impl From<Profile> for ProfileSummary {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            full_name: profile.full_name,
            role: profile.role,
        }
    }
}

/// Authenticated caller resolved from a bearer token and its active profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: Role,
    pub email: String,
}

impl From<&Profile> for Caller {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.id,
            organization_id: profile.organization_id,
            role: profile.role,
            email: profile.email.clone(),
        }
    }
}

/// Request to create a member account directly.
#[derive(Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateMemberRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_email_address"))]
    pub email: String,

    #[serde(default)]
    #[validate(custom(function = "validate_password"))]
    pub password: String,

    #[serde(default, alias = "fullName")]
    #[validate(custom(function = "validate_full_name"))]
    pub full_name: String,

    /// "admin" or "player".
    #[serde(default)]
    #[validate(custom(function = "validate_assignable_role"))]
    pub role: String,
}

impl std::fmt::Debug for CreateMemberRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateMemberRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .finish()
    }
}

/// Everything provisioning needs to create an identity and its profile.
#[derive(Clone)]
pub struct ProvisionAccount {
    pub organization_id: Uuid,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub created_by: Option<Uuid>,
}

impl std::fmt::Debug for ProvisionAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionAccount")
            .field("organization_id", &self.organization_id)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .field("created_by", &self.created_by)
            .finish()
    }
}

/// Request to deactivate a member.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeactivateMemberRequest {
    #[serde(default, alias = "targetUserId")]
    pub target_user_id: Option<Uuid>,
}

/// Outcome of a deactivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DeactivatedMember {
    pub user_id: Uuid,
    pub message: String,
    pub sessions_revoked: bool,
}
