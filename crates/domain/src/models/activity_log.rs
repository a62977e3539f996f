//! Activity log domain models.
//!
//! Append-only record of state-mutating actions. Entries are never updated
//! or deleted and are never read back by the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;

/// Audited actions following the format: resource.operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "user.created")]
    UserCreated,
    #[serde(rename = "user.deactivated")]
    UserDeactivated,
    #[serde(rename = "invitation.sent")]
    InvitationSent,
    #[serde(rename = "invitation.accepted")]
    InvitationAccepted,
    #[serde(rename = "invitation.revoked")]
    InvitationRevoked,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserCreated => "user.created",
            AuditAction::UserDeactivated => "user.deactivated",
            AuditAction::InvitationSent => "invitation.sent",
            AuditAction::InvitationAccepted => "invitation.accepted",
            AuditAction::InvitationRevoked => "invitation.revoked",
        }
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user.created" => Ok(AuditAction::UserCreated),
            "user.deactivated" => Ok(AuditAction::UserDeactivated),
            "invitation.sent" => Ok(AuditAction::InvitationSent),
            "invitation.accepted" => Ok(AuditAction::InvitationAccepted),
            "invitation.revoked" => Ok(AuditAction::InvitationRevoked),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of entity an audit entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Profile,
    Invitation,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Profile => "profile",
            TargetType::Invitation => "invitation",
        }
    }
}

impl FromStr for TargetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(TargetType::Profile),
            "invitation" => Ok(TargetType::Invitation),
            _ => Err(format!("Unknown target type: {}", s)),
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored activity log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ActivityLog {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// `None` for system actions.
    pub actor_id: Option<Uuid>,
    pub action: AuditAction,
    pub target_id: Option<Uuid>,
    pub target_type: Option<TargetType>,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// Input for appending an activity log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityLog {
    pub organization_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: AuditAction,
    pub target_id: Option<Uuid>,
    pub target_type: Option<TargetType>,
    pub metadata: JsonValue,
}
