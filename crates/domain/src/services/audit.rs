//! Activity logging for state-mutating operations.
//!
//! Entries are written synchronously after the mutation succeeds. A failed
//! write is logged and swallowed: it never fails the operation it records.

use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{AuditAction, NewActivityLog, Role, TargetType};
use crate::repositories::ActivityLogRepository;

/// Builder for activity log entries with a fluent API.
#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
    organization_id: Uuid,
    actor_id: Option<Uuid>,
    action: AuditAction,
    target_id: Option<Uuid>,
    target_type: Option<TargetType>,
    metadata: Map<String, JsonValue>,
}

impl AuditLogBuilder {
    /// Create a builder for an action performed by a member.
    pub fn user_action(org_id: Uuid, user_id: Uuid, action: AuditAction) -> Self {
        Self {
            organization_id: org_id,
            actor_id: Some(user_id),
            action,
            target_id: None,
            target_type: None,
            metadata: Map::new(),
        }
    }

    /// Create a builder for an action without a member actor.
    pub fn system_action(org_id: Uuid, action: AuditAction) -> Self {
        Self {
            organization_id: org_id,
            actor_id: None,
            action,
            target_id: None,
            target_type: None,
            metadata: Map::new(),
        }
    }

    /// Set the entity being acted upon.
    pub fn on_target(mut self, target_type: TargetType, target_id: Uuid) -> Self {
        self.target_type = Some(target_type);
        self.target_id = Some(target_id);
        self
    }

    /// Add a metadata field.
    pub fn with_metadata(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> NewActivityLog {
        NewActivityLog {
            organization_id: self.organization_id,
            actor_id: self.actor_id,
            action: self.action,
            target_id: self.target_id,
            target_type: self.target_type,
            metadata: JsonValue::Object(self.metadata),
        }
    }
}

/// Convenience functions for the audited actions.
pub mod audit_helpers {
    use super::*;

    pub fn user_created(
        org_id: Uuid,
        actor_id: Uuid,
        profile_id: Uuid,
        email: &str,
        role: Role,
    ) -> NewActivityLog {
        AuditLogBuilder::user_action(org_id, actor_id, AuditAction::UserCreated)
            .on_target(TargetType::Profile, profile_id)
            .with_metadata("email", email)
            .with_metadata("role", role.as_str())
            .build()
    }

    pub fn user_deactivated(
        org_id: Uuid,
        actor_id: Uuid,
        profile_id: Uuid,
        email: &str,
        role: Role,
        sessions_revoked: bool,
    ) -> NewActivityLog {
        AuditLogBuilder::user_action(org_id, actor_id, AuditAction::UserDeactivated)
            .on_target(TargetType::Profile, profile_id)
            .with_metadata("email", email)
            .with_metadata("role", role.as_str())
            .with_metadata("sessions_revoked", sessions_revoked)
            .build()
    }

    pub fn invitation_sent(
        org_id: Uuid,
        actor_id: Uuid,
        invitation_id: Uuid,
        email: &str,
        role: Role,
        expires_hours: u32,
    ) -> NewActivityLog {
        AuditLogBuilder::user_action(org_id, actor_id, AuditAction::InvitationSent)
            .on_target(TargetType::Invitation, invitation_id)
            .with_metadata("email", email)
            .with_metadata("role", role.as_str())
            .with_metadata("expires_hours", expires_hours)
            .build()
    }

    /// The actor is the profile the redemption just created.
    pub fn invitation_accepted(
        org_id: Uuid,
        profile_id: Uuid,
        invitation_id: Uuid,
        email: &str,
        role: Role,
    ) -> NewActivityLog {
        AuditLogBuilder::user_action(org_id, profile_id, AuditAction::InvitationAccepted)
            .on_target(TargetType::Invitation, invitation_id)
            .with_metadata("email", email)
            .with_metadata("role", role.as_str())
            .build()
    }

    pub fn invitation_revoked(
        org_id: Uuid,
        actor_id: Uuid,
        invitation_id: Uuid,
        email: &str,
    ) -> NewActivityLog {
        AuditLogBuilder::user_action(org_id, actor_id, AuditAction::InvitationRevoked)
            .on_target(TargetType::Invitation, invitation_id)
            .with_metadata("email", email)
            .build()
    }
}

/// Best-effort writer for activity log entries.
#[derive(Clone)]
pub struct AuditLogger {
    repository: Arc<dyn ActivityLogRepository>,
}

impl AuditLogger {
    pub fn new(repository: Arc<dyn ActivityLogRepository>) -> Self {
        Self { repository }
    }

    /// Append an entry. Failures are logged at error level and dropped.
    pub async fn record(&self, entry: NewActivityLog) {
        let organization_id = entry.organization_id;
        let action = entry.action;
        let target_id = entry.target_id;

        if let Err(e) = self.repository.append(entry).await {
            tracing::error!(
                error = %e,
                organization_id = %organization_id,
                action = %action,
                target_id = ?target_id,
                "Failed to write activity log entry"
            );
        }
    }
}
