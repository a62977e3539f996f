//! Role hierarchy within an organization.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Role of a profile within its organization: creator > admin > player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Creator,
    Admin,
    Player,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Creator, Role::Admin, Role::Player];

    /// Roles that may be granted through provisioning or an invitation.
    pub const ASSIGNABLE: [Role; 2] = [Role::Admin, Role::Player];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Creator => "creator",
            Role::Admin => "admin",
            Role::Player => "player",
        }
    }

    /// Whether this role can ever be the target of an assignment.
    pub fn is_assignable(&self) -> bool {
        Self::ASSIGNABLE.contains(self)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "creator" => Ok(Role::Creator),
            "admin" => Ok(Role::Admin),
            "player" => Ok(Role::Player),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validator for request fields that name a role to assign.
pub fn validate_assignable_role(role: &str) -> Result<(), validator::ValidationError> {
    match Role::from_str(role) {
        Ok(r) if r.is_assignable() => Ok(()),
        _ => {
            let mut err = validator::ValidationError::new("invalid_role");
            err.message = Some("Role must be 'admin' or 'player'".into());
            Err(err)
        }
    }
}
