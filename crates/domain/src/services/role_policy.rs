//! Capability checks over the role hierarchy.
//!
//! Pure predicates; callers turn a `false` into `CoreError::Authorization`.

use crate::models::Role;

/// Whether `role` may issue, list and revoke invitations.
pub fn can_invite(role: Role) -> bool {
    matches!(role, Role::Creator | Role::Admin)
}

/// Whether `role` may create accounts without an invitation.
pub fn can_provision_directly(role: Role) -> bool {
    role == Role::Creator
}

/// Whether `caller` may grant `target` to a new member.
///
/// Nobody may grant `creator`. Admins may grant `admin`.
pub fn can_assign_role(caller: Role, target: Role) -> bool {
    match (caller, target) {
        (_, Role::Creator) => false,
        (Role::Creator | Role::Admin, Role::Admin | Role::Player) => true,
        (Role::Player, _) => false,
    }
}

/// Whether `caller` may deactivate a member holding `target`.
pub fn can_deactivate(caller: Role, target: Role) -> bool {
    match (caller, target) {
        (_, Role::Creator) => false,
        (Role::Creator, _) => true,
        (Role::Admin, Role::Player) => true,
        _ => false,
    }
}
