//! Domain services for Roster.
//!
//! Services contain business logic that operates on domain models.

pub mod audit;
pub mod context;
pub mod identity;
pub mod invitations;
pub mod membership;
pub mod provisioning;
pub mod role_policy;

pub use audit::{audit_helpers, AuditLogBuilder, AuditLogger};
pub use context::CoreContext;
pub use identity::{IdentityProvider, MockIdentityProvider, NewIdentity};
pub use invitations::{InvitationService, InvitationSettings};
pub use membership::MembershipService;
pub use provisioning::ProvisioningService;
pub use role_policy::{can_assign_role, can_deactivate, can_invite, can_provision_directly};
