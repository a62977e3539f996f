//! Domain models for Roster.

pub mod activity_log;
pub mod invitation;
pub mod organization;
pub mod profile;
pub mod role;

pub use activity_log::{ActivityLog, AuditAction, NewActivityLog, TargetType};
pub use invitation::{
    AcceptInvitationRequest, AcceptedInvitation, CreateInvitationRequest, Invitation,
    InvitationFilter, InvitationResponse, InvitationStatus, ListInvitationsQuery, NewInvitation,
    RevokeOutcome,
};
pub use organization::Organization;
pub use profile::{
    Caller, CreateMemberRequest, DeactivateMemberRequest, DeactivatedMember, NewProfile, Profile,
    ProfileSummary, ProvisionAccount,
};
pub use role::Role;
