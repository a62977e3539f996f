//! Entity definitions (database row mappings).

pub mod activity_log;
pub mod invitation;
pub mod organization;
pub mod profile;

pub use activity_log::ActivityLogEntity;
pub use invitation::InvitationEntity;
pub use organization::OrganizationEntity;
pub use profile::ProfileEntity;
