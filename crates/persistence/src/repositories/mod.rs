//! PostgreSQL implementations of the domain repository traits.

pub mod activity_log;
pub mod invitation;
pub mod organization;
pub mod profile;

pub use activity_log::PgActivityLogRepository;
pub use invitation::PgInvitationRepository;
pub use organization::PgOrganizationRepository;
pub use profile::PgProfileRepository;
