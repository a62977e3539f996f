//! Collaborator handles shared by every service.

use std::sync::Arc;

use super::audit::AuditLogger;
use super::identity::{IdentityProvider, MockIdentityProvider};
use crate::repositories::{
    ActivityLogRepository, InvitationRepository, MockStore, OrganizationRepository,
    ProfileRepository,
};

/// Explicitly passed dependencies of the core services.
///
/// Cheap to clone; every field is an `Arc`.
#[derive(Clone)]
pub struct CoreContext {
    pub organizations: Arc<dyn OrganizationRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub invitations: Arc<dyn InvitationRepository>,
    pub activity_logs: Arc<dyn ActivityLogRepository>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl CoreContext {
    /// Build a context where one mock store backs every repository.
    pub fn with_mocks(store: Arc<MockStore>, identity: Arc<MockIdentityProvider>) -> Self {
        Self {
            organizations: store.clone(),
            profiles: store.clone(),
            invitations: store.clone(),
            activity_logs: store,
            identity,
        }
    }

    pub fn audit(&self) -> AuditLogger {
        AuditLogger::new(self.activity_logs.clone())
    }
}
