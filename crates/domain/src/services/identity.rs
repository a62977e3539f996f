//! External identity provider abstraction.
//!
//! The provider owns credentials and sessions. The core only asks it to
//! create, delete and sign out accounts, and to resolve a bearer token to
//! an account id.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::IdentityError;
use crate::models::Role;

/// Account to create at the identity provider.
#[derive(Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub organization_id: Uuid,
}

impl std::fmt::Debug for NewIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewIdentity")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .field("role", &self.role)
            .field("organization_id", &self.organization_id)
            .finish()
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a pre-confirmed account and return its id.
    async fn create_user(&self, identity: NewIdentity) -> Result<Uuid, IdentityError>;

    /// Permanently delete an account.
    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError>;

    /// Invalidate every session of an account.
    async fn sign_out_user(&self, user_id: Uuid) -> Result<(), IdentityError>;

    /// Resolve a bearer access token to the account id it was issued for.
    async fn authenticate(&self, bearer: &str) -> Result<Uuid, IdentityError>;
}

#[derive(Debug, Clone)]
struct MockAccount {
    email: String,
    organization_id: Uuid,
    role: Role,
}

#[derive(Debug, Default)]
struct MockIdentityState {
    accounts: HashMap<Uuid, MockAccount>,
    sessions: HashMap<String, Uuid>,
}

/// Mock identity provider for development and testing.
///
/// Keeps accounts in memory, counts calls and can simulate failures.
#[derive(Debug, Default)]
pub struct MockIdentityProvider {
    state: Mutex<MockIdentityState>,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
    fail_sign_out: AtomicBool,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl MockIdentityProvider {
    /// Create a new mock identity provider.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockIdentityState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    /// Register an existing account id, e.g. one seeded directly in a store.
    pub fn register_account(&self, user_id: Uuid, email: &str, organization_id: Uuid, role: Role) {
        self.state().accounts.insert(
            user_id,
            MockAccount {
                email: email.to_lowercase(),
                organization_id,
                role,
            },
        );
    }

    /// Open a session for an account and return its bearer token.
    pub fn issue_session(&self, user_id: Uuid) -> String {
        let token = format!("mock-session-{}", Uuid::new_v4());
        self.state().sessions.insert(token.clone(), user_id);
        token
    }

    pub fn has_account(&self, user_id: Uuid) -> bool {
        self.state().accounts.contains_key(&user_id)
    }

    pub fn account_count(&self) -> usize {
        self.state().accounts.len()
    }

    pub fn active_sessions(&self, user_id: Uuid) -> usize {
        self.state()
            .sessions
            .values()
            .filter(|id| **id == user_id)
            .count()
    }

    /// Organization and role recorded in the account's metadata.
    pub fn account_metadata(&self, user_id: Uuid) -> Option<(Uuid, Role)> {
        self.state()
            .accounts
            .get(&user_id)
            .map(|a| (a.organization_id, a.role))
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn create_user(&self, identity: NewIdentity) -> Result<Uuid, IdentityError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            tracing::warn!(email = %identity.email, "Mock identity provider simulating create failure");
            return Err(IdentityError::Upstream("Simulated failure".to_string()));
        }

        let email = identity.email.to_lowercase();
        let mut state = self.state();
        if state.accounts.values().any(|a| a.email == email) {
            return Err(IdentityError::AlreadyExists);
        }
        let user_id = Uuid::new_v4();
        state.accounts.insert(
            user_id,
            MockAccount {
                email,
                organization_id: identity.organization_id,
                role: identity.role,
            },
        );
        Ok(user_id)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            tracing::warn!(user_id = %user_id, "Mock identity provider simulating delete failure");
            return Err(IdentityError::Upstream("Simulated failure".to_string()));
        }
        let mut state = self.state();
        state.accounts.remove(&user_id);
        state.sessions.retain(|_, id| *id != user_id);
        Ok(())
    }

    async fn sign_out_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out.load(Ordering::SeqCst) {
            tracing::warn!(user_id = %user_id, "Mock identity provider simulating sign-out failure");
            return Err(IdentityError::Timeout("Simulated timeout".to_string()));
        }
        self.state().sessions.retain(|_, id| *id != user_id);
        Ok(())
    }

    async fn authenticate(&self, bearer: &str) -> Result<Uuid, IdentityError> {
        self.state()
            .sessions
            .get(bearer)
            .copied()
            .ok_or(IdentityError::InvalidCredential)
    }
}
