//! External service integrations.

pub mod identity_provider;

pub use identity_provider::{HttpIdentityProvider, IdentityClientError};
