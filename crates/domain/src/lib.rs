//! Domain layer for the Roster backend.
//!
//! This crate contains:
//! - Domain models (Organization, Profile, Invitation, ActivityLog)
//! - Repository and identity provider traits the services depend on
//! - Business logic services (provisioning, invitations, membership)
//! - Domain error types

pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

pub use error::{CoreError, IdentityError, StoreError};
