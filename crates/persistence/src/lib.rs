//! Persistence layer for the Roster backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - PostgreSQL implementations of the domain repository traits
//! - SQL migrations (`src/migrations`)

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;
