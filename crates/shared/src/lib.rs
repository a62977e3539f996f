//! Shared utilities and common types for the Roster backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Invitation token generation and digesting
//! - Bearer access token verification
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod validation;
