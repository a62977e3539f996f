//! Common validation utilities.

use validator::{ValidateEmail, ValidationError};

/// Minimum password length accepted by the identity provider.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length accepted by the identity provider.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum display name length.
pub const MAX_FULL_NAME_LENGTH: usize = 100;

/// Invitation lifetimes (in hours) a caller may choose from.
pub const ALLOWED_EXPIRY_HOURS: [u32; 4] = [24, 48, 72, 168];

/// Canonical form of an email address for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates that an email address is present and well formed.
pub fn validate_email_address(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        let mut err = ValidationError::new("email_required");
        err.message = Some("Email is required".into());
        return Err(err);
    }
    if !email.validate_email() {
        let mut err = ValidationError::new("email_invalid");
        err.message = Some("Invalid email address".into());
        return Err(err);
    }
    Ok(())
}

/// Validates password length (8 to 128 characters).
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        let mut err = ValidationError::new("password_too_short");
        err.message = Some("Password must be at least 8 characters".into());
        return Err(err);
    }
    if length > MAX_PASSWORD_LENGTH {
        let mut err = ValidationError::new("password_too_long");
        err.message = Some("Password must be at most 128 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that a display name is non-blank and reasonably short.
pub fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("full_name_required");
        err.message = Some("Full name is required".into());
        return Err(err);
    }
    if trimmed.chars().count() > MAX_FULL_NAME_LENGTH {
        let mut err = ValidationError::new("full_name_too_long");
        err.message = Some("Full name must be at most 100 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates an invitation lifetime against the allowed set.
pub fn validate_expires_hours(hours: u32) -> Result<(), ValidationError> {
    if ALLOWED_EXPIRY_HOURS.contains(&hours) {
        Ok(())
    } else {
        let mut err = ValidationError::new("expires_hours_invalid");
        err.message = Some("Expiry must be one of 24, 48, 72 or 168 hours".into());
        Err(err)
    }
}
