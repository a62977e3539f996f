//! HTTP route handlers.

pub mod health;
pub mod invitations;
pub mod members;

use domain::CoreError;

use crate::error::ApiError;
use crate::middleware::record_operation;

/// Count the outcome of a core operation and convert its error.
pub(crate) fn observe<T>(
    operation: &'static str,
    result: Result<T, CoreError>,
) -> Result<T, ApiError> {
    match result {
        Ok(value) => {
            record_operation(operation, "ok");
            Ok(value)
        }
        Err(e) => {
            record_operation(operation, e.code());
            Err(ApiError::Core(e))
        }
    }
}
