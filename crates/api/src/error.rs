use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    BoxError, Json,
};
use domain::CoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Rate limited")]
    RateLimited { retry_after_secs: u64 },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
    status: u16,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(core) => match core {
                CoreError::Validation(_) => StatusCode::BAD_REQUEST,
                CoreError::Authentication(_) => StatusCode::UNAUTHORIZED,
                CoreError::Authorization(_) => StatusCode::FORBIDDEN,
                CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                CoreError::Conflict(_) => StatusCode::CONFLICT,
                CoreError::Upstream(_) | CoreError::RollbackFailure { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Core(core) => core.code(),
            ApiError::MalformedRequest(_) => "validation",
            ApiError::RateLimited { .. } => "rate_limited",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Core(CoreError::Upstream(msg)) => {
                tracing::error!(code = "upstream", "Upstream failure: {}", msg);
                msg.clone()
            }
            ApiError::Core(CoreError::RollbackFailure {
                original,
                rollback,
                orphaned_identity,
            }) => {
                tracing::error!(
                    reconcile = true,
                    orphaned_identity = %orphaned_identity,
                    original = %original,
                    rollback = %rollback,
                    "Request failed with an orphaned identity"
                );
                "Account setup failed and could not be fully undone".to_string()
            }
            ApiError::Core(other) => other.to_string(),
            ApiError::MalformedRequest(msg) => msg.clone(),
            ApiError::RateLimited { .. } => "Too many requests. Please try again later.".into(),
        };

        let body = ErrorBody {
            success: false,
            error: message,
            code: self.code(),
            status: status.as_u16(),
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Core(CoreError::from(errors))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

/// Error handler for the outer tower layers.
///
/// A request that runs past the server timeout is reported as `upstream`:
/// a collaborator did not answer in time.
pub async fn handle_layer_error(error: BoxError) -> ApiError {
    if error.is::<tower::timeout::error::Elapsed>() {
        ApiError::Core(CoreError::Upstream(
            "Request timed out waiting for a dependency".to_string(),
        ))
    } else {
        ApiError::Core(CoreError::Upstream(format!(
            "Unhandled middleware error: {error}"
        )))
    }
}
