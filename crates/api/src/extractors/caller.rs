//! Caller resolution from a bearer access token.
//!
//! Bearer token → identity provider → user id → active profile. The
//! profile supplies the organization and role every core operation scopes
//! to.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use domain::models::Caller;
use domain::CoreError;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated caller with an active profile.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller(pub Caller);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(caller) = parts.extensions.get::<Caller>() {
            return Ok(AuthenticatedCaller(caller.clone()));
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    CoreError::Authentication("Missing or malformed bearer token".to_string())
                })?;

        let user_id = state
            .core
            .identity
            .authenticate(bearer.token())
            .await
            .map_err(CoreError::from)?;

        let profile = state
            .core
            .profiles
            .find_active_by_id(user_id)
            .await
            .map_err(CoreError::from)?
            .ok_or_else(|| {
                tracing::debug!(user_id = %user_id, "Token holder has no active profile");
                CoreError::Authorization("No active membership for this account".to_string())
            })?;

        let caller = Caller::from(&profile);
        parts.extensions.insert(caller.clone());
        Ok(AuthenticatedCaller(caller))
    }
}
