//! Member account routes: direct provisioning and deactivation.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::WithRejection;
use domain::models::{CreateMemberRequest, DeactivateMemberRequest, ProfileSummary};
use serde::Serialize;

use super::observe;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthenticatedCaller;

#[derive(Debug, Serialize)]
pub struct CreateMemberResponse {
    pub success: bool,
    pub user: ProfileSummary,
}

#[derive(Debug, Serialize)]
pub struct DeactivateMemberResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/v1/users
///
/// Create an account in the caller's organization without an invitation.
/// Creator only.
pub async fn create_member(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    WithRejection(Json(request), _): WithRejection<Json<CreateMemberRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let user = observe(
        "create_member",
        state.provisioning.create_member(&caller, request).await,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(CreateMemberResponse {
            success: true,
            user,
        }),
    ))
}

/// POST /api/v1/members/deactivate
///
/// Deactivate a member of the caller's organization and revoke their
/// sessions.
pub async fn deactivate_member(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    WithRejection(Json(request), _): WithRejection<Json<DeactivateMemberRequest>, ApiError>,
) -> Result<Json<DeactivateMemberResponse>, ApiError> {
    let deactivated = observe(
        "deactivate_member",
        state.membership.deactivate(&caller, request).await,
    )?;

    Ok(Json(DeactivateMemberResponse {
        success: true,
        message: deactivated.message,
    }))
}
