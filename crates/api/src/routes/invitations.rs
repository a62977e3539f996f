//! Organization invitation routes.
//!
//! Issuing, listing and revoking require a creator or admin caller.
//! Accepting is public; the token in the body is the credential.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use domain::models::{
    AcceptInvitationRequest, CreateInvitationRequest, InvitationResponse, ListInvitationsQuery,
    RevokeOutcome,
};
use serde::Serialize;
use uuid::Uuid;

use super::observe;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthenticatedCaller;

#[derive(Debug, Serialize)]
pub struct IssueInvitationResponse {
    pub success: bool,
    pub invitation: InvitationResponse,
}

#[derive(Debug, Serialize)]
pub struct ListInvitationsResponse {
    pub success: bool,
    pub invitations: Vec<InvitationResponse>,
}

#[derive(Debug, Serialize)]
pub struct RevokeInvitationResponse {
    pub success: bool,
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct AcceptInvitationResponse {
    pub success: bool,
    pub email: String,
    pub message: String,
}

/// POST /api/v1/invitations
///
/// Issue an invitation. The response carries the invite URL, the only
/// place the raw token ever appears.
pub async fn issue_invitation(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    WithRejection(Json(request), _): WithRejection<Json<CreateInvitationRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let invitation = observe(
        "issue_invitation",
        state.invitations.issue(&caller, request).await,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(IssueInvitationResponse {
            success: true,
            invitation,
        }),
    ))
}

/// GET /api/v1/invitations?status=&limit=
pub async fn list_invitations(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    WithRejection(Query(query), _): WithRejection<Query<ListInvitationsQuery>, ApiError>,
) -> Result<Json<ListInvitationsResponse>, ApiError> {
    let invitations = observe(
        "list_invitations",
        state.invitations.list(&caller, query).await,
    )?;

    Ok(Json(ListInvitationsResponse {
        success: true,
        invitations,
    }))
}

/// POST /api/v1/invitations/:invitation_id/revoke
///
/// Revoking an already revoked invitation succeeds without change.
pub async fn revoke_invitation(
    State(state): State<AppState>,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    WithRejection(Path(invitation_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<RevokeInvitationResponse>, ApiError> {
    let outcome = observe(
        "revoke_invitation",
        state.invitations.revoke(&caller, invitation_id).await,
    )?;

    if outcome == RevokeOutcome::AlreadyRevoked {
        tracing::debug!(invitation_id = %invitation_id, "Invitation was already revoked");
    }

    Ok(Json(RevokeInvitationResponse {
        success: true,
        ok: true,
    }))
}

/// POST /api/v1/invitations/accept
///
/// Redeem a token with a password and name, creating the member account.
pub async fn accept_invitation(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<AcceptInvitationRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let accepted = observe("redeem_invitation", state.invitations.redeem(request).await)?;

    Ok((
        StatusCode::CREATED,
        Json(AcceptInvitationResponse {
            success: true,
            email: accepted.email,
            message: "Account created. Please sign in.".to_string(),
        }),
    ))
}
