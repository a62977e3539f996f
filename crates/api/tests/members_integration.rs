//! Route tests for direct member provisioning and deactivation.

mod common;

use axum::http::{Method, StatusCode};
use common::{assert_error, TestApp};
use domain::models::{AuditAction, Role};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::json;
use uuid::Uuid;

// ============================================================================
// POST /api/v1/users
// ============================================================================

#[tokio::test]
async fn test_creator_creates_member() {
    let app = TestApp::new();
    let email: String = SafeEmail().fake();
    let name: String = Name().fake();

    let (status, body) = app
        .post(
            "/api/v1/users",
            Some(&app.token(&app.creator)),
            json!({
                "email": email,
                "password": "password1",
                "full_name": name,
                "role": "admin"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], email.to_lowercase());
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["full_name"], name);

    let id = Uuid::parse_str(body["user"]["id"].as_str().unwrap()).unwrap();
    let profile = app.store.profile(id).unwrap();
    assert_eq!(profile.organization_id, app.org.id);
    assert_eq!(profile.created_by, Some(app.creator.id));
    assert!(app.identity.has_account(id));

    let logs = app.store.activity_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, AuditAction::UserCreated);
}

#[tokio::test]
async fn test_create_member_accepts_camel_case_name() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/v1/users",
            Some(&app.token(&app.creator)),
            json!({
                "email": "camel@riverside.test",
                "password": "password1",
                "fullName": "Camel Case",
                "role": "player"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["full_name"], "Camel Case");
}

#[tokio::test]
async fn test_admin_cannot_create_member_directly() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/v1/users",
            Some(&app.token(&app.admin)),
            json!({
                "email": "new@riverside.test",
                "password": "password1",
                "full_name": "New Player",
                "role": "player"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, StatusCode::FORBIDDEN, "authorization");
    assert_eq!(app.identity.create_calls(), 0);
}

#[tokio::test]
async fn test_short_password_rejected_before_identity_call() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/v1/users",
            Some(&app.token(&app.creator)),
            json!({
                "email": "new@riverside.test",
                "password": "short",
                "full_name": "New Player",
                "role": "player"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "validation");
    assert_eq!(app.identity.create_calls(), 0);
}

#[tokio::test]
async fn test_creator_role_cannot_be_provisioned() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/v1/users",
            Some(&app.token(&app.creator)),
            json!({
                "email": "boss@riverside.test",
                "password": "password1",
                "full_name": "Second Boss",
                "role": "creator"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "validation");
}

#[tokio::test]
async fn test_duplicate_member_conflicts() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/v1/users",
            Some(&app.token(&app.creator)),
            json!({
                "email": "PLAYER@riverside.test",
                "password": "password1",
                "full_name": "Copy Cat",
                "role": "player"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_error(&body, StatusCode::CONFLICT, "conflict");
}

#[tokio::test]
async fn test_profile_failure_rolls_back_identity() {
    let app = TestApp::new();
    app.store.set_fail_profile_insert(true);

    let (status, body) = app
        .post(
            "/api/v1/users",
            Some(&app.token(&app.creator)),
            json!({
                "email": "doomed@riverside.test",
                "password": "password1",
                "full_name": "Doomed",
                "role": "player"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&body, StatusCode::INTERNAL_SERVER_ERROR, "upstream");
    assert_eq!(app.identity.delete_calls(), 1);
    // The three seeded accounts remain; the new one was removed.
    assert_eq!(app.identity.account_count(), 3);
}

#[tokio::test]
async fn test_failed_rollback_reports_rollback_failure() {
    let app = TestApp::new();
    app.store.set_fail_profile_insert(true);
    app.identity.set_fail_delete(true);

    let (status, body) = app
        .post(
            "/api/v1/users",
            Some(&app.token(&app.creator)),
            json!({
                "email": "orphan@riverside.test",
                "password": "password1",
                "full_name": "Orphan",
                "role": "player"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&body, StatusCode::INTERNAL_SERVER_ERROR, "rollback_failure");
    assert_eq!(app.identity.account_count(), 4);
}

#[tokio::test]
async fn test_missing_token_is_unauthenticated() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/v1/users", None, json!({ "email": "a@b.test" }))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, StatusCode::UNAUTHORIZED, "authentication");
}

#[tokio::test]
async fn test_unknown_token_is_unauthenticated() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/v1/users", Some("not-a-session"), json!({}))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error(&body, StatusCode::UNAUTHORIZED, "authentication");
}

#[tokio::test]
async fn test_token_without_active_profile_is_forbidden() {
    let app = TestApp::new();
    let stranger = Uuid::new_v4();
    app.identity
        .register_account(stranger, "stranger@x.test", app.org.id, Role::Player);
    let token = app.identity.issue_session(stranger);

    let (status, body) = app.get("/api/v1/invitations", Some(&token)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, StatusCode::FORBIDDEN, "authorization");
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let app = TestApp::new();
    let request = common::build_request(
        Method::POST,
        "/api/v1/users",
        Some(&app.token(&app.creator)),
        None,
        None,
    );
    let (status, body) = common::send_request(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "validation");
}

// ============================================================================
// POST /api/v1/members/deactivate
// ============================================================================

#[tokio::test]
async fn test_admin_deactivates_player() {
    let app = TestApp::new();
    let player_session = app.token(&app.player);

    let (status, body) = app
        .post(
            "/api/v1/members/deactivate",
            Some(&app.token(&app.admin)),
            json!({ "target_user_id": app.player.id }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "player@riverside.test has been deactivated");
    assert!(!app.store.profile(app.player.id).unwrap().is_active);

    // The deactivated member's session no longer authenticates.
    let (status, _) = app.get("/api/v1/invitations", Some(&player_session)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deactivated_member_with_new_token_is_forbidden() {
    let app = TestApp::new();
    app.post(
        "/api/v1/members/deactivate",
        Some(&app.token(&app.creator)),
        json!({ "targetUserId": app.admin.id }),
    )
    .await;

    let (status, _) = app
        .get("/api/v1/invitations", Some(&app.token(&app.admin)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_self_deactivation_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/v1/members/deactivate",
            Some(&app.token(&app.admin)),
            json!({ "target_user_id": app.admin.id }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "validation");
}

#[tokio::test]
async fn test_creator_cannot_be_deactivated() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/v1/members/deactivate",
            Some(&app.token(&app.admin)),
            json!({ "target_user_id": app.creator.id }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_error(&body, StatusCode::FORBIDDEN, "authorization");
    assert!(app.store.profile(app.creator.id).unwrap().is_active);
}

#[tokio::test]
async fn test_missing_target_is_validation_error() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/v1/members/deactivate",
            Some(&app.token(&app.creator)),
            json!({}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, StatusCode::BAD_REQUEST, "validation");
}

#[tokio::test]
async fn test_target_in_other_organization_not_found() {
    let app = TestApp::new();
    let other = app.store.seed_organization("Other Club", "other");
    let outsider = app
        .store
        .seed_profile(other.id, Role::Player, "outsider@other.test");

    let (status, body) = app
        .post(
            "/api/v1/members/deactivate",
            Some(&app.token(&app.creator)),
            json!({ "target_user_id": outsider.id }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, StatusCode::NOT_FOUND, "not_found");
    assert!(app.store.profile(outsider.id).unwrap().is_active);
}

#[tokio::test]
async fn test_sign_out_failure_reports_upstream_but_keeps_deactivation() {
    let app = TestApp::new();
    app.identity.set_fail_sign_out(true);

    let (status, body) = app
        .post(
            "/api/v1/members/deactivate",
            Some(&app.token(&app.creator)),
            json!({ "target_user_id": app.player.id }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&body, StatusCode::INTERNAL_SERVER_ERROR, "upstream");
    assert!(!app.store.profile(app.player.id).unwrap().is_active);
    assert_eq!(
        app.store.activity_logs()[0].metadata["sessions_revoked"],
        false
    );
}
