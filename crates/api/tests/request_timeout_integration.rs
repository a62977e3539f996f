//! Requests that outlive the server timeout.
//!
//! The identity provider here answers only after the request timeout has
//! fired. The response is an `upstream` error, and the account writes still
//! finish (or are undone) after the response has gone out.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{assert_error, eventually, test_config, TestApp};
use domain::models::InvitationStatus;
use domain::services::{IdentityProvider, MockIdentityProvider, NewIdentity};
use domain::IdentityError;
use serde_json::json;
use uuid::Uuid;

/// Creates the account at once but reports back only after `delay`.
struct SlowIdentity {
    inner: Arc<MockIdentityProvider>,
    delay: Duration,
}

#[async_trait]
impl IdentityProvider for SlowIdentity {
    async fn create_user(&self, identity: NewIdentity) -> Result<Uuid, IdentityError> {
        let id = self.inner.create_user(identity).await?;
        tokio::time::sleep(self.delay).await;
        Ok(id)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        self.inner.delete_user(user_id).await
    }

    async fn sign_out_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        self.inner.sign_out_user(user_id).await
    }

    async fn authenticate(&self, bearer: &str) -> Result<Uuid, IdentityError> {
        self.inner.authenticate(bearer).await
    }
}

fn slow_app() -> TestApp {
    let config = test_config(&[
        ("server.request_timeout_secs", "1"),
        ("identity.timeout_ms", "500"),
    ]);
    TestApp::wrapping_identity(config, |mock| {
        Arc::new(SlowIdentity {
            inner: mock,
            delay: Duration::from_millis(1500),
        })
    })
}

fn new_member(email: &str) -> serde_json::Value {
    json!({
        "email": email,
        "password": "password1",
        "full_name": "Late Member",
        "role": "player"
    })
}

#[tokio::test]
async fn test_timed_out_request_is_upstream_json() {
    let app = slow_app();

    let (status, body) = app
        .post(
            "/api/v1/users",
            Some(&app.token(&app.creator)),
            new_member("late@riverside.test"),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&body, StatusCode::INTERNAL_SERVER_ERROR, "upstream");
}

#[tokio::test]
async fn test_provisioning_completes_after_timeout() {
    let app = slow_app();

    let (status, _) = app
        .post(
            "/api/v1/users",
            Some(&app.token(&app.creator)),
            new_member("late@riverside.test"),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let store = app.store.clone();
    assert!(
        eventually(|| store
            .profiles()
            .iter()
            .any(|p| p.email == "late@riverside.test" && p.is_active))
        .await
    );
    assert_eq!(app.identity.account_count(), 4);
}

#[tokio::test]
async fn test_compensation_runs_after_timeout() {
    let app = slow_app();
    app.store.set_fail_profile_insert(true);

    let (status, _) = app
        .post(
            "/api/v1/users",
            Some(&app.token(&app.creator)),
            new_member("doomed@riverside.test"),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let identity = app.identity.clone();
    assert!(eventually(|| identity.delete_calls() == 1).await);
    // Only the three seeded accounts remain.
    assert_eq!(app.identity.account_count(), 3);
}

#[tokio::test]
async fn test_redemption_completes_after_timeout() {
    let app = slow_app();
    let (id, token) = app.invite(&app.admin, "late-invitee@x.com", "player").await;
    let id = Uuid::parse_str(&id).unwrap();

    let (status, body) = app
        .post(
            "/api/v1/invitations/accept",
            None,
            json!({ "token": token, "password": "password1", "full_name": "Late Invitee" }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&body, StatusCode::INTERNAL_SERVER_ERROR, "upstream");

    let store = app.store.clone();
    assert!(
        eventually(|| store
            .invitation(id)
            .is_some_and(|i| i.status == InvitationStatus::Accepted))
        .await
    );
    assert!(app
        .store
        .profiles()
        .iter()
        .any(|p| p.email == "late-invitee@x.com" && p.is_active));
}
