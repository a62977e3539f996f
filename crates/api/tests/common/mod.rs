//! Common test utilities for route tests.
//!
//! The router is built over the in-memory store and identity provider, so
//! these tests need no database or network.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use domain::models::{Organization, Profile, Role};
use domain::repositories::MockStore;
use domain::services::{CoreContext, IdentityProvider, MockIdentityProvider};
use roster_api::app::{build_router, AppState};
use roster_api::config::Config;
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tower::ServiceExt;

pub const SITE_URL: &str = "https://app.roster.test";

/// Configuration for route tests, with extra overrides applied on top.
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut all = vec![
        ("database.url", "postgres://unused"),
        ("invitations.site_url", SITE_URL),
    ];
    all.extend_from_slice(overrides);
    Config::load_for_test(&all).expect("Failed to load test config")
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MockStore>,
    pub identity: Arc<MockIdentityProvider>,
    pub org: Organization,
    pub creator: Profile,
    pub admin: Profile,
    pub player: Profile,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config(&[]))
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MockStore::new());
        let identity = Arc::new(MockIdentityProvider::new());
        let core = CoreContext::with_mocks(store.clone(), identity.clone());
        Self::assemble(config, store, identity, core)
    }

    /// Mock store with a caller-supplied identity provider.
    pub fn with_identity(config: Config, provider: Arc<dyn IdentityProvider>) -> Self {
        Self::wrapping_identity(config, |_| provider)
    }

    /// Mock store with an identity provider built around the mock one, so
    /// seeded accounts and sessions still resolve.
    pub fn wrapping_identity(
        config: Config,
        wrap: impl FnOnce(Arc<MockIdentityProvider>) -> Arc<dyn IdentityProvider>,
    ) -> Self {
        let store = Arc::new(MockStore::new());
        let identity = Arc::new(MockIdentityProvider::new());
        let mut core = CoreContext::with_mocks(store.clone(), identity.clone());
        core.identity = wrap(identity.clone());
        Self::assemble(config, store, identity, core)
    }

    fn assemble(
        config: Config,
        store: Arc<MockStore>,
        identity: Arc<MockIdentityProvider>,
        core: CoreContext,
    ) -> Self {
        let org = store.seed_organization("Riverside Club", "riverside");
        let creator = store.seed_profile(org.id, Role::Creator, "owner@riverside.test");
        let admin = store.seed_profile(org.id, Role::Admin, "admin@riverside.test");
        let player = store.seed_profile(org.id, Role::Player, "player@riverside.test");
        for profile in [&creator, &admin, &player] {
            identity.register_account(profile.id, &profile.email, org.id, profile.role);
        }

        let router = build_router(AppState::new(config, core, store.clone()));

        Self {
            router,
            store,
            identity,
            org,
            creator,
            admin,
            player,
        }
    }

    /// A fresh session token for `profile`.
    pub fn token(&self, profile: &Profile) -> String {
        self.identity.issue_session(profile.id)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = build_request(method, uri, token, body, None);
        send_request(&self.router, request).await
    }

    /// POST from a specific client address.
    pub async fn post_from(
        &self,
        peer: SocketAddr,
        uri: &str,
        body: Value,
    ) -> (StatusCode, Value) {
        let request = build_request(Method::POST, uri, None, Some(body), Some(peer));
        send_request(&self.router, request).await
    }

    /// Issue an invitation as `inviter` and return (invitation id, raw token).
    pub async fn invite(&self, inviter: &Profile, email: &str, role: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/v1/invitations",
                Some(&self.token(inviter)),
                serde_json::json!({ "email": email, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["invitation"]["id"].as_str().unwrap().to_string();
        let url = body["invitation"]["invite_url"].as_str().unwrap();
        (id, token_from_url(url))
    }
}

pub fn build_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
    peer: Option<SocketAddr>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let mut request = builder.body(body).unwrap();
    if let Some(peer) = peer {
        request.extensions_mut().insert(ConnectInfo(peer));
    }
    request
}

pub async fn send_request(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).to_string())
        })
    };
    (status, body)
}

/// Extract the raw token from an invite URL.
pub fn token_from_url(url: &str) -> String {
    url.split("token=")
        .nth(1)
        .expect("invite url carries a token")
        .to_string()
}

/// Poll `check` until it holds or about five seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..50 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    check()
}

/// Assert the shape of a failure body.
pub fn assert_error(body: &Value, status: StatusCode, code: &str) {
    assert_eq!(body["success"], false, "{body}");
    assert_eq!(body["code"], code, "{body}");
    assert_eq!(body["status"], status.as_u16(), "{body}");
    assert!(body["error"].is_string(), "{body}");
}
