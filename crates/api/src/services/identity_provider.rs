//! HTTP client for the identity provider's admin API.
//!
//! Talks to a GoTrue-compatible auth service with the service-role key.
//! Its admin API has no per-user logout, so session revocation is a ban.
//! Access tokens are verified locally with the shared HS256 secret, so
//! `authenticate` never leaves the process.

use std::time::Duration;

use async_trait::async_trait;
use domain::services::{IdentityProvider, NewIdentity};
use domain::IdentityError;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use shared::jwt::{AccessTokenVerifier, JwtError};
use uuid::Uuid;

use crate::config::IdentityConfig;

#[derive(Debug, Serialize)]
struct CreateUserBody<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
    user_metadata: UserMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct UserMetadata<'a> {
    full_name: &'a str,
    role: &'a str,
    organization_id: Uuid,
}

/// Ban long enough to outlive any deployment; lifted only by an operator.
const SESSION_BAN_DURATION: &str = "876000h";

#[derive(Debug, Serialize)]
struct BanBody {
    ban_duration: &'static str,
}

#[derive(Debug, Deserialize)]
struct CreatedUser {
    id: Uuid,
}

/// Error payload shapes returned by the auth service across versions.
#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorPayload {
    fn text(&self) -> String {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .unwrap_or("no error message")
            .to_string()
    }

    fn is_duplicate(&self) -> bool {
        matches!(self.error_code.as_deref(), Some("email_exists") | Some("user_already_exists"))
            || self.text().to_lowercase().contains("already been registered")
    }
}

/// Failure to build the client from configuration.
#[derive(Debug, thiserror::Error)]
pub enum IdentityClientError {
    #[error("Invalid identity configuration: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token verifier error: {0}")]
    Verifier(#[from] JwtError),
}

pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
    service_role_key: String,
    verifier: AccessTokenVerifier,
}

impl HttpIdentityProvider {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityClientError> {
        if config.base_url.is_empty() {
            return Err(IdentityClientError::Config("base_url is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let verifier = AccessTokenVerifier::new(&config.jwt_secret, config.jwt_leeway_secs)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_role_key: config.service_role_key.clone(),
            verifier,
        })
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}/admin/{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    async fn error_payload(response: Response) -> ErrorPayload {
        response.json::<ErrorPayload>().await.unwrap_or_default()
    }
}

fn transport_error(operation: &str, error: reqwest::Error) -> IdentityError {
    if error.is_timeout() {
        IdentityError::Timeout(format!("{operation}: {error}"))
    } else {
        IdentityError::Upstream(format!("{operation}: {error}"))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn create_user(&self, identity: NewIdentity) -> Result<Uuid, IdentityError> {
        let body = CreateUserBody {
            email: &identity.email,
            password: &identity.password,
            email_confirm: true,
            user_metadata: UserMetadata {
                full_name: &identity.full_name,
                role: identity.role.as_str(),
                organization_id: identity.organization_id,
            },
        };

        let response = self
            .authorized(self.client.post(self.admin_url("users")))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("create_user", e))?;

        let status = response.status();
        if status.is_success() {
            let created: CreatedUser = response
                .json()
                .await
                .map_err(|e| IdentityError::Upstream(format!("create_user: {e}")))?;
            tracing::debug!(user_id = %created.id, "Identity created");
            return Ok(created.id);
        }

        let payload = Self::error_payload(response).await;
        if status == StatusCode::CONFLICT
            || (status == StatusCode::UNPROCESSABLE_ENTITY && payload.is_duplicate())
        {
            return Err(IdentityError::AlreadyExists);
        }
        Err(IdentityError::Upstream(format!(
            "create_user returned {}: {}",
            status,
            payload.text()
        )))
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        let response = self
            .authorized(self.client.delete(self.admin_url(&format!("users/{user_id}"))))
            .send()
            .await
            .map_err(|e| transport_error("delete_user", e))?;

        let status = response.status();
        // Already gone counts as deleted.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let payload = Self::error_payload(response).await;
        Err(IdentityError::Upstream(format!(
            "delete_user returned {}: {}",
            status,
            payload.text()
        )))
    }

    /// Bans the user, which makes the auth service drop its sessions and
    /// refuse new sign-ins and token refreshes.
    async fn sign_out_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        let response = self
            .authorized(self.client.put(self.admin_url(&format!("users/{user_id}"))))
            .json(&BanBody {
                ban_duration: SESSION_BAN_DURATION,
            })
            .send()
            .await
            .map_err(|e| transport_error("sign_out_user", e))?;

        let status = response.status();
        // No identity means no sessions left to revoke.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let payload = Self::error_payload(response).await;
        Err(IdentityError::Upstream(format!(
            "sign_out_user returned {}: {}",
            status,
            payload.text()
        )))
    }

    async fn authenticate(&self, bearer: &str) -> Result<Uuid, IdentityError> {
        self.verifier.verify_subject(bearer).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            IdentityError::InvalidCredential
        })
    }
}
