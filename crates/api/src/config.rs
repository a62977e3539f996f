use serde::Deserialize;
use shared::validation::ALLOWED_EXPIRY_HOURS;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    /// Identity provider connection
    pub identity: IdentityConfig,
    /// Invitation issuing defaults
    #[serde(default)]
    pub invitations: InvitationsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Per client IP limit on the public redeem route. 0 disables it.
    #[serde(default = "default_redeem_rate_limit")]
    pub redeem_rate_limit_per_minute: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            redeem_rate_limit_per_minute: default_redeem_rate_limit(),
        }
    }
}

/// Identity provider (GoTrue-compatible admin API) configuration.
#[derive(Clone, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the auth service, e.g. `https://project.example.co/auth/v1`
    pub base_url: String,

    /// Service-role key used for admin calls
    #[serde(default)]
    pub service_role_key: String,

    /// HS256 secret the provider signs access tokens with
    pub jwt_secret: String,

    #[serde(default = "default_identity_timeout_ms")]
    pub timeout_ms: u64,

    /// Clock skew tolerance for token expiry
    #[serde(default = "default_jwt_leeway")]
    pub jwt_leeway_secs: u64,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("base_url", &self.base_url)
            .field("service_role_key", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("timeout_ms", &self.timeout_ms)
            .field("jwt_leeway_secs", &self.jwt_leeway_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvitationsConfig {
    /// Public URL of the web client that hosts the accept page
    #[serde(default = "default_site_url")]
    pub site_url: String,

    #[serde(default = "default_expires_hours")]
    pub default_expires_hours: u32,
}

impl Default for InvitationsConfig {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            default_expires_hours: default_expires_hours(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_redeem_rate_limit() -> u32 {
    10
}
fn default_identity_timeout_ms() -> u64 {
    10_000
}
fn default_jwt_leeway() -> u64 {
    shared::jwt::DEFAULT_LEEWAY_SECS
}
fn default_site_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_expires_hours() -> u32 {
    72
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with ROSTER__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("ROSTER").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Built entirely from embedded defaults and overrides so tests do not
    /// depend on the working directory. Validation is skipped.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            redeem_rate_limit_per_minute = 0

            [identity]
            base_url = "http://localhost:9999"
            service_role_key = "test-service-role-key"
            jwt_secret = "test-jwt-secret-for-roster-tests"
            timeout_ms = 2000
            jwt_leeway_secs = 0

            [invitations]
            site_url = "http://localhost:3000"
            default_expires_hours = 72
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "ROSTER__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.identity.base_url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "ROSTER__IDENTITY__BASE_URL environment variable must be set".to_string(),
            ));
        }

        if self.identity.jwt_secret.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "ROSTER__IDENTITY__JWT_SECRET environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        let request_timeout_ms = self.server.request_timeout_secs.saturating_mul(1000);
        if request_timeout_ms == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "server.request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.identity.timeout_ms >= request_timeout_ms {
            return Err(ConfigValidationError::InvalidValue(
                "identity.timeout_ms must be below server.request_timeout_secs".to_string(),
            ));
        }

        if self.database.connect_timeout_secs >= self.server.request_timeout_secs {
            return Err(ConfigValidationError::InvalidValue(
                "database.connect_timeout_secs must be below server.request_timeout_secs"
                    .to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if !ALLOWED_EXPIRY_HOURS.contains(&self.invitations.default_expires_hours) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "invitations.default_expires_hours must be one of {:?}",
                ALLOWED_EXPIRY_HOURS
            )));
        }

        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "server.host '{}' is not an IP address",
                self.server.host
            )));
        }

        Ok(())
    }

    /// Listening address. Falls back to all interfaces when the host does
    /// not parse; `validate` rejects that case at startup.
    pub fn socket_addr(&self) -> SocketAddr {
        let ip = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        SocketAddr::new(ip, self.server.port)
    }
}
