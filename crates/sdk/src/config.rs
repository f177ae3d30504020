//! Configuration types for the Airflow SDK.

use crate::error::{AirflowError, AirflowResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Authentication scheme used against the Airflow REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// HTTP basic auth with username and password.
    Basic,
    /// Bearer token (JWT) auth.
    Bearer,
}

impl FromStr for AuthMode {
    type Err = AirflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "bearer" | "jwt" => Ok(Self::Bearer),
            other => Err(AirflowError::Config(format!(
                "unknown auth mode '{}' (expected basic, bearer or jwt)",
                other
            ))),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => f.write_str("basic"),
            Self::Bearer => f.write_str("bearer"),
        }
    }
}

/// Which class of operations callers may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessLevel {
    /// Only non-mutating operations.
    #[default]
    ReadOnly,
    /// Read and write operations.
    Full,
}

impl AccessLevel {
    /// Whether mutating operations are allowed.
    pub fn allows_writes(self) -> bool {
        self == Self::Full
    }
}

impl FromStr for AccessLevel {
    type Err = AirflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read_only" => Ok(Self::ReadOnly),
            "full" => Ok(Self::Full),
            other => Err(AirflowError::Config(format!(
                "unknown access level '{}' (expected read_only or full)",
                other
            ))),
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => f.write_str("read_only"),
            Self::Full => f.write_str("full"),
        }
    }
}

/// Validated credentials for the selected auth mode.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl Credentials {
    /// The auth mode these credentials belong to.
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::Basic { .. } => AuthMode::Basic,
            Self::Bearer { .. } => AuthMode::Bearer,
        }
    }

    fn authorization_header(&self) -> String {
        match self {
            Self::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
            }
            Self::Bearer { token } => format!("Bearer {}", token),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
        }
    }
}

/// Immutable connection settings for the Airflow client.
///
/// Only constructed through [`ClientConfigBuilder::build`], which validates
/// the credentials for the selected auth mode and precomputes the
/// `Authorization` header.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: Url,
    credentials: Credentials,
    authorization: String,
    access_level: AccessLevel,
    timeout: Duration,
    verify_tls: bool,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials)
            .field("access_level", &self.access_level)
            .field("timeout", &self.timeout)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Base URL of the Airflow webserver.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.credentials.mode()
    }

    /// Value of the `Authorization` header sent with every request.
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether TLS certificates are verified.
    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    auth_mode: AuthMode,
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    access_level: AccessLevel,
    timeout: Duration,
    verify_tls: bool,
}

impl ClientConfigBuilder {
    /// Create a new builder with defaults (basic auth, read-only, 30s timeout).
    pub fn new() -> Self {
        Self {
            base_url: None,
            auth_mode: AuthMode::Basic,
            username: None,
            password: None,
            token: None,
            access_level: AccessLevel::ReadOnly,
            timeout: Duration::from_secs(30),
            verify_tls: true,
        }
    }

    /// Set the base URL of the Airflow webserver.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn auth_mode(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the bearer token used with [`AuthMode::Bearer`].
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn access_level(mut self, level: AccessLevel) -> Self {
        self.access_level = level;
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> AirflowResult<ClientConfig> {
        let base_url_str = self
            .base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| AirflowError::Config("base_url is required".to_string()))?;
        let base_url = Url::parse(base_url_str.trim())?;
        if base_url.cannot_be_a_base() {
            return Err(AirflowError::Config(format!(
                "base_url '{}' cannot be used as a base address",
                base_url
            )));
        }

        let credentials = match self.auth_mode {
            AuthMode::Basic => match (non_empty(self.username), non_empty(self.password)) {
                (Some(username), Some(password)) => Credentials::Basic { username, password },
                _ => {
                    return Err(AirflowError::Config(
                        "username and password are required for basic auth".to_string(),
                    ))
                }
            },
            AuthMode::Bearer => match non_empty(self.token) {
                Some(token) => Credentials::Bearer { token },
                None => {
                    return Err(AirflowError::Config(
                        "token is required for bearer auth".to_string(),
                    ))
                }
            },
        };

        if self.timeout.is_zero() {
            return Err(AirflowError::Config("timeout must be greater than zero".to_string()));
        }

        let authorization = credentials.authorization_header();

        Ok(ClientConfig {
            base_url,
            credentials,
            authorization,
            access_level: self.access_level,
            timeout: self.timeout,
            verify_tls: self.verify_tls,
        })
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
