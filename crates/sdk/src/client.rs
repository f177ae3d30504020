//! Main client for the Airflow SDK.

use crate::config::ClientConfig;
use crate::error::AirflowResult;
use crate::transport::HttpTransport;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

/// Handle for talking to one Airflow webserver.
///
/// Cheap to create from a shared [`ClientConfig`]; the underlying connection
/// pool is released when the handle is dropped.
#[derive(Debug, Clone)]
pub struct AirflowClient {
    config: Arc<ClientConfig>,
    http: HttpTransport,
}

impl AirflowClient {
    /// Create a client from a validated configuration.
    pub fn new(config: Arc<ClientConfig>) -> AirflowResult<Self> {
        let http = HttpTransport::new(config.clone())?;
        Ok(Self { config, http })
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue one request against `/api/v1/<segments>` and return the decoded
    /// body. Each segment is encoded separately.
    pub async fn request<S: AsRef<str>>(
        &self,
        method: Method,
        segments: &[S],
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> AirflowResult<Value> {
        self.http.request(method, segments, query, body).await
    }

    /// Get Airflow health status.
    pub async fn health(&self) -> AirflowResult<Value> {
        self.http.get("/health").await
    }
}
