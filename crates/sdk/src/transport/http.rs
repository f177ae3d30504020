//! HTTP transport layer for the Airflow SDK.

use crate::config::ClientConfig;
use crate::error::{AirflowError, AirflowResult};
use reqwest::{header, Client, Method};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Path segments every endpoint lives under.
pub const API_PREFIX: [&str; 2] = ["api", "v1"];

/// HTTP transport for making Airflow API requests.
///
/// No retries and no caching: every call is a fresh request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> AirflowResult<Self> {
        let mut headers = header::HeaderMap::new();

        let mut auth = header::HeaderValue::from_str(config.authorization())
            .map_err(|_| AirflowError::Config("Invalid credential format".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verify_tls())
            .build()?;

        Ok(Self { client, config })
    }

    /// Build the full URL from path segments such as `["dags", id]`.
    ///
    /// Each segment is percent-encoded on its own, so a `/` inside an id
    /// stays part of that segment.
    pub(crate) fn build_url<I>(&self, segments: I) -> AirflowResult<url::Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.config.base_url().clone();
        url.path_segments_mut()
            .map_err(|_| AirflowError::Config("base_url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    /// Execute a request and decode the JSON response body.
    ///
    /// Non-2xx responses fail with [`AirflowError::Upstream`]; an empty
    /// success body decodes to `null`.
    pub async fn request<S: AsRef<str>>(
        &self,
        method: Method,
        segments: &[S],
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> AirflowResult<Value> {
        let url = self.build_url(segments)?;
        debug!(method = %method, url = %url, "Airflow request");

        let mut request = self.client.request(method, url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Airflow returned an error status");
            return Err(AirflowError::from_response(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Execute a GET request on a fixed path such as `/health`.
    pub async fn get(&self, path: &str) -> AirflowResult<Value> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.request(Method::GET, &segments, &[], None).await
    }
}
