//! Outbound HTTP to the Mailjet API.
//!
//! [`ApiTransport`] is the seam between the invocation adapter and the
//! network; [`MailjetClient`] is the production implementation.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, instrument};

use crate::core::config::MailjetConfig;
use crate::domains::openapi::HttpMethod;

use super::error::ToolError;

/// One request ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Path relative to the API base, query string included.
    pub path: String,
    /// Form-encoded body, for non-GET requests with body fields.
    pub body: Option<String>,
}

/// Raw upstream answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to the upstream API.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ToolError>;
}

// ============================================================================
// Mailjet Client
// ============================================================================

/// Authenticated Mailjet client with a per-request timeout and a cap on
/// concurrent requests.
pub struct MailjetClient {
    http: reqwest::Client,
    base_url: String,
    authorization: Option<HeaderValue>,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl MailjetClient {
    pub fn new(config: &MailjetConfig) -> Result<Self, ToolError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("mailjet-mcp-server/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        let authorization = config
            .api_key
            .as_deref()
            .map(|key| {
                HeaderValue::from_str(&format!("Basic {}", basic_token(key)))
                    .map_err(|_| ToolError::internal("MAILJET_API_KEY contains invalid header characters"))
            })
            .transpose()?;

        Ok(Self {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            authorization,
            timeout,
            permits: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ApiTransport for MailjetClient {
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ToolError> {
        let authorization = self
            .authorization
            .clone()
            .ok_or(ToolError::MissingCredential)?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ToolError::internal("request limiter closed"))?;

        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(request.method.to_reqwest(), &url)
            .header(AUTHORIZATION, authorization);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        debug!("Mailjet answered {} ({} bytes)", status, body.len());

        Ok(ApiResponse { status, body })
    }
}

impl MailjetClient {
    fn classify(&self, err: reqwest::Error) -> ToolError {
        if err.is_timeout() {
            ToolError::Timeout(self.timeout.as_secs())
        } else {
            ToolError::from(err)
        }
    }
}

/// Basic-auth token for a configured key.
///
/// A `public:private` pair is base64-encoded; anything else is taken to be
/// an already-encoded token.
pub fn basic_token(key: &str) -> String {
    let key = key.trim();
    if key.contains(':') {
        STANDARD.encode(key)
    } else {
        key.to_string()
    }
}
