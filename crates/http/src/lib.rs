//! Outbound HTTP transport seam.
//!
//! The lookup services talk to their upstreams through
//! [`HttpTransport`] so tests can substitute a mock and count calls.
//! [`ReqwestTransport`] is the production implementation: fixed short
//! timeout, optional outbound proxy, no retries — failures propagate
//! immediately and the caller decides what to do.

use std::time::Duration;

use async_trait::async_trait;

/// Default timeout applied to every outbound call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A completed upstream response.
///
/// The body is kept as raw text so callers can apply their own
/// content-type and JSON checks (and log the raw payload on failure).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the `Content-Type` header declares JSON, ignoring
    /// parameters such as `; charset=utf-8`.
    pub fn has_json_content_type(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| {
                ct.split(';')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .eq_ignore_ascii_case("application/json")
            })
            .unwrap_or(false)
    }
}

/// Errors from the transport layer (network, DNS, TLS, timeout).
///
/// Non-2xx statuses are *not* transport errors; they come back as
/// [`HttpResponse`] values so callers can log status and body.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Minimal HTTP surface the lookup services need.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST a JSON body with additional headers.
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, HttpError>;

    /// Plain GET (the caller builds any query string into `url`).
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

/// Build a URL with an encoded query string.
pub fn build_url(base: &str, params: &[(&str, &str)]) -> Result<String, HttpError> {
    let url = reqwest::Url::parse_with_params(base, params)
        .map_err(|e| HttpError::Client(format!("invalid URL {base:?}: {e}")))?;
    Ok(url.into())
}

/// Production transport backed by [`reqwest`].
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the default 5-second timeout.
    pub fn new(proxy: Option<&str>) -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT, proxy)
    }

    pub fn with_timeout(timeout: Duration, proxy: Option<&str>) -> Result<Self, HttpError> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(proxy) = proxy {
            let proxy =
                reqwest::Proxy::all(proxy).map_err(|e| HttpError::Client(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(|e| HttpError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    async fn read_response(response: reqwest::Response) -> Result<HttpResponse, HttpError> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, HttpError> {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Self::read_response(response).await
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Self::read_response(response).await
    }
}
