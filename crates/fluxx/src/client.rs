//! Authenticated HTTP client for the Fluxx API.
//!
//! Tokens are obtained via the OAuth2 client-credentials flow and
//! cached under a fixed key; regeneration is single-winner through the
//! cache's per-key lock. The token value never leaves this module — it
//! only ever appears inside the `Authorization` header.

use std::sync::Arc;
use std::time::Duration;

use eventgrants_cache::CacheHandle;
use eventgrants_http::HttpTransport;
use serde_json::Value;

use crate::error::FluxxError;

const TOKEN_CACHE_KEY: &str = "eventgrants:fluxx:token";

/// Tokens are cached for the server-declared expiry, capped at 1 hour.
const TOKEN_TTL_CAP: Duration = Duration::from_secs(3600);

/// Fluxx connection settings.
#[derive(Debug, Clone)]
pub struct FluxxConfig {
    /// OAuth2 token endpoint URL.
    pub oauth_url: String,
    /// Base URL of the REST API; endpoint paths are appended as-is.
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl FluxxConfig {
    /// Load Fluxx settings from environment variables.
    ///
    /// | Env Var               | Default |
    /// |-----------------------|---------|
    /// | `FLUXX_OAUTH_URL`     | (empty) |
    /// | `FLUXX_BASE_URL`      | (empty) |
    /// | `FLUXX_CLIENT_ID`     | (empty) |
    /// | `FLUXX_CLIENT_SECRET` | (empty) |
    ///
    /// Missing credentials are not an error here; the client fails
    /// fast with an authentication error on first use instead.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self {
            oauth_url: var("FLUXX_OAUTH_URL"),
            base_url: var("FLUXX_BASE_URL"),
            client_id: var("FLUXX_CLIENT_ID"),
            client_secret: var("FLUXX_CLIENT_SECRET"),
        }
    }
}

/// HTTP client for the Fluxx API.
pub struct FluxxClient {
    transport: Arc<dyn HttpTransport>,
    cache: CacheHandle,
    config: FluxxConfig,
}

impl FluxxClient {
    pub fn new(transport: Arc<dyn HttpTransport>, cache: CacheHandle, config: FluxxConfig) -> Self {
        Self {
            transport,
            cache,
            config,
        }
    }

    /// POST a JSON body to an API endpoint with a bearer token
    /// attached. Returns the decoded JSON object on success.
    ///
    /// Authentication failures are translated into
    /// [`FluxxError::Request`] at this boundary.
    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, FluxxError> {
        let token = self.get_token().await.map_err(|e| {
            tracing::error!(error = %e, "Could not authenticate Fluxx API call");
            FluxxError::Request("authentication failed".into())
        })?;

        let url = format!("{}{}", self.config.base_url, endpoint);
        let headers = [
            ("Authorization".to_string(), format!("Bearer {token}")),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        self.post_internal(&url, body, &headers).await
    }

    /// POST and decode, applying the status / content-type / JSON
    /// checks shared by API calls and the token request.
    async fn post_internal(
        &self,
        url: &str,
        body: &Value,
        headers: &[(String, String)],
    ) -> Result<Value, FluxxError> {
        let response = self
            .transport
            .post_json(url, body, headers)
            .await
            .map_err(|e| {
                tracing::error!(url, error = %e, "Error in Fluxx api call");
                FluxxError::Request(e.to_string())
            })?;

        if !response.is_success() {
            tracing::error!(
                url,
                status = response.status,
                response_content = %response.body,
                "Error in Fluxx api call"
            );
            return Err(FluxxError::Request(format!("HTTP {}", response.status)));
        }

        if !response.has_json_content_type() {
            tracing::error!(
                url,
                status = response.status,
                content_type = response.content_type.as_deref().unwrap_or(""),
                response_content = %response.body,
                "Error in Fluxx api call: response is not JSON"
            );
            return Err(FluxxError::Request("response is not JSON".into()));
        }

        match serde_json::from_str::<Value>(&response.body) {
            Ok(parsed) if parsed.is_object() => Ok(parsed),
            _ => {
                tracing::error!(
                    url,
                    status = response.status,
                    response_content = %response.body,
                    "Error in Fluxx api call: response is not valid JSON"
                );
                Err(FluxxError::Request("response is not valid JSON".into()))
            }
        }
    }

    /// Return the cached bearer token, regenerating it if absent.
    async fn get_token(&self) -> Result<String, FluxxError> {
        if let Ok(Some(token)) = self.cache.get::<String>(TOKEN_CACHE_KEY).await {
            return Ok(token);
        }

        let _guard = self.cache.key_lock(TOKEN_CACHE_KEY).await;

        // Another caller may have regenerated while we waited.
        if let Ok(Some(token)) = self.cache.get::<String>(TOKEN_CACHE_KEY).await {
            return Ok(token);
        }

        let (token, ttl) = self.request_token().await?;
        if let Err(e) = self.cache.set(TOKEN_CACHE_KEY, &token, ttl).await {
            tracing::warn!(error = %e, "Failed to cache Fluxx token");
        }
        Ok(token)
    }

    /// Request a fresh token from the OAuth2 endpoint.
    async fn request_token(&self) -> Result<(String, Duration), FluxxError> {
        // Fail fast if we're missing the necessary configuration.
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            tracing::error!("Missing configuration for the Fluxx API");
            return Err(FluxxError::Authentication(
                "client ID and secret not configured".into(),
            ));
        }

        let body = serde_json::json!({
            "grant_type": "client_credentials",
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret,
        });
        let headers = [("Content-Type".to_string(), "application/json".to_string())];

        let response = self
            .post_internal(&self.config.oauth_url, &body, &headers)
            .await
            .map_err(|e| FluxxError::Authentication(e.to_string()))?;

        let token = response.get("access_token").and_then(Value::as_str);
        let expires_in = response.get("expires_in").and_then(Value::as_u64);
        match (token, expires_in) {
            (Some(token), Some(expires_in)) => {
                let ttl = Duration::from_secs(expires_in).min(TOKEN_TTL_CAP);
                Ok((token.to_string(), ttl))
            }
            _ => Err(FluxxError::Authentication(
                "response does not contain token".into(),
            )),
        }
    }
}
