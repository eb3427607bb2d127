//! Error types for the Fluxx client and grant lookup.

/// Errors from the Fluxx HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum FluxxError {
    /// A bearer token could not be obtained: credentials are missing
    /// or the token endpoint rejected the request. Never escapes
    /// [`FluxxClient::post`](crate::FluxxClient::post) — it is
    /// translated to [`Request`](Self::Request) there so callers see a
    /// single vocabulary for "could not complete the call".
    #[error("Fluxx authentication failed: {0}")]
    Authentication(String),

    /// The upstream call failed: transport error, non-success status,
    /// missing/non-JSON content type, or a malformed body. Transient;
    /// never cached.
    #[error("Fluxx request failed: {0}")]
    Request(String),
}

/// Errors from grant-ID validation.
#[derive(Debug, thiserror::Error)]
pub enum GrantLookupError {
    /// The upstream system confirmed the ID does not validate: no
    /// matching, granted, non-expired record exists.
    #[error("Grant ID is not valid")]
    InvalidGrantId,

    /// The upstream call itself failed; retryable, distinct from "not
    /// found".
    #[error(transparent)]
    Request(#[from] FluxxError),
}
