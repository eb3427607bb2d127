//! Authorization seam for grant mutations.
//!
//! Policy lives with the caller; this module only answers yes/no. The
//! default implementation compares a bearer token against the
//! configured editor token.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

/// Decides whether a request may modify grant associations.
pub trait PermissionChecker: Send + Sync {
    fn can_manage_grants(&self, bearer_token: Option<&str>) -> bool;
}

/// Allows mutations only to callers presenting the configured editor
/// token. With no token configured, every mutation is rejected.
pub struct TokenPermissionChecker {
    editor_token: Option<String>,
}

impl TokenPermissionChecker {
    pub fn new(editor_token: Option<String>) -> Self {
        Self { editor_token }
    }
}

impl PermissionChecker for TokenPermissionChecker {
    fn can_manage_grants(&self, bearer_token: Option<&str>) -> bool {
        match (&self.editor_token, bearer_token) {
            (Some(expected), Some(presented)) => expected == presented,
            _ => false,
        }
    }
}

/// Extract the bearer token from the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
