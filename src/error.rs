//! Error taxonomy for the hubiC authorization flow.
//!
//! Every step of the flow returns [`AuthError`] so callers can tell apart
//! failures that need new input (bad configuration, denied consent), failures
//! that need a fresh login (invalid token) and failures a retry policy may
//! absorb (5xx, transport timeouts). No retry is performed here.

use reqwest::StatusCode;
use serde::Deserialize;

/// Convenience alias used across the flow.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing or unreadable client/user credential sources or config.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A response lacked the field the current step needs.
    ///
    /// `body` keeps the raw response for diagnostics; it is not part of the
    /// display string.
    #[error("malformed response from {endpoint} (HTTP {status}): {reason}")]
    MalformedResponse {
        endpoint: &'static str,
        status: u16,
        reason: String,
        body: String,
    },

    /// The vendor redirected back with `error`/`error_description` instead of a code.
    #[error("authorization denied: {error}: {description}")]
    AuthorizationDenied { error: String, description: String },

    /// The `state` echoed in the redirect does not match the one sent.
    #[error("anti-forgery state mismatch (received {received:?})")]
    StateMismatch {
        expected: String,
        received: Option<String>,
    },

    /// 401/403 from the token or credentials endpoint.
    #[error("token rejected by {endpoint} (HTTP {status}): {error}: {description}")]
    TokenInvalid {
        endpoint: &'static str,
        status: u16,
        error: String,
        description: String,
    },

    /// Any other 4xx: the request itself must be fixed before trying again.
    #[error("request rejected by {endpoint} (HTTP {status}): {error}: {description}")]
    InvalidRequest {
        endpoint: &'static str,
        status: u16,
        error: String,
        description: String,
    },

    /// 5xx from the vendor.
    #[error("server error from {endpoint} (HTTP {status})")]
    TransientServerError {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("HTTP request to {endpoint} failed")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("credential cache failure")]
    Cache(#[source] anyhow::Error),

    #[error("interactive prompt failed")]
    Prompt(#[source] std::io::Error),
}

impl AuthError {
    /// Whether a caller-side retry policy may reasonably try the same call again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AuthError::TransientServerError { .. } => true,
            AuthError::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            _ => false,
        }
    }

    /// Whether the failure means the held token is unusable and the full
    /// authorization flow has to run again.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::TokenInvalid { .. })
    }

    pub(crate) fn transport(endpoint: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| AuthError::Transport { endpoint, source }
    }

    pub(crate) fn malformed(
        endpoint: &'static str,
        status: StatusCode,
        reason: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        AuthError::MalformedResponse {
            endpoint,
            status: status.as_u16(),
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// Classify a non-success HTTP response from a JSON endpoint.
    ///
    /// The vendor reports failures as `{"error": ..., "error_description": ...}`;
    /// when the body is not that shape the raw body is used as the description.
    pub(crate) fn from_status(endpoint: &'static str, status: StatusCode, body: String) -> Self {
        if status.is_server_error() {
            return AuthError::TransientServerError {
                endpoint,
                status: status.as_u16(),
                body,
            };
        }

        let vendor = VendorError::parse(&body);
        let error = vendor
            .error
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        let description = vendor.error_description.unwrap_or(body);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AuthError::TokenInvalid {
                endpoint,
                status: status.as_u16(),
                error,
                description,
            },
            _ => AuthError::InvalidRequest {
                endpoint,
                status: status.as_u16(),
                error,
                description,
            },
        }
    }
}

/// Error body shape shared by the token and account endpoints.
#[derive(Debug, Default, Deserialize)]
struct VendorError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl VendorError {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_token_invalid() {
        let err = AuthError::from_status(
            "oauth/token/",
            StatusCode::UNAUTHORIZED,
            r#"{"error":"unauthorized_client","error_description":"please verify credentials"}"#
                .to_string(),
        );

        match &err {
            AuthError::TokenInvalid {
                status,
                error,
                description,
                ..
            } => {
                assert_eq!(*status, 401);
                assert_eq!(error, "unauthorized_client");
                assert_eq!(description, "please verify credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.requires_reauthentication());
        assert!(!err.is_retryable());
    }

    #[test]
    fn forbidden_maps_to_token_invalid() {
        let err = AuthError::from_status(
            "1.0/account/credentials",
            StatusCode::FORBIDDEN,
            r#"{"error":"invalid_token","error_description":"revoked"}"#.to_string(),
        );
        assert!(matches!(err, AuthError::TokenInvalid { status: 403, .. }));
    }

    #[test]
    fn bad_request_is_client_input_error() {
        let err = AuthError::from_status(
            "oauth/token/",
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_request","error_description":"expired code"}"#.to_string(),
        );

        match &err {
            AuthError::InvalidRequest { error, description, .. } => {
                assert_eq!(error, "invalid_request");
                assert_eq!(description, "expired code");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.is_retryable());
        assert!(!err.requires_reauthentication());
    }

    #[test]
    fn server_error_is_retryable() {
        let err = AuthError::from_status(
            "oauth/token/",
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"server_error","error_description":"please retry"}"#.to_string(),
        );
        assert!(matches!(
            err,
            AuthError::TransientServerError { status: 500, .. }
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn non_json_error_body_becomes_description() {
        let err = AuthError::from_status(
            "oauth/token/",
            StatusCode::BAD_REQUEST,
            "<html>nope</html>".to_string(),
        );

        match err {
            AuthError::InvalidRequest { error, description, .. } => {
                assert_eq!(error, "Bad Request");
                assert_eq!(description, "<html>nope</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_display_omits_body() {
        let err = AuthError::malformed(
            "oauth/auth/",
            StatusCode::OK,
            "missing oauth form field",
            "<html>secret-ish page</html>",
        );
        let message = err.to_string();
        assert!(message.contains("missing oauth form field"));
        assert!(!message.contains("secret-ish"));
    }
}
