use std::fmt;

use crate::error::{AuthError, AuthResult};

/// One-time anti-CSRF token scraped from the login page (`<input name="oauth">`).
///
/// Valid for a single login submission.
#[derive(Clone, PartialEq, Eq)]
pub struct FormToken(String);

impl FormToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FormToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FormToken").field(&self.0).finish()
    }
}

/// Query parameters carried by the post-login redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGrant {
    /// Single-use authorization code.
    pub code: String,
    /// Scope echoed by the vendor.
    pub scope: Option<String>,
    /// Anti-forgery state echoed by the vendor.
    pub state: Option<String>,
}

impl AuthorizationGrant {
    /// Reject the grant unless the echoed state equals the one sent in the
    /// authorization request.
    pub fn verify_state(&self, expected: &str) -> AuthResult<()> {
        match self.state.as_deref() {
            Some(received) if received == expected => Ok(()),
            received => Err(AuthError::StateMismatch {
                expected: expected.to_string(),
                received: received.map(str::to_string),
            }),
        }
    }
}
