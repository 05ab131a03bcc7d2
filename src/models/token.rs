use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::credentials::mask_token;

/// Lifetime the vendor documents for access tokens (6 hours).
pub const DEFAULT_EXPIRES_IN: u64 = 21_600;

/// Tokens are treated as expired this long before their nominal deadline.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Access/refresh token pair obtained from `oauth/token/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of `access_token` in seconds, as reported by the vendor.
    pub expires_in: u64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// When the pair was issued, used to derive [`TokenPair::expires_at`].
    pub obtained_at: DateTime<Utc>,
}

impl TokenPair {
    /// Saturates at the latest representable instant for lifetimes that
    /// overflow the calendar.
    pub fn expires_at(&self) -> DateTime<Utc> {
        i64::try_from(self.expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| self.obtained_at.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        clock.has_passed(self.expires_at(), Duration::seconds(EXPIRY_MARGIN_SECS))
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &mask_token(&self.access_token))
            .field("refresh_token", &mask_token(&self.refresh_token))
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}
