use std::fmt;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::credentials::mask_token;

use super::token::EXPIRY_MARGIN_SECS;

/// Object-storage credentials returned by `1.0/account/credentials`.
///
/// This is the final artifact of the flow: `token` authenticates requests
/// against the storage cluster reachable at `endpoint`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCredentials {
    pub token: String,
    pub endpoint: String,
    /// Expiry reported by the vendor, e.g. `2019-12-14T22:52:45+01:00`.
    #[serde(default)]
    pub expires: Option<DateTime<FixedOffset>>,
}

impl StorageCredentials {
    /// Credentials without a reported expiry never expire locally; the
    /// storage cluster rejecting them is the only signal.
    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        match self.expires {
            Some(expires) => clock.has_passed(
                expires.to_utc(),
                Duration::seconds(EXPIRY_MARGIN_SECS),
            ),
            None => false,
        }
    }
}

impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("token", &mask_token(&self.token))
            .field("endpoint", &self.endpoint)
            .field("expires", &self.expires)
            .finish()
    }
}
