mod grant;
mod storage_credentials;
mod token;

pub use grant::{AuthorizationGrant, FormToken};
pub use storage_credentials::StorageCredentials;
pub use token::{TokenPair, DEFAULT_EXPIRES_IN, EXPIRY_MARGIN_SECS};
