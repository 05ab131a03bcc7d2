pub mod cache;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod duration;
pub mod error;
pub mod flow;
pub mod hubic;
pub mod models;

pub use error::{AuthError, AuthResult};
pub use flow::AuthFlow;
