//! shopcheck common library
//!
//! Configuration resolution, endpoint templating and eventual-consistency
//! polling shared by the storefront and pet-store checks.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod poll;
pub mod users;

// Re-export commonly used types
pub use config::{Config, EnvSource, ProcessEnv};
pub use endpoint::{ApiEndpoint, PetEndpoint, StoreEndpoint, UiEndpoint};
pub use error::{Error, Result};
pub use poll::{poll_until, poll_until_cancelled, PollPolicy, Probe, UnexpectedPolicy, Verified};
pub use users::{Credentials, Users};

/// shopcheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build a placeholder map for [`Config::api_url`] from `(name, value)` pairs
pub fn params<const N: usize>(pairs: [(&str, String); N]) -> std::collections::HashMap<&str, String> {
    pairs.into_iter().collect()
}
