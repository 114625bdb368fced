//! Error types for shopcheck

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the shopcheck Error
pub type Result<T> = std::result::Result<T, Error>;

/// shopcheck error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to load config fixture {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidSetting { var: String, value: String },

    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("Template {template:?} has no value for placeholder {{{placeholder}}}")]
    MissingPlaceholder { template: String, placeholder: String },

    #[error("Unknown user role: {0}")]
    UnknownUser(String),

    #[error("Invalid poll policy: {0}")]
    InvalidPolicy(String),

    #[error("{what} not verified after {attempts} attempts ({elapsed_ms} ms), last observed: {last_state}")]
    VerificationTimeout {
        what: String,
        attempts: u32,
        elapsed_ms: u64,
        last_state: String,
    },

    #[error("{what} failed on attempt {attempts}: {detail}")]
    VerificationFailed {
        what: String,
        attempts: u32,
        detail: String,
    },

    #[error("{what} cancelled after {attempts} attempts")]
    Cancelled { what: String, attempts: u32 },
}

impl Error {
    pub(crate) fn config_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::ConfigLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error aborts the whole run rather than a single scenario
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ConfigLoad { .. } | Error::InvalidSetting { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_placeholder_message_names_the_brace() {
        let err = Error::MissingPlaceholder {
            template: "/pet/{petId}".to_string(),
            placeholder: "petId".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Template \"/pet/{petId}\" has no value for placeholder {petId}"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(Error::config_load("data/urls.json", "missing").is_fatal());
        assert!(!Error::UnknownEndpoint("pet.fly".into()).is_fatal());
        assert!(!Error::VerificationTimeout {
            what: "pet 1".into(),
            attempts: 5,
            elapsed_ms: 4000,
            last_state: "HTTP 404".into(),
        }
        .is_fatal());
    }
}
