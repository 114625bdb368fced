//! Error types for the end-to-end suite

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error(transparent)]
    Core(#[from] shopcheck_common::Error),

    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("{method} {url} returned {status}: {body}")]
    UnexpectedStatus {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("Journey not found: {0}")]
    JourneyNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

impl E2eError {
    /// Whether the run could not be set up, as opposed to a check failing
    pub fn is_setup_error(&self) -> bool {
        match self {
            E2eError::Core(e) => e.is_fatal(),
            E2eError::PlaywrightNotFound => true,
            _ => false,
        }
    }
}
