use thiserror::Error;

use crate::browser::BrowserError;

/// Errors surfaced by a `generate` call
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The automation engine (Chrome/Chromium) could not be found, fetched or launched
    #[error("Browser environment unavailable: {0}")]
    EnvironmentUnavailable(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Page evaluation failed: {0}")]
    Page(String),

    #[error("Login still required after interactive login on {0}")]
    LoginRequired(String),

    #[error("Operator did not signal readiness within {0} seconds")]
    ReadinessTimeout(u64),

    #[error("Operator console error: {0}")]
    Console(String),

    #[error("Cancelled by operator")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),
}

impl BridgeError {
    /// Errors that end the call without the operator inspection pause
    pub fn skips_inspection_pause(&self) -> bool {
        matches!(
            self,
            BridgeError::Cancelled
                | BridgeError::Console(_)
                | BridgeError::InvalidArgument(_)
                | BridgeError::Config(_)
                | BridgeError::EnvironmentUnavailable(_)
        )
    }
}

/// Launch and setup failures mean the automation engine is unavailable
impl From<BrowserError> for BridgeError {
    fn from(err: BrowserError) -> Self {
        BridgeError::EnvironmentUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::JsonParseError(err.to_string())
    }
}

impl From<serde_yaml::Error> for BridgeError {
    fn from(err: serde_yaml::Error) -> Self {
        BridgeError::Config(err.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::IoError(err.to_string())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
