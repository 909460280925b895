use thiserror::Error;

/// Unified error type for the storage, configuration and domain layers.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SplitError>;

impl From<std::io::Error> for SplitError {
    fn from(err: std::io::Error) -> Self {
        SplitError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for SplitError {
    fn from(err: serde_json::Error) -> Self {
        SplitError::Storage(err.to_string())
    }
}

/// User-facing shell error wrapper.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] SplitError),
    #[error("Command failed: {0}")]
    Command(String),
}
