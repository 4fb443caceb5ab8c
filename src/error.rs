use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortError {
    #[error("Timed out after receiving {received} of {expected} bytes")]
    Timeout { expected: usize, received: usize },

    #[error("No serial endpoint configured")]
    NoEndpoint,

    #[error("Short write: endpoint accepted {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

pub type PortResult<T> = std::result::Result<T, PortError>;

/// Status codes seen by the bootloader protocol layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderStatus {
    Success,
    Timeout,
    Fail,
}

impl<T> From<&PortResult<T>> for LoaderStatus {
    fn from(result: &PortResult<T>) -> Self {
        match result {
            Ok(_) => LoaderStatus::Success,
            Err(PortError::Timeout { .. }) => LoaderStatus::Timeout,
            Err(_) => LoaderStatus::Fail,
        }
    }
}
