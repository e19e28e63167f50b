//! Error types for the automat worker

use automat_core::CoreError;
use thiserror::Error;

/// Worker error types
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The automaton definition could not be loaded
    #[error("Automaton definition error: {0}")]
    AutomatonError(String),

    /// A request was rejected by the intake
    #[error("Intake error: {0}")]
    IntakeError(String),

    /// Processing did not finish in time
    #[error("Processing of instance {0} did not finish")]
    ProcessingTimeout(String),

    /// Runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

/// Result type for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;

impl From<CoreError> for WorkerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConfigurationError(msg) => WorkerError::ConfigurationError(msg),
            CoreError::ValidationError(_) | CoreError::StorageError(_) => {
                WorkerError::IntakeError(err.to_string())
            }
            _ => WorkerError::RuntimeError(err.to_string()),
        }
    }
}

impl From<std::io::Error> for WorkerError {
    fn from(err: std::io::Error) -> Self {
        WorkerError::RuntimeError(format!("IO error: {}", err))
    }
}

impl WorkerError {
    /// Whether the error is caused by invalid configuration
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            WorkerError::ConfigurationError(_) | WorkerError::AutomatonError(_)
        )
    }
}
