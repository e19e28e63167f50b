use thiserror::Error;

/// Core error type for automaton processing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid configuration, e.g. a worker bound to an unknown state
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// State lookup failed
    #[error("State {0} is not part of the automaton.")]
    StateNotFound(String),

    /// No transition is declared for the state and input symbol
    #[error("No state transition for state {state} and input symbol {symbol}.")]
    TransitionNotFound {
        /// Name of the state the lookup started from
        state: String,
        /// The offending input symbol
        symbol: String,
    },

    /// Processing instance lookup failed
    #[error("No ProcessingInstance with id {0}.")]
    ProcessingInstanceNotFound(String),

    /// The injected domain work failed
    #[error("{0}")]
    WorkError(String),

    /// Persisting a record failed
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Sending a command or publishing an event failed
    #[error("Messaging error: {0}")]
    MessagingError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Input/output error
    #[error("Input/output error: {0}")]
    IOError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Name of the error variant, used where a message is required but empty
    pub fn kind_name(&self) -> &'static str {
        match self {
            CoreError::ConfigurationError(_) => "ConfigurationError",
            CoreError::StateNotFound(_) => "StateNotFound",
            CoreError::TransitionNotFound { .. } => "TransitionNotFound",
            CoreError::ProcessingInstanceNotFound(_) => "ProcessingInstanceNotFound",
            CoreError::WorkError(_) => "WorkError",
            CoreError::StorageError(_) => "StorageError",
            CoreError::MessagingError(_) => "MessagingError",
            CoreError::ValidationError(_) => "ValidationError",
            CoreError::SerializationError(_) => "SerializationError",
            CoreError::IOError(_) => "IOError",
            CoreError::Other(_) => "Other",
        }
    }

    /// Whether the error stems from a failed lookup
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::StateNotFound(_)
                | CoreError::TransitionNotFound { .. }
                | CoreError::ProcessingInstanceNotFound(_)
        )
    }

    /// Human readable description; falls back to the variant name for empty messages
    pub fn describe(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            self.kind_name().to_string()
        } else {
            message
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::IOError(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_error_display() {
        let errors = vec![
            (CoreError::ConfigurationError("bad".to_string()), "Configuration error: bad"),
            (CoreError::StateNotFound("S9".to_string()), "State S9 is not part of the automaton."),
            (
                CoreError::TransitionNotFound {
                    state: "S1".to_string(),
                    symbol: "a".to_string(),
                },
                "No state transition for state S1 and input symbol a.",
            ),
            (
                CoreError::ProcessingInstanceNotFound("abc".to_string()),
                "No ProcessingInstance with id abc.",
            ),
            (CoreError::WorkError("work failed".to_string()), "work failed"),
            (CoreError::StorageError("db down".to_string()), "Storage error: db down"),
            (CoreError::MessagingError("broker down".to_string()), "Messaging error: broker down"),
            (CoreError::ValidationError("too long".to_string()), "Validation error: too long"),
            (CoreError::Other("other_err".to_string()), "other_err"),
        ];

        for (error, expected_msg) in errors {
            assert_eq!(error.to_string(), expected_msg);
        }
    }

    #[test]
    fn test_describe_falls_back_to_kind_name() {
        assert_eq!(CoreError::WorkError(String::new()).describe(), "WorkError");
        assert_eq!(CoreError::Other("  ".to_string()).describe(), "Other");
        assert_eq!(CoreError::WorkError("boom".to_string()).describe(), "boom");
    }

    #[test]
    fn test_is_not_found() {
        assert!(CoreError::StateNotFound("S3".to_string()).is_not_found());
        assert!(CoreError::ProcessingInstanceNotFound("x".to_string()).is_not_found());
        assert!(!CoreError::StorageError("x".to_string()).is_not_found());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: CoreError = json_error.into();

        match error {
            CoreError::SerializationError(msg) => {
                assert!(msg.contains("expected value"));
            }
            _ => panic!("Expected SerializationError variant"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let error: CoreError = io_error.into();

        match error {
            CoreError::IOError(msg) => {
                assert!(msg.contains("file not found"));
            }
            _ => panic!("Expected IOError variant"),
        }
    }

    #[test]
    fn test_from_str() {
        let error: CoreError = "test error message".into();
        assert_eq!(error, CoreError::Other("test error message".to_string()));
    }
}
