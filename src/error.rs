//! Unified error types for docs-versioning.

use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Handled(#[from] HandledError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether the user has already been told about this failure
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled(_))
    }
}

/// A failure that was already reported to the user by whoever raised it.
///
/// Top-level handlers exit with a failure status without printing anything
/// else when they see this.
#[derive(Debug, Default, Clone, PartialEq, Eq, Error)]
#[error("{}", .message.as_deref().unwrap_or("handled error"))]
pub struct HandledError {
    message: Option<String>,
}

impl HandledError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown option {key:?} (no field named {field:?})")]
    UnknownOption { key: String, field: String },

    #[error("Option {key:?} sets field {field:?}, which {previous:?} already set")]
    DuplicateOption {
        key: String,
        previous: String,
        field: String,
    },

    #[error("Invalid value for option {key:?}: expected {expected}")]
    InvalidValue { key: String, expected: &'static str },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handled_error_display() {
        assert_eq!(HandledError::new().to_string(), "handled error");
        assert_eq!(
            HandledError::with_message("branch gh-pages not found").to_string(),
            "branch gh-pages not found"
        );
        assert_eq!(HandledError::new().message(), None);
    }

    #[test]
    fn test_handled_error_converts() {
        let e: AppError = HandledError::with_message("already printed").into();
        assert!(e.is_handled());
        assert_eq!(e.to_string(), "already printed");
    }

    #[test]
    fn test_other_errors_are_not_handled() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(!e.is_handled());

        let e: AppError = ConfigError::Parse("bad toml".into()).into();
        assert!(!e.is_handled());
    }

    #[test]
    fn test_handled_error_type_discrimination() {
        let handled = anyhow::Error::new(HandledError::new());
        assert!(handled.downcast_ref::<HandledError>().is_some());

        let other = anyhow::Error::new(ConfigError::Parse("nope".into()));
        assert!(other.downcast_ref::<HandledError>().is_none());
    }

    #[test]
    fn test_config_error_messages() {
        let e = ConfigError::UnknownOption {
            key: "--colour".into(),
            field: "colour".into(),
        };
        insta::assert_snapshot!(e.to_string(), @r#"Unknown option "--colour" (no field named "colour")"#);

        let e = ConfigError::InvalidValue {
            key: "--verbose".into(),
            expected: "a boolean",
        };
        insta::assert_snapshot!(e.to_string(), @r#"Invalid value for option "--verbose": expected a boolean"#);
    }
}
