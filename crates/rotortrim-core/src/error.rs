//! Error types for rotortrim core
//!
//! This module defines all error types used throughout the diagnostic engine.
//! We use `thiserror` for ergonomic error definitions with automatic Display/Error implementations.
//!
//! Missing measurements and locked stages are NOT errors: they surface as
//! [`StepStatus`](crate::stage::StepStatus) values.

use thiserror::Error;

/// Result type alias for rotortrim operations
pub type Result<T> = std::result::Result<T, RotorTrimError>;

/// Main error type for rotortrim operations
#[derive(Error, Debug)]
pub enum RotorTrimError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Stage id not part of the workflow
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// Blade colour code not recognised
    #[error("Unknown blade: {0}")]
    UnknownBlade(String),

    /// Vertical smoothing option outside 1..=2
    #[error("Invalid tab option {0}, expected 1 or 2")]
    InvalidOption(u8),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<RotorTrimError>,
    },
}

/// Errors raised while loading the parameter set.
///
/// Cloneable so a single-initialization cell can hand the same failure to
/// every caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("Key {key} must be a finite number, got {found}")]
    NotNumeric { key: String, found: String },

    #[error("Key {key} has the wrong type, expected {expected}")]
    WrongType { key: String, expected: String },

    #[error("Invalid {format} config: {message}")]
    Parse { format: String, message: String },

    #[error("Cannot read config {path}: {message}")]
    Io { path: String, message: String },

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl RotorTrimError {
    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let err = RotorTrimError::from(ConfigError::MissingKey("sep_tol_in".into()));
        let err = err.context("Failed to load parameters");

        let text = err.to_string();
        assert!(text.contains("Failed to load parameters"));
        assert!(text.contains("sep_tol_in"));
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(RotorTrimError::UnknownStage("cruise".into()));
        let result = result.with_context(|| "Detail lookup failed".to_string());

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Detail lookup failed"));
    }

    #[test]
    fn test_config_error_is_cloneable() {
        let err = ConfigError::NotNumeric {
            key: "ground_ips_limit".into(),
            found: "\"fast\"".into(),
        };
        assert_eq!(err.clone(), err);
        assert!(err.to_string().contains("ground_ips_limit"));
    }
}
