//! Error types and handling for rubric operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for rubric operations
#[derive(Debug, Error)]
pub enum RubricError {
    /// Syntax errors reported by the Ruby parser
    #[error("Parse error: {message} at line {line}, column {column}")]
    ParseError {
        message: String,
        offset: usize,
        line: usize,
        column: usize,
    },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Rule construction errors (e.g. a pattern that does not compile)
    #[error("Rule error in '{rule_id}': {message}")]
    RuleError { rule_id: String, message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Autofix errors
    #[error("Autofix error: {message}")]
    AutofixError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Config,
    Rule,
    Io,
    Autofix,
}

impl RubricError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RubricError::ParseError { .. } => ErrorKind::Parse,
            RubricError::ConfigError { .. } => ErrorKind::Config,
            RubricError::RuleError { .. } => ErrorKind::Rule,
            RubricError::IoError { .. } => ErrorKind::Io,
            RubricError::AutofixError { .. } => ErrorKind::Autofix,
        }
    }

    /// Check if this error is recoverable (can continue processing other files)
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Parse | ErrorKind::Io)
    }

    /// Create a parse error at a byte offset of `source`
    pub fn parse_error(message: impl Into<String>, source: &str, offset: usize) -> Self {
        let (line, column) = crate::diagnostics::line_column(source, offset);
        Self::ParseError {
            message: message.into(),
            offset,
            line,
            column,
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a rule error
    pub fn rule_error(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleError {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an autofix error
    pub fn autofix_error(message: impl Into<String>) -> Self {
        Self::AutofixError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_position() {
        let err = RubricError::parse_error("unexpected `end`", "x = 1\nend", 6);
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Parse error: unexpected `end` at line 2, column 1"
        );
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = RubricError::io_error(
            "lib/app.rb",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "IO error for path 'lib/app.rb': missing");
    }

    #[test]
    fn test_config_error_is_fatal() {
        let err = RubricError::config_error("bad severity");
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(!err.is_recoverable());
    }
}
