//! Result type alias for rubric operations

use crate::error::RubricError;

/// Standard Result type for rubric operations
pub type Result<T> = std::result::Result<T, RubricError>;
