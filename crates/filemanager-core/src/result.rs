//! Convenience result type alias for the file manager.

use crate::error::AppError;

/// A specialized `Result` type for file manager operations.
pub type AppResult<T> = Result<T, AppError>;
