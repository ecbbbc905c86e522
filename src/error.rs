use serde::Serialize;
use std::fmt;

/// Application error types for better error handling and user feedback.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    /// Errors related to the local reminder store
    Storage(String),
    /// Errors related to data validation
    Validation(String),
    /// Errors related to alarm scheduling
    Schedule(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Schedule(msg) => write!(f, "Schedule error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Conversion to String for CLI-facing return types
impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.to_string()
    }
}

// Convenience constructors
impl AppError {
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        AppError::Storage(msg.into())
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn schedule<S: Into<String>>(msg: S) -> Self {
        AppError::Schedule(msg.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
