//! Error types for search operations

use crate::error::AppError;
use crate::store::StoreError;

/// Message shown to callers when the backing store fails
pub const STORE_FAILURE_MESSAGE: &str = "Search failed. Please try again.";

/// Message shown to callers for faults nobody anticipated
pub const UNEXPECTED_FAILURE_MESSAGE: &str = "An unexpected error occurred during search.";

/// Errors that can occur during a search call
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The backing store failed during the primary read
    #[error("Search execution failed: {0}")]
    Store(#[from] StoreError),

    /// The query itself cannot be executed
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A fault escaped the search pipeline
    #[error("Unexpected search failure: {0}")]
    Unexpected(String),
}

impl SearchError {
    /// Message safe to show to end users
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Store(_) => STORE_FAILURE_MESSAGE.to_string(),
            SearchError::InvalidQuery(detail) => format!("Invalid search query: {}", detail),
            SearchError::InvalidConfiguration(_) | SearchError::Unexpected(_) => {
                UNEXPECTED_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            SearchError::InvalidQuery(msg) => AppError::Validation(msg),
            SearchError::Store(err) => AppError::Store(err.to_string()),
            SearchError::Unexpected(msg) => AppError::Internal(msg),
        }
    }
}
