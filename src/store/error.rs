//! Error types for member store operations

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a backing member store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not execute the read or write
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Member not found
    #[error("Member not found: {0}")]
    NotFound(String),

    /// Member failed validation on write
    #[error("Invalid member: {0}")]
    Validation(String),

    /// A stored row could not be decoded back into a member
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Index initialization failed
    #[error("Index initialization failed: {0}")]
    IndexInit(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tantivy::TantivyError> for StoreError {
    fn from(err: tantivy::TantivyError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        StoreError::Validation(err.to_string())
    }
}
