use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Lock timeout")]
    LockTimeout,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Page checksum mismatch: {0}")]
    PageChecksumMismatch(String),

    #[error("Page type mismatch: {0}")]
    PageTypeMismatch(String),

    #[error("Storage not found: {0}")]
    StorageNotFound(String),

    #[error("Storage already registered: {0}")]
    StorageDuplicateId(String),

    #[error("Storage name already in use: {0}")]
    StorageDuplicateName(String),

    #[error("Storage factory received metadata of the wrong type: {0}")]
    StorageWrongMetadataType(String),

    #[error("Invalid storage option: {0}")]
    StorageInvalidOption(String),
}

impl Clone for DbError {
    fn clone(&self) -> Self {
        match self {
            DbError::Io(e) => DbError::IoError(e.to_string()),
            DbError::Storage(s) => DbError::Storage(s.clone()),
            DbError::Serialization(s) => DbError::Serialization(s.clone()),
            DbError::LockTimeout => DbError::LockTimeout,
            DbError::NotFound(s) => DbError::NotFound(s.clone()),
            DbError::AlreadyExists(s) => DbError::AlreadyExists(s.clone()),
            DbError::InvalidInput(s) => DbError::InvalidInput(s.clone()),
            DbError::InvalidOperation(s) => DbError::InvalidOperation(s.clone()),
            DbError::Internal(s) => DbError::Internal(s.clone()),
            DbError::IoError(s) => DbError::IoError(s.clone()),
            DbError::Timeout(s) => DbError::Timeout(s.clone()),
            DbError::PageNotFound(s) => DbError::PageNotFound(s.clone()),
            DbError::PageChecksumMismatch(s) => DbError::PageChecksumMismatch(s.clone()),
            DbError::PageTypeMismatch(s) => DbError::PageTypeMismatch(s.clone()),
            DbError::StorageNotFound(s) => DbError::StorageNotFound(s.clone()),
            DbError::StorageDuplicateId(s) => DbError::StorageDuplicateId(s.clone()),
            DbError::StorageDuplicateName(s) => DbError::StorageDuplicateName(s.clone()),
            DbError::StorageWrongMetadataType(s) => DbError::StorageWrongMetadataType(s.clone()),
            DbError::StorageInvalidOption(s) => DbError::StorageInvalidOption(s.clone()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

// Error conversions for common error types

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::Serialization(e.to_string())
    }
}
