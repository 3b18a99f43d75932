use thiserror::Error;

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Why a custom alias was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AliasViolation {
    #[error("alias cannot be empty")]
    Empty,
    #[error("alias must be at least {min} characters, got {len}")]
    TooShort { len: usize, min: usize },
    #[error("alias must be at most {max} characters, got {len}")]
    TooLong { len: usize, max: usize },
    #[error("alias contains {0:?}; only alphanumeric characters, hyphens and underscores are allowed")]
    InvalidCharacter(char),
}

/// Why an original URL was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlViolation {
    #[error("URL cannot be empty")]
    Empty,
    #[error("URL must be at most {max} bytes, got {len}")]
    TooLong { len: usize, max: usize },
    #[error("URL is malformed: {0}")]
    Malformed(String),
    #[error("URL scheme must be http or https, got {0}")]
    UnsupportedScheme(String),
    #[error("URL must have a host")]
    MissingHost,
}

/// Failures reported by a record store.
///
/// The services treat everything except [`StorageError::Conflict`] as opaque.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short code already exists: {0}")]
    Conflict(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}
