use thiserror::Error;
use tether_core::{AliasViolation, StorageError, UrlViolation};

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] UrlViolation),
    #[error("invalid alias: {0}")]
    InvalidAlias(#[from] AliasViolation),
    #[error("alias already exists: {0}")]
    AliasConflict(String),
    #[error("could not find a free short code after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("invalid expiration: {0}")]
    InvalidExpiration(String),
    #[error("storage error: {0}")]
    Storage(#[source] StorageError),
}

impl ShortenerError {
    /// Whether the failure is the caller's fault rather than the service's.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::InvalidUrl(_)
            | Self::InvalidAlias(_)
            | Self::AliasConflict(_)
            | Self::NotFound(_)
            | Self::InvalidExpiration(_) => true,
            Self::GenerationExhausted { .. } | Self::Storage(_) => false,
        }
    }
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Conflict(code) => Self::AliasConflict(code),
            other => Self::Storage(other),
        }
    }
}
