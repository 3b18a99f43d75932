use tether_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedirectError>;

#[derive(Debug, Clone, Error)]
pub enum RedirectError {
    /// The code was never created, or has been deleted.
    #[error("short code not found: {0}")]
    NotFound(String),
    /// The code exists but its expiration time has passed.
    #[error("short code has expired: {0}")]
    Expired(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
