use tether_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[derive(Debug, Clone, Error)]
pub enum AnalyticsError {
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
