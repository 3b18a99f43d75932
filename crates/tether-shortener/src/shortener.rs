use crate::error::Result;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tether_core::{ShortCode, ShortUrl};

/// Expiration policy for a shortened URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpirationPolicy {
    /// The shortened URL never expires.
    #[default]
    Never,
    /// The shortened URL expires after a certain duration from creation.
    AfterDuration(Duration),
    /// The shortened URL expires at a specific timestamp, which may already
    /// be in the past.
    AtTimestamp(Timestamp),
}

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenParams {
    /// The original URL to be shortened.
    pub original_url: String,
    /// Optional caller-chosen short code. Validated before use.
    pub custom_alias: Option<String>,
    /// The expiration policy for the shortened URL.
    pub expiration: ExpirationPolicy,
}

impl ShortenParams {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            custom_alias: None,
            expiration: ExpirationPolicy::Never,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.custom_alias = Some(alias.into());
        self
    }

    pub fn with_expiration(mut self, expiration: ExpirationPolicy) -> Self {
        self.expiration = expiration;
        self
    }
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a shortened URL and returns the stored record.
    async fn create(&self, params: ShortenParams) -> Result<ShortUrl>;

    /// Returns the record for a short code, whether or not it has expired.
    async fn lookup(&self, code: &ShortCode) -> Result<ShortUrl>;

    /// Returns up to `limit` records in creation order, skipping the first `skip`.
    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<ShortUrl>>;

    /// Deletes a shortened URL and its click history.
    ///
    /// Deleting a code that does not exist fails with `NotFound`.
    async fn delete(&self, code: &ShortCode) -> Result<()>;
}
