use crate::error::Result;
use crate::record::{ClickContext, ClickEvent, NewShortUrl, ShortUrl};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use std::sync::Arc;

/// A read-only view of a record store.
///
/// This trait provides only the read operations from [`Repository`],
/// allowing services like the analytics aggregator to have read-only access.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the record for a given short code, expired or not.
    /// Returns `None` if the code does not exist.
    async fn get(&self, code: &ShortCode) -> Result<Option<ShortUrl>>;

    /// Returns up to `limit` records in creation order, skipping the first `skip`.
    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<ShortUrl>>;

    /// Returns up to `limit` click events of a record, newest first.
    async fn recent_clicks(&self, short_url_id: i64, limit: u64) -> Result<Vec<ClickEvent>>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new record and returns it with its assigned id.
    ///
    /// The uniqueness check and the insert are one atomic operation.
    /// Returns `Err(Conflict)` if the code already exists.
    async fn insert(&self, record: NewShortUrl) -> Result<ShortUrl>;

    /// Appends a click event, increments the owner's click count by one and
    /// sets its last access time to `at`, all or nothing.
    ///
    /// Returns `Err(NotFound)` if the owning record does not exist.
    async fn record_click(
        &self,
        short_url_id: i64,
        context: ClickContext,
        at: Timestamp,
    ) -> Result<ClickEvent>;

    /// Deletes the record for a given short code together with its click events.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;
}

#[async_trait]
impl<R: ReadRepository + ?Sized> ReadRepository for Arc<R> {
    async fn get(&self, code: &ShortCode) -> Result<Option<ShortUrl>> {
        (**self).get(code).await
    }

    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<ShortUrl>> {
        (**self).list(skip, limit).await
    }

    async fn recent_clicks(&self, short_url_id: i64, limit: u64) -> Result<Vec<ClickEvent>> {
        (**self).recent_clicks(short_url_id, limit).await
    }
}

#[async_trait]
impl<R: Repository + ?Sized> Repository for Arc<R> {
    async fn insert(&self, record: NewShortUrl) -> Result<ShortUrl> {
        (**self).insert(record).await
    }

    async fn record_click(
        &self,
        short_url_id: i64,
        context: ClickContext,
        at: Timestamp,
    ) -> Result<ClickEvent> {
        (**self).record_click(short_url_id, context, at).await
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        (**self).delete(code).await
    }
}
