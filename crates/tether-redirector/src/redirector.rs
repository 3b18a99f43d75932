use crate::Result;
use async_trait::async_trait;
use tether_core::{ClickContext, ShortCode, ShortUrl};

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a short code to its live record without recording a click.
    /// Fails with `NotFound` or `Expired`.
    async fn resolve(&self, code: &ShortCode) -> Result<ShortUrl>;

    /// Resolves a short code, records the click and returns the URL to
    /// redirect to. Expired codes are refused without recording anything.
    async fn redirect(&self, code: &ShortCode, context: ClickContext) -> Result<String>;
}
