use std::sync::Arc;

use crate::error::{RedirectError, Result};
use crate::redirector::Redirector;
use async_trait::async_trait;
use tether_analytics::ClickRecorder;
use tether_core::{ClickContext, Clock, Repository, ShortCode, ShortUrl, SystemClock};
use tracing::{debug, trace, warn};

/// Service for handling URL redirects.
///
/// Looks records up in the repository, handles expiration checks and hands
/// successful redirects to a [`ClickRecorder`].
pub struct RedirectorService<R> {
    repository: Arc<R>,
    recorder: ClickRecorder<R>,
    clock: Arc<dyn Clock>,
}

impl<R> Clone for RedirectorService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            recorder: self.recorder.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R: Repository> RedirectorService<R> {
    /// Creates a new RedirectorService with the given repository.
    pub fn new(repository: R) -> Self {
        let repository = Arc::new(repository);
        Self {
            recorder: ClickRecorder::from_shared(Arc::clone(&repository)),
            repository,
            clock: Arc::new(SystemClock),
        }
    }

    /// Uses `clock` both for expiry checks and for click timestamps.
    pub fn with_clock<C: Clock + Clone>(mut self, clock: C) -> Self {
        self.recorder = self.recorder.with_clock(clock.clone());
        self.clock = Arc::new(clock);
        self
    }

    /// Resolves a short code to its original URL without recording a click.
    ///
    /// # Returns
    ///
    /// * `Ok(record)` - The record if found and not expired
    /// * `Err(NotFound)` - If the code doesn't exist
    /// * `Err(Expired)` - If the code exists but has expired
    /// * `Err(Storage)` - If there was an error accessing the repository
    pub async fn resolve(&self, code: &ShortCode) -> Result<ShortUrl> {
        Redirector::resolve(self, code).await
    }

    /// Resolves a short code and records the click; see [`Redirector::redirect`].
    pub async fn redirect(&self, code: &ShortCode, context: ClickContext) -> Result<String> {
        Redirector::redirect(self, code, context).await
    }
}

#[async_trait]
impl<R: Repository> Redirector for RedirectorService<R> {
    async fn resolve(&self, code: &ShortCode) -> Result<ShortUrl> {
        trace!(code = %code, "resolving short code");

        let Some(record) = self.repository.get(code).await? else {
            trace!(code = %code, "Short code not found");
            return Err(RedirectError::NotFound(code.to_string()));
        };

        if record.is_expired_at(self.clock.now()) {
            debug!(code = %code, "Record has expired");
            return Err(RedirectError::Expired(code.to_string()));
        }

        Ok(record)
    }

    async fn redirect(&self, code: &ShortCode, context: ClickContext) -> Result<String> {
        let record = Redirector::resolve(self, code).await?;

        if let Err(e) = self.recorder.record(record.id, context).await {
            warn!(code = %code, error = %e, "failed to record click");
        }

        debug!(code = %code, url = %record.original_url, "Resolved short code");
        Ok(record.original_url)
    }
}
