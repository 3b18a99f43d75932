use crate::error::Result;
use std::sync::Arc;
use tether_core::{ClickContext, ClickEvent, Clock, Repository, SystemClock};
use tracing::trace;

/// Appends click events and keeps the owning record's counters in step.
///
/// The event insert, the `click_count` increment and the `last_accessed`
/// update are a single [`Repository::record_click`] call, so the counter
/// always equals the number of stored events.
pub struct ClickRecorder<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> Clone for ClickRecorder<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R: Repository> ClickRecorder<R> {
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    /// Creates a recorder over a repository that other services also hold.
    pub fn from_shared(repository: Arc<R>) -> Self {
        Self {
            repository,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Records one click on `short_url_id`, stamped with the recorder's clock.
    pub async fn record(&self, short_url_id: i64, context: ClickContext) -> Result<ClickEvent> {
        let at = self.clock.now();
        let event = self
            .repository
            .record_click(short_url_id, context, at)
            .await?;
        trace!(short_url_id, click_id = event.id, "recorded click");
        Ok(event)
    }
}
