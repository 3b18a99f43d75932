use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tether_core::{ClickEvent, ReadRepository, ShortCode, ShortUrl};
use tracing::trace;
use typed_builder::TypedBuilder;

pub const DEFAULT_RECENT_CLICKS: u64 = 10;

#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct AnalyticsSettings {
    /// Maximum number of click events returned with [`UrlStats`].
    #[builder(default = DEFAULT_RECENT_CLICKS)]
    pub recent_clicks_limit: u64,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A record together with its most recent clicks, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlStats {
    #[serde(flatten)]
    pub url: ShortUrl,
    pub recent_clicks: Vec<ClickEvent>,
}

/// Read-only statistics over stored records and click events.
#[derive(Debug)]
pub struct AnalyticsService<R> {
    repository: Arc<R>,
    settings: AnalyticsSettings,
}

impl<R> Clone for AnalyticsService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            settings: self.settings,
        }
    }
}

impl<R: ReadRepository> AnalyticsService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
            settings: AnalyticsSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AnalyticsSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the record for `code` and its latest click events.
    ///
    /// Expired records still have stats; only a missing code is an error.
    pub async fn stats(&self, code: &ShortCode) -> Result<UrlStats> {
        trace!(code = %code, "computing stats");

        let url = self
            .repository
            .get(code)
            .await?
            .ok_or_else(|| AnalyticsError::NotFound(code.to_string()))?;

        let recent_clicks = self
            .repository
            .recent_clicks(url.id, self.settings.recent_clicks_limit)
            .await?;

        Ok(UrlStats { url, recent_clicks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::{SignedDuration, Timestamp};
    use tether_core::{ClickContext, NewShortUrl, Repository};
    use tether_storage::InMemoryRepository;

    fn base() -> Timestamp {
        Timestamp::from_second(1_700_000_000).unwrap()
    }

    async fn seeded(clicks: i64) -> (Arc<InMemoryRepository>, ShortUrl) {
        let repo = Arc::new(InMemoryRepository::new());
        let stored = repo
            .insert(NewShortUrl {
                original_url: "https://example.com".to_string(),
                short_code: ShortCode::new_unchecked("stats"),
                created_at: base(),
                expires_at: None,
            })
            .await
            .unwrap();

        for i in 0..clicks {
            repo.record_click(
                stored.id,
                ClickContext {
                    referer: Some(format!("https://ref{i}.example")),
                    ..Default::default()
                },
                base() + SignedDuration::from_mins(i),
            )
            .await
            .unwrap();
        }
        (repo, stored)
    }

    #[tokio::test]
    async fn stats_for_missing_code() {
        let service = AnalyticsService::new(InMemoryRepository::new());

        let err = service
            .stats(&ShortCode::new_unchecked("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::NotFound(ref c) if c == "missing"));
    }

    #[tokio::test]
    async fn stats_without_clicks() {
        let (repo, stored) = seeded(0).await;
        let service = AnalyticsService::new(repo);

        let stats = service.stats(&stored.short_code).await.unwrap();
        assert_eq!(stats.url, stored);
        assert!(stats.recent_clicks.is_empty());
    }

    #[tokio::test]
    async fn recent_clicks_are_bounded_and_newest_first() {
        let (repo, stored) = seeded(15).await;
        let service = AnalyticsService::new(repo);

        let stats = service.stats(&stored.short_code).await.unwrap();
        assert_eq!(stats.url.click_count, 15);
        assert_eq!(stats.url.last_accessed, Some(base() + SignedDuration::from_mins(14)));
        assert_eq!(stats.recent_clicks.len(), 10);
        assert_eq!(
            stats.recent_clicks[0].referer.as_deref(),
            Some("https://ref14.example")
        );
        assert!(stats
            .recent_clicks
            .windows(2)
            .all(|pair| pair[0].clicked_at >= pair[1].clicked_at));
    }

    #[tokio::test]
    async fn window_size_is_configurable() {
        let (repo, stored) = seeded(5).await;
        let service = AnalyticsService::new(repo)
            .with_settings(AnalyticsSettings::builder().recent_clicks_limit(2).build());

        let stats = service.stats(&stored.short_code).await.unwrap();
        assert_eq!(stats.recent_clicks.len(), 2);
    }

    #[tokio::test]
    async fn stats_is_idempotent() {
        let (repo, stored) = seeded(3).await;
        let service = AnalyticsService::new(repo);

        let first = service.stats(&stored.short_code).await.unwrap();
        let second = service.stats(&stored.short_code).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn stats_serializes_flat() {
        let (repo, stored) = seeded(1).await;
        let service = AnalyticsService::new(repo);

        let stats = service.stats(&stored.short_code).await.unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["short_code"], "stats");
        assert_eq!(json["click_count"], 1);
        assert_eq!(json["recent_clicks"].as_array().map(Vec::len), Some(1));
    }
}
