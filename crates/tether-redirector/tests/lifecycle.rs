use jiff::{SignedDuration, Timestamp};
use std::sync::Arc;
use tether_analytics::{AnalyticsError, AnalyticsService};
use tether_core::{ClickContext, Clock, ManualClock, ReadRepository, ShortCode};
use tether_generator::RandomGenerator;
use tether_redirector::{RedirectError, RedirectorService};
use tether_shortener::{
    ExpirationPolicy, ShortenParams, Shortener, ShortenerError, ShortenerService,
};
use tether_storage::InMemoryRepository;

struct Harness {
    repo: Arc<InMemoryRepository>,
    clock: ManualClock,
    shortener: ShortenerService<Arc<InMemoryRepository>, RandomGenerator>,
    redirector: RedirectorService<Arc<InMemoryRepository>>,
    analytics: AnalyticsService<Arc<InMemoryRepository>>,
}

impl Harness {
    fn new() -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let clock = ManualClock::new(Timestamp::from_second(1_700_000_000).unwrap());
        Self {
            shortener: ShortenerService::new(Arc::clone(&repo), RandomGenerator::default())
                .with_clock(clock.clone()),
            redirector: RedirectorService::new(Arc::clone(&repo)).with_clock(clock.clone()),
            analytics: AnalyticsService::new(Arc::clone(&repo)),
            repo,
            clock,
        }
    }
}

fn visitor(n: usize) -> ClickContext {
    ClickContext {
        ip_address: Some(format!("192.0.2.{n}")),
        user_agent: Some("integration-test".to_string()),
        referer: None,
    }
}

#[tokio::test]
async fn alias_lifecycle() {
    let h = Harness::new();
    let abc = ShortCode::new_unchecked("abc");

    let created = h
        .shortener
        .create(ShortenParams::new("https://example.com/page").with_alias("abc"))
        .await
        .unwrap();
    assert_eq!(created.short_code, abc);
    assert_eq!(created.click_count, 0);

    for n in 0..3 {
        h.clock.advance(SignedDuration::from_secs(1));
        let target = h.redirector.redirect(&abc, visitor(n)).await.unwrap();
        assert_eq!(target, "https://example.com/page");
    }

    let stats = h.analytics.stats(&abc).await.unwrap();
    assert_eq!(stats.url.click_count, 3);
    assert_eq!(stats.url.last_accessed, Some(h.clock.now()));
    assert_eq!(stats.recent_clicks.len(), 3);
    assert_eq!(stats.recent_clicks[0].ip_address.as_deref(), Some("192.0.2.2"));

    let err = h
        .shortener
        .create(ShortenParams::new("https://other.example").with_alias("abc"))
        .await
        .unwrap_err();
    assert!(matches!(err, ShortenerError::AliasConflict(ref c) if c == "abc"));

    let already_expired = h.clock.now() - SignedDuration::from_hours(1);
    let stale = h
        .shortener
        .create(
            ShortenParams::new("https://x")
                .with_expiration(ExpirationPolicy::AtTimestamp(already_expired)),
        )
        .await
        .unwrap();
    let err = h
        .redirector
        .redirect(&stale.short_code, visitor(9))
        .await
        .unwrap_err();
    assert!(matches!(err, RedirectError::Expired(_)));
    let stale_stats = h.analytics.stats(&stale.short_code).await.unwrap();
    assert_eq!(stale_stats.url.click_count, 0);
    assert!(stale_stats.recent_clicks.is_empty());

    let abc_id = stats.url.id;
    h.shortener.delete(&abc).await.unwrap();
    let err = h.analytics.stats(&abc).await.unwrap_err();
    assert!(matches!(err, AnalyticsError::NotFound(_)));
    assert!(h.repo.recent_clicks(abc_id, 100).await.unwrap().is_empty());
    assert_eq!(h.repo.click_event_count(), 0);
}

#[tokio::test]
async fn redirect_after_delete_is_not_found() {
    let h = Harness::new();
    let created = h
        .shortener
        .create(ShortenParams::new("https://example.com"))
        .await
        .unwrap();

    h.redirector
        .redirect(&created.short_code, visitor(1))
        .await
        .unwrap();
    h.shortener.delete(&created.short_code).await.unwrap();

    let err = h
        .redirector
        .redirect(&created.short_code, visitor(2))
        .await
        .unwrap_err();
    assert!(matches!(err, RedirectError::NotFound(_)));
}

#[tokio::test]
async fn duration_expiry_is_enforced_on_redirect() {
    let h = Harness::new();
    let created = h
        .shortener
        .create(
            ShortenParams::new("https://example.com")
                .with_expiration(ExpirationPolicy::AfterDuration(
                    std::time::Duration::from_secs(60),
                )),
        )
        .await
        .unwrap();

    h.redirector
        .redirect(&created.short_code, visitor(1))
        .await
        .unwrap();

    h.clock.advance(SignedDuration::from_secs(60));
    let err = h
        .redirector
        .redirect(&created.short_code, visitor(2))
        .await
        .unwrap_err();
    assert!(matches!(err, RedirectError::Expired(_)));

    let stats = h.analytics.stats(&created.short_code).await.unwrap();
    assert_eq!(stats.url.click_count, 1);
    assert_eq!(stats.recent_clicks.len(), 1);
}

#[tokio::test]
async fn concurrent_redirects_keep_counter_and_log_in_step() {
    let h = Harness::new();
    let created = h
        .shortener
        .create(ShortenParams::new("https://example.com"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for n in 0..50 {
        let redirector = h.redirector.clone();
        let code = created.short_code.clone();
        handles.push(tokio::spawn(async move {
            redirector.redirect(&code, visitor(n)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let record = h.repo.get(&created.short_code).await.unwrap().unwrap();
    assert_eq!(record.click_count, 50);
    assert_eq!(h.repo.recent_clicks(record.id, 1000).await.unwrap().len(), 50);
}
