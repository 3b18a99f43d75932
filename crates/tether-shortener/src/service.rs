use crate::error::{Result, ShortenerError};
use crate::shortener::{ExpirationPolicy, ShortenParams, Shortener};
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use std::num::NonZeroU32;
use std::sync::Arc;
use tether_core::{
    validate_target_url, Clock, NewShortUrl, Repository, ShortCode, ShortUrl, StorageError,
    SystemClock,
};
use tether_generator::{validate_custom_alias, Generator};
use tracing::{debug, info, trace, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_MAX_ATTEMPTS: NonZeroU32 = match NonZeroU32::new(5) {
    Some(attempts) => attempts,
    None => unreachable!(),
};

/// Tunables for [`ShortenerService`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct ShortenerSettings {
    /// How many generated codes to try before giving up with
    /// [`ShortenerError::GenerationExhausted`]. At least one insert is
    /// always attempted.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: NonZeroU32,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `Repository` and a `Generator` to handle:
/// - URL and alias validation
/// - Short code generation with bounded retry on collision
/// - Expiration policy conversion
///
/// Uniqueness is decided by the repository's atomic insert; the service never
/// checks for a free code before inserting.
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    clock: Arc<dyn Clock>,
    settings: ShortenerSettings,
}

impl<R, G> Clone for ShortenerService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
            clock: Arc::clone(&self.clock),
            settings: self.settings,
        }
    }
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    /// Creates a new `ShortenerService` with default settings and the system clock.
    pub fn new(repository: R, generator: G) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            clock: Arc::new(SystemClock),
            settings: ShortenerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ShortenerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn settings(&self) -> &ShortenerSettings {
        &self.settings
    }

    fn resolve_expiration(
        policy: &ExpirationPolicy,
        now: Timestamp,
    ) -> Result<Option<Timestamp>> {
        match policy {
            ExpirationPolicy::Never => Ok(None),
            ExpirationPolicy::AfterDuration(duration) => {
                let duration = SignedDuration::try_from(*duration)
                    .map_err(|e| ShortenerError::InvalidExpiration(e.to_string()))?;
                now.checked_add(duration)
                    .map(Some)
                    .map_err(|e| ShortenerError::InvalidExpiration(e.to_string()))
            }
            ExpirationPolicy::AtTimestamp(timestamp) => Ok(Some(*timestamp)),
        }
    }

    /// Inserts under a caller-chosen alias. A taken alias is reported, never
    /// replaced by a different code.
    async fn insert_custom(&self, alias: &str, record: PendingRecord) -> Result<ShortUrl> {
        let short_code = validate_custom_alias(alias)?;
        let stored = self
            .repository
            .insert(record.with_code(short_code))
            .await?;
        Ok(stored)
    }

    /// Inserts under generated codes, retrying on collision up to
    /// `max_attempts` times.
    async fn insert_generated(&self, record: PendingRecord) -> Result<ShortUrl> {
        let max_attempts = self.settings.max_attempts.get();

        for attempt in 1..=max_attempts {
            let short_code: ShortCode = self.generator.generate().into();

            match self
                .repository
                .insert(record.clone().with_code(short_code))
                .await
            {
                Ok(stored) => return Ok(stored),
                Err(StorageError::Conflict(code)) => {
                    debug!(code = %code, attempt, max_attempts, "generated short code is taken");
                }
                Err(other) => return Err(ShortenerError::Storage(other)),
            }
        }

        warn!(max_attempts, "gave up generating a free short code");
        Err(ShortenerError::GenerationExhausted {
            attempts: max_attempts,
        })
    }
}

/// Everything about a new record except its short code.
#[derive(Debug, Clone)]
struct PendingRecord {
    original_url: String,
    created_at: Timestamp,
    expires_at: Option<Timestamp>,
}

impl PendingRecord {
    fn with_code(self, short_code: ShortCode) -> NewShortUrl {
        NewShortUrl {
            original_url: self.original_url,
            short_code,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn create(&self, params: ShortenParams) -> Result<ShortUrl> {
        validate_target_url(&params.original_url)?;

        let now = self.clock.now();
        let record = PendingRecord {
            original_url: params.original_url,
            created_at: now,
            expires_at: Self::resolve_expiration(&params.expiration, now)?,
        };

        let stored = match params.custom_alias {
            Some(alias) => self.insert_custom(&alias, record).await?,
            None => self.insert_generated(record).await?,
        };

        info!(code = %stored.short_code, id = stored.id, "created short url");
        Ok(stored)
    }

    async fn lookup(&self, code: &ShortCode) -> Result<ShortUrl> {
        trace!(code = %code, "looking up short code");

        self.repository
            .get(code)
            .await?
            .ok_or_else(|| ShortenerError::NotFound(code.to_string()))
    }

    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<ShortUrl>> {
        Ok(self.repository.list(skip, limit).await?)
    }

    async fn delete(&self, code: &ShortCode) -> Result<()> {
        if self.repository.delete(code).await? {
            info!(code = %code, "deleted short url");
            Ok(())
        } else {
            Err(ShortenerError::NotFound(code.to_string()))
        }
    }
}
