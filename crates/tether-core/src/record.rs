use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A stored short URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortUrl {
    /// Surrogate identifier assigned by the store.
    pub id: i64,
    /// The original URL that was shortened.
    pub original_url: String,
    pub short_code: ShortCode,
    pub created_at: Timestamp,
    /// When the record expires, if ever.
    pub expires_at: Option<Timestamp>,
    /// Number of successful redirects.
    pub click_count: u64,
    /// Time of the most recent successful redirect.
    pub last_accessed: Option<Timestamp>,
}

impl ShortUrl {
    /// Whether the record is expired as of `now`.
    ///
    /// A record expiring exactly at `now` counts as expired.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Insert payload for a new short URL. The store assigns the id and
/// starts the click counter at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShortUrl {
    pub original_url: String,
    pub short_code: ShortCode,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
}

impl NewShortUrl {
    /// Materializes the stored record once the store has picked an id.
    pub fn into_record(self, id: i64) -> ShortUrl {
        ShortUrl {
            id,
            original_url: self.original_url,
            short_code: self.short_code,
            created_at: self.created_at,
            expires_at: self.expires_at,
            click_count: 0,
            last_accessed: None,
        }
    }
}

/// Request metadata captured for a click. Stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// A single recorded redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: i64,
    /// Owning [`ShortUrl::id`].
    pub short_url_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    pub clicked_at: Timestamp,
}

impl ClickEvent {
    pub fn new(id: i64, short_url_id: i64, context: ClickContext, clicked_at: Timestamp) -> Self {
        Self {
            id,
            short_url_id,
            ip_address: context.ip_address,
            user_agent: context.user_agent,
            referer: context.referer,
            clicked_at,
        }
    }
}
