use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use jiff::Timestamp;
use std::sync::atomic::{AtomicI64, Ordering};
use tether_core::error::{Result, StorageError};
use tether_core::record::{ClickContext, ClickEvent, NewShortUrl, ShortUrl};
use tether_core::repository::{ReadRepository, Repository};
use tether_core::shortcode::ShortCode;
use tracing::trace;

/// In-memory storage entry: a record together with the click log it owns.
#[derive(Debug, Clone)]
struct Entry {
    record: ShortUrl,
    clicks: Vec<ClickEvent>,
}

/// In-memory implementation of the Repository trait using DashMap.
///
/// Records are keyed by short code, so the entry API gives an atomic
/// check-and-insert. Click events live inside the owning entry: appending an
/// event and bumping the counter happen under the same shard guard, and
/// removing the entry removes its clicks with it.
#[derive(Debug)]
pub struct InMemoryRepository {
    by_code: DashMap<ShortCode, Entry>,
    codes_by_id: DashMap<i64, ShortCode>,
    next_url_id: AtomicI64,
    next_click_id: AtomicI64,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_code: DashMap::with_capacity(capacity),
            codes_by_id: DashMap::with_capacity(capacity),
            next_url_id: AtomicI64::new(1),
            next_click_id: AtomicI64::new(1),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Total number of click events across all records.
    pub fn click_event_count(&self) -> usize {
        self.by_code.iter().map(|entry| entry.clicks.len()).sum()
    }

    fn code_for(&self, short_url_id: i64) -> Option<ShortCode> {
        self.codes_by_id.get(&short_url_id).map(|code| code.clone())
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<ShortUrl>> {
        Ok(self.by_code.get(code).map(|entry| entry.record.clone()))
    }

    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<ShortUrl>> {
        let mut records: Vec<ShortUrl> = self
            .by_code
            .iter()
            .map(|entry| entry.record.clone())
            .collect();
        records.sort_by_key(|record| record.id);

        Ok(records
            .into_iter()
            .skip(clamp(skip))
            .take(clamp(limit))
            .collect())
    }

    async fn recent_clicks(&self, short_url_id: i64, limit: u64) -> Result<Vec<ClickEvent>> {
        let Some(code) = self.code_for(short_url_id) else {
            return Ok(Vec::new());
        };
        let Some(entry) = self.by_code.get(&code) else {
            return Ok(Vec::new());
        };
        if entry.record.id != short_url_id {
            return Ok(Vec::new());
        }

        let mut clicks = entry.clicks.clone();
        drop(entry);

        clicks.sort_by(|a, b| b.clicked_at.cmp(&a.clicked_at).then(b.id.cmp(&a.id)));
        clicks.truncate(clamp(limit));
        Ok(clicks)
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, record: NewShortUrl) -> Result<ShortUrl> {
        match self.by_code.entry(record.short_code.clone()) {
            MapEntry::Occupied(_) => Err(StorageError::Conflict(record.short_code.to_string())),
            MapEntry::Vacant(slot) => {
                let id = self.next_url_id.fetch_add(1, Ordering::Relaxed);
                let stored = record.into_record(id);
                // the index is written while the code's shard is still locked,
                // so no reader can see the record without its id mapping
                self.codes_by_id.insert(id, stored.short_code.clone());
                slot.insert(Entry {
                    record: stored.clone(),
                    clicks: Vec::new(),
                });
                trace!(code = %stored.short_code, id, "inserted record");
                Ok(stored)
            }
        }
    }

    async fn record_click(
        &self,
        short_url_id: i64,
        context: ClickContext,
        at: Timestamp,
    ) -> Result<ClickEvent> {
        let missing = || StorageError::NotFound(format!("short url id {short_url_id}"));

        let code = self.code_for(short_url_id).ok_or_else(missing)?;
        let mut entry = self.by_code.get_mut(&code).ok_or_else(missing)?;
        // the code may have been deleted and reused since the index lookup
        if entry.record.id != short_url_id {
            return Err(missing());
        }

        let id = self.next_click_id.fetch_add(1, Ordering::Relaxed);
        let event = ClickEvent::new(id, short_url_id, context, at);

        entry.clicks.push(event.clone());
        entry.record.click_count += 1;
        entry.record.last_accessed = Some(at);

        Ok(event)
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let Some((_, entry)) = self.by_code.remove(code) else {
            return Ok(false);
        };
        self.codes_by_id.remove(&entry.record.id);
        trace!(code = %code, clicks = entry.clicks.len(), "deleted record");
        Ok(true)
    }
}
