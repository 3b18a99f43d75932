use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{MySqlPool, Row};
use std::time::Duration;
use tether_core::error::{Result, StorageError};
use tether_core::record::{ClickContext, ClickEvent, NewShortUrl, ShortUrl};
use tether_core::repository::{ReadRepository, Repository};
use tether_core::shortcode::ShortCode;
use tracing::{debug, trace};

const SHORT_URLS_DDL: &str = include_str!("../ddl/mysql/short_urls.sql");
const CLICKS_DDL: &str = include_str!("../ddl/mysql/clicks.sql");

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// MySQL implementation of the repository contract.
///
/// Short code uniqueness is enforced by a `UNIQUE` key, click events are
/// removed by an `ON DELETE CASCADE` foreign key, and a click is recorded by
/// one transaction that bumps the counter and inserts the event. Timestamps
/// are stored as unix milliseconds.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with(database_url, DEFAULT_MAX_CONNECTIONS, DEFAULT_ACQUIRE_TIMEOUT).await
    }

    /// Opens a pool with explicit sizing. Waiting longer than
    /// `acquire_timeout` for a connection fails with [`StorageError::Timeout`].
    pub async fn connect_with(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `short_urls` and `clicks` tables if they do not exist.
    pub async fn init_schema(&self) -> Result<()> {
        for ddl in [SHORT_URLS_DDL, CLICKS_DDL] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        debug!("mysql schema is ready");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

/// Drops sub-millisecond precision so that what we return equals what a
/// later read returns.
fn truncate(ts: Timestamp) -> Result<Timestamp> {
    from_millis(ts.as_millisecond())
}

fn from_millis(value: i64) -> Result<Timestamp> {
    Timestamp::from_millisecond(value)
        .map_err(|e| StorageError::InvalidData(format!("invalid timestamp '{value}': {e}")))
}

fn from_optional_millis(value: Option<i64>) -> Result<Option<Timestamp>> {
    value.map(from_millis).transpose()
}

fn last_insert_id(raw: u64) -> Result<i64> {
    i64::try_from(raw).map_err(|_| StorageError::InvalidData(format!("insert id {raw} overflows")))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn short_url_from_row(row: &MySqlRow) -> Result<ShortUrl> {
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;

    Ok(ShortUrl {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        original_url: row.try_get("original_url").map_err(map_sqlx_error)?,
        short_code: ShortCode::new_unchecked(short_code),
        created_at: from_millis(row.try_get("created_at").map_err(map_sqlx_error)?)?,
        expires_at: from_optional_millis(row.try_get("expires_at").map_err(map_sqlx_error)?)?,
        click_count: row.try_get("click_count").map_err(map_sqlx_error)?,
        last_accessed: from_optional_millis(
            row.try_get("last_accessed").map_err(map_sqlx_error)?,
        )?,
    })
}

fn click_from_row(row: &MySqlRow) -> Result<ClickEvent> {
    Ok(ClickEvent {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        short_url_id: row.try_get("short_url_id").map_err(map_sqlx_error)?,
        ip_address: row.try_get("ip_address").map_err(map_sqlx_error)?,
        user_agent: row.try_get("user_agent").map_err(map_sqlx_error)?,
        referer: row.try_get("referer").map_err(map_sqlx_error)?,
        clicked_at: from_millis(row.try_get("clicked_at").map_err(map_sqlx_error)?)?,
    })
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<ShortUrl>> {
        let row = sqlx::query(
            r#"
            SELECT id, short_code, original_url, created_at, expires_at, click_count, last_accessed
            FROM short_urls
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(short_url_from_row).transpose()
    }

    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<ShortUrl>> {
        let rows = sqlx::query(
            r#"
            SELECT id, short_code, original_url, created_at, expires_at, click_count, last_accessed
            FROM short_urls
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(short_url_from_row).collect()
    }

    async fn recent_clicks(&self, short_url_id: i64, limit: u64) -> Result<Vec<ClickEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT id, short_url_id, ip_address, user_agent, referer, clicked_at
            FROM clicks
            WHERE short_url_id = ?
            ORDER BY clicked_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(short_url_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(click_from_row).collect()
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(&self, record: NewShortUrl) -> Result<ShortUrl> {
        let record = NewShortUrl {
            created_at: truncate(record.created_at)?,
            expires_at: record.expires_at.map(truncate).transpose()?,
            ..record
        };

        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (short_code, original_url, created_at, expires_at, click_count, last_accessed)
            VALUES (?, ?, ?, ?, 0, NULL)
            "#,
        )
        .bind(record.short_code.as_str())
        .bind(record.original_url.as_str())
        .bind(record.created_at.as_millisecond())
        .bind(record.expires_at.map(|ts| ts.as_millisecond()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = last_insert_id(done.last_insert_id())?;
                trace!(code = %record.short_code, id, "inserted record");
                Ok(record.into_record(id))
            }
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(record.short_code.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn record_click(
        &self,
        short_url_id: i64,
        context: ClickContext,
        at: Timestamp,
    ) -> Result<ClickEvent> {
        let at = truncate(at)?;
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let updated = sqlx::query(
            r#"
            UPDATE short_urls
            SET click_count = click_count + 1,
                last_accessed = ?
            WHERE id = ?
            "#,
        )
        .bind(at.as_millisecond())
        .bind(short_url_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Err(StorageError::NotFound(format!("short url id {short_url_id}")));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO clicks (short_url_id, ip_address, user_agent, referer, clicked_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(short_url_id)
        .bind(context.ip_address.as_deref())
        .bind(context.user_agent.as_deref())
        .bind(context.referer.as_deref())
        .bind(at.as_millisecond())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let id = last_insert_id(inserted.last_insert_id())?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(ClickEvent::new(id, short_url_id, context, at))
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM short_urls
            WHERE short_code = ?
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
