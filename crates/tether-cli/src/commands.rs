use crate::cli::{BatchLine, Cli, Operation};
use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Write;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tether_analytics::{AnalyticsService, AnalyticsSettings};
use tether_core::{ClickContext, Repository, ShortCode, ShortUrl};
use tether_generator::RandomGenerator;
use tether_redirector::RedirectorService;
use tether_shortener::{
    ExpirationPolicy, ShortenParams, Shortener, ShortenerService, ShortenerSettings,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

#[derive(Debug, Serialize)]
struct Created<'a> {
    #[serde(flatten)]
    url: &'a ShortUrl,
    short_url: String,
}

#[derive(Debug, Serialize)]
struct Redirected<'a> {
    short_code: &'a ShortCode,
    location: String,
}

#[derive(Debug, Serialize)]
struct Deleted<'a> {
    short_code: &'a ShortCode,
    deleted: bool,
}

/// The services of one process, all sharing a single store.
pub struct App<R> {
    shortener: ShortenerService<Arc<R>, RandomGenerator>,
    redirector: RedirectorService<Arc<R>>,
    analytics: AnalyticsService<Arc<R>>,
    base_url: String,
}

impl<R: Repository> App<R> {
    pub fn new(repository: R, config: &Cli) -> anyhow::Result<Self> {
        let repository = Arc::new(repository);
        let code_length = usize::try_from(config.code_length).context("code length overflows")?;
        let generator = RandomGenerator::new(code_length).context("invalid code length")?;
        let max_attempts =
            NonZeroU32::new(config.max_attempts).context("max attempts must be at least 1")?;

        Ok(Self {
            shortener: ShortenerService::new(Arc::clone(&repository), generator).with_settings(
                ShortenerSettings::builder()
                    .max_attempts(max_attempts)
                    .build(),
            ),
            redirector: RedirectorService::new(Arc::clone(&repository)),
            analytics: AnalyticsService::new(repository).with_settings(
                AnalyticsSettings::builder()
                    .recent_clicks_limit(config.recent_clicks)
                    .build(),
            ),
            base_url: config.base_url.clone(),
        })
    }

    /// Runs one operation and returns its result as a JSON document.
    pub async fn execute(&self, operation: &Operation) -> anyhow::Result<Value> {
        let value = match operation {
            Operation::Create {
                url,
                alias,
                expires_in,
                expires_at,
            } => {
                let expiration = match (expires_in, expires_at) {
                    (Some(secs), _) => ExpirationPolicy::AfterDuration(Duration::from_secs(*secs)),
                    (None, Some(at)) => ExpirationPolicy::AtTimestamp(*at),
                    (None, None) => ExpirationPolicy::Never,
                };
                let mut params = ShortenParams::new(url.as_str()).with_expiration(expiration);
                if let Some(alias) = alias {
                    params = params.with_alias(alias.as_str());
                }

                let record = self.shortener.create(params).await?;
                serde_json::to_value(Created {
                    short_url: record.short_code.to_url(&self.base_url),
                    url: &record,
                })?
            }
            Operation::Redirect {
                code,
                ip,
                user_agent,
                referer,
            } => {
                let context = ClickContext {
                    ip_address: ip.clone(),
                    user_agent: user_agent.clone(),
                    referer: referer.clone(),
                };
                let location = self.redirector.redirect(code, context).await?;
                serde_json::to_value(Redirected {
                    short_code: code,
                    location,
                })?
            }
            Operation::Resolve { code } => {
                serde_json::to_value(self.redirector.resolve(code).await?)?
            }
            Operation::Stats { code } => serde_json::to_value(self.analytics.stats(code).await?)?,
            Operation::List { skip, limit } => {
                serde_json::to_value(self.shortener.list(*skip, *limit).await?)?
            }
            Operation::Delete { code } => {
                self.shortener.delete(code).await?;
                serde_json::to_value(Deleted {
                    short_code: code,
                    deleted: true,
                })?
            }
        };
        Ok(value)
    }
}

/// Refuses operations that cannot succeed against a store that starts empty
/// on every run.
pub fn ensure_runnable_in_memory(operation: &Operation) -> anyhow::Result<()> {
    if operation.reads_existing_records() {
        bail!(
            "`{}` needs records from an earlier run, but in-memory storage starts empty \
             every time; run it inside `tether batch` or use `--storage mysql`",
            operation.name()
        );
    }
    Ok(())
}

/// Executes every line of `input` against `app`, writing one compact JSON
/// document per line to `out`.
///
/// A failing line is reported as `{"line": n, "error": ...}` and the batch
/// moves on. The batch as a whole fails if any line did.
pub async fn run_batch<R, I, W>(app: &App<R>, input: I, out: &mut W) -> anyhow::Result<()>
where
    R: Repository,
    I: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut line_no = 0_usize;
    let mut failures = 0_usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let outcome = match BatchLine::try_parse_from(line.split_whitespace()) {
            Ok(parsed) => app.execute(&parsed.operation).await,
            Err(e) => Err(e.into()),
        };
        let document = outcome.unwrap_or_else(|e| {
            failures += 1;
            warn!(line = line_no, error = %e, "batch operation failed");
            json!({ "line": line_no, "error": format!("{e:#}").trim() })
        });
        writeln!(out, "{}", serde_json::to_string(&document)?)?;
    }

    if failures > 0 {
        bail!("{failures} of the batch operations failed");
    }
    Ok(())
}
