use clap::{Parser, Subcommand, ValueEnum};
use jiff::Timestamp;
use std::fmt::{Display, Formatter};
use tether_core::ShortCode;

pub const STORAGE_BACKEND_ENV: &str = "TETHER_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "TETHER_MYSQL_DSN";
pub const BASE_URL_ENV: &str = "TETHER_BASE_URL";
pub const CODE_LENGTH_ENV: &str = "TETHER_CODE_LENGTH";
pub const MAX_ATTEMPTS_ENV: &str = "TETHER_MAX_ATTEMPTS";
pub const RECENT_CLICKS_ENV: &str = "TETHER_RECENT_CLICKS";
pub const LOG_FORMAT_ENV: &str = "TETHER_LOG_FORMAT";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_LIST_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "tether", about = "Shorten URLs, follow them and inspect their clicks")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, global = true, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    /// Prefix used to print full short URLs.
    #[arg(long, global = true, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        global = true,
        env = CODE_LENGTH_ENV,
        default_value_t = 6,
        value_parser = clap::value_parser!(u32).range(3..=20)
    )]
    pub code_length: u32,

    #[arg(
        long,
        global = true,
        env = MAX_ATTEMPTS_ENV,
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,

    /// Number of click events shown by `stats`.
    #[arg(long, global = true, env = RECENT_CLICKS_ENV, default_value_t = 10)]
    pub recent_clicks: u64,

    #[arg(
        long,
        global = true,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Pretty
    )]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the MySQL tables if they do not exist.
    InitSchema,
    /// Run operations read from stdin, one per line, against a single store.
    ///
    /// Each line uses the subcommand syntax, e.g. `redirect abc --ip 10.0.0.1`.
    /// Arguments are split on whitespace; blank lines and lines starting with
    /// `#` are skipped. Output is one JSON document per line.
    Batch,
    #[command(flatten)]
    Op(Operation),
}

/// Operations against the record store, usable directly or inside `batch`.
#[derive(Debug, Subcommand)]
pub enum Operation {
    /// Shorten a URL.
    Create {
        url: String,
        /// Use this code instead of a generated one.
        #[arg(long)]
        alias: Option<String>,
        /// Expire this many seconds after creation.
        #[arg(long, conflicts_with = "expires_at")]
        expires_in: Option<u64>,
        /// Expire at this instant (RFC 3339).
        #[arg(long)]
        expires_at: Option<Timestamp>,
    },
    /// Follow a short code and record the click.
    Redirect {
        #[arg(value_parser = parse_code)]
        code: ShortCode,
        #[arg(long)]
        ip: Option<String>,
        #[arg(long)]
        user_agent: Option<String>,
        #[arg(long)]
        referer: Option<String>,
    },
    /// Look a short code up without recording a click.
    Resolve {
        #[arg(value_parser = parse_code)]
        code: ShortCode,
    },
    /// Show a record and its latest clicks.
    Stats {
        #[arg(value_parser = parse_code)]
        code: ShortCode,
    },
    /// List records in creation order.
    List {
        #[arg(long, default_value_t = 0)]
        skip: u64,
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: u64,
    },
    /// Delete a record and its click history.
    Delete {
        #[arg(value_parser = parse_code)]
        code: ShortCode,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create",
            Operation::Redirect { .. } => "redirect",
            Operation::Resolve { .. } => "resolve",
            Operation::Stats { .. } => "stats",
            Operation::List { .. } => "list",
            Operation::Delete { .. } => "delete",
        }
    }

    /// Whether the operation only makes sense against records written by an
    /// earlier operation.
    pub fn reads_existing_records(&self) -> bool {
        !matches!(self, Operation::Create { .. })
    }
}

/// One line of a `batch` script.
#[derive(Debug, Parser)]
#[command(name = "batch", no_binary_name = true)]
pub struct BatchLine {
    #[command(subcommand)]
    pub operation: Operation,
}

fn parse_code(raw: &str) -> Result<ShortCode, String> {
    ShortCode::new(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["tether", "list"]).unwrap();
        assert_eq!(cli.storage, StorageBackendArg::InMemory);
        assert_eq!(cli.code_length, 6);
        assert_eq!(cli.max_attempts, 5);
        assert_eq!(cli.recent_clicks, 10);
        assert!(matches!(
            cli.command,
            Command::Op(Operation::List {
                skip: 0,
                limit: DEFAULT_LIST_LIMIT
            })
        ));
    }

    #[test]
    fn mysql_requires_dsn() {
        let err = Cli::try_parse_from(["tether", "--storage", "mysql", "list"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn create_with_alias_and_deadline() {
        let cli = Cli::try_parse_from([
            "tether",
            "create",
            "https://example.com",
            "--alias",
            "docs",
            "--expires-at",
            "2030-01-01T00:00:00Z",
        ])
        .unwrap();
        let Command::Op(Operation::Create {
            url,
            alias,
            expires_in,
            expires_at,
        }) = cli.command
        else {
            panic!("expected create");
        };
        assert_eq!(url, "https://example.com");
        assert_eq!(alias.as_deref(), Some("docs"));
        assert_eq!(expires_in, None);
        assert_eq!(expires_at, Some("2030-01-01T00:00:00Z".parse().unwrap()));
    }

    #[test]
    fn expiry_options_are_exclusive() {
        let err = Cli::try_parse_from([
            "tether",
            "create",
            "https://example.com",
            "--expires-in",
            "60",
            "--expires-at",
            "2030-01-01T00:00:00Z",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn invalid_code_is_rejected_while_parsing() {
        let err = Cli::try_parse_from(["tether", "stats", "no/slash"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn code_length_is_bounded() {
        assert!(Cli::try_parse_from(["tether", "--code-length", "2", "list"]).is_err());
        assert!(Cli::try_parse_from(["tether", "--code-length", "21", "list"]).is_err());
    }

    #[test]
    fn default_list_limit_is_one_hundred() {
        assert_eq!(DEFAULT_LIST_LIMIT, 100);
    }

    #[test]
    fn batch_takes_no_arguments() {
        let cli = Cli::try_parse_from(["tether", "batch"]).unwrap();
        assert!(matches!(cli.command, Command::Batch));
    }

    #[test]
    fn batch_line_parses_without_binary_name() {
        let line = BatchLine::try_parse_from("redirect abc --ip 10.0.0.1".split_whitespace())
            .unwrap();
        let Operation::Redirect { code, ip, .. } = line.operation else {
            panic!("expected redirect");
        };
        assert_eq!(code.as_str(), "abc");
        assert_eq!(ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn batch_line_rejects_top_level_commands() {
        assert!(BatchLine::try_parse_from(["batch"]).is_err());
        assert!(BatchLine::try_parse_from(["init-schema"]).is_err());
    }

    #[test]
    fn only_create_stands_alone() {
        let create = BatchLine::try_parse_from(["create", "https://example.com"]).unwrap();
        assert!(!create.operation.reads_existing_records());

        for line in [vec!["redirect", "abc"], vec!["stats", "abc"], vec!["list"]] {
            let parsed = BatchLine::try_parse_from(line).unwrap();
            assert!(parsed.operation.reads_existing_records());
        }
    }
}
