//! Configuration loading and constants.
//!
//! Parses the MongoDB connection target and the ambient options (listen address,
//! logging, deadlines) from process arguments. Arguments the probe does not know
//! are stripped before clap sees them, so wrappers can pass extra flags through
//! without the probe refusing to start. `AppConfig` is the resolved, read-only
//! result used by the rest of the program.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};

// =============================================================================
// Pool and Probe Constants
// =============================================================================

/// Number of sessions held by the pool (one dial plus derived sessions)
pub const POOL_SIZE: usize = 16;

/// Database queried by the /test endpoint
pub const TEST_DATABASE: &str = "test";

/// Collection counted by the /test endpoint
pub const TEST_COLLECTION: &str = "test";

/// Body returned by /ping when every session answers
pub const PING_SUCCESS: &str = "Success";

// =============================================================================
// Default Addresses and Strings
// =============================================================================

/// Connection target used when --mongo is empty
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";

/// Default HTTP bind address
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Default log filter when neither --log-level nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "mongo_probe=debug,tower_http=debug";

/// Tracing target for driver command events
pub const DRIVER_LOG_TARGET: &str = "mongo_probe::driver";

/// Response header carrying the per-request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Probe responses must never be served from a cache
pub const CACHE_CONTROL_NO_STORE: &str = "no-store";

/// Options that take the next argument as their value
const VALUE_OPTIONS: &[&str] = &[
    "--mongo",
    "--listen",
    "--log-level",
    "--log-format",
    "--request-timeout",
];

/// Options that stand alone
const SWITCH_OPTIONS: &[&str] = &["--no-driver-log", "--help", "-h"];

/// mongo-probe: checks MongoDB connectivity through a fixed pool of sessions
#[derive(Parser, Debug)]
#[command(name = "mongo-probe", about, args_override_self = true)]
pub struct Args {
    /// MongoDB connection string (empty means localhost:27017; last one wins)
    #[arg(long, default_value = "")]
    pub mongo: String,

    /// Address the HTTP server binds to
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: SocketAddr,

    /// Log level filter (e.g., "mongo_probe=debug,tower_http=info")
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Deadline in seconds for each database operation (no deadline if unset)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout: Option<u64>,

    /// Do not log driver command events
    #[arg(long)]
    pub no_driver_log: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Resolved configuration, read-only after startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Connection target as given on the command line (may be empty)
    pub mongo_uri: String,
    pub listen: SocketAddr,
    /// Effective tracing filter directive
    pub log_filter: String,
    pub log_format: LogFormat,
    /// Deadline applied to each ping and count
    pub request_timeout: Option<Duration>,
    /// Whether driver command events are logged
    pub driver_log: bool,
    /// Arguments that were stripped as unknown
    pub ignored_args: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the process arguments and RUST_LOG.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_args(std::env::args(), std::env::var("RUST_LOG").ok())
    }

    /// Load configuration from an explicit argument list (first item is the program name).
    pub fn from_args<I, T>(args: I, env_filter: Option<String>) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let (known, ignored_args) = split_known_args(args);
        let args = Args::try_parse_from(known)?;

        if let Some(filter) = &args.log_level {
            tracing_subscriber::EnvFilter::try_new(filter).map_err(|e| {
                ConfigError::LogFilter {
                    filter: filter.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        Ok(Self {
            mongo_uri: args.mongo,
            listen: args.listen,
            log_filter: resolve_log_filter(args.log_level, env_filter),
            log_format: args.log_format,
            request_timeout: args.request_timeout.map(Duration::from_secs),
            driver_log: !args.no_driver_log,
            ignored_args,
        })
    }
}

/// Pick the log filter with priority: CLI > env > default
pub fn resolve_log_filter(cli: Option<String>, env: Option<String>) -> String {
    cli.or(env)
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

/// Split arguments into the ones clap should parse and the ones to ignore.
///
/// The program name is always kept. Recognised value options keep their value,
/// whether given inline (`--mongo=uri`) or as the next argument. Everything after
/// a bare `--` is dropped without being interpreted.
pub fn split_known_args<I, T>(args: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut known: Vec<String> = args.next().into_iter().collect();
    let mut ignored = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--" {
            ignored.extend(args.by_ref());
            break;
        }

        let name = arg.split_once('=').map_or(arg.as_str(), |(name, _)| name);
        let is_value_option = VALUE_OPTIONS.contains(&name);
        let takes_next = is_value_option && !arg.contains('=');

        if !is_value_option && !SWITCH_OPTIONS.contains(&arg.as_str()) {
            ignored.push(arg);
            continue;
        }

        known.push(arg);
        if takes_next {
            // A trailing option with no value is left for clap to reject
            if let Some(value) = args.next() {
                known.push(value);
            }
        }
    }

    (known, ignored)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error("Invalid log filter '{filter}': {reason}")]
    LogFilter { filter: String, reason: String },
}
