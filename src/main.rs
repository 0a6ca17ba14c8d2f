//! mongo-probe entry point.
//!
//! Parses arguments before anything else, initializes tracing, dials the
//! session pool, and serves the probe routes until the process is killed.

use std::process;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mongo_probe::config::{AppConfig, LogFormat, POOL_SIZE};
use mongo_probe::pool::{DriverLogger, SessionPool};
use mongo_probe::routes::create_router;
use mongo_probe::state::AppState;
use mongo_probe::StartupError;

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        // --help is reported like any other parse error: stderr, exit 1
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    init_tracing(&config);

    if let Err(err) = run(config).await {
        tracing::error!(error = %err, "Shutting down");
        eprintln!("{err}");
        process::exit(1);
    }
}

fn init_tracing(config: &AppConfig) {
    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter));

    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    if !config.ignored_args.is_empty() {
        tracing::debug!(args = ?config.ignored_args, "Ignoring unrecognized arguments");
    }

    let logger = DriverLogger::new(config.driver_log);
    let pool = SessionPool::connect(&config.mongo_uri, POOL_SIZE, logger).await?;
    tracing::info!(
        sessions = pool.len(),
        request_timeout = ?config.request_timeout,
        "Initialized session pool"
    );

    let state = AppState::new(pool, config.request_timeout);
    let app = create_router(state);

    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.listen,
            source,
        })?;
    tracing::info!("Starting server at http://{}", config.listen);

    axum::serve(listener, app)
        .await
        .map_err(StartupError::Serve)
}
