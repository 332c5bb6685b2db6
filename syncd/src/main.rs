//! # syncd
//!
//! Bidirectional folder synchronization daemon for Google Drive.
//!
//! The synced directory carries its own configuration document
//! (`.drivesyncd.json`); the refresh token lives in the OS keychain and is
//! stored with `syncd login`. Startup errors are fatal with a non-zero exit
//! status; reconciliation errors at runtime are logged and the daemon keeps
//! running.

use anyhow::{bail, Context, Result};
use bridge_desktop::{KeyringSecureStore, NotifyWatcher, ReqwestHttpClient, TokioFileSystem};
use bridge_traits::fs::LocalFileSystem;
use bridge_traits::http::HttpClient;
use bridge_traits::remote::RemoteStore;
use bridge_traits::secure::SecureStore;
use bridge_traits::watch::ChangeWatcher;
use clap::{Parser, Subcommand, ValueEnum};
use core_auth::{OAuthConfig, TokenManager, TokenProvider};
use core_runtime::config::{SyncSettings, CONFIG_FILE_NAME};
use core_runtime::events::EventBus;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_sync::{ChangeAggregator, PollScheduler, SyncEngine};
use provider_google_drive::GoogleDriveConnector;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "syncd",
    version,
    about = "Keep a local directory and a Google Drive folder in sync"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Pretty)]
    log_format: LogFormatArg,

    /// Log level for the daemon's own crates
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Run the daemon: initial full-tree push, then watch and poll
    Run {
        /// Synced directory containing the configuration document
        dir: PathBuf,
    },

    /// Run one full reconciliation cycle and exit
    Sync {
        /// Synced directory containing the configuration document
        dir: PathBuf,
    },

    /// Store an externally-obtained OAuth refresh token in the keychain
    Login {
        /// Synced directory containing the configuration document
        dir: PathBuf,

        /// Refresh token obtained through an interactive consent flow
        #[arg(long)]
        refresh_token: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Compact => LogFormat::Compact,
        }
    }
}

fn load_settings(dir: &Path) -> Result<SyncSettings> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    let raw = std::fs::read(&config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;

    SyncSettings::from_json(&raw)
        .with_context(|| format!("invalid configuration in {}", config_path.display()))
}

fn token_manager(settings: &SyncSettings, event_bus: EventBus) -> Arc<TokenManager> {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    let secure: Arc<dyn SecureStore> = Arc::new(KeyringSecureStore::new());

    Arc::new(TokenManager::new(
        OAuthConfig {
            client_id: settings.oauth.client_id.clone(),
            client_secret: settings.oauth.client_secret.clone(),
            token_url: settings.oauth.token_url.clone(),
        },
        secure,
        http,
        event_bus,
    ))
}

async fn build_engine(
    dir: &Path,
    settings: &SyncSettings,
    event_bus: EventBus,
) -> Arc<SyncEngine> {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    let tokens: Arc<dyn TokenProvider> = token_manager(settings, event_bus.clone());
    let remote: Arc<dyn RemoteStore> = Arc::new(GoogleDriveConnector::new(http, tokens));
    let fs: Arc<dyn LocalFileSystem> = Arc::new(TokioFileSystem::new());

    Arc::new(SyncEngine::new(settings, dir.to_path_buf(), fs, remote, event_bus).await)
}

async fn run_daemon(dir: PathBuf) -> Result<()> {
    let settings = load_settings(&dir)?;
    let event_bus = EventBus::default();
    let engine = build_engine(&dir, &settings, event_bus).await;

    // A failing startup pass is a reconciliation error, not a startup error:
    // the poll scheduler retries on its next tick.
    if let Err(e) = engine.initial_sync().await {
        error!(error = %e, "Initial full-tree push failed, continuing");
    }

    let watcher = NotifyWatcher::new();
    let changes = watcher
        .subscribe(engine.root())
        .await
        .context("failed to subscribe to filesystem changes")?;

    let shutdown = CancellationToken::new();
    let aggregator = ChangeAggregator::new(engine.clone(), settings.quiet_period());
    let poller = PollScheduler::new(engine.clone(), settings.poll_interval());

    let aggregator_task = tokio::spawn(aggregator.run(changes, shutdown.clone()));
    let poller_task = tokio::spawn(poller.run(shutdown.clone()));

    info!(dir = %dir.display(), "syncd running, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("Shutdown signal received");
    shutdown.cancel();
    let _ = tokio::join!(aggregator_task, poller_task);

    Ok(())
}

async fn run_once(dir: PathBuf) -> Result<()> {
    let settings = load_settings(&dir)?;
    let event_bus = EventBus::default();
    let engine = build_engine(&dir, &settings, event_bus).await;

    engine
        .initial_sync()
        .await
        .context("full-tree push failed")?;
    engine.sync_once().await.context("reconciliation failed")?;

    info!("Sync cycle completed");
    Ok(())
}

async fn login(dir: PathBuf, refresh_token: String) -> Result<()> {
    let settings = load_settings(&dir)?;
    let manager = token_manager(&settings, EventBus::default());

    manager
        .adopt_refresh_token(refresh_token)
        .await
        .context("failed to store credential")?;

    // Exchange once immediately so a bad token fails here, not at 3am.
    manager
        .access_token()
        .await
        .context("the refresh token was rejected by the token endpoint")?;

    println!("Credential stored and verified.");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(
        LoggingConfig::default()
            .with_format(cli.log_format.into())
            .with_level(cli.log_level.clone()),
    )
    .context("failed to initialize logging")?;

    match cli.command {
        Command::Run { dir } => run_daemon(dir).await,
        Command::Sync { dir } => run_once(dir).await,
        Command::Login { dir, refresh_token } => login(dir, refresh_token).await,
    }
}
