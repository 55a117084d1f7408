//! NFT Automation Bot - Entry Point
//!
//! Wires configuration, logging, the marketplace client, activity
//! sinks and the automation engine. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load .env, then config.toml (path from argv[1]) and validate
//! 2. Init tracing (JSON structured logging)
//! 3. Load settings.json (defaults written on first run)
//! 4. Resolve the signing key from env or the account file
//! 5. Create the OpenSea client (HTTP + API key + retry + rate limit)
//! 6. Build the activity fan-out: tracing, metrics, journal channel
//! 7. Create the engine, spawn journal, settings watcher and health server
//!    (which also serves /accounts for key import)
//! 8. Autostart the engine if configured
//! 9. Wait for SIGINT, stop the engine and shut everything down

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use nft_automation_bot::adapters::activity::{ChannelSink, FanoutSink, TracingSink};
use nft_automation_bot::adapters::metrics::{HealthServer, MetricsRegistry};
use nft_automation_bot::adapters::opensea::{
    HttpClientConfig, MarketplaceHttp, MarketplaceSession, OpenSeaMarketplace,
};
use nft_automation_bot::adapters::persistence::{ActivityJournal, FileAccountStore, SettingsStore};
use nft_automation_bot::config::hot_reload::SettingsWatcher;
use nft_automation_bot::config::loader::load_config;
use nft_automation_bot::usecases::signing_session::load_signer;
use nft_automation_bot::usecases::{AutomationEngine, EngineTimings};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Environment and configuration ────────────────────
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("Failed to read .env");
        }
    }

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = load_config(&config_path).context("Failed to load configuration")?;

    // ── 2. Structured JSON logging ──────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path,
        "Starting NFT automation bot"
    );

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 3. Trading settings ─────────────────────────────────
    let settings_store = SettingsStore::new(&config.persistence.settings_file);
    let settings = settings_store
        .load()
        .await
        .context("Failed to load settings")?;
    settings.validate().context("Invalid settings file")?;
    if settings_store.content_hash().await.is_none() {
        settings_store
            .save(&settings)
            .await
            .context("Failed to write default settings")?;
    }

    // ── 4. Signing key ──────────────────────────────────────
    let accounts = Arc::new(FileAccountStore::new(&config.accounts.file));
    let signer = load_signer(accounts.as_ref(), &config.accounts.private_key_env)
        .await
        .context("Failed to load signing key")?;

    // ── 5. Marketplace client ───────────────────────────────
    let session = MarketplaceSession::from_env(&config.marketplace.api_key_env, signer)
        .context("Failed to load marketplace credentials")?;
    let http = MarketplaceHttp::new(
        session.api_key().to_string(),
        HttpClientConfig::from(&config.marketplace),
    )
    .context("Failed to create marketplace HTTP client")?;
    let marketplace = Arc::new(OpenSeaMarketplace::new(
        http,
        session,
        config.marketplace.page_limit,
    ));

    // ── 6. Activity sinks ───────────────────────────────────
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);
    let journal = ActivityJournal::new(&config.persistence.data_dir)
        .await
        .context("Failed to open activity journal")?;
    match journal.load_today().await {
        Ok(events) => info!(events = events.len(), "Loaded today's activity journal"),
        Err(e) => warn!(error = %e, "Could not read today's activity journal"),
    }
    if !journal.is_healthy().await {
        warn!("Activity directory is not writable, events will only be logged");
    }

    let (journal_sink, journal_rx) = ChannelSink::new();
    let sink = FanoutSink::new()
        .with(Arc::new(TracingSink))
        .with(Arc::clone(&metrics) as _)
        .with(Arc::new(journal_sink));

    // ── 7. Engine and background tasks ──────────────────────
    let rng = config
        .engine
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let engine = AutomationEngine::new(
        marketplace,
        sink,
        settings.clone(),
        EngineTimings::from(&config.engine),
        rng,
    );

    let journal_shutdown = shutdown_tx.subscribe();
    let journal_handle = tokio::spawn(async move {
        journal.run(journal_rx, journal_shutdown).await;
    });

    let (mut watcher, mut settings_rx) = SettingsWatcher::new(
        settings_store,
        Duration::from_secs(config.persistence.settings_poll_seconds),
        settings,
    );
    let watcher_shutdown = shutdown_tx.subscribe();
    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = watcher.run(watcher_shutdown).await {
            error!(error = %e, "Settings watcher failed");
        }
    });

    let settings_engine = engine.clone();
    let mut forward_shutdown = shutdown_tx.subscribe();
    let forward_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = forward_shutdown.recv() => break,
                changed = settings_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = settings_rx.borrow_and_update().clone();
                    if let Err(e) = settings_engine.update_settings(next) {
                        warn!(error = %e, "Engine rejected reloaded settings");
                    }
                }
            }
        }
    });

    let health_handle = if config.metrics.enabled {
        let server = HealthServer::new(
            Arc::new(engine.clone()),
            Some(Arc::clone(&metrics)),
            config.metrics.bind_address.clone(),
        )
        .with_accounts(accounts);
        let health_shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = server.run(health_shutdown).await {
                error!(error = %e, "Health server failed");
            }
        }))
    } else {
        None
    };

    // ── 8. Autostart ────────────────────────────────────────
    if config.bot.autostart {
        engine.start().context("Failed to start automation")?;
    } else {
        info!("Autostart disabled, waiting for POST /start");
    }

    // ── 9. Wait for SIGINT, then shut down ──────────────────
    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    engine.stop();
    let _ = shutdown_tx.send(());

    let grace = Duration::from_secs(5);
    let _ = tokio::time::timeout(grace, forward_handle).await;
    let _ = tokio::time::timeout(grace, watcher_handle).await;
    let _ = tokio::time::timeout(grace, journal_handle).await;
    if let Some(handle) = health_handle {
        let _ = tokio::time::timeout(grace, handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}
