use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagliere_core::config::{DownloaderBackend, DownloaderConfig};
use tagliere_core::orchestrator::{DownloadAdded, DownloadWatcher};
use tagliere_core::{
    load_config, metrics, validate_config, CancelFlag, DownloaderClient, QBittorrentClient,
    SanitizedConfig, StaticSiteRegistry, Tagger, TransmissionClient,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for download-added event channel
const EVENT_BUFFER_SIZE: usize = 100;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("tagliere {} starting", VERSION);

    // Determine config path
    let config_path = std::env::var("TAGLIERE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    info!("Configuration loaded: {}", sanitized);

    if !config.tagging.enabled {
        info!("Tagging disabled in config, nothing to do");
        return Ok(());
    }

    // Register metrics
    let registry = prometheus::default_registry();
    for metric in metrics::all_metrics() {
        if let Err(e) = registry.register(metric) {
            warn!("Failed to register metric: {}", e);
        }
    }

    // Build clients for the selected downloaders, in selection order.
    // Validation guarantees every selected name is defined.
    let mut clients: Vec<Arc<dyn DownloaderClient>> = Vec::new();
    for name in &config.tagging.downloaders {
        let downloader = config
            .downloaders
            .iter()
            .find(|d| &d.name == name)
            .with_context(|| format!("Downloader {} not defined", name))?;
        clients.push(build_client(downloader.clone()));
        info!(
            "Initialized {} backend {} at {}",
            backend_label(downloader.backend),
            downloader.name,
            downloader.url
        );
    }

    let site_registry = Arc::new(StaticSiteRegistry::new(config.sites.known.clone()));
    info!("Site registry loaded with {} sites", config.sites.known.len());

    let tagger = Tagger::new(config.tagging.clone(), clients.clone(), site_registry);

    // Download-added events arrive on this channel. The sender stays
    // alive in main so the receive arm pends instead of closing when
    // the watcher is disabled.
    let (event_tx, mut event_rx) = mpsc::channel::<DownloadAdded>(EVENT_BUFFER_SIZE);

    if config.schedule.watch_secs > 0 {
        let mut watcher = DownloadWatcher::new(clients);
        let tx = event_tx.clone();
        let watch_period = Duration::from_secs(config.schedule.watch_secs);
        tokio::spawn(async move {
            let mut ticker = interval(watch_period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                for event in watcher.poll_once().await {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            }
        });
        info!("Watching for new downloads every {:?}", watch_period);
    }

    let cancel = CancelFlag::new();
    let mut shutdown = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            cancel.cancel();
        })
    };

    let period = Duration::from_secs(config.schedule.effective_interval_secs());
    if config.schedule.interval_secs < config.schedule.effective_interval_secs() {
        warn!(
            "schedule.interval_secs below the {}s floor, clamping",
            tagliere_core::config::ScheduleConfig::MIN_INTERVAL_SECS
        );
    }
    let first_tick = if config.schedule.run_on_start {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut ticker = interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Scheduling tagging runs every {:?}", period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let summary = tagger.run(&cancel).await;
                if summary.cancelled {
                    break;
                }
            }
            event = event_rx.recv() => match event {
                Some(event) => {
                    info!(
                        "Download added on {}: {}",
                        event.downloader, event.id
                    );
                    if let Err(e) = tagger.handle_download_added(&event).await {
                        warn!("Failed to tag new download {}: {}", event.id, e);
                    }
                }
                None => break,
            },
            _ = &mut shutdown => break,
        }
    }
    info!("tagliere shut down");
    Ok(())
}

fn build_client(config: DownloaderConfig) -> Arc<dyn DownloaderClient> {
    match config.backend {
        DownloaderBackend::QBittorrent => Arc::new(QBittorrentClient::new(config)),
        DownloaderBackend::Transmission => Arc::new(TransmissionClient::new(config)),
    }
}

fn backend_label(backend: DownloaderBackend) -> &'static str {
    match backend {
        DownloaderBackend::QBittorrent => "qBittorrent",
        DownloaderBackend::Transmission => "Transmission",
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
