// ------------------------------------------------------------
// External dependencies
// ------------------------------------------------------------

use rustls::crypto::{CryptoProvider, ring};

use orderbook_relay::{
    Config, Pipeline,
    collector::transport::WsConnector,
    exchanges::{deribit::DeribitInstrumentSource, get_adapter},
    metrics::METRICS,
    sink::build_sink,
};

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

const DEFAULT_CONFIG_PATH: &str = "config.json";

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Responsibilities:
// - Initialize cryptography backend (rustls)
// - Load configuration and logging
// - Build adapter, instrument source, connector and sink
// - Run the pipeline until Ctrl+C / SIGTERM
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --------------------------------------------------------
    // rustls >= 0.23 requires an explicit CryptoProvider
    // installation, exactly once and before any TLS connection.
    // --------------------------------------------------------
    CryptoProvider::install_default(ring::default_provider())
        .expect("failed to install rustls CryptoProvider");

    let config_path =
        std::env::var("RELAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?.with_env_overrides();

    let default_level = if config.debug_log() { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    config.validate()?;

    let Some(adapter) = get_adapter(&config.exchange.name) else {
        anyhow::bail!("Exchange '{}' is not supported", config.exchange.name);
    };

    let source = Arc::new(DeribitInstrumentSource::new(
        config.exchange.rest_url.clone(),
        config.exchange.kind.clone(),
    ));
    let ws_url = config.exchange.ws_url_or(adapter.ws_url()).to_string();
    log::debug!("streaming endpoint: {ws_url}");
    let connector = Arc::new(WsConnector::new(ws_url));
    let sink = build_sink(&config.sink)?;

    let cancel = CancellationToken::new();

    // --------------------------------------------------------
    // Metrics reporter (periodic, low-noise)
    // --------------------------------------------------------
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = sleep(Duration::from_secs(10)) => {
                        log::info!("[METRICS] {}", METRICS.summary());
                    }
                }
            }
        }
    });

    tokio::spawn(await_shutdown(cancel.clone()));

    log::info!(
        "Starting {} relay for {} {}",
        adapter.name(),
        config.exchange.currency,
        config.exchange.kind
    );

    let pipeline = Pipeline::new(config, source, adapter, connector, sink);
    let report = pipeline.run(cancel.clone()).await?;

    for batch in &report.batches {
        log::info!(
            "batch {} ({} instruments): {:?}",
            batch.index,
            batch.instruments,
            batch.outcome
        );
    }
    if report.panicked > 0 {
        log::error!("{} batch tasks panicked", report.panicked);
    }

    log::info!("[METRICS] {}", METRICS.summary());
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then signals every batch to stop.
async fn await_shutdown(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => log::info!("Received Ctrl+C, shutting down"),
        () = terminate => log::info!("Received SIGTERM, shutting down"),
    }

    cancel.cancel();
}
