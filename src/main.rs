use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Url;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use coin_screener::commands::{self, Command};
use coin_screener::config::Config;
use coin_screener::engine::{SessionSettings, spawn_session};
use coin_screener::market_data::{CoinMarketCapSource, QueryClient};
use coin_screener::metrics;
use coin_screener::render::render_view;

/// UI events queued between the stdin reader and the session.
const EVENT_CHANNEL_BUFFER: usize = 64;

/// How often expired cache entries are dropped.
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Parser)]
#[command(name = "coin-screener", about = "Filterable cryptocurrency listings in the terminal")]
struct Args {
    /// Starting location; its query string seeds the filters.
    #[arg(long, default_value = "http://localhost/")]
    location: String,

    /// Directory `export` writes cryptos.csv into.
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = Config::from_env()?;

    if let Some(port) = config.metrics_port {
        metrics::init_metrics_server(port)?;
        info!(port, "metrics exporter listening");
    }

    info!("coin-screener starting");

    let location = Url::parse(&args.location)
        .with_context(|| format!("invalid --location {}", args.location))?;
    let source = CoinMarketCapSource::new(
        config.base_url.clone(),
        config.api_key.clone(),
        config.request_timeout,
    )?;
    let client =
        QueryClient::with_staleness(Arc::new(source), config.listings_stale, config.logos_stale);

    let settings = SessionSettings {
        filter_debounce: config.filter_debounce,
        scroll_throttle: config.scroll_throttle,
        export_dir: args.export_dir,
        ..SessionSettings::default()
    };
    let session = spawn_session(settings, client.clone(), location, EVENT_CHANNEL_BUFFER);

    let events = session.events.clone();
    let input_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match commands::parse_command(&line) {
                Ok(None) => {}
                Ok(Some(Command::Help)) => println!("{}", commands::HELP),
                Ok(Some(Command::Quit)) => break,
                Ok(Some(Command::Event(event))) => {
                    if events.send(event).await.is_err() {
                        break;
                    }
                }
                Err(err) => println!("{err}"),
            }
        }
        anyhow::Ok(())
    });

    let mut view = session.view.clone();
    let printer_handle = tokio::spawn(async move {
        while view.changed().await.is_ok() {
            let snapshot = view.borrow_and_update().clone();
            println!("\n{}", render_view(&snapshot));
        }
    });

    let mut location = session.location.clone();
    tokio::spawn(async move {
        while location.changed().await.is_ok() {
            let url = location.borrow_and_update().to_string();
            println!("location: {url}");
        }
    });

    tokio::spawn(async move {
        let mut sweep = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        loop {
            sweep.tick().await;
            client.evict_stale();
        }
    });

    tokio::select! {
        res = input_handle => {
            match res {
                Ok(Ok(())) => info!("input closed, shutting down"),
                Ok(Err(err)) => warn!(error = %err, "stdin reader returned error"),
                Err(err) => warn!(error = %err, "stdin reader panicked"),
            }
        }
        res = printer_handle => {
            if let Err(err) = res {
                warn!(error = %err, "view printer panicked");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl-C, shutting down");
        }
    }

    // Dropping the session cancels in-flight fetches and pending timers.
    session.task.abort();
    if let Err(err) = session.task.await
        && err.is_panic()
    {
        warn!(error = %err, "session task panicked");
    }

    Ok(())
}
