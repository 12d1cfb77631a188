#!/usr/bin/env cargo run --release --bin fetch-trades --
//! Fetch Trades - Binance Vision daily trade archive fetcher
//!
//! Downloads `<SYMBOL>-trades-<date>.zip` for one or more spot symbols,
//! decodes every CSV member and writes one JSON response envelope per symbol.

use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use visiontape_config::{CliConfigMerge, Settings};
use visiontape_core::{validate_symbol, FetchResponse, RequestMetrics, TradeDate};
use visiontape_providers::{ConnectorConfig, TradesConnector};

/// Command-line arguments for the trade fetcher
#[derive(Debug, Parser)]
#[command(
    name = "fetch-trades",
    about = "Download and decode Binance Vision daily spot trades",
    long_about = "
Downloads the daily spot trades archive for each symbol, decodes every CSV
member and prints a JSON array of response envelopes, one per symbol, in the
order the symbols were given.

Configuration is read from visiontape.toml (or --config) and VISIONTAPE_*
environment variables; flags below override both.

Examples:
  fetch-trades BTCUSDT --date 2024-01-15
  fetch-trades BTCUSDT ETHUSDT --date 2024-01-15 --summary-only
  fetch-trades SOLUSDT -d 2024-3-1 -o sol.json --timeout-secs 120
",
    version
)]
struct Args {
    /// Spot symbols, uppercase (e.g. BTCUSDT)
    #[arg(required = true)]
    symbols: Vec<String>,

    /// Trading day as YYYY-MM-DD
    #[arg(short, long)]
    date: String,

    /// Configuration file (defaults to ./visiontape.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Omit trade rows from the output
    #[arg(long)]
    summary_only: bool,

    /// Override the archive base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Override the per-download deadline
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Stop reading each CSV member after this many trades
    #[arg(long)]
    max_trades_per_member: Option<usize>,

    /// Symbols fetched at the same time
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,
}

impl CliConfigMerge for Args {
    fn merge_into_config(&self, config: &mut Settings) {
        if let Some(base_url) = &self.base_url {
            config.data.base_url = base_url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.data.request_timeout_secs = secs;
        }
        if self.max_trades_per_member.is_some() {
            config.data.max_trades_per_member = self.max_trades_per_member;
        }
        if let Some(concurrency) = self.concurrency {
            config.app.max_concurrent_fetches = concurrency;
        }
    }
}

fn init_tracing(settings: &Settings) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.app.log_level.as_filter())),
        )
        .with_writer(io::stderr)
        .init();
}

/// Fetch one symbol, never failing: errors become failure envelopes
async fn fetch_symbol(
    connector: TradesConnector,
    symbol: String,
    date: TradeDate,
    cancel: CancellationToken,
    metrics: Arc<RequestMetrics>,
    slots: Arc<Semaphore>,
    summary_only: bool,
) -> FetchResponse {
    let _slot = match slots.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => return FetchResponse::failure(e.to_string()),
    };
    let _active = metrics.begin();

    if let Err(e) = validate_symbol(&symbol) {
        metrics.record_failure();
        warn!(event_type = "invalid_symbol", symbol = %symbol, error = %e, "Skipping symbol");
        return FetchResponse::failure(e.to_string());
    }

    match connector.fetch_date(&symbol, date, &cancel).await {
        Ok(result) => {
            metrics.record_success();
            if let Some((first_ms, last_ms)) = result.time_range() {
                info!(
                    event_type = "symbol_fetched",
                    symbol = %symbol,
                    trade_count = result.trade_count,
                    first_trade_ms = first_ms,
                    last_trade_ms = last_ms,
                    "Trades span"
                );
            }
            let mut response = FetchResponse::success(result);
            if summary_only {
                response.data = None;
            }
            response
        }
        Err(e) => {
            metrics.record_failure();
            warn!(
                event_type = "fetch_failed",
                symbol = %symbol,
                date = %date,
                cancelled = e.is_cancelled(),
                error = %e,
                "Fetch failed"
            );
            FetchResponse::failure(e.to_string())
        }
    }
}

fn write_responses(responses: &[FetchResponse], output: Option<&PathBuf>) -> io::Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    serde_json::to_writer_pretty(&mut writer, responses)?;
    writeln!(writer)?;
    writer.flush()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load_from_file(path)?,
        None => Settings::load()?,
    }
    .merge_cli_args(&args);

    init_tracing(&settings);

    let date: TradeDate = args.date.parse()?;
    let connector = TradesConnector::new(ConnectorConfig::from(&settings.data))?;
    let metrics = Arc::new(RequestMetrics::new());
    let slots = Arc::new(Semaphore::new(settings.app.max_concurrent_fetches.max(1)));
    let cancel = CancellationToken::new();

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!(event_type = "shutdown_requested", "Ctrl-C received, cancelling downloads");
            shutdown.cancel();
        }
    });

    info!(
        event_type = "run_start",
        app = %settings.app.name,
        symbols = args.symbols.len(),
        date = %date,
        base_url = %settings.data.base_url,
        "Fetching trades"
    );
    let started = Instant::now();

    let handles: Vec<_> = args
        .symbols
        .iter()
        .map(|symbol| {
            tokio::spawn(fetch_symbol(
                connector.clone(),
                symbol.clone(),
                date,
                cancel.clone(),
                Arc::clone(&metrics),
                Arc::clone(&slots),
                args.summary_only,
            ))
        })
        .collect();

    let mut responses = Vec::with_capacity(handles.len());
    for handle in handles {
        responses.push(
            handle
                .await
                .unwrap_or_else(|e| FetchResponse::failure(format!("Fetch task failed: {e}"))),
        );
    }

    write_responses(&responses, args.output.as_ref())?;

    let snapshot = metrics.snapshot();
    info!(
        event_type = "run_complete",
        total_requests = snapshot.total_requests,
        successful_requests = snapshot.successful_requests,
        failed_requests = snapshot.failed_requests,
        active_requests = snapshot.active_requests,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Finished"
    );

    let failed = responses.iter().filter(|r| !r.success).count();
    if failed > 0 {
        return Err(format!("{failed} of {} fetches failed", responses.len()).into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "fetch-trades",
            "BTCUSDT",
            "ETHUSDT",
            "--date",
            "2024-01-15",
            "--summary-only",
            "-j",
            "2",
        ])
        .unwrap();

        assert_eq!(args.symbols, vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(args.date, "2024-01-15");
        assert!(args.summary_only);
        assert_eq!(args.concurrency, Some(2));
        assert!(args.output.is_none());
    }

    #[test]
    fn test_symbol_required() {
        assert!(Args::try_parse_from(["fetch-trades", "--date", "2024-01-15"]).is_err());
    }

    #[test]
    fn test_flags_override_settings() {
        let args = Args::try_parse_from([
            "fetch-trades",
            "BTCUSDT",
            "-d",
            "2024-01-15",
            "--base-url",
            "http://127.0.0.1:8080/trades",
            "--timeout-secs",
            "120",
            "--max-trades-per-member",
            "500",
        ])
        .unwrap();

        let settings = Settings::default().merge_cli_args(&args);
        assert_eq!(settings.data.base_url, "http://127.0.0.1:8080/trades");
        assert_eq!(settings.data.request_timeout_secs, 120);
        assert_eq!(settings.data.max_trades_per_member, Some(500));
        assert_eq!(settings.app.max_concurrent_fetches, 4);
    }

    #[test]
    fn test_absent_flags_keep_settings() {
        let args = Args::try_parse_from(["fetch-trades", "BTCUSDT", "-d", "2024-01-15"]).unwrap();
        let settings = Settings::default().merge_cli_args(&args);
        let defaults = Settings::default();

        assert_eq!(settings.data.base_url, defaults.data.base_url);
        assert_eq!(settings.data.request_timeout_secs, defaults.data.request_timeout_secs);
        assert_eq!(settings.data.max_trades_per_member, None);
    }

    #[tokio::test]
    async fn test_invalid_symbol_is_failure_envelope() {
        let connector = TradesConnector::new(ConnectorConfig::default()).unwrap();
        let metrics = Arc::new(RequestMetrics::new());

        let response = fetch_symbol(
            connector,
            "btc-usdt".to_string(),
            TradeDate::new(2024, 1, 15),
            CancellationToken::new(),
            Arc::clone(&metrics),
            Arc::new(Semaphore::new(1)),
            false,
        )
        .await;

        assert!(!response.success);
        assert!(response.data.is_none());
        assert!(response.error.is_some());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.failed_requests, 1);
        assert_eq!(snapshot.active_requests, 0);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_is_failure_envelope() {
        let connector = TradesConnector::new(ConnectorConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..ConnectorConfig::default()
        })
        .unwrap();
        let metrics = Arc::new(RequestMetrics::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let response = fetch_symbol(
            connector,
            "BTCUSDT".to_string(),
            TradeDate::new(2024, 1, 15),
            cancel,
            Arc::clone(&metrics),
            Arc::new(Semaphore::new(1)),
            false,
        )
        .await;

        assert!(!response.success);
        assert!(response.error.unwrap().contains("cancelled"));
        assert_eq!(metrics.snapshot().failed_requests, 1);
    }
}
