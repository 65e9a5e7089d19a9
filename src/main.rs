// =============================================================================
// Regime Sentiment — command-line driver
// =============================================================================
//
// Loads the engine config and one JSON bar file per timeframe, runs the
// multi-timeframe analysis and prints the result as JSON.
//
// Environment:
//   SENTIMENT_CONFIG         config path (default engine_config.json)
//   SENTIMENT_BARS           TF=path[,TF=path...], e.g. H1=eurusd_h1.json
//   SENTIMENT_SYMBOL         symbol label (default EURUSD)
//   SENTIMENT_INTERVAL_SECS  repeat every N seconds, reloading config and bars
// =============================================================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use regime_sentiment::engine::blocked_regimes;
use regime_sentiment::market_data::parse_bar_rows;
use regime_sentiment::{BarSeries, ConfigHandle, EngineConfig, SentimentEngine, Timeframe};

const DEFAULT_CONFIG_PATH: &str = "engine_config.json";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Environment & logging ────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── 2. Config ───────────────────────────────────────────────────────
    let config_path = PathBuf::from(
        std::env::var("SENTIMENT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
    );
    let config = EngineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(path = %config_path.display(), error = %format!("{e:#}"), "Failed to load config, using defaults");
        EngineConfig::default()
    });
    info!(blocked = ?blocked_regimes(&config), "Trade filter configured");
    let handle = ConfigHandle::new(config)?;

    // ── 3. Inputs ───────────────────────────────────────────────────────
    let symbol = std::env::var("SENTIMENT_SYMBOL").unwrap_or_else(|_| "EURUSD".to_string());
    let bars_arg = std::env::var("SENTIMENT_BARS")
        .context("SENTIMENT_BARS must list bar files as TF=path[,TF=path...]")?;
    let sources = parse_bar_sources(&bars_arg)?;

    let engine = Arc::new(SentimentEngine::with_builtin_sources(handle.clone()));
    info!(
        symbol = %symbol,
        timeframes = sources.len(),
        sources = ?engine.source_names(),
        "Sentiment engine ready"
    );

    // ── 4. Single run ───────────────────────────────────────────────────
    let interval_secs = match std::env::var("SENTIMENT_INTERVAL_SECS") {
        Ok(raw) => Some(
            raw.trim()
                .parse::<u64>()
                .with_context(|| format!("SENTIMENT_INTERVAL_SECS is not a number: {raw}"))?,
        ),
        Err(_) => None,
    };

    let Some(secs) = interval_secs.filter(|s| *s > 0) else {
        let frames = load_frames(&symbol, &sources)?;
        run_once(engine, frames).await?;
        return Ok(());
    };

    // ── 5. Repeating run with hot reload ────────────────────────────────
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(secs));
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Shutdown signal received");
                return Ok(());
            }
        }

        if config_path.exists() {
            if let Err(e) = handle.reload(&config_path) {
                warn!(error = %format!("{e:#}"), "Config reload failed, keeping previous config");
            }
        }

        let frames = match load_frames(&symbol, &sources) {
            Ok(frames) => frames,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to load bars");
                continue;
            }
        };
        if let Err(e) = run_once(engine.clone(), frames).await {
            error!(error = %format!("{e:#}"), "Analysis failed");
        }
    }
}

/// Run the analysis off the async runtime and print the result.
async fn run_once(engine: Arc<SentimentEngine>, frames: Vec<BarSeries>) -> Result<()> {
    let outcome = tokio::task::spawn_blocking(move || engine.analyze_timeframes(&frames))
        .await
        .context("analysis task panicked")?;
    let result = outcome?;

    for frame in result.results() {
        info!("{}", frame.summary());
    }
    info!("{}", result.summary());

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("failed to serialise result")?
    );
    Ok(())
}

/// Parse `TF=path[,TF=path...]`.
fn parse_bar_sources(arg: &str) -> Result<Vec<(Timeframe, PathBuf)>> {
    let mut out = Vec::new();
    for entry in arg.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((tf, path)) = entry.split_once('=') else {
            bail!("bad SENTIMENT_BARS entry (expected TF=path): {entry}");
        };
        let timeframe: Timeframe = tf
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .with_context(|| format!("bad timeframe in SENTIMENT_BARS entry: {entry}"))?;
        out.push((timeframe, PathBuf::from(path.trim())));
    }
    if out.is_empty() {
        bail!("SENTIMENT_BARS lists no bar files");
    }
    Ok(out)
}

fn load_frames(symbol: &str, sources: &[(Timeframe, PathBuf)]) -> Result<Vec<BarSeries>> {
    sources
        .iter()
        .map(|(timeframe, path)| load_series(symbol, *timeframe, path))
        .collect()
}

fn load_series(symbol: &str, timeframe: Timeframe, path: &Path) -> Result<BarSeries> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bars from {}", path.display()))?;
    let rows = parse_bar_rows(&text)
        .with_context(|| format!("failed to parse bars from {}", path.display()))?;
    Ok(BarSeries::from_raw(symbol, timeframe, rows))
}
