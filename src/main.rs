//! # Policy Monitor
//!
//! An incremental crawler for automobile-export policy news. It scrapes the
//! listing pages of government and industry sites, keeps articles that are
//! relevant and not seen in earlier runs, classifies each one through an
//! OpenAI-compatible LLM, and emits a ranked risk digest plus a JSON report.
//!
//! ## Usage
//!
//! ```sh
//! policy_monitor -c sources.json -o output
//! ```
//!
//! ## Architecture
//!
//! The application runs one sequential batch per invocation:
//! 1. **Crawling**: listing pages → candidate articles → relevance → history dedup → detail pages
//! 2. **Analysis**: one classification call per new article, with a fallback result on any failure
//! 3. **Output**: ranked markdown digest and JSON report on disk, digest on stdout
//!
//! Only a missing or unusable source catalog aborts a run. Every other failure
//! degrades to a logged fallback, so a digest is always produced.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analyzer;
mod api;
mod cli;
mod config;
mod crawler;
mod error;
mod history;
mod models;
mod outputs;
mod relevance;
mod scrapers;
mod utils;

use analyzer::PolicyAnalyzer;
use api::{ChatClient, RetryAsk};
use cli::Cli;
use config::Settings;
use crawler::crawl;
use history::HistoryStore;
use outputs::json::write_reports;
use scrapers::HttpFetcher;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("policy_monitor starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.history, ?args.output_dir, args.fetch_only, args.test, "Parsed CLI arguments");

    // The catalog is the only hard requirement.
    let catalog = match config::load_catalog(Path::new(&args.config)) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(path = %args.config, error = %e, "Cannot load source catalog; aborting");
            return Err(e.into());
        }
    };
    let settings = catalog.settings.clone();

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        warn!(path = %args.output_dir, error = %e, "Output directory is not writable; reports will only be printed");
    }

    // ---- Crawl ----
    let mut history = HistoryStore::load(&args.history);
    let articles = crawl(HttpFetcher::new(&settings), catalog, &mut history, args.test).await;
    if articles.is_empty() {
        info!("No new relevant articles in this run");
    }

    // ---- Analyze ----
    let articles = if args.fetch_only || articles.is_empty() {
        if args.fetch_only {
            info!("Skipping AI analysis (--fetch-only)");
        }
        articles
    } else {
        let analyzer = PolicyAnalyzer::new(build_client(&args, &settings), settings.analysis_delay());
        analyzer.analyze_batch(articles).await
    };

    // ---- Report ----
    let generated_at = Local::now().fixed_offset();
    let (digest, report) = outputs::format(articles, generated_at);
    info!(
        total = report.total_articles,
        high = report.risk_summary.high,
        attention = report.risk_summary.attention,
        favorable = report.risk_summary.favorable,
        "Report assembled"
    );

    if let Err(e) = write_reports(&args.output_dir, &digest, &report, generated_at).await {
        error!(error = %e, "Failed to write report files");
    }

    // stdout carries only the digest, for the delivery step to pick up
    println!("{}", "=".repeat(50));
    println!("{digest}");
    println!("{}", "=".repeat(50));

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Build the retrying LLM client, or `None` when no credential is available.
#[instrument(level = "info", skip_all)]
fn build_client(args: &Cli, settings: &Settings) -> Option<RetryAsk<ChatClient>> {
    let credentials = args
        .credentials_file
        .as_ref()
        .map(PathBuf::from)
        .or_else(config::default_credentials_file);
    let key = config::resolve_api_key(args.api_key.as_deref(), credentials.as_deref())?;

    match ChatClient::new(
        &key,
        &args.base_url,
        &args.model,
        Duration::from_secs(args.analysis_timeout),
    ) {
        Ok(client) => Some(RetryAsk::new(
            client,
            settings.analysis_retries,
            Duration::from_secs(1),
        )),
        Err(e) => {
            error!(error = %e, "Failed to build LLM client");
            None
        }
    }
}
