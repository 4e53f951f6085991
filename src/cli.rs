//! Command-line interface definitions for the policy monitor.
//!
//! Every path has a default relative to the working directory, so a plain
//! `policy_monitor` run picks up `sources.json` and `history.json` next to it.

use crate::api::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use clap::Parser;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Full run: crawl + AI analysis
/// policy_monitor -c sources.json -o output
///
/// # Crawl only, no LLM calls
/// policy_monitor --fetch-only
///
/// # First source, first three new articles
/// policy_monitor --test
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Source catalog (JSON, or YAML by extension)
    #[arg(short, long, default_value = "sources.json")]
    pub config: String,

    /// History file used for incremental runs
    #[arg(long, default_value = "history.json")]
    pub history: String,

    /// Directory for the markdown digest and JSON report
    #[arg(short, long, default_value = "output")]
    pub output_dir: String,

    /// Only crawl; skip AI analysis
    #[arg(long)]
    pub fetch_only: bool,

    /// Test mode: first source only, at most three new articles
    #[arg(long)]
    pub test: bool,

    /// API key for the OpenAI-compatible endpoint
    #[arg(long, env = "DASHSCOPE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// JSON file consulted for the API key when none is given
    /// (defaults to ~/.openclaw/openclaw.json)
    #[arg(long)]
    pub credentials_file: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model used for classification
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Timeout of one classification call, in seconds
    #[arg(long, default_value_t = 60)]
    pub analysis_timeout: u64,
}
