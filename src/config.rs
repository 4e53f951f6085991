//! Source catalog loading and credential resolution.
//!
//! The catalog is a JSON document by default; files ending in `.yaml` or
//! `.yml` are read as YAML. It lists the sources to crawl, the global keyword
//! list used by the relevance filter, and crawl settings:
//!
//! ```json
//! {
//!   "sources": [
//!     { "id": "mofcom", "name": "MOFCOM", "category": "gov",
//!       "url": "https://www.mofcom.gov.cn/zwgk/", "encoding": "utf-8",
//!       "keywords_boost": ["出口"] }
//!   ],
//!   "filter_keywords": ["汽车", "关税"],
//!   "settings": { "request_timeout": 15, "max_detail_fetch": 20 }
//! }
//! ```

use crate::error::{MonitorError, Result};
use rand::{Rng, rng};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// The full source catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub sources: Vec<Source>,
    #[serde(default)]
    pub filter_keywords: Vec<String>,
    #[serde(default)]
    pub settings: Settings,
}

/// One crawlable listing page.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    pub id: String,
    pub name: String,
    pub category: String,
    pub url: String,
    /// Character encoding label (e.g. `gb2312`); UTF-8 when absent.
    #[serde(default)]
    pub encoding: Option<String>,
    /// Every article from this source counts as relevant.
    #[serde(default)]
    pub auto_relevant: bool,
    /// Source-specific keywords checked before the global list.
    #[serde(default)]
    pub keywords_boost: Vec<String>,
}

/// Crawl and analysis tuning knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub user_agents: Vec<String>,
    /// Per-request timeout in seconds.
    pub request_timeout: f64,
    /// Lower bound of the politeness delay in seconds.
    pub request_delay_min: f64,
    /// Upper bound of the politeness delay in seconds.
    pub request_delay_max: f64,
    pub max_articles_per_source: usize,
    /// Successful detail-page extractions allowed per run.
    pub max_detail_fetch: usize,
    /// Accept broken TLS chains; several government sites serve them.
    pub accept_invalid_certs: bool,
    /// Pause between two classification calls, in seconds.
    pub analysis_delay_secs: f64,
    pub analysis_retries: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15".to_string(),
            ],
            request_timeout: 15.0,
            request_delay_min: 1.0,
            request_delay_max: 3.0,
            max_articles_per_source: 30,
            max_detail_fetch: 20,
            accept_invalid_certs: true,
            analysis_delay_secs: 1.0,
            analysis_retries: 2,
        }
    }
}

/// Upper bound accepted for any duration setting, in seconds.
const MAX_SETTING_SECS: f64 = 86_400.0;

impl Settings {
    /// Reject durations that are negative, non-finite or longer than a day.
    fn validate(&self) -> Result<()> {
        let durations = [
            ("request_timeout", self.request_timeout),
            ("request_delay_min", self.request_delay_min),
            ("request_delay_max", self.request_delay_max),
            ("analysis_delay_secs", self.analysis_delay_secs),
        ];
        for (name, secs) in durations {
            if !(0.0..=MAX_SETTING_SECS).contains(&secs) {
                return Err(MonitorError::Config(format!(
                    "settings.{name} must be between 0 and {MAX_SETTING_SECS} seconds, got {secs}"
                )));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        seconds(self.request_timeout)
    }

    /// A uniformly random politeness delay within the configured window.
    pub fn request_delay(&self) -> Duration {
        let min = self.request_delay_min.clamp(0.0, MAX_SETTING_SECS);
        let max = self.request_delay_max.clamp(0.0, MAX_SETTING_SECS);
        if min < max {
            Duration::from_secs_f64(rng().random_range(min..=max))
        } else {
            seconds(min)
        }
    }

    pub fn analysis_delay(&self) -> Duration {
        seconds(self.analysis_delay_secs)
    }

    /// Pick a user agent from the pool, if one is configured.
    pub fn random_user_agent(&self) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        let idx = rng().random_range(0..self.user_agents.len());
        Some(self.user_agents[idx].as_str())
    }
}

// NaN falls through to zero.
fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.clamp(0.0, MAX_SETTING_SECS)).unwrap_or_default()
}

/// Load and validate the source catalog.
///
/// # Errors
///
/// Fails when the file is missing or unreadable, does not parse, or lists no
/// sources. The caller treats any of these as fatal.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    if !path.exists() {
        return Err(MonitorError::Config(format!(
            "source catalog {} does not exist",
            path.display()
        )));
    }
    let raw = std::fs::read_to_string(path)?;
    let catalog = parse_catalog(&raw, is_yaml(path))?;
    info!(
        sources = catalog.sources.len(),
        keywords = catalog.filter_keywords.len(),
        "Loaded source catalog"
    );
    Ok(catalog)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn parse_catalog(raw: &str, yaml: bool) -> Result<Catalog> {
    let catalog: Catalog = if yaml {
        serde_yaml::from_str(raw)?
    } else {
        serde_json::from_str(raw)?
    };
    if catalog.sources.is_empty() {
        return Err(MonitorError::Config("source catalog lists no sources".to_string()));
    }
    catalog.settings.validate()?;
    Ok(catalog)
}

/// Resolve the LLM credential.
///
/// The explicit value (CLI flag or `DASHSCOPE_API_KEY`, both handled by clap)
/// wins; otherwise the local credentials file is consulted at
/// `models.providers.dashscope.apiKey`. Read or parse failures of that file
/// are logged and treated as "no key".
pub fn resolve_api_key(explicit: Option<&str>, credentials_file: Option<&Path>) -> Option<String> {
    if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
        info!("API key source: environment / command line");
        return Some(key.to_string());
    }

    let path = credentials_file?;
    if !path.exists() {
        return None;
    }
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read credentials file");
            return None;
        }
    };
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => {
            let key = value
                .pointer("/models/providers/dashscope/apiKey")
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|k| !k.is_empty())?;
            info!(path = %path.display(), "API key source: credentials file");
            Some(key.to_string())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Credentials file is not valid JSON");
            None
        }
    }
}

/// Default credentials file location under the user's home directory.
pub fn default_credentials_file() -> Option<std::path::PathBuf> {
    std::env::var_os("HOME").map(|home| Path::new(&home).join(".openclaw").join("openclaw.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG_JSON: &str = r#"{
        "sources": [
            {"id": "caam", "name": "CAAM", "category": "industry",
             "url": "http://www.caam.org.cn/news/", "auto_relevant": true},
            {"id": "mofcom", "name": "MOFCOM", "category": "gov",
             "url": "https://www.mofcom.gov.cn/", "encoding": "gb2312",
             "keywords_boost": ["出口管制"]}
        ],
        "filter_keywords": ["汽车"],
        "settings": {"request_timeout": 5, "max_detail_fetch": 3}
    }"#;

    #[test]
    fn test_parse_json_catalog() {
        let catalog = parse_catalog(CATALOG_JSON, false).unwrap();
        assert_eq!(catalog.sources.len(), 2);
        assert!(catalog.sources[0].auto_relevant);
        assert_eq!(catalog.sources[1].encoding.as_deref(), Some("gb2312"));
        assert_eq!(catalog.sources[1].keywords_boost, vec!["出口管制"]);
        assert_eq!(catalog.settings.max_detail_fetch, 3);
        // unspecified settings fall back to defaults
        assert_eq!(catalog.settings.max_articles_per_source, 30);
        assert!(!catalog.settings.user_agents.is_empty());
    }

    #[test]
    fn test_parse_yaml_catalog() {
        let yaml = r#"
sources:
  - id: customs
    name: GACC
    category: gov
    url: http://www.customs.gov.cn/
filter_keywords: [关税]
"#;
        let catalog = parse_catalog(yaml, true).unwrap();
        assert_eq!(catalog.sources[0].id, "customs");
        assert!(!catalog.sources[0].auto_relevant);
        assert_eq!(catalog.filter_keywords, vec!["关税"]);
    }

    #[test]
    fn test_empty_catalog_is_config_error() {
        let err = parse_catalog(r#"{"sources": []}"#, false).unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn test_out_of_range_durations_are_config_errors() {
        let yaml = r#"
sources:
  - {id: customs, name: GACC, category: gov, url: "http://www.customs.gov.cn/"}
settings:
  request_timeout: .inf
"#;
        let err = parse_catalog(yaml, true).unwrap_err();
        assert!(matches!(err, MonitorError::Config(ref msg) if msg.contains("request_timeout")));

        let json = r#"{"sources": [{"id": "a", "name": "A", "category": "gov", "url": "https://a.example/"}],
                       "settings": {"request_delay_max": 1e300}}"#;
        assert!(matches!(parse_catalog(json, false), Err(MonitorError::Config(_))));

        let json = r#"{"sources": [{"id": "a", "name": "A", "category": "gov", "url": "https://a.example/"}],
                       "settings": {"analysis_delay_secs": -1}}"#;
        assert!(matches!(parse_catalog(json, false), Err(MonitorError::Config(_))));
    }

    #[test]
    fn test_missing_catalog_is_config_error() {
        let err = load_catalog(Path::new("/nonexistent/sources.json")).unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn test_request_delay_within_window() {
        let settings = Settings {
            request_delay_min: 0.01,
            request_delay_max: 0.02,
            ..Settings::default()
        };
        for _ in 0..20 {
            let d = settings.request_delay();
            assert!(d >= Duration::from_secs_f64(0.01) && d <= Duration::from_secs_f64(0.02));
        }
        let fixed = Settings {
            request_delay_min: 0.0,
            request_delay_max: 0.0,
            ..Settings::default()
        };
        assert_eq!(fixed.request_delay(), Duration::ZERO);
    }

    #[test]
    fn test_duration_accessors_never_panic() {
        let settings = Settings {
            request_timeout: f64::INFINITY,
            request_delay_min: f64::NAN,
            request_delay_max: f64::INFINITY,
            analysis_delay_secs: -5.0,
            ..Settings::default()
        };
        assert_eq!(settings.request_timeout(), Duration::from_secs_f64(MAX_SETTING_SECS));
        assert_eq!(settings.request_delay(), Duration::ZERO);
        assert_eq!(settings.analysis_delay(), Duration::ZERO);
    }

    #[test]
    fn test_resolve_api_key_prefers_explicit() {
        assert_eq!(resolve_api_key(Some(" sk-env "), None).as_deref(), Some("sk-env"));
    }

    #[test]
    fn test_resolve_api_key_from_credentials_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"models": {{"providers": {{"dashscope": {{"apiKey": "sk-file"}}}}}}}}"#
        )
        .unwrap();
        assert_eq!(
            resolve_api_key(None, Some(file.path())).as_deref(),
            Some("sk-file")
        );
        assert_eq!(resolve_api_key(Some(""), Some(file.path())).as_deref(), Some("sk-file"));
    }

    #[test]
    fn test_resolve_api_key_absent() {
        assert!(resolve_api_key(None, Some(Path::new("/nonexistent/openclaw.json"))).is_none());
        assert!(resolve_api_key(None, None).is_none());
    }
}
