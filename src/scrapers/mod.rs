//! Page fetching and HTML extraction for policy sources.
//!
//! Unlike hand-written per-outlet scrapers, every source here goes through the
//! same two generic extractors, each a ranked cascade of CSS selectors with a
//! whole-document fallback:
//!
//! - [`listing`]: listing page → candidate [`Article`](crate::models::Article)s
//! - [`detail`]: detail page → plain-text body
//!
//! Network access sits behind [`PageFetcher`] so the crawler can be driven by
//! canned pages in tests. [`HttpFetcher`] is the production implementation.

pub mod detail;
pub mod listing;

use crate::config::Settings;
use crate::error::{MonitorError, Result};
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use std::time::Instant;
use tracing::{debug, instrument};

/// Retrieve a page as decoded text.
pub trait PageFetcher {
    /// Fetch `url` and decode its body with `encoding` (UTF-8 when `None`).
    async fn fetch(&self, url: &str, encoding: Option<&str>) -> Result<String>;
}

/// [`PageFetcher`] over a shared `reqwest` client with user-agent rotation.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    settings: Settings,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str, encoding: Option<&str>) -> Result<String> {
        let t0 = Instant::now();
        let mut request = self
            .client
            .get(url)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9,en;q=0.8");
        if let Some(ua) = self.settings.random_user_agent() {
            request = request.header(USER_AGENT, ua);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        let text = decode(&bytes, encoding)?;
        debug!(
            bytes = bytes.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(text)
    }
}

/// Decode raw bytes using an encoding label such as `gb2312` or `utf-8`.
pub fn decode(bytes: &[u8], label: Option<&str>) -> Result<String> {
    let encoding = match label.map(str::trim).filter(|l| !l.is_empty()) {
        None => UTF_8,
        Some(label) => Encoding::for_label(label.as_bytes())
            .ok_or_else(|| MonitorError::Encoding(label.to_string()))?,
    };
    let (text, _, _had_errors) = encoding.decode(bytes);
    Ok(text.into_owned())
}
