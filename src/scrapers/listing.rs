//! Listing-page extraction.
//!
//! Government and trade-body sites have no common markup, so links are located
//! by trying conventional list-container selectors in order and falling back
//! to every anchor in the document when none of them holds links. Anchors are
//! then filtered for title length and navigation targets, resolved against the
//! source URL and de-duplicated.

use crate::config::Source;
use crate::error::Result;
use crate::models::Article;
use chrono::Local;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

/// Anchors with shorter visible text are menu items, not headlines.
pub const MIN_TITLE_CHARS: usize = 6;

const CONTAINER_SELECTORS: &[&str] = &[
    "div.news-list",
    "div.list",
    "ul.news_list",
    "div.content-list",
    "div.main-content",
    "div.article-list",
    "div.news",
    "div.list-content",
    "div.right-content",
    "div.con_list",
    "ul.list",
    "div.newsList",
    "div.news_con",
    "table.list",
    "div#list",
    "div.mod-list",
];

const NAVIGATION_PATTERNS: &[&str] = &[
    "javascript:",
    "#",
    "mailto:",
    "tel:",
    "index.html",
    "index.shtml",
    "index.htm",
    "/search",
    "/login",
    "/register",
];

static CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    CONTAINER_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
});

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

// Some sites serve articles at index-like paths disambiguated by a date segment.
static YEAR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:19|20)\d{2}").expect("valid regex"));

/// Extract candidate articles from a listing page.
///
/// `base_url` resolves relative links (normally the source's own URL). The
/// result keeps page order, holds each resolved URL once and is cut to `max`.
///
/// # Errors
///
/// Only when `base_url` itself is not a valid URL.
#[instrument(level = "debug", skip(html, source), fields(source = %source.id))]
pub fn extract_listing(html: &str, base_url: &str, source: &Source, max: usize) -> Result<Vec<Article>> {
    let base = Url::parse(base_url)?;
    let document = Html::parse_document(html);
    let fetch_time = Local::now().to_rfc3339();

    let anchors = candidate_anchors(&document);
    debug!(candidates = anchors.len(), "Collected candidate anchors");

    let articles = anchors
        .into_iter()
        .filter_map(|anchor| {
            let title: String = anchor.text().map(str::trim).collect();
            if title.chars().count() < MIN_TITLE_CHARS {
                return None;
            }
            let href = anchor.value().attr("href")?.trim();
            if href.is_empty() || is_navigation(href) {
                return None;
            }
            let url = resolve(&base, href)?;
            Some(Article {
                title,
                url,
                source_id: source.id.clone(),
                source_name: source.name.clone(),
                category: source.category.clone(),
                fetch_time: fetch_time.clone(),
                content: None,
                analysis: None,
            })
        })
        .unique_by(|a| a.url.clone())
        .take(max)
        .collect();

    Ok(articles)
}

fn candidate_anchors(document: &Html) -> Vec<ElementRef<'_>> {
    CONTAINERS
        .iter()
        .find_map(|container| {
            let found = document.select(container).next()?;
            let links: Vec<ElementRef<'_>> = found.select(&ANCHOR).collect();
            (!links.is_empty()).then_some(links)
        })
        .unwrap_or_else(|| document.select(&ANCHOR).collect())
}

/// `true` for javascript/anchor/mailto/login/search/index targets, unless the
/// href carries a year token.
pub fn is_navigation(href: &str) -> bool {
    let lower = href.to_lowercase();
    NAVIGATION_PATTERNS.iter().any(|p| lower.contains(p)) && !YEAR_TOKEN.is_match(href)
}

/// Resolve `href` against `base` into a canonical absolute http(s) URL.
///
/// Protocol-relative links are pinned to `https:` so they fingerprint the same
/// as their absolute form.
pub fn resolve(base: &Url, href: &str) -> Option<String> {
    let joined = match href.strip_prefix("//") {
        Some(rest) => Url::parse(&format!("https://{rest}")),
        None => base.join(href),
    };
    let url = joined.ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Source {
        Source {
            id: "mofcom".to_string(),
            name: "MOFCOM".to_string(),
            category: "gov".to_string(),
            url: "https://www.mofcom.gov.cn/zwgk/".to_string(),
            encoding: None,
            auto_relevant: false,
            keywords_boost: vec![],
        }
    }

    #[test]
    fn test_container_preferred_over_page_links() {
        let html = r#"
            <html><body>
              <div class="header"><a href="/about/team.html">About our organisation</a></div>
              <div class="news-list">
                <ul>
                  <li><a href="/article/2025/05/a.html">关于汽车出口许可证管理的公告</a></li>
                  <li><a href="b.html">海关总署发布新版进出口税则</a></li>
                </ul>
              </div>
            </body></html>"#;
        let articles = extract_listing(html, "https://www.mofcom.gov.cn/zwgk/", &source(), 10).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].url, "https://www.mofcom.gov.cn/article/2025/05/a.html");
        assert_eq!(articles[1].url, "https://www.mofcom.gov.cn/zwgk/b.html");
        assert_eq!(articles[0].source_id, "mofcom");
    }

    #[test]
    fn test_falls_back_to_whole_document() {
        let html = r#"<html><body>
            <p><a href="/a/2025/x.html">Vehicle export licensing update</a></p>
        </body></html>"#;
        let articles = extract_listing(html, "https://example.gov.cn/", &source(), 10).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Vehicle export licensing update");
    }

    #[test]
    fn test_empty_container_falls_through() {
        let html = r#"<html><body>
            <div class="news-list"><span>nothing here</span></div>
            <div class="list"><a href="/p/1.html">Second container wins here</a></div>
        </body></html>"#;
        let articles = extract_listing(html, "https://example.gov.cn/", &source(), 10).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].url, "https://example.gov.cn/p/1.html");
    }

    #[test]
    fn test_short_titles_and_navigation_rejected() {
        let html = r##"<html><body>
            <a href="/short.html">Home</a>
            <a href="javascript:void(0)">Open the menu panel</a>
            <a href="#top">Back to the top of page</a>
            <a href="mailto:info@example.gov.cn">Write to the ministry</a>
            <a href="/search?q=car">Search the whole website</a>
            <a href="/index.html">Return to index page</a>
            <a href="/news/real-article.html">Real article headline</a>
        </body></html>"##;
        let articles = extract_listing(html, "https://example.gov.cn/", &source(), 10).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].url, "https://example.gov.cn/news/real-article.html");
    }

    #[test]
    fn test_index_page_with_year_token_kept() {
        assert!(is_navigation("/news/index.html"));
        assert!(!is_navigation("/news/2025/0506/index.html"));
        assert!(!is_navigation("/zcfb/t20250101_123.html"));
        assert!(!is_navigation("/zcfb/detail.html"));
    }

    #[test]
    fn test_dedup_and_truncate() {
        let html = r#"<html><body>
            <a href="/a.html">First headline text</a>
            <a href="https://example.gov.cn/a.html">Same article again</a>
            <a href="//example.gov.cn/b.html">Protocol relative one</a>
            <a href="/c.html">Third distinct headline</a>
        </body></html>"#;
        let articles = extract_listing(html, "https://example.gov.cn/", &source(), 2).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "First headline text");
        assert_eq!(articles[1].url, "https://example.gov.cn/b.html");
    }

    #[test]
    fn test_protocol_relative_matches_absolute() {
        let base = Url::parse("http://example.gov.cn/list/").unwrap();
        assert_eq!(
            resolve(&base, "//example.gov.cn/x.html"),
            resolve(&base, "https://example.gov.cn/x.html")
        );
        assert_eq!(resolve(&base, "ftp://example.gov.cn/file"), None);
    }

    #[test]
    fn test_invalid_base_url_is_error() {
        assert!(extract_listing("<html></html>", "not a url", &source(), 10).is_err());
    }
}
