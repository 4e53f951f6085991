//! Fetch orchestration across all configured sources.
//!
//! For every source, in catalog order:
//! 1. fetch the listing page (failure skips the source)
//! 2. extract candidates, keep the relevant ones, keep the ones not in history
//! 3. fetch each new article's detail page behind a randomised politeness delay,
//!    falling back to the title when no body could be extracted, and record the
//!    article in history either way
//! 4. pause before the next source
//!
//! History is flushed once, after every source has been processed. Requests
//! are issued strictly one after another.

use crate::config::{Catalog, Source};
use crate::error::Result;
use crate::history::HistoryStore;
use crate::models::Article;
use crate::relevance::RelevanceFilter;
use crate::scrapers::PageFetcher;
use crate::scrapers::detail::extract_detail;
use crate::scrapers::listing::extract_listing;
use crate::utils::truncate_chars;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Articles kept per source in test mode.
pub const TEST_MODE_ARTICLES: usize = 3;

pub struct Crawler<F> {
    fetcher: F,
    catalog: Catalog,
    relevance: RelevanceFilter,
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(fetcher: F, catalog: Catalog) -> Self {
        let relevance = RelevanceFilter::new(&catalog.filter_keywords);
        Self {
            fetcher,
            catalog,
            relevance,
        }
    }

    /// Crawl every source and return the new relevant articles, bodies filled.
    ///
    /// In `test_mode` only the first source is crawled and at most
    /// [`TEST_MODE_ARTICLES`] of its new articles are kept.
    #[instrument(level = "info", skip(self, history))]
    pub async fn run(&self, history: &mut HistoryStore, test_mode: bool) -> Vec<Article> {
        let sources: &[Source] = if test_mode {
            &self.catalog.sources[..self.catalog.sources.len().min(1)]
        } else {
            &self.catalog.sources
        };

        info!(
            sources = sources.len(),
            history_entries = history.len(),
            last_run = ?history.last_run(),
            "Starting crawl"
        );

        let settings = &self.catalog.settings;
        let mut budget = settings.max_detail_fetch;
        let mut collected = Vec::new();

        for (i, source) in sources.iter().enumerate() {
            if budget == 0 {
                warn!(skipped_sources = sources.len() - i, "Detail fetch budget exhausted; stopping crawl");
                break;
            }
            info!(source = %source.name, url = %source.url, "Crawling source");

            let Some(mut fresh) = self.new_articles(source, history).await else {
                continue;
            };
            if test_mode {
                fresh.truncate(TEST_MODE_ARTICLES);
            }

            for mut article in fresh {
                if budget == 0 {
                    warn!(source = %source.name, "Detail fetch budget exhausted; remaining articles left for next run");
                    break;
                }

                pause(settings.request_delay()).await;
                info!(title = %truncate_chars(&article.title, 40), "Fetching detail page");
                let body = self.fetch_body(&article, source).await;

                if body.is_empty() {
                    article.content = Some(article.title.clone());
                } else {
                    budget -= 1;
                    article.content = Some(body.clone());
                }

                history.record(&article, &body);
                collected.push(article);
            }

            if budget > 0 {
                pause(settings.request_delay()).await;
            }
        }

        if let Err(e) = history.flush() {
            error!(error = %e, "Failed to persist history; next run may repeat articles");
        }

        info!(count = collected.len(), "Crawl complete");
        collected
    }

    /// Listing → extraction → relevance → novelty. `None` when the listing
    /// page is unavailable.
    async fn new_articles(&self, source: &Source, history: &HistoryStore) -> Option<Vec<Article>> {
        let html = match self.fetcher.fetch(&source.url, source.encoding.as_deref()).await {
            Ok(html) => html,
            Err(e) => {
                warn!(source = %source.name, error = %e, "Skipping source: listing page unavailable");
                return None;
            }
        };

        let max = self.catalog.settings.max_articles_per_source;
        let articles = match extract_listing(&html, &source.url, source, max) {
            Ok(articles) => articles,
            Err(e) => {
                warn!(source = %source.name, error = %e, "Skipping source: bad listing URL");
                return None;
            }
        };
        let found = articles.len();

        let relevant: Vec<Article> = articles
            .into_iter()
            .filter(|a| self.relevance.is_relevant(a, source))
            .collect();
        let relevant_count = relevant.len();

        let fresh: Vec<Article> = relevant.into_iter().filter(|a| history.is_new(a)).collect();

        info!(
            source = %source.name,
            found,
            relevant = relevant_count,
            new = fresh.len(),
            "Listing processed"
        );
        Some(fresh)
    }

    async fn fetch_body(&self, article: &Article, source: &Source) -> String {
        match self.fetcher.fetch(&article.url, source.encoding.as_deref()).await {
            Ok(html) => extract_detail(&html),
            Err(e) => {
                warn!(url = %article.url, error = %e, "Detail page unavailable; using title");
                String::new()
            }
        }
    }
}

/// Crawl with `fetcher`, or report nothing when it could not be built.
///
/// History is left untouched on the degraded path, so the next run picks up
/// everything this one missed.
pub async fn crawl<F: PageFetcher>(
    fetcher: Result<F>,
    catalog: Catalog,
    history: &mut HistoryStore,
    test_mode: bool,
) -> Vec<Article> {
    match fetcher {
        Ok(fetcher) => Crawler::new(fetcher, catalog).run(history, test_mode).await,
        Err(e) => {
            error!(error = %e, "Cannot build HTTP client; skipping crawl");
            Vec::new()
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}
