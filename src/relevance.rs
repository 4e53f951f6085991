//! Keyword relevance gate applied to listing-page titles.
//!
//! Two tiers: a source's own boost keywords are checked first and short-circuit,
//! then the catalog-wide keyword list. Sources flagged `auto_relevant` skip the
//! check entirely, so a curated source tagged that way is never filtered out.

use crate::config::Source;
use crate::models::Article;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    /// Lowercased global keywords, empties removed.
    keywords: Vec<String>,
}

impl RelevanceFilter {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: normalize(keywords),
        }
    }

    pub fn is_relevant(&self, article: &Article, source: &Source) -> bool {
        if source.auto_relevant {
            return true;
        }

        let title = article.title.to_lowercase();

        if let Some(kw) = normalize(&source.keywords_boost)
            .into_iter()
            .find(|kw| title.contains(kw.as_str()))
        {
            trace!(keyword = %kw, title = %article.title, "Boost keyword hit");
            return true;
        }

        match self.keywords.iter().find(|kw| title.contains(kw.as_str())) {
            Some(kw) => {
                trace!(keyword = %kw, title = %article.title, "Global keyword hit");
                true
            }
            None => false,
        }
    }
}

fn normalize(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}
