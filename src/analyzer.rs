//! Risk classification of crawled articles through an LLM.
//!
//! [`PolicyAnalyzer::analyze`] always produces a complete [`Classification`]:
//! a missing credential, a transport error, an empty reply or malformed JSON
//! each end in the deterministic [`fallback`] result rather than an error.

use crate::api::AskAsync;
use crate::models::{Article, Classification, RiskCategory, RiskLevel, Suggestion};
use crate::utils::{strip_code_fence, truncate_chars, truncate_for_log};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Body characters included in the prompt.
pub const PROMPT_BODY_CHARS: usize = 3000;
/// Length of the title-derived brief in fallback results.
pub const BRIEF_CHARS: usize = 25;
/// Raw reply characters kept as impact text when the reply is not valid JSON.
pub const RAW_IMPACT_CHARS: usize = 200;

pub const PENDING_IMPACT: &str = "Pending manual review of the original article.";

const SYSTEM_PROMPT: &str = r#"You are a trade-compliance risk analyst for Chinese automobile and auto-parts exporters (OEMs, parts makers and trading companies).
You read policy articles published by authorities such as the Ministry of Commerce, the General Administration of Customs, Sinosure and industry associations, and assess what they mean for vehicle exports.

Requirements:
1. State the core of the policy in plain language, not officialese.
2. Assign a risk level: "high", "attention" or "favorable".
3. Focus on the concrete impact on automobile exports.
4. Give actionable suggestions, not generic advice.
5. When risk is involved, say whether export credit insurance is advisable.

Reply with exactly one JSON object and nothing else:
{
  "brief": "one-line summary, at most 25 characters",
  "risk_level": "high | attention | favorable",
  "risk_category": "tariff_barrier | technical_standard | fx_control | political_risk | anti_dumping | industrial_support | market_dynamics | other",
  "affected_segments": ["vehicle export", "parts export", "aftermarket", "overseas investment"],
  "impact_analysis": "concrete impact on OEMs, parts makers and traders, 2-3 sentences",
  "suggestions": [
    {"strategy": "direction", "action": "concrete step"}
  ],
  "advisory_hint": "whether to insure and why, one sentence; empty string if not needed"
}"#;

/// Classifies articles, degrading to a fallback result on any failure.
///
/// `client` is `None` when no credential could be resolved; every article
/// then receives the fallback classification.
#[derive(Debug)]
pub struct PolicyAnalyzer<A> {
    client: Option<A>,
    delay: Duration,
}

impl<A> PolicyAnalyzer<A>
where
    A: AskAsync<Response = String>,
{
    pub fn new(client: Option<A>, delay: Duration) -> Self {
        if client.is_none() {
            warn!("No LLM credential found; all articles will get the fallback classification");
        }
        Self { client, delay }
    }

    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    pub async fn analyze(&self, article: &Article) -> Classification {
        let Some(client) = &self.client else {
            return fallback(article, None);
        };

        info!(title = %truncate_chars(&article.title, 40), "Analyzing article");
        let reply = match client.ask(SYSTEM_PROMPT, &build_prompt(article)).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                warn!("Model returned an empty reply; using fallback");
                return fallback(article, None);
            }
            Err(e) => {
                warn!(error = %e, "Classification call failed; using fallback");
                return fallback(article, None);
            }
        };

        parse_reply(&reply, article)
    }

    /// Classify every article in order, pausing between calls.
    pub async fn analyze_batch(&self, articles: Vec<Article>) -> Vec<Article> {
        let total = articles.len();
        let mut analyzed = Vec::with_capacity(total);
        for (i, mut article) in articles.into_iter().enumerate() {
            article.analysis = Some(self.analyze(&article).await);
            analyzed.push(article);
            if i + 1 < total && !self.delay.is_zero() {
                sleep(self.delay).await;
            }
        }
        info!(count = analyzed.len(), "Analysis complete");
        analyzed
    }
}

/// User prompt: source, title and the head of the body.
pub fn build_prompt(article: &Article) -> String {
    let body = article.content.as_deref().unwrap_or(&article.title);
    format!(
        "Analyze the following policy/industry article published by \"{source}\".\n\n\
         Title: {title}\n\n\
         Body:\n{body}\n\n\
         Reply with the JSON analysis as instructed.",
        source = article.source_name,
        title = article.title,
        body = truncate_chars(body, PROMPT_BODY_CHARS),
    )
}

/// Parse a model reply into a classification, completing missing fields from
/// the article.
///
/// Any JSON object is kept, however odd its individual fields; only a reply
/// that is not a JSON object at all becomes a fallback carrying the raw text.
pub fn parse_reply(reply: &str, article: &Article) -> Classification {
    let cleaned = strip_code_fence(reply);
    let decoded = serde_json::from_str::<Value>(cleaned)
        .map_err(|e| e.to_string())
        .and_then(|value| {
            if value.is_object() {
                serde_json::from_value::<Classification>(value).map_err(|e| e.to_string())
            } else {
                Err(format!("expected a JSON object, got {value}"))
            }
        });

    match decoded {
        Ok(parsed) => complete(parsed, article),
        Err(e) => {
            warn!(
                error = %truncate_for_log(&e, 200),
                response_preview = %truncate_for_log(reply, 300),
                "Model returned non-conforming JSON; using fallback with raw text"
            );
            fallback(article, Some(reply))
        }
    }
}

/// Deterministic degraded result.
///
/// With `raw`, its first [`RAW_IMPACT_CHARS`] characters replace the generic
/// impact placeholder so whatever the model said is still visible.
pub fn fallback(article: &Article, raw: Option<&str>) -> Classification {
    let impact = match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => truncate_chars(raw, RAW_IMPACT_CHARS),
        None => PENDING_IMPACT.to_string(),
    };
    Classification {
        brief: truncate_chars(&article.title, BRIEF_CHARS),
        risk_level: RiskLevel::Attention,
        risk_category: RiskCategory::Other,
        affected_segments: pending_segments(),
        impact_analysis: impact,
        suggestions: manual_review(),
        advisory_hint: None,
    }
}

fn pending_segments() -> Vec<String> {
    vec!["pending".to_string()]
}

fn manual_review() -> Vec<Suggestion> {
    vec![Suggestion {
        strategy: "monitor".to_string(),
        action: "Read the original article manually".to_string(),
    }]
}

fn complete(mut parsed: Classification, article: &Article) -> Classification {
    if parsed.brief.trim().is_empty() {
        parsed.brief = truncate_chars(&article.title, BRIEF_CHARS);
    }
    if parsed.impact_analysis.trim().is_empty() {
        parsed.impact_analysis = PENDING_IMPACT.to_string();
    }
    parsed.affected_segments.retain(|s| !s.trim().is_empty());
    if parsed.affected_segments.is_empty() {
        parsed.affected_segments = pending_segments();
    }
    parsed.suggestions.retain(|s| !s.action.trim().is_empty());
    if parsed.suggestions.is_empty() {
        parsed.suggestions = manual_review();
    }
    parsed.advisory_hint = parsed.advisory_hint.filter(|h| !h.trim().is_empty());
    parsed
}
