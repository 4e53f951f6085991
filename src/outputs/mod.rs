//! Report generation: a human-readable digest and a machine-readable report.
//!
//! # Submodules
//!
//! - [`markdown`]: renders the ranked digest pushed to chat channels
//! - [`json`]: builds the structured [`Report`] and writes both files
//!
//! Rendering is pure: given the same articles and timestamp the output is
//! byte-for-byte identical. Only [`json::write_reports`] touches the disk.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── report_20250506_0800.md
//! └── report_20250506_0800.json
//! ```

pub mod json;
pub mod markdown;

use crate::models::{Article, Report};
use chrono::{DateTime, FixedOffset};

/// Stable sort by severity: high, then attention, then favorable.
///
/// Articles without a classification rank as attention. Ties keep their
/// input order.
pub fn sort_by_severity(articles: &mut [Article]) {
    articles.sort_by_key(Article::risk_level);
}

/// Rank `articles` and render both the digest and the structured report.
pub fn format(mut articles: Vec<Article>, generated_at: DateTime<FixedOffset>) -> (String, Report) {
    sort_by_severity(&mut articles);
    let digest = markdown::render_digest(&articles, generated_at);
    let report = json::build_report(&articles, generated_at);
    (digest, report)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{Article, Classification, RiskCategory, RiskLevel, Suggestion};
    use chrono::{DateTime, FixedOffset};

    pub fn at() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2025-05-06T08:30:00+08:00").unwrap()
    }

    pub fn article(title: &str, level: Option<RiskLevel>) -> Article {
        Article {
            title: title.to_string(),
            url: format!("https://example.gov.cn/{}.html", title.replace(' ', "-")),
            source_id: "mofcom".to_string(),
            source_name: "MOFCOM".to_string(),
            category: "gov".to_string(),
            fetch_time: "2025-05-06T08:00:00+08:00".to_string(),
            content: Some("body".to_string()),
            analysis: level.map(|risk_level| Classification {
                brief: format!("Brief {title}"),
                risk_level,
                risk_category: RiskCategory::TariffBarrier,
                affected_segments: vec!["vehicle export".to_string()],
                impact_analysis: format!("Impact of {title}"),
                suggestions: vec![
                    Suggestion {
                        strategy: "Hedge".to_string(),
                        action: "Review contracts".to_string(),
                    },
                    Suggestion {
                        strategy: "Insure".to_string(),
                        action: "Contact the insurer".to_string(),
                    },
                ],
                advisory_hint: Some("Export credit insurance advised".to_string()),
            }),
        }
    }
}
