//! Structured report generation and report file output.
//!
//! Both renderings of a run are written side by side, named after the
//! generation time:
//! ```text
//! output_dir/
//! ├── report_20250506_0830.md
//! └── report_20250506_0830.json
//! ```

use crate::models::{Article, Report, ReportEntry, RiskSummary};
use chrono::{DateTime, FixedOffset};
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

pub const REPORT_TYPE: &str = "auto-export-policy-risk-brief";

/// Build the machine-readable report for already-ranked `articles`.
///
/// Unclassified articles count towards `attention` in the risk summary, so the
/// summary always adds up to `total_articles`.
pub fn build_report(articles: &[Article], generated_at: DateTime<FixedOffset>) -> Report {
    let mut risk_summary = RiskSummary::default();
    for article in articles {
        risk_summary.add(article.risk_level());
    }

    Report {
        report_id: format!("RPT{}", generated_at.format("%Y%m%d%H%M")),
        generated_at: generated_at.to_rfc3339(),
        report_type: REPORT_TYPE.to_string(),
        total_articles: articles.len(),
        risk_summary,
        articles: articles
            .iter()
            .map(|a| ReportEntry {
                title: a.title.clone(),
                url: a.url.clone(),
                source: a.source_name.clone(),
                category: a.category.clone(),
                fetch_time: a.fetch_time.clone(),
                analysis: a.analysis.clone(),
            })
            .collect(),
    }
}

/// Paths the digest and report of a run are written to.
pub fn report_paths(output_dir: &str, generated_at: DateTime<FixedOffset>) -> (PathBuf, PathBuf) {
    let stamp = generated_at.format("%Y%m%d_%H%M");
    let dir = PathBuf::from(output_dir);
    (
        dir.join(format!("report_{stamp}.md")),
        dir.join(format!("report_{stamp}.json")),
    )
}

/// Write the digest and the pretty-printed report into `output_dir`.
///
/// # Returns
///
/// The markdown and JSON paths written.
#[instrument(level = "info", skip_all, fields(%output_dir))]
pub async fn write_reports(
    output_dir: &str,
    digest: &str,
    report: &Report,
    generated_at: DateTime<FixedOffset>,
) -> Result<(PathBuf, PathBuf), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let (md_path, json_path) = report_paths(output_dir, generated_at);
    fs::write(&md_path, digest).await?;
    info!(path = %md_path.display(), "Wrote markdown digest");

    let json = serde_json::to_string_pretty(report)?;
    fs::write(&json_path, json).await?;
    info!(path = %json_path.display(), "Wrote JSON report");

    Ok((md_path, json_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;
    use crate::outputs::fixtures::{article, at};

    #[test]
    fn test_report_counts_and_id() {
        let articles = vec![
            article("a", Some(RiskLevel::High)),
            article("b", Some(RiskLevel::High)),
            article("c", None),
            article("d", Some(RiskLevel::Favorable)),
        ];
        let report = build_report(&articles, at());
        assert_eq!(report.report_id, "RPT202505060830");
        assert_eq!(report.generated_at, "2025-05-06T08:30:00+08:00");
        assert_eq!(report.total_articles, 4);
        assert_eq!(
            report.risk_summary,
            RiskSummary {
                high: 2,
                attention: 1,
                favorable: 1
            }
        );
        assert_eq!(report.articles[2].title, "c");
        assert!(report.articles[2].analysis.is_none());
    }

    #[test]
    fn test_empty_report() {
        let report = build_report(&[], at());
        assert_eq!(report.total_articles, 0);
        assert!(report.articles.is_empty());
    }

    #[tokio::test]
    async fn test_write_reports() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        let out = out.to_str().unwrap();
        let report = build_report(&[article("a", Some(RiskLevel::High))], at());

        let (md, json) = write_reports(out, "digest text", &report, at()).await.unwrap();
        assert!(md.ends_with("report_20250506_0830.md"));
        assert_eq!(std::fs::read_to_string(&md).unwrap(), "digest text");

        let parsed: Report = serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(parsed.risk_summary.high, 1);
        assert_eq!(parsed.articles[0].analysis.as_ref().unwrap().risk_level, RiskLevel::High);
    }
}
