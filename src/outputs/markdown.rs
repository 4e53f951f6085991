//! Plain-text/markdown digest rendering.
//!
//! The digest is what ends up in the chat group, so it favours short lines and
//! emoji markers over markdown structure.

use crate::analyzer::BRIEF_CHARS;
use crate::models::Article;
use crate::utils::truncate_chars;
use chrono::{DateTime, FixedOffset};
use std::fmt::Write;

pub const DIGEST_TITLE: &str = "📋 Auto Export Policy Risk Brief";
const RULE_WIDTH: usize = 30;

/// Render the digest for already-ranked `articles`.
pub fn render_digest(articles: &[Article], generated_at: DateTime<FixedOffset>) -> String {
    let rule = "━".repeat(RULE_WIDTH);
    let mut md = String::new();

    writeln!(md, "{DIGEST_TITLE}").unwrap();
    writeln!(md, "📅 {}", generated_at.format("%Y-%m-%d %H:%M")).unwrap();
    writeln!(md, "📊 {} new update(s) detected in this run", articles.len()).unwrap();
    writeln!(md).unwrap();

    if articles.is_empty() {
        write!(md, "✅ No new policy updates relevant to automobile exports.").unwrap();
        return md;
    }

    for article in articles {
        let level = article.risk_level();
        writeln!(md, "{rule}").unwrap();

        match &article.analysis {
            Some(analysis) => {
                writeln!(md, "{} [{}] {}", level.emoji(), level.label(), analysis.brief).unwrap();
                writeln!(
                    md,
                    "📌 Source: {} | Type: {}",
                    article.source_name,
                    analysis.risk_category.label()
                )
                .unwrap();
                writeln!(md, "📝 Impact: {}", analysis.impact_analysis).unwrap();

                if !analysis.suggestions.is_empty() {
                    writeln!(md, "💡 Suggestions:").unwrap();
                    for (i, s) in analysis.suggestions.iter().enumerate() {
                        writeln!(md, "  {}. [{}] {}", i + 1, s.strategy, s.action).unwrap();
                    }
                }

                if let Some(hint) = analysis.advisory_hint.as_deref().filter(|h| !h.is_empty()) {
                    writeln!(md, "🛡️ Advisory: {hint}").unwrap();
                }
            }
            None => {
                // --fetch-only runs carry no analysis
                writeln!(
                    md,
                    "{} [{}] {}",
                    level.emoji(),
                    level.label(),
                    truncate_chars(&article.title, BRIEF_CHARS)
                )
                .unwrap();
                writeln!(md, "📌 Source: {} | Type: —", article.source_name).unwrap();
            }
        }

        writeln!(md, "🔗 Original: {}", article.url).unwrap();
        writeln!(md).unwrap();
    }

    writeln!(md, "{rule}").unwrap();
    writeln!(md, "📡 Sources: MOFCOM / GACC / Sinosure / CADA and other configured sites").unwrap();
    writeln!(md, "🤖 Generated by the automated policy analysis pipeline").unwrap();
    write!(md, "⚠️ For reference only; verify against the original before acting").unwrap();
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::fixtures::{article, at};
    use crate::models::RiskLevel;

    #[test]
    fn test_empty_digest() {
        let md = render_digest(&[], at());
        assert!(md.starts_with(DIGEST_TITLE));
        assert!(md.contains("2025-05-06 08:30"));
        assert!(md.contains("📊 0 new update(s)"));
        assert!(md.contains("No new policy updates"));
        assert!(!md.contains("━"));
    }

    #[test]
    fn test_article_block_contents() {
        let md = render_digest(&[article("tariffs", Some(RiskLevel::High))], at());
        assert!(md.contains("🔴 [High risk] Brief tariffs"));
        assert!(md.contains("📌 Source: MOFCOM | Type: Tariff barrier"));
        assert!(md.contains("📝 Impact: Impact of tariffs"));
        assert!(md.contains("  1. [Hedge] Review contracts"));
        assert!(md.contains("  2. [Insure] Contact the insurer"));
        assert!(md.contains("🛡️ Advisory: Export credit insurance advised"));
        assert!(md.contains("🔗 Original: https://example.gov.cn/tariffs.html"));
        assert!(md.trim_end().ends_with("verify against the original before acting"));
    }

    #[test]
    fn test_hint_omitted_when_absent() {
        let mut a = article("quiet", Some(RiskLevel::Favorable));
        a.analysis.as_mut().unwrap().advisory_hint = None;
        let md = render_digest(&[a], at());
        assert!(md.contains("🟢 [Favorable]"));
        assert!(!md.contains("Advisory"));
    }

    #[test]
    fn test_unanalysed_article_uses_title() {
        let md = render_digest(&[article("fetch only item", None)], at());
        assert!(md.contains("🟡 [Attention] fetch only item"));
        assert!(md.contains("Type: —"));
    }
}
