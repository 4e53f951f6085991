//! Data models for crawled articles, their classification and the final report.
//!
//! - [`Article`]: a candidate item discovered on a listing page
//! - [`Classification`]: the risk assessment attached by the analyzer
//! - [`Report`]: the machine-readable aggregate emitted once per run
//!
//! Risk levels and categories parse leniently: the model may answer in English
//! enum names, traffic-light colours or Chinese labels, and anything
//! unrecognised degrades to [`RiskLevel::Attention`] / [`RiskCategory::Other`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A news or policy item discovered on a source's listing page.
///
/// Created by the listing extractor, given a body by the crawler and a
/// classification by the analyzer. Read-only once formatting starts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Article {
    /// Anchor text from the listing page.
    pub title: String,
    /// Canonical absolute URL; the dedup key.
    pub url: String,
    pub source_id: String,
    pub source_name: String,
    pub category: String,
    /// RFC 3339 timestamp of when the listing page was parsed.
    pub fetch_time: String,
    /// Detail-page text, or the title when the detail page yielded nothing.
    pub content: Option<String>,
    pub analysis: Option<Classification>,
}

impl Article {
    /// Risk level used for ranking; unanalysed articles rank as attention.
    pub fn risk_level(&self) -> RiskLevel {
        self.analysis
            .as_ref()
            .map(|a| a.risk_level)
            .unwrap_or_default()
    }
}

/// Severity of a policy change for exporters.
///
/// Declaration order is the ranking order used by the formatter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum RiskLevel {
    High,
    #[default]
    Attention,
    Favorable,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::High => "High risk",
            RiskLevel::Attention => "Attention",
            RiskLevel::Favorable => "Favorable",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            RiskLevel::High => "🔴",
            RiskLevel::Attention => "🟡",
            RiskLevel::Favorable => "🟢",
        }
    }
}

impl From<String> for RiskLevel {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "high" | "red" | "高危" | "高风险" => RiskLevel::High,
            "favorable" | "favourable" | "green" | "利好" => RiskLevel::Favorable,
            _ => RiskLevel::Attention,
        }
    }
}

/// Kind of policy risk an article describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum RiskCategory {
    TariffBarrier,
    TechnicalStandard,
    FxControl,
    PoliticalRisk,
    AntiDumping,
    IndustrialSupport,
    MarketDynamics,
    #[default]
    Other,
}

impl RiskCategory {
    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::TariffBarrier => "Tariff barrier",
            RiskCategory::TechnicalStandard => "Technical standard",
            RiskCategory::FxControl => "FX control",
            RiskCategory::PoliticalRisk => "Political risk",
            RiskCategory::AntiDumping => "Anti-dumping",
            RiskCategory::IndustrialSupport => "Industrial support",
            RiskCategory::MarketDynamics => "Market dynamics",
            RiskCategory::Other => "Other",
        }
    }
}

impl From<String> for RiskCategory {
    fn from(value: String) -> Self {
        let normalized = value.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "tariff_barrier" | "关税壁垒" => RiskCategory::TariffBarrier,
            "technical_standard" | "技术标准" => RiskCategory::TechnicalStandard,
            "fx_control" | "foreign_exchange_control" | "外汇管制" => RiskCategory::FxControl,
            "political_risk" | "政治风险" => RiskCategory::PoliticalRisk,
            "anti_dumping" | "反倾销" => RiskCategory::AntiDumping,
            "industrial_support" | "产业扶持" => RiskCategory::IndustrialSupport,
            "market_dynamics" | "市场动态" => RiskCategory::MarketDynamics,
            _ => RiskCategory::Other,
        }
    }
}

/// One (strategy, action) pair suggested by the analysis.
///
/// A bare string is accepted as the action of an unnamed strategy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "SuggestionRepr")]
pub struct Suggestion {
    pub strategy: String,
    pub action: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SuggestionRepr {
    Pair {
        #[serde(default, deserialize_with = "lenient_string")]
        strategy: String,
        #[serde(default, deserialize_with = "lenient_string")]
        action: String,
    },
    Text(String),
}

impl From<SuggestionRepr> for Suggestion {
    fn from(repr: SuggestionRepr) -> Self {
        match repr {
            SuggestionRepr::Pair { strategy, action } => Suggestion { strategy, action },
            SuggestionRepr::Text(action) => Suggestion {
                strategy: String::new(),
                action,
            },
        }
    }
}

/// Structured risk assessment of one article.
///
/// Every field is populated: the analyzer fills gaps from the article itself
/// or from the fallback defaults before handing the value on. Decoding is
/// lenient so one odd field in a model reply does not discard the rest:
/// `null` reads as the default, scalars read as text and a lone item reads as
/// a one-element list.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Classification {
    /// One-line summary.
    #[serde(default, alias = "policy_brief", deserialize_with = "lenient_string")]
    pub brief: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub risk_level: RiskLevel,
    #[serde(default, alias = "risk_type", deserialize_with = "null_as_default")]
    pub risk_category: RiskCategory,
    #[serde(default, deserialize_with = "one_or_many")]
    pub affected_segments: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub impact_analysis: String,
    #[serde(default, alias = "action_suggestions", deserialize_with = "one_or_many")]
    pub suggestions: Vec<Suggestion>,
    #[serde(default, alias = "insurance_hint", deserialize_with = "lenient_opt_string")]
    pub advisory_hint: Option<String>,
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(scalar_text(Value::deserialize(d)?).unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(Value::deserialize(d)?))
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(d)? {
        None => Vec::new(),
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
    })
}

/// Count of report entries per risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RiskSummary {
    pub high: usize,
    pub attention: usize,
    pub favorable: usize,
}

impl RiskSummary {
    pub fn add(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::High => self.high += 1,
            RiskLevel::Attention => self.attention += 1,
            RiskLevel::Favorable => self.favorable += 1,
        }
    }
}

/// One ranked article in the [`Report`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportEntry {
    pub title: String,
    pub url: String,
    pub source: String,
    pub category: String,
    pub fetch_time: String,
    pub analysis: Option<Classification>,
}

/// Machine-readable result of a run, ordered by severity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Report {
    /// `RPT` followed by the generation time as `YYYYMMDDHHMM`.
    pub report_id: String,
    pub generated_at: String,
    pub report_type: String,
    pub total_articles: usize,
    pub risk_summary: RiskSummary,
    pub articles: Vec<ReportEntry>,
}
