pub mod lexicon;

mod keywords;
mod market;
mod portfolio;
mod sentiment;
mod skills;


use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::profile::ArtisanProfile;

pub use keywords::KeywordAnalyzer;
pub use market::{MarketAnalyzer, MarketPositioning, MarketSegment};
pub use portfolio::{PortfolioAnalysis, PortfolioAnalyzer};
pub use sentiment::{SentimentAnalyzer, SentimentLabel, SentimentSummary};
pub use skills::SkillAnalyzer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    Keywords,
    Skills,
    Portfolio,
    Sentiment,
    Market,
}

impl AnalyzerKind {
    pub const ALL: [AnalyzerKind; 5] = [
        AnalyzerKind::Keywords,
        AnalyzerKind::Skills,
        AnalyzerKind::Portfolio,
        AnalyzerKind::Sentiment,
        AnalyzerKind::Market,
    ];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            AnalyzerKind::Keywords => "keywords",
            AnalyzerKind::Skills => "skills",
            AnalyzerKind::Portfolio => "portfolio",
            AnalyzerKind::Sentiment => "sentiment",
            AnalyzerKind::Market => "market",
        }
    }
}

impl fmt::Display for AnalyzerKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerOutput {
    Keywords(Vec<String>),
    Skills(Vec<String>),
    Portfolio(PortfolioAnalysis),
    Sentiment(SentimentSummary),
    Market(MarketPositioning),
}

impl AnalyzerOutput {
    #[inline]
    pub fn kind(&self) -> AnalyzerKind {
        match self {
            AnalyzerOutput::Keywords(_) => AnalyzerKind::Keywords,
            AnalyzerOutput::Skills(_) => AnalyzerKind::Skills,
            AnalyzerOutput::Portfolio(_) => AnalyzerKind::Portfolio,
            AnalyzerOutput::Sentiment(_) => AnalyzerKind::Sentiment,
            AnalyzerOutput::Market(_) => AnalyzerKind::Market,
        }
    }
}

/// One independent enrichment step
///
/// Analyzers never see each other's output, so they can run in any order
/// or all at once.
#[async_trait]
pub trait Analyzer: Send + Sync {
    fn kind(&self) -> AnalyzerKind;

    async fn analyze(&self, profile: &ArtisanProfile) -> Result<AnalyzerOutput>;
}

/// The built-in lexicon analyzers, one per kind
#[inline]
pub fn default_analyzers() -> Vec<Arc<dyn Analyzer>> {
    vec![
        Arc::new(KeywordAnalyzer::default()),
        Arc::new(SkillAnalyzer),
        Arc::new(PortfolioAnalyzer),
        Arc::new(SentimentAnalyzer),
        Arc::new(MarketAnalyzer),
    ]
}

/// Lower-cases and adds every non-blank part to `out`
pub(crate) fn push_lower<'a>(out: &mut Vec<String>, parts: impl IntoIterator<Item = &'a str>) {
    out.extend(
        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_lowercase),
    );
}

/// Adds `value` unless an equal entry, ignoring case, is already present
pub(crate) fn push_unique(out: &mut Vec<String>, value: &str) {
    if !out.iter().any(|existing| existing.eq_ignore_ascii_case(value)) {
        out.push(value.to_string());
    }
}
