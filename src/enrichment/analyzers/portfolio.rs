use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::lexicon::{MATERIALS, STYLES, TECHNIQUES};
use super::{Analyzer, AnalyzerKind, AnalyzerOutput, push_lower};
use crate::Result;
use crate::profile::ArtisanProfile;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    pub styles: Vec<String>,
    pub materials: Vec<String>,
    pub techniques: Vec<String>,
}

impl PortfolioAnalysis {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty() && self.materials.is_empty() && self.techniques.is_empty()
    }
}

/// Detects styles, materials and techniques named anywhere in the
/// portfolio keywords, description or declared fields
#[derive(Debug, Clone, Copy, Default)]
pub struct PortfolioAnalyzer;

impl PortfolioAnalyzer {
    #[inline]
    pub fn detect(&self, profile: &ArtisanProfile) -> PortfolioAnalysis {
        let mut parts = Vec::new();
        push_lower(&mut parts, profile.portfolio_keywords.iter().map(String::as_str));
        push_lower(&mut parts, profile.description.as_deref());
        push_lower(&mut parts, profile.materials.iter().map(String::as_str));
        push_lower(&mut parts, profile.techniques.iter().map(String::as_str));
        let haystack = format!(" {} ", parts.join(" "));

        let found = |lexicon: &[&str]| -> Vec<String> {
            lexicon
                .iter()
                .filter(|term| contains_term(&haystack, term))
                .map(|term| (*term).to_string())
                .collect()
        };

        PortfolioAnalysis {
            styles: found(STYLES),
            materials: found(MATERIALS),
            techniques: found(TECHNIQUES),
        }
    }
}

/// Whole-word containment; a trailing plural "s" still matches
fn contains_term(haystack: &str, term: &str) -> bool {
    let bytes = haystack.as_bytes();
    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = start.checked_sub(1).map(|i| bytes[i]);
        let after = bytes.get(end).copied();
        let boundary = |b: Option<u8>| b.is_none_or(|b| !b.is_ascii_alphanumeric());
        let plural = after == Some(b's') && boundary(bytes.get(end + 1).copied());
        boundary(before) && (boundary(after) || plural)
    })
}

#[async_trait]
impl Analyzer for PortfolioAnalyzer {
    #[inline]
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Portfolio
    }

    async fn analyze(&self, profile: &ArtisanProfile) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Portfolio(self.detect(profile)))
    }
}
