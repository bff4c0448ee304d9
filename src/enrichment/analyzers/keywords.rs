use std::collections::HashMap;

use async_trait::async_trait;

use super::{Analyzer, AnalyzerKind, AnalyzerOutput};
use crate::Result;
use crate::profile::ArtisanProfile;
use crate::query::vocabulary::is_stop_word;

const DEFAULT_KEYWORD_LIMIT: usize = 15;
const MIN_KEYWORD_CHARS: usize = 3;

/// Most frequent significant tokens of the identity fields
#[derive(Debug, Clone)]
pub struct KeywordAnalyzer {
    limit: usize,
}

impl Default for KeywordAnalyzer {
    #[inline]
    fn default() -> Self {
        Self {
            limit: DEFAULT_KEYWORD_LIMIT,
        }
    }
}

impl KeywordAnalyzer {
    #[inline]
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    /// Ranked by frequency, ties broken alphabetically
    #[inline]
    pub fn extract(&self, profile: &ArtisanProfile) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();

        let sources = [
            Some(profile.name.as_str()),
            profile.profession.as_deref(),
            profile.description.as_deref(),
            profile.bio.as_deref(),
        ]
        .into_iter()
        .flatten()
        .chain(profile.certifications.iter().map(String::as_str));

        for text in sources {
            for token in text
                .split(|c: char| !c.is_alphanumeric())
                .map(str::to_lowercase)
                .filter(|t| t.chars().count() >= MIN_KEYWORD_CHARS && !is_stop_word(t))
            {
                *counts.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|(a, a_count), (b, b_count)| b_count.cmp(a_count).then_with(|| a.cmp(b)));
        ranked
            .into_iter()
            .take(self.limit)
            .map(|(token, _)| token)
            .collect()
    }
}

#[async_trait]
impl Analyzer for KeywordAnalyzer {
    #[inline]
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Keywords
    }

    async fn analyze(&self, profile: &ArtisanProfile) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Keywords(self.extract(profile)))
    }
}
