use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::lexicon::{NEGATIVE_TERMS, POSITIVE_TERMS};
use super::{Analyzer, AnalyzerKind, AnalyzerOutput, push_unique};
use crate::Result;
use crate::profile::ArtisanProfile;

const LABEL_THRESHOLD: f32 = 0.2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl SentimentLabel {
    #[inline]
    pub fn from_score(score: f32) -> Self {
        if score > LABEL_THRESHOLD {
            SentimentLabel::Positive
        } else if score < -LABEL_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    /// In [-1, 1]
    pub score: f32,
    pub label: SentimentLabel,
    pub positive_aspects: Vec<String>,
    pub negative_aspects: Vec<String>,
    pub review_count: usize,
}

/// Lexicon sentiment over review texts, blended with the star ratings
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    #[inline]
    pub fn summarize(&self, profile: &ArtisanProfile) -> SentimentSummary {
        let mut positive_hits = 0usize;
        let mut negative_hits = 0usize;
        let mut positive_aspects = Vec::new();
        let mut negative_aspects = Vec::new();

        for review in &profile.reviews {
            let text = review.text.to_lowercase();
            for (term, aspect) in POSITIVE_TERMS {
                if text.contains(term) {
                    positive_hits += 1;
                    push_unique(&mut positive_aspects, aspect);
                }
            }
            for (term, aspect) in NEGATIVE_TERMS {
                if text.contains(term) {
                    negative_hits += 1;
                    push_unique(&mut negative_aspects, aspect);
                }
            }
        }

        let total = positive_hits + negative_hits;
        let lexical = (total > 0)
            .then(|| (positive_hits as f32 - negative_hits as f32) / total as f32);

        // Map 1..=5 stars onto -1..=1
        let stars = profile
            .mean_review_rating()
            .or(profile.rating)
            .map(|rating| ((rating - 3.0) / 2.0).clamp(-1.0, 1.0));

        let score = match (lexical, stars) {
            (Some(lexical), Some(stars)) => 0.5 * lexical + 0.5 * stars,
            (Some(lexical), None) => lexical,
            (None, Some(stars)) => stars,
            _ => 0.0,
        };

        SentimentSummary {
            score,
            label: SentimentLabel::from_score(score),
            positive_aspects,
            negative_aspects,
            review_count: profile.reviews.len(),
        }
    }
}

#[async_trait]
impl Analyzer for SentimentAnalyzer {
    #[inline]
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Sentiment
    }

    async fn analyze(&self, profile: &ArtisanProfile) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Sentiment(self.summarize(profile)))
    }
}
