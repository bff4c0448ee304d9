// Human-readable explanations attached to search results

#[cfg(test)]
mod tests;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::FusionConfig;
use crate::database::ArtisanMetadata;

const CONFIDENCE_SCALE: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    #[inline]
    pub fn from_confidence(confidence: f32) -> Self {
        if confidence >= 0.8 {
            ConfidenceLevel::High
        } else if confidence >= 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::High => f.write_str("high"),
            ConfidenceLevel::Medium => f.write_str("medium"),
            ConfidenceLevel::Low => f.write_str("low"),
        }
    }
}

/// Coarse split of a similarity score across the fused facets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacetBreakdown {
    pub profile: f32,
    pub skills: f32,
    pub portfolio: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchExplanation {
    pub breakdown: FacetBreakdown,
    pub reasons: Vec<String>,
    pub confidence: f32,
    pub level: ConfidenceLevel,
}

/// Builds the explanation for one result
///
/// The breakdown is the similarity scaled by each facet's share of the
/// fusion weight; the stored composite does not keep per-facet scores.
#[inline]
pub fn explain_match(
    similarity: f32,
    metadata: Option<&ArtisanMetadata>,
    weights: &FusionConfig,
    rating_threshold: f32,
) -> MatchExplanation {
    let total = weights.profile_weight + weights.skills_weight + weights.portfolio_weight;
    let share = |weight: f32| if total > 0.0 { weight / total } else { 0.0 };

    let breakdown = FacetBreakdown {
        profile: similarity * share(weights.profile_weight),
        skills: similarity * share(weights.skills_weight),
        portfolio: similarity * share(weights.portfolio_weight),
    };

    let mut reasons = vec![similarity_reason(similarity).to_string()];

    if let Some(metadata) = metadata {
        if metadata.verified {
            reasons.push("Verified artisan".to_string());
        }
        if let Some(rating) = metadata.rating {
            if rating >= rating_threshold {
                reasons.push(format!("Highly rated ({rating:.1} stars)"));
            }
        }
        if let Some(level) = metadata.experience_level {
            if level.is_advanced() {
                reasons.push(format!("{} level experience", capitalize(level.as_str())));
            }
        }
    }

    let confidence = (similarity * CONFIDENCE_SCALE).clamp(0.0, 1.0);

    MatchExplanation {
        breakdown,
        reasons,
        confidence,
        level: ConfidenceLevel::from_confidence(confidence),
    }
}

fn similarity_reason(similarity: f32) -> &'static str {
    if similarity >= 0.85 {
        "Excellent match for your search"
    } else if similarity >= 0.7 {
        "Strong match for your search"
    } else if similarity >= 0.5 {
        "Good match for your search"
    } else {
        "Partial match for your search"
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
