use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::lexicon::{CUSTOM_ORDER_TERMS, ECO_TERMS};
use super::{Analyzer, AnalyzerKind, AnalyzerOutput, push_lower};
use crate::Result;
use crate::profile::{ArtisanProfile, PriceRange};

const HIGH_RATING: f32 = 4.5;
const FAST_TURNAROUND_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSegment {
    Budget,
    Mid,
    Premium,
    Luxury,
}

impl MarketSegment {
    /// Segment of a price range's midpoint, in the range's own currency units
    #[inline]
    pub fn from_price(range: &PriceRange) -> Self {
        match range.midpoint() {
            p if p < 50.0 => MarketSegment::Budget,
            p if p < 250.0 => MarketSegment::Mid,
            p if p < 1000.0 => MarketSegment::Premium,
            _ => MarketSegment::Luxury,
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            MarketSegment::Budget => "budget",
            MarketSegment::Mid => "mid-range",
            MarketSegment::Premium => "premium",
            MarketSegment::Luxury => "luxury",
        }
    }

    fn audience(self) -> &'static str {
        match self {
            MarketSegment::Budget => "budget-conscious shoppers",
            MarketSegment::Mid => "everyday buyers of handmade goods",
            MarketSegment::Premium => "discerning buyers of quality craftsmanship",
            MarketSegment::Luxury => "collectors and luxury clients",
        }
    }
}

impl fmt::Display for MarketSegment {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketPositioning {
    pub segment: Option<MarketSegment>,
    pub target_audience: String,
    pub unique_selling_points: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarketAnalyzer;

impl MarketAnalyzer {
    #[inline]
    pub fn position(&self, profile: &ArtisanProfile) -> MarketPositioning {
        let segment = profile.price_range.as_ref().map(MarketSegment::from_price);
        let target_audience = segment
            .map(MarketSegment::audience)
            .unwrap_or_default()
            .to_string();

        MarketPositioning {
            segment,
            target_audience,
            unique_selling_points: selling_points(profile),
        }
    }
}

fn selling_points(profile: &ArtisanProfile) -> Vec<String> {
    let mut points = Vec::new();

    if profile.verified {
        points.push("verified artisan".to_string());
    }

    let rating = profile.rating.or_else(|| profile.mean_review_rating());
    if rating.is_some_and(|r| r >= HIGH_RATING) {
        points.push("highly rated".to_string());
    }

    if let Some(level) = profile.experience_level {
        if level.is_advanced() {
            points.push(format!("{level} craftsmanship"));
        }
    }

    let mut parts = Vec::new();
    push_lower(&mut parts, profile.description.as_deref());
    push_lower(&mut parts, profile.bio.as_deref());
    push_lower(&mut parts, profile.skills.iter().map(String::as_str));
    push_lower(&mut parts, profile.portfolio_keywords.iter().map(String::as_str));
    let prose = parts.join(" ");

    if CUSTOM_ORDER_TERMS.iter().any(|term| prose.contains(term)) {
        points.push("custom orders".to_string());
    }

    let materials = profile.materials.join(" ").to_lowercase();
    if ECO_TERMS
        .iter()
        .any(|term| materials.contains(term) || prose.contains(term))
    {
        points.push("eco-friendly materials".to_string());
    }

    if !profile.certifications.is_empty() {
        points.push("certified craftsperson".to_string());
    }

    if profile
        .turnaround_days
        .is_some_and(|days| days <= FAST_TURNAROUND_DAYS)
    {
        points.push("fast turnaround".to_string());
    }

    points
}

#[async_trait]
impl Analyzer for MarketAnalyzer {
    #[inline]
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Market
    }

    async fn analyze(&self, profile: &ArtisanProfile) -> Result<AnalyzerOutput> {
        Ok(AnalyzerOutput::Market(self.position(profile)))
    }
}
