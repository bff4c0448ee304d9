// Enrichment module
// Runs the profile analyzers concurrently and merges their results

pub mod analyzers;


use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::profile::ArtisanProfile;

pub use analyzers::{
    Analyzer, AnalyzerKind, AnalyzerOutput, KeywordAnalyzer, MarketAnalyzer, MarketPositioning,
    MarketSegment, PortfolioAnalysis, PortfolioAnalyzer, SentimentAnalyzer, SentimentLabel,
    SentimentSummary, SkillAnalyzer, default_analyzers,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedProfile {
    pub artisan_id: String,
    pub content_hash: String,
    pub keywords: Vec<String>,
    pub inferred_skills: Vec<String>,
    pub portfolio: PortfolioAnalysis,
    pub sentiment: SentimentSummary,
    pub market: MarketPositioning,
    pub enriched_text: String,
    pub confidence: f32,
    pub failed_analyzers: Vec<AnalyzerKind>,
    pub enriched_at: DateTime<Utc>,
}

impl EnrichedProfile {
    #[inline]
    pub fn is_degraded(&self) -> bool {
        !self.failed_analyzers.is_empty()
    }

    #[inline]
    pub fn has_failed(&self, kind: AnalyzerKind) -> bool {
        self.failed_analyzers.contains(&kind)
    }
}

#[derive(Default)]
struct Facets {
    keywords: Vec<String>,
    inferred_skills: Vec<String>,
    portfolio: PortfolioAnalysis,
    sentiment: SentimentSummary,
    market: MarketPositioning,
}

impl Facets {
    fn apply(&mut self, output: AnalyzerOutput) {
        match output {
            AnalyzerOutput::Keywords(keywords) => self.keywords = keywords,
            AnalyzerOutput::Skills(skills) => self.inferred_skills = skills,
            AnalyzerOutput::Portfolio(portfolio) => self.portfolio = portfolio,
            AnalyzerOutput::Sentiment(sentiment) => self.sentiment = sentiment,
            AnalyzerOutput::Market(market) => self.market = market,
        }
    }
}

/// Fans a profile out to every analyzer and folds the results back together
///
/// A failing or panicking analyzer leaves its facet at the default value and
/// is listed in `failed_analyzers`; enrichment itself never fails.
#[derive(Clone)]
pub struct EnrichmentPipeline {
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl Default for EnrichmentPipeline {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl EnrichmentPipeline {
    #[inline]
    pub fn new() -> Self {
        Self {
            analyzers: default_analyzers(),
        }
    }

    #[inline]
    pub fn with_analyzers(analyzers: Vec<Arc<dyn Analyzer>>) -> Self {
        Self { analyzers }
    }

    #[inline]
    pub async fn enrich(&self, profile: &ArtisanProfile) -> EnrichedProfile {
        let shared = Arc::new(profile.clone());
        let mut tasks = JoinSet::new();
        let mut pending: HashSet<AnalyzerKind> = HashSet::new();

        for analyzer in &self.analyzers {
            let analyzer = Arc::clone(analyzer);
            let profile = Arc::clone(&shared);
            let kind = analyzer.kind();
            pending.insert(kind);
            tasks.spawn(async move { (kind, analyzer.analyze(&profile).await) });
        }

        let mut facets = Facets::default();
        let mut failed = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, Ok(output))) => {
                    pending.remove(&kind);
                    if output.kind() == kind {
                        facets.apply(output);
                    } else {
                        warn!(
                            "Analyzer {} for artisan {} returned {} output, ignoring it",
                            kind,
                            profile.id,
                            output.kind()
                        );
                        failed.push(kind);
                    }
                }
                Ok((kind, Err(e))) => {
                    pending.remove(&kind);
                    warn!("Analyzer {} failed for artisan {}: {}", kind, profile.id, e);
                    failed.push(kind);
                }
                Err(e) => {
                    // The panicked task's kind is whatever never reported back
                    warn!("Analyzer task for artisan {} aborted: {}", profile.id, e);
                }
            }
        }

        failed.extend(pending);
        failed.sort();
        failed.dedup();

        let confidence = score_confidence(profile, &facets, &failed);
        let enriched_text = enriched_text(profile, &facets);

        debug!(
            "Enriched artisan {}: {} keywords, {} inferred skills, confidence {:.2}",
            profile.id,
            facets.keywords.len(),
            facets.inferred_skills.len(),
            confidence
        );

        EnrichedProfile {
            artisan_id: profile.id.clone(),
            content_hash: profile.content_hash(),
            keywords: facets.keywords,
            inferred_skills: facets.inferred_skills,
            portfolio: facets.portfolio,
            sentiment: facets.sentiment,
            market: facets.market,
            enriched_text,
            confidence,
            failed_analyzers: failed,
            enriched_at: Utc::now(),
        }
    }

    /// Re-enriches only when the enrichment-feeding fields changed
    #[inline]
    pub async fn enrich_if_changed(
        &self,
        profile: &ArtisanProfile,
        previous: Option<EnrichedProfile>,
    ) -> EnrichedProfile {
        if let Some(previous) = previous {
            if previous.artisan_id == profile.id && previous.content_hash == profile.content_hash()
            {
                debug!("Artisan {} unchanged, reusing enrichment", profile.id);
                return previous;
            }
        }
        self.enrich(profile).await
    }
}

struct Factor {
    weight: f32,
    score: f32,
    present: bool,
}

fn tier(value: usize, tiers: &[(usize, f32)]) -> f32 {
    tiers
        .iter()
        .find(|(threshold, _)| value >= *threshold)
        .map_or(0.0, |(_, score)| *score)
}

/// Weighted mean of the facet richness factors that are present
///
/// A factor is present when it has any signal, or when the analyzer that
/// feeds it failed; a failure therefore lowers the score instead of
/// dropping out of the denominator.
fn score_confidence(profile: &ArtisanProfile, facets: &Facets, failed: &[AnalyzerKind]) -> f32 {
    let present = |kind: AnalyzerKind, count: usize| count > 0 || failed.contains(&kind);

    let text_length = profile.identity_text().chars().count();
    let keyword_count = facets.keywords.len();
    let skill_count = facets.inferred_skills.len() + profile.skills.len();
    let technique_count = technique_count(profile, facets);
    let positive_count = facets.sentiment.positive_aspects.len();
    let usp_count = facets.market.unique_selling_points.len();

    let factors = [
        Factor {
            weight: 0.25,
            score: tier(text_length, &[(200, 1.0), (100, 0.7), (50, 0.4), (1, 0.1)]),
            present: text_length > 0,
        },
        Factor {
            weight: 0.15,
            score: tier(keyword_count, &[(10, 1.0), (5, 0.6), (1, 0.3)]),
            present: present(AnalyzerKind::Keywords, keyword_count),
        },
        Factor {
            weight: 0.20,
            score: tier(skill_count, &[(6, 1.0), (3, 0.7), (1, 0.4)]),
            present: present(AnalyzerKind::Skills, skill_count),
        },
        Factor {
            weight: 0.15,
            score: tier(technique_count, &[(4, 1.0), (2, 0.6), (1, 0.3)]),
            present: present(AnalyzerKind::Portfolio, technique_count),
        },
        Factor {
            weight: 0.10,
            score: tier(positive_count, &[(5, 1.0), (2, 0.6), (1, 0.3)]),
            present: present(AnalyzerKind::Sentiment, positive_count),
        },
        Factor {
            weight: 0.15,
            score: tier(usp_count, &[(4, 1.0), (2, 0.6), (1, 0.3)]),
            present: present(AnalyzerKind::Market, usp_count),
        },
    ];

    let (weighted, total_weight) = factors
        .iter()
        .filter(|f| f.present)
        .fold((0.0f32, 0.0f32), |(sum, weights), f| {
            (sum + f.weight * f.score, weights + f.weight)
        });

    if total_weight == 0.0 {
        return 0.0;
    }
    (weighted / total_weight).clamp(0.0, 1.0)
}

/// Declared techniques plus detected ones, counted once each
fn technique_count(profile: &ArtisanProfile, facets: &Facets) -> usize {
    let mut techniques: HashSet<String> = profile
        .techniques
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    techniques.extend(facets.portfolio.techniques.iter().cloned());
    techniques.len()
}

fn enriched_text(profile: &ArtisanProfile, facets: &Facets) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut add = |values: &[String]| {
        analyzers::push_lower(&mut parts, values.iter().map(String::as_str));
    };

    add(&[profile.identity_text()]);
    add(&profile.certifications);
    add(&profile.skills);
    add(&profile.materials);
    add(&profile.techniques);
    add(&profile.portfolio_keywords);
    add(&facets.keywords);
    add(&facets.inferred_skills);
    add(&facets.portfolio.styles);
    add(&facets.portfolio.materials);
    add(&facets.portfolio.techniques);

    if facets.sentiment.review_count > 0 {
        add(&[format!("{} reviews", facets.sentiment.label)]);
    }
    add(&facets.sentiment.positive_aspects);

    if let Some(segment) = facets.market.segment {
        add(&[format!("{segment} segment"), facets.market.target_audience.clone()]);
    }
    add(&facets.market.unique_selling_points);

    parts.join(" ")
}
