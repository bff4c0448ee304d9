// Fusion module
// Turns profiles into composite vectors and queries into query vectors

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::FusionConfig;
use crate::embeddings::EmbeddingClient;
use crate::enrichment::{EnrichedProfile, EnrichmentPipeline};
use crate::profile::ArtisanProfile;
use crate::query::{QueryType, process_or_literal};
use crate::vector::{self, WeightedVector};
use crate::{MatchError, Result};

const FACET_COUNT: usize = 3;
const QUERY_WORD_CAP: usize = 10;
const QUERY_CONCEPT_CAP: usize = 5;

/// The three lower-cased texts embedded separately for a profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetTexts {
    pub profile: String,
    pub skills: String,
    pub portfolio: String,
}

impl FacetTexts {
    #[inline]
    pub fn from_profile(profile: &ArtisanProfile, enriched: &EnrichedProfile) -> Self {
        let mut identity: Vec<String> = vec![profile.identity_text()];
        identity.extend(profile.certifications.iter().cloned());
        identity.extend(enriched.keywords.iter().cloned());
        if let Some(segment) = enriched.market.segment {
            identity.push(format!("{segment} segment"));
        }
        identity.push(enriched.market.target_audience.clone());

        let mut skills: Vec<String> = profile.skills.clone();
        skills.extend(enriched.inferred_skills.iter().cloned());
        skills.extend(profile.techniques.iter().cloned());
        skills.extend(enriched.portfolio.techniques.iter().cloned());
        skills.extend(profile.materials.iter().cloned());
        if let Some(level) = profile.experience_level {
            skills.push(level.phrase().to_string());
        }

        let mut portfolio: Vec<String> = profile.portfolio_keywords.clone();
        portfolio.extend(enriched.portfolio.styles.iter().cloned());
        if let Some(range) = &profile.price_range {
            portfolio.push(format!(
                "priced {:.0} to {:.0} {}",
                range.min, range.max, range.currency
            ));
        }
        if let Some(days) = profile.turnaround_days {
            portfolio.push(format!("ready in {days} days"));
        }

        Self {
            profile: join_lower(&identity),
            skills: join_lower(&dedup_ignore_case(skills)),
            portfolio: join_lower(&portfolio),
        }
    }
}

fn join_lower(parts: &[String]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn dedup_ignore_case(values: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.iter().any(|u| u.trim().eq_ignore_ascii_case(value.trim())) {
            unique.push(value);
        }
    }
    unique
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtisanEmbedding {
    pub artisan_id: String,
    pub profile_vector: Vec<f32>,
    pub skills_vector: Vec<f32>,
    pub portfolio_vector: Vec<f32>,
    pub composite_vector: Vec<f32>,
    pub confidence: f32,
    pub content_hash: String,
    pub model_version: String,
    pub generated_at: DateTime<Utc>,
}

impl ArtisanEmbedding {
    /// Rejects wrong-sized or non-finite vectors and an all-zero composite
    #[inline]
    pub fn validate(&self, dimension: usize) -> Result<()> {
        let vectors = [
            ("profile", &self.profile_vector),
            ("skills", &self.skills_vector),
            ("portfolio", &self.portfolio_vector),
            ("composite", &self.composite_vector),
        ];

        for (facet, values) in vectors {
            if values.len() != dimension {
                return Err(self.invalid(format!(
                    "{facet} vector has {} dimensions, expected {dimension}",
                    values.len()
                )));
            }
            if !vector::is_valid_vector(values) {
                return Err(self.invalid(format!("{facet} vector contains non-finite values")));
            }
        }

        if vector::is_zero_vector(&self.composite_vector) {
            return Err(self.invalid("composite vector carries no signal".to_string()));
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> MatchError {
        MatchError::InvalidEmbedding {
            artisan_id: self.artisan_id.clone(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEmbedding {
    pub original: String,
    pub cleaned: String,
    pub expanded: String,
    pub concepts: Vec<String>,
    pub vector: Vec<f32>,
    pub query_type: QueryType,
    pub confidence: f32,
}

/// Owns the facet weighting that turns facet vectors into a composite
pub struct EmbeddingFusion {
    client: Arc<EmbeddingClient>,
    pipeline: EnrichmentPipeline,
    weights: FusionConfig,
}

impl EmbeddingFusion {
    #[inline]
    pub fn new(
        client: Arc<EmbeddingClient>,
        pipeline: EnrichmentPipeline,
        weights: FusionConfig,
    ) -> Self {
        Self {
            client,
            pipeline,
            weights,
        }
    }

    #[inline]
    pub fn client(&self) -> &EmbeddingClient {
        &self.client
    }

    #[inline]
    pub fn pipeline(&self) -> &EnrichmentPipeline {
        &self.pipeline
    }

    #[inline]
    pub fn weights(&self) -> &FusionConfig {
        &self.weights
    }

    /// Normalized weighted average of the three facet vectors
    #[inline]
    pub fn fuse(&self, profile: &[f32], skills: &[f32], portfolio: &[f32]) -> Result<Vec<f32>> {
        let combined = vector::weighted_average(&[
            WeightedVector::new(profile.to_vec(), self.weights.profile_weight),
            WeightedVector::new(skills.to_vec(), self.weights.skills_weight),
            WeightedVector::new(portfolio.to_vec(), self.weights.portfolio_weight),
        ])?;
        Ok(vector::normalize(&combined))
    }

    /// Enriches the profile and builds its validated embedding
    #[inline]
    pub async fn generate_artisan_embedding(
        &self,
        profile: &ArtisanProfile,
    ) -> Result<ArtisanEmbedding> {
        let enriched = self.pipeline.enrich(profile).await;
        self.embed_enriched(profile, &enriched).await
    }

    /// Builds the embedding from an existing enrichment
    ///
    /// The three facets are embedded concurrently; fusion waits for all of
    /// them.
    #[inline]
    pub async fn embed_enriched(
        &self,
        profile: &ArtisanProfile,
        enriched: &EnrichedProfile,
    ) -> Result<ArtisanEmbedding> {
        let facets = FacetTexts::from_profile(profile, enriched);

        let (profile_vector, skills_vector, portfolio_vector) = futures::try_join!(
            self.client.embed(&facets.profile, None),
            self.client.embed(&facets.skills, None),
            self.client.embed(&facets.portfolio, None),
        )?;

        self.assemble(
            profile,
            enriched,
            Vec::clone(&profile_vector.vector),
            Vec::clone(&skills_vector.vector),
            Vec::clone(&portfolio_vector.vector),
        )
    }

    /// Enriches every profile, then embeds all facet texts in one batch
    #[inline]
    pub async fn generate_batch_artisan_embeddings(
        &self,
        profiles: &[ArtisanProfile],
    ) -> Result<Vec<ArtisanEmbedding>> {
        let enriched =
            futures::future::join_all(profiles.iter().map(|p| self.pipeline.enrich(p))).await;
        self.embed_enriched_batch(profiles, &enriched).await
    }

    #[inline]
    pub async fn embed_enriched_batch(
        &self,
        profiles: &[ArtisanProfile],
        enriched: &[EnrichedProfile],
    ) -> Result<Vec<ArtisanEmbedding>> {
        if profiles.len() != enriched.len() {
            return Err(MatchError::InvalidInput(format!(
                "{} profiles but {} enrichments",
                profiles.len(),
                enriched.len()
            )));
        }
        if profiles.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = profiles
            .iter()
            .zip(enriched)
            .flat_map(|(profile, enriched)| {
                let facets = FacetTexts::from_profile(profile, enriched);
                [facets.profile, facets.skills, facets.portfolio]
            })
            .collect();

        let batch = self.client.embed_batch(&texts, None).await?;
        info!(
            "Embedded {} facet texts for {} profiles ({} cache hits)",
            texts.len(),
            profiles.len(),
            batch.cache_hits
        );

        profiles
            .iter()
            .zip(enriched)
            .zip(batch.vectors.chunks(FACET_COUNT))
            .map(|((profile, enriched), vectors)| match vectors {
                [profile_vector, skills_vector, portfolio_vector] => self.assemble(
                    profile,
                    enriched,
                    Vec::clone(profile_vector),
                    Vec::clone(skills_vector),
                    Vec::clone(portfolio_vector),
                ),
                _ => Err(MatchError::InvalidInput(format!(
                    "expected {FACET_COUNT} facet vectors for artisan {}",
                    profile.id
                ))),
            })
            .collect()
    }

    fn assemble(
        &self,
        profile: &ArtisanProfile,
        enriched: &EnrichedProfile,
        profile_vector: Vec<f32>,
        skills_vector: Vec<f32>,
        portfolio_vector: Vec<f32>,
    ) -> Result<ArtisanEmbedding> {
        let composite_vector = self.fuse(&profile_vector, &skills_vector, &portfolio_vector)?;

        let non_zero = [&profile_vector, &skills_vector, &portfolio_vector]
            .iter()
            .filter(|v| !vector::is_zero_vector(v))
            .count();
        let confidence = 0.8f32
            .mul_add(
                enriched.confidence,
                0.2 * non_zero as f32 / FACET_COUNT as f32,
            )
            .clamp(0.0, 1.0);

        let embedding = ArtisanEmbedding {
            artisan_id: profile.id.clone(),
            profile_vector,
            skills_vector,
            portfolio_vector,
            composite_vector,
            confidence,
            content_hash: profile.content_hash(),
            model_version: self.client.model_version(),
            generated_at: Utc::now(),
        };

        embedding.validate(self.client.dimension())?;
        debug!(
            "Fused embedding for artisan {} with confidence {:.2}",
            profile.id, confidence
        );
        Ok(embedding)
    }

    /// Processes, expands and embeds a query; the vector is unit length
    #[inline]
    pub async fn embed_query(&self, text: &str) -> Result<QueryEmbedding> {
        let processed = process_or_literal(text);
        if processed.expanded.is_empty() {
            return Err(MatchError::InvalidInput("query is empty".to_string()));
        }

        let outcome = self.client.embed(&processed.expanded, None).await?;
        let vector = vector::normalize(&outcome.vector);
        let confidence = query_confidence(&processed.cleaned, processed.concepts.len());

        Ok(QueryEmbedding {
            original: processed.original,
            cleaned: processed.cleaned,
            expanded: processed.expanded,
            concepts: processed.concepts,
            vector,
            query_type: processed.query_type,
            confidence,
        })
    }
}

/// Longer, multi-concept queries score higher; result is in [0, 1]
#[inline]
pub fn query_confidence(cleaned: &str, concept_count: usize) -> f32 {
    let words = cleaned.split_whitespace().count().min(QUERY_WORD_CAP) as f32;
    let concepts = concept_count.min(QUERY_CONCEPT_CAP) as f32;
    (0.4 * words / QUERY_WORD_CAP as f32 + 0.6 * concepts / QUERY_CONCEPT_CAP as f32)
        .clamp(0.0, 1.0)
}
