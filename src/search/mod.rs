// Search module
// Nearest-neighbour search over composite vectors with caching and re-ranking

pub mod explain;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{CacheStats, LruCache};
use crate::config::{CacheConfig, FusionConfig, SearchConfig};
use crate::database::index::sort_matches;
use crate::database::{
    ArtisanMetadata, IndexFilter, IndexMatch, IndexQuery, StoredVector, VectorIndex,
};
use crate::profile::ExperienceLevel;
use crate::vector::{self, WeightedVector};
use crate::{MatchError, Result};

pub use explain::{ConfidenceLevel, FacetBreakdown, MatchExplanation, explain_match};

const CACHE_KEY_PRECISION: u32 = 4;
const EXCLUDE_PREFIX: char = '!';

/// Caller-facing filters
///
/// `artisan_ids` entries starting with `!` exclude that id; the remaining
/// entries, when present, restrict results to exactly those ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SearchFilters {
    pub experience_levels: Vec<ExperienceLevel>,
    pub min_rating: Option<f32>,
    pub verified_only: bool,
    pub artisan_ids: Vec<String>,
}

impl SearchFilters {
    #[inline]
    pub fn index_filter(&self) -> IndexFilter {
        IndexFilter {
            experience_levels: self.experience_levels.clone(),
            min_rating: self.min_rating,
            verified_only: self.verified_only,
            artisan_ids: self.included_ids().into_iter().map(str::to_string).collect(),
        }
    }

    #[inline]
    pub fn excluded_ids(&self) -> Vec<&str> {
        self.artisan_ids
            .iter()
            .filter_map(|id| id.strip_prefix(EXCLUDE_PREFIX))
            .collect()
    }

    #[inline]
    pub fn included_ids(&self) -> Vec<&str> {
        self.artisan_ids
            .iter()
            .filter(|id| !id.starts_with(EXCLUDE_PREFIX))
            .map(String::as_str)
            .collect()
    }

    #[inline]
    pub fn exclude(&mut self, artisan_id: &str) {
        self.artisan_ids.push(format!("{EXCLUDE_PREFIX}{artisan_id}"));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub include_metadata: bool,
    pub include_vectors: bool,
    pub explain: bool,
    /// Overrides `search.hybrid` from the configuration when set
    pub hybrid: Option<bool>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_metadata: true,
            include_vectors: false,
            explain: false,
            hybrid: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilaritySearchResult {
    pub artisan_id: String,
    pub similarity: f32,
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ArtisanMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<MatchExplanation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SearchMetrics {
    /// Matches returned by the index before post-filtering
    pub candidates: usize,
    pub filtered_out: usize,
    pub returned: usize,
    pub cache_hit: bool,
    pub hybrid: bool,
    #[serde(with = "millis")]
    pub latency: Duration,
}

mod millis {
    use std::time::Duration;

    use serde::Serializer;

    #[inline]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u128(value.as_millis())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SearchResponse {
    pub results: Vec<SimilaritySearchResult>,
    pub metrics: SearchMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Like,
    Save,
    Contact,
    Purchase,
}

impl InteractionKind {
    /// Weight used when an interaction carries none of its own
    #[inline]
    pub fn default_weight(self) -> f32 {
        match self {
            InteractionKind::View => 1.0,
            InteractionKind::Like => 2.0,
            InteractionKind::Save => 3.0,
            InteractionKind::Contact => 4.0,
            InteractionKind::Purchase => 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub artisan_id: String,
    pub kind: InteractionKind,
    pub weight: f32,
}

impl Interaction {
    #[inline]
    pub fn new(artisan_id: impl Into<String>, kind: InteractionKind) -> Self {
        Self {
            artisan_id: artisan_id.into(),
            kind,
            weight: kind.default_weight(),
        }
    }
}

#[derive(Serialize)]
struct CacheKey<'a> {
    vector: String,
    top_k: usize,
    threshold: u32,
    filters: &'a SearchFilters,
    include_metadata: bool,
    include_vectors: bool,
    explain: bool,
    hybrid: bool,
}

/// Runs similarity queries against one named index
pub struct SimilaritySearchEngine {
    index: Arc<dyn VectorIndex>,
    index_name: String,
    config: SearchConfig,
    weights: FusionConfig,
    cache: LruCache<String, Arc<Vec<SimilaritySearchResult>>>,
}

impl SimilaritySearchEngine {
    #[inline]
    pub fn new(
        index: Arc<dyn VectorIndex>,
        index_name: impl Into<String>,
        config: SearchConfig,
        cache: &CacheConfig,
        weights: FusionConfig,
    ) -> Self {
        Self {
            index,
            index_name: index_name.into(),
            config,
            weights,
            cache: LruCache::with_ttl(
                cache.search_max_entries,
                Duration::from_secs(cache.search_ttl_secs),
            ),
        }
    }

    #[inline]
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    #[inline]
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[inline]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drops cached result pages, e.g. after the index changed
    #[inline]
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Top matches for `query_vector`, best first, ranked 1..N
    ///
    /// `threshold` falls back to `search.default_threshold` and filters on
    /// raw similarity before any hybrid boost.
    #[inline]
    pub async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        threshold: Option<f32>,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResponse> {
        let top_k = top_k.min(self.config.max_top_k);
        self.search_page(query_vector, top_k, 0, threshold, filters, options)
            .await
    }

    /// Runs a search for `top_k` results plus `spare` slots the caller
    /// drops afterwards; `top_k` is already capped
    async fn search_page(
        &self,
        query_vector: &[f32],
        top_k: usize,
        spare: usize,
        threshold: Option<f32>,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResponse> {
        let started = Instant::now();

        if !vector::is_valid_vector(query_vector) {
            return Err(MatchError::InvalidInput(
                "query vector must be non-empty and finite".to_string(),
            ));
        }

        let threshold = threshold.unwrap_or(self.config.default_threshold);
        let hybrid = options.hybrid.unwrap_or(self.config.hybrid);

        if top_k == 0 {
            return Ok(SearchResponse {
                results: Vec::new(),
                metrics: SearchMetrics {
                    hybrid,
                    latency: started.elapsed(),
                    ..SearchMetrics::default()
                },
            });
        }

        let limit = top_k + spare;
        let key = cache_key(query_vector, limit, threshold, filters, options, hybrid)?;
        if let Some(cached) = self.cache.get(&key) {
            debug!("Search cache hit for {} results", cached.len());
            return Ok(SearchResponse {
                results: Vec::clone(&cached),
                metrics: SearchMetrics {
                    returned: cached.len(),
                    cache_hit: true,
                    hybrid,
                    latency: started.elapsed(),
                    ..SearchMetrics::default()
                },
            });
        }

        let excluded = filters.excluded_ids();
        let included = filters.included_ids();

        let mut query = IndexQuery::new(query_vector.to_vec(), limit + excluded.len());
        query.filter = filters.index_filter();
        // Boosts and explanations read metadata even when the caller drops it
        query.include_metadata = options.include_metadata || options.explain || hybrid;
        query.include_values = options.include_vectors;

        let matches = self.query_index(&query).await?;
        let candidates = matches.len();

        let mut kept: Vec<IndexMatch> = matches
            .into_iter()
            .filter(|m| !excluded.contains(&m.id.as_str()))
            .filter(|m| included.is_empty() || included.contains(&m.id.as_str()))
            .filter(|m| m.score >= threshold)
            .collect();
        let filtered_out = candidates - kept.len();

        if hybrid {
            for candidate in &mut kept {
                candidate.score = self.boosted(candidate.score, candidate.metadata.as_ref());
            }
            sort_matches(&mut kept);
        }
        kept.truncate(limit);

        let results: Vec<SimilaritySearchResult> = kept
            .into_iter()
            .enumerate()
            .map(|(position, candidate)| self.to_result(candidate, position + 1, options))
            .collect();

        let results = Arc::new(results);
        self.cache.insert(key, Arc::clone(&results));

        let metrics = SearchMetrics {
            candidates,
            filtered_out,
            returned: results.len(),
            cache_hit: false,
            hybrid,
            latency: started.elapsed(),
        };
        debug!(
            "Search over {} returned {} of {} candidates in {:?}",
            self.index_name, metrics.returned, candidates, metrics.latency
        );

        Ok(SearchResponse {
            results: Vec::clone(&results),
            metrics,
        })
    }

    /// Artisans nearest to an already-indexed artisan, excluding itself
    #[inline]
    pub async fn find_similar(
        &self,
        artisan_id: &str,
        top_k: usize,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResponse> {
        let target = self.fetch_required(artisan_id).await?;

        let top_k = top_k.min(self.config.max_top_k);
        let mut response = self
            .search_page(&target.vector, top_k, 1, None, filters, options)
            .await?;

        let before = response.results.len();
        response.results.retain(|r| r.artisan_id != artisan_id);
        response.results.truncate(top_k);
        rerank(&mut response.results);

        response.metrics.filtered_out += before - response.results.len();
        response.metrics.returned = response.results.len();
        Ok(response)
    }

    /// Recommendations from an interaction history
    ///
    /// The preference vector is the weight-normalized average of the stored
    /// vectors of every artisan in the history; those artisans are never
    /// recommended back.
    #[inline]
    pub async fn recommend(
        &self,
        interactions: &[Interaction],
        top_k: usize,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResponse> {
        if interactions.is_empty() {
            return Ok(SearchResponse::default());
        }

        // Repeat interactions with one artisan accumulate their weights
        let mut order: Vec<&str> = Vec::new();
        let mut weights: HashMap<&str, f32> = HashMap::new();
        for interaction in interactions {
            let id = interaction.artisan_id.as_str();
            if !weights.contains_key(id) {
                order.push(id);
            }
            *weights.entry(id).or_insert(0.0) += interaction.weight;
        }

        let mut weighted = Vec::with_capacity(order.len());
        for id in &order {
            let stored = self.fetch_required(id).await?;
            let weight = weights.get(id).copied().unwrap_or_default();
            weighted.push(WeightedVector::new(stored.vector, weight));
        }

        if weighted.iter().all(|w| w.weight == 0.0) {
            return Err(MatchError::InvalidInput(
                "interaction weights must not all be zero".to_string(),
            ));
        }

        let preference = vector::normalize(&vector::weighted_average(&weighted)?);

        let mut filters = filters.clone();
        for id in &order {
            filters.exclude(id);
        }

        let response = self.search(&preference, top_k, None, &filters, options).await?;
        info!(
            "Built {} recommendations from {} interactions with {} artisans",
            response.results.len(),
            interactions.len(),
            order.len()
        );
        Ok(response)
    }

    fn boosted(&self, score: f32, metadata: Option<&ArtisanMetadata>) -> f32 {
        let Some(metadata) = metadata else {
            return score;
        };

        let mut boosted = score;
        if metadata.verified {
            boosted *= self.config.verified_boost;
        }
        if metadata
            .rating
            .is_some_and(|rating| rating >= self.config.rating_boost_threshold)
        {
            boosted *= self.config.rating_boost;
        }
        boosted.min(1.0)
    }

    fn to_result(
        &self,
        candidate: IndexMatch,
        rank: usize,
        options: &SearchOptions,
    ) -> SimilaritySearchResult {
        let explanation = options.explain.then(|| {
            explain_match(
                candidate.score,
                candidate.metadata.as_ref(),
                &self.weights,
                self.config.rating_boost_threshold,
            )
        });

        SimilaritySearchResult {
            artisan_id: candidate.id,
            similarity: candidate.score,
            rank,
            vector: candidate.vector.filter(|_| options.include_vectors),
            metadata: candidate.metadata.filter(|_| options.include_metadata),
            explanation,
        }
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<Vec<IndexMatch>> {
        let limit = Duration::from_secs(self.config.query_timeout_secs);
        tokio::time::timeout(limit, self.index.query(&self.index_name, query))
            .await
            .map_err(|_| MatchError::Timeout {
                operation: format!("query index {}", self.index_name),
                elapsed: limit,
            })?
    }

    async fn fetch_required(&self, artisan_id: &str) -> Result<StoredVector> {
        let limit = Duration::from_secs(self.config.query_timeout_secs);
        tokio::time::timeout(limit, self.index.fetch(&self.index_name, artisan_id))
            .await
            .map_err(|_| MatchError::Timeout {
                operation: format!("fetch {artisan_id} from {}", self.index_name),
                elapsed: limit,
            })??
            .ok_or_else(|| MatchError::VectorNotFound {
                artisan_id: artisan_id.to_string(),
            })
    }
}

fn rerank(results: &mut [SimilaritySearchResult]) {
    for (position, result) in results.iter_mut().enumerate() {
        result.rank = position + 1;
    }
}

fn cache_key(
    query_vector: &[f32],
    top_k: usize,
    threshold: f32,
    filters: &SearchFilters,
    options: &SearchOptions,
    hybrid: bool,
) -> Result<String> {
    let key = CacheKey {
        vector: vector::hash_vector(query_vector, CACHE_KEY_PRECISION),
        top_k,
        threshold: threshold.to_bits(),
        filters,
        include_metadata: options.include_metadata,
        include_vectors: options.include_vectors,
        explain: options.explain,
        hybrid,
    };
    let encoded = serde_json::to_vec(&key)
        .map_err(|e| MatchError::Other(anyhow::anyhow!("encode search cache key: {e}")))?;
    Ok(blake3::hash(&encoded).to_hex().to_string())
}
