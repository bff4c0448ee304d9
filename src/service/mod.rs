// Service module
// The operations exposed to callers, wired from configuration


use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::{Config, IndexBackend};
use crate::database::{ArtisanMetadata, InMemoryIndex, LanceIndex, VectorIndex};
use crate::embeddings::{EmbeddingClient, build_provider};
use crate::enrichment::{EnrichedProfile, EnrichmentPipeline};
use crate::fusion::{ArtisanEmbedding, EmbeddingFusion, QueryEmbedding};
use crate::profile::ArtisanProfile;
use crate::query::{ProcessedQuery, process_query};
use crate::search::{
    Interaction, SearchFilters, SearchOptions, SearchResponse, SimilaritySearchEngine,
};
use crate::{MatchError, Result};

/// A text search together with how its query was interpreted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSearchResponse {
    pub query: QueryEmbedding,
    #[serde(flatten)]
    pub response: SearchResponse,
}

pub struct MatchService {
    fusion: EmbeddingFusion,
    engine: SimilaritySearchEngine,
    default_top_k: usize,
}

impl MatchService {
    #[inline]
    pub fn new(fusion: EmbeddingFusion, engine: SimilaritySearchEngine) -> Self {
        let default_top_k = engine.config().default_top_k;
        Self {
            fusion,
            engine,
            default_top_k,
        }
    }

    /// Builds the provider, opens the configured index backend and makes
    /// sure the index exists with the provider's dimension
    #[inline]
    pub async fn from_config(config: &Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| MatchError::Config(e.to_string()))?;

        let index: Arc<dyn VectorIndex> = match config.index.backend {
            IndexBackend::LanceDb => Arc::new(
                LanceIndex::open(config.vector_database_path(), config.index.metric).await?,
            ),
            IndexBackend::Memory => Arc::new(InMemoryIndex::new()),
        };

        Self::with_index(config, index).await
    }

    /// Like [`MatchService::from_config`] with a caller-supplied index
    #[inline]
    pub async fn with_index(config: &Config, index: Arc<dyn VectorIndex>) -> Result<Self> {
        let provider = build_provider(&config.provider).await?;
        let client = EmbeddingClient::new(
            provider,
            &config.provider,
            config.cache.embedding_max_entries,
        );

        index
            .create_index(&config.index.name, client.dimension(), config.index.metric)
            .await?;
        info!(
            "Match service ready on index {} with {}",
            config.index.name,
            client.model_version()
        );

        let fusion = EmbeddingFusion::new(
            Arc::new(client),
            EnrichmentPipeline::new(),
            config.fusion.clone(),
        );
        let engine = SimilaritySearchEngine::new(
            index,
            config.index.name.clone(),
            config.search.clone(),
            &config.cache,
            config.fusion.clone(),
        );

        Ok(Self::new(fusion, engine))
    }

    #[inline]
    pub fn fusion(&self) -> &EmbeddingFusion {
        &self.fusion
    }

    #[inline]
    pub fn engine(&self) -> &SimilaritySearchEngine {
        &self.engine
    }

    #[inline]
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        self.engine.index()
    }

    #[inline]
    pub fn index_name(&self) -> &str {
        self.engine.index_name()
    }

    #[inline]
    pub async fn enrich_profile(&self, profile: &ArtisanProfile) -> EnrichedProfile {
        self.fusion.pipeline().enrich(profile).await
    }

    #[inline]
    pub async fn generate_artisan_embedding(
        &self,
        profile: &ArtisanProfile,
    ) -> Result<ArtisanEmbedding> {
        self.fusion.generate_artisan_embedding(profile).await
    }

    #[inline]
    pub async fn generate_batch_artisan_embeddings(
        &self,
        profiles: &[ArtisanProfile],
    ) -> Result<Vec<ArtisanEmbedding>> {
        self.fusion.generate_batch_artisan_embeddings(profiles).await
    }

    #[inline]
    pub fn process_query(&self, text: &str) -> ProcessedQuery {
        process_query(text)
    }

    /// Writes a composite vector and its metadata, replacing any prior one
    #[inline]
    pub async fn store_embedding(
        &self,
        profile: &ArtisanProfile,
        embedding: &ArtisanEmbedding,
    ) -> Result<()> {
        let metadata = ArtisanMetadata {
            name: profile.name.clone(),
            profession: profile.profession.clone(),
            experience_level: profile.experience_level,
            rating: profile.rating,
            verified: profile.verified,
            content_hash: embedding.content_hash.clone(),
            model_version: embedding.model_version.clone(),
        };

        self.index()
            .upsert(
                self.index_name(),
                &embedding.artisan_id,
                &embedding.composite_vector,
                &metadata,
            )
            .await?;
        // Cached pages may no longer reflect the index
        self.engine.clear_cache();
        Ok(())
    }

    #[inline]
    pub async fn search(
        &self,
        vector: &[f32],
        top_k: Option<usize>,
        threshold: Option<f32>,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResponse> {
        self.engine
            .search(vector, self.top_k(top_k), threshold, filters, options)
            .await
    }

    /// Processes and embeds the query text, then searches with its vector
    #[inline]
    pub async fn search_text(
        &self,
        text: &str,
        top_k: Option<usize>,
        threshold: Option<f32>,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<TextSearchResponse> {
        let query = self.fusion.embed_query(text).await?;
        let response = self
            .engine
            .search(&query.vector, self.top_k(top_k), threshold, filters, options)
            .await?;

        info!(
            "Query {:?} ({}) matched {} artisans",
            query.cleaned,
            query.query_type,
            response.results.len()
        );
        Ok(TextSearchResponse { query, response })
    }

    #[inline]
    pub async fn find_similar_artisans(
        &self,
        artisan_id: &str,
        top_k: Option<usize>,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResponse> {
        self.engine
            .find_similar(artisan_id, self.top_k(top_k), filters, options)
            .await
    }

    #[inline]
    pub async fn get_recommendations(
        &self,
        interactions: &[Interaction],
        top_k: Option<usize>,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<SearchResponse> {
        self.engine
            .recommend(interactions, self.top_k(top_k), filters, options)
            .await
    }

    fn top_k(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_top_k)
    }
}
