// Vector index boundary
// Storage-agnostic nearest-neighbour contract plus an in-process implementation

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::profile::ExperienceLevel;

pub use memory::InMemoryIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    Dot,
}

impl DistanceMetric {
    /// Similarity score where higher is always better
    #[inline]
    pub fn score(self, a: &[f32], b: &[f32]) -> Result<f32> {
        match self {
            DistanceMetric::Cosine => crate::vector::cosine_similarity(a, b),
            DistanceMetric::Euclidean => {
                crate::vector::euclidean_distance(a, b).map(|d| 1.0 / (1.0 + d))
            }
            DistanceMetric::Dot => crate::vector::dot_product(a, b),
        }
    }

    /// Converts a raw distance reported by a storage engine into a score
    #[inline]
    pub fn score_from_distance(self, distance: f32) -> f32 {
        match self {
            DistanceMetric::Cosine => 1.0 - distance,
            DistanceMetric::Euclidean => 1.0 / (1.0 + distance.max(0.0).sqrt()),
            DistanceMetric::Dot => 1.0 - distance,
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            DistanceMetric::Cosine => write!(f, "cosine"),
            DistanceMetric::Euclidean => write!(f, "euclidean"),
            DistanceMetric::Dot => write!(f, "dot"),
        }
    }
}

/// Metadata stored next to every composite vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ArtisanMetadata {
    pub name: String,
    pub profession: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub rating: Option<f32>,
    pub verified: bool,
    pub content_hash: String,
    pub model_version: String,
}

/// Filters the index can evaluate natively
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IndexFilter {
    pub experience_levels: Vec<ExperienceLevel>,
    pub min_rating: Option<f32>,
    pub verified_only: bool,
    /// When non-empty, only these artisans are scored
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artisan_ids: Vec<String>,
}

impl IndexFilter {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.experience_levels.is_empty()
            && self.min_rating.is_none()
            && !self.verified_only
            && self.artisan_ids.is_empty()
    }

    #[inline]
    pub fn allows_id(&self, id: &str) -> bool {
        self.artisan_ids.is_empty() || self.artisan_ids.iter().any(|allowed| allowed == id)
    }

    #[inline]
    pub fn matches(&self, metadata: &ArtisanMetadata) -> bool {
        if self.verified_only && !metadata.verified {
            return false;
        }

        if let Some(min_rating) = self.min_rating {
            if metadata.rating.is_none_or(|rating| rating < min_rating) {
                return false;
            }
        }

        if !self.experience_levels.is_empty() {
            return metadata
                .experience_level
                .is_some_and(|level| self.experience_levels.contains(&level));
        }

        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub filter: IndexFilter,
    pub include_metadata: bool,
    pub include_values: bool,
}

impl IndexQuery {
    #[inline]
    pub fn new(vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            vector,
            top_k,
            filter: IndexFilter::default(),
            include_metadata: true,
            include_values: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    pub vector: Option<Vec<f32>>,
    pub metadata: Option<ArtisanMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredVector {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: ArtisanMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub name: String,
    pub dimensions: usize,
    pub metric: DistanceMetric,
}

/// Durable nearest-neighbour store for composite vectors
///
/// Query results are ordered by score descending, ties by id ascending.
/// Upserts overwrite any prior vector stored under the same id.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Creates the index; creating an existing index with the same shape is a no-op
    async fn create_index(&self, name: &str, dimensions: usize, metric: DistanceMetric)
    -> Result<()>;

    async fn list_indexes(&self) -> Result<Vec<IndexInfo>>;

    async fn upsert(
        &self,
        index: &str,
        id: &str,
        vector: &[f32],
        metadata: &ArtisanMetadata,
    ) -> Result<()>;

    async fn query(&self, index: &str, query: &IndexQuery) -> Result<Vec<IndexMatch>>;

    async fn fetch(&self, index: &str, id: &str) -> Result<Option<StoredVector>>;

    async fn count(&self, index: &str) -> Result<usize>;

    /// Returns whether a vector was removed
    async fn delete(&self, index: &str, id: &str) -> Result<bool>;

    async fn list_ids(&self, index: &str) -> Result<Vec<String>>;

    /// Compacts storage after bulk writes; indexes without on-disk state skip it
    async fn optimize(&self, _index: &str) -> Result<()> {
        Ok(())
    }
}

/// Orders matches by score descending, then id ascending
#[inline]
pub fn sort_matches(matches: &mut [IndexMatch]) {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
}
