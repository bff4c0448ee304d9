use super::*;
use crate::database::{DistanceMetric, InMemoryIndex, IndexInfo};
use async_trait::async_trait;

const INDEX: &str = "artisans";

fn metadata(
    name: &str,
    verified: bool,
    rating: Option<f32>,
    level: Option<ExperienceLevel>,
) -> ArtisanMetadata {
    ArtisanMetadata {
        name: name.to_string(),
        verified,
        rating,
        experience_level: level,
        ..ArtisanMetadata::default()
    }
}

async fn seeded_index() -> Arc<InMemoryIndex> {
    let index = Arc::new(InMemoryIndex::new());
    index
        .create_index(INDEX, 3, DistanceMetric::Cosine)
        .await
        .expect("should create index");

    let rows = [
        ("a", [1.0, 0.0, 0.0], metadata("Ada", false, Some(4.0), Some(ExperienceLevel::Expert))),
        ("b", [0.9, 0.1, 0.0], metadata("Bo", true, Some(4.8), Some(ExperienceLevel::Master))),
        ("c", [0.7, 0.7, 0.0], metadata("Cy", false, None, Some(ExperienceLevel::Beginner))),
        ("d", [0.0, 1.0, 0.0], metadata("Di", false, Some(3.0), None)),
        ("e", [0.0, 0.0, 1.0], metadata("Ed", true, Some(4.1), None)),
        ("f", [-1.0, 0.0, 0.0], metadata("Fi", false, None, None)),
    ];
    for (id, values, meta) in rows {
        index
            .upsert(INDEX, id, &values, &meta)
            .await
            .expect("should upsert");
    }
    index
}

fn engine_with(index: Arc<dyn VectorIndex>, config: SearchConfig) -> SimilaritySearchEngine {
    SimilaritySearchEngine::new(
        index,
        INDEX,
        config,
        &CacheConfig::default(),
        FusionConfig::default(),
    )
}

async fn engine() -> SimilaritySearchEngine {
    engine_with(seeded_index().await, SearchConfig::default())
}

fn ids(response: &SearchResponse) -> Vec<&str> {
    response.results.iter().map(|r| r.artisan_id.as_str()).collect()
}

fn ranks(response: &SearchResponse) -> Vec<usize> {
    response.results.iter().map(|r| r.rank).collect()
}

const QUERY: [f32; 3] = [1.0, 0.0, 0.0];

#[tokio::test]
async fn results_are_ordered_and_densely_ranked() {
    let response = engine()
        .await
        .search(&QUERY, 3, None, &SearchFilters::default(), &SearchOptions::default())
        .await
        .expect("should search");

    assert_eq!(ids(&response), vec!["a", "b", "c"]);
    assert_eq!(ranks(&response), vec![1, 2, 3]);
    assert!((response.results[0].similarity - 1.0).abs() < 1e-6);
    assert!(response.results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    assert_eq!(response.results[1].metadata.as_ref().map(|m| m.name.as_str()), Some("Bo"));
    assert!(response.results[0].vector.is_none());
    assert!(!response.metrics.cache_hit);
    assert_eq!(response.metrics.returned, 3);
}

#[tokio::test]
async fn top_k_is_capped_by_configuration() {
    let config = SearchConfig {
        max_top_k: 2,
        ..SearchConfig::default()
    };
    let response = engine_with(seeded_index().await, config)
        .search(&QUERY, 50, None, &SearchFilters::default(), &SearchOptions::default())
        .await
        .expect("should search");

    assert_eq!(response.results.len(), 2);
}

#[tokio::test]
async fn zero_top_k_returns_nothing() {
    let response = engine()
        .await
        .search(&QUERY, 0, None, &SearchFilters::default(), &SearchOptions::default())
        .await
        .expect("should search");
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn invalid_query_vectors_are_rejected() {
    let engine = engine().await;
    for bad in [vec![], vec![f32::NAN, 0.0, 0.0]] {
        let err = engine
            .search(&bad, 3, None, &SearchFilters::default(), &SearchOptions::default())
            .await
            .expect_err("should reject");
        assert!(matches!(err, MatchError::InvalidInput(_)));
    }
}

#[tokio::test]
async fn excluded_ids_never_appear_and_do_not_shrink_the_page() {
    let filters = SearchFilters {
        artisan_ids: vec!["!a".to_string(), "!b".to_string()],
        ..SearchFilters::default()
    };
    let response = engine()
        .await
        .search(&QUERY, 2, None, &filters, &SearchOptions::default())
        .await
        .expect("should search");

    assert_eq!(ids(&response), vec!["c", "d"]);
    assert_eq!(ranks(&response), vec![1, 2]);
    assert_eq!(response.metrics.filtered_out, 2);
}

#[tokio::test]
async fn included_ids_restrict_results() {
    let filters = SearchFilters {
        artisan_ids: vec!["d".to_string(), "c".to_string()],
        ..SearchFilters::default()
    };
    let response = engine()
        .await
        .search(&QUERY, 5, None, &filters, &SearchOptions::default())
        .await
        .expect("should search");

    assert_eq!(ids(&response), vec!["c", "d"]);
}

#[tokio::test]
async fn included_ids_outside_the_global_top_k_are_still_found() {
    let filters = SearchFilters {
        artisan_ids: vec!["e".to_string()],
        ..SearchFilters::default()
    };
    let response = engine()
        .await
        .search(&QUERY, 1, None, &filters, &SearchOptions::default())
        .await
        .expect("should search");

    assert_eq!(ids(&response), vec!["e"]);
    assert_eq!(ranks(&response), vec![1]);
}

#[tokio::test]
async fn threshold_and_index_filters_apply() {
    let engine = engine().await;

    let above = engine
        .search(&QUERY, 10, Some(0.5), &SearchFilters::default(), &SearchOptions::default())
        .await
        .expect("should search");
    assert_eq!(ids(&above), vec!["a", "b", "c"]);

    let verified = SearchFilters {
        verified_only: true,
        ..SearchFilters::default()
    };
    let response = engine
        .search(&QUERY, 10, None, &verified, &SearchOptions::default())
        .await
        .expect("should search");
    assert_eq!(ids(&response), vec!["b", "e"]);

    let seasoned = SearchFilters {
        experience_levels: vec![ExperienceLevel::Expert, ExperienceLevel::Master],
        min_rating: Some(4.5),
        ..SearchFilters::default()
    };
    let response = engine
        .search(&QUERY, 10, None, &seasoned, &SearchOptions::default())
        .await
        .expect("should search");
    assert_eq!(ids(&response), vec!["b"]);
}

async fn hybrid_index() -> Arc<InMemoryIndex> {
    let index = Arc::new(InMemoryIndex::new());
    index
        .create_index(INDEX, 2, DistanceMetric::Cosine)
        .await
        .expect("should create index");

    let rows = [
        ("x", [0.9, 0.435_89], metadata("Plain", false, Some(4.0), None)),
        ("y", [0.85, 0.526_78], metadata("Trusted", true, Some(4.9), None)),
        ("z", [1.0, 0.0], metadata("Exact", true, Some(5.0), None)),
    ];
    for (id, values, meta) in rows {
        index
            .upsert(INDEX, id, &values, &meta)
            .await
            .expect("should upsert");
    }
    index
}

#[tokio::test]
async fn hybrid_boosts_reorder_and_clamp() {
    let engine = engine_with(hybrid_index().await, SearchConfig::default());
    let query = [1.0, 0.0];

    let plain = engine
        .search(&query, 3, None, &SearchFilters::default(), &SearchOptions::default())
        .await
        .expect("should search");
    assert_eq!(ids(&plain), vec!["z", "x", "y"]);
    assert!(!plain.metrics.hybrid);

    let options = SearchOptions {
        hybrid: Some(true),
        ..SearchOptions::default()
    };
    let boosted = engine
        .search(&query, 3, None, &SearchFilters::default(), &options)
        .await
        .expect("should search");

    assert_eq!(ids(&boosted), vec!["z", "y", "x"]);
    assert_eq!(ranks(&boosted), vec![1, 2, 3]);
    assert!(boosted.metrics.hybrid);
    // 1.0 * 1.1 * 1.05 is clamped
    assert_eq!(boosted.results[0].similarity, 1.0);
    // 0.85 * 1.1 * 1.05
    assert!((boosted.results[1].similarity - 0.981_75).abs() < 1e-3);
    assert!((boosted.results[2].similarity - 0.9).abs() < 1e-3);
}

#[tokio::test]
async fn threshold_uses_raw_similarity_under_hybrid() {
    let engine = engine_with(hybrid_index().await, SearchConfig::default());
    let options = SearchOptions {
        hybrid: Some(true),
        ..SearchOptions::default()
    };

    let response = engine
        .search(&[1.0, 0.0], 3, Some(0.88), &SearchFilters::default(), &options)
        .await
        .expect("should search");
    assert_eq!(ids(&response), vec!["z", "x"]);
}

#[tokio::test]
async fn repeated_searches_hit_the_cache() {
    let engine = engine().await;
    let filters = SearchFilters::default();
    let options = SearchOptions::default();

    let first = engine
        .search(&QUERY, 3, None, &filters, &options)
        .await
        .expect("should search");
    let second = engine
        .search(&QUERY, 3, None, &filters, &options)
        .await
        .expect("should search");

    assert!(!first.metrics.cache_hit);
    assert!(second.metrics.cache_hit);
    assert_eq!(first.results, second.results);
    assert_eq!(engine.cache_stats().hits, 1);

    let different = engine
        .search(&QUERY, 2, None, &filters, &options)
        .await
        .expect("should search");
    assert!(!different.metrics.cache_hit);

    engine.clear_cache();
    let cleared = engine
        .search(&QUERY, 3, None, &filters, &options)
        .await
        .expect("should search");
    assert!(!cleared.metrics.cache_hit);
}

#[tokio::test]
async fn explanations_and_payload_options() {
    let options = SearchOptions {
        include_metadata: false,
        include_vectors: true,
        explain: true,
        hybrid: None,
    };
    let response = engine()
        .await
        .search(&QUERY, 2, None, &SearchFilters::default(), &options)
        .await
        .expect("should search");

    let top = &response.results[0];
    assert!(top.metadata.is_none());
    assert_eq!(top.vector.as_deref(), Some(&[1.0, 0.0, 0.0][..]));

    let explanation = top.explanation.as_ref().expect("should explain");
    assert_eq!(explanation.reasons[0], "Excellent match for your search");
    assert!(explanation.reasons.contains(&"Expert level experience".to_string()));
    assert_eq!(explanation.level, ConfidenceLevel::High);

    let second = response.results[1].explanation.as_ref().expect("should explain");
    assert!(second.reasons.contains(&"Verified artisan".to_string()));
    assert!(second.reasons.contains(&"Highly rated (4.8 stars)".to_string()));
}

#[tokio::test]
async fn find_similar_excludes_the_target() {
    let engine = engine().await;
    let response = engine
        .find_similar("a", 2, &SearchFilters::default(), &SearchOptions::default())
        .await
        .expect("should find");

    assert_eq!(ids(&response), vec!["b", "c"]);
    assert_eq!(ranks(&response), vec![1, 2]);
    assert_eq!(response.metrics.returned, 2);

    let err = engine
        .find_similar("missing", 2, &SearchFilters::default(), &SearchOptions::default())
        .await
        .expect_err("should fail");
    assert!(matches!(err, MatchError::VectorNotFound { artisan_id } if artisan_id == "missing"));
}

#[tokio::test]
async fn find_similar_fills_a_page_at_the_top_k_cap() {
    let config = SearchConfig {
        max_top_k: 3,
        ..SearchConfig::default()
    };
    let engine = engine_with(seeded_index().await, config);

    let response = engine
        .find_similar("a", 3, &SearchFilters::default(), &SearchOptions::default())
        .await
        .expect("should find");

    assert_eq!(ids(&response), vec!["b", "c", "d"]);
    assert_eq!(ranks(&response), vec![1, 2, 3]);

    let over = engine
        .find_similar("a", 10, &SearchFilters::default(), &SearchOptions::default())
        .await
        .expect("should find");
    assert_eq!(over.results.len(), 3);
}

#[tokio::test]
async fn recommendations_exclude_history() {
    let engine = engine().await;
    let history = vec![
        Interaction::new("a", InteractionKind::View),
        Interaction::new("b", InteractionKind::Like),
        Interaction::new("a", InteractionKind::View),
    ];

    let response = engine
        .recommend(&history, 3, &SearchFilters::default(), &SearchOptions::default())
        .await
        .expect("should recommend");

    let found = ids(&response);
    assert_eq!(found[0], "c");
    assert!(!found.contains(&"a"));
    assert!(!found.contains(&"b"));
    assert_eq!(ranks(&response), vec![1, 2, 3]);
}

#[tokio::test]
async fn recommendation_edge_cases() {
    let engine = engine().await;
    let filters = SearchFilters::default();
    let options = SearchOptions::default();

    let empty = engine
        .recommend(&[], 5, &filters, &options)
        .await
        .expect("should succeed");
    assert!(empty.results.is_empty());

    let missing = engine
        .recommend(&[Interaction::new("ghost", InteractionKind::Save)], 5, &filters, &options)
        .await
        .expect_err("should fail");
    assert!(matches!(missing, MatchError::VectorNotFound { .. }));

    let weightless = Interaction {
        weight: 0.0,
        ..Interaction::new("a", InteractionKind::View)
    };
    let err = engine
        .recommend(&[weightless], 5, &filters, &options)
        .await
        .expect_err("should fail");
    assert!(matches!(err, MatchError::InvalidInput(_)));
}

#[test]
fn filters_split_exclusions_from_restrictions() {
    let mut filters = SearchFilters {
        artisan_ids: vec!["a".to_string(), "!b".to_string()],
        ..SearchFilters::default()
    };
    filters.exclude("c");

    assert_eq!(filters.excluded_ids(), vec!["b", "c"]);
    assert_eq!(filters.included_ids(), vec!["a"]);
    assert_eq!(filters.index_filter().artisan_ids, vec!["a"]);
    assert!(SearchFilters::default().index_filter().is_empty());
}

struct SlowIndex(InMemoryIndex);

#[async_trait]
impl VectorIndex for SlowIndex {
    async fn create_index(
        &self,
        name: &str,
        dimensions: usize,
        metric: DistanceMetric,
    ) -> Result<()> {
        self.0.create_index(name, dimensions, metric).await
    }

    async fn list_indexes(&self) -> Result<Vec<IndexInfo>> {
        self.0.list_indexes().await
    }

    async fn upsert(
        &self,
        index: &str,
        id: &str,
        vector: &[f32],
        metadata: &ArtisanMetadata,
    ) -> Result<()> {
        self.0.upsert(index, id, vector, metadata).await
    }

    async fn query(&self, index: &str, query: &IndexQuery) -> Result<Vec<IndexMatch>> {
        tokio::time::sleep(Duration::from_secs(3)).await;
        self.0.query(index, query).await
    }

    async fn fetch(&self, index: &str, id: &str) -> Result<Option<StoredVector>> {
        self.0.fetch(index, id).await
    }

    async fn count(&self, index: &str) -> Result<usize> {
        self.0.count(index).await
    }

    async fn delete(&self, index: &str, id: &str) -> Result<bool> {
        self.0.delete(index, id).await
    }

    async fn list_ids(&self, index: &str) -> Result<Vec<String>> {
        self.0.list_ids(index).await
    }
}

#[tokio::test]
async fn slow_index_queries_time_out() {
    let inner = InMemoryIndex::new();
    inner
        .create_index(INDEX, 3, DistanceMetric::Cosine)
        .await
        .expect("should create index");
    let config = SearchConfig {
        query_timeout_secs: 1,
        ..SearchConfig::default()
    };
    let engine = engine_with(Arc::new(SlowIndex(inner)), config);

    let err = engine
        .search(&QUERY, 3, None, &SearchFilters::default(), &SearchOptions::default())
        .await
        .expect_err("should time out");
    assert!(matches!(err, MatchError::Timeout { .. }));
}

#[tokio::test]
async fn index_failures_propagate() {
    // No index has been created
    let engine = engine_with(Arc::new(InMemoryIndex::new()), SearchConfig::default());
    let err = engine
        .search(&QUERY, 3, None, &SearchFilters::default(), &SearchOptions::default())
        .await
        .expect_err("should fail");
    assert!(matches!(err, MatchError::Index(_)));
}
