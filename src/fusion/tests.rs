use super::*;
use crate::config::ProviderConfig;
use crate::embeddings::HashEmbedder;
use crate::profile::{ExperienceLevel, PriceRange};

const DIMENSION: usize = 64;

fn fusion() -> EmbeddingFusion {
    let config = ProviderConfig {
        embedding_dimension: DIMENSION as u32,
        inter_batch_delay_ms: 0,
        ..ProviderConfig::default()
    };
    let client = EmbeddingClient::new(Arc::new(HashEmbedder::new(DIMENSION)), &config, 256);
    EmbeddingFusion::new(
        Arc::new(client),
        EnrichmentPipeline::new(),
        FusionConfig::default(),
    )
}

fn weaver() -> ArtisanProfile {
    ArtisanProfile {
        profession: Some("Weaver".to_string()),
        description: Some("Hand woven wool rugs in traditional patterns".to_string()),
        skills: vec!["Loom Weaving".to_string()],
        materials: vec!["Wool".to_string()],
        techniques: vec!["Natural dyeing".to_string()],
        portfolio_keywords: vec!["Rugs".to_string(), "Wall hangings".to_string()],
        price_range: Some(PriceRange {
            min: 120.0,
            max: 900.0,
            currency: "USD".to_string(),
        }),
        turnaround_days: Some(21),
        experience_level: Some(ExperienceLevel::Expert),
        ..ArtisanProfile::new("w-1", "Ana Torres")
    }
}

fn sample_embedding() -> ArtisanEmbedding {
    ArtisanEmbedding {
        artisan_id: "x".to_string(),
        profile_vector: vec![1.0, 0.0],
        skills_vector: vec![0.0, 1.0],
        portfolio_vector: vec![0.0, 0.0],
        composite_vector: vec![0.7071, 0.7071],
        confidence: 0.5,
        content_hash: "h".to_string(),
        model_version: "m".to_string(),
        generated_at: Utc::now(),
    }
}

#[tokio::test]
async fn facet_texts_are_lower_cased_and_split_by_concern() {
    let profile = weaver();
    let enriched = EnrichmentPipeline::new().enrich(&profile).await;
    let facets = FacetTexts::from_profile(&profile, &enriched);

    assert!(facets.profile.starts_with("ana torres weaver"));
    assert!(facets.skills.contains("loom weaving"));
    assert!(facets.skills.contains("expert craftsperson"));
    // Declared and detected "natural dyeing" appear once
    assert_eq!(facets.skills.matches("natural dyeing").count(), 1);
    assert!(facets.portfolio.contains("priced 120 to 900 usd"));
    assert!(facets.portfolio.contains("ready in 21 days"));
    for text in [&facets.profile, &facets.skills, &facets.portfolio] {
        assert_eq!(*text, text.to_lowercase());
    }
}

#[test]
fn fuse_weights_and_normalizes() {
    let fusion = fusion();
    let composite = fusion
        .fuse(&[1.0, 0.0], &[0.0, 1.0], &[0.0, 0.0])
        .expect("should fuse");

    // Equal profile and skills weights point the result at 45 degrees
    assert!((composite[0] - composite[1]).abs() < 1e-6);
    assert!((vector::magnitude(&composite) - 1.0).abs() < 1e-6);
}

#[test]
fn fuse_rejects_mismatched_facets() {
    let err = fusion()
        .fuse(&[1.0, 0.0], &[1.0, 0.0, 0.0], &[1.0, 0.0])
        .expect_err("should reject");
    assert!(matches!(err, MatchError::DimensionMismatch { .. }));
}

#[tokio::test]
async fn artisan_embedding_is_valid_and_tagged() {
    let fusion = fusion();
    let embedding = fusion
        .generate_artisan_embedding(&weaver())
        .await
        .expect("should embed");

    assert_eq!(embedding.artisan_id, "w-1");
    assert_eq!(embedding.composite_vector.len(), DIMENSION);
    assert!((vector::magnitude(&embedding.composite_vector) - 1.0).abs() < 1e-5);
    assert!((0.0..=1.0).contains(&embedding.confidence));
    assert_eq!(embedding.model_version, "local:hash:fusion-v1");
    assert_eq!(embedding.content_hash, weaver().content_hash());
    embedding.validate(DIMENSION).expect("should be valid");
}

#[tokio::test]
async fn empty_portfolio_facet_is_a_zero_vector() {
    let fusion = fusion();
    let embedding = fusion
        .generate_artisan_embedding(&ArtisanProfile::new("n-1", "Sam Reed"))
        .await
        .expect("should embed");

    assert!(vector::is_zero_vector(&embedding.portfolio_vector));
    assert!(!vector::is_zero_vector(&embedding.composite_vector));
    // Enrichment below 0.3 and one of three facets with signal
    assert!(embedding.confidence < 0.8f32.mul_add(0.3, 0.2 / 3.0) + 1e-6);
}

#[tokio::test]
async fn profile_without_any_text_is_rejected() {
    let err = fusion()
        .generate_artisan_embedding(&ArtisanProfile::default())
        .await
        .expect_err("should be invalid");
    assert!(matches!(err, MatchError::InvalidEmbedding { .. }));
}

#[test]
fn validation_catches_bad_vectors() {
    sample_embedding().validate(2).expect("should be valid");

    let wrong_size = sample_embedding().validate(3).expect_err("should fail");
    assert!(matches!(wrong_size, MatchError::InvalidEmbedding { .. }));

    let mut non_finite = sample_embedding();
    non_finite.skills_vector = vec![f32::NAN, 1.0];
    assert!(non_finite.validate(2).is_err());

    let mut silent = sample_embedding();
    silent.composite_vector = vec![0.0, 0.0];
    assert!(silent.validate(2).is_err());
}

#[tokio::test]
async fn batch_matches_single_generation_and_fills_the_cache() {
    let fusion = fusion();
    let profiles = vec![weaver(), ArtisanProfile::new("n-1", "Sam Reed")];

    let batch = fusion
        .generate_batch_artisan_embeddings(&profiles)
        .await
        .expect("should embed batch");
    assert_eq!(batch.len(), 2);

    let hits_before = fusion.client().cache_stats().hits;
    let single = fusion
        .generate_artisan_embedding(&profiles[0])
        .await
        .expect("should embed");

    assert_eq!(single.composite_vector, batch[0].composite_vector);
    assert_eq!(fusion.client().cache_stats().hits, hits_before + 3);
}

#[tokio::test]
async fn batch_of_nothing_is_empty() {
    let embeddings = fusion()
        .generate_batch_artisan_embeddings(&[])
        .await
        .expect("should succeed");
    assert!(embeddings.is_empty());
}

#[tokio::test]
async fn query_embedding_is_expanded_and_normalized() {
    let fusion = fusion();
    let query = fusion
        .embed_query("Handmade pottery bowl")
        .await
        .expect("should embed");

    assert_eq!(query.cleaned, "handmade pottery bowl");
    assert!(query.expanded.len() > query.cleaned.len());
    assert_eq!(query.query_type, QueryType::Product);
    assert!((vector::magnitude(&query.vector) - 1.0).abs() < 1e-5);
    assert!((query.confidence - query_confidence("handmade pottery bowl", 3)).abs() < 1e-6);

    let err = fusion.embed_query("   ").await.expect_err("should reject");
    assert!(matches!(err, MatchError::InvalidInput(_)));
}

#[test]
fn query_confidence_caps_words_and_concepts() {
    assert_eq!(query_confidence("", 0), 0.0);
    assert!((query_confidence("one two", 1) - (0.4 * 0.2 + 0.6 * 0.2)).abs() < 1e-6);
    let long = "w ".repeat(30);
    assert!((query_confidence(&long, 12) - 1.0).abs() < 1e-6);
}
