use super::*;
use crate::profile::ExperienceLevel;

#[test]
fn reasons_follow_similarity_tiers_and_flags() {
    let metadata = ArtisanMetadata {
        verified: true,
        rating: Some(4.9),
        experience_level: Some(ExperienceLevel::Master),
        ..ArtisanMetadata::default()
    };

    let explanation = explain_match(0.9, Some(&metadata), &FusionConfig::default(), 4.5);
    assert_eq!(
        explanation.reasons,
        vec![
            "Excellent match for your search",
            "Verified artisan",
            "Highly rated (4.9 stars)",
            "Master level experience",
        ]
    );
    assert_eq!(explanation.confidence, 1.0);
    assert_eq!(explanation.level, ConfidenceLevel::High);
}

#[test]
fn breakdown_splits_by_fusion_weight() {
    let explanation = explain_match(0.5, None, &FusionConfig::default(), 4.5);
    assert!((explanation.breakdown.profile - 0.2).abs() < 1e-6);
    assert!((explanation.breakdown.skills - 0.2).abs() < 1e-6);
    assert!((explanation.breakdown.portfolio - 0.1).abs() < 1e-6);
    assert_eq!(explanation.reasons, vec!["Good match for your search"]);
    assert!((explanation.confidence - 0.6).abs() < 1e-6);
    assert_eq!(explanation.level, ConfidenceLevel::Medium);
}

#[test]
fn weak_matches_are_low_confidence() {
    let explanation = explain_match(0.2, None, &FusionConfig::default(), 4.5);
    assert_eq!(explanation.reasons, vec!["Partial match for your search"]);
    assert_eq!(explanation.level, ConfidenceLevel::Low);
    assert_eq!(explain_match(-0.3, None, &FusionConfig::default(), 4.5).confidence, 0.0);
}
