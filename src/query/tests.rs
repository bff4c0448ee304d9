use super::*;

#[test]
fn cleaning_keeps_hyphens_and_collapses_whitespace() {
    assert_eq!(
        clean_query("  Hand-Thrown   MUGS, please!!  "),
        "hand-thrown mugs please"
    );
    assert_eq!(clean_query("Don't stop"), "dont stop");
    assert_eq!(clean_query(" \t\n "), "");
}

#[test]
fn blank_queries_have_no_concepts_or_confidence() {
    for text in ["", "   ", "\t\n"] {
        let processed = process_query(text);
        assert!(processed.cleaned.is_empty());
        assert!(processed.concepts.is_empty());
        assert_eq!(processed.confidence, 0.0);
        assert!(!processed.is_valid());
    }
}

#[test]
fn handmade_pottery_bowl_example() {
    let processed = process_query("I need a beautiful handmade pottery bowl");

    assert_eq!(processed.query_type, QueryType::Product);
    for concept in ["pottery", "handmade", "bowl"] {
        assert!(
            processed.concepts.iter().any(|c| c == concept),
            "missing concept {concept}: {:?}",
            processed.concepts
        );
    }
    assert!(!processed.concepts.iter().any(|c| c == "need"));

    for synonym in ["ceramics", "clay work", "artisan"] {
        assert!(
            processed.expanded.contains(synonym),
            "expanded text lacks {synonym}: {}",
            processed.expanded
        );
    }
    assert!(processed.expanded.starts_with(&processed.cleaned));
    assert!(processed.is_valid());
    assert!(processed.confidence > 0.0 && processed.confidence <= 1.0);
}

#[test]
fn craft_phrases_become_single_concepts() {
    let concepts = extract_concepts("custom made walnut table one of a kind");
    assert!(concepts.contains(&"custom made".to_string()));
    assert!(concepts.contains(&"one of a kind".to_string()));
    assert!(concepts.contains(&"walnut".to_string()));
    // Stop-words and short tokens never make it in
    assert!(!concepts.contains(&"of".to_string()));
    assert!(!concepts.contains(&"made".to_string()));
}

#[test]
fn concepts_are_deduplicated_in_order() {
    let concepts = extract_concepts("oak table oak chair table");
    assert_eq!(concepts, vec!["oak", "table", "chair"]);
}

#[test]
fn classification_needs_a_strict_winner() {
    let words = |list: &[&str]| list.iter().map(|w| (*w).to_string()).collect::<Vec<_>>();

    assert_eq!(classify(&words(&["weaving", "knitting"])), QueryType::Skill);
    assert_eq!(classify(&words(&["silver", "copper"])), QueryType::Material);
    assert_eq!(classify(&words(&["rustic"])), QueryType::Style);
    assert_eq!(classify(&words(&["bowls"])), QueryType::Product);
    // One product and one material tie
    assert_eq!(classify(&words(&["bowl", "clay"])), QueryType::Mixed);
    assert_eq!(classify(&words(&["anything"])), QueryType::Mixed);
    assert_eq!(classify(&[]), QueryType::Mixed);
}

#[test]
fn expansion_terms_skip_existing_concepts_and_repeats() {
    let concepts = vec!["pottery".to_string(), "ceramics".to_string()];
    let terms = expansion_terms(&concepts, QueryType::Product);

    assert!(!terms.contains(&"pottery".to_string()));
    assert!(!terms.contains(&"ceramics".to_string()));
    let unique: HashSet<&String> = terms.iter().collect();
    assert_eq!(unique.len(), terms.len());
    assert!(terms.contains(&"clay work".to_string()));
}

#[test]
fn triggers_match_inside_concepts() {
    let concepts = vec!["woodcarver".to_string()];
    let terms = expansion_terms(&concepts, QueryType::Mixed);
    assert!(terms.contains(&"woodworking".to_string()));
}

#[test]
fn confidence_tiers() {
    assert_eq!(score_confidence("", "", 0), 0.0);
    assert_eq!(score_confidence("rugs", "rugs", 0), 0.0);

    // Under five characters, one concept, no expansion
    let low = score_confidence("rug", "rug", 1);
    assert!((low - 0.15).abs() < 1e-6);

    let cleaned = "x".repeat(50);
    let expanded = "x".repeat(150);
    let high = score_confidence(&cleaned, &expanded, 6);
    assert!((high - 1.0).abs() < 1e-6);
}

#[test]
fn literal_fallback_for_queries_without_concepts() {
    let processed = process_or_literal("Go!");
    assert!(processed.is_valid());
    assert_eq!(processed.concepts, vec!["go!"]);
    assert_eq!(processed.cleaned, "go");
    assert_eq!(processed.expanded, "go");
    assert_eq!(processed.query_type, QueryType::Mixed);

    let blank = process_or_literal("   ");
    assert!(blank.concepts.is_empty());
}

#[test]
fn auxiliary_scores_are_bounded() {
    let processed = process_query("rustic walnut dining table with hand carved legs");
    assert!((0.0..=1.0).contains(&processed.intent_clarity));
    assert!((0.0..=1.0).contains(&processed.specificity));
    assert!(processed.specificity > 0.0);
}
