use super::*;

#[test]
fn token_estimation() {
    assert_eq!(estimate_token_count(""), 0);
    assert_eq!(estimate_token_count("one two three"), 4);
    // 4 words / 0.75 = 5.33, plus 2 punctuation * 0.1
    assert_eq!(estimate_token_count("Hello, hand made world!"), 5);
}

#[test]
fn short_text_is_untouched() {
    let text = "hand thrown stoneware";
    assert_eq!(truncate_to_token_budget(text, 100), text);
}

#[test]
fn truncates_at_word_boundary() {
    let text = "alpha beta gamma delta epsilon zeta eta theta";
    let truncated = truncate_to_token_budget(text, 4);

    assert!(estimate_token_count(truncated) <= 4);
    assert!(text.starts_with(truncated));
    assert_eq!(truncated, "alpha beta gamma");
}

#[test]
fn never_splits_a_word() {
    let text = "ceramics   woodturning\tleatherwork glassblowing metalsmithing";
    let truncated = truncate_to_token_budget(text, 3);
    for word in truncated.split_whitespace() {
        assert!(text.split_whitespace().any(|w| w == word));
    }
    assert!(!truncated.ends_with(' '));
}

#[test]
fn lone_oversized_word_is_kept() {
    let text = "supercalifragilistic expialidocious";
    assert_eq!(truncate_to_token_budget(text, 0), "supercalifragilistic");
}

#[test]
fn multibyte_text_truncates_cleanly() {
    let text = "céramique émaillée à la main très belle pièce unique";
    let truncated = truncate_to_token_budget(text, 5);
    assert!(text.starts_with(truncated));
    assert!(estimate_token_count(truncated) <= 5);
}

#[test]
fn truncation_matches_prefix_estimates() {
    let text = "Hand-thrown, wood-fired bowls; glazed (ash) and salt... fired twice!";
    for budget in 0..12 {
        let truncated = truncate_to_token_budget(text, budget);
        assert!(text.starts_with(truncated));

        let kept = truncated.split_whitespace().count();
        let next = text.split_whitespace().take(kept + 1).collect::<Vec<_>>().join(" ");
        if kept > 1 {
            assert!(estimate_token_count(truncated) <= budget, "budget {budget}");
        }
        if kept < text.split_whitespace().count() {
            assert!(estimate_token_count(&next) > budget, "budget {budget}");
        }
    }
}

#[test]
fn long_text_truncates_to_budget() {
    let text = "woven ".repeat(20_000);
    let truncated = truncate_to_token_budget(&text, 750);
    assert_eq!(truncated.split_whitespace().count(), 563);
    assert!(estimate_token_count(truncated) <= 750);
}
