// Query module
// Cleans, classifies and expands free-text search queries

pub mod vocabulary;

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use self::vocabulary::{
    CATEGORY_EXPANSIONS, CONCEPT_SYNONYMS, CRAFT_PHRASES, MATERIAL_KEYWORDS, PRODUCT_KEYWORDS,
    SKILL_KEYWORDS, STYLE_KEYWORDS, TRIGGER_RULES, is_stop_word, lookup,
};

const MIN_TOKEN_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Product,
    Skill,
    Material,
    Style,
    Mixed,
}

impl QueryType {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Skill => "skill",
            Self::Material => "material",
            Self::Style => "style",
            Self::Mixed => "mixed",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Product => PRODUCT_KEYWORDS,
            Self::Skill => SKILL_KEYWORDS,
            Self::Material => MATERIAL_KEYWORDS,
            Self::Style => STYLE_KEYWORDS,
            Self::Mixed => &[],
        }
    }
}

impl fmt::Display for QueryType {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SCORED_TYPES: [QueryType; 4] = [
    QueryType::Product,
    QueryType::Skill,
    QueryType::Material,
    QueryType::Style,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedQuery {
    pub original: String,
    pub cleaned: String,
    pub expanded: String,
    pub concepts: Vec<String>,
    pub expansion_terms: Vec<String>,
    pub query_type: QueryType,
    pub confidence: f32,
    /// How clearly the query points at one category, for explanations only
    pub intent_clarity: f32,
    /// Share of concepts found in the craft vocabulary, for explanations only
    pub specificity: f32,
}

impl ProcessedQuery {
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.original.trim().is_empty()
            && !self.cleaned.is_empty()
            && !self.expanded.is_empty()
            && (0.0..=1.0).contains(&self.confidence)
            && !self.concepts.is_empty()
    }
}

/// Lower-cases, keeps only alphanumerics, whitespace and hyphens, and
/// collapses runs of whitespace
#[inline]
pub fn clean_query(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Significant tokens followed by the craft phrases present, first
/// appearance wins
#[inline]
pub fn extract_concepts(cleaned: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut concepts = Vec::new();

    let tokens = cleaned
        .split_whitespace()
        .map(|t| t.trim_matches('-'))
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS && !is_stop_word(t));

    for token in tokens {
        if seen.insert(token.to_string()) {
            concepts.push(token.to_string());
        }
    }

    let padded = format!(" {cleaned} ");
    for phrase in CRAFT_PHRASES {
        if padded.contains(&format!(" {phrase} ")) && seen.insert((*phrase).to_string()) {
            concepts.push((*phrase).to_string());
        }
    }

    concepts
}

fn matches_keyword(keywords: &[&str], concept: &str) -> bool {
    let singular = concept.strip_suffix('s').unwrap_or(concept);
    keywords.contains(&concept)
        || keywords.contains(&singular)
        || concept
            .split_whitespace()
            .any(|word| keywords.contains(&word))
}

/// Scores concepts against each category; a tie or no match is `Mixed`
#[inline]
pub fn classify(concepts: &[String]) -> QueryType {
    let scores: Vec<(QueryType, usize)> = SCORED_TYPES
        .iter()
        .map(|kind| {
            let score = concepts
                .iter()
                .filter(|c| matches_keyword(kind.keywords(), c))
                .count();
            (*kind, score)
        })
        .collect();

    let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
    if best == 0 {
        return QueryType::Mixed;
    }

    let mut leaders = scores.iter().filter(|(_, s)| *s == best);
    match (leaders.next(), leaders.next()) {
        (Some((kind, _)), None) => *kind,
        _ => QueryType::Mixed,
    }
}

/// Category, trigger and synonym terms for the concepts, without repeats
/// and without terms that are already concepts
#[inline]
pub fn expansion_terms(concepts: &[String], query_type: QueryType) -> Vec<String> {
    let mut candidates: Vec<&str> = lookup(CATEGORY_EXPANSIONS, query_type.as_str()).to_vec();

    for (trigger, terms) in TRIGGER_RULES {
        if concepts.iter().any(|c| c.contains(trigger)) {
            candidates.extend_from_slice(terms);
        }
    }

    for concept in concepts {
        candidates.extend_from_slice(lookup(CONCEPT_SYNONYMS, concept));
    }

    let mut seen: HashSet<&str> = concepts.iter().map(String::as_str).collect();
    candidates
        .into_iter()
        .filter(|term| seen.insert(*term))
        .map(str::to_string)
        .collect()
}

#[inline]
pub fn expand(cleaned: &str, terms: &[String]) -> String {
    if cleaned.is_empty() {
        return String::new();
    }
    if terms.is_empty() {
        return cleaned.to_string();
    }
    format!("{} {}", cleaned, terms.join(" "))
}

/// Tiered score over length, concept count and expansion ratio
#[inline]
pub fn score_confidence(cleaned: &str, expanded: &str, concept_count: usize) -> f32 {
    if concept_count == 0 || cleaned.is_empty() {
        return 0.0;
    }

    let length = cleaned.chars().count();
    let length_score = match length {
        50.. => 0.3,
        20.. => 0.2,
        5.. => 0.1,
        _ => 0.0,
    };

    let concept_score = match concept_count {
        5.. => 0.4,
        3.. => 0.3,
        _ => 0.15,
    };

    let ratio = expanded.chars().count() as f32 / length as f32;
    let expansion_score = if ratio >= 3.0 {
        0.3
    } else if ratio >= 2.0 {
        0.2
    } else if ratio > 1.0 {
        0.1
    } else {
        0.0
    };

    f32::clamp(length_score + concept_score + expansion_score, 0.0, 1.0)
}

fn intent_clarity(concepts: &[String], query_type: QueryType) -> f32 {
    if concepts.is_empty() {
        return 0.0;
    }
    if query_type == QueryType::Mixed {
        return 0.3;
    }
    let on_topic = concepts
        .iter()
        .filter(|c| matches_keyword(query_type.keywords(), c))
        .count();
    f32::clamp(0.5 + 0.5 * on_topic as f32 / concepts.len() as f32, 0.0, 1.0)
}

fn specificity(concepts: &[String]) -> f32 {
    if concepts.is_empty() {
        return 0.0;
    }
    let known = concepts
        .iter()
        .filter(|c| {
            SCORED_TYPES
                .iter()
                .any(|kind| matches_keyword(kind.keywords(), c))
                || CRAFT_PHRASES.contains(&c.as_str())
        })
        .count();
    let breadth = (concepts.len().min(5) as f32 / 5.0) * 0.4;
    f32::clamp(breadth + 0.6 * known as f32 / concepts.len() as f32, 0.0, 1.0)
}

/// Runs the full clean, extract, classify, expand and score pipeline
#[inline]
pub fn process_query(text: &str) -> ProcessedQuery {
    let cleaned = clean_query(text);
    let concepts = extract_concepts(&cleaned);
    let query_type = classify(&concepts);
    let terms = if concepts.is_empty() {
        Vec::new()
    } else {
        expansion_terms(&concepts, query_type)
    };
    let expanded = expand(&cleaned, &terms);
    let confidence = score_confidence(&cleaned, &expanded, concepts.len());

    debug!(
        "Processed query '{}' as {} with {} concepts and {} expansion terms",
        cleaned,
        query_type,
        concepts.len(),
        terms.len()
    );

    ProcessedQuery {
        original: text.to_string(),
        intent_clarity: intent_clarity(&concepts, query_type),
        specificity: specificity(&concepts),
        cleaned,
        expanded,
        concepts,
        expansion_terms: terms,
        query_type,
        confidence,
    }
}

/// Like [`process_query`], but an invalid result is replaced by the raw
/// trimmed, lower-cased text treated as one literal concept
///
/// Blank input stays blank: there is nothing to fall back to.
#[inline]
pub fn process_or_literal(text: &str) -> ProcessedQuery {
    let processed = process_query(text);
    if processed.is_valid() {
        return processed;
    }

    let literal = text.trim().to_lowercase();
    if literal.is_empty() {
        return processed;
    }

    debug!("Falling back to literal query '{}'", literal);

    let cleaned = if processed.cleaned.is_empty() {
        literal.clone()
    } else {
        processed.cleaned
    };
    let concepts = vec![literal];
    let confidence = score_confidence(&cleaned, &cleaned, concepts.len());

    ProcessedQuery {
        original: text.to_string(),
        expanded: cleaned.clone(),
        cleaned,
        intent_clarity: 0.0,
        specificity: specificity(&concepts),
        concepts,
        expansion_terms: Vec::new(),
        query_type: QueryType::Mixed,
        confidence,
    }
}
