#[cfg(test)]
mod tests;

/// Estimate the number of tokens in a text
///
/// Rough heuristic: 1 token ≈ 0.75 words for English text, plus a small
/// allowance for punctuation.
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    let word_count = text.split_whitespace().count();
    token_estimate(word_count, punctuation_count(text))
}

fn token_estimate(word_count: usize, punct_count: usize) -> usize {
    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}

fn punctuation_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_ascii_punctuation()).count()
}

/// Cut `text` at the last word boundary that keeps it within `max_tokens`
///
/// Text already within budget is returned unchanged. A single word that is
/// over budget on its own is kept whole, since there is no earlier boundary.
#[inline]
pub fn truncate_to_token_budget(text: &str, max_tokens: usize) -> &str {
    if estimate_token_count(text) <= max_tokens {
        return text;
    }

    let mut end = 0;
    let mut first_word_end = None;
    // Prefixes end on a word, so their punctuation all lies inside the words seen
    let mut words = 0;
    let mut punct = 0;

    for (start, word) in word_spans(text) {
        let candidate_end = start + word.len();
        first_word_end.get_or_insert(candidate_end);

        words += 1;
        punct += punctuation_count(word);
        if token_estimate(words, punct) > max_tokens {
            break;
        }
        end = candidate_end;
    }

    if end == 0 {
        end = first_word_end.unwrap_or(0);
    }

    text.get(..end).unwrap_or(text).trim_end()
}

/// Byte offset and text of every whitespace-separated word
fn word_spans(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_whitespace().map(move |word| {
        let offset = word.as_ptr() as usize - text.as_ptr() as usize;
        (offset, word)
    })
}
