//! Name normalization and string similarity.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static PUNCT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static ALIAS_FC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfc\b").unwrap());

/// Idempotent: NFKD-decompose, strip combining marks, casefold, collapse
/// punctuation to whitespace, expand the `fc` alias, collapse whitespace.
pub fn normalize_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let decomposed: String = name.nfkd().filter(|c| !is_combining(*c)).collect();
    let mut text = decomposed.to_lowercase();
    text = PUNCT_PATTERN.replace_all(&text, " ").into_owned();
    text = WHITESPACE.replace_all(text.trim(), " ").into_owned();
    if ALIAS_FC.is_match(&text) {
        text = ALIAS_FC.replace_all(&text, "football club").into_owned();
    }
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn is_combining(c: char) -> bool {
    matches!(unicode_normalization::char::canonical_combining_class(c), 1..=255)
}

/// Token-sort ratio: split on whitespace, sort tokens, Levenshtein ratio.
/// Empty operand yields 0.0.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let sorted_a = sort_tokens(a);
    let sorted_b = sort_tokens(b);
    ratio(&sorted_a, &sorted_b)
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Plain edit-distance ratio mapped to `[0,1]`. Empty operand yields 0.0.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let distance = levenshtein(a, b);
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (distance as f64 / max_len as f64)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (la, lb) = (a.len(), b.len());
    let mut row: Vec<usize> = (0..=lb).collect();
    for i in 1..=la {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=lb {
            let tmp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = tmp;
        }
    }
    row[lb]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent() {
        let once = normalize_name("FC Barcelona");
        let twice = normalize_name(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn expands_bare_fc() {
        assert_eq!(normalize_name("Porto FC"), "porto football club");
    }

    #[test]
    fn strips_accents_and_punctuation() {
        assert_eq!(normalize_name("Atlético-Madrid"), "atletico madrid");
    }

    #[test]
    fn empty_operand_similarity_is_zero() {
        assert_eq!(token_sort_ratio("", "anything"), 0.0);
        assert_eq!(ratio("", "anything"), 0.0);
    }

    #[test]
    fn token_sort_ratio_ignores_word_order() {
        let a = token_sort_ratio("manchester united", "united manchester");
        assert_eq!(a, 1.0);
    }
}
