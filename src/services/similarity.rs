//! Swappable name-similarity scoring.
//!
//! The scorer only depends on the [`NameSimilarity`] trait, so the
//! algorithm can be replaced without touching the weighting logic.

use std::collections::BTreeSet;

/// Scores two normalized labels in `[0.0, 1.0]`.
pub trait NameSimilarity: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
}

/// Order-insensitive token-set ratio.
///
/// Compares the shared-token core against each side's full token set with
/// normalized edit distance, taking the best of the three pairings. A
/// label fully contained in the other ("amazon" vs. "amazon mktplace
/// payment") scores 1.0, which is what bank descriptors need.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetSimilarity;

impl NameSimilarity for TokenSetSimilarity {
    fn score(&self, a: &str, b: &str) -> f64 {
        if a == b {
            return 1.0;
        }
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
        let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

        let shared = join(tokens_a.intersection(&tokens_b).copied());
        let only_a = join(tokens_a.difference(&tokens_b).copied());
        let only_b = join(tokens_b.difference(&tokens_a).copied());

        let full_a = concat(&shared, &only_a);
        let full_b = concat(&shared, &only_b);

        [
            strsim::normalized_levenshtein(&shared, &full_a),
            strsim::normalized_levenshtein(&shared, &full_b),
            strsim::normalized_levenshtein(&full_a, &full_b),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}

/// Jaro-Winkler over the whole label. Favors shared prefixes; useful when
/// labels are single words with typos rather than token soup.
#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinklerSimilarity;

impl NameSimilarity for JaroWinklerSimilarity {
    fn score(&self, a: &str, b: &str) -> f64 {
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        strsim::jaro_winkler(a, b)
    }
}

fn join<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    tokens.collect::<Vec<_>>().join(" ")
}

fn concat(base: &str, extra: &str) -> String {
    match (base.is_empty(), extra.is_empty()) {
        (true, _) => extra.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base} {extra}"),
    }
}
