//! Usage-weighted ranking of saved queries against a search term.

use serde::Serialize;

use crate::similarity::similarity;
use crate::tokenize::tokenize;

/// Score awarded when any search token appears inside the candidate's tags.
pub const TAG_MATCH_SCORE: f64 = 0.85;

/// Per-word tag bonus used by the fallback pass when the whole-phrase
/// score comes up empty.
pub const TAG_WORD_SCORE: f64 = 0.7;

/// Default maximum number of ranked results.
pub const DEFAULT_RESULT_CAP: usize = 50;

/// A candidate that can be ranked against a search term.
pub trait SearchItem {
    /// Human-readable key the candidate is matched by.
    fn search_key(&self) -> &str;

    /// Tags attached to the candidate.
    fn search_tags(&self) -> &[String];

    /// How often the candidate has been used, for tie-breaking.
    fn usage_count(&self) -> u64;
}

/// A ranked candidate with its relevance score.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult<T> {
    /// The matched item
    pub item: T,
    /// Relevance score in `0.0..=1.0` (higher is better)
    pub score: f64,
}

/// Rank candidates against a search term.
///
/// A blank term is browse mode: the first `cap` candidates come back in
/// input order with a perfect score. Otherwise each candidate is scored as
/// the best of a whole-phrase key match and a tag containment check, with a
/// per-word fallback pass for candidates the phrase pass scored at zero.
/// Non-matches are dropped and the rest sort by score, then usage count,
/// then input order.
///
/// # Arguments
/// * `candidates` - Items to rank
/// * `term` - Raw search term as typed by the user
/// * `cap` - Maximum number of results (see [`DEFAULT_RESULT_CAP`])
///
/// # Returns
/// At most `cap` scored results, best match first
pub fn rank<T: SearchItem>(candidates: Vec<T>, term: &str, cap: usize) -> Vec<SearchResult<T>> {
    let needle = term.trim();

    if needle.is_empty() {
        return candidates
            .into_iter()
            .take(cap)
            .map(|item| SearchResult { item, score: 1.0 })
            .collect();
    }

    let tokens: Vec<String> = tokenize(needle).collect();

    // Pull keys and joined tag text out up front so scoring works on plain
    // strings regardless of the candidate type.
    let prepared: Vec<(String, String)> = candidates
        .iter()
        .map(|c| {
            let tag_text = c.search_tags().join(" ").to_lowercase();
            (c.search_key().to_string(), tag_text)
        })
        .collect();

    let scores = score_all(&prepared, needle, &tokens);

    let mut results: Vec<SearchResult<T>> = candidates
        .into_iter()
        .zip(scores)
        .filter(|(_, score)| *score > 0.0)
        .map(|(item, score)| SearchResult { item, score })
        .collect();

    // Stable sort keeps input order for full ties
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.item.usage_count().cmp(&a.item.usage_count()))
    });

    results.truncate(cap);
    results
}

fn score_all(prepared: &[(String, String)], needle: &str, tokens: &[String]) -> Vec<f64> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        prepared
            .par_iter()
            .map(|(key, tag_text)| score_candidate(key, tag_text, needle, tokens))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        prepared
            .iter()
            .map(|(key, tag_text)| score_candidate(key, tag_text, needle, tokens))
            .collect()
    }
}

/// Score one candidate. `tag_text` must already be lowercased.
fn score_candidate(key: &str, tag_text: &str, needle: &str, tokens: &[String]) -> f64 {
    let key_score = similarity(key, needle);

    let tag_score = if tokens.iter().any(|t| tag_text.contains(t.as_str())) {
        TAG_MATCH_SCORE
    } else {
        0.0
    };

    let combined = key_score.max(tag_score);
    if combined > 0.0 {
        return combined;
    }

    // Whole-phrase pass found nothing; retry word by word
    tokens
        .iter()
        .map(|token| {
            let word_score = similarity(key, token);
            let word_tag = if tag_text.contains(token.as_str()) {
                TAG_WORD_SCORE
            } else {
                0.0
            };
            word_score.max(word_tag)
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct TestQuery {
        key: String,
        tags: Vec<String>,
        usage: u64,
    }

    impl TestQuery {
        fn new(key: &str, tags: &[&str], usage: u64) -> Self {
            Self {
                key: key.to_string(),
                tags: tags.iter().map(|t| (*t).to_string()).collect(),
                usage,
            }
        }
    }

    impl SearchItem for TestQuery {
        fn search_key(&self) -> &str {
            &self.key
        }

        fn search_tags(&self) -> &[String] {
            &self.tags
        }

        fn usage_count(&self) -> u64 {
            self.usage
        }
    }

    #[test]
    fn test_empty_candidates() {
        let results = rank(Vec::<TestQuery>::new(), "login", DEFAULT_RESULT_CAP);
        assert!(results.is_empty());
    }

    #[test]
    fn test_blank_term_browses_in_input_order() {
        let candidates = vec![
            TestQuery::new("checkout failures", &[], 3),
            TestQuery::new("login tracking", &[], 9),
            TestQuery::new("slow endpoints", &[], 1),
        ];

        let results = rank(candidates, "   ", DEFAULT_RESULT_CAP);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].item.key, "checkout failures");
        assert_eq!(results[1].item.key, "login tracking");
        assert_eq!(results[2].item.key, "slow endpoints");
        assert!(results.iter().all(|r| r.score == 1.0));
    }

    #[test]
    fn test_blank_term_respects_cap() {
        let candidates: Vec<TestQuery> = (0..8)
            .map(|i| TestQuery::new(&format!("query {i}"), &[], i))
            .collect();

        let results = rank(candidates, "", 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].item.key, "query 0");
    }

    #[test]
    fn test_substring_match_outranks_non_match() {
        let candidates = vec![
            TestQuery::new("checkout failures", &["payment"], 10),
            TestQuery::new("login tracking", &["auth", "sessions"], 2),
        ];

        let results = rank(candidates, "login", DEFAULT_RESULT_CAP);

        assert_eq!(results.len(), 1, "non-matching candidate must be dropped");
        assert_eq!(results[0].item.key, "login tracking");

        let expected = 0.9 + 0.1 * (5.0 / 14.0);
        assert!((results[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_tag_containment_scores_fixed_value() {
        let candidates = vec![TestQuery::new("xyz", &["billing", "invoices"], 0)];

        let results = rank(candidates, "billing", DEFAULT_RESULT_CAP);

        assert_eq!(results.len(), 1);
        assert!((results[0].score - TAG_MATCH_SCORE).abs() < 1e-9);
    }

    #[test]
    fn test_key_match_beats_tag_match_when_stronger() {
        let candidates = vec![TestQuery::new("billing errors", &["billing"], 0)];

        let results = rank(candidates, "billing errors", DEFAULT_RESULT_CAP);

        // Whole-phrase key match is exact (1.0) and wins over the 0.85 tag score
        assert!((results[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_per_word_fallback_scores_best_token() {
        // Whole phrase "database errors" scores zero against "error", but the
        // token "errors" is one edit away
        let candidates = vec![TestQuery::new("error", &[], 0)];

        let results = rank(candidates, "database errors", DEFAULT_RESULT_CAP);

        assert_eq!(results.len(), 1);
        let expected = 1.0 - 1.0 / 6.0;
        assert!((results[0].score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_orders_by_score_then_usage_then_input() {
        let candidates = vec![
            TestQuery::new("user login", &[], 1),
            TestQuery::new("user login", &[], 5),
            TestQuery::new("user login", &[], 5),
            TestQuery::new("login tracking audit", &[], 50),
        ];

        let results = rank(candidates, "login", DEFAULT_RESULT_CAP);

        assert_eq!(results.len(), 4);
        // "user login": coverage 5/10 -> 0.95 beats "login tracking audit"
        // coverage 5/20 -> 0.925 regardless of usage
        assert_eq!(results[0].item.usage, 5);
        assert_eq!(results[1].item.usage, 5);
        assert_eq!(results[2].item.usage, 1);
        assert_eq!(results[3].item.key, "login tracking audit");
    }

    #[test]
    fn test_cap_truncates_ranked_results() {
        let candidates: Vec<TestQuery> = (0..6)
            .map(|i| TestQuery::new(&format!("login {i}"), &[], i))
            .collect();

        let results = rank(candidates, "login", 4);

        assert_eq!(results.len(), 4);
        // Equal scores, so highest usage counts come first
        assert_eq!(results[0].item.usage, 5);
        assert_eq!(results[3].item.usage, 2);
    }

    #[test]
    fn test_term_is_trimmed_before_scoring() {
        let candidates = vec![TestQuery::new("login tracking", &[], 0)];

        let trimmed = rank(candidates.clone(), "login", DEFAULT_RESULT_CAP);
        let padded = rank(candidates, "  login  ", DEFAULT_RESULT_CAP);

        assert_eq!(trimmed.len(), padded.len());
        assert!((trimmed[0].score - padded[0].score).abs() < 1e-9);
    }

    #[test]
    fn test_tag_matching_is_case_insensitive() {
        let candidates = vec![TestQuery::new("xyz", &["Billing"], 0)];

        let results = rank(candidates, "BILLING", DEFAULT_RESULT_CAP);

        assert_eq!(results.len(), 1);
        assert!((results[0].score - TAG_MATCH_SCORE).abs() < 1e-9);
    }
}
