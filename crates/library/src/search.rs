//! Search service over the library store
//!
//! Input hygiene lives here rather than in the ranker: the term is trimmed
//! and truncated before scoring, and blank input turns into a browse listing
//! in the store's default order.

use crate::store::LibraryStore;
use crate::types::QueryRecord;
use querydeck_search::{rank, SearchResult};

/// Longest accepted search term, in characters. Longer input is truncated.
pub const MAX_TERM_LENGTH: usize = 100;

/// Rank the library's queries against `term`.
///
/// A blank term browses the library in its default category-then-key order,
/// every entry scored `1.0`.
pub fn search_queries(
    store: &LibraryStore,
    term: &str,
    cap: usize,
) -> Vec<SearchResult<QueryRecord>> {
    let cleaned = clean_term(term);
    rank(store.queries_default_order(), &cleaned, cap)
}

/// Browse listing without scoring: default order, optionally one category.
pub fn browse_queries(store: &LibraryStore, category: Option<&str>, cap: usize) -> Vec<QueryRecord> {
    let mut queries = match category {
        Some(c) => store.queries_in_category(c),
        None => store.queries_default_order(),
    };
    queries.truncate(cap);
    queries
}

fn clean_term(term: &str) -> String {
    term.trim().chars().take(MAX_TERM_LENGTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewQuery;
    use tempfile::TempDir;

    fn seeded_store() -> (LibraryStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LibraryStore::open(temp_dir.path().join("library.json")).unwrap();

        for (category, key, tags) in [
            ("auth", "login tracking", vec!["auth", "session"]),
            ("errors", "recent errors by service", vec!["triage"]),
            ("latency", "slow endpoints", vec!["performance"]),
        ] {
            store
                .add_query(NewQuery {
                    category: category.to_string(),
                    key: key.to_string(),
                    query: "_sourceCategory=prod/app | count".to_string(),
                    tags: tags.into_iter().map(String::from).collect(),
                })
                .unwrap();
        }

        (store, temp_dir)
    }

    #[test]
    fn test_search_finds_substring_match() {
        let (store, _temp) = seeded_store();

        let results = search_queries(&store, "login", 50);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.key, "login tracking");
        assert!(results[0].score > 0.9);
    }

    #[test]
    fn test_search_matches_on_tags() {
        let (store, _temp) = seeded_store();

        let results = search_queries(&store, "performance", 50);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item.key, "slow endpoints");
    }

    #[test]
    fn test_blank_term_browses_in_default_order() {
        let (store, _temp) = seeded_store();

        let results = search_queries(&store, "   ", 50);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].item.category, "auth");
        assert_eq!(results[1].item.category, "errors");
        assert_eq!(results[2].item.category, "latency");
        assert!(results.iter().all(|r| r.score == 1.0));
    }

    #[test]
    fn test_search_respects_cap() {
        let (store, _temp) = seeded_store();

        let results = search_queries(&store, "", 2);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_oversized_term_is_truncated() {
        let (store, _temp) = seeded_store();

        // 100 chars of padding followed by a word that would otherwise match
        let term = format!("{}login", "x".repeat(MAX_TERM_LENGTH));
        let results = search_queries(&store, &term, 50);

        assert!(results.is_empty());
    }

    #[test]
    fn test_clean_term_trims_and_limits() {
        assert_eq!(clean_term("  login  "), "login");
        assert_eq!(clean_term(&"a".repeat(250)).chars().count(), MAX_TERM_LENGTH);
    }

    #[test]
    fn test_browse_filters_by_category() {
        let (store, _temp) = seeded_store();

        let all = browse_queries(&store, None, 50);
        assert_eq!(all.len(), 3);

        let auth = browse_queries(&store, Some("auth"), 50);
        assert_eq!(auth.len(), 1);
        assert_eq!(auth[0].key, "login tracking");
    }
}
