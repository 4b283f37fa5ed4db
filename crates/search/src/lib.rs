//! Fuzzy matching and ranking for the Querydeck saved-query library.
//!
//! This crate provides:
//! - Delimiter-aware tokenization with case folding
//! - Levenshtein edit distance over Unicode scalar values
//! - Blended similarity scoring (substring containment + edit distance)
//! - Usage-weighted ranking over arbitrary candidate sets
//!
//! Everything here is pure and deterministic. Scoring a library of a few
//! thousand saved queries completes in well under a millisecond, so callers
//! invoke [`rank`] synchronously on every keystroke-like request.

mod rank;
mod similarity;
mod tokenize;

pub use rank::{
    rank, SearchItem, SearchResult, DEFAULT_RESULT_CAP, TAG_MATCH_SCORE, TAG_WORD_SCORE,
};
pub use similarity::{
    levenshtein, similarity, MIN_SIMILARITY, SUBSTRING_BASE_SCORE, SUBSTRING_LENGTH_BONUS,
};
pub use tokenize::tokenize;
