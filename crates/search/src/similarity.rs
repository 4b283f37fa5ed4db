//! String similarity scoring.
//!
//! Scores blend two signals: a substring containment check (strong signal,
//! scored by how much of the candidate the term covers) and normalized
//! Levenshtein edit distance as the fallback for typos.

/// Base score awarded when the term appears verbatim inside the candidate.
pub const SUBSTRING_BASE_SCORE: f64 = 0.9;

/// Weight of the length-coverage bonus added on top of a substring match.
pub const SUBSTRING_LENGTH_BONUS: f64 = 0.1;

/// Edit-distance scores below this threshold clamp to zero.
pub const MIN_SIMILARITY: f64 = 0.5;

/// Calculate Levenshtein edit distance between two strings.
///
/// Operates on Unicode scalar values, not bytes, so multi-byte characters
/// count as single edits.
///
/// # Arguments
/// * `a` - First string
/// * `b` - Second string
///
/// # Returns
/// Number of single-character insertions, deletions, and substitutions
/// needed to transform `a` into `b`
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    // Two rolling rows instead of the full matrix
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Score how well a search term matches a candidate string.
///
/// Matching is case-insensitive. An empty term matches everything with a
/// perfect score. A term contained verbatim in the candidate scores at
/// least [`SUBSTRING_BASE_SCORE`], plus a bonus proportional to how much of
/// the candidate it covers. Otherwise the score is edit distance normalized
/// by the longer length, clamped to zero below [`MIN_SIMILARITY`].
///
/// # Arguments
/// * `candidate` - Text being scored (for example a saved query key)
/// * `term` - Search term to score it against
///
/// # Returns
/// Score in `0.0..=1.0`; identical strings always score `1.0`
///
/// # Example
/// ```
/// use querydeck_search::similarity;
///
/// assert!(similarity("login tracking", "login") > 0.9);
/// assert_eq!(similarity("error", "banana"), 0.0);
/// ```
pub fn similarity(candidate: &str, term: &str) -> f64 {
    if term.is_empty() {
        return 1.0;
    }

    let candidate_lower = candidate.to_lowercase();
    let term_lower = term.to_lowercase();

    let candidate_len = candidate_lower.chars().count();
    let term_len = term_lower.chars().count();

    if candidate_lower.contains(&term_lower) {
        let coverage = term_len as f64 / candidate_len.max(1) as f64;
        return SUBSTRING_BASE_SCORE + SUBSTRING_LENGTH_BONUS * coverage;
    }

    let distance = levenshtein(&candidate_lower, &term_lower);
    let longest = candidate_len.max(term_len);
    let score = 1.0 - distance as f64 / longest as f64;

    if score < MIN_SIMILARITY { 0.0 } else { score }
}
