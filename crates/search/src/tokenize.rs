//! Search term tokenization.

/// Split a raw search term into lowercase tokens.
///
/// Tokens are separated by whitespace, commas, and semicolons. Runs of
/// delimiters produce no empty tokens, so the iterator yields nothing for
/// blank or delimiter-only input.
///
/// # Arguments
/// * `input` - Raw search term as typed by the user
///
/// # Returns
/// Lazy iterator over lowercased tokens in input order
pub fn tokenize(input: &str) -> impl Iterator<Item = String> + '_ {
    input
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_whitespace() {
        let tokens: Vec<String> = tokenize("login tracking errors").collect();
        assert_eq!(tokens, vec!["login", "tracking", "errors"]);
    }

    #[test]
    fn test_splits_on_commas_and_semicolons() {
        let tokens: Vec<String> = tokenize("auth,billing;checkout").collect();
        assert_eq!(tokens, vec!["auth", "billing", "checkout"]);
    }

    #[test]
    fn test_lowercases_tokens() {
        let tokens: Vec<String> = tokenize("Login TRACKING").collect();
        assert_eq!(tokens, vec!["login", "tracking"]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(tokenize("").count(), 0);
    }

    #[test]
    fn test_delimiter_only_input() {
        assert_eq!(tokenize("  ,, ;  ").count(), 0);
    }

    #[test]
    fn test_consecutive_delimiters_yield_no_empties() {
        let tokens: Vec<String> = tokenize("a,,  b ;; c").collect();
        assert_eq!(tokens, vec!["a", "b", "c"]);
    }
}
