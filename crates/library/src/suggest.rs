//! Parse an assistant reply into a structured query suggestion
//!
//! Gemini answers in prose wrapped around a fenced code block. The parser
//! pulls the first fenced block out as the query, picks up optional `Title:`
//! and `Tags:` lines, and keeps the remaining prose as the explanation. Some
//! replies skip the fence entirely and are just the query, so a bare reply
//! that looks like a query is accepted as one.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::types::parse_tag_list;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)```(?:sql|sumo|text)?\s*(.*?)```").unwrap());

static TITLE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^\s*title:\s*(.+)$").unwrap());

static TAGS_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^\s*tags:\s*(.+)$").unwrap());

/// Why a reply could not be turned into a suggestion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SuggestError {
    /// The reply contained no text at all
    #[error("assistant reply was empty")]
    EmptyReply,
    /// No query could be extracted from the reply
    #[error("assistant reply contained no query")]
    MissingQuery,
}

/// A structured suggestion extracted from an assistant reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySuggestion {
    /// Short name offered for the query, when the reply labelled one
    pub title: Option<String>,
    /// The suggested query text
    pub query: String,
    /// Prose surrounding the query
    pub explanation: Option<String>,
    /// Labels offered alongside the query
    pub tags: Vec<String>,
}

/// Extract a [`QuerySuggestion`] from raw reply text.
pub fn parse_suggestion(reply: &str) -> Result<QuerySuggestion, SuggestError> {
    let text = reply.trim();
    if text.is_empty() {
        return Err(SuggestError::EmptyReply);
    }

    let title = TITLE_LINE.captures(text).map(|c| c[1].trim().to_string());
    let tags = TAGS_LINE
        .captures(text)
        .map(|c| parse_tag_list(&c[1]))
        .unwrap_or_default();

    let (query, remainder) = match FENCED_BLOCK.captures(text) {
        Some(caps) => {
            let query = caps[1].trim().to_string();
            let remainder = text.replacen(&caps[0], "", 1);
            (query, remainder)
        }
        None => {
            // Some replies are the query itself with nothing around it
            let stripped = strip_labels(text);
            if !looks_like_query(&stripped) {
                return Err(SuggestError::MissingQuery);
            }
            (stripped, String::new())
        }
    };

    if query.is_empty() {
        return Err(SuggestError::MissingQuery);
    }

    let prose = strip_labels(&remainder);
    let explanation = if prose.is_empty() { None } else { Some(prose) };

    Ok(QuerySuggestion {
        title,
        query,
        explanation,
        tags,
    })
}

fn strip_labels(text: &str) -> String {
    let without_title = TITLE_LINE.replace(text, "");
    let without_tags = TAGS_LINE.replace(&without_title, "");
    without_tags.trim().to_string()
}

/// Sumo queries lead with a scope expression and pipe into operators.
fn looks_like_query(text: &str) -> bool {
    text.contains("_source") || text.contains("_index") || text.contains('|')
}
