//! Query records, log mappings, and the on-disk library document

use chrono::{DateTime, Utc};
use querydeck_search::SearchItem;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current format version of the library document.
pub const DOC_VERSION: u32 = 1;

/// A saved SumoLogic query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Stable identity
    pub id: Uuid,
    /// Grouping bucket, e.g. `errors` or `auth`
    pub category: String,
    /// Short intent text the library is searched by
    pub key: String,
    /// The saved query text
    pub query: String,
    /// Labels matched by the tag side of ranking
    #[serde(default)]
    pub tags: Vec<String>,
    /// How many times the query has been pulled out of the library
    #[serde(default)]
    pub usage_count: u64,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last edited
    pub updated_at: DateTime<Utc>,
}

impl QueryRecord {
    /// Create a fresh record with a new id and current timestamps.
    pub fn new(
        category: impl Into<String>,
        key: impl Into<String>,
        query: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            key: key.into(),
            query: query.into(),
            tags: normalize_tags(tags),
            usage_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

impl SearchItem for QueryRecord {
    fn search_key(&self) -> &str {
        &self.key
    }

    fn search_tags(&self) -> &[String] {
        &self.tags
    }

    fn usage_count(&self) -> u64 {
        self.usage_count
    }
}

/// Maps a service name to the `_sourceCategory` its logs land in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMapping {
    /// Stable identity
    pub id: Uuid,
    /// Service name as engineers refer to it
    pub service: String,
    /// The `_sourceCategory` value dashboard panels query
    pub source_category: String,
    /// Optional free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LogMapping {
    /// Create a new mapping.
    pub fn new(
        service: impl Into<String>,
        source_category: impl Into<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            service: service.into(),
            source_category: source_category.into(),
            notes,
        }
    }
}

/// Input for adding a query to the library.
#[derive(Debug, Clone, Default)]
pub struct NewQuery {
    /// Target category
    pub category: String,
    /// Intent text
    pub key: String,
    /// Query text
    pub query: String,
    /// Labels, already split
    pub tags: Vec<String>,
}

/// Partial update for an existing query; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct QueryPatch {
    /// Replacement category
    pub category: Option<String>,
    /// Replacement key
    pub key: Option<String>,
    /// Replacement query text
    pub query: Option<String>,
    /// Replacement tag list
    pub tags: Option<Vec<String>>,
}

/// The single JSON document the store persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDoc {
    /// Format version for forward compatibility
    #[serde(default = "default_version")]
    pub version: u32,
    /// Saved queries
    #[serde(default)]
    pub queries: Vec<QueryRecord>,
    /// Service-to-source-category mappings
    #[serde(default)]
    pub mappings: Vec<LogMapping>,
}

impl Default for LibraryDoc {
    fn default() -> Self {
        Self {
            version: DOC_VERSION,
            queries: Vec::new(),
            mappings: Vec::new(),
        }
    }
}

fn default_version() -> u32 {
    DOC_VERSION
}

/// Per-category rollup used by browse listings.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    /// Category name, lowercased
    pub name: String,
    /// Number of queries filed under it
    pub query_count: usize,
}

/// Split a comma-separated tag list, dropping empties and surrounding space.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_has_identity_and_timestamps() {
        let record = QueryRecord::new("auth", "login tracking", "_sourceCategory=prod/auth", vec![]);

        assert!(!record.id.is_nil());
        assert_eq!(record.usage_count, 0);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_new_record_normalizes_tags() {
        let record = QueryRecord::new(
            "auth",
            "login tracking",
            "_sourceCategory=prod/auth",
            vec!["  auth ".to_string(), String::new(), "session".to_string()],
        );

        assert_eq!(record.tags, vec!["auth", "session"]);
    }

    #[test]
    fn test_record_exposes_search_fields() {
        let record = QueryRecord::new(
            "auth",
            "login tracking",
            "_sourceCategory=prod/auth",
            vec!["auth".to_string()],
        );

        assert_eq!(record.search_key(), "login tracking");
        assert_eq!(record.search_tags(), ["auth".to_string()]);
        assert_eq!(SearchItem::usage_count(&record), 0);
    }

    #[test]
    fn test_doc_deserializes_with_missing_fields() {
        let json = r#"{
            "queries": [{
                "id": "7b1c6a6e-3f2a-4e2b-9a34-2d31c8a4f0f1",
                "category": "errors",
                "key": "recent errors",
                "query": "_sourceCategory=prod/* error | count",
                "created_at": "2026-01-10T09:30:00Z",
                "updated_at": "2026-01-10T09:30:00Z"
            }]
        }"#;

        let doc: LibraryDoc = serde_json::from_str(json).unwrap();

        assert_eq!(doc.version, DOC_VERSION);
        assert!(doc.mappings.is_empty());
        assert_eq!(doc.queries.len(), 1);
        assert!(doc.queries[0].tags.is_empty());
        assert_eq!(doc.queries[0].usage_count, 0);
    }

    #[test]
    fn test_doc_round_trips_through_json() {
        let mut doc = LibraryDoc::default();
        doc.queries.push(QueryRecord::new(
            "latency",
            "slow endpoints",
            "_sourceCategory=prod/api | where elapsed > 500",
            vec!["latency".to_string()],
        ));
        doc.mappings.push(LogMapping::new("api", "prod/api", None));

        let json = serde_json::to_string_pretty(&doc).unwrap();
        let parsed: LibraryDoc = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.version, doc.version);
        assert_eq!(parsed.queries[0].id, doc.queries[0].id);
        assert_eq!(parsed.mappings[0].service, "api");
    }

    #[test]
    fn test_mapping_skips_empty_notes_in_json() {
        let mapping = LogMapping::new("checkout", "prod/checkout", None);
        let json = serde_json::to_string(&mapping).unwrap();
        assert!(!json.contains("notes"));
    }

    #[test]
    fn test_parse_tag_list() {
        assert_eq!(
            parse_tag_list("auth, session ,  ,Payments"),
            vec!["auth", "session", "Payments"]
        );
        assert!(parse_tag_list("").is_empty());
        assert!(parse_tag_list(" , ,").is_empty());
    }
}
