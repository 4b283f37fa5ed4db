//! Starter content for a fresh library

use crate::types::{LibraryDoc, LogMapping, QueryRecord};

/// Starter document written by `querydeck init` so a fresh install has
/// something to search.
pub fn starter_doc() -> LibraryDoc {
    LibraryDoc {
        queries: starter_queries(),
        mappings: starter_mappings(),
        ..LibraryDoc::default()
    }
}

/// The starter query records.
pub fn starter_queries() -> Vec<QueryRecord> {
    vec![
        QueryRecord::new(
            "errors",
            "recent errors by service",
            "_sourceCategory=prod/* error | count by _sourceCategory | sort by _count",
            vec!["errors".to_string(), "triage".to_string()],
        ),
        QueryRecord::new(
            "auth",
            "login tracking",
            "_sourceCategory=prod/auth \"login\" | timeslice 1h | count by _timeslice",
            vec!["auth".to_string(), "session".to_string()],
        ),
        QueryRecord::new(
            "latency",
            "slow endpoints",
            "_sourceCategory=prod/api | parse \"path=* elapsed=*ms\" as path, elapsed \
             | where elapsed > 500 | count by path | sort by _count",
            vec!["performance".to_string(), "api".to_string()],
        ),
        QueryRecord::new(
            "errors",
            "checkout failures",
            "_sourceCategory=prod/checkout (\"failed\" OR \"exception\") | count by module | sort by _count",
            vec!["payment".to_string(), "checkout".to_string()],
        ),
        QueryRecord::new(
            "traffic",
            "5xx rate by host",
            "_sourceCategory=prod/nginx | parse \"HTTP/1.1\\\" * \" as status \
             | where status >= 500 | timeslice 5m | count by _timeslice, _sourceHost",
            vec!["http".to_string(), "availability".to_string()],
        ),
    ]
}

/// The starter log mappings.
pub fn starter_mappings() -> Vec<LogMapping> {
    vec![
        LogMapping::new("auth", "prod/auth", None),
        LogMapping::new(
            "checkout",
            "prod/checkout",
            Some("owned by the payments team".to_string()),
        ),
    ]
}
