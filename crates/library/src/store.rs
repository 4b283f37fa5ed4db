//! JSON file store for the query library
//!
//! The whole library lives in one document (`{ version, queries, mappings }`)
//! at a configured path. An in-memory copy sits behind a `RwLock`; every
//! mutation rewrites the file through a temp-file rename so an interrupted
//! write never leaves a truncated store behind.
//!
//! # Example
//!
//! ```rust,ignore
//! use querydeck_library::{LibraryStore, NewQuery};
//!
//! let store = LibraryStore::open("library.json")?;
//! let record = store.add_query(NewQuery {
//!     category: "errors".into(),
//!     key: "recent errors".into(),
//!     query: "_sourceCategory=prod/* error | count".into(),
//!     tags: vec!["triage".into()],
//! })?;
//! println!("saved {}", record.id);
//! ```

use crate::types::{
    normalize_tags, CategorySummary, LibraryDoc, LogMapping, NewQuery, QueryPatch, QueryRecord,
};
use chrono::Utc;
use querydeck_core::error::{Error, ErrorCode, Result};
use querydeck_core::validation::{validate_mapping, validate_record};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// File-backed store for query records and log mappings.
#[derive(Debug)]
pub struct LibraryStore {
    path: PathBuf,
    doc: RwLock<LibraryDoc>,
}

impl LibraryStore {
    /// Open the store at `path`. A missing file is an empty library.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = if path.exists() {
            Self::read_doc(&path)?
        } else {
            LibraryDoc::default()
        };

        Ok(Self {
            path,
            doc: RwLock::new(doc),
        })
    }

    /// Create the store file with `doc` as its initial contents.
    ///
    /// Refuses to overwrite an existing library.
    pub fn initialize(path: impl Into<PathBuf>, doc: LibraryDoc) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            return Err(Error::library(format!(
                "A library already exists at {}",
                path.display()
            ))
            .with_suggestion("Delete the file first if you really want to start over"));
        }

        let store = Self {
            path,
            doc: RwLock::new(doc),
        };
        {
            let doc = store.read();
            store.persist(&doc)?;
        }
        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // Queries

    /// Add a query to the library.
    ///
    /// Keys are unique per category, compared case-insensitively.
    pub fn add_query(&self, input: NewQuery) -> Result<QueryRecord> {
        let category = input.category.trim().to_string();
        let key = input.key.trim().to_string();
        validate_record(&category, &key, &input.query).to_result()?;

        let key_lower = key.to_lowercase();
        let category_lower = category.to_lowercase();

        let mut doc = self.write();
        if doc
            .queries
            .iter()
            .any(|q| q.category.to_lowercase() == category_lower && q.key.to_lowercase() == key_lower)
        {
            return Err(Error::duplicate_key(&category, &key));
        }

        let record = QueryRecord::new(category, key, input.query, input.tags);
        doc.queries.push(record.clone());
        self.persist(&doc)?;
        Ok(record)
    }

    /// Fetch a query by id.
    pub fn get(&self, id: Uuid) -> Option<QueryRecord> {
        self.read().queries.iter().find(|q| q.id == id).cloned()
    }

    /// Find a query by key, optionally narrowed to one category.
    ///
    /// A key that appears in more than one category must be disambiguated
    /// with `category`, otherwise the lookup is ambiguous and fails.
    pub fn find_by_key(&self, key: &str, category: Option<&str>) -> Result<Option<QueryRecord>> {
        let key_lower = key.trim().to_lowercase();
        let category_lower = category.map(str::to_lowercase);
        let doc = self.read();

        let matches: Vec<&QueryRecord> = doc
            .queries
            .iter()
            .filter(|q| q.key.to_lowercase() == key_lower)
            .filter(|q| {
                category_lower
                    .as_deref()
                    .is_none_or(|c| q.category.to_lowercase() == c)
            })
            .collect();

        match matches.as_slice() {
            [] => Ok(None),
            [record] => Ok(Some((*record).clone())),
            _ => {
                let categories: Vec<&str> =
                    matches.iter().map(|q| q.category.as_str()).collect();
                Err(Error::library(format!(
                    "'{}' exists in {} categories: {}",
                    key,
                    matches.len(),
                    categories.join(", ")
                ))
                .with_suggestion("Pass --category to pick one"))
            }
        }
    }

    /// Resolve a selector that may be a record id or a key.
    pub fn resolve(&self, selector: &str, category: Option<&str>) -> Result<QueryRecord> {
        if let Ok(id) = Uuid::parse_str(selector.trim()) {
            if let Some(record) = self.get(id) {
                return Ok(record);
            }
        }

        self.find_by_key(selector, category)?
            .ok_or_else(|| Error::query_not_found(selector))
    }

    /// Apply a partial update to a query.
    pub fn update_query(&self, id: Uuid, patch: QueryPatch) -> Result<QueryRecord> {
        let mut doc = self.write();
        let index = doc
            .queries
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| Self::missing_query(id))?;

        let mut updated = doc.queries[index].clone();
        if let Some(category) = patch.category {
            updated.category = category.trim().to_string();
        }
        if let Some(key) = patch.key {
            updated.key = key.trim().to_string();
        }
        if let Some(query) = patch.query {
            updated.query = query;
        }
        if let Some(tags) = patch.tags {
            updated.tags = normalize_tags(tags);
        }

        validate_record(&updated.category, &updated.key, &updated.query).to_result()?;

        let key_lower = updated.key.to_lowercase();
        let category_lower = updated.category.to_lowercase();
        if doc.queries.iter().any(|q| {
            q.id != id
                && q.category.to_lowercase() == category_lower
                && q.key.to_lowercase() == key_lower
        }) {
            return Err(Error::duplicate_key(&updated.category, &updated.key));
        }

        updated.updated_at = Utc::now();
        doc.queries[index] = updated.clone();
        self.persist(&doc)?;
        Ok(updated)
    }

    /// Remove a query, returning the removed record.
    pub fn remove_query(&self, id: Uuid) -> Result<QueryRecord> {
        let mut doc = self.write();
        let index = doc
            .queries
            .iter()
            .position(|q| q.id == id)
            .ok_or_else(|| Self::missing_query(id))?;

        let removed = doc.queries.remove(index);
        self.persist(&doc)?;
        Ok(removed)
    }

    /// Bump a query's usage counter, returning the new count.
    ///
    /// Usage is bookkeeping, not an edit, so `updated_at` stays put.
    pub fn record_usage(&self, id: Uuid) -> Result<u64> {
        let mut doc = self.write();
        let record = doc
            .queries
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| Self::missing_query(id))?;

        record.usage_count += 1;
        let count = record.usage_count;
        self.persist(&doc)?;
        Ok(count)
    }

    /// Snapshot of every query in insertion order.
    pub fn all_queries(&self) -> Vec<QueryRecord> {
        self.read().queries.clone()
    }

    /// Queries sorted by category then key, the browse-mode ordering.
    pub fn queries_default_order(&self) -> Vec<QueryRecord> {
        let mut queries = self.all_queries();
        queries.sort_by(|a, b| {
            a.category
                .to_lowercase()
                .cmp(&b.category.to_lowercase())
                .then_with(|| a.key.to_lowercase().cmp(&b.key.to_lowercase()))
        });
        queries
    }

    /// Queries in one category, sorted by key.
    pub fn queries_in_category(&self, category: &str) -> Vec<QueryRecord> {
        let category_lower = category.to_lowercase();
        let mut queries: Vec<QueryRecord> = self
            .read()
            .queries
            .iter()
            .filter(|q| q.category.to_lowercase() == category_lower)
            .cloned()
            .collect();
        queries.sort_by(|a, b| a.key.to_lowercase().cmp(&b.key.to_lowercase()));
        queries
    }

    /// Number of stored queries.
    pub fn query_count(&self) -> usize {
        self.read().queries.len()
    }

    /// Per-category record counts, sorted by name.
    pub fn categories(&self) -> Vec<CategorySummary> {
        let doc = self.read();
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for query in &doc.queries {
            *counts.entry(query.category.to_lowercase()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(name, query_count)| CategorySummary { name, query_count })
            .collect()
    }

    // Mappings

    /// Add a log mapping. Service names are unique, case-insensitively.
    pub fn add_mapping(
        &self,
        service: &str,
        source_category: &str,
        notes: Option<String>,
    ) -> Result<LogMapping> {
        validate_mapping(service, source_category).to_result()?;

        let service_lower = service.to_lowercase();
        let mut doc = self.write();
        if doc
            .mappings
            .iter()
            .any(|m| m.service.to_lowercase() == service_lower)
        {
            return Err(Error::new(
                ErrorCode::DuplicateKey,
                format!("A mapping for service '{}' already exists", service),
            )
            .with_suggestion("Remove the existing mapping first"));
        }

        let mapping = LogMapping::new(service, source_category, notes);
        doc.mappings.push(mapping.clone());
        self.persist(&doc)?;
        Ok(mapping)
    }

    /// Remove a mapping by service name, returning the removed entry.
    pub fn remove_mapping(&self, service: &str) -> Result<LogMapping> {
        let service_lower = service.to_lowercase();
        let mut doc = self.write();
        let index = doc
            .mappings
            .iter()
            .position(|m| m.service.to_lowercase() == service_lower)
            .ok_or_else(|| {
                Error::new(
                    ErrorCode::MappingNotFound,
                    format!("No mapping for service '{}'", service),
                )
                .with_suggestion("Run `querydeck mapping list` to see configured services")
            })?;

        let removed = doc.mappings.remove(index);
        self.persist(&doc)?;
        Ok(removed)
    }

    /// All mappings sorted by service name.
    pub fn mappings(&self) -> Vec<LogMapping> {
        let mut mappings = self.read().mappings.clone();
        mappings.sort_by(|a, b| a.service.to_lowercase().cmp(&b.service.to_lowercase()));
        mappings
    }

    /// Look up the mapping for a service, case-insensitively.
    pub fn mapping_for(&self, service: &str) -> Option<LogMapping> {
        let service_lower = service.to_lowercase();
        self.read()
            .mappings
            .iter()
            .find(|m| m.service.to_lowercase() == service_lower)
            .cloned()
    }

    // Helpers

    fn read(&self) -> RwLockReadGuard<'_, LibraryDoc> {
        self.doc.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, LibraryDoc> {
        self.doc.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_doc(path: &Path) -> Result<LibraryDoc> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| Error::store_corrupted(path).with_source(e))
    }

    fn persist(&self, doc: &LibraryDoc) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn missing_query(id: Uuid) -> Error {
        Error::new(ErrorCode::QueryNotFound, format!("No query with id {}", id))
            .with_suggestion("Run `querydeck list` to see available queries")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (LibraryStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = LibraryStore::open(temp_dir.path().join("library.json")).unwrap();
        (store, temp_dir)
    }

    fn sample(category: &str, key: &str) -> NewQuery {
        NewQuery {
            category: category.to_string(),
            key: key.to_string(),
            query: "_sourceCategory=prod/app | count".to_string(),
            tags: vec!["sample".to_string()],
        }
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let (store, _temp) = test_store();
        assert_eq!(store.query_count(), 0);
        assert!(store.mappings().is_empty());
    }

    #[test]
    fn test_add_and_get() {
        let (store, _temp) = test_store();

        let record = store.add_query(sample("errors", "recent errors")).unwrap();
        let fetched = store.get(record.id).unwrap();

        assert_eq!(fetched.key, "recent errors");
        assert_eq!(fetched.category, "errors");
    }

    #[test]
    fn test_add_rejects_duplicate_key_in_category() {
        let (store, _temp) = test_store();

        store.add_query(sample("auth", "Login Tracking")).unwrap();
        let err = store.add_query(sample("auth", "login tracking")).unwrap_err();

        assert_eq!(err.code, ErrorCode::DuplicateKey);
    }

    #[test]
    fn test_add_allows_same_key_across_categories() {
        let (store, _temp) = test_store();

        store.add_query(sample("auth", "recent errors")).unwrap();
        store.add_query(sample("errors", "recent errors")).unwrap();

        assert_eq!(store.query_count(), 2);
    }

    #[test]
    fn test_add_rejects_invalid_record() {
        let (store, _temp) = test_store();

        let err = store.add_query(sample("auth", "")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_changes_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("library.json");

        let record = {
            let store = LibraryStore::open(&path).unwrap();
            store.add_query(sample("errors", "recent errors")).unwrap()
        };

        let reopened = LibraryStore::open(&path).unwrap();
        assert_eq!(reopened.get(record.id).unwrap().key, "recent errors");
    }

    #[test]
    fn test_update_query_applies_patch() {
        let (store, _temp) = test_store();
        let record = store.add_query(sample("errors", "recent errors")).unwrap();

        let updated = store
            .update_query(
                record.id,
                QueryPatch {
                    query: Some("_sourceCategory=prod/* error | count by module".to_string()),
                    tags: Some(vec!["triage".to_string()]),
                    ..QueryPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.key, "recent errors");
        assert!(updated.query.contains("count by module"));
        assert_eq!(updated.tags, vec!["triage"]);
        assert!(updated.updated_at >= record.updated_at);
    }

    #[test]
    fn test_update_rejects_colliding_key() {
        let (store, _temp) = test_store();
        store.add_query(sample("errors", "recent errors")).unwrap();
        let other = store.add_query(sample("errors", "slow endpoints")).unwrap();

        let err = store
            .update_query(
                other.id,
                QueryPatch {
                    key: Some("Recent Errors".to_string()),
                    ..QueryPatch::default()
                },
            )
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::DuplicateKey);
    }

    #[test]
    fn test_remove_query() {
        let (store, _temp) = test_store();
        let record = store.add_query(sample("errors", "recent errors")).unwrap();

        let removed = store.remove_query(record.id).unwrap();
        assert_eq!(removed.id, record.id);
        assert_eq!(store.query_count(), 0);

        let err = store.remove_query(record.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::QueryNotFound);
    }

    #[test]
    fn test_record_usage_increments_without_touching_updated_at() {
        let (store, _temp) = test_store();
        let record = store.add_query(sample("errors", "recent errors")).unwrap();

        assert_eq!(store.record_usage(record.id).unwrap(), 1);
        assert_eq!(store.record_usage(record.id).unwrap(), 2);

        let fetched = store.get(record.id).unwrap();
        assert_eq!(fetched.usage_count, 2);
        assert_eq!(fetched.updated_at, record.updated_at);
    }

    #[test]
    fn test_find_by_key_requires_category_when_ambiguous() {
        let (store, _temp) = test_store();
        store.add_query(sample("auth", "recent errors")).unwrap();
        store.add_query(sample("errors", "recent errors")).unwrap();

        let err = store.find_by_key("recent errors", None).unwrap_err();
        assert!(err.message.contains("2 categories"));

        let found = store
            .find_by_key("recent errors", Some("auth"))
            .unwrap()
            .unwrap();
        assert_eq!(found.category, "auth");
    }

    #[test]
    fn test_resolve_accepts_id_or_key() {
        let (store, _temp) = test_store();
        let record = store.add_query(sample("errors", "recent errors")).unwrap();

        let by_id = store.resolve(&record.id.to_string(), None).unwrap();
        assert_eq!(by_id.id, record.id);

        let by_key = store.resolve("Recent Errors", None).unwrap();
        assert_eq!(by_key.id, record.id);

        let err = store.resolve("no such query", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::QueryNotFound);
    }

    #[test]
    fn test_default_order_sorts_category_then_key() {
        let (store, _temp) = test_store();
        store.add_query(sample("latency", "slow endpoints")).unwrap();
        store.add_query(sample("auth", "login tracking")).unwrap();
        store.add_query(sample("auth", "failed logins")).unwrap();

        let ordered = store.queries_default_order();
        let keys: Vec<&str> = ordered.iter().map(|q| q.key.as_str()).collect();

        assert_eq!(keys, ["failed logins", "login tracking", "slow endpoints"]);
    }

    #[test]
    fn test_categories_rollup() {
        let (store, _temp) = test_store();
        store.add_query(sample("auth", "login tracking")).unwrap();
        store.add_query(sample("Auth", "failed logins")).unwrap();
        store.add_query(sample("errors", "recent errors")).unwrap();

        let summaries = store.categories();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "auth");
        assert_eq!(summaries[0].query_count, 2);
    }

    #[test]
    fn test_mapping_crud() {
        let (store, _temp) = test_store();

        store
            .add_mapping("checkout", "prod/checkout", Some("payments team".to_string()))
            .unwrap();

        let err = store.add_mapping("Checkout", "prod/other", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateKey);

        let found = store.mapping_for("CHECKOUT").unwrap();
        assert_eq!(found.source_category, "prod/checkout");

        let removed = store.remove_mapping("checkout").unwrap();
        assert_eq!(removed.service, "checkout");

        let err = store.remove_mapping("checkout").unwrap_err();
        assert_eq!(err.code, ErrorCode::MappingNotFound);
    }

    #[test]
    fn test_initialize_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("library.json");

        LibraryStore::initialize(&path, LibraryDoc::default()).unwrap();
        let err = LibraryStore::initialize(&path, LibraryDoc::default()).unwrap_err();

        assert_eq!(err.code, ErrorCode::LibraryError);
    }

    #[test]
    fn test_corrupt_store_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("library.json");
        fs::write(&path, "{ not json").unwrap();

        let err = LibraryStore::open(&path).unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreCorrupted);
        assert!(err.message.contains("library.json"));
    }

    #[test]
    fn test_persist_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/data/library.json");

        let store = LibraryStore::open(&path).unwrap();
        store.add_query(sample("errors", "recent errors")).unwrap();

        assert!(path.exists());
    }
}
