//! Saved-query library for Querydeck
//!
//! This crate owns the query library itself:
//!
//! - **Records**: saved queries and service-to-source-category log mappings
//! - **Store**: a single JSON document behind a `RwLock`, rewritten through
//!   a temp-file rename on every mutation
//! - **Search**: input hygiene plus delegation to `querydeck-search` ranking
//! - **Suggestions**: parsing assistant replies into structured suggestions
//! - **Seed data**: the starter library written by `querydeck init`
//!
//! # Example
//!
//! ```rust,no_run
//! use querydeck_library::{search_queries, LibraryStore};
//!
//! fn main() -> querydeck_core::Result<()> {
//!     let store = LibraryStore::open("library.json")?;
//!     for result in search_queries(&store, "login", 10) {
//!         println!("{:.0}%  {}", result.score * 100.0, result.item.key);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod search;
pub mod seed;
pub mod store;
pub mod suggest;
pub mod types;

pub use search::{browse_queries, search_queries, MAX_TERM_LENGTH};
pub use store::LibraryStore;
pub use suggest::{parse_suggestion, QuerySuggestion, SuggestError};
pub use types::{
    parse_tag_list, CategorySummary, LibraryDoc, LogMapping, NewQuery, QueryPatch, QueryRecord,
};
