//! Member search: query normalization, caching, ranking and faceting
//!
//! This module sits in front of any [`MemberStore`](crate::store::MemberStore)
//! and provides:
//!
//! - **Query Normalization**: raw text to an AND-of-prefix token query
//! - **Result Caching**: point-in-time memoization keyed by canonical queries
//! - **Execution**: visibility, filters, sort and row-range pagination
//! - **Faceted Search**: counts by company, role and pin color
//! - **Suggestions**: ranked autocomplete candidates from a bounded sample
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           Search Service                         │
//! ├─────────────────────────────────────────────────┤
//! │  cache lookup ─▶ executor ─▶ facets + suggest    │
//! │                  (primary)    (concurrent)       │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │           MemberStore                            │
//! ├─────────────────────────────────────────────────┤
//! │  InMemoryMemberStore  │  TantivyMemberStore      │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pinboard_search::search::{SearchConfig, SearchQuery, SearchService};
//! use pinboard_search::store::InMemoryMemberStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryMemberStore::new());
//!     let search = SearchService::new(store, SearchConfig::default())?;
//!
//!     let query = SearchQuery::new("front-end dev")
//!         .with_roles(vec!["Developer"])
//!         .with_page(20, 0);
//!
//!     let results = search.search(&query).await?;
//!     println!("Found {} members", results.total);
//!
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod error;
mod executor;
mod facets;
mod normalizer;
mod query;
mod service;
mod suggest;

pub use cache::{CacheEntry, ResultCache};
pub use config::{SearchConfig, SearchConfigBuilder};
pub use error::{SearchError, STORE_FAILURE_MESSAGE, UNEXPECTED_FAILURE_MESSAGE};
pub use executor::{ExecutedPage, QueryExecutor, RELEVANCE_FALLBACK};
pub use facets::{summarize as summarize_facets, FacetAggregator, FacetCount, FacetSummary};
pub use normalizer::{normalize, TokenQuery, AND_OPERATOR, MAX_WORD_BYTES, PREFIX_MARKER};
pub(crate) use normalizer::words;
pub use query::{Pagination, SearchFilters, SearchQuery, SearchSort, SortField, DEFAULT_LIMIT};
pub use service::{SearchResponse, SearchResult, SearchService};
pub use suggest::{rank_candidates, SuggestionEngine};
