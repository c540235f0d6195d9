//! Main search service implementation

use crate::metrics::{SEARCH_CACHE_ENTRIES, SEARCH_DURATION_SECONDS, SEARCH_REQUESTS_TOTAL};
use crate::models::Member;
use crate::search::cache::ResultCache;
use crate::search::config::SearchConfig;
use crate::search::error::SearchError;
use crate::search::executor::QueryExecutor;
use crate::search::facets::{FacetAggregator, FacetSummary};
use crate::search::query::SearchQuery;
use crate::search::suggest::SuggestionEngine;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// One page of search results with its metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matching members for the requested window
    pub members: Vec<Member>,

    /// Total matches before pagination
    pub total: u64,

    /// Whether another page exists after this one
    pub has_more: bool,

    /// Ranked autocomplete candidates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,

    /// Facet counts, absent when aggregation was disabled or degraded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<FacetSummary>,

    /// Search execution time in milliseconds
    pub search_time_ms: f64,
}

/// Response envelope handed to UI callers: exactly one side is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SearchResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<SearchResult, SearchError>> for SearchResponse {
    fn from(outcome: Result<SearchResult, SearchError>) -> Self {
        match outcome {
            Ok(result) => Self {
                data: Some(result),
                error: None,
            },
            Err(e) => Self {
                data: None,
                error: Some(e.user_message()),
            },
        }
    }
}

/// Main search service.
///
/// Owns its result cache; construct one per process and call
/// [`SearchService::shutdown`] when done.
pub struct SearchService {
    executor: QueryExecutor,
    facets: FacetAggregator,
    suggestions: SuggestionEngine,
    cache: ResultCache,
    config: SearchConfig,
}

impl SearchService {
    /// Create a new search service over a member store
    pub fn new(
        store: Arc<dyn crate::store::MemberStore>,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;

        info!(
            cache_ttl_secs = config.cache_ttl.as_secs(),
            sample_size = config.suggestion_sample_size,
            facets = config.enable_facets,
            suggestions = config.enable_suggestions,
            "Search service initialized"
        );

        Ok(Self {
            executor: QueryExecutor::new(store.clone()),
            facets: FacetAggregator::new(store.clone(), config.facet_top_n),
            suggestions: SuggestionEngine::new(
                store,
                config.suggestion_sample_size,
                config.max_suggestions,
                config.min_suggestion_chars,
            ),
            cache: ResultCache::new(config.cache_ttl),
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search for members.
    ///
    /// Identical queries within the cache TTL are answered from the cache
    /// without touching the store. Facet and suggestion faults degrade those
    /// parts of the result instead of failing the call.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult, SearchError> {
        let query = query.resolve(self.config.default_limit, self.config.max_limit);
        let pagination = query.effective_pagination();
        if pagination.limit == 0 {
            SEARCH_REQUESTS_TOTAL.with_label_values(&["error"]).inc();
            return Err(SearchError::InvalidQuery(
                "limit must be greater than zero".to_string(),
            ));
        }

        let cache_key = query.cache_key();
        if let Some(entry) = self.cache.get(&cache_key) {
            SEARCH_REQUESTS_TOTAL.with_label_values(&["hit"]).inc();
            debug!(cache_key = %cache_key, "Search cache hit");
            return Ok(entry.result);
        }
        debug!(cache_key = %cache_key, "Search cache miss");

        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.run_pipeline(&query))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(SearchError::Unexpected(panic_message(panic))));

        match outcome {
            Ok(mut result) => {
                let elapsed = started.elapsed();
                result.search_time_ms = elapsed.as_secs_f64() * 1000.0;
                SEARCH_DURATION_SECONDS.observe(elapsed.as_secs_f64());
                SEARCH_REQUESTS_TOTAL.with_label_values(&["miss"]).inc();

                self.cache.put(cache_key, result.clone());
                SEARCH_CACHE_ENTRIES.set(self.cache.len() as f64);

                debug!(
                    total = result.total,
                    returned = result.members.len(),
                    elapsed_ms = result.search_time_ms,
                    "Search completed"
                );
                Ok(result)
            }
            Err(e) => {
                SEARCH_REQUESTS_TOTAL.with_label_values(&["error"]).inc();
                error!(error = %e, "Search failed");
                Err(e)
            }
        }
    }

    /// Primary read, then facets and suggestions concurrently
    async fn run_pipeline(&self, query: &SearchQuery) -> Result<SearchResult, SearchError> {
        let page = self.executor.execute(query).await?;

        let facets = async {
            if self.config.enable_facets {
                self.facets.facets(query).await
            } else {
                None
            }
        };
        let suggestions = async {
            if self.config.enable_suggestions && !query.text.trim().is_empty() {
                Some(self.suggestions.suggest(&query.text).await)
            } else {
                None
            }
        };
        let (facets, suggestions) = tokio::join!(facets, suggestions);

        let pagination = query.effective_pagination();
        let has_more =
            (pagination.offset as u64).saturating_add(pagination.limit as u64) < page.total;

        Ok(SearchResult {
            members: page.members,
            total: page.total,
            has_more,
            suggestions,
            facets,
            search_time_ms: 0.0,
        })
    }

    /// Autocomplete suggestions for raw input, uncached
    pub async fn suggest(&self, raw: &str) -> Vec<String> {
        self.suggestions.suggest(raw).await
    }

    /// Facets for a query, uncached
    pub async fn facets(&self, query: &SearchQuery) -> Option<FacetSummary> {
        self.facets.facets(query).await
    }

    /// Drop every cached result
    pub fn clear_cache(&self) {
        self.cache.clear();
        SEARCH_CACHE_ENTRIES.set(0.0);
    }

    /// Remove expired cached results, returning how many were dropped
    pub fn sweep_cache(&self) -> usize {
        let removed = self.cache.sweep();
        SEARCH_CACHE_ENTRIES.set(self.cache.len() as f64);
        removed
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Release the cache and stop serving
    pub fn shutdown(self) {
        let entries = self.cache.len();
        self.clear_cache();
        info!(entries, "Search service shut down");
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic in search pipeline".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PinColor, Visibility};
    use crate::store::{InMemoryMemberStore, MemberStore};

    async fn create_test_service() -> SearchService {
        let store = Arc::new(InMemoryMemberStore::new());
        store
            .upsert_members(&[
                Member::new("Ada Lovelace")
                    .with_role("Engineer")
                    .with_company("Tech Corp"),
                Member::new("Grace Hopper")
                    .with_role("Developer")
                    .with_company("Tech Corp")
                    .with_pin_color(PinColor::Teal),
                Member::new("Devon Hidden")
                    .with_role("Developer")
                    .with_visibility(Visibility::Private),
            ])
            .await
            .unwrap();

        SearchService::new(store, SearchConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_search_excludes_private_members() {
        let service = create_test_service().await;

        let result = service.search(&SearchQuery::new("")).await.unwrap();
        assert_eq!(result.total, 2);
        assert!(!result.has_more);
        assert!(result.members.iter().all(Member::is_public));
    }

    #[tokio::test]
    async fn test_search_caches_results() {
        let service = create_test_service().await;
        let query = SearchQuery::new("tech");

        let first = service.search(&query).await.unwrap();
        assert_eq!(service.cache_len(), 1);

        let second = service.search(&query).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(service.cache_len(), 1);
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let service = create_test_service().await;

        let err = service
            .search(&SearchQuery::new("").with_page(0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
        assert_eq!(service.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_has_more() {
        let service = create_test_service().await;

        let result = service
            .search(&SearchQuery::new("").with_page(1, 0))
            .await
            .unwrap();
        assert_eq!(result.members.len(), 1);
        assert!(result.has_more);
    }

    #[tokio::test]
    async fn test_suggestions_only_with_text() {
        let service = create_test_service().await;

        let blank = service.search(&SearchQuery::new("  ")).await.unwrap();
        assert!(blank.suggestions.is_none());

        let typed = service.search(&SearchQuery::new("dev")).await.unwrap();
        assert_eq!(typed.suggestions, Some(vec!["Developer".to_string()]));
    }

    #[test]
    fn test_response_envelope() {
        let response = SearchResponse::from(Err(SearchError::Unexpected("boom".to_string())));
        assert!(response.data.is_none());
        assert_eq!(
            response.error.as_deref(),
            Some("An unexpected error occurred during search.")
        );
    }
}
