//! Destinations for flushed analytics batches

use crate::analytics::error::AnalyticsResult;
use crate::analytics::event::SearchEvent;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Entries kept in each "top" list of a summary
const TOP_N: usize = 10;

/// Receives batches of events from the analytics task
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn flush(&self, events: Vec<SearchEvent>) -> AnalyticsResult<()>;
}

/// Sink that writes each batch to the log
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

#[async_trait]
impl AnalyticsSink for TracingSink {
    async fn flush(&self, events: Vec<SearchEvent>) -> AnalyticsResult<()> {
        for event in &events {
            info!(
                session_id = %event.session_id,
                query = %event.query,
                results = event.results_count,
                search_time_ms = event.search_time_ms,
                clicked = event.result_clicked,
                "Search event"
            );
        }
        Ok(())
    }
}

/// A value and how often it occurred
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: u64,
}

/// Aggregate view over tracked events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_searches: u64,
    pub unique_queries: u64,
    pub average_results: f64,
    pub average_search_time_ms: f64,
    pub popular_queries: Vec<ValueCount>,
    pub popular_filters: Vec<ValueCount>,

    /// Clicks per search
    pub click_through_rate: f64,
    pub zero_result_queries: Vec<ValueCount>,
}

impl AnalyticsSummary {
    /// Summarize a set of events
    pub fn from_events(events: &[SearchEvent]) -> Self {
        let (clicks, searches): (Vec<_>, Vec<_>) =
            events.iter().partition(|event| event.result_clicked);

        if searches.is_empty() {
            return Self::default();
        }

        let total = searches.len() as f64;
        let unique: HashSet<String> = searches.iter().map(|e| query_key(e)).collect();

        Self {
            total_searches: searches.len() as u64,
            unique_queries: unique.len() as u64,
            average_results: searches.iter().map(|e| e.results_count as f64).sum::<f64>() / total,
            average_search_time_ms: searches.iter().map(|e| e.search_time_ms).sum::<f64>() / total,
            popular_queries: top_counts(searches.iter().map(|e| query_key(e))),
            popular_filters: top_counts(
                searches
                    .iter()
                    .flat_map(|e| e.filters_used.iter().cloned()),
            ),
            click_through_rate: clicks.len() as f64 / total,
            zero_result_queries: top_counts(
                searches
                    .iter()
                    .filter(|e| e.results_count == 0)
                    .map(|e| query_key(e)),
            ),
        }
    }
}

fn query_key(event: &SearchEvent) -> String {
    event.query.trim().to_lowercase()
}

fn top_counts(values: impl Iterator<Item = String>) -> Vec<ValueCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for value in values.filter(|v| !v.is_empty()) {
        *counts.entry(value).or_default() += 1;
    }

    let mut ranked: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount { value, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    ranked.truncate(TOP_N);
    ranked
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct InMemorySink {
    events: RwLock<Vec<SearchEvent>>,
    batches: RwLock<Vec<usize>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SearchEvent> {
        self.events.read().clone()
    }

    /// Sizes of the batches received, in arrival order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.read().clone()
    }

    pub fn summary(&self) -> AnalyticsSummary {
        AnalyticsSummary::from_events(&self.events.read())
    }

    /// Most frequent queries, most popular first
    pub fn popular_searches(&self, limit: usize) -> Vec<String> {
        self.summary()
            .popular_queries
            .into_iter()
            .take(limit)
            .map(|entry| entry.value)
            .collect()
    }
}

#[async_trait]
impl AnalyticsSink for InMemorySink {
    async fn flush(&self, events: Vec<SearchEvent>) -> AnalyticsResult<()> {
        self.batches.write().push(events.len());
        self.events.write().extend(events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn search(query: &str, results: u64, filters: &[&str]) -> SearchEvent {
        SearchEvent::search(
            "session",
            query,
            results,
            10.0,
            filters.iter().map(|f| f.to_string()).collect(),
        )
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(AnalyticsSummary::from_events(&[]), AnalyticsSummary::default());
    }

    #[test]
    fn test_summary() {
        let events = vec![
            search("Developer", 4, &["pin_color:teal"]),
            search("developer ", 2, &["pin_color:teal", "role:Designer"]),
            search("unicorn", 0, &[]),
            SearchEvent::click("session", "developer", 0, Uuid::new_v4()),
        ];

        let summary = AnalyticsSummary::from_events(&events);
        assert_eq!(summary.total_searches, 3);
        assert_eq!(summary.unique_queries, 2);
        assert_eq!(summary.average_results, 2.0);
        assert_eq!(summary.popular_queries[0], ValueCount { value: "developer".to_string(), count: 2 });
        assert_eq!(summary.popular_filters[0].value, "pin_color:teal");
        assert_eq!(summary.zero_result_queries.len(), 1);
        assert!((summary.click_through_rate - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_in_memory_sink() {
        let sink = InMemorySink::new();
        sink.flush(vec![search("ada", 1, &[]), search("ada", 1, &[])])
            .await
            .unwrap();
        sink.flush(vec![search("grace", 1, &[])]).await.unwrap();

        assert_eq!(sink.batch_sizes(), vec![2, 1]);
        assert_eq!(sink.popular_searches(1), vec!["ada"]);
    }
}
