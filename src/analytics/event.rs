//! Search analytics events

use crate::search::{SearchQuery, SearchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One tracked search or result click
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEvent {
    pub query: String,
    pub results_count: u64,
    pub search_time_ms: f64,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,

    /// Active filters as `field:value` pairs
    #[serde(default)]
    pub filters_used: Vec<String>,

    #[serde(default)]
    pub result_clicked: bool,

    /// Zero-based position of the clicked result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_position: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<Uuid>,
}

impl SearchEvent {
    /// Event for an executed search
    pub fn search(
        session_id: impl Into<String>,
        query: impl Into<String>,
        results_count: u64,
        search_time_ms: f64,
        filters_used: Vec<String>,
    ) -> Self {
        Self {
            query: query.into(),
            results_count,
            search_time_ms,
            session_id: session_id.into(),
            timestamp: Utc::now(),
            filters_used,
            result_clicked: false,
            click_position: None,
            member_id: None,
        }
    }

    /// Event for a clicked result
    pub fn click(
        session_id: impl Into<String>,
        query: impl Into<String>,
        position: usize,
        member_id: Uuid,
    ) -> Self {
        Self {
            query: query.into(),
            results_count: 0,
            search_time_ms: 0.0,
            session_id: session_id.into(),
            timestamp: Utc::now(),
            filters_used: Vec::new(),
            result_clicked: true,
            click_position: Some(position),
            member_id: Some(member_id),
        }
    }

    /// Event describing a completed search call
    pub fn from_result(session_id: impl Into<String>, query: &SearchQuery, result: &SearchResult) -> Self {
        Self::search(
            session_id,
            query.text.trim(),
            result.total,
            result.search_time_ms,
            filters_used(query),
        )
    }
}

/// Active filters of a query as sorted `field:value` pairs
pub fn filters_used(query: &SearchQuery) -> Vec<String> {
    query
        .filter_columns()
        .into_iter()
        .flat_map(|(column, values)| {
            values
                .into_iter()
                .map(move |value| format!("{}:{}", column, value))
        })
        .collect()
}

/// New analytics session id: `search_<unix millis>_<random suffix>`
pub fn new_session_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("search_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
}
