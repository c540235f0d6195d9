//! Facet aggregation over the searched population

use crate::metrics::SEARCH_DEGRADED_TOTAL;
use crate::search::executor::text_predicate;
use crate::search::query::SearchQuery;
use crate::store::{FacetRow, MemberQuery, MemberStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Facet count result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub name: String,
    pub count: u64,
}

impl FacetCount {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Grouped counts by company, role and pin color
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetSummary {
    pub companies: Vec<FacetCount>,
    pub roles: Vec<FacetCount>,
    pub pin_colors: Vec<FacetCount>,
}

/// Computes facets for a search query.
///
/// Facets re-apply visibility and the text predicate but ignore the field
/// filters, so callers can pivot to other values.
pub struct FacetAggregator {
    store: Arc<dyn MemberStore>,
    top_n: usize,
}

impl FacetAggregator {
    pub fn new(store: Arc<dyn MemberStore>, top_n: usize) -> Self {
        Self { store, top_n }
    }

    /// Facets for the query, or `None` when the store read fails
    pub async fn facets(&self, query: &SearchQuery) -> Option<FacetSummary> {
        let mut facet_query = MemberQuery::new().visible_only();
        if let Some(text) = text_predicate(&query.text) {
            facet_query = facet_query.text_search(text);
        }

        match self.store.select_facet_rows(&facet_query).await {
            Ok(rows) => Some(summarize(&rows, self.top_n)),
            Err(e) => {
                SEARCH_DEGRADED_TOTAL.with_label_values(&["facets"]).inc();
                warn!(error = %e, "Facet aggregation failed, returning no facets");
                None
            }
        }
    }
}

/// Build the three facet lists in a single pass over the rows.
///
/// Lists are sorted by count descending, ties by name ascending. Company and
/// role lists keep the first `top_n` entries; pin colors are never truncated.
pub fn summarize(rows: &[FacetRow], top_n: usize) -> FacetSummary {
    let mut companies: HashMap<&str, u64> = HashMap::new();
    let mut roles: HashMap<&str, u64> = HashMap::new();
    let mut pin_colors: HashMap<String, u64> = HashMap::new();

    for row in rows {
        if let Some(company) = row.company.as_deref().filter(|c| !c.is_empty()) {
            *companies.entry(company).or_default() += 1;
        }
        if let Some(role) = row.role.as_deref().filter(|r| !r.is_empty()) {
            *roles.entry(role).or_default() += 1;
        }
        *pin_colors.entry(row.pin_color.to_string()).or_default() += 1;
    }

    let mut companies = ranked(companies.into_iter().map(|(k, v)| (k.to_string(), v)));
    companies.truncate(top_n);

    let mut roles = ranked(roles.into_iter().map(|(k, v)| (k.to_string(), v)));
    roles.truncate(top_n);

    FacetSummary {
        companies,
        roles,
        pin_colors: ranked(pin_colors.into_iter()),
    }
}

fn ranked(counts: impl Iterator<Item = (String, u64)>) -> Vec<FacetCount> {
    let mut counts: Vec<FacetCount> = counts
        .map(|(name, count)| FacetCount { name, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    counts
}
