//! Autocomplete suggestions from a bounded member sample

use crate::metrics::SEARCH_DEGRADED_TOTAL;
use crate::search::executor::RELEVANCE_FALLBACK;
use crate::store::{LabelRow, MemberQuery, MemberStore, RowRange};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

/// Produces ranked suggestion strings.
///
/// The candidate pool is a bounded sample of visible members, so results are
/// approximate rather than exhaustive.
pub struct SuggestionEngine {
    store: Arc<dyn MemberStore>,
    sample_size: usize,
    max_suggestions: usize,
    min_chars: usize,
}

impl SuggestionEngine {
    pub fn new(
        store: Arc<dyn MemberStore>,
        sample_size: usize,
        max_suggestions: usize,
        min_chars: usize,
    ) -> Self {
        Self {
            store,
            sample_size,
            max_suggestions,
            min_chars,
        }
    }

    /// Suggestions for raw input; empty on short input or store failure
    pub async fn suggest(&self, raw: &str) -> Vec<String> {
        let term = raw.trim().to_lowercase();
        if term.chars().count() < self.min_chars || self.sample_size == 0 {
            return Vec::new();
        }

        let sample = RowRange::window(0, self.sample_size);
        let sample_query = MemberQuery::new()
            .visible_only()
            .order(RELEVANCE_FALLBACK)
            .range(sample.from, sample.to);

        match self.store.select_label_rows(&sample_query).await {
            Ok(rows) => rank_candidates(&rows, &term, self.max_suggestions),
            Err(e) => {
                SEARCH_DEGRADED_TOTAL.with_label_values(&["suggestions"]).inc();
                warn!(error = %e, "Suggestion lookup failed, returning no suggestions");
                Vec::new()
            }
        }
    }
}

/// Collect every name/role/company containing `term` (already lowercased),
/// then rank prefix matches first and order each tier lexically.
pub fn rank_candidates(rows: &[LabelRow], term: &str, max: usize) -> Vec<String> {
    let mut candidates = BTreeSet::new();

    for row in rows {
        let values = std::iter::once(row.name.as_str())
            .chain(row.role.as_deref())
            .chain(row.company.as_deref());

        for value in values {
            if value.to_lowercase().contains(term) {
                candidates.insert(value.to_string());
            }
        }
    }

    let mut ranked: Vec<String> = candidates.into_iter().collect();
    ranked.sort_by(|a, b| {
        let a_lower = a.to_lowercase();
        let b_lower = b.to_lowercase();

        match (a_lower.starts_with(term), b_lower.starts_with(term)) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a_lower.cmp(&b_lower).then_with(|| a.cmp(b)),
        }
    });
    ranked.truncate(max);
    ranked
}
