//! Primary query building and execution

use crate::models::Member;
use crate::search::error::SearchError;
use crate::search::normalizer::{normalize, TokenQuery};
use crate::search::query::{SearchQuery, SortField};
use crate::store::{MemberQuery, MemberStore, OrderBy, RowRange, SortColumn, SortDirection};
use std::sync::Arc;

/// Order used when relevance is requested but there is no text to rank by
pub const RELEVANCE_FALLBACK: OrderBy = OrderBy::Column {
    column: SortColumn::UpdatedAt,
    direction: SortDirection::Desc,
};

/// One executed page
#[derive(Debug, Clone, Default)]
pub struct ExecutedPage {
    pub members: Vec<Member>,

    /// Total matches before pagination
    pub total: u64,
}

/// Translates a [`SearchQuery`] into a store read and runs it
pub struct QueryExecutor {
    store: Arc<dyn MemberStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn MemberStore>) -> Self {
        Self { store }
    }

    /// Build the store query for a resolved search query.
    ///
    /// Visibility is always constrained. The text predicate is only added
    /// when normalization leaves at least one term.
    pub fn build(query: &SearchQuery) -> MemberQuery {
        let text = text_predicate(&query.text);
        let mut member_query = MemberQuery::new().visible_only().count_exact();

        for (column, values) in query.filter_columns() {
            member_query = member_query.filter_in(column, values);
        }

        let sort = query.effective_sort();
        let order = match (sort.field, &text) {
            (SortField::Relevance, Some(_)) => OrderBy::TextRank,
            (SortField::Relevance, None) => RELEVANCE_FALLBACK,
            (field, _) => match field.column() {
                Some(column) => OrderBy::Column {
                    column,
                    direction: sort.direction,
                },
                None => RELEVANCE_FALLBACK,
            },
        };
        member_query = member_query.order(order);

        let pagination = query.effective_pagination();
        let window = RowRange::window(pagination.offset, pagination.limit);
        member_query = member_query.range(window.from, window.to);

        if let Some(text) = text {
            member_query = member_query.text_search(text);
        }

        member_query
    }

    /// Run the primary read; any store fault comes back as an error value
    pub async fn execute(&self, query: &SearchQuery) -> Result<ExecutedPage, SearchError> {
        let member_query = Self::build(query);
        let page = self.store.select_members(&member_query).await?;

        let total = page.total.unwrap_or(page.members.len() as u64);
        Ok(ExecutedPage {
            members: page.members,
            total,
        })
    }
}

/// The text predicate shared by the primary read and facet aggregation
pub(crate) fn text_predicate(raw: &str) -> Option<TokenQuery> {
    normalize(raw).non_empty()
}
