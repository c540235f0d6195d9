//! Search query model and canonical cache keys

use crate::models::PinColor;
use crate::store::{FilterColumn, SortColumn, SortDirection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{Display, EnumString};

/// Default page size when a query carries no pagination
pub const DEFAULT_LIMIT: usize = 20;

/// Field to sort by
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortField {
    #[default]
    Relevance,
    Name,
    Company,
    Role,
    UpdatedAt,
}

impl SortField {
    /// The literal store column for non-relevance sorts
    pub fn column(self) -> Option<SortColumn> {
        match self {
            SortField::Relevance => None,
            SortField::Name => Some(SortColumn::Name),
            SortField::Company => Some(SortColumn::Company),
            SortField::Role => Some(SortColumn::Role),
            SortField::UpdatedAt => Some(SortColumn::UpdatedAt),
        }
    }
}

/// Sorting criteria
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SearchSort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Field filters: ANDed across fields, ORed within a field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Filter by pin colors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_color: Option<Vec<PinColor>>,

    /// Filter by companies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Vec<String>>,

    /// Filter by roles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Vec<String>>,
}

impl SearchFilters {
    /// Non-empty filters as store column predicates, in a fixed field order
    /// with sorted, deduplicated values
    pub fn columns(&self) -> Vec<(FilterColumn, Vec<String>)> {
        let pin_colors = self
            .pin_color
            .as_ref()
            .map(|colors| colors.iter().map(|c| c.to_string()).collect::<Vec<_>>());

        [
            (FilterColumn::PinColor, pin_colors),
            (FilterColumn::Company, self.company.clone()),
            (FilterColumn::Role, self.role.clone()),
        ]
        .into_iter()
        .filter_map(|(column, values)| {
            let mut values = values?;
            values.sort();
            values.dedup();
            (!values.is_empty()).then_some((column, values))
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns().is_empty()
    }
}

/// Main search query structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free text, possibly empty
    #[serde(default)]
    pub text: String,

    /// Field filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,

    /// Sorting criteria; relevance / descending when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SearchSort>,

    /// Pagination; limit 20 / offset 0 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Filter by pin colors
    pub fn with_pin_colors(mut self, colors: Vec<PinColor>) -> Self {
        self.filters.get_or_insert_with(Default::default).pin_color = Some(colors);
        self
    }

    /// Filter by companies
    pub fn with_companies(mut self, companies: Vec<impl Into<String>>) -> Self {
        self.filters.get_or_insert_with(Default::default).company =
            Some(companies.into_iter().map(Into::into).collect());
        self
    }

    /// Filter by roles
    pub fn with_roles(mut self, roles: Vec<impl Into<String>>) -> Self {
        self.filters.get_or_insert_with(Default::default).role =
            Some(roles.into_iter().map(Into::into).collect());
        self
    }

    /// Set sorting
    pub fn with_sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort = Some(SearchSort::new(field, direction));
        self
    }

    /// Set the pagination window
    pub fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.pagination = Some(Pagination { limit, offset });
        self
    }

    /// Sorting with defaults applied
    pub fn effective_sort(&self) -> SearchSort {
        self.sort.unwrap_or_default()
    }

    /// Pagination with defaults applied
    pub fn effective_pagination(&self) -> Pagination {
        self.pagination.unwrap_or_default()
    }

    /// Copy of this query with sort and pagination spelled out and the page
    /// size clamped to `max_limit`
    pub fn resolve(&self, default_limit: usize, max_limit: usize) -> SearchQuery {
        let pagination = self.pagination.unwrap_or(Pagination {
            limit: default_limit,
            offset: 0,
        });

        SearchQuery {
            text: self.text.clone(),
            filters: self.filters.clone(),
            sort: Some(self.effective_sort()),
            pagination: Some(Pagination {
                limit: pagination.limit.min(max_limit),
                offset: pagination.offset,
            }),
        }
    }

    /// Non-empty field filters as store predicates
    pub fn filter_columns(&self) -> Vec<(FilterColumn, Vec<String>)> {
        self.filters
            .as_ref()
            .map(SearchFilters::columns)
            .unwrap_or_default()
    }

    /// Canonical cache key.
    ///
    /// Semantically identical queries produce the same key: text is trimmed
    /// and lowercased, filter values are sorted and deduplicated, empty
    /// filter lists count as absent, and default sort/pagination are spelled
    /// out.
    pub fn cache_key(&self) -> String {
        let canonical = CanonicalQuery {
            text: self.text.trim().to_lowercase(),
            filters: self.filter_columns(),
            sort: self.effective_sort(),
            pagination: self.effective_pagination(),
        };

        // Serializing plain strings, enums and integers cannot fail
        let encoded = serde_json::to_vec(&canonical).unwrap_or_default();
        format!("{:x}", Sha256::digest(&encoded))
    }
}

#[derive(Serialize)]
struct CanonicalQuery {
    text: String,
    filters: Vec<(FilterColumn, Vec<String>)>,
    sort: SearchSort,
    pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_builder() {
        let query = SearchQuery::new("designer")
            .with_pin_colors(vec![PinColor::Cherry, PinColor::Teal])
            .with_companies(vec!["Tech Corp"])
            .with_sort(SortField::Name, SortDirection::Asc)
            .with_page(50, 10);

        assert_eq!(query.text, "designer");
        assert_eq!(query.effective_pagination().limit, 50);
        assert_eq!(query.effective_pagination().offset, 10);
        assert_eq!(query.filter_columns().len(), 2);
    }

    #[test]
    fn test_defaults() {
        let query = SearchQuery::new("");
        assert_eq!(query.effective_sort().field, SortField::Relevance);
        assert_eq!(query.effective_sort().direction, SortDirection::Desc);
        assert_eq!(query.effective_pagination(), Pagination { limit: 20, offset: 0 });
    }

    #[test]
    fn test_cache_key_ignores_filter_order() {
        let a = SearchQuery::new("dev").with_pin_colors(vec![PinColor::Cherry, PinColor::Teal]);
        let b = SearchQuery::new("dev").with_pin_colors(vec![PinColor::Teal, PinColor::Cherry]);
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_resolves_defaults() {
        let implicit = SearchQuery::new("  Dev ");
        let explicit = SearchQuery::new("dev")
            .with_sort(SortField::Relevance, SortDirection::Desc)
            .with_page(20, 0)
            .with_roles(Vec::<String>::new());
        assert_eq!(implicit.cache_key(), explicit.cache_key());
    }

    #[test]
    fn test_resolve_clamps_and_fills_defaults() {
        let resolved = SearchQuery::new("dev").resolve(30, 100);
        assert_eq!(resolved.effective_pagination(), Pagination { limit: 30, offset: 0 });
        assert!(resolved.sort.is_some());

        let clamped = SearchQuery::new("dev").with_page(500, 40).resolve(20, 100);
        assert_eq!(clamped.effective_pagination(), Pagination { limit: 100, offset: 40 });
    }

    #[test]
    fn test_cache_key_distinguishes_queries() {
        let base = SearchQuery::new("dev");
        assert_ne!(base.cache_key(), SearchQuery::new("ops").cache_key());
        assert_ne!(base.cache_key(), base.clone().with_page(20, 20).cache_key());
        assert_ne!(
            base.cache_key(),
            base.clone().with_roles(vec!["Developer"]).cache_key()
        );
    }

    #[test]
    fn test_query_deserializes_wire_names() {
        let json = r#"{
            "text": "dev",
            "filters": { "pin_color": ["cherry", "teal"] },
            "sort": { "field": "updated_at", "direction": "asc" },
            "pagination": { "limit": 10, "offset": 30 }
        }"#;

        let query: SearchQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.effective_sort().field, SortField::UpdatedAt);
        assert_eq!(query.effective_sort().direction, SortDirection::Asc);
        assert_eq!(
            query.filter_columns(),
            vec![(
                FilterColumn::PinColor,
                vec!["cherry".to_string(), "teal".to_string()]
            )]
        );
    }
}
