//! Backing member store capability
//!
//! The search core only needs a queryable collection of members supporting:
//!
//! - equality / inclusion filters
//! - a ranked text-search predicate
//! - ordering by an arbitrary column
//! - row-range pagination
//! - an exact match count independent of the page window
//!
//! [`MemberStore`] is that capability. [`MemberQuery`] describes one read in
//! backend-neutral terms; each backend translates it into its own query
//! language. Two backends ship with the crate: [`InMemoryMemberStore`] and
//! [`TantivyMemberStore`].

mod document;
mod error;
mod factory;
mod index;
mod memory;

pub use document::{build_member_schema, MemberDocument};
pub use error::{StoreError, StoreResult};
pub use factory::create_store;
pub use index::{IndexStats, TantivyMemberStore};
pub use memory::InMemoryMemberStore;

use crate::models::{Member, PinColor};
use crate::search::TokenQuery;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::{Display, EnumString};
use uuid::Uuid;

/// Trait for member storage and retrieval
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Fetch full member rows for the query window, plus the exact total
    /// match count when [`MemberQuery::count_exact`] is set
    async fn select_members(&self, query: &MemberQuery) -> StoreResult<MemberPage>;

    /// Fetch only the facetable columns of every row matching the query
    async fn select_facet_rows(&self, query: &MemberQuery) -> StoreResult<Vec<FacetRow>>;

    /// Fetch only the label columns (name, role, company) of matching rows
    async fn select_label_rows(&self, query: &MemberQuery) -> StoreResult<Vec<LabelRow>>;

    /// Insert or replace a member
    async fn upsert_member(&self, member: &Member) -> StoreResult<()>;

    /// Insert or replace many members
    async fn upsert_members(&self, members: &[Member]) -> StoreResult<usize> {
        for member in members {
            self.upsert_member(member).await?;
        }
        Ok(members.len())
    }

    /// Delete a member by id
    async fn delete_member(&self, id: &Uuid) -> StoreResult<()>;

    /// Number of stored members, regardless of visibility
    async fn member_count(&self) -> StoreResult<u64>;
}

/// Columns that support "value in set" filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FilterColumn {
    PinColor,
    Company,
    Role,
}

/// Columns a store can order by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortColumn {
    Name,
    Company,
    Role,
    CreatedAt,
    UpdatedAt,
}

/// Sort direction
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Ordering applied by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    /// Text-search rank, most relevant first
    TextRank,

    /// A literal column in the given direction
    Column {
        column: SortColumn,
        direction: SortDirection,
    },
}

/// Inclusive row range `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub from: usize,
    pub to: usize,
}

impl RowRange {
    /// Range covering `limit` rows starting at `offset`; `limit` must be > 0
    pub fn window(offset: usize, limit: usize) -> Self {
        Self {
            from: offset,
            to: offset.saturating_add(limit.saturating_sub(1)),
        }
    }

    /// Number of rows covered
    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.to < self.from
    }
}

/// A "column in set" predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub column: FilterColumn,
    pub values: Vec<String>,
}

impl FieldFilter {
    /// Check a member against this predicate
    pub fn matches(&self, member: &Member) -> bool {
        match self.column {
            FilterColumn::PinColor => {
                let color = member.pin_color.to_string();
                self.values.iter().any(|v| *v == color)
            }
            FilterColumn::Company => member
                .company
                .as_ref()
                .is_some_and(|company| self.values.iter().any(|v| v == company)),
            FilterColumn::Role => member
                .role
                .as_ref()
                .is_some_and(|role| self.values.iter().any(|v| v == role)),
        }
    }
}

/// Backend-neutral description of a single read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberQuery {
    /// Restrict to public members
    pub visible_only: bool,

    /// Ranked text-search predicate
    pub text: Option<TokenQuery>,

    /// Field filters, ANDed together
    pub filters: Vec<FieldFilter>,

    /// Requested ordering
    pub order: Option<OrderBy>,

    /// Requested row window
    pub range: Option<RowRange>,

    /// Whether the exact pre-pagination count is required
    pub count_exact: bool,
}

impl MemberQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible_only(mut self) -> Self {
        self.visible_only = true;
        self
    }

    pub fn text_search(mut self, text: TokenQuery) -> Self {
        self.text = Some(text);
        self
    }

    pub fn filter_in(mut self, column: FilterColumn, values: Vec<String>) -> Self {
        self.filters.push(FieldFilter { column, values });
        self
    }

    pub fn order(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    /// Restrict to the inclusive row range `[from, to]`
    pub fn range(mut self, from: usize, to: usize) -> Self {
        self.range = Some(RowRange { from, to });
        self
    }

    pub fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    /// Check the non-text predicates (visibility and field filters)
    pub fn matches_filters(&self, member: &Member) -> bool {
        if self.visible_only && !member.is_public() {
            return false;
        }
        self.filters.iter().all(|filter| filter.matches(member))
    }
}

/// One page of full member rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberPage {
    pub members: Vec<Member>,

    /// Exact total match count, when requested
    pub total: Option<u64>,
}

/// Facetable columns of a member row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetRow {
    pub company: Option<String>,
    pub role: Option<String>,
    pub pin_color: PinColor,
}

impl From<&Member> for FacetRow {
    fn from(member: &Member) -> Self {
        Self {
            company: member.company.clone(),
            role: member.role.clone(),
            pin_color: member.pin_color,
        }
    }
}

/// Label columns of a member row, used for suggestions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRow {
    pub name: String,
    pub role: Option<String>,
    pub company: Option<String>,
}

impl From<&Member> for LabelRow {
    fn from(member: &Member) -> Self {
        Self {
            name: member.name.clone(),
            role: member.role.clone(),
            company: member.company.clone(),
        }
    }
}

/// A matching member with its text-search score
#[derive(Debug, Clone)]
pub(crate) struct ScoredMember {
    pub member: Member,
    pub score: f32,
}

/// Order scored rows the same way in every backend.
///
/// Missing column values sort last in both directions and ties fall back to
/// the member id. Rank ties fall back to most recently updated.
pub(crate) fn sort_scored(rows: &mut [ScoredMember], order: Option<OrderBy>) {
    match order {
        Some(OrderBy::TextRank) => rows.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.member.updated_at.cmp(&a.member.updated_at))
                .then_with(|| a.member.id.cmp(&b.member.id))
        }),
        Some(OrderBy::Column { column, direction }) => rows.sort_by(|a, b| {
            compare_column(&a.member, &b.member, column, direction)
                .then_with(|| a.member.id.cmp(&b.member.id))
        }),
        None => rows.sort_by(|a, b| a.member.id.cmp(&b.member.id)),
    }
}

fn compare_column(a: &Member, b: &Member, column: SortColumn, direction: SortDirection) -> Ordering {
    let directed = |ordering: Ordering| match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    };

    match column {
        SortColumn::Name => directed(compare_text(&a.name, &b.name)),
        SortColumn::Company => compare_optional(a.company.as_deref(), b.company.as_deref(), directed),
        SortColumn::Role => compare_optional(a.role.as_deref(), b.role.as_deref(), directed),
        SortColumn::CreatedAt => directed(a.created_at.cmp(&b.created_at)),
        SortColumn::UpdatedAt => directed(a.updated_at.cmp(&b.updated_at)),
    }
}

fn compare_optional(
    a: Option<&str>,
    b: Option<&str>,
    directed: impl Fn(Ordering) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(compare_text(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Keep only the rows inside the requested range
pub(crate) fn apply_range<T>(rows: Vec<T>, range: Option<RowRange>) -> Vec<T> {
    match range {
        Some(range) if !range.is_empty() => {
            rows.into_iter().skip(range.from).take(range.len()).collect()
        }
        Some(_) => Vec::new(),
        None => rows,
    }
}
