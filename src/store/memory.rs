//! In-memory member store

use super::{
    apply_range, sort_scored, FacetRow, LabelRow, MemberPage, MemberQuery, MemberStore,
    ScoredMember, StoreError, StoreResult,
};
use crate::models::Member;
use crate::search::{words, TokenQuery};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const NAME_WEIGHT: f32 = 4.0;
const ROLE_WEIGHT: f32 = 2.0;
const COMPANY_WEIGHT: f32 = 2.0;
const BIO_WEIGHT: f32 = 1.0;
const EXACT_WORD_BONUS: f32 = 1.0;

/// In-memory member store, suitable for tests and small deployments
#[derive(Clone, Default)]
pub struct InMemoryMemberStore {
    members: Arc<DashMap<Uuid, Member>>,
}

impl InMemoryMemberStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Matching members with their scores, in the requested order, before
    /// the row range is applied
    fn matching(&self, query: &MemberQuery) -> Vec<ScoredMember> {
        let mut rows: Vec<ScoredMember> = self
            .members
            .iter()
            .filter(|entry| query.matches_filters(entry.value()))
            .filter_map(|entry| {
                let member = entry.value();
                let score = match &query.text {
                    Some(text) => text_score(member, text)?,
                    None => 0.0,
                };
                Some(ScoredMember {
                    member: member.clone(),
                    score,
                })
            })
            .collect();

        sort_scored(&mut rows, query.order);
        rows
    }
}

/// Score a member against a token query, or `None` if some token matches
/// no word of any searchable field
fn text_score(member: &Member, text: &TokenQuery) -> Option<f32> {
    let fields: [(Option<&str>, f32); 4] = [
        (Some(member.name.as_str()), NAME_WEIGHT),
        (member.role.as_deref(), ROLE_WEIGHT),
        (member.company.as_deref(), COMPANY_WEIGHT),
        (member.bio.as_deref(), BIO_WEIGHT),
    ];
    let field_words: Vec<(Vec<String>, f32)> = fields
        .iter()
        .filter_map(|(value, weight)| value.map(|v| (words(v).collect(), *weight)))
        .collect();

    let mut score = 0.0;
    for term in text.terms() {
        let mut matched = false;
        for (field, weight) in &field_words {
            if field.iter().any(|word| word.starts_with(term.as_str())) {
                matched = true;
                score += weight;
                if field.iter().any(|word| word == term) {
                    score += EXACT_WORD_BONUS;
                }
            }
        }
        if !matched {
            return None;
        }
    }
    Some(score)
}

#[async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn select_members(&self, query: &MemberQuery) -> StoreResult<MemberPage> {
        let rows = self.matching(query);
        let total = query.count_exact.then_some(rows.len() as u64);
        let members = apply_range(rows, query.range)
            .into_iter()
            .map(|row| row.member)
            .collect();

        Ok(MemberPage { members, total })
    }

    async fn select_facet_rows(&self, query: &MemberQuery) -> StoreResult<Vec<FacetRow>> {
        let rows = apply_range(self.matching(query), query.range);
        Ok(rows.iter().map(|row| FacetRow::from(&row.member)).collect())
    }

    async fn select_label_rows(&self, query: &MemberQuery) -> StoreResult<Vec<LabelRow>> {
        let rows = apply_range(self.matching(query), query.range);
        Ok(rows.iter().map(|row| LabelRow::from(&row.member)).collect())
    }

    async fn upsert_member(&self, member: &Member) -> StoreResult<()> {
        member.validate()?;
        self.members.insert(member.id, member.clone());
        Ok(())
    }

    async fn delete_member(&self, id: &Uuid) -> StoreResult<()> {
        self.members
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn member_count(&self) -> StoreResult<u64> {
        Ok(self.members.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PinColor, Visibility};
    use crate::search::normalize;
    use crate::store::{FilterColumn, OrderBy};

    async fn seeded_store() -> InMemoryMemberStore {
        let store = InMemoryMemberStore::new();
        store
            .upsert_members(&[
                Member::new("Dev Patel").with_role("Designer"),
                Member::new("Ada Lovelace")
                    .with_role("Developer")
                    .with_company("Tech Corp"),
                Member::new("Sam Jones")
                    .with_role("Sales")
                    .with_bio("Former developer")
                    .with_pin_color(PinColor::Teal),
                Member::new("Hidden Dev").with_visibility(Visibility::Private),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_upsert_and_delete() {
        let store = InMemoryMemberStore::new();
        let member = Member::new("Ada");

        store.upsert_member(&member).await.unwrap();
        assert_eq!(store.member_count().await.unwrap(), 1);

        store.delete_member(&member.id).await.unwrap();
        assert_eq!(store.member_count().await.unwrap(), 0);
        assert!(matches!(
            store.delete_member(&member.id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_member_rejected() {
        let store = InMemoryMemberStore::new();
        let result = store.upsert_member(&Member::new("")).await;
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_prefix_text_search_ranks_name_first() {
        let store = seeded_store().await;
        let query = MemberQuery::new()
            .visible_only()
            .text_search(normalize("dev"))
            .order(OrderBy::TextRank)
            .count_exact();

        let page = store.select_members(&query).await.unwrap();
        assert_eq!(page.total, Some(3));

        let names: Vec<_> = page.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Dev Patel", "Ada Lovelace", "Sam Jones"]);
    }

    #[tokio::test]
    async fn test_every_token_must_match() {
        let store = seeded_store().await;
        let query = MemberQuery::new()
            .visible_only()
            .text_search(normalize("ada tech"))
            .count_exact();

        let page = store.select_members(&query).await.unwrap();
        assert_eq!(page.total, Some(1));
    }

    #[tokio::test]
    async fn test_total_ignores_range() {
        let store = seeded_store().await;
        let query = MemberQuery::new().visible_only().count_exact().range(0, 0);

        let page = store.select_members(&query).await.unwrap();
        assert_eq!(page.members.len(), 1);
        assert_eq!(page.total, Some(3));
    }

    #[tokio::test]
    async fn test_facet_rows_apply_filters() {
        let store = seeded_store().await;
        let query = MemberQuery::new()
            .visible_only()
            .filter_in(FilterColumn::PinColor, vec!["teal".to_string()]);

        let rows = store.select_facet_rows(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role.as_deref(), Some("Sales"));
    }
}
