//! Tantivy-backed member store

use super::document::{build_member_schema, MemberDocument, MemberFields};
use super::{
    apply_range, sort_scored, FacetRow, FieldFilter, FilterColumn, LabelRow, MemberPage,
    MemberQuery, MemberStore, ScoredMember, StoreError, StoreResult,
};
use crate::models::{Member, Visibility};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{AllQuery, BooleanQuery, ConstScoreQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of documents in the index
    pub total_documents: u64,

    /// Index size in bytes; zero for RAM indexes
    pub index_size_bytes: u64,

    /// Number of segments
    pub num_segments: usize,

    /// Last commit timestamp
    pub last_commit: Option<DateTime<Utc>>,
}

/// Member store over a Tantivy index.
///
/// Every write commits and reloads the reader before returning, so reads
/// always observe completed writes.
pub struct TantivyMemberStore {
    index: Index,
    fields: MemberFields,
    writer: Arc<RwLock<IndexWriter>>,
    reader: IndexReader,
    index_path: Option<PathBuf>,
    last_commit: Mutex<Option<DateTime<Utc>>>,
}

impl TantivyMemberStore {
    /// Open the index at `path`, creating it when missing
    pub fn open(path: impl AsRef<Path>, writer_heap_size: usize) -> StoreResult<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(|e| {
            StoreError::IndexInit(format!("Failed to create index directory: {}", e))
        })?;

        let index = if Self::index_exists(path) {
            Index::open_in_dir(path).map_err(|e| {
                StoreError::IndexInit(format!("Failed to open existing index: {}", e))
            })?
        } else {
            Index::create_in_dir(path, build_member_schema()).map_err(|e| {
                StoreError::IndexInit(format!("Failed to create new index: {}", e))
            })?
        };

        info!(path = %path.display(), "Opened member index");
        Self::from_index(index, Some(path.to_path_buf()), writer_heap_size)
    }

    /// Create a throwaway index held entirely in memory
    pub fn in_ram(writer_heap_size: usize) -> StoreResult<Self> {
        let index = Index::create_in_ram(build_member_schema());
        Self::from_index(index, None, writer_heap_size)
    }

    fn from_index(
        index: Index,
        index_path: Option<PathBuf>,
        writer_heap_size: usize,
    ) -> StoreResult<Self> {
        let fields = MemberFields::resolve(&index.schema())?;

        let writer = index
            .writer(writer_heap_size)
            .map_err(|e| StoreError::IndexInit(format!("Failed to create writer: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| StoreError::IndexInit(format!("Failed to create reader: {}", e)))?;

        Ok(Self {
            index,
            fields,
            writer: Arc::new(RwLock::new(writer)),
            reader,
            index_path,
            last_commit: Mutex::new(None),
        })
    }

    /// Check if an index exists at the given path
    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    fn commit(&self, writer: &mut IndexWriter) -> StoreResult<()> {
        writer.commit()?;
        self.reader.reload()?;
        *self.last_commit.lock() = Some(Utc::now());
        Ok(())
    }

    /// Drop every operation staged since the last commit
    fn discard_staged(&self, writer: &mut IndexWriter) {
        if let Err(e) = writer.rollback() {
            warn!(error = %e, "Failed to roll back staged index operations");
        }
    }

    fn id_term(&self, id: &Uuid) -> Term {
        Term::from_field_text(self.fields.id, &id.to_string())
    }

    /// Remove every member from the index
    pub async fn clear(&self) -> StoreResult<()> {
        let mut writer = self.writer.write().await;
        writer.delete_all_documents()?;
        self.commit(&mut writer)
    }

    /// Get index statistics
    pub async fn stats(&self) -> StoreResult<IndexStats> {
        let searcher = self.reader.searcher();

        let index_size_bytes = self
            .index_path
            .as_ref()
            .and_then(|path| std::fs::read_dir(path).ok())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.metadata().ok())
                    .map(|m| m.len())
                    .sum()
            })
            .unwrap_or(0);

        Ok(IndexStats {
            total_documents: searcher.num_docs(),
            index_size_bytes,
            num_segments: searcher.segment_readers().len(),
            last_commit: *self.last_commit.lock(),
        })
    }

    /// Translate the backend-neutral query into a Tantivy query
    fn build_query(&self, query: &MemberQuery) -> Box<dyn Query> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        if query.visible_only {
            let public = exact_term(self.fields.visibility, &Visibility::Public.to_string());
            clauses.push((Occur::Must, Box::new(ConstScoreQuery::new(public, 0.0))));
        }

        for filter in &query.filters {
            let any_value = self.filter_query(filter);
            clauses.push((Occur::Must, Box::new(ConstScoreQuery::new(any_value, 0.0))));
        }

        if let Some(text) = &query.text {
            for token in text.terms() {
                clauses.push((Occur::Must, self.token_query(token)));
            }
        }

        if clauses.is_empty() {
            Box::new(AllQuery)
        } else {
            Box::new(BooleanQuery::new(clauses))
        }
    }

    fn filter_query(&self, filter: &FieldFilter) -> Box<dyn Query> {
        let field = match filter.column {
            FilterColumn::PinColor => self.fields.pin_color,
            FilterColumn::Company => self.fields.company_exact,
            FilterColumn::Role => self.fields.role_exact,
        };

        let alternatives = filter
            .values
            .iter()
            .map(|value| (Occur::Should, exact_term(field, value)))
            .collect();
        Box::new(BooleanQuery::new(alternatives))
    }

    /// One token: an exact word hit (scored) or a prefix hit, in any text field
    fn token_query(&self, token: &str) -> Box<dyn Query> {
        let mut alternatives: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        for field in self.fields.text_fields() {
            let term = Term::from_field_text(field, token);
            alternatives.push((
                Occur::Should,
                Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs)),
            ));
            alternatives.push((
                Occur::Should,
                Box::new(FuzzyTermQuery::new_prefix(term, 0, true)),
            ));
        }

        Box::new(BooleanQuery::new(alternatives))
    }

    /// Every matching member with its score, in the requested order
    fn matching(&self, query: &MemberQuery) -> StoreResult<Vec<ScoredMember>> {
        let searcher = self.reader.searcher();
        let tantivy_query = self.build_query(query);

        let count = searcher.search(&*tantivy_query, &Count)?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let top_docs = searcher.search(&*tantivy_query, &TopDocs::with_limit(count))?;
        let mut rows = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            let document = MemberDocument::from_tantivy_doc(&doc, &self.fields)?;
            rows.push(ScoredMember {
                member: document.member,
                score,
            });
        }

        sort_scored(&mut rows, query.order);
        debug!(matches = rows.len(), "Index query executed");
        Ok(rows)
    }
}

fn exact_term(field: Field, value: &str) -> Box<dyn Query> {
    Box::new(TermQuery::new(
        Term::from_field_text(field, value),
        IndexRecordOption::Basic,
    ))
}

#[async_trait]
impl MemberStore for TantivyMemberStore {
    async fn select_members(&self, query: &MemberQuery) -> StoreResult<MemberPage> {
        let rows = self.matching(query)?;
        let total = query.count_exact.then_some(rows.len() as u64);
        let members = apply_range(rows, query.range)
            .into_iter()
            .map(|row| row.member)
            .collect();

        Ok(MemberPage { members, total })
    }

    async fn select_facet_rows(&self, query: &MemberQuery) -> StoreResult<Vec<FacetRow>> {
        let rows = apply_range(self.matching(query)?, query.range);
        Ok(rows.iter().map(|row| FacetRow::from(&row.member)).collect())
    }

    async fn select_label_rows(&self, query: &MemberQuery) -> StoreResult<Vec<LabelRow>> {
        let rows = apply_range(self.matching(query)?, query.range);
        Ok(rows.iter().map(|row| LabelRow::from(&row.member)).collect())
    }

    async fn upsert_member(&self, member: &Member) -> StoreResult<()> {
        self.upsert_members(std::slice::from_ref(member)).await?;
        Ok(())
    }

    async fn upsert_members(&self, members: &[Member]) -> StoreResult<usize> {
        for member in members {
            validator::Validate::validate(member)?;
        }

        let mut writer = self.writer.write().await;
        for member in members {
            let document = MemberDocument::from(member);
            writer.delete_term(self.id_term(&member.id));
            if let Err(e) = writer.add_document(document.to_tantivy_doc(&self.fields)) {
                // The staged delete must not reach the next commit
                self.discard_staged(&mut writer);
                return Err(e.into());
            }
        }
        self.commit(&mut writer)?;

        debug!(count = members.len(), "Indexed members");
        Ok(members.len())
    }

    async fn delete_member(&self, id: &Uuid) -> StoreResult<()> {
        let searcher = self.reader.searcher();
        let existing = searcher.search(
            &TermQuery::new(self.id_term(id), IndexRecordOption::Basic),
            &Count,
        )?;
        if existing == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let mut writer = self.writer.write().await;
        writer.delete_term(self.id_term(id));
        self.commit(&mut writer)
    }

    async fn member_count(&self) -> StoreResult<u64> {
        Ok(self.reader.searcher().num_docs())
    }
}
