use pinboard_search::{
    models::{Member, PinColor, Visibility},
    search::normalize,
    store::{
        FilterColumn, InMemoryMemberStore, MemberQuery, MemberStore, OrderBy, SortColumn,
        SortDirection, StoreError, TantivyMemberStore,
    },
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;

const HEAP: usize = 50_000_000;

fn create_members() -> Vec<Member> {
    let now = Utc::now();
    vec![
        Member::new("Ada Lovelace")
            .with_role("Developer")
            .with_company("Tech Corp")
            .with_bio("Wrote the first program")
            .with_pin_color(PinColor::Teal)
            .with_updated_at(now - Duration::minutes(3)),
        Member::new("Grace Hopper")
            .with_role("Developer")
            .with_company("Navy Labs")
            .with_pin_color(PinColor::Cherry)
            .with_updated_at(now - Duration::minutes(1)),
        Member::new("Alan Turing")
            .with_role("Researcher")
            .with_pin_color(PinColor::Lavender)
            .with_updated_at(now - Duration::minutes(2)),
        Member::new("Private Person")
            .with_role("Developer")
            .with_company("Tech Corp")
            .with_visibility(Visibility::Private),
    ]
}

fn names(members: &[Member]) -> Vec<&str> {
    members.iter().map(|m| m.name.as_str()).collect()
}

/// Test suite that runs against any MemberStore implementation
async fn test_store_operations<S: MemberStore + 'static>(store: Arc<S>) {
    assert_eq!(store.upsert_members(&create_members()).await.unwrap(), 4);
    assert_eq!(store.member_count().await.unwrap(), 4);

    // Visibility
    let page = store
        .select_members(&MemberQuery::new().visible_only().count_exact())
        .await
        .unwrap();
    assert_eq!(page.total, Some(3));
    assert!(page.members.iter().all(|m| m.is_public()));

    // Prefix text search over several fields
    let query = MemberQuery::new()
        .visible_only()
        .text_search(normalize("dev"))
        .count_exact();
    let page = store.select_members(&query).await.unwrap();
    assert_eq!(page.total, Some(2));
    let mut found = names(&page.members);
    found.sort();
    assert_eq!(found, vec!["Ada Lovelace", "Grace Hopper"]);

    // Every token must match
    let query = MemberQuery::new()
        .visible_only()
        .text_search(normalize("ada program"));
    let page = store.select_members(&query).await.unwrap();
    assert_eq!(names(&page.members), vec!["Ada Lovelace"]);

    // Filters
    let query = MemberQuery::new()
        .visible_only()
        .filter_in(FilterColumn::Company, vec!["Tech Corp".to_string()])
        .count_exact();
    let page = store.select_members(&query).await.unwrap();
    assert_eq!(names(&page.members), vec!["Ada Lovelace"]);

    let query = MemberQuery::new().visible_only().filter_in(
        FilterColumn::PinColor,
        vec!["cherry".to_string(), "lavender".to_string()],
    );
    assert_eq!(store.select_members(&query).await.unwrap().members.len(), 2);

    // Ordering with the count independent of the window
    let query = MemberQuery::new()
        .visible_only()
        .order(OrderBy::Column {
            column: SortColumn::UpdatedAt,
            direction: SortDirection::Desc,
        })
        .range(0, 1)
        .count_exact();
    let page = store.select_members(&query).await.unwrap();
    assert_eq!(names(&page.members), vec!["Grace Hopper", "Alan Turing"]);
    assert_eq!(page.total, Some(3));

    // Missing companies sort last in either direction
    for direction in [SortDirection::Asc, SortDirection::Desc] {
        let query = MemberQuery::new().visible_only().order(OrderBy::Column {
            column: SortColumn::Company,
            direction,
        });
        let page = store.select_members(&query).await.unwrap();
        assert_eq!(page.members.last().unwrap().name, "Alan Turing");
    }

    // Projections
    let facet_rows = store
        .select_facet_rows(&MemberQuery::new().visible_only())
        .await
        .unwrap();
    assert_eq!(facet_rows.len(), 3);
    let label_rows = store
        .select_label_rows(&MemberQuery::new().visible_only().range(0, 0))
        .await
        .unwrap();
    assert_eq!(label_rows.len(), 1);

    // Replace and delete
    let mut ada = create_members().remove(0);
    let ada_id = page_member_id(store.as_ref(), "Ada Lovelace").await;
    ada.id = ada_id;
    ada.role = Some("Mathematician".to_string());
    store.upsert_member(&ada).await.unwrap();
    assert_eq!(store.member_count().await.unwrap(), 4);

    store.delete_member(&ada_id).await.unwrap();
    assert_eq!(store.member_count().await.unwrap(), 3);
    assert!(matches!(
        store.delete_member(&ada_id).await,
        Err(StoreError::NotFound(_))
    ));

    // Invalid members are rejected
    let invalid = Member::new("");
    assert!(matches!(
        store.upsert_member(&invalid).await,
        Err(StoreError::Validation(_))
    ));
}

async fn page_member_id<S: MemberStore + ?Sized>(store: &S, name: &str) -> uuid::Uuid {
    let page = store
        .select_members(&MemberQuery::new().text_search(normalize(name)))
        .await
        .unwrap();
    page.members
        .into_iter()
        .find(|m| m.name == name)
        .map(|m| m.id)
        .unwrap()
}

#[tokio::test]
async fn test_in_memory_store() {
    test_store_operations(Arc::new(InMemoryMemberStore::new())).await;
}

#[tokio::test]
async fn test_tantivy_store_in_ram() {
    test_store_operations(Arc::new(TantivyMemberStore::in_ram(HEAP).unwrap())).await;
}

#[tokio::test]
async fn test_tantivy_store_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    test_store_operations(Arc::new(
        TantivyMemberStore::open(temp_dir.path(), HEAP).unwrap(),
    ))
    .await;
}

#[tokio::test]
async fn test_tantivy_store_reopens_existing_index() {
    let temp_dir = TempDir::new().unwrap();

    {
        let store = TantivyMemberStore::open(temp_dir.path(), HEAP).unwrap();
        store.upsert_members(&create_members()).await.unwrap();
    }

    let store = TantivyMemberStore::open(temp_dir.path(), HEAP).unwrap();
    assert_eq!(store.member_count().await.unwrap(), 4);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_documents, 4);
    assert!(stats.index_size_bytes > 0);
}

#[tokio::test]
async fn test_backends_agree_on_column_order() {
    let memory = InMemoryMemberStore::new();
    let tantivy = TantivyMemberStore::in_ram(HEAP).unwrap();
    let members = create_members();
    memory.upsert_members(&members).await.unwrap();
    tantivy.upsert_members(&members).await.unwrap();

    let query = MemberQuery::new().visible_only().order(OrderBy::Column {
        column: SortColumn::Name,
        direction: SortDirection::Asc,
    });
    let from_memory = memory.select_members(&query).await.unwrap();
    let from_tantivy = tantivy.select_members(&query).await.unwrap();

    let ids = |members: &[Member]| members.iter().map(|m| m.id).collect::<Vec<_>>();
    assert_eq!(names(&from_memory.members), names(&from_tantivy.members));
    assert_eq!(ids(&from_memory.members), ids(&from_tantivy.members));
}

#[tokio::test]
async fn test_backends_agree_on_overlong_words() {
    let memory = InMemoryMemberStore::new();
    let tantivy = TantivyMemberStore::in_ram(HEAP).unwrap();
    let long_word = format!("pneumono{}", "x".repeat(40));
    let members = vec![
        Member::new("Ada Lovelace").with_bio(format!("Studies {}", long_word)),
        Member::new("Grace Hopper").with_bio("Studies compilers"),
    ];
    memory.upsert_members(&members).await.unwrap();
    tantivy.upsert_members(&members).await.unwrap();

    for text in ["pneumono", long_word.as_str()] {
        let query = MemberQuery::new().text_search(normalize(text)).count_exact();
        let from_memory = memory.select_members(&query).await.unwrap();
        let from_tantivy = tantivy.select_members(&query).await.unwrap();
        assert_eq!(from_memory.total, from_tantivy.total, "text: {text}");
    }

    let query = MemberQuery::new().text_search(normalize("studies")).count_exact();
    assert_eq!(memory.select_members(&query).await.unwrap().total, Some(2));
    assert_eq!(tantivy.select_members(&query).await.unwrap().total, Some(2));
}
