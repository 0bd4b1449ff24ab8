//! Integration tests for the constraint repository framework.

use std::sync::Arc;

use meta_guard::catalog::SchemaId;
use meta_guard::constraints::{
    load_pinds, BatchErrorPolicy, ConstraintCollection, ConstraintKind, MinimalCover,
    RawInclusionDependency,
};
use meta_guard::repository::{ConstraintRepository, InMemoryConstraintRepository};
use meta_guard::test_fixtures::shop_fixture;

/// Stores the shop's minimal cover and statistics in one collection.
#[tokio::test]
async fn test_store_discovery_results() {
    let shop = shop_fixture().unwrap();
    let repo = InMemoryConstraintRepository::new();

    let schema = shop.catalog.schema_by_name("shop").unwrap().id();
    let mut collection = ConstraintCollection::new("shop discovery").with_scope(schema);
    collection.extend(MinimalCover::new().discard_trivial(true).compute(&shop.pinds));
    collection.extend(
        shop.catalog
            .schemas()
            .iter()
            .flat_map(|s| s.tables())
            .flat_map(|t| t.columns())
            .filter_map(|c| shop.statistics.get(c.id()).cloned()),
    );

    let id = repo.save(collection.clone()).await.unwrap();
    let loaded = repo.get(id).await.unwrap().unwrap();
    assert_eq!(loaded, collection);
    assert_eq!(loaded.inclusion_dependencies().count(), 4);
    assert_eq!(loaded.column_statistics().count(), 8);
    assert!(loaded
        .constraints
        .iter()
        .any(|c| c.kind() == ConstraintKind::ColumnStatistics));

    assert_eq!(repo.find_by_scope(schema).await.unwrap(), vec![id]);
    assert!(repo.find_by_scope(SchemaId::new(u32::MAX)).await.unwrap().is_empty());
}

/// Collections survive a JSON round trip through the upstream format.
#[tokio::test]
async fn test_collection_from_discovery_json() {
    let raw: Vec<RawInclusionDependency> = serde_json::from_str(
        r#"[
            {"dependent_column_ids": [1], "referenced_column_ids": [2], "error": 0.0, "dependent_size": 10},
            {"dependent_column_ids": [3, 1], "referenced_column_ids": [4, 2], "error": 0.0, "dependent_size": 10},
            {"dependent_column_ids": [1, 3], "referenced_column_ids": [2, 4], "error": 0.1, "dependent_size": 10}
        ]"#,
    )
    .unwrap();

    let loaded = load_pinds(raw, BatchErrorPolicy::SkipAndRecord).unwrap();
    assert_eq!(loaded.accepted.len(), 2);
    assert_eq!(loaded.rejected.len(), 1);

    let mut collection = ConstraintCollection::new("from upstream");
    collection.extend(loaded.accepted);

    let json = serde_json::to_string(&collection).unwrap();
    let restored: ConstraintCollection = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, collection);

    let repo = InMemoryConstraintRepository::new();
    let id = repo.save(restored).await.unwrap();
    assert!(repo.exists(id).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_saves_get_distinct_ids() {
    let repo = Arc::new(InMemoryConstraintRepository::new());

    let mut handles = Vec::new();
    for i in 0..16 {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            repo.save(ConstraintCollection::new(format!("run {i}")))
                .await
                .unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    assert_eq!(repo.list_ids().await.unwrap(), ids);

    let metadata = repo.metadata().await.unwrap();
    assert_eq!(metadata.total_collections, Some(16));
    assert_eq!(metadata.total_constraints, Some(0));
}

#[tokio::test]
async fn test_repository_as_trait_object() {
    let repo: Box<dyn ConstraintRepository> = Box::new(InMemoryConstraintRepository::new());
    let id = repo.save(ConstraintCollection::new("boxed")).await.unwrap();

    repo.delete(id).await.unwrap();
    assert!(repo.get(id).await.unwrap().is_none());
    assert!(repo.delete(id).await.is_err());
}
