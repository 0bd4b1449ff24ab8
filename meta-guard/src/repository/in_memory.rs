//! In-memory implementation of ConstraintRepository for testing and development.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::constraints::ConstraintCollection;
use crate::error::{MetaError, Result};

use super::{CollectionId, ConstraintRepository, RepositoryMetadata};

#[derive(Debug, Default)]
struct Store {
    collections: BTreeMap<CollectionId, ConstraintCollection>,
    next_id: u64,
}

/// In-memory implementation of the ConstraintRepository trait.
///
/// Ids are assigned in ascending order starting at 1 and never reused.
/// Clones share the same storage.
#[derive(Clone)]
pub struct InMemoryConstraintRepository {
    /// Storage for collections, keyed by id.
    storage: Arc<RwLock<Store>>,

    /// Repository metadata.
    metadata: Arc<RwLock<RepositoryMetadata>>,
}

impl InMemoryConstraintRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        let metadata = RepositoryMetadata::new("in_memory")
            .with_total_collections(0)
            .with_total_constraints(0);
        Self {
            storage: Arc::new(RwLock::new(Store {
                collections: BTreeMap::new(),
                next_id: 1,
            })),
            metadata: Arc::new(RwLock::new(metadata)),
        }
    }

    /// Returns the number of stored collections.
    pub async fn size(&self) -> usize {
        self.storage.read().await.collections.len()
    }

    /// Removes every collection; ids are not reused afterwards.
    pub async fn clear(&self) {
        self.storage.write().await.collections.clear();
        self.update_metadata().await;
    }

    /// Updates repository metadata after changes.
    async fn update_metadata(&self) {
        let store = self.storage.read().await;
        let mut metadata = self.metadata.write().await;

        metadata.total_collections = Some(store.collections.len());
        metadata.total_constraints = Some(store.collections.values().map(|c| c.len()).sum());
        metadata.last_modified = Some(chrono::Utc::now());
    }
}

impl Default for InMemoryConstraintRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConstraintRepository for InMemoryConstraintRepository {
    #[instrument(skip(self, collection), fields(constraints = collection.len(), repository_type = "in_memory"))]
    async fn save(&self, collection: ConstraintCollection) -> Result<CollectionId> {
        if collection.description.trim().is_empty() {
            return Err(MetaError::invalid_argument(
                "constraint collection description must not be blank",
            ));
        }

        let mut store = self.storage.write().await;
        let id = CollectionId::new(store.next_id);
        store.next_id += 1;
        store.collections.insert(id, collection);
        drop(store);

        self.update_metadata().await;
        debug!(%id, "Stored constraint collection");
        Ok(id)
    }

    #[instrument(skip(self), fields(repository_type = "in_memory"))]
    async fn get(&self, id: CollectionId) -> Result<Option<ConstraintCollection>> {
        let store = self.storage.read().await;
        Ok(store.collections.get(&id).cloned())
    }

    #[instrument(skip(self), fields(repository_type = "in_memory"))]
    async fn delete(&self, id: CollectionId) -> Result<()> {
        let mut store = self.storage.write().await;

        if store.collections.remove(&id).is_none() {
            return Err(MetaError::not_found("constraint collection", id.to_string()));
        }

        drop(store);
        self.update_metadata().await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_ids(&self) -> Result<Vec<CollectionId>> {
        let store = self.storage.read().await;
        Ok(store.collections.keys().copied().collect())
    }

    #[instrument(skip(self), fields(repository_type = "in_memory"))]
    async fn exists(&self, id: CollectionId) -> Result<bool> {
        let store = self.storage.read().await;
        Ok(store.collections.contains_key(&id))
    }

    #[instrument(skip(self))]
    async fn metadata(&self) -> Result<RepositoryMetadata> {
        Ok(self.metadata.read().await.clone())
    }
}
