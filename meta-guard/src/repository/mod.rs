//! Constraint repository framework for storing discovered constraint collections.
//!
//! Collections are stored whole and addressed by the [`CollectionId`] the
//! repository assigns on save. Backends implement [`ConstraintRepository`];
//! [`InMemoryConstraintRepository`] is the reference backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::catalog::SchemaId;
use crate::constraints::ConstraintCollection;
use crate::error::{MetaError, Result};

pub mod in_memory;

pub use in_memory::InMemoryConstraintRepository;

/// Identifier of a stored constraint collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(u64);

impl CollectionId {
    /// Wraps a raw id.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "collection-{}", self.0)
    }
}

/// Trait for implementing constraint storage backends.
///
/// # Example
///
/// ```rust
/// use meta_guard::catalog::ColumnId;
/// use meta_guard::constraints::{ConstraintCollection, PartialInclusionDependency};
/// use meta_guard::repository::{ConstraintRepository, InMemoryConstraintRepository};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let repository = InMemoryConstraintRepository::new();
///
/// let mut inds = ConstraintCollection::new("unary INDs");
/// inds.add(PartialInclusionDependency::unary(ColumnId::new(1), ColumnId::new(2), 0.0, 10).unwrap());
/// let id = repository.save(inds.clone()).await.unwrap();
///
/// assert_eq!(repository.get(id).await.unwrap(), Some(inds));
/// repository.delete(id).await.unwrap();
/// assert!(!repository.exists(id).await.unwrap());
/// # })
/// ```
#[async_trait]
pub trait ConstraintRepository: Send + Sync {
    /// Stores a collection and returns its newly assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is invalid or cannot be stored.
    async fn save(&self, collection: ConstraintCollection) -> Result<CollectionId>;

    /// Loads a collection; `None` if no collection has this id.
    async fn get(&self, id: CollectionId) -> Result<Option<ConstraintCollection>>;

    /// Deletes a collection.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::NotFound`] if no collection has this id.
    async fn delete(&self, id: CollectionId) -> Result<()>;

    /// Lists the ids of all stored collections in ascending order.
    ///
    /// This method is optional and may not be implemented by all backends.
    async fn list_ids(&self) -> Result<Vec<CollectionId>> {
        Err(MetaError::NotSupported(
            "list_ids not implemented for this repository".to_string(),
        ))
    }

    /// Checks if a collection exists.
    async fn exists(&self, id: CollectionId) -> Result<bool> {
        let ids = self.list_ids().await?;
        Ok(ids.contains(&id))
    }

    /// Ids of the collections whose scope includes `schema`.
    async fn find_by_scope(&self, schema: SchemaId) -> Result<Vec<CollectionId>> {
        let mut matching = Vec::new();
        for id in self.list_ids().await? {
            if let Some(collection) = self.get(id).await? {
                if collection.scope.contains(&schema) {
                    matching.push(id);
                }
            }
        }
        Ok(matching)
    }

    /// Returns metadata about the repository.
    async fn metadata(&self) -> Result<RepositoryMetadata> {
        Ok(RepositoryMetadata::default())
    }
}

/// Metadata about a constraint repository.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RepositoryMetadata {
    /// The type of repository backend (e.g., "in_memory").
    pub backend_type: Option<String>,

    /// Number of stored collections.
    pub total_collections: Option<usize>,

    /// Number of constraints across all collections.
    pub total_constraints: Option<usize>,

    /// Repository-specific configuration.
    pub config: HashMap<String, String>,

    /// Last modification timestamp.
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

impl RepositoryMetadata {
    /// Creates a new repository metadata instance.
    pub fn new(backend_type: impl Into<String>) -> Self {
        Self {
            backend_type: Some(backend_type.into()),
            ..Default::default()
        }
    }

    /// Sets the number of collections.
    pub fn with_total_collections(mut self, count: usize) -> Self {
        self.total_collections = Some(count);
        self
    }

    /// Sets the number of constraints.
    pub fn with_total_constraints(mut self, count: usize) -> Self {
        self.total_constraints = Some(count);
        self
    }

    /// Adds a configuration parameter.
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_metadata_builder() {
        let metadata = RepositoryMetadata::new("in_memory")
            .with_total_collections(3)
            .with_total_constraints(120)
            .with_config("capacity", "unbounded");

        assert_eq!(metadata.backend_type, Some("in_memory".to_string()));
        assert_eq!(metadata.total_collections, Some(3));
        assert_eq!(metadata.total_constraints, Some(120));
        assert_eq!(
            metadata.config.get("capacity"),
            Some(&"unbounded".to_string())
        );
    }

    #[test]
    fn test_collection_id_display() {
        let id = CollectionId::new(7);
        assert_eq!(id.to_string(), "collection-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }
}
