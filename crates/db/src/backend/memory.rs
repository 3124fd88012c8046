//! In-process document store backend.
//!
//! Categories are kept as documents keyed by id. There are no foreign keys
//! or unique indexes: referential integrity comes entirely from the shared
//! validation in the repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use hearth_core::error::CoreError;
use hearth_core::types::{DbId, Timestamp};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{ActiveFilter, CategoryBackend, FamilyTxn};
use crate::models::category::Category;

type Documents = HashMap<DbId, Category>;

/// Document store holding every family's categories in memory.
///
/// Cloning is cheap and clones share the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    documents: Arc<Mutex<Documents>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document as-is, bypassing every check.
    ///
    /// Meant for loading fixtures and imported data.
    pub async fn put_unchecked(&self, category: Category) {
        self.documents.lock().await.insert(category.id, category);
    }

    /// Number of stored documents, soft-deleted ones included.
    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }
}

#[async_trait]
impl CategoryBackend for MemoryBackend {
    async fn find_by_id(&self, id: DbId) -> Result<Option<Category>, CoreError> {
        Ok(self.documents.lock().await.get(&id).cloned())
    }

    async fn list_active(&self, filter: &ActiveFilter) -> Result<Vec<Category>, CoreError> {
        Ok(self
            .documents
            .lock()
            .await
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn begin(&self, family_id: DbId) -> Result<Box<dyn FamilyTxn>, CoreError> {
        let guard = Arc::clone(&self.documents).lock_owned().await;
        Ok(Box::new(MemoryTxn {
            guard,
            family_id,
            staged: HashMap::new(),
        }))
    }
}

/// Holds the store lock for its whole lifetime; writes are staged and only
/// applied on commit.
struct MemoryTxn {
    guard: OwnedMutexGuard<Documents>,
    family_id: DbId,
    staged: Documents,
}

impl MemoryTxn {
    fn current(&self, id: DbId) -> Option<&Category> {
        self.staged.get(&id).or_else(|| self.guard.get(&id))
    }

    fn current_active(&self, id: DbId, family_id: DbId) -> Option<&Category> {
        self.current(id)
            .filter(|c| c.is_active && c.family_id == family_id)
    }
}

#[async_trait]
impl FamilyTxn for MemoryTxn {
    async fn find_by_id(&mut self, id: DbId) -> Result<Option<Category>, CoreError> {
        Ok(self.current(id).cloned())
    }

    async fn active_categories(&mut self) -> Result<Vec<Category>, CoreError> {
        let filter = ActiveFilter::family(self.family_id);
        let mut merged: Documents = self
            .guard
            .iter()
            .filter(|(_, c)| c.family_id == self.family_id)
            .map(|(id, c)| (*id, c.clone()))
            .collect();
        merged.extend(self.staged.iter().map(|(id, c)| (*id, c.clone())));
        Ok(merged.into_values().filter(|c| filter.matches(c)).collect())
    }

    async fn insert(&mut self, category: &Category) -> Result<(), CoreError> {
        if self.current(category.id).is_some() {
            return Err(CoreError::DuplicateId { id: category.id });
        }
        self.staged.insert(category.id, category.clone());
        Ok(())
    }

    async fn update(&mut self, category: &Category) -> Result<bool, CoreError> {
        if self
            .current_active(category.id, category.family_id)
            .is_none()
        {
            return Ok(false);
        }
        self.staged.insert(category.id, category.clone());
        Ok(true)
    }

    async fn deactivate(
        &mut self,
        id: DbId,
        family_id: DbId,
        at: Timestamp,
    ) -> Result<bool, CoreError> {
        let Some(mut category) = self.current_active(id, family_id).cloned() else {
            return Ok(false);
        };
        category.is_active = false;
        category.updated_at = at;
        self.staged.insert(id, category);
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), CoreError> {
        let MemoryTxn {
            mut guard, staged, ..
        } = *self;
        guard.extend(staged);
        Ok(())
    }
}
