//! Storage adapters for categories.
//!
//! A backend only executes queries. Validation, ordering and the hierarchy
//! walk are shared in [`crate::repositories::CategoryRepo`] and
//! [`hearth_core::hierarchy`], so every backend enforces the same rules.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use hearth_core::category::CategoryType;
use hearth_core::error::CoreError;
use hearth_core::types::{DbId, Timestamp};

use crate::models::category::Category;

pub use memory::MemoryBackend;
pub use postgres::PgBackend;

/// The default "active rows of one family" predicate.
///
/// Every listing read goes through this filter, so soft-deleted rows can not
/// leak into a new query path by omission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveFilter {
    pub family_id: DbId,
    pub category_type: Option<CategoryType>,
}

impl ActiveFilter {
    pub fn family(family_id: DbId) -> Self {
        Self {
            family_id,
            category_type: None,
        }
    }

    pub fn with_type(mut self, category_type: CategoryType) -> Self {
        self.category_type = Some(category_type);
        self
    }

    pub fn matches(&self, category: &Category) -> bool {
        category.is_active
            && category.family_id == self.family_id
            && self
                .category_type
                .map_or(true, |ty| ty == category.category_type)
    }
}

/// Query execution for one storage engine.
#[async_trait]
pub trait CategoryBackend: Send + Sync {
    /// Look up a row by id, active or not.
    async fn find_by_id(&self, id: DbId) -> Result<Option<Category>, CoreError>;

    /// All rows matching `filter`, in no particular order.
    async fn list_active(&self, filter: &ActiveFilter) -> Result<Vec<Category>, CoreError>;

    /// Open a unit of work that serialises writers of `family_id`.
    async fn begin(&self, family_id: DbId) -> Result<Box<dyn FamilyTxn>, CoreError>;
}

/// A family-scoped unit of work.
///
/// Reads and writes made through the same transaction are atomic with
/// respect to other writers of the family. Dropping it without calling
/// [`FamilyTxn::commit`] discards every write.
#[async_trait]
pub trait FamilyTxn: Send {
    async fn find_by_id(&mut self, id: DbId) -> Result<Option<Category>, CoreError>;

    /// Active rows of the family the transaction was opened for.
    async fn active_categories(&mut self) -> Result<Vec<Category>, CoreError>;

    async fn insert(&mut self, category: &Category) -> Result<(), CoreError>;

    /// Replace the mutable columns of an active row. Returns `false` if no
    /// active row matched `id` and `family_id`.
    async fn update(&mut self, category: &Category) -> Result<bool, CoreError>;

    /// Flip `is_active` off. Returns `false` if no active row matched.
    async fn deactivate(
        &mut self,
        id: DbId,
        family_id: DbId,
        at: Timestamp,
    ) -> Result<bool, CoreError>;

    async fn commit(self: Box<Self>) -> Result<(), CoreError>;
}
