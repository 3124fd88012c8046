//! Repository layer.
//!
//! [`CategoryStore`] is the contract callers (API handlers, budget and report
//! services) depend on. [`CategoryRepo`] implements it once on top of any
//! [`crate::backend::CategoryBackend`].

pub mod category_repo;

use async_trait::async_trait;
use hearth_core::category::CategoryType;
use hearth_core::error::CoreError;
use hearth_core::hierarchy::{CategoryNode, CategoryTree};
use hearth_core::types::DbId;

use crate::models::category::{Category, NewCategory, UpdateCategory};

pub use category_repo::CategoryRepo;

/// Lifecycle and hierarchy operations on categories.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Validate and insert a new, active category.
    async fn create(&self, input: &NewCategory) -> Result<Category, CoreError>;

    /// Find a category by id, including soft-deleted ones.
    async fn get_by_id(&self, id: DbId) -> Result<Category, CoreError>;

    /// Like [`CategoryStore::get_by_id`], but only if the row belongs to
    /// `family_id`.
    async fn get_for_family(&self, id: DbId, family_id: DbId) -> Result<Category, CoreError>;

    /// Active categories of a family ordered by type, roots first, then name.
    async fn get_by_family_id(&self, family_id: DbId) -> Result<Vec<Category>, CoreError>;

    /// Active categories of one type ordered roots first, then name.
    async fn get_by_family_id_and_type(
        &self,
        family_id: DbId,
        category_type: CategoryType,
    ) -> Result<Vec<Category>, CoreError>;

    /// The category itself (level 0) plus every active descendant,
    /// ordered by `(level, name)`.
    async fn get_category_children(&self, parent_id: DbId) -> Result<Vec<CategoryNode>, CoreError>;

    /// Chain from the root down to `category_id`, inclusive.
    async fn get_category_path(&self, category_id: DbId) -> Result<Vec<Category>, CoreError>;

    /// Active categories of a family as nested trees.
    async fn get_category_tree(
        &self,
        family_id: DbId,
    ) -> Result<Vec<CategoryTree<Category>>, CoreError>;

    /// Replace name, type, presentation fields and parent of an active
    /// category.
    async fn update(&self, input: &UpdateCategory) -> Result<Category, CoreError>;

    /// Soft-delete a childless active category.
    async fn delete(&self, id: DbId, family_id: DbId) -> Result<(), CoreError>;
}
