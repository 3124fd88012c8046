//! Category store over a pluggable backend.

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use hearth_core::category::{validate_category_name, validate_id, CategoryType};
use hearth_core::error::{CoreError, ErrorKind};
use hearth_core::hierarchy::{
    sort_for_listing, validate_parent, CategoryForest, CategoryNode, CategoryTree,
};
use hearth_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use super::CategoryStore;
use crate::backend::{ActiveFilter, CategoryBackend, PgBackend};
use crate::config::HierarchyConfig;
use crate::models::category::{Category, NewCategory, UpdateCategory};

/// Provides validated category operations on top of a [`CategoryBackend`].
#[derive(Debug, Clone)]
pub struct CategoryRepo<B> {
    backend: B,
    hierarchy: HierarchyConfig,
}

impl<B: CategoryBackend> CategoryRepo<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, HierarchyConfig::default())
    }

    pub fn with_config(backend: B, hierarchy: HierarchyConfig) -> Self {
        Self { backend, hierarchy }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn forest<'a>(&self, categories: &'a [Category]) -> CategoryForest<'a, Category> {
        CategoryForest::new(categories, self.hierarchy.max_depth)
    }

    async fn try_create(&self, input: &NewCategory) -> Result<Category, CoreError> {
        validate_id("id", input.id)?;
        validate_id("family_id", input.family_id)?;
        validate_category_name(&input.name)?;
        if let Some(parent_id) = input.parent_id {
            validate_id("parent_id", parent_id)?;
            if parent_id == input.id {
                return Err(CoreError::SelfParent { id: input.id });
            }
        }

        let mut tx = self.backend.begin(input.family_id).await?;
        if tx.find_by_id(input.id).await?.is_some() {
            return Err(CoreError::DuplicateId { id: input.id });
        }

        let family = tx.active_categories().await?;
        let forest = self.forest(&family);
        if forest.name_taken(&input.name, None) {
            return Err(CoreError::DuplicateName {
                name: input.name.clone(),
            });
        }
        if let Some(parent_id) = input.parent_id {
            let parent = tx.find_by_id(parent_id).await?;
            validate_parent(
                parent.as_ref(),
                parent_id,
                input.family_id,
                input.category_type,
            )?;
            forest.ensure_depth_fits(input.id, parent_id)?;
        }

        let now = now();
        let category = Category {
            id: input.id,
            name: input.name.clone(),
            category_type: input.category_type,
            color: input.color.clone(),
            icon: input.icon.clone(),
            parent_id: input.parent_id,
            family_id: input.family_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tx.insert(&category).await?;
        tx.commit().await?;

        tracing::info!(
            category_id = %category.id,
            family_id = %category.family_id,
            parent_id = ?category.parent_id,
            "Category created"
        );
        Ok(category)
    }

    async fn try_update(&self, input: &UpdateCategory) -> Result<Category, CoreError> {
        validate_id("id", input.id)?;
        validate_id("family_id", input.family_id)?;
        validate_category_name(&input.name)?;
        if let Some(parent_id) = input.parent_id {
            validate_id("parent_id", parent_id)?;
            if parent_id == input.id {
                return Err(CoreError::SelfParent { id: input.id });
            }
        }

        let mut tx = self.backend.begin(input.family_id).await?;
        let current = tx
            .find_by_id(input.id)
            .await?
            .filter(|c| c.is_active && c.family_id == input.family_id)
            .ok_or_else(|| CoreError::category_not_found(input.id))?;

        let family = tx.active_categories().await?;
        let forest = self.forest(&family);
        if forest.name_taken(&input.name, Some(input.id)) {
            return Err(CoreError::DuplicateName {
                name: input.name.clone(),
            });
        }
        if input.category_type != current.category_type {
            let children = forest.active_children(input.id);
            if children > 0 {
                return Err(CoreError::TypeChangeBlocked {
                    id: input.id,
                    children,
                });
            }
        }
        if let Some(parent_id) = input.parent_id {
            let parent = tx.find_by_id(parent_id).await?;
            validate_parent(
                parent.as_ref(),
                parent_id,
                input.family_id,
                input.category_type,
            )?;
            if current.parent_id != Some(parent_id) {
                forest.ensure_acyclic(input.id, parent_id)?;
                forest.ensure_depth_fits(input.id, parent_id)?;
            }
        }

        let updated = Category {
            name: input.name.clone(),
            category_type: input.category_type,
            color: input.color.clone(),
            icon: input.icon.clone(),
            parent_id: input.parent_id,
            updated_at: now(),
            ..current
        };
        if !tx.update(&updated).await? {
            return Err(CoreError::category_not_found(input.id));
        }
        tx.commit().await?;

        tracing::info!(
            category_id = %updated.id,
            family_id = %updated.family_id,
            parent_id = ?updated.parent_id,
            "Category updated"
        );
        Ok(updated)
    }

    async fn try_delete(&self, id: DbId, family_id: DbId) -> Result<(), CoreError> {
        validate_id("id", id)?;
        validate_id("family_id", family_id)?;

        let mut tx = self.backend.begin(family_id).await?;
        let family = tx.active_categories().await?;
        let forest = self.forest(&family);
        if forest.get(id).is_none() {
            return Err(CoreError::category_not_found(id));
        }
        let count = forest.active_children(id);
        if count > 0 {
            return Err(CoreError::HasSubcategories { id, count });
        }
        if !tx.deactivate(id, family_id, now()).await? {
            return Err(CoreError::category_not_found(id));
        }
        tx.commit().await?;

        tracing::info!(category_id = %id, family_id = %family_id, "Category soft-deleted");
        Ok(())
    }

    async fn list(&self, filter: ActiveFilter) -> Result<Vec<Category>, CoreError> {
        validate_id("family_id", filter.family_id)?;
        let mut categories = self.backend.list_active(&filter).await?;
        sort_for_listing(&mut categories);
        tracing::debug!(
            family_id = %filter.family_id,
            category_type = ?filter.category_type,
            count = categories.len(),
            "Listed categories"
        );
        Ok(categories)
    }

    /// Resolve a hierarchy anchor. `None` means it exists but is inactive.
    async fn anchor(&self, id: DbId) -> Result<Option<Category>, CoreError> {
        validate_id("id", id)?;
        let anchor = self
            .backend
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::category_not_found(id))?;
        Ok(anchor.is_active.then_some(anchor))
    }
}

impl CategoryRepo<PgBackend> {
    /// Category store on a PostgreSQL pool.
    pub fn postgres(pool: PgPool, hierarchy: HierarchyConfig) -> Self {
        Self::with_config(PgBackend::new(pool), hierarchy)
    }
}

#[async_trait]
impl<B: CategoryBackend> CategoryStore for CategoryRepo<B> {
    async fn create(&self, input: &NewCategory) -> Result<Category, CoreError> {
        self.try_create(input)
            .await
            .map_err(|e| log_failure("create", input.id, e))
    }

    async fn get_by_id(&self, id: DbId) -> Result<Category, CoreError> {
        validate_id("id", id)?;
        self.backend
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::category_not_found(id))
    }

    async fn get_for_family(&self, id: DbId, family_id: DbId) -> Result<Category, CoreError> {
        validate_id("family_id", family_id)?;
        let category = self.get_by_id(id).await?;
        if category.family_id != family_id {
            return Err(CoreError::category_not_found(id));
        }
        Ok(category)
    }

    async fn get_by_family_id(&self, family_id: DbId) -> Result<Vec<Category>, CoreError> {
        self.list(ActiveFilter::family(family_id)).await
    }

    async fn get_by_family_id_and_type(
        &self,
        family_id: DbId,
        category_type: CategoryType,
    ) -> Result<Vec<Category>, CoreError> {
        self.list(ActiveFilter::family(family_id).with_type(category_type))
            .await
    }

    async fn get_category_children(&self, parent_id: DbId) -> Result<Vec<CategoryNode>, CoreError> {
        let Some(anchor) = self.anchor(parent_id).await? else {
            return Ok(Vec::new());
        };
        let family = self
            .backend
            .list_active(&ActiveFilter::family(anchor.family_id))
            .await?;
        let subtree = self.forest(&family).subtree(parent_id);
        if subtree.truncated {
            tracing::warn!(
                category_id = %parent_id,
                max_depth = self.hierarchy.max_depth,
                "Subtree deeper than the hierarchy cap; listing truncated"
            );
        }
        Ok(subtree.nodes)
    }

    async fn get_category_path(&self, category_id: DbId) -> Result<Vec<Category>, CoreError> {
        let Some(anchor) = self.anchor(category_id).await? else {
            return Ok(Vec::new());
        };
        let family = self
            .backend
            .list_active(&ActiveFilter::family(anchor.family_id))
            .await?;
        let path = self.forest(&family).path_to_root(category_id);
        if path.truncated {
            tracing::warn!(
                category_id = %category_id,
                max_depth = self.hierarchy.max_depth,
                "Ancestor chain did not reach a root within the hierarchy cap"
            );
        }
        Ok(path.records.into_iter().cloned().collect())
    }

    async fn get_category_tree(
        &self,
        family_id: DbId,
    ) -> Result<Vec<CategoryTree<Category>>, CoreError> {
        validate_id("family_id", family_id)?;
        let family = self
            .backend
            .list_active(&ActiveFilter::family(family_id))
            .await?;
        Ok(self.forest(&family).tree())
    }

    async fn update(&self, input: &UpdateCategory) -> Result<Category, CoreError> {
        self.try_update(input)
            .await
            .map_err(|e| log_failure("update", input.id, e))
    }

    async fn delete(&self, id: DbId, family_id: DbId) -> Result<(), CoreError> {
        self.try_delete(id, family_id)
            .await
            .map_err(|e| log_failure("delete", id, e))
    }
}

/// Stored timestamps are truncated to the microsecond precision of
/// `timestamptz` so a read returns exactly what was written.
fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

fn log_failure(operation: &'static str, id: DbId, err: CoreError) -> CoreError {
    match err.kind() {
        ErrorKind::Storage => {
            tracing::error!(operation, category_id = %id, error = ?err, "Category store failure");
        }
        ErrorKind::NotFound => {
            tracing::debug!(operation, category_id = %id, error = %err, "Category not found");
        }
        _ => {
            tracing::warn!(operation, category_id = %id, error = %err, "Category change rejected");
        }
    }
    err
}
