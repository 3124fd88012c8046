#![allow(dead_code)]

use hearth_core::category::CategoryType;
use hearth_core::types::DbId;
use hearth_db::backend::MemoryBackend;
use hearth_db::config::HierarchyConfig;
use hearth_db::models::category::{Category, NewCategory};
use hearth_db::repositories::{CategoryRepo, CategoryStore};

pub type MemoryRepo = CategoryRepo<MemoryBackend>;

/// A category store over a fresh in-memory document store.
pub fn memory_repo() -> MemoryRepo {
    CategoryRepo::new(MemoryBackend::new())
}

/// Same as [`memory_repo`] with a custom hierarchy depth cap.
pub fn memory_repo_with_depth(max_depth: usize) -> MemoryRepo {
    let hierarchy = HierarchyConfig::new(max_depth).expect("valid depth");
    CategoryRepo::with_config(MemoryBackend::new(), hierarchy)
}

pub fn new_family() -> DbId {
    DbId::new_v4()
}

/// Create an expense category, optionally under `parent`.
pub async fn expense<S: CategoryStore + ?Sized>(
    store: &S,
    family_id: DbId,
    name: &str,
    parent: Option<&Category>,
) -> Category {
    create(store, family_id, name, CategoryType::Expense, parent).await
}

/// Create an income category, optionally under `parent`.
pub async fn income<S: CategoryStore + ?Sized>(
    store: &S,
    family_id: DbId,
    name: &str,
    parent: Option<&Category>,
) -> Category {
    create(store, family_id, name, CategoryType::Income, parent).await
}

pub async fn create<S: CategoryStore + ?Sized>(
    store: &S,
    family_id: DbId,
    name: &str,
    category_type: CategoryType,
    parent: Option<&Category>,
) -> Category {
    let mut input = NewCategory::new(family_id, name, category_type);
    input.parent_id = parent.map(|p| p.id);
    store
        .create(&input)
        .await
        .unwrap_or_else(|e| panic!("creating {name} failed: {e}"))
}

pub fn names(categories: &[Category]) -> Vec<&str> {
    categories.iter().map(|c| c.name.as_str()).collect()
}
