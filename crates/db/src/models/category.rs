//! Category entity model and DTOs.

use hearth_core::category::CategoryType;
use hearth_core::hierarchy::CategoryRecord;
use hearth_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `categories` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    #[sqlx(rename = "type", try_from = "String")]
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub color: Option<String>,
    pub icon: Option<String>,
    /// `None` for a root category.
    pub parent_id: Option<DbId>,
    pub family_id: DbId,
    /// `false` once soft-deleted.
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CategoryRecord for Category {
    fn id(&self) -> DbId {
        self.id
    }

    fn parent_id(&self) -> Option<DbId> {
        self.parent_id
    }

    fn family_id(&self) -> DbId {
        self.family_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn category_type(&self) -> CategoryType {
        self.category_type
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

/// DTO for creating a new category. The caller chooses the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub id: DbId,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<DbId>,
    pub family_id: DbId,
}

impl NewCategory {
    /// A root category with a freshly generated id.
    pub fn new(family_id: DbId, name: impl Into<String>, category_type: CategoryType) -> Self {
        Self {
            id: DbId::new_v4(),
            name: name.into(),
            category_type,
            color: None,
            icon: None,
            parent_id: None,
            family_id,
        }
    }

    pub fn with_parent(mut self, parent_id: DbId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// DTO for updating a category.
///
/// `id` and `family_id` locate the row; every other field replaces the
/// stored value, so `parent_id: None` moves the category to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCategory {
    pub id: DbId,
    pub family_id: DbId,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<DbId>,
}

impl From<&Category> for UpdateCategory {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            family_id: category.family_id,
            name: category.name.clone(),
            category_type: category.category_type,
            color: category.color.clone(),
            icon: category.icon.clone(),
            parent_id: category.parent_id,
        }
    }
}
