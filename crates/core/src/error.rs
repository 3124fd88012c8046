use std::fmt;

use crate::category::CategoryType;
use crate::types::DbId;

/// Boxed, thread-safe error used as the source of storage failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Invalid identifier for {field}: '{value}'")]
    InvalidId { field: &'static str, value: String },

    #[error("Invalid category type '{0}'. Must be one of: income, expense")]
    InvalidCategoryType(String),

    #[error("Invalid category name: {0}")]
    InvalidName(String),

    #[error("Invalid parent category {parent_id}: {reason}")]
    InvalidParent {
        parent_id: DbId,
        reason: ParentViolation,
    },

    #[error("Category {id} cannot be its own parent")]
    SelfParent { id: DbId },

    #[error("Moving category {id} under {parent_id} would create a cycle")]
    CycleDetected { id: DbId, parent_id: DbId },

    #[error("Category {id} would exceed the maximum hierarchy depth of {max_depth}")]
    HierarchyTooDeep { id: DbId, max_depth: usize },

    #[error("Cannot change the type of category {id} while it has {children} active subcategories")]
    TypeChangeBlocked { id: DbId, children: usize },

    #[error("Category '{name}' already exists in this family")]
    DuplicateName { name: String },

    #[error("Category {id} already exists")]
    DuplicateId { id: DbId },

    #[error("Category {id} has {count} active subcategories")]
    HasSubcategories { id: DbId, count: usize },

    #[error("Storage error during {operation} on {target}")]
    Storage {
        operation: &'static str,
        target: String,
        #[source]
        source: BoxError,
    },
}

/// Why a proposed parent category was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentViolation {
    NotFound,
    Inactive,
    FamilyMismatch,
    TypeMismatch {
        parent: CategoryType,
        child: CategoryType,
    },
}

impl fmt::Display for ParentViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentViolation::NotFound => f.write_str("parent category not found"),
            ParentViolation::Inactive => f.write_str("parent category is inactive"),
            ParentViolation::FamilyMismatch => {
                f.write_str("parent category belongs to a different family")
            }
            ParentViolation::TypeMismatch { parent, child } => write!(
                f,
                "parent category type '{parent}' does not match category type '{child}'"
            ),
        }
    }
}

/// Coarse classification callers match on to choose a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any I/O.
    MalformedInput,
    /// Rejected after a validation read, before the write.
    InvariantViolation,
    Conflict,
    NotFound,
    BlockedDelete,
    Storage,
}

impl ErrorKind {
    /// HTTP status code an API layer should answer with.
    ///
    /// Storage failures map to 500 and must be reported without detail.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::MalformedInput | ErrorKind::InvariantViolation => 400,
            ErrorKind::Conflict | ErrorKind::BlockedDelete => 409,
            ErrorKind::NotFound => 404,
            ErrorKind::Storage => 500,
        }
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidId { .. }
            | CoreError::InvalidCategoryType(_)
            | CoreError::InvalidName(_) => ErrorKind::MalformedInput,
            CoreError::InvalidParent { .. }
            | CoreError::SelfParent { .. }
            | CoreError::CycleDetected { .. }
            | CoreError::HierarchyTooDeep { .. }
            | CoreError::TypeChangeBlocked { .. } => ErrorKind::InvariantViolation,
            CoreError::DuplicateName { .. } | CoreError::DuplicateId { .. } => ErrorKind::Conflict,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::HasSubcategories { .. } => ErrorKind::BlockedDelete,
            CoreError::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// Wrap a backing-store failure with the operation and the row it touched.
    pub fn storage(
        operation: &'static str,
        target: impl fmt::Display,
        source: impl Into<BoxError>,
    ) -> Self {
        CoreError::Storage {
            operation,
            target: target.to_string(),
            source: source.into(),
        }
    }

    pub fn category_not_found(id: DbId) -> Self {
        CoreError::NotFound {
            entity: "category",
            id,
        }
    }
}
