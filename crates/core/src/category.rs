//! Category constants and input validation.
//!
//! Everything in this module runs before any I/O: a request that fails here
//! never reaches the backing store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum allowed length for a category name, in characters.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 255;

/// Default cap on parent hops between any category and its root.
pub const DEFAULT_MAX_HIERARCHY_DEPTH: usize = 10;

// ---------------------------------------------------------------------------
// Category type
// ---------------------------------------------------------------------------

/// Whether a category classifies money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    Expense,
}

impl CategoryType {
    pub const ALL: [CategoryType; 2] = [CategoryType::Income, CategoryType::Expense];

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            other => Err(CoreError::InvalidCategoryType(other.to_string())),
        }
    }
}

impl TryFrom<String> for CategoryType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a category name: must be non-empty, trimmed, and within
/// [`MAX_CATEGORY_NAME_LENGTH`] characters.
pub fn validate_category_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidName(
            "Category name must not be empty".to_string(),
        ));
    }
    if trimmed.len() != name.len() {
        return Err(CoreError::InvalidName(
            "Category name must not have leading or trailing whitespace".to_string(),
        ));
    }
    let length = name.chars().count();
    if length > MAX_CATEGORY_NAME_LENGTH {
        return Err(CoreError::InvalidName(format!(
            "Category name must not exceed {MAX_CATEGORY_NAME_LENGTH} characters, got {length}"
        )));
    }
    Ok(())
}

/// Reject the nil UUID, which no stored row ever carries.
pub fn validate_id(field: &'static str, id: DbId) -> Result<(), CoreError> {
    if id.is_nil() {
        return Err(CoreError::InvalidId {
            field,
            value: id.to_string(),
        });
    }
    Ok(())
}

/// Parse a caller-supplied identifier string.
pub fn parse_id(field: &'static str, raw: &str) -> Result<DbId, CoreError> {
    let id = DbId::parse_str(raw.trim()).map_err(|_| CoreError::InvalidId {
        field,
        value: raw.to_string(),
    })?;
    validate_id(field, id)?;
    Ok(id)
}

/// Whether two names collide under the per-family uniqueness rule.
///
/// Comparison is case-insensitive, matching the `lower(name)` unique index.
pub fn names_conflict(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
