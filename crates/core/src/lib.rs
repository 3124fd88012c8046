//! Domain logic for the Hearth family budget categories.
//!
//! Everything here is storage-agnostic: validation helpers, the error
//! taxonomy, and the in-memory hierarchy walk shared by every backend.

pub mod category;
pub mod error;
pub mod hierarchy;
pub mod types;
