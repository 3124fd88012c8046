//! In-memory category hierarchy walk shared by every storage backend.
//!
//! Backends only load rows; traversal, cycle detection and the parent rules
//! live here so every backend enforces the same invariants. A
//! [`CategoryForest`] is built from one family's rows and only ever sees the
//! active ones.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::category::{names_conflict, CategoryType};
use crate::error::{CoreError, ParentViolation};
use crate::types::DbId;

/// Read access to the fields the hierarchy rules depend on.
pub trait CategoryRecord {
    fn id(&self) -> DbId;
    fn parent_id(&self) -> Option<DbId>;
    fn family_id(&self) -> DbId;
    fn name(&self) -> &str;
    fn category_type(&self) -> CategoryType;
    fn is_active(&self) -> bool;
}

/// One entry of a subtree listing. `level` is the distance from the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub id: DbId,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub level: usize,
}

/// Result of [`CategoryForest::subtree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtree {
    /// Anchor first, then descendants ordered by `(level, name)`.
    pub nodes: Vec<CategoryNode>,
    /// Descendants existed below the depth cap and were left out.
    pub truncated: bool,
}

/// Result of [`CategoryForest::path_to_root`].
#[derive(Debug)]
pub struct Ancestry<'a, C> {
    /// Root first, the requested category last.
    pub records: Vec<&'a C>,
    /// The climb stopped at the depth cap or on a repeated id.
    pub truncated: bool,
}

/// Nested view of a family's categories.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTree<C> {
    #[serde(flatten)]
    pub category: C,
    pub children: Vec<CategoryTree<C>>,
}

/// Parent links walked upward from a starting category.
struct Climb {
    ids: Vec<DbId>,
    reached_root: bool,
}

/// Adjacency view over the active categories of a single family.
pub struct CategoryForest<'a, C> {
    by_id: HashMap<DbId, &'a C>,
    children: HashMap<DbId, Vec<&'a C>>,
    max_depth: usize,
}

impl<'a, C: CategoryRecord> CategoryForest<'a, C> {
    /// Build the forest. Inactive records are dropped here, so no walk can
    /// ever reach a soft-deleted category.
    pub fn new(categories: impl IntoIterator<Item = &'a C>, max_depth: usize) -> Self {
        let mut by_id = HashMap::new();
        let mut children: HashMap<DbId, Vec<&'a C>> = HashMap::new();

        for category in categories.into_iter().filter(|c| c.is_active()) {
            by_id.insert(category.id(), category);
            if let Some(parent_id) = category.parent_id() {
                children.entry(parent_id).or_default().push(category);
            }
        }
        for siblings in children.values_mut() {
            siblings.sort_by(|a, b| by_name(*a, *b));
        }

        Self {
            by_id,
            children,
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn get(&self, id: DbId) -> Option<&'a C> {
        self.by_id.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Number of active categories whose parent is `id`.
    pub fn active_children(&self, id: DbId) -> usize {
        self.children.get(&id).map_or(0, Vec::len)
    }

    /// Whether another active category already uses `name`.
    pub fn name_taken(&self, name: &str, exclude: Option<DbId>) -> bool {
        self.by_id
            .values()
            .any(|c| Some(c.id()) != exclude && names_conflict(c.name(), name))
    }

    /// The anchor plus every active descendant, level by level.
    ///
    /// Levels beyond `max_depth` are never visited, so corrupted data with a
    /// cycle still terminates. An unknown anchor yields an empty listing.
    pub fn subtree(&self, anchor: DbId) -> Subtree {
        let Some(root) = self.get(anchor) else {
            return Subtree {
                nodes: Vec::new(),
                truncated: false,
            };
        };

        let mut nodes = vec![node(root, 0)];
        let mut seen = HashSet::from([anchor]);
        let mut frontier = vec![root];
        let mut truncated = false;

        for level in 1.. {
            let next: Vec<&'a C> = frontier
                .iter()
                .flat_map(|parent| self.children_of(parent.id()))
                .filter(|child| seen.insert(child.id()))
                .collect();
            if next.is_empty() {
                break;
            }
            if level > self.max_depth {
                truncated = true;
                break;
            }
            nodes.extend(next.iter().map(|child| node(*child, level)));
            frontier = next;
        }

        nodes.sort_by(|a, b| {
            a.level
                .cmp(&b.level)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Subtree { nodes, truncated }
    }

    /// Deepest level below `id`, `0` for a leaf or unknown id.
    pub fn subtree_height(&self, id: DbId) -> usize {
        self.subtree(id)
            .nodes
            .iter()
            .map(|n| n.level)
            .max()
            .unwrap_or(0)
    }

    /// Chain from the root down to `id`, inclusive.
    pub fn path_to_root(&self, id: DbId) -> Ancestry<'a, C> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.get(id);
        let mut truncated = false;

        while let Some(category) = current {
            if !seen.insert(category.id()) {
                truncated = true;
                break;
            }
            records.push(category);
            let Some(parent_id) = category.parent_id() else {
                break;
            };
            if records.len() > self.max_depth {
                truncated = true;
                break;
            }
            current = self.get(parent_id);
        }

        records.reverse();
        Ancestry { records, truncated }
    }

    /// Parent hops from `id` to its root, `None` if the walk does not end
    /// within the cap.
    pub fn depth_of(&self, id: DbId) -> Option<usize> {
        let climb = self.climb(id);
        climb.reached_root.then(|| climb.ids.len().saturating_sub(1))
    }

    /// Reject a parent link that would make `category_id` its own ancestor.
    ///
    /// Walks from `parent_id` toward the root. Fails closed: meeting
    /// `category_id` is a cycle, running out of hops before a root is
    /// treated as suspect and rejected too.
    pub fn ensure_acyclic(&self, category_id: DbId, parent_id: DbId) -> Result<(), CoreError> {
        if category_id == parent_id {
            return Err(CoreError::SelfParent { id: category_id });
        }
        let climb = self.climb(parent_id);
        if climb.ids.contains(&category_id) {
            return Err(CoreError::CycleDetected {
                id: category_id,
                parent_id,
            });
        }
        if !climb.reached_root {
            return Err(CoreError::HierarchyTooDeep {
                id: category_id,
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    /// Ensure that hanging `category_id` (with its current subtree) under
    /// `parent_id` keeps every descendant within `max_depth` hops of a root.
    pub fn ensure_depth_fits(&self, category_id: DbId, parent_id: DbId) -> Result<(), CoreError> {
        let too_deep = CoreError::HierarchyTooDeep {
            id: category_id,
            max_depth: self.max_depth,
        };
        let Some(parent_depth) = self.depth_of(parent_id) else {
            return Err(too_deep);
        };
        if parent_depth + 1 + self.subtree_height(category_id) > self.max_depth {
            return Err(too_deep);
        }
        Ok(())
    }

    /// Nested listing: roots in listing order, children sorted by name.
    ///
    /// Active categories whose parent is not active are shown as roots so
    /// nothing disappears from the view.
    pub fn tree(&self) -> Vec<CategoryTree<C>>
    where
        C: Clone,
    {
        let mut roots: Vec<&'a C> = self
            .by_id
            .values()
            .copied()
            .filter(|c| c.parent_id().map_or(true, |p| !self.by_id.contains_key(&p)))
            .collect();
        roots.sort_by(|a, b| listing_order(*a, *b));
        roots.into_iter().map(|root| self.build_tree(root, 0)).collect()
    }

    fn build_tree(&self, category: &'a C, level: usize) -> CategoryTree<C>
    where
        C: Clone,
    {
        let children = if level < self.max_depth {
            self.children_of(category.id())
                .map(|child| self.build_tree(child, level + 1))
                .collect()
        } else {
            Vec::new()
        };
        CategoryTree {
            category: category.clone(),
            children,
        }
    }

    fn children_of(&self, id: DbId) -> impl Iterator<Item = &'a C> + '_ {
        self.children.get(&id).into_iter().flatten().copied()
    }

    fn climb(&self, start: DbId) -> Climb {
        let mut ids = Vec::new();
        let mut current = self.get(start);

        while let Some(category) = current {
            ids.push(category.id());
            match category.parent_id() {
                None => {
                    return Climb {
                        ids,
                        reached_root: true,
                    }
                }
                Some(_) if ids.len() > self.max_depth => break,
                Some(parent_id) => current = self.get(parent_id),
            }
        }

        // A dangling parent link ends the chain like a root does.
        let reached_root = ids.len() <= self.max_depth;
        Climb { ids, reached_root }
    }
}

/// Check invariant 1 for a proposed parent.
pub fn validate_parent<C: CategoryRecord>(
    parent: Option<&C>,
    parent_id: DbId,
    family_id: DbId,
    category_type: CategoryType,
) -> Result<(), CoreError> {
    let invalid = |reason| CoreError::InvalidParent { parent_id, reason };
    let parent = parent.ok_or_else(|| invalid(ParentViolation::NotFound))?;
    if !parent.is_active() {
        return Err(invalid(ParentViolation::Inactive));
    }
    if parent.family_id() != family_id {
        return Err(invalid(ParentViolation::FamilyMismatch));
    }
    if parent.category_type() != category_type {
        return Err(invalid(ParentViolation::TypeMismatch {
            parent: parent.category_type(),
            child: category_type,
        }));
    }
    Ok(())
}

/// Sort into the listing order: type, then roots before children, then name.
pub fn sort_for_listing<C: CategoryRecord>(categories: &mut [C]) {
    categories.sort_by(listing_order);
}

fn listing_order<C: CategoryRecord>(a: &C, b: &C) -> Ordering {
    a.category_type()
        .as_str()
        .cmp(b.category_type().as_str())
        .then_with(|| a.parent_id().cmp(&b.parent_id()))
        .then_with(|| by_name(a, b))
}

fn by_name<C: CategoryRecord>(a: &C, b: &C) -> Ordering {
    a.name().cmp(b.name()).then_with(|| a.id().cmp(&b.id()))
}

fn node<C: CategoryRecord>(category: &C, level: usize) -> CategoryNode {
    CategoryNode {
        id: category.id(),
        name: category.name().to_string(),
        category_type: category.category_type(),
        level,
    }
}
