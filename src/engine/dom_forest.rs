//! Live DOM forest (§2 item 7, §4.4).
//!
//! Modeled as `parent_id -> set<child_id>` over possibly many roots, plus a
//! "two-parent" set tolerating reparent-before-remove event reordering (§9,
//! "Two-parent set replaces a set-valued parent relation"). This module owns
//! only the raw forest structure; the traversal that walks a detached
//! subtree and records its last-use time lives in
//! [`crate::engine::analyzer`], since it must also mutate the `info` table.

use crate::domain::errors::EngineError;
use crate::domain::types::ObjectId;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct DomForest {
    /// Every id that is currently a live node of the forest maps to its
    /// (possibly empty) child set. A missing key means "not in the forest".
    children: HashMap<ObjectId, HashSet<ObjectId>>,
    /// Ids currently attached under more than one parent.
    two_parent: HashSet<ObjectId>,
    /// Ids that currently have at least one parent (used only to detect the
    /// *second* attach that makes a node two-parented).
    has_parent: HashSet<ObjectId>,
}

impl DomForest {
    #[must_use]
    pub fn new() -> Self {
        DomForest::default()
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.children.contains_key(&id)
    }

    #[must_use]
    pub fn is_two_parented(&self, id: ObjectId) -> bool {
        self.two_parent.contains(&id)
    }

    /// `dom_root(oid)`: establish `oid` as a forest root with no children.
    pub fn establish_root(&mut self, id: ObjectId) {
        self.children.entry(id).or_default();
    }

    /// `add_dom_child(parent, child)`. No-op (returns `Ok(false)`) if `parent`
    /// is not currently in the forest. Returns `Ok(true)` if the attach took
    /// effect. Whether `child` is new to the live/unreachable tables is a
    /// separate question the caller answers by consulting those tables
    /// directly — a child can already have a forest entry (e.g. as a root)
    /// while still being new to the analyzer's bookkeeping.
    pub fn attach(&mut self, parent: ObjectId, child: ObjectId) -> Result<bool, EngineError> {
        if !self.children.contains_key(&parent) {
            return Ok(false);
        }
        self.children.entry(parent).or_default().insert(child);
        self.children.entry(child).or_default();

        if self.has_parent.contains(&child) {
            if !self.two_parent.insert(child) {
                return Err(EngineError::DuplicateTwoParentEntry(child));
            }
        } else {
            self.has_parent.insert(child);
        }

        Ok(true)
    }

    /// `remove_dom_child(parent, child)`. No-op (returns `Ok(false)`) if
    /// `parent` is not in the forest. Fatal if `parent` is in the forest but
    /// `child` is not currently one of its children.
    pub fn detach(&mut self, parent: ObjectId, child: ObjectId) -> Result<bool, EngineError> {
        let Some(siblings) = self.children.get_mut(&parent) else {
            return Ok(false);
        };
        if !siblings.remove(&child) {
            return Err(EngineError::ChildNotInParent { parent, child });
        }
        Ok(true)
    }

    /// Removes `id`'s two-parent mark, returning whether it was set.
    pub fn clear_two_parent(&mut self, id: ObjectId) -> bool {
        self.two_parent.remove(&id)
    }

    /// Deletes `id`'s forest entry, returning its children for BFS traversal,
    /// or `None` if `id` had no entry (a fatal condition during traversal —
    /// see SPEC_FULL.md §9, "descent into already-removed forest entry").
    pub fn remove_entry(&mut self, id: ObjectId) -> Option<HashSet<ObjectId>> {
        let children = self.children.remove(&id)?;
        self.has_parent.remove(&id);
        Some(children)
    }
}
