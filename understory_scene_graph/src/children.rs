// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural mutation: attaching, detaching and reordering children.
//!
//! Every failed call returns an error before touching the graph.

use alloc::vec::Vec;
use core::ops::{Bound, RangeBounds};
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::graph::SceneGraph;
use crate::types::{NodeId, NodeKind};

impl SceneGraph {
    /// Append `child` as the topmost child of `target`.
    ///
    /// Equivalent to [`add_child_at`](Self::add_child_at) with `index == num_children(target)`.
    pub fn add_child(&mut self, target: NodeId, child: NodeId) -> Result<()> {
        let len = self.checked_container(target)?.len();
        self.add_child_at(target, child, len)
    }

    /// Insert `child` into `target`'s child list at `index`.
    ///
    /// If `child` already belongs to `target` it is moved instead, with `index` clamped
    /// to the last slot. If it belongs to another container it is detached from there
    /// first.
    ///
    /// # Errors
    ///
    /// - [`GraphError::InvalidArgument`] if either id is stale, `child == target`, or
    ///   `target` is a leaf.
    /// - [`GraphError::OutOfRange`] if `index > num_children(target)`.
    /// - [`GraphError::WouldCreateCycle`] if `child` is an ancestor of `target`.
    pub fn add_child_at(&mut self, target: NodeId, child: NodeId, index: usize) -> Result<()> {
        let len = self.checked_container(target)?.len();
        if !self.is_alive(child) {
            return Err(GraphError::invalid("stale child id"));
        }
        if child == target {
            return Err(GraphError::invalid("a node cannot be its own child"));
        }
        if index > len {
            return Err(GraphError::OutOfRange { index, len });
        }
        if self.is_ancestor(child, target) {
            return Err(GraphError::WouldCreateCycle {
                parent: target,
                child,
            });
        }

        match self.node(child).parent {
            Some(parent) if parent == target => {
                let from = self.position_of(target, child)?;
                self.move_child(target, from, index.min(len - 1));
                return Ok(());
            }
            Some(old) => self.detach(old, child),
            None => {}
        }

        self.node_mut(target).children.insert(index, child);
        self.node_mut(child).parent = Some(target);
        self.structure_changed(target, Some(child));
        debug!(?target, ?child, index, "attached child");
        Ok(())
    }

    /// Remove `child` from `target`.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidArgument`] for stale ids or a leaf target,
    /// [`GraphError::NotAChild`] if `child` is not in `target`'s child list.
    pub fn remove_child(&mut self, target: NodeId, child: NodeId) -> Result<()> {
        self.checked_container(target)?;
        if !self.is_alive(child) {
            return Err(GraphError::invalid("stale child id"));
        }
        self.position_of(target, child)?;
        self.detach(target, child);
        Ok(())
    }

    /// Remove and return the child at `index`.
    ///
    /// # Errors
    ///
    /// [`GraphError::OutOfRange`] if `index >= num_children(target)`.
    pub fn remove_child_at(&mut self, target: NodeId, index: usize) -> Result<NodeId> {
        let children = self.checked_container(target)?;
        let Some(&child) = children.get(index) else {
            return Err(GraphError::OutOfRange {
                index,
                len: children.len(),
            });
        };
        self.detach(target, child);
        Ok(child)
    }

    /// Remove every child in `range`, returning them in their former order.
    ///
    /// # Errors
    ///
    /// [`GraphError::OutOfRange`] if the range is inverted or ends past the child list.
    pub fn remove_children(
        &mut self,
        target: NodeId,
        range: impl RangeBounds<usize>,
    ) -> Result<Vec<NodeId>> {
        let len = self.checked_container(target)?.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        };
        if end > len {
            return Err(GraphError::OutOfRange { index: end, len });
        }
        if start > end {
            return Err(GraphError::OutOfRange { index: start, len });
        }
        if start == end {
            return Ok(Vec::new());
        }

        let removed: Vec<NodeId> = self.node_mut(target).children.drain(start..end).collect();
        for &child in &removed {
            self.node_mut(child).parent = None;
            self.invalidate_parent_cache(child);
        }
        self.structure_changed(target, None);
        debug!(?target, count = removed.len(), "removed children");
        Ok(removed)
    }

    /// Move `child` to `index` within `target`.
    ///
    /// Reordering changes stacking only, so only the appearance revision moves.
    ///
    /// # Errors
    ///
    /// [`GraphError::OutOfRange`] if `index >= num_children(target)`,
    /// [`GraphError::NotAChild`] if `child` is not a child of `target`.
    pub fn set_child_index(&mut self, target: NodeId, child: NodeId, index: usize) -> Result<()> {
        let len = self.checked_container(target)?.len();
        if index >= len {
            return Err(GraphError::OutOfRange { index, len });
        }
        let from = self.position_of(target, child)?;
        self.move_child(target, from, index);
        Ok(())
    }

    /// Swap the positions of two children of `target`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotAChild`] if either node is not a child of `target`.
    pub fn swap_children(&mut self, target: NodeId, a: NodeId, b: NodeId) -> Result<()> {
        self.checked_container(target)?;
        let i = self.position_of(target, a)?;
        let j = self.position_of(target, b)?;
        self.swap_children_at(target, i, j)
    }

    /// Swap the children at positions `i` and `j`.
    ///
    /// # Errors
    ///
    /// [`GraphError::OutOfRange`] if either index is `>= num_children(target)`.
    pub fn swap_children_at(&mut self, target: NodeId, i: usize, j: usize) -> Result<()> {
        let len = self.checked_container(target)?.len();
        for index in [i, j] {
            if index >= len {
                return Err(GraphError::OutOfRange { index, len });
            }
        }
        if i != j {
            self.node_mut(target).children.swap(i, j);
            self.invalidate_appearance(target);
        }
        Ok(())
    }

    // --- queries ---

    /// Returns the parent of a node, if attached.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Children of a node in stacking order, bottom first.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Number of children.
    pub fn num_children(&self, id: NodeId) -> usize {
        self.node(id).children.len()
    }

    /// The child at `index`, if any.
    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.node(id).children.get(index).copied()
    }

    /// Position of `child` in `target`'s child list.
    pub fn child_index(&self, target: NodeId, child: NodeId) -> Option<usize> {
        self.node(target).children.iter().position(|&c| c == child)
    }

    /// Returns `true` if `other` is `id` itself or one of its descendants.
    ///
    /// Stale `other` ids are never contained.
    pub fn contains(&self, id: NodeId, other: NodeId) -> bool {
        let _ = self.node(id);
        self.is_alive(other) && self.is_ancestor(id, other)
    }

    // --- internals ---

    /// Unlink `child` from `parent` and invalidate both sides. Both must be live and linked.
    pub(crate) fn detach(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(parent).children.retain(|&c| c != child);
        self.node_mut(child).parent = None;
        self.structure_changed(parent, Some(child));
        debug!(?parent, ?child, "detached child");
    }

    fn structure_changed(&mut self, target: NodeId, child: Option<NodeId>) {
        self.state_mut(target).appearance_id.bump();
        self.invalidate_world_bounds(target);
        if let Some(child) = child {
            self.invalidate_parent_cache(child);
        }
    }

    fn move_child(&mut self, target: NodeId, from: usize, to: usize) {
        if from == to {
            return;
        }
        let children = &mut self.node_mut(target).children;
        let child = children.remove(from);
        children.insert(to, child);
        self.invalidate_appearance(target);
    }

    /// Child list of a live container.
    fn checked_container(&self, target: NodeId) -> Result<&[NodeId]> {
        if !self.is_alive(target) {
            return Err(GraphError::invalid("stale target id"));
        }
        let node = self.node(target);
        if node.kind == NodeKind::Leaf {
            return Err(GraphError::invalid("a leaf cannot have children"));
        }
        Ok(&node.children)
    }

    fn position_of(&self, target: NodeId, child: NodeId) -> Result<usize> {
        self.child_index(target, child)
            .ok_or(GraphError::NotAChild {
                parent: target,
                child,
            })
    }

    /// Walks up from `node`; `true` if `ancestor` is `node` or lies on its parent chain.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.node(n).parent;
        }
        false
    }
}
