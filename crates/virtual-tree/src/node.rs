//! The shadow node tree.
//!
//! Every visible item owns a [`FlatNode`] in a slot-map arena. Nodes cache
//! two numbers that let the projector turn tree positions into flat row
//! indices without scanning rows:
//!
//! - `size`: the rows the node and its visible descendants occupy
//!   (`1 + sum(children.size)`);
//! - `child_offset`: the rows occupied by the node's earlier siblings.
//!
//! A node's flat index is the sum of `child_offset + 1` along its ancestor
//! chain, minus one. The root is a sentinel without an item; its flat index is
//! conceptually `-1` and its size counts one row for itself.
//!
//! Structural edits keep both caches exact by propagating a size delta from
//! the edited node to the root, touching each ancestor and the later siblings
//! at every level. The cost of an edit is therefore bounded by depth times
//! fan-out rather than by the number of rows.

use std::collections::HashMap;
use std::sync::Arc;

use slotmap::{SlotMap, new_key_type};
use virtual_tree_core::Subscription;
use virtual_tree_core::logging::targets;

use crate::error::{FlatError, Result};

new_key_type! {
    /// Arena key of a [`FlatNode`].
    pub struct NodeKey;
}

/// Identity of a shared item: the address of its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ItemId(usize);

impl ItemId {
    pub(crate) fn of<T>(item: &Arc<T>) -> Self {
        Self(Arc::as_ptr(item) as *const () as usize)
    }
}

/// Bookkeeping for one visible item.
pub(crate) struct FlatNode<T: Send + Sync + 'static> {
    /// The item shown by this node; `None` only for the root.
    pub item: Option<Arc<T>>,
    pub parent: Option<NodeKey>,
    /// Visible children in source order. Empty while collapsed.
    pub children: Vec<NodeKey>,
    /// Live subscription to the children list, held only while expanded.
    pub subscription: Option<Subscription<Arc<T>>>,
    /// Token the current subscription's callback was created with.
    pub subscription_token: u64,
    pub is_expanded: bool,
    pub size: usize,
    pub child_offset: usize,
}

impl<T: Send + Sync + 'static> FlatNode<T> {
    fn new(item: Option<Arc<T>>) -> Self {
        Self {
            item,
            parent: None,
            children: Vec::new(),
            subscription: None,
            subscription_token: 0,
            is_expanded: false,
            size: 1,
            child_offset: 0,
        }
    }
}

/// The arena of visible nodes plus an identity index over their items.
pub(crate) struct NodeTree<T: Send + Sync + 'static> {
    nodes: SlotMap<NodeKey, FlatNode<T>>,
    /// Nodes showing each item, oldest first.
    by_item: HashMap<ItemId, Vec<NodeKey>>,
    root: NodeKey,
}

impl<T: Send + Sync + 'static> NodeTree<T> {
    /// Create a tree holding only the expanded root sentinel.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let mut root_node = FlatNode::new(None);
        root_node.is_expanded = true;
        let root = nodes.insert(root_node);
        Self {
            nodes,
            by_item: HashMap::new(),
            root,
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Number of visible rows.
    pub fn row_count(&self) -> usize {
        self.nodes[self.root].size - 1
    }

    pub fn get(&self, key: NodeKey) -> Option<&FlatNode<T>> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut FlatNode<T>> {
        self.nodes.get_mut(key)
    }

    pub fn node(&self, key: NodeKey) -> Result<&FlatNode<T>> {
        self.nodes
            .get(key)
            .ok_or_else(|| FlatError::corrupted("dangling node key"))
    }

    fn node_mut(&mut self, key: NodeKey) -> Result<&mut FlatNode<T>> {
        self.nodes
            .get_mut(key)
            .ok_or_else(|| FlatError::corrupted("dangling node key"))
    }

    /// The node showing `item`, if it is visible.
    pub fn key_of(&self, item: &Arc<T>) -> Option<NodeKey> {
        self.by_item
            .get(&ItemId::of(item))
            .and_then(|keys| keys.last())
            .copied()
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(key)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Create a collapsed node for `item` and insert it as child `index` of
    /// `parent`.
    pub fn attach(&mut self, parent: NodeKey, index: usize, item: Arc<T>) -> Result<NodeKey> {
        let len = self.node(parent)?.children.len();
        if index > len {
            return Err(FlatError::ChildIndexOutOfRange { index, len });
        }

        let id = ItemId::of(&item);
        let key = self.nodes.insert(FlatNode::new(Some(item)));
        let shown = self.by_item.entry(id).or_default();
        if let Some(previous) = shown.last() {
            tracing::warn!(
                target: targets::NODE,
                ?previous,
                "item is visible more than once; lookups resolve to the newest row"
            );
        }
        shown.push(key);
        self.insert_visual_child(parent, index, key)?;
        Ok(key)
    }

    /// Link `child` into `parent.children` at `index` and fix the caches.
    fn insert_visual_child(&mut self, parent: NodeKey, index: usize, child: NodeKey) -> Result<()> {
        let offset = match index.checked_sub(1) {
            None => 0,
            Some(prev_index) => {
                let prev = self.node(parent)?.children[prev_index];
                let prev = self.node(prev)?;
                prev.child_offset + prev.size
            }
        };

        let size = {
            let node = self.node_mut(child)?;
            node.parent = Some(parent);
            node.child_offset = offset;
            node.size
        };

        self.node_mut(parent)?.children.insert(index, child);
        self.shift_offsets_from(parent, index + 1, size as isize)?;
        self.propagate(parent, size as isize)
    }

    /// Unlink the node at `key` from its parent and destroy its subtree.
    pub fn detach(&mut self, key: NodeKey) -> Result<()> {
        let (parent, size) = {
            let node = self.node(key)?;
            let parent = node
                .parent
                .ok_or_else(|| FlatError::corrupted("cannot detach the root"))?;
            (parent, node.size)
        };
        let index = self.position_in_parent(parent, key)?;

        self.node_mut(parent)?.children.remove(index);
        let delta = -(size as isize);
        self.shift_offsets_from(parent, index, delta)?;
        self.propagate(parent, delta)?;
        self.destroy_subtree(key);
        Ok(())
    }

    /// Destroy every visible descendant of `key`, leaving it childless.
    ///
    /// Returns the number of rows that disappeared.
    pub fn clear_children(&mut self, key: NodeKey) -> Result<usize> {
        let children = std::mem::take(&mut self.node_mut(key)?.children);
        if children.is_empty() {
            return Ok(0);
        }
        let removed = self.node(key)?.size - 1;
        for child in children {
            self.destroy_subtree(child);
        }
        self.propagate(key, -(removed as isize))?;
        Ok(removed)
    }

    fn destroy_subtree(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            // Dropping the node releases its children-list subscription.
            let Some(node) = self.nodes.remove(current) else {
                continue;
            };
            if let Some(item) = &node.item {
                let id = ItemId::of(item);
                if let Some(shown) = self.by_item.get_mut(&id) {
                    shown.retain(|&k| k != current);
                    if shown.is_empty() {
                        self.by_item.remove(&id);
                    }
                }
            }
            stack.extend(node.children.iter().copied());
        }
    }

    /// Adjust the offsets of `parent`'s children from position `start` on.
    fn shift_offsets_from(&mut self, parent: NodeKey, start: usize, delta: isize) -> Result<()> {
        let Self { nodes, .. } = self;
        let later = nodes
            .get(parent)
            .and_then(|node| node.children.get(start..))
            .map(<[NodeKey]>::to_vec)
            .unwrap_or_default();
        for sibling in later {
            let node = nodes
                .get_mut(sibling)
                .ok_or_else(|| FlatError::corrupted("dangling sibling key"))?;
            node.child_offset = node
                .child_offset
                .checked_add_signed(delta)
                .ok_or_else(|| FlatError::corrupted("sibling offset out of range"))?;
        }
        Ok(())
    }

    /// Apply a size change at `start` and carry it to the root.
    ///
    /// At each level the node's own size changes and so do the offsets of its
    /// later siblings.
    fn propagate(&mut self, start: NodeKey, delta: isize) -> Result<()> {
        if delta == 0 {
            return Ok(());
        }
        let mut current = start;
        loop {
            let parent = {
                let node = self.node_mut(current)?;
                node.size = node
                    .size
                    .checked_add_signed(delta)
                    .ok_or_else(|| FlatError::corrupted("subtree size out of range"))?;
                node.parent
            };
            let Some(parent) = parent else {
                return Ok(());
            };
            let index = self.position_in_parent(parent, current)?;
            self.shift_offsets_from(parent, index + 1, delta)?;
            current = parent;
        }
    }

    fn position_in_parent(&self, parent: NodeKey, child: NodeKey) -> Result<usize> {
        self.node(parent)?
            .children
            .iter()
            .position(|&k| k == child)
            .ok_or_else(|| FlatError::corrupted("node missing from its parent's children"))
    }

    /// The flat row of `key`; `None` for the root.
    pub fn flat_index(&self, key: NodeKey) -> Option<usize> {
        let mut rows = 0usize;
        let mut current = key;
        loop {
            let node = self.nodes.get(current)?;
            let parent = node.parent?;
            rows += node.child_offset + 1;
            if parent == self.root {
                return Some(rows - 1);
            }
            current = parent;
        }
    }

    /// The row directly below `key`, where its first child is shown.
    pub fn first_child_row(&self, key: NodeKey) -> Option<usize> {
        if key == self.root {
            Some(0)
        } else {
            self.flat_index(key).map(|row| row + 1)
        }
    }

    /// Rows occupied by the children of `parent` before child `index`.
    pub fn child_offset(&self, parent: NodeKey, index: usize) -> Result<usize> {
        let node = self.node(parent)?;
        let len = node.children.len();
        match index.cmp(&len) {
            std::cmp::Ordering::Less => Ok(self.node(node.children[index])?.child_offset),
            std::cmp::Ordering::Equal => Ok(node.size - 1),
            std::cmp::Ordering::Greater => Err(FlatError::ChildIndexOutOfRange { index, len }),
        }
    }

    /// The flat row at which a child inserted at `index` under `parent` lands.
    ///
    /// For `index > 0` this is the row after the last visible descendant of
    /// the previous sibling.
    pub fn insertion_row(&self, parent: NodeKey, index: usize) -> Result<usize> {
        let base = self
            .first_child_row(parent)
            .ok_or_else(|| FlatError::corrupted("insertion under a detached node"))?;
        Ok(base + self.child_offset(parent, index)?)
    }

    /// Nesting level of `key`: 0 for top-level items.
    pub fn depth(&self, key: NodeKey) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.nodes.get(key)?.parent?;
        while current != self.root {
            depth += 1;
            current = self.nodes.get(current)?.parent?;
        }
        Some(depth)
    }

    /// The node shown at flat row `row`.
    pub fn node_at(&self, row: usize) -> Option<NodeKey> {
        if row >= self.row_count() {
            return None;
        }
        let mut current = self.root;
        let mut remaining = row;
        loop {
            let children = &self.nodes.get(current)?.children;
            let after = children.partition_point(|&c| {
                self.nodes
                    .get(c)
                    .is_some_and(|node| node.child_offset <= remaining)
            });
            let child = *children.get(after.checked_sub(1)?)?;
            let within = remaining - self.nodes.get(child)?.child_offset;
            if within == 0 {
                return Some(child);
            }
            current = child;
            remaining = within - 1;
        }
    }

    /// Visible nodes in row order.
    pub fn preorder(&self) -> Vec<NodeKey> {
        let mut order = Vec::with_capacity(self.row_count());
        let mut stack: Vec<NodeKey> = self.children(self.root).iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            order.push(key);
            stack.extend(self.children(key).iter().rev().copied());
        }
        order
    }

    /// Verify every cached size, offset, parent link and index entry.
    pub fn check_invariants(&self) -> Result<()> {
        let mut reachable = 0usize;
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let node = self.node(key)?;
            reachable += 1;

            if key != self.root {
                let Some(item) = &node.item else {
                    return Err(FlatError::corrupted("non-root node without an item"));
                };
                let indexed = self
                    .by_item
                    .get(&ItemId::of(item))
                    .is_some_and(|keys| keys.contains(&key));
                if !indexed {
                    return Err(FlatError::corrupted("visible item missing from the index"));
                }
                if !node.is_expanded && (!node.children.is_empty() || node.subscription.is_some()) {
                    return Err(FlatError::corrupted(
                        "collapsed node holds children or a subscription",
                    ));
                }
            }

            let mut expected_offset = 0;
            for &child in &node.children {
                let child_node = self.node(child)?;
                if child_node.parent != Some(key) {
                    return Err(FlatError::corrupted("child does not point back to its parent"));
                }
                if child_node.child_offset != expected_offset {
                    return Err(FlatError::Corrupted(format!(
                        "child offset {} differs from prefix sum {}",
                        child_node.child_offset, expected_offset
                    )));
                }
                expected_offset += child_node.size;
                stack.push(child);
            }
            if node.size != expected_offset + 1 {
                return Err(FlatError::Corrupted(format!(
                    "cached size {} differs from 1 + children {}",
                    node.size, expected_offset
                )));
            }
        }

        if reachable != self.nodes.len() {
            return Err(FlatError::Corrupted(format!(
                "{} nodes allocated but {} reachable",
                self.nodes.len(),
                reachable
            )));
        }
        for &key in self.by_item.values().flatten() {
            if !self.nodes.contains_key(key) {
                return Err(FlatError::corrupted("index refers to a destroyed node"));
            }
        }
        Ok(())
    }
}
