//! The flat projector.
//!
//! [`FlatCollection`] keeps a [`FlatTarget`] in sync with the visible part of
//! a [`HierarchicalSource`]: one row per visible item, in depth-first
//! pre-order. Expanded nodes subscribe to their children lists and translate
//! every change into positional edits of the target, computed from the cached
//! subtree sizes of the node tree rather than by scanning rows.
//!
//! # Reentrancy
//!
//! All state sits behind a reentrant lock and a borrow flag. While an
//! operation is running:
//!
//! - notifications from observed lists are queued and applied, in order, once
//!   the operation completes;
//! - public calls on the same collection return [`FlatError::Reentrant`]
//!   ([`FlatCollection::get_parent`] returns `None`).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use virtual_tree::{FlatCollection, ItemHierarchy, ItemList, TreeItem};
//!
//! let docs = TreeItem::with_children("docs", true, vec![TreeItem::new("guide.md")]);
//! let roots = ItemList::from_vec(vec![docs.clone(), TreeItem::new("README.md")]);
//!
//! let flat = FlatCollection::new(ItemHierarchy::new(roots), Vec::new()).unwrap();
//! assert_eq!(flat.len().unwrap(), 3);
//!
//! flat.collapse(&docs).unwrap();
//! assert_eq!(flat.len().unwrap(), 2);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use virtual_tree_core::logging::targets;
use virtual_tree_core::{CollectionChange, PerfSpan, TreeFormatOptions};

use crate::change::{ChangeOp, normalize};
use crate::config::FlatCollectionConfig;
use crate::debug::format_tree;
use crate::error::{FlatError, Result};
use crate::node::{NodeKey, NodeTree};
use crate::source::{HierarchicalSource, ItemList};
use crate::target::FlatTarget;

type Item<S> = Arc<<S as HierarchicalSource>::Item>;

/// A notification that arrived while the projector was busy.
struct PendingChange<T> {
    node: NodeKey,
    token: u64,
    change: CollectionChange<Arc<T>>,
}

struct Shared<S: HierarchicalSource, D> {
    state: ReentrantMutex<RefCell<FlatState<S, D>>>,
    pending: Mutex<VecDeque<PendingChange<S::Item>>>,
}

struct FlatState<S: HierarchicalSource, D> {
    source: Arc<S>,
    target: D,
    tree: NodeTree<S::Item>,
    config: FlatCollectionConfig,
    next_token: u64,
    this: Weak<Shared<S, D>>,
}

/// A live, flattened view of a hierarchy.
///
/// See the [module documentation](self) for the reentrancy rules.
pub struct FlatCollection<S: HierarchicalSource, D> {
    shared: Arc<Shared<S, D>>,
    source: Arc<S>,
}

impl<S, D> FlatCollection<S, D>
where
    S: HierarchicalSource,
    D: FlatTarget<S::Container>,
{
    /// Project `source` into `target` with the default configuration.
    ///
    /// Fails with [`FlatError::TargetNotEmpty`] if `target` already holds rows.
    pub fn new(source: S, target: D) -> Result<Self> {
        Self::with_config(source, target, FlatCollectionConfig::default())
    }

    /// Project `source` into `target`.
    pub fn with_config(source: S, target: D, config: FlatCollectionConfig) -> Result<Self> {
        if !target.is_empty() {
            return Err(FlatError::TargetNotEmpty { len: target.len() });
        }

        let _span = PerfSpan::new("flat_collection_build");
        let source = Arc::new(source);
        let shared = Arc::new_cyclic(|this| Shared {
            state: ReentrantMutex::new(RefCell::new(FlatState {
                source: source.clone(),
                target,
                tree: NodeTree::new(),
                config,
                next_token: 0,
                this: this.clone(),
            })),
            pending: Mutex::new(VecDeque::new()),
        });

        let collection = Self { shared, source };
        let rows = collection.mutate(|state| {
            let root = state.tree.root();
            state.expand_node(root)?;
            Ok(state.tree.row_count())
        })?;
        tracing::debug!(target: targets::FLAT, rows, "flat collection built");
        Ok(collection)
    }

    /// The hierarchy being projected.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Show the children of `item`.
    ///
    /// Does nothing if the item is already expanded.
    pub fn expand(&self, item: &Item<S>) -> Result<()> {
        self.mutate(|state| {
            let key = state.key_of(item)?;
            if state.tree.node(key)?.is_expanded {
                return Ok(());
            }
            state.expand_node(key)?;
            tracing::debug!(
                target: targets::FLAT,
                rows = state.tree.node(key)?.size - 1,
                "expanded item"
            );
            Ok(())
        })
    }

    /// Hide the descendants of `item`.
    ///
    /// Does nothing if the item is already collapsed.
    pub fn collapse(&self, item: &Item<S>) -> Result<()> {
        self.mutate(|state| {
            let key = state.key_of(item)?;
            let removed = state.collapse_node(key)?;
            tracing::debug!(target: targets::FLAT, rows = removed, "collapsed item");
            Ok(())
        })
    }

    /// Expand a collapsed item or collapse an expanded one.
    ///
    /// Returns the new expansion state.
    pub fn toggle(&self, item: &Item<S>) -> Result<bool> {
        self.mutate(|state| {
            let key = state.key_of(item)?;
            if state.tree.node(key)?.is_expanded {
                state.collapse_node(key)?;
                Ok(false)
            } else {
                state.expand_node(key)?;
                Ok(true)
            }
        })
    }

    /// Whether `item` is expanded.
    ///
    /// Fails with [`FlatError::ItemNotVisible`] if the item has no row.
    pub fn is_expanded(&self, item: &Item<S>) -> Result<bool> {
        self.read(|state| Ok(state.tree.node(state.key_of(item)?)?.is_expanded))?
    }

    /// The parent of `item`.
    ///
    /// Returns `None` for top-level items, for items without a row, and when
    /// called while the projector is busy.
    pub fn get_parent(&self, item: &Item<S>) -> Option<Item<S>> {
        self.read(|state| {
            let key = state.tree.key_of(item)?;
            let parent = state.tree.get(key)?.parent?;
            state.tree.get(parent)?.item.clone()
        })
        .ok()
        .flatten()
    }

    /// Number of visible rows.
    pub fn len(&self) -> Result<usize> {
        self.read(|state| state.tree.row_count())
    }

    /// Returns `true` if no row is visible.
    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    /// The flat row of `item`.
    pub fn index_of(&self, item: &Item<S>) -> Result<usize> {
        self.read(|state| {
            let key = state.key_of(item)?;
            state
                .tree
                .flat_index(key)
                .ok_or_else(|| FlatError::corrupted("visible node without a row"))
        })?
    }

    /// The item shown at flat row `index`.
    pub fn item_at(&self, index: usize) -> Result<Option<Item<S>>> {
        self.read(|state| {
            state
                .tree
                .node_at(index)
                .and_then(|key| state.tree.get(key))
                .and_then(|node| node.item.clone())
        })
    }

    /// Nesting level of `item`, 0 for top-level items.
    pub fn depth(&self, item: &Item<S>) -> Result<usize> {
        self.read(|state| {
            let key = state.key_of(item)?;
            state
                .tree
                .depth(key)
                .ok_or_else(|| FlatError::corrupted("visible node detached from the root"))
        })?
    }

    /// The visible items in row order.
    pub fn visible_items(&self) -> Result<Vec<Item<S>>> {
        self.read(|state| {
            state
                .tree
                .preorder()
                .into_iter()
                .filter_map(|key| state.tree.get(key).and_then(|node| node.item.clone()))
                .collect()
        })
    }

    /// A snapshot of the target's rows.
    pub fn containers(&self) -> Result<Vec<S::Container>> {
        self.with_target(|target| (0..target.len()).filter_map(|i| target.get(i)).collect())
    }

    /// Run `f` with read access to the target.
    pub fn with_target<R>(&self, f: impl FnOnce(&D) -> R) -> Result<R> {
        self.read(|state| f(&state.target))
    }

    /// Apply a change of `parent`'s children reported outside an
    /// [`ObservableList`](virtual_tree_core::ObservableList) subscription.
    ///
    /// `parent` is `None` for the top-level list. Changes for collapsed items,
    /// and for items hidden under a collapsed ancestor, are ignored. Errors are
    /// returned rather than triggering a resync.
    pub fn notify_children_changed(
        &self,
        parent: Option<&Item<S>>,
        change: &CollectionChange<Item<S>>,
    ) -> Result<()> {
        self.mutate(|state| {
            let key = match parent {
                Some(item) => match state.tree.key_of(item) {
                    Some(key) => key,
                    None => {
                        tracing::trace!(
                            target: targets::FLAT,
                            kind = change.kind(),
                            "ignoring change under an item without a row"
                        );
                        return Ok(());
                    }
                },
                None => state.tree.root(),
            };
            state.apply_change(key, change)
        })
    }

    /// Discard every row and rebuild from the source's current top-level list.
    pub fn reset(&self) -> Result<()> {
        let _span = PerfSpan::new("flat_collection_reset");
        self.mutate(|state| {
            let root = state.tree.root();
            state.reset_node(root)
        })
    }

    /// Verify the node tree caches and the target length.
    pub fn check_invariants(&self) -> Result<()> {
        self.read(FlatState::check_invariants)?
    }

    /// Render the visible tree as text, labelling items with `label`.
    pub fn debug_tree<L>(&self, options: TreeFormatOptions, label: L) -> Result<String>
    where
        L: Fn(&S::Item) -> String,
    {
        self.read(|state| format_tree(&state.tree, options, label))
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut FlatState<S, D>) -> Result<R>) -> Result<R> {
        let guard = self.shared.state.lock();
        let result = {
            let mut state = guard.try_borrow_mut().map_err(|_| FlatError::Reentrant)?;
            let result = f(&mut state);
            match result {
                Ok(value) if state.config.verify_invariants => {
                    state.check_invariants().map(|()| value)
                }
                other => other,
            }
        };
        self.shared.drain_pending(&guard);
        result
    }

    fn read<R>(&self, f: impl FnOnce(&FlatState<S, D>) -> R) -> Result<R> {
        let guard = self.shared.state.lock();
        let state = guard.try_borrow().map_err(|_| FlatError::Reentrant)?;
        Ok(f(&state))
    }
}

impl<S, D> Shared<S, D>
where
    S: HierarchicalSource,
    D: FlatTarget<S::Container>,
{
    fn on_children_changed(&self, node: NodeKey, token: u64, change: &CollectionChange<Item<S>>) {
        let guard = self.state.lock();
        let Ok(mut state) = guard.try_borrow_mut() else {
            tracing::trace!(
                target: targets::FLAT,
                kind = change.kind(),
                "notification during an update, queued"
            );
            self.pending.lock().push_back(PendingChange {
                node,
                token,
                change: change.clone(),
            });
            return;
        };
        state.handle_subscribed(node, token, change);
        drop(state);
        self.drain_pending(&guard);
    }

    fn drain_pending(&self, guard: &ReentrantMutexGuard<'_, RefCell<FlatState<S, D>>>) {
        loop {
            let Some(pending) = self.pending.lock().pop_front() else {
                return;
            };
            let Ok(mut state) = guard.try_borrow_mut() else {
                self.pending.lock().push_front(pending);
                return;
            };
            state.handle_subscribed(pending.node, pending.token, &pending.change);
        }
    }
}

impl<S, D> FlatState<S, D>
where
    S: HierarchicalSource,
    D: FlatTarget<S::Container>,
{
    fn key_of(&self, item: &Item<S>) -> Result<NodeKey> {
        self.tree.key_of(item).ok_or(FlatError::ItemNotVisible)
    }

    fn node_mut(&mut self, key: NodeKey) -> Result<&mut crate::node::FlatNode<S::Item>> {
        self.tree
            .get_mut(key)
            .ok_or_else(|| FlatError::corrupted("dangling node key"))
    }

    /// Entry point for notifications delivered by a node's subscription.
    fn handle_subscribed(&mut self, node: NodeKey, token: u64, change: &CollectionChange<Item<S>>) {
        let current = self
            .tree
            .get(node)
            .filter(|n| n.subscription.is_some())
            .map(|n| n.subscription_token);
        if current != Some(token) {
            tracing::trace!(
                target: targets::FLAT,
                kind = change.kind(),
                "ignoring notification from a released subscription"
            );
            return;
        }

        let result = self.apply_change(node, change).and_then(|()| {
            if self.config.verify_invariants {
                self.check_invariants()
            } else {
                Ok(())
            }
        });
        let Err(err) = result else {
            return;
        };
        if err.is_fatal() {
            panic!("{err}");
        }

        tracing::error!(
            target: targets::FLAT,
            error = %err,
            "notification does not match the projection, resynchronizing"
        );
        if let Err(err) = self.reset_node(node) {
            if err.is_fatal() {
                panic!("{err}");
            }
            tracing::error!(target: targets::FLAT, error = %err, "resynchronization failed");
        }
    }

    /// Apply `change` to the children of `key`.
    fn apply_change(&mut self, key: NodeKey, change: &CollectionChange<Item<S>>) -> Result<()> {
        if !self.is_shown_expanded(key) {
            tracing::trace!(
                target: targets::FLAT,
                kind = change.kind(),
                "ignoring change under a collapsed item"
            );
            return Ok(());
        }

        tracing::debug!(target: targets::FLAT, kind = change.kind(), "children changed");
        for op in normalize(change, self.config.move_policy)? {
            match op {
                ChangeOp::Insert { index, items } => {
                    let row = self.tree.insertion_row(key, index)?;
                    self.insert_items(key, index, row, &items)?;
                }
                ChangeOp::Remove { index, items } => {
                    for item in &items {
                        self.remove_child_item(key, index, item)?;
                    }
                }
                ChangeOp::Reset => self.reset_node(key)?,
            }
        }
        Ok(())
    }

    /// `true` when the node and all of its ancestors are expanded.
    fn is_shown_expanded(&self, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            match self.tree.get(k) {
                Some(node) if node.is_expanded => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Insert `items` as children `index..` of `parent`, starting at `row`.
    ///
    /// Returns the number of rows added.
    fn insert_items(&mut self, parent: NodeKey, index: usize, row: usize, items: &[Item<S>]) -> Result<usize> {
        let mut added = 0;
        for (offset, item) in items.iter().enumerate() {
            added += self.insert_item(parent, index + offset, row + added, item)?;
        }
        Ok(added)
    }

    /// Insert one item and, if the source says so, its visible subtree.
    fn insert_item(&mut self, parent: NodeKey, index: usize, row: usize, item: &Item<S>) -> Result<usize> {
        let key = self.tree.attach(parent, index, item.clone())?;
        let container = self.source.container_for_item(item);
        if let Err(err) = self.target.insert(row, container) {
            self.tree.detach(key)?;
            return Err(err.into());
        }
        tracing::trace!(target: targets::FLAT, row, "row inserted");

        if self.source.is_expanded(item) {
            self.expand_node(key)?;
        }
        Ok(self.tree.node(key)?.size)
    }

    /// Mark `key` expanded, subscribe to its children and insert them.
    fn expand_node(&mut self, key: NodeKey) -> Result<()> {
        let node = self.tree.node(key)?;
        let children = match &node.item {
            Some(item) => self.source.children(item),
            None => Some(self.source.source()),
        };
        self.node_mut(key)?.is_expanded = true;
        self.set_children_source(key, children.as_ref())?;

        if let Some(children) = children {
            let items = children.to_vec();
            let row = self
                .tree
                .first_child_row(key)
                .ok_or_else(|| FlatError::corrupted("expanding a detached node"))?;
            self.insert_items(key, 0, row, &items)?;
        }
        Ok(())
    }

    /// Remove the rows below `key` and release its subscription.
    ///
    /// Returns the number of rows removed.
    fn collapse_node(&mut self, key: NodeKey) -> Result<usize> {
        let node = self.tree.node(key)?;
        if !node.is_expanded {
            return Ok(0);
        }
        let hidden = node.size - 1;
        if hidden > 0 {
            let row = self
                .tree
                .first_child_row(key)
                .ok_or_else(|| FlatError::corrupted("collapsing a detached node"))?;
            self.target.remove_range(row, hidden)?;
        }
        self.tree.clear_children(key)?;

        let node = self.node_mut(key)?;
        node.is_expanded = false;
        if let Some(mut subscription) = node.subscription.take() {
            subscription.unsubscribe();
        }
        Ok(hidden)
    }

    /// Rebuild the children of `key` from the source.
    fn reset_node(&mut self, key: NodeKey) -> Result<()> {
        tracing::debug!(target: targets::FLAT, "resetting children");
        self.collapse_node(key)?;
        self.expand_node(key)
    }

    /// Remove the child of `parent` showing `item`, with its subtree.
    ///
    /// The child at `index` is taken when it shows `item`; otherwise the first
    /// child showing it is.
    fn remove_child_item(&mut self, parent: NodeKey, index: usize, item: &Item<S>) -> Result<()> {
        let shows_item = |k: NodeKey| {
            self.tree
                .get(k)
                .and_then(|node| node.item.as_ref())
                .is_some_and(|shown| Arc::ptr_eq(shown, item))
        };
        let children = self.tree.children(parent);
        let child = children
            .get(index)
            .copied()
            .filter(|&k| shows_item(k))
            .or_else(|| children.iter().copied().find(|&k| shows_item(k)))
            .ok_or(FlatError::ItemNotFound)?;

        let row = self
            .tree
            .flat_index(child)
            .ok_or_else(|| FlatError::corrupted("visible child without a row"))?;
        let rows = self.tree.node(child)?.size;
        self.target.remove_range(row, rows)?;
        self.tree.detach(child)?;
        tracing::trace!(target: targets::FLAT, row, rows, "rows removed");
        Ok(())
    }

    /// Replace the subscription of `key` with one on `children`.
    ///
    /// The previous subscription is always released first.
    fn set_children_source(&mut self, key: NodeKey, children: Option<&ItemList<S::Item>>) -> Result<()> {
        if let Some(mut old) = self.node_mut(key)?.subscription.take() {
            old.unsubscribe();
        }

        self.next_token += 1;
        let token = self.next_token;
        let subscription = children.map(|list| {
            let this = self.this.clone();
            list.subscribe(move |change| {
                if let Some(shared) = this.upgrade() {
                    shared.on_children_changed(key, token, change);
                }
            })
        });

        let node = self.node_mut(key)?;
        node.subscription = subscription;
        node.subscription_token = token;
        Ok(())
    }

    fn check_invariants(&self) -> Result<()> {
        self.tree.check_invariants()?;
        let rows = self.tree.row_count();
        if rows != self.target.len() {
            return Err(FlatError::Corrupted(format!(
                "{rows} visible nodes but {} target rows",
                self.target.len()
            )));
        }
        Ok(())
    }
}

impl<S, D> fmt::Debug for FlatCollection<S, D>
where
    S: HierarchicalSource,
    D: FlatTarget<S::Container>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("FlatCollection");
        if let Ok(rows) = self.len() {
            debug.field("rows", &rows);
        }
        debug.finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(
    FlatCollection<crate::ItemsSource<String>, Vec<Arc<String>>>: Send, Sync
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MovePolicy;
    use crate::source::ItemsSource;

    struct Node {
        name: &'static str,
        expanded: bool,
        children: ItemList<Node>,
    }

    fn node(name: &'static str, expanded: bool, children: Vec<Arc<Node>>) -> Arc<Node> {
        Arc::new(Node {
            name,
            expanded,
            children: ItemList::from_vec(children),
        })
    }

    fn leaf(name: &'static str) -> Arc<Node> {
        node(name, false, Vec::new())
    }

    fn source(roots: Vec<Arc<Node>>) -> ItemsSource<Node> {
        ItemsSource::new(ItemList::from_vec(roots))
            .children_fn(|n: &Arc<Node>| Some(n.children.clone()))
            .expanded_fn(|n| n.expanded)
    }

    fn names(flat: &FlatCollection<ItemsSource<Node>, Vec<Arc<Node>>>) -> Vec<&'static str> {
        flat.containers().unwrap().iter().map(|n| n.name).collect()
    }

    #[test]
    fn test_build_follows_expansion_flags() {
        let a = node("a", true, vec![leaf("a1"), node("a2", false, vec![leaf("a2x")])]);
        let flat = FlatCollection::new(source(vec![a, leaf("b")]), Vec::new()).unwrap();

        assert_eq!(names(&flat), vec!["a", "a1", "a2", "b"]);
        flat.check_invariants().unwrap();
    }

    #[test]
    fn test_rejects_non_empty_target() {
        let err = FlatCollection::new(source(vec![]), vec![leaf("stray")]).unwrap_err();
        assert_eq!(err, FlatError::TargetNotEmpty { len: 1 });
    }

    #[test]
    fn test_expand_collapse_toggle() {
        let a2 = node("a2", false, vec![leaf("a2x")]);
        let a = node("a", true, vec![leaf("a1"), a2.clone()]);
        let flat = FlatCollection::new(source(vec![a.clone(), leaf("b")]), Vec::new()).unwrap();

        flat.expand(&a2).unwrap();
        assert_eq!(names(&flat), vec!["a", "a1", "a2", "a2x", "b"]);

        assert!(!flat.toggle(&a).unwrap());
        assert_eq!(names(&flat), vec!["a", "b"]);
        assert!(flat.toggle(&a).unwrap());
        // a2 was discarded on collapse and comes back collapsed.
        assert_eq!(names(&flat), vec!["a", "a1", "a2", "b"]);
        flat.check_invariants().unwrap();
    }

    #[test]
    fn test_queries() {
        let a1 = leaf("a1");
        let a = node("a", true, vec![a1.clone()]);
        let b = leaf("b");
        let flat = FlatCollection::new(source(vec![a.clone(), b.clone()]), Vec::new()).unwrap();

        assert_eq!(flat.len().unwrap(), 3);
        assert_eq!(flat.index_of(&b).unwrap(), 2);
        assert_eq!(flat.depth(&a1).unwrap(), 1);
        assert!(Arc::ptr_eq(&flat.item_at(1).unwrap().unwrap(), &a1));
        assert!(flat.item_at(3).unwrap().is_none());
        assert!(Arc::ptr_eq(&flat.get_parent(&a1).unwrap(), &a));
        assert!(flat.get_parent(&a).is_none());
        assert_eq!(flat.visible_items().unwrap().len(), 3);

        let hidden = leaf("hidden");
        assert_eq!(flat.is_expanded(&hidden), Err(FlatError::ItemNotVisible));
        assert!(flat.get_parent(&hidden).is_none());
    }

    #[test]
    fn test_add_under_expanded_child() {
        let a = node("a", true, vec![node("a1", true, vec![leaf("a1x")]), leaf("a2")]);
        let flat = FlatCollection::new(source(vec![a.clone()]), Vec::new()).unwrap();

        a.children.insert(1, leaf("new")).unwrap();

        assert_eq!(names(&flat), vec!["a", "a1", "a1x", "new", "a2"]);
        flat.check_invariants().unwrap();
    }

    #[test]
    fn test_change_under_collapsed_item_is_ignored() {
        let a = node("a", false, vec![leaf("a1")]);
        let flat = FlatCollection::new(source(vec![a.clone()]), Vec::new()).unwrap();

        a.children.push(leaf("a2"));
        assert_eq!(names(&flat), vec!["a"]);

        flat.expand(&a).unwrap();
        assert_eq!(names(&flat), vec!["a", "a1", "a2"]);
    }

    #[test]
    fn test_notify_children_changed_reports_errors() {
        let a = node("a", true, vec![leaf("a1")]);
        let flat = FlatCollection::new(source(vec![a.clone()]), Vec::new()).unwrap();

        let missing = CollectionChange::Remove {
            index: 0,
            items: vec![leaf("ghost")],
        };
        assert_eq!(
            flat.notify_children_changed(Some(&a), &missing),
            Err(FlatError::ItemNotFound)
        );

        let moved = CollectionChange::Move {
            old_index: 0,
            new_index: 0,
            items: vec![a.clone()],
        };
        assert_eq!(
            flat.notify_children_changed(None, &moved),
            Err(FlatError::UnsupportedMove)
        );
    }

    #[test]
    fn test_notify_under_collapsed_ancestor_is_ignored() {
        let a1 = node("a1", true, vec![leaf("a1x")]);
        let a = node("a", false, vec![a1.clone()]);
        let flat = FlatCollection::new(source(vec![a.clone()]), Vec::new()).unwrap();

        let added = CollectionChange::Add {
            index: 1,
            items: vec![leaf("late")],
        };
        assert_eq!(flat.notify_children_changed(Some(&a), &added), Ok(()));
        assert_eq!(flat.notify_children_changed(Some(&a1), &added), Ok(()));
        assert_eq!(names(&flat), vec!["a"]);
        flat.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_picks_duplicate_at_change_index() {
        let x = leaf("x");
        let a = node("a", true, vec![x.clone(), leaf("y"), x.clone()]);
        let flat = FlatCollection::new(source(vec![a.clone()]), Vec::new()).unwrap();

        let removed = CollectionChange::Remove {
            index: 2,
            items: vec![x.clone()],
        };
        flat.notify_children_changed(Some(&a), &removed).unwrap();

        assert_eq!(names(&flat), vec!["a", "x", "y"]);
        assert_eq!(flat.index_of(&x).unwrap(), 1);
        flat.check_invariants().unwrap();
    }

    #[test]
    fn test_verify_invariants_config() {
        let a = node("a", true, vec![leaf("a1")]);
        let config = FlatCollectionConfig::new()
            .verify_invariants(true)
            .move_policy(MovePolicy::RemoveInsert);
        let flat = FlatCollection::with_config(source(vec![a.clone()]), Vec::new(), config).unwrap();

        a.children.push(leaf("a2"));
        a.children.move_item(1, 0).unwrap();
        assert_eq!(names(&flat), vec!["a", "a2", "a1"]);
    }

    #[test]
    fn test_dropping_collection_releases_subscriptions() {
        let a = node("a", true, vec![leaf("a1")]);
        let roots = ItemList::from_vec(vec![a.clone()]);
        let src = ItemsSource::new(roots.clone())
            .children_fn(|n: &Arc<Node>| Some(n.children.clone()))
            .expanded_fn(|n| n.expanded);

        let flat = FlatCollection::new(src, Vec::new()).unwrap();
        assert_eq!(roots.changed().connection_count(), 1);
        assert_eq!(a.children.changed().connection_count(), 1);

        drop(flat);
        assert_eq!(roots.changed().connection_count(), 0);
        assert_eq!(a.children.changed().connection_count(), 0);
    }

    #[test]
    fn test_debug_format() {
        let flat = FlatCollection::new(source(vec![leaf("only")]), Vec::new()).unwrap();
        assert!(format!("{flat:?}").contains("rows: 1"));
    }
}
