//! Observable collections.
//!
//! [`ObservableList<E>`] is a shared, mutable list that announces every
//! structural change through a [`Signal<CollectionChange<E>>`]. It is the
//! collection type hierarchical sources hand to the flat projector, and it can
//! also serve as the projector's target so a virtualizing view can follow the
//! flattened rows.
//!
//! # Identity
//!
//! `ObservableList` is a handle: cloning it yields another handle to the same
//! list. [`ObservableList::ptr_eq`] compares handles by identity.
//!
//! # Example
//!
//! ```
//! use virtual_tree_core::{CollectionChange, ObservableList};
//!
//! let list = ObservableList::from_vec(vec!["a", "b"]);
//! let _sub = list.subscribe(|change| {
//!     if let CollectionChange::Add { index, items } = change {
//!         println!("{} item(s) added at {}", items.len(), index);
//!     }
//! });
//!
//! list.push("c");
//! assert_eq!(list.to_vec(), vec!["a", "b", "c"]);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{CollectionError, Result};
use crate::logging::targets;
use crate::signal::{ConnectionId, Signal};

/// A structural change raised by an observable collection.
///
/// Indices are positions in the collection: `Add` and `Replace` refer to the
/// state after the change, `Remove` to the state before it, and `Move` gives
/// both the old and the new position of the moved run.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionChange<E> {
    /// `items` were inserted starting at `index`.
    Add { index: usize, items: Vec<E> },
    /// `items` were removed; they started at `index`.
    Remove { index: usize, items: Vec<E> },
    /// The run starting at `index` was replaced.
    Replace {
        index: usize,
        old_items: Vec<E>,
        new_items: Vec<E>,
    },
    /// `items` moved from `old_index` to `new_index`.
    Move {
        old_index: usize,
        new_index: usize,
        items: Vec<E>,
    },
    /// The contents changed wholesale; re-read the collection.
    Reset,
}

impl<E> CollectionChange<E> {
    /// A short name for the kind of change, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Replace { .. } => "replace",
            Self::Move { .. } => "move",
            Self::Reset => "reset",
        }
    }
}

struct ListInner<E> {
    items: RwLock<Vec<E>>,
    changed: Signal<CollectionChange<E>>,
}

/// A shared list that emits a [`CollectionChange`] after each mutation.
///
/// The storage lock is always released before the change is emitted, so slots
/// may read the list (but should not expect to observe intermediate states).
pub struct ObservableList<E> {
    inner: Arc<ListInner<E>>,
}

impl<E> Clone for ObservableList<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Clone + Send + Sync + 'static> Default for ObservableList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send + Sync + 'static> ObservableList<E> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Creates a list holding `items`.
    pub fn from_vec(items: Vec<E>) -> Self {
        Self {
            inner: Arc::new(ListInner {
                items: RwLock::new(items),
                changed: Signal::new(),
            }),
        }
    }

    /// Returns `true` if both handles refer to the same list.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.inner.items.read().len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.items.read().is_empty()
    }

    /// Returns a clone of the item at `index`.
    pub fn get(&self, index: usize) -> Option<E> {
        self.inner.items.read().get(index).cloned()
    }

    /// Returns a snapshot of the items.
    pub fn to_vec(&self) -> Vec<E> {
        self.inner.items.read().clone()
    }

    /// Provides read access to the items through a closure.
    pub fn with_items<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[E]) -> R,
    {
        f(&self.inner.items.read())
    }

    /// The signal emitted after each structural change.
    pub fn changed(&self) -> &Signal<CollectionChange<E>> {
        &self.inner.changed
    }

    /// Connects `slot` to the change signal for as long as the returned
    /// [`Subscription`] lives.
    pub fn subscribe<F>(&self, slot: F) -> Subscription<E>
    where
        F: Fn(&CollectionChange<E>) + Send + Sync + 'static,
    {
        let id = self.inner.changed.connect(slot);
        Subscription {
            list: self.clone(),
            id: Some(id),
        }
    }

    /// Flattens changes into per-item callbacks.
    ///
    /// `Replace` reports the old items as removed, then the new items as added.
    /// `Reset` re-announces every current item as added. `Move` does not change
    /// membership and reports nothing.
    pub fn on_add_remove<A, R>(&self, on_add: A, on_remove: R) -> Subscription<E>
    where
        A: Fn(&E) + Send + Sync + 'static,
        R: Fn(&E) + Send + Sync + 'static,
    {
        let list = Arc::downgrade(&self.inner);
        self.subscribe(move |change| match change {
            CollectionChange::Add { items, .. } => items.iter().for_each(&on_add),
            CollectionChange::Remove { items, .. } => items.iter().for_each(&on_remove),
            CollectionChange::Replace {
                old_items,
                new_items,
                ..
            } => {
                old_items.iter().for_each(&on_remove);
                new_items.iter().for_each(&on_add);
            }
            CollectionChange::Move { .. } => {}
            CollectionChange::Reset => {
                if let Some(inner) = list.upgrade() {
                    let current = inner.items.read().clone();
                    current.iter().for_each(&on_add);
                }
            }
        })
    }

    /// Appends an item.
    pub fn push(&self, item: E) {
        let index = {
            let mut items = self.inner.items.write();
            items.push(item.clone());
            items.len() - 1
        };
        self.emit(CollectionChange::Add {
            index,
            items: vec![item],
        });
    }

    /// Inserts an item at `index`.
    pub fn insert(&self, index: usize, item: E) -> Result<()> {
        self.insert_many(index, vec![item])
    }

    /// Inserts a run of items starting at `index`, raising a single `Add`.
    pub fn insert_many(&self, index: usize, new_items: Vec<E>) -> Result<()> {
        if new_items.is_empty() {
            return Ok(());
        }
        {
            let mut items = self.inner.items.write();
            if index > items.len() {
                return Err(CollectionError::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
            }
            items.splice(index..index, new_items.iter().cloned());
        }
        self.emit(CollectionChange::Add {
            index,
            items: new_items,
        });
        Ok(())
    }

    /// Removes and returns the item at `index`.
    pub fn remove(&self, index: usize) -> Result<E> {
        let mut removed = self.remove_range(index, 1)?;
        removed.pop().ok_or(CollectionError::IndexOutOfRange { index, len: 0 })
    }

    /// Removes `count` items starting at `index`, raising a single `Remove`.
    pub fn remove_range(&self, index: usize, count: usize) -> Result<Vec<E>> {
        let removed: Vec<E> = {
            let mut items = self.inner.items.write();
            let len = items.len();
            let end = index.checked_add(count).filter(|&end| end <= len);
            let Some(end) = end else {
                return Err(CollectionError::RangeOutOfBounds {
                    start: index,
                    count,
                    len,
                });
            };
            items.drain(index..end).collect()
        };
        if !removed.is_empty() {
            self.emit(CollectionChange::Remove {
                index,
                items: removed.clone(),
            });
        }
        Ok(removed)
    }

    /// Replaces the item at `index`, returning the previous one.
    pub fn replace(&self, index: usize, item: E) -> Result<E> {
        let old = {
            let mut items = self.inner.items.write();
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or(CollectionError::IndexOutOfRange { index, len })?;
            std::mem::replace(slot, item.clone())
        };
        self.emit(CollectionChange::Replace {
            index,
            old_items: vec![old.clone()],
            new_items: vec![item],
        });
        Ok(old)
    }

    /// Moves the item at `old_index` so it ends up at `new_index`.
    pub fn move_item(&self, old_index: usize, new_index: usize) -> Result<()> {
        let item = {
            let mut items = self.inner.items.write();
            let len = items.len();
            if old_index >= len {
                return Err(CollectionError::IndexOutOfRange {
                    index: old_index,
                    len,
                });
            }
            if new_index >= len {
                return Err(CollectionError::IndexOutOfRange {
                    index: new_index,
                    len,
                });
            }
            let item = items.remove(old_index);
            items.insert(new_index, item.clone());
            item
        };
        if old_index != new_index {
            self.emit(CollectionChange::Move {
                old_index,
                new_index,
                items: vec![item],
            });
        }
        Ok(())
    }

    /// Replaces all items, raising `Reset`.
    pub fn set_items(&self, items: Vec<E>) {
        crate::vtree_debug!(len = items.len(), "observable list contents replaced");
        *self.inner.items.write() = items;
        self.emit(CollectionChange::Reset);
    }

    /// Removes all items, raising `Reset`.
    pub fn clear(&self) {
        self.set_items(Vec::new());
    }

    fn emit(&self, change: CollectionChange<E>) {
        tracing::trace!(target: targets::COLLECTION, kind = change.kind(), "collection changed");
        self.inner.changed.emit(change);
    }
}

impl<E: Clone + Send + Sync + 'static> From<Vec<E>> for ObservableList<E> {
    fn from(items: Vec<E>) -> Self {
        Self::from_vec(items)
    }
}

impl<E: fmt::Debug> fmt::Debug for ObservableList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.items.read().iter()).finish()
    }
}

/// A live connection to an [`ObservableList`]'s change signal.
///
/// The connection is released exactly once: by [`unsubscribe`](Self::unsubscribe)
/// or when the subscription is dropped.
pub struct Subscription<E: Clone + Send + Sync + 'static> {
    list: ObservableList<E>,
    id: Option<ConnectionId>,
}

impl<E: Clone + Send + Sync + 'static> Subscription<E> {
    /// The list this subscription listens to.
    pub fn list(&self) -> &ObservableList<E> {
        &self.list
    }

    /// Returns `true` until the subscription has been released.
    pub fn is_active(&self) -> bool {
        self.id.is_some_and(|id| self.list.changed().is_connected(id))
    }

    /// Disconnects the slot. Calling this more than once is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(id) = self.id.take() {
            self.list.changed().disconnect(id);
        }
    }
}

impl<E: Clone + Send + Sync + 'static> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl<E: Clone + Send + Sync + 'static> fmt::Debug for Subscription<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(ObservableList<String>: Send, Sync);
static_assertions::assert_impl_all!(Subscription<String>: Send, Sync);
