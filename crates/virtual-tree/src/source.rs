//! Hierarchy adapters.
//!
//! The projector reads hierarchies exclusively through [`HierarchicalSource`].
//! Two bindings are provided:
//!
//! - [`ItemsSource`]: children and expansion state are read through closures,
//!   and each row's container is the item itself.
//! - [`ItemHierarchy`]: items describe themselves by implementing
//!   [`HierarchicalItem`], and rows hold [`ItemHolder`] wrappers.
//!
//! [`TreeItem`] is a ready-made [`HierarchicalItem`].

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use virtual_tree_core::{ObservableList, Property};

/// An observable list of shared items, the collection type hierarchies are
/// built from.
pub type ItemList<T> = ObservableList<Arc<T>>;

/// Read-only access to a hierarchy of items.
///
/// All four operations must be cheap, safe to call repeatedly, and return
/// consistent answers between change notifications. Items are compared by
/// identity (`Arc::ptr_eq`), never by value.
pub trait HierarchicalSource: Send + Sync + 'static {
    /// The item type of the hierarchy.
    type Item: Send + Sync + 'static;
    /// The value placed into the flat target for each visible row.
    type Container: Clone + Send + Sync + 'static;

    /// The top-level items.
    fn source(&self) -> ItemList<Self::Item>;

    /// Whether `item` should show its children when it becomes visible.
    fn is_expanded(&self, item: &Arc<Self::Item>) -> bool;

    /// The children of `item`, or `None` if it has none.
    ///
    /// Successive calls may return different lists; the projector subscribes
    /// to whichever list it received when the item was expanded.
    fn children(&self, item: &Arc<Self::Item>) -> Option<ItemList<Self::Item>>;

    /// Create the row value for `item`.
    fn container_for_item(&self, item: &Arc<Self::Item>) -> Self::Container;
}

type ChildrenFn<T> = Arc<dyn Fn(&Arc<T>) -> Option<ItemList<T>> + Send + Sync>;
type ExpandedFn<T> = Arc<dyn Fn(&Arc<T>) -> bool + Send + Sync>;

/// A hierarchy described by a root list and two accessor closures.
///
/// Rows hold the items themselves. By default items have no children and
/// start collapsed.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use virtual_tree::{ItemList, ItemsSource};
///
/// struct Folder {
///     name: String,
///     entries: ItemList<Folder>,
/// }
///
/// let roots = ItemList::from_vec(vec![Arc::new(Folder {
///     name: "src".into(),
///     entries: ItemList::new(),
/// })]);
///
/// let source = ItemsSource::new(roots)
///     .children_fn(|folder: &Arc<Folder>| Some(folder.entries.clone()))
///     .expanded_fn(|_| true);
/// ```
pub struct ItemsSource<T> {
    roots: RwLock<ItemList<T>>,
    children: ChildrenFn<T>,
    is_expanded: ExpandedFn<T>,
}

impl<T: Send + Sync + 'static> ItemsSource<T> {
    /// Create a source over `roots` with no children and nothing expanded.
    pub fn new(roots: ItemList<T>) -> Self {
        Self {
            roots: RwLock::new(roots),
            children: Arc::new(|_| None),
            is_expanded: Arc::new(|_| false),
        }
    }

    /// Set the closure that returns an item's children.
    pub fn children_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Arc<T>) -> Option<ItemList<T>> + Send + Sync + 'static,
    {
        self.children = Arc::new(f);
        self
    }

    /// Set the closure that returns an item's expansion flag.
    pub fn expanded_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Arc<T>) -> bool + Send + Sync + 'static,
    {
        self.is_expanded = Arc::new(f);
        self
    }

    /// Swap the root list.
    ///
    /// The projector keeps listening to the previous list until it is reset.
    pub fn set_roots(&self, roots: ItemList<T>) {
        *self.roots.write() = roots;
    }
}

impl<T: Send + Sync + 'static> HierarchicalSource for ItemsSource<T> {
    type Item = T;
    type Container = Arc<T>;

    fn source(&self) -> ItemList<T> {
        self.roots.read().clone()
    }

    fn is_expanded(&self, item: &Arc<T>) -> bool {
        (self.is_expanded)(item)
    }

    fn children(&self, item: &Arc<T>) -> Option<ItemList<T>> {
        (self.children)(item)
    }

    fn container_for_item(&self, item: &Arc<T>) -> Arc<T> {
        item.clone()
    }
}

impl<T> fmt::Debug for ItemsSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemsSource").finish_non_exhaustive()
    }
}

/// An item that knows its own children and expansion state.
pub trait HierarchicalItem: Send + Sync + Sized + 'static {
    /// Whether the item should show its children when it becomes visible.
    fn is_expanded(&self) -> bool;

    /// The item's children, or `None` for a leaf.
    fn children(&self) -> Option<ItemList<Self>>;
}

/// The row value produced by [`ItemHierarchy`].
///
/// Holders compare equal when they wrap the same item.
pub struct ItemHolder<T>(Arc<T>);

impl<T> ItemHolder<T> {
    /// Wrap an item.
    pub fn new(item: Arc<T>) -> Self {
        Self(item)
    }

    /// The wrapped item.
    pub fn item(&self) -> &Arc<T> {
        &self.0
    }
}

impl<T> Clone for ItemHolder<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> PartialEq for ItemHolder<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for ItemHolder<T> {}

impl<T> Deref for ItemHolder<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for ItemHolder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ItemHolder").field(&self.0).finish()
    }
}

/// A hierarchy of self-describing items.
pub struct ItemHierarchy<T> {
    roots: ItemList<T>,
}

impl<T: HierarchicalItem> ItemHierarchy<T> {
    /// Create a hierarchy over `roots`.
    pub fn new(roots: ItemList<T>) -> Self {
        Self { roots }
    }

    /// The top-level list.
    pub fn roots(&self) -> &ItemList<T> {
        &self.roots
    }
}

impl<T: HierarchicalItem> HierarchicalSource for ItemHierarchy<T> {
    type Item = T;
    type Container = ItemHolder<T>;

    fn source(&self) -> ItemList<T> {
        self.roots.clone()
    }

    fn is_expanded(&self, item: &Arc<T>) -> bool {
        item.is_expanded()
    }

    fn children(&self, item: &Arc<T>) -> Option<ItemList<T>> {
        item.children()
    }

    fn container_for_item(&self, item: &Arc<T>) -> ItemHolder<T> {
        ItemHolder::new(item.clone())
    }
}

impl<T> fmt::Debug for ItemHierarchy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemHierarchy").finish_non_exhaustive()
    }
}

/// A general-purpose tree item carrying a value.
///
/// The expansion flag is an observable [`Property`]. It records the state an
/// item starts in when it becomes visible; changing it does not by itself
/// expand or collapse an existing projection.
pub struct TreeItem<V> {
    value: V,
    expanded: Property<bool>,
    children: ItemList<TreeItem<V>>,
}

impl<V: Send + Sync + 'static> TreeItem<V> {
    /// Create a collapsed item with no children.
    pub fn new(value: V) -> Arc<Self> {
        Self::with_children(value, false, Vec::new())
    }

    /// Create an item with the given expansion state and children.
    pub fn with_children(value: V, expanded: bool, children: Vec<Arc<TreeItem<V>>>) -> Arc<Self> {
        Arc::new(Self {
            value,
            expanded: Property::new(expanded),
            children: ItemList::from_vec(children),
        })
    }

    /// The carried value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// The expansion flag.
    pub fn expanded(&self) -> &Property<bool> {
        &self.expanded
    }

    /// The child list.
    pub fn child_list(&self) -> &ItemList<TreeItem<V>> {
        &self.children
    }
}

impl<V: Send + Sync + 'static> HierarchicalItem for TreeItem<V> {
    fn is_expanded(&self) -> bool {
        self.expanded.get()
    }

    fn children(&self) -> Option<ItemList<Self>> {
        Some(self.children.clone())
    }
}

impl<V: fmt::Debug> fmt::Debug for TreeItem<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeItem")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(ItemsSource<String>: Send, Sync);
static_assertions::assert_impl_all!(ItemHierarchy<TreeItem<String>>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_source_defaults() {
        let a = Arc::new("a");
        let source = ItemsSource::new(ItemList::from_vec(vec![a.clone()]));

        assert_eq!(source.source().len(), 1);
        assert!(!source.is_expanded(&a));
        assert!(source.children(&a).is_none());
        assert!(Arc::ptr_eq(&source.container_for_item(&a), &a));
    }

    #[test]
    fn test_items_source_closures() {
        let kids = ItemList::from_vec(vec![Arc::new(2)]);
        let kids_clone = kids.clone();
        let source = ItemsSource::new(ItemList::from_vec(vec![Arc::new(1)]))
            .children_fn(move |n: &Arc<i32>| (**n == 1).then(|| kids_clone.clone()))
            .expanded_fn(|n| **n == 1);

        let root = source.source().get(0).unwrap();
        assert!(source.is_expanded(&root));
        assert!(source.children(&root).unwrap().ptr_eq(&kids));
    }

    #[test]
    fn test_items_source_set_roots() {
        let source = ItemsSource::new(ItemList::from_vec(vec![Arc::new(1)]));
        let replacement = ItemList::from_vec(vec![Arc::new(7), Arc::new(8)]);

        source.set_roots(replacement.clone());
        assert!(source.source().ptr_eq(&replacement));
    }

    #[test]
    fn test_item_holder_identity() {
        let a = Arc::new(String::from("same"));
        let b = Arc::new(String::from("same"));

        assert_eq!(ItemHolder::new(a.clone()), ItemHolder::new(a.clone()));
        assert_ne!(ItemHolder::new(a.clone()), ItemHolder::new(b));
        assert_eq!(ItemHolder::new(a).len(), 4);
    }

    #[test]
    fn test_tree_item_hierarchy() {
        let leaf = TreeItem::new("leaf");
        let branch = TreeItem::with_children("branch", true, vec![leaf.clone()]);
        let hierarchy = ItemHierarchy::new(ItemList::from_vec(vec![branch.clone()]));

        assert!(hierarchy.is_expanded(&branch));
        assert!(!hierarchy.is_expanded(&leaf));
        let children = hierarchy.children(&branch).unwrap();
        assert!(Arc::ptr_eq(&children.get(0).unwrap(), &leaf));
        assert_eq!(*hierarchy.container_for_item(&branch).value(), "branch");
    }

    #[test]
    fn test_tree_item_expanded_property() {
        let item = TreeItem::new(0u8);
        assert!(!item.is_expanded());
        assert!(item.expanded().set(true));
        assert!(item.is_expanded());
    }
}
