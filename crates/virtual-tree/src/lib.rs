//! Flattening engine for virtualizing tree views.
//!
//! This crate projects a hierarchical, observable collection of items onto a
//! single flat sequence of visible rows, honoring expand and collapse state,
//! so a virtualizing panel can render only the rows scrolled into view:
//!
//! - **Sources**: [`HierarchicalSource`] describes a hierarchy; [`ItemsSource`]
//!   and [`ItemHierarchy`] are ready-made bindings
//! - **Targets**: [`FlatTarget`] receives the rows; implemented for `Vec` and
//!   [`ObservableList`]
//! - **Projector**: [`FlatCollection`] keeps the target in sync with every
//!   expand, collapse and children-list change
//!
//! Row positions are derived from per-node subtree sizes and sibling offsets
//! maintained incrementally, so an edit never rescans the rows.
//!
//! # Example
//!
//! ```
//! use virtual_tree::{FlatCollection, ItemHierarchy, ItemList, TreeItem};
//!
//! let src = TreeItem::with_children("src", true, vec![
//!     TreeItem::new("lib.rs"),
//!     TreeItem::new("main.rs"),
//! ]);
//! let roots = ItemList::from_vec(vec![src.clone(), TreeItem::new("Cargo.toml")]);
//!
//! let flat = FlatCollection::new(ItemHierarchy::new(roots), Vec::new()).unwrap();
//! let rows: Vec<_> = flat
//!     .containers()
//!     .unwrap()
//!     .iter()
//!     .map(|row| *row.value())
//!     .collect();
//! assert_eq!(rows, ["src", "lib.rs", "main.rs", "Cargo.toml"]);
//!
//! // Adding to an expanded item's children shows up immediately.
//! src.child_list().push(TreeItem::new("util.rs"));
//! assert_eq!(flat.index_of(&src.child_list().get(2).unwrap()).unwrap(), 3);
//! ```
//!
//! # Logging
//!
//! Operations are instrumented with `tracing` under the targets listed in
//! [`virtual_tree_core::logging::targets`].

mod change;
mod config;
mod debug;
mod error;
mod flat;
mod node;
mod source;
mod target;

pub use change::{ChangeOp, normalize};
pub use config::{FlatCollectionConfig, MovePolicy};
pub use error::{FlatError, Result};
pub use flat::FlatCollection;
pub use source::{
    HierarchicalItem, HierarchicalSource, ItemHierarchy, ItemHolder, ItemList, ItemsSource,
    TreeItem,
};
pub use target::FlatTarget;

pub use virtual_tree_core::{
    CollectionChange, CollectionError, ObservableList, Property, Subscription, TreeFormatOptions,
    TreeStyle,
};
