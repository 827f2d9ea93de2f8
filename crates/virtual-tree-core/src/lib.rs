//! Core reactive primitives for virtual-tree.
//!
//! This crate provides the observable building blocks the flat tree projector
//! is written against:
//!
//! - [`Signal`]: synchronous, reentrancy-tolerant signal/slot notifications
//! - [`Property`]: a value cell that announces effective changes
//! - [`ObservableList`]: a shared list that raises [`CollectionChange`]s
//! - [`logging`]: tracing targets, performance spans and a tree printer
//!
//! # Example
//!
//! ```
//! use virtual_tree_core::{CollectionChange, ObservableList};
//!
//! let list = ObservableList::from_vec(vec![1, 2, 3]);
//! let sub = list.subscribe(|change: &CollectionChange<i32>| {
//!     println!("list changed: {}", change.kind());
//! });
//!
//! list.remove(0).unwrap();
//! drop(sub);
//! ```

pub mod collection;
mod error;
pub mod logging;
pub mod property;
pub mod signal;

pub use collection::{CollectionChange, ObservableList, Subscription};
pub use error::{CollectionError, Result};
pub use logging::{PerfSpan, TreeFormatOptions, TreePrinter, TreeStyle};
pub use property::Property;
pub use signal::{ConnectionId, Signal};
