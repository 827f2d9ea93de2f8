//! Error types for the flat projector.

use virtual_tree_core::CollectionError;

/// Result type alias for projector operations.
pub type Result<T> = std::result::Result<T, FlatError>;

/// Errors that can occur while building or maintaining a flat projection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlatError {
    /// The projector was handed a target that already holds rows.
    #[error("Target sequence must be empty, found {len} rows")]
    TargetNotEmpty { len: usize },

    /// The item has no node: it is not currently visible.
    #[error("Item is not visible in the flat projection")]
    ItemNotVisible,

    /// A child index lies outside the node's visible children.
    #[error("Child index {index} is out of range for {len} visible children")]
    ChildIndexOutOfRange { index: usize, len: usize },

    /// A removed or replaced item could not be found among a node's children.
    #[error("Item not found among the visible children of its parent")]
    ItemNotFound,

    /// A move notification arrived while moves are rejected.
    #[error("Move notifications are not supported by the flat projector")]
    UnsupportedMove,

    /// The projector was called back into while it was already mutating.
    #[error("Reentrant call into the flat projector")]
    Reentrant,

    /// An internal invariant no longer holds.
    #[error("Flat projection corrupted: {0}")]
    Corrupted(String),

    /// The target sequence rejected an edit.
    #[error("Target rejected an edit: {0}")]
    Target(#[from] CollectionError),
}

impl FlatError {
    /// Create a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Returns `true` for errors after which the projection cannot be trusted.
    ///
    /// Fatal errors raised while handling a subscribed notification panic,
    /// while the others trigger a resynchronization of the affected node.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnsupportedMove | Self::Corrupted(_))
    }
}
