//! Error types for virtual-tree core primitives.

use std::fmt;

/// Errors raised by observable collections and flat targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// An index was outside the valid range for the operation.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The collection length at the time of the call.
        len: usize,
    },
    /// A range extended past the end of the collection.
    RangeOutOfBounds {
        /// First index of the range.
        start: usize,
        /// Number of elements in the range.
        count: usize,
        /// The collection length at the time of the call.
        len: usize,
    },
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "Index {index} is out of range for a collection of length {len}")
            }
            Self::RangeOutOfBounds { start, count, len } => {
                write!(
                    f,
                    "Range of {count} elements starting at {start} exceeds collection length {len}"
                )
            }
        }
    }
}

impl std::error::Error for CollectionError {}

/// A specialized Result type for collection operations.
pub type Result<T> = std::result::Result<T, CollectionError>;
