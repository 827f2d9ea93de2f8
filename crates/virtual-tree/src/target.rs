//! Flat target sequences.
//!
//! The projector writes rows into any [`FlatTarget`]. A plain `Vec` is enough
//! for tests and immediate-mode views; an [`ObservableList`] lets a
//! virtualizing panel follow the rows through its own change notifications.

use virtual_tree_core::{CollectionError, ObservableList};

/// An ordered, mutable sequence of row containers.
///
/// The projector owns its target exclusively and only edits it through
/// positional inserts and contiguous range removals.
pub trait FlatTarget<C>: Send + 'static {
    /// Number of rows.
    fn len(&self) -> usize;

    /// Returns `true` if there are no rows.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The row at `index`.
    fn get(&self, index: usize) -> Option<C>;

    /// Insert a row at `index`.
    fn insert(&mut self, index: usize, container: C) -> Result<(), CollectionError>;

    /// Remove `count` rows starting at `index`.
    fn remove_range(&mut self, index: usize, count: usize) -> Result<(), CollectionError>;
}

impl<C: Clone + Send + 'static> FlatTarget<C> for Vec<C> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> Option<C> {
        self.as_slice().get(index).cloned()
    }

    fn insert(&mut self, index: usize, container: C) -> Result<(), CollectionError> {
        if index > Vec::len(self) {
            return Err(CollectionError::IndexOutOfRange {
                index,
                len: Vec::len(self),
            });
        }
        Vec::insert(self, index, container);
        Ok(())
    }

    fn remove_range(&mut self, index: usize, count: usize) -> Result<(), CollectionError> {
        let len = Vec::len(self);
        match index.checked_add(count) {
            Some(end) if end <= len => {
                self.drain(index..end);
                Ok(())
            }
            _ => Err(CollectionError::RangeOutOfBounds {
                start: index,
                count,
                len,
            }),
        }
    }
}

impl<C: Clone + Send + Sync + 'static> FlatTarget<C> for ObservableList<C> {
    fn len(&self) -> usize {
        ObservableList::len(self)
    }

    fn get(&self, index: usize) -> Option<C> {
        ObservableList::get(self, index)
    }

    fn insert(&mut self, index: usize, container: C) -> Result<(), CollectionError> {
        ObservableList::insert(self, index, container)
    }

    fn remove_range(&mut self, index: usize, count: usize) -> Result<(), CollectionError> {
        ObservableList::remove_range(self, index, count).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<T: FlatTarget<char>>(target: &mut T) {
        assert!(target.is_empty());
        target.insert(0, 'a').unwrap();
        target.insert(1, 'd').unwrap();
        target.insert(1, 'b').unwrap();
        target.insert(2, 'c').unwrap();
        assert_eq!(target.len(), 4);
        assert_eq!(target.get(2), Some('c'));

        target.remove_range(1, 2).unwrap();
        assert_eq!(target.len(), 2);
        assert_eq!(target.get(1), Some('d'));

        assert!(target.insert(5, 'z').is_err());
        assert!(target.remove_range(1, 2).is_err());

        target.remove_range(0, 2).unwrap();
        assert!(target.is_empty());
    }

    #[test]
    fn test_vec_target() {
        exercise(&mut Vec::new());
    }

    #[test]
    fn test_observable_list_target() {
        let mut list = ObservableList::new();
        let view = list.clone();
        exercise(&mut list);
        assert!(view.is_empty());
    }

    #[test]
    fn test_observable_target_emits_changes() {
        use parking_lot::Mutex;
        use std::sync::Arc;

        let mut list = ObservableList::<u32>::new();
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let kinds_clone = kinds.clone();
        let _sub = list.subscribe(move |change| kinds_clone.lock().push(change.kind()));

        FlatTarget::insert(&mut list, 0, 1).unwrap();
        FlatTarget::remove_range(&mut list, 0, 1).unwrap();

        assert_eq!(*kinds.lock(), vec!["add", "remove"]);
    }
}
