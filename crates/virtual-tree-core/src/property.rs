//! Reactive properties with built-in change notification.
//!
//! A [`Property<T>`] wraps a value together with the [`Signal`] that announces
//! its changes. Hierarchy items use it for state the flat projector reads
//! lazily, such as an item's expansion flag.
//!
//! # Example
//!
//! ```
//! use virtual_tree_core::Property;
//!
//! let expanded = Property::new(false);
//! expanded.changed().connect(|now| println!("expanded: {now}"));
//!
//! assert!(expanded.set(true));   // emits `true`
//! assert!(!expanded.set(true));  // unchanged, nothing emitted
//! ```

use std::fmt;

use parking_lot::RwLock;

use crate::signal::Signal;

/// A value cell that detects and announces changes.
///
/// `set()` compares the new value with the current one and emits
/// [`changed`](Self::changed) only when they differ. The lock is released
/// before the signal fires, so slots may read the property.
pub struct Property<T> {
    value: RwLock<T>,
    changed: Signal<T>,
}

impl<T: Clone + Send + 'static> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
            changed: Signal::new(),
        }
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Set the value without change notification.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }

    /// The signal emitted with the new value after each effective change.
    pub fn changed(&self) -> &Signal<T> {
        &self.changed
    }
}

impl<T: Clone + PartialEq + Send + 'static> Property<T> {
    /// Set the value, returning `true` (and emitting) if it changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.write();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        self.changed.emit(value);
        true
    }
}

impl<T: Clone + Default + Send + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug + Send + 'static> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

static_assertions::assert_impl_all!(Property<bool>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_property_set_detects_change() {
        let prop = Property::new(42);
        assert_eq!(prop.get(), 42);
        assert!(!prop.set(42));
        assert!(prop.set(100));
        assert_eq!(prop.get(), 100);
    }

    #[test]
    fn test_property_emits_only_on_change() {
        let prop = Property::new(false);
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        prop.changed().connect(move |&value| {
            received_clone.lock().push(value);
        });

        prop.set(true);
        prop.set(true);
        prop.set(false);

        assert_eq!(*received.lock(), vec![true, false]);
    }

    #[test]
    fn test_property_set_silent() {
        let prop = Property::new(1);
        let count = Arc::new(Mutex::new(0));

        let count_clone = count.clone();
        prop.changed().connect(move |_| {
            *count_clone.lock() += 1;
        });

        prop.set_silent(2);
        assert_eq!(prop.get(), 2);
        assert_eq!(*count.lock(), 0);
    }

    #[test]
    fn test_slot_can_read_property() {
        let prop = Arc::new(Property::new(String::from("a")));
        let seen = Arc::new(Mutex::new(String::new()));

        let prop_clone = prop.clone();
        let seen_clone = seen.clone();
        prop.changed().connect(move |_| {
            *seen_clone.lock() = prop_clone.get();
        });

        prop.set("b".to_string());
        assert_eq!(*seen.lock(), "b");
    }

    #[test]
    fn test_property_with_closure() {
        let prop = Property::new(vec![1, 2, 3]);
        assert_eq!(prop.with(|v| v.len()), 3);
    }
}
