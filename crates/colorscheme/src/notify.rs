//! Ordered callback lists for single-threaded change notification.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback<T> = Rc<dyn Fn(T)>;

/// Callbacks invoked in registration order.
///
/// Dispatch iterates over a snapshot of the list, so a callback may subscribe,
/// unsubscribe or trigger another dispatch without hitting a `RefCell` borrow
/// conflict. Changes made during a dispatch take effect from the next one.
pub(crate) struct Listeners<T> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        }
    }
}

impl<T> Listeners<T> {
    pub(crate) fn add(&self, callback: Callback<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push((id, callback));
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Calls every callback with its own value from `make`.
    ///
    /// Returns the number of callbacks invoked.
    pub(crate) fn emit_with(&self, mut make: impl FnMut() -> T) -> usize {
        let snapshot: Vec<Callback<T>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();

        for callback in &snapshot {
            callback(make());
        }
        snapshot.len()
    }
}

impl<T> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}
