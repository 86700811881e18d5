//! Guarded List
//!
//! A [`NodeStore`] behind a single mutex. The mutex covers the whole structural
//! invariant: every read of head/tail and every append/remove happens while it
//! is held, and nothing else does.
//!
//! # Take Flow
//!
//! ```text
//!   Consumer wants a value
//!         │
//!         ▼
//!   ┌──────────────────────┐
//!   │ lock()               │  ◄── blocks while the other end holds it
//!   └──────────┬───────────┘
//!              ▼
//!   ┌──────────────────────┐     none    ┌──────────────────┐
//!   │ read head / tail     ├────────────►│ unlock, None     │
//!   └──────────┬───────────┘             └──────────────────┘
//!              │ some
//!              ▼
//!   ┌──────────────────────┐
//!   │ remove node (O(1))   │
//!   │ capture its value    │
//!   └──────────┬───────────┘
//!              ▼
//!   ┌──────────────────────┐
//!   │ unlock, Some(value)  │  ──► caller folds the value outside the lock
//!   └──────────────────────┘
//! ```
//!
//! # Ordering
//!
//! The mutex totally orders takes from either end and the shutdown drain, so
//! each node is removed by exactly one of them.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::data_structures::{Direction, NodeId, NodeStore, NodeStoreError};

pub struct GuardedList<T> {
    store: Mutex<NodeStore<T>>,
}

impl<T> Default for GuardedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GuardedList<T> {
    pub fn new() -> Self {
        Self::with_store(NodeStore::new())
    }

    pub fn with_store(store: NodeStore<T>) -> Self {
        GuardedList {
            store: Mutex::new(store),
        }
    }

    pub fn append(&self, value: T) -> Result<NodeId, NodeStoreError> {
        self.lock().append(value)
    }

    /// Appends `count` values produced by `next_value`, holding the lock once.
    ///
    /// Stops at the first allocation failure. Nodes appended before the
    /// failure stay in the list and are freed with it.
    ///
    pub fn populate(
        &self,
        count: usize,
        mut next_value: impl FnMut() -> T,
    ) -> Result<(), NodeStoreError> {
        let mut store = self.lock();
        for _ in 0..count {
            store.append(next_value())?;
        }

        Ok(())
    }

    /// Removes the node at the given end and returns its value, or `None`
    /// when the list is empty. Read and removal share one critical section.
    ///
    pub fn take_from_end(&self, direction: Direction) -> Option<T> {
        let mut store = self.lock();
        let end = store.end(direction);
        store.remove(end)
    }

    /// Frees every node still in the list without handing values to anyone.
    /// Returns the number of nodes freed.
    ///
    pub fn force_drain(&self) -> usize {
        let freed = self.lock().clear();
        log::debug!("force drain freed {freed} nodes");
        freed
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn into_inner(self) -> NodeStore<T> {
        self.store.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    // Every critical section leaves the store consistent before running code
    // that can panic, so a poisoned lock still guards a valid list.
    //
    fn lock(&self) -> MutexGuard<'_, NodeStore<T>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
