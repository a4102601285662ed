//! Edit notifications.
//!
//! A [`BufferObserver`] hears about every committed insert and erase, in the order the
//! buffer applied them. Undo history, selections and incremental reparsing are all built
//! on this contract.

use crate::{
    buffer::Buffer,
    error::{BufferError, Result},
    region::Region,
};
use std::sync::{Arc, Weak};

/// Receives the exact effect of every edit applied to a [`Buffer`].
///
/// Callbacks run synchronously on the thread that made the edit, after the storage has
/// changed. Mutating the buffer from inside a callback fails with
/// [`BufferError::BufferInCallbacks`]: every observer must see the current edit before
/// another one is made.
pub trait BufferObserver: Send + Sync {
    /// Called after an erase. Re-inserting `data_removed` at `region_removed.begin()`
    /// would restore the previous contents.
    fn erased(&self, buffer: &Buffer, region_removed: Region, data_removed: &[char]);

    /// Called after an insert. Erasing `region_inserted` would restore the previous
    /// contents.
    fn inserted(&self, buffer: &Buffer, region_inserted: Region, data_inserted: &[char]);
}

/// Observers in registration order, held weakly.
///
/// Entries are keyed by the address of the observer's allocation, so registering the
/// same `Arc` twice is detected regardless of the trait object's vtable.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: Vec<(usize, Weak<dyn BufferObserver>)>,
}

impl ObserverRegistry {
    pub fn add(&mut self, observer: &Arc<dyn BufferObserver>) -> Result<()> {
        self.prune();
        let key = key_of(observer);
        if self.observers.iter().any(|(k, _)| *k == key) {
            return Err(BufferError::ObserverAlreadyAdded);
        }
        self.observers.push((key, Arc::downgrade(observer)));
        Ok(())
    }

    pub fn remove(&mut self, observer: &Arc<dyn BufferObserver>) -> Result<()> {
        self.prune();
        let key = key_of(observer);
        let index = self
            .observers
            .iter()
            .position(|(k, _)| *k == key)
            .ok_or(BufferError::ObserverNotInList)?;
        self.observers.remove(index);
        Ok(())
    }

    /// Strong handles to every observer that is still alive, in registration order.
    pub fn live(&self) -> Vec<Arc<dyn BufferObserver>> {
        self.observers
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.observers
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    fn prune(&mut self) {
        self.observers.retain(|(_, weak)| weak.strong_count() > 0);
    }
}

fn key_of(observer: &Arc<dyn BufferObserver>) -> usize {
    Arc::as_ptr(observer) as *const () as usize
}
