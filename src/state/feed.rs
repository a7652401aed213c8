//! Observable record feeds backed by `tokio::sync::watch`.
//!
//! Each run owns its own feed; consumers subscribe to a receiver and see
//! every published mutation, including per-fragment output growth. Mutations
//! go through `send_modify`, so concurrent fan-out phases (map, thought
//! generation) can update distinct indices without losing writes.

use tokio::sync::watch;

/// Live-updating ordered collection of run records.
#[derive(Debug)]
pub struct ProgressFeed<T: Clone> {
    tx: watch::Sender<Vec<T>>,
}

impl<T: Clone> ProgressFeed<T> {
    /// Create an empty feed.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self { tx }
    }

    /// Subscribe to record updates.
    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.tx.subscribe()
    }

    /// Replace all records. Called at run start; records are never merged
    /// across runs.
    pub fn replace(&self, records: Vec<T>) {
        self.tx.send_replace(records);
    }

    /// Mutate the records in place and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut Vec<T>)) {
        self.tx.send_modify(f);
    }

    /// Append one record.
    pub fn push(&self, record: T) {
        self.tx.send_modify(|records| records.push(record));
    }

    /// Clone the current records.
    pub fn snapshot(&self) -> Vec<T> {
        self.tx.borrow().clone()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    /// True when no records are held.
    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }
}

impl<T: Clone> Default for ProgressFeed<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Live-updating single-record slot for phases with exactly one record
/// (reduce step, plan step, final answer).
#[derive(Debug)]
pub struct SlotFeed<T: Clone> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> SlotFeed<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Subscribe to slot updates.
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.tx.subscribe()
    }

    /// Clear the slot. Called at run start.
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Put a record into the slot.
    pub fn set(&self, record: T) {
        self.tx.send_replace(Some(record));
    }

    /// Mutate the held record, if any, and notify subscribers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(|slot| {
            if let Some(record) = slot.as_mut() {
                f(record);
            }
        });
    }

    /// Clone the current record, if any.
    pub fn snapshot(&self) -> Option<T> {
        self.tx.borrow().clone()
    }
}

impl<T: Clone> Default for SlotFeed<T> {
    fn default() -> Self {
        Self::new()
    }
}
