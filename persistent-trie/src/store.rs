//! A concurrent key-value store over the persistent trie.
//!
//! Readers snapshot the current root and walk it without any lock held;
//! writers serialize among themselves and publish a new root when done.
//! A reader therefore sees one consistent version for the duration of its
//! lookup, no matter how many writes land in the meantime.

use std::any::Any;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::Trie;

/// A value read from the store.
///
/// Holds a shared reference to the stored value, so it stays valid after
/// later `put`s or `remove`s drop the trie version it came from.
pub struct ValueHandle<T> {
    value: Arc<T>,
}

impl<T> ValueHandle<T> {
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T> Deref for ValueHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Single-writer/multiple-reader wrapper around "the current" trie.
#[derive(Default)]
pub struct TrieStore {
    /// The published root. Held only long enough to copy or swap it.
    root: Mutex<Trie>,
    /// Serializes writers so each one builds on the latest version.
    /// Readers never touch it.
    write_lock: Mutex<()>,
}

impl TrieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `key` in the current version. The returned handle keeps the
    /// value alive independently of subsequent writes.
    pub fn get<T: Any + Send + Sync>(&self, key: &[u8]) -> Option<ValueHandle<T>> {
        let snapshot = self.root.lock().clone();
        let value = snapshot.get_value(key)?.downcast::<T>().ok()?;
        Some(ValueHandle { value })
    }

    /// Maps `key` to `value` in a new version and publishes it.
    pub fn put<T: Any + Send + Sync>(&self, key: &[u8], value: T) {
        let _writer = self.write_lock.lock();
        let snapshot = self.root.lock().clone();
        // The rebuild happens without the root lock; readers keep
        // snapshotting the old version until the swap below.
        let next = snapshot.put(key, value);
        *self.root.lock() = next;
    }

    /// Removes `key` in a new version and publishes it.
    pub fn remove(&self, key: &[u8]) {
        let _writer = self.write_lock.lock();
        let snapshot = self.root.lock().clone();
        let next = snapshot.remove(key);
        *self.root.lock() = next;
    }
}
