//! An immutable, persistent (copy-on-write) trie mapping byte strings to
//! typed values.
//!
//! Every mutating operation returns a new `Trie` that structurally shares
//! all unmodified subtrees with its predecessor, so old versions stay valid
//! and readable forever. Values are stored behind shared, type-erased
//! references; `get` recovers the concrete type at the terminal node and
//! returns `None` on a mismatch.

mod node;
pub mod store;

pub use store::TrieStore;

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use node::{TrieNode, ValueRef};

/// A persistent trie, represented by a shared reference to its root.
/// Cloning a trie is a constant-time reference bump.
#[derive(Default, Clone)]
pub struct Trie {
    root: Option<Arc<TrieNode>>,
}

/// Keys may arrive with a C-style trailing NUL; it is not part of the key.
fn strip_trailing_nul(key: &[u8]) -> &[u8] {
    match key {
        [head @ .., 0] => head,
        _ => key,
    }
}

impl Trie {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the trie holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The nodes from the root toward `key`, stopping early where the trie
    /// runs out. Contains `key.len() + 1` entries iff the full key path
    /// exists.
    fn find_path(&self, key: &[u8]) -> Vec<&TrieNode> {
        let mut path = Vec::with_capacity(key.len() + 1);
        let Some(mut node) = self.root.as_deref() else {
            return path;
        };
        path.push(node);
        for byte in key {
            match node.children.get(byte) {
                Some(child) => {
                    node = child;
                    path.push(node);
                }
                None => break,
            }
        }
        path
    }

    /// Looks up `key` and returns the stored value if it exists and has
    /// dynamic type `T`. The empty key addresses the root.
    pub fn get<T: Any + Send + Sync>(&self, key: &[u8]) -> Option<&T> {
        let key = strip_trailing_nul(key);
        let path = self.find_path(key);
        if path.len() != key.len() + 1 {
            return None;
        }
        path[key.len()].value.as_ref()?.downcast_ref::<T>()
    }

    /// Like `get`, but hands out the shared value reference itself.
    pub(crate) fn get_value(&self, key: &[u8]) -> Option<ValueRef> {
        let key = strip_trailing_nul(key);
        let path = self.find_path(key);
        if path.len() != key.len() + 1 {
            return None;
        }
        path[key.len()].value.clone()
    }

    /// Returns a new trie in which `key` maps to `value`.
    ///
    /// The nodes along `key` are cloned (or freshly created where the old
    /// path ran out); the node displaced at the terminus keeps its children.
    /// Everything off the path is shared with the receiver.
    pub fn put<T: Any + Send + Sync>(&self, key: &[u8], value: T) -> Trie {
        let key = strip_trailing_nul(key);
        let value: ValueRef = Arc::new(value);
        let path = self.find_path(key);

        let mut interiors: Vec<TrieNode> = Vec::with_capacity(key.len());
        for depth in 0..key.len() {
            interiors.push(path.get(depth).map(|n| (**n).clone()).unwrap_or_default());
        }

        let terminal = TrieNode {
            children: path
                .get(key.len())
                .map(|n| n.children.clone())
                .unwrap_or_else(BTreeMap::new),
            value: Some(value),
        };

        // Rebuild bottom-up, rewiring each interior node to its new child.
        let mut child = Arc::new(terminal);
        for (depth, mut interior) in interiors.into_iter().enumerate().rev() {
            interior.children.insert(key[depth], child);
            child = Arc::new(interior);
        }
        Trie { root: Some(child) }
    }

    /// Returns a new trie in which `key` maps to nothing.
    ///
    /// If the key is absent (or present without a value) the receiver is
    /// returned unchanged. A terminal left with no children is pruned,
    /// together with every ancestor that is a non-value node with exactly
    /// one child; pruning all the way up yields the empty trie.
    pub fn remove(&self, key: &[u8]) -> Trie {
        let key = strip_trailing_nul(key);
        let path = self.find_path(key);
        if path.len() != key.len() + 1 || !path[key.len()].is_value_node() {
            return self.clone();
        }

        // Number of path nodes that survive the removal.
        let mut keep = path.len();
        if path[keep - 1].children.is_empty() {
            keep -= 1;
            while keep > 0 && !path[keep - 1].is_value_node() && path[keep - 1].children.len() == 1
            {
                keep -= 1;
            }
        }
        if keep == 0 {
            return Trie::default();
        }

        let tail = if keep == key.len() + 1 {
            // The terminal keeps its children and just loses its value.
            TrieNode {
                children: path[keep - 1].children.clone(),
                value: None,
            }
        } else {
            // The deepest survivor drops the edge into the pruned branch.
            let mut survivor = (*path[keep - 1]).clone();
            survivor.children.remove(&key[keep - 1]);
            survivor
        };

        let mut child = Arc::new(tail);
        for depth in (0..keep - 1).rev() {
            let mut interior = (*path[depth]).clone();
            interior.children.insert(key[depth], child);
            child = Arc::new(interior);
        }
        Trie { root: Some(child) }
    }
}
