//! Trie node representation.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A type-erased, shared reference to a stored value.
pub(crate) type ValueRef = Arc<dyn Any + Send + Sync>;

/// One trie node: children keyed by the next key byte, plus an optional
/// value. A node is a value node iff it carries a value.
///
/// Nodes are immutable once reachable from a published root; updates clone
/// the nodes along the affected path and share everything else. `Clone`
/// copies the child map (cheap Arc bumps), not the subtrees.
#[derive(Default, Clone)]
pub(crate) struct TrieNode {
    pub(crate) children: BTreeMap<u8, Arc<TrieNode>>,
    pub(crate) value: Option<ValueRef>,
}

impl TrieNode {
    pub(crate) fn is_value_node(&self) -> bool {
        self.value.is_some()
    }
}
