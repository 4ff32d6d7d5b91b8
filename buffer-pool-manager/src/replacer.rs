//! LRU-K replacement policy.
//!
//! Tracks per-frame access history and picks eviction victims by largest
//! backward K-distance: the frame whose K-th most recent access lies
//! furthest in the past. Frames with fewer than K recorded accesses have
//! infinite backward K-distance and evict first, ordered among themselves
//! by their oldest retained access (LRU).

use std::collections::{BTreeSet, HashMap, VecDeque};

use parking_lot::Mutex;
use tracing::trace;

use common::api::{AccessType, FrameId};

/// Sort key of a node in the eviction order.
///
/// The derived lexicographic `Ord` encodes the eviction comparator: nodes
/// with fewer than K accesses (`has_full_history = false`) order before
/// full-history nodes, and each group orders by oldest retained timestamp.
/// The frame id breaks ties and makes keys unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EvictKey {
    has_full_history: bool,
    oldest_ts: u64,
    frame_id: FrameId,
}

#[derive(Debug)]
struct LruKNode {
    /// Access timestamps, most recent first. Holds at most K entries.
    history: VecDeque<u64>,
    is_evictable: bool,
}

impl LruKNode {
    /// The node's current position key in the eviction order. Must be
    /// recomputed (and the queue entry replaced) whenever the history
    /// changes.
    fn evict_key(&self, frame_id: FrameId, k: usize) -> EvictKey {
        EvictKey {
            has_full_history: self.history.len() >= k,
            // A tracked node has at least one recorded access.
            oldest_ts: self.history.back().copied().expect("tracked frame with empty history"),
            frame_id,
        }
    }
}

#[derive(Debug, Default)]
struct ReplacerInner {
    node_store: HashMap<FrameId, LruKNode>,
    /// Evictable nodes only, ordered by `EvictKey`. Its first element is the
    /// next victim; its length is the evictable count.
    evict_queue: BTreeSet<EvictKey>,
    current_timestamp: u64,
}

/// The LRU-K replacer. All operations serialize on one internal mutex and
/// none of them performs I/O.
///
/// Operations on unknown frames, over-capacity tracking, and removal of a
/// pinned frame are caller bugs and panic.
#[derive(Debug)]
pub struct LruKReplacer {
    inner: Mutex<ReplacerInner>,
    max_size: usize,
    k: usize,
}

impl LruKReplacer {
    /// Creates a replacer able to track up to `num_frames` frames, using the
    /// K-th most recent access as the ordering key.
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k >= 1, "lru-k requires k >= 1");
        Self {
            inner: Mutex::new(ReplacerInner::default()),
            max_size: num_frames,
            k,
        }
    }

    /// Records an access to `frame_id` at the next timestamp.
    ///
    /// A frame seen for the first time starts tracking in the evictable
    /// state. Panics if that would exceed the replacer's capacity.
    pub fn record_access(&self, frame_id: FrameId, _access_type: AccessType) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        inner.current_timestamp += 1;
        let now = inner.current_timestamp;

        match inner.node_store.get_mut(&frame_id) {
            Some(node) => {
                // The history change moves the node's sort key; an evictable
                // node must leave the queue before the mutation and rejoin
                // after.
                if node.is_evictable {
                    inner.evict_queue.remove(&node.evict_key(frame_id, self.k));
                }
                node.history.push_front(now);
                if node.history.len() > self.k {
                    node.history.pop_back();
                }
                if node.is_evictable {
                    inner.evict_queue.insert(node.evict_key(frame_id, self.k));
                }
            }
            None => {
                if inner.node_store.len() >= self.max_size {
                    panic!("lru-k replacer over capacity: cannot track frame {frame_id}");
                }
                let node = LruKNode {
                    history: VecDeque::from([now]),
                    is_evictable: true,
                };
                inner.evict_queue.insert(node.evict_key(frame_id, self.k));
                inner.node_store.insert(frame_id, node);
            }
        }
    }

    /// Toggles whether `frame_id` may be evicted. Idempotent when the state
    /// already matches. Panics if the frame is not tracked.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let Some(node) = inner.node_store.get_mut(&frame_id) else {
            panic!("set_evictable on unknown frame {frame_id}");
        };
        if node.is_evictable == evictable {
            return;
        }
        node.is_evictable = evictable;
        if evictable {
            inner.evict_queue.insert(node.evict_key(frame_id, self.k));
        } else {
            inner.evict_queue.remove(&node.evict_key(frame_id, self.k));
        }
    }

    /// Evicts the frame with the largest backward K-distance, removing it
    /// from the replacer entirely. Returns `None` if nothing is evictable.
    pub fn evict(&self) -> Option<FrameId> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let key = inner.evict_queue.pop_first()?;
        inner.node_store.remove(&key.frame_id);
        trace!(frame_id = key.frame_id, "evicted frame");
        Some(key.frame_id)
    }

    /// Stops tracking `frame_id`. No-op if the frame is unknown; panics if
    /// the frame is tracked but pinned.
    pub fn remove(&self, frame_id: FrameId) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let Some(node) = inner.node_store.get(&frame_id) else {
            return;
        };
        if !node.is_evictable {
            panic!("remove on pinned frame {frame_id}");
        }
        inner.evict_queue.remove(&node.evict_key(frame_id, self.k));
        inner.node_store.remove(&frame_id);
    }

    /// The number of currently evictable frames.
    pub fn size(&self) -> usize {
        self.inner.lock().evict_queue.len()
    }
}
