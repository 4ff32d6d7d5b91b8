use buffer_pool_manager::replacer::LruKReplacer;
use common::api::AccessType;
use test_case::test_case;

const ACCESS: AccessType = AccessType::Unknown;

#[test]
fn test_new_frame_starts_evictable() {
    let replacer = LruKReplacer::new(4, 2);
    assert_eq!(replacer.size(), 0);

    replacer.record_access(0, ACCESS);
    assert_eq!(replacer.size(), 1);

    replacer.record_access(1, ACCESS);
    assert_eq!(replacer.size(), 2);
}

#[test]
fn test_evict_prefers_infinite_distance() {
    // Frames 0 and 1 reach a full history of K accesses; frame 2 stays
    // below K and must evict first despite being touched last.
    let replacer = LruKReplacer::new(4, 2);
    replacer.record_access(0, ACCESS);
    replacer.record_access(0, ACCESS);
    replacer.record_access(1, ACCESS);
    replacer.record_access(1, ACCESS);
    replacer.record_access(2, ACCESS);

    assert_eq!(replacer.evict(), Some(2));

    // Among full-history frames, the one whose K-th most recent access is
    // oldest goes next.
    assert_eq!(replacer.evict(), Some(0));
    assert_eq!(replacer.evict(), Some(1));
    assert_eq!(replacer.evict(), None);
}

#[test]
fn test_under_k_frames_evict_in_lru_order() {
    // All frames have infinite backward K-distance; ties break by the
    // oldest retained access, so the least-recently-first-seen frame wins.
    let replacer = LruKReplacer::new(4, 3);
    replacer.record_access(10, ACCESS);
    replacer.record_access(20, ACCESS);
    replacer.record_access(30, ACCESS);
    replacer.record_access(20, ACCESS);

    assert_eq!(replacer.evict(), Some(10));
    assert_eq!(replacer.evict(), Some(20));
    assert_eq!(replacer.evict(), Some(30));
}

#[test]
fn test_full_history_ordering_follows_kth_access() {
    let replacer = LruKReplacer::new(4, 2);
    // Interleaved accesses: frame 0 at timestamps 1 and 3, frame 1 at 2
    // and 4. Frame 0's 2nd most recent access (1) is older than frame 1's
    // (2), so frame 0 evicts first.
    replacer.record_access(0, ACCESS);
    replacer.record_access(1, ACCESS);
    replacer.record_access(0, ACCESS);
    replacer.record_access(1, ACCESS);

    assert_eq!(replacer.evict(), Some(0));
    assert_eq!(replacer.evict(), Some(1));
}

#[test]
fn test_history_window_slides() {
    let replacer = LruKReplacer::new(4, 2);
    // Frame 0 accessed three times: the first access falls out of the
    // window, leaving timestamps 2 and 3.
    replacer.record_access(0, ACCESS);
    replacer.record_access(0, ACCESS);
    replacer.record_access(0, ACCESS);
    // Frame 1 at timestamps 4 and 5.
    replacer.record_access(1, ACCESS);
    replacer.record_access(1, ACCESS);

    // Frame 0's window-oldest access (2) predates frame 1's (4).
    assert_eq!(replacer.evict(), Some(0));
}

#[test]
fn test_set_evictable_controls_membership() {
    let replacer = LruKReplacer::new(4, 2);
    replacer.record_access(0, ACCESS);
    replacer.record_access(1, ACCESS);
    assert_eq!(replacer.size(), 2);

    replacer.set_evictable(0, false);
    assert_eq!(replacer.size(), 1);
    assert_eq!(replacer.evict(), Some(1));
    assert_eq!(replacer.evict(), None);

    // Idempotent in both directions.
    replacer.set_evictable(0, false);
    assert_eq!(replacer.size(), 0);
    replacer.set_evictable(0, true);
    replacer.set_evictable(0, true);
    assert_eq!(replacer.size(), 1);
    assert_eq!(replacer.evict(), Some(0));
}

#[test]
fn test_remove_unknown_frame_is_noop() {
    let replacer = LruKReplacer::new(4, 2);
    replacer.remove(3);
    assert_eq!(replacer.size(), 0);
}

#[test]
fn test_remove_evictable_frame() {
    let replacer = LruKReplacer::new(4, 2);
    replacer.record_access(0, ACCESS);
    replacer.record_access(1, ACCESS);
    replacer.remove(0);
    assert_eq!(replacer.size(), 1);
    assert_eq!(replacer.evict(), Some(1));
}

#[test]
#[should_panic(expected = "remove on pinned frame")]
fn test_remove_pinned_frame_panics() {
    let replacer = LruKReplacer::new(4, 2);
    replacer.record_access(0, ACCESS);
    replacer.set_evictable(0, false);
    replacer.remove(0);
}

#[test]
#[should_panic(expected = "unknown frame")]
fn test_set_evictable_unknown_frame_panics() {
    let replacer = LruKReplacer::new(4, 2);
    replacer.set_evictable(9, true);
}

#[test]
#[should_panic(expected = "over capacity")]
fn test_tracking_beyond_capacity_panics() {
    let replacer = LruKReplacer::new(1, 2);
    replacer.record_access(0, ACCESS);
    replacer.record_access(1, ACCESS);
}

#[test_case(1; "k equals 1")]
#[test_case(2; "k equals 2")]
#[test_case(5; "k equals 5")]
fn test_single_access_eviction_is_lru(k: usize) {
    // With one access per frame every history is the same length, so
    // eviction degenerates to LRU on the first access for any K.
    let replacer = LruKReplacer::new(8, k);
    for frame_id in 0..8 {
        replacer.record_access(frame_id, ACCESS);
    }
    for frame_id in 0..8 {
        assert_eq!(replacer.evict(), Some(frame_id));
    }
}

#[test]
fn test_eviction_removes_tracking() {
    let replacer = LruKReplacer::new(2, 2);
    replacer.record_access(0, ACCESS);
    assert_eq!(replacer.evict(), Some(0));

    // Frame 0 is no longer tracked: re-recording starts a fresh history
    // and does not exceed capacity.
    replacer.record_access(1, ACCESS);
    replacer.record_access(0, ACCESS);
    assert_eq!(replacer.evict(), Some(1));
    assert_eq!(replacer.evict(), Some(0));
}
