//! The buffer pool manager.
//!
//! Owns a fixed array of page frames and mediates between callers and the
//! disk: fetching pages into frames, allocating new pages, pinning,
//! flushing, and deleting. Frame metadata, the resident-page table, and the
//! free list live under one pool mutex; frame bytes live in per-frame
//! `RwLock`s so pinned pages can be read and written without the pool lock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use common::api::{AccessType, BufferPoolError, FrameId, PageId, Result, INVALID_PAGE_ID, PAGE_SIZE};
use common::disk_manager::DiskManager;
use common::disk_scheduler::{DiskRequest, DiskScheduler, PageBuf};

use crate::page_guard::PageGuard;
use crate::replacer::LruKReplacer;

/// Bookkeeping for one frame. The bytes themselves are kept outside the
/// pool mutex, in `BufferPoolManager::frame_data`.
#[derive(Debug)]
struct FrameMeta {
    page_id: PageId,
    pin_count: usize,
    is_dirty: bool,
}

#[derive(Debug)]
struct PoolState {
    frames: Vec<FrameMeta>,
    /// Maps each resident page to its frame. A frame id appears here iff
    /// its meta holds a valid page id.
    page_table: HashMap<PageId, FrameId>,
    /// Frames holding no live page. Every frame is in exactly one of the
    /// free list and the page table.
    free_list: Vec<FrameId>,
    /// Monotonic page-id allocator; ids are never reused.
    next_page_id: PageId,
    /// Ids retired by `delete_page`. Fetching one yields `None` instead of
    /// resurrecting the page from disk.
    deallocated: HashSet<PageId>,
}

/// A buffer pool of `pool_size` page frames with LRU-K replacement.
///
/// All public operations are atomic under the pool mutex except where noted
/// (`flush_page` drops it during the disk write after reserving the frame).
pub struct BufferPoolManager {
    state: Mutex<PoolState>,
    frame_data: Vec<RwLock<PageBuf>>,
    replacer: LruKReplacer,
    scheduler: DiskScheduler,
    pool_size: usize,
}

impl BufferPoolManager {
    /// Creates a pool of `pool_size` frames over `disk_manager`, with an
    /// LRU-K replacer using the given K.
    pub fn new(pool_size: usize, disk_manager: Arc<DiskManager>, replacer_k: usize) -> Self {
        let mut frames = Vec::with_capacity(pool_size);
        let mut frame_data = Vec::with_capacity(pool_size);
        let mut free_list = Vec::with_capacity(pool_size);

        for i in 0..pool_size {
            frames.push(FrameMeta {
                page_id: INVALID_PAGE_ID,
                pin_count: 0,
                is_dirty: false,
            });
            frame_data.push(RwLock::new(Box::new([0u8; PAGE_SIZE])));
            free_list.push(i);
        }

        Self {
            state: Mutex::new(PoolState {
                frames,
                page_table: HashMap::new(),
                free_list,
                next_page_id: 0,
                deallocated: HashSet::new(),
            }),
            frame_data,
            replacer: LruKReplacer::new(pool_size, replacer_k),
            scheduler: DiskScheduler::new(disk_manager),
            pool_size,
        }
    }

    /// Allocates a fresh page in a zeroed frame, pinned once.
    ///
    /// Fails with [`BufferPoolError::PoolExhausted`] when every frame is
    /// occupied and pinned.
    pub fn new_page(&self) -> Result<PageId> {
        self.new_page_inner().map(|(page_id, _)| page_id)
    }

    fn new_page_inner(&self) -> Result<(PageId, FrameId)> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let frame_id = self.acquire_frame(state)?;

        let page_id = state.next_page_id;
        state.next_page_id += 1;
        state.page_table.insert(page_id, frame_id);

        let meta = &mut state.frames[frame_id];
        meta.page_id = page_id;
        meta.pin_count = 1;
        meta.is_dirty = false;

        // Freshly acquired and pinned by us only: no guard can hold this
        // frame's lock.
        self.frame_data[frame_id].write().fill(0);

        self.replacer.record_access(frame_id, AccessType::Unknown);
        self.replacer.set_evictable(frame_id, false);

        debug!(page_id, frame_id, "allocated new page");
        Ok((page_id, frame_id))
    }

    /// Pins `page_id` into a frame, reading it from disk on a miss, and
    /// returns the frame id. The frame is pinned (pin count >= 1) and not
    /// evictable on return; the caller owes one `unpin_page`.
    ///
    /// Returns `Ok(None)` for ids that were never allocated or whose page
    /// has been deleted; fails with [`BufferPoolError::PoolExhausted`] when
    /// a miss finds every frame occupied and pinned.
    pub fn fetch_page(&self, page_id: PageId, access_type: AccessType) -> Result<Option<FrameId>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        // Ids that were never allocated, or whose page has been deleted,
        // do not come back from disk.
        if page_id >= state.next_page_id || state.deallocated.contains(&page_id) {
            return Ok(None);
        }

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            state.frames[frame_id].pin_count += 1;
            self.replacer.record_access(frame_id, access_type);
            self.replacer.set_evictable(frame_id, false);
            return Ok(Some(frame_id));
        }

        let frame_id = self.acquire_frame(state)?;

        state.page_table.insert(page_id, frame_id);
        let meta = &mut state.frames[frame_id];
        meta.page_id = page_id;
        meta.pin_count = 1;
        meta.is_dirty = false;

        self.replacer.record_access(frame_id, access_type);
        self.replacer.set_evictable(frame_id, false);

        // The read happens with the pool mutex held (the frame is pinned
        // but not yet visible to any guard, so its data lock is free).
        self.read_frame(frame_id, page_id)?;

        Ok(Some(frame_id))
    }

    /// Drops one pin on `page_id`, ORing `is_dirty` into the frame's dirty
    /// flag. The frame becomes evictable when the pin count reaches zero.
    ///
    /// Returns false if the page is not resident or was not pinned.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool, _access_type: AccessType) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };
        let meta = &mut state.frames[frame_id];
        if meta.pin_count == 0 {
            warn!(page_id, "unpin of a page that is not pinned");
            return false;
        }
        meta.pin_count -= 1;
        meta.is_dirty |= is_dirty;
        if meta.pin_count == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Writes `page_id`'s frame to disk if it is dirty and clears the dirty
    /// flag, regardless of pin state. Returns false if the page is not
    /// resident.
    ///
    /// For the write, the frame is reserved (pinned, non-evictable) and the
    /// pool mutex is released, so a concurrently held guard on the same
    /// page cannot deadlock with the flush.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let frame_id = {
            let mut guard = self.state.lock();
            let state = &mut *guard;

            let Some(&frame_id) = state.page_table.get(&page_id) else {
                return Ok(false);
            };
            let meta = &mut state.frames[frame_id];
            if !meta.is_dirty {
                return Ok(true);
            }
            meta.pin_count += 1;
            if meta.pin_count == 1 {
                self.replacer.set_evictable(frame_id, false);
            }
            frame_id
        };

        // The reservation pin keeps the mapping stable while the mutex is
        // released; blocking on the frame's data lock here is safe because
        // no lock is held.
        let result = self.write_frame(frame_id, page_id);

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let meta = &mut state.frames[frame_id];
        if result.is_ok() {
            meta.is_dirty = false;
        }
        meta.pin_count -= 1;
        if meta.pin_count == 0 {
            self.replacer.set_evictable(frame_id, true);
        }

        result.map(|_| true)
    }

    /// Flushes every resident page; clean frames are skipped.
    pub fn flush_all_pages(&self) -> Result<()> {
        let page_ids: Vec<PageId> = self.state.lock().page_table.keys().copied().collect();
        for page_id in page_ids {
            // A page deleted since the snapshot flushes vacuously.
            self.flush_page(page_id)?;
        }
        Ok(())
    }

    /// Deletes `page_id` from the pool, returning its frame to the free
    /// list. Returns true if the page is not resident (vacuously deleted),
    /// false if it is still pinned. The page id is never reallocated.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(true);
        };
        if state.frames[frame_id].pin_count > 0 {
            return Ok(false);
        }

        state.page_table.remove(&page_id);
        self.replacer.remove(frame_id);
        state.free_list.push(frame_id);

        let was_dirty = state.frames[frame_id].is_dirty;
        if was_dirty {
            // Pin count is zero, so no guard holds this frame's data lock.
            self.write_frame(frame_id, page_id)?;
        }

        let meta = &mut state.frames[frame_id];
        meta.page_id = INVALID_PAGE_ID;
        meta.is_dirty = false;
        self.frame_data[frame_id].write().fill(0);
        state.deallocated.insert(page_id);

        debug!(page_id, frame_id, "deleted page");
        Ok(true)
    }

    /// Pins `page_id` and returns a guard over its bytes; reads from disk
    /// on a miss. `Ok(None)` for unknown or deleted ids.
    pub fn fetch_page_guarded(
        &self,
        page_id: PageId,
        access_type: AccessType,
    ) -> Result<Option<PageGuard<'_>>> {
        let Some(frame_id) = self.fetch_page(page_id, access_type)? else {
            return Ok(None);
        };
        Ok(Some(PageGuard::new(self, page_id, frame_id, false)))
    }

    /// Allocates a new page and returns a guard over its (zeroed) bytes.
    pub fn new_page_guarded(&self) -> Result<PageGuard<'_>> {
        let (page_id, frame_id) = self.new_page_inner()?;
        // A new page starts dirty so its contents reach disk even if the
        // caller never writes through the guard.
        Ok(PageGuard::new(self, page_id, frame_id, true))
    }

    // ===== Observability =====

    /// The number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// The current pin count of `page_id`, or `None` if not resident.
    pub fn pin_count(&self, page_id: PageId) -> Option<usize> {
        let guard = self.state.lock();
        let frame_id = *guard.page_table.get(&page_id)?;
        Some(guard.frames[frame_id].pin_count)
    }

    /// Whether `page_id` currently occupies a frame.
    pub fn contains_page(&self, page_id: PageId) -> bool {
        self.state.lock().page_table.contains_key(&page_id)
    }

    /// The number of frames holding no page.
    pub fn free_frame_count(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// The number of pages resident in frames.
    pub fn resident_page_count(&self) -> usize {
        self.state.lock().page_table.len()
    }

    // ===== Internals =====

    pub(crate) fn frame_lock(&self, frame_id: FrameId) -> &RwLock<PageBuf> {
        &self.frame_data[frame_id]
    }

    /// Picks a frame for a new occupant: the free list first, then the
    /// replacer. An evicted victim loses its page-table entry before any
    /// I/O and is flushed if dirty.
    fn acquire_frame(&self, state: &mut PoolState) -> Result<FrameId> {
        if let Some(frame_id) = state.free_list.pop() {
            return Ok(frame_id);
        }

        let Some(frame_id) = self.replacer.evict() else {
            return Err(BufferPoolError::PoolExhausted);
        };

        let meta = &mut state.frames[frame_id];
        let evicted_page = meta.page_id;
        let was_dirty = meta.is_dirty;
        meta.page_id = INVALID_PAGE_ID;
        meta.is_dirty = false;
        state.page_table.remove(&evicted_page);

        if was_dirty {
            debug!(page_id = evicted_page, frame_id, "flushing dirty victim");
            // The victim was evictable, hence unpinned, hence unguarded.
            self.write_frame(frame_id, evicted_page)?;
        }

        Ok(frame_id)
    }

    /// Synchronously writes the frame's bytes to disk under `page_id`.
    fn write_frame(&self, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let data: PageBuf = {
            let frame = self.frame_data[frame_id].read();
            let mut buf: PageBuf = Box::new([0u8; PAGE_SIZE]);
            buf.copy_from_slice(&frame[..]);
            buf
        };

        let (promise, future) = DiskScheduler::create_promise();
        self.scheduler.schedule(DiskRequest {
            is_write: true,
            data,
            page_id,
            promise,
        });
        future.wait()?;
        Ok(())
    }

    /// Synchronously reads `page_id` from disk into the frame's bytes.
    fn read_frame(&self, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let (promise, future) = DiskScheduler::create_promise();
        self.scheduler.schedule(DiskRequest {
            is_write: false,
            data: Box::new([0u8; PAGE_SIZE]),
            page_id,
            promise,
        });
        let data = future.wait()?;

        let mut frame = self.frame_data[frame_id].write();
        frame.copy_from_slice(&data[..]);
        Ok(())
    }
}
