//! RAII page guards.

use std::ops::{Deref, DerefMut};

use parking_lot::RwLockWriteGuard;

use common::api::{AccessType, FrameId, PageId};
use common::disk_scheduler::PageBuf;

use crate::buffer_pool::BufferPoolManager;

/// A smart pointer representing a pinned page.
///
/// The guard holds the frame's data lock, so it has exclusive access to the
/// page bytes for its lifetime. Mutable access marks the guard dirty; on
/// drop the guard releases the data lock and unpins the page exactly once,
/// handing the accumulated dirty flag to the pool.
pub struct PageGuard<'a> {
    bpm: &'a BufferPoolManager,
    page_id: PageId,
    frame_id: FrameId,
    is_dirty: bool,
    // `Some` for the guard's whole life; taken in Drop so the frame lock is
    // released before the pool mutex is touched.
    data: Option<RwLockWriteGuard<'a, PageBuf>>,
}

impl<'a> PageGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        page_id: PageId,
        frame_id: FrameId,
        is_dirty: bool,
    ) -> Self {
        // The pin taken by fetch/new keeps the frame resident; the data
        // lock is acquired without holding the pool mutex.
        let data = bpm.frame_lock(frame_id).write();
        Self {
            bpm,
            page_id,
            frame_id,
            is_dirty,
            data: Some(data),
        }
    }

    /// Returns the ID of the page being held.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// The frame this page currently occupies.
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }
}

impl Deref for PageGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data.as_ref().expect("page guard released early")[..]
    }
}

impl DerefMut for PageGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.is_dirty = true;
        &mut self.data.as_mut().expect("page guard released early")[..]
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        // Frame lock first, pool mutex second; flush takes them in the
        // opposite order and relies on this.
        self.data.take();
        self.bpm
            .unpin_page(self.page_id, self.is_dirty, AccessType::Unknown);
    }
}
