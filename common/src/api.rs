//! Defines the common API shared by the storage components.

use thiserror::Error;

/// A unique identifier for a page in the database.
pub type PageId = u64;

/// The index of a frame in the buffer pool. Stable for the process lifetime.
pub type FrameId = usize;

/// A sentinel for "no page". Page ids are allocated from zero upwards and
/// never reach this value.
pub const INVALID_PAGE_ID: PageId = PageId::MAX;

/// The size of a single page in bytes.
pub const PAGE_SIZE: usize = 4096;

/// The kind of access that caused a page to be touched.
///
/// Passed through to the replacement policy for future refinement; the
/// current LRU-K policy treats all access types alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessType {
    #[default]
    Unknown,
    Lookup,
    Scan,
    Index,
}

/// Errors surfaced by buffer pool operations.
///
/// Recoverable conditions ("page not resident", "still pinned") are reported
/// through the documented `bool`/`Option` returns instead; only conditions
/// the caller cannot reason away end up here.
#[derive(Debug, Error)]
pub enum BufferPoolError {
    /// The pool is full and no frame is evictable.
    #[error("buffer pool exhausted: no free or evictable frame")]
    PoolExhausted,

    /// An I/O error from the disk layer. Not recoverable at this level.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BufferPoolError>;
