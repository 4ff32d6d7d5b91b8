//! Page-granular file I/O.

use super::api::{PageId, PAGE_SIZE};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt; // Using positioned I/O for better concurrency
use std::path::Path;

/// Manages reading and writing pages to a file on disk.
///
/// Uses positioned I/O (`read_at`, `write_all_at`) so concurrent reads and
/// writes need no lock on the file. Page-id allocation is not this type's
/// business: the buffer pool owns the id counter.
#[derive(Debug)]
pub struct DiskManager {
    db_file: File,
}

impl DiskManager {
    /// Creates a new DiskManager for a given database file.
    pub fn new(db_file_path: impl AsRef<Path>) -> io::Result<Self> {
        let db_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(db_file_path)?;

        Ok(Self { db_file })
    }

    /// Reads a page from the database file into the provided buffer.
    ///
    /// A page that was allocated but never written lies past the end of the
    /// file; the unread tail of the buffer is zero-filled so such pages read
    /// as all zeroes.
    pub fn read_page(&self, page_id: PageId, data: &mut [u8]) -> io::Result<()> {
        let offset = page_id * PAGE_SIZE as u64;
        let mut filled = 0;
        while filled < data.len() {
            match self.db_file.read_at(&mut data[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        data[filled..].fill(0);
        Ok(())
    }

    /// Writes a page from the buffer into the database file.
    pub fn write_page(&self, page_id: PageId, data: &[u8]) -> io::Result<()> {
        let offset = page_id * PAGE_SIZE as u64;
        self.db_file.write_all_at(data, offset)
    }
}
