//! Asynchronous page I/O on a dedicated worker thread.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::trace;

use super::api::{PageId, PAGE_SIZE};
use super::disk_manager::DiskManager;

/// An owned page-sized buffer. Requests carry their buffer with them; read
/// completions hand the filled buffer back through the promise.
pub type PageBuf = Box<[u8; PAGE_SIZE]>;

/// The fulfilment side of a one-shot completion handle.
pub type DiskPromise = Sender<io::Result<PageBuf>>;

/// The waiting side of a one-shot completion handle.
pub struct DiskFuture {
    inner: Receiver<io::Result<PageBuf>>,
}

impl DiskFuture {
    /// Blocks until the scheduled request completes, returning the request's
    /// buffer (filled with page data for reads).
    pub fn wait(self) -> io::Result<PageBuf> {
        match self.inner.recv() {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "disk scheduler worker shut down before completing the request",
            )),
        }
    }
}

/// A request to perform disk I/O on one page.
pub struct DiskRequest {
    /// Whether this is a write (flush) or a read.
    pub is_write: bool,
    /// The page-sized buffer to write from or read into.
    pub data: PageBuf,
    /// The page being read from / written to disk.
    pub page_id: PageId,
    /// Fulfilled when the request has been processed.
    pub promise: DiskPromise,
}

/// Schedules page reads and writes on a background worker thread.
///
/// Requests are processed in the order they are scheduled. Worker I/O errors
/// are delivered through the request's promise and never kill the worker.
pub struct DiskScheduler {
    // `None` is the shutdown sentinel, sent once from Drop.
    sender: Sender<Option<DiskRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl DiskScheduler {
    /// Spawns the worker thread and returns the scheduler handle.
    pub fn new(disk_manager: Arc<DiskManager>) -> Self {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::spawn(move || Self::run_worker(disk_manager, receiver));

        Self {
            sender,
            worker: Some(worker),
        }
    }

    /// Creates a one-shot promise/future pair for a request.
    pub fn create_promise() -> (DiskPromise, DiskFuture) {
        let (tx, rx) = mpsc::channel();
        (tx, DiskFuture { inner: rx })
    }

    /// Enqueues a request for the worker. The caller observes completion
    /// through the future paired with the request's promise.
    pub fn schedule(&self, request: DiskRequest) {
        // The worker only exits after Drop sends the sentinel, so a live
        // scheduler handle implies a live receiver.
        let _ = self.sender.send(Some(request));
    }

    fn run_worker(disk_manager: Arc<DiskManager>, receiver: Receiver<Option<DiskRequest>>) {
        while let Ok(Some(request)) = receiver.recv() {
            let DiskRequest {
                is_write,
                mut data,
                page_id,
                promise,
            } = request;

            trace!(page_id, is_write, "processing disk request");

            let result = if is_write {
                disk_manager.write_page(page_id, &data[..]).map(|_| data)
            } else {
                disk_manager.read_page(page_id, &mut data[..]).map(|_| data)
            };

            // The requester may have given up waiting; that is not an error.
            let _ = promise.send(result);
        }
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        let _ = self.sender.send(None);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
