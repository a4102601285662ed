//! Single-owner access to a [`TextStorage`].
//!
//! [`SerializedBuffer`] moves the storage onto a dedicated worker thread. Every read and
//! write is boxed into a closure, pushed onto a FIFO inbox and answered through a
//! one-shot reply channel, so no two operations ever touch the storage at the same time
//! and they apply in the order they reached the inbox.
//!
//! # Faults
//!
//! A closure that panics (for example [`TextStorage::index`] past the end) is caught at
//! the worker boundary. The caller receives [`BufferError::Fault`] and the worker goes on
//! serving the rest of the queue.
//!
//! # Shutdown
//!
//! [`SerializedBuffer::close`] closes the inbox, lets the worker drain what is already
//! queued, then joins it; the storage is dropped on the worker before `close` returns.
//! Dropping the wrapper closes it as well.

use crate::{
    error::{BufferError, Result},
    region::Region,
    storage::TextStorage,
};
use async_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    thread::{self, JoinHandle},
};
use tracing::{debug, error};

type Operation = Box<dyn FnOnce(&mut dyn TextStorage) + Send>;

pub struct SerializedBuffer {
    inbox: Mutex<Option<Sender<Operation>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SerializedBuffer {
    /// Move `storage` onto a new worker thread named `quill-storage`.
    pub fn new(storage: Box<dyn TextStorage>) -> Self {
        Self::named("quill-storage".to_string(), storage)
    }

    /// Move `storage` onto a new worker thread called `name`.
    ///
    /// # Panics
    ///
    /// If the OS refuses to create the thread, like [`std::thread::spawn`].
    pub fn named(name: String, storage: Box<dyn TextStorage>) -> Self {
        let (inbox, operations) = unbounded();
        let worker = match thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_worker(storage, operations))
        {
            Ok(worker) => worker,
            Err(err) => panic!("failed to spawn storage worker {name}: {err}"),
        };
        debug!(worker = %name, "storage worker started");

        Self {
            inbox: Mutex::new(Some(inbox)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Run `f` against the storage on the worker thread and wait for its result.
    ///
    /// `f` must not call back into this wrapper; the worker would wait on itself.
    ///
    /// # Panics
    ///
    /// If the wrapper has been closed. Using a closed buffer is a caller bug, not a
    /// recoverable condition.
    pub fn execute<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn TextStorage) -> T + Send + 'static,
    {
        let (reply_tx, reply_rx) = bounded(1);
        let operation: Operation = Box::new(move |storage: &mut dyn TextStorage| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| f(storage))).map_err(|payload| {
                let message = panic_message(payload.as_ref());
                error!(%message, "recovered from panic in storage operation");
                BufferError::Fault { message }
            });
            let _ = reply_tx.send_blocking(result);
        });

        let inbox = self.inbox.lock().clone();
        let accepted = inbox.is_some_and(|inbox| inbox.send_blocking(operation).is_ok());
        if !accepted {
            panic!("storage operation issued after the buffer was closed");
        }

        reply_rx.recv_blocking().unwrap_or_else(|_| {
            Err(BufferError::Fault {
                message: "storage worker dropped the reply".to_string(),
            })
        })
    }

    pub fn size(&self) -> Result<usize> {
        self.execute(|storage| storage.size())
    }

    pub fn index(&self, pos: usize) -> Result<char> {
        self.execute(move |storage| storage.index(pos))
    }

    pub fn substr(&self, region: Region) -> Result<Vec<char>> {
        self.execute(move |storage| storage.substr(region))
    }

    pub fn insert(&self, point: usize, data: Vec<char>) -> Result<()> {
        self.execute(move |storage| storage.insert(point, &data))
    }

    pub fn erase(&self, point: usize, length: usize) -> Result<()> {
        self.execute(move |storage| storage.erase(point, length))
    }

    pub fn row_col(&self, point: usize) -> Result<(usize, usize)> {
        self.execute(move |storage| storage.row_col(point))
    }

    pub fn text_point(&self, row: usize, col: usize) -> Result<usize> {
        self.execute(move |storage| storage.text_point(row, col))
    }

    #[cfg(test)]
    fn queued(&self) -> usize {
        self.inbox.lock().as_ref().map_or(0, |inbox| inbox.len())
    }

    pub fn is_closed(&self) -> bool {
        self.inbox.lock().is_none()
    }

    /// Stop accepting operations, drain the queue and release the storage.
    ///
    /// Safe to call more than once.
    pub fn close(&self) {
        let Some(inbox) = self.inbox.lock().take() else {
            return;
        };
        inbox.close();
        drop(inbox);

        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                error!("storage worker panicked while shutting down");
            }
        }
        debug!("storage worker closed");
    }
}

impl Drop for SerializedBuffer {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_worker(mut storage: Box<dyn TextStorage>, operations: Receiver<Operation>) {
    // The receiver keeps yielding queued operations after the channel is closed and only
    // errors once it is both closed and empty.
    while let Ok(operation) = operations.recv_blocking() {
        operation(storage.as_mut());
    }
    drop(storage);
    debug!("storage worker drained and released its storage");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
