//! The shared document buffer.
//!
//! [`Buffer`] composes the layers of the text core:
//!
//! - a [`SerializedBuffer`] that owns the [`TextStorage`] on its own worker thread,
//! - an observer registry notified after every edit,
//! - a change counter and the document's name and file name.
//!
//! A buffer is meant to be shared as `Arc<Buffer>` between independent subsystems
//! (selection handling, background reparsing, undo). Reads go straight to the storage
//! worker. Mutations additionally hold a re-entrant edit lock, so concurrent writers are
//! applied and announced one at a time, and an `in_callbacks` flag that turns any
//! mutation made from inside an observer callback into
//! [`BufferError::BufferInCallbacks`].
//!
//! # Lifetime
//!
//! [`Buffer::close`] drains outstanding operations and releases the storage. Dropping the
//! buffer closes it too. Any operation on a closed buffer panics.

use crate::{
    config::{BufferConfig, ConfigError},
    error::{BufferError, Result},
    observer::{BufferObserver, ObserverRegistry},
    region::Region,
    serialized::SerializedBuffer,
    storage::{NaiveStorage, TextStorage},
};
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};
use tracing::{debug, trace, warn};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique buffer identifier. Ids start at 1 and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        Self(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Metadata {
    name: String,
    file_name: String,
    change_count: u64,
}

pub struct Buffer {
    id: BufferId,
    storage: SerializedBuffer,
    config: BufferConfig,
    /// Short-lived lock for fields readable from any thread at any time
    metadata: Mutex<Metadata>,
    observers: Mutex<ObserverRegistry>,
    /// Serializes mutations; re-entrant so a callback's nested mutation reaches the
    /// `in_callbacks` check instead of deadlocking.
    edit_lock: ReentrantMutex<()>,
    in_callbacks: AtomicBool,
}

/// Held for the whole of a mutation, observer dispatch included.
struct EditGuard<'a> {
    in_callbacks: &'a AtomicBool,
    _lock: ReentrantMutexGuard<'a, ()>,
}

impl Drop for EditGuard<'_> {
    fn drop(&mut self) {
        self.in_callbacks.store(false, Ordering::Release);
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    /// Create an empty buffer with the default configuration.
    pub fn new() -> Self {
        let config = BufferConfig::default();
        let storage = NaiveStorage::new(config.chunk_size);
        Self::from_parts(Box::new(storage), config)
    }

    /// Create an empty buffer, rejecting a config that fails [`BufferConfig::validate`].
    pub fn with_config(config: BufferConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let storage = NaiveStorage::new(config.chunk_size);
        Ok(Self::from_parts(Box::new(storage), config))
    }

    /// Create a buffer holding `text`. The initial text is not an edit: it does not bump
    /// the change count and is never reported to observers.
    pub fn with_text(text: &str) -> Self {
        let config = BufferConfig::default();
        let mut storage = NaiveStorage::new(config.chunk_size);
        storage.insert(0, &text.chars().collect::<Vec<_>>());
        Self::from_parts(Box::new(storage), config)
    }

    /// Wrap an arbitrary storage engine.
    pub fn with_storage(
        storage: Box<dyn TextStorage>,
        config: BufferConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(storage, config))
    }

    fn from_parts(storage: Box<dyn TextStorage>, config: BufferConfig) -> Self {
        let id = BufferId::next();
        debug!(buffer = %id, "creating buffer");
        Self {
            id,
            storage: SerializedBuffer::named(format!("quill-storage-{id}"), storage),
            config,
            metadata: Mutex::new(Metadata::default()),
            observers: Mutex::new(ObserverRegistry::default()),
            edit_lock: ReentrantMutex::new(()),
            in_callbacks: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    pub fn name(&self) -> String {
        self.metadata.lock().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) -> Result<()> {
        let _guard = self.begin_edit()?;
        self.metadata.lock().name = name.into();
        Ok(())
    }

    pub fn file_name(&self) -> String {
        self.metadata.lock().file_name.clone()
    }

    pub fn set_file_name(&self, file_name: impl Into<String>) -> Result<()> {
        let _guard = self.begin_edit()?;
        self.metadata.lock().file_name = file_name.into();
        Ok(())
    }

    /// Number of successful inserts and erases so far.
    pub fn change_count(&self) -> u64 {
        self.metadata.lock().change_count
    }

    /// Register an observer.
    ///
    /// The buffer only keeps a weak reference: the caller owns the observer, and dropping
    /// it is as good as removing it.
    pub fn add_observer(&self, observer: Arc<dyn BufferObserver>) -> Result<()> {
        let _guard = self.begin_edit()?;
        let mut observers = self.observers.lock();
        observers.add(&observer).inspect_err(|err| {
            warn!(buffer = %self.id, %err, "observer registration rejected");
        })?;
        debug!(buffer = %self.id, observers = observers.len(), "observer added");
        Ok(())
    }

    pub fn remove_observer(&self, observer: Arc<dyn BufferObserver>) -> Result<()> {
        let _guard = self.begin_edit()?;
        self.observers.lock().remove(&observer).inspect_err(|err| {
            warn!(buffer = %self.id, %err, "observer removal rejected");
        })
    }

    pub fn size(&self) -> Result<usize> {
        self.storage.size()
    }

    /// The code point at `pos`. Reading past the end is reported as a
    /// [`BufferError::Fault`].
    pub fn index(&self, pos: usize) -> Result<char> {
        self.storage.index(pos)
    }

    pub fn substr_r(&self, region: Region) -> Result<Vec<char>> {
        self.storage.substr(region)
    }

    pub fn substr(&self, region: Region) -> Result<String> {
        Ok(self.substr_r(region)?.into_iter().collect())
    }

    pub fn row_col(&self, point: usize) -> Result<(usize, usize)> {
        self.storage.row_col(point)
    }

    pub fn text_point(&self, row: usize, col: usize) -> Result<usize> {
        self.storage.text_point(row, col)
    }

    /// Run a read-only closure against the storage as one serialized operation, for
    /// queries that need several reads to see the same state.
    pub fn read<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn TextStorage) -> T + Send + 'static,
    {
        self.storage.execute(move |storage| f(storage))
    }

    /// Insert `data` at `point`, clamped to the end of the buffer.
    pub fn insert_r(&self, point: usize, data: &[char]) -> Result<()> {
        if data.is_empty() {
            return Err(BufferError::NothingToInsert);
        }
        let _guard = self.begin_edit()?;

        let owned = data.to_vec();
        let point = self.storage.execute(move |storage| {
            let point = point.min(storage.size());
            storage.insert(point, &owned);
            point
        })?;
        let region = Region::new(point, point + data.len());
        self.bump_change_count();
        trace!(buffer = %self.id, %region, "inserted");

        let observers = self.observers.lock().live();
        for observer in observers {
            observer.inserted(self, region, data);
        }
        Ok(())
    }

    pub fn insert(&self, point: usize, text: &str) -> Result<()> {
        if text.is_empty() {
            return Err(BufferError::NothingToInsert);
        }
        self.insert_r(point, &text.chars().collect::<Vec<_>>())
    }

    /// Erase up to `length` code points starting at `point`.
    ///
    /// The range is clamped to the buffer; if nothing is left to remove the call fails
    /// with [`BufferError::NothingToErase`] and observers are not notified.
    pub fn erase(&self, point: usize, length: usize) -> Result<()> {
        if length == 0 {
            return Err(BufferError::NothingToErase);
        }
        let _guard = self.begin_edit()?;

        let (region, removed) = self.storage.execute(move |storage| {
            let start = point.min(storage.size());
            let removed = storage.substr(Region::new(start, start.saturating_add(length)));
            storage.erase(start, removed.len());
            (Region::new(start, start + removed.len()), removed)
        })?;
        if removed.is_empty() {
            return Err(BufferError::NothingToErase);
        }
        self.bump_change_count();
        trace!(buffer = %self.id, %region, "erased");

        let observers = self.observers.lock().live();
        for observer in observers {
            observer.erased(self, region, &removed);
        }
        Ok(())
    }

    /// Drain pending operations and release the storage. Idempotent.
    pub fn close(&self) {
        debug!(buffer = %self.id, "closing buffer");
        self.storage.close();
    }

    pub fn is_closed(&self) -> bool {
        self.storage.is_closed()
    }

    fn begin_edit(&self) -> Result<EditGuard<'_>> {
        let lock = self.edit_lock.lock();
        if self
            .in_callbacks
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(buffer = %self.id, "rejected buffer mutation from inside an observer callback");
            return Err(BufferError::BufferInCallbacks);
        }
        Ok(EditGuard {
            in_callbacks: &self.in_callbacks,
            _lock: lock,
        })
    }

    fn bump_change_count(&self) {
        self.metadata.lock().change_count += 1;
    }
}

impl fmt::Display for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.metadata.lock();
        write!(
            f,
            "Buffer{{id: {}, name: \"{}\", filename: \"{}\"}}",
            self.id, metadata.name, metadata.file_name
        )
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
