//! Physical code-point storage.
//!
//! [`TextStorage`] is the minimal contract a backing store has to meet. Implementations
//! are not thread-safe; [`SerializedBuffer`](crate::serialized::SerializedBuffer) gives
//! them a single owner and a serial order.

use crate::{config::DEFAULT_CHUNK_SIZE, region::Region};

pub trait TextStorage: Send {
    /// Number of code points stored
    fn size(&self) -> usize;

    /// The code point at `pos`.
    ///
    /// # Panics
    ///
    /// If `pos >= self.size()`.
    fn index(&self, pos: usize) -> char;

    /// The code points inside `region`, clamped to the stored text.
    fn substr(&self, region: Region) -> Vec<char>;

    /// Insert `data` at `point`, clamped to `[0, size]`.
    fn insert(&mut self, point: usize, data: &[char]);

    /// Erase up to `length` code points starting at `point`, both clamped to the text.
    fn erase(&mut self, point: usize, length: usize);

    /// Convert an offset into a zero based `(row, column)`. Only `'\n'` ends a row.
    fn row_col(&self, point: usize) -> (usize, usize);

    /// Inverse of [`TextStorage::row_col`].
    fn text_point(&self, row: usize, col: usize) -> usize;
}

/// A single contiguous vector of code points.
///
/// Capacity grows in whole chunks so that a document typed one key at a time only
/// reallocates every `chunk_size` code points; inserts into existing capacity shift the
/// tail in place.
#[derive(Debug)]
pub struct NaiveStorage {
    data: Vec<char>,
    chunk_size: usize,
}

impl Default for NaiveStorage {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl NaiveStorage {
    /// `chunk_size` is rounded up to a power of two; see
    /// [`BufferConfig::validate`](crate::BufferConfig::validate).
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = chunk_size
            .max(1)
            .checked_next_power_of_two()
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        Self {
            data: Vec::new(),
            chunk_size,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    fn clamp(&self, offset: usize) -> usize {
        offset.min(self.data.len())
    }

    fn reserve_chunks(&mut self, required: usize) {
        if self.data.capacity() >= required {
            return;
        }
        let alloc = (required + self.chunk_size - 1) & !(self.chunk_size - 1);
        let mut grown = Vec::with_capacity(alloc);
        grown.extend_from_slice(&self.data);
        self.data = grown;
    }
}

impl TextStorage for NaiveStorage {
    fn size(&self) -> usize {
        self.data.len()
    }

    fn index(&self, pos: usize) -> char {
        self.data[pos]
    }

    fn substr(&self, region: Region) -> Vec<char> {
        let (start, end) = (self.clamp(region.begin()), self.clamp(region.end()));
        self.data[start..end].to_vec()
    }

    fn insert(&mut self, point: usize, data: &[char]) {
        if data.is_empty() {
            return;
        }
        let point = self.clamp(point);
        let old_len = self.data.len();
        self.reserve_chunks(old_len + data.len());

        self.data.resize(old_len + data.len(), '\0');
        self.data.copy_within(point..old_len, point + data.len());
        self.data[point..point + data.len()].copy_from_slice(data);
    }

    fn erase(&mut self, point: usize, length: usize) {
        let start = self.clamp(point);
        let end = self.clamp(start.saturating_add(length));
        if start == end {
            return;
        }
        self.data.drain(start..end);
    }

    fn row_col(&self, point: usize) -> (usize, usize) {
        let point = self.clamp(point);
        let mut row = 0;
        let mut col = 0;
        for &ch in &self.data[..point] {
            if ch == '\n' {
                row += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (row, col)
    }

    fn text_point(&self, row: usize, col: usize) -> usize {
        let len = self.data.len();
        let mut rows_left = row;
        let mut i = 0;
        while rows_left > 0 && i < len {
            if self.data[i] == '\n' {
                rows_left -= 1;
            }
            i += 1;
        }
        if i < len {
            i.saturating_add(col)
        } else {
            i
        }
    }
}
