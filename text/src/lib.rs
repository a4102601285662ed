//! Text core for the Quill editor
//!
//! This crate holds a document as a sequence of Unicode code points and makes it safe to
//! share between independent subsystems. Every read and write goes through a single
//! storage worker, and every committed edit is reported to registered observers with the
//! exact region and code points it affected.
//!
//! The key components are:
//! - [`region::Region`] and [`region_set::RegionSet`] - Offsets, selections and their algebra
//! - [`storage::TextStorage`] - The physical storage contract, implemented by [`storage::NaiveStorage`]
//! - [`serialized::SerializedBuffer`] - Runs storage operations one at a time on a worker thread
//! - [`buffer::Buffer`] - The shared document: edits, line and word queries, observers
//! - [`observer::BufferObserver`] - Hears about every insert and erase
//! - [`config::BufferConfig`] - Tuning knobs loadable from TOML

mod boundary;
pub mod buffer;
pub mod config;
pub mod error;
pub mod observer;
pub mod region;
pub mod region_set;
pub mod serialized;
pub mod storage;

pub use buffer::{Buffer, BufferId};
pub use config::{BufferConfig, ConfigError};
pub use error::{BufferError, Result};
pub use observer::BufferObserver;
pub use region::Region;
pub use region_set::RegionSet;
pub use serialized::SerializedBuffer;
pub use storage::{NaiveStorage, TextStorage};
