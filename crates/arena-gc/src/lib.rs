//! A simulated generational memory manager.
//!
//! `arena-gc` manages three fixed-capacity byte arenas: two young semispaces
//! and an old generation. Objects are allocated from address-ordered free
//! lists and reached only through [`Handle`]s, indices into an indirection
//! table, so the collectors can move storage without invalidating callers.
//!
//! # Features
//!
//! - **Free-list allocation**: first-fit or best-fit search, tail splitting,
//!   no coalescing of adjacent free blocks
//! - **Copying minor collection**: survivors are packed into the other young
//!   semispace and promoted to the old generation after surviving
//!   [`HeapConfig::promotion_threshold`] collections
//! - **Compacting major collection**: the old generation is slid down in place
//! - **Explicit liveness**: an object lives until [`Heap::release_managed`];
//!   nothing traces references
//!
//! # Quick Start
//!
//! ```
//! use arena_gc::{ArenaId, Heap, Strategy};
//!
//! let mut heap = Heap::new(Strategy::BestFit);
//! let handle = heap.allocate_managed(12)?;
//! heap.payload_mut(handle).unwrap()[..5].copy_from_slice(b"hello");
//!
//! for _ in 0..3 {
//!     heap.run_minor_collection()?;
//! }
//! assert_eq!(heap.generation(handle), Some(ArenaId::Old));
//! assert_eq!(&heap.payload(handle).unwrap()[..5], b"hello");
//!
//! heap.release_managed(handle);
//! heap.run_major_collection();
//! # Ok::<(), arena_gc::GcError>(())
//! ```
//!
//! # Thread Safety
//!
//! A [`Heap`] is single-threaded plain data. Every operation takes `&mut self`
//! and runs to completion; there is no internal locking.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod allocator;
pub mod arena;
pub mod config;
pub mod dump;
mod error;
mod gc;
pub mod handles;
pub mod header;
mod heap;
mod metrics;
mod tracing;

// Re-export public API
pub use allocator::Strategy;
pub use arena::{Address, Arena, ArenaId};
pub use config::HeapConfig;
pub use dump::MemoryDump;
pub use error::{GcError, Result};
pub use handles::Handle;
pub use header::{BlockHeader, HEADER_SIZE};
pub use heap::Heap;
pub use metrics::{CollectionType, GcMetrics, HeapStats};
pub use crate::tracing::GcId;
