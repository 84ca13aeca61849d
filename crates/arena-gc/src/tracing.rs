//! Collection tracing support.
//!
//! When the `tracing` feature is enabled, this module provides structured
//! tracing spans and events for allocation and collection. Without the
//! feature every hook is a no-op.

/// Spans and events emitted during collection.
#[cfg(feature = "tracing")]
pub mod internal {
    use std::sync::atomic::{AtomicU64, Ordering};
    use tracing::{span, Level};

    use crate::arena::Address;
    use crate::handles::Handle;

    /// Stable identifier for a collection run.
    ///
    /// Correlates all events emitted during one collection. Monotonically
    /// increasing across every heap in the process, starting at 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GcId(pub u64);

    static NEXT_GC_ID: AtomicU64 = AtomicU64::new(1);

    /// Generate the next unique collection ID.
    pub fn next_gc_id() -> GcId {
        GcId(NEXT_GC_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Create a span for an entire collection.
    pub fn trace_gc_collection(collection_type: &str, gc_id: GcId) -> span::EnteredSpan {
        span!(
            Level::DEBUG,
            "gc_collect",
            collection_type = collection_type,
            gc_id = gc_id.0
        )
        .entered()
    }

    /// Log an object moving into the old generation.
    pub fn log_promotion(handle: Handle, from: Address, to: Address, size: usize) {
        tracing::debug!(
            handle = handle.index(),
            from = %from,
            to = %to,
            size,
            "promote"
        );
    }

    /// Log the outcome of a collection.
    pub fn log_collection_end(moved: usize, promoted: usize, bytes_reclaimed: usize) {
        tracing::debug!(moved, promoted, bytes_reclaimed, "collection_end");
    }

    /// Log a recoverable allocation failure.
    pub fn log_alloc_failure(size: usize, reason: &crate::GcError) {
        tracing::debug!(size, reason = %reason, "alloc_failed");
    }

    /// Log a fatal promotion failure.
    pub fn log_promotion_failure(handle: Handle, size: usize) {
        tracing::error!(handle = handle.index(), size, "old generation exhausted");
    }
}

/// No-op hooks used when the `tracing` feature is disabled.
#[cfg(not(feature = "tracing"))]
pub mod internal {
    /// Stub type when tracing is disabled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GcId(pub u64);

    /// Stub function when tracing is disabled.
    #[allow(dead_code)]
    pub const fn next_gc_id() -> GcId {
        GcId(0)
    }
}

pub use internal::GcId;
