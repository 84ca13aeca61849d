//! Collection metrics and statistics.

use std::time::Duration;

/// Type of collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum CollectionType {
    /// No collection has run yet.
    #[default]
    None = 0,
    /// Copying collection of the young semispaces.
    Minor = 1,
    /// Compaction of the old generation.
    Major = 2,
}

/// Statistics from the most recent collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcMetrics {
    /// Type of collection.
    pub collection_type: CollectionType,
    /// Wall-clock duration of the collection.
    pub duration: Duration,
    /// Objects copied into the other young semispace (minor only).
    pub objects_copied: usize,
    /// Objects promoted into the old generation (minor only).
    pub objects_promoted: usize,
    /// Objects slid to a lower address (major only).
    pub objects_moved: usize,
    /// Bytes, headers included, packed at the start of the arena the
    /// collection rebuilt (the new active young arena, or old).
    pub bytes_surviving: usize,
    /// Bytes, headers included, left as one free block at the end of that
    /// arena.
    pub bytes_reclaimed: usize,
    /// Collections of any kind run by this heap, this one included.
    pub total_collections: usize,
}

impl Default for GcMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GcMetrics {
    /// Create a new `GcMetrics` with all fields set to zero/defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            collection_type: CollectionType::None,
            duration: Duration::ZERO,
            objects_copied: 0,
            objects_promoted: 0,
            objects_moved: 0,
            bytes_surviving: 0,
            bytes_reclaimed: 0,
            total_collections: 0,
        }
    }
}

/// Cumulative counters for one heap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Minor collections completed.
    pub minor_collections: usize,
    /// Major collections completed.
    pub major_collections: usize,
    /// Objects promoted over the heap's lifetime.
    pub objects_promoted: usize,
    /// Managed allocations that succeeded.
    pub allocations: usize,
    /// Managed allocations that failed recoverably.
    pub failed_allocations: usize,
    /// Managed objects released.
    pub releases: usize,
}

impl HeapStats {
    /// Total collections of either kind.
    #[inline]
    #[must_use]
    pub const fn total_collections(&self) -> usize {
        self.minor_collections + self.major_collections
    }

    pub(crate) fn record(&mut self, metrics: &GcMetrics) {
        match metrics.collection_type {
            CollectionType::Minor => self.minor_collections += 1,
            CollectionType::Major => self.major_collections += 1,
            CollectionType::None => {}
        }
        self.objects_promoted += metrics.objects_promoted;
    }
}
