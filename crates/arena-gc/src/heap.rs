//! The collector context.
//!
//! A [`Heap`] owns everything the memory manager works on: the two young
//! semispaces, the old generation, the selector naming the active young
//! arena, and the handle table. Every operation takes the heap explicitly;
//! there is no ambient state.
//!
//! # Concurrency
//!
//! A heap is plain data with no internal locking. Operations run to
//! completion and never re-enter each other, which `&mut self` enforces.

use std::collections::BTreeSet;

use crate::allocator::{self, Strategy};
use crate::arena::{Address, Arena, ArenaId};
use crate::config::HeapConfig;
use crate::error::{GcError, Result};
use crate::handles::{Handle, HandleTable};
use crate::header::{BlockHeader, ALIGNMENT, HEADER_SIZE};
use crate::metrics::{GcMetrics, HeapStats};

/// A generational heap of three fixed-capacity arenas.
#[derive(Debug)]
pub struct Heap {
    pub(crate) config: HeapConfig,
    pub(crate) arenas: [Arena; 3],
    pub(crate) active: ArenaId,
    pub(crate) handles: HandleTable,
    pub(crate) last_metrics: GcMetrics,
    pub(crate) stats: HeapStats,
}

impl Heap {
    /// Create a heap with the default configuration and the given strategy.
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self::build(HeapConfig::with_strategy(strategy))
    }

    /// Create a heap from a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GcError::InvalidConfig`] if the configuration is rejected by
    /// [`HeapConfig::validate`].
    pub fn with_config(config: HeapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: HeapConfig) -> Self {
        let arenas = ArenaId::ALL.map(|id| {
            let mut arena = Arena::new(id, config.arena_capacity);
            allocator::init(&mut arena);
            arena
        });
        Self {
            config,
            arenas,
            active: ArenaId::YoungA,
            handles: HandleTable::new(config.handle_capacity, config.reuse_handle_slots),
            last_metrics: GcMetrics::new(),
            stats: HeapStats::default(),
        }
    }

    /// The configuration this heap was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// The free-list strategy used for managed allocation.
    #[inline]
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.config.strategy
    }

    /// The young arena new objects are allocated in.
    #[inline]
    #[must_use]
    pub const fn active_young(&self) -> ArenaId {
        self.active
    }

    /// Read-only access to one arena.
    #[inline]
    #[must_use]
    pub const fn arena(&self, id: ArenaId) -> &Arena {
        &self.arenas[id.index()]
    }

    /// Read-only access to the handle table.
    #[inline]
    #[must_use]
    pub const fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Statistics of the most recent collection.
    #[inline]
    #[must_use]
    pub const fn last_gc_metrics(&self) -> GcMetrics {
        self.last_metrics
    }

    /// Cumulative counters since the heap was created.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> HeapStats {
        self.stats
    }

    /// Allocate a managed object of `size` bytes in the active young arena.
    ///
    /// # Errors
    ///
    /// Returns [`GcError::HandleTableFull`] when no slot is available and
    /// [`GcError::OutOfMemory`] when the active arena has no block large
    /// enough. The heap is unchanged in both cases.
    pub fn allocate_managed(&mut self, size: usize) -> Result<Handle> {
        let result = self.try_allocate_managed(size);
        match &result {
            Ok(_) => self.stats.allocations += 1,
            Err(_err) => {
                self.stats.failed_allocations += 1;
                #[cfg(feature = "tracing")]
                crate::tracing::internal::log_alloc_failure(size, _err);
            }
        }
        result
    }

    fn try_allocate_managed(&mut self, size: usize) -> Result<Handle> {
        let handle = self.handles.next_slot().ok_or(GcError::HandleTableFull {
            capacity: self.handles.capacity(),
        })?;

        let arena = &mut self.arenas[self.active.index()];
        let address = allocator::allocate(arena, size, self.config.strategy)?;

        let offset = address.header_offset();
        let mut header = arena.header(offset);
        header.handle_index = Some(handle.index());
        arena.write_header(offset, &header);

        let stored = self.handles.insert(address);
        debug_assert_eq!(stored, Some(handle));
        Ok(handle)
    }

    /// Free a managed object and empty its slot.
    ///
    /// The block goes back to the free list of whichever arena it currently
    /// lives in. The slot is not handed out again unless slot reuse is
    /// enabled.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not refer to a live object: releasing twice,
    /// releasing an empty slot, or passing a handle from another heap are
    /// caller errors.
    pub fn release_managed(&mut self, handle: Handle) {
        let address = self
            .handles
            .take(handle)
            .unwrap_or_else(|| panic!("release of {handle}, which holds no object"));
        allocator::free(&mut self.arenas[address.arena.index()], address);
        self.stats.releases += 1;
    }

    /// Current address of the object behind `handle`.
    #[inline]
    #[must_use]
    pub fn resolve(&self, handle: Handle) -> Option<Address> {
        self.handles.get(handle)
    }

    /// Generation the object behind `handle` currently lives in.
    #[inline]
    #[must_use]
    pub fn generation(&self, handle: Handle) -> Option<ArenaId> {
        self.resolve(handle).map(|address| address.arena)
    }

    /// Header of the block behind `handle`.
    #[must_use]
    pub fn header(&self, handle: Handle) -> Option<BlockHeader> {
        let address = self.resolve(handle)?;
        Some(self.arena(address.arena).header(address.header_offset()))
    }

    /// Payload of the object behind `handle`.
    #[must_use]
    pub fn payload(&self, handle: Handle) -> Option<&[u8]> {
        let address = self.resolve(handle)?;
        Some(self.arena(address.arena).payload(address.header_offset()))
    }

    /// Mutable payload of the object behind `handle`.
    pub fn payload_mut(&mut self, handle: Handle) -> Option<&mut [u8]> {
        let address = self.resolve(handle)?;
        Some(self.arenas[address.arena.index()].payload_mut(address.header_offset()))
    }

    /// Run a copying collection of the young generation.
    ///
    /// Live young objects are copied into the other semispace, or promoted
    /// into the old generation once they have survived
    /// [`HeapConfig::promotion_threshold`] collections. The other semispace
    /// then becomes the active one.
    ///
    /// # Errors
    ///
    /// Returns the fatal [`GcError::PromotionFailed`] if the old generation
    /// cannot hold a promoted object. The collection stops at that object and
    /// the heap is left in an unspecified state.
    pub fn run_minor_collection(&mut self) -> Result<GcMetrics> {
        crate::gc::minor::collect(self)
    }

    /// Compact the old generation in place.
    pub fn run_major_collection(&mut self) -> GcMetrics {
        crate::gc::major::collect(self)
    }

    /// Check every structural invariant of the heap.
    ///
    /// - Each arena is exactly tiled by its blocks.
    /// - Each free list is address-ascending and holds exactly the free blocks.
    /// - Each occupied slot points at a used block whose header names that slot.
    ///
    /// # Errors
    ///
    /// Returns [`GcError::Corrupted`] describing the first violation found.
    pub fn verify(&self) -> Result<()> {
        let mut block_starts: [BTreeSet<usize>; 3] = Default::default();
        for arena in &self.arenas {
            block_starts[arena.id().index()] = verify_arena(arena)?;
        }

        for (handle, address) in self.handles.iter() {
            let arena = self.arena(address.arena);
            let Some(offset) = address.offset.checked_sub(HEADER_SIZE) else {
                return Err(corrupted(arena, address.offset, format!("{handle} precedes any header")));
            };
            if !block_starts[address.arena.index()].contains(&offset) {
                return Err(corrupted(arena, offset, format!("{handle} is not at a block start")));
            }
            let header = arena.header(offset);
            if header.free {
                return Err(corrupted(arena, offset, format!("{handle} points at a free block")));
            }
            if header.handle_index != Some(handle.index()) {
                return Err(corrupted(
                    arena,
                    offset,
                    format!("{handle} block names slot {:?}", header.handle_index),
                ));
            }
        }
        Ok(())
    }

    /// Split the arenas into `(from, to, old)` relative to the active young
    /// arena, alongside the handle table.
    pub(crate) fn generations_mut(
        &mut self,
    ) -> (&mut Arena, &mut Arena, &mut Arena, &mut HandleTable) {
        let [young_a, young_b, old] = &mut self.arenas;
        let (from, to) = if self.active == ArenaId::YoungA {
            (young_a, young_b)
        } else {
            (young_b, young_a)
        };
        (from, to, old, &mut self.handles)
    }

    pub(crate) fn finish_collection(&mut self, mut metrics: GcMetrics) -> GcMetrics {
        self.stats.record(&metrics);
        metrics.total_collections = self.stats.total_collections();
        self.last_metrics = metrics;
        metrics
    }
}

fn corrupted(arena: &Arena, offset: usize, reason: String) -> GcError {
    GcError::Corrupted {
        arena: arena.id(),
        offset,
        reason,
    }
}

/// Check tiling and free-list membership; return the set of block starts.
fn verify_arena(arena: &Arena) -> Result<BTreeSet<usize>> {
    let mut starts = BTreeSet::new();
    let mut free_blocks = BTreeSet::new();
    let mut walk = arena.blocks();
    for (offset, header) in walk.by_ref() {
        if header.size % ALIGNMENT != 0 {
            return Err(corrupted(arena, offset, format!("unaligned size {}", header.size)));
        }
        starts.insert(offset);
        if header.free {
            free_blocks.insert(offset);
        }
    }
    if walk.remainder() != arena.capacity() {
        return Err(corrupted(
            arena,
            walk.remainder(),
            "blocks do not tile the arena".to_owned(),
        ));
    }

    let mut listed = BTreeSet::new();
    let mut previous = None;
    for (offset, header) in arena.free_list() {
        if previous.is_some_and(|p| p >= offset) {
            return Err(corrupted(arena, offset, "free list out of address order".to_owned()));
        }
        if !header.free {
            return Err(corrupted(arena, offset, "used block on the free list".to_owned()));
        }
        previous = Some(offset);
        listed.insert(offset);
    }
    if listed != free_blocks {
        let offset = free_blocks
            .symmetric_difference(&listed)
            .next()
            .copied()
            .unwrap_or_default();
        return Err(corrupted(
            arena,
            offset,
            "free list does not match the free blocks".to_owned(),
        ));
    }
    Ok(starts)
}
