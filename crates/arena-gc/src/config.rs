//! Heap configuration.

use crate::allocator::Strategy;
use crate::error::{GcError, Result};
use crate::header::{ALIGNMENT, HEADER_SIZE};

/// Capacity of each arena in bytes.
pub const DEFAULT_ARENA_CAPACITY: usize = 1024;

/// Minor collections an object must survive before it is promoted.
pub const DEFAULT_PROMOTION_THRESHOLD: u32 = 3;

/// Number of handle slots.
pub const DEFAULT_HANDLE_CAPACITY: usize = 128;

/// Settings fixed when a [`Heap`](crate::Heap) is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    /// Free-list search policy for managed allocation.
    pub strategy: Strategy,
    /// Bytes per arena. Must be a multiple of 8.
    pub arena_capacity: usize,
    /// Survived minor collections that trigger promotion. `u32::MAX` keeps
    /// every object in the young semispaces.
    pub promotion_threshold: u32,
    /// Maximum number of handle slots.
    pub handle_capacity: usize,
    /// Hand out emptied slots again instead of only growing the table.
    pub reuse_handle_slots: bool,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::FirstFit,
            arena_capacity: DEFAULT_ARENA_CAPACITY,
            promotion_threshold: DEFAULT_PROMOTION_THRESHOLD,
            handle_capacity: DEFAULT_HANDLE_CAPACITY,
            reuse_handle_slots: false,
        }
    }
}

impl HeapConfig {
    /// Default configuration with the given strategy.
    #[must_use]
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Check that the configuration describes a usable heap.
    ///
    /// # Errors
    ///
    /// Returns [`GcError::InvalidConfig`] naming the first rejected field.
    pub fn validate(&self) -> Result<()> {
        if self.arena_capacity % ALIGNMENT != 0 {
            return Err(GcError::InvalidConfig(
                "arena_capacity must be a multiple of 8",
            ));
        }
        if self.arena_capacity < HEADER_SIZE + ALIGNMENT {
            return Err(GcError::InvalidConfig(
                "arena_capacity must hold a header and 8 bytes",
            ));
        }
        if u32::try_from(self.arena_capacity).is_err() {
            return Err(GcError::InvalidConfig("arena_capacity exceeds u32 range"));
        }
        if self.handle_capacity == 0 || i32::try_from(self.handle_capacity).is_err() {
            return Err(GcError::InvalidConfig(
                "handle_capacity must be positive and fit in i32",
            ));
        }
        if self.promotion_threshold == 0 {
            return Err(GcError::InvalidConfig("promotion_threshold must be positive"));
        }
        Ok(())
    }
}
