//! Indirection table for managed objects.
//!
//! A caller never holds a block address directly. It holds a [`Handle`], the
//! index of a slot in the [`HandleTable`], and the slot holds the block's
//! current [`Address`]. Collectors rewrite slots when they move blocks, which
//! is what makes relocation invisible to callers.
//!
//! Slots are handed out in order and the table only grows, up to its
//! capacity. Releasing an object empties its slot but does not make the slot
//! available again unless slot reuse is explicitly enabled, so a table can run
//! out of slots while the arenas still have room.

use std::fmt;

use crate::arena::Address;

/// Stable reference to a managed object.
///
/// Handles are plain indices: copying one does not keep anything alive, and
/// using a handle after releasing it is a caller error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    /// Build a handle from a raw slot index.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Slot index this handle refers to.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

/// Capped table of slots, each empty or holding a live object's address.
#[derive(Debug, Clone)]
pub struct HandleTable {
    slots: Vec<Option<Address>>,
    capacity: usize,
    reuse_slots: bool,
}

impl HandleTable {
    /// Create an empty table with room for `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize, reuse_slots: bool) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            reuse_slots,
        }
    }

    /// Maximum number of slots.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots handed out so far, empty ones included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot has been handed out yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots currently holding an address.
    #[must_use]
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// The slot a new object would be stored in, if any is available.
    #[must_use]
    pub fn next_slot(&self) -> Option<Handle> {
        if self.reuse_slots {
            if let Some(index) = self.slots.iter().position(Option::is_none) {
                return Some(Handle(index));
            }
        }
        (self.slots.len() < self.capacity).then_some(Handle(self.slots.len()))
    }

    /// Store `address` in the next available slot.
    ///
    /// Returns `None` without modifying the table when it is full.
    pub fn insert(&mut self, address: Address) -> Option<Handle> {
        let handle = self.next_slot()?;
        if handle.0 == self.slots.len() {
            self.slots.push(Some(address));
        } else {
            self.slots[handle.0] = Some(address);
        }
        Some(handle)
    }

    /// Current address of `handle`, or `None` if the slot is empty or was
    /// never handed out.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<Address> {
        self.slots.get(handle.0).copied().flatten()
    }

    /// Point an occupied slot at a new address.
    ///
    /// # Panics
    ///
    /// Panics if the slot is empty: only live objects are relocated.
    pub fn relocate(&mut self, handle: Handle, address: Address) {
        let slot = self
            .slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("relocating {handle}, which holds no object"));
        *slot = address;
    }

    /// Empty the slot of `handle`, returning the address it held.
    pub fn take(&mut self, handle: Handle) -> Option<Address> {
        self.slots.get_mut(handle.0).and_then(Option::take)
    }

    /// Occupied slots in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, Address)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|address| (Handle(index), address)))
    }

    /// Every handed-out slot, empty ones included, in slot order.
    pub fn slots(&self) -> impl Iterator<Item = (Handle, Option<Address>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (Handle(index), *slot))
    }
}
