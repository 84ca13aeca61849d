//! Fixed-capacity byte arenas.
//!
//! An arena is a contiguous byte buffer fully tiled by blocks: walking from
//! offset 0 by `HEADER_SIZE + size` always lands exactly on the arena end.
//! Addresses are `(ArenaId, offset)` pairs instead of raw pointers, so all
//! block arithmetic is explicit offset math on an owned buffer.

use std::fmt;

use crate::header::{BlockHeader, HEADER_SIZE};

/// Identifies one of the three arenas of a heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArenaId {
    /// First young semispace.
    YoungA,
    /// Second young semispace.
    YoungB,
    /// Old generation.
    Old,
}

impl ArenaId {
    /// All arenas, in index order.
    pub const ALL: [Self; 3] = [Self::YoungA, Self::YoungB, Self::Old];

    /// Position of this arena in a heap's arena array.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::YoungA => 0,
            Self::YoungB => 1,
            Self::Old => 2,
        }
    }

    /// Whether this arena belongs to the young generation.
    #[inline]
    #[must_use]
    pub const fn is_young(self) -> bool {
        !matches!(self, Self::Old)
    }

    /// The other member of the young semispace pair.
    ///
    /// `Old` has no partner and maps to itself.
    #[inline]
    #[must_use]
    pub const fn partner(self) -> Self {
        match self {
            Self::YoungA => Self::YoungB,
            Self::YoungB => Self::YoungA,
            Self::Old => Self::Old,
        }
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::YoungA => "young-a",
            Self::YoungB => "young-b",
            Self::Old => "old",
        };
        f.write_str(name)
    }
}

/// Location of a block payload.
///
/// `offset` is the payload offset; the block header sits at
/// `offset - HEADER_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    /// Arena holding the block.
    pub arena: ArenaId,
    /// Payload offset within the arena.
    pub offset: usize,
}

impl Address {
    /// Build the payload address of the block whose header is at `header_offset`.
    #[inline]
    #[must_use]
    pub const fn from_header(arena: ArenaId, header_offset: usize) -> Self {
        Self {
            arena,
            offset: header_offset + HEADER_SIZE,
        }
    }

    /// Offset of this block's header.
    ///
    /// # Panics
    ///
    /// Panics if the offset is smaller than a header, which no payload
    /// address can be.
    #[inline]
    #[must_use]
    pub fn header_offset(self) -> usize {
        self.offset
            .checked_sub(HEADER_SIZE)
            .expect("payload address precedes its header")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.arena, self.offset)
    }
}

/// One arena: owned storage plus the head of its free list.
pub struct Arena {
    id: ArenaId,
    bytes: Box<[u8]>,
    pub(crate) free_head: Option<usize>,
}

impl Arena {
    /// Create a zeroed arena.
    ///
    /// The arena is not usable for allocation until
    /// [`allocator::init`](crate::allocator::init) tiles it with a free block.
    #[must_use]
    pub fn new(id: ArenaId, capacity: usize) -> Self {
        Self {
            id,
            bytes: vec![0; capacity].into_boxed_slice(),
            free_head: None,
        }
    }

    /// Which arena this is.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ArenaId {
        self.id
    }

    /// Capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Header offset of the first free-list block.
    #[inline]
    #[must_use]
    pub const fn free_head(&self) -> Option<usize> {
        self.free_head
    }

    /// Whether `address` points into this arena.
    #[inline]
    #[must_use]
    pub fn contains(&self, address: Address) -> bool {
        address.arena == self.id && address.offset < self.bytes.len()
    }

    /// Zero every byte and drop the free list.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.free_head = None;
    }

    /// Decode the header at `header_offset`.
    #[inline]
    #[must_use]
    pub fn header(&self, header_offset: usize) -> BlockHeader {
        BlockHeader::read(&self.bytes[header_offset..header_offset + HEADER_SIZE])
    }

    /// Encode `header` at `header_offset`.
    #[inline]
    pub fn write_header(&mut self, header_offset: usize, header: &BlockHeader) {
        header.write(&mut self.bytes[header_offset..header_offset + HEADER_SIZE]);
    }

    /// Payload bytes of the block whose header is at `header_offset`.
    #[must_use]
    pub fn payload(&self, header_offset: usize) -> &[u8] {
        let header = self.header(header_offset);
        let start = header_offset + HEADER_SIZE;
        &self.bytes[start..start + header.size]
    }

    /// Mutable payload bytes of the block whose header is at `header_offset`.
    pub fn payload_mut(&mut self, header_offset: usize) -> &mut [u8] {
        let header = self.header(header_offset);
        let start = header_offset + HEADER_SIZE;
        &mut self.bytes[start..start + header.size]
    }

    /// Raw bytes of `len` starting at `offset`.
    #[inline]
    #[must_use]
    pub fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        &self.bytes[offset..offset + len]
    }

    /// Copy `len` bytes from `src` to `dst` within this arena. Ranges may overlap.
    #[inline]
    pub fn copy_within(&mut self, src: usize, dst: usize, len: usize) {
        self.bytes.copy_within(src..src + len, dst);
    }

    /// Copy `src` into this arena at `dst`.
    #[inline]
    pub fn copy_from(&mut self, dst: usize, src: &[u8]) {
        self.bytes[dst..dst + src.len()].copy_from_slice(src);
    }

    /// Walk the arena block by block from offset 0.
    ///
    /// The walk stops at the first position where a header no longer fits or a
    /// block would run past the arena end; [`Blocks::remainder`] reports where
    /// that happened, which is exactly the capacity for a well-tiled arena.
    #[must_use]
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            arena: self,
            offset: 0,
        }
    }

    /// Walk the free list from its head.
    #[must_use]
    pub fn free_list(&self) -> FreeList<'_> {
        FreeList {
            arena: self,
            current: self.free_head,
            remaining: self.capacity() / HEADER_SIZE + 1,
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("capacity", &self.capacity())
            .field("free_head", &self.free_head)
            .finish_non_exhaustive()
    }
}

/// Iterator over `(header_offset, header)` pairs in address order.
pub struct Blocks<'a> {
    arena: &'a Arena,
    offset: usize,
}

impl Blocks<'_> {
    /// Offset at which the walk currently stands.
    #[must_use]
    pub const fn remainder(&self) -> usize {
        self.offset
    }
}

impl Iterator for Blocks<'_> {
    type Item = (usize, BlockHeader);

    fn next(&mut self) -> Option<Self::Item> {
        let capacity = self.arena.capacity();
        if self.offset + HEADER_SIZE > capacity {
            return None;
        }
        let header = self.arena.header(self.offset);
        let end = self.offset + header.total_size();
        if end > capacity {
            return None;
        }
        let item = (self.offset, header);
        self.offset = end;
        Some(item)
    }
}

/// Iterator over `(header_offset, header)` pairs along a free list.
///
/// Bounded by the number of blocks an arena could possibly hold, so a
/// corrupted cyclic list terminates.
pub struct FreeList<'a> {
    arena: &'a Arena,
    current: Option<usize>,
    remaining: usize,
}

impl Iterator for FreeList<'_> {
    type Item = (usize, BlockHeader);

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.current?;
        if self.remaining == 0 || offset + HEADER_SIZE > self.arena.capacity() {
            return None;
        }
        self.remaining -= 1;
        let header = self.arena.header(offset);
        self.current = header.next;
        Some((offset, header))
    }
}
