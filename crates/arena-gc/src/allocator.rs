//! Free-list allocation over a single arena.
//!
//! Each arena keeps a singly linked, address-ascending list of its free
//! blocks. Allocation carves the requested payload from the *tail* of the
//! chosen free block so the leftover prefix keeps its place in the list.
//!
//! Adjacent free blocks are never merged. The only way free space is
//! consolidated is by a collector rewriting the whole arena.
//!
//! There are two entry points with different split policies:
//!
//! - [`allocate`] splits whenever the leftover can hold a header, even with an
//!   empty payload, and searches with the caller's [`Strategy`].
//! - [`allocate_strict`] is used for promotion into the old generation. It is
//!   always first-fit and only splits when the leftover holds a header plus
//!   at least [`ALIGNMENT`] bytes.
//!
//! When a block is not split, the whole block is handed out and keeps its
//! (larger) payload size.

use crate::arena::{Address, Arena};
use crate::error::{GcError, Result};
use crate::header::{align_up, BlockHeader, ALIGNMENT, HEADER_SIZE};

/// Free-list search policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Take the first block large enough, in list order.
    #[default]
    FirstFit,
    /// Take the smallest block large enough; the earliest one on ties.
    BestFit,
}

/// Smallest leftover [`allocate`] will split off.
const RELAXED_MIN_REMAINDER: usize = HEADER_SIZE;

/// Smallest leftover [`allocate_strict`] will split off.
const STRICT_MIN_REMAINDER: usize = HEADER_SIZE + ALIGNMENT;

/// A free-list hit: the block, its header and its predecessor on the list.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    prev: Option<usize>,
    offset: usize,
    header: BlockHeader,
}

/// Zero `arena` and tile it with a single free block.
///
/// # Panics
///
/// Panics if the arena cannot hold even one header.
pub fn init(arena: &mut Arena) {
    let capacity = arena.capacity();
    assert!(
        capacity >= HEADER_SIZE,
        "arena of {capacity} bytes cannot hold a block header"
    );
    arena.clear();
    arena.write_header(0, &BlockHeader::free(capacity - HEADER_SIZE));
    arena.free_head = Some(0);
}

/// Allocate `size` bytes (rounded up to a multiple of 8) from `arena`.
///
/// The granted payload is the rounded size when the chosen block is split
/// or fits exactly. When the leftover is too small to hold a header the
/// whole block is handed out and its payload is larger than requested.
///
/// # Errors
///
/// Returns [`GcError::OutOfMemory`] if no free block is large enough, or if
/// `size` cannot be rounded up without overflow. The arena is left untouched
/// in that case.
pub fn allocate(arena: &mut Arena, size: usize, strategy: Strategy) -> Result<Address> {
    let request = rounded(arena, size)?;
    let candidate = match strategy {
        Strategy::FirstFit => first_fit(arena, request),
        Strategy::BestFit => best_fit(arena, request),
    };
    let candidate = candidate.ok_or(GcError::OutOfMemory {
        arena: arena.id(),
        requested: request,
    })?;
    Ok(carve(arena, candidate, request, RELAXED_MIN_REMAINDER))
}

/// Allocate `size` bytes from `arena` with the promotion split policy.
///
/// # Errors
///
/// Returns [`GcError::OutOfMemory`] if no free block is large enough.
pub fn allocate_strict(arena: &mut Arena, size: usize) -> Result<Address> {
    let request = rounded(arena, size)?;
    let candidate = first_fit(arena, request).ok_or(GcError::OutOfMemory {
        arena: arena.id(),
        requested: request,
    })?;
    Ok(carve(arena, candidate, request, STRICT_MIN_REMAINDER))
}

/// Return the block at `address` to its arena's free list.
///
/// The block is inserted in address order. It is not merged with free
/// neighbours, even when they are contiguous.
///
/// # Panics
///
/// Panics if `address` is not the payload of a block in `arena` or if the
/// block is already free. Both are caller errors.
pub fn free(arena: &mut Arena, address: Address) {
    assert!(
        arena.contains(address)
            && address.offset >= HEADER_SIZE
            && arena
                .blocks()
                .any(|(start, _)| start == address.header_offset()),
        "{address} is not a payload address in {}",
        arena.id()
    );
    let offset = address.header_offset();
    let mut header = arena.header(offset);
    assert!(!header.free, "double free of block at {address}");

    let mut prev = None;
    let mut current = arena.free_head;
    while let Some(node) = current {
        if node > offset {
            break;
        }
        prev = Some(node);
        current = arena.header(node).next;
    }

    header.free = true;
    header.next = current;
    arena.write_header(offset, &header);
    link(arena, prev, Some(offset));
}

/// Total payload bytes on the free list.
#[must_use]
pub fn free_bytes(arena: &Arena) -> usize {
    arena.free_list().map(|(_, header)| header.size).sum()
}

/// Payload size of the largest free block, if any.
#[must_use]
pub fn largest_free_block(arena: &Arena) -> Option<usize> {
    arena.free_list().map(|(_, header)| header.size).max()
}

fn rounded(arena: &Arena, size: usize) -> Result<usize> {
    align_up(size).ok_or(GcError::OutOfMemory {
        arena: arena.id(),
        requested: size,
    })
}

fn first_fit(arena: &Arena, request: usize) -> Option<Candidate> {
    let mut prev = None;
    for (offset, header) in arena.free_list() {
        if header.size >= request {
            return Some(Candidate {
                prev,
                offset,
                header,
            });
        }
        prev = Some(offset);
    }
    None
}

fn best_fit(arena: &Arena, request: usize) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    let mut prev = None;
    for (offset, header) in arena.free_list() {
        if header.size >= request && best.is_none_or(|b| header.size < b.header.size) {
            best = Some(Candidate {
                prev,
                offset,
                header,
            });
        }
        prev = Some(offset);
    }
    best
}

/// Hand out `request` bytes from `candidate`, splitting when the leftover is
/// at least `min_remainder` bytes.
fn carve(arena: &mut Arena, candidate: Candidate, request: usize, min_remainder: usize) -> Address {
    let Candidate {
        prev,
        offset,
        mut header,
    } = candidate;
    let leftover = header.size - request;

    if leftover < min_remainder {
        link(arena, prev, header.next);
        header.free = false;
        header.handle_index = None;
        header.survival_count = 0;
        header.next = None;
        arena.write_header(offset, &header);
        return Address::from_header(arena.id(), offset);
    }

    // The prefix stays on the free list in place; only its size shrinks.
    header.size = leftover - HEADER_SIZE;
    arena.write_header(offset, &header);

    let block = offset + header.total_size();
    arena.write_header(
        block,
        &BlockHeader {
            free: false,
            size: request,
            handle_index: None,
            survival_count: 0,
            next: None,
        },
    );
    Address::from_header(arena.id(), block)
}

/// Point `prev` (or the list head when `prev` is `None`) at `next`.
fn link(arena: &mut Arena, prev: Option<usize>, next: Option<usize>) {
    match prev {
        Some(prev) => {
            let mut header = arena.header(prev);
            header.next = next;
            arena.write_header(prev, &header);
        }
        None => arena.free_head = next,
    }
}
