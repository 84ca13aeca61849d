//! Read-only diagnostic views of a heap.
//!
//! [`Heap::dump_state`] captures a [`MemoryDump`] snapshot; its `Display`
//! implementation renders the block list, an occupancy graphic, the free list
//! of every arena, and the handle table.

use std::fmt;

use crate::arena::{Address, Arena, ArenaId};
use crate::handles::Handle;
use crate::header::{BlockHeader, ALIGNMENT};
use crate::heap::Heap;

/// One block as seen by a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Header offset.
    pub offset: usize,
    /// Decoded header.
    pub header: BlockHeader,
}

/// Snapshot of one arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaDump {
    /// Which arena.
    pub id: ArenaId,
    /// Whether this is the active young arena.
    pub active: bool,
    /// Blocks in address order.
    pub blocks: Vec<BlockInfo>,
    /// Blocks in free-list order.
    pub free_list: Vec<BlockInfo>,
    /// One character per 8 bytes: used blocks `A`, `B`, ..., free blocks
    /// `a`, `b`, ..., bytes outside any block `_`.
    pub graphic: String,
}

/// Snapshot of a whole heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDump {
    /// The active young arena.
    pub active: ArenaId,
    /// Every arena, in index order.
    pub arenas: Vec<ArenaDump>,
    /// Every handed-out slot, empty ones included.
    pub handles: Vec<(Handle, Option<Address>)>,
}

impl Heap {
    /// Capture a diagnostic snapshot of every arena and the handle table.
    #[must_use]
    pub fn dump_state(&self) -> MemoryDump {
        MemoryDump {
            active: self.active_young(),
            arenas: ArenaId::ALL
                .iter()
                .map(|&id| dump_arena(self.arena(id), id == self.active_young()))
                .collect(),
            handles: self.handles().slots().collect(),
        }
    }
}

impl MemoryDump {
    /// Snapshot of one arena.
    #[must_use]
    pub fn arena(&self, id: ArenaId) -> &ArenaDump {
        &self.arenas[id.index()]
    }
}

fn dump_arena(arena: &Arena, active: bool) -> ArenaDump {
    let blocks: Vec<BlockInfo> = arena
        .blocks()
        .map(|(offset, header)| BlockInfo { offset, header })
        .collect();
    let free_list = arena
        .free_list()
        .map(|(offset, header)| BlockInfo { offset, header })
        .collect();
    ArenaDump {
        id: arena.id(),
        active,
        graphic: graphic(arena.capacity(), &blocks),
        blocks,
        free_list,
    }
}

fn graphic(capacity: usize, blocks: &[BlockInfo]) -> String {
    let mut cells = vec!['_'; capacity / ALIGNMENT];
    let (mut used, mut free) = (0usize, 0usize);
    for block in blocks {
        let counter = if block.header.free { &mut free } else { &mut used };
        let base = if block.header.free { b'a' } else { b'A' };
        let mark = letter(base, *counter);
        *counter += 1;

        let first = block.offset / ALIGNMENT;
        let len = block.header.total_size() / ALIGNMENT;
        for cell in cells.iter_mut().skip(first).take(len) {
            *cell = mark;
        }
    }
    cells.into_iter().collect()
}

/// The `n`th letter after `base`, cycling through the alphabet.
fn letter(base: u8, n: usize) -> char {
    let step = u8::try_from(n % 26).unwrap_or_default();
    char::from(base + step)
}

impl fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.header.free { "Free" } else { "Used" };
        write!(
            f,
            "{state} at offset {}, size {}",
            self.offset, self.header.size
        )?;
        if !self.header.free {
            match self.header.handle_index {
                Some(slot) => write!(f, ", slot {slot}")?,
                None => f.write_str(", unmanaged")?,
            }
            write!(f, ", survived {}", self.header.survival_count)?;
        }
        Ok(())
    }
}

impl fmt::Display for ArenaDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.active { " (active)" } else { "" };
        writeln!(f, "== {}{marker} ==", self.id)?;
        writeln!(f, "Memory Blocks")?;
        for block in &self.blocks {
            writeln!(f, "  {block}")?;
        }
        writeln!(f, "  {}", self.graphic)?;
        writeln!(f, "Free List")?;
        if self.free_list.is_empty() {
            writeln!(f, "  (empty)")?;
        }
        for block in &self.free_list {
            writeln!(f, "  Block at offset {}, size {}", block.offset, block.header.size)?;
        }
        Ok(())
    }
}

impl fmt::Display for MemoryDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MEMORY DUMP")?;
        writeln!(f, "Active young arena: {}", self.active)?;
        for arena in &self.arenas {
            write!(f, "{arena}")?;
        }
        writeln!(f, "Managed List")?;
        for (handle, address) in &self.handles {
            match address {
                Some(address) => writeln!(f, "  [{}] = {address}", handle.index())?,
                None => writeln!(f, "  [{}] = empty", handle.index())?,
            }
        }
        Ok(())
    }
}
