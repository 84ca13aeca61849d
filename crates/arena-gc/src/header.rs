//! In-place block metadata.
//!
//! Every block in an arena starts with a fixed-size header followed by its
//! payload. The header is stored in the arena bytes themselves, so a block can
//! be relocated by copying `HEADER_SIZE + size` bytes verbatim.
//!
//! # Layout
//!
//! All fields are little-endian:
//!
//! | Offset | Width | Field            | Encoding                      |
//! |--------|-------|------------------|-------------------------------|
//! | 0      | 4     | `free`           | `0` = used, `1` = free        |
//! | 4      | 4     | `size`           | payload bytes                 |
//! | 8      | 4     | `handle_index`   | slot index, `-1` = none       |
//! | 12     | 4     | `survival_count` | minor collections survived    |
//! | 16     | 8     | `free_list_link` | header offset, `u64::MAX` = none |

/// Size of a block header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Payload sizes are rounded up to this many bytes.
pub const ALIGNMENT: usize = 8;

const FREE: usize = 0;
const SIZE: usize = 4;
const HANDLE_INDEX: usize = 8;
const SURVIVAL_COUNT: usize = 12;
const LINK: usize = 16;

const NO_HANDLE: i32 = -1;
const NO_LINK: u64 = u64::MAX;

/// Round `size` up to the next multiple of [`ALIGNMENT`], or `None` if that
/// multiple does not fit in a `usize`.
#[inline]
#[must_use]
pub const fn align_up(size: usize) -> Option<usize> {
    size.checked_next_multiple_of(ALIGNMENT)
}

/// Decoded view of a block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Whether the block is on its arena's free list.
    pub free: bool,
    /// Payload bytes following the header. Always a multiple of 8.
    pub size: usize,
    /// Back-reference into the handle table.
    pub handle_index: Option<usize>,
    /// Minor collections survived while resident in a young arena.
    pub survival_count: u32,
    /// Header offset of the next free block. Only meaningful while free.
    pub next: Option<usize>,
}

impl BlockHeader {
    /// A free block with no links.
    #[must_use]
    pub const fn free(size: usize) -> Self {
        Self {
            free: true,
            size,
            handle_index: None,
            survival_count: 0,
            next: None,
        }
    }

    /// Total bytes the block occupies, header included.
    #[inline]
    #[must_use]
    pub const fn total_size(&self) -> usize {
        HEADER_SIZE + self.size
    }

    /// Decode a header from the first [`HEADER_SIZE`] bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`HEADER_SIZE`].
    #[must_use]
    pub fn read(bytes: &[u8]) -> Self {
        let handle_index = read_i32(bytes, HANDLE_INDEX);
        let next = read_u64(bytes, LINK);
        Self {
            free: read_u32(bytes, FREE) != 0,
            size: read_u32(bytes, SIZE) as usize,
            handle_index: usize::try_from(handle_index).ok(),
            survival_count: read_u32(bytes, SURVIVAL_COUNT),
            next: if next == NO_LINK {
                None
            } else {
                usize::try_from(next).ok()
            },
        }
    }

    /// Encode this header into the first [`HEADER_SIZE`] bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`HEADER_SIZE`], or if `size` or
    /// `handle_index` do not fit their 32-bit fields.
    pub fn write(&self, bytes: &mut [u8]) {
        let size = u32::try_from(self.size).expect("block size exceeds header field");
        let handle_index = self.handle_index.map_or(NO_HANDLE, |index| {
            i32::try_from(index).expect("handle index exceeds header field")
        });
        let next = self.next.map_or(NO_LINK, |offset| offset as u64);

        bytes[FREE..FREE + 4].copy_from_slice(&u32::from(self.free).to_le_bytes());
        bytes[SIZE..SIZE + 4].copy_from_slice(&size.to_le_bytes());
        bytes[HANDLE_INDEX..HANDLE_INDEX + 4].copy_from_slice(&handle_index.to_le_bytes());
        bytes[SURVIVAL_COUNT..SURVIVAL_COUNT + 4]
            .copy_from_slice(&self.survival_count.to_le_bytes());
        bytes[LINK..LINK + 8].copy_from_slice(&next.to_le_bytes());
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut raw = [0; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(raw)
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    let mut raw = [0; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    i32::from_le_bytes(raw)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut raw = [0; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0), Some(0));
        assert_eq!(align_up(1), Some(8));
        assert_eq!(align_up(8), Some(8));
        assert_eq!(align_up(9), Some(16));
        assert_eq!(align_up(41), Some(48));
        assert_eq!(align_up(usize::MAX - 7), Some(usize::MAX - 7));
        assert_eq!(align_up(usize::MAX - 6), None);
        assert_eq!(align_up(usize::MAX), None);
    }

    #[test]
    fn test_header_encoding() {
        let header = BlockHeader {
            free: false,
            size: 40,
            handle_index: Some(7),
            survival_count: 2,
            next: None,
        };
        let mut bytes = [0u8; HEADER_SIZE];
        header.write(&mut bytes);

        assert_eq!(&bytes[4..8], &40u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &7i32.to_le_bytes());
        assert_eq!(&bytes[16..24], &[0xFF; 8]);
        assert_eq!(BlockHeader::read(&bytes), header);
    }

    #[test]
    fn test_free_header_has_no_owner() {
        let mut bytes = [0u8; HEADER_SIZE];
        BlockHeader::free(16).write(&mut bytes);
        let decoded = BlockHeader::read(&bytes);
        assert!(decoded.free);
        assert_eq!(decoded.handle_index, None);
        assert_eq!(decoded.total_size(), HEADER_SIZE + 16);
    }

    #[test]
    fn test_zeroed_bytes_decode_as_used_empty_block() {
        let decoded = BlockHeader::read(&[0u8; HEADER_SIZE]);
        assert!(!decoded.free);
        assert_eq!(decoded.size, 0);
        assert_eq!(decoded.handle_index, Some(0));
        assert_eq!(decoded.next, Some(0));
    }
}
