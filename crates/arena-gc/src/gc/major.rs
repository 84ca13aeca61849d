//! Sliding compaction of the old generation.
//!
//! One left-to-right walk with a write cursor: used blocks are slid down to
//! the cursor and their handle slot is rewritten, free blocks are dropped.
//! Whatever is left past the cursor becomes the single free block of the
//! arena. Liveness comes only from the `free` flag; nothing is traced.

use std::time::Instant;

use crate::arena::Address;
use crate::handles::Handle;
use crate::header::{BlockHeader, HEADER_SIZE};
use crate::heap::Heap;
use crate::metrics::{CollectionType, GcMetrics};

#[cfg(feature = "tracing")]
use crate::tracing::internal::{log_collection_end, next_gc_id, trace_gc_collection};

pub(crate) fn collect(heap: &mut Heap) -> GcMetrics {
    #[cfg(feature = "tracing")]
    let _gc_span = trace_gc_collection("major", next_gc_id());

    let start = Instant::now();
    let (_, _, old, handles) = heap.generations_mut();
    let mut metrics = GcMetrics {
        collection_type: CollectionType::Major,
        ..GcMetrics::new()
    };

    let capacity = old.capacity();
    let mut cursor = 0;
    let mut scan = 0;
    while scan + HEADER_SIZE <= capacity {
        let header = old.header(scan);
        let total = header.total_size();
        if scan + total > capacity {
            break;
        }

        if !header.free {
            if scan != cursor {
                old.copy_within(scan, cursor, total);
                old.write_header(
                    cursor,
                    &BlockHeader {
                        next: None,
                        ..header
                    },
                );
                if let Some(index) = header.handle_index {
                    handles.relocate(
                        Handle::from_index(index),
                        Address::from_header(old.id(), cursor),
                    );
                }
                metrics.objects_moved += 1;
            }
            cursor += total;
        }
        scan += total;
    }

    let remaining = capacity - cursor;
    if remaining >= HEADER_SIZE {
        old.write_header(cursor, &BlockHeader::free(remaining - HEADER_SIZE));
        old.free_head = Some(cursor);
    } else {
        old.free_head = None;
    }

    metrics.bytes_surviving = cursor;
    metrics.bytes_reclaimed = remaining;
    metrics.duration = start.elapsed();

    #[cfg(feature = "tracing")]
    log_collection_end(metrics.objects_moved, 0, metrics.bytes_reclaimed);

    heap.finish_collection(metrics)
}
