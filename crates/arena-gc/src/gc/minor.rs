//! Copying collection of the young generation.
//!
//! The active young arena is the `from` space and its partner the `to`
//! space. Occupied handle slots are visited in ascending order; each object
//! still in `from` has its survival count bumped and is then either
//! bump-copied into `to` or, past the promotion threshold, moved into the old
//! generation through the strict allocator. `to` then becomes active. `from`
//! is left as it was and only zeroed when it next becomes a target.

use std::time::Instant;

use crate::allocator;
use crate::arena::Address;
use crate::error::{GcError, Result};
use crate::header::{BlockHeader, HEADER_SIZE};
use crate::heap::Heap;
use crate::metrics::{CollectionType, GcMetrics};

#[cfg(feature = "tracing")]
use crate::tracing::internal::{
    log_collection_end, log_promotion, log_promotion_failure, next_gc_id, trace_gc_collection,
};

pub(crate) fn collect(heap: &mut Heap) -> Result<GcMetrics> {
    #[cfg(feature = "tracing")]
    let _gc_span = trace_gc_collection("minor", next_gc_id());

    let start = Instant::now();
    let threshold = heap.config.promotion_threshold;
    let (from, to, old, handles) = heap.generations_mut();
    let mut metrics = GcMetrics {
        collection_type: CollectionType::Minor,
        ..GcMetrics::new()
    };

    to.clear();
    let mut cursor = 0;

    let live: Vec<_> = handles.iter().collect();
    for (handle, address) in live {
        if address.arena != from.id() {
            continue;
        }

        let offset = address.header_offset();
        let mut header = from.header(offset);
        header.survival_count = header.survival_count.saturating_add(1);
        from.write_header(offset, &header);
        let total = header.total_size();

        if header.survival_count >= threshold {
            let Ok(promoted) = allocator::allocate_strict(old, header.size) else {
                #[cfg(feature = "tracing")]
                log_promotion_failure(handle, header.size);
                return Err(GcError::PromotionFailed {
                    handle,
                    size: header.size,
                });
            };
            let target = promoted.header_offset();
            // An unsplit block may be larger than the object; keep its size so
            // the old generation stays tiled.
            let granted = old.header(target).size;
            old.copy_from(target, from.bytes(offset, total));
            old.write_header(
                target,
                &BlockHeader {
                    size: granted,
                    next: None,
                    ..header
                },
            );
            handles.relocate(handle, promoted);
            metrics.objects_promoted += 1;

            #[cfg(feature = "tracing")]
            log_promotion(handle, address, promoted, header.size);
        } else {
            to.copy_from(cursor, from.bytes(offset, total));
            to.write_header(
                cursor,
                &BlockHeader {
                    next: None,
                    ..header
                },
            );
            handles.relocate(handle, Address::from_header(to.id(), cursor));
            cursor += total;
            metrics.objects_copied += 1;
        }
    }

    let remaining = to.capacity() - cursor;
    if remaining >= HEADER_SIZE {
        to.write_header(cursor, &BlockHeader::free(remaining - HEADER_SIZE));
        to.free_head = Some(cursor);
    } else {
        to.free_head = None;
    }

    let to_id = to.id();
    heap.active = to_id;

    metrics.bytes_surviving = cursor;
    metrics.bytes_reclaimed = remaining;
    metrics.duration = start.elapsed();

    #[cfg(feature = "tracing")]
    log_collection_end(
        metrics.objects_copied,
        metrics.objects_promoted,
        metrics.bytes_reclaimed,
    );

    Ok(heap.finish_collection(metrics))
}

#[cfg(test)]
mod tests {
    use crate::allocator::Strategy;
    use crate::arena::ArenaId;
    use crate::config::HeapConfig;
    use crate::error::GcError;
    use crate::header::HEADER_SIZE;
    use crate::heap::Heap;

    #[test]
    fn test_survivors_are_packed_from_base_and_selector_flips() {
        let mut heap = Heap::new(Strategy::FirstFit);
        let a = heap.allocate_managed(8).unwrap();
        let b = heap.allocate_managed(16).unwrap();
        let c = heap.allocate_managed(24).unwrap();
        heap.release_managed(b);

        let metrics = heap.run_minor_collection().unwrap();
        assert_eq!(heap.active_young(), ArenaId::YoungB);
        assert_eq!(metrics.objects_copied, 2);
        assert_eq!(metrics.objects_promoted, 0);

        let a_at = heap.resolve(a).unwrap();
        let c_at = heap.resolve(c).unwrap();
        assert_eq!(a_at.arena, ArenaId::YoungB);
        assert_eq!(a_at.header_offset(), 0);
        assert_eq!(c_at.header_offset(), HEADER_SIZE + 8);
        assert_eq!(metrics.bytes_surviving, 2 * HEADER_SIZE + 32);
        assert_eq!(heap.header(c).unwrap().survival_count, 1);
        heap.verify().unwrap();
    }

    #[test]
    fn test_empty_collection_leaves_one_free_block() {
        let mut heap = Heap::new(Strategy::FirstFit);
        let metrics = heap.run_minor_collection().unwrap();
        let to = heap.arena(ArenaId::YoungB);
        assert_eq!(to.free_head(), Some(0));
        assert_eq!(metrics.bytes_reclaimed, 1024);
        assert_eq!(to.header(0).size, 1024 - HEADER_SIZE);
        heap.verify().unwrap();
    }

    #[test]
    fn test_full_survivor_space_has_no_free_list() {
        let mut heap = Heap::new(Strategy::FirstFit);
        let whole = heap.allocate_managed(1024 - HEADER_SIZE).unwrap();
        heap.run_minor_collection().unwrap();

        assert_eq!(heap.arena(ArenaId::YoungB).free_head(), None);
        assert_eq!(heap.resolve(whole).unwrap().header_offset(), 0);
        assert!(heap.allocate_managed(8).is_err());
        heap.verify().unwrap();
    }

    #[test]
    fn test_promotion_on_third_survival() {
        let mut heap = Heap::new(Strategy::FirstFit);
        let a = heap.allocate_managed(32).unwrap();
        heap.payload_mut(a).unwrap()[0] = 0xAB;

        heap.run_minor_collection().unwrap();
        heap.run_minor_collection().unwrap();
        assert_eq!(heap.generation(a), Some(ArenaId::YoungA));

        let metrics = heap.run_minor_collection().unwrap();
        assert_eq!(metrics.objects_promoted, 1);
        assert_eq!(heap.generation(a), Some(ArenaId::Old));
        let header = heap.header(a).unwrap();
        assert_eq!(header.handle_index, Some(a.index()));
        assert_eq!(header.survival_count, 3);
        assert_eq!(heap.payload(a).unwrap()[0], 0xAB);
        heap.verify().unwrap();

        // Old objects are skipped by later minor collections.
        let before = heap.resolve(a);
        heap.run_minor_collection().unwrap();
        assert_eq!(heap.resolve(a), before);
        assert_eq!(heap.header(a).unwrap().survival_count, 3);
    }

    #[test]
    fn test_promotion_disabled_keeps_objects_young() {
        let mut heap = Heap::with_config(HeapConfig {
            promotion_threshold: u32::MAX,
            ..HeapConfig::default()
        })
        .unwrap();
        let a = heap.allocate_managed(8).unwrap();
        for _ in 0..10 {
            heap.run_minor_collection().unwrap();
        }
        assert!(heap.generation(a).unwrap().is_young());
        assert_eq!(heap.header(a).unwrap().survival_count, 10);
    }

    #[test]
    fn test_promotion_failure_is_fatal() {
        let mut heap = Heap::new(Strategy::FirstFit);
        let big = heap.allocate_managed(1024 - HEADER_SIZE).unwrap();
        for _ in 0..3 {
            heap.run_minor_collection().unwrap();
        }
        assert_eq!(heap.generation(big), Some(ArenaId::Old));
        assert_eq!(heap.arena(ArenaId::Old).free_head(), None);

        let small = heap.allocate_managed(8).unwrap();
        heap.run_minor_collection().unwrap();
        heap.run_minor_collection().unwrap();
        let err = heap.run_minor_collection().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(
            err,
            GcError::PromotionFailed {
                handle: small,
                size: 8
            }
        );
    }
}
