//! Address reuse through the managed API.

use arena_gc::{Handle, Heap, Strategy, HEADER_SIZE};

/// Free list of `[32, 8, 16]` payload bytes in address order.
fn divergence_heap(strategy: Strategy) -> Heap {
    let mut heap = Heap::new(strategy);
    let sizes = [808, 16, 8, 8, 8];
    let handles: Vec<Handle> = sizes
        .iter()
        .map(|&size| heap.allocate_managed(size).unwrap())
        .collect();
    heap.release_managed(handles[1]);
    heap.release_managed(handles[3]);
    heap
}

#[test]
fn test_strategy_divergence() {
    let mut first = divergence_heap(Strategy::FirstFit);
    let mut best = divergence_heap(Strategy::BestFit);
    for heap in [&first, &best] {
        let free: Vec<usize> = heap
            .arena(heap.active_young())
            .free_list()
            .map(|(_, h)| h.size)
            .collect();
        assert_eq!(free, vec![32, 8, 16]);
    }

    let from_first = first.allocate_managed(8).unwrap();
    let from_best = best.allocate_managed(8).unwrap();

    let first_at = first.resolve(from_first).unwrap().header_offset();
    let best_at = best.resolve(from_best).unwrap().header_offset();
    assert!(first_at < 32 + HEADER_SIZE, "first-fit carves the 32-byte block");
    assert_eq!(best_at, 88, "best-fit takes the 8-byte block whole");

    first.verify().unwrap();
    best.verify().unwrap();
}

#[test]
fn test_release_then_allocate_reuses_address_best_fit() {
    let mut heap = Heap::new(Strategy::BestFit);
    for n in [1, 8, 24, 40, 100] {
        let handle = heap.allocate_managed(n).unwrap();
        let before = heap.resolve(handle).unwrap();
        heap.release_managed(handle);

        let again = heap.allocate_managed(n).unwrap();
        assert_eq!(heap.resolve(again), Some(before), "size {n}");
        assert_ne!(again, handle, "slots are not reused by default");
        heap.release_managed(again);
    }
    heap.verify().unwrap();
}

#[test]
fn test_release_then_allocate_reuses_address_first_fit() {
    let mut heap = Heap::new(Strategy::FirstFit);
    // Leaves an empty free prefix ahead of the block, so the freed block is
    // the first one large enough.
    let size = 1024 - 2 * HEADER_SIZE;
    let handle = heap.allocate_managed(size).unwrap();
    let before = heap.resolve(handle).unwrap();
    heap.release_managed(handle);

    let again = heap.allocate_managed(size).unwrap();
    assert_eq!(heap.resolve(again), Some(before));
    heap.verify().unwrap();
}

#[test]
fn test_end_to_end_best_fit_reuses_freed_block() {
    let mut heap = Heap::new(Strategy::BestFit);
    let _a = heap.allocate_managed(8).unwrap();
    let b = heap.allocate_managed(40).unwrap();
    let _c = heap.allocate_managed(8).unwrap();

    let freed = heap.resolve(b).unwrap();
    heap.release_managed(b);

    let d = heap.allocate_managed(40).unwrap();
    assert_eq!(heap.resolve(d), Some(freed));
    assert_eq!(heap.header(d).unwrap().size, 40);
    heap.verify().unwrap();
}

#[test]
fn test_first_fit_prefers_the_prefix_block() {
    let mut heap = Heap::new(Strategy::FirstFit);
    let a = heap.allocate_managed(8).unwrap();
    let before = heap.resolve(a).unwrap();
    heap.release_managed(a);

    let again = heap.allocate_managed(8).unwrap();
    let after = heap.resolve(again).unwrap();
    assert!(after.offset < before.offset);
}
