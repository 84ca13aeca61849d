//! Structural invariants under a mixed workload.
//!
//! Random sequences of allocations, releases and collections are replayed;
//! after every step each arena must stay tiled, each free list must hold
//! exactly the free blocks, and every handle must still resolve to its own
//! block with its payload intact.

use std::collections::BTreeMap;

use arena_gc::Strategy as FitStrategy;
use arena_gc::{GcError, Handle, Heap, HeapConfig, HEADER_SIZE};
use proptest::prelude::*;
use proptest::sample::Index;

const MAX_LIVE: usize = 8;
const MAX_SIZE: usize = 48;

#[derive(Debug, Clone)]
enum Op {
    Alloc(usize),
    Release(Index),
    Collect,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (1..=MAX_SIZE).prop_map(Op::Alloc),
        2 => any::<Index>().prop_map(Op::Release),
        2 => Just(Op::Collect),
    ]
}

fn run_workload(strategy: FitStrategy, ops: &[Op]) -> Result<(), TestCaseError> {
    let mut heap = Heap::with_config(HeapConfig {
        strategy,
        reuse_handle_slots: true,
        ..HeapConfig::default()
    })
    .unwrap();
    let mut live: BTreeMap<Handle, u8> = BTreeMap::new();
    let mut tag = 0u8;

    for (step, op) in ops.iter().enumerate() {
        match op {
            Op::Alloc(size) if live.len() < MAX_LIVE => match heap.allocate_managed(*size) {
                Ok(handle) => {
                    tag = tag.wrapping_add(1);
                    heap.payload_mut(handle).unwrap().fill(tag);
                    live.insert(handle, tag);
                }
                Err(GcError::OutOfMemory { .. }) => {}
                Err(other) => {
                    prop_assert!(false, "step {}: unexpected {}", step, other);
                }
            },
            Op::Release(index) if !live.is_empty() => {
                let victim = *live.keys().nth(index.index(live.len())).unwrap();
                heap.release_managed(victim);
                live.remove(&victim);
            }
            Op::Collect => {
                heap.run_major_collection();
                let minor = heap.run_minor_collection();
                prop_assert!(minor.is_ok(), "step {}: {:?}", step, minor);
            }
            _ => {}
        }

        let verified = heap.verify();
        prop_assert!(verified.is_ok(), "step {}: {:?}", step, verified);
        for (&handle, &expected) in &live {
            let payload = heap.payload(handle).unwrap();
            prop_assert!(
                payload.iter().all(|&b| b == expected),
                "step {}: {} payload changed",
                step,
                handle
            );
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn test_invariants_first_fit(ops in prop::collection::vec(arb_op(), 1..400)) {
        run_workload(FitStrategy::FirstFit, &ops)?;
    }

    #[test]
    fn test_invariants_best_fit(ops in prop::collection::vec(arb_op(), 1..400)) {
        run_workload(FitStrategy::BestFit, &ops)?;
    }
}

#[test]
fn test_alignment_for_every_small_size() {
    for size in 0..=200 {
        let mut heap = Heap::new(FitStrategy::FirstFit);
        let handle = heap.allocate_managed(size).unwrap();
        let granted = heap.header(handle).unwrap().size;
        assert_eq!(granted, size.div_ceil(8) * 8, "requested {size}");
        heap.verify().unwrap();
    }
}

#[test]
fn test_free_list_holds_every_free_block_without_merging() {
    let mut heap = Heap::new(FitStrategy::FirstFit);
    let handles: Vec<Handle> = (0..6).map(|_| heap.allocate_managed(8).unwrap()).collect();
    for &handle in &handles {
        heap.release_managed(handle);
    }
    heap.verify().unwrap();

    let young = heap.arena(heap.active_young());
    let free: Vec<usize> = young.free_list().map(|(_, h)| h.size).collect();
    assert_eq!(free.len(), 7, "six contiguous released blocks stay separate");
    assert!(free[1..].iter().all(|&size| size == 8));
    assert_eq!(
        young.blocks().map(|(_, h)| h.total_size()).sum::<usize>(),
        1024
    );
    assert_eq!(free[0], 1024 - 7 * HEADER_SIZE - 6 * 8);
}
