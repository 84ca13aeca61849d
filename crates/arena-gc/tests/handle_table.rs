//! Handle-table capacity and slot reuse.

use arena_gc::{GcError, Heap, HeapConfig, Strategy};

#[test]
fn test_slots_exhaust_independent_of_arena_space() {
    let mut heap = Heap::new(Strategy::FirstFit);
    for _ in 0..128 {
        let handle = heap.allocate_managed(8).unwrap();
        heap.release_managed(handle);
    }
    assert_eq!(heap.handles().len(), 128);
    assert_eq!(heap.handles().live(), 0);

    let free_before: Vec<_> = heap.arena(heap.active_young()).free_list().collect();
    let err = heap.allocate_managed(8).unwrap_err();
    assert_eq!(err, GcError::HandleTableFull { capacity: 128 });
    assert!(!err.is_fatal());

    let free_after: Vec<_> = heap.arena(heap.active_young()).free_list().collect();
    assert_eq!(free_before, free_after, "arena untouched on failure");
}

#[test]
fn test_slot_reuse_is_opt_in() {
    let mut heap = Heap::with_config(HeapConfig {
        handle_capacity: 4,
        reuse_handle_slots: true,
        ..HeapConfig::default()
    })
    .unwrap();
    for _ in 0..100 {
        let handle = heap.allocate_managed(8).unwrap();
        assert_eq!(handle.index(), 0);
        heap.release_managed(handle);
    }
    assert_eq!(heap.handles().len(), 1);
}

#[test]
fn test_small_table_fills() {
    let mut heap = Heap::with_config(HeapConfig {
        handle_capacity: 2,
        ..HeapConfig::default()
    })
    .unwrap();
    heap.allocate_managed(8).unwrap();
    heap.allocate_managed(8).unwrap();
    assert!(matches!(
        heap.allocate_managed(8),
        Err(GcError::HandleTableFull { capacity: 2 })
    ));
    assert_eq!(heap.stats().allocations, 2);
    assert_eq!(heap.stats().failed_allocations, 1);
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = Heap::with_config(HeapConfig {
        arena_capacity: 1004,
        ..HeapConfig::default()
    })
    .unwrap_err();
    assert!(matches!(err, GcError::InvalidConfig(_)));
}

#[test]
#[should_panic(expected = "holds no object")]
fn test_release_of_unknown_handle_panics() {
    let mut heap = Heap::new(Strategy::FirstFit);
    heap.release_managed(arena_gc::Handle::from_index(5));
}
