//! Memory dump walkthrough
//!
//! Allocates a few objects, releases some, and prints the heap after each
//! collection so promotion and compaction can be followed by eye.

use arena_gc::{ArenaId, Heap, Strategy};

fn main() -> arena_gc::Result<()> {
    let mut heap = Heap::new(Strategy::BestFit);

    let names = heap.allocate_managed(24)?;
    let scratch = heap.allocate_managed(64)?;
    let counter = heap.allocate_managed(8)?;
    if let Some(payload) = heap.payload_mut(names) {
        payload[..5].copy_from_slice(b"alpha");
    }

    println!("{}", heap.dump_state());

    heap.release_managed(scratch);
    for round in 1..=3 {
        let metrics = heap.run_minor_collection()?;
        println!(
            "minor #{round}: copied {}, promoted {}, reclaimed {} bytes",
            metrics.objects_copied, metrics.objects_promoted, metrics.bytes_reclaimed
        );
    }
    assert_eq!(heap.generation(names), Some(ArenaId::Old));
    println!("{}", heap.dump_state());

    heap.release_managed(counter);
    let metrics = heap.run_major_collection();
    println!(
        "major: moved {}, {} bytes free at the tail",
        metrics.objects_moved, metrics.bytes_reclaimed
    );
    println!("{}", heap.dump_state());

    heap.verify()?;
    println!("{:?}", heap.stats());
    Ok(())
}
