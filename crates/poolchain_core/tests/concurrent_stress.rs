//! Multi-threaded stress tests for the pool and the list.
//!
//! Every worker runs a seeded random mix of operations and reports what
//! actually succeeded; the final structure must account for exactly that.

use crossbeam_channel::unbounded;
use poolchain_core::{ConcurrentList, Handle, PoolAllocator, PoolConfig, PoolError, NODE_SIZE};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::thread;

const THREADS: u64 = 8;
const OPS_PER_THREAD: usize = 2_000;
const SEED: u64 = 0x5EED_0F_C4A1;

#[derive(Debug, Default)]
struct Tally {
    inserted: usize,
    deleted: usize,
    full: usize,
}

#[test]
fn test_list_random_mix_accounts_for_every_node() {
    // small enough that the pool fills up and inserts start failing
    let list: Arc<ConcurrentList> =
        Arc::new(ConcurrentList::from_config(&PoolConfig::for_nodes(256)).unwrap());
    let (tx, rx) = unbounded();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let list = Arc::clone(&list);
            let tx = tx.clone();

            thread::spawn(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(SEED + t);
                let mut tally = Tally::default();

                for _ in 0..OPS_PER_THREAD {
                    let value: u16 = rng.gen_range(0..64);
                    match rng.gen_range(0..3) {
                        0 => match list.insert_tail(value) {
                            Ok(node) => {
                                assert_eq!(node.value(), value);
                                tally.inserted += 1;
                            }
                            Err(PoolError::AllocationFailure { .. }) => tally.full += 1,
                            Err(err) => panic!("unexpected error: {err}"),
                        },
                        1 => {
                            if list.delete(value).unwrap() {
                                tally.deleted += 1;
                            }
                        }
                        _ => {
                            if let Some(node) = list.search(value) {
                                assert_eq!(node.value(), value);
                            }
                        }
                    }
                }

                tx.send(tally).unwrap();
            })
        })
        .collect();
    drop(tx);

    for h in handles {
        h.join().unwrap();
    }

    let total = rx.iter().fold(Tally::default(), |acc, t| Tally {
        inserted: acc.inserted + t.inserted,
        deleted: acc.deleted + t.deleted,
        full: acc.full + t.full,
    });

    let expected = total.inserted - total.deleted;
    assert_eq!(list.count(), expected);
    assert_eq!(list.values().len(), expected);

    let stats = list.pool_stats();
    assert_eq!(stats.allocation_count, expected);
    assert_eq!(stats.used_bytes, expected * NODE_SIZE);

    println!("\n=== List Stress ===");
    println!("Inserted:  {}", total.inserted);
    println!("Deleted:   {}", total.deleted);
    println!("Pool full: {}", total.full);
    println!("Remaining: {expected}");
}

#[test]
fn test_list_anchored_inserts_race_with_deletes() {
    let list: Arc<ConcurrentList> = Arc::new(ConcurrentList::new(4096));
    for v in 0..32 {
        list.insert_tail(v).unwrap();
    }
    let (tx, rx) = unbounded();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let list = Arc::clone(&list);
            let tx = tx.clone();

            thread::spawn(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(SEED ^ t);
                let mut inserted = 0usize;
                let mut deleted = 0usize;

                for _ in 0..OPS_PER_THREAD / 4 {
                    let anchor = list.search(rng.gen_range(0..32));
                    let value: u16 = rng.gen_range(0..32);
                    match rng.gen_range(0..3) {
                        // the anchor may already be gone: that is InvalidArgument / Ok(None)
                        0 => match list.insert_after(anchor, value) {
                            Ok(_) => inserted += 1,
                            Err(PoolError::InvalidArgument(_) | PoolError::AllocationFailure { .. }) => {}
                            Err(err) => panic!("unexpected error: {err}"),
                        },
                        1 => match list.insert_before(anchor, value) {
                            Ok(Some(_)) => inserted += 1,
                            Ok(None)
                            | Err(PoolError::InvalidArgument(_) | PoolError::AllocationFailure { .. }) => {}
                            Err(err) => panic!("unexpected error: {err}"),
                        },
                        _ => {
                            if list.delete(value).unwrap() {
                                deleted += 1;
                            }
                        }
                    }
                }

                tx.send((inserted, deleted)).unwrap();
            })
        })
        .collect();
    drop(tx);

    for h in handles {
        h.join().unwrap();
    }

    let (inserted, deleted) = rx
        .iter()
        .fold((0, 0), |(i, d), (ti, td)| (i + ti, d + td));
    assert_eq!(list.count(), 32 + inserted - deleted);
    assert_eq!(list.pool_stats().allocation_count, list.count());
}

#[test]
fn test_list_readers_see_consistent_snapshots() {
    let list: Arc<ConcurrentList> = Arc::new(ConcurrentList::new(64 * NODE_SIZE));

    let writer = {
        let list = Arc::clone(&list);
        thread::spawn(move || {
            for round in 0..500u16 {
                list.insert_tail(round).unwrap();
                list.insert_tail(round).unwrap();
                list.delete(round).unwrap();
                list.delete(round).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                for _ in 0..500 {
                    let rendered = list.display();
                    assert!(rendered.starts_with('[') && rendered.ends_with(']'));
                    // the writer only ever holds 0, 1 or 2 nodes
                    let values = list.values();
                    assert!(values.len() <= 2);
                    if let [a, b] = values[..] {
                        assert_eq!(a, b);
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert!(list.is_empty());
}

#[test]
fn test_pool_concurrent_regions_never_overlap() {
    let pool: Arc<PoolAllocator> = Arc::new(PoolAllocator::new(16 * 1024));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let pool = Arc::clone(&pool);

            thread::spawn(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(SEED.wrapping_mul(t + 1));
                let fill = u8::try_from(t + 1).unwrap();
                let mut held: Vec<(Handle, usize)> = Vec::new();

                for _ in 0..OPS_PER_THREAD {
                    if held.is_empty() || rng.gen_bool(0.55) {
                        let size = rng.gen_range(1..64);
                        if let Ok(h) = pool.allocate(size) {
                            pool.write(h, &vec![fill; size]).unwrap();
                            held.push((h, size));
                        }
                    } else {
                        let (h, size) = held.swap_remove(rng.gen_range(0..held.len()));
                        let mut buf = vec![0u8; size];
                        pool.read(h, &mut buf).unwrap();
                        assert!(buf.iter().all(|b| *b == fill), "another thread wrote into our region");
                        pool.free(h);
                    }
                }

                for (h, size) in held {
                    let mut buf = vec![0u8; size];
                    pool.read(h, &mut buf).unwrap();
                    assert!(buf.iter().all(|b| *b == fill), "another thread wrote into our region");
                    pool.free(h);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.allocation_count, 0);
    assert_eq!(stats.largest_free_gap, stats.capacity);
}
