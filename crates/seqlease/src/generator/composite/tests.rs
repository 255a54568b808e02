use std::{
    cell::Cell,
    collections::HashSet,
    rc::Rc,
    sync::{Barrier, Mutex},
    thread::scope,
};

use portable_atomic::{AtomicU64, Ordering};

use crate::{
    AtomicSnowflakeGenerator, CompositeAllocator, CompositeConfig, Error, IdGenStatus,
    MonotonicClock, SENTINEL, Snowflake, SnowflakeTwitterId, TimeSource, UidAllocator,
    UidConfig,
};

struct MockTime {
    millis: u64,
}

impl TimeSource for MockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

/// Advances by one millisecond every `every` reads.
struct SteppingTime {
    reads: AtomicU64,
    every: u64,
}

impl TimeSource for SteppingTime {
    fn current_millis(&self) -> u64 {
        1 + self.reads.fetch_add(1, Ordering::Relaxed) / self.every
    }
}

#[derive(Clone)]
struct SharedStepTime {
    values: Rc<Vec<u64>>,
    index: Rc<Cell<usize>>,
}

impl TimeSource for SharedStepTime {
    fn current_millis(&self) -> u64 {
        self.values[self.index.get()]
    }
}

trait IdGenStatusExt<T: Snowflake> {
    fn unwrap_ready(self) -> T;
    fn unwrap_pending(self) -> u64;
}

impl<T: Snowflake> IdGenStatusExt<T> for IdGenStatus<T> {
    fn unwrap_ready(self) -> T {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for } => panic!("unexpected pending (yield for: {yield_for})"),
        }
    }

    fn unwrap_pending(self) -> u64 {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id})"),
            Self::Pending { yield_for } => yield_for,
        }
    }
}

#[test]
fn sequence_increments_within_same_tick() {
    let generator =
        AtomicSnowflakeGenerator::<SnowflakeTwitterId, _>::new(7, MockTime { millis: 42 });

    let id1 = generator.next_id().unwrap_ready();
    let id2 = generator.next_id().unwrap_ready();
    let id3 = generator.next_id().unwrap_ready();

    for id in [id1, id2, id3] {
        assert_eq!(id.timestamp(), 42);
        assert_eq!(id.node_id(), 7);
    }
    assert_eq!(
        [id1.sequence(), id2.sequence(), id3.sequence()],
        [0, 1, 2]
    );
    assert!(id1 < id2 && id2 < id3);
}

#[test]
fn pending_when_sequence_exhausted() {
    let generator = AtomicSnowflakeGenerator::<SnowflakeTwitterId, _>::from_components(
        0,
        1,
        SnowflakeTwitterId::max_sequence(),
        MockTime { millis: 0 },
    );
    assert_eq!(generator.next_id().unwrap_pending(), 1);
}

#[test]
fn pending_when_clock_runs_behind() {
    let generator = AtomicSnowflakeGenerator::<SnowflakeTwitterId, _>::from_components(
        100,
        1,
        0,
        MockTime { millis: 90 },
    );
    assert_eq!(generator.next_id().unwrap_pending(), 10);
}

#[test]
fn sequence_resets_on_new_tick() {
    let time = SharedStepTime {
        values: Rc::new(vec![42, 43]),
        index: Rc::new(Cell::new(0)),
    };
    let generator = AtomicSnowflakeGenerator::<SnowflakeTwitterId, _>::new(1, time.clone());

    for i in 0..=SnowflakeTwitterId::max_sequence() {
        let id = generator.next_id().unwrap_ready();
        assert_eq!(id.sequence(), i);
    }
    generator.next_id().unwrap_pending();

    time.index.set(1);
    let id = generator.next_id().unwrap_ready();
    assert_eq!((id.timestamp(), id.sequence()), (43, 0));
}

#[test]
fn allocator_waits_out_exhausted_ticks() {
    let time = SteppingTime {
        reads: AtomicU64::new(0),
        every: 5_000,
    };
    let allocator = CompositeAllocator::<SnowflakeTwitterId, _>::new(3, time).unwrap();

    let mut last = 0;
    for _ in 0..3 * 4096 {
        let id = allocator.next_uid64();
        assert!(id > last);
        assert_eq!(SnowflakeTwitterId::from_raw(id as u64).node_id(), 3);
        last = id;
    }
}

#[test]
fn allocator_rejects_32_bit_and_out_of_range_nodes() {
    let allocator =
        CompositeAllocator::<SnowflakeTwitterId, _>::new(1, MockTime { millis: 1 }).unwrap();
    assert!(!allocator.has_int32());
    assert_eq!(allocator.next_uid32(), SENTINEL as i32);
    assert!(matches!(
        allocator.try_next_uid32(),
        Err(Error::Int32Unsupported)
    ));

    assert!(matches!(
        CompositeAllocator::<SnowflakeTwitterId, _>::new(1024, MockTime { millis: 1 }),
        Err(Error::ConfigInvalid { .. })
    ));
}

#[test]
fn closed_allocator_refuses_dispense() {
    let allocator =
        CompositeAllocator::<SnowflakeTwitterId, _>::new(1, MockTime { millis: 1 }).unwrap();
    allocator.close().unwrap();
    assert!(matches!(allocator.try_next_uid64(), Err(Error::Closed)));
}

#[test]
fn distinct_nodes_never_collide_under_contention() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 4_096;

    let clock = MonotonicClock::twitter().unwrap();
    let allocators: Vec<_> = (0..2)
        .map(|node| {
            let config = CompositeConfig::try_from(&UidConfig {
                node_id: node,
                ..UidConfig::default()
            })
            .unwrap();
            CompositeAllocator::<SnowflakeTwitterId, _>::new(config.node_id, clock.clone()).unwrap()
        })
        .collect();
    let barrier = Barrier::new(THREADS * allocators.len());
    let seen = Mutex::new(HashSet::new());

    scope(|s| {
        for allocator in &allocators {
            for _ in 0..THREADS {
                let (barrier, seen) = (&barrier, &seen);
                s.spawn(move || {
                    barrier.wait();
                    let ids: Vec<i64> = (0..PER_THREAD).map(|_| allocator.next_uid64()).collect();
                    assert!(ids.windows(2).all(|w| w[0] < w[1]));
                    let mut seen = seen.lock().unwrap();
                    for id in ids {
                        assert!(id > 0);
                        assert!(seen.insert(id), "duplicate id {id}");
                    }
                });
            }
        }
    });

    assert_eq!(
        seen.into_inner().unwrap().len(),
        THREADS * PER_THREAD * allocators.len()
    );
}
