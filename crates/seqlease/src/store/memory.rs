use core::time::Duration;
use std::{collections::HashMap, sync::Arc, time::Instant};

use portable_atomic::{AtomicUsize, Ordering};

use crate::{
    error::{Error, Result},
    mutex::{Mutex, lock},
    store::{CounterStore, Segment, SequenceRow, SequenceStore},
};

/// An in-process sequence row with the same lease semantics as the SQL
/// store.
///
/// Clones share the row, so several allocators built from clones of one
/// store behave like allocators in different processes sharing one table.
///
/// # Example
///
/// ```
/// use seqlease::{MemorySequenceStore, SequenceStore};
///
/// let store = MemorySequenceStore::new();
/// let first = store.acquire_segment(10, 1000).unwrap();
/// let second = store.acquire_segment(10, 1000).unwrap();
/// assert_eq!((first.first, second.first), (1000, 1010));
/// assert_eq!(store.row().unwrap().unwrap().next_id, 1020);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemorySequenceStore {
    row: Arc<Mutex<Option<SequenceRow>>>,
    acquisitions: Arc<AtomicUsize>,
}

impl MemorySequenceStore {
    /// Creates a store without a sequence row; the row is created on the
    /// first lease.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose row already exists with the given values.
    pub fn with_row(next_id: i64, cache: i64) -> Self {
        Self {
            row: Arc::new(Mutex::new(Some(SequenceRow { next_id, cache }))),
            acquisitions: Arc::default(),
        }
    }

    /// Returns the current row, or `None` if no lease happened yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if a thread panicked mid-lease.
    pub fn row(&self) -> Result<Option<SequenceRow>> {
        Ok(*lock!(self.row))
    }

    /// Number of successful leases served by this row across all clones.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::Acquire)
    }
}

impl SequenceStore for MemorySequenceStore {
    fn acquire_segment(&self, step: i64, init_value: i64) -> Result<Segment> {
        let mut guard = lock!(self.row);
        let row = guard.get_or_insert(SequenceRow {
            next_id: init_value,
            cache: step,
        });

        let first = row.next_id;
        let next_id = first.checked_add(step).ok_or(Error::SegmentExhausted)?;
        row.next_id = next_id;
        row.cache = step;

        self.acquisitions.fetch_add(1, Ordering::AcqRel);
        Ok(Segment { first, size: step })
    }
}

#[derive(Debug)]
struct CounterEntry {
    value: i64,
    expires_at: Instant,
}

/// An in-process counter store with per-key expiry.
#[derive(Clone, Debug, Default)]
pub struct MemoryCounterStore {
    keys: Arc<Mutex<HashMap<String, CounterEntry>>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live value of `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if a thread panicked mid-update.
    pub fn get(&self, key: &str) -> Result<Option<i64>> {
        let keys = lock!(self.keys);
        Ok(keys
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value))
    }
}

impl CounterStore for MemoryCounterStore {
    fn incr_or_seed(&self, key: &str, seed: i64, ttl: Duration) -> Result<i64> {
        let mut keys = lock!(self.keys);
        let now = Instant::now();

        let entry = keys.entry(key.to_owned()).or_insert(CounterEntry {
            value: seed,
            expires_at: now + ttl,
        });
        if entry.expires_at <= now {
            *entry = CounterEntry {
                value: seed,
                expires_at: now + ttl,
            };
        }

        entry.value = entry
            .value
            .checked_add(1)
            .ok_or_else(|| Error::store(format!("counter {key} overflowed")))?;
        Ok(entry.value)
    }
}
