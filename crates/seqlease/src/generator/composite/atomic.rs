use core::{cmp, marker::PhantomData};

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{generator::IdGenStatus, id::Snowflake, time::TimeSource};

/// A lock-free Snowflake generator suitable for multi-threaded environments.
///
/// The whole generator state is the last issued ID, stored in an
/// [`AtomicU64`]; each attempt builds the successor and publishes it with a
/// single compare-and-swap.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Never blocks and never contacts a store
/// - ❌ Uniqueness across nodes relies on externally assigned node IDs
pub struct AtomicSnowflakeGenerator<ID, T>
where
    ID: Snowflake,
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    time: T,
    _id: PhantomData<ID>,
}

impl<ID, T> AtomicSnowflakeGenerator<ID, T>
where
    ID: Snowflake,
    T: TimeSource,
{
    /// Creates a generator for `node_id` with timestamp and sequence at zero.
    pub fn new(node_id: u64, time: T) -> Self {
        Self::from_components(0, node_id, 0, time)
    }

    /// Creates a generator preloaded with explicit component values, e.g. to
    /// resume after a known last-issued ID.
    pub fn from_components(timestamp: u64, node_id: u64, sequence: u64, time: T) -> Self {
        let initial = ID::from_components(timestamp, node_id, sequence);
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(initial.to_raw())),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(initial.to_raw()),
            time,
            _id: PhantomData,
        }
    }

    /// Attempts to generate the next ID.
    ///
    /// Returns [`IdGenStatus::Pending`] when the sequence is full for the
    /// current millisecond (`yield_for = 1`), when the clock reads earlier
    /// than the last issued timestamp, or when another thread won the CAS
    /// race (`yield_for = 0`, retry immediately).
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> IdGenStatus<ID> {
        let now = self.time.current_millis();

        let current_raw = self.state.load(Ordering::Relaxed);
        let current_id = ID::from_raw(current_raw);
        let current_ts = current_id.timestamp();

        let next_id = match now.cmp(&current_ts) {
            cmp::Ordering::Equal => {
                if current_id.has_sequence_room() {
                    current_id.increment_sequence()
                } else {
                    return IdGenStatus::Pending { yield_for: 1 };
                }
            }
            cmp::Ordering::Greater => current_id.rollover_to_timestamp(now),
            cmp::Ordering::Less => return Self::cold_clock_behind(now, current_ts),
        };

        if self
            .state
            .compare_exchange(
                current_raw,
                next_id.to_raw(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            IdGenStatus::Ready { id: next_id }
        } else {
            IdGenStatus::Pending { yield_for: 0 }
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, current_ts: u64) -> IdGenStatus<ID> {
        IdGenStatus::Pending {
            yield_for: current_ts - now,
        }
    }
}
