use core::hint;
use std::thread;

use portable_atomic::{AtomicBool, Ordering};

use crate::{
    config::CompositeConfig,
    error::{Error, Result},
    generator::{AtomicSnowflakeGenerator, IdGenStatus, UidAllocator},
    id::{Snowflake, SnowflakeTwitterId},
    time::{MonotonicClock, TimeSource},
};

/// A coordination-free allocator packing a millisecond timestamp, a node ID,
/// and a per-millisecond sequence into each 64-bit ID.
///
/// Two allocators produce distinct IDs only if their node IDs differ; node
/// assignment is the deployer's responsibility. 32-bit IDs are not supported.
///
/// When the sequence for the current millisecond is used up the call spins
/// until the clock ticks over. No store is ever contacted.
pub struct CompositeAllocator<ID = SnowflakeTwitterId, T = MonotonicClock>
where
    ID: Snowflake,
    T: TimeSource,
{
    generator: AtomicSnowflakeGenerator<ID, T>,
    closed: AtomicBool,
}

impl<ID, T> CompositeAllocator<ID, T>
where
    ID: Snowflake,
    T: TimeSource,
{
    /// Creates an allocator for `node_id` reading time from `time`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if `node_id` does not fit the layout.
    pub fn new(node_id: u64, time: T) -> Result<Self> {
        if node_id > ID::max_node_id() {
            return Err(Error::config(format!(
                "node_id {node_id} outside 0..={}",
                ID::max_node_id()
            )));
        }
        Ok(Self {
            generator: AtomicSnowflakeGenerator::new(node_id, time),
            closed: AtomicBool::new(false),
        })
    }

    /// Generates the next packed ID, waiting out sequence exhaustion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] after [`UidAllocator::close`].
    pub fn next_id(&self) -> Result<ID> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        loop {
            match self.generator.next_id() {
                IdGenStatus::Ready { id } => break Ok(id),
                IdGenStatus::Pending { yield_for: 0 } => hint::spin_loop(),
                IdGenStatus::Pending { .. } => thread::yield_now(),
            }
        }
    }
}

impl CompositeAllocator {
    /// Builds the default layout ([`SnowflakeTwitterId`] over a
    /// [`MonotonicClock`] at the Twitter epoch).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if the clock cannot be anchored.
    pub fn from_config(config: &CompositeConfig) -> Result<Self> {
        Self::new(config.node_id, MonotonicClock::twitter()?)
    }
}

impl<ID, T> UidAllocator for CompositeAllocator<ID, T>
where
    ID: Snowflake + Send + Sync,
    T: TimeSource + Send + Sync,
{
    fn has_int32(&self) -> bool {
        false
    }

    fn try_next_uid32(&self) -> Result<i32> {
        Err(Error::Int32Unsupported)
    }

    fn try_next_uid64(&self) -> Result<i64> {
        // Layouts keep the top bit clear, so the cast never goes negative.
        self.next_id().map(|id| id.to_raw() as i64)
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
