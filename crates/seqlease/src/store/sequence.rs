use std::sync::Arc;

use crate::error::Result;

/// A contiguous range of integers `[first, first + size)` leased in a single
/// store transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    /// First integer of the lease.
    pub first: i64,
    /// Number of integers in the lease.
    pub size: i64,
}

impl Segment {
    /// Exclusive upper bound of the lease.
    pub const fn end(&self) -> i64 {
        self.first + self.size
    }
}

/// Snapshot of the durable sequence row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceRow {
    /// Exclusive upper bound of the most recently leased segment.
    pub next_id: i64,
    /// Width of the most recently leased segment.
    pub cache: i64,
}

/// A durable sequence that hands out disjoint segments to any number of
/// allocators, in this process or others.
///
/// Implementations must serialize concurrent leases so that `next_id` only
/// ever increases and no two calls return overlapping segments.
pub trait SequenceStore: Send + Sync {
    /// Leases the next `step` integers.
    ///
    /// Creates the sequence row with `next_id = init_value` when it does not
    /// exist yet, then advances `next_id` by `step` and returns the value it
    /// had before the advance.
    ///
    /// # Errors
    ///
    /// Any failure rolls the lease back and is returned as is; it is
    /// transient and the caller decides whether to retry.
    fn acquire_segment(&self, step: i64, init_value: i64) -> Result<Segment>;

    /// Issues a no-op round trip to check the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns the store error if the round trip fails.
    fn ping(&self) -> Result<()> {
        Ok(())
    }

    /// Stops background work and releases connections.
    ///
    /// # Errors
    ///
    /// Returns the store error if the connections cannot be released cleanly.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

impl<S> SequenceStore for Arc<S>
where
    S: SequenceStore + ?Sized,
{
    fn acquire_segment(&self, step: i64, init_value: i64) -> Result<Segment> {
        (**self).acquire_segment(step, init_value)
    }

    fn ping(&self) -> Result<()> {
        (**self).ping()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}
