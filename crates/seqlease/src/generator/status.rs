use crate::{id::Snowflake, store::Segment};

/// Result of one attempt by [`AtomicSnowflakeGenerator`] to produce an ID.
///
/// - [`IdGenStatus::Ready`] carries a freshly generated ID.
/// - [`IdGenStatus::Pending`] means the per-tick sequence is exhausted, the
///   clock is behind the last issued timestamp, or another thread won the
///   race; retry after `yield_for` milliseconds (`0` means immediately).
///
/// [`AtomicSnowflakeGenerator`]: crate::AtomicSnowflakeGenerator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus<T: Snowflake> {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: T,
    },
    /// No ID could be generated right now.
    Pending {
        /// Milliseconds to wait before trying again.
        yield_for: u64,
    },
}

/// Outcome of a segment refill that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillOutcome {
    /// A new segment was leased from the store.
    Leased(Segment),
    /// Another caller refilled while this one waited for the refill lock; the
    /// store was not contacted.
    AlreadyLeased,
}
