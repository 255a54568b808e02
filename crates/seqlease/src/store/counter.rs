use core::time::Duration;
use std::sync::Arc;

use crate::error::Result;

/// A key-value store offering atomic increments on integer keys with expiry.
pub trait CounterStore: Send + Sync {
    /// Atomically increments `key` by one and returns the new value.
    ///
    /// When `key` is absent (first use, or after it expired) it is first set
    /// to `seed` with the given `ttl`; seeding and incrementing happen in the
    /// same round trip.
    ///
    /// # Errors
    ///
    /// Returns the store error if the round trip fails.
    fn incr_or_seed(&self, key: &str, seed: i64, ttl: Duration) -> Result<i64>;

    /// Releases connections held by the store.
    ///
    /// # Errors
    ///
    /// Returns the store error if the connections cannot be released cleanly.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

impl<S> CounterStore for Arc<S>
where
    S: CounterStore + ?Sized,
{
    fn incr_or_seed(&self, key: &str, seed: i64, ttl: Duration) -> Result<i64> {
        (**self).incr_or_seed(key, seed, ttl)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}
