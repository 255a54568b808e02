use core::time::Duration;

use portable_atomic::{AtomicBool, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    generator::UidAllocator,
    store::CounterStore,
    time::unix_now,
};

/// An allocator that increments a remote counter once per ID.
///
/// 32-bit and 64-bit IDs come from separate keys, `{key}_int32` and
/// `{key}_int64`. A key that does not exist yet, or has expired, is seeded
/// from the wall clock (Unix seconds for 32-bit keys, Unix nanoseconds for
/// 64-bit keys) before the increment. Uniqueness and durability are exactly
/// those of the store's atomic increment; nothing is held locally, so a
/// restart loses nothing.
///
/// Increments do not extend a key's expiry. Every `ttl` the key lapses and is
/// seeded again from the clock, so 32-bit IDs stay unique only while fewer
/// than about `ttl` seconds' worth of IDs (one per second on average) are
/// drawn per window; faster draws run ahead of the clock and the next seed
/// repeats values already handed out. 64-bit keys seed from nanoseconds and
/// have no practical limit.
///
/// ## Recommended When
/// - IDs are requested rarely enough that one round trip per ID is fine
/// - A key-value store is already at hand and no SQL store is
///
/// ## See Also
/// - [`SegmentAllocator`]
///
/// [`SegmentAllocator`]: crate::SegmentAllocator
pub struct CounterAllocator<S>
where
    S: CounterStore,
{
    store: S,
    key32: String,
    key64: String,
    ttl: Duration,
    closed: AtomicBool,
}

impl<S> CounterAllocator<S>
where
    S: CounterStore,
{
    /// Creates an allocator using keys derived from `key`; `ttl` applies each
    /// time a key is seeded.
    pub fn new(store: S, key: &str, ttl: Duration) -> Self {
        Self {
            store,
            key32: format!("{key}_int32"),
            key64: format!("{key}_int64"),
            ttl,
            closed: AtomicBool::new(false),
        }
    }

    /// Key used for 32-bit IDs.
    pub fn key32(&self) -> &str {
        &self.key32
    }

    /// Key used for 64-bit IDs.
    pub fn key64(&self) -> &str {
        &self.key64
    }

    /// The backing counter store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }
}

impl<S> UidAllocator for CounterAllocator<S>
where
    S: CounterStore,
{
    fn has_int32(&self) -> bool {
        true
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn try_next_uid32(&self) -> Result<i32> {
        self.ensure_open()?;
        let seed = i64::try_from(unix_now().as_secs()).unwrap_or(i64::MAX);
        let value = self.store.incr_or_seed(&self.key32, seed, self.ttl)?;
        i32::try_from(value).map_err(|_| Error::Int32Overflow(value))
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn try_next_uid64(&self) -> Result<i64> {
        self.ensure_open()?;
        let seed = i64::try_from(unix_now().as_nanos()).unwrap_or(i64::MAX);
        self.store.incr_or_seed(&self.key64, seed, self.ttl)
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.store.close()
    }
}

#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
#[cfg(feature = "redis")]
impl CounterAllocator<crate::store::RedisCounterStore> {
    /// Connects to the configured Redis server and builds an allocator over
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if the server is unreachable.
    pub fn connect(config: &crate::config::CounterConfig) -> Result<Self> {
        let store = crate::store::RedisCounterStore::connect(config)?;
        Ok(Self::new(store, &config.key, config.ttl))
    }
}
