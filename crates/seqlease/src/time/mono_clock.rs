use core::time::Duration;
use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use crate::{
    error::{Error, Result},
    time::{TWITTER_EPOCH, TimeSource, unix_now},
};

/// Shared ticker thread that updates every millisecond.
#[derive(Debug)]
struct SharedTickerInner {
    current: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A monotonic time source that returns elapsed time since construction,
/// offset from a user-defined epoch.
///
/// Wall-clock adjustments after construction are ignored, so timestamps never
/// go backward. Skew between hosts is not corrected.
///
/// A background thread publishes the elapsed milliseconds into an atomic, so
/// reading the clock is a single relaxed load. The thread exits once the last
/// clone of the clock is dropped.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    inner: Arc<SharedTickerInner>,
    epoch_offset: u64, // in milliseconds
}

impl MonotonicClock {
    /// Constructs a clock whose zero point is `epoch`, given as a duration
    /// since 1970-01-01 UTC.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if the system clock reads earlier than
    /// `epoch`.
    ///
    /// # Example
    ///
    /// ```
    /// use seqlease::{MonotonicClock, TimeSource, TWITTER_EPOCH};
    ///
    /// let clock = MonotonicClock::with_epoch(TWITTER_EPOCH).unwrap();
    /// assert!(clock.current_millis() > 0);
    /// ```
    pub fn with_epoch(epoch: Duration) -> Result<Self> {
        let start = Instant::now();
        let offset = unix_now()
            .checked_sub(epoch)
            .ok_or_else(|| Error::config("system clock is earlier than the configured epoch"))?
            .as_millis() as u64;

        let inner = Arc::new(SharedTickerInner {
            current: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::spawn(move || {
            let mut tick = 0;

            loop {
                let Some(inner_ref) = weak_inner.upgrade() else {
                    break;
                };

                let target = start + Duration::from_millis(tick);
                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                let now_ms = start.elapsed().as_millis() as u64;
                inner_ref.current.store(now_ms, Ordering::Relaxed);

                tick = now_ms + 1;
            }
        });

        // Freshly created cell, cannot already be set.
        let _ = inner._handle.set(handle);

        Ok(Self {
            inner,
            epoch_offset: offset,
        })
    }

    /// Constructs a clock aligned to [`TWITTER_EPOCH`].
    ///
    /// # Errors
    ///
    /// See [`MonotonicClock::with_epoch`].
    pub fn twitter() -> Result<Self> {
        Self::with_epoch(TWITTER_EPOCH)
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        self.epoch_offset + self.inner.current.load(Ordering::Relaxed)
    }
}
