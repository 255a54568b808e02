#[cfg(not(feature = "parking-lot"))]
pub(crate) use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(feature = "parking-lot")]
pub(crate) use parking_lot::{Mutex, MutexGuard};

/// Locks `$mutex`, propagating poisoning as [`crate::Error::LockPoisoned`]
/// when std mutexes are in use.
macro_rules! lock {
    ($mutex:expr) => {{
        #[cfg(feature = "parking-lot")]
        {
            $mutex.lock()
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            $mutex.lock()?
        }
    }};
}

pub(crate) use lock;
