//! Error types shared by every allocator, store, and the strategy registry.
//!
//! Initialization errors are returned synchronously from the constructors and
//! prevent an allocator from being built. Runtime dispense errors surface
//! through the `try_next_uid*` methods; the compatibility methods collapse all
//! of them into [`SENTINEL`].

use crate::generator::IdWidth;

/// A result type defaulting to the crate [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Boxed source error carried by [`Error::StoreUnavailable`].
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// Value returned by `next_uid32` / `next_uid64` when no ID is available.
///
/// Callers must treat it as "no ID now" regardless of the cause.
pub const SENTINEL: i64 = -1;

/// All errors `seqlease` can produce.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A connection, transaction, or row-lock failure while talking to the
    /// backing store.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] BoxError),

    /// A refill was attempted and did not yield a usable lease. Retry later.
    #[error("segment exhausted, refill failed")]
    SegmentExhausted,

    /// The allocator is bound to one ID width and was asked for the other.
    #[error("allocator is bound to {bound} IDs, {requested} requested")]
    ModeConflict { bound: IdWidth, requested: IdWidth },

    /// The configuration is incomplete, malformed, or the store could not be
    /// reached during initialization.
    #[error("invalid configuration: {reason}")]
    ConfigInvalid { reason: String },

    /// No constructor is registered under the requested strategy name.
    #[error("unknown allocator strategy {0:?}")]
    UnknownStrategy(String),

    /// A constructor is already registered under this strategy name.
    #[error("allocator strategy {0:?} registered twice")]
    DuplicateStrategy(String),

    /// The strategy cannot produce 32-bit IDs.
    #[error("strategy does not support 32-bit IDs")]
    Int32Unsupported,

    /// The next value in the sequence no longer fits in an `i32`.
    #[error("value {0} does not fit in a 32-bit ID")]
    Int32Overflow(i64),

    /// The allocator was closed.
    #[error("allocator is closed")]
    Closed,

    /// A thread panicked while holding an internal lock.
    ///
    /// With the `parking-lot` feature mutexes do not poison, so this variant
    /// is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("lock poisoned")]
    LockPoisoned,
}

impl Error {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            reason: reason.into(),
        }
    }

    pub(crate) fn store(err: impl Into<BoxError>) -> Self {
        Self::StoreUnavailable(err.into())
    }

    /// Returns `true` for errors a caller may resolve by retrying later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::SegmentExhausted)
    }
}

#[cfg_attr(docsrs, doc(cfg(feature = "mysql")))]
#[cfg(feature = "mysql")]
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::StoreUnavailable(Box::new(err))
    }
}

#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Self::StoreUnavailable(Box::new(err))
    }
}

#[cfg(not(feature = "parking-lot"))]
use crate::mutex::{MutexGuard, PoisonError};
// Convert all poisoned lock errors to a simplified `LockPoisoned`
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
