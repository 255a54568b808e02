use portable_atomic::{AtomicBool, AtomicU8, AtomicU128, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use super::state::LeaseState;
use crate::{
    config::validate_lease,
    error::{Error, Result},
    generator::{IdWidth, RefillOutcome, UidAllocator},
    mutex::{Mutex, lock},
    store::SequenceStore,
};

const MODE_UNSET: u8 = 0;

/// A segment (batch-lease) allocator over a [`SequenceStore`].
///
/// The allocator leases `step` consecutive integers at a time from the store
/// and hands them out locally, so the store sees at most one round trip per
/// `step` dispensed IDs no matter how many threads share the allocator.
///
/// ## Dispensing
/// - **Fast path** (lock-free): a compare-and-swap loop consumes one unit of
///   the local lease and returns the next integer.
/// - **Slow path** (mutex-guarded): when the lease is exhausted, one caller
///   leases a new segment while the others wait on the refill lock. A waiter
///   that finds the lease already refilled does not contact the store. Every
///   caller then retries the fast path exactly once.
///
/// ## Guarantees
/// - Values dispensed by one allocator are unique and strictly increasing.
/// - Allocators sharing a sequence row never dispense the same value; their
///   values are not ordered relative to each other.
/// - The unused tail of the current lease is lost when the allocator is
///   closed or the process exits.
///
/// ## Width binding
/// The first successful dispense binds the allocator to 32-bit or 64-bit IDs.
/// Asking for the other width afterwards fails with [`Error::ModeConflict`]
/// without touching the store, since both widths consume the same sequence.
///
/// ## See Also
/// - [`CounterAllocator`]
/// - [`CompositeAllocator`]
///
/// [`CounterAllocator`]: crate::CounterAllocator
/// [`CompositeAllocator`]: crate::CompositeAllocator
pub struct SegmentAllocator<S>
where
    S: SequenceStore,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU128>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU128,
    mode: AtomicU8,
    closed: AtomicBool,
    refill: Mutex<()>,
    store: S,
    step: i64,
    init_value: i64,
}

impl<S> SegmentAllocator<S>
where
    S: SequenceStore,
{
    /// Creates an allocator with an empty lease. The first dispense leases
    /// the first segment.
    ///
    /// # Parameters
    ///
    /// - `store`: the shared sequence to lease from.
    /// - `step`: number of integers per lease.
    /// - `init_value`: first value of the sequence if its row does not exist
    ///   yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if `step` is not positive or
    /// `init_value` is negative.
    pub fn new(store: S, step: i64, init_value: i64) -> Result<Self> {
        let (init_value, step) = validate_lease(init_value, step)?;
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU128::new(
                LeaseState::EMPTY.to_raw(),
            )),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU128::new(LeaseState::EMPTY.to_raw()),
            mode: AtomicU8::new(MODE_UNSET),
            closed: AtomicBool::new(false),
            refill: Mutex::new(()),
            store,
            step,
            init_value,
        })
    }

    /// The width this allocator is bound to, if it has dispensed anything.
    pub fn mode(&self) -> Option<IdWidth> {
        IdWidth::from_u8(self.mode.load(Ordering::Acquire))
    }

    /// Number of integers left in the local lease.
    pub fn remaining(&self) -> i64 {
        LeaseState::from_raw(self.state.load(Ordering::Acquire))
            .remain
            .max(0)
    }

    /// Width of each lease.
    pub fn step(&self) -> i64 {
        self.step
    }

    /// The backing sequence store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Checks that the backing store answers a round trip.
    ///
    /// # Errors
    ///
    /// - [`Error::Closed`] after [`UidAllocator::close`].
    /// - The store error if the round trip fails.
    pub fn ping(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        self.store.ping()
    }

    /// Dispenses the next integer without regard to width binding.
    ///
    /// # Errors
    ///
    /// - [`Error::Closed`] after [`UidAllocator::close`].
    /// - The store error if a required refill failed.
    /// - [`Error::SegmentExhausted`] if the refilled lease was drained by
    ///   other callers before this one could retry.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn dispense(&self) -> Result<i64> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }

        if let Some(value) = self.try_dispense() {
            return Ok(value);
        }

        self.cold_refill()?;

        // Exactly one retry; losing this race too is reported, not looped.
        self.try_dispense().ok_or(Error::SegmentExhausted)
    }

    /// Leases a new segment unless another caller already did while this one
    /// waited for the refill lock.
    ///
    /// # Errors
    ///
    /// Returns the store error; the local lease is left untouched.
    pub fn refill(&self) -> Result<RefillOutcome> {
        let _guard = lock!(self.refill);

        if LeaseState::from_raw(self.state.load(Ordering::Acquire)).is_leased() {
            return Ok(RefillOutcome::AlreadyLeased);
        }

        let segment = self.store.acquire_segment(self.step, self.init_value)?;
        if segment.size <= 0 {
            return Err(Error::SegmentExhausted);
        }

        // No fast-path CAS can succeed on an empty lease and other refills
        // are excluded by the lock, so a plain store is race-free here.
        self.state
            .store(LeaseState::from_segment(segment).to_raw(), Ordering::Release);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            first = segment.first,
            end = segment.end(),
            "leased segment"
        );

        Ok(RefillOutcome::Leased(segment))
    }

    fn try_dispense(&self) -> Option<i64> {
        let mut raw = self.state.load(Ordering::Acquire);
        loop {
            let (next, value) = LeaseState::from_raw(raw).dispense()?;
            match self.state.compare_exchange_weak(
                raw,
                next.to_raw(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(value),
                Err(actual) => raw = actual,
            }
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_refill(&self) -> Result<RefillOutcome> {
        self.refill().inspect_err(|_e| {
            #[cfg(feature = "tracing")]
            tracing::warn!("segment refill failed: {_e}");
        })
    }

    fn check_mode(&self, requested: IdWidth) -> Result<()> {
        match self.mode() {
            Some(bound) if bound != requested => Err(Error::ModeConflict { bound, requested }),
            _ => Ok(()),
        }
    }

    fn bind_mode(&self, requested: IdWidth) -> Result<()> {
        match self.mode.compare_exchange(
            MODE_UNSET,
            requested as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Ok(()),
            Err(raw) => match IdWidth::from_u8(raw) {
                Some(bound) if bound != requested => {
                    Err(Error::ModeConflict { bound, requested })
                }
                _ => Ok(()),
            },
        }
    }
}

impl<S> UidAllocator for SegmentAllocator<S>
where
    S: SequenceStore,
{
    fn has_int32(&self) -> bool {
        true
    }

    fn try_next_uid32(&self) -> Result<i32> {
        self.check_mode(IdWidth::Int32)?;
        let value = self.dispense()?;
        // An overflowing value is consumed but must not bind the width.
        let value = i32::try_from(value).map_err(|_| Error::Int32Overflow(value))?;
        self.bind_mode(IdWidth::Int32)?;
        Ok(value)
    }

    fn try_next_uid64(&self) -> Result<i64> {
        self.check_mode(IdWidth::Int64)?;
        let value = self.dispense()?;
        self.bind_mode(IdWidth::Int64)?;
        Ok(value)
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            discarded = self.remaining(),
            "closing segment allocator"
        );
        self.store.close()
    }
}

#[cfg_attr(docsrs, doc(cfg(feature = "mysql")))]
#[cfg(feature = "mysql")]
impl SegmentAllocator<crate::store::MySqlSequenceStore> {
    /// Connects to the configured MySQL sequence table and builds an
    /// allocator over it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if the database is unreachable or the
    /// table cannot be prepared.
    pub fn connect(config: &crate::config::SegmentConfig) -> Result<Self> {
        let store = crate::store::MySqlSequenceStore::connect(config)?;
        Self::new(store, config.step, config.init_value)
    }
}
