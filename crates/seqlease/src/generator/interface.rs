use core::fmt;
use std::sync::Arc;

use crate::error::{Result, SENTINEL};

/// The integer width an allocator hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IdWidth {
    Int32 = 1,
    Int64 = 2,
}

impl IdWidth {
    pub(crate) const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Int32),
            2 => Some(Self::Int64),
            _ => None,
        }
    }
}

impl fmt::Display for IdWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int32 => f.write_str("32-bit"),
            Self::Int64 => f.write_str("64-bit"),
        }
    }
}

/// A source of unique integer IDs shared by any number of threads.
///
/// Every strategy offers two ways to ask for an ID:
///
/// - [`UidAllocator::try_next_uid32`] / [`UidAllocator::try_next_uid64`]
///   return a typed error describing why no ID was produced.
/// - [`UidAllocator::next_uid32`] / [`UidAllocator::next_uid64`] collapse
///   every failure into [`SENTINEL`] (`-1`), meaning "no ID now, retry".
///
/// Neither retries internally; retry policy belongs to the caller.
///
/// # Example
///
/// ```
/// use seqlease::{MemorySequenceStore, SegmentAllocator, UidAllocator};
///
/// let allocator = SegmentAllocator::new(MemorySequenceStore::new(), 10, 1000).unwrap();
/// assert!(allocator.has_int32());
/// assert_eq!(allocator.next_uid64(), 1000);
/// assert_eq!(allocator.next_uid64(), 1001);
/// // Bound to 64-bit IDs now.
/// assert_eq!(allocator.next_uid32(), -1);
/// allocator.close().unwrap();
/// ```
pub trait UidAllocator: Send + Sync {
    /// Whether this strategy can produce 32-bit IDs at all.
    fn has_int32(&self) -> bool;

    /// Produces the next 32-bit ID.
    ///
    /// # Errors
    ///
    /// Returns an error when the strategy has no ID available right now, is
    /// bound to 64-bit IDs, does not support 32-bit IDs, or is closed.
    fn try_next_uid32(&self) -> Result<i32>;

    /// Produces the next 64-bit ID.
    ///
    /// # Errors
    ///
    /// Returns an error when the strategy has no ID available right now, is
    /// bound to 32-bit IDs, or is closed.
    fn try_next_uid64(&self) -> Result<i64>;

    /// Produces the next 32-bit ID, or [`SENTINEL`] if none is available.
    fn next_uid32(&self) -> i32 {
        match self.try_next_uid32() {
            Ok(id) => id,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("no 32-bit ID available: {_e}");
                SENTINEL as i32
            }
        }
    }

    /// Produces the next 64-bit ID, or [`SENTINEL`] if none is available.
    fn next_uid64(&self) -> i64 {
        match self.try_next_uid64() {
            Ok(id) => id,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("no 64-bit ID available: {_e}");
                SENTINEL
            }
        }
    }

    /// Releases the backing store and stops background work. Further
    /// dispense calls fail with [`crate::Error::Closed`].
    ///
    /// # Errors
    ///
    /// Returns the store error if its resources cannot be released cleanly.
    fn close(&self) -> Result<()>;
}

impl<A> UidAllocator for Box<A>
where
    A: UidAllocator + ?Sized,
{
    fn has_int32(&self) -> bool {
        (**self).has_int32()
    }

    fn try_next_uid32(&self) -> Result<i32> {
        (**self).try_next_uid32()
    }

    fn try_next_uid64(&self) -> Result<i64> {
        (**self).try_next_uid64()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

impl<A> UidAllocator for Arc<A>
where
    A: UidAllocator + ?Sized,
{
    fn has_int32(&self) -> bool {
        (**self).has_int32()
    }

    fn try_next_uid32(&self) -> Result<i32> {
        (**self).try_next_uid32()
    }

    fn try_next_uid64(&self) -> Result<i64> {
        (**self).try_next_uid64()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}
