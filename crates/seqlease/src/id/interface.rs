use core::{fmt, hash::Hash};

/// A 64-bit identifier packed from a timestamp, a node identifier, and a
/// per-tick sequence.
///
/// Implementors define the bit layout; the time-composite allocator only
/// relies on the accessors and the packing helpers below.
///
/// # Example
///
/// ```
/// use seqlease::{Snowflake, SnowflakeTwitterId};
///
/// let id = SnowflakeTwitterId::from(1000, 2, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.node_id(), 2);
/// assert_eq!(id.sequence(), 1);
/// ```
pub trait Snowflake:
    Sized + Copy + Clone + fmt::Display + fmt::Debug + PartialOrd + Ord + PartialEq + Eq + Hash
{
    /// Returns the timestamp portion of the ID.
    fn timestamp(&self) -> u64;

    /// Returns the maximum possible value for the timestamp field.
    fn max_timestamp() -> u64;

    /// Returns the node identifier portion of the ID.
    fn node_id(&self) -> u64;

    /// Returns the maximum possible value for the node identifier field.
    fn max_node_id() -> u64;

    /// Returns the sequence portion of the ID.
    fn sequence(&self) -> u64;

    /// Returns the maximum possible value for the sequence field.
    fn max_sequence() -> u64;

    /// Constructs a new ID from its components.
    fn from_components(timestamp: u64, node_id: u64, sequence: u64) -> Self;

    /// Converts this type into its raw representation.
    fn to_raw(&self) -> u64;

    /// Converts a raw value into this type.
    fn from_raw(raw: u64) -> Self;

    /// Returns true if the current sequence value can be incremented.
    fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns a new ID with the sequence incremented.
    fn increment_sequence(&self) -> Self {
        Self::from_components(self.timestamp(), self.node_id(), self.sequence() + 1)
    }

    /// Returns a new ID for a newer timestamp with sequence reset to zero.
    fn rollover_to_timestamp(&self, ts: u64) -> Self {
        Self::from_components(ts, self.node_id(), 0)
    }
}
