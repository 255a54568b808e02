use core::fmt;

use crate::id::Snowflake;

/// A 64-bit Snowflake ID using the Twitter layout
///
/// - 1 bit reserved
/// - 41 bits timestamp (ms since [`TWITTER_EPOCH`])
/// - 10 bits node ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21          12 11             0
///              +--------------+----------------+--------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | node ID (10) | sequence (12) |
///              +--------------+----------------+--------------+---------------+
///              |<----------- MSB ---------- 64 bits ----------- LSB --------->|
/// ```
///
/// The reserved bit keeps every ID positive when reinterpreted as an `i64`.
///
/// [`TWITTER_EPOCH`]: crate::TWITTER_EPOCH
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeTwitterId {
    id: u64,
}

impl SnowflakeTwitterId {
    /// Bitmask for the 41-bit timestamp field. Occupies bits 22 through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for the 10-bit node ID field. Occupies bits 12 through 21.
    pub const NODE_ID_MASK: u64 = (1 << 10) - 1;

    /// Bitmask for the 12-bit sequence field. Occupies bits 0 through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    pub const TIMESTAMP_SHIFT: u64 = 22;
    pub const NODE_ID_SHIFT: u64 = 12;
    pub const SEQUENCE_SHIFT: u64 = 0;

    pub const fn from(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let node_id = (node_id & Self::NODE_ID_MASK) << Self::NODE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | node_id | sequence,
        }
    }

    /// Extracts the timestamp from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the node ID from the packed ID.
    pub const fn node_id(&self) -> u64 {
        (self.id >> Self::NODE_ID_SHIFT) & Self::NODE_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the packed ID as a signed integer.
    pub const fn to_i64(&self) -> i64 {
        // The reserved bit is never set by `from`.
        self.id as i64
    }
}

impl Snowflake for SnowflakeTwitterId {
    fn timestamp(&self) -> u64 {
        self.timestamp()
    }

    fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    fn node_id(&self) -> u64 {
        self.node_id()
    }

    fn max_node_id() -> u64 {
        Self::NODE_ID_MASK
    }

    fn sequence(&self) -> u64 {
        self.sequence()
    }

    fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    fn from_components(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(node_id <= Self::NODE_ID_MASK, "node_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from(timestamp, node_id, sequence)
    }

    fn to_raw(&self) -> u64 {
        self.id
    }

    fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }
}

impl fmt::Display for SnowflakeTwitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeTwitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeTwitterId")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp())
            .field("node_id", &self.node_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_and_unpacks_components() {
        let id = SnowflakeTwitterId::from_components(123_456, 1023, 4095);
        assert_eq!(id.timestamp(), 123_456);
        assert_eq!(id.node_id(), 1023);
        assert_eq!(id.sequence(), 4095);
        assert_eq!(SnowflakeTwitterId::from_raw(id.to_raw()), id);
    }

    #[test]
    fn reserved_bit_stays_clear() {
        let id = SnowflakeTwitterId::from(
            SnowflakeTwitterId::TIMESTAMP_MASK,
            SnowflakeTwitterId::NODE_ID_MASK,
            SnowflakeTwitterId::SEQUENCE_MASK,
        );
        assert!(id.to_i64() > 0);
        assert_eq!(id.to_raw() >> 63, 0);
    }

    #[test]
    fn ordering_follows_timestamp_then_sequence() {
        let a = SnowflakeTwitterId::from(10, 5, 4095);
        let b = SnowflakeTwitterId::from(11, 0, 0);
        let c = b.increment_sequence();
        assert!(a < b && b < c);
        assert_eq!(c.rollover_to_timestamp(12).sequence(), 0);
    }
}
