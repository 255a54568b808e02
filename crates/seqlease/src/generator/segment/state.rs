use crate::store::Segment;

/// The local lease: the last dispensed integer and the count still unused.
///
/// Both halves live in one 128-bit word so a dispense and a refill are each a
/// single atomic step; a refill can never interleave between consuming a unit
/// of `remain` and advancing `current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LeaseState {
    pub(crate) current: i64,
    pub(crate) remain: i64,
}

impl LeaseState {
    pub(crate) const EMPTY: Self = Self {
        current: 0,
        remain: 0,
    };

    pub(crate) const fn from_segment(segment: Segment) -> Self {
        Self {
            current: segment.first - 1,
            remain: segment.size,
        }
    }

    pub(crate) const fn is_leased(&self) -> bool {
        self.remain > 0
    }

    /// Consumes one unit of the lease, returning the next state and the value
    /// to hand out, or `None` once the lease is exhausted.
    pub(crate) const fn dispense(&self) -> Option<(Self, i64)> {
        if !self.is_leased() {
            return None;
        }
        let value = self.current + 1;
        Some((
            Self {
                current: value,
                remain: self.remain - 1,
            },
            value,
        ))
    }

    pub(crate) const fn to_raw(self) -> u128 {
        ((self.current as u64 as u128) << 64) | (self.remain as u64 as u128)
    }

    pub(crate) const fn from_raw(raw: u128) -> Self {
        Self {
            current: (raw >> 64) as u64 as i64,
            remain: raw as u64 as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_packing_preserves_signed_halves() {
        for state in [
            LeaseState::EMPTY,
            LeaseState {
                current: -1,
                remain: 10,
            },
            LeaseState {
                current: i64::MAX,
                remain: i64::MIN,
            },
        ] {
            assert_eq!(LeaseState::from_raw(state.to_raw()), state);
        }
    }

    #[test]
    fn dispense_walks_the_segment_then_stops() {
        let mut state = LeaseState::from_segment(Segment {
            first: 2000,
            size: 3,
        });
        let mut values = Vec::new();
        while let Some((next, value)) = state.dispense() {
            values.push(value);
            state = next;
        }
        assert_eq!(values, [2000, 2001, 2002]);
        assert!(!state.is_leased());
        assert_eq!(state.current, 2002);
    }
}
