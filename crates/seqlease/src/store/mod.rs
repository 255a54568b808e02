//! Backing stores for the store-coordinated strategies.
//!
//! - [`SequenceStore`] leases contiguous segments from a durable sequence row
//!   and backs the segment strategy. [`MySqlSequenceStore`] is the networked
//!   implementation; [`MemorySequenceStore`] keeps the row in process.
//! - [`CounterStore`] exposes a single atomically incremented key and backs
//!   the counter strategy. [`RedisCounterStore`] is the networked
//!   implementation; [`MemoryCounterStore`] keeps the keys in process.
//!
//! The networked stores expose a blocking interface. Each owns a small Tokio
//! runtime and must not be called from inside an async context.

mod counter;
mod memory;
#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "redis")]
mod redis_counter;
#[cfg(any(feature = "mysql", feature = "redis"))]
mod runtime;
mod sequence;
#[cfg(test)]
mod tests;

pub use counter::*;
pub use memory::*;
#[cfg_attr(docsrs, doc(cfg(feature = "mysql")))]
#[cfg(feature = "mysql")]
pub use mysql::*;
#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
#[cfg(feature = "redis")]
pub use redis_counter::*;
pub use sequence::*;
