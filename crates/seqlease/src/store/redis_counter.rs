use core::time::Duration;

use redis::{Client, aio::ConnectionManager};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::CounterConfig,
    error::{Error, Result},
    store::{CounterStore, runtime::BlockingRuntime},
};

/// A [`CounterStore`] over Redis `INCR`.
///
/// Seeding and incrementing run as one `MULTI`/`EXEC` pipeline
/// (`SET key seed NX EX ttl` followed by `INCR key`), so a dispense costs a
/// single round trip and never races another process seeding the same key.
/// `INCR` keeps the expiry set by the seeding `SET`, so a key lapses `ttl`
/// after it was seeded however often it is incremented.
/// The connection manager reconnects transparently after network failures.
pub struct RedisCounterStore {
    runtime: BlockingRuntime,
    connection: ConnectionManager,
}

impl RedisCounterStore {
    /// Opens a connection and verifies the server answers `PING`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if the server is unreachable.
    pub fn connect(config: &CounterConfig) -> Result<Self> {
        let runtime = BlockingRuntime::new("seqlease-redis")?;
        let client = Client::open(config.url())
            .map_err(|e| Error::config(format!("invalid redis address: {e}")))?;

        let mut connection = runtime
            .block_on(ConnectionManager::new(client))
            .map_err(|e| {
                Error::config(format!(
                    "cannot connect to {}:{}: {e}",
                    config.server, config.port
                ))
            })?;

        runtime
            .block_on(redis::cmd("PING").query_async::<_, String>(&mut connection))
            .map_err(|e| Error::config(format!("redis probe failed: {e}")))?;

        Ok(Self {
            runtime,
            connection,
        })
    }
}

impl CounterStore for RedisCounterStore {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn incr_or_seed(&self, key: &str, seed: i64, ttl: Duration) -> Result<i64> {
        let mut connection = self.connection.clone();
        let (value,): (i64,) = self.runtime.block_on(
            redis::pipe()
                .atomic()
                .cmd("SET")
                .arg(key)
                .arg(seed)
                .arg("NX")
                .arg("EX")
                .arg(ttl.as_secs().max(1))
                .ignore()
                .cmd("INCR")
                .arg(key)
                .query_async(&mut connection),
        )?;
        Ok(value)
    }
}
