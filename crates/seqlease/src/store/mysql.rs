use core::time::Duration;

use sqlx::{
    MySqlPool,
    mysql::{MySqlConnectOptions, MySqlPoolOptions},
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::{SegmentConfig, validate_identifier},
    error::{Error, Result},
    mutex::{Mutex, lock},
    store::{Segment, SequenceStore, runtime::BlockingRuntime},
};

const MAX_CONNECTIONS: u32 = 5;
const MAX_LIFETIME: Duration = Duration::from_secs(8 * 60 * 60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const PING_SQL: &str = "SELECT 1";

/// Renders the idempotent DDL for a sequence table.
///
/// Both names must already be validated identifiers.
pub fn create_table_sql(db_name: &str, table_name: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS `{db_name}`.`{table_name}` (\n  \
         id int(11) NOT NULL,\n  \
         next_id bigint(20) DEFAULT NULL,\n  \
         cache bigint(20) DEFAULT NULL,\n  \
         PRIMARY KEY (id)\n\
         ) ENGINE=InnoDB DEFAULT CHARSET=utf8 COMMENT='uid sequence'"
    )
}

/// Statements against one sequence table, rendered once at connect time.
#[derive(Debug, Clone)]
struct Statements {
    select_for_update: String,
    insert: String,
    advance: String,
}

impl Statements {
    fn new(table: &str) -> Self {
        Self {
            select_for_update: format!(
                "SELECT next_id, cache FROM `{table}` WHERE id = 0 FOR UPDATE"
            ),
            insert: format!("INSERT INTO `{table}` (id, next_id, cache) VALUES (0, ?, ?)"),
            advance: format!("UPDATE `{table}` SET next_id = ?, cache = ? WHERE id = 0"),
        }
    }
}

/// A [`SequenceStore`] over a single-row MySQL table.
///
/// Each lease runs in its own transaction that locks the row with
/// `SELECT ... FOR UPDATE`, so leases from any number of processes are
/// serialized by the database. While the store is open a background task
/// pings the pool at the configured interval; [`SequenceStore::close`] stops
/// it and closes the pool.
///
/// Table layout:
///
/// ```sql
/// id      INT PRIMARY KEY   -- always 0
/// next_id BIGINT            -- exclusive upper bound of the last lease
/// cache   BIGINT            -- width of the last lease
/// ```
#[derive(Debug)]
pub struct MySqlSequenceStore {
    runtime: BlockingRuntime,
    pool: MySqlPool,
    statements: Statements,
    shutdown: CancellationToken,
    liveness: Mutex<Option<JoinHandle<()>>>,
}

impl MySqlSequenceStore {
    /// Connects to the database, verifies it answers queries, and creates the
    /// sequence table when `auto_create_table` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if the table name is not a plain
    /// identifier, the database is unreachable, or the table cannot be
    /// created.
    pub fn connect(config: &SegmentConfig) -> Result<Self> {
        validate_identifier("db_name", &config.db_name)?;
        validate_identifier("table_name", &config.table_name)?;

        let runtime = BlockingRuntime::new("seqlease-mysql")?;
        let options = MySqlConnectOptions::new()
            .host(&config.server)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.db_name);

        let pool = runtime
            .block_on(
                MySqlPoolOptions::new()
                    .max_connections(MAX_CONNECTIONS)
                    .max_lifetime(MAX_LIFETIME)
                    .acquire_timeout(CONNECT_TIMEOUT)
                    .connect_with(options),
            )
            .map_err(|e| {
                Error::config(format!(
                    "cannot connect to {}:{}: {e}",
                    config.server, config.port
                ))
            })?;

        runtime
            .block_on(sqlx::query("SELECT NOW()").execute(&pool))
            .map_err(|e| Error::config(format!("database probe failed: {e}")))?;

        if config.auto_create_table {
            let ddl = create_table_sql(&config.db_name, &config.table_name);
            runtime
                .block_on(sqlx::raw_sql(&ddl).execute(&pool))
                .map_err(|e| Error::config(format!("prepare table {}: {e}", config.table_name)))?;
            #[cfg(feature = "tracing")]
            tracing::debug!(table = %config.table_name, "sequence table ready");
        }

        let shutdown = CancellationToken::new();
        let liveness = runtime.spawn(liveness_loop(
            pool.clone(),
            config.ping_interval,
            shutdown.clone(),
        ));

        Ok(Self {
            runtime,
            pool,
            statements: Statements::new(&config.table_name),
            shutdown,
            liveness: Mutex::new(Some(liveness)),
        })
    }

    async fn lease(&self, step: i64, init_value: i64) -> Result<Segment> {
        // Dropping the transaction on any early return rolls it back.
        let mut tx = self.pool.begin().await?;

        let row: Option<(Option<i64>, Option<i64>)> =
            sqlx::query_as(&self.statements.select_for_update)
                .fetch_optional(&mut *tx)
                .await?;

        let first = match row {
            Some((next_id, _cache)) => next_id.unwrap_or(init_value),
            None => {
                let inserted = sqlx::query(&self.statements.insert)
                    .bind(init_value)
                    .bind(step)
                    .execute(&mut *tx)
                    .await?;
                if inserted.rows_affected() != 1 {
                    return Err(Error::store("sequence row was not created"));
                }
                init_value
            }
        };

        let next_id = first.checked_add(step).ok_or(Error::SegmentExhausted)?;
        let advanced = sqlx::query(&self.statements.advance)
            .bind(next_id)
            .bind(step)
            .execute(&mut *tx)
            .await?;
        if advanced.rows_affected() != 1 {
            return Err(Error::store("sequence row was not advanced"));
        }

        tx.commit().await?;
        Ok(Segment { first, size: step })
    }
}

impl SequenceStore for MySqlSequenceStore {
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    fn acquire_segment(&self, step: i64, init_value: i64) -> Result<Segment> {
        if self.pool.is_closed() {
            return Err(Error::Closed);
        }
        self.runtime.block_on(self.lease(step, init_value))
    }

    fn ping(&self) -> Result<()> {
        if self.pool.is_closed() {
            return Err(Error::Closed);
        }
        self.runtime.block_on(ping_pool(&self.pool))
    }

    fn close(&self) -> Result<()> {
        self.shutdown.cancel();
        let liveness = lock!(self.liveness).take();
        if let Some(handle) = liveness {
            // The task only ends by observing the token, a join error means it
            // panicked and there is nothing left to stop.
            let _ = self.runtime.block_on(handle);
        }
        self.runtime.block_on(self.pool.close());
        #[cfg(feature = "tracing")]
        tracing::debug!("mysql sequence store closed");
        Ok(())
    }
}

impl Drop for MySqlSequenceStore {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// One no-op round trip, shared by [`SequenceStore::ping`] and the liveness
/// task.
async fn ping_pool(pool: &MySqlPool) -> Result<()> {
    sqlx::query(PING_SQL).execute(pool).await?;
    Ok(())
}

async fn liveness_loop(pool: MySqlPool, period: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately; the connection was just probed.
    ticker.tick().await;

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(_e) = ping_pool(&pool).await {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("sequence store ping failed: {_e}");
                }
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("liveness task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_targets_schema_and_table() {
        let ddl = create_table_sql("test", "int64_seq");
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS `test`.`int64_seq`"));
        assert!(ddl.contains("next_id bigint(20)"));
        assert!(ddl.contains("PRIMARY KEY (id)"));
    }

    #[test]
    fn statements_lock_the_partition_row() {
        let statements = Statements::new("int32_seq");
        assert!(statements.select_for_update.ends_with("WHERE id = 0 FOR UPDATE"));
        assert!(statements.insert.contains("`int32_seq`"));
        assert!(statements.advance.starts_with("UPDATE `int32_seq` SET next_id = ?"));
    }
}
