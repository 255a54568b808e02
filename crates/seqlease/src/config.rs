//! Allocator configuration.
//!
//! [`UidConfig`] is the flat option set every strategy is constructed from.
//! Each strategy validates the fields it needs by converting it into its own
//! view ([`SegmentConfig`], [`CounterConfig`], [`CompositeConfig`]); invalid
//! values are reported as [`Error::ConfigInvalid`] before any connection is
//! attempted.

use core::time::Duration;

use crate::{
    error::{Error, Result},
    id::{Snowflake, SnowflakeTwitterId},
};

pub const DEFAULT_STEP: i64 = 1000;
pub const DEFAULT_INIT_VALUE: i64 = 1;
pub const DEFAULT_KEY: &str = "uid";
pub const DEFAULT_MYSQL_PORT: u16 = 3306;
pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_COUNTER_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Options recognized by the allocator strategies.
///
/// Unused fields are ignored by strategies that do not need them. With the
/// `serde` feature the struct deserializes from JSON objects such as
/// `{"server": "127.0.0.1", "port": 3306, "table_name": "int64_seq"}`;
/// missing fields take their defaults.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UidConfig {
    /// Store host name or address.
    pub server: String,
    /// Store port; `0` selects the strategy's default port.
    pub port: u16,
    pub user: String,
    pub password: String,

    /// Database holding the sequence table (segment strategy).
    pub db_name: String,
    /// Sequence table name (segment strategy).
    pub table_name: String,
    /// `next_id` written when the sequence row is created.
    pub init_value: i64,
    /// Width of each leased segment.
    pub step: i64,
    /// Create the sequence table at initialization if it is missing.
    pub auto_create_table: bool,
    /// Seconds between liveness pings of the segment store.
    pub ping_interval_secs: u64,

    /// Key prefix (counter strategy).
    pub key: String,
    /// Expiry applied when a counter key is seeded, in seconds.
    pub ttl_secs: u64,

    /// Externally assigned node identifier (time-composite strategy).
    pub node_id: i64,
}

impl Default for UidConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: 0,
            user: String::new(),
            password: String::new(),
            db_name: String::new(),
            table_name: String::new(),
            init_value: DEFAULT_INIT_VALUE,
            step: DEFAULT_STEP,
            auto_create_table: false,
            ping_interval_secs: DEFAULT_PING_INTERVAL.as_secs(),
            key: DEFAULT_KEY.to_string(),
            ttl_secs: DEFAULT_COUNTER_TTL.as_secs(),
            node_id: 0,
        }
    }
}

/// Validated settings for the segment strategy.
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db_name: String,
    pub table_name: String,
    pub init_value: i64,
    pub step: i64,
    pub auto_create_table: bool,
    pub ping_interval: Duration,
}

impl TryFrom<&UidConfig> for SegmentConfig {
    type Error = Error;

    fn try_from(config: &UidConfig) -> Result<Self> {
        if config.server.is_empty() {
            return Err(Error::config("server must be set"));
        }
        if config.db_name.is_empty() {
            return Err(Error::config("db_name must be set"));
        }
        validate_identifier("db_name", &config.db_name)?;
        validate_identifier("table_name", &config.table_name)?;
        let (init_value, step) = validate_lease(config.init_value, config.step)?;
        if config.ping_interval_secs == 0 {
            return Err(Error::config("ping_interval_secs must be greater than 0"));
        }

        Ok(Self {
            server: config.server.clone(),
            port: non_zero_port(config.port, DEFAULT_MYSQL_PORT),
            user: config.user.clone(),
            password: config.password.clone(),
            db_name: config.db_name.clone(),
            table_name: config.table_name.clone(),
            init_value,
            step,
            auto_create_table: config.auto_create_table,
            ping_interval: Duration::from_secs(config.ping_interval_secs),
        })
    }
}

/// Validated settings for the atomic counter strategy.
#[derive(Debug, Clone)]
pub struct CounterConfig {
    pub server: String,
    pub port: u16,
    pub password: String,
    pub key: String,
    pub ttl: Duration,
}

impl CounterConfig {
    /// Connection URL in the `redis://` scheme.
    pub fn url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}/", self.server, self.port)
        } else {
            format!("redis://:{}@{}:{}/", self.password, self.server, self.port)
        }
    }
}

impl TryFrom<&UidConfig> for CounterConfig {
    type Error = Error;

    fn try_from(config: &UidConfig) -> Result<Self> {
        if config.server.is_empty() {
            return Err(Error::config("server must be set"));
        }
        if config.key.is_empty() {
            return Err(Error::config("key must not be empty"));
        }
        if config.ttl_secs == 0 {
            return Err(Error::config("ttl_secs must be greater than 0"));
        }

        Ok(Self {
            server: config.server.clone(),
            port: non_zero_port(config.port, DEFAULT_REDIS_PORT),
            password: config.password.clone(),
            key: config.key.clone(),
            ttl: Duration::from_secs(config.ttl_secs),
        })
    }
}

/// Validated settings for the time-composite strategy.
#[derive(Debug, Clone, Copy)]
pub struct CompositeConfig {
    pub node_id: u64,
}

impl TryFrom<&UidConfig> for CompositeConfig {
    type Error = Error;

    fn try_from(config: &UidConfig) -> Result<Self> {
        let max = SnowflakeTwitterId::max_node_id();
        match u64::try_from(config.node_id) {
            Ok(node_id) if node_id <= max => Ok(Self { node_id }),
            _ => Err(Error::config(format!(
                "node_id {} outside 0..={max}",
                config.node_id
            ))),
        }
    }
}

/// Checks a lease definition shared by every segment store.
pub(crate) fn validate_lease(init_value: i64, step: i64) -> Result<(i64, i64)> {
    if step <= 0 {
        return Err(Error::config(format!("step must be positive, got {step}")));
    }
    if init_value < 0 {
        return Err(Error::config(format!(
            "init_value must not be negative, got {init_value}"
        )));
    }
    Ok((init_value, step))
}

/// Table and schema names are interpolated into SQL, so only plain
/// identifiers are accepted.
pub(crate) fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::config(format!("{field} must be set")));
    }
    if value.len() > 64 {
        return Err(Error::config(format!("{field} is longer than 64 characters")));
    }
    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if !valid || value.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(Error::config(format!(
            "{field} {value:?} is not a plain identifier"
        )));
    }
    Ok(())
}

fn non_zero_port(port: u16, default: u16) -> u16 {
    if port == 0 { default } else { port }
}
