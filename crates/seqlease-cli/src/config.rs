use std::{fs, path::PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use seqlease::{IdWidth, TIME_COMPOSITE, UidConfig};

/// Runtime configuration for the `seqlease` binary.
///
/// Allocator options are layered: built-in defaults, then the JSON file given
/// by `--config`, then any individual flag or environment variable.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "seqlease",
    version,
    about = "Allocates distributed unique integer IDs"
)]
pub struct CliArgs {
    /// Allocator strategy: `segment`, `counter`, or `snowflake`.
    ///
    /// Environment variable: `SEQLEASE_STRATEGY`
    #[arg(long, env = "SEQLEASE_STRATEGY", default_value_t = String::from(TIME_COMPOSITE))]
    pub strategy: String,

    /// JSON file holding allocator options, e.g.
    /// `{"server": "127.0.0.1", "db_name": "test", "table_name": "int64_seq"}`.
    ///
    /// Environment variable: `SEQLEASE_CONFIG`
    #[arg(short, long, env = "SEQLEASE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of IDs to allocate and print.
    ///
    /// Environment variable: `SEQLEASE_COUNT`
    #[arg(short = 'n', long, env = "SEQLEASE_COUNT", default_value_t = 1)]
    pub count: u64,

    /// ID width, 32 or 64.
    ///
    /// Environment variable: `SEQLEASE_WIDTH`
    #[arg(short, long, env = "SEQLEASE_WIDTH", default_value_t = 64)]
    pub width: u8,

    /// Emit logs as JSON lines.
    ///
    /// Environment variable: `SEQLEASE_LOG_JSON`
    #[arg(long, env = "SEQLEASE_LOG_JSON", default_value_t = false)]
    pub log_json: bool,

    #[arg(long, env = "SEQLEASE_SERVER")]
    pub server: Option<String>,
    #[arg(long, env = "SEQLEASE_PORT")]
    pub port: Option<u16>,
    #[arg(long, env = "SEQLEASE_USER")]
    pub user: Option<String>,
    #[arg(long, env = "SEQLEASE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    #[arg(long, env = "SEQLEASE_DB_NAME")]
    pub db_name: Option<String>,
    #[arg(long, env = "SEQLEASE_TABLE_NAME")]
    pub table_name: Option<String>,
    #[arg(long, env = "SEQLEASE_INIT_VALUE")]
    pub init_value: Option<i64>,
    #[arg(long, env = "SEQLEASE_STEP")]
    pub step: Option<i64>,
    #[arg(long, env = "SEQLEASE_AUTO_CREATE_TABLE")]
    pub auto_create_table: Option<bool>,
    #[arg(long, env = "SEQLEASE_PING_INTERVAL_SECS")]
    pub ping_interval_secs: Option<u64>,
    #[arg(long, env = "SEQLEASE_KEY")]
    pub key: Option<String>,
    #[arg(long, env = "SEQLEASE_TTL_SECS")]
    pub ttl_secs: Option<u64>,
    #[arg(long, env = "SEQLEASE_NODE_ID")]
    pub node_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub strategy: String,
    pub uid: UidConfig,
    pub count: u64,
    pub width: IdWidth,
    pub log_json: bool,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.count == 0 {
            bail!("SEQLEASE_COUNT must be greater than 0");
        }

        let width = match args.width {
            32 => IdWidth::Int32,
            64 => IdWidth::Int64,
            other => bail!("SEQLEASE_WIDTH must be 32 or 64, got {other}"),
        };

        let mut uid = match &args.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str::<UidConfig>(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => UidConfig::default(),
        };

        macro_rules! overlay {
            ($($field:ident),+ $(,)?) => {
                $(if let Some(value) = args.$field {
                    uid.$field = value;
                })+
            };
        }
        overlay!(
            server,
            port,
            user,
            password,
            db_name,
            table_name,
            init_value,
            step,
            auto_create_table,
            ping_interval_secs,
            key,
            ttl_secs,
            node_id,
        );

        Ok(Self {
            strategy: args.strategy,
            uid,
            count: args.count,
            width,
            log_json: args.log_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<CliConfig> {
        let args = CliArgs::try_parse_from(std::iter::once("seqlease").chain(args.iter().copied()))?;
        CliConfig::try_from(args)
    }

    #[test]
    fn defaults_to_single_64_bit_time_composite_id() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.strategy, TIME_COMPOSITE);
        assert_eq!(config.count, 1);
        assert_eq!(config.width, IdWidth::Int64);
        assert_eq!(config.uid, UidConfig::default());
    }

    #[test]
    fn rejects_zero_count_and_odd_widths() {
        assert!(parse(&["--count", "0"]).is_err());
        assert!(parse(&["--width", "16"]).is_err());
        assert_eq!(
            parse(&["--width", "32"]).unwrap().width,
            IdWidth::Int32
        );
    }

    #[test]
    fn flags_override_config_file() {
        let path = std::env::temp_dir().join(format!(
            "seqlease-cli-{}-flags_override_config_file.json",
            std::process::id()
        ));
        fs::write(
            &path,
            r#"{"server": "db.internal", "db_name": "ids", "table_name": "int64_seq", "step": 50}"#,
        )
        .unwrap();

        let config = parse(&[
            "--strategy",
            "segment",
            "--config",
            path.to_str().unwrap(),
            "--step",
            "200",
            "--auto-create-table",
            "true",
        ])
        .unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.strategy, "segment");
        assert_eq!(config.uid.server, "db.internal");
        assert_eq!(config.uid.table_name, "int64_seq");
        assert_eq!(config.uid.step, 200);
        assert!(config.uid.auto_create_table);
        assert_eq!(config.uid.key, seqlease::DEFAULT_KEY);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = parse(&["--config", "/nonexistent/seqlease.json"]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/seqlease.json"));
    }
}
