use crate::{config::SchemaConfig, defaults};
use std::{env, str::FromStr};
use strum::{AsRefStr, EnumString};
use tracing_subscriber::filter::EnvFilter;

/// Environment variables consulted when initialising logging.
#[derive(Debug, EnumString, AsRefStr)]
pub enum EnvVar {
    #[strum(serialize = "RUST_LOG")]
    RustLog,
    #[strum(serialize = "HUMAN_LOGGING")]
    HumanLogging,
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` controls the filter, `HUMAN_LOGGING=false` switches to JSON lines.
pub fn init_logging(config: &SchemaConfig) -> anyhow::Result<()> {
    let level = if config.verbose {
        "debug"
    } else {
        defaults::LOG_LEVEL
    };

    let filter = match env::var_os(EnvVar::RustLog.as_ref()) {
        Some(_) => EnvFilter::try_from_default_env()
            .map_err(|e| anyhow::anyhow!("Invalid `RUST_LOG` provided: {e}"))?,
        None => EnvFilter::new(level),
    };

    let human_logging = match env::var(EnvVar::HumanLogging.as_ref()) {
        Ok(value) => bool::from_str(&value).map_err(|_| {
            anyhow::anyhow!("Expected `true` or `false` to be provided for `HUMAN_LOGGING`")
        })?,
        Err(_) => true,
    };

    let sub = tracing_subscriber::fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    let result = if human_logging {
        sub.with_ansi(true)
            .with_level(true)
            .with_line_number(true)
            .try_init()
    } else {
        sub.with_ansi(false)
            .with_level(true)
            .with_line_number(true)
            .json()
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialise logging: {e}"))
}
