use anyhow::{Result, bail};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Info,
    Debug,
}

impl LogLevel {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => bail!("invalid log_level: {} (expected error, info or debug)", other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// Install the process-wide subscriber. `RUST_LOG` wins over `level` when set.
/// Calling this more than once keeps the first subscriber.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("trustanchor={}", level.as_str())));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn info(tag: &str, message: &str) {
    tracing::info!(tag = tag, "{}", message);
}

pub fn debug(tag: &str, message: &str) {
    tracing::debug!(tag = tag, "{}", message);
}

pub fn error(tag: &str, message: &str) {
    tracing::error!(tag = tag, "{}", message);
}
