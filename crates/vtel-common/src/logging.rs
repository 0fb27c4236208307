//! ---
//! vtel_section: "01-core-functionality"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Shared primitives and utilities for the simulator runtime."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
use anyhow::Result;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_appender::rolling::daily;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LoggingConfig, TransportKind};

const LOG_ENV: &str = "VTEL_LOG";

static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();
static CONSOLE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

/// Available log formats for the simulator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    StructuredJson,
    #[default]
    Pretty,
}

/// Stream receiving console log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stdout,
    /// Keeps stdout free for data, e.g. when records are written there.
    Stderr,
}

impl LogOutput {
    /// Console stream that does not collide with the publish sink.
    pub fn for_transport(transport: TransportKind) -> Self {
        match transport {
            TransportKind::Stdout => LogOutput::Stderr,
            TransportKind::Kafka => LogOutput::Stdout,
        }
    }

    fn writer(
        self,
    ) -> (
        tracing_appender::non_blocking::NonBlocking,
        tracing_appender::non_blocking::WorkerGuard,
    ) {
        match self {
            LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        }
    }
}

/// Build the filter from `VTEL_LOG`, then `RUST_LOG`, then the configured level.
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(&directive).unwrap_or_else(|err| {
            eprintln!(
                "invalid {} directive ({}); falling back to {}",
                LOG_ENV, err, config.level
            );
            EnvFilter::new(&config.level)
        }),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level)),
    }
}

/// Initialize the tracing subscriber based on configuration and environment variables.
///
/// * `VTEL_LOG` overrides the log filter (e.g. `info`, `debug,vtel_msg=trace`).
///   When unset the standard `RUST_LOG` variable is honoured, finally falling back
///   to `logging.level` from the configuration.
/// * `output` (stdout or stderr) receives pretty or structured JSON output; when
///   `logging.directory` is set a daily rolling JSON file is written as well.
///
/// Calling this more than once is harmless: later calls leave the first subscriber in place.
pub fn init_tracing(service_name: &str, config: &LoggingConfig, output: LogOutput) -> Result<()> {
    let (console_writer, console_guard) = output.writer();
    let _ = CONSOLE_GUARD.set(console_guard);

    let fmt_layer = match config.format {
        LogFormat::StructuredJson => fmt::layer()
            .with_target(false)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .json()
            .with_writer(console_writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(console_writer)
            .boxed(),
    };

    let file_layer = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let prefix = config
                .file_prefix
                .clone()
                .unwrap_or_else(|| service_name.to_owned());
            let file_appender = daily(directory, format!("{}-{}.log", prefix, service_name));
            let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
            let _ = FILE_GUARD.set(file_guard);
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .json()
                    .with_writer(file_writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(fmt_layer)
        .with(file_layer)
        .try_init()
        .ok();

    info!(
        service = %service_name,
        log_dir = ?config.directory,
        format = ?config.format,
        output = ?output,
        "tracing initialised"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_uses_kebab_case() {
        let config: LoggingConfig =
            toml::from_str("format = \"structured-json\"").expect("parse logging config");
        assert_eq!(config.format, LogFormat::StructuredJson);
        assert_eq!(config.level, "info");
        assert!(config.directory.is_none());
    }

    #[test]
    fn stdout_sink_moves_console_logs_to_stderr() {
        assert_eq!(LogOutput::for_transport(TransportKind::Stdout), LogOutput::Stderr);
        assert_eq!(LogOutput::for_transport(TransportKind::Kafka), LogOutput::Stdout);
        assert_eq!(LogOutput::default(), LogOutput::Stdout);
    }

    #[test]
    fn init_with_file_layer_creates_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let target = dir.path().join("logs");
        let config = LoggingConfig {
            directory: Some(target.clone()),
            ..LoggingConfig::default()
        };
        init_tracing("vtel-test", &config, LogOutput::Stderr).expect("tracing initialised");
        init_tracing("vtel-test", &config, LogOutput::Stdout).expect("second init is a no-op");
        assert!(target.is_dir());
    }
}
