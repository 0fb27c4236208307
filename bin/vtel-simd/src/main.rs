//! ---
//! vtel_section: "05-binary"
//! vtel_subsection: "binary"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Binary entrypoint for the journey simulator."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::signal;
use tracing::{error, info};
use vtel_common::{init_tracing, AppConfig, BrokerConfig, LogOutput, TransportKind, VersionInfo};
use vtel_logging::{log_system_event, vtel_warn, LogContext, SystemEventOutcome};
use vtel_msg::{Publisher, StdoutTransport, Transport};
use vtel_sim::Journey;

const DEFAULT_CONFIG_PATH: &str = "configs/vtel.toml";

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "Simulated vehicle journey publishing correlated telemetry streams",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "HOSTS", help = "Override broker bootstrap servers")]
    brokers: Option<String>,

    #[arg(long, value_enum, help = "Override the publish sink")]
    transport: Option<CliTransport>,

    #[arg(long, help = "Override the random seed")]
    seed: Option<u64>,

    #[arg(long, value_name = "MS", help = "Override the pause between iterations")]
    delay_ms: Option<u64>,

    #[arg(long, value_name = "N", help = "Stop after N published iterations")]
    max_iterations: Option<u64>,

    #[arg(long, value_name = "ID", help = "Override the simulated device id")]
    device_id: Option<String>,

    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print extended version information and exit"
    )]
    version: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliTransport {
    Kafka,
    Stdout,
}

impl From<CliTransport> for TransportKind {
    fn from(value: CliTransport) -> Self {
        match value {
            CliTransport::Kafka => TransportKind::Kafka,
            CliTransport::Stdout => TransportKind::Stdout,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log_system_event(
                None,
                "simulation.failed",
                &format!("{err:#}"),
                SystemEventOutcome::Fault,
            );
            eprintln!("Unexpected error occurred: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let version = VersionInfo::current();
    if cli.version {
        println!("{}", version.extended());
        return Ok(());
    }

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from(DEFAULT_CONFIG_PATH));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let mut config = loaded.config;
    apply_overrides(&cli, &mut config);
    config.validate().context("invalid configuration")?;

    let log_output = LogOutput::for_transport(config.broker.transport);
    init_tracing("vtel-simd", &config.logging, log_output)?;
    info!(
        version = %version.semver,
        git_sha = %version.git_sha,
        source = ?loaded.source,
        "configuration loaded"
    );

    let transport = build_transport(&config.broker)?;
    let publisher = Publisher::new(transport).context("failed to create delivery metrics")?;
    info!(
        transport = publisher.transport_name(),
        brokers = %config.broker.bootstrap_servers,
        "publish sink ready"
    );

    let start_time = config.simulation.start_time.unwrap_or_else(Utc::now);
    let mut journey = Journey::from_config(&config, start_time)?;
    let mut rng = StdRng::seed_from_u64(config.simulation.random_seed);

    let report = journey
        .run(&publisher, &mut rng, shutdown_signal())
        .await
        .context("journey aborted")?;

    if let Err(err) = publisher.flush(config.broker.message_timeout) {
        vtel_warn!(
            context = LogContext::new().with_transport(publisher.transport_name()),
            "flush on shutdown failed: {}",
            err
        );
    }
    let delivery = publisher.metrics();
    info!(
        delivered = delivery.delivered,
        failed = delivery.failed,
        "delivery summary"
    );
    match log_output {
        LogOutput::Stdout => println!("{}", report.outcome.message()),
        LogOutput::Stderr => eprintln!("{}", report.outcome.message()),
    }
    Ok(())
}

/// CLI flags take precedence over file and default values.
fn apply_overrides(cli: &Cli, config: &mut AppConfig) {
    if let Some(brokers) = &cli.brokers {
        config.broker.bootstrap_servers = brokers.clone();
    }
    if let Some(transport) = cli.transport {
        config.broker.transport = transport.into();
    }
    if let Some(seed) = cli.seed {
        config.simulation.random_seed = seed;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.simulation.iteration_delay = Duration::from_millis(delay_ms);
    }
    if let Some(max_iterations) = cli.max_iterations {
        config.simulation.max_iterations = Some(max_iterations);
    }
    if let Some(device_id) = &cli.device_id {
        config.simulation.device_id = device_id.clone();
    }
}

fn build_transport(broker: &BrokerConfig) -> Result<Arc<dyn Transport>> {
    match broker.transport {
        TransportKind::Stdout => Ok(Arc::new(StdoutTransport::new())),
        TransportKind::Kafka => kafka_transport(broker),
    }
}

#[cfg(feature = "kafka")]
fn kafka_transport(broker: &BrokerConfig) -> Result<Arc<dyn Transport>> {
    let transport = vtel_msg::KafkaTransport::new(
        &broker.bootstrap_servers,
        broker.client_id.as_deref(),
        broker.message_timeout,
    )
    .with_context(|| format!("failed to create producer for {}", broker.bootstrap_servers))?;
    Ok(Arc::new(transport))
}

#[cfg(not(feature = "kafka"))]
fn kafka_transport(_broker: &BrokerConfig) -> Result<Arc<dyn Transport>> {
    anyhow::bail!(
        "broker.transport = \"kafka\" needs a build with `--features kafka`; use `--transport stdout` for a dry run"
    )
}

/// Resolves on Ctrl-C. If the handler cannot be installed the journey runs to completion.
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            log_system_event(
                None,
                "simulation.interrupt",
                "ctrl-c received; shutting down",
                SystemEventOutcome::Cancelled,
            );
        }
        Err(err) => {
            error!(error = %err, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            config: None,
            brokers: None,
            transport: None,
            seed: None,
            delay_ms: None,
            max_iterations: None,
            device_id: None,
            version: false,
        }
    }

    #[test]
    fn no_flags_keep_config_values() {
        let mut config = AppConfig::default();
        apply_overrides(&base_cli(), &mut config);
        assert_eq!(config.broker.bootstrap_servers, "localhost:9092");
        assert_eq!(config.simulation.random_seed, 42);
        assert_eq!(config.simulation.iteration_delay, Duration::from_secs(3));
        assert!(config.simulation.max_iterations.is_none());
    }

    #[test]
    fn flags_override_config() {
        let mut cli = base_cli();
        cli.brokers = Some("kafka-1:9092,kafka-2:9092".into());
        cli.transport = Some(CliTransport::Stdout);
        cli.seed = Some(7);
        cli.delay_ms = Some(250);
        cli.max_iterations = Some(12);
        cli.device_id = Some("Fleet-7".into());

        let mut config = AppConfig::default();
        apply_overrides(&cli, &mut config);
        assert_eq!(config.broker.bootstrap_servers, "kafka-1:9092,kafka-2:9092");
        assert_eq!(config.broker.transport, TransportKind::Stdout);
        assert_eq!(config.simulation.random_seed, 7);
        assert_eq!(config.simulation.iteration_delay, Duration::from_millis(250));
        assert_eq!(config.simulation.max_iterations, Some(12));
        assert_eq!(config.simulation.device_id, "Fleet-7");
        config.validate().expect("overridden config stays valid");
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "vtel-simd",
            "--transport",
            "stdout",
            "--max-iterations",
            "3",
            "--delay-ms",
            "0",
            "-V",
        ])
        .expect("valid flags");
        assert_eq!(cli.transport, Some(CliTransport::Stdout));
        assert_eq!(cli.max_iterations, Some(3));
        assert_eq!(cli.delay_ms, Some(0));
        assert!(cli.version);
    }

    #[test]
    fn stdout_dry_run_keeps_logs_off_stdout() {
        let mut cli = base_cli();
        cli.transport = Some(CliTransport::Stdout);
        let mut config = AppConfig::default();
        apply_overrides(&cli, &mut config);
        assert_eq!(LogOutput::for_transport(config.broker.transport), LogOutput::Stderr);

        let mut config = AppConfig::default();
        apply_overrides(&base_cli(), &mut config);
        assert_eq!(LogOutput::for_transport(config.broker.transport), LogOutput::Stdout);
    }

    #[test]
    fn stdout_transport_is_built() {
        let broker = BrokerConfig {
            transport: TransportKind::Stdout,
            ..BrokerConfig::default()
        };
        let transport = build_transport(&broker).expect("stdout sink");
        assert_eq!(transport.name(), "stdout");
    }

    #[cfg(not(feature = "kafka"))]
    #[test]
    fn kafka_requires_feature() {
        let broker = BrokerConfig {
            transport: TransportKind::Kafka,
            ..BrokerConfig::default()
        };
        let err = build_transport(&broker).err().expect("kafka disabled");
        assert!(err.to_string().contains("--features kafka"));
    }
}
