//! ---
//! vtel_section: "01-core-functionality"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Shared primitives and utilities for the simulator runtime."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_transport() -> TransportKind {
    TransportKind::Kafka
}

fn default_bootstrap_servers() -> String {
    "localhost:9092".to_owned()
}

fn default_message_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_vehicle_topic() -> String {
    "vehicle_data".to_owned()
}

fn default_gps_topic() -> String {
    "gps_data".to_owned()
}

fn default_traffic_topic() -> String {
    "traffic_data".to_owned()
}

fn default_weather_topic() -> String {
    "weather_data".to_owned()
}

fn default_emergency_topic() -> String {
    "emergency_data".to_owned()
}

fn default_origin() -> GeoPoint {
    GeoPoint::new(42.3399, -71.0899)
}

fn default_destination() -> GeoPoint {
    GeoPoint::new(40.7577, -73.9857)
}

fn default_steps() -> u32 {
    100
}

fn default_min_step_secs() -> u32 {
    30
}

fn default_max_step_secs() -> u32 {
    60
}

fn default_jitter_degrees() -> f64 {
    0.0005
}

fn default_device_id() -> String {
    "Smart-Vehicle".to_owned()
}

fn default_camera_id() -> String {
    "Nikon-Cam123".to_owned()
}

fn default_simulation_seed() -> u64 {
    42
}

fn default_iteration_delay() -> Duration {
    Duration::from_secs(3)
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// Primary configuration object for the journey simulator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub topics: TopicConfig,
    #[serde(default)]
    pub route: RouteConfig,
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
///
/// `source` is `None` when no file was found and built-in defaults are in effect.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &'static str = "VTEL_CONFIG";

    /// Load configuration from disk, respecting the `VTEL_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// An explicit `VTEL_CONFIG` path must exist. Candidate paths are checked in
    /// order and the first existing one wins; when none exists the defaults are used.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path.to_path_buf()),
                });
            }
        }

        debug!("no configuration file found, using built-in defaults");
        Ok(LoadedAppConfig {
            config: AppConfig::default(),
            source: None,
        })
    }

    /// Read and validate a configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.broker.validate()?;
        self.topics.validate()?;
        self.route.validate()?;
        self.movement.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Publish sink backing the simulator.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Kafka broker reached through `bootstrap_servers`.
    Kafka,
    /// Line-oriented dump on stdout, no broker required.
    Stdout,
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kafka" => Ok(TransportKind::Kafka),
            "stdout" => Ok(TransportKind::Stdout),
            other => Err(format!("unknown transport: {}", other)),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_transport")]
    pub transport: TransportKind,
    #[serde(default = "default_bootstrap_servers")]
    pub bootstrap_servers: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_message_timeout", rename = "message_timeout_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub message_timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            bootstrap_servers: default_bootstrap_servers(),
            client_id: None,
            message_timeout: default_message_timeout(),
        }
    }
}

impl BrokerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.transport == TransportKind::Kafka && self.bootstrap_servers.trim().is_empty() {
            return Err(anyhow!(
                "broker.bootstrap_servers must be set for the kafka transport"
            ));
        }
        if self.message_timeout.is_zero() {
            return Err(anyhow!("broker.message_timeout_ms must be greater than zero"));
        }
        Ok(())
    }
}

/// Output topic per record stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicConfig {
    #[serde(default = "default_vehicle_topic")]
    pub vehicle: String,
    #[serde(default = "default_gps_topic")]
    pub gps: String,
    #[serde(default = "default_traffic_topic")]
    pub traffic: String,
    #[serde(default = "default_weather_topic")]
    pub weather: String,
    #[serde(default = "default_emergency_topic")]
    pub emergency: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            vehicle: default_vehicle_topic(),
            gps: default_gps_topic(),
            traffic: default_traffic_topic(),
            weather: default_weather_topic(),
            emergency: default_emergency_topic(),
        }
    }
}

impl TopicConfig {
    pub fn validate(&self) -> Result<()> {
        for (stream, topic) in [
            ("vehicle", &self.vehicle),
            ("gps", &self.gps),
            ("traffic", &self.traffic),
            ("weather", &self.weather),
            ("emergency", &self.emergency),
        ] {
            if topic.trim().is_empty() {
                return Err(anyhow!("topics.{} cannot be empty", stream));
            }
        }
        Ok(())
    }
}

/// Geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn validate(&self, label: &str) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(anyhow!(
                "route.{}.latitude {} outside [-90, 90]",
                label,
                self.latitude
            ));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(anyhow!(
                "route.{}.longitude {} outside [-180, 180]",
                label,
                self.longitude
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RouteConfig {
    #[serde(default = "default_origin")]
    pub origin: GeoPoint,
    #[serde(default = "default_destination")]
    pub destination: GeoPoint,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            destination: default_destination(),
        }
    }
}

impl RouteConfig {
    pub fn validate(&self) -> Result<()> {
        self.origin.validate("origin")?;
        self.destination.validate("destination")?;
        Ok(())
    }
}

/// Parameters of the per-iteration position and clock advance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MovementConfig {
    /// Number of fixed increments separating origin from destination.
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_min_step_secs")]
    pub min_step_secs: u32,
    #[serde(default = "default_max_step_secs")]
    pub max_step_secs: u32,
    /// Half-width of the uniform jitter added to each axis, in degrees.
    #[serde(default = "default_jitter_degrees")]
    pub jitter_degrees: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            min_step_secs: default_min_step_secs(),
            max_step_secs: default_max_step_secs(),
            jitter_degrees: default_jitter_degrees(),
        }
    }
}

impl MovementConfig {
    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(anyhow!("movement.steps must be greater than zero"));
        }
        if self.min_step_secs == 0 || self.min_step_secs > self.max_step_secs {
            return Err(anyhow!(
                "movement step range [{}, {}] must be positive and ordered",
                self.min_step_secs,
                self.max_step_secs
            ));
        }
        if !self.jitter_degrees.is_finite() || self.jitter_degrees < 0.0 {
            return Err(anyhow!(
                "movement.jitter_degrees must be a non-negative number"
            ));
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_device_id")]
    pub device_id: String,
    #[serde(default = "default_camera_id")]
    pub camera_id: String,
    #[serde(default = "default_simulation_seed")]
    pub random_seed: u64,
    /// Clock origin; the wall clock at startup when absent.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default = "default_iteration_delay", rename = "iteration_delay_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub iteration_delay: Duration,
    #[serde(default)]
    pub max_iterations: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            camera_id: default_camera_id(),
            random_seed: default_simulation_seed(),
            start_time: None,
            iteration_delay: default_iteration_delay(),
            max_iterations: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.device_id.trim().is_empty() {
            return Err(anyhow!("simulation.device_id cannot be empty"));
        }
        if self.max_iterations == Some(0) {
            return Err(anyhow!("simulation.max_iterations must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Filter directive used when neither `VTEL_LOG` nor `RUST_LOG` is set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for the daily rolling log file; file logging is off when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: default_log_level(),
            directory: None,
            file_prefix: None,
        }
    }
}
