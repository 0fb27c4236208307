//! ---
//! vtel_section: "01-core-functionality"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Shared primitives and utilities for the simulator runtime."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
//! Shared primitives for the VTEL journey simulator workspace.
//! This crate exposes configuration loading, tracing initialisation and
//! version metadata consumed by the simulator and its daemon binary.

pub mod config;
pub mod logging;
pub mod version;

pub use config::{
    AppConfig, BrokerConfig, GeoPoint, LoadedAppConfig, LoggingConfig, MovementConfig,
    RouteConfig, SimulationConfig, TopicConfig, TransportKind,
};
pub use logging::{init_tracing, LogFormat, LogOutput};
pub use version::VersionInfo;
