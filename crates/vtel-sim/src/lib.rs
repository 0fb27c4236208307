//! ---
//! vtel_section: "04-simulation"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Journey simulation: state advance, record generators, publish loop."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
//! Simulated vehicle journey from an origin to a destination, emitting five
//! correlated sensor records per iteration.

pub mod generator;
pub mod journey;
pub mod records;
pub mod state;

pub use generator::{
    generate_emergency_incident_data, generate_gps_data, generate_iteration,
    generate_traffic_camera_data, generate_vehicle_data, generate_weather_data,
};
pub use journey::{Journey, JourneyOutcome, JourneyReport};
pub use records::{
    EmergencyIncidentRecord, GpsRecord, IncidentStatus, IncidentType, IterationRecords,
    TrafficCameraRecord, VehicleRecord, WeatherCondition, WeatherRecord,
};
pub use state::{advance, Location, MovementModel, Route, SimulationState};
