//! ---
//! vtel_section: "04-simulation"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Journey simulation: state advance, record generators, publish loop."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vtel_msg::Keyed;

use crate::state::Location;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id: Uuid,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub location: Location,
    /// km/h
    pub speed: f64,
    pub direction: String,
    pub make: String,
    pub model: String,
    pub year: u16,
    pub fuel_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsRecord {
    pub id: Uuid,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    /// km/h
    pub speed: f64,
    pub direction: String,
    pub vehicle_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficCameraRecord {
    pub id: Uuid,
    pub device_id: String,
    pub camera_id: String,
    pub location: Location,
    pub timestamp: DateTime<Utc>,
    /// Opaque image payload.
    pub snapshot: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub id: Uuid,
    pub device_id: String,
    pub location: Location,
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius.
    pub temperature: f64,
    pub weather_condition: WeatherCondition,
    pub precipitation: f64,
    pub wind_speed: f64,
    /// Percent.
    pub humidity: u8,
    pub air_quality_index: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentType {
    Accident,
    Fire,
    Medical,
    Police,
    None,
}

impl IncidentType {
    pub const ALL: [IncidentType; 5] = [
        IncidentType::Accident,
        IncidentType::Fire,
        IncidentType::Medical,
        IncidentType::Police,
        IncidentType::None,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentStatus {
    Active,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyIncidentRecord {
    pub id: Uuid,
    pub device_id: String,
    pub incident_id: Uuid,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub timestamp: DateTime<Utc>,
    pub location: Location,
    pub status: IncidentStatus,
    pub description: String,
}

macro_rules! keyed_by_id {
    ($($record:ty),+ $(,)?) => {
        $(
            impl Keyed for $record {
                fn message_key(&self) -> String {
                    self.id.to_string()
                }
            }
        )+
    };
}

keyed_by_id!(
    VehicleRecord,
    GpsRecord,
    TrafficCameraRecord,
    WeatherRecord,
    EmergencyIncidentRecord,
);

/// The five records produced by one journey iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecords {
    pub vehicle: VehicleRecord,
    pub gps: GpsRecord,
    pub traffic: TrafficCameraRecord,
    pub weather: WeatherRecord,
    pub emergency: EmergencyIncidentRecord,
}

impl IterationRecords {
    /// Timestamp shared by every record of the iteration.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.vehicle.timestamp
    }

    /// Location shared by every located record of the iteration.
    pub fn location(&self) -> Location {
        self.vehicle.location
    }
}
