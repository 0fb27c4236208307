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
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use crate::records::{
    EmergencyIncidentRecord, GpsRecord, IncidentStatus, IncidentType, IterationRecords,
    TrafficCameraRecord, VehicleRecord, WeatherCondition, WeatherRecord,
};
use crate::state::{Location, SimulationState};

pub const DIRECTION: &str = "South-West";
pub const VEHICLE_MAKE: &str = "BMW";
pub const VEHICLE_MODEL: &str = "C500";
pub const VEHICLE_YEAR: u16 = 2024;
pub const FUEL_TYPE: &str = "Hybrid";
pub const GPS_VEHICLE_TYPE: &str = "private";
pub const CAMERA_SNAPSHOT: &str = "Base64EncodedString";
pub const INCIDENT_DESCRIPTION: &str = "Description of the incident";

const INCIDENT_WEIGHTS: [(IncidentType, f64); 5] = [
    (IncidentType::Accident, 0.05),
    (IncidentType::Fire, 0.05),
    (IncidentType::Medical, 0.05),
    (IncidentType::Police, 0.05),
    (IncidentType::None, 0.8),
];

/// Record identifiers come from OS entropy, never from the seeded value RNG, so
/// reruns with the same seed still publish unique keys.
fn next_uuid() -> Uuid {
    Uuid::new_v4()
}

pub fn generate_vehicle_data<R: Rng + ?Sized>(
    device_id: &str,
    timestamp: DateTime<Utc>,
    location: Location,
    rng: &mut R,
) -> VehicleRecord {
    VehicleRecord {
        id: next_uuid(),
        device_id: device_id.to_owned(),
        timestamp,
        location,
        speed: rng.gen_range(10.0..=40.0),
        direction: DIRECTION.to_owned(),
        make: VEHICLE_MAKE.to_owned(),
        model: VEHICLE_MODEL.to_owned(),
        year: VEHICLE_YEAR,
        fuel_type: FUEL_TYPE.to_owned(),
    }
}

pub fn generate_gps_data<R: Rng + ?Sized>(
    device_id: &str,
    timestamp: DateTime<Utc>,
    rng: &mut R,
) -> GpsRecord {
    GpsRecord {
        id: next_uuid(),
        device_id: device_id.to_owned(),
        timestamp,
        speed: rng.gen_range(0.0..=40.0),
        direction: DIRECTION.to_owned(),
        vehicle_type: GPS_VEHICLE_TYPE.to_owned(),
    }
}

pub fn generate_traffic_camera_data(
    device_id: &str,
    timestamp: DateTime<Utc>,
    location: Location,
    camera_id: &str,
) -> TrafficCameraRecord {
    TrafficCameraRecord {
        id: next_uuid(),
        device_id: device_id.to_owned(),
        camera_id: camera_id.to_owned(),
        location,
        timestamp,
        snapshot: CAMERA_SNAPSHOT.to_owned(),
    }
}

pub fn generate_weather_data<R: Rng + ?Sized>(
    device_id: &str,
    timestamp: DateTime<Utc>,
    location: Location,
    rng: &mut R,
) -> WeatherRecord {
    let id = next_uuid();
    let temperature = rng.gen_range(15.0..=26.0);
    let weather_condition = if rng.gen_bool(0.5) {
        WeatherCondition::Sunny
    } else {
        WeatherCondition::Cloudy
    };
    WeatherRecord {
        id,
        device_id: device_id.to_owned(),
        location,
        timestamp,
        temperature,
        weather_condition,
        precipitation: rng.gen_range(0.0..=25.0),
        wind_speed: rng.gen_range(0.0..=100.0),
        humidity: rng.gen_range(0..=100),
        air_quality_index: rng.gen_range(0.0..=500.0),
    }
}

/// Draw an incident type with the fixed 5/5/5/5/80 percent weighting.
pub fn sample_incident_type<R: Rng + ?Sized>(rng: &mut R) -> IncidentType {
    INCIDENT_WEIGHTS
        .choose_weighted(rng, |(_, weight)| *weight)
        .map(|(incident, _)| *incident)
        .unwrap_or(IncidentType::None)
}

pub fn generate_emergency_incident_data<R: Rng + ?Sized>(
    device_id: &str,
    timestamp: DateTime<Utc>,
    location: Location,
    rng: &mut R,
) -> EmergencyIncidentRecord {
    let id = next_uuid();
    let incident_id = next_uuid();
    let incident_type = sample_incident_type(rng);
    let status = if rng.gen_bool(0.5) {
        IncidentStatus::Active
    } else {
        IncidentStatus::Resolved
    };
    EmergencyIncidentRecord {
        id,
        device_id: device_id.to_owned(),
        incident_id,
        incident_type,
        timestamp,
        location,
        status,
        description: INCIDENT_DESCRIPTION.to_owned(),
    }
}

/// Build the five records of one iteration from the already advanced `state`.
pub fn generate_iteration<R: Rng + ?Sized>(
    device_id: &str,
    state: &SimulationState,
    camera_id: &str,
    rng: &mut R,
) -> IterationRecords {
    let timestamp = state.current_time;
    let location = state.current_position;
    IterationRecords {
        vehicle: generate_vehicle_data(device_id, timestamp, location, rng),
        gps: generate_gps_data(device_id, timestamp, rng),
        traffic: generate_traffic_camera_data(device_id, timestamp, location, camera_id),
        weather: generate_weather_data(device_id, timestamp, location, rng),
        emergency: generate_emergency_incident_data(device_id, timestamp, location, rng),
    }
}
