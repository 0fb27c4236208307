//! ---
//! vtel_section: "04-simulation"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Journey simulation: state advance, record generators, publish loop."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use vtel_common::{GeoPoint, MovementConfig, RouteConfig};

/// Position in decimal degrees, encoded on the wire as `[latitude, longitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<(f64, f64)> for Location {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<Location> for (f64, f64) {
    fn from(location: Location) -> Self {
        (location.latitude, location.longitude)
    }
}

impl From<GeoPoint> for Location {
    fn from(point: GeoPoint) -> Self {
        Self::new(point.latitude, point.longitude)
    }
}

/// Fixed journey between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    pub origin: Location,
    pub destination: Location,
}

impl Route {
    pub const fn new(origin: Location, destination: Location) -> Self {
        Self {
            origin,
            destination,
        }
    }

    /// Per-axis `(latitude, longitude)` step covering the route in `steps` moves.
    pub fn increment(&self, steps: u32) -> (f64, f64) {
        let steps = f64::from(steps.max(1));
        (
            (self.destination.latitude - self.origin.latitude) / steps,
            (self.destination.longitude - self.origin.longitude) / steps,
        )
    }

    /// Arrival rule: both coordinates at or below the destination's.
    ///
    /// Only meaningful for routes heading south-west, which is the one the
    /// simulator drives.
    pub fn has_arrived(&self, location: &Location) -> bool {
        location.latitude <= self.destination.latitude
            && location.longitude <= self.destination.longitude
    }
}

impl From<&RouteConfig> for Route {
    fn from(config: &RouteConfig) -> Self {
        Self::new(config.origin.into(), config.destination.into())
    }
}

/// Movement parameters applied by [`advance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementModel {
    pub steps: u32,
    pub min_step_secs: u32,
    pub max_step_secs: u32,
    pub jitter: f64,
}

impl Default for MovementModel {
    fn default() -> Self {
        Self::from(&MovementConfig::default())
    }
}

impl MovementModel {
    /// Same model without random perturbation of the position.
    pub fn noiseless(mut self) -> Self {
        self.jitter = 0.0;
        self
    }

    pub fn validate(&self) -> Result<()> {
        MovementConfig {
            steps: self.steps,
            min_step_secs: self.min_step_secs,
            max_step_secs: self.max_step_secs,
            jitter_degrees: self.jitter,
        }
        .validate()
    }
}

impl From<&MovementConfig> for MovementModel {
    fn from(config: &MovementConfig) -> Self {
        Self {
            steps: config.steps,
            min_step_secs: config.min_step_secs,
            max_step_secs: config.max_step_secs,
            jitter: config.jitter_degrees,
        }
    }
}

/// Clock and position of the simulated vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub current_time: DateTime<Utc>,
    pub current_position: Location,
    /// Number of advances applied so far.
    pub iteration: u64,
}

impl SimulationState {
    pub fn new(start_time: DateTime<Utc>, origin: Location) -> Self {
        Self {
            current_time: start_time,
            current_position: origin,
            iteration: 0,
        }
    }
}

/// Compute the next state: the clock moves forward by a whole number of seconds
/// drawn from the movement range and the position takes one route increment
/// plus uniform jitter on each axis.
pub fn advance<R>(
    state: &SimulationState,
    route: &Route,
    movement: &MovementModel,
    rng: &mut R,
) -> SimulationState
where
    R: Rng + ?Sized,
{
    let (lat_step, lon_step) = route.increment(movement.steps);
    let mut latitude = state.current_position.latitude + lat_step;
    let mut longitude = state.current_position.longitude + lon_step;
    if movement.jitter > 0.0 {
        latitude += rng.gen_range(-movement.jitter..=movement.jitter);
        longitude += rng.gen_range(-movement.jitter..=movement.jitter);
    }

    let seconds = rng.gen_range(movement.min_step_secs..=movement.max_step_secs);
    SimulationState {
        current_time: state.current_time + TimeDelta::seconds(i64::from(seconds)),
        current_position: Location::new(latitude, longitude),
        iteration: state.iteration + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn start() -> SimulationState {
        let origin = Route::from(&RouteConfig::default()).origin;
        SimulationState::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(), origin)
    }

    #[test]
    fn location_serializes_as_pair() {
        let json = serde_json::to_string(&Location::new(42.3399, -71.0899)).unwrap();
        assert_eq!(json, "[42.3399,-71.0899]");
        let back: Location = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Location::new(42.3399, -71.0899));
    }

    #[test]
    fn time_advances_within_bounds_and_strictly_increases() {
        let route = Route::from(&RouteConfig::default());
        let movement = MovementModel::default();
        let mut rng = StdRng::seed_from_u64(42);
        let initial = start();
        let mut state = initial;
        let mut total = 0;
        for _ in 0..500 {
            let next = advance(&state, &route, &movement, &mut rng);
            let delta = (next.current_time - state.current_time).num_seconds();
            assert!((30..=60).contains(&delta), "delta {delta} out of range");
            total += delta;
            state = next;
        }
        assert_eq!(state.iteration, 500);
        assert_eq!((state.current_time - initial.current_time).num_seconds(), total);
    }

    #[test]
    fn noiseless_advance_is_linear() {
        let route = Route::from(&RouteConfig::default());
        let movement = MovementModel::default().noiseless();
        let mut rng = StdRng::seed_from_u64(7);
        let (lat_step, lon_step) = route.increment(movement.steps);
        let mut state = start();
        for _ in 0..50 {
            state = advance(&state, &route, &movement, &mut rng);
        }
        let expected_lat = route.origin.latitude + 50.0 * lat_step;
        let expected_lon = route.origin.longitude + 50.0 * lon_step;
        assert!((state.current_position.latitude - expected_lat).abs() < 1e-9);
        assert!((state.current_position.longitude - expected_lon).abs() < 1e-9);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let route = Route::from(&RouteConfig::default());
        let movement = MovementModel::default();
        let (lat_step, lon_step) = route.increment(movement.steps);
        let mut rng = StdRng::seed_from_u64(42);
        let state = start();
        for _ in 0..1_000 {
            let next = advance(&state, &route, &movement, &mut rng);
            let lat_noise = next.current_position.latitude - (state.current_position.latitude + lat_step);
            let lon_noise =
                next.current_position.longitude - (state.current_position.longitude + lon_step);
            assert!(lat_noise.abs() <= movement.jitter + 1e-12);
            assert!(lon_noise.abs() <= movement.jitter + 1e-12);
        }
    }

    #[test]
    fn arrival_requires_both_axes() {
        let route = Route::from(&RouteConfig::default());
        let dest = route.destination;
        assert!(route.has_arrived(&dest));
        assert!(route.has_arrived(&Location::new(dest.latitude - 0.1, dest.longitude - 0.1)));
        assert!(!route.has_arrived(&Location::new(dest.latitude - 0.1, dest.longitude + 0.1)));
        assert!(!route.has_arrived(&Location::new(dest.latitude + 0.1, dest.longitude - 0.1)));
        assert!(!route.has_arrived(&route.origin));
    }

    #[test]
    fn movement_model_validation() {
        assert!(MovementModel::default().validate().is_ok());
        let zero_steps = MovementModel {
            steps: 0,
            ..MovementModel::default()
        };
        assert!(zero_steps.validate().is_err());
        let reversed = MovementModel {
            min_step_secs: 61,
            ..MovementModel::default()
        };
        assert!(reversed.validate().is_err());
        let negative = MovementModel {
            jitter: -0.1,
            ..MovementModel::default()
        };
        assert!(negative.validate().is_err());
    }
}
