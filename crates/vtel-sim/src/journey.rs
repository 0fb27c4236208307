//! ---
//! vtel_section: "04-simulation"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Journey simulation: state advance, record generators, publish loop."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use vtel_common::{AppConfig, TopicConfig};
use vtel_logging::{log_system_event, vtel_debug, LogContext, SystemEventOutcome};
use vtel_msg::{Keyed, Publisher};

use crate::generator::generate_iteration;
use crate::records::IterationRecords;
use crate::state::{advance, MovementModel, Route, SimulationState};

/// Why a journey stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JourneyOutcome {
    /// The vehicle crossed the destination; the final iteration was not published.
    Arrived,
    /// The shutdown signal fired.
    Cancelled,
    /// The configured iteration bound was reached.
    IterationLimit,
}

impl JourneyOutcome {
    /// Operator-facing message printed when the journey ends.
    pub fn message(&self) -> &'static str {
        match self {
            JourneyOutcome::Arrived => "Vehicle has reached the destination. Simulation ending...",
            JourneyOutcome::Cancelled => "Simulation ended by the user",
            JourneyOutcome::IterationLimit => "Iteration limit reached. Simulation ending...",
        }
    }
}

/// Summary of a finished journey.
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyReport {
    pub outcome: JourneyOutcome,
    /// Advances applied, including the arriving one.
    pub iterations: u64,
    /// Records handed to the publisher, delivered or not.
    pub records_published: u64,
    pub delivery_failures: u64,
    pub final_state: SimulationState,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    published: u64,
    failed: u64,
}

/// Drives one vehicle from origin to destination.
#[derive(Debug, Clone)]
pub struct Journey {
    device_id: String,
    camera_id: String,
    route: Route,
    movement: MovementModel,
    topics: TopicConfig,
    delay: Duration,
    max_iterations: Option<u64>,
    state: SimulationState,
}

impl Journey {
    /// Build a journey from validated configuration, starting the clock at `start_time`.
    pub fn from_config(config: &AppConfig, start_time: DateTime<Utc>) -> Result<Self> {
        config.validate()?;
        let route = Route::from(&config.route);
        let movement = MovementModel::from(&config.movement);
        movement.validate()?;
        Ok(Self {
            device_id: config.simulation.device_id.clone(),
            camera_id: config.simulation.camera_id.clone(),
            route,
            movement,
            topics: config.topics.clone(),
            delay: config.simulation.iteration_delay,
            max_iterations: config.simulation.max_iterations,
            state: SimulationState::new(start_time, route.origin),
        })
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Run iterations until arrival, the iteration bound, or `shutdown` resolves.
    ///
    /// Each iteration advances the state, builds five records and, unless the
    /// vehicle has arrived, publishes them in order awaiting every delivery.
    /// Delivery failures are counted and skipped; encoding errors abort.
    pub async fn run<R, F>(
        &mut self,
        publisher: &Publisher,
        rng: &mut R,
        shutdown: F,
    ) -> Result<JourneyReport>
    where
        R: Rng + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut tally = Tally::default();
        let transport = publisher.transport_name();
        {
            let ctx = LogContext::new()
                .with_device(&self.device_id)
                .with_transport(transport);
            log_system_event(
                Some(&ctx),
                "journey.started",
                "simulated journey started",
                SystemEventOutcome::Success,
            );
        }

        let outcome = loop {
            self.state = advance(&self.state, &self.route, &self.movement, rng);
            let records = generate_iteration(&self.device_id, &self.state, &self.camera_id, rng);
            let iteration = self.state.iteration;

            if self.route.has_arrived(&records.vehicle.location) {
                break JourneyOutcome::Arrived;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break JourneyOutcome::Cancelled,
                published = self.publish_iteration(publisher, &records) => {
                    let published = published
                        .with_context(|| format!("iteration {iteration} aborted"))?;
                    tally.published += published.published;
                    tally.failed += published.failed;
                }
            }

            if self
                .max_iterations
                .is_some_and(|limit| iteration >= limit)
            {
                break JourneyOutcome::IterationLimit;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break JourneyOutcome::Cancelled,
                _ = tokio::time::sleep(self.delay) => {}
            }
        };

        let report = JourneyReport {
            outcome,
            iterations: self.state.iteration,
            records_published: tally.published,
            delivery_failures: tally.failed,
            final_state: self.state,
        };
        self.log_outcome(&report, transport);
        Ok(report)
    }

    async fn publish_iteration(
        &self,
        publisher: &Publisher,
        records: &IterationRecords,
    ) -> Result<Tally> {
        let mut tally = Tally::default();
        let topics = &self.topics;
        publish_one(publisher, &topics.vehicle, &records.vehicle, &mut tally).await?;
        publish_one(publisher, &topics.gps, &records.gps, &mut tally).await?;
        publish_one(publisher, &topics.traffic, &records.traffic, &mut tally).await?;
        publish_one(publisher, &topics.weather, &records.weather, &mut tally).await?;
        publish_one(publisher, &topics.emergency, &records.emergency, &mut tally).await?;
        vtel_debug!(
            context = LogContext::new()
                .with_device(&self.device_id)
                .with_iteration(self.state.iteration),
            "iteration published ({} failed)",
            tally.failed
        );
        Ok(tally)
    }

    fn log_outcome(&self, report: &JourneyReport, transport: &str) {
        let ctx = LogContext::new()
            .with_device(&self.device_id)
            .with_iteration(report.iterations)
            .with_transport(transport);
        let (event, outcome) = match report.outcome {
            JourneyOutcome::Arrived => ("journey.arrived", SystemEventOutcome::Success),
            JourneyOutcome::IterationLimit => ("journey.limit", SystemEventOutcome::Success),
            JourneyOutcome::Cancelled => ("journey.cancelled", SystemEventOutcome::Cancelled),
        };
        log_system_event(Some(&ctx), event, report.outcome.message(), outcome);
        tracing::info!(
            iterations = report.iterations,
            records_published = report.records_published,
            delivery_failures = report.delivery_failures,
            latitude = report.final_state.current_position.latitude,
            longitude = report.final_state.current_position.longitude,
            "journey finished"
        );
    }
}

async fn publish_one<T>(
    publisher: &Publisher,
    topic: &str,
    record: &T,
    tally: &mut Tally,
) -> Result<()>
where
    T: Serialize + Keyed,
{
    let outcome = publisher
        .publish(topic, record)
        .await
        .with_context(|| format!("failed to encode record for topic {topic}"))?;
    tally.published += 1;
    if outcome.is_err() {
        tally.failed += 1;
    }
    Ok(())
}
