//! ---
//! vtel_section: "03-logging"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Structured logging context and lifecycle events."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Context-enriched logging helpers shared by the simulator crates.

use tracing::Level;

/// Context-enriched event macros (`vtel_info!`, `vtel_warn!`, ...).
pub mod macros;

#[doc(hidden)]
pub use tracing as __tracing;

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Simulated device identifier.
    pub device: Option<&'a str>,
    /// Broker topic the event relates to.
    pub topic: Option<&'a str>,
    /// Journey iteration number.
    pub iteration: Option<u64>,
    /// Publish sink in use (kafka, stdout, in_memory).
    pub transport: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a device identifier.
    pub fn with_device(mut self, device: &'a str) -> Self {
        self.device = Some(device);
        self
    }

    /// Attach a topic name.
    pub fn with_topic(mut self, topic: &'a str) -> Self {
        self.topic = Some(topic);
        self
    }

    /// Attach an iteration number.
    pub fn with_iteration(mut self, iteration: u64) -> Self {
        self.iteration = Some(iteration);
        self
    }

    /// Attach the transport name.
    pub fn with_transport(mut self, transport: &'a str) -> Self {
        self.transport = Some(transport);
        self
    }
}

/// High-level outcome used when emitting lifecycle log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The operation completed successfully.
    Success,
    /// The operation was stopped on request, not because of a fault.
    Cancelled,
    /// The operation failed or was aborted.
    Fault,
}

impl SystemEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Cancelled => "cancelled",
            SystemEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized lifecycle event (journey started, arrived, cancelled, failed).
pub fn log_system_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let ctx = context.cloned().unwrap_or_default();
    // tracing::event! needs a constant level, hence one arm per level.
    match outcome {
        SystemEventOutcome::Success => tracing::event!(
            Level::INFO,
            event,
            outcome = outcome.as_str(),
            device = ctx.device.unwrap_or(""),
            iteration = ctx.iteration.unwrap_or_default(),
            transport = ctx.transport.unwrap_or(""),
            message = %message
        ),
        SystemEventOutcome::Cancelled => tracing::event!(
            Level::WARN,
            event,
            outcome = outcome.as_str(),
            device = ctx.device.unwrap_or(""),
            iteration = ctx.iteration.unwrap_or_default(),
            transport = ctx.transport.unwrap_or(""),
            message = %message
        ),
        SystemEventOutcome::Fault => tracing::event!(
            Level::ERROR,
            event,
            outcome = outcome.as_str(),
            device = ctx.device.unwrap_or(""),
            iteration = ctx.iteration.unwrap_or_default(),
            transport = ctx.transport.unwrap_or(""),
            message = %message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macros_emit_without_panic() {
        let ctx = LogContext::new()
            .with_device("Smart-Vehicle")
            .with_topic("vehicle_data")
            .with_iteration(3);
        vtel_info!(context = ctx.clone(), "record published");
        vtel_debug!("debug message");
        vtel_warn!(context = ctx.clone(), "delivery slow: {}ms", 250);
        vtel_error!(context = ctx, "delivery failed: {}", "broker down");
    }

    #[test]
    fn context_builders_populate_fields() {
        let ctx = LogContext::new()
            .with_device("dev")
            .with_transport("stdout")
            .with_iteration(9);
        assert_eq!(ctx.device, Some("dev"));
        assert_eq!(ctx.transport, Some("stdout"));
        assert_eq!(ctx.iteration, Some(9));
        assert!(ctx.topic.is_none());
    }

    #[test]
    fn system_event_helper_emits() {
        let ctx = LogContext::new().with_device("Smart-Vehicle");
        log_system_event(
            Some(&ctx),
            "journey.arrived",
            "vehicle has reached the destination",
            SystemEventOutcome::Success,
        );
        log_system_event(
            None,
            "journey.cancelled",
            "simulation ended by the user",
            SystemEventOutcome::Cancelled,
        );
        log_system_event(
            None,
            "journey.failed",
            "unexpected error",
            SystemEventOutcome::Fault,
        );
    }
}
