#![cfg(feature = "subscriber")]

//! Logs supervisor events of the driver's background services.
//!
//! The metrics exporter and the tag sync scheduler run under taskvisor; their restarts,
//! failures and cancellations only become visible through these events.

use async_trait::async_trait;
use taskvisor::{Event, EventKind, Subscribe};
use tracing::{debug, error, info, trace, warn};

/// Bounded queue of the subscriber; overflow drops events and emits `SubscriberOverflow`.
const SERVICE_EVENT_QUEUE_CAPACITY: usize = 1024;

/// Supervisor subscriber that turns service events into log lines.
#[derive(Debug, Default)]
pub struct ServiceEventLogger;

#[async_trait]
impl Subscribe for ServiceEventLogger {
    async fn on_event(&self, event: &Event) {
        log_event(&Fields::from(event), event.kind);
    }

    fn name(&self) -> &'static str {
        "cbs-service-events"
    }

    fn queue_capacity(&self) -> usize {
        SERVICE_EVENT_QUEUE_CAPACITY
    }
}

/// Event fields with placeholders for absent values.
struct Fields<'a> {
    service: &'a str,
    reason: Option<&'a str>,
    attempt: u32,
    delay_ms: u32,
    timeout_ms: u32,
}

impl<'a> From<&'a Event> for Fields<'a> {
    fn from(e: &'a Event) -> Self {
        Self {
            service: e.task.as_deref().unwrap_or("unknown"),
            reason: e.reason.as_deref(),
            attempt: e.attempt.unwrap_or(0),
            delay_ms: e.delay_ms.unwrap_or(0),
            timeout_ms: e.timeout_ms.unwrap_or(0),
        }
    }
}

impl Fields<'_> {
    fn reason(&self) -> &str {
        self.reason.unwrap_or("unknown")
    }
}

fn log_event(f: &Fields<'_>, kind: EventKind) {
    let msg = message_for(kind);
    let service = f.service;

    match kind {
        EventKind::TaskAddRequested
        | EventKind::TaskRemoveRequested
        | EventKind::TaskRemoved
        | EventKind::TaskStopped => trace!(service, "{msg}"),
        EventKind::TaskAdded => debug!(service, "{msg}"),

        EventKind::ShutdownRequested | EventKind::AllStoppedWithinGrace => info!("{msg}"),
        EventKind::GraceExceeded => warn!("{msg}"),

        EventKind::SubscriberPanicked | EventKind::SubscriberOverflow | EventKind::ActorDead => {
            error!(service, reason = f.reason(), "{msg}")
        }
        EventKind::ActorExhausted => debug!(service, reason = f.reason(), "{msg}"),

        EventKind::TaskStarting => info!(service, attempt = f.attempt, "{msg}"),
        EventKind::TaskFailed => {
            warn!(service, attempt = f.attempt, reason = f.reason(), "{msg}")
        }
        EventKind::TimeoutHit => warn!(service, timeout_ms = f.timeout_ms, "{msg}"),

        EventKind::BackoffScheduled => match f.reason {
            Some(reason) => info!(
                service,
                attempt = f.attempt,
                delay_ms = f.delay_ms,
                reason,
                "service restart scheduled after failure"
            ),
            None => debug!(
                service,
                attempt = f.attempt,
                delay_ms = f.delay_ms,
                "next service run scheduled"
            ),
        },

        EventKind::ControllerRejected => warn!(service, reason = f.reason(), "{msg}"),
        EventKind::ControllerSubmitted => trace!(service, "{msg}"),
        EventKind::ControllerSlotTransition => debug!(service, reason = f.reason(), "{msg}"),
    }
}

fn message_for(kind: EventKind) -> &'static str {
    match kind {
        EventKind::TaskAddRequested => "service registration requested",
        EventKind::TaskAdded => "service registered",
        EventKind::TaskRemoveRequested => "service removal requested",
        EventKind::TaskRemoved => "service removed",

        EventKind::ShutdownRequested => "shutdown requested; stopping background services",
        EventKind::AllStoppedWithinGrace => "background services stopped",
        EventKind::GraceExceeded => "some background services did not stop in time",

        EventKind::SubscriberOverflow => "service event dropped (queue full)",
        EventKind::SubscriberPanicked => "service event subscriber panicked",

        EventKind::ActorExhausted => "service finished; no further restarts",
        EventKind::ActorDead => "service terminated permanently",

        EventKind::TaskStarting => "service starting",
        EventKind::TaskStopped => "service stopped",
        EventKind::TaskFailed => "service attempt failed",
        EventKind::TimeoutHit => "service attempt timed out",
        EventKind::BackoffScheduled => "service run scheduled",

        EventKind::ControllerRejected => "service submission rejected",
        EventKind::ControllerSubmitted => "service submitted",
        EventKind::ControllerSlotTransition => "service slot changed state",
    }
}
