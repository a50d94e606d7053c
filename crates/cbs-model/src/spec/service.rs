use serde::{Deserialize, Serialize};

use crate::domain::Slot;

/// Declarative description of a supervised background service.
///
/// Every service is long-running: it is restarted after each failed attempt with a constant
/// delay, and a clean exit (shutdown) ends it. Submitting a service into an occupied slot
/// replaces the running instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Slot name; also used as the task name in supervisor events.
    pub slot: Slot,
    /// Delay between a failed attempt and the next one.
    pub restart_delay_ms: u64,
}

impl ServiceSpec {
    pub fn perpetual(slot: impl Into<Slot>, restart_delay_ms: u64) -> Self {
        Self {
            slot: slot.into(),
            restart_delay_ms,
        }
    }
}
