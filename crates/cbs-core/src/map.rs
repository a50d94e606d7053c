//! Conversion of a [`ServiceSpec`] into taskvisor policies.
use std::time::Duration;

use cbs_model::ServiceSpec;
use taskvisor::{BackoffPolicy, ControllerSpec, JitterPolicy, RestartPolicy, TaskRef, TaskSpec};

/// Constant delay: no growth, no jitter.
pub fn to_backoff_policy(s: &ServiceSpec) -> BackoffPolicy {
    let delay = Duration::from_millis(s.restart_delay_ms);
    BackoffPolicy {
        first: delay,
        max: delay,
        factor: 1.0,
        jitter: JitterPolicy::None,
    }
}

/// Restart after every failure, no per-attempt timeout.
pub fn to_task_spec(task: TaskRef, s: &ServiceSpec) -> TaskSpec {
    TaskSpec::new(task, RestartPolicy::OnFailure, to_backoff_policy(s), None)
}

/// A new submission replaces the running instance of its slot.
pub fn to_controller_spec(task: TaskRef, s: &ServiceSpec) -> ControllerSpec {
    ControllerSpec::replace(to_task_spec(task, s))
}
