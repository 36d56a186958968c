use thiserror::Error;
use time::OffsetDateTime;
use wfr_core::{render_times, CoreError, JobId};
use wfr_scheduler::SchedulerError;

/// Every way a reconciliation call can end without observing what it expected.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{what}: {condition} not observed after {attempts} attempt(s)")]
    BudgetExhausted { what: String, condition: String, attempts: u32 },

    #[error("{what}: wait cancelled after {attempts} attempt(s)")]
    Cancelled { what: String, attempts: u32 },

    #[error("expected {expected} bundle for {entity}, got old={old} new={new}")]
    UnexpectedBundle { entity: String, expected: &'static str, old: JobId, new: JobId },

    #[error(
        "instances lost moving {old} -> {new}: missing {}; old bundle has {}; new bundle has {}",
        render_times(.missing),
        render_times(.old_times),
        render_times(.new_times)
    )]
    InstancesLost {
        old: JobId,
        new: JobId,
        missing: Vec<OffsetDateTime>,
        old_times: Vec<OffsetDateTime>,
        new_times: Vec<OffsetDateTime>,
    },

    #[error("bundle {bundle} has no {role} coordinator")]
    NoDefaultCoordinator { bundle: JobId, role: String },

    #[error("{what} is {actual}, expected {expected}")]
    UnexpectedStatus { what: String, expected: String, actual: String },

    #[error("coordinator {coordinator} has {len} action(s), no index {index}")]
    ActionIndexOutOfRange { coordinator: JobId, index: usize, len: usize },

    #[error("no bundle matches {filter}{}", .index.map(|i| format!(" at position {i}")).unwrap_or_default())]
    NoBundle { filter: String, index: Option<usize> },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("provisioning failed: {0:#}")]
    Provisioning(anyhow::Error),
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
