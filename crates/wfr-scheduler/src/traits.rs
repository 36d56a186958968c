use thiserror::Error;
use wfr_core::{ActionSnapshot, BundleSnapshot, CoordinatorSnapshot, EntityKind, EntityRef, JobId, ServiceResponse};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The scheduler could not be reached or answered with a server error.
    #[error("scheduler transport error: {0}")]
    Transport(String),

    /// The scheduler answered, but the payload could not be understood.
    #[error("scheduler protocol error: {0}")]
    Protocol(String),

    /// The scheduler does not know the job (yet).
    #[error("job {id} not found")]
    NotFound { id: String },
}

impl SchedulerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SchedulerError::NotFound { .. })
    }
}

impl From<wfr_core::CoreError> for SchedulerError {
    fn from(e: wfr_core::CoreError) -> Self {
        SchedulerError::Protocol(e.to_string())
    }
}

/// Read-only view of the remote batch-workflow scheduler's job hierarchy.
pub trait SchedulerClient: Send + Sync {
    /// Human-readable location of the scheduler, for logs.
    fn endpoint(&self) -> String;

    fn bundle_info(&self, bundle_id: &JobId) -> Result<BundleSnapshot, SchedulerError>;

    fn coordinator_info(&self, coordinator_id: &JobId) -> Result<CoordinatorSnapshot, SchedulerError>;

    fn action_info(&self, action_id: &JobId) -> Result<ActionSnapshot, SchedulerError>;

    /// Bundles matching `filter` (e.g. `name=FALCON_PROCESS_agg`). `offset` is 1-based.
    fn list_bundles(&self, filter: &str, offset: usize, len: usize) -> Result<Vec<BundleSnapshot>, SchedulerError>;
}

/// Storage-side collaborator that makes input paths exist so blocked actions can run.
/// Creation must be idempotent.
pub trait PathProvisioner: Send + Sync {
    fn create_paths(&self, paths: &[String]) -> anyhow::Result<()>;
}

/// Submission-side collaborator: the orchestration service's entity API.
pub trait EntityService: Send + Sync {
    fn status(&self, entity: &EntityRef, user: &str) -> anyhow::Result<ServiceResponse>;
    fn dependencies(&self, entity: &EntityRef, user: &str) -> anyhow::Result<ServiceResponse>;
    fn list(&self, kind: EntityKind, user: &str) -> anyhow::Result<Vec<String>>;
    fn definition(&self, entity: &EntityRef, user: &str) -> anyhow::Result<ServiceResponse>;
    fn delete(&self, entity: &EntityRef, user: &str) -> anyhow::Result<ServiceResponse>;
    fn update(&self, old: &EntityRef, new: &EntityRef, user: &str) -> anyhow::Result<ServiceResponse>;
    fn schedule(&self, entity: &EntityRef, user: &str) -> anyhow::Result<ServiceResponse>;
    fn submit(&self, entity: &EntityRef, user: &str) -> anyhow::Result<ServiceResponse>;
    fn submit_and_schedule(&self, entity: &EntityRef, user: &str) -> anyhow::Result<ServiceResponse>;
    fn suspend(&self, entity: &EntityRef, user: &str) -> anyhow::Result<ServiceResponse>;
    fn resume(&self, entity: &EntityRef, user: &str) -> anyhow::Result<ServiceResponse>;
}
