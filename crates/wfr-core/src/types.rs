use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{ids::*, model::*};

/// Coordinator entry as listed inside a bundle; carries no actions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorRef {
    pub id: JobId,
    pub app_name: String,
    pub status: JobStatus,
}

impl CoordinatorRef {
    /// Roles are encoded in the app name, e.g. `FALCON_PROCESS_DEFAULT_agg`.
    pub fn has_role(&self, role: &str) -> bool {
        self.app_name.contains(role)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSnapshot {
    pub id: JobId,
    pub name: String,
    pub status: JobStatus,
    #[serde(default)]
    pub coordinators: Vec<CoordinatorRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorSnapshot {
    pub id: JobId,
    pub app_name: String,
    pub status: JobStatus,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    /// Ordered by strictly increasing nominal time.
    #[serde(default)]
    pub actions: Vec<ActionSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSnapshot {
    pub id: JobId,
    #[serde(with = "time::serde::rfc3339")]
    pub nominal_time: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_time: Option<OffsetDateTime>,
    pub status: ActionStatus,
    /// Workflow job launched for this action, once it has started.
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub missing_dependencies: Vec<String>,
}
