use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Lifecycle status of a bundle or coordinator job.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Prep,
    Running,
    Suspended,
    Succeeded,
    Killed,
    Failed,
    #[serde(rename = "DONEWITHERROR")]
    DoneWithError,
    #[serde(rename = "PREPSUSPENDED")]
    PrepSuspended,
    #[serde(rename = "PREPPAUSED")]
    PrepPaused,
    Paused,
    #[serde(rename = "RUNNINGWITHERROR")]
    RunningWithError,
    #[serde(rename = "SUSPENDEDWITHERROR")]
    SuspendedWithError,
    #[serde(rename = "PAUSEDWITHERROR")]
    PausedWithError,
    Ignored,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Prep => "PREP",
            JobStatus::Running => "RUNNING",
            JobStatus::Suspended => "SUSPENDED",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Killed => "KILLED",
            JobStatus::Failed => "FAILED",
            JobStatus::DoneWithError => "DONEWITHERROR",
            JobStatus::PrepSuspended => "PREPSUSPENDED",
            JobStatus::PrepPaused => "PREPPAUSED",
            JobStatus::Paused => "PAUSED",
            JobStatus::RunningWithError => "RUNNINGWITHERROR",
            JobStatus::SuspendedWithError => "SUSPENDEDWITHERROR",
            JobStatus::PausedWithError => "PAUSEDWITHERROR",
            JobStatus::Ignored => "IGNORED",
        }
    }

    /// A bundle in one of these states will not schedule anything else.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Killed | JobStatus::Failed | JobStatus::DoneWithError
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PREP" => Ok(JobStatus::Prep),
            "RUNNING" => Ok(JobStatus::Running),
            "SUSPENDED" => Ok(JobStatus::Suspended),
            "SUCCEEDED" => Ok(JobStatus::Succeeded),
            "KILLED" => Ok(JobStatus::Killed),
            "FAILED" => Ok(JobStatus::Failed),
            "DONEWITHERROR" => Ok(JobStatus::DoneWithError),
            "PREPSUSPENDED" => Ok(JobStatus::PrepSuspended),
            "PREPPAUSED" => Ok(JobStatus::PrepPaused),
            "PAUSED" => Ok(JobStatus::Paused),
            "RUNNINGWITHERROR" => Ok(JobStatus::RunningWithError),
            "SUSPENDEDWITHERROR" => Ok(JobStatus::SuspendedWithError),
            "PAUSEDWITHERROR" => Ok(JobStatus::PausedWithError),
            "IGNORED" => Ok(JobStatus::Ignored),
            _ => Err(CoreError::UnknownStatus { kind: "job", value: s.to_string() }),
        }
    }
}

/// Status of a single coordinator action (one scheduled instance).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    Waiting,
    Ready,
    Submitted,
    Running,
    Suspended,
    #[serde(rename = "TIMEDOUT")]
    TimedOut,
    Succeeded,
    Killed,
    Failed,
    Skipped,
    Ignored,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Waiting => "WAITING",
            ActionStatus::Ready => "READY",
            ActionStatus::Submitted => "SUBMITTED",
            ActionStatus::Running => "RUNNING",
            ActionStatus::Suspended => "SUSPENDED",
            ActionStatus::TimedOut => "TIMEDOUT",
            ActionStatus::Succeeded => "SUCCEEDED",
            ActionStatus::Killed => "KILLED",
            ActionStatus::Failed => "FAILED",
            ActionStatus::Skipped => "SKIPPED",
            ActionStatus::Ignored => "IGNORED",
        }
    }

    /// States the retention wait treats as finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionStatus::Succeeded | ActionStatus::Killed | ActionStatus::Failed)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WAITING" => Ok(ActionStatus::Waiting),
            "READY" => Ok(ActionStatus::Ready),
            "SUBMITTED" => Ok(ActionStatus::Submitted),
            "RUNNING" => Ok(ActionStatus::Running),
            "SUSPENDED" => Ok(ActionStatus::Suspended),
            "TIMEDOUT" => Ok(ActionStatus::TimedOut),
            "SUCCEEDED" => Ok(ActionStatus::Succeeded),
            "KILLED" => Ok(ActionStatus::Killed),
            "FAILED" => Ok(ActionStatus::Failed),
            "SKIPPED" => Ok(ActionStatus::Skipped),
            "IGNORED" => Ok(ActionStatus::Ignored),
            _ => Err(CoreError::UnknownStatus { kind: "action", value: s.to_string() }),
        }
    }
}

/// Kind of pipeline entity a bundle was scheduled for.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Process,
    Feed,
    Cluster,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Process => "PROCESS",
            EntityKind::Feed => "FEED",
            EntityKind::Cluster => "CLUSTER",
        }
    }

    /// Substring of the coordinator app name that marks the coordinator doing
    /// this kind's primary work. Clusters are never scheduled, so they have none.
    pub fn coordinator_role(&self) -> Option<&'static str> {
        match self {
            EntityKind::Process => Some("DEFAULT"),
            EntityKind::Feed => Some("REPLICATION"),
            EntityKind::Cluster => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "process" => Ok(EntityKind::Process),
            "feed" => Ok(EntityKind::Feed),
            "cluster" => Ok(EntityKind::Cluster),
            _ => Err(CoreError::UnknownEntityKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_parses_wire_names() {
        assert_eq!("DONEWITHERROR".parse::<JobStatus>().unwrap(), JobStatus::DoneWithError);
        assert_eq!("running".parse::<JobStatus>().unwrap(), JobStatus::Running);
        assert!("WAITING".parse::<JobStatus>().is_err());
    }

    #[test]
    fn terminal_sets_differ_by_granularity() {
        assert!(JobStatus::DoneWithError.is_terminal());
        assert!(!JobStatus::Suspended.is_terminal());
        assert!(ActionStatus::Killed.is_terminal());
        assert!(!ActionStatus::TimedOut.is_terminal());
        assert!(!ActionStatus::Waiting.is_terminal());
    }

    #[test]
    fn roles_follow_entity_kind() {
        assert_eq!(EntityKind::Process.coordinator_role(), Some("DEFAULT"));
        assert_eq!(EntityKind::Feed.coordinator_role(), Some("REPLICATION"));
        assert_eq!(EntityKind::Cluster.coordinator_role(), None);
    }
}
