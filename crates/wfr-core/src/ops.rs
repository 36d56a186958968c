use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoreError, EntityKind};

/// Entity lifecycle operations that can be issued against the orchestration
/// service on behalf of a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityOp {
    Status,
    Dependency,
    Listing,
    Definition,
    Delete,
    Update,
    Schedule,
    Submit,
    SubmitAndSchedule,
    Suspend,
    Resume,
}

impl EntityOp {
    pub const ALL: [EntityOp; 11] = [
        EntityOp::Status,
        EntityOp::Dependency,
        EntityOp::Listing,
        EntityOp::Definition,
        EntityOp::Delete,
        EntityOp::Update,
        EntityOp::Schedule,
        EntityOp::Submit,
        EntityOp::SubmitAndSchedule,
        EntityOp::Suspend,
        EntityOp::Resume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityOp::Status => "status",
            EntityOp::Dependency => "dependency",
            EntityOp::Listing => "listing",
            EntityOp::Definition => "definition",
            EntityOp::Delete => "delete",
            EntityOp::Update => "update",
            EntityOp::Schedule => "schedule",
            EntityOp::Submit => "submit",
            EntityOp::SubmitAndSchedule => "submit_and_schedule",
            EntityOp::Suspend => "suspend",
            EntityOp::Resume => "resume",
        }
    }
}

impl fmt::Display for EntityOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityOp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityOp::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownStatus { kind: "operation", value: s.to_string() })
    }
}

/// Entity as the submission service knows it: name, kind and its definition document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub definition: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Succeeded,
    Partial,
    Failed,
}

/// Reply of the submission service to one operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: u16,
}

impl ServiceResponse {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self { status: ResponseStatus::Succeeded, message: message.into(), code: 200 }
    }

    pub fn failed(code: u16, message: impl Into<String>) -> Self {
        Self { status: ResponseStatus::Failed, message: message.into(), code }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Succeeded
    }
}
