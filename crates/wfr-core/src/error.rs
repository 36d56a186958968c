use thiserror::Error;

/// Errors raised while parsing values that came off the scheduler wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("job id {id:?} has no numeric sequence prefix")]
    MalformedJobId { id: String },

    #[error("unknown {kind} status {value:?}")]
    UnknownStatus { kind: &'static str, value: String },

    #[error("unknown entity kind {0:?}")]
    UnknownEntityKind(String),

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}
