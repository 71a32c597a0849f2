use crate::model::{ConflictReason, RejectReason};

#[derive(Debug)]
pub enum EngineError {
    /// Input that is not a well-typed slot batch: bad JSON, wrong field
    /// types, unknown status, duplicate ids.
    InvalidRequest(String),
    LimitExceeded(&'static str),
    UnknownSlot(String),
    /// The same slot id appears more than once in a selection.
    RepeatedSlot(String),
    WrongLength {
        expected: usize,
        got: usize,
    },
    NotContiguous {
        slot_id: String,
        reason: RejectReason,
    },
    Conflict {
        slot_id: String,
        reason: ConflictReason,
    },
    Serialization(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::UnknownSlot(id) => write!(f, "unknown slot: {id}"),
            EngineError::RepeatedSlot(id) => write!(f, "slot {id} selected more than once"),
            EngineError::WrongLength { expected, got } => {
                write!(f, "selection needs {expected} slots, got {got}")
            }
            EngineError::NotContiguous { slot_id, reason } => {
                write!(f, "selection breaks at slot {slot_id}: {reason}")
            }
            EngineError::Conflict { slot_id, reason } => {
                write!(f, "slot {slot_id} is {reason}")
            }
            EngineError::Serialization(e) => write!(f, "serialization error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
