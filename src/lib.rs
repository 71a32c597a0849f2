//! Contiguous-slot grouping for appointment booking.
//!
//! Turns a flat list of fixed-size time slots into every window long enough
//! to host a service, each annotated with an availability verdict.

pub mod cache;
pub mod config;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod request;
pub mod time;

pub use cache::GroupCache;
pub use config::{EngineConfig, ShiftPolicy};
pub use engine::{Engine, EngineError, GroupingOutcome, ShiftBuckets};
pub use model::{ConflictReason, RoomRef, Slot, SlotGroup, SlotStatus, SubRoomRef};
pub use request::{GroupingRequest, GroupingResponse};
