use std::fmt;

use serde::{Deserialize, Serialize};

/// Minutes since local midnight. The engine's only time type.
pub type Minutes = u32;

/// Booking state of a single slot as reported by the slot-listing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    /// Temporary hold, e.g. another patient mid-checkout.
    Locked,
    /// Confirmed reservation.
    Booked,
}

impl SlotStatus {
    /// Severity rank used when a window mixes statuses. Higher wins.
    pub fn priority(self) -> u8 {
        match self {
            SlotStatus::Available => 0,
            SlotStatus::Locked => 1,
            SlotStatus::Booked => 2,
        }
    }

    pub fn conflict_reason(self) -> Option<ConflictReason> {
        match self {
            SlotStatus::Available => None,
            SlotStatus::Locked => Some(ConflictReason::Locked),
            SlotStatus::Booked => Some(ConflictReason::Booked),
        }
    }
}

/// Why a window cannot be offered. Serialized as the bare status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictReason {
    Locked,
    Booked,
}

impl ConflictReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictReason::Locked => "locked",
            ConflictReason::Booked => "booked",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubRoomRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_room: Option<SubRoomRef>,
}

impl RoomRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sub_room: None,
        }
    }

    pub fn with_sub_room(id: impl Into<String>, sub_room_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sub_room: Some(SubRoomRef {
                id: sub_room_id.into(),
            }),
        }
    }

    pub fn sub_room_id(&self) -> Option<&str> {
        self.sub_room.as_ref().map(|s| s.id.as_str())
    }
}

/// One fixed-size bookable unit, owned by the slot-listing API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: String,
    /// "HH:mm" or a full timestamp.
    pub start_time: String,
    pub end_time: String,
    /// Already-localized "HH:mm", preferred over `start_time` when well formed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_local: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_local: Option<String>,
    pub status: SlotStatus,
    pub room: RoomRef,
    pub shift_name: String,
}

impl Slot {
    pub fn new(
        id: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        status: SlotStatus,
        room: RoomRef,
        shift_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            start_time_local: None,
            end_time_local: None,
            status,
            room,
            shift_name: shift_name.into(),
        }
    }

    pub fn with_local_times(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_time_local = Some(start.into());
        self.end_time_local = Some(end.into());
        self
    }

    /// The representation of the start time the engine should read.
    pub fn start_repr(&self) -> &str {
        crate::time::preferred(self.start_time_local.as_deref(), &self.start_time)
    }

    pub fn end_repr(&self) -> &str {
        crate::time::preferred(self.end_time_local.as_deref(), &self.end_time)
    }
}

/// A run of consecutive slots long enough to host one service booking.
///
/// Produced fresh on every invocation; `group_id` is the only identity that
/// survives across calls with identical input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotGroup {
    pub group_id: String,
    pub member_slot_ids: Vec<String>,
    pub window_start: String,
    pub window_end: String,
    pub display_label: String,
    pub is_available: bool,
    pub conflict_reason: Option<ConflictReason>,
    /// Max member `SlotStatus::priority`. In-process only.
    #[serde(skip)]
    pub status_priority: u8,
    pub room: RoomRef,
    pub shift_name: String,
}

/// Derive a group id from its members. Stable for identical input.
pub fn group_id_for<'a>(member_ids: impl IntoIterator<Item = &'a str>) -> String {
    member_ids.into_iter().collect::<Vec<_>>().join("-")
}

/// Why a candidate window was discarded by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    RoomMismatch,
    SubRoomMismatch,
    TimeGap,
    ShiftMismatch,
}

impl RejectReason {
    /// Short label for metrics and logs.
    pub fn label(self) -> &'static str {
        match self {
            RejectReason::RoomMismatch => "room",
            RejectReason::SubRoomMismatch => "sub_room",
            RejectReason::TimeGap => "gap",
            RejectReason::ShiftMismatch => "shift",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::RoomMismatch => f.write_str("room mismatch"),
            RejectReason::SubRoomMismatch => f.write_str("sub-room mismatch"),
            RejectReason::TimeGap => f.write_str("time gap"),
            RejectReason::ShiftMismatch => f.write_str("shift mismatch"),
        }
    }
}

/// Counters collected during one grouping invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingStats {
    pub slots_in: usize,
    pub required_slot_count: usize,
    /// Start indices examined by the sliding window.
    pub candidates: usize,
    pub emitted: usize,
    pub available: usize,
    pub rejected_room: usize,
    pub rejected_sub_room: usize,
    pub rejected_gap: usize,
    pub rejected_shift: usize,
    /// Time values that could not be parsed and were read as 00:00.
    pub malformed_times: usize,
}

impl GroupingStats {
    pub fn record_rejection(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::RoomMismatch => self.rejected_room += 1,
            RejectReason::SubRoomMismatch => self.rejected_sub_room += 1,
            RejectReason::TimeGap => self.rejected_gap += 1,
            RejectReason::ShiftMismatch => self.rejected_shift += 1,
        }
    }

    pub fn rejected(&self) -> usize {
        self.rejected_room + self.rejected_sub_room + self.rejected_gap + self.rejected_shift
    }
}
