use crate::config::{EngineConfig, ShiftPolicy};
use crate::model::*;
use crate::observability::Diagnostics;
use crate::time::Normalizer;

// ── Consecutive Window Builder ────────────────────────────────────

/// A slot with its normalized boundaries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimedSlot<'a> {
    pub slot: &'a Slot,
    pub start: Minutes,
    pub end: Minutes,
}

/// A window that passed every pair check, not yet annotated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<'a> {
    /// Never empty.
    pub members: Vec<&'a Slot>,
    pub start: Minutes,
    pub end: Minutes,
}

impl<'a> Candidate<'a> {
    fn from_window(window: &[TimedSlot<'a>]) -> Self {
        Self {
            members: window.iter().map(|t| t.slot).collect(),
            start: window[0].start,
            end: window[window.len() - 1].end,
        }
    }

    pub fn first(&self) -> &'a Slot {
        self.members[0]
    }
}

/// Rules every adjacent pair inside a window must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRules {
    pub tolerance_minutes: u32,
    pub shift_policy: ShiftPolicy,
}

impl From<&EngineConfig> for PairRules {
    fn from(config: &EngineConfig) -> Self {
        Self {
            tolerance_minutes: config.continuity_tolerance_minutes,
            shift_policy: config.shift_policy,
        }
    }
}

impl PairRules {
    /// Room, then sub-room, then time continuity, then (strict only) shift.
    pub(crate) fn check(
        &self,
        prev: &TimedSlot<'_>,
        curr: &TimedSlot<'_>,
    ) -> Result<(), RejectReason> {
        if prev.slot.room.id != curr.slot.room.id {
            return Err(RejectReason::RoomMismatch);
        }
        // Both absent, or both present and equal.
        if prev.slot.room.sub_room_id() != curr.slot.room.sub_room_id() {
            return Err(RejectReason::SubRoomMismatch);
        }
        if prev.end.abs_diff(curr.start) > self.tolerance_minutes {
            return Err(RejectReason::TimeGap);
        }
        if self.shift_policy == ShiftPolicy::Strict
            && prev.slot.shift_name != curr.slot.shift_name
        {
            return Err(RejectReason::ShiftMismatch);
        }
        Ok(())
    }
}

/// Number of slots a service of `duration_minutes` occupies. Missing,
/// non-positive or non-finite durations need a single slot.
pub fn required_slot_count(duration_minutes: Option<f64>, granularity_minutes: u32) -> usize {
    let granularity = f64::from(granularity_minutes.max(1));
    match duration_minutes {
        Some(d) if d.is_finite() && d > 0.0 => ((d / granularity).ceil() as usize).max(1),
        _ => 1,
    }
}

/// Normalize every slot once and stable-sort by start time.
pub(crate) fn timed_slots<'a>(
    slots: &'a [Slot],
    normalizer: &mut Normalizer<'_>,
) -> Vec<TimedSlot<'a>> {
    let mut timed: Vec<TimedSlot<'a>> = slots
        .iter()
        .map(|slot| TimedSlot {
            slot,
            start: normalizer.to_minutes(&slot.id, slot.start_repr()),
            end: normalizer.to_minutes(&slot.id, slot.end_repr()),
        })
        .collect();
    timed.sort_by_key(|t| t.start);
    timed
}

/// Slide a `required`-wide window one slot at a time across the sorted batch
/// and keep every window whose adjacent pairs all pass `rules`.
///
/// Windows overlap on purpose: each valid starting offset is a distinct
/// appointment option. A window with any failing pair is dropped whole.
pub fn build_groups<'a>(
    slots: &'a [Slot],
    required: usize,
    rules: &PairRules,
    normalizer: &mut Normalizer<'_>,
    diagnostics: &dyn Diagnostics,
    stats: &mut GroupingStats,
) -> Vec<Candidate<'a>> {
    let timed = timed_slots(slots, normalizer);

    if required <= 1 {
        stats.candidates += timed.len();
        return timed.chunks(1).map(Candidate::from_window).collect();
    }

    if timed.len() < required {
        return Vec::new();
    }

    let mut out = Vec::new();
    for window in timed.windows(required) {
        stats.candidates += 1;
        let verdict = window
            .windows(2)
            .try_for_each(|pair| rules.check(&pair[0], &pair[1]));
        match verdict {
            Ok(()) => out.push(Candidate::from_window(window)),
            Err(reason) => {
                stats.record_rejection(reason);
                diagnostics.window_rejected(&window[0].slot.id, reason);
            }
        }
    }
    out
}
