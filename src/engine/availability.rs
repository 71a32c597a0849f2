use crate::model::*;

// ── Availability Resolution ───────────────────────────────────────

/// Aggregate verdict for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub is_available: bool,
    pub conflict_reason: Option<ConflictReason>,
    /// Max `SlotStatus::priority` across members.
    pub status_priority: u8,
}

/// Resolve a window's availability from its members.
///
/// The reason is picked by priority, not encounter order: a window holding
/// both a locked and a booked slot always reports `booked`.
pub fn resolve_availability<'a>(members: impl IntoIterator<Item = &'a Slot>) -> Resolution {
    let worst = most_severe(members)
        .map(|s| s.status)
        .unwrap_or(SlotStatus::Available);
    Resolution {
        is_available: worst.priority() == 0,
        conflict_reason: worst.conflict_reason(),
        status_priority: worst.priority(),
    }
}

/// First member carrying the highest-priority status. `None` for no members.
pub fn most_severe<'a>(members: impl IntoIterator<Item = &'a Slot>) -> Option<&'a Slot> {
    let mut worst: Option<&'a Slot> = None;
    for slot in members {
        match worst {
            Some(w) if w.status.priority() >= slot.status.priority() => {}
            _ => worst = Some(slot),
        }
    }
    worst
}
