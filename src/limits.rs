/// Slot size assumed when the caller does not supply one.
pub const DEFAULT_SLOT_GRANULARITY_MINUTES: u32 = 15;

/// Max distance between one slot's end and the next slot's start for the two
/// to count as consecutive. Absorbs rounding from timestamp truncation.
pub const CONTINUITY_TOLERANCE_MINUTES: u32 = 1;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Max slots accepted in a single request at the JSON boundary.
pub const MAX_SLOTS_PER_BATCH: usize = 10_000;

/// Max memoized outcomes held by a `GroupCache` before it is cleared.
pub const MAX_CACHE_ENTRIES: usize = 1_024;
