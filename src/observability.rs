use crate::model::{GroupingStats, RejectReason};

// ── Metric names ────────────────────────────────────────────────

/// Counter: slot time values that could not be parsed.
pub const MALFORMED_TIMES_TOTAL: &str = "slotgroup_malformed_times_total";

/// Counter: candidate windows discarded by the builder. Labels: reason.
pub const WINDOWS_REJECTED_TOTAL: &str = "slotgroup_windows_rejected_total";

/// Counter: slot groups emitted.
pub const GROUPS_EMITTED_TOTAL: &str = "slotgroup_groups_emitted_total";

/// Histogram: wall time of one grouping invocation in seconds.
pub const GROUPING_DURATION_SECONDS: &str = "slotgroup_grouping_duration_seconds";

/// Counter: memoized outcomes served from a `GroupCache`.
pub const CACHE_HITS_TOTAL: &str = "slotgroup_cache_hits_total";

/// Counter: `GroupCache` lookups that had to run the engine.
pub const CACHE_MISSES_TOTAL: &str = "slotgroup_cache_misses_total";

// ── Diagnostics hook ────────────────────────────────────────────

/// Observability hook passed into the engine.
///
/// Implementations must not panic: a bad record is reported and processing
/// continues.
pub trait Diagnostics: Send + Sync {
    /// A slot time matched no known shape and was read as 00:00.
    fn malformed_time(&self, slot_id: &str, raw: &str);

    /// A candidate window starting at `first_slot_id` was discarded.
    fn window_rejected(&self, first_slot_id: &str, reason: RejectReason) {
        let _ = (first_slot_id, reason);
    }

    /// One grouping invocation completed.
    fn grouping_finished(&self, stats: &GroupingStats) {
        let _ = stats;
    }
}

/// Default hook: `tracing` events plus `metrics` counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn malformed_time(&self, slot_id: &str, raw: &str) {
        tracing::warn!("slot {slot_id}: unparseable time {raw:?}, reading as 00:00");
        metrics::counter!(MALFORMED_TIMES_TOTAL).increment(1);
    }

    fn window_rejected(&self, first_slot_id: &str, reason: RejectReason) {
        tracing::debug!("window at {first_slot_id} rejected: {reason}");
        metrics::counter!(WINDOWS_REJECTED_TOTAL, "reason" => reason.label()).increment(1);
    }

    fn grouping_finished(&self, stats: &GroupingStats) {
        tracing::debug!(
            "grouped {} slots (k={}): {} groups, {} available, {} rejected, {} malformed times",
            stats.slots_in,
            stats.required_slot_count,
            stats.emitted,
            stats.available,
            stats.rejected(),
            stats.malformed_times,
        );
        metrics::counter!(GROUPS_EMITTED_TOTAL).increment(stats.emitted as u64);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn malformed_time(&self, _slot_id: &str, _raw: &str) {}
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingDiagnostics {
    pub malformed: std::sync::Mutex<Vec<(String, String)>>,
    pub rejected: std::sync::Mutex<Vec<(String, RejectReason)>>,
    pub finished: std::sync::Mutex<Vec<GroupingStats>>,
}

#[cfg(test)]
impl Diagnostics for RecordingDiagnostics {
    fn malformed_time(&self, slot_id: &str, raw: &str) {
        self.malformed
            .lock()
            .unwrap()
            .push((slot_id.to_string(), raw.to_string()));
    }

    fn window_rejected(&self, first_slot_id: &str, reason: RejectReason) {
        self.rejected
            .lock()
            .unwrap()
            .push((first_slot_id.to_string(), reason));
    }

    fn grouping_finished(&self, stats: &GroupingStats) {
        self.finished.lock().unwrap().push(stats.clone());
    }
}
