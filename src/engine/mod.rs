mod availability;
mod builder;
mod conflict;
mod error;
mod format;
mod shift;
#[cfg(test)]
mod tests;

pub use availability::{most_severe, resolve_availability, Resolution};
pub use builder::{build_groups, required_slot_count, Candidate, PairRules};
pub use error::EngineError;
pub use format::{format_label, window_labels, LABEL_SEPARATOR};
pub use shift::{partition_by_shift, ShiftBuckets};

use std::sync::Arc;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::model::*;
use crate::observability::{Diagnostics, TracingDiagnostics};
use crate::request::{GroupingRequest, GroupingResponse};
use crate::time::Normalizer;

/// Result of one grouping invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingOutcome {
    pub groups: Vec<SlotGroup>,
    pub stats: GroupingStats,
}

impl GroupingOutcome {
    pub fn by_shift(&self) -> ShiftBuckets {
        partition_by_shift(self.groups.iter().cloned())
    }
}

/// Contiguous-slot grouping engine.
///
/// Stateless between calls: every invocation re-runs the full pipeline
/// (normalize → sort → build windows → resolve availability → label). Safe to
/// share across threads.
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) diagnostics: Arc<dyn Diagnostics>,
}

/// Annotate a built window with its availability verdict and labels.
fn annotate(candidate: Candidate<'_>) -> SlotGroup {
    let resolution = resolve_availability(candidate.members.iter().copied());
    let first = candidate.first();
    let last = candidate.members[candidate.members.len() - 1];
    let (window_start, window_end, display_label) =
        window_labels(first, last, candidate.start, candidate.end);

    let member_slot_ids: Vec<String> = candidate.members.iter().map(|s| s.id.clone()).collect();
    SlotGroup {
        group_id: group_id_for(member_slot_ids.iter().map(String::as_str)),
        member_slot_ids,
        window_start,
        window_end,
        display_label,
        is_available: resolution.is_available,
        conflict_reason: resolution.conflict_reason,
        status_priority: resolution.status_priority,
        room: first.room.clone(),
        shift_name: first.shift_name.clone(),
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_diagnostics(config, Arc::new(TracingDiagnostics))
    }

    pub fn with_diagnostics(config: EngineConfig, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            config,
            diagnostics,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Requested granularity, or the configured default when absent or zero.
    pub fn granularity(&self, requested: Option<u32>) -> u32 {
        match requested {
            Some(g) if g > 0 => g,
            _ => self.config.default_granularity_minutes.max(1),
        }
    }

    /// Turn a slot batch into every valid, availability-annotated window long
    /// enough for `service_duration_minutes`.
    pub fn group_slots(
        &self,
        slots: &[Slot],
        service_duration_minutes: Option<f64>,
        slot_granularity_minutes: Option<u32>,
    ) -> GroupingOutcome {
        let started = Instant::now();
        let granularity = self.granularity(slot_granularity_minutes);
        let required = required_slot_count(service_duration_minutes, granularity);

        let mut stats = GroupingStats {
            slots_in: slots.len(),
            required_slot_count: required,
            ..GroupingStats::default()
        };
        let mut normalizer = Normalizer::new(self.config.timezone, self.diagnostics.as_ref());
        let rules = PairRules::from(&self.config);

        let candidates = build_groups(
            slots,
            required,
            &rules,
            &mut normalizer,
            self.diagnostics.as_ref(),
            &mut stats,
        );
        stats.malformed_times = normalizer.malformed();

        let groups: Vec<SlotGroup> = candidates.into_iter().map(annotate).collect();
        stats.emitted = groups.len();
        stats.available = groups.iter().filter(|g| g.is_available).count();

        metrics::histogram!(crate::observability::GROUPING_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        self.diagnostics.grouping_finished(&stats);

        GroupingOutcome { groups, stats }
    }

    pub fn group_request(&self, request: &GroupingRequest) -> GroupingOutcome {
        self.group_slots(
            &request.slots,
            request.service_duration_minutes,
            request.slot_granularity_minutes,
        )
    }

    /// JSON in, JSON out. Malformed input fails here, before the pipeline.
    pub fn handle_json(&self, body: &str) -> Result<String, EngineError> {
        let request = GroupingRequest::from_json(body)?;
        GroupingResponse::from(self.group_request(&request)).to_json()
    }
}
