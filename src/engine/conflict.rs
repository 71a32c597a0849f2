use std::collections::{HashMap, HashSet};

use crate::model::*;
use crate::time::Normalizer;

use super::availability::{most_severe, resolve_availability};
use super::builder::{required_slot_count, PairRules, TimedSlot};
use super::{Engine, EngineError};

impl Engine {
    /// Re-check a caller's chosen window against a fresh slot batch.
    ///
    /// Applies the same rules the builder uses, in the order the ids were
    /// given, and fails on the first problem. Nothing is locked: this only
    /// lets the reservation side reject stale selections deterministically.
    pub fn check_selection(
        &self,
        slots: &[Slot],
        member_slot_ids: &[String],
        service_duration_minutes: Option<f64>,
        slot_granularity_minutes: Option<u32>,
    ) -> Result<(), EngineError> {
        let granularity = self.granularity(slot_granularity_minutes);
        let expected = required_slot_count(service_duration_minutes, granularity);
        if member_slot_ids.len() != expected {
            return Err(EngineError::WrongLength {
                expected,
                got: member_slot_ids.len(),
            });
        }

        let mut seen = HashSet::with_capacity(member_slot_ids.len());
        for id in member_slot_ids {
            if !seen.insert(id.as_str()) {
                return Err(EngineError::RepeatedSlot(id.clone()));
            }
        }

        let by_id: HashMap<&str, &Slot> = slots.iter().map(|s| (s.id.as_str(), s)).collect();
        let members = member_slot_ids
            .iter()
            .map(|id| {
                by_id
                    .get(id.as_str())
                    .copied()
                    .ok_or_else(|| EngineError::UnknownSlot(id.clone()))
            })
            .collect::<Result<Vec<&Slot>, _>>()?;

        let mut normalizer = Normalizer::new(self.config.timezone, self.diagnostics.as_ref());
        let timed: Vec<TimedSlot<'_>> = members
            .iter()
            .map(|&slot| TimedSlot {
                slot,
                start: normalizer.to_minutes(&slot.id, slot.start_repr()),
                end: normalizer.to_minutes(&slot.id, slot.end_repr()),
            })
            .collect();

        let rules = PairRules::from(&self.config);
        for pair in timed.windows(2) {
            if let Err(reason) = rules.check(&pair[0], &pair[1]) {
                return Err(EngineError::NotContiguous {
                    slot_id: pair[1].slot.id.clone(),
                    reason,
                });
            }
        }

        let resolution = resolve_availability(members.iter().copied());
        if let Some(reason) = resolution.conflict_reason
            && let Some(worst) = most_severe(members.iter().copied())
        {
            return Err(EngineError::Conflict {
                slot_id: worst.id.clone(),
                reason,
            });
        }
        Ok(())
    }
}
