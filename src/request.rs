use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::engine::{EngineError, GroupingOutcome, ShiftBuckets};
use crate::limits::MAX_SLOTS_PER_BATCH;
use crate::model::{GroupingStats, Slot, SlotGroup};

/// One slot batch plus the service it must host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingRequest {
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub service_duration_minutes: Option<f64>,
    #[serde(default)]
    pub slot_granularity_minutes: Option<u32>,
}

impl GroupingRequest {
    pub fn new(slots: Vec<Slot>, service_duration_minutes: f64) -> Self {
        Self {
            slots,
            service_duration_minutes: Some(service_duration_minutes),
            slot_granularity_minutes: None,
        }
    }

    /// Parse and validate a request body. This is the only place the engine
    /// rejects input outright.
    pub fn from_json(body: &str) -> Result<Self, EngineError> {
        let request: Self =
            serde_json::from_str(body).map_err(|e| EngineError::InvalidRequest(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.slots.len() > MAX_SLOTS_PER_BATCH {
            return Err(EngineError::LimitExceeded("too many slots in batch"));
        }
        let mut seen = HashSet::with_capacity(self.slots.len());
        for slot in &self.slots {
            if !seen.insert(slot.id.as_str()) {
                return Err(EngineError::InvalidRequest(format!(
                    "duplicate slot id: {}",
                    slot.id
                )));
            }
        }
        Ok(())
    }
}

/// What the presentation layer receives.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingResponse {
    pub groups: Vec<SlotGroup>,
    pub by_shift: ShiftBuckets,
    pub stats: GroupingStats,
}

impl From<GroupingOutcome> for GroupingResponse {
    fn from(outcome: GroupingOutcome) -> Self {
        let by_shift = outcome.by_shift();
        Self {
            groups: outcome.groups,
            by_shift,
            stats: outcome.stats,
        }
    }
}

impl GroupingResponse {
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string(self).map_err(|e| EngineError::Serialization(e.to_string()))
    }
}
