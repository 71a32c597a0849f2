use std::sync::Arc;

use dashmap::DashMap;

use crate::engine::{Engine, GroupingOutcome};
use crate::limits::MAX_CACHE_ENTRIES;
use crate::request::GroupingRequest;

/// CRC32 over the bincode encoding of a request.
pub fn fingerprint(request: &GroupingRequest) -> u32 {
    match bincode::serialize(request) {
        Ok(bytes) => crc32fast::hash(&bytes),
        // Everything lands in one bucket; equality still decides hits.
        Err(_) => 0,
    }
}

/// Memoizes grouping outcomes for one engine.
///
/// Keyed by `fingerprint`; each bucket keeps the full request so a checksum
/// collision is recomputed instead of served. Cleared wholesale once it holds
/// `capacity` fingerprints.
pub struct GroupCache {
    entries: DashMap<u32, Vec<(GroupingRequest, Arc<GroupingOutcome>)>>,
    capacity: usize,
}

impl Default for GroupCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupCache {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHE_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Serve a memoized outcome or run the engine and remember the result.
    pub fn get_or_compute(
        &self,
        engine: &Engine,
        request: &GroupingRequest,
    ) -> Arc<GroupingOutcome> {
        let key = fingerprint(request);
        if let Some(hit) = self.lookup(key, request) {
            metrics::counter!(crate::observability::CACHE_HITS_TOTAL).increment(1);
            return hit;
        }
        metrics::counter!(crate::observability::CACHE_MISSES_TOTAL).increment(1);

        let outcome = Arc::new(engine.group_request(request));
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            tracing::debug!("group cache full ({} fingerprints), clearing", self.entries.len());
            self.entries.clear();
        }
        let mut bucket = self.entries.entry(key).or_default();
        if !bucket.iter().any(|(r, _)| r == request) {
            bucket.push((request.clone(), outcome.clone()));
        }
        outcome
    }

    fn lookup(&self, key: u32, request: &GroupingRequest) -> Option<Arc<GroupingOutcome>> {
        let bucket = self.entries.get(&key)?;
        bucket
            .iter()
            .find(|(r, _)| r == request)
            .map(|(_, outcome)| outcome.clone())
    }

    /// Number of memoized outcomes.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
