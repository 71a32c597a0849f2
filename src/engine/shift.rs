use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::model::SlotGroup;

/// Groups bucketed by shift label, in first-seen order.
///
/// Serializes as a JSON object `{ shiftName: SlotGroup[] }` whose keys keep
/// that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftBuckets {
    buckets: Vec<(String, Vec<SlotGroup>)>,
}

impl ShiftBuckets {
    pub fn get(&self, shift_name: &str) -> Option<&[SlotGroup]> {
        self.buckets
            .iter()
            .find(|(name, _)| name == shift_name)
            .map(|(_, groups)| groups.as_slice())
    }

    pub fn shift_names(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SlotGroup])> {
        self.buckets
            .iter()
            .map(|(name, groups)| (name.as_str(), groups.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Serialize for ShiftBuckets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (name, groups) in &self.buckets {
            map.serialize_entry(name, groups)?;
        }
        map.end()
    }
}

/// Bucket groups by the shift label they inherited from their first member.
/// Shift homogeneity within a group is not re-checked here.
pub fn partition_by_shift(groups: impl IntoIterator<Item = SlotGroup>) -> ShiftBuckets {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<SlotGroup>)> = Vec::new();
    for group in groups {
        match index.get(&group.shift_name) {
            Some(&i) => buckets[i].1.push(group),
            None => {
                index.insert(group.shift_name.clone(), buckets.len());
                buckets.push((group.shift_name.clone(), vec![group]));
            }
        }
    }
    ShiftBuckets { buckets }
}
