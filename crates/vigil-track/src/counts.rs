//! Unique object counts per semantic class.

use std::collections::{BTreeMap, BTreeSet};

use crate::tracker::Track;

/// Label the detector uses for people.
pub const PERSON_LABEL: &str = "person";
/// Label the detector uses for animals.
pub const ANIMAL_LABEL: &str = "animal";

/// Accumulates the distinct track ids that ever reached the confirmed
/// state, per class, over the lifetime of one video/session.
///
/// This counts objects, not detections: one animal tracked across 300
/// frames contributes exactly 1. A counted track stays counted after
/// deletion.
#[derive(Debug, Default)]
pub struct ClassCounts {
    seen: BTreeMap<String, BTreeSet<u64>>,
}

impl ClassCounts {
    /// Record the confirmed tracks of one update cycle.
    pub fn observe<'a>(&mut self, confirmed: impl IntoIterator<Item = &'a Track>) {
        for track in confirmed {
            self.seen
                .entry(track.class_label.clone())
                .or_default()
                .insert(track.id);
        }
    }

    /// Distinct confirmed tracks of one class.
    pub fn count(&self, class_label: &str) -> u32 {
        self.seen.get(class_label).map_or(0, |ids| ids.len() as u32)
    }

    pub fn person_count(&self) -> u32 {
        self.count(PERSON_LABEL)
    }

    pub fn animal_count(&self) -> u32 {
        self.count(ANIMAL_LABEL)
    }

    /// Counts per class label.
    pub fn as_map(&self) -> BTreeMap<String, u32> {
        self.seen
            .iter()
            .map(|(class, ids)| (class.clone(), ids.len() as u32))
            .collect()
    }
}
