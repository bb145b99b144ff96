//! Raw per-frame detector output.

use serde::{Deserialize, Serialize};

use crate::bbox::BBox;

/// A single detection produced by the detector for one frame.
///
/// Consumed by the tracker within the same frame cycle; carries no identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDetection {
    /// Bounding box in pixel coordinates
    pub bbox: BBox,
    /// Semantic class label (e.g. "person", "animal")
    pub class_label: String,
    /// Detection confidence in [0, 1]
    pub confidence: f32,
}

impl RawDetection {
    pub fn new(bbox: BBox, class_label: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            class_label: class_label.into(),
            confidence,
        }
    }

    /// A detection is usable only if its box has positive dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.bbox.is_well_formed()
    }
}
