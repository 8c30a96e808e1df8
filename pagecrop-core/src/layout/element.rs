use serde::Serialize;

use crate::analysis::{bbox::Bbox, labels::LabelKind};

/// One labeled, confidence-scored bounding box emitted by the layout
/// detector for a single page. Never mutated after decoding.
#[derive(Clone, Copy, Serialize, Debug)]
pub struct Detection {
    pub label: LabelKind,
    pub proba: f32,
    pub bbox: Bbox,
}

/// A detection that survived classification and is eligible for merging.
///
/// Lives only within one page's pass. The merger replaces `bbox` with the
/// union box when a later candidate is folded in, and `sources` accumulates
/// every detection the region absorbed.
#[derive(Clone, Debug)]
pub struct CandidateRegion {
    pub label: LabelKind,
    pub bbox: Bbox,
    pub sources: Vec<Detection>,
}

impl CandidateRegion {
    pub fn from_detection(detection: Detection) -> Self {
        Self {
            label: detection.label,
            bbox: detection.bbox,
            sources: vec![detection],
        }
    }

    /// Folds another candidate into this region: the box grows to the union
    /// and the absorbed candidate's source detections are carried over.
    pub fn absorb(&mut self, other: CandidateRegion) {
        self.bbox = self.bbox.union(&other.bbox);
        self.sources.extend(other.sources);
    }
}

/// Final artifact reference for one extracted sub-image of a page.
#[derive(Clone, Serialize, Debug)]
pub struct ExtractedRegion {
    /// Region index within the page, assigned in final-list order from 0.
    pub bbox_id: usize,
    pub label: LabelKind,
    pub bbox: Bbox,
    /// Resolved path of the persisted crop, relative or absolute per config.
    pub image_path: String,
}
