use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use snafu::ResultExt;

use crate::{
    analysis::{bbox::Bbox, labels::LabelKind},
    error::{IoReadSnafu, JsonSnafu, PagecropError},
    layout::element::Detection,
    sources::PageRaster,
};

/// One raw prediction as the detector serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetection {
    pub label: String,
    pub confidence: f32,
    pub bbox: [f32; 4],
}

/// Detector output for one page.
///
/// `name` is the filename stem of the raster the batch belongs to; the
/// assembler aligns batches to rasters by this field, never by position,
/// since the detector's batch order is not guaranteed to match raster order.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionBatch {
    pub name: String,
    pub bboxes: Vec<RawDetection>,
}

impl DetectionBatch {
    /// Decodes the raw predictions into validated [`Detection`]s.
    ///
    /// Label names and box coordinates are checked here, so malformed
    /// detector output fails before any raster work starts.
    pub fn decode(&self) -> Result<Vec<Detection>, PagecropError> {
        self.bboxes
            .iter()
            .map(|raw| {
                let label = LabelKind::from_name(&raw.label)?;
                let bbox = Bbox::from_coords(raw.bbox);
                bbox.validate()?;
                Ok(Detection {
                    label,
                    proba: raw.confidence,
                    bbox,
                })
            })
            .collect()
    }
}

/// External layout detector capability.
///
/// Implementations return one batch per input raster (in any order) along
/// with the raw prediction payload, which the assembler passes through as
/// opaque metadata.
pub trait LayoutDetector {
    fn detect(
        &self,
        pages: &[PageRaster],
    ) -> Result<(Vec<DetectionBatch>, serde_json::Value), PagecropError>;
}

/// Detector backed by a pre-computed predictions JSON file.
///
/// The file holds an array of [`DetectionBatch`] objects, one per page, as
/// produced by an external layout model run. This is the detector the CLI
/// injects; tests use it with hand-written payloads.
pub struct PredictionsFileDetector {
    path: PathBuf,
}

impl PredictionsFileDetector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LayoutDetector for PredictionsFileDetector {
    fn detect(
        &self,
        _pages: &[PageRaster],
    ) -> Result<(Vec<DetectionBatch>, serde_json::Value), PagecropError> {
        let payload = fs::read_to_string(&self.path).context(IoReadSnafu {
            path: self.path.to_string_lossy(),
        })?;

        let raw: serde_json::Value = serde_json::from_str(&payload).context(JsonSnafu)?;
        let batches: Vec<DetectionBatch> =
            serde_json::from_value(raw.clone()).context(JsonSnafu)?;

        Ok((batches, raw))
    }
}
