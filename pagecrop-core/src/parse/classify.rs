use image::Rgb;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::debug;

use crate::{
    analysis::labels::LabelKind,
    consts::{FOOTER_BAND_FRACTION, HEADER_BAND_FRACTION, REDACTION_FILL},
    layout::{element::CandidateRegion, page::PageContext},
    parse::assembler::ExtractorConfig,
};

/// Per-detection filtering and boilerplate redaction for one page.
pub struct RegionClassifier<'a> {
    config: &'a ExtractorConfig,
}

impl<'a> RegionClassifier<'a> {
    pub fn new(config: &'a ExtractorConfig) -> Self {
        Self { config }
    }

    /// Filters the page's detections down to extraction candidates.
    ///
    /// Returns `None` when the raster is a single uniform color: blank pages
    /// produce no annotated image and no candidates at all. Otherwise
    /// boilerplate (headers in the top quarter, footers in the bottom
    /// quarter, footnotes) is painted over on the raster before anything is
    /// cropped from it, and the surviving detections come back as candidates
    /// in detector order.
    pub fn classify(&self, page: &mut PageContext) -> Option<Vec<CandidateRegion>> {
        if Self::is_blank(page) {
            debug!("page {} raster is uniform, skipping", page.page_no);
            return None;
        }

        let page_width = page.width as f32;
        let page_height = page.height as f32;
        let page_area = page_width * page_height;

        let detections = std::mem::take(&mut page.detections);
        let mut candidates = Vec::new();

        for detection in detections {
            // Boilerplate is masked out of the raster and never becomes a
            // candidate, so it cannot survive into crops or the annotated page.
            if self.config.ignore_labels.contains(&detection.label) {
                match detection.label {
                    LabelKind::PageHeader
                        if detection.bbox.max.y < page_height * HEADER_BAND_FRACTION =>
                    {
                        Self::redact(page, 0.0, 0.0, page_width, detection.bbox.max.y);
                        debug!("page {} redacted header band", page.page_no);
                        continue;
                    }
                    LabelKind::PageFooter
                        if detection.bbox.min.y > page_height * FOOTER_BAND_FRACTION =>
                    {
                        Self::redact(page, 0.0, detection.bbox.min.y, page_width, page_height);
                        debug!("page {} redacted footer band", page.page_no);
                        continue;
                    }
                    LabelKind::Footnote => {
                        Self::redact(
                            page,
                            detection.bbox.min.x,
                            detection.bbox.min.y,
                            detection.bbox.max.x,
                            detection.bbox.max.y,
                        );
                        debug!("page {} redacted footnote", page.page_no);
                        continue;
                    }
                    _ => {}
                }
            }

            let width = detection.bbox.width();
            let height = detection.bbox.height();

            let elongation = f32::max(height / width, width / height);
            if elongation > self.config.aspect_ratio_limit {
                debug!(
                    "page {} dropped {} bbox, elongation {:.2}",
                    page.page_no,
                    detection.label.name(),
                    elongation
                );
                continue;
            }

            if detection.bbox.area() < self.config.min_area_fraction * page_area {
                debug!(
                    "page {} dropped {} bbox, area below {:.0}% of page",
                    page.page_no,
                    detection.label.name(),
                    self.config.min_area_fraction * 100.0
                );
                continue;
            }

            if !self.config.accepted_labels.contains(&detection.label) {
                continue;
            }

            if detection.proba < self.config.confidence_threshold {
                debug!(
                    "page {} dropped {} bbox, confidence {:.2} below threshold",
                    page.page_no,
                    detection.label.name(),
                    detection.proba
                );
                continue;
            }

            candidates.push(CandidateRegion::from_detection(detection));
        }

        Some(candidates)
    }

    /// A page is blank when every raster pixel has the same color.
    fn is_blank(page: &PageContext) -> bool {
        let mut pixels = page.raster.pixels();
        match pixels.next() {
            Some(first) => pixels.all(|p| p == first),
            None => true,
        }
    }

    fn redact(page: &mut PageContext, x1: f32, y1: f32, x2: f32, y2: f32) {
        let x = x1.max(0.0) as i32;
        let y = y1.max(0.0) as i32;
        let width = (x2.min(page.width as f32) - x1.max(0.0)).max(0.0) as u32;
        let height = (y2.min(page.height as f32) - y1.max(0.0)).max(0.0) as u32;
        if width == 0 || height == 0 {
            return;
        }

        draw_filled_rect_mut(
            &mut page.raster,
            Rect::at(x, y).of_size(width, height),
            Rgb(REDACTION_FILL),
        );
    }
}
