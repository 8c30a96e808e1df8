use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use ab_glyph::FontVec;
use derive_builder::{Builder, UninitializedFieldError};
use rayon::prelude::*;
use snafu::ResultExt;
use tracing::{debug, info};

use crate::{
    analysis::labels::LabelKind,
    consts::*,
    detector::LayoutDetector,
    error::{IoWriteSnafu, PagecropError},
    layout::page::{PageContext, PageResult},
    parse::{classify::RegionClassifier, extract::RegionExtractor, merge::merge_regions},
    sources::PageRaster,
};

/// Configuration for one extraction run.
///
/// Built through [`ExtractorConfigBuilder`]; thresholds outside `[0, 1]`
/// are rejected at build time.
#[derive(Clone, Builder)]
#[builder(build_fn(validate = "Self::validate", error = "PagecropError"))]
pub struct ExtractorConfig {
    #[builder(default = "CONFIDENCE_THRESHOLD")]
    pub confidence_threshold: f32,
    #[builder(default = "MERGE_THRESHOLD")]
    pub merge_threshold: f32,
    #[builder(default = "ASPECT_RATIO_LIMIT")]
    pub aspect_ratio_limit: f32,
    #[builder(default = "MIN_AREA_FRACTION")]
    pub min_area_fraction: f32,
    #[builder(default = "vec![LabelKind::Figure, LabelKind::Table]")]
    pub accepted_labels: Vec<LabelKind>,
    #[builder(
        default = "vec![LabelKind::PageHeader, LabelKind::PageFooter, LabelKind::Footnote]"
    )]
    pub ignore_labels: Vec<LabelKind>,
    /// Resolve artifact paths relative to `work_dir` instead of absolute.
    #[builder(default = "true")]
    pub relative_path: bool,
    #[builder(default = "PathBuf::from(\"./\")")]
    pub work_dir: PathBuf,
    #[builder(default = "PathBuf::from(\"./figures\")")]
    pub image_dir: PathBuf,
    /// Page index assigned to the first raster in the window.
    #[builder(default = "0")]
    pub start_page: usize,
    /// Font for path labels on annotated pages. Rectangles are drawn either
    /// way; text is skipped when no font is available.
    #[builder(default = "None")]
    pub font: Option<Arc<FontVec>>,
}

impl ExtractorConfigBuilder {
    fn validate(&self) -> Result<(), PagecropError> {
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("merge_threshold", self.merge_threshold),
        ] {
            if let Some(value) = value
                && !(0.0..=1.0).contains(&value)
            {
                return Err(PagecropError::Config {
                    name: name.to_string(),
                    message: format!("{value} is outside [0, 1]"),
                });
            }
        }
        Ok(())
    }
}

impl From<UninitializedFieldError> for PagecropError {
    fn from(err: UninitializedFieldError) -> Self {
        PagecropError::Config {
            name: err.field_name().to_string(),
            message: "field is not initialized".to_string(),
        }
    }
}

/// Aggregate outcome of one parse call.
#[derive(Debug, serde::Serialize)]
pub struct ParseResult {
    pub pages: Vec<PageResult>,
    /// Annotated-page filename -> extracted region paths. Blank pages have
    /// no entry.
    pub attachment_map: BTreeMap<String, Vec<String>>,
    /// Raw detector payload, passed through untouched.
    pub raw_predictions: serde_json::Value,
}

/// ParseResult projected into the shared parsed-data record consumed
/// downstream.
#[derive(Debug, serde::Serialize)]
pub struct ParsedData {
    pub text: String,
    pub images: Vec<String>,
    pub attached_images: Vec<String>,
    pub attached_images_map: BTreeMap<String, Vec<String>>,
    pub metadata: serde_json::Value,
}

impl ParseResult {
    pub fn into_parsed_data(self) -> ParsedData {
        let images = self
            .pages
            .iter()
            .filter_map(|page| page.annotated_image.clone())
            .collect();

        let attached_images = self
            .pages
            .iter()
            .flat_map(|page| page.regions.iter().map(|r| r.image_path.clone()))
            .collect();

        ParsedData {
            text: String::new(),
            images,
            attached_images,
            attached_images_map: self.attachment_map,
            metadata: serde_json::json!({
                "engine": "layout",
                "raw_predictions": self.raw_predictions,
            }),
        }
    }
}

/// Per-page orchestration and cross-page aggregation.
///
/// Pages are mutually independent (each owns its raster and writes
/// page-unique filenames), so they are processed on the rayon pool and
/// joined before the attachment map is assembled in page order.
pub struct PageAssembler {
    config: ExtractorConfig,
}

impl PageAssembler {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Runs the detector over the rasters and processes every page.
    ///
    /// Batches are aligned to rasters by the `name` field (filename stem),
    /// never by position. A count mismatch or an unresolved name aborts the
    /// whole parse, as does any page failure: an attachment map referencing
    /// files that were never written would corrupt downstream consumers.
    pub fn parse<D: LayoutDetector>(
        &self,
        rasters: Vec<PageRaster>,
        detector: &D,
    ) -> Result<ParseResult, PagecropError> {
        fs::create_dir_all(&self.config.image_dir).context(IoWriteSnafu {
            path: self.config.image_dir.to_string_lossy(),
        })?;

        info!("detecting layout for {} pages", rasters.len());
        let (batches, raw_predictions) = detector.detect(&rasters)?;

        if batches.len() != rasters.len() {
            return Err(PagecropError::DetectorMismatch {
                message: format!(
                    "expected {} batches, detector returned {}",
                    rasters.len(),
                    batches.len()
                ),
            });
        }

        let by_name: HashMap<&str, &crate::detector::DetectionBatch> =
            batches.iter().map(|batch| (batch.name.as_str(), batch)).collect();

        // Decode and align up front so detector problems surface before any
        // raster work starts.
        let mut contexts = Vec::with_capacity(rasters.len());
        for (idx, raster) in rasters.into_iter().enumerate() {
            let batch = by_name.get(raster.name.as_str()).ok_or_else(|| {
                PagecropError::DetectorMismatch {
                    message: format!("no detection batch named `{}`", raster.name),
                }
            })?;
            let detections = batch.decode()?;
            let page_no = self.config.start_page + idx;
            contexts.push(PageContext::new(page_no, raster.image, detections));
        }

        let pages = contexts
            .into_par_iter()
            .map(|mut page| self.process_page(&mut page))
            .collect::<Result<Vec<_>, _>>()?;

        let mut attachment_map = BTreeMap::new();
        for page in &pages {
            if page.annotated_image.is_some() {
                attachment_map.insert(
                    format!("{}.png", page.page_no),
                    page.regions.iter().map(|r| r.image_path.clone()).collect(),
                );
            }
        }

        info!(
            "parsed {} pages, {} with extractable regions",
            pages.len(),
            attachment_map.len()
        );

        Ok(ParseResult {
            pages,
            attachment_map,
            raw_predictions,
        })
    }

    fn process_page(&self, page: &mut PageContext) -> Result<PageResult, PagecropError> {
        let classifier = RegionClassifier::new(&self.config);
        let Some(candidates) = classifier.classify(page) else {
            info!("page {} is blank, no artifacts emitted", page.page_no);
            return Ok(PageResult::blank(page.page_no));
        };

        debug!(
            "page {}: {} candidates after classification",
            page.page_no,
            candidates.len()
        );

        let regions = merge_regions(candidates, self.config.merge_threshold)?;

        RegionExtractor::new(&self.config).extract(page, regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{DetectionBatch, RawDetection};
    use image::{Rgb, RgbImage};

    struct MockDetector {
        batches: Vec<DetectionBatch>,
    }

    impl LayoutDetector for MockDetector {
        fn detect(
            &self,
            _pages: &[PageRaster],
        ) -> Result<(Vec<DetectionBatch>, serde_json::Value), PagecropError> {
            Ok((self.batches.clone(), serde_json::json!({"mock": true})))
        }
    }

    fn raw(label: &str, confidence: f32, bbox: [f32; 4]) -> RawDetection {
        RawDetection {
            label: label.to_string(),
            confidence,
            bbox,
        }
    }

    fn textured_raster(name: &str) -> PageRaster {
        let mut image = RgbImage::from_pixel(1000, 1000, Rgb([255, 255, 255]));
        image.put_pixel(500, 500, Rgb([0, 0, 0]));
        PageRaster {
            name: name.to_string(),
            image,
        }
    }

    fn config_for(dir: &std::path::Path) -> ExtractorConfig {
        ExtractorConfigBuilder::default()
            .work_dir(dir.to_path_buf())
            .image_dir(dir.join("figures"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_config_rejects_out_of_range_threshold() {
        let err = ExtractorConfigBuilder::default()
            .confidence_threshold(1.5)
            .build();
        assert!(matches!(err, Err(PagecropError::Config { .. })));

        let err = ExtractorConfigBuilder::default()
            .merge_threshold(-0.1)
            .build();
        assert!(matches!(err, Err(PagecropError::Config { .. })));
    }

    #[test]
    fn test_overlapping_figures_merge_into_one_region() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = PageAssembler::new(config_for(dir.path()));

        let detector = MockDetector {
            batches: vec![DetectionBatch {
                name: "0".to_string(),
                bboxes: vec![
                    raw("Figure", 0.9, [100.0, 100.0, 500.0, 500.0]),
                    raw("Figure", 0.9, [300.0, 300.0, 600.0, 600.0]),
                ],
            }],
        };

        let result = assembler
            .parse(vec![textured_raster("0")], &detector)
            .unwrap();

        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].regions.len(), 1);
        let region = &result.pages[0].regions[0];
        assert_eq!(region.bbox.min, glam::Vec2::new(100.0, 100.0));
        assert_eq!(region.bbox.max, glam::Vec2::new(600.0, 600.0));
        assert!(dir.path().join("figures/0_0.png").exists());
        assert!(!dir.path().join("figures/0_1.png").exists());

        assert_eq!(
            result.attachment_map.get("0.png").unwrap(),
            &vec!["figures/0_0.png".to_string()]
        );
    }

    #[test]
    fn test_blank_page_emits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = PageAssembler::new(config_for(dir.path()));

        let blank = PageRaster {
            name: "0".to_string(),
            image: RgbImage::from_pixel(200, 200, Rgb([255, 255, 255])),
        };
        let detector = MockDetector {
            batches: vec![DetectionBatch {
                name: "0".to_string(),
                bboxes: vec![raw("Figure", 0.9, [10.0, 10.0, 150.0, 150.0])],
            }],
        };

        let result = assembler.parse(vec![blank], &detector).unwrap();

        assert_eq!(result.pages.len(), 1);
        assert!(result.pages[0].annotated_image.is_none());
        assert!(result.pages[0].regions.is_empty());
        assert!(result.attachment_map.is_empty());
        assert!(!dir.path().join("figures/0.png").exists());
    }

    #[test]
    fn test_batches_align_by_name_not_position() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = PageAssembler::new(config_for(dir.path()));

        // Detector returns batches in reverse order; page 1's figure must
        // still land on page 1.
        let detector = MockDetector {
            batches: vec![
                DetectionBatch {
                    name: "page-b".to_string(),
                    bboxes: vec![raw("Figure", 0.9, [100.0, 100.0, 500.0, 500.0])],
                },
                DetectionBatch {
                    name: "page-a".to_string(),
                    bboxes: vec![],
                },
            ],
        };

        let result = assembler
            .parse(
                vec![textured_raster("page-a"), textured_raster("page-b")],
                &detector,
            )
            .unwrap();

        assert!(result.pages[0].regions.is_empty());
        assert_eq!(result.pages[1].regions.len(), 1);
        assert!(dir.path().join("figures/1_0.png").exists());
    }

    #[test]
    fn test_batch_count_mismatch_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = PageAssembler::new(config_for(dir.path()));

        let detector = MockDetector { batches: vec![] };
        let err = assembler.parse(vec![textured_raster("0")], &detector);
        assert!(matches!(err, Err(PagecropError::DetectorMismatch { .. })));
    }

    #[test]
    fn test_unresolved_batch_name_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = PageAssembler::new(config_for(dir.path()));

        let detector = MockDetector {
            batches: vec![DetectionBatch {
                name: "other".to_string(),
                bboxes: vec![],
            }],
        };
        let err = assembler.parse(vec![textured_raster("0")], &detector);
        assert!(matches!(err, Err(PagecropError::DetectorMismatch { .. })));
    }

    #[test]
    fn test_start_page_offsets_filenames() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExtractorConfigBuilder::default()
            .work_dir(dir.path().to_path_buf())
            .image_dir(dir.path().join("figures"))
            .start_page(5)
            .build()
            .unwrap();
        let assembler = PageAssembler::new(config);

        let detector = MockDetector {
            batches: vec![DetectionBatch {
                name: "0".to_string(),
                bboxes: vec![raw("Table", 0.8, [100.0, 100.0, 500.0, 500.0])],
            }],
        };

        let result = assembler
            .parse(vec![textured_raster("0")], &detector)
            .unwrap();

        assert_eq!(result.pages[0].page_no, 5);
        assert!(dir.path().join("figures/5_0.png").exists());
        assert!(dir.path().join("figures/5.png").exists());
        assert!(result.attachment_map.contains_key("5.png"));
    }

    #[test]
    fn test_attachment_map_paths_exist_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = PageAssembler::new(config_for(dir.path()));

        let detector = MockDetector {
            batches: vec![DetectionBatch {
                name: "0".to_string(),
                bboxes: vec![
                    raw("Figure", 0.9, [50.0, 50.0, 400.0, 400.0]),
                    raw("Table", 0.7, [500.0, 500.0, 900.0, 900.0]),
                ],
            }],
        };

        let result = assembler
            .parse(vec![textured_raster("0")], &detector)
            .unwrap();

        for paths in result.attachment_map.values() {
            for path in paths {
                assert!(dir.path().join(path).exists(), "dangling path {path}");
            }
        }
    }

    #[test]
    fn test_parsed_data_projection() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = PageAssembler::new(config_for(dir.path()));

        let detector = MockDetector {
            batches: vec![DetectionBatch {
                name: "0".to_string(),
                bboxes: vec![raw("Figure", 0.9, [100.0, 100.0, 500.0, 500.0])],
            }],
        };

        let parsed = assembler
            .parse(vec![textured_raster("0")], &detector)
            .unwrap()
            .into_parsed_data();

        assert!(parsed.text.is_empty());
        assert_eq!(parsed.images, vec!["figures/0.png".to_string()]);
        assert_eq!(parsed.attached_images, vec!["figures/0_0.png".to_string()]);
        assert_eq!(parsed.metadata["engine"], "layout");
        assert_eq!(parsed.metadata["raw_predictions"]["mock"], true);
    }

    #[test]
    fn test_header_never_reaches_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = PageAssembler::new(config_for(dir.path()));

        let detector = MockDetector {
            batches: vec![DetectionBatch {
                name: "0".to_string(),
                bboxes: vec![raw("Page-header", 0.99, [0.0, 0.0, 1000.0, 100.0])],
            }],
        };

        let result = assembler
            .parse(vec![textured_raster("0")], &detector)
            .unwrap();

        assert!(result.pages[0].regions.is_empty());
        assert!(!dir.path().join("figures/0_0.png").exists());

        // The annotated page was redacted before it was written out
        let annotated = image::open(dir.path().join("figures/0.png"))
            .unwrap()
            .to_rgb8();
        assert_eq!(*annotated.get_pixel(500, 50), Rgb(REDACTION_FILL));
    }
}
