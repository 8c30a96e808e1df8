use image::RgbImage;

use crate::layout::element::{Detection, ExtractedRegion};

/// Working state for one page's processing pass.
///
/// The raster is exclusively owned by this context: the classifier redacts
/// boilerplate on it, the extractor crops from it and draws annotations on
/// it, and nothing aliases it across pages or components.
#[derive(Debug)]
pub struct PageContext {
    pub page_no: usize,
    pub width: u32,
    pub height: u32,
    pub raster: RgbImage,
    pub detections: Vec<Detection>,
}

impl PageContext {
    pub fn new(page_no: usize, raster: RgbImage, detections: Vec<Detection>) -> Self {
        let (width, height) = raster.dimensions();
        Self {
            page_no,
            width,
            height,
            raster,
            detections,
        }
    }
}

/// Immutable outcome of one page's pass.
///
/// `annotated_image` is `None` iff the page was classified blank; blank
/// pages also carry no regions.
#[derive(Clone, Debug, serde::Serialize)]
pub struct PageResult {
    pub page_no: usize,
    pub annotated_image: Option<String>,
    pub regions: Vec<ExtractedRegion>,
}

impl PageResult {
    pub fn blank(page_no: usize) -> Self {
        Self {
            page_no,
            annotated_image: None,
            regions: Vec::new(),
        }
    }
}
