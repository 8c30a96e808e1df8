use std::path::{Path, PathBuf};

use ab_glyph::PxScale;
use image::Rgb;
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    analysis::bbox::Bbox,
    consts::{ANNOTATION_BORDER, ANNOTATION_FONT_SCALE},
    error::{ImageWriteSnafu, PagecropError},
    layout::{
        element::{CandidateRegion, ExtractedRegion},
        page::{PageContext, PageResult},
    },
    parse::assembler::ExtractorConfig,
};

/// Crops final regions out of the page raster, persists them, and annotates
/// the page with visual provenance.
pub struct RegionExtractor<'a> {
    config: &'a ExtractorConfig,
}

impl<'a> RegionExtractor<'a> {
    pub fn new(config: &'a ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extracts every region from the page, in final-list order.
    ///
    /// Each region is cropped from the (already redacted) raster and saved
    /// as `{page_no}_{bbox_id}.png` under the image dir, then its rectangle
    /// and resolved path are drawn onto the page raster in the label's
    /// color. The annotated raster is persisted last as `{page_no}.png`.
    ///
    /// Any write failure is fatal for the page: the error propagates and no
    /// partial result is returned, so a caller never records an attachment
    /// that does not exist on disk.
    pub fn extract(
        &self,
        page: &mut PageContext,
        regions: Vec<CandidateRegion>,
    ) -> Result<PageResult, PagecropError> {
        let page_bounds = glam::Vec2::new(page.width as f32, page.height as f32);
        let mut extracted = Vec::with_capacity(regions.len());

        for (bbox_id, region) in regions.into_iter().enumerate() {
            let bbox = region.bbox.clamp(glam::Vec2::ZERO, page_bounds);

            let x = bbox.min.x as u32;
            let y = bbox.min.y as u32;
            let width = bbox.width() as u32;
            let height = bbox.height() as u32;
            if width == 0 || height == 0 {
                continue;
            }

            let crop = image::imageops::crop_imm(&page.raster, x, y, width, height).to_image();

            let crop_path = self
                .config
                .image_dir
                .join(format!("{}_{}.png", page.page_no, bbox_id));
            crop.save(&crop_path).context(ImageWriteSnafu {
                path: crop_path.to_string_lossy(),
            })?;

            let image_path = self.resolve_path(&crop_path);
            debug!(
                "page {} extracted {} region {} -> {}",
                page.page_no,
                region.label.name(),
                bbox_id,
                image_path
            );

            self.annotate(page, &bbox, region.label.color(), &image_path);

            extracted.push(ExtractedRegion {
                bbox_id,
                label: region.label,
                bbox,
                image_path,
            });
        }

        let page_path = self.config.image_dir.join(format!("{}.png", page.page_no));
        page.raster.save(&page_path).context(ImageWriteSnafu {
            path: page_path.to_string_lossy(),
        })?;

        Ok(PageResult {
            page_no: page.page_no,
            annotated_image: Some(self.resolve_path(&page_path)),
            regions: extracted,
        })
    }

    /// Draws the region rectangle and its path label onto the page raster.
    fn annotate(&self, page: &mut PageContext, bbox: &Bbox, color: [u8; 3], label: &str) {
        let x = bbox.min.x as i32;
        let y = bbox.min.y as i32;
        let width = bbox.width() as u32;
        let height = bbox.height() as u32;
        let color = Rgb(color);

        // Draw multiple rectangles to create thicker lines
        for offset in 0..ANNOTATION_BORDER {
            let thick_rect = Rect::at(x - offset, y - offset)
                .of_size(width + (offset * 2) as u32, height + (offset * 2) as u32);
            draw_hollow_rect_mut(&mut page.raster, thick_rect, color);
        }

        // Path text needs a font; annotation rectangles alone are still
        // drawn when none is configured.
        if let Some(font) = self.config.font.as_deref() {
            let text_x = x.max(5);
            let text_y = y.max(0);
            draw_text_mut(
                &mut page.raster,
                color,
                text_x,
                text_y,
                PxScale::from(ANNOTATION_FONT_SCALE),
                font,
                label,
            );
        }
    }

    /// Resolves an artifact path either relative to the work dir or as an
    /// absolute path, per config.
    fn resolve_path(&self, path: &Path) -> String {
        if self.config.relative_path
            && let Ok(rel) = path.strip_prefix(&self.config.work_dir)
        {
            return rel.to_string_lossy().to_string();
        }

        std::path::absolute(path)
            .unwrap_or_else(|_| PathBuf::from(path))
            .to_string_lossy()
            .to_string()
    }
}
