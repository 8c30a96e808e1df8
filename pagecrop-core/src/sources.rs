use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use snafu::ResultExt;
use tracing::debug;

use crate::error::{ImageReadSnafu, IoReadSnafu, PagecropError};

/// One rasterized page, carrying the filename stem the detector keys its
/// batches by.
pub struct PageRaster {
    pub name: String,
    pub image: RgbImage,
}

/// External page-raster supplier.
///
/// `start_page` and `end_page` bound the inclusive page window; the
/// returned rasters are in page order.
pub trait PageRasterSource {
    fn load_pages(
        &self,
        start_page: usize,
        end_page: Option<usize>,
    ) -> Result<Vec<PageRaster>, PagecropError>;
}

/// Raster source over a directory of pre-rendered page images.
///
/// Files are taken in lexicographic order, one page per image. Anything
/// that is not a `.png`/`.jpg`/`.jpeg` file is skipped.
pub struct ImageDirSource {
    dir: PathBuf,
}

impl ImageDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn is_page_image(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
            .unwrap_or(false)
    }
}

impl PageRasterSource for ImageDirSource {
    fn load_pages(
        &self,
        start_page: usize,
        end_page: Option<usize>,
    ) -> Result<Vec<PageRaster>, PagecropError> {
        let mut paths = fs::read_dir(&self.dir)
            .context(IoReadSnafu {
                path: self.dir.to_string_lossy(),
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| Self::is_page_image(path))
            .collect::<Vec<_>>();
        paths.sort();

        let take = end_page
            .map(|end| end.saturating_sub(start_page) + 1)
            .unwrap_or(usize::MAX);

        paths
            .into_iter()
            .skip(start_page)
            .take(take)
            .map(|path| {
                debug!("loading page raster {}", path.display());

                let image = image::open(&path)
                    .context(ImageReadSnafu {
                        path: path.to_string_lossy(),
                    })?
                    .to_rgb8();

                let name = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
                    .unwrap_or_default();

                Ok(PageRaster { name, image })
            })
            .collect()
    }
}
