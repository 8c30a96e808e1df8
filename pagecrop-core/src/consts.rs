/// Minimum confidence for accepting a detection as extractable content.
///
/// Detections below this score are treated as noise. The value 0.5 keeps
/// only detections the layout model is reasonably sure about; lower values
/// admit more regions at the cost of false positives.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Overlap percentage above which two regions are merged into one.
///
/// Overlap is IoU-style but saturates to 1.0 under full containment, so a
/// small figure detected inside a larger one always merges. 0.1 is
/// deliberately lenient: split detections of one figure usually overlap
/// only along a thin strip.
pub const MERGE_THRESHOLD: f32 = 0.1;

/// Maximum allowed elongation (`max(h/w, w/h)`) for an extractable region.
///
/// Sheer strips are almost always rules, separators or decorations rather
/// than figures or tables.
pub const ASPECT_RATIO_LIMIT: f32 = 5.0;

/// Minimum region area as a fraction of the page area.
///
/// Regions smaller than 3% of the page are too small to carry content worth
/// extracting as standalone images (bullets, inline icons, stray marks).
pub const MIN_AREA_FRACTION: f32 = 0.03;

/// Fraction of the page height that bounds the header band.
///
/// A `PageHeader` detection is only redacted when it sits entirely within
/// the top quarter of the page.
pub const HEADER_BAND_FRACTION: f32 = 0.25;

/// Fraction of the page height above which the footer band begins.
///
/// A `PageFooter` detection is only redacted when it starts below the top
/// three quarters of the page.
pub const FOOTER_BAND_FRACTION: f32 = 0.75;

/// Fill color used when redacting boilerplate regions out of the raster.
///
/// White matches the typical page background so redacted bands read as
/// empty margin in the annotated output.
pub const REDACTION_FILL: [u8; 3] = [255, 255, 255];

/// Border thickness, in pixels, of the annotation rectangles.
pub const ANNOTATION_BORDER: i32 = 3;

/// Font scale for the path labels drawn on annotated pages.
pub const ANNOTATION_FONT_SCALE: f32 = 16.0;

/// Well-known system font locations tried when no font path is configured.
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
    "C:\\Windows\\Fonts\\arial.ttf",
];
