use crate::error::PagecropError;

/// A 2D axis-aligned bounding box in page-pixel coordinates.
///
/// `min` is the top-left corner and `max` the bottom-right corner (image
/// coordinates, y grows downward). A well-formed box satisfies
/// `min.x < max.x && min.y < max.y`; detector output is not trusted to
/// uphold this, so operations that depend on it validate first.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Bbox {
    /// Top-left corner.
    pub min: glam::Vec2,
    /// Bottom-right corner.
    pub max: glam::Vec2,
}

impl Bbox {
    /// Creates a new bounding box from corner points.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use pagecrop_core::analysis::bbox::Bbox;
    /// let bbox = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 5.0));
    /// ```
    pub fn new(min: glam::Vec2, max: glam::Vec2) -> Self {
        Self { min, max }
    }

    /// Creates a bounding box from `[x1, y1, x2, y2]` detector coordinates.
    pub fn from_coords(coords: [f32; 4]) -> Self {
        Self {
            min: glam::Vec2::new(coords[0], coords[1]),
            max: glam::Vec2::new(coords[2], coords[3]),
        }
    }

    /// Checks the `min < max` invariant on both axes.
    ///
    /// Malformed boxes fail fast; no coordinate repair is attempted.
    pub fn validate(&self) -> Result<(), PagecropError> {
        if self.min.x < self.max.x && self.min.y < self.max.y {
            Ok(())
        } else {
            Err(PagecropError::Geometry {
                x1: self.min.x,
                y1: self.min.y,
                x2: self.max.x,
                y2: self.max.y,
            })
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Calculates the area of the bounding box (width × height).
    pub fn area(&self) -> f32 {
        let length = self.max - self.min;

        length.x * length.y
    }

    /// Calculates the area of intersection with another box.
    ///
    /// Returns 0.0 when the boxes are disjoint or touch only along an edge.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use pagecrop_core::analysis::bbox::Bbox;
    /// let a = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 4.0));
    /// let b = Bbox::new(Vec2::new(2.0, 2.0), Vec2::new(6.0, 6.0));
    /// assert_eq!(a.intersection(&b), 4.0);
    /// ```
    pub fn intersection(&self, other: &Self) -> f32 {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);

        if max.x > min.x && max.y > min.y {
            (max.x - min.x) * (max.y - min.y)
        } else {
            0.
        }
    }

    /// Checks if this bounding box completely contains another.
    ///
    /// Boundary contact counts as containment.
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    /// Creates the smallest box that encloses both this box and another.
    ///
    /// Symmetric, and idempotent (`a.union(&a) == a`). Used to merge
    /// overlapping detections into a single region.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use pagecrop_core::analysis::bbox::Bbox;
    /// let a = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(5.0, 5.0));
    /// let b = Bbox::new(Vec2::new(3.0, 3.0), Vec2::new(8.0, 8.0));
    /// let union = a.union(&b);
    /// assert_eq!(union.min, Vec2::new(0.0, 0.0));
    /// assert_eq!(union.max, Vec2::new(8.0, 8.0));
    /// ```
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Clamps the box to stay within the given bounds.
    ///
    /// Used to constrain detector output to the page raster before cropping.
    pub fn clamp(&self, min_bounds: glam::Vec2, max_bounds: glam::Vec2) -> Self {
        Self {
            min: self.min.max(min_bounds),
            max: self.max.min(max_bounds),
        }
    }

    /// Calculates the overlap percentage between this box and another.
    ///
    /// Saturates to 1.0 when either box fully contains the other, otherwise
    /// falls back to Intersection over Union:
    /// `intersection / (areaA + areaB - intersection)`, 0.0 when disjoint.
    /// Symmetric in its arguments.
    ///
    /// Containment saturation makes the measure robust to a small detection
    /// sitting inside a much larger one, where plain IoU would stay near
    /// zero and the pair would never merge.
    ///
    /// Fails with [`PagecropError::Geometry`] if either box is malformed.
    ///
    /// # Example
    /// ```
    /// use glam::Vec2;
    /// use pagecrop_core::analysis::bbox::Bbox;
    /// let outer = Bbox::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0));
    /// let inner = Bbox::new(Vec2::new(10.0, 10.0), Vec2::new(30.0, 30.0));
    /// assert_eq!(outer.overlap_percentage(&inner).unwrap(), 1.0);
    /// ```
    pub fn overlap_percentage(&self, other: &Self) -> Result<f32, PagecropError> {
        self.validate()?;
        other.validate()?;

        if self.contains(other) || other.contains(self) {
            return Ok(1.0);
        }

        let intersection_area = self.intersection(other);
        let union_area = self.area() + other.area() - intersection_area;

        if union_area > 0.0 {
            Ok(intersection_area / union_area)
        } else {
            Ok(0.0)
        }
    }
}
