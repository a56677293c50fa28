//! Geometric primitives for layout analysis.
//!
//! Page coordinates have their origin at the top-left corner of the page,
//! with y growing downwards. Backends convert from PDF user space (origin at
//! the bottom-left) before handing runs to the layout code.

use serde::Serialize;
use std::cmp::Ordering;

/// An axis-aligned bounding box given by two corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BBox {
    /// Create a box from two corners, normalizing so that `x0 <= x1` and `y0 <= y1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_reflow::geometry::BBox;
    ///
    /// let bbox = BBox::new(110.0, 70.0, 10.0, 20.0);
    /// assert_eq!(bbox.x0, 10.0);
    /// assert_eq!(bbox.y1, 70.0);
    /// assert_eq!(bbox.width(), 100.0);
    /// ```
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Width of the box.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Height of the box.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Horizontal midpoint.
    pub fn mid_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    /// Vertical midpoint.
    pub fn mid_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    /// Area of the box.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Whether the box extends strictly past `x` on both sides.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_reflow::geometry::BBox;
    ///
    /// let title = BBox::new(50.0, 10.0, 550.0, 30.0);
    /// assert!(title.straddles_x(300.0));
    /// assert!(!title.straddles_x(50.0));
    /// ```
    pub fn straddles_x(&self, x: f32) -> bool {
        self.x0 < x && self.x1 > x
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Clip this box to `[0, width] x [0, height]`.
    pub fn clip_to(&self, width: f32, height: f32) -> BBox {
        BBox {
            x0: self.x0.clamp(0.0, width),
            y0: self.y0.clamp(0.0, height),
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
        }
    }
}

/// Compare two floats with a total order: NaN sorts after every number.
#[inline]
pub fn cmp_f32(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}
