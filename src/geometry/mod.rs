//! Geometric primitives in PDF user space.
//!
//! Coordinates follow the PDF convention: the origin is at the bottom-left of
//! the page and y grows upwards. A [`Rect`] is stored as its lower-left corner
//! plus a size.

use serde::{Deserialize, Serialize};

/// A 2D point in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_annot::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of the lower-left corner
    pub x: f32,
    /// Y coordinate of the lower-left corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_annot::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points, in any order.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_annot::geometry::Rect;
    ///
    /// let rect = Rect::from_points(100.0, 50.0, 0.0, 0.0);
    /// assert_eq!(rect.x, 0.0);
    /// assert_eq!(rect.width, 100.0);
    /// ```
    pub fn from_points(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        let left = x0.min(x1);
        let bottom = y0.min(y1);
        Self {
            x: left,
            y: bottom,
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// Smallest rectangle enclosing all points, or `None` for an empty slice.
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        Some(Self::from_points(x0, y0, x1, y1))
    }

    /// Get the left edge.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Get the right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Get the top edge.
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Get the bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y
    }

    /// Get the center point.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// A rectangle is degenerate when it has no area.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_annot::geometry::Rect;
    ///
    /// assert!(Rect::new(10.0, 10.0, 0.0, 5.0).is_degenerate());
    /// assert!(!Rect::new(10.0, 10.0, 1.0, 5.0).is_degenerate());
    /// ```
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0) || !self.width.is_finite() || !self.height.is_finite()
    }

    /// Check if this rectangle intersects with another.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.bottom() < other.top()
            && self.top() > other.bottom()
    }

    /// Overlapping area of two rectangles, if any.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect::from_points(
            self.left().max(other.left()),
            self.bottom().max(other.bottom()),
            self.right().min(other.right()),
            self.top().min(other.top()),
        ))
    }

    /// Check if a point is inside this rectangle (edges included).
    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.bottom() && p.y <= self.top()
    }

    /// Check if another rectangle lies entirely inside this one.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.bottom() >= self.bottom()
            && other.top() <= self.top()
    }

    /// Smallest rectangle containing both rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_points(
            self.left().min(other.left()),
            self.bottom().min(other.bottom()),
            self.right().max(other.right()),
            self.top().max(other.top()),
        )
    }

    /// Area of the rectangle.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Grow (or shrink, for negative values) the rectangle on every side.
    pub fn inflate(&self, amount: f32) -> Rect {
        Rect::new(
            self.x - amount,
            self.y - amount,
            (self.width + 2.0 * amount).max(0.0),
            (self.height + 2.0 * amount).max(0.0),
        )
    }

    /// PDF rectangle array `[llx lly urx ury]`.
    pub fn to_array(&self) -> [f32; 4] {
        [self.left(), self.bottom(), self.right(), self.top()]
    }

    /// Build a rectangle from a PDF rectangle array.
    pub fn from_array(arr: [f32; 4]) -> Self {
        Self::from_points(arr[0], arr[1], arr[2], arr[3])
    }
}

/// A 2D affine transformation matrix `[a b c d e f]`.
///
/// ```text
/// [ a  b  0 ]
/// [ c  d  0 ]
/// [ e  f  1 ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    /// Horizontal scaling component
    pub a: f32,
    /// Rotation/skew component
    pub b: f32,
    /// Rotation/skew component
    pub c: f32,
    /// Vertical scaling component
    pub d: f32,
    /// Horizontal translation
    pub e: f32,
    /// Vertical translation
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    /// Create a matrix from its six components.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// The identity matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_annot::geometry::Matrix;
    ///
    /// let m = Matrix::identity();
    /// assert_eq!(m.a, 1.0);
    /// assert_eq!(m.e, 0.0);
    /// ```
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// A translation matrix.
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// A scaling matrix.
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A counter-clockwise rotation by `degrees`.
    pub fn rotation(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// The matrix that maps `from` onto `to`, stretching as needed.
    ///
    /// Returns `None` when `from` is degenerate.
    pub fn rect_to_rect(from: &Rect, to: &Rect) -> Option<Self> {
        if from.is_degenerate() {
            return None;
        }
        let sx = to.width / from.width;
        let sy = to.height / from.height;
        Some(Self::new(sx, 0.0, 0.0, sy, to.x - from.x * sx, to.y - from.y * sy))
    }

    /// Multiply this matrix with another.
    ///
    /// The result applies `self` first, then `other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Transform a point.
    pub fn transform_point(&self, p: Point) -> Point {
        Point::new(self.a * p.x + self.c * p.y + self.e, self.b * p.x + self.d * p.y + self.f)
    }

    /// Transform a rectangle and return the bounding box of the result.
    pub fn transform_rect(&self, r: &Rect) -> Rect {
        let corners = [
            self.transform_point(Point::new(r.left(), r.bottom())),
            self.transform_point(Point::new(r.right(), r.bottom())),
            self.transform_point(Point::new(r.left(), r.top())),
            self.transform_point(Point::new(r.right(), r.top())),
        ];
        Rect::bounding(&corners).unwrap_or(*r)
    }

    /// Inverse matrix, or `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Matrix::new(a, b, c, d, -(self.e * a + self.f * c), -(self.e * b + self.f * d)))
    }

    /// Components as an array, in PDF order.
    pub fn to_array(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

/// Calculate Euclidean distance between two points.
pub fn euclidean_distance(p1: &Point, p2: &Point) -> f32 {
    ((p2.x - p1.x).powi(2) + (p2.y - p1.y).powi(2)).sqrt()
}
