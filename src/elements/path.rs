//! Vector path elements.

use crate::annotation_types::Color;
use crate::geometry::Rect;

/// Vector path content placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PathContent {
    /// Bounding box of the path
    pub bbox: Rect,
    /// Path operations
    pub operations: Vec<PathOperation>,
    /// Stroke color (None for no stroke)
    pub stroke_color: Option<Color>,
    /// Fill color (None for no fill)
    pub fill_color: Option<Color>,
    /// Stroke width in points
    pub stroke_width: f32,
}

impl PathContent {
    /// Create a path from operations, stroked in black.
    pub fn from_operations(operations: Vec<PathOperation>) -> Self {
        let bbox = Self::compute_bbox(&operations);
        Self {
            bbox,
            operations,
            stroke_color: Some(Color::BLACK),
            fill_color: None,
            stroke_width: 1.0,
        }
    }

    /// Create a line path from (x1, y1) to (x2, y2).
    pub fn line(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::from_operations(vec![PathOperation::MoveTo(x1, y1), PathOperation::LineTo(x2, y2)])
    }

    /// Create a rectangle path.
    pub fn rect(rect: &Rect) -> Self {
        Self::from_operations(vec![PathOperation::Rectangle(
            rect.x,
            rect.y,
            rect.width,
            rect.height,
        )])
    }

    /// A rectangle filled with `color` and no stroke.
    pub fn filled_rect(rect: &Rect, color: Color) -> Self {
        Self::rect(rect).with_fill(color).without_stroke()
    }

    /// Set stroke color.
    pub fn with_stroke(mut self, color: Color) -> Self {
        self.stroke_color = Some(color);
        self
    }

    /// Remove the stroke.
    pub fn without_stroke(mut self) -> Self {
        self.stroke_color = None;
        self
    }

    /// Set fill color.
    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    /// Set stroke width.
    pub fn with_stroke_width(mut self, width: f32) -> Self {
        self.stroke_width = width;
        self
    }

    /// Check if this path has a fill.
    pub fn has_fill(&self) -> bool {
        self.fill_color.is_some()
    }

    fn compute_bbox(operations: &[PathOperation]) -> Rect {
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        let mut include = |x: f32, y: f32| {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        };

        for op in operations {
            match *op {
                PathOperation::MoveTo(x, y) | PathOperation::LineTo(x, y) => include(x, y),
                PathOperation::CurveTo(x1, y1, x2, y2, x3, y3) => {
                    include(x1, y1);
                    include(x2, y2);
                    include(x3, y3);
                },
                PathOperation::Rectangle(x, y, w, h) => {
                    include(x, y);
                    include(x + w, y + h);
                },
                PathOperation::ClosePath => {},
            }
        }

        if min_x == f32::MAX {
            Rect::default()
        } else {
            Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
        }
    }
}

/// A single path operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOperation {
    /// Move to a point (m operator)
    MoveTo(f32, f32),
    /// Line to a point (l operator)
    LineTo(f32, f32),
    /// Bezier curve (c operator): control1, control2, end
    CurveTo(f32, f32, f32, f32, f32, f32),
    /// Rectangle (re operator): x, y, width, height
    Rectangle(f32, f32, f32, f32),
    /// Close the current path (h operator)
    ClosePath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_bbox() {
        let line = PathContent::line(10.0, 20.0, 110.0, 5.0);
        assert_eq!(line.bbox, Rect::new(10.0, 5.0, 100.0, 15.0));
        assert_eq!(line.stroke_color, Some(Color::BLACK));
    }

    #[test]
    fn test_filled_rect() {
        let r = Rect::new(0.0, 0.0, 20.0, 10.0);
        let path = PathContent::filled_rect(&r, Color::BLACK);
        assert_eq!(path.bbox, r);
        assert!(path.has_fill());
        assert!(path.stroke_color.is_none());
    }

    #[test]
    fn test_empty_bbox() {
        let path = PathContent::from_operations(vec![PathOperation::ClosePath]);
        assert_eq!(path.bbox, Rect::default());
    }
}
