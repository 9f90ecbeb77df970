//! Text run elements.

use crate::annotation_types::{Color, StandardFont};
use crate::geometry::Rect;

/// A run of text placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextContent {
    /// The text string
    pub text: String,
    /// Bounding box of the text
    pub bbox: Rect,
    /// Font
    pub font: StandardFont,
    /// Font size in points
    pub font_size: f32,
    /// Fill color
    pub color: Color,
}

impl TextContent {
    /// Create a new text run in 12pt black Helvetica.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_annot::elements::TextContent;
    /// use pdf_annot::geometry::Rect;
    ///
    /// let text = TextContent::new("Hello", Rect::new(72.0, 720.0, 30.0, 12.0));
    /// assert_eq!(text.font_size, 12.0);
    /// ```
    pub fn new(text: impl Into<String>, bbox: Rect) -> Self {
        Self {
            text: text.into(),
            bbox,
            font: StandardFont::Helvetica,
            font_size: 12.0,
            color: Color::BLACK,
        }
    }

    /// Set font and size.
    pub fn with_font(mut self, font: StandardFont, size: f32) -> Self {
        self.font = font;
        self.font_size = size;
        self
    }

    /// Set fill color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}
