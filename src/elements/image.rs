//! Image elements.

use crate::geometry::Rect;

/// An image placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageContent {
    /// Bounding box where the image is placed
    pub bbox: Rect,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Encoded image data
    pub data: bytes::Bytes,
    /// Alternative text for accessibility
    pub alt_text: Option<String>,
}

impl ImageContent {
    /// Create a new image element.
    pub fn new(bbox: Rect, width: u32, height: u32, data: impl Into<bytes::Bytes>) -> Self {
        Self {
            bbox,
            width,
            height,
            data: data.into(),
            alt_text: None,
        }
    }

    /// Set alternative text for accessibility.
    pub fn with_alt_text(mut self, text: impl Into<String>) -> Self {
        self.alt_text = Some(text.into());
        self
    }

    /// Horizontal resolution implied by the placement, in dots per inch.
    pub fn horizontal_dpi(&self) -> Option<f32> {
        (self.bbox.width > 0.0).then(|| self.width as f32 / (self.bbox.width / 72.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dpi() {
        let img = ImageContent::new(Rect::new(0.0, 0.0, 72.0, 72.0), 300, 300, vec![0u8; 4]);
        assert_eq!(img.horizontal_dpi(), Some(300.0));
        let flat = ImageContent::new(Rect::default(), 1, 1, Vec::new());
        assert_eq!(flat.horizontal_dpi(), None);
    }
}
