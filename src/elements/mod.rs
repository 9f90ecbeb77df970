//! Page content elements.
//!
//! A page's content is modelled as a list of text runs, images and vector
//! paths, each with a bounding box. Redaction removes elements from this list
//! and adds fill paths and overlay text to it.

mod image;
mod path;
mod text;

pub use image::ImageContent;
pub use path::{PathContent, PathOperation};
pub use text::TextContent;

use crate::geometry::Rect;

/// A content element on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentElement {
    /// Text run
    Text(TextContent),
    /// Image
    Image(ImageContent),
    /// Vector path
    Path(PathContent),
}

impl ContentElement {
    /// Get the bounding box of this element.
    pub fn bbox(&self) -> Rect {
        match self {
            ContentElement::Text(t) => t.bbox,
            ContentElement::Image(i) => i.bbox,
            ContentElement::Path(p) => p.bbox,
        }
    }

    /// Check if this is a text element.
    pub fn is_text(&self) -> bool {
        matches!(self, ContentElement::Text(_))
    }

    /// Check if this is an image element.
    pub fn is_image(&self) -> bool {
        matches!(self, ContentElement::Image(_))
    }

    /// Check if this is a path element.
    pub fn is_path(&self) -> bool {
        matches!(self, ContentElement::Path(_))
    }

    /// Get as text, if this is a text element.
    pub fn as_text(&self) -> Option<&TextContent> {
        match self {
            ContentElement::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Get as path, if this is a path element.
    pub fn as_path(&self) -> Option<&PathContent> {
        match self {
            ContentElement::Path(p) => Some(p),
            _ => None,
        }
    }
}

impl From<TextContent> for ContentElement {
    fn from(t: TextContent) -> Self {
        ContentElement::Text(t)
    }
}

impl From<ImageContent> for ContentElement {
    fn from(i: ImageContent) -> Self {
        ContentElement::Image(i)
    }
}

impl From<PathContent> for ContentElement {
    fn from(p: PathContent) -> Self {
        ContentElement::Path(p)
    }
}
