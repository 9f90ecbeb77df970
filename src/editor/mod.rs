//! Page-level editing: the annotation list and redaction.
//!
//! A [`Page`] owns its annotations and its content elements. Annotations
//! are reached through [`AnnotHandle`](crate::annotations::AnnotHandle)s
//! issued by the page:
//!
//! ```
//! use pdf_annot::annotation_types::AnnotationKind;
//! use pdf_annot::editor::Page;
//! use pdf_annot::elements::TextContent;
//! use pdf_annot::geometry::Rect;
//!
//! let mut page = Page::new(Rect::new(0.0, 0.0, 612.0, 792.0));
//! let secret = page.add_element(TextContent::new("secret", Rect::new(72.0, 700.0, 40.0, 12.0)));
//!
//! let redact = page.mark_redact_area(&[Rect::new(70.0, 698.0, 50.0, 16.0)])?;
//! assert!(page.annot_mut(redact)?.apply_redaction()?);
//! assert!(page.element(secret).is_none());
//! assert_eq!(page.annot_count(), 0);
//! # Ok::<(), pdf_annot::error::Error>(())
//! ```

mod page;
mod redaction;

pub use page::{ElementId, Page, PageId};
pub use redaction::covered_fraction;
