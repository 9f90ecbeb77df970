// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::should_implement_trait)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # PDF Annot
//!
//! PDF annotation object model in Rust, per ISO 32000-1:2008 Section 12.5.
//!
//! ## Core Features
//!
//! - **29 annotation kinds**: markup (notes, text markup, shapes, lines,
//!   ink, free text, stamps, redactions, ...) and non-markup (links,
//!   screens, widgets, popups)
//! - **Lazy appearance regeneration**: setters stage properties; one call
//!   regenerates the Normal/Rollover/Down appearance streams
//! - **Markup protocols**: popups, reply chains, `Marked`/`Review` state
//!   notes, annotation groups with shared attributes
//! - **Redaction apply**: permanent removal of page content under a
//!   redaction, with fill and overlay text
//! - **Dictionary I/O**: export to and import from ISO 32000 annotation
//!   dictionaries
//!
//! ## Architecture
//!
//! A [`Page`](editor::Page) owns an ordered arena of annotation records.
//! Callers hold `Copy` [`AnnotHandle`](annotations::AnnotHandle)s and
//! borrow [`Annot`](annotations::Annot) (read) or
//! [`AnnotMut`](annotations::AnnotMut) (write) views from the page. Removing
//! an annotation invalidates its handles; using one afterwards is an error,
//! never undefined behavior.
//!
//! ## Quick Start
//!
//! ```
//! use pdf_annot::annotation_types::{AnnotationKind, AnnotState, StateModel};
//! use pdf_annot::editor::Page;
//! use pdf_annot::geometry::{Point, Rect};
//!
//! let mut page = Page::new(Rect::new(0.0, 0.0, 612.0, 792.0));
//! let line = page.add_annot(AnnotationKind::Line, Rect::default())?;
//!
//! let mut annot = page.annot_mut(line)?;
//! // Lines need both end points before an appearance can be generated.
//! assert!(!annot.reset_appearance_stream()?);
//! annot.set_start_point(Point::new(100.0, 100.0))?;
//! annot.set_end_point(Point::new(300.0, 150.0))?;
//! assert!(annot.reset_appearance_stream()?);
//!
//! let review = annot.add_state_annot("Alice", StateModel::Review, AnnotState::Accepted)?;
//! assert!(page.annot(review)?.is_state_annot());
//! # Ok::<(), pdf_annot::error::Error>(())
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Value types
pub mod geometry;
pub mod object;
/// Core annotation types and enums per PDF spec
pub mod annotation_types;

// Page content
/// Content elements consumed and produced by redaction
pub mod elements;

// Annotation model
pub mod annotations;

// Appearance streams and dictionary I/O
pub mod writer;

// Pages and redaction
pub mod editor;

// Re-exports
pub use annotation_types::{AnnotationFlags, AnnotationKind, Color};
pub use annotations::{Annot, AnnotHandle, AnnotId, AnnotMut};
pub use config::{AnnotConfig, RedactionCoverage};
pub use editor::Page;
pub use error::{Error, Result};

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Compare two floats, ordering NaN after every number.
    #[inline]
    pub fn safe_float_cmp(a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }

}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with("0."));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "pdf_annot");
    }
}
