//! PDF output for annotations.
//!
//! - [`appearance_stream`]: Form XObject builder used by appearance
//!   regeneration
//! - [`font_metrics`]: standard 14 font widths for text layout
//! - [`annotation_dict`]: annotation dictionary export and import
//!
//! PDF Spec: ISO 32000-1:2008, Sections 8.10 (Form XObjects) and 12.5
//! (Annotations)

pub mod annotation_dict;
pub mod appearance_stream;
pub mod font_metrics;

pub use annotation_dict::{format_pdf_date, parse_pdf_date, AnnotationEntry};
pub use appearance_stream::{AppearanceStream, AppearanceStreamBuilder};
