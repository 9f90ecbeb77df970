//! Annotation object model per PDF spec ISO 32000-1:2008, Section 12.5.
//!
//! A [`Page`] owns its annotations as an ordered arena of records. Callers
//! hold [`AnnotHandle`]s, which are plain `Copy` ids, and borrow a view from
//! the page to read or change an annotation:
//!
//! - [`Annot`] is a shared view with the property getters.
//! - [`AnnotMut`] is an exclusive view with the setters and the operations
//!   that change the annotation list (replies, popups, removal, redaction).
//!
//! Removing an annotation invalidates every handle to it; using such a
//! handle afterwards yields [`Error::InvalidatedHandle`].
//!
//! Setters only stage property values. No appearance stream is produced
//! until [`AnnotMut::reset_appearance_stream`] is called.
//!
//! # Example
//!
//! ```
//! use pdf_annot::annotation_types::{AnnotationKind, QuadPoints};
//! use pdf_annot::editor::Page;
//! use pdf_annot::geometry::{Point, Rect};
//!
//! let mut page = Page::new(Rect::new(0.0, 0.0, 612.0, 792.0));
//! let handle = page.add_annot(AnnotationKind::Highlight, Rect::default())?;
//!
//! let mut highlight = page.annot_mut(handle)?;
//! highlight.set_quad_points(vec![QuadPoints::new(
//!     Point::new(0.0, 100.0),
//!     Point::new(50.0, 100.0),
//!     Point::new(0.0, 90.0),
//!     Point::new(50.0, 90.0),
//! )])?;
//! assert!(highlight.reset_appearance_stream()?);
//! # Ok::<(), pdf_annot::error::Error>(())
//! ```

mod action;
mod appearance;
mod group;
mod kinds;
mod markup;
mod record;
mod replies;

pub use action::Action;
pub(crate) use appearance::{overlay_lines, REDACT_OVERLAY_DA};
pub use record::{AppearanceSet, AppearanceState, FieldInfo};
pub(crate) use record::{
    AnnotRecord, FileAttachmentData, KindPayload, LineData, MarkupData, NoteData, PopupData,
};

use crate::annotation_types::{
    AnnotationFlags, AnnotationKind, AppearanceMode, BorderInfo, Color, RichTextStyle,
};
use crate::editor::{Page, PageId};
use crate::error::{Error, Result};
use crate::geometry::{Matrix, Rect};
use crate::object::Dict;
use crate::writer::appearance_stream::AppearanceStream;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique annotation identifier (UUID-based).
///
/// Stable for the life of the annotation, independent of its position in
/// the page's annotation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotId(Uuid);

impl AnnotId {
    /// Generate a new unique annotation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnnotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cheap, copyable reference to an annotation on a specific page.
///
/// Copying a handle copies the reference, not the annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotHandle {
    page: PageId,
    id: AnnotId,
}

impl AnnotHandle {
    pub(crate) fn new(page: PageId, id: AnnotId) -> Self {
        Self { page, id }
    }

    /// The annotation's id.
    pub fn id(&self) -> AnnotId {
        self.id
    }

    /// The page that issued this handle.
    pub fn page_id(&self) -> PageId {
        self.page
    }
}

/// One run of rich text on a markup annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextRun {
    /// Text of the run
    pub text: String,
    /// Style of the run
    pub style: RichTextStyle,
}

impl RichTextRun {
    /// Create a run.
    pub fn new(text: impl Into<String>, style: RichTextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Shared view of one annotation.
#[derive(Debug, Clone, Copy)]
pub struct Annot<'p> {
    pub(crate) page: &'p Page,
    pub(crate) rec: &'p AnnotRecord,
}

impl<'p> Annot<'p> {
    pub(crate) fn new(page: &'p Page, rec: &'p AnnotRecord) -> Self {
        Self { page, rec }
    }

    /// Record holding the group-shared attributes: the group primary for
    /// subordinates, the annotation itself otherwise.
    pub(crate) fn shared(&self) -> &'p AnnotRecord {
        self.rec
            .group_header()
            .and_then(|header| self.page.annots.get(&header))
            .unwrap_or(self.rec)
    }

    pub(crate) fn handle_of(&self, id: AnnotId) -> AnnotHandle {
        AnnotHandle::new(self.page.id(), id)
    }

    /// Handle to this annotation.
    pub fn handle(&self) -> AnnotHandle {
        self.handle_of(self.rec.id)
    }

    /// Annotation id.
    pub fn id(&self) -> AnnotId {
        self.rec.id
    }

    /// Annotation kind.
    pub fn kind(&self) -> AnnotationKind {
        self.rec.kind
    }

    /// Check if this is a markup annotation.
    pub fn is_markup(&self) -> bool {
        self.rec.markup.is_some()
    }

    /// Position in the page's annotation list.
    pub fn index(&self) -> Option<usize> {
        self.page.annots.get_index_of(&self.rec.id)
    }

    /// Annotation rectangle in PDF user space.
    pub fn rect(&self) -> Rect {
        self.rec.rect
    }

    /// Annotation flags.
    pub fn flags(&self) -> AnnotationFlags {
        self.rec.flags
    }

    /// Text content. Group subordinates report the primary's content.
    pub fn content(&self) -> &'p str {
        &self.shared().content
    }

    /// Last modification date. Group subordinates report the primary's date.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.shared().modified
    }

    /// Unique name (`NM`).
    pub fn unique_id(&self) -> Option<&'p str> {
        self.rec.unique_id.as_deref()
    }

    /// Border, if one has been set or materialized by regeneration.
    pub fn border(&self) -> Option<&'p BorderInfo> {
        self.rec.border.as_ref()
    }

    /// Border (stroke) color. Group subordinates report the primary's color.
    pub fn border_color(&self) -> Option<Color> {
        self.shared().border_color
    }

    /// Where the annotation stands in the regeneration cycle.
    pub fn appearance_state(&self) -> AppearanceState {
        self.rec.state
    }

    /// Check if any appearance stream exists.
    pub fn has_appearance(&self) -> bool {
        self.rec.appearance.is_some()
    }

    /// The appearance stream for `mode`.
    pub fn appearance(&self, mode: AppearanceMode) -> Option<&'p AppearanceStream> {
        let set = self.rec.appearance.as_ref()?;
        match mode {
            AppearanceMode::Normal => Some(&set.normal),
            AppearanceMode::Rollover => set.rollover.as_ref(),
            AppearanceMode::Down => set.down.as_ref(),
        }
    }

    /// Identity of the appearance object.
    pub fn appearance_object_id(&self) -> Option<Uuid> {
        self.rec.appearance.as_ref().map(|set| set.object_id)
    }

    /// Matrix mapping the normal appearance's form space onto the device,
    /// through the annotation rectangle and the caller's page matrix.
    ///
    /// Returns `None` when the rectangle or appearance box is degenerate.
    pub fn display_matrix(&self, page_matrix: &Matrix) -> Option<Matrix> {
        let (bbox, form) = match &self.rec.appearance {
            Some(set) => (set.normal.bbox().unwrap_or(self.rec.rect), set.normal.matrix()),
            None => (self.rec.rect, Matrix::identity()),
        };
        let transformed = form.transform_rect(&bbox);
        let fit = Matrix::rect_to_rect(&transformed, &self.rec.rect)?;
        Some(form.multiply(&fit).multiply(page_matrix))
    }

    /// Annotation rectangle in device space.
    pub fn device_rect(&self, page_matrix: &Matrix) -> Rect {
        page_matrix.transform_rect(&self.rec.rect)
    }

    /// Source dictionary of an imported annotation.
    pub fn raw_dict(&self) -> Option<&'p Dict> {
        self.rec.raw.as_ref()
    }
}

/// Exclusive view of one annotation, borrowed from its page.
#[derive(Debug)]
pub struct AnnotMut<'p> {
    pub(crate) page: &'p mut Page,
    pub(crate) id: AnnotId,
}

impl<'p> AnnotMut<'p> {
    /// Callers guarantee `id` is on `page`.
    pub(crate) fn new(page: &'p mut Page, id: AnnotId) -> Self {
        Self { page, id }
    }

    pub(crate) fn rec(&self) -> &AnnotRecord {
        &self.page.annots[&self.id]
    }

    pub(crate) fn rec_mut(&mut self) -> &mut AnnotRecord {
        &mut self.page.annots[&self.id]
    }

    /// Apply `f` to the record and mark the appearance stale.
    pub(crate) fn update<T>(&mut self, f: impl FnOnce(&mut AnnotRecord) -> T) -> T {
        let rec = self.rec_mut();
        let out = f(&mut *rec);
        rec.touch();
        out
    }

    /// Mark every subordinate stale after a shared attribute changed on a
    /// group primary.
    pub(crate) fn touch_group(&mut self) {
        let members = self
            .rec()
            .markup
            .as_ref()
            .map(|m| m.group_members.clone())
            .unwrap_or_default();
        for member in members {
            if let Some(rec) = self.page.annots.get_mut(&member) {
                rec.touch();
            }
        }
    }

    /// Handle to this annotation.
    pub fn handle(&self) -> AnnotHandle {
        AnnotHandle::new(self.page.id(), self.id)
    }

    /// Shared view for the getters.
    pub fn view(&self) -> Annot<'_> {
        Annot::new(&*self.page, &self.page.annots[&self.id])
    }

    /// Annotation kind.
    pub fn kind(&self) -> AnnotationKind {
        self.rec().kind
    }

    /// Set the annotation rectangle. Geometry is not rescaled; use
    /// [`move_to`](Self::move_to) for that.
    pub fn set_rect(&mut self, rect: Rect) -> Result<()> {
        if !(rect.x.is_finite() && rect.y.is_finite()) || rect.width < 0.0 || rect.height < 0.0 {
            return Err(Error::InvalidParameter(format!("invalid rectangle {:?}", rect)));
        }
        if rect.is_degenerate() && self.kind().requires_rect() {
            return Err(Error::InvalidParameter(format!(
                "{:?} annotations need a non-degenerate rectangle",
                self.kind()
            )));
        }
        self.update(|rec| rec.rect = rect);
        Ok(())
    }

    /// Set the annotation flags.
    pub fn set_flags(&mut self, flags: AnnotationFlags) {
        self.update(|rec| rec.flags = flags);
    }

    /// Set the text content.
    pub fn set_content(&mut self, content: impl Into<String>) {
        let content = content.into();
        self.update(|rec| rec.content = content);
        self.touch_group();
    }

    /// Set the last modification date.
    pub fn set_modified(&mut self, date: DateTime<Utc>) {
        self.update(|rec| rec.modified = Some(date));
    }

    /// Set the unique name (`NM`).
    pub fn set_unique_id(&mut self, unique_id: impl Into<String>) {
        let unique_id = unique_id.into();
        self.update(|rec| rec.unique_id = Some(unique_id));
    }

    /// Set the border.
    pub fn set_border(&mut self, border: BorderInfo) -> Result<()> {
        if !border.is_valid() {
            return Err(Error::InvalidParameter(format!("invalid border {:?}", border)));
        }
        self.update(|rec| rec.border = Some(border));
        Ok(())
    }

    /// Set the border (stroke) color.
    pub fn set_border_color(&mut self, color: Color) {
        self.update(|rec| rec.border_color = Some(color));
        self.touch_group();
    }

    /// Move the annotation to `rect`, rescaling its geometry (quads, line
    /// points, vertexes, ink, callout points, inner rectangles).
    ///
    /// Redact, PagingSeal and PSInk annotations cannot be moved and return
    /// `Ok(false)`.
    pub fn move_to(&mut self, rect: Rect) -> Result<bool> {
        if rect.is_degenerate() {
            return Err(Error::InvalidParameter(format!("invalid target rectangle {:?}", rect)));
        }
        let kind = self.kind();
        if !kind.is_movable() {
            log::debug!("{:?} annotation {} cannot be moved", kind, self.id);
            return Ok(false);
        }
        let old = self.rec().rect;
        let transform = Matrix::rect_to_rect(&old, &rect)
            .unwrap_or_else(|| Matrix::translation(rect.x - old.x, rect.y - old.y));
        self.update(|rec| {
            rec.payload.transform(&transform);
            rec.rect = rect;
        });
        Ok(true)
    }

    /// Remove this annotation from its page, together with its popup,
    /// replies and state notes. Every handle to them becomes invalid.
    pub fn remove(self) -> Result<()> {
        self.page.remove_record_cascade(self.id);
        Ok(())
    }
}
