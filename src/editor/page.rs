//! Page: the owner of an ordered annotation list and of the content
//! elements redaction works on.

use crate::annotation_types::{AnnotationKind, QuadPoints};
use crate::annotations::{Annot, AnnotHandle, AnnotId, AnnotMut, AnnotRecord, KindPayload};
use crate::config::AnnotConfig;
use crate::elements::ContentElement;
use crate::error::{Error, Result};
use crate::geometry::Rect;
use chrono::Utc;
use indexmap::IndexMap;
use uuid::Uuid;

/// Unique page identifier (UUID-based).
///
/// Every handle remembers the page that issued it, so a handle from one page
/// is rejected by another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId(Uuid);

impl PageId {
    /// Generate a new unique page ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique content element identifier (UUID-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Generate a new unique element ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

/// A page with its annotation list and content elements.
///
/// The page owns every annotation record. Handles are plain ids; a handle
/// outlives the annotation it names and reports
/// [`Error::InvalidatedHandle`] once the annotation is gone.
#[derive(Debug)]
pub struct Page {
    id: PageId,
    media_box: Rect,
    config: AnnotConfig,
    pub(crate) annots: IndexMap<AnnotId, AnnotRecord>,
    pub(crate) elements: IndexMap<ElementId, ContentElement>,
}

impl Page {
    /// Create an empty page with the default configuration.
    pub fn new(media_box: Rect) -> Self {
        Self::with_config(media_box, AnnotConfig::default())
    }

    /// Create an empty page with `config`.
    pub fn with_config(media_box: Rect, config: AnnotConfig) -> Self {
        Self {
            id: PageId::new(),
            media_box,
            config,
            annots: IndexMap::new(),
            elements: IndexMap::new(),
        }
    }

    /// Page identifier.
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Page media box.
    pub fn media_box(&self) -> Rect {
        self.media_box
    }

    /// Editing configuration.
    pub fn config(&self) -> &AnnotConfig {
        &self.config
    }

    // === Content elements ===

    /// Add a content element. Returns its id.
    pub fn add_element(&mut self, element: impl Into<ContentElement>) -> ElementId {
        let id = ElementId::new();
        self.elements.insert(id, element.into());
        id
    }

    /// Look up a content element.
    pub fn element(&self, id: ElementId) -> Option<&ContentElement> {
        self.elements.get(&id)
    }

    /// Content elements in paint order.
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &ContentElement)> + '_ {
        self.elements.iter().map(|(id, element)| (*id, element))
    }

    /// Number of content elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Remove a content element, keeping the order of the others.
    pub fn remove_element(&mut self, id: ElementId) -> Option<ContentElement> {
        self.elements.shift_remove(&id)
    }

    /// Content elements whose bounding box intersects `region`.
    pub fn find_elements_in_region(&self, region: Rect) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|(_, element)| element.bbox().intersects(&region))
            .map(|(id, _)| *id)
            .collect()
    }

    // === Annotation list ===

    /// Number of annotations on the page, popups included.
    pub fn annot_count(&self) -> usize {
        self.annots.len()
    }

    /// Annotation at `index` in list order.
    pub fn annot_at(&self, index: usize) -> Option<Annot<'_>> {
        self.annots
            .get_index(index)
            .map(|(_, rec)| Annot::new(self, rec))
    }

    /// Handles to every annotation in list order.
    pub fn handles(&self) -> Vec<AnnotHandle> {
        self.annots.keys().map(|id| self.handle_for(*id)).collect()
    }

    /// Shared views of every annotation in list order.
    pub fn annots(&self) -> impl Iterator<Item = Annot<'_>> + '_ {
        self.annots.values().map(move |rec| Annot::new(self, rec))
    }

    fn check_handle(&self, handle: AnnotHandle) -> Result<AnnotId> {
        if handle.page_id() != self.id {
            return Err(Error::ForeignHandle);
        }
        if !self.annots.contains_key(&handle.id()) {
            return Err(Error::InvalidatedHandle(handle.id()));
        }
        Ok(handle.id())
    }

    /// Shared view of the annotation behind `handle`.
    pub fn annot(&self, handle: AnnotHandle) -> Result<Annot<'_>> {
        let id = self.check_handle(handle)?;
        Ok(Annot::new(self, &self.annots[&id]))
    }

    /// Exclusive view of the annotation behind `handle`.
    pub fn annot_mut(&mut self, handle: AnnotHandle) -> Result<AnnotMut<'_>> {
        let id = self.check_handle(handle)?;
        Ok(AnnotMut::new(self, id))
    }

    /// Create an annotation of `kind` at the end of the list.
    ///
    /// Kinds drawn from their own geometry (text markup, lines, ink,
    /// polygons, redactions) accept an empty rectangle; the rectangle is
    /// fitted when the appearance is generated.
    pub fn add_annot(&mut self, kind: AnnotationKind, rect: Rect) -> Result<AnnotHandle> {
        if !kind.is_creatable() {
            return Err(Error::Unsupported(format!("cannot create {:?} annotations", kind)));
        }
        if kind == AnnotationKind::Redact && !self.config.redaction {
            return Err(Error::MissingCapability("redaction".to_string()));
        }
        if !(rect.x.is_finite() && rect.y.is_finite()) || rect.width < 0.0 || rect.height < 0.0 {
            return Err(Error::InvalidParameter(format!("invalid rectangle {:?}", rect)));
        }
        if kind.requires_rect() && rect.is_degenerate() {
            return Err(Error::InvalidParameter(format!(
                "{:?} annotations need a non-degenerate rectangle",
                kind
            )));
        }
        let rec = self.new_record(kind, rect);
        let id = self.push_record(rec);
        log::debug!("Added {:?} annotation {} at index {}", kind, id, self.annots.len() - 1);
        Ok(self.handle_for(id))
    }

    /// Remove the annotation behind `handle` together with its popup,
    /// replies and state notes. Every handle to a removed annotation becomes
    /// invalid.
    ///
    /// Returns `Ok(false)` when the annotation was already removed.
    pub fn remove_annot(&mut self, handle: AnnotHandle) -> Result<bool> {
        if handle.page_id() != self.id {
            return Err(Error::ForeignHandle);
        }
        Ok(self.remove_record_cascade(handle.id()) > 0)
    }

    /// Drop references to annotations that are no longer on the page:
    /// popups, reply and state lists, reply parents, group links.
    ///
    /// Returns the number of links dropped.
    pub fn update_annot_list(&mut self) -> usize {
        let live: Vec<AnnotId> = self.annots.keys().copied().collect();
        let alive = |id: &AnnotId| live.contains(id);
        let mut dropped = 0;
        for rec in self.annots.values_mut() {
            if let Some(markup) = rec.markup.as_mut() {
                let before = markup.replies.len() + markup.states.len() + markup.group_members.len();
                markup.replies.retain(alive);
                markup.states.retain(alive);
                markup.group_members.retain(alive);
                dropped +=
                    before - (markup.replies.len() + markup.states.len() + markup.group_members.len());
                for link in [&mut markup.popup, &mut markup.in_reply_to, &mut markup.group_header] {
                    if link.is_some_and(|id| !alive(&id)) {
                        *link = None;
                        dropped += 1;
                    }
                }
            }
            if let KindPayload::Popup(popup) = &mut rec.payload {
                if popup.parent.is_some_and(|id| !alive(&id)) {
                    popup.parent = None;
                    dropped += 1;
                }
            }
        }
        if dropped > 0 {
            log::debug!("Dropped {} dangling annotation links", dropped);
        }
        dropped
    }

    /// Annotations whose rectangle intersects `region`.
    pub fn find_annots_in_region(&self, region: Rect) -> Vec<AnnotHandle> {
        self.annots
            .values()
            .filter(|rec| rec.rect.intersects(&region))
            .map(|rec| self.handle_for(rec.id))
            .collect()
    }

    /// Annotations of one kind, in list order.
    pub fn annots_by_kind(&self, kind: AnnotationKind) -> Vec<AnnotHandle> {
        self.annots
            .values()
            .filter(|rec| rec.kind == kind)
            .map(|rec| self.handle_for(rec.id))
            .collect()
    }

    /// Mark `rects` for redaction with one `Redact` annotation carrying a
    /// quad per rectangle.
    pub fn mark_redact_area(&mut self, rects: &[Rect]) -> Result<AnnotHandle> {
        if !self.config.redaction {
            return Err(Error::MissingCapability("redaction".to_string()));
        }
        if rects.is_empty() || rects.iter().any(Rect::is_degenerate) {
            return Err(Error::InvalidParameter(
                "redaction areas must be non-empty rectangles".to_string(),
            ));
        }
        let bounds = rects
            .iter()
            .skip(1)
            .fold(rects[0], |acc, r| acc.union(r));
        let handle = self.add_annot(AnnotationKind::Redact, bounds)?;
        let quads = rects.iter().map(QuadPoints::from_rect).collect();
        self.annot_mut(handle)?.set_quad_points(quads)?;
        Ok(handle)
    }

    // === Record plumbing for the annotation views ===

    /// A fresh record carrying the page defaults: unique name, author and
    /// timestamps.
    pub(crate) fn new_record(&self, kind: AnnotationKind, rect: Rect) -> AnnotRecord {
        let mut rec = AnnotRecord::new(kind, rect);
        let now = Utc::now();
        rec.modified = Some(now);
        if self.config.generate_unique_ids {
            rec.unique_id = Some(Uuid::new_v4().to_string());
        }
        if let Some(markup) = rec.markup.as_mut() {
            markup.created = Some(now);
            markup.title = self.config.default_author.clone();
        }
        rec
    }

    pub(crate) fn push_record(&mut self, rec: AnnotRecord) -> AnnotId {
        let id = rec.id;
        self.annots.insert(id, rec);
        id
    }

    pub(crate) fn handle_for(&self, id: AnnotId) -> AnnotHandle {
        AnnotHandle::new(self.id, id)
    }

    /// Remove `id` and everything it owns (popup, replies, state notes),
    /// unlinking it from its parent and its group. Returns the number of
    /// records removed.
    pub(crate) fn remove_record_cascade(&mut self, id: AnnotId) -> usize {
        let Some(rec) = self.annots.get(&id) else {
            return 0;
        };
        let mut owned: Vec<AnnotId> = Vec::new();
        if let Some(markup) = &rec.markup {
            owned.extend(markup.popup);
            owned.extend(markup.replies.iter().copied());
            owned.extend(markup.states.iter().copied());
        }
        let reply_parent = rec.in_reply_to();
        let popup_parent = match &rec.payload {
            KindPayload::Popup(popup) => popup.parent,
            _ => None,
        };

        self.detach_from_group(id);
        if let Some(parent) = reply_parent {
            if let Some(markup) = self.annots.get_mut(&parent).and_then(|r| r.markup.as_mut()) {
                markup.replies.retain(|reply| *reply != id);
                markup.states.retain(|note| *note != id);
            }
        }
        if let Some(parent) = popup_parent {
            if let Some(markup) = self.annots.get_mut(&parent).and_then(|r| r.markup.as_mut()) {
                if markup.popup == Some(id) {
                    markup.popup = None;
                }
            }
        }

        self.annots.shift_remove(&id);
        let mut removed = 1;
        for child in owned {
            removed += self.remove_record_cascade(child);
        }
        log::debug!("Removed annotation {} ({} records with dependents)", id, removed);
        removed
    }
}
