//! Reply chains and state annotations.
//!
//! Replies are `Note` annotations whose `IRT` points at their parent; each
//! markup annotation keeps its replies in creation order. State annotations
//! are hidden notes carrying a state model and state. Adding a `Marked`
//! state with the title of an existing `Marked` state note updates that
//! note; `Review` states always append.

use super::{Annot, AnnotHandle, AnnotId, AnnotMut, KindPayload, NoteData};
use crate::annotation_types::{AnnotState, AnnotationFlags, AnnotationKind, ReplyType, StateModel};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use chrono::Utc;

/// Side of the square a reply or state note occupies.
const NOTE_SIZE: f32 = 20.0;

impl<'p> Annot<'p> {
    /// Number of direct replies.
    pub fn reply_count(&self) -> usize {
        self.rec.markup.as_ref().map_or(0, |m| m.replies.len())
    }

    /// Direct reply at `index`.
    pub fn reply(&self, index: usize) -> Option<AnnotHandle> {
        let id = *self.rec.markup.as_ref()?.replies.get(index)?;
        Some(self.handle_of(id))
    }

    /// All direct replies, oldest first.
    pub fn replies(&self) -> Vec<AnnotHandle> {
        self.rec
            .markup
            .as_ref()
            .map(|m| m.replies.iter().map(|id| self.handle_of(*id)).collect())
            .unwrap_or_default()
    }

    /// State notes of this annotation that use `model`.
    pub fn state_annots(&self, model: StateModel) -> Vec<AnnotHandle> {
        let Some(markup) = self.rec.markup.as_ref() else {
            return Vec::new();
        };
        markup
            .states
            .iter()
            .filter(|id| {
                self.page
                    .annots
                    .get(*id)
                    .and_then(|rec| match &rec.payload {
                        KindPayload::Note(note) => note.state,
                        _ => None,
                    })
                    .is_some_and(|(m, _)| m == model)
            })
            .map(|id| self.handle_of(*id))
            .collect()
    }

    /// Number of state notes using `model`.
    pub fn state_annot_count(&self, model: StateModel) -> usize {
        self.state_annots(model).len()
    }

    /// State model and state of a state note.
    pub fn state(&self) -> Option<(StateModel, AnnotState)> {
        match &self.rec.payload {
            KindPayload::Note(note) => note.state,
            _ => None,
        }
    }

    /// Check if this note is a state annotation.
    pub fn is_state_annot(&self) -> bool {
        self.state().is_some()
    }
}

impl<'p> AnnotMut<'p> {
    fn new_note(&mut self, data: NoteData, title: Option<String>) -> Result<AnnotId> {
        let parent_rect = self.rec().rect;
        let rect = Rect::new(
            parent_rect.left(),
            parent_rect.top() - NOTE_SIZE,
            NOTE_SIZE,
            NOTE_SIZE,
        );
        let mut note = self.page.new_record(AnnotationKind::Note, rect);
        note.payload = KindPayload::Note(data);
        if let Some(markup) = note.markup.as_mut() {
            markup.in_reply_to = Some(self.id);
            if title.is_some() {
                markup.title = title;
            }
        }
        Ok(self.page.push_record(note))
    }

    /// Append a reply note and return it.
    pub fn add_reply(&mut self) -> Result<AnnotHandle> {
        self.markup_mut()?;
        let data = NoteData {
            reply_type: ReplyType::Reply,
            ..NoteData::default()
        };
        let reply = self.new_note(data, None)?;
        self.markup_mut()?.replies.push(reply);
        log::debug!("Added reply {} to annotation {}", reply, self.id);
        Ok(self.page.handle_for(reply))
    }

    /// Remove the reply at `index` together with its own replies.
    pub fn remove_reply(&mut self, index: usize) -> Result<bool> {
        let replies = &self.markup_mut()?.replies;
        let Some(&reply) = replies.get(index) else {
            return Err(Error::InvalidParameter(format!(
                "reply index {} out of range 0..{}",
                index,
                replies.len()
            )));
        };
        Ok(self.page.remove_record_cascade(reply) > 0)
    }

    /// Remove every reply, recursively.
    pub fn remove_all_replies(&mut self) -> Result<()> {
        let replies = std::mem::take(&mut self.markup_mut()?.replies);
        for reply in replies {
            self.page.remove_record_cascade(reply);
        }
        Ok(())
    }

    /// Add a state to this annotation.
    ///
    /// In the `Marked` model an existing `Marked` state note with the same
    /// title is updated and returned; otherwise a new state note is appended.
    pub fn add_state_annot(
        &mut self,
        title: &str,
        model: StateModel,
        state: AnnotState,
    ) -> Result<AnnotHandle> {
        if state.model() != model {
            return Err(Error::InvalidParameter(format!(
                "state {:?} does not belong to the {:?} model",
                state, model
            )));
        }
        let existing = self.markup_mut()?.states.clone();
        let title = if title.is_empty() {
            self.page.config().default_author.clone()
        } else {
            Some(title.to_string())
        };
        if model == StateModel::Marked {
            let found = existing.into_iter().find(|id| {
                self.page.annots.get(id).is_some_and(|rec| {
                    matches!(&rec.payload, KindPayload::Note(n) if n.state.map(|s| s.0) == Some(model))
                        && rec.markup.as_ref().and_then(|m| m.title.as_deref()) == title.as_deref()
                })
            });
            if let Some(id) = found {
                if let Some(rec) = self.page.annots.get_mut(&id) {
                    if let KindPayload::Note(note) = &mut rec.payload {
                        note.state = Some((model, state));
                    }
                    rec.modified = Some(Utc::now());
                    rec.touch();
                }
                log::debug!("Updated marked state note {} to {:?}", id, state);
                return Ok(self.page.handle_for(id));
            }
        }

        let data = NoteData {
            state: Some((model, state)),
            reply_type: ReplyType::Reply,
            ..NoteData::default()
        };
        let note = self.new_note(data, title)?;
        if let Some(rec) = self.page.annots.get_mut(&note) {
            rec.flags = AnnotationFlags::HIDDEN | AnnotationFlags::NO_VIEW;
            rec.modified = Some(Utc::now());
        }
        self.markup_mut()?.states.push(note);
        log::debug!("Added {:?} state note {} to annotation {}", model, note, self.id);
        Ok(self.page.handle_for(note))
    }

    /// Remove every state note.
    pub fn remove_all_state_annots(&mut self) -> Result<()> {
        let states = std::mem::take(&mut self.markup_mut()?.states);
        for note in states {
            self.page.remove_record_cascade(note);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::annotation_types::{AnnotState, AnnotationKind, StateModel};
    use crate::config::AnnotConfig;
    use crate::editor::Page;
    use crate::error::Error;
    use crate::geometry::Rect;

    fn page() -> Page {
        Page::with_config(
            Rect::new(0.0, 0.0, 612.0, 792.0),
            AnnotConfig::new().with_default_author("Reviewer"),
        )
    }

    #[test]
    fn test_add_reply_links_parent() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0))
            .unwrap();
        let reply = page.annot_mut(h).unwrap().add_reply().unwrap();

        let parent = page.annot(h).unwrap();
        assert_eq!(parent.reply_count(), 1);
        assert_eq!(parent.reply(0), Some(reply));
        let note = page.annot(reply).unwrap();
        assert_eq!(note.kind(), AnnotationKind::Note);
        assert_eq!(note.in_reply_to(), Some(h));
        assert_eq!(note.title(), Some("Reviewer"));
    }

    #[test]
    fn test_remove_reply_cascades() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0))
            .unwrap();
        let r = page.annot_mut(h).unwrap().add_reply().unwrap();
        let r2 = page.annot_mut(r).unwrap().add_reply().unwrap();
        assert_eq!(page.annot_count(), 3);

        assert!(page.annot_mut(h).unwrap().remove_reply(0).unwrap());
        assert_eq!(page.annot(h).unwrap().reply_count(), 0);
        assert!(page.annot(r).is_err());
        assert!(page.annot(r2).is_err());
        assert_eq!(page.annot_count(), 1);
    }

    #[test]
    fn test_remove_reply_out_of_range() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0))
            .unwrap();
        assert!(matches!(
            page.annot_mut(h).unwrap().remove_reply(0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_remove_all_replies() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Circle, Rect::new(100.0, 100.0, 50.0, 50.0))
            .unwrap();
        let mut parent = page.annot_mut(h).unwrap();
        parent.add_reply().unwrap();
        let second = parent.add_reply().unwrap();
        drop(parent);
        page.annot_mut(second).unwrap().add_reply().unwrap();

        page.annot_mut(h).unwrap().remove_all_replies().unwrap();
        assert_eq!(page.annot_count(), 1);
    }

    #[test]
    fn test_marked_state_deduplicates() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0))
            .unwrap();
        let mut parent = page.annot_mut(h).unwrap();
        let first = parent
            .add_state_annot("Alice", StateModel::Marked, AnnotState::Marked)
            .unwrap();
        let second = parent
            .add_state_annot("Alice", StateModel::Marked, AnnotState::Unmarked)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(parent.view().state_annot_count(StateModel::Marked), 1);
        assert_eq!(
            page.annot(first).unwrap().state(),
            Some((StateModel::Marked, AnnotState::Unmarked))
        );
    }

    #[test]
    fn test_marked_state_other_title_appends() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0))
            .unwrap();
        let mut parent = page.annot_mut(h).unwrap();
        let a = parent
            .add_state_annot("Alice", StateModel::Marked, AnnotState::Marked)
            .unwrap();
        let b = parent
            .add_state_annot("Bob", StateModel::Marked, AnnotState::Marked)
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(parent.view().state_annot_count(StateModel::Marked), 2);
    }

    #[test]
    fn test_marked_state_empty_title_uses_default_author() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0))
            .unwrap();
        let mut parent = page.annot_mut(h).unwrap();
        let first = parent
            .add_state_annot("", StateModel::Marked, AnnotState::Marked)
            .unwrap();
        let second = parent
            .add_state_annot("", StateModel::Marked, AnnotState::Unmarked)
            .unwrap();
        let explicit = parent
            .add_state_annot("Reviewer", StateModel::Marked, AnnotState::Marked)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first, explicit);
        assert_eq!(parent.view().state_annot_count(StateModel::Marked), 1);
        assert_eq!(page.annot(first).unwrap().title(), Some("Reviewer"));
    }

    #[test]
    fn test_review_state_always_appends() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0))
            .unwrap();
        let mut parent = page.annot_mut(h).unwrap();
        let a = parent
            .add_state_annot("Alice", StateModel::Review, AnnotState::Accepted)
            .unwrap();
        let b = parent
            .add_state_annot("Alice", StateModel::Review, AnnotState::Accepted)
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(parent.view().state_annot_count(StateModel::Review), 2);
        assert_eq!(parent.view().state_annot_count(StateModel::Marked), 0);
        // state notes are not replies
        assert_eq!(parent.view().reply_count(), 0);
    }

    #[test]
    fn test_state_model_mismatch() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0))
            .unwrap();
        let mut parent = page.annot_mut(h).unwrap();
        assert!(matches!(
            parent.add_state_annot("Alice", StateModel::Marked, AnnotState::Accepted),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_remove_all_state_annots() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0))
            .unwrap();
        let mut parent = page.annot_mut(h).unwrap();
        parent
            .add_state_annot("Alice", StateModel::Review, AnnotState::Rejected)
            .unwrap();
        parent.remove_all_state_annots().unwrap();
        assert_eq!(parent.view().state_annot_count(StateModel::Review), 0);
        assert_eq!(page.annot_count(), 1);
    }
}
