//! Markup layer: author commentary, popups, rich text.
//!
//! Shared attributes of a group (content, modified date, border and fill
//! color, title, subject, creation date, popup and its open state) are read
//! from the group primary. Setting one on a subordinate stores the value on
//! the subordinate, where it stays shadowed until the annotation leaves the
//! group.

use super::{Annot, AnnotHandle, AnnotMut, MarkupData, PopupData, RichTextRun};
use crate::annotation_types::{intent, AnnotationKind, Color};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use chrono::{DateTime, Utc};

impl<'p> Annot<'p> {
    fn markup(&self) -> Option<&'p MarkupData> {
        self.rec.markup.as_ref()
    }

    fn shared_markup(&self) -> Option<&'p MarkupData> {
        self.shared().markup.as_ref()
    }

    /// Author (`T`). Screen annotations report their own title.
    pub fn title(&self) -> Option<&'p str> {
        if let super::KindPayload::Screen(screen) = &self.rec.payload {
            return screen.title.as_deref();
        }
        self.shared_markup()?.title.as_deref()
    }

    /// Subject (`Subj`).
    pub fn subject(&self) -> Option<&'p str> {
        self.shared_markup()?.subject.as_deref()
    }

    /// Constant opacity (`CA`), 0.0 to 1.0.
    pub fn opacity(&self) -> Option<f32> {
        self.markup()?.opacity
    }

    /// Intent (`IT`).
    pub fn intent(&self) -> Option<&'p str> {
        self.markup()?.intent.as_deref()
    }

    /// Creation date.
    pub fn creation_date(&self) -> Option<DateTime<Utc>> {
        self.shared_markup()?.created
    }

    /// Interior (fill) color (`IC`).
    pub fn fill_color(&self) -> Option<Color> {
        self.shared_markup()?.fill_color
    }

    /// The popup showing this annotation's text.
    pub fn popup(&self) -> Option<AnnotHandle> {
        let popup = self.shared_markup()?.popup?;
        self.page.annots.contains_key(&popup).then(|| self.handle_of(popup))
    }

    /// Open state of the popup, if there is one.
    pub fn popup_open(&self) -> Option<bool> {
        let popup = self.shared_markup()?.popup?;
        match &self.page.annots.get(&popup)?.payload {
            super::KindPayload::Popup(data) => Some(data.open),
            _ => None,
        }
    }

    /// The annotation this one replies to (`IRT` with reply type `R`).
    pub fn in_reply_to(&self) -> Option<AnnotHandle> {
        self.markup()?.in_reply_to.map(|id| self.handle_of(id))
    }

    /// Number of rich text runs.
    pub fn rich_text_count(&self) -> usize {
        self.markup().map_or(0, |m| m.rich_text.len())
    }

    /// Rich text run at `index`.
    pub fn rich_text(&self, index: usize) -> Option<&'p RichTextRun> {
        self.markup()?.rich_text.get(index)
    }

    /// All rich text runs.
    pub fn rich_text_runs(&self) -> &'p [RichTextRun] {
        self.markup().map(|m| m.rich_text.as_slice()).unwrap_or_default()
    }
}

impl<'p> AnnotMut<'p> {
    pub(crate) fn markup_mut(&mut self) -> Result<&mut MarkupData> {
        let kind = self.kind();
        self.rec_mut().markup.as_mut().ok_or(Error::NotMarkup(kind))
    }

    /// Change a markup field and mark the appearance stale.
    fn update_markup(&mut self, f: impl FnOnce(&mut MarkupData)) -> Result<()> {
        f(self.markup_mut()?);
        self.rec_mut().touch();
        Ok(())
    }

    /// Set the author (`T`).
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        if let super::KindPayload::Screen(screen) = &mut self.rec_mut().payload {
            screen.title = Some(title);
            return Ok(());
        }
        self.update_markup(|m| m.title = Some(title))
    }

    /// Set the subject (`Subj`).
    pub fn set_subject(&mut self, subject: impl Into<String>) -> Result<()> {
        let subject = subject.into();
        self.update_markup(|m| m.subject = Some(subject))
    }

    /// Set the constant opacity.
    pub fn set_opacity(&mut self, opacity: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(Error::InvalidParameter(format!("opacity {} outside [0, 1]", opacity)));
        }
        self.update_markup(|m| m.opacity = Some(opacity))
    }

    /// Set the intent. An empty string clears it.
    pub fn set_intent(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            return self.update_markup(|m| m.intent = None);
        }
        let kind = self.kind();
        if !intent::is_allowed(kind, value) {
            return Err(Error::InvalidParameter(format!(
                "intent {} is not valid for {:?}",
                value, kind
            )));
        }
        let value = value.to_string();
        self.update_markup(|m| m.intent = Some(value))
    }

    /// Set the creation date.
    pub fn set_creation_date(&mut self, date: DateTime<Utc>) -> Result<()> {
        self.update_markup(|m| m.created = Some(date))
    }

    /// Set the interior (fill) color.
    pub fn set_fill_color(&mut self, color: Color) -> Result<()> {
        self.update_markup(|m| m.fill_color = Some(color))?;
        self.touch_group();
        Ok(())
    }

    /// Create the popup for this annotation, or move the existing one to
    /// `rect`. Sound and free text annotations never own a popup.
    pub fn add_popup(&mut self, rect: Rect) -> Result<AnnotHandle> {
        let kind = self.kind();
        if !kind.can_own_popup() {
            return Err(Error::Unsupported(format!("{:?} annotations have no popup", kind)));
        }
        if rect.is_degenerate() {
            return Err(Error::InvalidParameter(format!("invalid popup rectangle {:?}", rect)));
        }
        if let Some(existing) = self.rec().popup() {
            if let Some(popup) = self.page.annots.get_mut(&existing) {
                popup.rect = rect;
                return Ok(self.page.handle_for(existing));
            }
        }
        let mut popup = self.page.new_record(AnnotationKind::Popup, rect);
        popup.payload = super::KindPayload::Popup(PopupData {
            parent: Some(self.id),
            open: false,
        });
        let popup_id = self.page.push_record(popup);
        self.markup_mut()?.popup = Some(popup_id);
        log::debug!("Added popup {} to annotation {}", popup_id, self.id);
        Ok(self.page.handle_for(popup_id))
    }

    /// Remove this annotation's popup. Returns `Ok(false)` when it has none.
    pub fn remove_popup(&mut self) -> Result<bool> {
        let Some(popup) = self.markup_mut()?.popup.take() else {
            return Ok(false);
        };
        Ok(self.page.remove_record_cascade(popup) > 0)
    }

    /// Open or close the popup. Returns `Ok(false)` when there is none.
    pub fn set_popup_open(&mut self, open: bool) -> Result<bool> {
        let Some(popup) = self.markup_mut()?.popup else {
            return Ok(false);
        };
        match self.page.annots.get_mut(&popup).map(|rec| &mut rec.payload) {
            Some(super::KindPayload::Popup(data)) => {
                data.open = open;
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    /// Append a rich text run and return its index.
    pub fn add_rich_text(&mut self, run: RichTextRun) -> Result<usize> {
        let mut index = 0;
        self.update_markup(|m| {
            m.rich_text.push(run);
            index = m.rich_text.len() - 1;
        })?;
        Ok(index)
    }

    /// Insert a rich text run at `index`.
    pub fn insert_rich_text(&mut self, index: usize, run: RichTextRun) -> Result<()> {
        let len = self.markup_mut()?.rich_text.len();
        if index > len {
            return Err(Error::InvalidParameter(format!(
                "rich text index {} out of range 0..={}",
                index, len
            )));
        }
        self.update_markup(|m| m.rich_text.insert(index, run))
    }

    /// Replace the rich text run at `index`.
    pub fn set_rich_text(&mut self, index: usize, run: RichTextRun) -> Result<()> {
        self.check_rich_text_index(index)?;
        self.update_markup(|m| m.rich_text[index] = run)
    }

    /// Remove the rich text run at `index`.
    pub fn remove_rich_text(&mut self, index: usize) -> Result<()> {
        self.check_rich_text_index(index)?;
        self.update_markup(|m| {
            m.rich_text.remove(index);
        })
    }

    fn check_rich_text_index(&mut self, index: usize) -> Result<()> {
        let len = self.markup_mut()?.rich_text.len();
        if index >= len {
            return Err(Error::InvalidParameter(format!(
                "rich text index {} out of range 0..{}",
                index, len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::annotation_types::{intent, AnnotationKind, Color, RichTextStyle};
    use crate::annotations::RichTextRun;
    use crate::editor::Page;
    use crate::error::Error;
    use crate::geometry::Rect;

    fn page_with(kind: AnnotationKind) -> (Page, crate::annotations::AnnotHandle) {
        let mut page = Page::new(Rect::new(0.0, 0.0, 612.0, 792.0));
        let h = page.add_annot(kind, Rect::new(100.0, 100.0, 80.0, 40.0)).unwrap();
        (page, h)
    }

    #[test]
    fn test_markup_setters() {
        let (mut page, h) = page_with(AnnotationKind::Square);
        let mut square = page.annot_mut(h).unwrap();
        square.set_title("Alice").unwrap();
        square.set_subject("Review").unwrap();
        square.set_opacity(0.5).unwrap();
        square.set_fill_color(Color::BLUE).unwrap();
        let view = square.view();
        assert_eq!(view.title(), Some("Alice"));
        assert_eq!(view.subject(), Some("Review"));
        assert_eq!(view.opacity(), Some(0.5));
        assert_eq!(view.fill_color(), Some(Color::BLUE));
    }

    #[test]
    fn test_opacity_range() {
        let (mut page, h) = page_with(AnnotationKind::Square);
        let mut square = page.annot_mut(h).unwrap();
        assert!(matches!(square.set_opacity(1.5), Err(Error::InvalidParameter(_))));
        assert!(square.view().opacity().is_none());
    }

    #[test]
    fn test_non_markup_rejects_markup_setters() {
        let (mut page, h) = page_with(AnnotationKind::Link);
        let mut link = page.annot_mut(h).unwrap();
        assert!(matches!(link.set_title("x"), Err(Error::NotMarkup(AnnotationKind::Link))));
        assert_eq!(link.view().title(), None);
    }

    #[test]
    fn test_intent_validation() {
        let (mut page, h) = page_with(AnnotationKind::FreeText);
        let mut ft = page.annot_mut(h).unwrap();
        ft.set_intent(intent::FREE_TEXT_TYPEWRITER).unwrap();
        assert_eq!(ft.view().intent(), Some(intent::FREE_TEXT_TYPEWRITER));
        assert!(ft.set_intent(intent::LINE_ARROW).is_err());
        ft.set_intent("").unwrap();
        assert_eq!(ft.view().intent(), None);
    }

    #[test]
    fn test_popup_lifecycle() {
        let (mut page, h) = page_with(AnnotationKind::Note);
        let popup = {
            let mut note = page.annot_mut(h).unwrap();
            let popup = note.add_popup(Rect::new(200.0, 200.0, 150.0, 100.0)).unwrap();
            assert_eq!(note.view().popup(), Some(popup));
            assert_eq!(note.view().popup_open(), Some(false));
            assert!(note.set_popup_open(true).unwrap());
            assert_eq!(note.view().popup_open(), Some(true));
            popup
        };
        assert_eq!(page.annot(popup).unwrap().kind(), AnnotationKind::Popup);
        assert_eq!(page.annot(popup).unwrap().popup_parent(), Some(h));
        assert_eq!(page.annot_count(), 2);

        let mut note = page.annot_mut(h).unwrap();
        assert!(note.remove_popup().unwrap());
        assert!(!note.remove_popup().unwrap());
        assert_eq!(page.annot_count(), 1);
        assert!(page.annot(popup).is_err());
    }

    #[test]
    fn test_sound_and_free_text_have_no_popup() {
        for kind in [AnnotationKind::Sound, AnnotationKind::FreeText] {
            let (mut page, h) = page_with(kind);
            let mut annot = page.annot_mut(h).unwrap();
            assert!(matches!(
                annot.add_popup(Rect::new(0.0, 0.0, 10.0, 10.0)),
                Err(Error::Unsupported(_))
            ));
        }
    }

    #[test]
    fn test_rich_text_runs() {
        let (mut page, h) = page_with(AnnotationKind::FreeText);
        let mut ft = page.annot_mut(h).unwrap();
        ft.add_rich_text(RichTextRun::new("world", RichTextStyle::default())).unwrap();
        ft.insert_rich_text(0, RichTextRun::new("hello ", RichTextStyle::default()))
            .unwrap();
        assert_eq!(ft.view().rich_text_count(), 2);
        assert_eq!(ft.view().rich_text(0).map(|r| r.text.as_str()), Some("hello "));

        let bold = RichTextStyle {
            is_bold: true,
            ..RichTextStyle::default()
        };
        ft.set_rich_text(1, RichTextRun::new("World", bold)).unwrap();
        assert!(ft.view().rich_text(1).unwrap().style.is_bold);

        ft.remove_rich_text(0).unwrap();
        assert_eq!(ft.view().rich_text_count(), 1);
        assert!(ft.remove_rich_text(5).is_err());
        assert!(ft.insert_rich_text(3, RichTextRun::new("x", RichTextStyle::default())).is_err());
    }
}
