//! Kind-specific properties.
//!
//! Getters return `None` when the annotation's kind does not carry the
//! property. Setters return [`Error::Unsupported`] for such kinds and
//! [`Error::InvalidParameter`] for values outside the property's domain.

use super::{
    Action, Annot, AnnotHandle, AnnotMut, FieldInfo, FileAttachmentData, KindPayload, LineData,
};
use crate::annotation_types::{
    AnnotationKind, CaptionPosition, Color, DefaultAppearance, HighlightingMode, InkPath,
    LineEndingStyle, QuadPoints, ReplyType, Rotation, TextAlignment, WidgetCharacteristics,
};
use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};

impl<'p> Annot<'p> {
    fn line(&self) -> Option<&'p LineData> {
        match &self.rec.payload {
            KindPayload::Line(line) => Some(line),
            _ => None,
        }
    }

    /// Quadrilaterals of text markup, link and redact annotations.
    pub fn quad_points(&self) -> Option<&'p [QuadPoints]> {
        match &self.rec.payload {
            KindPayload::TextMarkup(quads) => Some(quads),
            KindPayload::Redact(data) => Some(&data.quads),
            KindPayload::Link(data) => Some(&data.quads),
            _ => None,
        }
    }

    /// Start point of a line.
    pub fn start_point(&self) -> Option<Point> {
        self.line()?.start
    }

    /// End point of a line.
    pub fn end_point(&self) -> Option<Point> {
        self.line()?.end
    }

    /// Start and end line endings of a line or polyline.
    pub fn line_endings(&self) -> Option<(LineEndingStyle, LineEndingStyle)> {
        match &self.rec.payload {
            KindPayload::Line(line) => Some(line.endings),
            KindPayload::Poly(poly) if self.rec.kind == AnnotationKind::PolyLine => {
                Some(poly.endings)
            },
            _ => None,
        }
    }

    /// Leader line length (`LL`).
    pub fn leader_line_length(&self) -> Option<f32> {
        Some(self.line()?.leader_length)
    }

    /// Leader line extension (`LLE`).
    pub fn leader_line_extension(&self) -> Option<f32> {
        Some(self.line()?.leader_extension)
    }

    /// Leader line offset (`LLO`).
    pub fn leader_line_offset(&self) -> Option<f32> {
        Some(self.line()?.leader_offset)
    }

    /// Whether the line shows its content as a caption.
    pub fn has_caption(&self) -> Option<bool> {
        Some(self.line()?.caption)
    }

    /// Caption placement.
    pub fn caption_position(&self) -> Option<CaptionPosition> {
        Some(self.line()?.caption_position)
    }

    /// Caption offset from its default position.
    pub fn caption_offset(&self) -> Option<Point> {
        Some(self.line()?.caption_offset)
    }

    /// Measure ratio label, e.g. `1 in = 10 ft`.
    pub fn measure_ratio(&self) -> Option<&'p str> {
        self.line()?.measure_ratio.as_deref()
    }

    /// Vertexes of a polygon or polyline.
    pub fn vertexes(&self) -> Option<&'p [Point]> {
        match &self.rec.payload {
            KindPayload::Poly(poly) => Some(&poly.vertexes),
            _ => None,
        }
    }

    /// Ink list of an ink or pressure-sensitive ink annotation.
    pub fn ink_list(&self) -> Option<&'p InkPath> {
        match &self.rec.payload {
            KindPayload::Ink(path) => Some(path),
            _ => None,
        }
    }

    /// Default appearance of free text and redact annotations.
    pub fn default_appearance(&self) -> Option<&'p DefaultAppearance> {
        match &self.rec.payload {
            KindPayload::FreeText(ft) => ft.da.as_ref(),
            KindPayload::Redact(data) => data.da.as_ref(),
            _ => None,
        }
    }

    /// Text alignment of free text and redact overlay text.
    pub fn alignment(&self) -> Option<TextAlignment> {
        match &self.rec.payload {
            KindPayload::FreeText(ft) => ft.alignment,
            KindPayload::Redact(data) => Some(data.alignment),
            _ => None,
        }
    }

    /// Callout line points of a free text callout.
    pub fn callout_points(&self) -> Option<&'p [Point]> {
        match &self.rec.payload {
            KindPayload::FreeText(ft) => Some(&ft.callout_points),
            _ => None,
        }
    }

    /// Line ending at the start of a callout line.
    pub fn callout_line_ending(&self) -> Option<LineEndingStyle> {
        match &self.rec.payload {
            KindPayload::FreeText(ft) => Some(ft.callout_ending),
            _ => None,
        }
    }

    /// Inner rectangle (`RD` applied to `Rect`).
    pub fn inner_rect(&self) -> Option<Rect> {
        match &self.rec.payload {
            KindPayload::FreeText(ft) => ft.inner_rect,
            KindPayload::Shape(inner) => *inner,
            _ => None,
        }
    }

    /// Rotation of free text and stamp annotations.
    pub fn rotation(&self) -> Option<Rotation> {
        match &self.rec.payload {
            KindPayload::FreeText(ft) => Some(ft.rotation),
            KindPayload::Stamp { rotation, .. } => Some(*rotation),
            _ => None,
        }
    }

    /// Icon name of notes, stamps, file attachments and sounds.
    pub fn icon_name(&self) -> Option<&'p str> {
        match &self.rec.payload {
            KindPayload::Note(note) => note.icon_name.as_deref(),
            KindPayload::Stamp { icon_name, .. } => icon_name.as_deref(),
            KindPayload::FileAttachment(data) => data.icon_name.as_deref(),
            KindPayload::Sound(icon_name) => icon_name.as_deref(),
            _ => None,
        }
    }

    /// Open state of a note or popup.
    pub fn is_open(&self) -> Option<bool> {
        match &self.rec.payload {
            KindPayload::Note(note) => Some(note.open),
            KindPayload::Popup(data) => Some(data.open),
            _ => None,
        }
    }

    /// Relationship of a note to the annotation it points at.
    pub fn reply_type(&self) -> Option<ReplyType> {
        match &self.rec.payload {
            KindPayload::Note(note) if self.rec.in_reply_to().is_some() => Some(note.reply_type),
            _ => None,
        }
    }

    /// Name of the attached file.
    pub fn file_name(&self) -> Option<&'p str> {
        match &self.rec.payload {
            KindPayload::FileAttachment(data) => data.file_name.as_deref(),
            _ => None,
        }
    }

    /// Bytes of the attached file.
    pub fn file_data(&self) -> Option<&'p bytes::Bytes> {
        match &self.rec.payload {
            KindPayload::FileAttachment(data) => data.data.as_ref(),
            _ => None,
        }
    }

    /// Color that fills the redacted region once applied.
    pub fn apply_fill_color(&self) -> Option<Color> {
        match &self.rec.payload {
            KindPayload::Redact(data) => data.apply_fill_color,
            _ => None,
        }
    }

    /// Text drawn over the redacted region once applied.
    pub fn overlay_text(&self) -> Option<&'p str> {
        match &self.rec.payload {
            KindPayload::Redact(data) => data.overlay_text.as_deref(),
            _ => None,
        }
    }

    /// Whether overlay text repeats to fill the region.
    pub fn is_overlay_text_repeated(&self) -> Option<bool> {
        match &self.rec.payload {
            KindPayload::Redact(data) => Some(data.repeat),
            _ => None,
        }
    }

    /// Whether the overlay font size is fitted to the region.
    pub fn is_auto_font_size(&self) -> Option<bool> {
        match &self.rec.payload {
            KindPayload::Redact(data) => Some(data.auto_font_size),
            _ => None,
        }
    }

    /// Signature name of a paging seal.
    pub fn signature_name(&self) -> Option<&'p str> {
        match &self.rec.payload {
            KindPayload::PagingSeal(name) => name.as_deref(),
            _ => None,
        }
    }

    /// Highlighting mode of links and widgets.
    pub fn highlighting_mode(&self) -> Option<HighlightingMode> {
        match &self.rec.payload {
            KindPayload::Link(data) => Some(data.highlighting),
            KindPayload::Widget(data) => Some(data.highlighting),
            _ => None,
        }
    }

    /// Action of links, screens and widgets.
    pub fn action(&self) -> Option<&'p Action> {
        match &self.rec.payload {
            KindPayload::Link(data) => data.action.as_ref(),
            KindPayload::Screen(data) => data.action.as_ref(),
            KindPayload::Widget(data) => data.action.as_ref(),
            _ => None,
        }
    }

    /// Content rotation of a screen annotation (`MK /R`).
    pub fn mk_rotation(&self) -> Option<Rotation> {
        match &self.rec.payload {
            KindPayload::Screen(data) => Some(data.mk_rotation),
            KindPayload::Widget(data) => Some(data.mk.rotation),
            _ => None,
        }
    }

    /// Form field a widget belongs to.
    pub fn field(&self) -> Option<&'p FieldInfo> {
        match &self.rec.payload {
            KindPayload::Widget(data) => data.field.as_ref(),
            _ => None,
        }
    }

    /// Appearance characteristics of a widget.
    pub fn mk(&self) -> Option<&'p WidgetCharacteristics> {
        match &self.rec.payload {
            KindPayload::Widget(data) => Some(&data.mk),
            _ => None,
        }
    }

    /// Selected appearance state (`AS`) of a widget.
    pub fn appearance_state_name(&self) -> Option<&'p str> {
        match &self.rec.payload {
            KindPayload::Widget(data) => data.appearance_state.as_deref(),
            _ => None,
        }
    }

    /// The markup annotation a popup belongs to.
    pub fn popup_parent(&self) -> Option<AnnotHandle> {
        match &self.rec.payload {
            KindPayload::Popup(data) => {
                let parent = data.parent?;
                self.page.annots.contains_key(&parent).then(|| self.handle_of(parent))
            },
            _ => None,
        }
    }
}

fn check_finite(what: &str, values: &[f32]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!("{} must be finite", what)))
    }
}

fn check_points(what: &str, points: &[Point]) -> Result<()> {
    if points.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!("{} contain a non-finite point", what)))
    }
}

impl<'p> AnnotMut<'p> {
    /// Change the payload through `f`, which returns `None` when the kind
    /// lacks the property.
    fn with_payload<T>(
        &mut self,
        what: &str,
        f: impl FnOnce(&mut KindPayload) -> Option<T>,
    ) -> Result<T> {
        let kind = self.kind();
        let rec = self.rec_mut();
        match f(&mut rec.payload) {
            Some(out) => {
                rec.touch();
                Ok(out)
            },
            None => Err(Error::Unsupported(format!(
                "{} is not available on {:?} annotations",
                what, kind
            ))),
        }
    }

    fn with_line(&mut self, what: &str, f: impl FnOnce(&mut LineData)) -> Result<()> {
        self.with_payload(what, |payload| match payload {
            KindPayload::Line(line) => {
                f(line);
                Some(())
            },
            _ => None,
        })
    }

    /// Set the quadrilaterals of a text markup, link or redact annotation.
    pub fn set_quad_points(&mut self, quads: Vec<QuadPoints>) -> Result<()> {
        for quad in &quads {
            check_points("quad points", &quad.points())?;
        }
        self.with_payload("quad points", |payload| match payload {
            KindPayload::TextMarkup(q) => {
                *q = quads;
                Some(())
            },
            KindPayload::Redact(data) => {
                data.quads = quads;
                Some(())
            },
            KindPayload::Link(data) => {
                data.quads = quads;
                Some(())
            },
            _ => None,
        })
    }

    /// Set the start point of a line.
    pub fn set_start_point(&mut self, point: Point) -> Result<()> {
        check_points("line points", &[point])?;
        self.with_line("start point", |line| line.start = Some(point))
    }

    /// Set the end point of a line.
    pub fn set_end_point(&mut self, point: Point) -> Result<()> {
        check_points("line points", &[point])?;
        self.with_line("end point", |line| line.end = Some(point))
    }

    /// Set the line endings of a line or polyline.
    pub fn set_line_endings(&mut self, start: LineEndingStyle, end: LineEndingStyle) -> Result<()> {
        let is_polyline = self.kind() == AnnotationKind::PolyLine;
        self.with_payload("line endings", |payload| match payload {
            KindPayload::Line(line) => {
                line.endings = (start, end);
                Some(())
            },
            KindPayload::Poly(poly) if is_polyline => {
                poly.endings = (start, end);
                Some(())
            },
            _ => None,
        })
    }

    /// Set the leader line length. Negative values extend below the line.
    pub fn set_leader_line_length(&mut self, length: f32) -> Result<()> {
        check_finite("leader line length", &[length])?;
        self.with_line("leader line length", |line| line.leader_length = length)
    }

    /// Set the leader line extension.
    pub fn set_leader_line_extension(&mut self, extension: f32) -> Result<()> {
        if !(extension >= 0.0 && extension.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "leader line extension {} must be non-negative",
                extension
            )));
        }
        self.with_line("leader line extension", |line| line.leader_extension = extension)
    }

    /// Set the leader line offset.
    pub fn set_leader_line_offset(&mut self, offset: f32) -> Result<()> {
        if !(offset >= 0.0 && offset.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "leader line offset {} must be non-negative",
                offset
            )));
        }
        self.with_line("leader line offset", |line| line.leader_offset = offset)
    }

    /// Show or hide the content as a caption on the line.
    pub fn enable_caption(&mut self, enable: bool) -> Result<()> {
        self.with_line("caption", |line| line.caption = enable)
    }

    /// Set the caption placement.
    pub fn set_caption_position(&mut self, position: CaptionPosition) -> Result<()> {
        self.with_line("caption position", |line| line.caption_position = position)
    }

    /// Set the caption offset.
    pub fn set_caption_offset(&mut self, offset: Point) -> Result<()> {
        check_points("caption offset", &[offset])?;
        self.with_line("caption offset", |line| line.caption_offset = offset)
    }

    /// Set the measure ratio label.
    pub fn set_measure_ratio(&mut self, ratio: impl Into<String>) -> Result<()> {
        let ratio = ratio.into();
        self.with_line("measure ratio", |line| line.measure_ratio = Some(ratio))
    }

    /// Set the vertexes of a polygon or polyline.
    pub fn set_vertexes(&mut self, vertexes: Vec<Point>) -> Result<()> {
        check_points("vertexes", &vertexes)?;
        self.with_payload("vertexes", |payload| match payload {
            KindPayload::Poly(poly) => {
                poly.vertexes = vertexes;
                Some(())
            },
            _ => None,
        })
    }

    /// Set the ink list. Every run must start with a `MoveTo` point.
    ///
    /// Pressure-sensitive ink is read-only.
    pub fn set_ink_list(&mut self, path: InkPath) -> Result<()> {
        if self.kind() == AnnotationKind::PSInk {
            return Err(Error::Unsupported("PSInk ink lists are read-only".to_string()));
        }
        if !path.is_empty() && !path.is_valid() {
            return Err(Error::InvalidParameter("ink list must start with MoveTo".to_string()));
        }
        check_points("ink list", &path.points().iter().map(|p| p.point).collect::<Vec<_>>())?;
        self.with_payload("ink list", |payload| match payload {
            KindPayload::Ink(ink) => {
                *ink = path;
                Some(())
            },
            _ => None,
        })
    }

    /// Set the default appearance of a free text or redact annotation.
    pub fn set_default_appearance(&mut self, da: DefaultAppearance) -> Result<()> {
        if !(da.text_size >= 0.0 && da.text_size.is_finite()) {
            return Err(Error::InvalidParameter(format!("invalid text size {}", da.text_size)));
        }
        self.with_payload("default appearance", |payload| match payload {
            KindPayload::FreeText(ft) => {
                ft.da = Some(da);
                Some(())
            },
            KindPayload::Redact(data) => {
                data.da = Some(da);
                Some(())
            },
            _ => None,
        })
    }

    /// Set the text alignment of a free text or redact annotation.
    pub fn set_alignment(&mut self, alignment: TextAlignment) -> Result<()> {
        self.with_payload("alignment", |payload| match payload {
            KindPayload::FreeText(ft) => {
                ft.alignment = Some(alignment);
                Some(())
            },
            KindPayload::Redact(data) => {
                data.alignment = alignment;
                Some(())
            },
            _ => None,
        })
    }

    /// Set the callout line: two or three points, or none to clear it.
    pub fn set_callout_points(&mut self, points: Vec<Point>) -> Result<()> {
        if !(points.is_empty() || (2..=3).contains(&points.len())) {
            return Err(Error::InvalidParameter(format!(
                "a callout line has 2 or 3 points, got {}",
                points.len()
            )));
        }
        check_points("callout points", &points)?;
        self.with_payload("callout points", |payload| match payload {
            KindPayload::FreeText(ft) => {
                ft.callout_points = points;
                Some(())
            },
            _ => None,
        })
    }

    /// Set the line ending at the start of the callout line.
    pub fn set_callout_line_ending(&mut self, ending: LineEndingStyle) -> Result<()> {
        self.with_payload("callout line ending", |payload| match payload {
            KindPayload::FreeText(ft) => {
                ft.callout_ending = ending;
                Some(())
            },
            _ => None,
        })
    }

    /// Set the inner rectangle of a free text, square, circle or caret.
    /// It must lie inside the annotation rectangle.
    pub fn set_inner_rect(&mut self, inner: Rect) -> Result<()> {
        let rect = self.rec().rect;
        if inner.is_degenerate() || !rect.contains_rect(&inner) {
            return Err(Error::InvalidParameter(format!(
                "inner rectangle {:?} must lie inside {:?}",
                inner, rect
            )));
        }
        self.with_payload("inner rectangle", |payload| match payload {
            KindPayload::FreeText(ft) => {
                ft.inner_rect = Some(inner);
                Some(())
            },
            KindPayload::Shape(slot) => {
                *slot = Some(inner);
                Some(())
            },
            _ => None,
        })
    }

    /// Set the rotation of a free text or stamp annotation.
    pub fn set_rotation(&mut self, value: Rotation) -> Result<()> {
        self.with_payload("rotation", |payload| match payload {
            KindPayload::FreeText(ft) => {
                ft.rotation = value;
                Some(())
            },
            KindPayload::Stamp { rotation, .. } => {
                *rotation = value;
                Some(())
            },
            _ => None,
        })
    }

    /// Set the icon name of a note, stamp, file attachment or sound.
    pub fn set_icon_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = Some(name.into());
        self.with_payload("icon name", |payload| match payload {
            KindPayload::Note(note) => {
                note.icon_name = name;
                Some(())
            },
            KindPayload::Stamp { icon_name, .. } => {
                *icon_name = name;
                Some(())
            },
            KindPayload::FileAttachment(data) => {
                data.icon_name = name;
                Some(())
            },
            KindPayload::Sound(icon_name) => {
                *icon_name = name;
                Some(())
            },
            _ => None,
        })
    }

    /// Open or close a note or popup.
    pub fn set_open(&mut self, open: bool) -> Result<()> {
        self.with_payload("open state", |payload| match payload {
            KindPayload::Note(note) => {
                note.open = open;
                Some(())
            },
            KindPayload::Popup(data) => {
                data.open = open;
                Some(())
            },
            _ => None,
        })
    }

    /// Attach a file to a file attachment annotation.
    pub fn set_file(&mut self, name: impl Into<String>, data: bytes::Bytes) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidParameter("file name is empty".to_string()));
        }
        self.with_payload("attached file", |payload| match payload {
            KindPayload::FileAttachment(FileAttachmentData {
                file_name,
                data: slot,
                ..
            }) => {
                *file_name = Some(name);
                *slot = Some(data);
                Some(())
            },
            _ => None,
        })
    }

    /// Set the color that fills a redacted region once applied.
    pub fn set_apply_fill_color(&mut self, color: Color) -> Result<()> {
        self.with_payload("apply fill color", |payload| match payload {
            KindPayload::Redact(data) => {
                data.apply_fill_color = Some(color);
                Some(())
            },
            _ => None,
        })
    }

    /// Set the overlay text of a redact annotation. An empty string clears it.
    pub fn set_overlay_text(&mut self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.with_payload("overlay text", |payload| match payload {
            KindPayload::Redact(data) => {
                data.overlay_text = (!text.is_empty()).then_some(text);
                Some(())
            },
            _ => None,
        })
    }

    /// Repeat the overlay text across the redacted region.
    pub fn enable_repeat_overlay_text(&mut self, repeat: bool) -> Result<()> {
        self.with_payload("overlay text repetition", |payload| match payload {
            KindPayload::Redact(data) => {
                data.repeat = repeat;
                Some(())
            },
            _ => None,
        })
    }

    /// Fit the overlay font size to the redacted region.
    pub fn enable_auto_font_size(&mut self, enable: bool) -> Result<()> {
        self.with_payload("auto font size", |payload| match payload {
            KindPayload::Redact(data) => {
                data.auto_font_size = enable;
                Some(())
            },
            _ => None,
        })
    }

    /// Set the signature name of a paging seal.
    pub fn set_signature_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.with_payload("signature name", |payload| match payload {
            KindPayload::PagingSeal(slot) => {
                *slot = Some(name);
                Some(())
            },
            _ => None,
        })
    }

    /// Set the highlighting mode of a link or widget.
    pub fn set_highlighting_mode(&mut self, mode: HighlightingMode) -> Result<()> {
        self.with_payload("highlighting mode", |payload| match payload {
            KindPayload::Link(data) => {
                data.highlighting = mode;
                Some(())
            },
            KindPayload::Widget(data) => {
                data.highlighting = mode;
                Some(())
            },
            _ => None,
        })
    }

    /// Set the action of a link, screen or widget.
    pub fn set_action(&mut self, action: Action) -> Result<()> {
        let slot = self.action_slot()?;
        *slot = Some(action);
        Ok(())
    }

    /// Remove the action. Returns `Ok(false)` when there was none.
    pub fn remove_action(&mut self) -> Result<bool> {
        Ok(self.action_slot()?.take().is_some())
    }

    fn action_slot(&mut self) -> Result<&mut Option<Action>> {
        let kind = self.kind();
        match &mut self.rec_mut().payload {
            KindPayload::Link(data) => Ok(&mut data.action),
            KindPayload::Screen(data) => Ok(&mut data.action),
            KindPayload::Widget(data) => Ok(&mut data.action),
            _ => Err(Error::Unsupported(format!("{:?} annotations have no action", kind))),
        }
    }

    /// Set the content rotation of a screen or widget.
    pub fn set_mk_rotation(&mut self, rotation: Rotation) -> Result<()> {
        self.with_payload("MK rotation", |payload| match payload {
            KindPayload::Screen(data) => {
                data.mk_rotation = rotation;
                Some(())
            },
            KindPayload::Widget(data) => {
                data.mk.rotation = rotation;
                Some(())
            },
            _ => None,
        })
    }

    /// Associate a widget with a form field.
    pub fn set_field(&mut self, field: FieldInfo) -> Result<()> {
        if field.name.is_empty() {
            return Err(Error::InvalidParameter("field name is empty".to_string()));
        }
        self.with_payload("form field", |payload| match payload {
            KindPayload::Widget(data) => {
                data.field = Some(field);
                Some(())
            },
            _ => None,
        })
    }

    /// Set the appearance characteristics of a widget.
    pub fn set_mk(&mut self, mk: WidgetCharacteristics) -> Result<()> {
        self.with_payload("MK characteristics", |payload| match payload {
            KindPayload::Widget(data) => {
                data.mk = mk;
                Some(())
            },
            _ => None,
        })
    }

    /// Select the widget's appearance state (`AS`). Streams kept for the
    /// new state replace the current ones, which are kept under the old
    /// state name.
    pub fn set_appearance_state_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let previous = self.with_payload("appearance state", |payload| match payload {
            KindPayload::Widget(data) => Some(data.appearance_state.replace(name.clone())),
            _ => None,
        })?;
        if let (Some(previous), Some(set)) = (previous, self.rec_mut().appearance.as_mut()) {
            set.switch_state(&previous, &name);
        }
        Ok(())
    }
}
