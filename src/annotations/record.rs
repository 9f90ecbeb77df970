//! Backing records of the annotation arena.
//!
//! A [`Page`](crate::editor::Page) owns one [`AnnotRecord`] per annotation.
//! Handles and views never own a record; they look it up by [`AnnotId`].

use super::{Action, AnnotId, RichTextRun};
use crate::annotation_types::{
    quads_bounding_rect, AnnotState, AnnotationFlags, AppearanceMode, AnnotationKind, BorderInfo,
    CaptionPosition, Color, DefaultAppearance, FieldType, HighlightingMode, InkPath,
    LineEndingStyle, QuadPoints, ReplyType, Rotation, StateModel, TextAlignment,
    WidgetCharacteristics,
};
use crate::geometry::{Matrix, Point, Rect};
use crate::object::Dict;
use crate::writer::appearance_stream::AppearanceStream;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

/// Where an annotation stands in the appearance regeneration cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppearanceState {
    /// Imported from a dictionary this library cannot model; the raw
    /// dictionary is kept and no appearance is ever generated
    Unparsed,
    /// Properties changed since the appearance was last generated
    PropertiesDirty,
    /// The appearance reflects the current properties
    AppearanceConsistent,
}

/// Generated or imported appearance streams of one annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AppearanceSet {
    /// Normal appearance (N)
    pub normal: AppearanceStream,
    /// Rollover appearance (R)
    pub rollover: Option<AppearanceStream>,
    /// Down appearance (D)
    pub down: Option<AppearanceStream>,
    /// Identity of the appearance object; widgets sharing one appearance
    /// share this id until one of them asks for a new object
    pub object_id: Uuid,
    /// Streams of the widget states other than the selected one (`/Off`
    /// next to `/Yes`), by mode and state name
    pub other_states: IndexMap<(AppearanceMode, String), AppearanceStream>,
}

impl AppearanceSet {
    /// Bring the streams of state `to` forward, parking those of `from`.
    /// Modes without a stream for `to` keep their current stream.
    pub(crate) fn switch_state(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        for mode in [AppearanceMode::Normal, AppearanceMode::Rollover, AppearanceMode::Down] {
            let Some(incoming) = self.other_states.shift_remove(&(mode, to.to_string())) else {
                continue;
            };
            let current = match mode {
                AppearanceMode::Normal => Some(std::mem::replace(&mut self.normal, incoming)),
                AppearanceMode::Rollover => self.rollover.replace(incoming),
                AppearanceMode::Down => self.down.replace(incoming),
            };
            if let Some(current) = current {
                self.other_states.insert((mode, from.to_string()), current);
            }
        }
    }
}

/// Form field association of a widget.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    /// Fully qualified field name
    pub name: String,
    /// Field type
    pub field_type: FieldType,
}

impl FieldInfo {
    /// Create a field association.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }

    /// Signature fields are drawn by the signing engine, not here.
    pub fn is_signature(&self) -> bool {
        self.field_type == FieldType::Signature
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct MarkupData {
    pub(crate) title: Option<String>,
    pub(crate) subject: Option<String>,
    pub(crate) opacity: Option<f32>,
    pub(crate) intent: Option<String>,
    pub(crate) created: Option<DateTime<Utc>>,
    pub(crate) fill_color: Option<Color>,
    pub(crate) popup: Option<AnnotId>,
    pub(crate) in_reply_to: Option<AnnotId>,
    pub(crate) replies: Vec<AnnotId>,
    pub(crate) states: Vec<AnnotId>,
    /// Set on subordinates: the group primary
    pub(crate) group_header: Option<AnnotId>,
    /// Set on the primary: its subordinates, in join order
    pub(crate) group_members: Vec<AnnotId>,
    pub(crate) rich_text: Vec<RichTextRun>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct NoteData {
    pub(crate) icon_name: Option<String>,
    pub(crate) open: bool,
    pub(crate) state: Option<(StateModel, AnnotState)>,
    pub(crate) reply_type: ReplyType,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct LineData {
    pub(crate) start: Option<Point>,
    pub(crate) end: Option<Point>,
    pub(crate) endings: (LineEndingStyle, LineEndingStyle),
    pub(crate) leader_length: f32,
    pub(crate) leader_extension: f32,
    pub(crate) leader_offset: f32,
    pub(crate) caption: bool,
    pub(crate) caption_position: CaptionPosition,
    pub(crate) caption_offset: Point,
    pub(crate) measure_ratio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct PolyData {
    pub(crate) vertexes: Vec<Point>,
    pub(crate) endings: (LineEndingStyle, LineEndingStyle),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct FreeTextData {
    pub(crate) da: Option<DefaultAppearance>,
    pub(crate) alignment: Option<TextAlignment>,
    pub(crate) callout_points: Vec<Point>,
    pub(crate) callout_ending: LineEndingStyle,
    pub(crate) inner_rect: Option<Rect>,
    pub(crate) rotation: Rotation,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct FileAttachmentData {
    pub(crate) icon_name: Option<String>,
    pub(crate) file_name: Option<String>,
    pub(crate) data: Option<bytes::Bytes>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct RedactData {
    pub(crate) quads: Vec<QuadPoints>,
    pub(crate) apply_fill_color: Option<Color>,
    pub(crate) overlay_text: Option<String>,
    pub(crate) repeat: bool,
    pub(crate) alignment: TextAlignment,
    pub(crate) auto_font_size: bool,
    pub(crate) da: Option<DefaultAppearance>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct LinkData {
    pub(crate) highlighting: HighlightingMode,
    pub(crate) action: Option<Action>,
    pub(crate) quads: Vec<QuadPoints>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct ScreenData {
    pub(crate) action: Option<Action>,
    pub(crate) mk_rotation: Rotation,
    pub(crate) title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct WidgetData {
    pub(crate) field: Option<FieldInfo>,
    pub(crate) mk: WidgetCharacteristics,
    pub(crate) highlighting: HighlightingMode,
    pub(crate) action: Option<Action>,
    pub(crate) appearance_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct PopupData {
    pub(crate) parent: Option<AnnotId>,
    pub(crate) open: bool,
}

/// Kind-specific properties.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum KindPayload {
    None,
    Note(NoteData),
    TextMarkup(Vec<QuadPoints>),
    Line(LineData),
    /// Square, Circle and Caret: the optional inner rectangle (`RD`)
    Shape(Option<Rect>),
    Poly(PolyData),
    /// Ink and PSInk
    Ink(InkPath),
    FreeText(FreeTextData),
    Stamp {
        icon_name: Option<String>,
        rotation: Rotation,
    },
    FileAttachment(FileAttachmentData),
    Sound(Option<String>),
    Redact(RedactData),
    PagingSeal(Option<String>),
    Link(LinkData),
    Screen(ScreenData),
    Widget(WidgetData),
    Popup(PopupData),
}

impl KindPayload {
    pub(crate) fn for_kind(kind: AnnotationKind) -> Self {
        match kind {
            AnnotationKind::Note => KindPayload::Note(NoteData::default()),
            AnnotationKind::Highlight
            | AnnotationKind::Underline
            | AnnotationKind::Squiggly
            | AnnotationKind::StrikeOut => KindPayload::TextMarkup(Vec::new()),
            AnnotationKind::Line => KindPayload::Line(LineData::default()),
            AnnotationKind::Square | AnnotationKind::Circle | AnnotationKind::Caret => {
                KindPayload::Shape(None)
            },
            AnnotationKind::Polygon | AnnotationKind::PolyLine => {
                KindPayload::Poly(PolyData::default())
            },
            AnnotationKind::Ink | AnnotationKind::PSInk => KindPayload::Ink(InkPath::new()),
            AnnotationKind::FreeText => KindPayload::FreeText(FreeTextData::default()),
            AnnotationKind::Stamp => KindPayload::Stamp {
                icon_name: None,
                rotation: Rotation::R0,
            },
            AnnotationKind::FileAttachment => {
                KindPayload::FileAttachment(FileAttachmentData::default())
            },
            AnnotationKind::Sound => KindPayload::Sound(None),
            AnnotationKind::Redact => KindPayload::Redact(RedactData::default()),
            AnnotationKind::PagingSeal => KindPayload::PagingSeal(None),
            AnnotationKind::Link => KindPayload::Link(LinkData::default()),
            AnnotationKind::Screen => KindPayload::Screen(ScreenData::default()),
            AnnotationKind::Widget => KindPayload::Widget(WidgetData::default()),
            AnnotationKind::Popup => KindPayload::Popup(PopupData::default()),
            _ => KindPayload::None,
        }
    }
}

impl KindPayload {
    /// Apply `m` to every coordinate the payload stores.
    pub(crate) fn transform(&mut self, m: &Matrix) {
        let quads = |list: &mut Vec<QuadPoints>| {
            for q in list.iter_mut() {
                *q = q.transform(m);
            }
        };
        match self {
            KindPayload::TextMarkup(q) => quads(q),
            KindPayload::Redact(data) => quads(&mut data.quads),
            KindPayload::Link(data) => quads(&mut data.quads),
            KindPayload::Line(line) => {
                line.start = line.start.map(|p| m.transform_point(p));
                line.end = line.end.map(|p| m.transform_point(p));
            },
            KindPayload::Shape(inner) => *inner = inner.map(|r| m.transform_rect(&r)),
            KindPayload::Poly(poly) => {
                for v in poly.vertexes.iter_mut() {
                    *v = m.transform_point(*v);
                }
            },
            KindPayload::Ink(path) => *path = path.transform(m),
            KindPayload::FreeText(ft) => {
                for p in ft.callout_points.iter_mut() {
                    *p = m.transform_point(*p);
                }
                ft.inner_rect = ft.inner_rect.map(|r| m.transform_rect(&r));
            },
            _ => {},
        }
    }

    /// Bounds of the geometry that defines the shape, for kinds drawn from
    /// their own geometry rather than from the rectangle.
    pub(crate) fn geometry_bounds(&self) -> Option<Rect> {
        match self {
            KindPayload::TextMarkup(q) => quads_bounding_rect(q),
            KindPayload::Redact(data) => quads_bounding_rect(&data.quads),
            KindPayload::Line(line) => Rect::bounding(&[line.start?, line.end?]),
            KindPayload::Poly(poly) => Rect::bounding(&poly.vertexes),
            KindPayload::Ink(path) => path.bounding_rect(),
            _ => None,
        }
    }
}

/// One annotation as stored by its page.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AnnotRecord {
    pub(crate) id: AnnotId,
    pub(crate) kind: AnnotationKind,
    pub(crate) rect: Rect,
    pub(crate) flags: AnnotationFlags,
    pub(crate) content: String,
    pub(crate) modified: Option<DateTime<Utc>>,
    pub(crate) unique_id: Option<String>,
    pub(crate) border: Option<BorderInfo>,
    pub(crate) border_color: Option<Color>,
    pub(crate) appearance: Option<AppearanceSet>,
    pub(crate) state: AppearanceState,
    pub(crate) markup: Option<MarkupData>,
    pub(crate) payload: KindPayload,
    /// Source dictionary of imported annotations
    pub(crate) raw: Option<Dict>,
}

impl AnnotRecord {
    pub(crate) fn new(kind: AnnotationKind, rect: Rect) -> Self {
        let flags = if kind.is_markup() {
            AnnotationFlags::PRINT
        } else {
            AnnotationFlags::empty()
        };
        Self {
            id: AnnotId::new(),
            kind,
            rect,
            flags,
            content: String::new(),
            modified: None,
            unique_id: None,
            border: None,
            border_color: None,
            appearance: None,
            state: AppearanceState::PropertiesDirty,
            markup: kind.is_markup().then(MarkupData::default),
            payload: KindPayload::for_kind(kind),
            raw: None,
        }
    }

    /// Mark the appearance stale. Unparsed records stay unparsed.
    pub(crate) fn touch(&mut self) {
        if self.state == AppearanceState::AppearanceConsistent {
            self.state = AppearanceState::PropertiesDirty;
        }
    }

    pub(crate) fn group_header(&self) -> Option<AnnotId> {
        self.markup.as_ref().and_then(|m| m.group_header)
    }

    pub(crate) fn is_group_primary(&self) -> bool {
        self.markup.as_ref().is_some_and(|m| !m.group_members.is_empty())
    }

    pub(crate) fn in_reply_to(&self) -> Option<AnnotId> {
        self.markup.as_ref().and_then(|m| m.in_reply_to)
    }

    pub(crate) fn popup(&self) -> Option<AnnotId> {
        self.markup.as_ref().and_then(|m| m.popup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_markup_record() {
        let rec = AnnotRecord::new(AnnotationKind::Highlight, Rect::default());
        assert!(rec.markup.is_some());
        assert!(rec.flags.contains(AnnotationFlags::PRINT));
        assert_eq!(rec.state, AppearanceState::PropertiesDirty);
        assert!(matches!(rec.payload, KindPayload::TextMarkup(ref q) if q.is_empty()));
    }

    #[test]
    fn test_new_non_markup_record() {
        let rec = AnnotRecord::new(AnnotationKind::Link, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(rec.markup.is_none());
        assert!(rec.flags.is_empty());
        assert!(matches!(rec.payload, KindPayload::Link(_)));
    }

    #[test]
    fn test_touch_keeps_unparsed() {
        let mut rec = AnnotRecord::new(AnnotationKind::Movie, Rect::default());
        rec.state = AppearanceState::Unparsed;
        rec.touch();
        assert_eq!(rec.state, AppearanceState::Unparsed);

        rec.state = AppearanceState::AppearanceConsistent;
        rec.touch();
        assert_eq!(rec.state, AppearanceState::PropertiesDirty);
    }

    #[test]
    fn test_payload_transform_and_bounds() {
        let mut payload = KindPayload::Line(LineData {
            start: Some(Point::new(0.0, 0.0)),
            end: Some(Point::new(10.0, 5.0)),
            ..LineData::default()
        });
        assert_eq!(payload.geometry_bounds(), Some(Rect::new(0.0, 0.0, 10.0, 5.0)));
        payload.transform(&Matrix::translation(5.0, 5.0));
        assert_eq!(payload.geometry_bounds(), Some(Rect::new(5.0, 5.0, 10.0, 5.0)));
        assert_eq!(KindPayload::for_kind(AnnotationKind::Line).geometry_bounds(), None);
    }

    #[test]
    fn test_payload_shared_between_kinds() {
        assert_eq!(
            KindPayload::for_kind(AnnotationKind::PSInk),
            KindPayload::for_kind(AnnotationKind::Ink)
        );
        assert_eq!(KindPayload::for_kind(AnnotationKind::ThreeD), KindPayload::None);
    }
}
