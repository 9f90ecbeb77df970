//! Appearance regeneration.
//!
//! [`AnnotMut::reset_appearance_stream`] reads the staged properties and
//! writes fresh Normal (and, where the kind has them, Rollover and Down)
//! streams. Properties still unset the first time an appearance is
//! generated are filled with the kind's defaults, so later reads report
//! what was drawn. Group subordinates never receive defaults for the
//! shared attributes.
//!
//! Kinds that cannot be drawn return `Ok(false)` and keep whatever
//! appearance they had.

use super::{Annot, AnnotMut, AnnotRecord, AppearanceSet, AppearanceState, KindPayload, LineData};
use crate::annotation_types::{
    intent, AnnotationKind, BorderInfo, BorderStyle, CaptionPosition, Color, DefaultAppearance,
    FieldType, LineEndingStyle, PathPointKind, QuadPoints, Rotation, StandardFont,
    TextAlignment,
};
use crate::error::Result;
use crate::geometry::{euclidean_distance, Matrix, Point, Rect};
use crate::writer::appearance_stream::{aligned_x, AppearanceStream, AppearanceStreamBuilder};
use crate::writer::font_metrics;
use uuid::Uuid;

/// Default note icon color.
const NOTE_YELLOW: Color = Color(0xFFFF_FF00);

/// Font size of line captions.
const CAPTION_FONT_SIZE: f32 = 9.0;

/// Space between a border and the text inside it.
const TEXT_PADDING: f32 = 2.0;

/// Largest size auto-sized text grows to.
const MAX_AUTO_FONT_SIZE: f32 = 12.0;

/// Overlay text appearance of redactions without their own `/DA`.
pub(crate) const REDACT_OVERLAY_DA: DefaultAppearance = DefaultAppearance {
    font: StandardFont::Helvetica,
    text_size: 12.0,
    text_color: Color::RED,
};

fn default_width(kind: AnnotationKind) -> f32 {
    match kind {
        AnnotationKind::Line
        | AnnotationKind::Ink
        | AnnotationKind::Polygon
        | AnnotationKind::PolyLine
        | AnnotationKind::Square
        | AnnotationKind::Circle => 2.0,
        AnnotationKind::Link => 0.0,
        _ => 1.0,
    }
}

fn default_color(kind: AnnotationKind) -> Option<Color> {
    match kind {
        AnnotationKind::Highlight => Some(Color::HIGHLIGHT_YELLOW),
        AnnotationKind::Underline => Some(Color::GREEN),
        AnnotationKind::Squiggly => Some(Color::ORANGE),
        AnnotationKind::StrikeOut
        | AnnotationKind::Line
        | AnnotationKind::Ink
        | AnnotationKind::Polygon
        | AnnotationKind::PolyLine
        | AnnotationKind::Square
        | AnnotationKind::Circle
        | AnnotationKind::FreeText
        | AnnotationKind::Redact
        | AnnotationKind::Stamp
        | AnnotationKind::PagingSeal => Some(Color::RED),
        AnnotationKind::Caret | AnnotationKind::FileAttachment | AnnotationKind::Sound => {
            Some(Color::BLUE)
        },
        AnnotationKind::Note => Some(NOTE_YELLOW),
        AnnotationKind::Screen | AnnotationKind::Widget => Some(Color::BLACK),
        _ => None,
    }
}

/// Size of a line ending drawn with a stroke of `width`.
fn ending_size(width: f32) -> f32 {
    (width * 3.0).max(6.0)
}

fn is_callout(rec: &AnnotRecord) -> bool {
    rec.kind == AnnotationKind::FreeText
        && rec.markup.as_ref().and_then(|m| m.intent.as_deref()) == Some(intent::FREE_TEXT_CALLOUT)
}

/// Why `rec` cannot be drawn, if it cannot.
fn missing_requirement(rec: &AnnotRecord) -> Option<&'static str> {
    if rec.state == AppearanceState::Unparsed {
        return Some("dictionary was not parsed");
    }
    let reason = match &rec.payload {
        KindPayload::None | KindPayload::Popup(_) => Some("kind has no generated appearance"),
        KindPayload::Ink(_) if rec.kind == AnnotationKind::PSInk => {
            Some("pressure-sensitive ink is never regenerated")
        },
        KindPayload::Ink(path) if !path.is_valid() => Some("ink list is empty"),
        KindPayload::TextMarkup(quads) if quads.is_empty() => Some("no quad points"),
        KindPayload::Redact(data) if data.quads.is_empty() => Some("no quad points"),
        KindPayload::Line(line) if line.start.is_none() || line.end.is_none() => {
            Some("start or end point missing")
        },
        KindPayload::Poly(poly) if poly.vertexes.len() < 2 => Some("fewer than two vertexes"),
        KindPayload::FreeText(ft) if is_callout(rec) && !(2..=3).contains(&ft.callout_points.len()) => {
            Some("callout needs two or three callout points")
        },
        KindPayload::Widget(widget) => match &widget.field {
            None => Some("widget is not associated with a form field"),
            Some(field) if field.is_signature() => Some("signature widgets are drawn when signing"),
            Some(_) => None,
        },
        _ => None,
    };
    if reason.is_some() {
        return reason;
    }
    if rec.rect.is_degenerate() && rec.payload.geometry_bounds().is_none() {
        return Some("degenerate rectangle");
    }
    None
}

/// Fill unset appearance properties with the kind's defaults.
fn materialize_defaults(rec: &mut AnnotRecord) {
    let subordinate = rec.group_header().is_some();
    if rec.border.is_none() {
        rec.border = Some(BorderInfo::solid(default_width(rec.kind)));
    }
    if !subordinate && rec.border_color.is_none() {
        rec.border_color = match &rec.payload {
            KindPayload::Widget(widget) => widget.mk.border_color.or(Some(Color::BLACK)),
            _ => default_color(rec.kind),
        };
    }
    if let Some(markup) = rec.markup.as_mut() {
        markup.opacity.get_or_insert(1.0);
    }
    match &mut rec.payload {
        KindPayload::FreeText(ft) => {
            ft.da
                .get_or_insert_with(|| DefaultAppearance::new(StandardFont::Helvetica, 12.0, Color::BLUE));
            ft.alignment.get_or_insert(TextAlignment::Left);
        },
        KindPayload::Redact(data) => {
            data.apply_fill_color.get_or_insert(Color::BLACK);
            data.da.get_or_insert(REDACT_OVERLAY_DA);
        },
        KindPayload::Note(note) => {
            note.icon_name.get_or_insert_with(|| "Note".to_string());
        },
        KindPayload::Stamp { icon_name, .. } => {
            icon_name.get_or_insert_with(|| "Draft".to_string());
        },
        KindPayload::FileAttachment(data) => {
            data.icon_name.get_or_insert_with(|| "PushPin".to_string());
        },
        KindPayload::Sound(icon_name) => {
            icon_name.get_or_insert_with(|| "Speaker".to_string());
        },
        _ => {},
    }
}

/// A line's drawn segment and leader lines, after applying the leader
/// length.
struct LineLayout {
    start: Point,
    end: Point,
    leaders: Vec<(Point, Point)>,
}

impl LineLayout {
    fn new(line: &LineData) -> Option<Self> {
        let (s, e) = (line.start?, line.end?);
        let len = euclidean_distance(&s, &e);
        if line.leader_length == 0.0 || len == 0.0 {
            return Some(Self {
                start: s,
                end: e,
                leaders: Vec::new(),
            });
        }
        let normal = Point::new(-(e.y - s.y) / len, (e.x - s.x) / len);
        let offset = |p: Point, d: f32| Point::new(p.x + normal.x * d, p.y + normal.y * d);
        let ll = line.leader_length;
        let sign = ll.signum();
        let leader = |p: Point| {
            (
                offset(p, sign * line.leader_offset),
                offset(p, ll + sign * line.leader_extension),
            )
        };
        Some(Self {
            start: offset(s, ll),
            end: offset(e, ll),
            leaders: vec![leader(s), leader(e)],
        })
    }

    fn bounds(&self) -> Option<Rect> {
        let mut points = vec![self.start, self.end];
        for (a, b) in &self.leaders {
            points.push(*a);
            points.push(*b);
        }
        Rect::bounding(&points)
    }

    fn angle(&self) -> f32 {
        (self.end.y - self.start.y).atan2(self.end.x - self.start.x)
    }
}

/// Rectangle the appearance needs, given the staged geometry.
fn fitted_rect(view: &Annot<'_>) -> Option<Rect> {
    let rec = view.rec;
    let width = rec.border.as_ref().map_or(0.0, |b| b.width);
    let geometry = match &rec.payload {
        KindPayload::Line(line) => {
            let layout = LineLayout::new(line)?;
            let mut margin = width / 2.0 + ending_size(width);
            if line.caption {
                margin += CAPTION_FONT_SIZE * 1.5;
            }
            layout.bounds().map(|b| b.inflate(margin))
        },
        KindPayload::Poly(poly) => {
            let margin = if rec.kind == AnnotationKind::PolyLine {
                width / 2.0 + ending_size(width)
            } else {
                width / 2.0 + width.max(1.0) * 4.0
            };
            Rect::bounding(&poly.vertexes).map(|b| b.inflate(margin))
        },
        KindPayload::FreeText(ft) if !ft.callout_points.is_empty() => Rect::bounding(&ft.callout_points)
            .map(|b| b.inflate(width / 2.0 + ending_size(width))),
        payload => payload.geometry_bounds().map(|b| b.inflate(width.max(1.0))),
    };
    let rect = match geometry {
        Some(g) if rec.rect.is_degenerate() => g,
        Some(g) => rec.rect.union(&g),
        None => rec.rect,
    };
    (!rect.is_degenerate()).then_some(rect)
}

impl<'p> AnnotMut<'p> {
    /// Regenerate the appearance from the staged properties.
    ///
    /// Returns `Ok(false)` when the annotation cannot be drawn: popups,
    /// pressure-sensitive ink, unparsed or unsupported kinds, widgets
    /// without a form field or on a signature field, and kinds whose
    /// required geometry (quads, line points, ink list, vertexes, callout
    /// points) is missing. The previous appearance is left untouched.
    pub fn reset_appearance_stream(&mut self) -> Result<bool> {
        self.reset_appearance_stream_with(false)
    }

    /// Regenerate the appearance. With `new_object` the result gets a new
    /// appearance object instead of rewriting the shared one, so widgets
    /// that shared it keep their old appearance.
    pub fn reset_appearance_stream_with(&mut self, new_object: bool) -> Result<bool> {
        let kind = self.kind();
        if let Some(reason) = missing_requirement(self.rec()) {
            log::debug!("Cannot regenerate {:?} annotation {}: {}", kind, self.id, reason);
            return Ok(false);
        }

        materialize_defaults(self.rec_mut());

        let Some(rect) = fitted_rect(&self.view()) else {
            log::debug!("Cannot regenerate {:?} annotation {}: no drawable area", kind, self.id);
            return Ok(false);
        };
        {
            let rec = self.rec_mut();
            if let KindPayload::FreeText(ft) = &mut rec.payload {
                if !ft.callout_points.is_empty() && ft.inner_rect.is_none() && rect != rec.rect {
                    ft.inner_rect = Some(rec.rect);
                }
            }
            rec.rect = rect;
        }

        let rendered = render(&self.view());
        let rec = self.rec_mut();
        let previous = rec.appearance.take();
        let object_id = match (&previous, new_object) {
            (Some(set), false) => set.object_id,
            _ => Uuid::new_v4(),
        };
        rec.appearance = Some(AppearanceSet {
            normal: rendered.normal,
            rollover: rendered.rollover,
            down: rendered.down,
            object_id,
            other_states: previous.map(|set| set.other_states).unwrap_or_default(),
        });
        rec.state = AppearanceState::AppearanceConsistent;
        log::debug!("Regenerated appearance of {:?} annotation {}", kind, self.id);
        Ok(true)
    }
}

struct Rendered {
    normal: AppearanceStream,
    rollover: Option<AppearanceStream>,
    down: Option<AppearanceStream>,
}

impl Rendered {
    fn normal(builder: AppearanceStreamBuilder) -> Self {
        Self {
            normal: builder.finish(),
            rollover: None,
            down: None,
        }
    }
}

/// Stroke and fill settings shared by every kind.
struct Style {
    width: f32,
    border: BorderInfo,
    color: Color,
    fill: Option<Color>,
    opacity: f32,
}

impl Style {
    fn of(view: &Annot<'_>) -> Self {
        let kind = view.kind();
        let border = view
            .border()
            .cloned()
            .unwrap_or_else(|| BorderInfo::solid(default_width(kind)));
        Self {
            width: border.width,
            color: view.border_color().or(default_color(kind)).unwrap_or(Color::BLACK),
            fill: view.fill_color(),
            opacity: view.opacity().unwrap_or(1.0),
            border,
        }
    }

    fn begin(&self, rect: Rect) -> AppearanceStreamBuilder {
        let mut b = AppearanceStreamBuilder::new(rect);
        b.opacity(self.opacity);
        b.stroke_color(self.color).border_style(&self.border);
        if let Some(fill) = self.fill {
            b.fill_color(fill);
        }
        b
    }

    fn is_cloudy(&self) -> bool {
        self.border.style == BorderStyle::Cloudy && self.border.cloud_intensity > 0.0
    }
}

fn render(view: &Annot<'_>) -> Rendered {
    let style = Style::of(view);
    let rect = view.rect();
    match &view.rec.payload {
        KindPayload::TextMarkup(quads) => Rendered::normal(text_markup(view.kind(), quads, &style, rect)),
        KindPayload::Shape(inner) => Rendered::normal(shape(view.kind(), inner.unwrap_or(rect), &style, rect)),
        KindPayload::Line(line) => Rendered::normal(line_appearance(view, line, &style, rect)),
        KindPayload::Poly(poly) => {
            let mut b = style.begin(rect);
            if view.kind() == AnnotationKind::Polygon {
                let cloudy = style.is_cloudy() || view.intent() == Some(intent::POLYGON_CLOUD);
                if cloudy {
                    let intensity = style.border.cloud_intensity.max(1.0);
                    b.cloudy_outline(&poly.vertexes, intensity);
                } else {
                    b.polyline(&poly.vertexes, true);
                }
                b.paint(style.fill.is_some(), style.width > 0.0);
            } else {
                b.polyline(&poly.vertexes, false).stroke();
                draw_endings(&mut b, &poly.vertexes, poly.endings, &style);
            }
            Rendered::normal(b)
        },
        KindPayload::Ink(path) => {
            let mut b = style.begin(rect);
            b.round_caps();
            let mut pending: Vec<Point> = Vec::with_capacity(3);
            for p in path.points() {
                match p.kind {
                    PathPointKind::MoveTo => {
                        b.move_to(p.point);
                    },
                    PathPointKind::LineTo => {
                        b.line_to(p.point);
                    },
                    PathPointKind::BezierTo => {
                        pending.push(p.point);
                        if pending.len() == 3 {
                            b.curve_to(pending[0], pending[1], pending[2]);
                            pending.clear();
                        }
                    },
                }
            }
            b.stroke();
            Rendered::normal(b)
        },
        KindPayload::FreeText(ft) => {
            let mut b = style.begin(rect);
            let inner = ft.inner_rect.unwrap_or(rect);
            let box_rect = inner.inflate(-style.width / 2.0);
            let typewriter = view.intent() == Some(intent::FREE_TEXT_TYPEWRITER);
            if !typewriter {
                if style.is_cloudy() {
                    b.cloudy_rect(&box_rect, style.border.cloud_intensity);
                } else {
                    b.rect(&box_rect);
                }
                b.paint(style.fill.is_some(), style.width > 0.0);
            }
            if ft.callout_points.len() >= 2 {
                b.polyline(&ft.callout_points, false).stroke();
                b.fill_color(style.fill.unwrap_or(style.color));
                b.line_ending(
                    ft.callout_points[1],
                    ft.callout_points[0],
                    ft.callout_ending,
                    ending_size(style.width),
                );
            }
            let da = ft.da.clone().unwrap_or_default();
            let alignment = ft.alignment.unwrap_or_default();
            let text_rect = inner.inflate(-(style.width + TEXT_PADDING));
            rotated(&mut b, &text_rect, ft.rotation, |b, area| {
                if view.rich_text_count() > 0 {
                    rich_text(b, area, view);
                } else {
                    text_box(b, area, view.content(), &da, alignment);
                }
            });
            Rendered::normal(b)
        },
        KindPayload::Stamp { icon_name, rotation } => {
            let mut b = style.begin(rect);
            let frame = rect.inflate(-style.width.max(1.0));
            b.rect(&frame).stroke();
            let label = icon_name.as_deref().unwrap_or("Draft").to_uppercase();
            rotated(&mut b, &frame.inflate(-TEXT_PADDING), *rotation, |b, area| {
                let font = StandardFont::HelveticaBold;
                let size = font_metrics::fit_font_size(font, &label, area.width, area.height, 72.0);
                let da = DefaultAppearance::new(font, size, style.color);
                text_box(b, area, &label, &da, TextAlignment::Center);
            });
            Rendered::normal(b)
        },
        KindPayload::Note(note) => Rendered::normal(icon(note.icon_name.as_deref(), "Note", &style, rect)),
        KindPayload::FileAttachment(data) => {
            Rendered::normal(icon(data.icon_name.as_deref(), "PushPin", &style, rect))
        },
        KindPayload::Sound(name) => Rendered::normal(icon(name.as_deref(), "Speaker", &style, rect)),
        KindPayload::Redact(data) => {
            let mut normal = style.begin(rect);
            for quad in &data.quads {
                quad_outline(&mut normal, quad);
                normal.stroke();
            }
            let preview = || {
                let mut b = AppearanceStreamBuilder::new(rect);
                let fill = data.apply_fill_color.unwrap_or(Color::BLACK);
                let da = data.da.clone().unwrap_or(REDACT_OVERLAY_DA);
                for quad in &data.quads {
                    let area = quad.bounding_rect();
                    b.fill_color(fill).rect(&area).fill();
                    if let Some(text) = data.overlay_text.as_deref() {
                        overlay_text(&mut b, &area, text, &da, data.alignment, data.repeat, data.auto_font_size);
                    }
                }
                b.stroke_color(style.color).line_width(style.width);
                for quad in &data.quads {
                    quad_outline(&mut b, quad);
                    b.stroke();
                }
                b.finish()
            };
            Rendered {
                normal: normal.finish(),
                rollover: Some(preview()),
                down: Some(preview()),
            }
        },
        KindPayload::PagingSeal(name) => {
            let mut b = style.begin(rect);
            b.rect(&rect.inflate(-style.width / 2.0)).stroke();
            if let Some(name) = name.as_deref() {
                let area = rect.inflate(-(style.width + TEXT_PADDING));
                let size = font_metrics::fit_font_size(
                    StandardFont::Helvetica,
                    name,
                    area.width,
                    area.height,
                    MAX_AUTO_FONT_SIZE,
                );
                let da = DefaultAppearance::new(StandardFont::Helvetica, size, style.color);
                text_box(&mut b, &area, name, &da, TextAlignment::Center);
            }
            Rendered::normal(b)
        },
        KindPayload::Link(_) | KindPayload::Screen(_) => {
            let mut b = style.begin(rect);
            if style.width > 0.0 {
                b.rect(&rect.inflate(-style.width / 2.0)).stroke();
            }
            Rendered::normal(b)
        },
        KindPayload::Widget(widget) => {
            let mk = &widget.mk;
            let push_button = widget
                .field
                .as_ref()
                .is_some_and(|f| f.field_type == FieldType::PushButton);
            let draw = |background: Option<Color>, caption: Option<&str>| {
                let mut b = AppearanceStreamBuilder::new(rect);
                if let Some(bg) = background {
                    b.fill_color(bg).rect(&rect).fill();
                }
                let border_color = mk.border_color.or(view.border_color());
                if let Some(bc) = border_color {
                    if style.width > 0.0 {
                        b.stroke_color(bc)
                            .border_style(&style.border)
                            .rect(&rect.inflate(-style.width / 2.0))
                            .stroke();
                    }
                }
                if let Some(caption) = caption {
                    let area = rect.inflate(-(style.width + TEXT_PADDING));
                    rotated(&mut b, &area, mk.rotation, |b, area| {
                        let size = font_metrics::fit_font_size(
                            StandardFont::Helvetica,
                            caption,
                            area.width,
                            area.height,
                            MAX_AUTO_FONT_SIZE,
                        );
                        let da = DefaultAppearance::new(StandardFont::Helvetica, size, Color::BLACK);
                        text_box(b, area, caption, &da, TextAlignment::Center);
                    });
                }
                b.finish()
            };
            let normal_caption = mk.normal_caption.as_deref();
            let normal = draw(mk.background_color, normal_caption);
            if !push_button {
                return Rendered {
                    normal,
                    rollover: None,
                    down: None,
                };
            }
            let rollover = draw(
                mk.background_color,
                mk.rollover_caption.as_deref().or(normal_caption),
            );
            let down = draw(
                mk.background_color.map(darken),
                mk.down_caption.as_deref().or(normal_caption),
            );
            Rendered {
                normal,
                rollover: Some(rollover),
                down: Some(down),
            }
        },
        KindPayload::None | KindPayload::Popup(_) => Rendered::normal(AppearanceStreamBuilder::new(rect)),
    }
}

fn darken(color: Color) -> Color {
    let [r, g, b] = color.rgb();
    Color::from_rgb_f32(r * 0.75, g * 0.75, b * 0.75)
}

fn lerp(a: Point, b: Point, t: f32) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

fn quad_outline(b: &mut AppearanceStreamBuilder, quad: &QuadPoints) {
    b.polyline(&[quad.first, quad.second, quad.fourth, quad.third], true);
}

fn text_markup(
    kind: AnnotationKind,
    quads: &[QuadPoints],
    style: &Style,
    rect: Rect,
) -> AppearanceStreamBuilder {
    let mut b = style.begin(rect);
    match kind {
        AnnotationKind::Highlight => {
            b.fill_color(style.color);
            for quad in quads {
                quad_outline(&mut b, quad);
                b.fill();
            }
        },
        AnnotationKind::StrikeOut => {
            for quad in quads {
                b.move_to(lerp(quad.third, quad.first, 0.5))
                    .line_to(lerp(quad.fourth, quad.second, 0.5))
                    .stroke();
            }
        },
        AnnotationKind::Underline => {
            for quad in quads {
                b.move_to(lerp(quad.third, quad.first, 0.1))
                    .line_to(lerp(quad.fourth, quad.second, 0.1))
                    .stroke();
            }
        },
        _ => {
            for quad in quads {
                let start = lerp(quad.third, quad.first, 0.1);
                let end = lerp(quad.fourth, quad.second, 0.1);
                let height = euclidean_distance(&quad.third, &quad.first);
                let amplitude = (height * 0.06).max(0.5);
                let step = (height / 4.0).max(1.0);
                let len = euclidean_distance(&start, &end);
                let steps = (len / step).ceil().max(1.0) as usize;
                let (ux, uy) = if len > 0.0 {
                    ((end.x - start.x) / len, (end.y - start.y) / len)
                } else {
                    (1.0, 0.0)
                };
                let points: Vec<Point> = (0..=steps)
                    .map(|i| {
                        let p = lerp(start, end, i as f32 / steps as f32);
                        let side = if i % 2 == 0 { -amplitude } else { amplitude };
                        Point::new(p.x - uy * side, p.y + ux * side)
                    })
                    .collect();
                b.polyline(&points, false).stroke();
            }
        },
    }
    b
}

fn shape(kind: AnnotationKind, area: Rect, style: &Style, rect: Rect) -> AppearanceStreamBuilder {
    let mut b = style.begin(rect);
    let inset = area.inflate(-style.width / 2.0);
    match kind {
        AnnotationKind::Caret => {
            b.fill_color(style.color)
                .move_to(Point::new(inset.left(), inset.bottom()))
                .curve_to(
                    Point::new(inset.center().x, inset.bottom()),
                    Point::new(inset.center().x, inset.bottom()),
                    Point::new(inset.center().x, inset.top()),
                )
                .curve_to(
                    Point::new(inset.center().x, inset.bottom()),
                    Point::new(inset.center().x, inset.bottom()),
                    Point::new(inset.right(), inset.bottom()),
                )
                .close()
                .fill();
        },
        AnnotationKind::Circle => {
            if style.is_cloudy() {
                b.cloudy_rect(&inset, style.border.cloud_intensity);
            } else {
                b.ellipse(&inset);
            }
            b.paint(style.fill.is_some(), style.width > 0.0);
        },
        _ => {
            if style.is_cloudy() {
                b.cloudy_rect(&inset, style.border.cloud_intensity);
            } else {
                b.rect(&inset);
            }
            b.paint(style.fill.is_some(), style.width > 0.0);
        },
    }
    b
}

fn draw_endings(
    b: &mut AppearanceStreamBuilder,
    points: &[Point],
    endings: (LineEndingStyle, LineEndingStyle),
    style: &Style,
) {
    let n = points.len();
    if n < 2 {
        return;
    }
    b.fill_color(style.fill.unwrap_or(style.color));
    let size = ending_size(style.width);
    b.line_ending(points[1], points[0], endings.0, size);
    b.line_ending(points[n - 2], points[n - 1], endings.1, size);
}

fn line_appearance(view: &Annot<'_>, line: &LineData, style: &Style, rect: Rect) -> AppearanceStreamBuilder {
    let mut b = style.begin(rect);
    let Some(layout) = LineLayout::new(line) else {
        return b;
    };
    for (from, to) in &layout.leaders {
        b.move_to(*from).line_to(*to).stroke();
    }

    let caption = view.content();
    let show_caption = line.caption && !caption.is_empty();
    let font = StandardFont::Helvetica;
    let text_width = font_metrics::text_width(font, caption, CAPTION_FONT_SIZE);
    let length = euclidean_distance(&layout.start, &layout.end);
    let inline = show_caption && line.caption_position == CaptionPosition::Inline;

    if inline && text_width + 2.0 * TEXT_PADDING < length {
        let gap = (text_width / 2.0 + TEXT_PADDING) / length;
        let mid = 0.5 + line.caption_offset.x / length;
        b.move_to(layout.start)
            .line_to(lerp(layout.start, layout.end, (mid - gap).max(0.0)))
            .move_to(lerp(layout.start, layout.end, (mid + gap).min(1.0)))
            .line_to(layout.end)
            .stroke();
    } else {
        b.move_to(layout.start).line_to(layout.end).stroke();
    }
    draw_endings(&mut b, &[layout.start, layout.end], line.endings, style);

    if show_caption {
        let (ascender, descender) = font_metrics::vertical_metrics(font);
        let baseline = if line.caption_position == CaptionPosition::Top {
            style.width / 2.0 + TEXT_PADDING - descender * CAPTION_FONT_SIZE / 1000.0
        } else {
            -(ascender + descender) / 2.0 * CAPTION_FONT_SIZE / 1000.0
        };
        let mid = lerp(layout.start, layout.end, 0.5);
        let placement = Matrix::translation(-text_width / 2.0 + line.caption_offset.x, baseline + line.caption_offset.y)
            .multiply(&Matrix::rotation(layout.angle().to_degrees()))
            .multiply(&Matrix::translation(mid.x, mid.y));
        b.save().transform(placement);
        b.text_line(font, CAPTION_FONT_SIZE, style.color, Point::new(0.0, 0.0), caption);
        b.restore();
    }
    b
}

fn icon(name: Option<&str>, fallback: &str, style: &Style, rect: Rect) -> AppearanceStreamBuilder {
    let mut b = AppearanceStreamBuilder::new(rect);
    b.opacity(style.opacity);
    b.fill_color(style.color)
        .stroke_color(Color::BLACK)
        .line_width(0.5)
        .icon(name.unwrap_or(fallback), &rect);
    b
}

/// Run `draw` with the text area rotated about its center.
fn rotated(
    b: &mut AppearanceStreamBuilder,
    area: &Rect,
    rotation: Rotation,
    draw: impl FnOnce(&mut AppearanceStreamBuilder, &Rect),
) {
    if area.is_degenerate() {
        return;
    }
    if rotation == Rotation::R0 {
        draw(b, area);
        return;
    }
    let center = area.center();
    let (w, h) = match rotation {
        Rotation::R90 | Rotation::R270 => (area.height, area.width),
        _ => (area.width, area.height),
    };
    let local = Rect::new(-w / 2.0, -h / 2.0, w, h);
    let m = Matrix::rotation(rotation.degrees() as f32).multiply(&Matrix::translation(center.x, center.y));
    b.save().transform(m);
    draw(b, &local);
    b.restore();
}

/// Wrapped text in `area`. A zero text size is fitted to the area.
fn text_box(
    b: &mut AppearanceStreamBuilder,
    area: &Rect,
    text: &str,
    da: &DefaultAppearance,
    alignment: TextAlignment,
) {
    if text.is_empty() || area.is_degenerate() {
        return;
    }
    let size = if da.text_size > 0.0 {
        da.text_size
    } else {
        font_metrics::fit_font_size(da.font, text, area.width, area.height, MAX_AUTO_FONT_SIZE)
    };
    let lines = font_metrics::wrap_text(da.font, text, size, area.width);
    b.text_block(area, &lines, da.font, size, da.text_color, alignment);
}

/// Rich text runs laid out one after another, each with its own style.
fn rich_text(b: &mut AppearanceStreamBuilder, area: &Rect, view: &Annot<'_>) {
    let mut top = area.top();
    b.save().rect(area).clip();
    for run in view.rich_text_runs() {
        let style = &run.style;
        let font = style.effective_font();
        let size = style.text_size.max(1.0);
        let (ascender, descender) = font_metrics::vertical_metrics(font);
        for line in font_metrics::wrap_text(font, &run.text, size, area.width) {
            let width = font_metrics::text_width(font, &line, size);
            let x = aligned_x(area, width, style.text_alignment);
            let mut baseline = top - ascender * size / 1000.0;
            match style.mark_style {
                crate::annotation_types::CornerMark::Superscript => baseline += size * 0.33,
                crate::annotation_types::CornerMark::Subscript => baseline -= size * 0.2,
                crate::annotation_types::CornerMark::None => {},
            }
            b.text_line(font, size, style.text_color, Point::new(x, baseline), &line);
            let rule = |offset: f32| {
                (
                    Point::new(x, baseline + offset),
                    Point::new(x + width, baseline + offset),
                )
            };
            let mut rules = Vec::new();
            if style.is_underline {
                rules.push(rule(descender * size / 2000.0));
            }
            if style.is_strikethrough {
                rules.push(rule(ascender * size / 3000.0));
            }
            if !rules.is_empty() {
                b.stroke_color(style.text_color).line_width((size / 18.0).max(0.5));
                for (from, to) in rules {
                    b.move_to(from).line_to(to).stroke();
                }
            }
            top -= font_metrics::line_height(size);
        }
    }
    b.restore();
}

/// Overlay text of a redaction, optionally repeated to fill `area`.
pub(crate) fn overlay_text(
    b: &mut AppearanceStreamBuilder,
    area: &Rect,
    text: &str,
    da: &DefaultAppearance,
    alignment: TextAlignment,
    repeat: bool,
    auto_size: bool,
) {
    let lines = overlay_lines(area, text, da, repeat, auto_size);
    if let Some((size, lines)) = lines {
        b.text_block(area, &lines, da.font, size, da.text_color, alignment);
    }
}

/// Font size and lines of a redaction overlay inside `area`.
pub(crate) fn overlay_lines(
    area: &Rect,
    text: &str,
    da: &DefaultAppearance,
    repeat: bool,
    auto_size: bool,
) -> Option<(f32, Vec<String>)> {
    if text.is_empty() || area.is_degenerate() {
        return None;
    }
    let size = if auto_size || da.text_size <= 0.0 {
        font_metrics::fit_font_size(da.font, text, area.width, area.height, area.height)
    } else {
        da.text_size
    };
    if size <= 0.0 {
        return None;
    }
    if !repeat {
        return Some((size, vec![text.to_string()]));
    }
    let unit = font_metrics::text_width(da.font, &format!("{} ", text), size);
    let per_line = if unit > 0.0 {
        ((area.width / unit).floor() as usize).max(1)
    } else {
        1
    };
    let line_count = ((area.height / font_metrics::line_height(size)).floor() as usize).max(1);
    let line = vec![text; per_line].join(" ");
    Some((size, vec![line; line_count]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation_types::{AppearanceMode, InkPath, StateModel, AnnotState, WidgetCharacteristics};
    use crate::annotations::FieldInfo;
    use crate::editor::Page;
    use crate::geometry::Rect;

    fn page() -> Page {
        Page::new(Rect::new(0.0, 0.0, 612.0, 792.0))
    }

    fn highlight_quad() -> QuadPoints {
        QuadPoints::new(
            Point::new(0.0, 100.0),
            Point::new(50.0, 100.0),
            Point::new(0.0, 90.0),
            Point::new(50.0, 90.0),
        )
    }

    #[test]
    fn test_highlight_defaults() {
        let mut page = page();
        let h = page.add_annot(AnnotationKind::Highlight, Rect::default()).unwrap();
        let mut hl = page.annot_mut(h).unwrap();
        hl.set_quad_points(vec![highlight_quad()]).unwrap();
        assert!(hl.reset_appearance_stream().unwrap());

        let view = hl.view();
        assert_eq!(view.border().map(|b| b.width), Some(1.0));
        assert_eq!(view.border_color(), Some(Color::HIGHLIGHT_YELLOW));
        assert_eq!(view.opacity(), Some(1.0));
        assert_eq!(view.appearance_state(), AppearanceState::AppearanceConsistent);
        assert!(view.rect().contains_rect(&highlight_quad().bounding_rect()));
        let content = view.appearance(AppearanceMode::Normal).unwrap().content_str();
        assert!(content.contains("0 100 m"));
        assert!(!content.contains("gs"));
    }

    #[test]
    fn test_missing_geometry_fails() {
        let mut page = page();
        for kind in [
            AnnotationKind::Highlight,
            AnnotationKind::Underline,
            AnnotationKind::StrikeOut,
            AnnotationKind::Squiggly,
            AnnotationKind::Line,
            AnnotationKind::Ink,
            AnnotationKind::Polygon,
            AnnotationKind::PolyLine,
        ] {
            let h = page.add_annot(kind, Rect::default()).unwrap();
            let mut annot = page.annot_mut(h).unwrap();
            assert!(!annot.reset_appearance_stream().unwrap(), "{:?}", kind);
            assert!(!annot.view().has_appearance());
            assert_eq!(annot.view().border(), None);
        }
    }

    #[test]
    fn test_failure_keeps_prior_appearance() {
        let mut page = page();
        let h = page.add_annot(AnnotationKind::Highlight, Rect::default()).unwrap();
        let mut hl = page.annot_mut(h).unwrap();
        hl.set_quad_points(vec![highlight_quad()]).unwrap();
        assert!(hl.reset_appearance_stream().unwrap());
        let before = hl.view().appearance(AppearanceMode::Normal).cloned();

        hl.set_quad_points(Vec::new()).unwrap();
        assert!(!hl.reset_appearance_stream().unwrap());
        assert_eq!(hl.view().appearance(AppearanceMode::Normal).cloned(), before);
        assert_eq!(hl.view().appearance_state(), AppearanceState::PropertiesDirty);
    }

    #[test]
    fn test_regeneration_is_idempotent() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::FreeText, Rect::new(100.0, 100.0, 200.0, 80.0))
            .unwrap();
        let mut ft = page.annot_mut(h).unwrap();
        ft.set_content("Idempotent text that wraps over a few lines");
        assert!(ft.reset_appearance_stream().unwrap());
        let first = ft.view().appearance(AppearanceMode::Normal).unwrap().content.clone();
        assert!(ft.reset_appearance_stream().unwrap());
        let second = ft.view().appearance(AppearanceMode::Normal).unwrap().content.clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_explicit_values_win_over_defaults() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0))
            .unwrap();
        let mut square = page.annot_mut(h).unwrap();
        square.set_border_color(Color::BLUE);
        square.set_border(BorderInfo::solid(4.0)).unwrap();
        assert!(square.reset_appearance_stream().unwrap());
        let content = square.view().appearance(AppearanceMode::Normal).unwrap().content_str();
        assert!(content.contains("0 0 1 RG"));
        assert!(content.contains("4 w"));
    }

    #[test]
    fn test_line_needs_points() {
        let mut page = page();
        let h = page.add_annot(AnnotationKind::Line, Rect::default()).unwrap();
        let mut line = page.annot_mut(h).unwrap();
        assert!(!line.reset_appearance_stream().unwrap());
        line.set_start_point(Point::new(10.0, 10.0)).unwrap();
        assert!(!line.reset_appearance_stream().unwrap());
        line.set_end_point(Point::new(200.0, 10.0)).unwrap();
        assert!(line.reset_appearance_stream().unwrap());
        assert_eq!(line.view().border().map(|b| b.width), Some(2.0));
        assert_eq!(line.view().border_color(), Some(Color::RED));
    }

    #[test]
    fn test_line_caption_is_drawn() {
        let mut page = page();
        let h = page.add_annot(AnnotationKind::Line, Rect::default()).unwrap();
        let mut line = page.annot_mut(h).unwrap();
        line.set_start_point(Point::new(10.0, 10.0)).unwrap();
        line.set_end_point(Point::new(210.0, 10.0)).unwrap();
        line.set_content("12 cm");
        line.enable_caption(true).unwrap();
        line.set_line_endings(LineEndingStyle::ClosedArrow, LineEndingStyle::ClosedArrow)
            .unwrap();
        assert!(line.reset_appearance_stream().unwrap());
        let content = line.view().appearance(AppearanceMode::Normal).unwrap().content_str();
        assert!(content.contains("(12 cm) Tj"));
        assert!(content.contains(" cm\n"));
    }

    #[test]
    fn test_incapable_kinds() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Square, Rect::new(10.0, 10.0, 50.0, 50.0))
            .unwrap();
        let popup = page
            .annot_mut(h)
            .unwrap()
            .add_popup(Rect::new(100.0, 100.0, 100.0, 50.0))
            .unwrap();
        assert!(!page.annot_mut(popup).unwrap().reset_appearance_stream().unwrap());

        let ps = page.add_annot(AnnotationKind::PSInk, Rect::default()).unwrap();
        assert!(!page.annot_mut(ps).unwrap().reset_appearance_stream().unwrap());

        let widget = page
            .add_annot(AnnotationKind::Widget, Rect::new(10.0, 10.0, 80.0, 20.0))
            .unwrap();
        let mut w = page.annot_mut(widget).unwrap();
        assert!(!w.reset_appearance_stream().unwrap());
        w.set_field(FieldInfo::new("sig", FieldType::Signature)).unwrap();
        assert!(!w.reset_appearance_stream().unwrap());
        w.set_field(FieldInfo::new("name", FieldType::Text)).unwrap();
        assert!(w.reset_appearance_stream().unwrap());
    }

    #[test]
    fn test_push_button_states_and_new_object() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Widget, Rect::new(10.0, 10.0, 80.0, 20.0))
            .unwrap();
        let mut w = page.annot_mut(h).unwrap();
        w.set_field(FieldInfo::new("ok", FieldType::PushButton)).unwrap();
        w.set_mk(WidgetCharacteristics {
            background_color: Some(Color::WHITE),
            normal_caption: Some("OK".to_string()),
            down_caption: Some("Pressed".to_string()),
            ..WidgetCharacteristics::default()
        })
        .unwrap();
        assert!(w.reset_appearance_stream().unwrap());
        let view = w.view();
        assert!(view.appearance(AppearanceMode::Rollover).unwrap().content_str().contains("(OK) Tj"));
        let down = view.appearance(AppearanceMode::Down).unwrap().content_str();
        assert!(down.contains("(Pressed) Tj"));
        assert!(down.contains("0.749 0.749 0.749 rg"));

        let id = view.appearance_object_id().unwrap();
        assert!(w.reset_appearance_stream().unwrap());
        assert_eq!(w.view().appearance_object_id(), Some(id));
        assert!(w.reset_appearance_stream_with(true).unwrap());
        assert_ne!(w.view().appearance_object_id(), Some(id));
    }

    #[test]
    fn test_free_text_defaults_and_callout() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::FreeText, Rect::new(100.0, 100.0, 100.0, 40.0))
            .unwrap();
        let mut ft = page.annot_mut(h).unwrap();
        ft.set_intent(intent::FREE_TEXT_CALLOUT).unwrap();
        assert!(!ft.reset_appearance_stream().unwrap());
        ft.set_callout_points(vec![Point::new(20.0, 20.0), Point::new(100.0, 100.0)])
            .unwrap();
        ft.set_content("Look here");
        assert!(ft.reset_appearance_stream().unwrap());

        let view = ft.view();
        assert_eq!(
            view.default_appearance(),
            Some(&DefaultAppearance::new(StandardFont::Helvetica, 12.0, Color::BLUE))
        );
        assert_eq!(view.alignment(), Some(TextAlignment::Left));
        assert_eq!(view.border_color(), Some(Color::RED));
        assert_eq!(view.inner_rect(), Some(Rect::new(100.0, 100.0, 100.0, 40.0)));
        assert!(view.rect().contains_point(&Point::new(20.0, 20.0)));
        let content = view.appearance(AppearanceMode::Normal).unwrap().content_str();
        assert!(content.contains("(Look here) Tj"));
        assert!(content.contains("0 0 1 rg"));
    }

    #[test]
    fn test_subordinate_gets_no_shared_defaults() {
        let mut page = page();
        let a = page
            .add_annot(AnnotationKind::Square, Rect::new(10.0, 10.0, 50.0, 50.0))
            .unwrap();
        let b = page
            .add_annot(AnnotationKind::Circle, Rect::new(70.0, 10.0, 50.0, 50.0))
            .unwrap();
        page.set_annot_group(&[a, b], 0).unwrap();
        assert!(page.annot_mut(b).unwrap().reset_appearance_stream().unwrap());
        let rec = &page.annots[&b.id()];
        assert_eq!(rec.border_color, None);
        assert!(rec.border.is_some());
    }

    #[test]
    fn test_ink_and_polygon() {
        let mut page = page();
        let h = page.add_annot(AnnotationKind::Ink, Rect::default()).unwrap();
        let mut ink = page.annot_mut(h).unwrap();
        ink.set_ink_list(InkPath::from_runs(&[vec![Point::new(0.0, 0.0), Point::new(30.0, 40.0)]]))
            .unwrap();
        assert!(ink.reset_appearance_stream().unwrap());
        assert!(ink.view().rect().contains_point(&Point::new(30.0, 40.0)));

        let h = page.add_annot(AnnotationKind::Polygon, Rect::default()).unwrap();
        let mut polygon = page.annot_mut(h).unwrap();
        polygon.set_vertexes(vec![Point::new(0.0, 0.0)]).unwrap();
        assert!(!polygon.reset_appearance_stream().unwrap());
        polygon
            .set_vertexes(vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0), Point::new(25.0, 40.0)])
            .unwrap();
        polygon.set_intent(intent::POLYGON_CLOUD).unwrap();
        assert!(polygon.reset_appearance_stream().unwrap());
        assert!(polygon.view().appearance(AppearanceMode::Normal).unwrap().content_str().contains(" c\n"));
    }

    #[test]
    fn test_redact_preview_states() {
        let mut page = page();
        let h = page.add_annot(AnnotationKind::Redact, Rect::default()).unwrap();
        let mut redact = page.annot_mut(h).unwrap();
        redact.set_quad_points(vec![highlight_quad()]).unwrap();
        redact.set_overlay_text("X").unwrap();
        assert!(redact.reset_appearance_stream().unwrap());
        let view = redact.view();
        assert_eq!(view.apply_fill_color(), Some(Color::BLACK));
        assert!(!view.appearance(AppearanceMode::Normal).unwrap().content_str().contains("Tj"));
        assert!(view.appearance(AppearanceMode::Rollover).unwrap().content_str().contains("(X) Tj"));
        assert!(view.appearance(AppearanceMode::Down).is_some());
    }

    #[test]
    fn test_state_note_regenerates_with_note_icon() {
        let mut page = page();
        let h = page
            .add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0))
            .unwrap();
        let note = page
            .annot_mut(h)
            .unwrap()
            .add_state_annot("A", StateModel::Review, AnnotState::Accepted)
            .unwrap();
        let mut note = page.annot_mut(note).unwrap();
        assert!(note.reset_appearance_stream().unwrap());
        assert_eq!(note.view().icon_name(), Some("Note"));
    }

    #[test]
    fn test_overlay_lines_repeat() {
        let da = REDACT_OVERLAY_DA;
        let area = Rect::new(0.0, 0.0, 200.0, 40.0);
        let (size, lines) = overlay_lines(&area, "X", &da, true, false).unwrap();
        assert_eq!(size, 12.0);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].matches('X').count() > 1);
        let (_, single) = overlay_lines(&area, "X", &da, false, false).unwrap();
        assert_eq!(single, vec!["X".to_string()]);
        assert!(overlay_lines(&area, "", &da, false, false).is_none());
    }
}
