//! Annotation dictionaries per PDF spec ISO 32000-1:2008, Section 12.5.
//!
//! [`Page::annotation_dicts`] writes every annotation of a page as an
//! annotation dictionary with sequential object references, resolving the
//! cross references between annotations (`Popup`, `Parent`, `IRT`).
//! [`Page::import_annotations`] reads such dictionaries back into records.
//!
//! Appearance streams are written inline under `/AP`; a file writer is
//! expected to move them into indirect objects.
//!
//! Kinds this library does not model (3D, movie, watermark, ...) are kept
//! as their source dictionary in the `Unparsed` appearance state and
//! written back unchanged apart from the common entries.

use crate::annotation_types::{
    intent, AnnotState, AnnotationFlags, AnnotationKind, AppearanceMode, BorderInfo, BorderStyle, CaptionPosition,
    Color, DefaultAppearance, FieldType, HighlightingMode, IconFit, InkPath, LineEndingStyle,
    QuadPoints, ReplyType, Rotation, ScaleWay, StateModel, TextAlignment, WidgetCharacteristics,
};
use crate::annotations::{
    Action, Annot, AnnotHandle, AnnotId, AnnotRecord, AppearanceSet, AppearanceState, FieldInfo,
    KindPayload, MarkupData,
};
use crate::editor::Page;
use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};
use crate::object::{require_name, require_numbers, Dict, Object, ObjectRef};
use crate::writer::appearance_stream::AppearanceStream;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use uuid::Uuid;

/// Field flag bit 16: radio button.
const FF_RADIO: i64 = 1 << 15;
/// Field flag bit 17: push button.
const FF_PUSH_BUTTON: i64 = 1 << 16;

/// Entries that reference other objects by number; they are rebuilt on
/// export instead of copied from a source dictionary.
const LINK_KEYS: [&str; 4] = ["Popup", "Parent", "IRT", "P"];

/// Common entries, rebuilt from the record for every annotation.
const COMMON_KEYS: [&str; 9] = ["Rect", "F", "Contents", "M", "NM", "Border", "BS", "BE", "C"];

/// Entries rebuilt from the record of a modelled kind. Anything the record
/// no longer carries must not survive from the source dictionary.
const MODELLED_KEYS: [&str; 39] = [
    "A", "AP", "AS", "CA", "CL", "CO", "CP", "Cap", "CreationDate", "DA", "FS", "FT", "Ff", "H",
    "IC", "IT", "InkList", "L", "LE", "LL", "LLE", "LLO", "MK", "Measure", "Name", "Open",
    "OverlayText", "Q", "QuadPoints", "RD", "RT", "Repeat", "Rotate", "SignatureName", "State",
    "StateModel", "Subj", "T", "Vertices",
];

/// One annotation as an indirect object.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationEntry {
    /// Object reference of the annotation dictionary
    pub object_ref: ObjectRef,
    /// The annotation dictionary
    pub dict: Dict,
}

// === Dates ===

/// Format a date as a PDF date string, `D:YYYYMMDDHHmmSS+00'00'`.
pub fn format_pdf_date(date: &DateTime<Utc>) -> String {
    format!("D:{}+00'00'", date.format("%Y%m%d%H%M%S"))
}

/// Parse a PDF date string. Omitted trailing fields take their lowest
/// value; a missing offset means UTC.
pub fn parse_pdf_date(value: &str) -> Result<DateTime<Utc>> {
    lazy_static! {
        static ref RE_DATE: Regex = Regex::new(
            r"^(?:D:)?(\d{4})(\d{2})?(\d{2})?(\d{2})?(\d{2})?(\d{2})?(?:([Zz+\-])(?:(\d{2})'?(?:(\d{2})'?)?)?)?$"
        )
        .unwrap();
    }

    let invalid = || Error::InvalidDate(value.to_string());
    let caps = RE_DATE.captures(value.trim()).ok_or_else(invalid)?;
    let field = |i: usize, default: u32| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(default)
    };
    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let naive = NaiveDate::from_ymd_opt(year, field(2, 1), field(3, 1))
        .and_then(|d| d.and_hms_opt(field(4, 0), field(5, 0), field(6, 0)))
        .ok_or_else(invalid)?;

    let offset_secs = match caps.get(7).map(|m| m.as_str()) {
        Some("+") | Some("-") => {
            let secs = (field(8, 0) * 3600 + field(9, 0) * 60) as i32;
            if &caps[7] == "-" {
                -secs
            } else {
                secs
            }
        },
        _ => 0,
    };
    let offset = FixedOffset::east_opt(offset_secs).ok_or_else(invalid)?;
    let local = offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(invalid)?;
    Ok(local.with_timezone(&Utc))
}

// === Small conversions ===

fn put(dict: &mut Dict, key: &str, value: Object) {
    dict.insert(key.to_string(), value);
}

fn color_obj(color: Color) -> Object {
    Object::reals(color.rgb())
}

fn points_obj(points: &[Point]) -> Object {
    Object::reals(points.iter().flat_map(|p| [p.x, p.y]))
}

fn points_from(values: &[f32]) -> Vec<Point> {
    values
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

fn endings_obj(endings: (LineEndingStyle, LineEndingStyle)) -> Object {
    Object::Array(vec![
        Object::name(endings.0.pdf_name()),
        Object::name(endings.1.pdf_name()),
    ])
}

/// `RD` margins of `inner` within `outer`.
fn margins_obj(outer: &Rect, inner: &Rect) -> Object {
    Object::reals([
        inner.left() - outer.left(),
        inner.bottom() - outer.bottom(),
        outer.right() - inner.right(),
        outer.top() - inner.top(),
    ])
}

fn get_num(dict: &Dict, key: &str) -> Option<f32> {
    dict.get(key).and_then(Object::as_number).map(|v| v as f32)
}

fn get_numbers(dict: &Dict, key: &str) -> Option<Vec<f32>> {
    dict.get(key).and_then(Object::as_number_array)
}

fn get_name<'a>(dict: &'a Dict, key: &str) -> Option<&'a str> {
    dict.get(key).and_then(Object::as_name)
}

fn get_text(dict: &Dict, key: &str) -> Option<String> {
    dict.get(key).and_then(Object::as_text)
}

fn get_bool(dict: &Dict, key: &str) -> Option<bool> {
    dict.get(key).and_then(Object::as_bool)
}

fn get_dict<'a>(dict: &'a Dict, key: &str) -> Option<&'a Dict> {
    dict.get(key).and_then(Object::as_dict)
}

fn get_ref(dict: &Dict, key: &str) -> Option<ObjectRef> {
    dict.get(key).and_then(Object::as_reference)
}

fn get_color(dict: &Dict, key: &str) -> Option<Color> {
    get_numbers(dict, key).and_then(|c| Color::from_components(&c))
}

fn get_date(dict: &Dict, key: &str) -> Option<DateTime<Utc>> {
    let text = get_text(dict, key)?;
    match parse_pdf_date(&text) {
        Ok(date) => Some(date),
        Err(e) => {
            log::warn!("Ignoring /{}: {}", key, e);
            None
        },
    }
}

fn get_endings(dict: &Dict, key: &str) -> Option<(LineEndingStyle, LineEndingStyle)> {
    let names = dict.get(key)?.as_array()?;
    let style = |i: usize| {
        names
            .get(i)
            .and_then(Object::as_name)
            .map(LineEndingStyle::from_pdf_name)
            .unwrap_or_default()
    };
    Some((style(0), style(1)))
}

fn get_margins(dict: &Dict, rect: &Rect) -> Option<Rect> {
    match get_numbers(dict, "RD")?.as_slice() {
        [l, b, r, t] => Some(Rect::from_points(
            rect.left() + l,
            rect.bottom() + b,
            rect.right() - r,
            rect.top() - t,
        )),
        _ => None,
    }
}

fn get_rotation(dict: &Dict, key: &str) -> Rotation {
    dict.get(key)
        .and_then(Object::as_number)
        .and_then(|deg| Rotation::from_degrees(deg as i64))
        .unwrap_or_default()
}

// === Export ===

fn border_entries(dict: &mut Dict, border: &BorderInfo) {
    put(dict, "Border", Object::reals([0.0, 0.0, border.width]));
    let mut bs = Dict::new();
    put(&mut bs, "Type", Object::name("Border"));
    put(&mut bs, "W", Object::Real(border.width as f64));
    put(&mut bs, "S", Object::name(border.style.pdf_name()));
    if border.style == BorderStyle::Dashed {
        put(&mut bs, "D", Object::reals(border.dashes.iter().copied()));
    }
    put(dict, "BS", Object::Dictionary(bs));
    if border.style == BorderStyle::Cloudy {
        let mut be = Dict::new();
        put(&mut be, "S", Object::name("C"));
        put(&mut be, "I", Object::Real(border.cloud_intensity as f64));
        put(dict, "BE", Object::Dictionary(be));
    }
}

fn appearance_entry(dict: &mut Dict, set: &AppearanceSet, state_name: Option<&str>) {
    let stream = |mode: AppearanceMode, s: &AppearanceStream| match state_name {
        Some(name) => {
            let mut states = Dict::new();
            for ((other_mode, other), parked) in &set.other_states {
                if *other_mode == mode {
                    put(&mut states, other, parked.to_object());
                }
            }
            put(&mut states, name, s.to_object());
            Object::Dictionary(states)
        },
        None => s.to_object(),
    };
    let mut ap = Dict::new();
    put(&mut ap, "N", stream(AppearanceMode::Normal, &set.normal));
    if let Some(r) = &set.rollover {
        put(&mut ap, "R", stream(AppearanceMode::Rollover, r));
    }
    if let Some(d) = &set.down {
        put(&mut ap, "D", stream(AppearanceMode::Down, d));
    }
    put(dict, "AP", Object::Dictionary(ap));
}

fn markup_entries(
    dict: &mut Dict,
    rec: &AnnotRecord,
    markup: &MarkupData,
    refs: &HashMap<AnnotId, ObjectRef>,
) {
    if let Some(title) = &markup.title {
        put(dict, "T", Object::text(title));
    }
    if let Some(subject) = &markup.subject {
        put(dict, "Subj", Object::text(subject));
    }
    if let Some(opacity) = markup.opacity {
        put(dict, "CA", Object::Real(opacity as f64));
    }
    if let Some(intent) = &markup.intent {
        put(dict, "IT", Object::name(intent.as_str()));
    }
    if let Some(created) = &markup.created {
        put(dict, "CreationDate", Object::text(&format_pdf_date(created)));
    }
    if let Some(fill) = markup.fill_color {
        if rec.kind != AnnotationKind::Redact {
            put(dict, "IC", color_obj(fill));
        }
    }
    if let Some(popup) = markup.popup.and_then(|id| refs.get(&id)) {
        put(dict, "Popup", Object::Reference(*popup));
    }
    if let Some(header) = markup.group_header.and_then(|id| refs.get(&id)) {
        put(dict, "IRT", Object::Reference(*header));
        put(dict, "RT", Object::name(ReplyType::Group.pdf_name()));
    } else if let Some(parent) = markup.in_reply_to.and_then(|id| refs.get(&id)) {
        put(dict, "IRT", Object::Reference(*parent));
    }
}

fn mk_obj(mk: &WidgetCharacteristics) -> Object {
    let mut d = Dict::new();
    if mk.rotation != Rotation::R0 {
        put(&mut d, "R", Object::Integer(mk.rotation.degrees()));
    }
    if let Some(c) = mk.border_color {
        put(&mut d, "BC", color_obj(c));
    }
    if let Some(c) = mk.background_color {
        put(&mut d, "BG", color_obj(c));
    }
    for (key, caption) in [
        ("CA", &mk.normal_caption),
        ("RC", &mk.rollover_caption),
        ("AC", &mk.down_caption),
    ] {
        if let Some(text) = caption {
            put(&mut d, key, Object::text(text));
        }
    }
    if let Some(fit) = &mk.icon_fit {
        let mut f = Dict::new();
        let sw = match fit.scale_way {
            ScaleWay::Always => "A",
            ScaleWay::Bigger => "B",
            ScaleWay::Smaller => "S",
            ScaleWay::Never => "N",
        };
        put(&mut f, "SW", Object::name(sw));
        put(
            &mut f,
            "S",
            Object::name(if fit.is_proportional_scaling { "P" } else { "A" }),
        );
        put(
            &mut f,
            "A",
            Object::reals([fit.horizontal_fraction, fit.vertical_fraction]),
        );
        put(&mut f, "FB", Object::Boolean(fit.fit_bounds));
        put(&mut d, "IF", Object::Dictionary(f));
    }
    Object::Dictionary(d)
}

fn payload_entries(dict: &mut Dict, rec: &AnnotRecord, refs: &HashMap<AnnotId, ObjectRef>) {
    let quads_obj = |quads: &[QuadPoints]| Object::reals(quads.iter().flat_map(|q| q.to_array()));
    match &rec.payload {
        KindPayload::None => {},
        KindPayload::Note(note) => {
            if let Some(icon) = &note.icon_name {
                put(dict, "Name", Object::name(icon.as_str()));
            }
            put(dict, "Open", Object::Boolean(note.open));
            if let Some((model, state)) = note.state {
                put(dict, "StateModel", Object::text(model.pdf_name()));
                put(dict, "State", Object::text(state.pdf_name()));
            }
            if note.reply_type == ReplyType::Group && !dict.contains_key("RT") {
                put(dict, "RT", Object::name(ReplyType::Group.pdf_name()));
            }
        },
        KindPayload::TextMarkup(quads) => put(dict, "QuadPoints", quads_obj(quads)),
        KindPayload::Line(line) => {
            if let (Some(start), Some(end)) = (line.start, line.end) {
                put(dict, "L", points_obj(&[start, end]));
            }
            put(dict, "LE", endings_obj(line.endings));
            if line.leader_length != 0.0 {
                put(dict, "LL", Object::Real(line.leader_length as f64));
            }
            if line.leader_extension != 0.0 {
                put(dict, "LLE", Object::Real(line.leader_extension as f64));
            }
            if line.leader_offset != 0.0 {
                put(dict, "LLO", Object::Real(line.leader_offset as f64));
            }
            put(dict, "Cap", Object::Boolean(line.caption));
            if line.caption {
                let cp = match line.caption_position {
                    CaptionPosition::Inline => "Inline",
                    CaptionPosition::Top => "Top",
                };
                put(dict, "CP", Object::name(cp));
                put(dict, "CO", points_obj(&[line.caption_offset]));
            }
            if let Some(ratio) = &line.measure_ratio {
                let mut measure = Dict::new();
                put(&mut measure, "Type", Object::name("Measure"));
                put(&mut measure, "R", Object::text(ratio));
                put(dict, "Measure", Object::Dictionary(measure));
            }
        },
        KindPayload::Shape(inner) => {
            if let Some(inner) = inner {
                put(dict, "RD", margins_obj(&rec.rect, inner));
            }
        },
        KindPayload::Poly(poly) => {
            put(dict, "Vertices", points_obj(&poly.vertexes));
            if rec.kind == AnnotationKind::PolyLine {
                put(dict, "LE", endings_obj(poly.endings));
            }
        },
        KindPayload::Ink(path) => {
            let runs = path
                .runs()
                .iter()
                .map(|run| points_obj(run))
                .collect();
            put(dict, "InkList", Object::Array(runs));
        },
        KindPayload::FreeText(ft) => {
            put(
                dict,
                "DA",
                Object::text(&ft.da.clone().unwrap_or_default().to_da_string()),
            );
            if let Some(alignment) = ft.alignment {
                put(dict, "Q", Object::Integer(alignment.to_pdf_int()));
            }
            if !ft.callout_points.is_empty() {
                put(dict, "CL", points_obj(&ft.callout_points));
                put(dict, "LE", Object::name(ft.callout_ending.pdf_name()));
            }
            if let Some(inner) = &ft.inner_rect {
                put(dict, "RD", margins_obj(&rec.rect, inner));
            }
            if ft.rotation != Rotation::R0 {
                put(dict, "Rotate", Object::Integer(ft.rotation.degrees()));
            }
        },
        KindPayload::Stamp { icon_name, rotation } => {
            if let Some(icon) = icon_name {
                put(dict, "Name", Object::name(icon.as_str()));
            }
            if *rotation != Rotation::R0 {
                put(dict, "Rotate", Object::Integer(rotation.degrees()));
            }
        },
        KindPayload::FileAttachment(file) => {
            if let Some(icon) = &file.icon_name {
                put(dict, "Name", Object::name(icon.as_str()));
            }
            if let Some(name) = &file.file_name {
                let mut fs = Dict::new();
                put(&mut fs, "Type", Object::name("Filespec"));
                put(&mut fs, "F", Object::text(name));
                put(&mut fs, "UF", Object::text(name));
                if let Some(data) = &file.data {
                    let mut stream_dict = Dict::new();
                    put(&mut stream_dict, "Type", Object::name("EmbeddedFile"));
                    put(&mut stream_dict, "Length", Object::Integer(data.len() as i64));
                    let mut ef = Dict::new();
                    put(
                        &mut ef,
                        "F",
                        Object::Stream {
                            dict: stream_dict,
                            data: data.clone(),
                        },
                    );
                    put(&mut fs, "EF", Object::Dictionary(ef));
                }
                put(dict, "FS", Object::Dictionary(fs));
            }
        },
        KindPayload::Sound(icon) => {
            if let Some(icon) = icon {
                put(dict, "Name", Object::name(icon.as_str()));
            }
        },
        KindPayload::Redact(data) => {
            put(dict, "QuadPoints", quads_obj(&data.quads));
            if let Some(fill) = data.apply_fill_color {
                put(dict, "IC", color_obj(fill));
            }
            if let Some(text) = &data.overlay_text {
                put(dict, "OverlayText", Object::text(text));
                put(dict, "Repeat", Object::Boolean(data.repeat));
                put(dict, "Q", Object::Integer(data.alignment.to_pdf_int()));
            }
            if let Some(da) = &data.da {
                put(dict, "DA", Object::text(&da.to_da_string()));
            }
        },
        KindPayload::PagingSeal(name) => {
            if let Some(name) = name {
                put(dict, "SignatureName", Object::text(name));
            }
        },
        KindPayload::Link(link) => {
            put(dict, "H", Object::name(link.highlighting.pdf_name()));
            if !link.quads.is_empty() {
                put(dict, "QuadPoints", quads_obj(&link.quads));
            }
            if let Some(action) = &link.action {
                put(dict, "A", Object::Dictionary(action.to_dict()));
            }
        },
        KindPayload::Screen(screen) => {
            if let Some(title) = &screen.title {
                put(dict, "T", Object::text(title));
            }
            if screen.mk_rotation != Rotation::R0 {
                let mut mk = Dict::new();
                put(&mut mk, "R", Object::Integer(screen.mk_rotation.degrees()));
                put(dict, "MK", Object::Dictionary(mk));
            }
            if let Some(action) = &screen.action {
                put(dict, "A", Object::Dictionary(action.to_dict()));
            }
        },
        KindPayload::Widget(widget) => {
            if let Some(field) = &widget.field {
                put(dict, "T", Object::text(&field.name));
                put(dict, "FT", Object::name(field.field_type.pdf_name()));
                let ff = match field.field_type {
                    FieldType::PushButton => FF_PUSH_BUTTON,
                    FieldType::RadioButton => FF_RADIO,
                    _ => 0,
                };
                if ff != 0 {
                    put(dict, "Ff", Object::Integer(ff));
                }
            }
            put(dict, "MK", mk_obj(&widget.mk));
            put(dict, "H", Object::name(widget.highlighting.pdf_name()));
            if let Some(state) = &widget.appearance_state {
                put(dict, "AS", Object::name(state.as_str()));
            }
            if let Some(action) = &widget.action {
                put(dict, "A", Object::Dictionary(action.to_dict()));
            }
        },
        KindPayload::Popup(popup) => {
            if let Some(parent) = popup.parent.and_then(|id| refs.get(&id)) {
                put(dict, "Parent", Object::Reference(*parent));
            }
            put(dict, "Open", Object::Boolean(popup.open));
        },
    }
}

fn export_dict(annot: Annot<'_>, refs: &HashMap<AnnotId, ObjectRef>) -> Dict {
    let rec = annot.rec;
    let mut dict = rec.raw.clone().unwrap_or_default();
    for key in LINK_KEYS.iter().chain(&COMMON_KEYS) {
        dict.remove(*key);
    }
    if rec.state != AppearanceState::Unparsed {
        for key in MODELLED_KEYS {
            dict.remove(key);
        }
    }
    put(&mut dict, "Type", Object::name("Annot"));
    if rec.kind != AnnotationKind::Unknown {
        put(&mut dict, "Subtype", Object::name(rec.kind.pdf_name()));
    }
    put(&mut dict, "Rect", Object::reals(rec.rect.to_array()));
    put(&mut dict, "F", Object::Integer(rec.flags.bits() as i64));
    if !rec.content.is_empty() {
        put(&mut dict, "Contents", Object::text(&rec.content));
    }
    if let Some(modified) = &rec.modified {
        put(&mut dict, "M", Object::text(&format_pdf_date(modified)));
    }
    if let Some(nm) = &rec.unique_id {
        put(&mut dict, "NM", Object::text(nm));
    }
    if let Some(border) = &rec.border {
        border_entries(&mut dict, border);
    }
    if let Some(color) = rec.border_color {
        put(&mut dict, "C", color_obj(color));
    }
    if rec.state == AppearanceState::Unparsed {
        return dict;
    }
    if let Some(markup) = &rec.markup {
        markup_entries(&mut dict, rec, markup, refs);
    }
    payload_entries(&mut dict, rec, refs);
    if let Some(set) = &rec.appearance {
        let state_name = match &rec.payload {
            KindPayload::Widget(w) => w.appearance_state.as_deref(),
            _ => None,
        };
        appearance_entry(&mut dict, set, state_name);
    }
    dict
}

// === Import ===

fn parse_border(dict: &Dict) -> Option<BorderInfo> {
    let mut border = if let Some(bs) = get_dict(dict, "BS") {
        let width = get_num(bs, "W").unwrap_or(1.0);
        let style = get_name(bs, "S")
            .map(BorderStyle::from_pdf_name)
            .unwrap_or(BorderStyle::Solid);
        let mut border = BorderInfo {
            style,
            ..BorderInfo::solid(width)
        };
        if style == BorderStyle::Dashed {
            border.dashes = get_numbers(bs, "D").unwrap_or_else(|| vec![3.0]);
        }
        border
    } else {
        let values = get_numbers(dict, "Border")?;
        BorderInfo::solid(values.get(2).copied().unwrap_or(1.0))
    };
    if let Some(be) = get_dict(dict, "BE") {
        if get_name(be, "S") == Some("C") {
            border.style = BorderStyle::Cloudy;
            border.cloud_intensity = get_num(be, "I").unwrap_or(0.0).clamp(0.0, 2.0);
        }
    }
    Some(border)
}

fn parse_stream(obj: &Object) -> Option<AppearanceStream> {
    match obj {
        Object::Stream { dict, data } => Some(AppearanceStream {
            dict: dict.clone(),
            content: data.clone(),
        }),
        _ => None,
    }
}

/// The stream of the selected state, falling back to the first state by
/// name. The other states are parked under `mode`.
fn parse_state_streams(
    obj: &Object,
    mode: AppearanceMode,
    state_name: Option<&str>,
    parked: &mut IndexMap<(AppearanceMode, String), AppearanceStream>,
) -> Option<AppearanceStream> {
    let Object::Dictionary(states) = obj else {
        return parse_stream(obj);
    };
    let mut names: Vec<&String> = states.keys().collect();
    names.sort();
    let chosen = state_name
        .filter(|name| states.contains_key(*name))
        .or_else(|| names.first().copied().map(String::as_str))?;
    let selected = states.get(chosen).and_then(parse_stream)?;
    for name in names {
        if name != chosen {
            if let Some(stream) = states.get(name).and_then(parse_stream) {
                parked.insert((mode, name.clone()), stream);
            }
        }
    }
    Some(selected)
}

fn parse_appearance(dict: &Dict) -> Option<AppearanceSet> {
    let ap = get_dict(dict, "AP")?;
    let state_name = get_name(dict, "AS");
    let mut other_states = IndexMap::new();
    let normal =
        parse_state_streams(ap.get("N")?, AppearanceMode::Normal, state_name, &mut other_states)?;
    let rollover = ap
        .get("R")
        .and_then(|o| parse_state_streams(o, AppearanceMode::Rollover, state_name, &mut other_states));
    let down = ap
        .get("D")
        .and_then(|o| parse_state_streams(o, AppearanceMode::Down, state_name, &mut other_states));
    Some(AppearanceSet {
        normal,
        rollover,
        down,
        object_id: Uuid::new_v4(),
        other_states,
    })
}

fn parse_mk(dict: &Dict) -> WidgetCharacteristics {
    let Some(mk) = get_dict(dict, "MK") else {
        return WidgetCharacteristics::default();
    };
    let icon_fit = get_dict(mk, "IF").map(|f| {
        let defaults = IconFit::default();
        let align = get_numbers(f, "A").unwrap_or_default();
        IconFit {
            scale_way: match get_name(f, "SW") {
                Some("B") => ScaleWay::Bigger,
                Some("S") => ScaleWay::Smaller,
                Some("N") => ScaleWay::Never,
                _ => ScaleWay::Always,
            },
            is_proportional_scaling: get_name(f, "S") != Some("A"),
            horizontal_fraction: align.first().copied().unwrap_or(defaults.horizontal_fraction),
            vertical_fraction: align.get(1).copied().unwrap_or(defaults.vertical_fraction),
            fit_bounds: get_bool(f, "FB").unwrap_or(false),
        }
    });
    WidgetCharacteristics {
        rotation: get_rotation(mk, "R"),
        border_color: get_color(mk, "BC"),
        background_color: get_color(mk, "BG"),
        normal_caption: get_text(mk, "CA"),
        rollover_caption: get_text(mk, "RC"),
        down_caption: get_text(mk, "AC"),
        icon_fit,
    }
}

fn parse_field(dict: &Dict) -> Option<FieldInfo> {
    let name = get_text(dict, "T")?;
    let flags = dict.get("Ff").and_then(Object::as_integer).unwrap_or(0);
    let field_type = match get_name(dict, "FT")? {
        "Btn" if flags & FF_PUSH_BUTTON != 0 => FieldType::PushButton,
        "Btn" if flags & FF_RADIO != 0 => FieldType::RadioButton,
        "Btn" => FieldType::CheckBox,
        "Tx" => FieldType::Text,
        "Ch" => FieldType::ComboBox,
        "Sig" => FieldType::Signature,
        other => {
            log::debug!("Ignoring widget field of type /{}", other);
            return None;
        },
    };
    Some(FieldInfo::new(name, field_type))
}

fn parse_payload(rec: &mut AnnotRecord, dict: &Dict) {
    let rect = rec.rect;
    let quads = || {
        get_numbers(dict, "QuadPoints")
            .map(|v| QuadPoints::parse_all(&v))
            .unwrap_or_default()
    };
    let da = || get_text(dict, "DA").and_then(|s| DefaultAppearance::parse(&s));
    let alignment = || {
        dict.get("Q")
            .and_then(Object::as_integer)
            .map(TextAlignment::from_pdf_int)
    };
    let action = || get_dict(dict, "A").and_then(Action::from_dict);

    match &mut rec.payload {
        KindPayload::None => {},
        KindPayload::Note(note) => {
            note.icon_name = get_name(dict, "Name").map(str::to_string);
            note.open = get_bool(dict, "Open").unwrap_or(false);
            let model = get_text(dict, "StateModel").and_then(|m| StateModel::from_pdf_name(&m));
            let state = get_text(dict, "State").and_then(|s| AnnotState::from_pdf_name(&s));
            note.state = match (model, state) {
                (Some(model), Some(state)) if state.model() == model => Some((model, state)),
                (None, Some(state)) => Some((state.model(), state)),
                _ => None,
            };
            if get_name(dict, "RT") == Some("Group") {
                note.reply_type = ReplyType::Group;
            }
        },
        KindPayload::TextMarkup(q) => *q = quads(),
        KindPayload::Line(line) => {
            let points = get_numbers(dict, "L").and_then(|v| <[f32; 4]>::try_from(v).ok());
            if let Some([x1, y1, x2, y2]) = points {
                line.start = Some(Point::new(x1, y1));
                line.end = Some(Point::new(x2, y2));
            }
            line.endings = get_endings(dict, "LE").unwrap_or_default();
            line.leader_length = get_num(dict, "LL").unwrap_or(0.0);
            line.leader_extension = get_num(dict, "LLE").unwrap_or(0.0).max(0.0);
            line.leader_offset = get_num(dict, "LLO").unwrap_or(0.0).max(0.0);
            line.caption = get_bool(dict, "Cap").unwrap_or(false);
            line.caption_position = match get_name(dict, "CP") {
                Some("Top") => CaptionPosition::Top,
                _ => CaptionPosition::Inline,
            };
            if let Some(offset) = get_numbers(dict, "CO").map(|v| points_from(&v)) {
                line.caption_offset = offset.first().copied().unwrap_or_default();
            }
            line.measure_ratio = get_dict(dict, "Measure").and_then(|m| get_text(m, "R"));
        },
        KindPayload::Shape(inner) => *inner = get_margins(dict, &rect),
        KindPayload::Poly(poly) => {
            poly.vertexes = get_numbers(dict, "Vertices")
                .map(|v| points_from(&v))
                .unwrap_or_default();
            poly.endings = get_endings(dict, "LE").unwrap_or_default();
        },
        KindPayload::Ink(path) => {
            let runs: Vec<Vec<Point>> = dict
                .get("InkList")
                .and_then(Object::as_array)
                .map(|list| {
                    list.iter()
                        .filter_map(Object::as_number_array)
                        .map(|v| points_from(&v))
                        .filter(|run| !run.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            *path = InkPath::from_runs(&runs);
        },
        KindPayload::FreeText(ft) => {
            ft.da = da();
            ft.alignment = alignment();
            ft.callout_points = get_numbers(dict, "CL")
                .map(|v| points_from(&v))
                .unwrap_or_default();
            ft.callout_ending = get_name(dict, "LE")
                .map(LineEndingStyle::from_pdf_name)
                .unwrap_or_default();
            ft.inner_rect = get_margins(dict, &rect);
            ft.rotation = get_rotation(dict, "Rotate");
        },
        KindPayload::Stamp { icon_name, rotation } => {
            *icon_name = get_name(dict, "Name").map(str::to_string);
            *rotation = get_rotation(dict, "Rotate");
        },
        KindPayload::FileAttachment(file) => {
            file.icon_name = get_name(dict, "Name").map(str::to_string);
            if let Some(fs) = get_dict(dict, "FS") {
                file.file_name = get_text(fs, "UF").or_else(|| get_text(fs, "F"));
                file.data = get_dict(fs, "EF")
                    .and_then(|ef| ef.get("F"))
                    .and_then(|obj| match obj {
                        Object::Stream { data, .. } => Some(data.clone()),
                        _ => None,
                    });
            }
        },
        KindPayload::Sound(icon) => *icon = get_name(dict, "Name").map(str::to_string),
        KindPayload::Redact(data) => {
            data.quads = quads();
            data.apply_fill_color = get_color(dict, "IC");
            data.overlay_text = get_text(dict, "OverlayText");
            data.repeat = get_bool(dict, "Repeat").unwrap_or(false);
            data.alignment = alignment().unwrap_or_default();
            data.da = da();
        },
        KindPayload::PagingSeal(name) => *name = get_text(dict, "SignatureName"),
        KindPayload::Link(link) => {
            link.highlighting = get_name(dict, "H")
                .map(HighlightingMode::from_pdf_name)
                .unwrap_or_default();
            link.quads = quads();
            link.action = action();
        },
        KindPayload::Screen(screen) => {
            screen.title = get_text(dict, "T");
            screen.mk_rotation = get_dict(dict, "MK")
                .map(|mk| get_rotation(mk, "R"))
                .unwrap_or_default();
            screen.action = action();
        },
        KindPayload::Widget(widget) => {
            widget.field = parse_field(dict);
            widget.mk = parse_mk(dict);
            widget.highlighting = get_name(dict, "H")
                .map(HighlightingMode::from_pdf_name)
                .unwrap_or_default();
            widget.appearance_state = get_name(dict, "AS").map(str::to_string);
            widget.action = action();
        },
        KindPayload::Popup(popup) => popup.open = get_bool(dict, "Open").unwrap_or(false),
    }
}

fn parse_markup(markup: &mut MarkupData, kind: AnnotationKind, dict: &Dict) {
    markup.title = get_text(dict, "T");
    markup.subject = get_text(dict, "Subj");
    markup.opacity = get_num(dict, "CA").map(|v| v.clamp(0.0, 1.0));
    markup.intent = get_name(dict, "IT").map(str::to_string);
    if let Some(it) = &markup.intent {
        if !intent::is_allowed(kind, it) {
            log::debug!("Keeping unrecognised intent /{} on {:?}", it, kind);
        }
    }
    markup.created = get_date(dict, "CreationDate");
    if kind != AnnotationKind::Redact {
        markup.fill_color = get_color(dict, "IC");
    }
}

/// Parse one dictionary into a record without cross references.
fn parse_record(dict: &Dict) -> Result<AnnotRecord> {
    let subtype = require_name(dict, "Subtype")?;
    let kind = AnnotationKind::from_pdf_name(subtype);
    let rect_values = require_numbers(dict, "Rect", 4)?;
    let rect = Rect::from_array([rect_values[0], rect_values[1], rect_values[2], rect_values[3]]);

    let mut rec = AnnotRecord::new(kind, rect);
    rec.flags = AnnotationFlags::from_bits_truncate(
        dict.get("F").and_then(Object::as_integer).unwrap_or(0) as u32,
    );
    rec.content = get_text(dict, "Contents").unwrap_or_default();
    rec.modified = get_date(dict, "M");
    rec.unique_id = get_text(dict, "NM");
    rec.border = parse_border(dict);
    rec.border_color = get_color(dict, "C");
    rec.appearance = parse_appearance(dict);
    rec.raw = Some(dict.clone());

    if rec.payload == KindPayload::None {
        log::debug!("Keeping /{} annotation unparsed", subtype);
        rec.state = AppearanceState::Unparsed;
        return Ok(rec);
    }
    if let Some(markup) = rec.markup.as_mut() {
        parse_markup(markup, kind, dict);
    }
    parse_payload(&mut rec, dict);
    rec.state = if rec.appearance.is_some() {
        AppearanceState::AppearanceConsistent
    } else {
        AppearanceState::PropertiesDirty
    };
    Ok(rec)
}

impl Page {
    /// Export every annotation as an annotation dictionary, numbering the
    /// objects from `first_object_id` in list order.
    pub fn annotation_dicts(&self, first_object_id: u32) -> Vec<AnnotationEntry> {
        let refs: HashMap<AnnotId, ObjectRef> = self
            .annots
            .keys()
            .enumerate()
            .map(|(i, id)| (*id, ObjectRef::new(first_object_id + i as u32, 0)))
            .collect();
        self.annots()
            .map(|annot| AnnotationEntry {
                object_ref: refs[&annot.id()],
                dict: export_dict(annot, &refs),
            })
            .collect()
    }

    /// Import annotation dictionaries, appending them to the annotation
    /// list in order. Popup, reply and group links between the entries are
    /// restored from their object references.
    ///
    /// Fails without changing the page if any dictionary lacks a `Subtype`
    /// or `Rect`.
    pub fn import_annotations(&mut self, entries: &[AnnotationEntry]) -> Result<Vec<AnnotHandle>> {
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            records.push(parse_record(&entry.dict)?);
        }
        let ids: HashMap<ObjectRef, AnnotId> = entries
            .iter()
            .zip(&records)
            .map(|(entry, rec)| (entry.object_ref, rec.id))
            .collect();

        let mut replies: Vec<(AnnotId, AnnotId, bool)> = Vec::new();
        let mut groups: Vec<(AnnotId, AnnotId)> = Vec::new();
        for (entry, rec) in entries.iter().zip(records.iter_mut()) {
            if rec.state == AppearanceState::Unparsed {
                continue;
            }
            let lookup = |key: &str| get_ref(&entry.dict, key).and_then(|r| ids.get(&r).copied());
            let popup = lookup("Popup");
            let parent = lookup("Parent");
            let irt = lookup("IRT");
            let is_state = matches!(&rec.payload, KindPayload::Note(n) if n.state.is_some());
            let id = rec.id;
            if let KindPayload::Popup(data) = &mut rec.payload {
                data.parent = parent;
            }
            if let Some(markup) = rec.markup.as_mut() {
                markup.popup = popup;
                match (irt, get_name(&entry.dict, "RT")) {
                    (Some(header), Some("Group")) => groups.push((header, id)),
                    (Some(target), _) => {
                        markup.in_reply_to = Some(target);
                        replies.push((target, id, is_state));
                    },
                    _ => {},
                }
            }
        }

        let handles = records.iter().map(|rec| self.handle_for(rec.id)).collect();
        let count = records.len();
        for rec in records {
            self.push_record(rec);
        }
        for (parent, child, is_state) in replies {
            if let Some(markup) = self.annots.get_mut(&parent).and_then(|r| r.markup.as_mut()) {
                if is_state {
                    markup.states.push(child);
                } else {
                    markup.replies.push(child);
                }
            }
        }
        for (header, member) in groups {
            let header_is_markup = self
                .annots
                .get(&header)
                .is_some_and(|rec| rec.markup.is_some());
            if !header_is_markup {
                continue;
            }
            if let Some(markup) = self.annots.get_mut(&member).and_then(|r| r.markup.as_mut()) {
                markup.group_header = Some(header);
            }
            if let Some(markup) = self.annots.get_mut(&header).and_then(|r| r.markup.as_mut()) {
                markup.group_members.push(member);
            }
        }
        log::debug!("Imported {} annotations", count);

        if self.config().auto_regenerate_on_import {
            let pending: Vec<AnnotHandle> = self
                .annots
                .values()
                .rev()
                .take(count)
                .filter(|rec| rec.appearance.is_none() && rec.state != AppearanceState::Unparsed)
                .map(|rec| self.handle_for(rec.id))
                .collect();
            for handle in pending {
                let mut annot = self.annot_mut(handle)?;
                if !annot.reset_appearance_stream()? {
                    log::debug!("No appearance generated for imported {:?}", annot.kind());
                }
            }
        }
        Ok(handles)
    }
}
