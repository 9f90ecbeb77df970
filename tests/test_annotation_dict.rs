//! Integration tests for annotation dictionary export and import.
//!
//! Builds a page with linked annotations, exports it, imports the
//! dictionaries into a fresh page, and checks that properties and links
//! survive the trip.

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use pdf_annot::annotation_types::{
    AnnotState, AnnotationKind, AppearanceMode, BorderInfo, BorderStyle, Color, FieldType,
    LineEndingStyle, StateModel,
};
use pdf_annot::annotations::{Action, AppearanceState, FieldInfo};
use pdf_annot::config::AnnotConfig;
use pdf_annot::editor::Page;
use pdf_annot::error::Error;
use pdf_annot::geometry::{Point, Rect};
use pdf_annot::object::{Dict, Object, ObjectRef};
use pdf_annot::writer::AnnotationEntry;

fn new_page(config: AnnotConfig) -> Page {
    let _ = env_logger::builder().is_test(true).try_init();
    Page::with_config(Rect::new(0.0, 0.0, 612.0, 792.0), config)
}

fn name(dict: &Dict, key: &str) -> Option<String> {
    dict.get(key).and_then(Object::as_name).map(str::to_string)
}

#[test]
fn test_export_numbers_objects_and_links() {
    let mut page = new_page(AnnotConfig::new());
    let square = page.add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0)).unwrap();
    let popup = page
        .annot_mut(square)
        .unwrap()
        .add_popup(Rect::new(200.0, 100.0, 120.0, 80.0))
        .unwrap();
    let reply = page.annot_mut(square).unwrap().add_reply().unwrap();

    let entries = page.annotation_dicts(10);
    assert_eq!(entries.len(), 3);
    let refs: Vec<ObjectRef> = entries.iter().map(|e| e.object_ref).collect();
    assert_eq!(refs, vec![ObjectRef::new(10, 0), ObjectRef::new(11, 0), ObjectRef::new(12, 0)]);

    let square_dict = &entries[0].dict;
    assert_eq!(name(square_dict, "Type").as_deref(), Some("Annot"));
    assert_eq!(name(square_dict, "Subtype").as_deref(), Some("Square"));
    assert_eq!(square_dict.get("Popup"), Some(&Object::Reference(refs[1])));

    let popup_dict = &entries[1].dict;
    assert_eq!(popup_dict.get("Parent"), Some(&Object::Reference(refs[0])));
    assert_eq!(page.annot(popup).unwrap().index(), Some(1));

    let reply_dict = &entries[2].dict;
    assert_eq!(reply_dict.get("IRT"), Some(&Object::Reference(refs[0])));
    assert_eq!(page.annot(reply).unwrap().index(), Some(2));
}

#[test]
fn test_roundtrip_markup_properties() {
    let mut page = new_page(AnnotConfig::new());
    let created = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    let square = page.add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 40.0)).unwrap();
    {
        let mut annot = page.annot_mut(square).unwrap();
        annot.set_title("Alice").unwrap();
        annot.set_subject("Check").unwrap();
        annot.set_content("Please verify");
        annot.set_fill_color(Color::GREEN).unwrap();
        annot.set_border_color(Color::RED);
        annot.set_border(BorderInfo::dashed(2.0, 4.0, 2.0)).unwrap();
        annot.set_opacity(0.5).unwrap();
        annot.set_creation_date(created).unwrap();
        annot.set_modified(created);
        annot.set_unique_id("square-1");
    }

    let entries = page.annotation_dicts(1);
    let mut target = new_page(AnnotConfig::new());
    let handles = target.import_annotations(&entries).unwrap();
    let annot = target.annot(handles[0]).unwrap();

    assert_eq!(annot.kind(), AnnotationKind::Square);
    assert_eq!(annot.rect(), Rect::new(100.0, 100.0, 50.0, 40.0));
    assert_eq!(annot.title(), Some("Alice"));
    assert_eq!(annot.subject(), Some("Check"));
    assert_eq!(annot.content(), "Please verify");
    assert_eq!(annot.fill_color(), Some(Color::GREEN));
    assert_eq!(annot.border_color(), Some(Color::RED));
    assert_eq!(annot.opacity(), Some(0.5));
    assert_eq!(annot.creation_date(), Some(created));
    assert_eq!(annot.modified(), Some(created));
    assert_eq!(annot.unique_id(), Some("square-1"));
    let border = annot.border().expect("border");
    assert_eq!(border.style, BorderStyle::Dashed);
    assert_eq!(border.width, 2.0);
    assert_eq!(border.dashes, vec![4.0, 2.0]);
    // nothing was regenerated on import
    assert!(!annot.has_appearance());
    assert_eq!(annot.appearance_state(), AppearanceState::PropertiesDirty);
}

#[test]
fn test_roundtrip_restores_replies_states_and_groups() {
    let mut page = new_page(AnnotConfig::new());
    let square = page.add_annot(AnnotationKind::Square, Rect::new(100.0, 100.0, 50.0, 50.0)).unwrap();
    let circle = page.add_annot(AnnotationKind::Circle, Rect::new(200.0, 100.0, 50.0, 50.0)).unwrap();
    page.annot_mut(square).unwrap().add_popup(Rect::new(300.0, 100.0, 100.0, 80.0)).unwrap();
    page.annot_mut(square).unwrap().add_reply().unwrap();
    page.annot_mut(square)
        .unwrap()
        .add_state_annot("Bob", StateModel::Review, AnnotState::Completed)
        .unwrap();
    page.set_annot_group(&[square, circle], 0).unwrap();

    let entries = page.annotation_dicts(1);
    let mut target = new_page(AnnotConfig::new());
    let handles = target.import_annotations(&entries).unwrap();
    assert_eq!(handles.len(), page.annot_count());

    let square = target.annot(handles[0]).unwrap();
    let popup = square.popup().expect("popup restored");
    assert_eq!(target.annot(popup).unwrap().popup_parent(), Some(handles[0]));
    assert_eq!(square.reply_count(), 1);
    assert_eq!(square.state_annot_count(StateModel::Review), 1);
    let state = square.state_annots(StateModel::Review)[0];
    assert_eq!(
        target.annot(state).unwrap().state(),
        Some((StateModel::Review, AnnotState::Completed))
    );
    assert!(square.is_group_header());
    assert_eq!(target.annot(handles[1]).unwrap().group_header(), Some(handles[0]));
}

#[test]
fn test_roundtrip_kind_payloads() {
    let mut page = new_page(AnnotConfig::new());
    let line = page.add_annot(AnnotationKind::Line, Rect::default()).unwrap();
    {
        let mut annot = page.annot_mut(line).unwrap();
        annot.set_start_point(Point::new(10.0, 10.0)).unwrap();
        annot.set_end_point(Point::new(110.0, 60.0)).unwrap();
        annot.set_line_endings(LineEndingStyle::None, LineEndingStyle::OpenArrow).unwrap();
        annot.set_measure_ratio("1 in = 1 ft").unwrap();
    }
    let link = page.add_annot(AnnotationKind::Link, Rect::new(10.0, 700.0, 100.0, 12.0)).unwrap();
    page.annot_mut(link)
        .unwrap()
        .set_action(Action::Uri("https://example.com".to_string()))
        .unwrap();
    let file = page
        .add_annot(AnnotationKind::FileAttachment, Rect::new(500.0, 700.0, 20.0, 20.0))
        .unwrap();
    page.annot_mut(file)
        .unwrap()
        .set_file("notes.txt", Bytes::from_static(b"attached"))
        .unwrap();
    let seal = page.add_annot(AnnotationKind::PagingSeal, Rect::new(550.0, 300.0, 40.0, 200.0)).unwrap();
    page.annot_mut(seal).unwrap().set_signature_name("Seal 1").unwrap();

    let entries = page.annotation_dicts(1);
    let mut target = new_page(AnnotConfig::new());
    let handles = target.import_annotations(&entries).unwrap();

    let line = target.annot(handles[0]).unwrap();
    assert_eq!(line.start_point(), Some(Point::new(10.0, 10.0)));
    assert_eq!(line.end_point(), Some(Point::new(110.0, 60.0)));
    assert_eq!(line.line_endings(), Some((LineEndingStyle::None, LineEndingStyle::OpenArrow)));
    assert_eq!(line.measure_ratio(), Some("1 in = 1 ft"));

    let link = target.annot(handles[1]).unwrap();
    assert_eq!(link.action(), Some(&Action::Uri("https://example.com".to_string())));

    let file = target.annot(handles[2]).unwrap();
    assert_eq!(file.file_name(), Some("notes.txt"));
    assert_eq!(file.file_data().map(|d| d.as_ref()), Some(&b"attached"[..]));

    assert_eq!(target.annot(handles[3]).unwrap().signature_name(), Some("Seal 1"));
}

#[test]
fn test_roundtrip_widget_appearance() {
    let mut page = new_page(AnnotConfig::new());
    let button = page.add_annot(AnnotationKind::Widget, Rect::new(72.0, 72.0, 100.0, 24.0)).unwrap();
    {
        let mut annot = page.annot_mut(button).unwrap();
        annot.set_field(FieldInfo::new("submit", FieldType::PushButton)).unwrap();
        assert!(annot.reset_appearance_stream().unwrap());
    }
    let normal = page
        .annot(button)
        .unwrap()
        .appearance(AppearanceMode::Normal)
        .map(|s| s.content_str())
        .expect("normal appearance");

    let entries = page.annotation_dicts(1);
    assert_eq!(name(&entries[0].dict, "FT").as_deref(), Some("Btn"));

    let mut target = new_page(AnnotConfig::new());
    let handles = target.import_annotations(&entries).unwrap();
    let widget = target.annot(handles[0]).unwrap();
    assert_eq!(widget.field().map(|f| f.field_type), Some(FieldType::PushButton));
    assert_eq!(widget.appearance_state(), AppearanceState::AppearanceConsistent);
    assert_eq!(
        widget.appearance(AppearanceMode::Normal).map(|s| s.content_str()),
        Some(normal)
    );
    assert!(widget.appearance(AppearanceMode::Down).is_some());
}

#[test]
fn test_import_regenerates_when_configured() {
    let mut source = new_page(AnnotConfig::new());
    source.add_annot(AnnotationKind::Circle, Rect::new(10.0, 10.0, 40.0, 40.0)).unwrap();
    let entries = source.annotation_dicts(1);

    let mut target = new_page(AnnotConfig::new().with_auto_regenerate_on_import(true));
    let handles = target.import_annotations(&entries).unwrap();
    let circle = target.annot(handles[0]).unwrap();
    assert!(circle.has_appearance());
    assert_eq!(circle.appearance_state(), AppearanceState::AppearanceConsistent);
}

#[test]
fn test_import_is_all_or_nothing() {
    let mut source = new_page(AnnotConfig::new());
    source.add_annot(AnnotationKind::Square, Rect::new(10.0, 10.0, 40.0, 40.0)).unwrap();
    let mut entries = source.annotation_dicts(1);

    let mut broken = Dict::new();
    broken.insert("Subtype".to_string(), Object::name("Circle"));
    entries.push(AnnotationEntry {
        object_ref: ObjectRef::new(99, 0),
        dict: broken,
    });

    let mut target = new_page(AnnotConfig::new());
    let result = target.import_annotations(&entries);
    assert!(matches!(result, Err(Error::MissingKey(ref key)) if key == "Rect"));
    assert_eq!(target.annot_count(), 0);
}

#[test]
fn test_unknown_kind_survives_roundtrip() {
    let mut dict = Dict::new();
    dict.insert("Type".to_string(), Object::name("Annot"));
    dict.insert("Subtype".to_string(), Object::name("RichMedia"));
    dict.insert("Rect".to_string(), Object::reals([0.0, 0.0, 100.0, 100.0]));
    dict.insert("RichMediaContent".to_string(), Object::Integer(42));

    let mut page = new_page(AnnotConfig::new());
    let handles = page
        .import_annotations(&[AnnotationEntry {
            object_ref: ObjectRef::new(5, 0),
            dict,
        }])
        .unwrap();

    let mut annot = page.annot_mut(handles[0]).unwrap();
    assert_eq!(annot.view().appearance_state(), AppearanceState::Unparsed);
    assert!(!annot.reset_appearance_stream().unwrap());

    let exported = page.annotation_dicts(1);
    assert_eq!(name(&exported[0].dict, "Subtype").as_deref(), Some("RichMedia"));
    assert_eq!(exported[0].dict.get("RichMediaContent"), Some(&Object::Integer(42)));
}

#[test]
fn test_cleared_properties_are_not_exported_from_source() {
    let mut source = new_page(AnnotConfig::new());
    let square = source.add_annot(AnnotationKind::Square, Rect::new(10.0, 10.0, 50.0, 50.0)).unwrap();
    source.annot_mut(square).unwrap().set_content("secret account 1234");
    let redact = source.mark_redact_area(&[Rect::new(100.0, 100.0, 80.0, 20.0)]).unwrap();
    source.annot_mut(redact).unwrap().set_overlay_text("WITHHELD").unwrap();
    let free_text = source.add_annot(AnnotationKind::FreeText, Rect::new(200.0, 200.0, 100.0, 40.0)).unwrap();
    source
        .annot_mut(free_text)
        .unwrap()
        .set_callout_points(vec![Point::new(150.0, 150.0), Point::new(200.0, 210.0)])
        .unwrap();
    let line = source.add_annot(AnnotationKind::Line, Rect::default()).unwrap();
    {
        let mut annot = source.annot_mut(line).unwrap();
        annot.set_start_point(Point::new(10.0, 300.0)).unwrap();
        annot.set_end_point(Point::new(110.0, 300.0)).unwrap();
        annot.enable_caption(true).unwrap();
    }
    let link = source.add_annot(AnnotationKind::Link, Rect::new(0.0, 400.0, 50.0, 10.0)).unwrap();
    source
        .annot_mut(link)
        .unwrap()
        .set_action(Action::Uri("https://example.com".to_string()))
        .unwrap();

    let mut entries = source.annotation_dicts(1);
    entries[0].dict.insert("Vendor".to_string(), Object::Integer(3));
    let mut page = new_page(AnnotConfig::new());
    let h = page.import_annotations(&entries).unwrap();
    page.annot_mut(h[0]).unwrap().set_content("");
    page.annot_mut(h[1]).unwrap().set_overlay_text("").unwrap();
    page.annot_mut(h[2]).unwrap().set_callout_points(Vec::new()).unwrap();
    page.annot_mut(h[3]).unwrap().enable_caption(false).unwrap();
    assert!(page.annot_mut(h[4]).unwrap().remove_action().unwrap());

    let exported = page.annotation_dicts(1);
    assert!(exported[0].dict.get("Contents").is_none());
    assert_eq!(exported[0].dict.get("Vendor"), Some(&Object::Integer(3)));
    assert!(exported[1].dict.get("OverlayText").is_none());
    assert!(exported[2].dict.get("CL").is_none());
    assert_eq!(exported[3].dict.get("Cap"), Some(&Object::Boolean(false)));
    assert!(exported[3].dict.get("CP").is_none());
    assert!(exported[3].dict.get("CO").is_none());
    assert!(exported[4].dict.get("A").is_none());
}

fn state_stream(content: &'static [u8]) -> Object {
    Object::Stream {
        dict: Dict::new(),
        data: Bytes::from_static(content),
    }
}

fn normal_states(dict: &Dict) -> Vec<String> {
    let ap = dict.get("AP").and_then(Object::as_dict).expect("AP");
    let mut names: Vec<String> = ap
        .get("N")
        .and_then(Object::as_dict)
        .expect("N states")
        .keys()
        .cloned()
        .collect();
    names.sort();
    names
}

#[test]
fn test_checkbox_states_survive_roundtrip() {
    let mut states = Dict::new();
    states.insert("Off".to_string(), state_stream(b"1 g"));
    states.insert("Yes".to_string(), state_stream(b"0 g"));
    let mut ap = Dict::new();
    ap.insert("N".to_string(), Object::Dictionary(states));
    let mut dict = Dict::new();
    dict.insert("Type".to_string(), Object::name("Annot"));
    dict.insert("Subtype".to_string(), Object::name("Widget"));
    dict.insert("Rect".to_string(), Object::reals([0.0, 0.0, 12.0, 12.0]));
    dict.insert("FT".to_string(), Object::name("Btn"));
    dict.insert("T".to_string(), Object::text("agree"));
    dict.insert("AP".to_string(), Object::Dictionary(ap));
    dict.insert("AS".to_string(), Object::name("Yes"));

    let mut page = new_page(AnnotConfig::new());
    let handles = page
        .import_annotations(&[AnnotationEntry {
            object_ref: ObjectRef::new(7, 0),
            dict,
        }])
        .unwrap();
    let exported = page.annotation_dicts(1);
    assert_eq!(normal_states(&exported[0].dict), vec!["Off", "Yes"]);
    assert_eq!(name(&exported[0].dict, "AS").as_deref(), Some("Yes"));

    // toggling brings the Off stream forward and keeps Yes
    page.annot_mut(handles[0]).unwrap().set_appearance_state_name("Off").unwrap();
    let widget = page.annot(handles[0]).unwrap();
    assert_eq!(
        widget.appearance(AppearanceMode::Normal).map(|s| s.content_str()).as_deref(),
        Some("1 g")
    );
    let exported = page.annotation_dicts(1);
    assert_eq!(normal_states(&exported[0].dict), vec!["Off", "Yes"]);
    assert_eq!(name(&exported[0].dict, "AS").as_deref(), Some("Off"));
}
