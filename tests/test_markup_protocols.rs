//! Integration tests for the markup protocols: popups, replies, state
//! notes, groups and rich text.

use pdf_annot::annotation_types::{
    intent, AnnotState, AnnotationFlags, AnnotationKind, Color, RichTextStyle, StateModel,
};
use pdf_annot::annotations::RichTextRun;
use pdf_annot::editor::Page;
use pdf_annot::error::Error;
use pdf_annot::geometry::Rect;
use pdf_annot::AnnotHandle;

fn page_with_square() -> (Page, AnnotHandle) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut page = Page::new(Rect::new(0.0, 0.0, 612.0, 792.0));
    let square = page
        .add_annot(AnnotationKind::Square, Rect::new(100.0, 500.0, 120.0, 80.0))
        .expect("square");
    (page, square)
}

#[test]
fn test_popup_lifecycle() {
    let (mut page, square) = page_with_square();
    let popup = page
        .annot_mut(square)
        .unwrap()
        .add_popup(Rect::new(250.0, 500.0, 150.0, 100.0))
        .unwrap();

    assert_eq!(page.annot(square).unwrap().popup(), Some(popup));
    assert_eq!(page.annot(popup).unwrap().kind(), AnnotationKind::Popup);
    assert_eq!(page.annot(popup).unwrap().popup_parent(), Some(square));
    assert_eq!(page.annot(square).unwrap().popup_open(), Some(false));

    // a second call moves the existing popup
    let again = page
        .annot_mut(square)
        .unwrap()
        .add_popup(Rect::new(300.0, 400.0, 150.0, 100.0))
        .unwrap();
    assert_eq!(again, popup);
    assert_eq!(page.annot(popup).unwrap().rect(), Rect::new(300.0, 400.0, 150.0, 100.0));
    assert_eq!(page.annot_count(), 2);

    assert!(page.annot_mut(square).unwrap().set_popup_open(true).unwrap());
    assert_eq!(page.annot(square).unwrap().popup_open(), Some(true));

    assert!(page.annot_mut(square).unwrap().remove_popup().unwrap());
    assert!(page.annot(popup).is_err());
    assert!(page.annot(square).unwrap().popup().is_none());
    assert!(!page.annot_mut(square).unwrap().remove_popup().unwrap());
}

#[test]
fn test_popup_refused_for_free_text_and_non_markup() {
    let (mut page, _) = page_with_square();
    let free_text = page
        .add_annot(AnnotationKind::FreeText, Rect::new(10.0, 10.0, 100.0, 30.0))
        .unwrap();
    let link = page.add_annot(AnnotationKind::Link, Rect::new(10.0, 100.0, 100.0, 30.0)).unwrap();

    let rect = Rect::new(0.0, 0.0, 50.0, 50.0);
    assert!(matches!(
        page.annot_mut(free_text).unwrap().add_popup(rect),
        Err(Error::Unsupported(_))
    ));
    assert!(page.annot_mut(link).unwrap().add_popup(rect).is_err());
    assert!(matches!(
        page.annot_mut(link).unwrap().set_title("x"),
        Err(Error::NotMarkup(AnnotationKind::Link))
    ));
}

#[test]
fn test_reply_thread() {
    let (mut page, square) = page_with_square();
    let first = page.annot_mut(square).unwrap().add_reply().unwrap();
    let second = page.annot_mut(square).unwrap().add_reply().unwrap();
    let nested = page.annot_mut(first).unwrap().add_reply().unwrap();

    let annot = page.annot(square).unwrap();
    assert_eq!(annot.reply_count(), 2);
    assert_eq!(annot.reply(0), Some(first));
    assert_eq!(annot.reply(1), Some(second));
    assert_eq!(page.annot(first).unwrap().in_reply_to(), Some(square));
    assert_eq!(page.annot(nested).unwrap().in_reply_to(), Some(first));
    assert_eq!(page.annot(first).unwrap().kind(), AnnotationKind::Note);

    // removing a reply takes its own replies with it
    assert!(page.annot_mut(square).unwrap().remove_reply(0).unwrap());
    assert!(page.annot(first).is_err());
    assert!(page.annot(nested).is_err());
    assert_eq!(page.annot(square).unwrap().replies(), vec![second]);

    assert!(matches!(
        page.annot_mut(square).unwrap().remove_reply(5),
        Err(Error::InvalidParameter(_))
    ));
    page.annot_mut(square).unwrap().remove_all_replies().unwrap();
    assert_eq!(page.annot(square).unwrap().reply_count(), 0);
    assert_eq!(page.annot_count(), 1);
}

#[test]
fn test_review_states_accumulate() {
    let (mut page, square) = page_with_square();
    let accepted = page
        .annot_mut(square)
        .unwrap()
        .add_state_annot("Alice", StateModel::Review, AnnotState::Accepted)
        .unwrap();
    let rejected = page
        .annot_mut(square)
        .unwrap()
        .add_state_annot("Alice", StateModel::Review, AnnotState::Rejected)
        .unwrap();
    assert_ne!(accepted, rejected);

    let annot = page.annot(square).unwrap();
    assert_eq!(annot.state_annot_count(StateModel::Review), 2);
    assert_eq!(annot.state_annot_count(StateModel::Marked), 0);
    // state notes are not replies
    assert_eq!(annot.reply_count(), 0);

    let note = page.annot(rejected).unwrap();
    assert!(note.is_state_annot());
    assert_eq!(note.state(), Some((StateModel::Review, AnnotState::Rejected)));
    assert_eq!(note.title(), Some("Alice"));
    assert!(note.flags().contains(AnnotationFlags::HIDDEN | AnnotationFlags::NO_VIEW));
}

#[test]
fn test_marked_state_updates_in_place() {
    let (mut page, square) = page_with_square();
    let marked = page
        .annot_mut(square)
        .unwrap()
        .add_state_annot("Bob", StateModel::Marked, AnnotState::Marked)
        .unwrap();
    let unmarked = page
        .annot_mut(square)
        .unwrap()
        .add_state_annot("Bob", StateModel::Marked, AnnotState::Unmarked)
        .unwrap();
    assert_eq!(marked, unmarked);
    assert_eq!(page.annot(square).unwrap().state_annot_count(StateModel::Marked), 1);
    assert_eq!(
        page.annot(marked).unwrap().state(),
        Some((StateModel::Marked, AnnotState::Unmarked))
    );

    // another author gets their own note
    page.annot_mut(square)
        .unwrap()
        .add_state_annot("Carol", StateModel::Marked, AnnotState::Marked)
        .unwrap();
    assert_eq!(page.annot(square).unwrap().state_annot_count(StateModel::Marked), 2);

    assert!(matches!(
        page.annot_mut(square)
            .unwrap()
            .add_state_annot("Bob", StateModel::Marked, AnnotState::Accepted),
        Err(Error::InvalidParameter(_))
    ));

    page.annot_mut(square).unwrap().remove_all_state_annots().unwrap();
    assert_eq!(page.annot(square).unwrap().state_annot_count(StateModel::Marked), 0);
    assert!(page.annot(marked).is_err());
}

#[test]
fn test_group_shares_attributes() {
    let (mut page, square) = page_with_square();
    let circle = page.add_annot(AnnotationKind::Circle, Rect::new(300.0, 500.0, 80.0, 80.0)).unwrap();
    let ink = page.add_annot(AnnotationKind::Ink, Rect::new(400.0, 500.0, 80.0, 80.0)).unwrap();

    page.set_annot_group(&[square, circle, ink], 0).unwrap();
    {
        let mut header = page.annot_mut(square).unwrap();
        header.set_content("grouped comment");
        header.set_border_color(Color::GREEN);
    }

    let member = page.annot(circle).unwrap();
    assert!(member.is_grouped());
    assert!(!member.is_group_header());
    assert_eq!(member.group_header(), Some(square));
    assert_eq!(member.content(), "grouped comment");
    assert_eq!(member.border_color(), Some(Color::GREEN));
    assert_eq!(page.annot(square).unwrap().group_elements(), vec![square, circle, ink]);

    // a subordinate leaving keeps the rest of the group
    assert!(page.annot_mut(ink).unwrap().ungroup().unwrap());
    assert!(!page.annot(ink).unwrap().is_grouped());
    assert_eq!(page.annot(ink).unwrap().content(), "");
    assert!(page.annot(circle).unwrap().is_grouped());

    // the primary leaving disbands it
    assert!(page.annot_mut(square).unwrap().ungroup().unwrap());
    assert!(!page.annot(circle).unwrap().is_grouped());
    assert!(!page.annot_mut(circle).unwrap().ungroup().unwrap());
}

#[test]
fn test_group_validation() {
    let (mut page, square) = page_with_square();
    let link = page.add_annot(AnnotationKind::Link, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();

    assert!(matches!(page.set_annot_group(&[square], 0), Err(Error::InvalidParameter(_))));
    assert!(matches!(
        page.set_annot_group(&[square, link], 0),
        Err(Error::NotMarkup(AnnotationKind::Link))
    ));
    assert!(matches!(
        page.set_annot_group(&[square, square], 0),
        Err(Error::InvalidParameter(_))
    ));
    assert!(!page.annot(square).unwrap().is_grouped());
}

#[test]
fn test_removing_group_member_prunes_group() {
    let (mut page, square) = page_with_square();
    let circle = page.add_annot(AnnotationKind::Circle, Rect::new(300.0, 500.0, 80.0, 80.0)).unwrap();
    page.set_annot_group(&[square, circle], 0).unwrap();

    page.annot_mut(circle).unwrap().remove().unwrap();
    assert!(page.annot(square).unwrap().group_elements().is_empty());
    assert!(!page.annot(square).unwrap().is_group_header());
}

#[test]
fn test_rich_text_runs() {
    let (mut page, square) = page_with_square();
    {
        let mut annot = page.annot_mut(square).unwrap();
        let bold = RichTextStyle {
            is_bold: true,
            ..RichTextStyle::default()
        };
        assert_eq!(annot.add_rich_text(RichTextRun::new("world", RichTextStyle::default())).unwrap(), 0);
        annot.insert_rich_text(0, RichTextRun::new("hello ", bold)).unwrap();
        assert!(matches!(
            annot.insert_rich_text(5, RichTextRun::new("x", RichTextStyle::default())),
            Err(Error::InvalidParameter(_))
        ));
    }

    let annot = page.annot(square).unwrap();
    assert_eq!(annot.rich_text_count(), 2);
    assert_eq!(annot.rich_text(0).map(|r| r.text.as_str()), Some("hello "));
    assert!(annot.rich_text(0).unwrap().style.is_bold);

    page.annot_mut(square).unwrap().remove_rich_text(0).unwrap();
    let annot = page.annot(square).unwrap();
    assert_eq!(annot.rich_text_runs().len(), 1);
    assert_eq!(annot.rich_text_runs()[0].text, "world");
}

#[test]
fn test_intent_and_opacity_validation() {
    let (mut page, _) = page_with_square();
    let line = page.add_annot(AnnotationKind::Line, Rect::default()).unwrap();
    let mut annot = page.annot_mut(line).unwrap();

    annot.set_intent(intent::LINE_ARROW).unwrap();
    assert!(matches!(
        annot.set_intent(intent::POLYGON_CLOUD),
        Err(Error::InvalidParameter(_))
    ));
    assert!(matches!(annot.set_opacity(1.5), Err(Error::InvalidParameter(_))));
    annot.set_opacity(0.25).unwrap();

    let view = annot.view();
    assert_eq!(view.intent(), Some(intent::LINE_ARROW));
    assert_eq!(view.opacity(), Some(0.25));

    annot.set_intent("").unwrap();
    assert!(annot.view().intent().is_none());
}
