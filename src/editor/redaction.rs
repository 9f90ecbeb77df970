//! Redaction apply.
//!
//! Applying a `Redact` annotation permanently removes the page content under
//! its quads, paints the vacated area with the apply fill color, draws the
//! overlay text, and removes the annotation with its popup.
//!
//! Each annotation is its own unit: every change is computed before the
//! page is touched, so a failed apply leaves the page as it was. Other
//! `Redact` annotations overlapping the region are left in place.

use super::{ElementId, Page};
use crate::annotation_types::{AnnotationKind, Color, TextAlignment};
use crate::annotations::{overlay_lines, AnnotMut, KindPayload, REDACT_OVERLAY_DA};
use crate::config::RedactionCoverage;
use crate::elements::{ContentElement, PathContent, TextContent};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::utils::safe_float_cmp;
use crate::writer::appearance_stream::aligned_x;
use crate::writer::font_metrics;

/// Fraction of `bbox` covered by the union of `regions`.
///
/// Overlapping regions are counted once. A box without area counts as
/// fully covered when it lies inside one region.
pub fn covered_fraction(bbox: &Rect, regions: &[Rect]) -> f32 {
    let area = bbox.area();
    if area <= 0.0 {
        return if regions.iter().any(|r| r.contains_rect(bbox)) {
            1.0
        } else {
            0.0
        };
    }
    let clipped: Vec<Rect> = regions
        .iter()
        .filter_map(|r| r.intersection(bbox))
        .filter(|r| !r.is_degenerate())
        .collect();
    if clipped.is_empty() {
        return 0.0;
    }

    let mut xs: Vec<f32> = clipped.iter().flat_map(|r| [r.left(), r.right()]).collect();
    let mut ys: Vec<f32> = clipped.iter().flat_map(|r| [r.bottom(), r.top()]).collect();
    xs.sort_by(|a, b| safe_float_cmp(*a, *b));
    xs.dedup();
    ys.sort_by(|a, b| safe_float_cmp(*a, *b));
    ys.dedup();

    let mut covered = 0.0;
    for xw in xs.windows(2) {
        for yw in ys.windows(2) {
            let cx = (xw[0] + xw[1]) / 2.0;
            let cy = (yw[0] + yw[1]) / 2.0;
            let inside = clipped.iter().any(|r| {
                cx >= r.left() && cx <= r.right() && cy >= r.bottom() && cy <= r.top()
            });
            if inside {
                covered += (xw[1] - xw[0]) * (yw[1] - yw[0]);
            }
        }
    }
    (covered / area).clamp(0.0, 1.0)
}

/// Content changes of one apply, computed up front.
#[derive(Debug, Default)]
struct RedactionPlan {
    remove: Vec<ElementId>,
    add: Vec<ContentElement>,
}

impl RedactionPlan {
    fn build(
        page: &Page,
        regions: &[Rect],
        fill: Color,
        overlays: &[OverlaySpec<'_>],
        coverage: RedactionCoverage,
    ) -> Self {
        let remove = page
            .elements
            .iter()
            .filter(|(_, element)| coverage.accepts(covered_fraction(&element.bbox(), regions)))
            .map(|(id, _)| *id)
            .collect();

        let mut add: Vec<ContentElement> = regions
            .iter()
            .map(|r| PathContent::filled_rect(r, fill).into())
            .collect();
        for overlay in overlays {
            add.extend(overlay.text_runs().into_iter().map(ContentElement::from));
        }
        Self { remove, add }
    }
}

/// Overlay text settings of a redaction.
#[derive(Debug)]
struct OverlaySpec<'a> {
    area: Rect,
    text: &'a str,
    da: crate::annotation_types::DefaultAppearance,
    alignment: TextAlignment,
    repeat: bool,
    auto_size: bool,
}

impl OverlaySpec<'_> {
    /// Text runs laid out top-down inside the area. Lines that do not fit
    /// below the previous one are dropped.
    fn text_runs(&self) -> Vec<TextContent> {
        let Some((size, lines)) =
            overlay_lines(&self.area, self.text, &self.da, self.repeat, self.auto_size)
        else {
            return Vec::new();
        };
        let line_height = font_metrics::line_height(size);
        let mut runs = Vec::with_capacity(lines.len());
        let mut top = self.area.top();
        for line in lines {
            if top - line_height < self.area.bottom() - 0.01 {
                break;
            }
            let width = font_metrics::text_width(self.da.font, &line, size).min(self.area.width);
            let x = aligned_x(&self.area, width, self.alignment);
            let bbox = Rect::new(x, top - line_height, width, line_height);
            runs.push(
                TextContent::new(line, bbox)
                    .with_font(self.da.font, size)
                    .with_color(self.da.text_color),
            );
            top -= line_height;
        }
        runs
    }
}

impl<'p> AnnotMut<'p> {
    /// Apply this redaction.
    ///
    /// Removes the content elements under the quads according to the page's
    /// [`RedactionCoverage`], fills the quads with the apply fill color
    /// (black when unset), draws the overlay text, then removes this
    /// annotation and its popup. The handle is invalid afterwards.
    ///
    /// Returns `Ok(false)` without touching the page when there are no quads.
    pub fn apply_redaction(self) -> Result<bool> {
        let kind = self.kind();
        if kind != AnnotationKind::Redact {
            return Err(Error::Unsupported(format!("{:?} annotations cannot be applied", kind)));
        }
        if !self.page.config().redaction {
            return Err(Error::MissingCapability("redaction".to_string()));
        }
        let KindPayload::Redact(data) = &self.rec().payload else {
            return Ok(false);
        };
        if data.quads.is_empty() {
            log::debug!("Redaction {} has no quads, nothing applied", self.id);
            return Ok(false);
        }

        let regions: Vec<Rect> = data
            .quads
            .iter()
            .map(|q| q.bounding_rect())
            .filter(|r| !r.is_degenerate())
            .collect();
        if regions.is_empty() {
            log::debug!("Redaction {} has only empty quads, nothing applied", self.id);
            return Ok(false);
        }

        let overlays: Vec<OverlaySpec<'_>> = match data.overlay_text.as_deref() {
            Some(text) if !text.is_empty() => regions
                .iter()
                .map(|area| OverlaySpec {
                    area: *area,
                    text,
                    da: data.da.clone().unwrap_or(REDACT_OVERLAY_DA),
                    alignment: data.alignment,
                    repeat: data.repeat,
                    auto_size: data.auto_font_size,
                })
                .collect(),
            _ => Vec::new(),
        };
        let fill = data.apply_fill_color.unwrap_or(Color::BLACK);
        let plan = RedactionPlan::build(
            self.page,
            &regions,
            fill,
            &overlays,
            self.page.config().redaction_coverage,
        );

        let page = self.page;
        for id in &plan.remove {
            page.elements.shift_remove(id);
        }
        let added = plan.add.len();
        for element in plan.add {
            page.add_element(element);
        }
        let removed_annots = page.remove_record_cascade(self.id);
        log::debug!(
            "Applied redaction {}: removed {} elements, added {}, removed {} annotations",
            self.id,
            plan.remove.len(),
            added,
            removed_annots
        );
        Ok(true)
    }
}

impl Page {
    /// Apply every `Redact` annotation on the page in list order.
    ///
    /// Each annotation is applied on its own; one without quads is skipped
    /// and stays on the page. Returns the number applied.
    pub fn apply_redactions(&mut self) -> Result<usize> {
        if !self.config().redaction {
            return Err(Error::MissingCapability("redaction".to_string()));
        }
        let mut applied = 0;
        for handle in self.annots_by_kind(AnnotationKind::Redact) {
            let Ok(redact) = self.annot_mut(handle) else {
                continue;
            };
            if redact.apply_redaction()? {
                applied += 1;
            }
        }
        log::debug!("Applied {} redactions", applied);
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation_types::QuadPoints;
    use crate::config::AnnotConfig;
    use crate::elements::ImageContent;

    fn page() -> Page {
        Page::new(Rect::new(0.0, 0.0, 612.0, 792.0))
    }

    #[test]
    fn test_covered_fraction() {
        let bbox = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(covered_fraction(&bbox, &[Rect::new(-5.0, -5.0, 30.0, 30.0)]), 1.0);
        assert_eq!(covered_fraction(&bbox, &[Rect::new(0.0, 0.0, 5.0, 10.0)]), 0.5);
        assert_eq!(covered_fraction(&bbox, &[Rect::new(50.0, 50.0, 5.0, 5.0)]), 0.0);
        // overlapping halves count once
        let halves = [Rect::new(0.0, 0.0, 6.0, 10.0), Rect::new(4.0, 0.0, 6.0, 10.0)];
        assert_eq!(covered_fraction(&bbox, &halves), 1.0);
        let overlap = [Rect::new(0.0, 0.0, 5.0, 10.0), Rect::new(0.0, 0.0, 5.0, 5.0)];
        assert_eq!(covered_fraction(&bbox, &overlap), 0.5);
    }

    #[test]
    fn test_covered_fraction_flat_box() {
        let line = Rect::new(2.0, 5.0, 6.0, 0.0);
        assert_eq!(covered_fraction(&line, &[Rect::new(0.0, 0.0, 10.0, 10.0)]), 1.0);
        assert_eq!(covered_fraction(&line, &[Rect::new(0.0, 0.0, 4.0, 10.0)]), 0.0);
    }

    #[test]
    fn test_apply_removes_covered_content() {
        let mut page = page();
        let inside = page.add_element(TextContent::new("secret", Rect::new(12.0, 12.0, 30.0, 10.0)));
        let partial = page.add_element(TextContent::new("edge", Rect::new(90.0, 12.0, 30.0, 10.0)));
        let outside = page.add_element(ImageContent::new(
            Rect::new(300.0, 300.0, 50.0, 50.0),
            10,
            10,
            vec![0u8; 300],
        ));
        let h = page.mark_redact_area(&[Rect::new(10.0, 10.0, 100.0, 20.0)]).unwrap();

        assert!(page.annot_mut(h).unwrap().apply_redaction().unwrap());
        assert!(page.element(inside).is_none());
        assert!(page.element(partial).is_some());
        assert!(page.element(outside).is_some());
        assert!(page.annot(h).is_err());
        assert_eq!(page.annot_count(), 0);

        let fills: Vec<&PathContent> = page.elements().filter_map(|(_, e)| e.as_path()).collect();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].fill_color, Some(Color::BLACK));
        assert_eq!(fills[0].bbox, Rect::new(10.0, 10.0, 100.0, 20.0));
    }

    #[test]
    fn test_apply_with_coverage_fraction() {
        let mut page = Page::with_config(
            Rect::new(0.0, 0.0, 612.0, 792.0),
            AnnotConfig::new().with_redaction_coverage(RedactionCoverage::AtLeast(0.5)),
        );
        let mostly = page.add_element(TextContent::new("mostly", Rect::new(0.0, 0.0, 10.0, 10.0)));
        let barely = page.add_element(TextContent::new("barely", Rect::new(18.0, 0.0, 10.0, 10.0)));
        let h = page.mark_redact_area(&[Rect::new(0.0, 0.0, 20.0, 10.0)]).unwrap();
        page.annot_mut(h).unwrap().apply_redaction().unwrap();
        assert!(page.element(mostly).is_none());
        assert!(page.element(barely).is_some());
    }

    #[test]
    fn test_apply_draws_overlay_text() {
        let mut page = page();
        let h = page.mark_redact_area(&[Rect::new(0.0, 0.0, 200.0, 40.0)]).unwrap();
        {
            let mut redact = page.annot_mut(h).unwrap();
            redact.set_overlay_text("REDACTED").unwrap();
            redact.set_apply_fill_color(Color::WHITE).unwrap();
        }
        page.annot_mut(h).unwrap().apply_redaction().unwrap();
        let texts: Vec<&TextContent> = page.elements().filter_map(|(_, e)| e.as_text()).collect();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].text, "REDACTED");
        assert_eq!(texts[0].color, Color::RED);
        let fill = page.elements().find_map(|(_, e)| e.as_path()).unwrap();
        assert_eq!(fill.fill_color, Some(Color::WHITE));
    }

    #[test]
    fn test_apply_repeated_overlay_fills_area() {
        let mut page = page();
        let h = page.mark_redact_area(&[Rect::new(0.0, 0.0, 300.0, 60.0)]).unwrap();
        {
            let mut redact = page.annot_mut(h).unwrap();
            redact.set_overlay_text("X").unwrap();
            redact.enable_repeat_overlay_text(true).unwrap();
        }
        page.annot_mut(h).unwrap().apply_redaction().unwrap();
        let texts: Vec<&TextContent> = page.elements().filter_map(|(_, e)| e.as_text()).collect();
        assert!(texts.len() > 1);
        assert!(texts[0].text.matches('X').count() > 1);
        assert!(texts.iter().all(|t| t.bbox.bottom() >= -0.01));
    }

    #[test]
    fn test_apply_without_quads_is_noop() {
        let mut page = page();
        let keep = page.add_element(TextContent::new("keep", Rect::new(0.0, 0.0, 10.0, 10.0)));
        let h = page.add_annot(AnnotationKind::Redact, Rect::default()).unwrap();
        assert!(!page.annot_mut(h).unwrap().apply_redaction().unwrap());
        assert!(page.element(keep).is_some());
        assert!(page.annot(h).is_ok());
    }

    #[test]
    fn test_apply_rejects_other_kinds() {
        let mut page = page();
        let h = page.add_annot(AnnotationKind::Square, Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert!(matches!(
            page.annot_mut(h).unwrap().apply_redaction(),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_apply_keeps_overlapping_redactions() {
        let mut page = page();
        let a_area = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b_area = Rect::new(10.0, 10.0, 20.0, 20.0);
        let a = page.mark_redact_area(&[a_area]).unwrap();
        let b = page.mark_redact_area(&[b_area]).unwrap();
        let in_b = page.add_element(TextContent::new("b", Rect::new(12.0, 12.0, 5.0, 5.0)));
        let in_a = page.add_element(TextContent::new("a", Rect::new(50.0, 50.0, 5.0, 5.0)));
        let outside = page.add_element(TextContent::new("o", Rect::new(200.0, 200.0, 5.0, 5.0)));

        assert!(page.annot_mut(a).unwrap().apply_redaction().unwrap());
        assert!(page.annot(b).is_ok());
        assert!(page.element(in_b).is_none());
        assert!(page.element(in_a).is_none());
        assert!(page.element(outside).is_some());

        // content drawn after the first apply
        let later_in_b = page.add_element(TextContent::new("b2", Rect::new(15.0, 15.0, 5.0, 5.0)));
        let later_in_a = page.add_element(TextContent::new("a2", Rect::new(60.0, 60.0, 5.0, 5.0)));

        assert!(page.annot_mut(b).unwrap().apply_redaction().unwrap());
        assert!(page.element(later_in_b).is_none());
        assert!(page.element(later_in_a).is_some());
        assert!(page.element(outside).is_some());
        let fills: Vec<Rect> = page
            .elements()
            .filter_map(|(_, e)| e.as_path())
            .filter(|p| p.has_fill())
            .map(|p| p.bbox)
            .collect();
        assert!(fills.contains(&a_area));
        assert!(fills.contains(&b_area));
        assert_eq!(page.annot_count(), 0);
    }

    #[test]
    fn test_overlay_text_stays_inside_each_quad() {
        let mut page = page();
        let quads = [Rect::new(0.0, 0.0, 10.0, 20.0), Rect::new(200.0, 0.0, 10.0, 20.0)];
        let h = page.add_annot(AnnotationKind::Redact, Rect::default()).unwrap();
        {
            let mut redact = page.annot_mut(h).unwrap();
            redact
                .set_quad_points(quads.iter().map(QuadPoints::from_rect).collect())
                .unwrap();
            redact.set_overlay_text("REDACTED").unwrap();
        }
        page.annot_mut(h).unwrap().apply_redaction().unwrap();

        let texts: Vec<&TextContent> = page.elements().filter_map(|(_, e)| e.as_text()).collect();
        assert_eq!(texts.len(), 2);
        for text in texts {
            assert!(quads.iter().any(|q| q.contains_rect(&text.bbox)), "{:?}", text.bbox);
        }
    }

    #[test]
    fn test_overlay_line_taller_than_quad_is_dropped() {
        let mut page = page();
        let h = page.mark_redact_area(&[Rect::new(0.0, 0.0, 100.0, 5.0)]).unwrap();
        page.annot_mut(h).unwrap().set_overlay_text("REDACTED").unwrap();
        page.annot_mut(h).unwrap().apply_redaction().unwrap();
        assert_eq!(page.elements().filter(|(_, e)| e.is_text()).count(), 0);
    }

    #[test]
    fn test_apply_removes_popup() {
        let mut page = page();
        let h = page.mark_redact_area(&[Rect::new(0.0, 0.0, 50.0, 50.0)]).unwrap();
        let popup = page
            .annot_mut(h)
            .unwrap()
            .add_popup(Rect::new(100.0, 0.0, 80.0, 60.0))
            .unwrap();
        page.annot_mut(h).unwrap().apply_redaction().unwrap();
        assert!(page.annot(popup).is_err());
        assert_eq!(page.annot_count(), 0);
    }

    #[test]
    fn test_apply_redactions_page_level() {
        let mut page = page();
        page.add_element(TextContent::new("a", Rect::new(1.0, 1.0, 5.0, 5.0)));
        page.add_element(TextContent::new("b", Rect::new(101.0, 1.0, 5.0, 5.0)));
        page.mark_redact_area(&[Rect::new(0.0, 0.0, 10.0, 10.0)]).unwrap();
        page.mark_redact_area(&[Rect::new(100.0, 0.0, 10.0, 10.0)]).unwrap();
        let empty = page.add_annot(AnnotationKind::Redact, Rect::default()).unwrap();
        assert_eq!(page.apply_redactions().unwrap(), 2);
        assert_eq!(page.elements().filter(|(_, e)| e.is_text()).count(), 0);
        assert_eq!(page.handles(), vec![empty]);
    }

    #[test]
    fn test_apply_multiple_quads() {
        let mut page = page();
        let a = page.add_element(TextContent::new("a", Rect::new(1.0, 1.0, 5.0, 5.0)));
        let between = page.add_element(TextContent::new("m", Rect::new(50.0, 1.0, 5.0, 5.0)));
        let h = page.add_annot(AnnotationKind::Redact, Rect::default()).unwrap();
        page.annot_mut(h)
            .unwrap()
            .set_quad_points(vec![
                QuadPoints::from_rect(&Rect::new(0.0, 0.0, 10.0, 10.0)),
                QuadPoints::from_rect(&Rect::new(100.0, 0.0, 10.0, 10.0)),
            ])
            .unwrap();
        page.annot_mut(h).unwrap().apply_redaction().unwrap();
        assert!(page.element(a).is_none());
        assert!(page.element(between).is_some());
        assert_eq!(page.elements().filter(|(_, e)| e.is_path()).count(), 2);
    }
}
