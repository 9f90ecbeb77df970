//! Appearance stream generation for annotations.
//!
//! An appearance stream is a Form XObject that defines the visual appearance
//! of an annotation. The `/AP` dictionary can contain:
//! - /N - Normal appearance
//! - /R - Rollover appearance
//! - /D - Down appearance
//!
//! Streams produced here are drawn in default user space: the form's BBox is
//! the annotation rectangle, so geometry such as quad points and ink paths is
//! written with page coordinates. Output is deterministic for identical input.
//!
//! PDF Spec: ISO 32000-1:2008, Section 12.5.5 (Appearance Streams)

use crate::annotation_types::{
    fmt_num, BorderInfo, BorderStyle, Color, LineEndingStyle, StandardFont, TextAlignment,
};
use crate::geometry::{Matrix, Point, Rect};
use crate::object::{Dict, Object};
use crate::writer::font_metrics;
use std::collections::HashMap;
use std::f32::consts::PI;

/// Bezier constant for approximating a quarter circle.
const KAPPA: f32 = 0.552_284_8;

/// One generated appearance stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AppearanceStream {
    /// Form XObject dictionary
    pub dict: Dict,
    /// Content stream bytes
    pub content: bytes::Bytes,
}

impl AppearanceStream {
    /// Content stream as text.
    pub fn content_str(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }

    /// Bounding box of the form.
    pub fn bbox(&self) -> Option<Rect> {
        let values = self.dict.get("BBox")?.as_number_array()?;
        (values.len() == 4).then(|| Rect::from_points(values[0], values[1], values[2], values[3]))
    }

    /// Form matrix, identity when absent.
    pub fn matrix(&self) -> Matrix {
        match self.dict.get("Matrix").and_then(Object::as_number_array) {
            Some(m) if m.len() == 6 => Matrix::new(m[0], m[1], m[2], m[3], m[4], m[5]),
            _ => Matrix::identity(),
        }
    }

    /// As a PDF stream object.
    pub fn to_object(&self) -> Object {
        Object::Stream {
            dict: self.dict.clone(),
            data: self.content.clone(),
        }
    }
}

/// Builder for creating appearance streams.
///
/// Drawing methods append content stream operators; [`build`](Self::build)
/// produces the Form XObject dictionary and content bytes.
#[derive(Debug, Clone)]
pub struct AppearanceStreamBuilder {
    /// Bounding box for the appearance
    bbox: Rect,
    /// Content stream operations
    content: String,
    /// Resources needed by the appearance (fonts, graphics states)
    resources: HashMap<String, Object>,
    /// Matrix transformation (optional)
    matrix: Option<Matrix>,
}

impl AppearanceStreamBuilder {
    /// Create a new appearance stream builder with the given bounding box.
    pub fn new(bbox: Rect) -> Self {
        Self {
            bbox,
            content: String::new(),
            resources: HashMap::new(),
            matrix: None,
        }
    }

    /// Set the form matrix.
    pub fn with_matrix(mut self, matrix: Matrix) -> Self {
        self.matrix = Some(matrix);
        self
    }

    fn op(&mut self, op: &str) -> &mut Self {
        self.content.push_str(op);
        self.content.push('\n');
        self
    }

    fn pt(p: Point) -> String {
        format!("{} {}", fmt_num(p.x), fmt_num(p.y))
    }

    // === Graphics state ===

    /// Save the graphics state (q).
    pub fn save(&mut self) -> &mut Self {
        self.op("q")
    }

    /// Restore the graphics state (Q).
    pub fn restore(&mut self) -> &mut Self {
        self.op("Q")
    }

    /// Apply a constant opacity through an ExtGState resource. Fully opaque
    /// values emit nothing.
    pub fn opacity(&mut self, opacity: f32) -> &mut Self {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity >= 1.0 {
            return self;
        }
        self.add_ext_gstate("GS0", opacity);
        self.op("/GS0 gs")
    }

    /// Set the fill color.
    pub fn fill_color(&mut self, color: Color) -> &mut Self {
        let op = Self::color_ops(color, "rg");
        self.op(&op)
    }

    /// Set the stroke color.
    pub fn stroke_color(&mut self, color: Color) -> &mut Self {
        let op = Self::color_ops(color, "RG");
        self.op(&op)
    }

    /// Set the line width.
    pub fn line_width(&mut self, width: f32) -> &mut Self {
        let op = format!("{} w", fmt_num(width));
        self.op(&op)
    }

    /// Concatenate `m` onto the current transformation matrix (cm).
    pub fn transform(&mut self, m: Matrix) -> &mut Self {
        let values: Vec<String> = m.to_array().iter().map(|v| fmt_num(*v)).collect();
        let op = format!("{} cm", values.join(" "));
        self.op(&op)
    }

    /// Use round caps and joins.
    pub fn round_caps(&mut self) -> &mut Self {
        self.op("1 J").op("1 j")
    }

    /// Configure width and dash pattern from a border.
    pub fn border_style(&mut self, border: &BorderInfo) -> &mut Self {
        self.line_width(border.width);
        if border.style == BorderStyle::Dashed && !border.dashes.is_empty() {
            let dashes: Vec<String> = border.dashes.iter().map(|d| fmt_num(*d)).collect();
            let op = format!("[{}] {} d", dashes.join(" "), fmt_num(border.dash_phase));
            self.op(&op);
        }
        self
    }

    // === Path construction ===

    /// Begin a subpath (m).
    pub fn move_to(&mut self, p: Point) -> &mut Self {
        let op = format!("{} m", Self::pt(p));
        self.op(&op)
    }

    /// Straight segment (l).
    pub fn line_to(&mut self, p: Point) -> &mut Self {
        let op = format!("{} l", Self::pt(p));
        self.op(&op)
    }

    /// Cubic Bezier segment (c).
    pub fn curve_to(&mut self, c1: Point, c2: Point, end: Point) -> &mut Self {
        let op = format!("{} {} {} c", Self::pt(c1), Self::pt(c2), Self::pt(end));
        self.op(&op)
    }

    /// Rectangle subpath (re).
    pub fn rect(&mut self, r: &Rect) -> &mut Self {
        let op = format!(
            "{} {} {} {} re",
            fmt_num(r.x),
            fmt_num(r.y),
            fmt_num(r.width),
            fmt_num(r.height)
        );
        self.op(&op)
    }

    /// Intersect the clipping path with the current path (W n).
    pub fn clip(&mut self) -> &mut Self {
        self.op("W n")
    }

    /// Close the subpath (h).
    pub fn close(&mut self) -> &mut Self {
        self.op("h")
    }

    /// Stroke (S).
    pub fn stroke(&mut self) -> &mut Self {
        self.op("S")
    }

    /// Fill with the nonzero rule (f).
    pub fn fill(&mut self) -> &mut Self {
        self.op("f")
    }

    /// Fill then stroke (B).
    pub fn fill_stroke(&mut self) -> &mut Self {
        self.op("B")
    }

    /// Fill and/or stroke depending on which paints are present.
    pub fn paint(&mut self, fill: bool, stroke: bool) -> &mut Self {
        match (fill, stroke) {
            (true, true) => self.fill_stroke(),
            (true, false) => self.fill(),
            (false, true) => self.stroke(),
            (false, false) => self.op("n"),
        }
    }

    /// Ellipse inscribed in a rectangle, built from four Bezier curves.
    pub fn ellipse(&mut self, r: &Rect) -> &mut Self {
        let c = r.center();
        let rx = r.width / 2.0;
        let ry = r.height / 2.0;
        let kx = rx * KAPPA;
        let ky = ry * KAPPA;
        self.move_to(Point::new(c.x + rx, c.y))
            .curve_to(
                Point::new(c.x + rx, c.y + ky),
                Point::new(c.x + kx, c.y + ry),
                Point::new(c.x, c.y + ry),
            )
            .curve_to(
                Point::new(c.x - kx, c.y + ry),
                Point::new(c.x - rx, c.y + ky),
                Point::new(c.x - rx, c.y),
            )
            .curve_to(
                Point::new(c.x - rx, c.y - ky),
                Point::new(c.x - kx, c.y - ry),
                Point::new(c.x, c.y - ry),
            )
            .curve_to(
                Point::new(c.x + kx, c.y - ry),
                Point::new(c.x + rx, c.y - ky),
                Point::new(c.x + rx, c.y),
            )
    }

    /// Open or closed polyline through `points`.
    pub fn polyline(&mut self, points: &[Point], closed: bool) -> &mut Self {
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            self.move_to(*first);
            for p in iter {
                self.line_to(*p);
            }
            if closed {
                self.close();
            }
        }
        self
    }

    /// Closed outline through `points` with a cloudy border effect: each
    /// edge is split into bumps that bulge outwards, larger for higher
    /// `intensity`. Points are expected in counter-clockwise order.
    pub fn cloudy_outline(&mut self, points: &[Point], intensity: f32) -> &mut Self {
        if points.len() < 2 {
            return self;
        }
        let radius = 2.0 + 2.0 * intensity.clamp(0.0, 2.0);
        self.move_to(points[0]);
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            let len = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
            if len <= f32::EPSILON {
                continue;
            }
            let bumps = ((len / (2.0 * radius)).floor() as usize).max(1);
            let (ux, uy) = ((b.x - a.x) / len, (b.y - a.y) / len);
            // outward normal of a counter-clockwise edge
            let (nx, ny) = (uy, -ux);
            let step = len / bumps as f32;
            let bulge = step * 0.6;
            for j in 0..bumps {
                let s = Point::new(a.x + ux * step * j as f32, a.y + uy * step * j as f32);
                let e = Point::new(s.x + ux * step, s.y + uy * step);
                self.curve_to(
                    Point::new(s.x + nx * bulge, s.y + ny * bulge),
                    Point::new(e.x + nx * bulge, e.y + ny * bulge),
                    e,
                );
            }
        }
        self.close()
    }

    /// Rectangle outline with a cloudy border effect.
    pub fn cloudy_rect(&mut self, r: &Rect, intensity: f32) -> &mut Self {
        let corners = [
            Point::new(r.left(), r.bottom()),
            Point::new(r.right(), r.bottom()),
            Point::new(r.right(), r.top()),
            Point::new(r.left(), r.top()),
        ];
        self.cloudy_outline(&corners, intensity)
    }

    // === Composite shapes ===

    /// Draw a line ending at `tip`, oriented along the segment from `from`.
    pub fn line_ending(&mut self, from: Point, tip: Point, style: LineEndingStyle, size: f32) -> &mut Self {
        let angle = (tip.y - from.y).atan2(tip.x - from.x);
        let at = |a: f32, len: f32| Point::new(tip.x + len * a.cos(), tip.y + len * a.sin());
        let back = angle + PI;
        match style {
            LineEndingStyle::None => self,
            LineEndingStyle::OpenArrow => self
                .move_to(at(back + PI / 6.0, size))
                .line_to(tip)
                .line_to(at(back - PI / 6.0, size))
                .stroke(),
            LineEndingStyle::ClosedArrow => self
                .move_to(tip)
                .line_to(at(back + PI / 6.0, size))
                .line_to(at(back - PI / 6.0, size))
                .close()
                .fill_stroke(),
            LineEndingStyle::ROpenArrow => self
                .move_to(at(angle + PI / 6.0, size))
                .line_to(tip)
                .line_to(at(angle - PI / 6.0, size))
                .stroke(),
            LineEndingStyle::RClosedArrow => self
                .move_to(tip)
                .line_to(at(angle + PI / 6.0, size))
                .line_to(at(angle - PI / 6.0, size))
                .close()
                .fill_stroke(),
            LineEndingStyle::Butt => self
                .move_to(at(angle + PI / 2.0, size / 2.0))
                .line_to(at(angle - PI / 2.0, size / 2.0))
                .stroke(),
            LineEndingStyle::Slash => self
                .move_to(at(angle + PI / 3.0, size / 2.0))
                .line_to(at(angle + PI / 3.0 + PI, size / 2.0))
                .stroke(),
            LineEndingStyle::Circle => {
                let half = size / 2.0;
                self.ellipse(&Rect::new(tip.x - half, tip.y - half, size, size))
                    .fill_stroke()
            },
            LineEndingStyle::Square => {
                let half = size / 2.0;
                self.rect(&Rect::new(tip.x - half, tip.y - half, size, size))
                    .fill_stroke()
            },
            LineEndingStyle::Diamond => {
                let half = size / 2.0;
                self.move_to(Point::new(tip.x, tip.y - half))
                    .line_to(Point::new(tip.x + half, tip.y))
                    .line_to(Point::new(tip.x, tip.y + half))
                    .line_to(Point::new(tip.x - half, tip.y))
                    .close()
                    .fill_stroke()
            },
        }
    }

    /// Draw a named icon scaled into `rect`. Unknown names draw the note icon.
    pub fn icon(&mut self, name: &str, rect: &Rect) -> &mut Self {
        let size = rect.width.min(rect.height);
        let op = format!("q 1 0 0 1 {} {} cm", fmt_num(rect.x), fmt_num(rect.y));
        self.op(&op);
        let body = match name {
            "Comment" => Self::draw_comment_icon(size),
            "Key" => Self::draw_key_icon(size),
            "Help" => Self::draw_help_icon(size),
            "Insert" => Self::draw_insert_icon(size),
            "Paragraph" | "NewParagraph" => Self::draw_paragraph_icon(size),
            "Paperclip" | "PushPin" | "Graph" | "Tag" => Self::draw_paperclip_icon(size),
            "Speaker" | "Mic" => Self::draw_speaker_icon(size),
            _ => Self::draw_note_icon(size),
        };
        self.content.push_str(&body);
        self.op("Q")
    }

    // === Text ===

    /// Register a standard font in the resources and return its resource name.
    pub fn add_font(&mut self, font: StandardFont) -> &'static str {
        let mut font_dict = HashMap::new();
        font_dict.insert("Type".to_string(), Object::name("Font"));
        font_dict.insert("Subtype".to_string(), Object::name("Type1"));
        font_dict.insert("BaseFont".to_string(), Object::name(font.base_name()));
        font_dict.insert("Encoding".to_string(), Object::name("WinAnsiEncoding"));

        let fonts = self
            .resources
            .entry("Font".to_string())
            .or_insert_with(|| Object::Dictionary(HashMap::new()));
        if let Object::Dictionary(dict) = fonts {
            dict.insert(font.resource_name().to_string(), Object::Dictionary(font_dict));
        }
        font.resource_name()
    }

    /// Show one line of text with its baseline origin at `origin`.
    pub fn text_line(
        &mut self,
        font: StandardFont,
        size: f32,
        color: Color,
        origin: Point,
        text: &str,
    ) -> &mut Self {
        let name = self.add_font(font);
        self.op("BT");
        let tf = format!("/{} {} Tf", name, fmt_num(size));
        self.op(&tf);
        self.fill_color(color);
        let td = format!("{} Td", Self::pt(origin));
        self.op(&td);
        let tj = format!("({}) Tj", escape_literal(text));
        self.op(&tj);
        self.op("ET")
    }

    /// Lay out lines top-down inside `rect` with the given alignment,
    /// clipped to the rectangle.
    pub fn text_block(
        &mut self,
        rect: &Rect,
        lines: &[String],
        font: StandardFont,
        size: f32,
        color: Color,
        alignment: TextAlignment,
    ) -> &mut Self {
        if lines.is_empty() || size <= 0.0 {
            return self;
        }
        let (ascender, _) = font_metrics::vertical_metrics(font);
        self.save().rect(rect).clip();
        let mut baseline = rect.top() - ascender * size / 1000.0;
        for line in lines {
            let width = font_metrics::text_width(font, line, size);
            let x = aligned_x(rect, width, alignment);
            self.text_line(font, size, color, Point::new(x, baseline), line);
            baseline -= font_metrics::line_height(size);
        }
        self.restore()
    }

    // === Icon drawers (local coordinates, origin at the icon corner) ===

    fn draw_note_icon(size: f32) -> String {
        let margin = size * 0.1;
        let w = size - 2.0 * margin;
        let h = size - 2.0 * margin;
        let fold = w * 0.25;

        let mut s = String::new();
        s.push_str(&format!("{} {} m\n", fmt_num(margin), fmt_num(margin)));
        s.push_str(&format!("{} {} l\n", fmt_num(margin), fmt_num(margin + h)));
        s.push_str(&format!("{} {} l\n", fmt_num(margin + w), fmt_num(margin + h)));
        s.push_str(&format!("{} {} l\n", fmt_num(margin + w), fmt_num(margin + fold)));
        s.push_str(&format!("{} {} l\n", fmt_num(margin + w - fold), fmt_num(margin)));
        s.push_str("h B\n");

        // folded corner
        s.push_str(&format!("{} {} m\n", fmt_num(margin + w - fold), fmt_num(margin)));
        s.push_str(&format!("{} {} l\n", fmt_num(margin + w - fold), fmt_num(margin + fold)));
        s.push_str(&format!("{} {} l S\n", fmt_num(margin + w), fmt_num(margin + fold)));
        s
    }

    fn draw_comment_icon(size: f32) -> String {
        let margin = size * 0.1;
        let w = size - 2.0 * margin;
        let h = (size - 2.0 * margin) * 0.8;
        let tail_h = (size - 2.0 * margin) * 0.2;

        let mut s = String::new();
        s.push_str(&format!(
            "{} {} {} {} re B\n",
            fmt_num(margin),
            fmt_num(margin + tail_h),
            fmt_num(w),
            fmt_num(h)
        ));
        s.push_str(&format!("{} {} m\n", fmt_num(margin + w * 0.2), fmt_num(margin + tail_h)));
        s.push_str(&format!("{} {} l\n", fmt_num(margin), fmt_num(margin)));
        s.push_str(&format!("{} {} l f\n", fmt_num(margin + w * 0.4), fmt_num(margin + tail_h)));
        s
    }

    fn draw_key_icon(size: f32) -> String {
        let cx = size / 2.0;
        let cy = size * 0.7;
        let r = size * 0.2;
        let k = KAPPA * r;

        let mut s = String::new();
        s.push_str(&format!("{} {} m\n", fmt_num(cx + r), fmt_num(cy)));
        for (c1, c2, e) in [
            ((cx + r, cy + k), (cx + k, cy + r), (cx, cy + r)),
            ((cx - k, cy + r), (cx - r, cy + k), (cx - r, cy)),
            ((cx - r, cy - k), (cx - k, cy - r), (cx, cy - r)),
            ((cx + k, cy - r), (cx + r, cy - k), (cx + r, cy)),
        ] {
            s.push_str(&format!(
                "{} {} {} {} {} {} c\n",
                fmt_num(c1.0),
                fmt_num(c1.1),
                fmt_num(c2.0),
                fmt_num(c2.1),
                fmt_num(e.0),
                fmt_num(e.1)
            ));
        }
        s.push_str("S\n");

        let shaft_w = size * 0.08;
        s.push_str(&format!(
            "{} {} {} {} re f\n",
            fmt_num(cx - shaft_w / 2.0),
            fmt_num(size * 0.15),
            fmt_num(shaft_w),
            fmt_num(cy - r - size * 0.15)
        ));
        s
    }

    fn draw_help_icon(size: f32) -> String {
        let cx = size / 2.0;
        let mut s = String::new();
        s.push_str(&format!("{} {} m\n", fmt_num(cx - size * 0.15), fmt_num(size * 0.75)));
        s.push_str(&format!(
            "{} {} {} {} {} {} c\n",
            fmt_num(cx - size * 0.15),
            fmt_num(size * 0.9),
            fmt_num(cx + size * 0.15),
            fmt_num(size * 0.9),
            fmt_num(cx + size * 0.15),
            fmt_num(size * 0.7)
        ));
        s.push_str(&format!(
            "{} {} {} {} {} {} c\n",
            fmt_num(cx + size * 0.15),
            fmt_num(size * 0.5),
            fmt_num(cx),
            fmt_num(size * 0.45),
            fmt_num(cx),
            fmt_num(size * 0.35)
        ));
        s.push_str("S\n");
        let dot_r = size * 0.06;
        s.push_str(&format!(
            "{} {} {} {} re f\n",
            fmt_num(cx - dot_r),
            fmt_num(size * 0.15 - dot_r),
            fmt_num(dot_r * 2.0),
            fmt_num(dot_r * 2.0)
        ));
        s
    }

    fn draw_insert_icon(size: f32) -> String {
        format!(
            "{} {} m\n{} {} l\n{} {} l S\n",
            fmt_num(size * 0.2),
            fmt_num(size * 0.3),
            fmt_num(size / 2.0),
            fmt_num(size * 0.8),
            fmt_num(size * 0.8),
            fmt_num(size * 0.3)
        )
    }

    fn draw_paragraph_icon(size: f32) -> String {
        let w = size * 0.6;
        let h = size * 0.8;
        let x = (size - w) / 2.0;
        let y = (size - h) / 2.0;
        let mut s = String::new();
        s.push_str(&format!(
            "{} {} m {} {} l S\n",
            fmt_num(x + w * 0.5),
            fmt_num(y),
            fmt_num(x + w * 0.5),
            fmt_num(y + h)
        ));
        s.push_str(&format!(
            "{} {} m {} {} l S\n",
            fmt_num(x + w * 0.75),
            fmt_num(y),
            fmt_num(x + w * 0.75),
            fmt_num(y + h)
        ));
        let r = w * 0.3;
        s.push_str(&format!("{} {} m\n", fmt_num(x + w * 0.5), fmt_num(y + h)));
        s.push_str(&format!("{} {} l\n", fmt_num(x + r), fmt_num(y + h)));
        s.push_str(&format!(
            "{} {} {} {} {} {} c f\n",
            fmt_num(x),
            fmt_num(y + h),
            fmt_num(x),
            fmt_num(y + h - r * 2.0),
            fmt_num(x + w * 0.5),
            fmt_num(y + h - r * 2.0)
        ));
        s
    }

    fn draw_paperclip_icon(size: f32) -> String {
        let x0 = size * 0.35;
        let x1 = size * 0.65;
        format!(
            "{} {} m\n{} {} l\n{} {} {} {} {} {} c\n{} {} l S\n",
            fmt_num(x0),
            fmt_num(size * 0.3),
            fmt_num(x0),
            fmt_num(size * 0.8),
            fmt_num(x0),
            fmt_num(size * 0.95),
            fmt_num(x1),
            fmt_num(size * 0.95),
            fmt_num(x1),
            fmt_num(size * 0.8),
            fmt_num(x1),
            fmt_num(size * 0.1)
        )
    }

    fn draw_speaker_icon(size: f32) -> String {
        format!(
            "{} {} {} {} re f\n{} {} m\n{} {} l\n{} {} l\n{} {} l h f\n",
            fmt_num(size * 0.15),
            fmt_num(size * 0.35),
            fmt_num(size * 0.2),
            fmt_num(size * 0.3),
            fmt_num(size * 0.35),
            fmt_num(size * 0.35),
            fmt_num(size * 0.7),
            fmt_num(size * 0.1),
            fmt_num(size * 0.7),
            fmt_num(size * 0.9),
            fmt_num(size * 0.35),
            fmt_num(size * 0.65)
        )
    }

    // === Resources and output ===

    fn add_ext_gstate(&mut self, name: &str, opacity: f32) {
        let mut gs_dict = HashMap::new();
        gs_dict.insert("Type".to_string(), Object::name("ExtGState"));
        gs_dict.insert("CA".to_string(), Object::Real(opacity as f64));
        gs_dict.insert("ca".to_string(), Object::Real(opacity as f64));

        let ext_gstate = self
            .resources
            .entry("ExtGState".to_string())
            .or_insert_with(|| Object::Dictionary(HashMap::new()));
        if let Object::Dictionary(dict) = ext_gstate {
            dict.insert(name.to_string(), Object::Dictionary(gs_dict));
        }
    }

    fn color_ops(color: Color, operator: &str) -> String {
        let [r, g, b] = color.rgb();
        format!("{} {} {} {}", fmt_num(r), fmt_num(g), fmt_num(b), operator)
    }

    /// Current content, for inspection before building.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the bounding box.
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    /// Build the appearance stream, returning the Form XObject dictionary and content bytes.
    pub fn build(&self) -> (HashMap<String, Object>, Vec<u8>) {
        let mut dict = HashMap::new();

        dict.insert("Type".to_string(), Object::name("XObject"));
        dict.insert("Subtype".to_string(), Object::name("Form"));
        dict.insert("FormType".to_string(), Object::Integer(1));
        dict.insert("BBox".to_string(), Object::reals(self.bbox.to_array()));

        if let Some(m) = self.matrix {
            dict.insert("Matrix".to_string(), Object::reals(m.to_array()));
        }

        if !self.resources.is_empty() {
            dict.insert("Resources".to_string(), Object::Dictionary(self.resources.clone()));
        }

        dict.insert("Length".to_string(), Object::Integer(self.content.len() as i64));

        (dict, self.content.clone().into_bytes())
    }

    /// Build into an [`AppearanceStream`].
    pub fn finish(&self) -> AppearanceStream {
        let (dict, content) = self.build();
        AppearanceStream {
            dict,
            content: content.into(),
        }
    }
}

/// X position of a line of `width` aligned in `rect`.
pub(crate) fn aligned_x(rect: &Rect, width: f32, alignment: TextAlignment) -> f32 {
    match alignment {
        TextAlignment::Left => rect.left(),
        TextAlignment::Center => rect.left() + (rect.width - width) / 2.0,
        TextAlignment::Right => rect.right() - width,
    }
}

/// Escape text for a PDF literal string. Characters outside Latin-1 become `?`.
pub(crate) fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            },
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x100 => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}
