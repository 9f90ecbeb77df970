//! Annotation value types per PDF spec ISO 32000-1:2008, Section 12.5.
//!
//! These are plain values with equality semantics. Annotations store them and
//! hand out copies; changing a returned value never changes the annotation.

use crate::geometry::{Matrix, Point, Rect};
use serde::{Deserialize, Serialize};

/// Annotation kind per PDF spec Table 169, plus the vendor `PSInk` and
/// `PagingSeal` kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// Text annotation (sticky note) - Section 12.5.6.4
    Note,
    /// Link annotation - Section 12.5.6.5
    Link,
    /// Free text annotation - Section 12.5.6.6
    FreeText,
    /// Line annotation - Section 12.5.6.7
    Line,
    /// Square annotation - Section 12.5.6.8
    Square,
    /// Circle annotation - Section 12.5.6.8
    Circle,
    /// Polygon annotation - Section 12.5.6.9
    Polygon,
    /// Polyline annotation - Section 12.5.6.9
    PolyLine,
    /// Highlight annotation - Section 12.5.6.10
    Highlight,
    /// Underline annotation - Section 12.5.6.10
    Underline,
    /// Squiggly underline annotation - Section 12.5.6.10
    Squiggly,
    /// Strikeout annotation - Section 12.5.6.10
    StrikeOut,
    /// Rubber stamp annotation - Section 12.5.6.12
    Stamp,
    /// Caret annotation - Section 12.5.6.11
    Caret,
    /// Ink annotation - Section 12.5.6.13
    Ink,
    /// Pressure-sensitive ink annotation
    PSInk,
    /// File attachment annotation - Section 12.5.6.15
    FileAttachment,
    /// Sound annotation - Section 12.5.6.16
    Sound,
    /// Movie annotation - Section 12.5.6.17
    Movie,
    /// Widget annotation (form field) - Section 12.5.6.19
    Widget,
    /// Screen annotation - Section 12.5.6.18
    Screen,
    /// Printer's mark annotation - Section 12.5.6.20
    PrinterMark,
    /// Trap network annotation - Section 12.5.6.21
    TrapNet,
    /// Watermark annotation - Section 12.5.6.22
    Watermark,
    /// 3D annotation - Section 12.5.6.24
    ThreeD,
    /// Popup annotation - Section 12.5.6.14
    Popup,
    /// Redaction annotation - Section 12.5.6.23
    Redact,
    /// RichMedia annotation - Adobe Extension Level 3
    RichMedia,
    /// Paging seal annotation
    PagingSeal,
    /// Unrecognised subtype
    Unknown,
}

impl AnnotationKind {
    /// Every known kind, in declaration order (excluding `Unknown`).
    pub const ALL: [AnnotationKind; 29] = [
        Self::Note,
        Self::Link,
        Self::FreeText,
        Self::Line,
        Self::Square,
        Self::Circle,
        Self::Polygon,
        Self::PolyLine,
        Self::Highlight,
        Self::Underline,
        Self::Squiggly,
        Self::StrikeOut,
        Self::Stamp,
        Self::Caret,
        Self::Ink,
        Self::PSInk,
        Self::FileAttachment,
        Self::Sound,
        Self::Movie,
        Self::Widget,
        Self::Screen,
        Self::PrinterMark,
        Self::TrapNet,
        Self::Watermark,
        Self::ThreeD,
        Self::Popup,
        Self::Redact,
        Self::RichMedia,
        Self::PagingSeal,
    ];

    /// Get the PDF `/Subtype` name for this kind.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Note => "Text",
            Self::Link => "Link",
            Self::FreeText => "FreeText",
            Self::Line => "Line",
            Self::Square => "Square",
            Self::Circle => "Circle",
            Self::Polygon => "Polygon",
            Self::PolyLine => "PolyLine",
            Self::Highlight => "Highlight",
            Self::Underline => "Underline",
            Self::Squiggly => "Squiggly",
            Self::StrikeOut => "StrikeOut",
            Self::Stamp => "Stamp",
            Self::Caret => "Caret",
            Self::Ink => "Ink",
            Self::PSInk => "PSInk",
            Self::FileAttachment => "FileAttachment",
            Self::Sound => "Sound",
            Self::Movie => "Movie",
            Self::Widget => "Widget",
            Self::Screen => "Screen",
            Self::PrinterMark => "PrinterMark",
            Self::TrapNet => "TrapNet",
            Self::Watermark => "Watermark",
            Self::ThreeD => "3D",
            Self::Popup => "Popup",
            Self::Redact => "Redact",
            Self::RichMedia => "RichMedia",
            Self::PagingSeal => "PagingSeal",
            Self::Unknown => "Unknown",
        }
    }

    /// Parse from a PDF `/Subtype` name.
    pub fn from_pdf_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.pdf_name() == name)
            .unwrap_or(Self::Unknown)
    }

    /// Markup annotations carry author commentary, popups and replies.
    pub fn is_markup(&self) -> bool {
        matches!(
            self,
            Self::Note
                | Self::FreeText
                | Self::Line
                | Self::Square
                | Self::Circle
                | Self::Polygon
                | Self::PolyLine
                | Self::Highlight
                | Self::Underline
                | Self::Squiggly
                | Self::StrikeOut
                | Self::Stamp
                | Self::Caret
                | Self::Ink
                | Self::FileAttachment
                | Self::Sound
                | Self::Redact
                | Self::PagingSeal
        )
    }

    /// Check if this is a text markup annotation.
    pub fn is_text_markup(&self) -> bool {
        matches!(self, Self::Highlight | Self::Underline | Self::Squiggly | Self::StrikeOut)
    }

    /// Kinds whose rectangle must be non-degenerate at creation.
    pub fn requires_rect(&self) -> bool {
        matches!(
            self,
            Self::Link
                | Self::Square
                | Self::Circle
                | Self::FreeText
                | Self::Stamp
                | Self::Caret
                | Self::FileAttachment
                | Self::Screen
                | Self::Note
        )
    }

    /// Kinds a page can create directly.
    pub fn is_creatable(&self) -> bool {
        matches!(
            self,
            Self::Note
                | Self::Link
                | Self::FreeText
                | Self::Line
                | Self::Square
                | Self::Circle
                | Self::Polygon
                | Self::PolyLine
                | Self::Highlight
                | Self::Underline
                | Self::Squiggly
                | Self::StrikeOut
                | Self::Stamp
                | Self::Caret
                | Self::Ink
                | Self::PSInk
                | Self::FileAttachment
                | Self::Sound
                | Self::Widget
                | Self::Screen
                | Self::Popup
                | Self::Redact
                | Self::PagingSeal
        )
    }

    /// Kinds that can be moved to a new rectangle.
    pub fn is_movable(&self) -> bool {
        !matches!(self, Self::Redact | Self::PagingSeal | Self::PSInk)
    }

    /// Markup kinds that may own a popup. Sound and free text never do.
    pub fn can_own_popup(&self) -> bool {
        self.is_markup() && !matches!(self, Self::Sound | Self::FreeText)
    }
}

bitflags::bitflags! {
    /// Annotation flags per PDF spec Table 165.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AnnotationFlags: u32 {
        /// Bit 1: do not display an unknown annotation type
        const INVISIBLE = 1 << 0;
        /// Bit 2: do not display or print
        const HIDDEN = 1 << 1;
        /// Bit 3: print the annotation when the page is printed
        const PRINT = 1 << 2;
        /// Bit 4: do not scale with page zoom
        const NO_ZOOM = 1 << 3;
        /// Bit 5: do not rotate with the page
        const NO_ROTATE = 1 << 4;
        /// Bit 6: do not display on screen
        const NO_VIEW = 1 << 5;
        /// Bit 7: do not allow interaction
        const READ_ONLY = 1 << 6;
        /// Bit 8: do not allow deletion or property changes
        const LOCKED = 1 << 7;
        /// Bit 9: invert NoView on pointer events
        const TOGGLE_NO_VIEW = 1 << 8;
        /// Bit 10: do not allow content changes
        const LOCKED_CONTENTS = 1 << 9;
    }
}

/// An ARGB color packed as `0xAARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    /// Opaque black.
    pub const BLACK: Color = Color(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    /// Opaque red.
    pub const RED: Color = Color(0xFFFF_0000);
    /// Opaque green.
    pub const GREEN: Color = Color(0xFF00_FF00);
    /// Opaque blue.
    pub const BLUE: Color = Color(0xFF00_00FF);
    /// Default highlight yellow.
    pub const HIGHLIGHT_YELLOW: Color = Color(0xFFFF_ED00);
    /// Orange.
    pub const ORANGE: Color = Color(0xFFFF_8000);

    /// Create a color from 8-bit components.
    pub fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color(u32::from_be_bytes([a, r, g, b]))
    }

    /// Create an opaque color from unit-range RGB components.
    pub fn from_rgb_f32(r: f32, g: f32, b: f32) -> Self {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::from_argb(0xFF, to_byte(r), to_byte(g), to_byte(b))
    }

    /// Create a color from a PDF color array (gray, RGB or CMYK).
    pub fn from_components(components: &[f32]) -> Option<Self> {
        match components {
            [g] => Some(Self::from_rgb_f32(*g, *g, *g)),
            [r, g, b] => Some(Self::from_rgb_f32(*r, *g, *b)),
            [c, m, y, k] => Some(Self::from_rgb_f32(
                (1.0 - c) * (1.0 - k),
                (1.0 - m) * (1.0 - k),
                (1.0 - y) * (1.0 - k),
            )),
            _ => None,
        }
    }

    /// Alpha component.
    pub fn alpha(&self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    /// RGB components in the unit range.
    pub fn rgb(&self) -> [f32; 3] {
        let [_, r, g, b] = self.0.to_be_bytes();
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }
}

/// Border style per PDF spec Tables 166 and 167.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BorderStyle {
    /// Solid border (S)
    #[default]
    Solid,
    /// Dashed border (D)
    Dashed,
    /// Beveled border (B)
    Beveled,
    /// Inset border (I)
    Inset,
    /// Underline border (U)
    Underline,
    /// Cloudy border effect (BE /S /C)
    Cloudy,
}

impl BorderStyle {
    /// Get PDF name for this border style. Cloudy is a border effect and
    /// is written as a solid border style.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Solid | Self::Cloudy => "S",
            Self::Dashed => "D",
            Self::Beveled => "B",
            Self::Inset => "I",
            Self::Underline => "U",
        }
    }

    /// Parse from PDF name.
    pub fn from_pdf_name(name: &str) -> Self {
        match name {
            "D" => Self::Dashed,
            "B" => Self::Beveled,
            "I" => Self::Inset,
            "U" => Self::Underline,
            _ => Self::Solid,
        }
    }
}

/// Border information of an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderInfo {
    /// Border width in points. Zero means no border.
    pub width: f32,
    /// Border style.
    pub style: BorderStyle,
    /// Intensity of the cloudy effect, 0 to 2.
    pub cloud_intensity: f32,
    /// Dash phase for dashed borders.
    pub dash_phase: f32,
    /// Dash pattern `[dash, gap, ...]` for dashed borders.
    pub dashes: Vec<f32>,
}

impl Default for BorderInfo {
    fn default() -> Self {
        Self::solid(1.0)
    }
}

impl BorderInfo {
    /// A solid border.
    pub fn solid(width: f32) -> Self {
        Self {
            width,
            style: BorderStyle::Solid,
            cloud_intensity: 0.0,
            dash_phase: 0.0,
            dashes: Vec::new(),
        }
    }

    /// A dashed border.
    pub fn dashed(width: f32, dash: f32, gap: f32) -> Self {
        Self {
            dashes: vec![dash, gap],
            style: BorderStyle::Dashed,
            ..Self::solid(width)
        }
    }

    /// A cloudy border.
    pub fn cloudy(width: f32, intensity: f32) -> Self {
        Self {
            style: BorderStyle::Cloudy,
            cloud_intensity: intensity,
            ..Self::solid(width)
        }
    }

    /// Check the value is usable: non-negative width, a dash pattern for
    /// dashed borders and a cloud intensity within 0..=2.
    pub fn is_valid(&self) -> bool {
        if !(self.width >= 0.0 && self.width.is_finite()) {
            return false;
        }
        match self.style {
            BorderStyle::Dashed => !self.dashes.is_empty() && self.dashes.iter().all(|d| *d >= 0.0),
            BorderStyle::Cloudy => (0.0..=2.0).contains(&self.cloud_intensity),
            _ => true,
        }
    }
}

/// Line ending style per PDF spec Table 176.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineEndingStyle {
    /// No line ending
    #[default]
    None,
    /// Square filled with interior color
    Square,
    /// Circle filled with interior color
    Circle,
    /// Diamond filled with interior color
    Diamond,
    /// Open arrow (two lines forming acute angle)
    OpenArrow,
    /// Closed arrow (filled triangle)
    ClosedArrow,
    /// Butt (perpendicular line at endpoint)
    Butt,
    /// Reverse open arrow
    ROpenArrow,
    /// Reverse closed arrow
    RClosedArrow,
    /// Slash (30 degrees from perpendicular)
    Slash,
}

impl LineEndingStyle {
    /// Get PDF name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Square => "Square",
            Self::Circle => "Circle",
            Self::Diamond => "Diamond",
            Self::OpenArrow => "OpenArrow",
            Self::ClosedArrow => "ClosedArrow",
            Self::Butt => "Butt",
            Self::ROpenArrow => "ROpenArrow",
            Self::RClosedArrow => "RClosedArrow",
            Self::Slash => "Slash",
        }
    }

    /// Parse from PDF name.
    pub fn from_pdf_name(name: &str) -> Self {
        match name {
            "Square" => Self::Square,
            "Circle" => Self::Circle,
            "Diamond" => Self::Diamond,
            "OpenArrow" => Self::OpenArrow,
            "ClosedArrow" => Self::ClosedArrow,
            "Butt" => Self::Butt,
            "ROpenArrow" => Self::ROpenArrow,
            "RClosedArrow" => Self::RClosedArrow,
            "Slash" => Self::Slash,
            _ => Self::None,
        }
    }
}

/// One quadrilateral of a text markup or redaction region.
///
/// The point order follows the PDF `/QuadPoints` convention: upper-left,
/// upper-right, lower-left, lower-right.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QuadPoints {
    /// First point (upper-left)
    pub first: Point,
    /// Second point (upper-right)
    pub second: Point,
    /// Third point (lower-left)
    pub third: Point,
    /// Fourth point (lower-right)
    pub fourth: Point,
}

impl QuadPoints {
    /// Create quad points from four corners.
    pub fn new(first: Point, second: Point, third: Point, fourth: Point) -> Self {
        Self {
            first,
            second,
            third,
            fourth,
        }
    }

    /// Quad covering a rectangle.
    pub fn from_rect(rect: &Rect) -> Self {
        Self::new(
            Point::new(rect.left(), rect.top()),
            Point::new(rect.right(), rect.top()),
            Point::new(rect.left(), rect.bottom()),
            Point::new(rect.right(), rect.bottom()),
        )
    }

    /// Corner points in PDF order.
    pub fn points(&self) -> [Point; 4] {
        [self.first, self.second, self.third, self.fourth]
    }

    /// Bounding rectangle of the quad.
    pub fn bounding_rect(&self) -> Rect {
        Rect::bounding(&self.points()).unwrap_or_default()
    }

    /// Flatten to the eight numbers written to `/QuadPoints`.
    pub fn to_array(&self) -> [f32; 8] {
        let [a, b, c, d] = self.points();
        [a.x, a.y, b.x, b.y, c.x, c.y, d.x, d.y]
    }

    /// Parse a flat `/QuadPoints` array. Trailing numbers that do not form
    /// a complete quad are ignored.
    pub fn parse_all(values: &[f32]) -> Vec<QuadPoints> {
        values
            .chunks_exact(8)
            .map(|c| {
                QuadPoints::new(
                    Point::new(c[0], c[1]),
                    Point::new(c[2], c[3]),
                    Point::new(c[4], c[5]),
                    Point::new(c[6], c[7]),
                )
            })
            .collect()
    }

    /// Apply a transformation to every corner.
    pub fn transform(&self, m: &Matrix) -> Self {
        let [a, b, c, d] = self.points();
        Self::new(m.transform_point(a), m.transform_point(b), m.transform_point(c), m.transform_point(d))
    }
}

/// Union of the bounding rectangles of a set of quads.
pub fn quads_bounding_rect(quads: &[QuadPoints]) -> Option<Rect> {
    quads
        .iter()
        .map(QuadPoints::bounding_rect)
        .reduce(|acc, r| acc.union(&r))
}

/// Kind of a path vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathPointKind {
    /// Starts a new run
    MoveTo,
    /// Straight segment from the previous point
    LineTo,
    /// Bezier control or end point
    BezierTo,
}

/// A vertex of an ink path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    /// Position
    pub point: Point,
    /// How the point connects to its predecessor
    pub kind: PathPointKind,
}

/// A path made of runs, each started by a `MoveTo` point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InkPath {
    points: Vec<PathPoint>,
}

impl InkPath {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a path where each inner slice is one run.
    pub fn from_runs(runs: &[Vec<Point>]) -> Self {
        let mut path = Self::new();
        for run in runs {
            let mut iter = run.iter();
            if let Some(first) = iter.next() {
                path.move_to(*first);
                for p in iter {
                    path.line_to(*p);
                }
            }
        }
        path
    }

    /// Start a new run.
    pub fn move_to(&mut self, point: Point) -> &mut Self {
        self.points.push(PathPoint {
            point,
            kind: PathPointKind::MoveTo,
        });
        self
    }

    /// Append a straight segment.
    pub fn line_to(&mut self, point: Point) -> &mut Self {
        self.points.push(PathPoint {
            point,
            kind: PathPointKind::LineTo,
        });
        self
    }

    /// Append a cubic Bezier segment.
    pub fn bezier_to(&mut self, c1: Point, c2: Point, end: Point) -> &mut Self {
        for point in [c1, c2, end] {
            self.points.push(PathPoint {
                point,
                kind: PathPointKind::BezierTo,
            });
        }
        self
    }

    /// All vertices.
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    /// Check if the path has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A path is usable when it is non-empty and starts with `MoveTo`.
    pub fn is_valid(&self) -> bool {
        matches!(self.points.first(), Some(p) if p.kind == PathPointKind::MoveTo)
    }

    /// Split into runs of positions, one per `MoveTo`.
    pub fn runs(&self) -> Vec<Vec<Point>> {
        let mut runs: Vec<Vec<Point>> = Vec::new();
        for p in &self.points {
            match (p.kind, runs.last_mut()) {
                (PathPointKind::MoveTo, _) | (_, None) => runs.push(vec![p.point]),
                (_, Some(run)) => run.push(p.point),
            }
        }
        runs
    }

    /// Bounding rectangle of every vertex.
    pub fn bounding_rect(&self) -> Option<Rect> {
        let pts: Vec<Point> = self.points.iter().map(|p| p.point).collect();
        Rect::bounding(&pts)
    }

    /// Apply a transformation to every vertex.
    pub fn transform(&self, m: &Matrix) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| PathPoint {
                    point: m.transform_point(p.point),
                    kind: p.kind,
                })
                .collect(),
        }
    }
}

/// Horizontal text alignment (`/Q`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlignment {
    /// Left-aligned (0)
    #[default]
    Left,
    /// Centered (1)
    Center,
    /// Right-aligned (2)
    Right,
}

impl TextAlignment {
    /// Convert to the PDF integer value.
    pub fn to_pdf_int(&self) -> i64 {
        match self {
            Self::Left => 0,
            Self::Center => 1,
            Self::Right => 2,
        }
    }

    /// Parse from the PDF integer value.
    pub fn from_pdf_int(value: i64) -> Self {
        match value {
            1 => Self::Center,
            2 => Self::Right,
            _ => Self::Left,
        }
    }
}

/// The standard 14 fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StandardFont {
    /// Courier
    Courier,
    /// Courier-Bold
    CourierBold,
    /// Courier-BoldOblique
    CourierBoldOblique,
    /// Courier-Oblique
    CourierOblique,
    /// Helvetica
    #[default]
    Helvetica,
    /// Helvetica-Bold
    HelveticaBold,
    /// Helvetica-BoldOblique
    HelveticaBoldOblique,
    /// Helvetica-Oblique
    HelveticaOblique,
    /// Times-Roman
    TimesRoman,
    /// Times-Bold
    TimesBold,
    /// Times-BoldItalic
    TimesBoldItalic,
    /// Times-Italic
    TimesItalic,
    /// Symbol
    Symbol,
    /// ZapfDingbats
    ZapfDingbats,
}

impl StandardFont {
    const ALL: [StandardFont; 14] = [
        Self::Courier,
        Self::CourierBold,
        Self::CourierBoldOblique,
        Self::CourierOblique,
        Self::Helvetica,
        Self::HelveticaBold,
        Self::HelveticaBoldOblique,
        Self::HelveticaOblique,
        Self::TimesRoman,
        Self::TimesBold,
        Self::TimesBoldItalic,
        Self::TimesItalic,
        Self::Symbol,
        Self::ZapfDingbats,
    ];

    /// PostScript base font name.
    pub fn base_name(&self) -> &'static str {
        match self {
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierBoldOblique => "Courier-BoldOblique",
            Self::CourierOblique => "Courier-Oblique",
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::TimesItalic => "Times-Italic",
            Self::Symbol => "Symbol",
            Self::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Short resource name used in `/DA` strings and appearance resources.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Courier => "Cour",
            Self::CourierBold => "CoBo",
            Self::CourierBoldOblique => "CoBO",
            Self::CourierOblique => "CoOb",
            Self::Helvetica => "Helv",
            Self::HelveticaBold => "HeBo",
            Self::HelveticaBoldOblique => "HeBO",
            Self::HelveticaOblique => "HeOb",
            Self::TimesRoman => "TiRo",
            Self::TimesBold => "TiBo",
            Self::TimesBoldItalic => "TiBI",
            Self::TimesItalic => "TiIt",
            Self::Symbol => "Symb",
            Self::ZapfDingbats => "ZaDb",
        }
    }

    /// Parse either a base font name or a resource name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.base_name() == name || f.resource_name() == name)
    }

    /// The bold and/or italic variant of this font's family.
    pub fn styled(&self, bold: bool, italic: bool) -> Self {
        match (self.family(), bold, italic) {
            (0, false, false) => Self::Courier,
            (0, true, false) => Self::CourierBold,
            (0, false, true) => Self::CourierOblique,
            (0, true, true) => Self::CourierBoldOblique,
            (1, false, false) => Self::Helvetica,
            (1, true, false) => Self::HelveticaBold,
            (1, false, true) => Self::HelveticaOblique,
            (1, true, true) => Self::HelveticaBoldOblique,
            (2, false, false) => Self::TimesRoman,
            (2, true, false) => Self::TimesBold,
            (2, false, true) => Self::TimesItalic,
            (2, true, true) => Self::TimesBoldItalic,
            _ => *self,
        }
    }

    fn family(&self) -> u8 {
        match self {
            Self::Courier | Self::CourierBold | Self::CourierBoldOblique | Self::CourierOblique => 0,
            Self::Helvetica
            | Self::HelveticaBold
            | Self::HelveticaBoldOblique
            | Self::HelveticaOblique => 1,
            Self::TimesRoman | Self::TimesBold | Self::TimesBoldItalic | Self::TimesItalic => 2,
            Self::Symbol | Self::ZapfDingbats => 3,
        }
    }
}

/// Default appearance (`/DA`) of text-bearing annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultAppearance {
    /// Font
    pub font: StandardFont,
    /// Font size in points; zero means fit to the available space
    pub text_size: f32,
    /// Text color
    pub text_color: Color,
}

impl Default for DefaultAppearance {
    fn default() -> Self {
        Self {
            font: StandardFont::Helvetica,
            text_size: 12.0,
            text_color: Color::BLACK,
        }
    }
}

impl DefaultAppearance {
    /// Create a default appearance.
    pub fn new(font: StandardFont, text_size: f32, text_color: Color) -> Self {
        Self {
            font,
            text_size,
            text_color,
        }
    }

    /// Render as a `/DA` operator string, e.g. `/Helv 12 Tf 0 0 1 rg`.
    pub fn to_da_string(&self) -> String {
        let [r, g, b] = self.text_color.rgb();
        format!(
            "/{} {} Tf {} {} {} rg",
            self.font.resource_name(),
            fmt_num(self.text_size),
            fmt_num(r),
            fmt_num(g),
            fmt_num(b)
        )
    }

    /// Parse a `/DA` operator string. Unknown fonts fall back to Helvetica.
    pub fn parse(da: &str) -> Option<Self> {
        let tokens: Vec<&str> = da.split_whitespace().collect();
        let mut result = Self::default();
        let mut seen_font = false;
        for (i, token) in tokens.iter().enumerate() {
            match *token {
                "Tf" if i >= 2 => {
                    let name = tokens[i - 2].trim_start_matches('/');
                    result.font = StandardFont::from_name(name).unwrap_or_default();
                    result.text_size = tokens[i - 1].parse().ok()?;
                    seen_font = true;
                },
                "rg" if i >= 3 => {
                    let comps: Option<Vec<f32>> =
                        tokens[i - 3..i].iter().map(|t| t.parse().ok()).collect();
                    result.text_color = Color::from_components(&comps?)?;
                },
                "g" if i >= 1 => {
                    let gray: f32 = tokens[i - 1].parse().ok()?;
                    result.text_color = Color::from_components(&[gray])?;
                },
                _ => {},
            }
        }
        seen_font.then_some(result)
    }
}

/// Format a number the way content streams expect: no exponent, no
/// trailing zeros.
pub(crate) fn fmt_num(value: f32) -> String {
    if value.fract() == 0.0 && value.abs() < 1.0e9 {
        return format!("{}", value as i64);
    }
    let s = format!("{:.4}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Vertical position of a text run relative to its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CornerMark {
    /// On the baseline
    #[default]
    None,
    /// Raised
    Superscript,
    /// Lowered
    Subscript,
}

/// Style of one rich text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextStyle {
    /// Font
    pub font: StandardFont,
    /// Font size in points
    pub text_size: f32,
    /// Alignment
    pub text_alignment: TextAlignment,
    /// Color
    pub text_color: Color,
    /// Bold
    pub is_bold: bool,
    /// Italic
    pub is_italic: bool,
    /// Underlined
    pub is_underline: bool,
    /// Struck through
    pub is_strikethrough: bool,
    /// Super- or subscript
    pub mark_style: CornerMark,
}

impl Default for RichTextStyle {
    fn default() -> Self {
        Self {
            font: StandardFont::Helvetica,
            text_size: 12.0,
            text_alignment: TextAlignment::Left,
            text_color: Color::BLACK,
            is_bold: false,
            is_italic: false,
            is_underline: false,
            is_strikethrough: false,
            mark_style: CornerMark::None,
        }
    }
}

impl RichTextStyle {
    /// The font after applying bold and italic.
    pub fn effective_font(&self) -> StandardFont {
        self.font.styled(self.is_bold, self.is_italic)
    }
}

/// When an icon is scaled into a widget (`/SW`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScaleWay {
    /// Always scale (A)
    #[default]
    Always,
    /// Scale only when the icon is bigger than the box (B)
    Bigger,
    /// Scale only when the icon is smaller than the box (S)
    Smaller,
    /// Never scale (N)
    Never,
}

/// Icon fit dictionary (`/IF`) per PDF spec Table 247.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconFit {
    /// When to scale
    pub scale_way: ScaleWay,
    /// Keep aspect ratio when scaling
    pub is_proportional_scaling: bool,
    /// Horizontal leftover space fraction assigned to the left
    pub horizontal_fraction: f32,
    /// Vertical leftover space fraction assigned to the bottom
    pub vertical_fraction: f32,
    /// Ignore the border width when fitting
    pub fit_bounds: bool,
}

impl Default for IconFit {
    fn default() -> Self {
        Self {
            scale_way: ScaleWay::Always,
            is_proportional_scaling: true,
            horizontal_fraction: 0.5,
            vertical_fraction: 0.5,
            fit_bounds: false,
        }
    }
}

/// Page-relative rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// No rotation
    #[default]
    R0,
    /// 90 degrees counter-clockwise
    R90,
    /// 180 degrees
    R180,
    /// 270 degrees counter-clockwise
    R270,
}

impl Rotation {
    /// Rotation in degrees.
    pub fn degrees(&self) -> i64 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }

    /// Parse a degree value; non-multiples of 90 map to `None`.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Self::R0),
            90 => Some(Self::R90),
            180 => Some(Self::R180),
            270 => Some(Self::R270),
            _ => None,
        }
    }
}

/// State model of a state annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateModel {
    /// Marked / Unmarked
    Marked,
    /// Review workflow
    Review,
}

impl StateModel {
    /// Get PDF name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Marked => "Marked",
            Self::Review => "Review",
        }
    }

    /// Parse from PDF name.
    pub fn from_pdf_name(name: &str) -> Option<Self> {
        match name {
            "Marked" => Some(Self::Marked),
            "Review" => Some(Self::Review),
            _ => None,
        }
    }
}

/// State of a state annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotState {
    /// Marked model: marked
    Marked,
    /// Marked model: unmarked
    Unmarked,
    /// Review model: accepted
    Accepted,
    /// Review model: rejected
    Rejected,
    /// Review model: cancelled
    Cancelled,
    /// Review model: completed
    Completed,
    /// Review model: deferred
    Deferred,
    /// Review model: future
    Future,
    /// Review model: none
    None,
}

impl AnnotState {
    /// The model this state belongs to.
    pub fn model(&self) -> StateModel {
        match self {
            Self::Marked | Self::Unmarked => StateModel::Marked,
            _ => StateModel::Review,
        }
    }

    /// Get PDF name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Marked => "Marked",
            Self::Unmarked => "Unmarked",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::Cancelled => "Cancelled",
            Self::Completed => "Completed",
            Self::Deferred => "Deferred",
            Self::Future => "Future",
            Self::None => "None",
        }
    }

    /// Parse from PDF name.
    pub fn from_pdf_name(name: &str) -> Option<Self> {
        Some(match name {
            "Marked" => Self::Marked,
            "Unmarked" => Self::Unmarked,
            "Accepted" => Self::Accepted,
            "Rejected" => Self::Rejected,
            "Cancelled" => Self::Cancelled,
            "Completed" => Self::Completed,
            "Deferred" => Self::Deferred,
            "Future" => Self::Future,
            "None" => Self::None,
            _ => return None,
        })
    }
}

/// Relationship of an in-reply-to annotation (`/RT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReplyType {
    /// A reply to the parent (R)
    #[default]
    Reply,
    /// A member of the parent's group (Group)
    Group,
}

impl ReplyType {
    /// Get PDF name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Reply => "R",
            Self::Group => "Group",
        }
    }
}

/// Highlighting mode of links and widgets (`/H`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HighlightingMode {
    /// No highlighting (N)
    None,
    /// Invert the contents (I)
    #[default]
    Invert,
    /// Invert the border (O)
    Outline,
    /// Display the down appearance (P)
    Push,
    /// Toggle (T)
    Toggle,
}

impl HighlightingMode {
    /// Get PDF name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::None => "N",
            Self::Invert => "I",
            Self::Outline => "O",
            Self::Push => "P",
            Self::Toggle => "T",
        }
    }

    /// Parse from PDF name.
    pub fn from_pdf_name(name: &str) -> Self {
        match name {
            "N" => Self::None,
            "O" => Self::Outline,
            "P" => Self::Push,
            "T" => Self::Toggle,
            _ => Self::Invert,
        }
    }
}

/// Placement of a line caption (`/CP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptionPosition {
    /// Centered inside the line
    #[default]
    Inline,
    /// On top of the line
    Top,
}

/// Which appearance stream of the `/AP` dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppearanceMode {
    /// Normal appearance (N)
    Normal,
    /// Rollover appearance (R)
    Rollover,
    /// Down appearance (D)
    Down,
}

impl AppearanceMode {
    /// Get PDF key.
    pub fn pdf_key(&self) -> &'static str {
        match self {
            Self::Normal => "N",
            Self::Rollover => "R",
            Self::Down => "D",
        }
    }
}

/// Form field type of a widget's parent field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// Push button
    PushButton,
    /// Check box
    CheckBox,
    /// Radio button
    RadioButton,
    /// Text field
    Text,
    /// Combo box
    ComboBox,
    /// List box
    ListBox,
    /// Signature field
    Signature,
}

impl FieldType {
    /// The `/FT` name of the field.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::PushButton | Self::CheckBox | Self::RadioButton => "Btn",
            Self::Text => "Tx",
            Self::ComboBox | Self::ListBox => "Ch",
            Self::Signature => "Sig",
        }
    }
}

/// Widget appearance characteristics (`/MK`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WidgetCharacteristics {
    /// Rotation of the widget content
    pub rotation: Rotation,
    /// Border color (BC)
    pub border_color: Option<Color>,
    /// Background color (BG)
    pub background_color: Option<Color>,
    /// Normal caption (CA)
    pub normal_caption: Option<String>,
    /// Rollover caption (RC)
    pub rollover_caption: Option<String>,
    /// Down caption (AC)
    pub down_caption: Option<String>,
    /// Icon fit (IF)
    pub icon_fit: Option<IconFit>,
}

/// Recognised `/IT` intent names.
pub mod intent {
    use super::AnnotationKind;

    /// Free text callout
    pub const FREE_TEXT_CALLOUT: &str = "FreeTextCallout";
    /// Free text typewriter
    pub const FREE_TEXT_TYPEWRITER: &str = "FreeTextTypewriter";
    /// Line with an arrow
    pub const LINE_ARROW: &str = "LineArrow";
    /// Dimension line
    pub const LINE_DIMENSION: &str = "LineDimension";
    /// Cloudy polygon
    pub const POLYGON_CLOUD: &str = "PolygonCloud";
    /// Dimension polygon
    pub const POLYGON_DIMENSION: &str = "PolygonDimension";
    /// Dimension polyline
    pub const POLYLINE_DIMENSION: &str = "PolyLineDimension";

    /// Check whether `intent` is meaningful for `kind`.
    pub fn is_allowed(kind: AnnotationKind, intent: &str) -> bool {
        match kind {
            AnnotationKind::FreeText => {
                intent == FREE_TEXT_CALLOUT || intent == FREE_TEXT_TYPEWRITER
            },
            AnnotationKind::Line => intent == LINE_ARROW || intent == LINE_DIMENSION,
            AnnotationKind::Polygon => intent == POLYGON_CLOUD || intent == POLYGON_DIMENSION,
            AnnotationKind::PolyLine => intent == POLYLINE_DIMENSION,
            _ => false,
        }
    }
}
