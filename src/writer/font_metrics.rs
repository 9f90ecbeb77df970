//! Standard 14 font metrics for laying out annotation text.
//!
//! Widths are PostScript metrics in units of 1/1000 em. Bold and oblique
//! variants share the widths of their regular face.

use crate::annotation_types::StandardFont;

/// Width used for characters missing from a table.
const DEFAULT_WIDTH: u16 = 500;

static HELVETICA_WIDTHS: phf::Map<char, u16> = phf::phf_map! {
    ' ' => 278,
    '.' => 278,
    ',' => 278,
    '-' => 333,
    ':' => 278,
    ';' => 278,
    '!' => 278,
    '?' => 556,
    '\'' => 191,
    '"' => 355,
    '(' => 333,
    ')' => 333,
    '[' => 278,
    ']' => 278,
    '/' => 278,
    '@' => 1015,
    '#' => 556,
    '$' => 556,
    '%' => 889,
    '&' => 667,
    '*' => 389,
    '+' => 584,
    '=' => 584,
    '_' => 556,
    'a' => 556,
    'b' => 556,
    'c' => 500,
    'd' => 556,
    'e' => 556,
    'f' => 278,
    'g' => 556,
    'h' => 556,
    'i' => 222,
    'j' => 222,
    'k' => 500,
    'l' => 222,
    'm' => 833,
    'n' => 556,
    'o' => 556,
    'p' => 556,
    'q' => 556,
    'r' => 333,
    's' => 500,
    't' => 278,
    'u' => 556,
    'v' => 500,
    'w' => 722,
    'x' => 500,
    'y' => 500,
    'z' => 500,
    'A' => 667,
    'B' => 667,
    'C' => 722,
    'D' => 722,
    'E' => 667,
    'F' => 611,
    'G' => 778,
    'H' => 722,
    'I' => 278,
    'J' => 500,
    'K' => 667,
    'L' => 556,
    'M' => 833,
    'N' => 722,
    'O' => 778,
    'P' => 667,
    'Q' => 778,
    'R' => 722,
    'S' => 667,
    'T' => 611,
    'U' => 722,
    'V' => 667,
    'W' => 944,
    'X' => 667,
    'Y' => 667,
    'Z' => 611,
    '0' => 556,
    '1' => 556,
    '2' => 556,
    '3' => 556,
    '4' => 556,
    '5' => 556,
    '6' => 556,
    '7' => 556,
    '8' => 556,
    '9' => 556,
};

static TIMES_WIDTHS: phf::Map<char, u16> = phf::phf_map! {
    ' ' => 250,
    '.' => 250,
    ',' => 250,
    '-' => 333,
    ':' => 278,
    ';' => 278,
    '!' => 333,
    '?' => 444,
    '\'' => 180,
    '"' => 408,
    '(' => 333,
    ')' => 333,
    '[' => 333,
    ']' => 333,
    '/' => 278,
    '@' => 921,
    '#' => 500,
    '$' => 500,
    '%' => 833,
    '&' => 778,
    '*' => 500,
    '+' => 564,
    '=' => 564,
    '_' => 500,
    'a' => 444,
    'b' => 500,
    'c' => 444,
    'd' => 500,
    'e' => 444,
    'f' => 333,
    'g' => 500,
    'h' => 500,
    'i' => 278,
    'j' => 278,
    'k' => 500,
    'l' => 278,
    'm' => 778,
    'n' => 500,
    'o' => 500,
    'p' => 500,
    'q' => 500,
    'r' => 333,
    's' => 389,
    't' => 278,
    'u' => 500,
    'v' => 500,
    'w' => 722,
    'x' => 500,
    'y' => 500,
    'z' => 444,
    'A' => 722,
    'B' => 667,
    'C' => 667,
    'D' => 722,
    'E' => 611,
    'F' => 556,
    'G' => 722,
    'H' => 722,
    'I' => 333,
    'J' => 389,
    'K' => 722,
    'L' => 611,
    'M' => 889,
    'N' => 722,
    'O' => 722,
    'P' => 556,
    'Q' => 722,
    'R' => 667,
    'S' => 556,
    'T' => 611,
    'U' => 722,
    'V' => 722,
    'W' => 944,
    'X' => 722,
    'Y' => 722,
    'Z' => 611,
    '0' => 500,
    '1' => 500,
    '2' => 500,
    '3' => 500,
    '4' => 500,
    '5' => 500,
    '6' => 500,
    '7' => 500,
    '8' => 500,
    '9' => 500,
};

/// Width of a single character in font units.
pub fn char_width(font: StandardFont, ch: char) -> u16 {
    match font {
        StandardFont::Courier
        | StandardFont::CourierBold
        | StandardFont::CourierOblique
        | StandardFont::CourierBoldOblique => 600,
        StandardFont::Helvetica
        | StandardFont::HelveticaBold
        | StandardFont::HelveticaOblique
        | StandardFont::HelveticaBoldOblique => {
            HELVETICA_WIDTHS.get(&ch).copied().unwrap_or(DEFAULT_WIDTH)
        },
        StandardFont::TimesRoman
        | StandardFont::TimesBold
        | StandardFont::TimesItalic
        | StandardFont::TimesBoldItalic => TIMES_WIDTHS.get(&ch).copied().unwrap_or(DEFAULT_WIDTH),
        StandardFont::Symbol | StandardFont::ZapfDingbats => DEFAULT_WIDTH,
    }
}

/// Width of `text` in points at `font_size`.
pub fn text_width(font: StandardFont, text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(font, c) as u32).sum();
    units as f32 * font_size / 1000.0
}

/// Ascender and descender in font units.
pub fn vertical_metrics(font: StandardFont) -> (f32, f32) {
    match font {
        StandardFont::Helvetica
        | StandardFont::HelveticaBold
        | StandardFont::HelveticaOblique
        | StandardFont::HelveticaBoldOblique => (718.0, -207.0),
        StandardFont::TimesRoman | StandardFont::TimesItalic => (683.0, -217.0),
        StandardFont::TimesBold | StandardFont::TimesBoldItalic => (676.0, -205.0),
        StandardFont::Courier | StandardFont::CourierOblique => (629.0, -157.0),
        StandardFont::CourierBold | StandardFont::CourierBoldOblique => (626.0, -142.0),
        StandardFont::Symbol | StandardFont::ZapfDingbats => (800.0, -200.0),
    }
}

/// Line height in points, at 120% of the em box.
pub fn line_height(font_size: f32) -> f32 {
    font_size * 1.2
}

/// Largest font size at which `text` fits in `width` x `height` on one line,
/// capped at `max_size`.
pub fn fit_font_size(font: StandardFont, text: &str, width: f32, height: f32, max_size: f32) -> f32 {
    let unit_width = text_width(font, text, 1.0);
    let by_width = if unit_width > 0.0 {
        width / unit_width
    } else {
        max_size
    };
    let by_height = height / 1.2;
    by_width.min(by_height).min(max_size).max(0.0)
}

/// Break `text` into lines no wider than `max_width`. Explicit newlines are
/// kept; a word longer than the width gets a line of its own.
pub fn wrap_text(font: StandardFont, text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if !current.is_empty() && text_width(font, &candidate, font_size) > max_width {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    lines
}
