use ab_glyph::{Font, FontArc, GlyphId, InvalidFont, ScaleFont};

use crate::scene::TextNode;

/// Measures the advance width of one line of a text node.
pub trait TextMeasure {
    fn line_width(&self, line: &str, node: &TextNode) -> f64;

    fn widest_line(&self, node: &TextNode) -> f64 {
        node.lines()
            .map(|line| self.line_width(line, node).max(0.0))
            .fold(0.0, f64::max)
    }
}

/// Fixed per-character width, used when no font data is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMeasure;

const FALLBACK_CHAR_WIDTH: f64 = 0.62;
const BOLD_WIDTH_FACTOR: f64 = 1.08;

impl TextMeasure for ApproximateMeasure {
    fn line_width(&self, line: &str, node: &TextNode) -> f64 {
        let mut char_width = (node.font_size * FALLBACK_CHAR_WIDTH).max(1.0);
        if node.font_style.is_bold() {
            char_width *= BOLD_WIDTH_FACTOR;
        }
        line.chars().count() as f64 * char_width
    }
}

/// Glyph advances and kerning from a loaded font.
#[derive(Clone)]
pub struct FontMeasure {
    font: FontArc,
}

impl std::fmt::Debug for FontMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontMeasure").finish_non_exhaustive()
    }
}

impl FontMeasure {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, InvalidFont> {
        FontArc::try_from_vec(bytes).map(Self::new)
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }
}

impl TextMeasure for FontMeasure {
    fn line_width(&self, line: &str, node: &TextNode) -> f64 {
        let scaled = self.font.as_scaled(node.font_size as f32);
        let mut cursor_x = 0.0_f32;
        let mut last_glyph: Option<GlyphId> = None;
        for ch in line.chars() {
            let glyph_id = self.font.glyph_id(ch);
            if let Some(prev) = last_glyph {
                cursor_x += scaled.kern(prev, glyph_id);
            }
            cursor_x += scaled.h_advance(glyph_id);
            last_glyph = Some(glyph_id);
        }
        f64::from(cursor_x)
    }
}
