use crate::geometry::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    /// Accepts CSS-like tokens such as `"bold"` or `"italic bold"`; unknown
    /// tokens read as normal.
    pub fn parse(token: &str) -> Self {
        let lower = token.to_ascii_lowercase();
        let bold = lower.contains("bold");
        let italic = lower.contains("italic");
        match (bold, italic) {
            (true, true) => Self::BoldItalic,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (false, false) => Self::Normal,
        }
    }

    pub const fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    pub const fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }

    pub const fn token(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::BoldItalic => "italic bold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "center" => Self::Center,
            "right" => Self::Right,
            _ => Self::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    pub font_style: FontStyle,
    pub fill: Color,
    pub align: TextAlign,
    pub line_height: f64,
}

pub const MIN_FONT_SIZE: f64 = 1.0;

impl TextNode {
    pub fn new(text: impl Into<String>, font_size: f64, font_family: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: clamp_font_size(font_size),
            font_family: font_family.into(),
            font_style: FontStyle::Normal,
            fill: Color::BLACK,
            align: TextAlign::Left,
            line_height: 1.0,
        }
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.font_size = clamp_font_size(size);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }
}

fn clamp_font_size(size: f64) -> f64 {
    if size.is_finite() {
        size.max(MIN_FONT_SIZE)
    } else {
        MIN_FONT_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_style_parses_combined_tokens() {
        assert_eq!(FontStyle::parse("italic bold"), FontStyle::BoldItalic);
        assert_eq!(FontStyle::parse("Bold"), FontStyle::Bold);
        assert_eq!(FontStyle::parse("oblique"), FontStyle::Normal);
        assert_eq!(FontStyle::BoldItalic.token(), "italic bold");
    }

    #[test]
    fn font_size_never_drops_below_minimum() {
        let mut node = TextNode::new("a", 0.0, "Arial");
        assert_eq!(node.font_size, MIN_FONT_SIZE);
        node.set_font_size(f64::NAN);
        assert_eq!(node.font_size, MIN_FONT_SIZE);
        node.set_font_size(24.0);
        assert_eq!(node.font_size, 24.0);
    }

    #[test]
    fn lines_split_on_newlines() {
        let node = TextNode::new("one\ntwo\n", 12.0, "Arial");
        assert_eq!(node.lines().collect::<Vec<_>>(), vec!["one", "two", ""]);
        assert_eq!(node.line_count(), 3);
    }
}
