//! Shared geometric and color primitives used across the stage, scene and crop modules.

use std::ops::{Add, Div, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise product.
    pub fn scale_by(self, factors: Vec2) -> Self {
        Self::new(self.x * factors.x, self.y * factors.y)
    }

    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn half(self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn as_vec(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn scaled(self, factors: Vec2) -> Self {
        Self::new(self.width * factors.x.abs(), self.height * factors.y.abs())
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Axis-aligned rectangle described by its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_center(center: Vec2, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    /// Smallest rectangle containing every point. `None` for an empty iterator.
    pub fn bounding(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for point in points {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Containment with a small tolerance for accumulated floating error.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left() - EPSILON
            && other.top() >= self.top() - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.bottom() <= self.bottom() + EPSILON
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

pub const EPSILON: f64 = 1e-6;

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

/// Clamps `value` into `[min, max]`; when the range is inverted the midpoint wins.
pub fn clamp_or_mid(value: f64, min: f64, max: f64) -> f64 {
    if min > max {
        return (min + max) / 2.0;
    }
    value.clamp(min, max)
}

/// Rotates `point` around `pivot` by `degrees` (clockwise in y-down screen space).
pub fn rotate_point(point: Vec2, pivot: Vec2, degrees: f64) -> Vec2 {
    if degrees == 0.0 {
        return point;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let d = point - pivot;
    Vec2::new(pivot.x + d.x * cos - d.y * sin, pivot.y + d.x * sin + d.y * cos)
}

/// Normalizes an angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    if approx_eq(normalized, 360.0) {
        0.0
    } else {
        normalized
    }
}

/// Parses a ratio token of the form `"W-H"` into `W / H`.
///
/// `"free"` and the empty token unlock the ratio (`0.0`). Anything malformed
/// falls back to `1.0`.
pub fn parse_ratio(token: &str) -> f64 {
    let token = token.trim();
    if token.is_empty() || token.eq_ignore_ascii_case("free") {
        return 0.0;
    }
    let parsed = token.split_once('-').and_then(|(width, height)| {
        let width = width.trim().parse::<f64>().ok()?;
        let height = height.trim().parse::<f64>().ok()?;
        (width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0)
            .then(|| width / height)
    });
    match parsed {
        Some(ratio) => ratio,
        None => {
            tracing::debug!(token, "malformed ratio token; falling back to 1");
            1.0
        }
    }
}

/// Parses free numeric text, falling back to `fallback` when unparseable or non-finite.
pub fn parse_number_or(text: &str, fallback: f64) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => fallback,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        match hex.len() {
            3 => {
                let expand = |index: usize| channel(index..index + 1).map(|value| value * 17);
                Some(Self::rgb(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Some(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Some(Self::rgba(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ratio_reads_width_height_tokens() {
        assert!(approx_eq(parse_ratio("4-3"), 4.0 / 3.0));
        assert!(approx_eq(parse_ratio("19-9"), 19.0 / 9.0));
        assert_eq!(parse_ratio("1-1"), 1.0);
    }

    #[test]
    fn parse_ratio_unlocks_for_free_and_falls_back_for_garbage() {
        assert_eq!(parse_ratio("free"), 0.0);
        assert_eq!(parse_ratio(""), 0.0);
        assert_eq!(parse_ratio("square"), 1.0);
        assert_eq!(parse_ratio("4-0"), 1.0);
        assert_eq!(parse_ratio("a-b"), 1.0);
    }

    #[test]
    fn clamp_or_mid_handles_inverted_ranges() {
        assert_eq!(clamp_or_mid(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp_or_mid(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp_or_mid(3.0, 10.0, 0.0), 5.0);
    }

    #[test]
    fn rotate_point_quarter_turn_around_pivot() {
        let rotated = rotate_point(Vec2::new(2.0, 1.0), Vec2::new(1.0, 1.0), 90.0);
        assert!(approx_eq(rotated.x, 1.0));
        assert!(approx_eq(rotated.y, 2.0));
    }

    #[test]
    fn normalize_degrees_wraps_negative_and_large_angles() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(450.0), 90.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
    }

    #[test]
    fn rect_bounding_and_intersection() {
        let rect = Rect::bounding([Vec2::new(3.0, -1.0), Vec2::new(-2.0, 4.0)])
            .expect("two points should bound");
        assert_eq!(rect, Rect::new(-2.0, -1.0, 5.0, 5.0));
        let clipped = rect
            .intersection(&Rect::new(0.0, 0.0, 10.0, 10.0))
            .expect("rects overlap");
        assert_eq!(clipped, Rect::new(0.0, 0.0, 3.0, 4.0));
        assert!(rect.intersection(&Rect::new(10.0, 10.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn color_hex_round_trips_short_and_long_forms() {
        assert_eq!(Color::from_hex("#fff"), Some(Color::rgb(255, 255, 255)));
        assert_eq!(Color::from_hex("#102030"), Some(Color::rgb(16, 32, 48)));
        assert_eq!(
            Color::from_hex("#10203040"),
            Some(Color::rgba(16, 32, 48, 64))
        );
        assert_eq!(Color::from_hex("102030"), None);
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::rgb(16, 32, 48).to_hex(), "#102030");
    }

    #[test]
    fn parse_number_or_falls_back_for_free_text() {
        assert_eq!(parse_number_or(" 42 ", 1.0), 42.0);
        assert_eq!(parse_number_or("abc", 1.0), 1.0);
        assert_eq!(parse_number_or("NaN", 3.0), 3.0);
    }
}
