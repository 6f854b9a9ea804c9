use std::sync::Arc;

use ::image::RgbaImage;

use crate::filter::FilterState;
use crate::geometry::{Color, Rect, Size};

/// Committed crop region in the source image's pixel space. A zero-sized
/// rectangle means "no crop".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Region of the source actually rendered, clipped to `natural`.
    pub fn effective(&self, natural: Size) -> Rect {
        let full = Rect::new(0.0, 0.0, natural.width, natural.height);
        if self.is_empty() {
            return full;
        }
        Rect::new(self.x, self.y, self.width, self.height)
            .intersection(&full)
            .unwrap_or(full)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageNode {
    pub source: Arc<RgbaImage>,
    pub crop: CropRect,
    pub filters: FilterState,
    pub corner_radius: f64,
    /// Painted under transparent source pixels.
    pub fill: Color,
}

impl ImageNode {
    pub fn new(source: Arc<RgbaImage>) -> Self {
        Self {
            source,
            crop: CropRect::default(),
            filters: FilterState::default(),
            corner_radius: 0.0,
            fill: Color::TRANSPARENT,
        }
    }

    pub fn natural_size(&self) -> Size {
        Size::new(
            f64::from(self.source.width()),
            f64::from(self.source.height()),
        )
    }

    pub fn visible_region(&self) -> Rect {
        self.crop.effective(self.natural_size())
    }
}
