//! Cropping mode: a constrained selector over a frozen copy of the base image.

mod constraint;
mod ratio;
mod session;

pub use constraint::{constrain_move, constrain_resize, fit_ratio};
pub use ratio::RatioPreset;
pub use session::{CropSession, FrozenImage, Selector};

use thiserror::Error;

use crate::filter::FilterState;
use crate::geometry::{Color, Rect, Size, Vec2};
use crate::scene::{CropRect, Node, Transform};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CropError {
    #[error("only the base image can be cropped")]
    NotBaseImage,
    #[error("crop target is not an image node")]
    NotAnImage,
    #[error("image has no pixels to crop")]
    EmptyImage,
}

pub type CropResult<T> = std::result::Result<T, CropError>;

/// Selector geometry remembered after a commit so the next crop session
/// reopens on the same region. Offsets are relative to the frozen image center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastCrop {
    pub crop: CropRect,
    pub selector_offset: Vec2,
    pub selector_size: Size,
    pub selector_scale: Vec2,
}

/// Owned copy of the base image's editable state, taken on crop entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSnapshot {
    pub transform: Transform,
    pub crop: CropRect,
    pub filters: FilterState,
    pub corner_radius: f64,
    pub fill: Color,
}

impl ImageSnapshot {
    pub fn capture(node: &Node) -> CropResult<Self> {
        let image = node.as_image().ok_or(CropError::NotAnImage)?;
        Ok(Self {
            transform: node.transform,
            crop: image.crop,
            filters: image.filters.clone(),
            corner_radius: image.corner_radius,
            fill: image.fill,
        })
    }

    pub fn restore_into(&self, node: &mut Node) {
        node.transform = self.transform;
        if let Some(image) = node.as_image_mut() {
            image.crop = self.crop;
            image.filters = self.filters.clone();
            image.corner_radius = self.corner_radius;
            image.fill = self.fill;
        }
    }
}

/// Darkening layer sized to the frozen image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropMask {
    pub bounds: Rect,
}

impl CropMask {
    /// The shaded bands around `selector`: above, below, left and right of it.
    pub fn shade_regions(&self, selector: &Rect) -> Vec<Rect> {
        let Some(hole) = self.bounds.intersection(selector) else {
            return vec![self.bounds];
        };
        let mask = self.bounds;
        [
            Rect::new(mask.left(), mask.top(), mask.width, hole.top() - mask.top()),
            Rect::new(mask.left(), hole.bottom(), mask.width, mask.bottom() - hole.bottom()),
            Rect::new(mask.left(), hole.top(), hole.left() - mask.left(), hole.height),
            Rect::new(hole.right(), hole.top(), mask.right() - hole.right(), hole.height),
        ]
        .into_iter()
        .filter(|band| band.width > 0.0 && band.height > 0.0)
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    pub start: Vec2,
    pub end: Vec2,
}

/// Rule-of-thirds lines across `rect`: two vertical, then two horizontal.
pub fn thirds_guides(rect: &Rect) -> Vec<GuideLine> {
    let mut guides = Vec::with_capacity(4);
    for step in [1.0, 2.0] {
        let x = rect.left() + rect.width * step / 3.0;
        guides.push(GuideLine {
            start: Vec2::new(x, rect.top()),
            end: Vec2::new(x, rect.bottom()),
        });
    }
    for step in [1.0, 2.0] {
        let y = rect.top() + rect.height * step / 3.0;
        guides.push(GuideLine {
            start: Vec2::new(rect.left(), y),
            end: Vec2::new(rect.right(), y),
        });
    }
    guides
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ::image::RgbaImage;

    use crate::filter::FilterKind;
    use crate::scene::Scene;

    #[test]
    fn snapshot_is_independent_of_live_node() {
        let mut scene = Scene::new(Arc::new(RgbaImage::new(40, 30)), Vec2::new(50.0, 50.0));
        let snapshot = ImageSnapshot::capture(scene.base()).expect("base is an image");
        let before = snapshot.clone();

        let base = scene.base_mut();
        base.transform.position = Vec2::new(-5.0, 9.0);
        base.transform.scale = Vec2::new(-2.0, 3.0);
        let image = base.as_image_mut().expect("base is an image");
        image.crop = CropRect::new(1.0, 2.0, 3.0, 4.0);
        image.filters.toggle(FilterKind::Invert);

        assert_eq!(snapshot, before);
        snapshot.restore_into(scene.base_mut());
        assert_eq!(
            ImageSnapshot::capture(scene.base()).expect("base is an image"),
            before
        );
    }

    #[test]
    fn mask_shades_four_bands_around_inner_selector() {
        let mask = CropMask {
            bounds: Rect::new(0.0, 0.0, 100.0, 80.0),
        };
        let regions = mask.shade_regions(&Rect::new(20.0, 10.0, 50.0, 40.0));
        assert_eq!(
            regions,
            vec![
                Rect::new(0.0, 0.0, 100.0, 10.0),
                Rect::new(0.0, 50.0, 100.0, 30.0),
                Rect::new(0.0, 10.0, 20.0, 40.0),
                Rect::new(70.0, 10.0, 30.0, 40.0),
            ]
        );
    }

    #[test]
    fn mask_has_no_bands_for_full_selection() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 80.0);
        let mask = CropMask { bounds };
        assert!(mask.shade_regions(&bounds).is_empty());
    }

    #[test]
    fn thirds_guides_split_the_selector() {
        let guides = thirds_guides(&Rect::new(0.0, 0.0, 90.0, 60.0));
        assert_eq!(guides.len(), 4);
        assert_eq!(guides[0].start, Vec2::new(30.0, 0.0));
        assert_eq!(guides[1].end, Vec2::new(60.0, 60.0));
        assert_eq!(guides[2].start, Vec2::new(0.0, 20.0));
        assert_eq!(guides[3].end, Vec2::new(90.0, 40.0));
    }
}
