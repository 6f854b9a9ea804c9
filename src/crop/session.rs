use std::sync::Arc;

use image::RgbaImage;

use super::constraint::{constrain_move, constrain_resize, fit_ratio};
use super::{
    thirds_guides, CropError, CropMask, CropResult, GuideLine, ImageSnapshot, LastCrop,
    RatioPreset,
};
use crate::config::EditorConfig;
use crate::filter::FilterState;
use crate::geometry::{parse_ratio, Rect, Size, Vec2, EPSILON};
use crate::scene::{CropRect, Node};
use crate::selection::TransformHandle;
use crate::stage::{Stage, StageSnapshot, ZoomTarget};

/// Non-draggable copy of the base image shown at natural size while cropping.
#[derive(Debug, Clone)]
pub struct FrozenImage {
    pub source: Arc<RgbaImage>,
    pub filters: FilterState,
    pub center: Vec2,
    pub size: Size,
}

impl FrozenImage {
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.center, self.size)
    }
}

/// The user-manipulated crop rectangle, pivoting around its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selector {
    pub position: Vec2,
    pub size: Size,
    pub scale: Vec2,
}

impl Selector {
    fn covering(rect: Rect) -> Self {
        Self {
            position: rect.center(),
            size: rect.size(),
            scale: Vec2::ONE,
        }
    }

    /// Displayed size, after scale factors.
    pub fn displayed_size(&self) -> Size {
        self.size.scaled(self.scale)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center(self.position, self.displayed_size())
    }

    fn set_rect(&mut self, rect: Rect) {
        let scale = self.scale.abs();
        self.position = rect.center();
        self.size = Size::new(
            rect.width / scale.x.max(EPSILON),
            rect.height / scale.y.max(EPSILON),
        );
    }
}

#[derive(Debug)]
pub struct CropSession {
    stage: Stage,
    main_stage: StageSnapshot,
    snapshot: ImageSnapshot,
    frozen: FrozenImage,
    selector: Selector,
    mask: CropMask,
    guides: Vec<GuideLine>,
    preset: RatioPreset,
    ratio: f64,
    handle: TransformHandle,
    min_size: f64,
}

impl CropSession {
    /// Enters cropping for `base`. The live node is left untouched until the
    /// session ends; `last_crop` reopens the previously committed selector.
    pub fn start(
        main_stage: &Stage,
        base: &Node,
        last_crop: Option<&LastCrop>,
        config: &EditorConfig,
    ) -> CropResult<Self> {
        let snapshot = ImageSnapshot::capture(base)?;
        let image = base.as_image().ok_or(CropError::NotAnImage)?;
        let natural = image.natural_size();
        if natural.is_empty() {
            return Err(CropError::EmptyImage);
        }

        let mut stage =
            Stage::with_target(main_stage.width(), main_stage.height(), ZoomTarget::Crop);
        let frozen = FrozenImage {
            source: Arc::clone(&image.source),
            filters: image.filters.clone(),
            center: stage.viewport_center(),
            size: natural,
        };
        let fit = stage.fit_scale(natural, &config.zoom);
        stage.zoom_to_center(fit, &config.zoom);

        let bounds = frozen.bounds();
        let selector = match last_crop {
            Some(last) => {
                let mut selector = Selector {
                    position: frozen.center + last.selector_offset,
                    size: last.selector_size,
                    scale: last.selector_scale,
                };
                let half = selector.displayed_size().half().abs();
                selector.position = constrain_move(selector.position, half, bounds);
                selector
            }
            None => Selector::covering(bounds),
        };

        let session = Self {
            stage,
            main_stage: main_stage.snapshot(),
            snapshot,
            mask: CropMask { bounds },
            guides: thirds_guides(&selector.rect()),
            frozen,
            selector,
            preset: RatioPreset::Free,
            ratio: 0.0,
            handle: TransformHandle::for_crop_selector(0.0),
            min_size: min_selector_size(config.crop.min_selector_size, natural),
        };
        tracing::info!(
            width = natural.width,
            height = natural.height,
            restored = last_crop.is_some(),
            zoom = session.stage.zoom_percent(),
            "crop session started"
        );
        Ok(session)
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Pan/zoom of the main stage to restore when the session ends.
    pub fn main_stage_snapshot(&self) -> StageSnapshot {
        self.main_stage
    }

    pub fn snapshot(&self) -> &ImageSnapshot {
        &self.snapshot
    }

    pub fn frozen(&self) -> &FrozenImage {
        &self.frozen
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn selector_rect(&self) -> Rect {
        self.selector.rect()
    }

    pub fn mask(&self) -> &CropMask {
        &self.mask
    }

    pub fn shade_regions(&self) -> Vec<Rect> {
        self.mask.shade_regions(&self.selector.rect())
    }

    pub fn guides(&self) -> &[GuideLine] {
        &self.guides
    }

    pub fn handle(&self) -> &TransformHandle {
        &self.handle
    }

    pub fn preset(&self) -> RatioPreset {
        self.preset
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn set_preset(&mut self, preset: RatioPreset) {
        self.set_ratio(preset.token());
    }

    /// Locks the selector to the ratio named by `token` ("free" unlocks) and
    /// resets it to the largest compliant box centered on the image.
    pub fn set_ratio(&mut self, token: &str) {
        self.ratio = parse_ratio(token);
        self.preset = RatioPreset::from_token(token).unwrap_or(RatioPreset::Free);
        let size = fit_ratio(self.frozen.size, self.ratio);
        self.selector = Selector::covering(Rect::from_center(self.frozen.center, size));
        self.handle = TransformHandle::for_crop_selector(self.ratio);
        self.rebuild_guides();
        tracing::debug!(token, ratio = self.ratio, ?size, "crop ratio changed");
    }

    /// Applies one resize frame. `proposed` is the box the handle wants;
    /// the corrected box is applied and returned.
    pub fn resize_selector(&mut self, proposed: Rect) -> Rect {
        let corrected = constrain_resize(
            self.selector.rect(),
            proposed,
            self.frozen.bounds(),
            self.ratio,
            self.min_size,
        );
        self.selector.set_rect(corrected);
        self.rebuild_guides();
        corrected
    }

    /// Drags the selector so its center lands near `center`, kept on the image.
    pub fn move_selector(&mut self, center: Vec2) -> Vec2 {
        let half = self.selector.displayed_size().half().abs();
        self.selector.position = constrain_move(center, half, self.frozen.bounds());
        self.rebuild_guides();
        self.selector.position
    }

    fn rebuild_guides(&mut self) {
        self.guides = thirds_guides(&self.selector.rect());
    }

    /// Crop rectangle the current selector maps to, in source pixels.
    pub fn preview_crop(&self) -> CropRect {
        let selected = self.selector.rect();
        let image = self.frozen.bounds();
        CropRect::new(
            selected.left() - image.left(),
            selected.top() - image.top(),
            selected.width,
            selected.height,
        )
    }

    /// Writes the selector back to `base` as its crop and display size.
    pub fn commit(self, base: &mut Node) -> LastCrop {
        let crop = self.preview_crop();
        self.snapshot.restore_into(base);
        if let Some(image) = base.as_image_mut() {
            image.crop = crop;
        }
        base.transform
            .set_size_centered(Size::new(crop.width, crop.height));

        let last = LastCrop {
            crop,
            selector_offset: self.selector.position - self.frozen.center,
            selector_size: self.selector.size,
            selector_scale: self.selector.scale,
        };
        tracing::info!(
            x = crop.x,
            y = crop.y,
            width = crop.width,
            height = crop.height,
            "crop committed"
        );
        last
    }

    /// Leaves `base` exactly as it was when the session started.
    pub fn cancel(self, base: &mut Node) {
        self.snapshot.restore_into(base);
        tracing::info!("crop cancelled");
    }

    /// Restores `base` and removes any crop, showing the full image at natural size.
    pub fn reset(self, base: &mut Node) {
        self.snapshot.restore_into(base);
        base.transform.set_size_centered(self.frozen.size);
        if let Some(image) = base.as_image_mut() {
            image.crop = CropRect::default();
        }
        tracing::info!("crop reset");
    }
}

/// Configured minimum, capped at half the shorter image side so small
/// uploads can still be cropped.
fn min_selector_size(configured: f64, natural: Size) -> f64 {
    configured
        .min(natural.width.min(natural.height) / 2.0)
        .max(1.0)
}
