//! Viewport state: pan position and zoom scale of a rendering surface.

use crate::config::ZoomConfig;
use crate::geometry::{Rect, Size, Vec2, EPSILON};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Wheel scrolling down zooms out, up zooms in.
    pub fn from_wheel_delta(delta_y: f64) -> Self {
        if delta_y > 0.0 {
            Self::Out
        } else {
            Self::In
        }
    }

    pub const fn inverted(self) -> Self {
        match self {
            Self::In => Self::Out,
            Self::Out => Self::In,
        }
    }
}

/// Which zoom readout control a stage reports to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomTarget {
    Main,
    Crop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageSnapshot {
    pub scale: f64,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    width: f64,
    height: f64,
    scale: f64,
    position: Vec2,
    target: ZoomTarget,
}

pub fn zoom_percent(scale: f64) -> u32 {
    (scale * 100.0).round().max(0.0) as u32
}

impl Stage {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_target(width, height, ZoomTarget::Main)
    }

    pub fn with_target(width: f64, height: f64, target: ZoomTarget) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            scale: 1.0,
            position: Vec2::ZERO,
            target,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn target(&self) -> ZoomTarget {
        self.target
    }

    pub fn zoom_percent(&self) -> u32 {
        zoom_percent(self.scale)
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.position = self.position + delta;
    }

    pub fn snapshot(&self) -> StageSnapshot {
        StageSnapshot {
            scale: self.scale,
            position: self.position,
        }
    }

    pub fn restore(&mut self, snapshot: StageSnapshot) {
        self.scale = snapshot.scale;
        self.position = snapshot.position;
    }

    /// Viewport center in screen pixels.
    pub fn viewport_center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn to_content(&self, screen: Vec2) -> Vec2 {
        (screen - self.position) / self.scale
    }

    pub fn to_screen(&self, content: Vec2) -> Vec2 {
        content * self.scale + self.position
    }

    /// Zooms one wheel step keeping the content under `pointer` fixed on screen.
    ///
    /// Returns the new zoom percentage, or `None` when the step would leave the
    /// allowed range (the stage is left untouched).
    pub fn zoom_to_pointer(
        &mut self,
        pointer: Vec2,
        direction: ZoomDirection,
        ctrl_held: bool,
        zoom: &ZoomConfig,
    ) -> Option<u32> {
        let direction = if ctrl_held {
            direction.inverted()
        } else {
            direction
        };
        let new_scale = match direction {
            ZoomDirection::In => self.scale * zoom.step_factor,
            ZoomDirection::Out => self.scale / zoom.step_factor,
        };
        let percent = zoom_percent(new_scale);
        if !zoom.allows_percent(percent) || !scale_in_range(new_scale, zoom) {
            tracing::debug!(percent, ?direction, "pointer zoom rejected");
            return None;
        }
        self.zoom_about(pointer, new_scale);
        Some(percent)
    }

    /// Zooms to `scale` anchored at the viewport center; the scale is clamped.
    pub fn zoom_to_center(&mut self, scale: f64, zoom: &ZoomConfig) -> u32 {
        let scale = if scale.is_finite() {
            scale.clamp(zoom.min_scale(), zoom.max_scale())
        } else {
            self.scale
        };
        self.zoom_about(self.viewport_center(), scale);
        self.zoom_percent()
    }

    pub fn manual_zoom_step(&mut self, zoom_in: bool, zoom: &ZoomConfig) -> u32 {
        let delta = if zoom_in {
            zoom.manual_step
        } else {
            -zoom.manual_step
        };
        self.zoom_to_center(self.scale + delta, zoom)
    }

    fn zoom_about(&mut self, anchor: Vec2, new_scale: f64) {
        let content_point = self.to_content(anchor);
        self.position = anchor - content_point * new_scale;
        self.scale = new_scale;
    }

    /// Scale that fits `content` inside the viewport, never enlarging past 1:1.
    pub fn fit_scale(&self, content: Size, zoom: &ZoomConfig) -> f64 {
        if content.is_empty() {
            return 1.0;
        }
        (self.width / content.width)
            .min(self.height / content.height)
            .min(1.0)
            .clamp(zoom.min_scale(), zoom.max_scale())
    }

    /// Pan position that brings `content_rect` fully on screen with `margin`
    /// pixels to spare, or `None` when it is already visible.
    pub fn reveal_position(&self, content_rect: &Rect, margin: f64) -> Option<Vec2> {
        let top_left = self.to_screen(content_rect.top_left());
        let screen = Rect::new(
            top_left.x,
            top_left.y,
            content_rect.width * self.scale,
            content_rect.height * self.scale,
        );
        let shift_x = axis_shift(screen.left(), screen.right(), self.width, margin);
        let shift_y = axis_shift(screen.top(), screen.bottom(), self.height, margin);
        if shift_x == 0.0 && shift_y == 0.0 {
            return None;
        }
        Some(self.position + Vec2::new(shift_x, shift_y))
    }
}

fn scale_in_range(scale: f64, zoom: &ZoomConfig) -> bool {
    let tolerance = 0.005;
    scale >= zoom.min_scale() - tolerance && scale <= zoom.max_scale() + tolerance
}

fn axis_shift(start: f64, end: f64, extent: f64, margin: f64) -> f64 {
    if end - start + 2.0 * margin > extent {
        // Too large to fit: align the leading edge.
        return if start < margin { margin - start } else { 0.0 };
    }
    if start < margin {
        margin - start
    } else if end > extent - margin {
        extent - margin - end
    } else {
        0.0
    }
}

/// Ease-out tween between two pan positions, advanced by the host's frame clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothPan {
    from: Vec2,
    to: Vec2,
    elapsed_ms: f64,
    duration_ms: f64,
}

impl SmoothPan {
    pub fn new(from: Vec2, to: Vec2, duration_ms: u64) -> Self {
        Self {
            from,
            to,
            elapsed_ms: 0.0,
            duration_ms: duration_ms as f64,
        }
    }

    pub fn target(&self) -> Vec2 {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }

    /// Advances by `dt_ms` and returns the interpolated position.
    pub fn advance(&mut self, dt_ms: f64) -> Vec2 {
        self.elapsed_ms = (self.elapsed_ms + dt_ms.max(0.0)).min(self.duration_ms);
        if self.duration_ms <= EPSILON {
            return self.to;
        }
        let t = self.elapsed_ms / self.duration_ms;
        let eased = 1.0 - (1.0 - t).powi(3);
        self.from + (self.to - self.from) * eased
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::approx_eq;

    fn zoom() -> ZoomConfig {
        ZoomConfig::default()
    }

    #[test]
    fn pointer_zoom_keeps_content_under_pointer_fixed() {
        let mut stage = Stage::new(800.0, 600.0);
        stage.set_position(Vec2::new(30.0, -20.0));
        let pointer = Vec2::new(250.0, 180.0);
        let before = stage.to_content(pointer);

        let percent = stage
            .zoom_to_pointer(pointer, ZoomDirection::In, false, &zoom())
            .expect("zoom step should be accepted");

        assert_eq!(percent, 105);
        let after = stage.to_content(pointer);
        assert!(approx_eq(before.x, after.x));
        assert!(approx_eq(before.y, after.y));
    }

    #[test]
    fn ctrl_inverts_wheel_direction() {
        let mut stage = Stage::new(800.0, 600.0);
        stage.zoom_to_pointer(Vec2::ZERO, ZoomDirection::In, true, &zoom());
        assert!(stage.scale() < 1.0);
    }

    #[test]
    fn pointer_zoom_round_trip_restores_scale_and_position() {
        let mut stage = Stage::new(800.0, 600.0);
        stage.set_position(Vec2::new(-40.0, 12.5));
        let pointer = Vec2::new(410.0, 77.0);
        stage.zoom_to_pointer(pointer, ZoomDirection::In, false, &zoom());
        stage.zoom_to_pointer(pointer, ZoomDirection::Out, false, &zoom());
        assert!(approx_eq(stage.scale(), 1.0));
        assert!(approx_eq(stage.position().x, -40.0));
        assert!(approx_eq(stage.position().y, 12.5));
    }

    #[test]
    fn pointer_zoom_rejects_steps_outside_range() {
        let mut stage = Stage::new(800.0, 600.0);
        let mut steps = 0;
        while stage
            .zoom_to_pointer(Vec2::ZERO, ZoomDirection::Out, false, &zoom())
            .is_some()
        {
            steps += 1;
            assert!(steps < 100, "zoom out should stop at the minimum");
        }
        assert!(stage.scale() >= 0.25 - 0.005);
        assert!(stage.zoom_percent() >= 25);

        let snapshot = stage.snapshot();
        assert!(stage
            .zoom_to_pointer(Vec2::new(5.0, 5.0), ZoomDirection::Out, false, &zoom())
            .is_none());
        assert_eq!(stage.snapshot(), snapshot);
    }

    #[test]
    fn manual_zoom_step_is_additive_and_clamped() {
        let mut stage = Stage::new(800.0, 600.0);
        assert_eq!(stage.manual_zoom_step(true, &zoom()), 105);
        assert_eq!(stage.manual_zoom_step(false, &zoom()), 100);

        stage.zoom_to_center(0.26, &zoom());
        assert_eq!(stage.manual_zoom_step(false, &zoom()), 25);
        assert_eq!(stage.manual_zoom_step(false, &zoom()), 25);
    }

    #[test]
    fn center_zoom_keeps_viewport_center_fixed() {
        let mut stage = Stage::new(800.0, 600.0);
        let center_before = stage.to_content(stage.viewport_center());
        stage.zoom_to_center(2.0, &zoom());
        let center_after = stage.to_content(stage.viewport_center());
        assert!(approx_eq(center_before.x, center_after.x));
        assert!(approx_eq(center_before.y, center_after.y));
        assert_eq!(stage.zoom_percent(), 200);
    }

    #[test]
    fn reveal_position_shifts_only_when_clipped() {
        let stage = Stage::new(400.0, 300.0);
        assert!(stage
            .reveal_position(&Rect::new(50.0, 50.0, 100.0, 40.0), 10.0)
            .is_none());

        let target = stage
            .reveal_position(&Rect::new(350.0, 280.0, 100.0, 40.0), 10.0)
            .expect("clipped rect should need a pan");
        assert_eq!(target, Vec2::new(-60.0, -30.0));
    }

    #[test]
    fn smooth_pan_reaches_target_after_duration() {
        let mut pan = SmoothPan::new(Vec2::ZERO, Vec2::new(100.0, -50.0), 300);
        let midway = pan.advance(150.0);
        assert!(midway.x > 50.0 && midway.x < 100.0);
        assert!(!pan.is_finished());
        let end = pan.advance(1000.0);
        assert_eq!(end, Vec2::new(100.0, -50.0));
        assert!(pan.is_finished());
    }
}
