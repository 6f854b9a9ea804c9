mod shortcut;

pub use shortcut::{
    resolve_shortcut, InputContext, ShortcutAction, ShortcutKey, ShortcutModifiers,
};

use crate::geometry::Vec2;
use crate::stage::ZoomDirection;

/// One mouse-wheel step over a stage, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub pointer: Vec2,
    pub delta_y: f64,
    pub ctrl: bool,
}

impl WheelInput {
    pub const fn new(pointer: Vec2, delta_y: f64, ctrl: bool) -> Self {
        Self {
            pointer,
            delta_y,
            ctrl,
        }
    }

    pub fn direction(&self) -> ZoomDirection {
        ZoomDirection::from_wheel_delta(self.delta_y)
    }
}
