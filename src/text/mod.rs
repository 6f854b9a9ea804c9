//! Text overlays: creation, auto-fit sizing and the in-place edit overlay.

mod buffer;
mod measure;

pub use buffer::TextBuffer;
pub use measure::{ApproximateMeasure, FontMeasure, TextMeasure};

use crate::config::TextDefaults;
use crate::geometry::{Color, Size, Vec2};
use crate::scene::{FontStyle, Node, NodeId, NodeKind, Scene, TextAlign, TextNode, Transform};
use crate::stage::Stage;

/// Sizes a text node to its content: widest measured line plus padding on
/// both sides, one line box per line. Scale is reset to 1 so the change is
/// carried by geometry, and the pivot is recentered.
pub fn auto_fit(node: &mut Node, measure: &dyn TextMeasure, padding: f64) -> Size {
    let Some(text) = node.as_text() else {
        return node.transform.size;
    };
    let padding = padding.max(0.0);
    let width = measure.widest_line(text) + padding * 2.0;
    let height = text.line_count() as f64 * text.font_size * text.line_height + padding * 2.0;
    let size = Size::new(width.max(1.0), height.max(1.0));
    node.transform.scale = Vec2::ONE;
    node.transform.set_size_centered(size);
    size
}

/// Inserts a default text node centered on `screen_anchor` and returns its id.
pub fn create_default_text(
    scene: &mut Scene,
    stage: &Stage,
    screen_anchor: Vec2,
    defaults: &TextDefaults,
    measure: &dyn TextMeasure,
) -> NodeId {
    let mut text = TextNode::new(
        defaults.default_content.clone(),
        defaults.font_size,
        defaults.font_family.clone(),
    );
    text.fill = defaults.fill_color();
    text.line_height = defaults.line_height.max(0.1);

    let position = stage.to_content(screen_anchor);
    let id = scene.add_overlay(
        Transform::centered(position, Size::new(1.0, 1.0)),
        NodeKind::Text(text),
    );
    if let Some(node) = scene.overlay_mut(id) {
        auto_fit(node, measure, defaults.padding);
    }
    tracing::debug!(id, x = position.x, y = position.y, "text node created");
    id
}

/// Style edits coming from the text side panel. Each change re-fits the node.
#[derive(Debug, Clone, PartialEq)]
pub enum TextStyleChange {
    FontSize(String),
    FontFamily(String),
    FontStyle(String),
    Fill(String),
    Align(String),
}

/// Applies one style change; returns `false` when `node` is not text or the
/// input was rejected (an unparseable color keeps the current fill).
pub fn apply_style(
    node: &mut Node,
    change: &TextStyleChange,
    measure: &dyn TextMeasure,
    padding: f64,
) -> bool {
    let Some(text) = node.as_text_mut() else {
        return false;
    };
    match change {
        TextStyleChange::FontSize(raw) => {
            let size = crate::geometry::parse_number_or(raw, crate::scene::MIN_FONT_SIZE);
            text.set_font_size(size);
        }
        TextStyleChange::FontFamily(family) => {
            let family = family.trim();
            if family.is_empty() {
                return false;
            }
            text.font_family = family.to_string();
        }
        TextStyleChange::FontStyle(token) => text.font_style = FontStyle::parse(token),
        TextStyleChange::Fill(hex) => match Color::from_hex(hex) {
            Some(color) => text.fill = color,
            None => {
                tracing::warn!(input = %hex, "ignoring invalid text color");
                return false;
            }
        },
        TextStyleChange::Align(token) => text.align = TextAlign::parse(token),
    }
    auto_fit(node, measure, padding);
    true
}

/// How a text edit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEditOutcome {
    Updated(NodeId),
    Removed(NodeId),
    /// The node disappeared while the overlay was open.
    Missing,
}

/// Positioned, styled input laid over a hidden text node while it is edited.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEditOverlay {
    node_id: NodeId,
    pub buffer: TextBuffer,
    /// Screen position of the node's unrotated top-left corner.
    pub screen_position: Vec2,
    pub width: f64,
    pub font_size: f64,
    pub font_family: String,
    pub font_style: FontStyle,
    pub fill: Color,
    pub align: TextAlign,
    pub line_height: f64,
    pub rotation: f64,
}

impl TextEditOverlay {
    /// Hides text node `id` and builds the input that replaces it on screen.
    pub fn begin(scene: &mut Scene, stage: &Stage, id: NodeId) -> Option<Self> {
        let node = scene.overlay_mut(id)?;
        let transform = node.transform;
        let text = node.as_text()?;
        let zoom = stage.scale() * transform.scale.y.abs();
        let overlay = Self {
            node_id: id,
            buffer: TextBuffer::with_text(text.text.clone()),
            screen_position: stage.to_screen(transform.local_to_stage(Vec2::ZERO)),
            width: transform.displayed_size().width * stage.scale(),
            font_size: text.font_size * zoom,
            font_family: text.font_family.clone(),
            font_style: text.font_style,
            fill: text.fill,
            align: text.align,
            line_height: text.line_height,
            rotation: transform.rotation,
        };
        node.visible = false;
        tracing::debug!(id, "text edit started");
        Some(overlay)
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Writes the buffer back. Empty text removes the node entirely.
    pub fn commit(
        self,
        scene: &mut Scene,
        measure: &dyn TextMeasure,
        padding: f64,
    ) -> TextEditOutcome {
        let id = self.node_id;
        let Some(node) = scene.overlay_mut(id) else {
            tracing::debug!(id, "text edit commit skipped: node already gone");
            return TextEditOutcome::Missing;
        };
        if self.buffer.is_empty() {
            scene.remove_overlay(id);
            tracing::debug!(id, "empty text removed node");
            return TextEditOutcome::Removed(id);
        }
        if let Some(text) = node.as_text_mut() {
            text.text = self.buffer.as_str().to_string();
        }
        auto_fit(node, measure, padding);
        node.visible = true;
        TextEditOutcome::Updated(id)
    }

    /// Abandons the edit and shows the untouched node again.
    pub fn cancel(self, scene: &mut Scene) {
        if let Some(node) = scene.overlay_mut(self.node_id) {
            node.visible = true;
        }
    }
}
