//! Scene model: one base image plus an ordered list of overlay nodes.

mod image;
mod text;

use std::sync::Arc;

use ::image::RgbaImage;

use crate::geometry::{rotate_point, Rect, Size, Vec2};

pub use self::image::{CropRect, ImageNode};
pub use self::text::{FontStyle, TextAlign, TextNode, MIN_FONT_SIZE};

pub type NodeId = u64;

/// Addresses a node inside a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Base,
    Overlay(NodeId),
}

/// Placement of a node. `position` is where the pivot `offset` (measured in
/// the node's own unscaled box) lands in stage space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub size: Size,
    pub scale: Vec2,
    pub offset: Vec2,
    pub rotation: f64,
}

impl Transform {
    /// Unscaled, unrotated node with its pivot at the box center.
    pub fn centered(position: Vec2, size: Size) -> Self {
        Self {
            position,
            size,
            scale: Vec2::ONE,
            offset: size.half(),
            rotation: 0.0,
        }
    }

    pub fn local_to_stage(&self, local: Vec2) -> Vec2 {
        let scaled = (local - self.offset).scale_by(self.scale);
        rotate_point(self.position + scaled, self.position, self.rotation)
    }

    /// Inverse of [`Transform::local_to_stage`]; `None` for a degenerate scale.
    pub fn stage_to_local(&self, point: Vec2) -> Option<Vec2> {
        if self.scale.x == 0.0 || self.scale.y == 0.0 {
            return None;
        }
        let unrotated = rotate_point(point, self.position, -self.rotation) - self.position;
        Some(Vec2::new(
            unrotated.x / self.scale.x + self.offset.x,
            unrotated.y / self.scale.y + self.offset.y,
        ))
    }

    pub fn corners(&self) -> [Vec2; 4] {
        let Size { width, height } = self.size;
        [
            self.local_to_stage(Vec2::new(0.0, 0.0)),
            self.local_to_stage(Vec2::new(width, 0.0)),
            self.local_to_stage(Vec2::new(width, height)),
            self.local_to_stage(Vec2::new(0.0, height)),
        ]
    }

    /// Axis-aligned bounds after scale and rotation.
    pub fn client_rect(&self) -> Rect {
        Rect::bounding(self.corners()).unwrap_or_default()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.stage_to_local(point).is_some_and(|local| {
            local.x >= 0.0
                && local.y >= 0.0
                && local.x <= self.size.width
                && local.y <= self.size.height
        })
    }

    /// Size after scale factors.
    pub fn displayed_size(&self) -> Size {
        self.size.scaled(self.scale)
    }

    /// Writes a new box size and moves the pivot to its center.
    pub fn set_size_centered(&mut self, size: Size) {
        self.size = size;
        self.offset = size.half();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Image(ImageNode),
    Text(TextNode),
    Shape(ShapeNode),
}

impl NodeKind {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Text(_) => "text",
            Self::Shape(_) => "shape",
        }
    }
}

/// Filled rectangle overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeNode {
    pub fill: crate::geometry::Color,
    pub corner_radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub transform: Transform,
    pub visible: bool,
    pub draggable: bool,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: NodeId, transform: Transform, kind: NodeKind) -> Self {
        Self {
            id,
            transform,
            visible: true,
            draggable: true,
            kind,
        }
    }

    pub fn as_image(&self) -> Option<&ImageNode> {
        match &self.kind {
            NodeKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageNode> {
        match &mut self.kind {
            NodeKind::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match &self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        match &mut self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }
}

pub const BASE_NODE_ID: NodeId = 0;

#[derive(Debug, Clone)]
pub struct Scene {
    base: Node,
    overlays: Vec<Node>,
    next_id: NodeId,
}

impl Scene {
    /// Builds a scene around `source`, displayed at natural size centered on `center`.
    pub fn new(source: Arc<RgbaImage>, center: Vec2) -> Self {
        let image = ImageNode::new(source);
        let transform = Transform::centered(center, image.natural_size());
        Self {
            base: Node::new(BASE_NODE_ID, transform, NodeKind::Image(image)),
            overlays: Vec::new(),
            next_id: BASE_NODE_ID + 1,
        }
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    pub fn base(&self) -> &Node {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut Node {
        &mut self.base
    }

    /// The base node's image payload; `None` only if a caller replaced its kind.
    pub fn base_image(&self) -> Option<&ImageNode> {
        self.base.as_image()
    }

    pub fn base_image_mut(&mut self) -> Option<&mut ImageNode> {
        self.base.as_image_mut()
    }

    pub fn overlays(&self) -> &[Node] {
        &self.overlays
    }

    pub fn overlays_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.overlays.iter_mut()
    }

    pub fn add_overlay(&mut self, transform: Transform, kind: NodeKind) -> NodeId {
        let id = self.allocate_id();
        self.overlays.push(Node::new(id, transform, kind));
        id
    }

    pub fn remove_overlay(&mut self, id: NodeId) -> Option<Node> {
        let index = self.overlays.iter().position(|node| node.id == id)?;
        Some(self.overlays.remove(index))
    }

    pub fn overlay(&self, id: NodeId) -> Option<&Node> {
        self.overlays.iter().find(|node| node.id == id)
    }

    pub fn overlay_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.overlays.iter_mut().find(|node| node.id == id)
    }

    pub fn node(&self, node: NodeRef) -> Option<&Node> {
        match node {
            NodeRef::Base => Some(&self.base),
            NodeRef::Overlay(id) => self.overlay(id),
        }
    }

    pub fn node_mut(&mut self, node: NodeRef) -> Option<&mut Node> {
        match node {
            NodeRef::Base => Some(&mut self.base),
            NodeRef::Overlay(id) => self.overlay_mut(id),
        }
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.node(node).is_some()
    }

    /// Topmost visible node under `point` (stage content space).
    pub fn hit_test(&self, point: Vec2) -> Option<NodeRef> {
        self.overlays
            .iter()
            .rev()
            .find(|node| node.visible && node.transform.contains(point))
            .map(|node| NodeRef::Overlay(node.id))
            .or_else(|| {
                (self.base.visible && self.base.transform.contains(point)).then_some(NodeRef::Base)
            })
    }

    pub fn set_overlays_interactive(&mut self, interactive: bool) {
        for node in &mut self.overlays {
            node.visible = interactive;
            node.draggable = interactive;
        }
    }
}
