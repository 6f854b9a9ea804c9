//! Single-node selection and the transform handle bound to it.

use crate::geometry::{normalize_degrees, parse_number_or, Rect, Size, Vec2};
use crate::scene::{Node, NodeKind, NodeRef, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

pub const ALL_ANCHORS: &[Anchor] = &[
    Anchor::TopLeft,
    Anchor::TopCenter,
    Anchor::TopRight,
    Anchor::MiddleLeft,
    Anchor::MiddleRight,
    Anchor::BottomLeft,
    Anchor::BottomCenter,
    Anchor::BottomRight,
];

pub const EDGE_ANCHORS: &[Anchor] = &[
    Anchor::TopCenter,
    Anchor::MiddleLeft,
    Anchor::MiddleRight,
    Anchor::BottomCenter,
];

pub const CORNER_ANCHORS: &[Anchor] = &[
    Anchor::TopLeft,
    Anchor::TopRight,
    Anchor::BottomLeft,
    Anchor::BottomRight,
];

impl Anchor {
    pub const fn is_corner(self) -> bool {
        matches!(
            self,
            Self::TopLeft | Self::TopRight | Self::BottomLeft | Self::BottomRight
        )
    }
}

/// What the handle and side panels may do with a node, decided by its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub anchors: &'static [Anchor],
    pub flip_enabled: bool,
    pub filterable: bool,
    pub text_editable: bool,
}

pub fn capabilities(kind: &NodeKind) -> Capabilities {
    match kind {
        NodeKind::Image(_) => Capabilities {
            anchors: ALL_ANCHORS,
            flip_enabled: true,
            filterable: true,
            text_editable: false,
        },
        NodeKind::Text(_) => Capabilities {
            anchors: EDGE_ANCHORS,
            flip_enabled: false,
            filterable: false,
            text_editable: true,
        },
        NodeKind::Shape(_) => Capabilities {
            anchors: ALL_ANCHORS,
            flip_enabled: true,
            filterable: false,
            text_editable: false,
        },
    }
}

/// What a transform handle is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleTarget {
    Node(NodeRef),
    CropSelector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformHandle {
    pub target: HandleTarget,
    pub anchors: &'static [Anchor],
    pub flip_enabled: bool,
    pub rotate_enabled: bool,
    pub keep_ratio: bool,
}

impl TransformHandle {
    pub fn for_node(node_ref: NodeRef, node: &Node) -> Self {
        let caps = capabilities(&node.kind);
        Self {
            target: HandleTarget::Node(node_ref),
            anchors: caps.anchors,
            flip_enabled: caps.flip_enabled,
            rotate_enabled: true,
            keep_ratio: false,
        }
    }

    /// Handle for the crop selector: every anchor while the ratio is free,
    /// corners only once a ratio is locked.
    pub fn for_crop_selector(ratio: f64) -> Self {
        let locked = ratio > 0.0;
        Self {
            target: HandleTarget::CropSelector,
            anchors: if locked { CORNER_ANCHORS } else { ALL_ANCHORS },
            flip_enabled: false,
            rotate_enabled: false,
            keep_ratio: locked,
        }
    }

    pub fn allows(&self, anchor: Anchor) -> bool {
        self.anchors.contains(&anchor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAxis {
    Horizontal,
    Vertical,
}

/// Selection state machine: nothing, the base image, or one overlay node.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: Option<NodeRef>,
    handle: Option<TransformHandle>,
}

impl SelectionState {
    pub fn selected(&self) -> Option<NodeRef> {
        self.selected
    }

    pub fn handle(&self) -> Option<&TransformHandle> {
        self.handle.as_ref()
    }

    pub fn select(&mut self, scene: &Scene, node_ref: NodeRef) -> bool {
        let Some(node) = scene.node(node_ref) else {
            tracing::debug!(?node_ref, "select ignored: node missing");
            return false;
        };
        self.selected = Some(node_ref);
        self.handle = Some(TransformHandle::for_node(node_ref, node));
        true
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.handle = None;
    }

    /// Detaches the handle without forgetting the selection.
    pub fn detach_handle(&mut self) {
        self.handle = None;
    }

    /// Drops the selection if its node no longer exists.
    pub fn prune(&mut self, scene: &Scene) {
        if self.selected.is_some_and(|node| !scene.contains(node)) {
            self.clear();
        }
    }

    /// The node edits target: the selection, or the base image when nothing is selected.
    pub fn target_or_base(&self) -> NodeRef {
        self.selected.unwrap_or(NodeRef::Base)
    }

    /// Removes the selected overlay. The base image and hidden nodes (under
    /// text edit or cropping) are never deleted; those requests are ignored.
    pub fn delete_selected(&mut self, scene: &mut Scene) -> bool {
        let Some(NodeRef::Overlay(id)) = self.selected else {
            tracing::debug!(
                selected = ?self.selected,
                "delete ignored: base image or nothing selected"
            );
            return false;
        };
        if !scene.overlay(id).is_some_and(|node| node.visible) {
            tracing::debug!(id, "delete ignored: node hidden or missing");
            return false;
        }
        scene.remove_overlay(id);
        self.clear();
        true
    }
}

/// Flips the sign of one scale factor, keeping its magnitude.
pub fn mirror(node: &mut Node, axis: MirrorAxis) -> bool {
    if !capabilities(&node.kind).flip_enabled {
        return false;
    }
    match axis {
        MirrorAxis::Horizontal => node.transform.scale.x = -node.transform.scale.x,
        MirrorAxis::Vertical => node.transform.scale.y = -node.transform.scale.y,
    }
    true
}

pub fn rotate(node: &mut Node, delta_degrees: f64) {
    node.transform.rotation = normalize_degrees(node.transform.rotation + delta_degrees);
}

/// Applies a ratio-free resize: the dragged box's size becomes the node's
/// geometry, scale collapses to unit magnitude (mirroring kept) and the
/// pivot moves to the new center.
pub fn apply_free_resize(node: &mut Node, new_box: Rect) {
    let transform = &mut node.transform;
    transform.set_size_centered(Size::new(new_box.width.abs(), new_box.height.abs()));
    transform.scale = Vec2::new(unit_sign(transform.scale.x), unit_sign(transform.scale.y));
    transform.position = new_box.center();
}

fn unit_sign(value: f64) -> f64 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

pub const MIN_NODE_SIZE: f64 = 1.0;

/// Writes numeric width/height field text to the node. Unparseable or
/// non-positive input falls back to the minimum size.
pub fn apply_size_fields(node: &mut Node, width: &str, height: &str) -> Size {
    let parse = |text: &str| {
        let value = parse_number_or(text, MIN_NODE_SIZE);
        if value > 0.0 {
            value
        } else {
            MIN_NODE_SIZE
        }
    };
    let size = Size::new(parse(width), parse(height));
    node.transform.set_size_centered(size);
    size
}
