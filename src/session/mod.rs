//! Editor session: one editing lifecycle, from opening an upload to saving
//! or abandoning it. All input is routed through here into the subsystems.

mod controls;
mod crop;
mod text;

pub use controls::Controls;

use std::sync::Arc;

use ab_glyph::FontArc;
use image::RgbaImage;

use crate::config::EditorConfig;
use crate::crop::{CropSession, LastCrop};
use crate::error::AppResult;
use crate::filter::{toggle_with_slider, FilterKind};
use crate::geometry::{Color, Rect, Size, Vec2};
use crate::input::{
    resolve_shortcut, InputContext, ShortcutAction, ShortcutKey, ShortcutModifiers, WheelInput,
};
use crate::render::{encode, rasterize_scene};
use crate::scene::{ImageNode, NodeId, NodeKind, NodeRef, Scene, ShapeNode, Transform};
use crate::selection::{self, capabilities, MirrorAxis, SelectionState};
use crate::stage::{SmoothPan, Stage};
use crate::state::{SessionEvent, SessionMode, StateError, StateMachine, StateResult};
use crate::text::{ApproximateMeasure, FontMeasure, TextEditOverlay, TextMeasure};
use crate::upload::{CompletionHandle, EditedFile, UploadedImage};

pub struct EditorSession {
    config: EditorConfig,
    stage: Stage,
    scene: Scene,
    selection: SelectionState,
    machine: StateMachine,
    crop: Option<CropSession>,
    last_crop: Option<LastCrop>,
    text_edit: Option<TextEditOverlay>,
    pan: Option<SmoothPan>,
    controls: Controls,
    measure: Box<dyn TextMeasure>,
    font: Option<FontArc>,
    name: String,
    mime: String,
    completion: CompletionHandle,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("name", &self.name)
            .field("mode", &self.machine.mode())
            .field("selected", &self.selection.selected())
            .field("overlays", &self.scene.overlays().len())
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Opens an editor on `upload` inside a `viewport`-sized stage. The base
    /// image is centered and zoomed out to fit if it is larger than the stage.
    pub fn open(
        upload: UploadedImage,
        completion: CompletionHandle,
        viewport: Size,
        config: EditorConfig,
    ) -> Self {
        let mut stage = Stage::new(viewport.width, viewport.height);
        let scene = Scene::new(Arc::clone(&upload.image), stage.viewport_center());
        let fit = stage.fit_scale(scene.base().transform.size, &config.zoom);
        stage.zoom_to_center(fit, &config.zoom);

        let mut session = Self {
            config,
            stage,
            scene,
            selection: SelectionState::default(),
            machine: StateMachine::new(),
            crop: None,
            last_crop: None,
            text_edit: None,
            pan: None,
            controls: Controls::default(),
            measure: Box::new(ApproximateMeasure),
            font: None,
            name: upload.name,
            mime: upload.mime,
            completion,
        };
        session.controls.main_zoom = session.stage.zoom_percent();
        tracing::info!(
            name = %session.name,
            width = upload.image.width(),
            height = upload.image.height(),
            zoom = session.controls.main_zoom,
            "editor session opened"
        );
        session
    }

    /// Measures and rasterizes text with `font` instead of the width heuristic.
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.measure = Box::new(FontMeasure::new(font.clone()));
        self.font = Some(font);
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn mode(&self) -> SessionMode {
        self.machine.mode()
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn crop(&self) -> Option<&CropSession> {
        self.crop.as_ref()
    }

    pub fn last_crop(&self) -> Option<&LastCrop> {
        self.last_crop.as_ref()
    }

    pub fn text_edit(&self) -> Option<&TextEditOverlay> {
        self.text_edit.as_ref()
    }

    pub fn text_edit_mut(&mut self) -> Option<&mut TextEditOverlay> {
        self.text_edit.as_mut()
    }

    pub fn pan_animation(&self) -> Option<&SmoothPan> {
        self.pan.as_ref()
    }

    fn is_editing(&self) -> bool {
        self.mode() == SessionMode::Editing
    }

    /// Checks `event` is allowed without changing state.
    fn ensure_transition(&self, event: SessionEvent) -> StateResult<()> {
        if self.machine.can_transition(event) {
            return Ok(());
        }
        let from = self.mode();
        tracing::warn!(from = ?from, event = ?event, "invalid mode transition requested");
        Err(StateError::InvalidStateTransition { from, event })
    }

    fn sync_controls(&mut self) {
        match self.selection.selected().and_then(|node| self.scene.node(node)) {
            Some(node) => {
                self.controls.element_label = node.kind.label();
                self.controls.write_size(node.transform.size);
            }
            None => self.controls.clear_element(),
        }
    }

    /// Selects `node_ref` and attaches the handle. Ignored outside plain editing.
    pub fn select(&mut self, node_ref: NodeRef) -> bool {
        if !self.is_editing() {
            tracing::debug!(?node_ref, mode = ?self.mode(), "selection change suppressed");
            return false;
        }
        let previous = self.selection.selected();
        if !self.selection.select(&self.scene, node_ref) {
            return false;
        }
        if previous != Some(node_ref) {
            self.controls.filter_slider = None;
        }
        self.sync_controls();
        true
    }

    pub fn clear_selection(&mut self) {
        if !self.is_editing() {
            return;
        }
        self.selection.clear();
        self.sync_controls();
    }

    /// Pointer press at a screen position. A press outside an open text edit
    /// commits it; otherwise the topmost node under the pointer is selected.
    pub fn pointer_down(&mut self, screen: Vec2) -> Option<NodeRef> {
        match self.mode() {
            SessionMode::TextEditing => {
                self.commit_text_edit();
                return None;
            }
            SessionMode::Cropping | SessionMode::Closed => return None,
            SessionMode::Editing => {}
        }
        let point = self.stage.to_content(screen);
        match self.scene.hit_test(point) {
            Some(node_ref) => {
                self.select(node_ref);
                Some(node_ref)
            }
            None => {
                self.clear_selection();
                None
            }
        }
    }

    /// Double click: opens the text editor on a text node under the pointer.
    pub fn pointer_double_click(&mut self, screen: Vec2) -> AppResult<bool> {
        if !self.is_editing() {
            return Ok(false);
        }
        let point = self.stage.to_content(screen);
        match self.scene.hit_test(point) {
            Some(NodeRef::Overlay(id)) => self.begin_text_edit(id),
            _ => Ok(false),
        }
    }

    /// Moves the selected node by a screen-space delta.
    pub fn drag_selected(&mut self, delta: Vec2) -> bool {
        if !self.is_editing() {
            return false;
        }
        let scale = self.stage.scale();
        let Some(node) = self
            .selection
            .selected()
            .and_then(|node| self.scene.node_mut(node))
        else {
            return false;
        };
        if !node.draggable {
            return false;
        }
        node.transform.position = node.transform.position + delta / scale;
        true
    }

    pub fn pan(&mut self, delta: Vec2) {
        if !self.mode().is_open() {
            return;
        }
        self.pan = None;
        match self.crop.as_mut() {
            Some(crop) => crop.stage_mut().pan_by(delta),
            None => self.stage.pan_by(delta),
        }
    }

    /// Applies a handle resize to the selection; `new_box` is in stage space.
    pub fn resize_selected(&mut self, new_box: Rect) -> bool {
        if !self.is_editing() {
            return false;
        }
        let Some(node) = self
            .selection
            .selected()
            .and_then(|node| self.scene.node_mut(node))
        else {
            return false;
        };
        selection::apply_free_resize(node, new_box);
        self.sync_controls();
        true
    }

    pub fn mirror_selected(&mut self, axis: MirrorAxis) -> bool {
        if !self.is_editing() {
            return false;
        }
        let target = self.selection.target_or_base();
        self.scene
            .node_mut(target)
            .is_some_and(|node| selection::mirror(node, axis))
    }

    pub fn rotate_selected(&mut self, delta_degrees: f64) -> bool {
        if !self.is_editing() {
            return false;
        }
        let target = self.selection.target_or_base();
        let Some(node) = self.scene.node_mut(target) else {
            return false;
        };
        selection::rotate(node, delta_degrees);
        true
    }

    /// Writes the numeric size fields to the selection (or the base image).
    pub fn set_selected_size(&mut self, width: &str, height: &str) -> Option<Size> {
        if !self.is_editing() {
            return None;
        }
        let target = self.selection.target_or_base();
        let node = self.scene.node_mut(target)?;
        let size = selection::apply_size_fields(node, width, height);
        self.controls.write_size(size);
        Some(size)
    }

    pub fn delete_selected(&mut self) -> bool {
        if !self.is_editing() {
            tracing::debug!(mode = ?self.mode(), "delete suppressed");
            return false;
        }
        let deleted = self.selection.delete_selected(&mut self.scene);
        if deleted {
            self.sync_controls();
        }
        deleted
    }

    /// Wheel zoom, routed to the crop viewport while cropping.
    pub fn wheel(&mut self, input: WheelInput) -> Option<u32> {
        if let Some(crop) = self.crop.as_mut() {
            let percent = crop.stage_mut().zoom_to_pointer(
                input.pointer,
                input.direction(),
                input.ctrl,
                &self.config.zoom,
            )?;
            self.controls.crop_zoom = Some(percent);
            return Some(percent);
        }
        if !self.is_editing() {
            return None;
        }
        let percent =
            self.stage
                .zoom_to_pointer(input.pointer, input.direction(), input.ctrl, &self.config.zoom)?;
        self.pan = None;
        self.controls.main_zoom = percent;
        Some(percent)
    }

    /// Zoom button step anchored at the viewport center.
    pub fn zoom_step(&mut self, zoom_in: bool) -> Option<u32> {
        if let Some(crop) = self.crop.as_mut() {
            let percent = crop.stage_mut().manual_zoom_step(zoom_in, &self.config.zoom);
            self.controls.crop_zoom = Some(percent);
            return Some(percent);
        }
        if !self.is_editing() {
            return None;
        }
        let percent = self.stage.manual_zoom_step(zoom_in, &self.config.zoom);
        self.pan = None;
        self.controls.main_zoom = percent;
        Some(percent)
    }

    /// Advances the reveal pan by `dt_ms`. Returns whether the stage moved.
    pub fn tick(&mut self, dt_ms: f64) -> bool {
        let Some(pan) = self.pan.as_mut() else {
            return false;
        };
        let position = pan.advance(dt_ms);
        let finished = pan.is_finished();
        self.stage.set_position(position);
        if finished {
            self.pan = None;
        }
        true
    }

    /// Toggles a filter on the selected image (or the base image). `None` when
    /// the target cannot take filters.
    pub fn toggle_filter(&mut self, kind: FilterKind) -> Option<bool> {
        if !self.is_editing() {
            return None;
        }
        let target = self.selection.target_or_base();
        let node = self.scene.node_mut(target)?;
        if !capabilities(&node.kind).filterable {
            tracing::debug!(?target, filter = kind.name(), "filter ignored: target not filterable");
            return None;
        }
        let image = node.as_image_mut()?;
        Some(toggle_with_slider(
            &mut image.filters,
            &mut self.controls.filter_slider,
            kind,
        ))
    }

    /// Feeds slider text to the open filter slider.
    pub fn set_filter_value(&mut self, raw: &str) -> Option<f64> {
        if !self.is_editing() {
            return None;
        }
        let target = self.selection.target_or_base();
        let slider = self.controls.filter_slider.as_mut()?;
        let image = self.scene.node_mut(target)?.as_image_mut()?;
        Some(slider.apply_input(raw, &mut image.filters.params))
    }

    /// Adds a secondary image centered in the viewport, shrunk to fit half of it.
    pub fn add_overlay_image(&mut self, image: Arc<RgbaImage>) -> Option<NodeId> {
        if !self.is_editing() || image.width() == 0 || image.height() == 0 {
            return None;
        }
        let node_image = ImageNode::new(image);
        let natural = node_image.natural_size();
        let limit_w = self.stage.width() / 2.0 / self.stage.scale();
        let limit_h = self.stage.height() / 2.0 / self.stage.scale();
        let factor = (limit_w / natural.width)
            .min(limit_h / natural.height)
            .min(1.0);
        let size = Size::new(natural.width * factor, natural.height * factor);
        let center = self.stage.to_content(self.stage.viewport_center());
        let id = self
            .scene
            .add_overlay(Transform::centered(center, size), NodeKind::Image(node_image));
        tracing::debug!(id, width = size.width, height = size.height, "overlay image added");
        self.select(NodeRef::Overlay(id));
        Some(id)
    }

    pub fn add_shape(&mut self, fill: Color, size: Size) -> Option<NodeId> {
        if !self.is_editing() {
            return None;
        }
        let center = self.stage.to_content(self.stage.viewport_center());
        let id = self.scene.add_overlay(
            Transform::centered(center, size),
            NodeKind::Shape(ShapeNode {
                fill,
                corner_radius: 0.0,
            }),
        );
        self.select(NodeRef::Overlay(id));
        Some(id)
    }

    /// Resolves and runs a keyboard shortcut.
    pub fn handle_key(
        &mut self,
        key: ShortcutKey,
        modifiers: ShortcutModifiers,
    ) -> Option<ShortcutAction> {
        if !self.mode().is_open() {
            return None;
        }
        let context = InputContext {
            text_input_active: self.text_edit.is_some(),
            crop_active: self.crop.is_some(),
        };
        let action = resolve_shortcut(key, modifiers, context)?;
        tracing::debug!(?action, "shortcut");
        match action {
            ShortcutAction::DeleteSelection => {
                self.delete_selected();
            }
            ShortcutAction::Save => {
                if let Err(err) = self.save() {
                    tracing::warn!(?err, "save failed");
                }
            }
            ShortcutAction::CropApply => {
                if let Err(err) = self.apply_crop() {
                    tracing::warn!(?err, "crop apply failed");
                }
            }
            ShortcutAction::CropCancel => {
                if let Err(err) = self.cancel_crop() {
                    tracing::warn!(?err, "crop cancel failed");
                }
            }
            ShortcutAction::TextCommit => {
                self.commit_text_edit();
            }
            ShortcutAction::TextInsertLineBreak => {
                if let Some(edit) = self.text_edit.as_mut() {
                    edit.buffer.insert_newline();
                }
            }
            ShortcutAction::TextCancel => {
                self.cancel_text_edit();
            }
            ShortcutAction::ZoomIn => {
                self.zoom_step(true);
            }
            ShortcutAction::ZoomOut => {
                self.zoom_step(false);
            }
            ShortcutAction::CloseRequested => {
                self.close();
            }
        }
        Some(action)
    }

    /// Rasterizes the scene, hands the file to the upload pipeline and closes.
    /// An open text edit is committed and an open crop applied first.
    pub fn save(&mut self) -> AppResult<EditedFile> {
        self.ensure_transition(SessionEvent::Close)?;
        if self.text_edit.is_some() {
            self.commit_text_edit();
        }
        if self.crop.is_some() {
            self.apply_crop()?;
        }

        let raster = rasterize_scene(&self.scene, self.font.as_ref(), self.config.text.padding)?;
        let encoded = encode(&raster, &self.mime)?;
        let file = EditedFile {
            name: self.name.clone(),
            mime: encoded.mime,
            bytes: encoded.bytes,
        };
        self.machine.transition(SessionEvent::Close)?;
        self.selection.clear();
        self.pan = None;
        self.completion.done(file.clone());
        tracing::info!(
            name = %file.name,
            mime = %file.mime,
            width = raster.width(),
            height = raster.height(),
            "edited image saved"
        );
        Ok(file)
    }

    /// Abandons the edit; the upload is left untouched.
    pub fn close(&mut self) -> bool {
        if self.ensure_transition(SessionEvent::Close).is_err() {
            return false;
        }
        self.text_edit = None;
        self.crop = None;
        self.pan = None;
        self.selection.clear();
        if let Err(err) = self.machine.transition(SessionEvent::Close) {
            tracing::warn!(?err, "close transition failed");
            return false;
        }
        self.completion.abort();
        tracing::info!(name = %self.name, "editor session closed without saving");
        true
    }
}
