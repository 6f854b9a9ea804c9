use super::EditorSession;
use crate::error::AppResult;
use crate::geometry::Vec2;
use crate::scene::{NodeId, NodeRef};
use crate::selection::capabilities;
use crate::stage::SmoothPan;
use crate::state::SessionEvent;
use crate::text::{
    apply_style, create_default_text, TextEditOutcome, TextEditOverlay, TextStyleChange,
};

impl EditorSession {
    /// Adds a default text node in the middle of the viewport and selects it.
    pub fn add_text(&mut self) -> Option<NodeId> {
        self.add_text_at(self.stage.viewport_center())
    }

    /// Adds a default text node centered on a screen point. If it does not fit
    /// on screen the stage pans smoothly to reveal it.
    pub fn add_text_at(&mut self, screen_anchor: Vec2) -> Option<NodeId> {
        if !self.is_editing() {
            return None;
        }
        let id = create_default_text(
            &mut self.scene,
            &self.stage,
            screen_anchor,
            &self.config.text,
            self.measure.as_ref(),
        );
        self.select(NodeRef::Overlay(id));
        self.reveal(id);
        Some(id)
    }

    fn reveal(&mut self, id: NodeId) {
        let Some(node) = self.scene.overlay(id) else {
            return;
        };
        let rect = node.transform.client_rect();
        if let Some(target) = self.stage.reveal_position(&rect, self.config.text.reveal_margin) {
            tracing::debug!(id, x = target.x, y = target.y, "panning to reveal node");
            self.pan = Some(SmoothPan::new(
                self.stage.position(),
                target,
                self.config.pan.duration_ms,
            ));
        }
    }

    /// Opens the in-place editor on text node `id`. Returns `false` when `id`
    /// is not an editable text node.
    pub fn begin_text_edit(&mut self, id: NodeId) -> AppResult<bool> {
        self.ensure_transition(SessionEvent::BeginTextEdit)?;
        let editable = self
            .scene
            .overlay(id)
            .is_some_and(|node| capabilities(&node.kind).text_editable);
        if !editable {
            tracing::debug!(id, "text edit ignored: not a text node");
            return Ok(false);
        }
        let Some(overlay) = TextEditOverlay::begin(&mut self.scene, &self.stage, id) else {
            return Ok(false);
        };
        self.machine.transition(SessionEvent::BeginTextEdit)?;
        self.pan = None;
        self.selection.detach_handle();
        self.text_edit = Some(overlay);
        Ok(true)
    }

    /// Writes the editor's text back to its node. Calling it again after the
    /// edit ended does nothing.
    pub fn commit_text_edit(&mut self) -> Option<TextEditOutcome> {
        let overlay = self.text_edit.take()?;
        let outcome = overlay.commit(
            &mut self.scene,
            self.measure.as_ref(),
            self.config.text.padding,
        );
        self.end_text_edit();
        match outcome {
            TextEditOutcome::Updated(id) => {
                self.select(NodeRef::Overlay(id));
            }
            TextEditOutcome::Removed(_) | TextEditOutcome::Missing => self.clear_selection(),
        }
        Some(outcome)
    }

    pub fn cancel_text_edit(&mut self) -> bool {
        let Some(overlay) = self.text_edit.take() else {
            return false;
        };
        let id = overlay.node_id();
        overlay.cancel(&mut self.scene);
        self.end_text_edit();
        self.select(NodeRef::Overlay(id));
        true
    }

    fn end_text_edit(&mut self) {
        if let Err(err) = self.machine.transition(SessionEvent::EndTextEdit) {
            tracing::warn!(?err, "text edit ended outside text editing");
        }
    }

    /// Applies a side panel style change to the selected text node.
    pub fn style_selected_text(&mut self, change: &TextStyleChange) -> bool {
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
        if !apply_style(node, change, self.measure.as_ref(), self.config.text.padding) {
            return false;
        }
        self.sync_controls();
        true
    }
}
