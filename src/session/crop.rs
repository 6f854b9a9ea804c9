use super::EditorSession;
use crate::crop::{CropError, CropSession, RatioPreset};
use crate::error::AppResult;
use crate::geometry::{Rect, Vec2};
use crate::scene::{CropRect, NodeRef};
use crate::stage::StageSnapshot;
use crate::state::{SessionEvent, StateError};

impl EditorSession {
    /// Enters the crop sub-mode on the base image. Overlays are locked and
    /// the main stage view is remembered until the session stops.
    pub fn start_crop(&mut self) -> AppResult<()> {
        self.ensure_transition(SessionEvent::StartCrop)?;
        if let Some(NodeRef::Overlay(id)) = self.selection.selected() {
            tracing::warn!(id, "crop requested on an overlay node");
            return Err(CropError::NotBaseImage.into());
        }

        let session = CropSession::start(
            &self.stage,
            self.scene.base(),
            self.last_crop.as_ref(),
            &self.config,
        )?;
        self.machine.transition(SessionEvent::StartCrop)?;
        self.pan = None;
        self.scene.set_overlays_interactive(false);
        self.scene.base_mut().draggable = false;
        self.selection.clear();

        self.controls.filter_slider = None;
        self.controls.crop_zoom = Some(session.stage().zoom_percent());
        self.controls.ratio = session.preset();
        self.controls.element_label = self.scene.base().kind.label();
        let preview = session.preview_crop();
        self.controls
            .write_size(crate::geometry::Size::new(preview.width, preview.height));
        self.crop = Some(session);
        Ok(())
    }

    pub fn set_crop_preset(&mut self, preset: RatioPreset) -> bool {
        self.set_crop_ratio(preset.token())
    }

    /// Locks the selector to a ratio token such as `"4-3"`; `"free"` unlocks.
    pub fn set_crop_ratio(&mut self, token: &str) -> bool {
        let Some(crop) = self.crop.as_mut() else {
            return false;
        };
        crop.set_ratio(token);
        self.controls.ratio = crop.preset();
        let preview = crop.preview_crop();
        self.write_crop_size(preview);
        true
    }

    /// One resize frame of the crop selector, in crop-stage coordinates.
    pub fn resize_crop_selector(&mut self, proposed: Rect) -> Option<Rect> {
        let crop = self.crop.as_mut()?;
        let corrected = crop.resize_selector(proposed);
        let preview = crop.preview_crop();
        self.write_crop_size(preview);
        Some(corrected)
    }

    pub fn move_crop_selector(&mut self, center: Vec2) -> Option<Vec2> {
        self.crop.as_mut().map(|crop| crop.move_selector(center))
    }

    fn write_crop_size(&mut self, preview: CropRect) {
        self.controls
            .write_size(crate::geometry::Size::new(preview.width, preview.height));
    }

    /// Commits the selector as the base image's crop and leaves crop mode.
    pub fn apply_crop(&mut self) -> AppResult<CropRect> {
        let crop = self.take_crop()?;
        let main_stage = crop.main_stage_snapshot();
        let last = crop.commit(self.scene.base_mut());
        self.last_crop = Some(last);
        self.finish_crop(main_stage)?;
        Ok(last.crop)
    }

    /// Leaves crop mode with the base image untouched.
    pub fn cancel_crop(&mut self) -> AppResult<()> {
        let crop = self.take_crop()?;
        let main_stage = crop.main_stage_snapshot();
        crop.cancel(self.scene.base_mut());
        self.finish_crop(main_stage)
    }

    /// Removes any crop from the base image and forgets the remembered selector.
    pub fn reset_crop(&mut self) -> AppResult<()> {
        let crop = self.take_crop()?;
        let main_stage = crop.main_stage_snapshot();
        crop.reset(self.scene.base_mut());
        self.last_crop = None;
        self.finish_crop(main_stage)
    }

    fn take_crop(&mut self) -> AppResult<CropSession> {
        self.ensure_transition(SessionEvent::StopCrop)?;
        self.crop.take().ok_or_else(|| {
            StateError::InvalidStateTransition {
                from: self.mode(),
                event: SessionEvent::StopCrop,
            }
            .into()
        })
    }

    fn finish_crop(&mut self, main_stage: StageSnapshot) -> AppResult<()> {
        self.scene.set_overlays_interactive(true);
        self.scene.base_mut().draggable = true;
        self.stage.restore(main_stage);
        self.machine.transition(SessionEvent::StopCrop)?;
        self.controls.crop_zoom = None;
        self.controls.main_zoom = self.stage.zoom_percent();
        self.select(NodeRef::Base);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use image::RgbaImage;

    use crate::config::EditorConfig;
    use crate::error::AppError;
    use crate::geometry::{Size, Vec2};
    use crate::scene::{CropRect, NodeRef};
    use crate::session::EditorSession;
    use crate::state::SessionMode;
    use crate::upload::testing::RecordingCompletion;
    use crate::upload::{CompletionHandle, UploadedImage};

    fn session() -> EditorSession {
        let upload = UploadedImage::new(RgbaImage::new(800, 600), "shot.png", "image/png");
        EditorSession::open(
            upload,
            CompletionHandle::new(RecordingCompletion::default()),
            Size::new(600.0, 400.0),
            EditorConfig::default(),
        )
    }

    #[test]
    fn crop_is_refused_with_an_overlay_selected() {
        let mut session = session();
        let id = session
            .add_overlay_image(Arc::new(RgbaImage::new(10, 10)))
            .expect("overlay added");
        assert_eq!(session.selection().selected(), Some(NodeRef::Overlay(id)));

        let err = session.start_crop().expect_err("overlay crop must fail");
        assert!(matches!(err, AppError::Crop(_)));
        assert_eq!(session.mode(), SessionMode::Editing);
    }

    #[test]
    fn crop_locks_overlays_and_restores_the_view() {
        let mut session = session();
        let id = session
            .add_shape(crate::geometry::Color::rgb(1, 2, 3), Size::new(20.0, 20.0))
            .expect("shape added");
        session.clear_selection();
        let view = session.stage().snapshot();

        session.start_crop().expect("crop starts");
        assert_eq!(session.mode(), SessionMode::Cropping);
        assert!(session.controls().crop_zoom.is_some());
        let overlay = session.scene().overlay(id).expect("shape kept");
        assert!(!overlay.visible);
        assert!(!overlay.draggable);
        assert!(!session.delete_selected());

        session.pan(Vec2::new(40.0, 0.0));
        session.cancel_crop().expect("crop cancels");
        assert_eq!(session.mode(), SessionMode::Editing);
        assert_eq!(session.stage().snapshot(), view);
        assert!(session.scene().overlay(id).expect("shape kept").visible);
        assert_eq!(session.selection().selected(), Some(NodeRef::Base));
        assert!(session.controls().crop_zoom.is_none());
    }

    #[test]
    fn applying_a_crop_remembers_the_selector() {
        let mut session = session();
        session.start_crop().expect("crop starts");
        assert!(session.set_crop_ratio("1-1"));
        let rect = session.crop().expect("cropping").selector_rect();
        let applied = session.apply_crop().expect("crop applies");
        assert_eq!(applied, CropRect::new(100.0, 0.0, 600.0, 600.0));
        assert_eq!(session.scene().base().transform.size, Size::new(600.0, 600.0));

        session.start_crop().expect("crop restarts");
        assert_eq!(session.crop().expect("cropping").selector_rect(), rect);
        session.reset_crop().expect("crop resets");
        assert!(session.last_crop().is_none());
        assert_eq!(session.scene().base().transform.size, Size::new(800.0, 600.0));
    }

    #[test]
    fn stopping_without_a_crop_is_a_state_error() {
        let mut session = session();
        let err = session.apply_crop().expect_err("not cropping");
        assert!(matches!(err, AppError::State(_)));
    }
}
