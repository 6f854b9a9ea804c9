use std::cell::RefCell;
use std::rc::Rc;

use image::{Rgba, RgbaImage};

use pictor::config::EditorConfig;
use pictor::geometry::{approx_eq, Color, Rect, Size, Vec2};
use pictor::selection::MirrorAxis;
use pictor::state::SessionMode;
use pictor::upload::{CompletionHandle, EditedFile, UploadCompletion, UploadedImage};
use pictor::EditorSession;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Done(EditedFile),
    Aborted,
}

#[derive(Debug, Clone, Default)]
struct Recorder {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl UploadCompletion for Recorder {
    fn done(self: Box<Self>, file: EditedFile) {
        self.calls.borrow_mut().push(Call::Done(file));
    }

    fn abort(self: Box<Self>) {
        self.calls.borrow_mut().push(Call::Aborted);
    }
}

fn open_with(image: RgbaImage) -> (EditorSession, Recorder) {
    let recorder = Recorder::default();
    let session = EditorSession::open(
        UploadedImage::new(image, "upload.png", "image/png"),
        CompletionHandle::new(recorder.clone()),
        Size::new(600.0, 400.0),
        EditorConfig::default(),
    );
    (session, recorder)
}

fn open_blank(width: u32, height: u32) -> EditorSession {
    open_with(RgbaImage::new(width, height)).0
}

#[test]
fn locked_square_drag_stops_at_the_image_corner() {
    let mut session = open_blank(800, 600);
    session.start_crop().expect("crop starts");
    let bounds = session.crop().expect("cropping").frozen().bounds();
    assert_eq!(bounds, Rect::new(-100.0, -100.0, 800.0, 600.0));

    session.set_crop_ratio("1-1");
    session.resize_crop_selector(Rect::new(0.0, -100.0, 200.0, 200.0));
    session.move_crop_selector(Vec2::new(200.0, 0.0));
    let rect = session
        .resize_crop_selector(Rect::new(100.0, -100.0, 900.0, 1100.0))
        .expect("cropping");

    assert!(approx_eq(rect.right(), 700.0));
    assert!(approx_eq(rect.bottom(), 500.0));
    assert!(approx_eq(rect.width, rect.height));
}

#[test]
fn reentering_crop_reproduces_the_committed_selector() {
    let mut session = open_blank(800, 600);
    session.start_crop().expect("crop starts");
    session.resize_crop_selector(Rect::new(0.0, 0.0, 300.0, 200.0));
    session.move_crop_selector(Vec2::new(400.0, 250.0));
    let committed = session.crop().expect("cropping").selector_rect();
    let crop = session.apply_crop().expect("crop applies");
    assert_eq!((crop.width, crop.height), (300.0, 200.0));

    session.start_crop().expect("crop restarts");
    assert_eq!(session.crop().expect("cropping").selector_rect(), committed);
    session.cancel_crop().expect("crop cancels");
    assert_eq!(
        session.scene().base_image().expect("base image").crop,
        session.last_crop().expect("remembered").crop
    );
}

#[test]
fn selector_stays_inside_the_image_and_cancel_restores_the_base() {
    let mut session = open_blank(800, 600);
    session.mirror_selected(MirrorAxis::Horizontal);
    session.rotate_selected(30.0);
    let before = session.scene().base().clone();

    session.start_crop().expect("crop starts");
    session.set_crop_ratio("4-3");
    let bounds = session.crop().expect("cropping").frozen().bounds();

    let mut seed: u64 = 0x2545_f491;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed % 1_400) as f64 - 300.0
    };
    for frame in 0..200 {
        let rect = if frame % 3 == 0 {
            session.move_crop_selector(Vec2::new(next(), next()));
            session.crop().expect("cropping").selector_rect()
        } else {
            let proposed = Rect::new(next(), next(), next().abs() + 1.0, next().abs() + 1.0);
            session.resize_crop_selector(proposed).expect("cropping")
        };
        assert!(rect.left() >= bounds.left() - 1e-6, "frame {frame}: {rect:?}");
        assert!(rect.top() >= bounds.top() - 1e-6, "frame {frame}: {rect:?}");
        assert!(rect.right() <= bounds.right() + 1e-6, "frame {frame}: {rect:?}");
        assert!(rect.bottom() <= bounds.bottom() + 1e-6, "frame {frame}: {rect:?}");
        assert!(
            (rect.width / rect.height - 4.0 / 3.0).abs() < 1e-3,
            "frame {frame}: {rect:?}"
        );
    }

    session.cancel_crop().expect("crop cancels");
    assert_eq!(session.scene().base(), &before);
    assert_eq!(session.mode(), SessionMode::Editing);
}

#[test]
fn deleting_every_character_removes_the_text_node() {
    let mut session = open_blank(400, 300);
    let id = session.add_text().expect("text added");
    session.begin_text_edit(id).expect("edit allowed");
    let edit = session.text_edit_mut().expect("overlay open");
    edit.buffer.set_text("Hello");
    while edit.buffer.delete_backward() {}

    session.pointer_down(Vec2::new(2.0, 2.0));
    assert!(session.scene().overlay(id).is_none());
    assert!(session.scene().overlays().is_empty());
}

#[test]
fn export_draws_overlays_over_the_base_image() {
    let red = Rgba([255, 0, 0, 255]);
    let (mut session, recorder) = open_with(RgbaImage::from_pixel(20, 10, red));
    session
        .add_shape(Color::rgb(0, 0, 255), Size::new(4.0, 4.0))
        .expect("shape added");

    let file = session.save().expect("save succeeds");
    let decoded = image::load_from_memory(&file.bytes)
        .expect("png output")
        .to_rgba8();
    assert_eq!(decoded.dimensions(), (20, 10));
    assert_eq!(decoded.get_pixel(10, 5).0, [0, 0, 255, 255]);
    assert_eq!(decoded.get_pixel(0, 0), &red);
    assert_eq!(*recorder.calls.borrow(), vec![Call::Done(file)]);
}

#[test]
fn export_keeps_a_mirrored_base() {
    let mut source = RgbaImage::from_pixel(2, 1, Rgba([255, 0, 0, 255]));
    source.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
    let (mut session, _) = open_with(source);
    session.mirror_selected(MirrorAxis::Horizontal);

    let file = session.save().expect("save succeeds");
    let decoded = image::load_from_memory(&file.bytes)
        .expect("png output")
        .to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0, [0, 255, 0, 255]);
    assert_eq!(decoded.get_pixel(1, 0).0, [255, 0, 0, 255]);
}

#[test]
fn closing_leaves_the_upload_untouched() {
    let (mut session, recorder) = open_with(RgbaImage::new(8, 8));
    session.add_text().expect("text added");
    assert!(session.close());
    assert!(session.save().is_err());
    drop(session);
    assert_eq!(*recorder.calls.borrow(), vec![Call::Aborted]);
}
