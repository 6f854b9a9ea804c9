//! Final rasterization of a scene and encoding into the upload's format.

mod layer;

use std::io::Cursor;

use ab_glyph::FontArc;
use image::{DynamicImage, ImageError, ImageFormat, RgbaImage};
use thiserror::Error;

use crate::geometry::Size;
use crate::scene::{Node, Scene};

/// Largest canvas or node layer, in pixels, the exporter will allocate.
pub const MAX_EXPORT_PIXELS: f64 = 16_384.0 * 16_384.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("export area is empty")]
    EmptyArea,
    #[error("export area {width}x{height} exceeds the pixel limit")]
    TooLarge { width: f64, height: f64 },
    #[error("failed to encode image: {0}")]
    Encode(#[from] ImageError),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// Rasterizes the scene clipped to the base image's bounding box: the base
/// image first, then every visible overlay in insertion order. Text nodes
/// need `font`; without one they are left out.
pub fn rasterize_scene(
    scene: &Scene,
    font: Option<&FontArc>,
    text_padding: f64,
) -> RenderResult<RgbaImage> {
    let bounds = scene.base().transform.client_rect();
    let width = bounds.width.round();
    let height = bounds.height.round();
    if !(width >= 1.0 && height >= 1.0) {
        return Err(RenderError::EmptyArea);
    }
    if !fits_pixel_budget(Size::new(width, height)) {
        return Err(RenderError::TooLarge { width, height });
    }
    let mut canvas = RgbaImage::new(width as u32, height as u32);
    let origin = bounds.top_left();

    let overlays = scene.overlays().iter().filter(|node| node.visible);
    let nodes = std::iter::once(scene.base()).chain(overlays);
    for node in nodes {
        draw_node(&mut canvas, origin, node, font, text_padding);
    }
    tracing::debug!(width = canvas.width(), height = canvas.height(), "scene rasterized");
    Ok(canvas)
}

fn draw_node(
    canvas: &mut RgbaImage,
    origin: crate::geometry::Vec2,
    node: &Node,
    font: Option<&FontArc>,
    text_padding: f64,
) {
    if let Some(content) = layer::node_layer(node, text_padding, font) {
        layer::draw_layer(canvas, origin, &content, &node.transform);
    }
}

fn fits_pixel_budget(size: Size) -> bool {
    size.width.ceil() <= f64::from(u32::MAX)
        && size.height.ceil() <= f64::from(u32::MAX)
        && size.width.ceil() * size.height.ceil() <= MAX_EXPORT_PIXELS
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

fn output_format(mime: &str) -> ImageFormat {
    match ImageFormat::from_mime_type(mime) {
        Some(
            format @ (ImageFormat::Png
            | ImageFormat::Jpeg
            | ImageFormat::WebP
            | ImageFormat::Gif
            | ImageFormat::Bmp),
        ) => format,
        _ => {
            tracing::warn!(mime, "unsupported export type; encoding as PNG");
            ImageFormat::Png
        }
    }
}

/// Encodes `image` in the format named by `mime`, falling back to PNG.
pub fn encode(image: &RgbaImage, mime: &str) -> RenderResult<EncodedImage> {
    let format = output_format(mime);
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(image.clone())
            .to_rgb8()
            .write_to(&mut cursor, format)?,
        _ => image.write_to(&mut cursor, format)?,
    }
    Ok(EncodedImage {
        bytes,
        mime: format.to_mime_type().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use image::Rgba;

    use crate::geometry::{Color, Size, Vec2};
    use crate::scene::{CropRect, NodeKind, ShapeNode, TextNode, Transform};

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn export_matches_base_bounds_and_crop() {
        let mut scene = Scene::new(Arc::new(gradient(40, 30)), Vec2::new(100.0, 100.0));
        scene.base_image_mut().expect("base image").crop = CropRect::new(10.0, 5.0, 20.0, 10.0);
        scene.base_mut().transform.set_size_centered(Size::new(20.0, 10.0));

        let output = rasterize_scene(&scene, None, 5.0).expect("export renders");
        assert_eq!(output.dimensions(), (20, 10));
        assert_eq!(output.get_pixel(0, 0).0, [10, 5, 0, 255]);
        assert_eq!(output.get_pixel(19, 9).0, [29, 14, 0, 255]);
    }

    #[test]
    fn export_honors_mirroring_and_rotation_bounds() {
        let mut scene = Scene::new(Arc::new(gradient(4, 2)), Vec2::new(10.0, 10.0));
        scene.base_mut().transform.scale = Vec2::new(-1.0, 1.0);
        let mirrored = rasterize_scene(&scene, None, 0.0).expect("export renders");
        assert_eq!(mirrored.get_pixel(0, 0).0, [3, 0, 0, 255]);

        scene.base_mut().transform.rotation = 90.0;
        let rotated = rasterize_scene(&scene, None, 0.0).expect("export renders");
        assert_eq!(rotated.dimensions(), (2, 4));
    }

    #[test]
    fn overlays_draw_on_top_and_hidden_ones_are_skipped() {
        let mut scene = Scene::new(Arc::new(gradient(10, 10)), Vec2::new(5.0, 5.0));
        let red = scene.add_overlay(
            Transform::centered(Vec2::new(5.0, 5.0), Size::new(2.0, 2.0)),
            NodeKind::Shape(ShapeNode {
                fill: Color::rgb(255, 0, 0),
                corner_radius: 0.0,
            }),
        );
        let output = rasterize_scene(&scene, None, 0.0).expect("export renders");
        assert_eq!(output.get_pixel(4, 4).0, [255, 0, 0, 255]);
        assert_eq!(output.get_pixel(0, 0).0, [0, 0, 0, 255]);

        scene.overlay_mut(red).expect("shape").visible = false;
        let output = rasterize_scene(&scene, None, 0.0).expect("export renders");
        assert_eq!(output.get_pixel(4, 4).0, [4, 4, 0, 255]);
    }

    #[test]
    fn text_without_font_is_skipped() {
        let mut scene = Scene::new(Arc::new(gradient(10, 10)), Vec2::new(5.0, 5.0));
        scene.add_overlay(
            Transform::centered(Vec2::new(5.0, 5.0), Size::new(10.0, 10.0)),
            NodeKind::Text(TextNode::new("Hi", 8.0, "Arial")),
        );
        let output = rasterize_scene(&scene, None, 0.0).expect("export renders");
        assert_eq!(output, gradient(10, 10));
    }

    #[test]
    fn oversized_export_area_is_an_error() {
        let mut scene = Scene::new(Arc::new(gradient(4, 4)), Vec2::new(2.0, 2.0));
        scene
            .base_mut()
            .transform
            .set_size_centered(Size::new(5_000_000_000.0, 5_000_000_000.0));
        let error = rasterize_scene(&scene, None, 0.0).expect_err("too large to allocate");
        assert!(matches!(error, RenderError::TooLarge { .. }));
    }

    #[test]
    fn oversized_overlays_are_left_out() {
        let mut scene = Scene::new(Arc::new(gradient(10, 10)), Vec2::new(5.0, 5.0));
        scene.add_overlay(
            Transform::centered(Vec2::new(5.0, 5.0), Size::new(1.0e9, 1.0e9)),
            NodeKind::Shape(ShapeNode {
                fill: Color::rgb(255, 0, 0),
                corner_radius: 0.0,
            }),
        );
        let output = rasterize_scene(&scene, None, 0.0).expect("export renders");
        assert_eq!(output, gradient(10, 10));
    }

    #[test]
    fn encode_uses_requested_type_or_png() {
        let image = gradient(3, 3);
        let jpeg = encode(&image, "image/jpeg").expect("jpeg encodes");
        assert_eq!(jpeg.mime, "image/jpeg");
        assert_eq!(image::guess_format(&jpeg.bytes).expect("sniff"), ImageFormat::Jpeg);

        let fallback = encode(&image, "application/pdf").expect("png fallback");
        assert_eq!(fallback.mime, "image/png");
        let decoded = image::load_from_memory(&fallback.bytes).expect("decode").to_rgba8();
        assert_eq!(decoded, image);
    }
}
