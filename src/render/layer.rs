use ab_glyph::{point, Font, FontArc, GlyphId, ScaleFont};
use image::{imageops, Rgba, RgbaImage};

use crate::filter::apply_filters;
use crate::geometry::{Color, Rect, Vec2};
use crate::scene::{ImageNode, Node, NodeKind, ShapeNode, TextAlign, TextNode, Transform};

/// Rasterizes a node's content in its own unscaled box, one pixel per local unit
/// (image nodes keep source resolution).
pub(super) fn node_layer(node: &Node, padding: f64, font: Option<&FontArc>) -> Option<RgbaImage> {
    let sized_by_transform = !matches!(node.kind, NodeKind::Image(_));
    if sized_by_transform && !super::fits_pixel_budget(node.transform.size) {
        tracing::warn!(
            id = node.id,
            size = ?node.transform.size,
            "node too large; skipped in export"
        );
        return None;
    }
    match &node.kind {
        NodeKind::Image(image) => Some(image_layer(image)),
        NodeKind::Shape(shape) => Some(shape_layer(shape, &node.transform)),
        NodeKind::Text(text) => match font {
            Some(font) => Some(text_layer(text, &node.transform, padding, font)),
            None => {
                tracing::warn!(id = node.id, "no font available; text node skipped in export");
                None
            }
        },
    }
}

/// Crop, then filters, then the background fill and corner rounding.
fn image_layer(image: &ImageNode) -> RgbaImage {
    let (source_w, source_h) = image.source.dimensions();
    if source_w == 0 || source_h == 0 {
        return RgbaImage::new(0, 0);
    }
    let region = image.visible_region();
    let x = (region.x.round().max(0.0) as u32).min(source_w.saturating_sub(1));
    let y = (region.y.round().max(0.0) as u32).min(source_h.saturating_sub(1));
    let width = (region.width.round().max(1.0) as u32).min(source_w - x);
    let height = (region.height.round().max(1.0) as u32).min(source_h - y);
    let cropped = imageops::crop_imm(image.source.as_ref(), x, y, width, height).to_image();

    let mut layer = apply_filters(&cropped, &image.filters);
    if image.fill.a > 0 {
        fill_under(&mut layer, image.fill);
    }
    round_corners(&mut layer, image.corner_radius);
    layer
}

fn shape_layer(shape: &ShapeNode, transform: &Transform) -> RgbaImage {
    let (width, height) = layer_dimensions(transform);
    let mut layer = RgbaImage::from_pixel(width, height, Rgba(shape.fill.to_array()));
    round_corners(&mut layer, shape.corner_radius);
    layer
}

fn text_layer(text: &TextNode, transform: &Transform, padding: f64, font: &FontArc) -> RgbaImage {
    let (width, height) = layer_dimensions(transform);
    let mut layer = RgbaImage::new(width, height);
    let font_size = text.font_size as f32;
    let scaled = font.as_scaled(font_size);
    let ascent = scaled.ascent();
    let line_advance = (text.font_size * text.line_height) as f32;
    let padding = padding.max(0.0) as f32;
    let color = text.fill.to_array();

    for (index, line) in text.lines().enumerate() {
        let mut glyphs = Vec::new();
        let mut cursor_x = 0.0_f32;
        let mut last_glyph: Option<GlyphId> = None;
        for ch in line.chars() {
            let glyph_id = font.glyph_id(ch);
            if let Some(prev) = last_glyph {
                cursor_x += scaled.kern(prev, glyph_id);
            }
            glyphs.push((glyph_id, cursor_x));
            cursor_x += scaled.h_advance(glyph_id);
            last_glyph = Some(glyph_id);
        }

        let start_x = match text.align {
            TextAlign::Left => padding,
            TextAlign::Center => (width as f32 - cursor_x) / 2.0,
            TextAlign::Right => width as f32 - padding - cursor_x,
        };
        let baseline = padding + index as f32 * line_advance + ascent;

        for (glyph_id, x) in glyphs {
            let glyph = glyph_id.with_scale_and_position(font_size, point(start_x + x, baseline));
            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + i64::from(gx);
                let py = bounds.min.y as i64 + i64::from(gy);
                if px < 0 || py < 0 || px >= i64::from(width) || py >= i64::from(height) {
                    return;
                }
                blend_over(layer.get_pixel_mut(px as u32, py as u32), color, coverage);
            });
        }
    }
    layer
}

fn layer_dimensions(transform: &Transform) -> (u32, u32) {
    (
        transform.size.width.ceil().max(1.0) as u32,
        transform.size.height.ceil().max(1.0) as u32,
    )
}

fn fill_under(layer: &mut RgbaImage, fill: Color) {
    for pixel in layer.pixels_mut() {
        let top = pixel.0;
        *pixel = Rgba(fill.to_array());
        blend_over(pixel, top, 1.0);
    }
}

/// Clears pixels whose centers fall outside a rounded rectangle of `radius`.
fn round_corners(layer: &mut RgbaImage, radius: f64) {
    let (width, height) = layer.dimensions();
    let radius = radius.min(f64::from(width) / 2.0).min(f64::from(height) / 2.0);
    if radius <= 0.0 {
        return;
    }
    let right = f64::from(width) - radius;
    let bottom = f64::from(height) - radius;
    for (x, y, pixel) in layer.enumerate_pixels_mut() {
        let cx = f64::from(x) + 0.5;
        let cy = f64::from(y) + 0.5;
        let dx = if cx < radius {
            radius - cx
        } else if cx > right {
            cx - right
        } else {
            continue;
        };
        let dy = if cy < radius {
            radius - cy
        } else if cy > bottom {
            cy - bottom
        } else {
            continue;
        };
        if dx * dx + dy * dy > radius * radius {
            pixel.0[3] = 0;
        }
    }
}

/// Straight-alpha "source over" of `src` scaled by `coverage`.
pub(super) fn blend_over(dst: &mut Rgba<u8>, src: [u8; 4], coverage: f32) {
    let src_a = f32::from(src[3]) / 255.0 * coverage.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = f32::from(dst.0[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        dst.0 = [0, 0, 0, 0];
        return;
    }
    for channel in 0..3 {
        let s = f32::from(src[channel]);
        let d = f32::from(dst.0[channel]);
        let value = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
        dst.0[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Draws `layer` onto `canvas` through `transform`. `origin` is the stage
/// point under the canvas's top-left pixel. Each canvas pixel center is mapped
/// back into the layer and sampled nearest-neighbour.
pub(super) fn draw_layer(
    canvas: &mut RgbaImage,
    origin: Vec2,
    layer: &RgbaImage,
    transform: &Transform,
) {
    let (canvas_w, canvas_h) = canvas.dimensions();
    let (layer_w, layer_h) = layer.dimensions();
    if layer_w == 0 || layer_h == 0 || transform.size.is_empty() {
        return;
    }
    let canvas_rect = Rect::new(origin.x, origin.y, f64::from(canvas_w), f64::from(canvas_h));
    let Some(area) = transform.client_rect().intersection(&canvas_rect) else {
        return;
    };
    let unit_x = f64::from(layer_w) / transform.size.width;
    let unit_y = f64::from(layer_h) / transform.size.height;

    let x0 = (area.left() - origin.x).floor().max(0.0) as u32;
    let y0 = (area.top() - origin.y).floor().max(0.0) as u32;
    let x1 = ((area.right() - origin.x).ceil() as u32).min(canvas_w);
    let y1 = ((area.bottom() - origin.y).ceil() as u32).min(canvas_h);

    for y in y0..y1 {
        for x in x0..x1 {
            let stage_point = origin + Vec2::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let Some(local) = transform.stage_to_local(stage_point) else {
                return;
            };
            if local.x < 0.0
                || local.y < 0.0
                || local.x >= transform.size.width
                || local.y >= transform.size.height
            {
                continue;
            }
            let sx = ((local.x * unit_x) as u32).min(layer_w - 1);
            let sy = ((local.y * unit_y) as u32).min(layer_h - 1);
            let src = layer.get_pixel(sx, sy).0;
            blend_over(canvas.get_pixel_mut(x, y), src, 1.0);
        }
    }
}
