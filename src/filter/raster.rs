use image::{imageops, DynamicImage, Rgba, RgbaImage};

use super::{FilterKind, FilterParams, FilterState};

/// Runs the active filters over `image` in activation order.
pub fn apply_filters(image: &RgbaImage, state: &FilterState) -> RgbaImage {
    let mut output = image.clone();
    for kind in state.kinds() {
        output = apply_filter(output, *kind, &state.params);
    }
    output
}

fn apply_filter(image: RgbaImage, kind: FilterKind, params: &FilterParams) -> RgbaImage {
    match kind {
        FilterKind::Grayscale => DynamicImage::ImageRgba8(image).grayscale().to_rgba8(),
        FilterKind::Blur => {
            if params.blur_radius <= 0.0 {
                return image;
            }
            let sigma = (params.blur_radius / 2.0).max(0.5) as f32;
            imageops::blur(&image, sigma)
        }
        FilterKind::Pixelate => pixelate(&image, params.pixel_size.round().max(1.0) as u32),
        FilterKind::Contrast => {
            if params.contrast == 0.0 {
                return image;
            }
            imageops::contrast(&image, params.contrast as f32)
        }
        FilterKind::Brighten => {
            let delta = (params.brightness * 255.0).round() as i32;
            if delta == 0 {
                return image;
            }
            imageops::brighten(&image, delta)
        }
        FilterKind::Invert => invert(image),
    }
}

fn invert(mut image: RgbaImage) -> RgbaImage {
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        *pixel = Rgba([255 - r, 255 - g, 255 - b, a]);
    }
    image
}

/// Replaces each `block`×`block` tile with its average color.
fn pixelate(image: &RgbaImage, block: u32) -> RgbaImage {
    if block <= 1 {
        return image.clone();
    }
    let (width, height) = image.dimensions();
    let mut output = RgbaImage::new(width, height);
    for tile_y in (0..height).step_by(block as usize) {
        for tile_x in (0..width).step_by(block as usize) {
            let tile_w = block.min(width - tile_x);
            let tile_h = block.min(height - tile_y);
            let mut sum = [0_u64; 4];
            for y in tile_y..tile_y + tile_h {
                for x in tile_x..tile_x + tile_w {
                    for (total, channel) in sum.iter_mut().zip(image.get_pixel(x, y).0) {
                        *total += u64::from(channel);
                    }
                }
            }
            let count = u64::from(tile_w) * u64::from(tile_h);
            let average = Rgba(sum.map(|total| (total / count) as u8));
            for y in tile_y..tile_y + tile_h {
                for x in tile_x..tile_x + tile_w {
                    output.put_pixel(x, y, average);
                }
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterParam;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn no_filters_is_identity() {
        let image = checker(8, 8);
        assert_eq!(apply_filters(&image, &FilterState::default()), image);
    }

    #[test]
    fn invert_keeps_alpha() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 40]));
        let mut state = FilterState::default();
        state.toggle(FilterKind::Invert);
        let output = apply_filters(&image, &state);
        assert_eq!(output.get_pixel(1, 1).0, [245, 235, 225, 40]);
    }

    #[test]
    fn grayscale_equalizes_channels() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([200, 40, 90, 255]));
        let mut state = FilterState::default();
        state.toggle(FilterKind::Grayscale);
        let [r, g, b, a] = apply_filters(&image, &state).get_pixel(0, 0).0;
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 255);
    }

    #[test]
    fn pixelate_averages_tiles() {
        let image = checker(4, 4);
        let mut state = FilterState::default();
        state.toggle(FilterKind::Pixelate);
        state.params.set(FilterParam::PixelSize, 2.0);
        let output = apply_filters(&image, &state);
        assert_eq!(output.dimensions(), (4, 4));
        assert_eq!(output.get_pixel(0, 0).0, [127, 127, 127, 255]);
        assert_eq!(output.get_pixel(3, 3).0, [127, 127, 127, 255]);
    }

    #[test]
    fn pixelate_handles_partial_edge_tiles() {
        let image = RgbaImage::from_pixel(5, 3, Rgba([9, 9, 9, 255]));
        let output = pixelate(&image, 4);
        assert_eq!(output.get_pixel(4, 2).0, [9, 9, 9, 255]);
    }

    #[test]
    fn brighten_shifts_channels() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        let mut state = FilterState::default();
        state.toggle(FilterKind::Brighten);
        state.params.set(FilterParam::Brightness, 0.2);
        let [r, _, _, a] = apply_filters(&image, &state).get_pixel(0, 0).0;
        assert_eq!(r, 151);
        assert_eq!(a, 255);
    }

    #[test]
    fn zero_blur_radius_is_identity() {
        let image = checker(6, 6);
        let mut state = FilterState::default();
        state.toggle(FilterKind::Blur);
        assert_eq!(apply_filters(&image, &state), image);
        state.params.set(FilterParam::BlurRadius, 6.0);
        assert_ne!(apply_filters(&image, &state), image);
    }
}
