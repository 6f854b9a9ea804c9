//! Pure geometry that keeps the crop selector inside the frozen image.

use crate::geometry::{clamp_or_mid, Rect, Size, Vec2};

/// Corrects a proposed selector box for one resize frame.
///
/// `old` is the box before the frame, `proposed` the box the handle wants,
/// `image` the frozen image bounds and `ratio` the locked width/height ratio
/// (`0.0` when unlocked). Frames that would collapse the box below
/// `min_size` keep `old`.
pub fn constrain_resize(old: Rect, proposed: Rect, image: Rect, ratio: f64, min_size: f64) -> Rect {
    let locked = ratio > 0.0;
    let outside_vertically = proposed.top() < image.top() || proposed.bottom() > image.bottom();
    let outside_horizontally =
        proposed.left() < image.left() || proposed.right() > image.right();

    // A locked diagonal drag that already left the image on the other axis
    // keeps its previous origin.
    let x = if locked && outside_vertically {
        old.x
    } else {
        clamp_or_mid(proposed.x, image.left(), image.right())
    };
    let y = if locked && outside_horizontally {
        old.y
    } else {
        clamp_or_mid(proposed.y, image.top(), image.bottom())
    };

    let mut width = if proposed.left() < image.left() {
        proposed.width - (image.left() - proposed.left())
    } else {
        proposed.width
    };
    width = width.min(image.right() - x);

    let mut height = if proposed.top() < image.top() {
        proposed.height - (image.top() - proposed.top())
    } else {
        proposed.height
    };
    height = height.min(image.bottom() - y);

    if locked && width > 0.0 && height > 0.0 {
        if width / height > ratio {
            width = height * ratio;
        } else {
            height = width / ratio;
        }

        let space_right = image.right() - x;
        if width > space_right {
            width = space_right;
            height = width / ratio;
        }
        let space_bottom = image.bottom() - y;
        if height > space_bottom {
            height = space_bottom;
            width = height * ratio;
        }
    }

    if !(width.is_finite() && height.is_finite()) || width < min_size || height < min_size {
        tracing::trace!(width, height, "selector resize frame rejected");
        return old;
    }
    Rect::new(x, y, width, height)
}

/// Clamps a dragged selector center so the whole box stays on the image.
pub fn constrain_move(center: Vec2, half: Vec2, image: Rect) -> Vec2 {
    Vec2::new(
        clamp_or_mid(center.x, image.left() + half.x, image.right() - half.x),
        clamp_or_mid(center.y, image.top() + half.y, image.bottom() - half.y),
    )
}

/// Shrinks whichever axis is too long for `ratio`. Unlocked ratios pass through.
pub fn fit_ratio(size: Size, ratio: f64) -> Size {
    if ratio <= 0.0 || size.is_empty() {
        return size;
    }
    if size.width / size.height > ratio {
        Size::new(size.height * ratio, size.height)
    } else {
        Size::new(size.width, size.width / ratio)
    }
}
