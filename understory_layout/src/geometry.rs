// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry helpers over Kurbo value types.
//!
//! Edge sizes (margin, padding, self size, component reservations) are expressed as
//! [`Insets`]: `x0` is the left edge, `y0` the top, `x1` the right, and `y1` the bottom.

use kurbo::{Affine, Insets, Rect, Size};

use crate::types::{HorizontalAlignment, VerticalAlignment};

/// Place a box of `size` within `bounds`.
///
/// `Left`/`Top` use the start of the bounds, `Center` splits the slack evenly,
/// `Right`/`Bottom` align the far edges, and `Stretch` ignores `size` and fills the
/// full extent of `bounds` on that axis.
///
/// ```rust
/// use kurbo::{Rect, Size};
/// use understory_layout::{HorizontalAlignment, VerticalAlignment, apply_alignment};
///
/// let placed = apply_alignment(
///     Rect::new(0.0, 0.0, 100.0, 50.0),
///     HorizontalAlignment::Center,
///     VerticalAlignment::Center,
///     Size::new(20.0, 10.0),
/// );
/// assert_eq!(placed, Rect::new(40.0, 20.0, 60.0, 30.0));
/// ```
pub fn apply_alignment(
    bounds: Rect,
    h_align: HorizontalAlignment,
    v_align: VerticalAlignment,
    size: Size,
) -> Rect {
    let (x0, x1) = match h_align {
        HorizontalAlignment::Left => (bounds.x0, bounds.x0 + size.width),
        HorizontalAlignment::Center => {
            let x0 = bounds.x0 + (bounds.width() - size.width) / 2.0;
            (x0, x0 + size.width)
        }
        HorizontalAlignment::Right => (bounds.x1 - size.width, bounds.x1),
        HorizontalAlignment::Stretch => (bounds.x0, bounds.x1),
    };
    let (y0, y1) = match v_align {
        VerticalAlignment::Top => (bounds.y0, bounds.y0 + size.height),
        VerticalAlignment::Center => {
            let y0 = bounds.y0 + (bounds.height() - size.height) / 2.0;
            (y0, y0 + size.height)
        }
        VerticalAlignment::Bottom => (bounds.y1 - size.height, bounds.y1),
        VerticalAlignment::Stretch => (bounds.y0, bounds.y1),
    };
    Rect::new(x0, y0, x1, y1)
}

/// Sum two sets of edge sizes.
pub(crate) fn add_insets(a: Insets, b: Insets) -> Insets {
    Insets::new(a.x0 + b.x0, a.y0 + b.y0, a.x1 + b.x1, a.y1 + b.y1)
}

/// Subtract edge sizes, clamping every edge at zero.
pub(crate) fn sub_insets(a: Insets, b: Insets) -> Insets {
    Insets::new(
        (a.x0 - b.x0).max(0.0),
        (a.y0 - b.y0).max(0.0),
        (a.x1 - b.x1).max(0.0),
        (a.y1 - b.y1).max(0.0),
    )
}

/// Total extent of a set of edge sizes.
pub(crate) fn insets_size(insets: Insets) -> Size {
    Size::new(insets.x0 + insets.x1, insets.y0 + insets.y1)
}

/// Shrink `rect` by `insets`.
///
/// When the insets are larger than the rectangle the result collapses to an empty
/// rectangle at the point where the opposite edges met, so the result always lies
/// within `rect`.
pub fn deflate(rect: Rect, insets: Insets) -> Rect {
    let rect = rect.abs();
    let (x0, x1) = shrink_span(rect.x0, rect.x1, insets.x0, insets.x1);
    let (y0, y1) = shrink_span(rect.y0, rect.y1, insets.y0, insets.y1);
    Rect::new(x0, y0, x1, y1)
}

fn shrink_span(start: f64, end: f64, lead: f64, trail: f64) -> (f64, f64) {
    let s = start + lead;
    let e = end - trail;
    if s <= e {
        (s, e)
    } else {
        let total = lead + trail;
        let at = if total > 0.0 {
            start + (end - start) * (lead / total)
        } else {
            start
        };
        (at, at)
    }
}

/// Component-wise maximum.
pub(crate) fn max_size(a: Size, b: Size) -> Size {
    Size::new(a.width.max(b.width), a.height.max(b.height))
}

/// Component-wise minimum.
pub(crate) fn min_size(a: Size, b: Size) -> Size {
    Size::new(a.width.min(b.width), a.height.min(b.height))
}

/// Subtract `b` from `a`, clamping at zero.
pub(crate) fn sub_size(a: Size, b: Size) -> Size {
    Size::new((a.width - b.width).max(0.0), (a.height - b.height).max(0.0))
}

/// Whether `a` fits within `b` on both axes.
pub(crate) fn fits_within(a: Size, b: Size) -> bool {
    a.width <= b.width && a.height <= b.height
}

/// Whether `inner` lies within `outer`, edges included.
pub fn contains_rect(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

/// Whether a rectangle has no positive area.
pub(crate) fn is_empty(rect: Rect) -> bool {
    rect.width() <= 0.0 || rect.height() <= 0.0
}

/// Intersection that reports `None` when the result has no area.
pub(crate) fn intersect_nonempty(a: Rect, b: Rect) -> Option<Rect> {
    let r = a.intersect(b);
    (!is_empty(r)).then_some(r)
}

/// Round a rectangle outward to integer coordinates so transformed edges never
/// leave sub-pixel gaps.
pub fn round_up(rect: Rect) -> Rect {
    rect.expand()
}

/// Transform an axis-aligned `Rect` by an `Affine` and return a conservative
/// axis-aligned bounding box.
pub(crate) fn transform_rect_bbox(affine: Affine, rect: Rect) -> Rect {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let min_x = (a * rect.x0).min(a * rect.x1) + (c * rect.y0).min(c * rect.y1);
    let max_x = (a * rect.x0).max(a * rect.x1) + (c * rect.y0).max(c * rect.y1);
    let min_y = (b * rect.x0).min(b * rect.x1) + (d * rect.y0).min(d * rect.y1);
    let max_y = (b * rect.x0).max(b * rect.x1) + (d * rect.y0).max(d * rect.y1);
    Rect::new(min_x + e, min_y + f, max_x + e, max_y + f)
}
