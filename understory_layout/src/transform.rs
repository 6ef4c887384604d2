// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions between layout, unscaled screen, and screen coordinates.

use kurbo::{Affine, Point, Rect, Vec2};

use crate::geometry::{round_up, transform_rect_bbox};
use crate::tree::LayoutTree;
use crate::types::{NodeId, NodeKind};

/// A coordinate space a node's geometry can be expressed in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CoordinateSpace {
    /// The node's layout space: its rectangles before ancestor scroll offsets.
    Layout,
    /// Absolute desktop coordinates before the window's scale is applied.
    UnscaledScreen,
    /// Absolute desktop coordinates after the window's scale is applied.
    Screen,
}

impl LayoutTree {
    /// Accumulated scroll offset of the ancestors that host `id` as content.
    ///
    /// Offsets are summed up to and including the owning window. Component hosts
    /// contribute nothing: components do not scroll with their host's content.
    pub(crate) fn layout_offset(&self, id: NodeId) -> Vec2 {
        let mut offset = Vec2::ZERO;
        let Some(mut current) = self.node_opt(id) else {
            return offset;
        };
        if current.kind == NodeKind::Window {
            return offset;
        }
        loop {
            let (next, as_content) = match (current.parent, current.owner) {
                (Some(p), _) => (p, true),
                (None, Some(o)) => (o, false),
                (None, None) => break,
            };
            let host = self.node(next);
            if as_content {
                offset += host.content_offset;
            }
            if host.kind == NodeKind::Window {
                break;
            }
            current = host;
        }
        offset
    }

    /// Unscaled screen to screen matrix of a window: a scale about its top-left corner.
    pub(crate) fn window_scale(&self, window: NodeId) -> Affine {
        let Ok(ws) = self.window_state(window) else {
            return Affine::IDENTITY;
        };
        let scale = ws.props.scale;
        if scale == 1.0 {
            return Affine::IDENTITY;
        }
        let origin = ws.props.bounds.origin().to_vec2();
        Affine::translate(origin) * Affine::scale(scale) * Affine::translate(-origin)
    }

    /// Matrix from `space` to screen space for `id`.
    fn to_screen(&self, id: NodeId, space: CoordinateSpace) -> Affine {
        let scale = || {
            self.window_of(id)
                .map_or(Affine::IDENTITY, |w| self.window_scale(w))
        };
        match space {
            CoordinateSpace::Layout => scale() * Affine::translate(self.layout_offset(id)),
            CoordinateSpace::UnscaledScreen => scale(),
            CoordinateSpace::Screen => Affine::IDENTITY,
        }
    }

    /// Transform mapping `from` coordinates of `id` to `to` coordinates.
    ///
    /// Layout to screen composes layout to unscaled screen (the ancestors' scroll
    /// offsets) with unscaled screen to screen (the owning window's scale). Returns
    /// `None` for a stale id.
    pub fn transform(&self, id: NodeId, from: CoordinateSpace, to: CoordinateSpace) -> Option<Affine> {
        if !self.is_alive(id) {
            return None;
        }
        if from == to {
            return Some(Affine::IDENTITY);
        }
        Some(self.to_screen(id, to).inverse() * self.to_screen(id, from))
    }

    /// Transform a point between coordinate spaces of `id`.
    pub fn transform_point(
        &self,
        id: NodeId,
        point: Point,
        from: CoordinateSpace,
        to: CoordinateSpace,
    ) -> Option<Point> {
        Some(self.transform(id, from, to)? * point)
    }

    /// Transform a rectangle between coordinate spaces of `id`, rounding the result
    /// outward to whole units.
    pub fn transform_rect(
        &self,
        id: NodeId,
        rect: Rect,
        from: CoordinateSpace,
        to: CoordinateSpace,
    ) -> Option<Rect> {
        let affine = self.transform(id, from, to)?;
        Some(round_up(transform_rect_bbox(affine, rect)))
    }

    /// A node's layout rectangle in the requested space.
    pub fn layout_rect_in(&self, id: NodeId, space: CoordinateSpace) -> Option<Rect> {
        let layout = self.rects(id)?.layout;
        self.transform_rect(id, layout, CoordinateSpace::Layout, space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::WindowProps;
    use crate::types::{AxisConstraints, HorizontalAlignment, LayoutProps, VerticalAlignment};

    fn window(tree: &mut LayoutTree, bounds: Rect, scale: f64) -> NodeId {
        tree.insert_window(None, LayoutProps::default(), WindowProps { bounds, scale })
            .unwrap()
    }

    fn boxed(tree: &mut LayoutTree, w: f64, h: f64) -> NodeId {
        tree.insert_element(LayoutProps {
            width: AxisConstraints::fixed(w),
            height: AxisConstraints::fixed(h),
            horizontal_alignment: HorizontalAlignment::Left,
            vertical_alignment: VerticalAlignment::Top,
            ..LayoutProps::default()
        })
        .unwrap()
    }

    #[test]
    fn unit_scale_without_scroll_is_identity() {
        let mut tree = LayoutTree::new();
        let w = window(&mut tree, Rect::new(0.0, 0.0, 100.0, 100.0), 1.0);
        let node = boxed(&mut tree, 10.0, 10.0);
        tree.set_content(w, Some(node)).unwrap();
        let t = tree
            .transform(node, CoordinateSpace::Layout, CoordinateSpace::Screen)
            .unwrap();
        assert_eq!(t, Affine::IDENTITY);
    }

    #[test]
    fn scroll_offset_translates_descendants_only() {
        let mut tree = LayoutTree::new();
        let w = window(&mut tree, Rect::new(0.0, 0.0, 100.0, 100.0), 1.0);
        let scroller = tree.insert_container(LayoutProps::default()).unwrap();
        let item = boxed(&mut tree, 10.0, 10.0);
        tree.set_content(w, Some(scroller)).unwrap();
        tree.set_content(scroller, Some(item)).unwrap();
        tree.set_content_offset(scroller, Vec2::new(0.0, -30.0))
            .unwrap();

        let p = tree
            .transform_point(
                item,
                Point::new(5.0, 40.0),
                CoordinateSpace::Layout,
                CoordinateSpace::UnscaledScreen,
            )
            .unwrap();
        assert_eq!(p, Point::new(5.0, 10.0));
        assert_eq!(
            tree.transform(scroller, CoordinateSpace::Layout, CoordinateSpace::UnscaledScreen),
            Some(Affine::IDENTITY),
            "a node's own offset does not move the node"
        );
    }

    #[test]
    fn window_scale_applies_about_window_origin() {
        let mut tree = LayoutTree::new();
        let w = window(&mut tree, Rect::new(100.0, 100.0, 300.0, 300.0), 2.0);
        let node = boxed(&mut tree, 10.0, 10.0);
        tree.set_content(w, Some(node)).unwrap();

        let to_screen = |p| {
            tree.transform_point(node, p, CoordinateSpace::Layout, CoordinateSpace::Screen)
                .unwrap()
        };
        assert_eq!(to_screen(Point::new(100.0, 100.0)), Point::new(100.0, 100.0));
        assert_eq!(to_screen(Point::new(110.0, 105.0)), Point::new(120.0, 110.0));

        let back = tree
            .transform_point(
                node,
                Point::new(120.0, 110.0),
                CoordinateSpace::Screen,
                CoordinateSpace::Layout,
            )
            .unwrap();
        assert!((back - Point::new(110.0, 105.0)).hypot() < 1e-9, "round trip");
    }

    #[test]
    fn rectangles_round_outward() {
        let mut tree = LayoutTree::new();
        let w = window(&mut tree, Rect::new(0.0, 0.0, 100.0, 100.0), 1.5);
        let r = tree
            .transform_rect(
                w,
                Rect::new(1.0, 1.0, 3.0, 3.0),
                CoordinateSpace::UnscaledScreen,
                CoordinateSpace::Screen,
            )
            .unwrap();
        assert_eq!(r, Rect::new(1.0, 1.0, 5.0, 5.0));
    }

    #[test]
    fn stale_node_has_no_transform() {
        let mut tree = LayoutTree::new();
        let node = boxed(&mut tree, 1.0, 1.0);
        tree.remove(node);
        assert!(
            tree.transform(node, CoordinateSpace::Layout, CoordinateSpace::Screen)
                .is_none(),
            "removed ids are rejected"
        );
    }
}
