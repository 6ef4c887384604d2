// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arrange pass: turns measurements into rectangles.

use kurbo::{Insets, Rect, Size};
use smallvec::SmallVec;

use crate::component::Component;
use crate::geometry::{add_insets, apply_alignment, deflate, insets_size, min_size, sub_insets};
use crate::tree::{LayoutTree, NodeList, NodeRects};
use crate::types::{
    AxisConstraints, HorizontalAlignment, NodeId, VerticalAlignment, Visibility,
};

impl LayoutTree {
    /// Arrange a node within `allocated` and recurse into its components and content.
    ///
    /// Arranging twice with the same rectangle and no invalidation in between produces
    /// identical rectangles. A non-positive allocation, or a collapsed node, gives the
    /// whole subtree empty rectangles.
    pub fn arrange(&mut self, id: NodeId, allocated: Rect) {
        let Some(node) = self.node_opt(id) else {
            return;
        };
        if node.props.visibility == Visibility::Collapsed
            || !(allocated.width() > 0.0 && allocated.height() > 0.0)
        {
            self.arrange_empty(id, allocated);
            return;
        }
        let props = node.props.clone();
        let behavior = node.behavior.clone();
        let components: SmallVec<[Component; 4]> = node.components.iter().cloned().collect();

        self.layout_depth += 1;
        let measured = self.measure(id, allocated.size());
        let margin = insets_size(props.margin);
        let requested = measured.requested();

        let (width, h_align) = consumed_extent(
            allocated.width(),
            requested.width,
            &props.width,
            margin.width,
            props.horizontal_alignment == HorizontalAlignment::Stretch,
        );
        let (height, v_align) = consumed_extent(
            allocated.height(),
            requested.height,
            &props.height,
            margin.height,
            props.vertical_alignment == VerticalAlignment::Stretch,
        );
        if width <= 0.0 || height <= 0.0 {
            self.layout_depth -= 1;
            self.arrange_empty(id, allocated);
            return;
        }
        let h_align = if h_align {
            HorizontalAlignment::Center
        } else {
            props.horizontal_alignment
        };
        let v_align = if v_align {
            VerticalAlignment::Center
        } else {
            props.vertical_alignment
        };
        let render = apply_alignment(allocated, h_align, v_align, Size::new(width, height));
        let layout = deflate(render, props.margin);

        // Components outside the padding shrink `outer`; components inside it
        // accumulate into `inner`.
        let mut outer = layout;
        let mut inner = Insets::ZERO;
        let mut reserved = Insets::ZERO;
        for component in &components {
            let spec = &component.spec;
            let available = if spec.uses_owners_padding {
                deflate(deflate(outer, props.padding), inner)
            } else {
                outer
            };
            let size = self.measure(component.node, available.size()).requested();
            let bounds = spec.placement.place(available, size, spec.consumes);
            self.arrange(component.node, bounds);
            if spec.consumes_any_space() {
                let (edges, _) = spec.reservation(size);
                reserved = add_insets(reserved, edges);
                if spec.uses_owners_padding {
                    inner = add_insets(inner, edges);
                } else {
                    outer = deflate(outer, edges);
                }
            }
        }

        let own = sub_insets(
            measured.self_size,
            add_insets(add_insets(props.margin, props.padding), reserved),
        );
        let stretched = deflate(deflate(deflate(outer, props.padding), inner), own);
        let content_size = min_size(stretched.size(), measured.content_size);
        let aligned = apply_alignment(
            stretched,
            props.horizontal_content_alignment,
            props.vertical_content_alignment,
            content_size,
        );

        let node = self.node_mut(id);
        node.rects = NodeRects {
            allocated,
            render,
            layout,
            stretched_content: stretched,
            aligned_content: aligned,
            actual_visible: node.rects.actual_visible,
        };
        node.layout_dirty = false;

        match behavior {
            Some(b) => b.arrange_content(self, id, aligned),
            None => self.arrange_overlay(id, aligned),
        }
        self.layout_depth -= 1;
    }

    /// Arrange every active child within the same bounds.
    ///
    /// This is the content arrangement of nodes without a
    /// [`NodeLayout`](crate::NodeLayout).
    pub fn arrange_overlay(&mut self, id: NodeId, bounds: Rect) {
        for child in self.layout_children(id) {
            self.arrange(child, bounds);
        }
    }

    fn arrange_empty(&mut self, id: NodeId, allocated: Rect) {
        let mut stack: NodeList = SmallVec::new();
        stack.push(id);
        while let Some(current) = stack.pop() {
            let node = self.node_mut(current);
            node.rects = NodeRects::collapsed_at(allocated);
            node.layout_dirty = false;
            stack.extend(node.children.iter().copied());
            stack.extend(node.components.iter().map(|c| c.node));
        }
    }

    /// Lay out a window at its bounds if anything changed, then its layers.
    pub(crate) fn layout_window(&mut self, window: NodeId) {
        let Some(node) = self.node_opt_mut(window) else {
            return;
        };
        let dirty = node.layout_dirty;
        let previous = node.rects.allocated;
        let Some(ws) = node.window.as_deref_mut() else {
            return;
        };
        let bounds = ws.props.bounds;
        if ws.needs_layout || dirty || previous != bounds {
            ws.needs_layout = false;
            tracing::debug!(?window, ?bounds, "layout pass");
            self.arrange(window, bounds);
        }
        for layer in self.window_layers(window) {
            self.layout_window(layer);
        }
    }

    /// Lay out every window that needs it.
    ///
    /// Called at the start of [`LayoutTree::update`]; exposed for hosts that need
    /// rectangles before the first tick.
    pub fn layout(&mut self) {
        for root in self.roots.clone() {
            self.layout_window(root);
        }
    }
}

/// Extent consumed along one axis and whether alignment must fall back to centering.
fn consumed_extent(
    allocated: f64,
    requested: f64,
    c: &AxisConstraints,
    margin: f64,
    stretch: bool,
) -> (f64, bool) {
    let max = c.max.map(|m| m + margin);
    if stretch {
        match max {
            Some(max) if allocated > max => (max, true),
            _ => (allocated, false),
        }
    } else {
        let extent = allocated.min(requested);
        (max.map_or(extent, |m| extent.min(m)), false)
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;

    use super::*;
    use crate::behavior::{Orientation, Stack};
    use crate::component::{ComponentSpec, Edges};
    use crate::types::LayoutProps;

    fn sized(w: f64, h: f64) -> LayoutProps {
        LayoutProps {
            width: AxisConstraints::fixed(w),
            height: AxisConstraints::fixed(h),
            ..LayoutProps::default()
        }
    }

    #[test]
    fn margin_padding_left_aligned_scenario() {
        let mut tree = LayoutTree::new();
        let node = tree
            .insert_element(LayoutProps {
                margin: Insets::uniform(5.0),
                padding: Insets::uniform(2.0),
                width: AxisConstraints::fixed(50.0),
                horizontal_alignment: HorizontalAlignment::Left,
                ..LayoutProps::default()
            })
            .unwrap();
        tree.arrange(node, Rect::new(0.0, 0.0, 200.0, 200.0));
        let rects = tree.rects(node).unwrap();
        assert_eq!(rects.render.width(), 60.0, "50 plus 10 of margin");
        assert_eq!(rects.layout.width(), 50.0);
        assert_eq!(rects.layout, Rect::new(5.0, 5.0, 55.0, 195.0));
        assert_eq!(rects.stretched_content, Rect::new(7.0, 7.0, 53.0, 193.0));
    }

    #[test]
    fn arrange_is_idempotent() {
        let mut tree = LayoutTree::new();
        let panel = tree.insert_panel(LayoutProps::default()).unwrap();
        tree.set_behavior(panel, Some(Rc::new(Stack::default())))
            .unwrap();
        let a = tree.insert_element(sized(30.0, 20.0)).unwrap();
        let b = tree.insert_element(sized(40.0, 10.0)).unwrap();
        tree.add_child(panel, a).unwrap();
        tree.add_child(panel, b).unwrap();

        let allocated = Rect::new(0.0, 0.0, 100.0, 100.0);
        tree.arrange(panel, allocated);
        let first = [a, b, panel].map(|n| tree.rects(n).unwrap());
        tree.arrange(panel, allocated);
        let second = [a, b, panel].map(|n| tree.rects(n).unwrap());
        assert_eq!(first, second, "cache reuse must not change results");
        assert_eq!(first[1].allocated.y0, 20.0, "second child stacks below the first");
    }

    #[test]
    fn stretch_beyond_max_falls_back_to_center() {
        let mut tree = LayoutTree::new();
        let node = tree
            .insert_element(LayoutProps {
                width: AxisConstraints {
                    min: Some(20.0),
                    max: Some(40.0),
                    preferred: None,
                },
                height: AxisConstraints::fixed(10.0),
                vertical_alignment: VerticalAlignment::Top,
                ..LayoutProps::default()
            })
            .unwrap();
        tree.arrange(node, Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(
            tree.rects(node).unwrap().render,
            Rect::new(30.0, 0.0, 70.0, 10.0)
        );
    }

    #[test]
    fn empty_allocation_empties_the_subtree() {
        let mut tree = LayoutTree::new();
        let host = tree.insert_container(LayoutProps::default()).unwrap();
        let child = tree.insert_element(sized(10.0, 10.0)).unwrap();
        tree.set_content(host, Some(child)).unwrap();
        tree.arrange(host, Rect::new(0.0, 0.0, 50.0, 50.0));
        assert!(tree.rects(child).unwrap().layout.area() > 0.0, "laid out normally");

        tree.arrange(host, Rect::new(10.0, 10.0, 10.0, 60.0));
        let rects = tree.rects(child).unwrap();
        assert_eq!(rects.layout.area(), 0.0);
        assert_eq!(rects.render.origin(), kurbo::Point::new(10.0, 10.0));
    }

    #[test]
    fn content_alignment_places_content_inside_stretched_area() {
        let mut tree = LayoutTree::new();
        let host = tree
            .insert_container(LayoutProps {
                padding: Insets::uniform(10.0),
                horizontal_content_alignment: HorizontalAlignment::Center,
                vertical_content_alignment: VerticalAlignment::Bottom,
                ..LayoutProps::default()
            })
            .unwrap();
        let child = tree.insert_element(sized(20.0, 10.0)).unwrap();
        tree.set_content(host, Some(child)).unwrap();
        tree.arrange(host, Rect::new(0.0, 0.0, 100.0, 100.0));
        let rects = tree.rects(host).unwrap();
        assert_eq!(rects.stretched_content, Rect::new(10.0, 10.0, 90.0, 90.0));
        assert_eq!(rects.aligned_content, Rect::new(40.0, 80.0, 60.0, 90.0));
        assert_eq!(tree.rects(child).unwrap().layout, rects.aligned_content);
    }

    #[test]
    fn components_reserve_edges_of_the_layout_rect() {
        let mut tree = LayoutTree::new();
        let host = tree.insert_container(LayoutProps::default()).unwrap();
        let glyph = tree.insert_element(sized(16.0, 16.0)).unwrap();
        let label = tree.insert_element(sized(40.0, 12.0)).unwrap();
        tree.add_component(host, glyph, ComponentSpec::inline(Edges::LEFT))
            .unwrap();
        tree.set_content(host, Some(label)).unwrap();
        tree.arrange(host, Rect::new(0.0, 0.0, 100.0, 16.0));

        assert_eq!(
            tree.rects(glyph).unwrap().layout,
            Rect::new(0.0, 0.0, 16.0, 16.0)
        );
        let host_rects = tree.rects(host).unwrap();
        assert_eq!(host_rects.stretched_content, Rect::new(16.0, 0.0, 100.0, 16.0));
        assert!(
            crate::geometry::contains_rect(host_rects.stretched_content, host_rects.aligned_content),
            "aligned content stays inside the stretched area"
        );
    }

    #[test]
    fn stack_arranges_horizontally() {
        let mut tree = LayoutTree::new();
        let panel = tree.insert_panel(LayoutProps::default()).unwrap();
        tree.set_behavior(
            panel,
            Some(Rc::new(Stack {
                orientation: Orientation::Horizontal,
                spacing: 5.0,
            })),
        )
        .unwrap();
        let a = tree.insert_element(sized(10.0, 10.0)).unwrap();
        let b = tree.insert_element(sized(10.0, 10.0)).unwrap();
        tree.add_child(panel, a).unwrap();
        tree.add_child(panel, b).unwrap();
        tree.arrange(panel, Rect::new(0.0, 0.0, 100.0, 10.0));
        assert_eq!(tree.rects(b).unwrap().layout.x0, 15.0);
    }
}
