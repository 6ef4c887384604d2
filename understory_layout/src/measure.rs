// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Measure pass.

use kurbo::{Insets, Size};
use smallvec::SmallVec;

use crate::behavior::NodeLayout;
use crate::cache::MeasureRecord;
use crate::component::Component;
use crate::geometry::{add_insets, insets_size, max_size, min_size, sub_size};
use crate::tree::{LayoutTree, Measurement};
use crate::types::{AxisConstraints, LayoutProps, NodeFlags, NodeId, Visibility};

impl LayoutTree {
    /// Measure a node within `available`.
    ///
    /// The full size never exceeds `available` (after the node's own maximum and
    /// preferred constraints are applied). Collapsed and stale nodes measure to zero.
    /// Results are cached per node under the unclamped `available` size.
    pub fn measure(&mut self, id: NodeId, available: Size) -> Measurement {
        let Some(node) = self.node_opt_mut(id) else {
            return Measurement::ZERO;
        };
        if node.props.visibility == Visibility::Collapsed {
            return Measurement::ZERO;
        }
        let available = sanitize(available);
        if let Some(hit) = node.full_cache.get_or_evict(available) {
            tracing::trace!(?id, ?available, "measure cache hit");
            return Measurement {
                self_size: hit.edges,
                full_size: hit.requested,
                shared_size: hit.shared,
                content_size: hit.content,
            };
        }
        tracing::trace!(?id, ?available, "measure cache miss");

        let props = node.props.clone();
        let behavior = node.behavior.clone();
        let margin = insets_size(props.margin);
        let budget = Size::new(
            clamp_budget(available.width, &props.width, margin.width),
            clamp_budget(available.height, &props.height, margin.height),
        );

        let (edges, shared) = self.measure_decorations(id, available, budget, &props, behavior.as_deref());
        let unshared = insets_size(edges);
        let content_budget = sub_size(budget, unshared);
        let content = sanitize(match &behavior {
            Some(b) => b.measure_content(self, id, content_budget),
            None => self.measure_overlay(id, content_budget),
        });

        let mut full = unshared + max_size(shared, content);
        if let Some(preferred) = props.width.preferred {
            full.width = preferred + margin.width;
        }
        if let Some(preferred) = props.height.preferred {
            full.height = preferred + margin.height;
        }
        full.width = clamp_to_constraints(full.width, &props.width, margin.width);
        full.height = clamp_to_constraints(full.height, &props.height, margin.height);
        full = min_size(full, budget);
        if !props.flags.contains(NodeFlags::CONSUMES_SINGLE_DIMENSION)
            && (full.width <= 0.0 || full.height <= 0.0)
        {
            full = Size::ZERO;
        }

        let record = MeasureRecord {
            available,
            requested: full,
            edges,
            shared,
            content,
        };
        self.node_mut(id).full_cache.insert(record);
        Measurement {
            self_size: edges,
            full_size: full,
            shared_size: shared,
            content_size: content,
        }
    }

    /// Measure every active child within the same budget and return the largest size.
    ///
    /// This is the content measurement of nodes without a [`NodeLayout`].
    pub fn measure_overlay(&mut self, id: NodeId, available: Size) -> Size {
        self.layout_children(id)
            .into_iter()
            .fold(Size::ZERO, |acc, child| {
                max_size(acc, self.measure(child, available).requested())
            })
    }

    /// Edges of margin, padding, node-specific self size, and component reservations,
    /// plus the span shared with the content.
    fn measure_decorations(
        &mut self,
        id: NodeId,
        available: Size,
        budget: Size,
        props: &LayoutProps,
        behavior: Option<&dyn NodeLayout>,
    ) -> (Insets, Size) {
        if let Some(hit) = self.node_mut(id).self_cache.get_or_evict(available) {
            return (hit.edges, hit.shared);
        }
        let mut edges = add_insets(props.margin, props.padding);
        if let Some(b) = behavior {
            edges = add_insets(edges, b.measure_self(sub_size(budget, insets_size(edges))));
        }
        let components: SmallVec<[Component; 4]> =
            self.node(id).components.iter().cloned().collect();
        let mut shared = Size::ZERO;
        for component in components {
            let remaining = sub_size(budget, insets_size(edges));
            let measured = self.measure(component.node, remaining).requested();
            let (reserved, overlap) = component.spec.reservation(measured);
            edges = add_insets(edges, reserved);
            shared = max_size(shared, overlap);
        }
        self.node_mut(id).self_cache.insert(MeasureRecord {
            available,
            requested: insets_size(edges) + shared,
            edges,
            shared,
            content: Size::ZERO,
        });
        (edges, shared)
    }
}

/// Replace NaN and negative extents with zero. Infinite extents mean "unbounded".
fn sanitize(size: Size) -> Size {
    let axis = |v: f64| if v > 0.0 { v } else { 0.0 };
    Size::new(axis(size.width), axis(size.height))
}

/// Budget for one axis: `[0, min(preferred, max) + margin]`.
fn clamp_budget(available: f64, c: &AxisConstraints, margin: f64) -> f64 {
    let limit = match (c.preferred, c.max) {
        (Some(p), Some(m)) => Some(p.min(m)),
        (p, m) => p.or(m),
    };
    match limit {
        Some(limit) => available.min(limit + margin),
        None => available,
    }
}

fn clamp_to_constraints(value: f64, c: &AxisConstraints, margin: f64) -> f64 {
    let mut value = value;
    if let Some(min) = c.min {
        value = value.max(min + margin);
    }
    if let Some(max) = c.max {
        value = value.min(max + margin);
    }
    value
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;

    use super::*;
    use crate::behavior::{Orientation, Stack};
    use crate::component::{ComponentSpec, Edges};

    fn sized(w: f64, h: f64) -> LayoutProps {
        LayoutProps {
            width: AxisConstraints::fixed(w),
            height: AxisConstraints::fixed(h),
            ..LayoutProps::default()
        }
    }

    #[test]
    fn margin_and_preferred_size_add_up() {
        let mut tree = LayoutTree::new();
        let node = tree
            .insert_element(LayoutProps {
                margin: Insets::uniform(5.0),
                padding: Insets::uniform(2.0),
                width: AxisConstraints::fixed(50.0),
                ..LayoutProps::default()
            })
            .unwrap();
        let m = tree.measure(node, Size::new(200.0, 200.0));
        assert_eq!(m.full_size.width, 60.0, "preferred width plus horizontal margin");
        assert_eq!(m.full_size.height, 14.0, "margin and padding only");
        assert_eq!(m.self_size, Insets::uniform(7.0));
    }

    #[test]
    fn collapsed_measures_to_zero_even_with_cached_values() {
        let mut tree = LayoutTree::new();
        let node = tree.insert_element(sized(30.0, 30.0)).unwrap();
        let before = tree.measure(node, Size::new(100.0, 100.0));
        assert_eq!(before.full_size, Size::new(30.0, 30.0));
        tree.set_visibility(node, Visibility::Collapsed).unwrap();
        assert_eq!(tree.measure(node, Size::new(100.0, 100.0)), Measurement::ZERO);
    }

    #[test]
    fn full_size_never_exceeds_available() {
        let mut tree = LayoutTree::new();
        let node = tree.insert_element(sized(300.0, 300.0)).unwrap();
        let m = tree.measure(node, Size::new(100.0, 40.0));
        assert_eq!(m.full_size, Size::new(100.0, 40.0));
    }

    #[test]
    fn min_constraint_is_capped_by_available() {
        let mut tree = LayoutTree::new();
        let node = tree
            .insert_element(LayoutProps {
                width: AxisConstraints {
                    min: Some(80.0),
                    ..AxisConstraints::default()
                },
                height: AxisConstraints::fixed(10.0),
                ..LayoutProps::default()
            })
            .unwrap();
        assert_eq!(tree.measure(node, Size::new(200.0, 50.0)).full_size.width, 80.0);
        assert_eq!(tree.measure(node, Size::new(50.0, 50.0)).full_size.width, 50.0);
    }

    #[test]
    fn zero_extent_on_one_axis_zeroes_both() {
        let mut tree = LayoutTree::new();
        let sliver = tree.insert_element(sized(0.0, 16.0)).unwrap();
        assert_eq!(
            tree.measure(sliver, Size::new(100.0, 100.0)).full_size,
            Size::ZERO
        );

        let rule = tree
            .insert_element(LayoutProps {
                flags: NodeFlags::default() | NodeFlags::CONSUMES_SINGLE_DIMENSION,
                ..sized(0.0, 16.0)
            })
            .unwrap();
        assert_eq!(
            tree.measure(rule, Size::new(100.0, 100.0)).full_size,
            Size::new(0.0, 16.0)
        );
    }

    #[test]
    fn shared_component_overlaps_content() {
        let mut tree = LayoutTree::new();
        let host = tree.insert_container(LayoutProps::default()).unwrap();
        let glyph = tree.insert_element(sized(16.0, 16.0)).unwrap();
        let label = tree.insert_element(sized(40.0, 12.0)).unwrap();
        tree.add_component(host, glyph, ComponentSpec::inline(Edges::LEFT))
            .unwrap();
        tree.set_content(host, Some(label)).unwrap();

        let m = tree.measure(host, Size::new(200.0, 200.0));
        assert_eq!(m.self_size.x0, 16.0, "glyph reserves the left edge");
        assert_eq!(m.shared_size.height, 16.0);
        assert_eq!(
            m.full_size,
            Size::new(56.0, 16.0),
            "height is the max of glyph and label, not their sum"
        );
    }

    #[test]
    fn frame_component_adds_to_both_axes() {
        let mut tree = LayoutTree::new();
        let host = tree.insert_container(LayoutProps::default()).unwrap();
        let border = tree
            .insert_element(LayoutProps {
                padding: Insets::uniform(1.0),
                ..LayoutProps::default()
            })
            .unwrap();
        let label = tree.insert_element(sized(40.0, 10.0)).unwrap();
        tree.add_component(host, border, ComponentSpec::frame()).unwrap();
        tree.set_content(host, Some(label)).unwrap();
        let m = tree.measure(host, Size::new(200.0, 200.0));
        assert_eq!(m.full_size, Size::new(42.0, 12.0));
    }

    #[test]
    fn stack_sums_along_its_orientation() {
        let mut tree = LayoutTree::new();
        let panel = tree.insert_panel(LayoutProps::default()).unwrap();
        tree.set_behavior(
            panel,
            Some(Rc::new(Stack {
                orientation: Orientation::Vertical,
                spacing: 4.0,
            })),
        )
        .unwrap();
        for _ in 0..3 {
            let child = tree.insert_element(sized(20.0, 10.0)).unwrap();
            tree.add_child(panel, child).unwrap();
        }
        let m = tree.measure(panel, Size::new(100.0, 100.0));
        assert_eq!(m.content_size, Size::new(20.0, 38.0));
    }

    #[test]
    fn property_change_invalidates_cached_measurement() {
        let mut tree = LayoutTree::new();
        let panel = tree.insert_panel(LayoutProps::default()).unwrap();
        let child = tree.insert_element(sized(20.0, 20.0)).unwrap();
        tree.add_child(panel, child).unwrap();
        let first = tree.measure(panel, Size::new(100.0, 100.0));
        assert_eq!(first.full_size, Size::new(20.0, 20.0));

        tree.set_width(child, AxisConstraints::fixed(40.0)).unwrap();
        let second = tree.measure(panel, Size::new(100.0, 100.0));
        assert_eq!(
            second.full_size,
            Size::new(40.0, 20.0),
            "child change must propagate to the parent's cache"
        );
    }
}
