// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Topmost-hovered resolution.
//!
//! Candidates are visited in paint order and the last one under the pointer wins.
//! Components drawn after their host's content are visited after the host's later
//! siblings, matching [`LayoutTree::draw`](crate::LayoutTree::draw).
//!
//! A `Hidden` node flagged `HANDLES_INPUT_WHEN_HIDDEN` can itself be hit, but its
//! children and components are skipped.

use kurbo::{Point, Rect, Vec2};
use smallvec::SmallVec;

use crate::component::DrawOrder;
use crate::geometry::intersect_nonempty;
use crate::transform::CoordinateSpace;
use crate::tree::LayoutTree;
use crate::types::{NodeFlags, NodeId, NodeKind, Visibility};

/// Traversal state inherited from the parent.
#[derive(Copy, Clone, Debug)]
struct Probe {
    /// Pointer in the unscaled screen space of the current window.
    pointer: Point,
    /// Translation from the node's layout space to unscaled screen space.
    offset: Vec2,
    /// Accumulated clip in unscaled screen space; `None` when fully clipped.
    clip: Option<Rect>,
    enabled: bool,
    hit_testable: bool,
    can_receive: bool,
    /// A modal elsewhere in the window blocks this subtree.
    blocked: bool,
}

type Group = SmallVec<[(NodeId, Probe); 4]>;

impl LayoutTree {
    /// Resolve the node under `pointer` (screen space) in a window and its layers.
    pub fn topmost_hovered(&self, window: NodeId, pointer: Point) -> Option<NodeId> {
        self.window_state(window).ok()?;
        let mut best = None;
        self.probe_window(window, pointer, self.modal_blocks(window), &mut best);
        best
    }

    /// Resolve the topmost node under `pointer` (screen space) in the subtree of `id`.
    ///
    /// The three flags are the values inherited from `id`'s parent. Returns `None`
    /// when nothing in the subtree can receive pointer input at that position, which
    /// includes every node of a window with an active modal outside that modal.
    pub fn compute_topmost_hovered(
        &self,
        id: NodeId,
        pointer: Point,
        is_parent_enabled: bool,
        is_parent_hit_testable: bool,
        can_parent_receive_mouse_input: bool,
    ) -> Option<NodeId> {
        let node = self.node_opt(id)?;
        if node.kind == NodeKind::Window {
            let mut best = None;
            self.probe_window(id, pointer, self.modal_blocks(id), &mut best);
            return best;
        }
        let window = self.window_of(id)?;
        let unscaled = self.window_scale(window).inverse() * pointer;
        let probe = Probe {
            pointer: unscaled,
            offset: self.layout_offset(id),
            clip: self.ancestor_clip(id, window),
            enabled: is_parent_enabled,
            hit_testable: is_parent_hit_testable,
            can_receive: can_parent_receive_mouse_input,
            blocked: self.modal_blocks(id),
        };
        let mut best = None;
        self.probe_group(&[(id, probe)], &mut best);
        best
    }

    /// Whether a modal in `id`'s window, or in any enclosing window, excludes `id`.
    pub(crate) fn modal_blocks(&self, id: NodeId) -> bool {
        let mut below = None;
        let mut cursor = self.window_of(id);
        while let Some(window) = cursor {
            let Ok(ws) = self.window_state(window) else {
                break;
            };
            if let Some(modal) = ws.modal
                && Some(modal) != below
            {
                return true;
            }
            below = Some(window);
            cursor = self.ancestor(window).and_then(|a| self.window_of(a));
        }
        false
    }

    pub(crate) fn window_clip(&self, window: NodeId) -> Option<Rect> {
        let bounds = self.window_state(window).ok()?.props.bounds;
        intersect_nonempty(bounds, self.config.desktop_bounds)
    }

    /// Window clip narrowed by every `CLIP_TO_BOUNDS` ancestor of `id`.
    fn ancestor_clip(&self, id: NodeId, window: NodeId) -> Option<Rect> {
        let mut clip = self.window_clip(window);
        let mut cursor = self.ancestor(id);
        while let Some(a) = cursor {
            let node = self.node(a);
            if node.props.flags.contains(NodeFlags::CLIP_TO_BOUNDS) {
                let bounds = node.rects.layout + self.layout_offset(a);
                clip = clip.and_then(|c| intersect_nonempty(c, bounds));
            }
            if a == window {
                break;
            }
            cursor = self.ancestor(a);
        }
        clip
    }

    /// Whether `window` or one of its input layers lies under `screen`.
    pub(crate) fn window_covers(&self, window: NodeId, screen: Point) -> bool {
        let unscaled = self.window_scale(window).inverse() * screen;
        self.window_clip(window).is_some_and(|c| c.contains(unscaled))
            || self
                .input_layers(window)
                .into_iter()
                .any(|layer| self.window_covers(layer, screen))
    }

    fn probe_window(&self, window: NodeId, screen: Point, blocked: bool, best: &mut Option<NodeId>) {
        let Ok(ws) = self.window_state(window) else {
            return;
        };
        let modal = ws.modal;
        let unscaled = self.window_scale(window).inverse() * screen;
        let probe = Probe {
            pointer: unscaled,
            offset: Vec2::ZERO,
            clip: self.window_clip(window),
            enabled: true,
            hit_testable: true,
            can_receive: true,
            blocked: blocked || modal.is_some(),
        };
        self.probe_group(&[(window, probe)], best);
        for layer in self.input_layers(window) {
            let layer_blocked = blocked || modal.is_some_and(|m| m != layer);
            self.probe_window(layer, screen, layer_blocked, best);
        }
    }

    /// Visit siblings in order, then the after-content components they deferred.
    fn probe_group(&self, group: &[(NodeId, Probe)], best: &mut Option<NodeId>) {
        let mut deferred = Group::new();
        for &(id, probe) in group {
            self.probe_node(id, probe, best, &mut deferred);
        }
        if !deferred.is_empty() {
            self.probe_group(&deferred, best);
        }
    }

    fn probe_node(&self, id: NodeId, probe: Probe, best: &mut Option<NodeId>, deferred: &mut Group) {
        let Some(node) = self.node_opt(id) else {
            return;
        };
        let props = &node.props;
        if !props.flags.contains(NodeFlags::ACTIVE) {
            return;
        }
        let visible_ok = match props.visibility {
            Visibility::Visible => true,
            Visibility::Hidden => props.flags.contains(NodeFlags::HANDLES_INPUT_WHEN_HIDDEN),
            Visibility::Collapsed => false,
        };
        if !visible_ok {
            return;
        }
        let enabled = probe.enabled && props.flags.contains(NodeFlags::ENABLED);
        let hit_testable = probe.hit_testable && props.flags.contains(NodeFlags::HIT_TESTABLE);
        let can_receive =
            enabled && hit_testable && !node.state.recently_clipped_out && probe.can_receive;

        let bounds = node.rects.layout + probe.offset;
        let inside = bounds.contains(probe.pointer)
            && probe.clip.is_some_and(|c| c.contains(probe.pointer));
        let hit = can_receive && !probe.blocked && inside;

        // A hidden node that still handles input is a candidate itself, but nothing
        // beneath it is.
        if props.visibility == Visibility::Hidden {
            if hit {
                *best = Some(id);
            }
            return;
        }

        let clip = if props.flags.contains(NodeFlags::CLIP_TO_BOUNDS) {
            probe.clip.and_then(|c| intersect_nonempty(c, bounds))
        } else {
            probe.clip
        };
        let inherited = Probe {
            clip,
            enabled,
            hit_testable,
            can_receive,
            ..probe
        };
        let components = |order: DrawOrder| -> Group {
            node.components
                .iter()
                .filter(|c| c.spec.draw_order == order)
                .map(|c| (c.node, inherited))
                .collect()
        };

        self.probe_group(&components(DrawOrder::BeforeBackground), best);
        self.probe_group(&components(DrawOrder::BeforeSelf), best);

        if hit {
            *best = Some(id);
        }

        self.probe_group(&components(DrawOrder::BeforeContent), best);
        let children = Probe {
            offset: probe.offset + node.content_offset,
            ..inherited
        };
        let group: Group = self
            .layout_children(id)
            .into_iter()
            .map(|c| (c, children))
            .collect();
        self.probe_group(&group, best);
        deferred.extend(components(DrawOrder::AfterContent));
    }

    /// Pointer position in a node's layout space, or `None` for a stale id.
    pub fn pointer_in_layout(&self, id: NodeId, pointer: Point) -> Option<Point> {
        self.transform_point(id, pointer, CoordinateSpace::Screen, CoordinateSpace::Layout)
    }
}
