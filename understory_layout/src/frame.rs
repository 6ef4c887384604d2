// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame update tick and the draw tick.
//!
//! [`LayoutTree::update`] runs pending layout, resolves the hovered and pressed node of
//! every window, then walks each window top-down recomputing visibility, interaction
//! state, and hover timing while reporting [`UpdatePhase`]s to node behaviors.
//! [`LayoutTree::draw`] is a read-only pass emitting [`DrawItem`]s in paint order.

use core::time::Duration;

use kurbo::{Affine, Rect, Vec2};
use smallvec::SmallVec;

use crate::component::DrawOrder;
use crate::context::{DrawContext, FrameArgs, InputSnapshot, UpdateContext, UpdatePhase};
use crate::geometry::{is_empty, round_up, transform_rect_bbox};
use crate::tree::{InteractionState, LayoutTree, NodeList};
use crate::types::{NodeFlags, NodeId, NodeKind, SecondaryState, Visibility};

/// Drawing backend driven by [`LayoutTree::draw`].
pub trait Renderer {
    /// Intersect the current clip with `clip` (screen space) until the matching pop.
    fn push_clip(&mut self, clip: Rect);
    /// Restore the clip active before the matching push.
    fn pop_clip(&mut self);
    /// Draw one layer of a node.
    fn draw(&mut self, item: &DrawItem);
}

/// Which part of a node a [`DrawItem`] covers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DrawLayer {
    /// Drawn before the node's components that sit behind its foreground.
    Background,
    /// The node's own visuals.
    Foreground,
}

/// One unit of drawing work.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawItem {
    /// Node being drawn.
    pub node: NodeId,
    /// Layer of the node.
    pub layer: DrawLayer,
    /// Layout rectangle in screen space, rounded outward.
    pub bounds: Rect,
    /// Inherited drawing state.
    pub cx: DrawContext,
}

/// Clip pushed for the lifetime of the scope.
struct ClipScope<'a, R: Renderer + ?Sized> {
    renderer: &'a mut R,
    pushed: bool,
}

impl<'a, R: Renderer + ?Sized> ClipScope<'a, R> {
    fn new(renderer: &'a mut R, clip: Option<Rect>) -> Self {
        let pushed = clip.is_some();
        if let Some(clip) = clip {
            renderer.push_clip(clip);
        }
        Self { renderer, pushed }
    }

    fn renderer(&mut self) -> &mut R {
        self.renderer
    }
}

impl<R: Renderer + ?Sized> Drop for ClipScope<'_, R> {
    fn drop(&mut self) {
        if self.pushed {
            self.renderer.pop_clip();
        }
    }
}

/// Pointer relationship inherited from ancestors.
#[derive(Copy, Clone, Debug)]
struct PointerChain {
    hovered: bool,
    pressed: bool,
    /// A modal outside this subtree is active.
    suppressed: bool,
}

type DrawGroup = SmallVec<[(NodeId, DrawContext, Vec2); 4]>;

impl LayoutTree {
    /// Run one update tick.
    pub fn update(&mut self, frame: &FrameArgs) {
        self.clock = frame.total;
        self.layout();
        self.resolve_pointer(&frame.input);
        for root in self.roots.clone() {
            self.update_window(root, frame, false);
        }
        self.update_tooltips(frame);
    }

    fn resolve_pointer(&mut self, input: &InputSnapshot) {
        // The first window under the pointer decides, even when a modal leaves it
        // without a hit.
        let hovered = input.pointer.and_then(|p| {
            self.roots
                .iter()
                .rev()
                .find(|root| self.window_covers(**root, p))
                .and_then(|root| self.topmost_hovered(*root, p))
        });
        for window in self.all_windows() {
            let owner = hovered.filter(|h| self.window_of(*h) == Some(window));
            let Ok(ws) = self.window_state_mut(window) else {
                continue;
            };
            if ws.hovered != owner {
                tracing::debug!(?window, from = ?ws.hovered, to = ?owner, "hovered node changed");
                ws.hovered = owner;
            }
            if input.pressed {
                ws.pressed = ws.hovered;
            }
            if input.released {
                ws.pressed = None;
            }
        }
    }

    fn update_window(&mut self, window: NodeId, frame: &FrameArgs, outer_blocked: bool) {
        let Ok(ws) = self.window_state(window) else {
            return;
        };
        let modal = ws.modal;
        if modal.is_some() && !outer_blocked {
            tracing::trace!(?window, ?modal, "modal active; pointer states suppressed");
        }
        let root = UpdateContext::root(*frame, self.config.desktop_bounds);
        let chain = PointerChain {
            hovered: false,
            pressed: false,
            suppressed: outer_blocked || modal.is_some(),
        };
        let hover_path = self.hover_path(window);
        self.update_node(window, &root, Vec2::ZERO, chain, window, &hover_path);
        for layer in self.window_layers(window) {
            let blocked = outer_blocked || modal.is_some_and(|m| m != layer);
            self.update_window(layer, frame, blocked);
        }
    }

    /// The hovered node of `window` and its ancestors up to the window.
    fn hover_path(&self, window: NodeId) -> NodeList {
        let mut path = NodeList::new();
        let mut cursor = self.hovered(window);
        while let Some(c) = cursor {
            path.push(c);
            if c == window {
                break;
            }
            cursor = self.ancestor(c);
        }
        path
    }

    fn update_node(
        &mut self,
        id: NodeId,
        parent: &UpdateContext,
        offset: Vec2,
        chain: PointerChain,
        window: NodeId,
        hover_path: &[NodeId],
    ) {
        let Some(node) = self.node_opt(id) else {
            return;
        };
        if !node.props.flags.contains(NodeFlags::ACTIVE)
            || node.props.visibility == Visibility::Collapsed
        {
            return;
        }
        let visible = if node.kind == NodeKind::Window {
            node.rects.layout.intersect(self.config.desktop_bounds)
        } else {
            (node.rects.layout + offset).intersect(parent.visible_bounds)
        };
        let cx = parent.derive(node.props.flags, offset, visible);
        let (hovered, pressed) = self
            .window_state(window)
            .map_or((None, None), |ws| (ws.hovered, ws.pressed));
        let chain = PointerChain {
            hovered: chain.hovered || hovered == Some(id),
            pressed: chain.pressed || pressed == Some(id),
            ..chain
        };
        let secondary = if chain.suppressed {
            SecondaryState::None
        } else if chain.pressed {
            SecondaryState::Pressed
        } else if chain.hovered {
            SecondaryState::Hovered
        } else {
            SecondaryState::None
        };
        let content_offset = node.content_offset;
        let behavior = node.behavior.clone();
        let components: SmallVec<[(NodeId, DrawOrder); 4]> = node
            .components
            .iter()
            .map(|c| (c.node, c.spec.draw_order))
            .collect();
        let clock = self.clock;

        let node = self.node_mut(id);
        // Hover time runs for the whole path so an ancestor's tooltip can show.
        let hover_started = ((chain.hovered || hover_path.contains(&id)) && !chain.suppressed)
            .then(|| node.state.hover_started.unwrap_or(clock));
        node.rects.actual_visible = visible;
        node.state = InteractionState {
            is_enabled: cx.is_enabled,
            is_selected: cx.is_selected,
            is_hit_testable: cx.is_hit_testable,
            primary: cx.primary_state(),
            secondary,
            recently_clipped_out: is_empty(visible),
            hover_started,
        };

        let notify = |phase: UpdatePhase| {
            if let Some(b) = &behavior {
                b.on_update(phase, id, &cx);
            }
        };
        notify(UpdatePhase::BeginUpdate);
        notify(UpdatePhase::BeginUpdateContents);
        for &(c, order) in &components {
            if order != DrawOrder::AfterContent {
                self.update_node(c, &cx, offset, chain, window, hover_path);
            }
        }
        for child in self.layout_children(id) {
            self.update_node(
                child,
                &cx,
                offset + content_offset,
                chain,
                window,
                hover_path,
            );
        }
        for &(c, order) in &components {
            if order == DrawOrder::AfterContent {
                self.update_node(c, &cx, offset, chain, window, hover_path);
            }
        }
        notify(UpdatePhase::EndUpdateContents);
        notify(UpdatePhase::UpdateSelf);
        notify(UpdatePhase::EndUpdate);
    }

    fn update_tooltips(&mut self, frame: &FrameArgs) {
        for window in self.all_windows() {
            let Ok(ws) = self.window_state(window) else {
                continue;
            };
            let current = ws.active_tooltip;
            let mut target = None;
            if let (Some(hovered), Some(pointer)) = (ws.hovered, frame.input.pointer) {
                let mut cursor = Some(hovered);
                while let Some(c) = cursor {
                    let node = self.node(c);
                    if let Some(tip) = node.tooltip {
                        let delay = node
                            .props
                            .tooltip_delay
                            .unwrap_or(self.config.tooltip_delay);
                        if self.hover_duration(c).is_some_and(|d| d >= delay) {
                            let at = self.window_scale(window).inverse() * pointer;
                            target = Some((tip, at));
                        }
                        break;
                    }
                    if c == window {
                        break;
                    }
                    cursor = self.ancestor(c);
                }
            }
            let tip = target.map(|(tip, _)| tip);
            if tip == current {
                continue;
            }
            tracing::debug!(?window, ?tip, "tooltip changed");
            if let Some((tip, at)) = target {
                self.place_popup(tip, at);
            }
            if let Ok(ws) = self.window_state_mut(window) {
                ws.active_tooltip = tip;
            }
        }
    }

    /// Run the draw tick.
    ///
    /// Reads the state computed by the most recent [`LayoutTree::update`]. Every clip
    /// pushed for a `CLIP_TO_BOUNDS` node is popped before its siblings are drawn.
    pub fn draw<R: Renderer + ?Sized>(&self, renderer: &mut R, elapsed: Duration) {
        for root in &self.roots {
            self.draw_window(renderer, *root, elapsed);
        }
    }

    fn draw_window<R: Renderer + ?Sized>(&self, renderer: &mut R, window: NodeId, elapsed: Duration) {
        let scale = self.window_scale(window);
        self.draw_group(
            renderer,
            &[(window, DrawContext::root(elapsed), Vec2::ZERO)],
            scale,
        );
        for layer in self.window_layers(window) {
            self.draw_window(renderer, layer, elapsed);
        }
    }

    fn draw_group<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        group: &[(NodeId, DrawContext, Vec2)],
        scale: Affine,
    ) {
        let mut deferred = DrawGroup::new();
        for &(id, parent, delta) in group {
            self.draw_node(renderer, id, &parent, delta, scale, &mut deferred);
        }
        if !deferred.is_empty() {
            self.draw_group(renderer, &deferred, scale);
        }
    }

    fn draw_node<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        id: NodeId,
        parent: &DrawContext,
        delta: Vec2,
        scale: Affine,
        deferred: &mut DrawGroup,
    ) {
        let Some(node) = self.node_opt(id) else {
            return;
        };
        if node.props.visibility != Visibility::Visible
            || !node.props.flags.contains(NodeFlags::ACTIVE)
            || is_empty(node.rects.layout)
        {
            return;
        }
        let cx = parent.derive(
            node.props.opacity,
            node.state.primary,
            node.state.secondary,
            delta,
        );
        let to_screen = |rect: Rect| round_up(transform_rect_bbox(scale, rect + cx.offset));
        let components = |order: DrawOrder| -> DrawGroup {
            node.components
                .iter()
                .filter(|c| c.spec.draw_order == order)
                .map(|c| (c.node, cx, Vec2::ZERO))
                .collect()
        };
        let bounds = to_screen(node.rects.layout);
        let clip = node
            .props
            .flags
            .contains(NodeFlags::CLIP_TO_BOUNDS)
            .then(|| to_screen(node.rects.render));

        {
            let mut scope = ClipScope::new(&mut *renderer, clip);
            let r = scope.renderer();
            self.draw_group(r, &components(DrawOrder::BeforeBackground), scale);
            r.draw(&DrawItem {
                node: id,
                layer: DrawLayer::Background,
                bounds,
                cx,
            });
            self.draw_group(r, &components(DrawOrder::BeforeSelf), scale);
            r.draw(&DrawItem {
                node: id,
                layer: DrawLayer::Foreground,
                bounds,
                cx,
            });
            self.draw_group(r, &components(DrawOrder::BeforeContent), scale);
            let children: DrawGroup = self
                .layout_children(id)
                .into_iter()
                .map(|c| (c, cx, node.content_offset))
                .collect();
            self.draw_group(r, &children, scale);
        }
        deferred.extend(components(DrawOrder::AfterContent));
    }
}
