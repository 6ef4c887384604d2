// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, properties, and invalidation.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};
use core::time::Duration;

use hashbrown::HashMap;
use kurbo::{Insets, Point, Rect, Size, Vec2};
use smallvec::SmallVec;

use crate::behavior::NodeLayout;
use crate::cache::{DEFAULT_CAPACITY, MeasureCache};
use crate::component::{Component, ComponentSpec};
use crate::error::{LayoutError, Result};
use crate::types::{
    AxisConstraints, HorizontalAlignment, LayoutProps, NodeFlags, NodeId, NodeKind, NodeTag,
    PrimaryState, SecondaryState, VerticalAlignment, Visibility, validate_insets,
};

/// Small list of node ids, used when a traversal needs to release its borrow of the tree.
pub type NodeList = SmallVec<[NodeId; 8]>;

/// Tree-wide configuration.
#[derive(Clone, Debug)]
pub struct LayoutConfig {
    /// Entries kept in each node's measurement caches (at least one).
    pub measure_cache_capacity: usize,
    /// Hover time before a tooltip shows, unless a node overrides it.
    pub tooltip_delay: Duration,
    /// Valid desktop area in unscaled screen space; window visibility is clipped to it.
    pub desktop_bounds: Rect,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            measure_cache_capacity: DEFAULT_CAPACITY,
            tooltip_delay: Duration::from_millis(500),
            desktop_bounds: Rect::new(0.0, 0.0, 1920.0, 1080.0),
        }
    }
}

/// Rectangles computed for a node by the most recent layout and update passes.
///
/// All rectangles except `actual_visible` are in the node's layout space.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct NodeRects {
    /// Rectangle the parent gave the node.
    pub allocated: Rect,
    /// Aligned rectangle including margin.
    pub render: Rect,
    /// `render` without margin.
    pub layout: Rect,
    /// Content area before content alignment.
    pub stretched_content: Rect,
    /// Content area after content alignment.
    pub aligned_content: Rect,
    /// Visible part of `layout` after clipping by ancestors, in unscaled screen space.
    pub actual_visible: Rect,
}

impl NodeRects {
    pub(crate) fn collapsed_at(allocated: Rect) -> Self {
        let empty = Rect::from_origin_size(allocated.origin(), Size::ZERO);
        Self {
            allocated,
            render: empty,
            layout: empty,
            stretched_content: empty,
            aligned_content: empty,
            actual_visible: Rect::ZERO,
        }
    }
}

/// Result of measuring a node.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Measurement {
    /// Edge sizes of the node's own decorations: margin, padding, node-specific self
    /// size, and the unshared part of its components.
    pub self_size: Insets,
    /// Total requested size.
    pub full_size: Size,
    /// Span of components overlapping the content.
    pub shared_size: Size,
    /// Size the content asked for.
    pub content_size: Size,
}

impl Measurement {
    /// All-zero measurement.
    pub const ZERO: Self = Self {
        self_size: Insets::ZERO,
        full_size: Size::ZERO,
        shared_size: Size::ZERO,
        content_size: Size::ZERO,
    };

    /// Total requested size.
    pub fn requested(&self) -> Size {
        self.full_size
    }
}

/// Placement and scale of a window.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WindowProps {
    /// Window rectangle in unscaled screen space; also the origin of its layout space.
    pub bounds: Rect,
    /// Scale applied to the window subtree about the window's top-left corner.
    pub scale: f64,
}

impl Default for WindowProps {
    fn default() -> Self {
        Self {
            bounds: Rect::ZERO,
            scale: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct WindowState {
    pub(crate) props: WindowProps,
    pub(crate) nested: Vec<NodeId>,
    pub(crate) modal: Option<NodeId>,
    pub(crate) hovered: Option<NodeId>,
    pub(crate) pressed: Option<NodeId>,
    pub(crate) active_tooltip: Option<NodeId>,
    pub(crate) open_context_menu: Option<NodeId>,
    pub(crate) needs_layout: bool,
}

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct InteractionState {
    pub(crate) is_enabled: bool,
    pub(crate) is_selected: bool,
    pub(crate) is_hit_testable: bool,
    pub(crate) primary: PrimaryState,
    pub(crate) secondary: SecondaryState,
    pub(crate) recently_clipped_out: bool,
    pub(crate) hover_started: Option<Duration>,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    generation: u32,
    pub(crate) kind: NodeKind,
    /// Host of this node as content, child, or nested window.
    pub(crate) parent: Option<NodeId>,
    /// Host of this node as component, tooltip, or context menu.
    pub(crate) owner: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) components: Vec<Component>,
    pub(crate) tooltip: Option<NodeId>,
    pub(crate) context_menu: Option<NodeId>,
    pub(crate) props: LayoutProps,
    pub(crate) behavior: Option<Rc<dyn NodeLayout>>,
    pub(crate) content_offset: Vec2,
    pub(crate) name: Option<String>,
    pub(crate) self_cache: MeasureCache,
    pub(crate) full_cache: MeasureCache,
    pub(crate) rects: NodeRects,
    pub(crate) layout_dirty: bool,
    pub(crate) defer_depth: u32,
    pub(crate) deferred_change: bool,
    pub(crate) state: InteractionState,
    pub(crate) window: Option<Box<WindowState>>,
}

impl Node {
    fn new(generation: u32, kind: NodeKind, props: LayoutProps, cache_capacity: usize) -> Self {
        Self {
            generation,
            kind,
            parent: None,
            owner: None,
            children: Vec::new(),
            components: Vec::new(),
            tooltip: None,
            context_menu: None,
            props,
            behavior: None,
            content_offset: Vec2::ZERO,
            name: None,
            self_cache: MeasureCache::with_capacity(cache_capacity),
            full_cache: MeasureCache::with_capacity(cache_capacity),
            rects: NodeRects::default(),
            layout_dirty: true,
            defer_depth: 0,
            deferred_change: false,
            state: InteractionState::default(),
            window: None,
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.parent.is_some() || self.owner.is_some()
    }
}

/// Arena of layout nodes and the windows that host them.
///
/// Structure and properties are edited through validating methods that mark the
/// affected nodes for re-measurement. [`LayoutTree::update`] runs any pending layout,
/// resolves the hovered node, and refreshes per-node interaction state;
/// [`LayoutTree::draw`] then walks the tree in paint order.
///
/// ## Example
///
/// ```rust
/// use kurbo::{Insets, Rect};
/// use understory_layout::{
///     AxisConstraints, FrameArgs, HorizontalAlignment, LayoutProps, LayoutTree, WindowProps,
/// };
///
/// let mut tree = LayoutTree::new();
/// let window = tree
///     .insert_window(
///         None,
///         LayoutProps::default(),
///         WindowProps {
///             bounds: Rect::new(0.0, 0.0, 200.0, 200.0),
///             scale: 1.0,
///         },
///     )
///     .unwrap();
/// let button = tree
///     .insert_element(LayoutProps {
///         margin: Insets::uniform(5.0),
///         width: AxisConstraints::fixed(50.0),
///         horizontal_alignment: HorizontalAlignment::Left,
///         ..LayoutProps::default()
///     })
///     .unwrap();
/// tree.set_content(window, Some(button)).unwrap();
///
/// tree.update(&FrameArgs::default());
/// let rects = tree.rects(button).unwrap();
/// assert_eq!(rects.render.width(), 60.0);
/// assert_eq!(rects.layout.width(), 50.0);
/// ```
pub struct LayoutTree {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    /// Top-level windows, back to front.
    pub(crate) roots: Vec<NodeId>,
    pub(crate) names: HashMap<String, NodeList>,
    pub(crate) config: LayoutConfig,
    /// Nesting depth of `arrange` calls currently on the stack.
    pub(crate) layout_depth: u32,
    /// `FrameArgs::total` of the most recent update.
    pub(crate) clock: Duration,
}

impl core::fmt::Debug for LayoutTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("LayoutTree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("roots", &self.roots)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutTree {
    /// Create an empty tree with the default configuration.
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    /// Create an empty tree with a specific configuration.
    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            roots: Vec::new(),
            names: HashMap::new(),
            config,
            layout_depth: 0,
            clock: Duration::ZERO,
        }
    }

    /// Tree configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Set the valid desktop area and re-run layout of every window.
    pub fn set_desktop_bounds(&mut self, bounds: Rect) {
        self.config.desktop_bounds = bounds;
        for root in self.roots.clone() {
            self.notify_layout_changed(root, false);
        }
    }

    // --- structure ---

    fn alloc(&mut self, kind: NodeKind, props: LayoutProps) -> Result<NodeId> {
        props.validate()?;
        let capacity = self.config.measure_cache_capacity;
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, kind, props, capacity));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes
                .push(Some(Node::new(generation, kind, props, capacity)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        Ok(NodeId::new(idx, generation))
    }

    /// Insert a detached node without content.
    pub fn insert_element(&mut self, props: LayoutProps) -> Result<NodeId> {
        self.alloc(NodeKind::Element, props)
    }

    /// Insert a detached node with a single content slot.
    pub fn insert_container(&mut self, props: LayoutProps) -> Result<NodeId> {
        self.alloc(NodeKind::Container, props)
    }

    /// Insert a detached node with an ordered list of children.
    pub fn insert_panel(&mut self, props: LayoutProps) -> Result<NodeId> {
        self.alloc(NodeKind::Panel, props)
    }

    /// Insert a window.
    ///
    /// With `parent: None` the window becomes a top-level window drawn above the
    /// existing ones. Otherwise it is nested in `parent` (which must be a window),
    /// laid out at its own bounds, and drawn above the parent's content.
    pub fn insert_window(
        &mut self,
        parent: Option<NodeId>,
        props: LayoutProps,
        window: WindowProps,
    ) -> Result<NodeId> {
        validate_window(&window)?;
        if let Some(p) = parent {
            self.window_state(p)?;
        }
        let id = self.alloc(NodeKind::Window, props)?;
        self.node_mut(id).window = Some(Box::new(WindowState {
            props: window,
            needs_layout: true,
            ..WindowState::default()
        }));
        match parent {
            Some(p) => {
                self.node_mut(id).parent = Some(p);
                if let Some(ws) = self.node_mut(p).window.as_deref_mut() {
                    ws.nested.push(id);
                }
            }
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Insert a detached window for use as a tooltip or context menu.
    ///
    /// Popup windows are sized to their content and positioned when shown.
    pub fn insert_popup_window(&mut self, props: LayoutProps) -> Result<NodeId> {
        let id = self.alloc(NodeKind::Window, props)?;
        self.node_mut(id).window = Some(Box::new(WindowState {
            needs_layout: true,
            ..WindowState::default()
        }));
        Ok(id)
    }

    /// Fill (or clear, with `None`) the content slot of a container or window.
    ///
    /// Filling an occupied slot is an error; clear it first. Clearing detaches the
    /// previous content without removing it and returns it.
    pub fn set_content(&mut self, host: NodeId, content: Option<NodeId>) -> Result<Option<NodeId>> {
        let node = self.try_node(host)?;
        if !node.kind.has_content_slot() {
            return Err(LayoutError::NotAContainer(host));
        }
        let previous = node.children.first().copied();
        match content {
            Some(c) => {
                if previous.is_some() {
                    return Err(LayoutError::ContentOccupied(host));
                }
                self.check_attachable(host, c)?;
                self.node_mut(host).children.push(c);
                self.node_mut(c).parent = Some(host);
            }
            None => {
                let Some(old) = previous else {
                    return Ok(None);
                };
                self.node_mut(host).children.clear();
                self.node_mut(old).parent = None;
            }
        }
        self.notify_layout_changed(host, true);
        Ok(previous)
    }

    /// Content of a container or window.
    pub fn content_of(&self, host: NodeId) -> Option<NodeId> {
        let node = self.node_opt(host)?;
        if node.kind.has_content_slot() {
            node.children.first().copied()
        } else {
            None
        }
    }

    /// Append `child` to a panel.
    pub fn add_child(&mut self, panel: NodeId, child: NodeId) -> Result<()> {
        let len = self.try_node(panel)?.children.len();
        self.insert_child(panel, len, child)
    }

    /// Insert `child` into a panel at `index` (clamped to the child count).
    pub fn insert_child(&mut self, panel: NodeId, index: usize, child: NodeId) -> Result<()> {
        if self.try_node(panel)?.kind != NodeKind::Panel {
            return Err(LayoutError::NotAContainer(panel));
        }
        self.check_attachable(panel, child)?;
        let children = &mut self.node_mut(panel).children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.node_mut(child).parent = Some(panel);
        self.notify_layout_changed(panel, true);
        Ok(())
    }

    /// Detach `child` from a panel. Returns whether it was a child.
    pub fn remove_child(&mut self, panel: NodeId, child: NodeId) -> Result<bool> {
        let node = self.try_node(panel)?;
        if node.kind != NodeKind::Panel {
            return Err(LayoutError::NotAContainer(panel));
        }
        if !node.children.contains(&child) {
            return Ok(false);
        }
        self.node_mut(panel).children.retain(|c| *c != child);
        self.node_mut(child).parent = None;
        self.notify_layout_changed(panel, true);
        Ok(true)
    }

    /// Attach `node` as a component of `host`.
    ///
    /// Components are measured and arranged in registration order.
    pub fn add_component(&mut self, host: NodeId, node: NodeId, spec: ComponentSpec) -> Result<()> {
        self.try_node(host)?;
        self.check_attachable(host, node)?;
        self.node_mut(node).owner = Some(host);
        self.node_mut(host).components.push(Component { node, spec });
        self.notify_layout_changed(host, true);
        Ok(())
    }

    /// Set the tooltip shown after hovering `host`.
    ///
    /// The tooltip must be a detached window that is not a top-level window; `host`
    /// owns it from now on. The previous tooltip is detached and returned.
    pub fn set_tooltip(&mut self, host: NodeId, tooltip: Option<NodeId>) -> Result<Option<NodeId>> {
        self.set_popup(host, tooltip, |n| &mut n.tooltip)
    }

    /// Set the context menu owned by `host`.
    pub fn set_context_menu(&mut self, host: NodeId, menu: Option<NodeId>) -> Result<Option<NodeId>> {
        self.set_popup(host, menu, |n| &mut n.context_menu)
    }

    fn set_popup(
        &mut self,
        host: NodeId,
        popup: Option<NodeId>,
        slot: fn(&mut Node) -> &mut Option<NodeId>,
    ) -> Result<Option<NodeId>> {
        self.try_node(host)?;
        if let Some(p) = popup {
            if self.try_node(p)?.kind != NodeKind::Window {
                return Err(LayoutError::NotAWindow(p));
            }
            if self.roots.contains(&p) {
                return Err(LayoutError::AlreadyAttached(p));
            }
            self.check_attachable(host, p)?;
        }
        let previous = core::mem::replace(slot(self.node_mut(host)), popup);
        if let Some(old) = previous {
            self.node_mut(old).owner = None;
            self.hide_popup(old);
        }
        if let Some(p) = popup {
            self.node_mut(p).owner = Some(host);
        }
        Ok(previous)
    }

    fn check_attachable(&self, host: NodeId, node: NodeId) -> Result<()> {
        let n = self.try_node(node)?;
        if n.is_attached() || self.roots.contains(&node) {
            return Err(LayoutError::AlreadyAttached(node));
        }
        let mut cursor = Some(host);
        while let Some(c) = cursor {
            if c == node {
                return Err(LayoutError::CycleDetected(node));
            }
            cursor = self.ancestor(c);
        }
        Ok(())
    }

    /// Remove a node, its content, components, popups, and nested windows.
    ///
    /// Identifiers of removed nodes become stale.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.detach(id);
        self.free_subtree(id);
    }

    fn detach(&mut self, id: NodeId) {
        let (parent, owner) = {
            let n = self.node(id);
            (n.parent, n.owner)
        };
        if let Some(p) = parent {
            let host = self.node_mut(p);
            host.children.retain(|c| *c != id);
            if let Some(ws) = host.window.as_deref_mut() {
                ws.nested.retain(|c| *c != id);
                if ws.modal == Some(id) {
                    ws.modal = None;
                }
            }
            self.notify_layout_changed(p, true);
        }
        if let Some(o) = owner {
            let host = self.node_mut(o);
            host.components.retain(|c| c.node != id);
            if host.tooltip == Some(id) {
                host.tooltip = None;
            }
            if host.context_menu == Some(id) {
                host.context_menu = None;
            }
            self.hide_popup(id);
            self.notify_layout_changed(o, true);
        }
        self.roots.retain(|r| *r != id);
        let n = self.node_mut(id);
        n.parent = None;
        n.owner = None;
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = alloc::vec![id];
        while let Some(current) = stack.pop() {
            let node = self.nodes[current.idx()]
                .take()
                .expect("subtree nodes are live");
            self.free_list.push(current.idx());
            if let Some(name) = &node.name {
                self.unregister_name(name, current);
            }
            stack.extend(node.children.iter().copied());
            stack.extend(node.components.iter().map(|c| c.node));
            stack.extend(node.tooltip);
            stack.extend(node.context_menu);
            if let Some(ws) = &node.window {
                stack.extend(ws.nested.iter().copied());
            }
        }
        self.forget_pointer_targets();
    }

    /// Drop hovered/pressed/popup references to nodes that no longer exist.
    fn forget_pointer_targets(&mut self) {
        let alive: Vec<bool> = self.nodes.iter().map(Option::is_some).collect();
        let generations = self.generations.clone();
        let live = |id: &NodeId| {
            alive.get(id.idx()).copied().unwrap_or(false) && generations[id.idx()] == id.1
        };
        for node in self.nodes.iter_mut().flatten() {
            if let Some(ws) = node.window.as_deref_mut() {
                for slot in [
                    &mut ws.hovered,
                    &mut ws.pressed,
                    &mut ws.active_tooltip,
                    &mut ws.open_context_menu,
                    &mut ws.modal,
                ] {
                    if slot.as_ref().is_some_and(|id| !live(id)) {
                        *slot = None;
                    }
                }
            }
        }
    }

    // --- properties ---

    /// Replace every layout property of a node.
    pub fn set_props(&mut self, id: NodeId, props: LayoutProps) -> Result<()> {
        props.validate()?;
        self.try_node_mut(id)?.props = props;
        self.notify_layout_changed(id, true);
        Ok(())
    }

    /// Layout properties of a live node.
    pub fn props(&self, id: NodeId) -> Option<&LayoutProps> {
        self.node_opt(id).map(|n| &n.props)
    }

    /// Set the margin.
    pub fn set_margin(&mut self, id: NodeId, margin: Insets) -> Result<()> {
        validate_insets(margin, "margin must be finite and non-negative")?;
        self.update_props(id, |p| p.margin = margin)
    }

    /// Set the padding.
    pub fn set_padding(&mut self, id: NodeId, padding: Insets) -> Result<()> {
        validate_insets(padding, "padding must be finite and non-negative")?;
        self.update_props(id, |p| p.padding = padding)
    }

    /// Set the node's alignment within its allocated rectangle.
    pub fn set_alignment(
        &mut self,
        id: NodeId,
        horizontal: HorizontalAlignment,
        vertical: VerticalAlignment,
    ) -> Result<()> {
        self.update_props(id, |p| {
            p.horizontal_alignment = horizontal;
            p.vertical_alignment = vertical;
        })
    }

    /// Set the alignment of the node's content.
    pub fn set_content_alignment(
        &mut self,
        id: NodeId,
        horizontal: HorizontalAlignment,
        vertical: VerticalAlignment,
    ) -> Result<()> {
        self.update_props(id, |p| {
            p.horizontal_content_alignment = horizontal;
            p.vertical_content_alignment = vertical;
        })
    }

    /// Set width constraints.
    pub fn set_width(&mut self, id: NodeId, width: AxisConstraints) -> Result<()> {
        let mut props = self.try_node(id)?.props.clone();
        props.width = width;
        props.validate()?;
        self.update_props(id, |p| p.width = width)
    }

    /// Set height constraints.
    pub fn set_height(&mut self, id: NodeId, height: AxisConstraints) -> Result<()> {
        let mut props = self.try_node(id)?.props.clone();
        props.height = height;
        props.validate()?;
        self.update_props(id, |p| p.height = height)
    }

    /// Set visibility.
    pub fn set_visibility(&mut self, id: NodeId, visibility: Visibility) -> Result<()> {
        self.update_props(id, |p| p.visibility = visibility)
    }

    /// Set the node's flags.
    ///
    /// Only `ACTIVE` and `CONSUMES_SINGLE_DIMENSION` affect layout; other flags take
    /// effect at the next update.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) -> Result<()> {
        let node = self.try_node_mut(id)?;
        let layout_flags = NodeFlags::ACTIVE | NodeFlags::CONSUMES_SINGLE_DIMENSION;
        let relayout = (node.props.flags ^ flags).intersects(layout_flags);
        node.props.flags = flags;
        if relayout {
            self.notify_layout_changed(id, true);
        }
        Ok(())
    }

    /// Set opacity in `0..=1`.
    pub fn set_opacity(&mut self, id: NodeId, opacity: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(LayoutError::InvalidConstraint {
                axis: None,
                reason: "opacity must be within 0..=1",
            });
        }
        self.try_node_mut(id)?.props.opacity = opacity;
        Ok(())
    }

    /// Set the search tag.
    pub fn set_tag(&mut self, id: NodeId, tag: Option<NodeTag>) -> Result<()> {
        self.try_node_mut(id)?.props.tag = tag;
        Ok(())
    }

    /// Install a layout behavior.
    pub fn set_behavior(&mut self, id: NodeId, behavior: Option<Rc<dyn NodeLayout>>) -> Result<()> {
        self.try_node_mut(id)?.behavior = behavior;
        self.notify_layout_changed(id, true);
        Ok(())
    }

    /// Set the scroll origin applied to the node's content and children.
    pub fn set_content_offset(&mut self, id: NodeId, offset: Vec2) -> Result<()> {
        if !(offset.x.is_finite() && offset.y.is_finite()) {
            return Err(LayoutError::InvalidConstraint {
                axis: None,
                reason: "offset must be finite",
            });
        }
        self.try_node_mut(id)?.content_offset = offset;
        Ok(())
    }

    /// Scroll origin of the node's content.
    pub fn content_offset(&self, id: NodeId) -> Option<Vec2> {
        self.node_opt(id).map(|n| n.content_offset)
    }

    fn update_props(&mut self, id: NodeId, f: impl FnOnce(&mut LayoutProps)) -> Result<()> {
        f(&mut self.try_node_mut(id)?.props);
        self.notify_layout_changed(id, true);
        Ok(())
    }

    /// Move or resize a window.
    pub fn set_window_bounds(&mut self, window: NodeId, bounds: Rect) -> Result<()> {
        let mut props = self.window_state(window)?.props;
        props.bounds = bounds;
        validate_window(&props)?;
        self.window_state_mut(window)?.props = props;
        self.notify_layout_changed(window, false);
        Ok(())
    }

    /// Set a window's scale factor.
    pub fn set_window_scale(&mut self, window: NodeId, scale: f64) -> Result<()> {
        let mut props = self.window_state(window)?.props;
        props.scale = scale;
        validate_window(&props)?;
        self.window_state_mut(window)?.props = props;
        Ok(())
    }

    /// Placement and scale of a window.
    pub fn window_props(&self, window: NodeId) -> Option<WindowProps> {
        self.window_state(window).ok().map(|ws| ws.props)
    }

    /// Make a nested window modal (or clear the modal with `None`).
    ///
    /// While a modal is set, nothing else in `window` is hit-testable and no other
    /// node in it reports a pointer-driven state.
    pub fn set_modal(&mut self, window: NodeId, modal: Option<NodeId>) -> Result<()> {
        let ws = self.window_state(window)?;
        if let Some(m) = modal
            && !ws.nested.contains(&m)
        {
            return Err(LayoutError::InvalidModal { window, modal: m });
        }
        let ws = self.window_state_mut(window)?;
        ws.modal = modal;
        if modal.is_some() {
            ws.hovered = None;
            ws.pressed = None;
        }
        Ok(())
    }

    /// The active modal of a window.
    pub fn modal_of(&self, window: NodeId) -> Option<NodeId> {
        self.window_state(window).ok().and_then(|ws| ws.modal)
    }

    // --- names ---

    /// Give a node a name that can be looked up with [`LayoutTree::find_by_name`].
    pub fn set_name(&mut self, id: NodeId, name: Option<&str>) -> Result<()> {
        let previous = self.try_node_mut(id)?.name.take();
        if let Some(old) = previous {
            self.unregister_name(&old, id);
        }
        if let Some(name) = name {
            self.names.entry(String::from(name)).or_default().push(id);
            self.node_mut(id).name = Some(String::from(name));
        }
        Ok(())
    }

    fn unregister_name(&mut self, name: &str, id: NodeId) {
        if let Some(ids) = self.names.get_mut(name) {
            ids.retain(|n| *n != id);
            if ids.is_empty() {
                self.names.remove(name);
            }
        }
    }

    /// Find the node named `name` whose owning window is `window`.
    pub fn find_by_name(&self, window: NodeId, name: &str) -> Option<NodeId> {
        self.names
            .get(name)?
            .iter()
            .copied()
            .find(|id| self.window_of(*id) == Some(window))
    }

    // --- invalidation ---

    /// Clear both measurement caches of a node and mark it for layout.
    pub fn invalidate(&mut self, id: NodeId) {
        if let Some(n) = self.node_opt_mut(id) {
            n.self_cache.clear();
            n.full_cache.clear();
            n.layout_dirty = true;
        }
    }

    /// Report that a property affecting the layout of `source` changed.
    ///
    /// Does nothing but remember the change while a [`DeferredLayout`] scope is active on
    /// the node. Otherwise invalidates the node, schedules its window for layout on the
    /// next tick, and with `propagate_to_parent` repeats for every ancestor, since a
    /// child's size can change an ancestor's requested size.
    ///
    /// Requests raised while an arrange pass is running are never serviced
    /// synchronously; they are picked up by the next tick.
    pub fn notify_layout_changed(&mut self, source: NodeId, propagate_to_parent: bool) {
        let mut cursor = Some(source);
        while let Some(id) = cursor {
            let Some(node) = self.node_opt_mut(id) else {
                return;
            };
            if node.defer_depth > 0 {
                node.deferred_change = true;
                return;
            }
            self.invalidate(id);
            if let Some(window) = self.window_of(id)
                && let Some(ws) = self.node_mut(window).window.as_deref_mut()
            {
                ws.needs_layout = true;
                if self.layout_depth > 0 {
                    tracing::debug!(?source, ?window, "layout change during arrange; deferring to next tick");
                }
            }
            if !propagate_to_parent {
                return;
            }
            cursor = self.ancestor(id);
        }
    }

    /// Suppress layout notifications for `id` until the returned guard drops.
    ///
    /// Scopes nest. When the outermost scope ends and any notification was suppressed,
    /// a single [`LayoutTree::notify_layout_changed`] is issued for the node. The guard
    /// dereferences to the tree so construction can continue through it.
    pub fn defer_layout(&mut self, id: NodeId) -> DeferredLayout<'_> {
        if let Some(n) = self.node_opt_mut(id) {
            n.defer_depth += 1;
        }
        DeferredLayout { tree: self, node: id }
    }

    /// Whether a node is waiting for layout.
    pub fn is_layout_dirty(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some_and(|n| n.layout_dirty)
    }

    // --- queries ---

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.1)
            .unwrap_or(false)
    }

    /// Kind of a live node.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node_opt(id).map(|n| n.kind)
    }

    /// Parent of a node hosted as content, child, or nested window.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Host of a component, tooltip, or context menu.
    pub fn owner_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.owner)
    }

    /// Parent or owner, whichever holds the node.
    pub fn ancestor(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent.or(n.owner))
    }

    /// Content children of a live node, or an empty slice.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Components of a live node, in registration order.
    pub fn components_of(&self, id: NodeId) -> &[Component] {
        self.node_opt(id)
            .map(|n| n.components.as_slice())
            .unwrap_or(&[])
    }

    /// Tooltip owned by a node.
    pub fn tooltip_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.tooltip)
    }

    /// Context menu owned by a node.
    pub fn context_menu_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.context_menu)
    }

    /// Nested windows of a window, back to front.
    pub fn nested_windows_of(&self, window: NodeId) -> &[NodeId] {
        self.window_state(window)
            .map(|ws| ws.nested.as_slice())
            .unwrap_or(&[])
    }

    /// Top-level windows, back to front.
    pub fn windows(&self) -> &[NodeId] {
        &self.roots
    }

    /// The window a node belongs to: the node itself for windows, otherwise the nearest
    /// window among its ancestors.
    pub fn window_of(&self, id: NodeId) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            let node = self.node_opt(c)?;
            if node.kind == NodeKind::Window {
                return Some(c);
            }
            cursor = node.parent.or(node.owner);
        }
        None
    }

    /// Rectangles from the most recent layout and update.
    pub fn rects(&self, id: NodeId) -> Option<NodeRects> {
        self.node_opt(id).map(|n| n.rects)
    }

    /// Primary state from the most recent update.
    pub fn primary_state(&self, id: NodeId) -> Option<PrimaryState> {
        self.node_opt(id).map(|n| n.state.primary)
    }

    /// Secondary state from the most recent update.
    pub fn secondary_state(&self, id: NodeId) -> Option<SecondaryState> {
        self.node_opt(id).map(|n| n.state.secondary)
    }

    /// Whether the node was clipped out entirely during the most recent update.
    pub fn is_clipped_out(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some_and(|n| n.state.recently_clipped_out)
    }

    /// How long the pointer has been over the node, as of the most recent update.
    pub fn hover_duration(&self, id: NodeId) -> Option<Duration> {
        let started = self.node_opt(id)?.state.hover_started?;
        Some(self.clock.saturating_sub(started))
    }

    /// The hovered node of a window, as resolved by the most recent update.
    pub fn hovered(&self, window: NodeId) -> Option<NodeId> {
        self.window_state(window).ok().and_then(|ws| ws.hovered)
    }

    /// The pressed node of a window.
    pub fn pressed(&self, window: NodeId) -> Option<NodeId> {
        self.window_state(window).ok().and_then(|ws| ws.pressed)
    }

    /// The tooltip currently shown by a window.
    pub fn active_tooltip(&self, window: NodeId) -> Option<NodeId> {
        self.window_state(window).ok().and_then(|ws| ws.active_tooltip)
    }

    /// The context menu currently open in a window.
    pub fn open_context_menu(&self, window: NodeId) -> Option<NodeId> {
        self.window_state(window)
            .ok()
            .and_then(|ws| ws.open_context_menu)
    }

    /// Active, non-collapsed content children, in order.
    pub fn layout_children(&self, id: NodeId) -> NodeList {
        let Some(node) = self.node_opt(id) else {
            return NodeList::new();
        };
        node.children
            .iter()
            .copied()
            .filter(|c| {
                let child = self.node(*c);
                child.props.flags.contains(NodeFlags::ACTIVE)
                    && child.props.visibility != Visibility::Collapsed
            })
            .collect()
    }

    /// Windows drawn above a window's content, back to front: nested windows, then the
    /// open context menu, then the active tooltip.
    pub(crate) fn window_layers(&self, window: NodeId) -> NodeList {
        let mut layers = self.input_layers(window);
        if let Ok(ws) = self.window_state(window) {
            layers.extend(ws.active_tooltip);
        }
        layers
    }

    /// Layers that take pointer input: tooltips never do.
    pub(crate) fn input_layers(&self, window: NodeId) -> NodeList {
        let Ok(ws) = self.window_state(window) else {
            return NodeList::new();
        };
        let mut layers: NodeList = ws.nested.iter().copied().collect();
        layers.extend(ws.open_context_menu);
        layers
    }

    /// Every window reachable from the top-level windows, including shown popups.
    pub(crate) fn all_windows(&self) -> NodeList {
        let mut out = NodeList::new();
        let mut stack: NodeList = self.roots.iter().rev().copied().collect();
        while let Some(w) = stack.pop() {
            out.push(w);
            stack.extend(self.window_layers(w).into_iter().rev());
        }
        out
    }

    // --- popups ---

    /// Open the context menu owned by `host` at `at` (unscaled screen space).
    ///
    /// The menu is sized to its content and laid out immediately. Returns the menu, if
    /// the host has one.
    pub fn open_context_menu_at(&mut self, host: NodeId, at: Point) -> Result<Option<NodeId>> {
        let Some(menu) = self.try_node(host)?.context_menu else {
            return Ok(None);
        };
        let Some(window) = self.ancestor(menu).and_then(|h| self.window_of(h)) else {
            return Ok(None);
        };
        self.place_popup(menu, at);
        self.window_state_mut(window)?.open_context_menu = Some(menu);
        Ok(Some(menu))
    }

    /// Close whatever context menu is open in `window`.
    pub fn close_context_menu(&mut self, window: NodeId) -> Result<()> {
        self.window_state_mut(window)?.open_context_menu = None;
        Ok(())
    }

    pub(crate) fn place_popup(&mut self, popup: NodeId, at: Point) {
        let desktop = self.config.desktop_bounds;
        let size = self.measure(popup, desktop.size()).requested();
        let origin = Point::new(
            at.x.min(desktop.x1 - size.width).max(desktop.x0),
            at.y.min(desktop.y1 - size.height).max(desktop.y0),
        );
        if let Some(ws) = self.node_mut(popup).window.as_deref_mut() {
            ws.props.bounds = Rect::from_origin_size(origin, size);
            ws.needs_layout = true;
        }
        self.layout_window(popup);
    }

    fn hide_popup(&mut self, popup: NodeId) {
        for node in self.nodes.iter_mut().flatten() {
            if let Some(ws) = node.window.as_deref_mut() {
                if ws.active_tooltip == Some(popup) {
                    ws.active_tooltip = None;
                }
                if ws.open_context_menu == Some(popup) {
                    ws.open_context_menu = None;
                }
            }
        }
    }

    // --- internals ---

    /// Access a node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    pub(crate) fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn try_node(&self, id: NodeId) -> Result<&Node> {
        self.node_opt(id).ok_or(LayoutError::StaleNode(id))
    }

    fn try_node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.node_opt_mut(id).ok_or(LayoutError::StaleNode(id))
    }

    pub(crate) fn window_state(&self, id: NodeId) -> Result<&WindowState> {
        self.try_node(id)?
            .window
            .as_deref()
            .ok_or(LayoutError::NotAWindow(id))
    }

    pub(crate) fn window_state_mut(&mut self, id: NodeId) -> Result<&mut WindowState> {
        self.try_node_mut(id)?
            .window
            .as_deref_mut()
            .ok_or(LayoutError::NotAWindow(id))
    }
}

fn validate_window(props: &WindowProps) -> Result<()> {
    let r = props.bounds;
    if ![r.x0, r.y0, r.x1, r.y1].iter().all(|v| v.is_finite()) || r.width() < 0.0 || r.height() < 0.0
    {
        return Err(LayoutError::InvalidConstraint {
            axis: None,
            reason: "window bounds must be finite and non-negative",
        });
    }
    if !(props.scale.is_finite() && props.scale > 0.0) {
        return Err(LayoutError::InvalidConstraint {
            axis: None,
            reason: "window scale must be positive",
        });
    }
    Ok(())
}

/// Scope suppressing layout notifications for one node.
///
/// Created by [`LayoutTree::defer_layout`]. Dereferences to the tree. Dropping the
/// outermost scope issues one consolidated notification if any were suppressed,
/// including when the scope is left early through `?` or a panic unwind.
#[derive(Debug)]
pub struct DeferredLayout<'a> {
    tree: &'a mut LayoutTree,
    node: NodeId,
}

impl Deref for DeferredLayout<'_> {
    type Target = LayoutTree;

    fn deref(&self) -> &LayoutTree {
        self.tree
    }
}

impl DerefMut for DeferredLayout<'_> {
    fn deref_mut(&mut self) -> &mut LayoutTree {
        self.tree
    }
}

impl Drop for DeferredLayout<'_> {
    fn drop(&mut self) {
        let Some(n) = self.tree.node_opt_mut(self.node) else {
            return;
        };
        n.defer_depth = n.defer_depth.saturating_sub(1);
        if n.defer_depth == 0 && core::mem::take(&mut n.deferred_change) {
            self.tree.notify_layout_changed(self.node, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{FrameArgs, InputSnapshot};
    use crate::types::Axis;

    fn window(tree: &mut LayoutTree) -> NodeId {
        tree.insert_window(
            None,
            LayoutProps::default(),
            WindowProps {
                bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
                scale: 1.0,
            },
        )
        .unwrap()
    }

    fn sized(tree: &mut LayoutTree, w: f64, h: f64) -> NodeId {
        tree.insert_element(LayoutProps {
            width: AxisConstraints::fixed(w),
            height: AxisConstraints::fixed(h),
            horizontal_alignment: HorizontalAlignment::Left,
            vertical_alignment: VerticalAlignment::Top,
            ..LayoutProps::default()
        })
        .unwrap()
    }

    fn needs_layout(tree: &LayoutTree, window: NodeId) -> bool {
        tree.window_state(window).unwrap().needs_layout
    }

    #[test]
    fn deferred_scopes_issue_one_notification_at_the_end() {
        let mut tree = LayoutTree::new();
        let w = window(&mut tree);
        let panel = tree.insert_panel(LayoutProps::default()).unwrap();
        tree.set_content(w, Some(panel)).unwrap();
        tree.layout();
        assert!(!needs_layout(&tree, w), "clean after layout");

        {
            let mut outer = tree.defer_layout(panel);
            {
                let mut inner = outer.defer_layout(panel);
                inner.set_padding(panel, Insets::uniform(2.0)).unwrap();
                let child = inner.insert_element(LayoutProps::default()).unwrap();
                inner.add_child(panel, child).unwrap();
            }
            assert!(!outer.is_layout_dirty(panel), "inner scope end is silent");
            assert!(!needs_layout(&outer, w), "window untouched while deferred");
            outer.set_margin(panel, Insets::uniform(1.0)).unwrap();
        }
        assert!(tree.is_layout_dirty(panel), "outermost scope end notifies");
        assert!(tree.is_layout_dirty(w), "notification propagates to the window");
        assert!(needs_layout(&tree, w), "window scheduled for the next tick");
    }

    #[test]
    fn deferred_scope_without_changes_is_silent() {
        let mut tree = LayoutTree::new();
        let w = window(&mut tree);
        let node = sized(&mut tree, 10.0, 10.0);
        tree.set_content(w, Some(node)).unwrap();
        tree.layout();
        drop(tree.defer_layout(node));
        assert!(!needs_layout(&tree, w), "nothing was suppressed");
    }

    #[test]
    fn content_slot_rules() {
        let mut tree = LayoutTree::new();
        let w = window(&mut tree);
        let element = tree.insert_element(LayoutProps::default()).unwrap();
        let other = tree.insert_element(LayoutProps::default()).unwrap();

        assert_eq!(
            tree.set_content(element, Some(other)),
            Err(LayoutError::NotAContainer(element))
        );
        assert_eq!(tree.set_content(w, Some(element)), Ok(None));
        assert_eq!(
            tree.set_content(w, Some(other)),
            Err(LayoutError::ContentOccupied(w))
        );
        assert_eq!(tree.set_content(w, None), Ok(Some(element)));
        assert_eq!(tree.parent_of(element), None, "cleared content is detached");
        assert!(tree.is_alive(element), "cleared content is not removed");
        assert_eq!(tree.set_content(w, Some(other)), Ok(None));
    }

    #[test]
    fn attachment_and_cycle_checks() {
        let mut tree = LayoutTree::new();
        let outer = tree.insert_panel(LayoutProps::default()).unwrap();
        let inner = tree.insert_panel(LayoutProps::default()).unwrap();
        let leaf = tree.insert_element(LayoutProps::default()).unwrap();
        tree.add_child(outer, inner).unwrap();
        tree.add_child(inner, leaf).unwrap();

        assert_eq!(
            tree.add_child(outer, leaf),
            Err(LayoutError::AlreadyAttached(leaf))
        );
        assert_eq!(
            tree.add_child(inner, outer),
            Err(LayoutError::CycleDetected(outer))
        );
        assert_eq!(
            tree.add_child(outer, outer),
            Err(LayoutError::CycleDetected(outer))
        );
        assert_eq!(
            tree.add_child(leaf, outer),
            Err(LayoutError::NotAContainer(leaf))
        );

        assert_eq!(tree.remove_child(inner, leaf), Ok(true));
        assert_eq!(tree.remove_child(inner, leaf), Ok(false));
        tree.insert_child(outer, 0, leaf).unwrap();
        assert_eq!(tree.children_of(outer), [leaf, inner]);
    }

    #[test]
    fn setters_reject_invalid_values() {
        let mut tree = LayoutTree::new();
        let node = tree.insert_element(LayoutProps::default()).unwrap();

        let err = tree
            .set_width(
                node,
                AxisConstraints {
                    min: Some(20.0),
                    max: Some(10.0),
                    preferred: None,
                },
            )
            .unwrap_err();
        assert!(
            matches!(err, LayoutError::InvalidConstraint { axis: Some(Axis::Horizontal), .. }),
            "min above max is rejected: {err:?}"
        );
        assert!(tree.set_margin(node, Insets::uniform(-1.0)).is_err(), "negative margin");
        assert!(tree.set_padding(node, Insets::uniform(f64::NAN)).is_err(), "NaN padding");
        assert!(tree.set_opacity(node, 1.5).is_err(), "opacity above one");
        assert!(
            tree.insert_window(
                None,
                LayoutProps::default(),
                WindowProps {
                    bounds: Rect::ZERO,
                    scale: 0.0,
                },
            )
            .is_err(),
            "zero scale"
        );
        assert_eq!(tree.props(node).unwrap().margin, Insets::ZERO, "rejected writes leave props alone");
    }

    #[test]
    fn modal_must_be_a_nested_window() {
        let mut tree = LayoutTree::new();
        let w = window(&mut tree);
        let other = window(&mut tree);
        let dialog = tree
            .insert_window(Some(w), LayoutProps::default(), WindowProps::default())
            .unwrap();

        assert_eq!(
            tree.set_modal(w, Some(other)),
            Err(LayoutError::InvalidModal { window: w, modal: other })
        );
        tree.set_modal(w, Some(dialog)).unwrap();
        assert_eq!(tree.modal_of(w), Some(dialog));
        tree.remove(dialog);
        assert_eq!(tree.modal_of(w), None, "removing the modal clears it");
    }

    #[test]
    fn removed_ids_go_stale_and_release_pointer_state() {
        let mut tree = LayoutTree::new();
        let w = window(&mut tree);
        let node = sized(&mut tree, 10.0, 10.0);
        tree.set_content(w, Some(node)).unwrap();
        tree.update(&FrameArgs {
            input: InputSnapshot {
                pointer: Some(Point::new(5.0, 5.0)),
                ..InputSnapshot::default()
            },
            ..FrameArgs::default()
        });
        assert_eq!(tree.hovered(w), Some(node));

        tree.remove(node);
        assert!(!tree.is_alive(node), "removed id is stale");
        assert_eq!(tree.hovered(w), None, "hovered reference dropped");
        assert_eq!(tree.content_of(w), None);
        assert_eq!(
            tree.set_margin(node, Insets::ZERO),
            Err(LayoutError::StaleNode(node))
        );

        let reused = tree.insert_element(LayoutProps::default()).unwrap();
        assert_ne!(reused, node, "slot reuse bumps the generation");
        assert!(!tree.is_alive(node), "old id stays stale after reuse");
    }

    #[test]
    fn popups_must_be_detached_windows() {
        let mut tree = LayoutTree::new();
        let w = window(&mut tree);
        let host = sized(&mut tree, 10.0, 10.0);
        tree.set_content(w, Some(host)).unwrap();
        let element = tree.insert_element(LayoutProps::default()).unwrap();

        assert_eq!(
            tree.set_tooltip(host, Some(element)),
            Err(LayoutError::NotAWindow(element))
        );
        assert_eq!(
            tree.set_tooltip(host, Some(w)),
            Err(LayoutError::AlreadyAttached(w))
        );
        let tip = tree.insert_popup_window(LayoutProps::default()).unwrap();
        assert_eq!(tree.set_tooltip(host, Some(tip)), Ok(None));
        assert_eq!(tree.owner_of(tip), Some(host));
        assert_eq!(tree.window_of(host), Some(w));
    }

    #[test]
    fn context_menu_is_clamped_to_the_desktop() {
        let mut tree = LayoutTree::new();
        let w = window(&mut tree);
        let host = sized(&mut tree, 10.0, 10.0);
        tree.set_content(w, Some(host)).unwrap();
        let menu = tree
            .insert_popup_window(LayoutProps {
                width: AxisConstraints::fixed(40.0),
                height: AxisConstraints::fixed(20.0),
                ..LayoutProps::default()
            })
            .unwrap();
        tree.set_context_menu(host, Some(menu)).unwrap();

        assert_eq!(
            tree.open_context_menu_at(host, Point::new(1900.0, 10.0)),
            Ok(Some(menu))
        );
        assert_eq!(tree.open_context_menu(w), Some(menu));
        assert_eq!(
            tree.window_props(menu).unwrap().bounds,
            Rect::new(1880.0, 10.0, 1920.0, 30.0),
            "menu pushed back inside the desktop"
        );
        assert_eq!(
            tree.rects(menu).unwrap().layout,
            Rect::new(1880.0, 10.0, 1920.0, 30.0),
            "menu laid out when opened"
        );

        tree.close_context_menu(w).unwrap();
        assert_eq!(tree.open_context_menu(w), None);

        tree.open_context_menu_at(host, Point::ZERO).unwrap();
        tree.set_context_menu(host, None).unwrap();
        assert_eq!(tree.open_context_menu(w), None, "replacing the menu hides it");
    }
}
