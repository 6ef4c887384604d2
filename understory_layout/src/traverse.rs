// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual-tree walks and searches.

use alloc::vec::Vec;
use core::fmt;

use crate::tree::{LayoutTree, NodeList};
use crate::types::{NodeId, NodeKind, NodeTag};

bitflags::bitflags! {
    /// Which edges of the visual tree a walk follows.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct VisualChildren: u8 {
        /// Content and panel children.
        const CHILDREN = 0b0000_0001;
        /// Components.
        const COMPONENTS = 0b0000_0010;
        /// Tooltips owned by a node.
        const TOOLTIPS = 0b0000_0100;
        /// Context menus owned by a node.
        const CONTEXT_MENUS = 0b0000_1000;
        /// Nested windows of a window.
        const WINDOWS = 0b0001_0000;
    }
}

impl Default for VisualChildren {
    fn default() -> Self {
        Self::CHILDREN | Self::COMPONENTS
    }
}

/// Visiting order of a walk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Order {
    /// A node before its visual children.
    #[default]
    PreOrder,
    /// A node after its visual children.
    PostOrder,
}

/// Depth-first iterator returned by [`LayoutTree::walk`].
#[derive(Debug)]
pub struct Walk<'a> {
    tree: &'a LayoutTree,
    order: Order,
    which: VisualChildren,
    /// Pending nodes; the flag marks nodes whose children were already pushed.
    stack: Vec<(NodeId, bool)>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some((id, expanded)) = self.stack.pop() {
            if !self.tree.is_alive(id) {
                continue;
            }
            match self.order {
                Order::PreOrder => {
                    let children = self.tree.visual_children(id, self.which);
                    self.stack
                        .extend(children.into_iter().rev().map(|c| (c, false)));
                    return Some(id);
                }
                Order::PostOrder if expanded => return Some(id),
                Order::PostOrder => {
                    self.stack.push((id, true));
                    let children = self.tree.visual_children(id, self.which);
                    self.stack
                        .extend(children.into_iter().rev().map(|c| (c, false)));
                }
            }
        }
        None
    }
}

/// Criteria for [`LayoutTree::find_all`] and [`LayoutTree::find_first`].
///
/// Every criterion that is set must match.
#[derive(Default)]
pub struct NodeFilter<'a> {
    /// Required node kind.
    pub kind: Option<NodeKind>,
    /// Required tag.
    pub tag: Option<NodeTag>,
    /// Arbitrary predicate.
    pub predicate: Option<&'a dyn Fn(&LayoutTree, NodeId) -> bool>,
}

impl fmt::Debug for NodeFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeFilter")
            .field("kind", &self.kind)
            .field("tag", &self.tag)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl<'a> NodeFilter<'a> {
    /// Filter matching nodes of `kind`.
    pub fn kind(kind: NodeKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Filter matching nodes tagged `tag`.
    pub fn tag(tag: NodeTag) -> Self {
        Self {
            tag: Some(tag),
            ..Self::default()
        }
    }

    /// Filter matching nodes accepted by `predicate`.
    pub fn predicate(predicate: &'a dyn Fn(&LayoutTree, NodeId) -> bool) -> Self {
        Self {
            predicate: Some(predicate),
            ..Self::default()
        }
    }

    /// Whether `id` satisfies every criterion.
    pub fn matches(&self, tree: &LayoutTree, id: NodeId) -> bool {
        if let Some(kind) = self.kind
            && tree.kind(id) != Some(kind)
        {
            return false;
        }
        if let Some(tag) = self.tag
            && tree.props(id).and_then(|p| p.tag) != Some(tag)
        {
            return false;
        }
        self.predicate.is_none_or(|p| p(tree, id))
    }
}

impl LayoutTree {
    /// Visual children of a node in visiting order: components, children, tooltip,
    /// context menu, nested windows.
    pub fn visual_children(&self, id: NodeId, which: VisualChildren) -> NodeList {
        let mut out = NodeList::new();
        let Some(node) = self.node_opt(id) else {
            return out;
        };
        if which.contains(VisualChildren::COMPONENTS) {
            out.extend(node.components.iter().map(|c| c.node));
        }
        if which.contains(VisualChildren::CHILDREN) {
            out.extend(node.children.iter().copied());
        }
        if which.contains(VisualChildren::TOOLTIPS) {
            out.extend(node.tooltip);
        }
        if which.contains(VisualChildren::CONTEXT_MENUS) {
            out.extend(node.context_menu);
        }
        if which.contains(VisualChildren::WINDOWS)
            && let Some(ws) = node.window.as_deref()
        {
            out.extend(ws.nested.iter().copied());
        }
        out
    }

    /// Depth-first walk of the visual tree rooted at `root`.
    pub fn walk(&self, root: NodeId, order: Order, which: VisualChildren) -> Walk<'_> {
        Walk {
            tree: self,
            order,
            which,
            stack: alloc::vec![(root, false)],
        }
    }

    /// Every node under `root` (inclusive) matching `filter`, in pre-order over all
    /// visual children.
    pub fn find_all(&self, root: NodeId, filter: &NodeFilter<'_>) -> Vec<NodeId> {
        self.walk(root, Order::PreOrder, VisualChildren::all())
            .filter(|id| filter.matches(self, *id))
            .collect()
    }

    /// The first node under `root` (inclusive) matching `filter`, in pre-order.
    pub fn find_first(&self, root: NodeId, filter: &NodeFilter<'_>) -> Option<NodeId> {
        self.walk(root, Order::PreOrder, VisualChildren::all())
            .find(|id| filter.matches(self, *id))
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::component::ComponentSpec;
    use crate::tree::WindowProps;
    use crate::types::LayoutProps;

    struct Fixture {
        tree: LayoutTree,
        window: NodeId,
        panel: NodeId,
        border: NodeId,
        a: NodeId,
        b: NodeId,
        dialog: NodeId,
    }

    fn fixture() -> Fixture {
        let mut tree = LayoutTree::new();
        let window = tree
            .insert_window(
                None,
                LayoutProps::default(),
                WindowProps {
                    bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
                    scale: 1.0,
                },
            )
            .unwrap();
        let panel = tree.insert_panel(LayoutProps::default()).unwrap();
        let border = tree.insert_element(LayoutProps::default()).unwrap();
        let a = tree
            .insert_element(LayoutProps {
                tag: Some(NodeTag(7)),
                ..LayoutProps::default()
            })
            .unwrap();
        let b = tree.insert_element(LayoutProps::default()).unwrap();
        tree.set_content(window, Some(panel)).unwrap();
        tree.add_component(panel, border, ComponentSpec::frame())
            .unwrap();
        tree.add_child(panel, a).unwrap();
        tree.add_child(panel, b).unwrap();
        let dialog = tree
            .insert_window(Some(window), LayoutProps::default(), WindowProps::default())
            .unwrap();
        Fixture {
            tree,
            window,
            panel,
            border,
            a,
            b,
            dialog,
        }
    }

    #[test]
    fn pre_order_visits_components_before_children() {
        let f = fixture();
        let order: Vec<_> = f
            .tree
            .walk(f.window, Order::PreOrder, VisualChildren::default())
            .collect();
        assert_eq!(order, [f.window, f.panel, f.border, f.a, f.b]);
    }

    #[test]
    fn post_order_visits_children_first() {
        let f = fixture();
        let order: Vec<_> = f
            .tree
            .walk(f.window, Order::PostOrder, VisualChildren::all())
            .collect();
        assert_eq!(order, [f.border, f.a, f.b, f.panel, f.dialog, f.window]);
    }

    #[test]
    fn walk_respects_selected_edges() {
        let f = fixture();
        let order: Vec<_> = f
            .tree
            .walk(f.window, Order::PreOrder, VisualChildren::CHILDREN)
            .collect();
        assert_eq!(order, [f.window, f.panel, f.a, f.b], "no components or windows");
    }

    #[test]
    fn find_by_kind_tag_and_predicate() {
        let f = fixture();
        assert_eq!(
            f.tree.find_all(f.window, &NodeFilter::kind(NodeKind::Window)),
            [f.window, f.dialog]
        );
        assert_eq!(f.tree.find_first(f.window, &NodeFilter::tag(NodeTag(7))), Some(f.a));
        let is_b = |_: &LayoutTree, id: NodeId| id == f.b;
        let filter = NodeFilter {
            kind: Some(NodeKind::Element),
            ..NodeFilter::predicate(&is_b)
        };
        assert_eq!(f.tree.find_all(f.window, &filter), [f.b]);
    }

    #[test]
    fn tooltips_are_reachable_when_requested() {
        let mut f = fixture();
        let tip = f.tree.insert_popup_window(LayoutProps::default()).unwrap();
        f.tree.set_tooltip(f.a, Some(tip)).unwrap();
        let with: Vec<_> = f
            .tree
            .walk(f.a, Order::PreOrder, VisualChildren::TOOLTIPS)
            .collect();
        assert_eq!(with, [f.a, tip]);
        let without: Vec<_> = f
            .tree
            .walk(f.a, Order::PreOrder, VisualChildren::CHILDREN)
            .collect();
        assert_eq!(without, [f.a]);
    }

    #[test]
    fn name_lookup_is_scoped_to_the_window() {
        let mut f = fixture();
        f.tree.set_name(f.a, Some("ok")).unwrap();
        f.tree.set_name(f.dialog, Some("ok")).unwrap();
        assert_eq!(f.tree.find_by_name(f.window, "ok"), Some(f.a));
        assert_eq!(f.tree.find_by_name(f.dialog, "ok"), Some(f.dialog));
        f.tree.remove(f.a);
        assert_eq!(f.tree.find_by_name(f.window, "ok"), None, "removal unregisters names");
    }
}
