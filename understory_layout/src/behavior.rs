// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node layout capabilities.
//!
//! Concrete widgets customize layout through [`NodeLayout`]. Every method has a default,
//! so a node without a behavior measures its own decorations only and lays its active
//! children on top of each other within its content area.

use core::fmt::Debug;

use kurbo::{Insets, Rect, Size};

use crate::context::{UpdateContext, UpdatePhase};
use crate::tree::LayoutTree;
use crate::types::NodeId;

/// Capability hooks a node can override.
///
/// Hooks receive the tree mutably so content layouts can measure and arrange children
/// through [`LayoutTree::measure`] and [`LayoutTree::arrange`].
pub trait NodeLayout: Debug {
    /// Node-specific self size (an icon, a glyph), excluding margin, padding, and
    /// components.
    fn measure_self(&self, _available: Size) -> Insets {
        Insets::ZERO
    }

    /// Measure the node's content within `available`.
    fn measure_content(&self, tree: &mut LayoutTree, node: NodeId, available: Size) -> Size {
        tree.measure_overlay(node, available)
    }

    /// Arrange the node's content within `bounds`.
    fn arrange_content(&self, tree: &mut LayoutTree, node: NodeId, bounds: Rect) {
        tree.arrange_overlay(node, bounds);
    }

    /// Called for each phase of the update tick.
    fn on_update(&self, _phase: UpdatePhase, _node: NodeId, _cx: &UpdateContext) {}
}

/// Direction of a [`Stack`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Children are placed left to right.
    Horizontal,
    /// Children are placed top to bottom.
    #[default]
    Vertical,
}

/// Content layout placing active children one after another.
#[derive(Clone, Debug, Default)]
pub struct Stack {
    /// Stacking direction.
    pub orientation: Orientation,
    /// Gap between consecutive children.
    pub spacing: f64,
}

impl NodeLayout for Stack {
    fn measure_content(&self, tree: &mut LayoutTree, node: NodeId, available: Size) -> Size {
        let mut total = Size::ZERO;
        let mut count = 0_u32;
        for child in tree.layout_children(node) {
            let remaining = match self.orientation {
                Orientation::Horizontal => {
                    Size::new((available.width - total.width).max(0.0), available.height)
                }
                Orientation::Vertical => {
                    Size::new(available.width, (available.height - total.height).max(0.0))
                }
            };
            let size = tree.measure(child, remaining).requested();
            let gap = if count > 0 { self.spacing } else { 0.0 };
            match self.orientation {
                Orientation::Horizontal => {
                    total.width += gap + size.width;
                    total.height = total.height.max(size.height);
                }
                Orientation::Vertical => {
                    total.height += gap + size.height;
                    total.width = total.width.max(size.width);
                }
            }
            count += 1;
        }
        total
    }

    fn arrange_content(&self, tree: &mut LayoutTree, node: NodeId, bounds: Rect) {
        let mut cursor = match self.orientation {
            Orientation::Horizontal => bounds.x0,
            Orientation::Vertical => bounds.y0,
        };
        for child in tree.layout_children(node) {
            let slot = match self.orientation {
                Orientation::Horizontal => {
                    let available = Size::new((bounds.x1 - cursor).max(0.0), bounds.height());
                    let width = tree.measure(child, available).requested().width;
                    Rect::new(cursor, bounds.y0, cursor + width, bounds.y1)
                }
                Orientation::Vertical => {
                    let available = Size::new(bounds.width(), (bounds.y1 - cursor).max(0.0));
                    let height = tree.measure(child, available).requested().height;
                    Rect::new(bounds.x0, cursor, bounds.x1, cursor + height)
                }
            };
            tree.arrange(child, slot);
            cursor = match self.orientation {
                Orientation::Horizontal => slot.x1 + self.spacing,
                Orientation::Vertical => slot.y1 + self.spacing,
            };
        }
    }
}
