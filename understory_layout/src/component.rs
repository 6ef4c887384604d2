// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Components: decoration nodes owned by a host node.
//!
//! A component (a border, an arrow glyph, a checkbox box) is measured and arranged
//! together with its host, but it is addressed separately from the host's content.
//! Each component declares which edges of the host it reserves space on, whether
//! it shares an axis with the content instead of stacking beside it, and how it is
//! placed within the space the host has left.

use kurbo::{Insets, Rect, Size};

use crate::geometry::apply_alignment;
use crate::types::{HorizontalAlignment, NodeId, VerticalAlignment};

bitflags::bitflags! {
    /// Edges of the host on which a component reserves space.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Edges: u8 {
        /// Left edge.
        const LEFT = 0b0001;
        /// Top edge.
        const TOP = 0b0010;
        /// Right edge.
        const RIGHT = 0b0100;
        /// Bottom edge.
        const BOTTOM = 0b1000;
    }
}

/// When a component is drawn (and, mirrored, hit-tested) relative to its host.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DrawOrder {
    /// Before the host's background.
    BeforeBackground,
    /// After the background, before the host's own foreground.
    BeforeSelf,
    /// After the host's foreground, before its content.
    #[default]
    BeforeContent,
    /// After the host's content.
    AfterContent,
}

/// Signature of a custom placement callback: `(available, measured) -> bounds`.
pub type PlaceFn = fn(Rect, Size) -> Rect;

/// How a component is placed within the bounds its host makes available.
#[derive(Copy, Clone, Debug, Default)]
pub enum ComponentPlacement {
    /// Dock against the reserved edges: a component reserving only `LEFT` becomes
    /// a strip of its measured width on the left; reserving both or neither edge of
    /// an axis spans that axis fully.
    #[default]
    Dock,
    /// Align the measured size within the available bounds.
    Align(HorizontalAlignment, VerticalAlignment),
    /// Custom callback.
    Custom(PlaceFn),
}

impl ComponentPlacement {
    /// Resolve bounds for a component reserving `edges`.
    pub fn place(&self, available: Rect, measured: Size, edges: Edges) -> Rect {
        match *self {
            Self::Dock => {
                let h = if edges.contains(Edges::LEFT) == edges.contains(Edges::RIGHT) {
                    HorizontalAlignment::Stretch
                } else if edges.contains(Edges::LEFT) {
                    HorizontalAlignment::Left
                } else {
                    HorizontalAlignment::Right
                };
                let v = if edges.contains(Edges::TOP) == edges.contains(Edges::BOTTOM) {
                    VerticalAlignment::Stretch
                } else if edges.contains(Edges::TOP) {
                    VerticalAlignment::Top
                } else {
                    VerticalAlignment::Bottom
                };
                apply_alignment(available, h, v, measured)
            }
            Self::Align(h, v) => apply_alignment(available, h, v, measured),
            Self::Custom(place) => place(available, measured),
        }
    }
}

/// Registration of a component on its host.
#[derive(Clone, Debug)]
pub struct ComponentSpec {
    /// Width overlaps the content's width instead of adding to it.
    pub shares_width: bool,
    /// Height overlaps the content's height instead of adding to it.
    pub shares_height: bool,
    /// Edges on which the component reserves space. Empty means it overlays.
    pub consumes: Edges,
    /// Placed inside the host's padding rather than outside it.
    pub uses_owners_padding: bool,
    /// Draw and hit-test position relative to the host.
    pub draw_order: DrawOrder,
    /// Placement within the available bounds.
    pub placement: ComponentPlacement,
}

impl Default for ComponentSpec {
    fn default() -> Self {
        Self {
            shares_width: false,
            shares_height: false,
            consumes: Edges::empty(),
            uses_owners_padding: false,
            draw_order: DrawOrder::BeforeContent,
            placement: ComponentPlacement::Dock,
        }
    }
}

impl ComponentSpec {
    /// A frame reserving all four edges (for example a border), drawn behind the host.
    pub fn frame() -> Self {
        Self {
            consumes: Edges::all(),
            draw_order: DrawOrder::BeforeSelf,
            ..Self::default()
        }
    }

    /// An inline glyph beside the content on `edge`, sharing the other axis.
    pub fn inline(edge: Edges) -> Self {
        let horizontal = edge.intersects(Edges::LEFT | Edges::RIGHT);
        Self {
            shares_width: !horizontal,
            shares_height: horizontal,
            consumes: edge,
            uses_owners_padding: true,
            ..Self::default()
        }
    }

    /// An overlay that takes no space.
    pub fn overlay(h: HorizontalAlignment, v: VerticalAlignment) -> Self {
        Self {
            draw_order: DrawOrder::AfterContent,
            placement: ComponentPlacement::Align(h, v),
            ..Self::default()
        }
    }

    /// Whether the component reserves space on any edge.
    pub fn consumes_any_space(&self) -> bool {
        !self.consumes.is_empty()
    }

    /// Split a measured size into reserved edges and a shared span.
    ///
    /// A shared axis contributes only to the shared span. Otherwise the extent goes to
    /// the reserved edge of that axis, split evenly when both edges are reserved. Axes
    /// without a reserved edge contribute nothing.
    pub fn reservation(&self, measured: Size) -> (Insets, Size) {
        let mut edges = Insets::ZERO;
        let mut shared = Size::ZERO;
        if self.shares_width {
            shared.width = measured.width;
        } else {
            match (
                self.consumes.contains(Edges::LEFT),
                self.consumes.contains(Edges::RIGHT),
            ) {
                (true, true) => {
                    edges.x0 = measured.width / 2.0;
                    edges.x1 = measured.width / 2.0;
                }
                (true, false) => edges.x0 = measured.width,
                (false, true) => edges.x1 = measured.width,
                (false, false) => {}
            }
        }
        if self.shares_height {
            shared.height = measured.height;
        } else {
            match (
                self.consumes.contains(Edges::TOP),
                self.consumes.contains(Edges::BOTTOM),
            ) {
                (true, true) => {
                    edges.y0 = measured.height / 2.0;
                    edges.y1 = measured.height / 2.0;
                }
                (true, false) => edges.y0 = measured.height,
                (false, true) => edges.y1 = measured.height,
                (false, false) => {}
            }
        }
        (edges, shared)
    }
}

/// A component attached to a host node.
#[derive(Clone, Debug)]
pub struct Component {
    /// The component's own node.
    pub node: NodeId,
    /// How it participates in the host's layout.
    pub spec: ComponentSpec,
}
