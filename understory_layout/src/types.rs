// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the layout tree: node identifiers, alignment, visibility, flags,
//! and the per-node layout properties.

use core::time::Duration;

use kurbo::Insets;

use crate::error::LayoutError;

/// Identifier for a node in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Horizontal placement of a box within the space it was given.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HorizontalAlignment {
    /// Place at the left edge.
    Left,
    /// Center within the available width.
    Center,
    /// Place at the right edge.
    Right,
    /// Fill the available width.
    #[default]
    Stretch,
}

/// Vertical placement of a box within the space it was given.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalAlignment {
    /// Place at the top edge.
    Top,
    /// Center within the available height.
    Center,
    /// Place at the bottom edge.
    Bottom,
    /// Fill the available height.
    #[default]
    Stretch,
}

/// Visibility of a node.
///
/// `Hidden` nodes still occupy space but are neither drawn nor (by default) hit-tested.
/// `Collapsed` nodes measure to zero and are skipped entirely.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Measured, arranged, drawn and hit-tested.
    #[default]
    Visible,
    /// Measured and arranged, but not drawn.
    Hidden,
    /// Takes no space.
    Collapsed,
}

/// Structural kind of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A node without content.
    Element,
    /// A node with at most one content child.
    Container,
    /// A node with an ordered list of children.
    Panel,
    /// A window: a container with its own position, scale, and input state.
    Window,
}

impl NodeKind {
    /// Whether nodes of this kind host a single content slot.
    pub const fn has_content_slot(self) -> bool {
        matches!(self, Self::Container | Self::Window)
    }
}

/// Symbol-like tag used to find nodes without runtime type inspection.
///
/// The host owns the meaning of individual tags (for example one per widget type).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeTag(pub u64);

/// One of the two layout axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x axis.
    Horizontal,
    /// The y axis.
    Vertical,
}

bitflags::bitflags! {
    /// Per-node interaction and layout flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node accepts interaction. Inherited with AND.
        const ENABLED = 0b0000_0001;
        /// Node is selected. Inherited with OR.
        const SELECTED = 0b0000_0010;
        /// Node participates in hit testing. Inherited with AND.
        const HIT_TESTABLE = 0b0000_0100;
        /// Node is active within its parent; inactive children (an unselected tab page,
        /// say) are skipped by layout, update, draw, and hit testing.
        const ACTIVE = 0b0000_1000;
        /// Drawing of the node and its descendants is clipped to its render rectangle.
        const CLIP_TO_BOUNDS = 0b0001_0000;
        /// A `Hidden` node with this flag can still receive pointer input.
        const HANDLES_INPUT_WHEN_HIDDEN = 0b0010_0000;
        /// A node that may keep a size with one zero dimension (a rule, a spacer).
        const CONSUMES_SINGLE_DIMENSION = 0b0100_0000;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::ENABLED | Self::HIT_TESTABLE | Self::ACTIVE
    }
}

/// Optional size constraints along one axis. Values exclude margin.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AxisConstraints {
    /// Smallest extent the node may be given.
    pub min: Option<f64>,
    /// Largest extent the node may be given.
    pub max: Option<f64>,
    /// Extent the node requests regardless of its content.
    pub preferred: Option<f64>,
}

impl AxisConstraints {
    /// Constraints fixing the extent to `value`.
    pub const fn fixed(value: f64) -> Self {
        Self {
            min: None,
            max: None,
            preferred: Some(value),
        }
    }

    fn validate(&self, axis: Axis) -> Result<(), LayoutError> {
        for value in [self.min, self.max, self.preferred].into_iter().flatten() {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidConstraint {
                    axis: Some(axis),
                    reason: "sizes must be finite and non-negative",
                });
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(LayoutError::InvalidConstraint {
                axis: Some(axis),
                reason: "min exceeds max",
            });
        }
        Ok(())
    }
}

/// Local layout data for a node.
#[derive(Clone, Debug)]
pub struct LayoutProps {
    /// Space reserved outside the node's layout rectangle.
    pub margin: Insets,
    /// Space reserved between the layout rectangle and the content.
    pub padding: Insets,
    /// Placement of the node within its allocated rectangle.
    pub horizontal_alignment: HorizontalAlignment,
    /// Placement of the node within its allocated rectangle.
    pub vertical_alignment: VerticalAlignment,
    /// Placement of the content within the node's content area.
    pub horizontal_content_alignment: HorizontalAlignment,
    /// Placement of the content within the node's content area.
    pub vertical_content_alignment: VerticalAlignment,
    /// Width constraints.
    pub width: AxisConstraints,
    /// Height constraints.
    pub height: AxisConstraints,
    /// Visibility.
    pub visibility: Visibility,
    /// Interaction and layout flags.
    pub flags: NodeFlags,
    /// Opacity in `0..=1`, multiplied down the tree while drawing.
    pub opacity: f64,
    /// Optional tag used by tree searches.
    pub tag: Option<NodeTag>,
    /// Hover time before the node's tooltip shows. `None` uses the tree default.
    pub tooltip_delay: Option<Duration>,
}

impl Default for LayoutProps {
    fn default() -> Self {
        Self {
            margin: Insets::ZERO,
            padding: Insets::ZERO,
            horizontal_alignment: HorizontalAlignment::Stretch,
            vertical_alignment: VerticalAlignment::Stretch,
            horizontal_content_alignment: HorizontalAlignment::Stretch,
            vertical_content_alignment: VerticalAlignment::Stretch,
            width: AxisConstraints::default(),
            height: AxisConstraints::default(),
            visibility: Visibility::Visible,
            flags: NodeFlags::default(),
            opacity: 1.0,
            tag: None,
            tooltip_delay: None,
        }
    }
}

impl LayoutProps {
    /// Check the properties for values that would make layout undefined.
    pub fn validate(&self) -> Result<(), LayoutError> {
        validate_insets(self.margin, "margin must be finite and non-negative")?;
        validate_insets(self.padding, "padding must be finite and non-negative")?;
        self.width.validate(Axis::Horizontal)?;
        self.height.validate(Axis::Vertical)?;
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(LayoutError::InvalidConstraint {
                axis: None,
                reason: "opacity must be within 0..=1",
            });
        }
        Ok(())
    }

    /// Constraints along `axis`.
    pub fn constraints(&self, axis: Axis) -> &AxisConstraints {
        match axis {
            Axis::Horizontal => &self.width,
            Axis::Vertical => &self.height,
        }
    }
}

pub(crate) fn validate_insets(insets: Insets, reason: &'static str) -> Result<(), LayoutError> {
    let values = [insets.x0, insets.y0, insets.x1, insets.y1];
    if values.iter().all(|v| v.is_finite() && *v >= 0.0) {
        Ok(())
    } else {
        Err(LayoutError::InvalidConstraint { axis: None, reason })
    }
}

/// Primary visual state of a node, recomputed every update tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PrimaryState {
    /// Enabled and not selected.
    #[default]
    Normal,
    /// Enabled and selected.
    Selected,
    /// Not enabled (itself or through an ancestor).
    Disabled,
}

/// Secondary (pointer-driven) visual state of a node, recomputed every update tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SecondaryState {
    /// Not under the pointer.
    #[default]
    None,
    /// The node or an ancestor is the window's hovered node.
    Hovered,
    /// The node or an ancestor is the window's pressed node.
    Pressed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags_are_interactive() {
        let flags = NodeFlags::default();
        assert!(flags.contains(NodeFlags::ENABLED | NodeFlags::HIT_TESTABLE | NodeFlags::ACTIVE));
        assert!(!flags.contains(NodeFlags::SELECTED));
    }

    #[test]
    fn min_above_max_is_rejected() {
        let props = LayoutProps {
            width: AxisConstraints {
                min: Some(20.0),
                max: Some(10.0),
                preferred: None,
            },
            ..LayoutProps::default()
        };
        assert!(matches!(
            props.validate(),
            Err(LayoutError::InvalidConstraint {
                axis: Some(Axis::Horizontal),
                ..
            })
        ));
    }

    #[test]
    fn negative_preferred_and_padding_are_rejected() {
        let props = LayoutProps {
            height: AxisConstraints::fixed(-1.0),
            ..LayoutProps::default()
        };
        assert!(props.validate().is_err());

        let props = LayoutProps {
            padding: Insets::new(0.0, -2.0, 0.0, 0.0),
            ..LayoutProps::default()
        };
        assert!(props.validate().is_err());
        assert!(LayoutProps::default().validate().is_ok());
    }
}
