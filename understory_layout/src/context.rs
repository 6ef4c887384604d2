// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable per-tick contexts passed down the tree.
//!
//! Contexts are never mutated in place: each level derives a new value from its
//! parent's context and its own properties.

use core::time::Duration;

use kurbo::{Point, Rect, Vec2};

use crate::types::{NodeFlags, PrimaryState, SecondaryState};

/// Pointer state supplied by the host's input tracker, in screen space.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    /// Current pointer position, if the pointer is over the surface.
    pub pointer: Option<Point>,
    /// The primary button went down since the previous tick.
    pub pressed: bool,
    /// The primary button went up since the previous tick.
    pub released: bool,
}

/// Base arguments for one frame.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FrameArgs {
    /// Time since the frame loop started.
    pub total: Duration,
    /// Time since the previous frame.
    pub elapsed: Duration,
    /// Input state for this frame.
    pub input: InputSnapshot,
}

/// Phases of a node's update, in the order they are reported.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UpdatePhase {
    /// Visibility, interaction, and visual state were just recomputed.
    BeginUpdate,
    /// Components and content are about to update.
    BeginUpdateContents,
    /// Components and content finished updating.
    EndUpdateContents,
    /// The node's own per-frame work.
    UpdateSelf,
    /// The node and its subtree are done for this tick.
    EndUpdate,
}

/// Context handed to a node during the update tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UpdateContext {
    /// Frame arguments.
    pub frame: FrameArgs,
    /// Enabled, combined with every ancestor.
    pub is_enabled: bool,
    /// Selected, combined with every ancestor.
    pub is_selected: bool,
    /// Hit-testable, combined with every ancestor.
    pub is_hit_testable: bool,
    /// Accumulated scroll origin of the ancestors.
    pub offset: Vec2,
    /// Clipped visible rectangle of the parent, in unscaled screen space.
    pub visible_bounds: Rect,
}

impl UpdateContext {
    /// Context for a window root.
    pub fn root(frame: FrameArgs, visible_bounds: Rect) -> Self {
        Self {
            frame,
            is_enabled: true,
            is_selected: false,
            is_hit_testable: true,
            offset: Vec2::ZERO,
            visible_bounds,
        }
    }

    /// Combine this context with a child's own flags and geometry.
    pub fn derive(&self, flags: NodeFlags, offset: Vec2, visible_bounds: Rect) -> Self {
        Self {
            frame: self.frame,
            is_enabled: self.is_enabled && flags.contains(NodeFlags::ENABLED),
            is_selected: self.is_selected || flags.contains(NodeFlags::SELECTED),
            is_hit_testable: self.is_hit_testable && flags.contains(NodeFlags::HIT_TESTABLE),
            offset,
            visible_bounds,
        }
    }

    /// Primary state implied by the combined flags.
    pub fn primary_state(&self) -> PrimaryState {
        if !self.is_enabled {
            PrimaryState::Disabled
        } else if self.is_selected {
            PrimaryState::Selected
        } else {
            PrimaryState::Normal
        }
    }
}

/// Context handed to the renderer during the draw tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawContext {
    /// Time since the previous frame.
    pub elapsed: Duration,
    /// Opacity multiplied down from the root.
    pub opacity: f64,
    /// Primary state computed in the last update.
    pub primary: PrimaryState,
    /// Secondary state computed in the last update.
    pub secondary: SecondaryState,
    /// Additive offset accumulated from ancestors.
    pub offset: Vec2,
}

impl DrawContext {
    /// Context for a window root.
    pub fn root(elapsed: Duration) -> Self {
        Self {
            elapsed,
            opacity: 1.0,
            primary: PrimaryState::Normal,
            secondary: SecondaryState::None,
            offset: Vec2::ZERO,
        }
    }

    /// Context for a child node.
    pub fn derive(
        &self,
        opacity: f64,
        primary: PrimaryState,
        secondary: SecondaryState,
        offset: Vec2,
    ) -> Self {
        Self {
            elapsed: self.elapsed,
            opacity: self.opacity * opacity,
            primary,
            secondary,
            offset: self.offset + offset,
        }
    }
}
