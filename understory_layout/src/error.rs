// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported at the API boundary.
//!
//! Only structural misuse and invalid constraints are errors. Degenerate geometry
//! (zero or negative space, empty intersections) is never an error: the affected
//! subtree measures and arranges to empty rectangles instead.

use thiserror::Error;

use crate::types::{Axis, NodeId};

/// Result alias for fallible tree operations.
pub type Result<T, E = LayoutError> = core::result::Result<T, E>;

/// Error returned by validating setters and structural operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The identifier no longer refers to a live node.
    #[error("stale node id {0:?}")]
    StaleNode(NodeId),
    /// A size, inset, opacity, or scale value was rejected.
    #[error("invalid constraint{}: {reason}", axis_suffix(.axis))]
    InvalidConstraint {
        /// Axis the constraint applies to, if any.
        axis: Option<Axis>,
        /// What was wrong.
        reason: &'static str,
    },
    /// The operation requires a window node.
    #[error("node {0:?} is not a window")]
    NotAWindow(NodeId),
    /// The operation requires a container, window, or panel.
    #[error("node {0:?} cannot hold content")]
    NotAContainer(NodeId),
    /// The node's single content slot is already filled.
    #[error("content slot of {0:?} is occupied")]
    ContentOccupied(NodeId),
    /// The node already has a parent or owner.
    #[error("node {0:?} is already attached")]
    AlreadyAttached(NodeId),
    /// Attaching the node would make it its own ancestor.
    #[error("attaching {0:?} would create a cycle")]
    CycleDetected(NodeId),
    /// A modal must be a nested window of the window it blocks.
    #[error("{modal:?} is not a nested window of {window:?}")]
    InvalidModal {
        /// The window being blocked.
        window: NodeId,
        /// The rejected modal.
        modal: NodeId,
    },
}

fn axis_suffix(axis: &Option<Axis>) -> &'static str {
    match axis {
        Some(Axis::Horizontal) => " (horizontal)",
        Some(Axis::Vertical) => " (vertical)",
        None => "",
    }
}
