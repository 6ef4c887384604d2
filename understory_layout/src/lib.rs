// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_layout --heading-base-level=0

//! Understory Layout: a retained-mode measure/arrange engine.
//!
//! Given a tree of nodes with size constraints, alignment rules, and decoration
//! components (borders, glyphs, overlays), this crate computes every node's rectangles,
//! caches measurements, propagates invalidation when properties change, and resolves
//! which node the pointer targets while honoring paint order, clipping, and modal
//! windows.
//!
//! - Two-pass layout: [`LayoutTree::measure`] asks for sizes bottom-up and
//!   [`LayoutTree::arrange`] hands out rectangles top-down.
//! - Per-node measurement caches reuse an answer when the budget shrank but the answer
//!   still fits, and never when the budget grew.
//! - Property setters validate their input and call
//!   [`LayoutTree::notify_layout_changed`]; [`LayoutTree::defer_layout`] batches
//!   construction-time writes into one notification.
//! - Three coordinate spaces ([`CoordinateSpace`]) with an independent scale per window.
//! - A frame protocol: [`LayoutTree::update`] then [`LayoutTree::draw`].
//!
//! ## Not a widget toolkit
//!
//! Concrete widgets, text shaping, theming, and input polling live elsewhere. Widgets
//! plug in through the [`NodeLayout`] trait (self size, content measurement and
//! arrangement, update observation); input arrives as an [`InputSnapshot`] per frame;
//! drawing goes through a [`Renderer`].
//!
//! ## Nodes
//!
//! - Element: no content.
//! - Container: one content slot ([`LayoutTree::set_content`]).
//! - Panel: ordered children ([`LayoutTree::add_child`]).
//! - Window: a content slot plus bounds, scale, nested windows, a modal, and the
//!   hovered/pressed/tooltip state of the pointer.
//!
//! Any node can host components ([`LayoutTree::add_component`]); a component reserves
//! edges of its host (or overlays it) and is drawn at a chosen [`DrawOrder`].
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use understory_layout::{
//!     AxisConstraints, FrameArgs, InputSnapshot, LayoutProps, LayoutTree, NodeFlags,
//!     SecondaryState, Stack, WindowProps,
//! };
//! use std::rc::Rc;
//!
//! let mut tree = LayoutTree::new();
//! let window = tree
//!     .insert_window(
//!         None,
//!         LayoutProps::default(),
//!         WindowProps { bounds: Rect::new(0.0, 0.0, 320.0, 240.0), scale: 1.0 },
//!     )
//!     .unwrap();
//! let list = tree.insert_panel(LayoutProps::default()).unwrap();
//! tree.set_behavior(list, Some(Rc::new(Stack::default()))).unwrap();
//! tree.set_content(window, Some(list)).unwrap();
//!
//! let rows: Vec<_> = {
//!     // One notification for the whole batch.
//!     let mut batch = tree.defer_layout(list);
//!     (0..3)
//!         .map(|_| {
//!             let row = batch
//!                 .insert_element(LayoutProps {
//!                     height: AxisConstraints::fixed(20.0),
//!                     // Rows take their width from the list.
//!                     flags: NodeFlags::default() | NodeFlags::CONSUMES_SINGLE_DIMENSION,
//!                     ..LayoutProps::default()
//!                 })
//!                 .unwrap();
//!             batch.add_child(list, row).unwrap();
//!             row
//!         })
//!         .collect()
//! };
//!
//! let frame = FrameArgs {
//!     input: InputSnapshot { pointer: Some(Point::new(10.0, 30.0)), ..Default::default() },
//!     ..FrameArgs::default()
//! };
//! tree.update(&frame);
//! assert_eq!(tree.rects(rows[1]).unwrap().layout, Rect::new(0.0, 20.0, 320.0, 40.0));
//! assert_eq!(tree.hovered(window), Some(rows[1]));
//! assert_eq!(tree.secondary_state(rows[1]), Some(SecondaryState::Hovered));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod arrange;
mod behavior;
mod cache;
mod component;
mod context;
mod error;
mod frame;
mod geometry;
mod hit;
mod measure;
mod transform;
mod traverse;
mod tree;
mod types;

pub use behavior::{NodeLayout, Orientation, Stack};
pub use cache::{DEFAULT_CAPACITY, MeasureCache, MeasureRecord};
pub use component::{Component, ComponentPlacement, ComponentSpec, DrawOrder, Edges, PlaceFn};
pub use context::{DrawContext, FrameArgs, InputSnapshot, UpdateContext, UpdatePhase};
pub use error::{LayoutError, Result};
pub use frame::{DrawItem, DrawLayer, Renderer};
pub use geometry::{apply_alignment, contains_rect, deflate, round_up};
pub use transform::CoordinateSpace;
pub use traverse::{NodeFilter, Order, VisualChildren, Walk};
pub use tree::{
    DeferredLayout, LayoutConfig, LayoutTree, Measurement, NodeList, NodeRects, WindowProps,
};
pub use types::{
    Axis, AxisConstraints, HorizontalAlignment, LayoutProps, NodeFlags, NodeId, NodeKind,
    NodeTag, PrimaryState, SecondaryState, VerticalAlignment, Visibility,
};
