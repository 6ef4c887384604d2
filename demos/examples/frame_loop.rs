// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small frame loop over a layout tree.
//!
//! Builds a window holding a vertical list of framed rows, one of them with a tooltip,
//! then feeds a scripted pointer path through `update` and `draw`. Draw calls are
//! reported through `tracing`.
//!
//! Run:
//! - `RUST_LOG=info cargo run -p understory_layout_demos --example frame_loop`
//! - `RUST_LOG=understory_layout=debug,info ...` to also see layout passes.

use std::rc::Rc;
use std::time::Duration;

use kurbo::{Insets, Point, Rect, Size};
use tracing_subscriber::EnvFilter;
use understory_layout::{
    AxisConstraints, ComponentSpec, DrawItem, Edges, FrameArgs, InputSnapshot, LayoutProps,
    LayoutTree, NodeFlags, NodeId, NodeLayout, Renderer, Stack, WindowProps,
};

/// Stand-in for a text label: a fixed glyph run measured as self size.
#[derive(Debug)]
struct Label {
    text: &'static str,
}

impl NodeLayout for Label {
    fn measure_self(&self, available: Size) -> Insets {
        let width = (self.text.len() as f64 * 7.0).min(available.width);
        Insets::new(0.0, 0.0, width, 14.0_f64.min(available.height))
    }
}

/// Renderer that logs instead of painting.
#[derive(Debug, Default)]
struct LogRenderer {
    depth: usize,
    items: usize,
}

impl Renderer for LogRenderer {
    fn push_clip(&mut self, clip: Rect) {
        self.depth += 1;
        tracing::debug!(depth = self.depth, ?clip, "push clip");
    }

    fn pop_clip(&mut self) {
        tracing::debug!(depth = self.depth, "pop clip");
        self.depth -= 1;
    }

    fn draw(&mut self, item: &DrawItem) {
        self.items += 1;
        tracing::info!(
            node = ?item.node,
            layer = ?item.layer,
            bounds = ?item.bounds,
            state = ?item.cx.secondary,
            "draw"
        );
    }
}

fn row(tree: &mut LayoutTree, text: &'static str) -> NodeId {
    let row = tree
        .insert_container(LayoutProps {
            padding: Insets::uniform(4.0),
            height: AxisConstraints {
                min: Some(24.0),
                ..AxisConstraints::default()
            },
            flags: NodeFlags::default() | NodeFlags::CONSUMES_SINGLE_DIMENSION,
            ..LayoutProps::default()
        })
        .unwrap();
    tree.set_behavior(row, Some(Rc::new(Label { text }))).unwrap();

    let border = tree
        .insert_element(LayoutProps {
            padding: Insets::uniform(1.0),
            ..LayoutProps::default()
        })
        .unwrap();
    tree.add_component(row, border, ComponentSpec::frame()).unwrap();

    let glyph = tree
        .insert_element(LayoutProps {
            width: AxisConstraints::fixed(12.0),
            height: AxisConstraints::fixed(12.0),
            ..LayoutProps::default()
        })
        .unwrap();
    tree.add_component(row, glyph, ComponentSpec::inline(Edges::LEFT))
        .unwrap();
    row
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut tree = LayoutTree::new();
    let window = tree
        .insert_window(
            None,
            LayoutProps::default(),
            WindowProps {
                bounds: Rect::new(40.0, 40.0, 360.0, 280.0),
                scale: 1.25,
            },
        )
        .unwrap();
    let list = tree
        .insert_panel(LayoutProps {
            padding: Insets::uniform(8.0),
            ..LayoutProps::default()
        })
        .unwrap();
    tree.set_behavior(
        list,
        Some(Rc::new(Stack {
            spacing: 4.0,
            ..Stack::default()
        })),
    )
    .unwrap();
    tree.set_content(window, Some(list)).unwrap();

    let rows: Vec<NodeId> = {
        let mut batch = tree.defer_layout(list);
        ["Open", "Save as", "Close"]
            .into_iter()
            .map(|text| {
                let id = row(&mut batch, text);
                batch.add_child(list, id).unwrap();
                id
            })
            .collect()
    };

    let tip = tree
        .insert_popup_window(LayoutProps {
            padding: Insets::uniform(3.0),
            ..LayoutProps::default()
        })
        .unwrap();
    let tip_text = tree
        .insert_element(LayoutProps {
            flags: NodeFlags::default() | NodeFlags::CONSUMES_SINGLE_DIMENSION,
            ..LayoutProps::default()
        })
        .unwrap();
    tree.set_behavior(
        tip_text,
        Some(Rc::new(Label {
            text: "Write a copy",
        })),
    )
    .unwrap();
    tree.set_content(tip, Some(tip_text)).unwrap();
    tree.set_tooltip(rows[1], Some(tip)).unwrap();

    let path = [
        (Some(Point::new(20.0, 20.0)), false, false),
        (Some(Point::new(80.0, 70.0)), false, false),
        (Some(Point::new(80.0, 100.0)), false, false),
        (Some(Point::new(80.0, 100.0)), true, false),
        (Some(Point::new(80.0, 100.0)), false, true),
        (Some(Point::new(80.0, 100.0)), false, false),
        (None, false, false),
    ];
    let step = Duration::from_millis(200);
    let mut renderer = LogRenderer::default();
    for (frame, (pointer, pressed, released)) in path.into_iter().enumerate() {
        let frame_no = u32::try_from(frame).unwrap_or(u32::MAX);
        let args = FrameArgs {
            total: step * frame_no,
            elapsed: step,
            input: InputSnapshot {
                pointer,
                pressed,
                released,
            },
        };
        tree.update(&args);
        tracing::info!(
            frame,
            ?pointer,
            hovered = ?tree.hovered(window),
            pressed = ?tree.pressed(window),
            tooltip = ?tree.active_tooltip(window),
            "tick"
        );
        tree.draw(&mut renderer, args.elapsed);
    }

    for (i, id) in rows.iter().enumerate() {
        let rects = tree.rects(*id).unwrap();
        tracing::info!(row = i, layout = ?rects.layout, content = ?rects.aligned_content, "final");
    }
    tracing::info!(items = renderer.items, "done");
}
