//! FlexNodeState - per-widget reactive view of the solver's output.
//!
//! Each widget owns exactly one solver node, created on mount and destroyed on
//! unmount. Geometry cells are Slots: the layout-readback pass writes them
//! after each solve, and any derived or effect reading `.get()` picks up a
//! reactive dependency. Nothing else writes these cells.

use std::cell::Cell;

use glam::Vec2;
use spark_signals::{signal, slot, Signal, Slot};
use taffy::NodeId;

use super::solver::LayoutReadback;
use crate::tree::WidgetId;
use crate::types::Inset;

/// Reactive layout state for one widget.
pub struct FlexNodeState {
    node: NodeId,
    bound: Cell<bool>,

    /// Outer size in UI points.
    size: Slot<Vec2>,
    /// Offset from the parent's top-left.
    offset: Slot<Vec2>,
    border_inset: Slot<Inset>,
    padding_inset: Slot<Inset>,
    /// Size of laid-out content, which may exceed `size` when scrollable.
    content_size: Slot<Vec2>,

    scrollable: Slot<bool>,
    max_scroll: Slot<Vec2>,
    /// Current scroll position. Host/user writable.
    scroll_offset: Signal<Vec2>,

    /// Nearest scrollable ancestor, for clip derivation. Lookup only - the
    /// ancestor owns itself.
    scroll_ancestor: Cell<Option<WidgetId>>,
}

impl FlexNodeState {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            bound: Cell::new(true),
            size: slot(Some(Vec2::ZERO)),
            offset: slot(Some(Vec2::ZERO)),
            border_inset: slot(Some(Inset::ZERO)),
            padding_inset: slot(Some(Inset::ZERO)),
            content_size: slot(Some(Vec2::ZERO)),
            scrollable: slot(Some(false)),
            max_scroll: slot(Some(Vec2::ZERO)),
            scroll_offset: signal(Vec2::ZERO),
            scroll_ancestor: Cell::new(None),
        }
    }

    /// The underlying solver node. Exclusively owned by this widget.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_bound(&self) -> bool {
        self.bound.get()
    }

    /// Mark the solver node released. Idempotent.
    pub fn mark_unbound(&self) {
        self.bound.set(false);
    }

    // Reactive reads -----------------------------------------------------
    //
    // Every slot is seeded at construction, so the zero fallbacks only show
    // for a cell that was explicitly emptied.

    pub fn size(&self) -> Vec2 {
        self.size.get().unwrap_or(Vec2::ZERO)
    }

    pub fn offset(&self) -> Vec2 {
        self.offset.get().unwrap_or(Vec2::ZERO)
    }

    pub fn border_inset(&self) -> Inset {
        self.border_inset.get().unwrap_or(Inset::ZERO)
    }

    pub fn padding_inset(&self) -> Inset {
        self.padding_inset.get().unwrap_or(Inset::ZERO)
    }

    pub fn content_size(&self) -> Vec2 {
        self.content_size.get().unwrap_or(Vec2::ZERO)
    }

    pub fn is_scrollable(&self) -> bool {
        self.scrollable.get().unwrap_or(false)
    }

    pub fn max_scroll(&self) -> Vec2 {
        self.max_scroll.get().unwrap_or(Vec2::ZERO)
    }

    pub fn scroll_offset(&self) -> Vec2 {
        self.scroll_offset.get()
    }

    /// Scroll to the given offset, clamped to the scrollable range.
    pub fn set_scroll_offset(&self, offset: Vec2) {
        let max = self.max_scroll();
        let clamped = offset.clamp(Vec2::ZERO, max);
        if clamped != self.scroll_offset.get() {
            self.scroll_offset.set(clamped);
        }
    }

    pub fn scroll_ancestor(&self) -> Option<WidgetId> {
        self.scroll_ancestor.get()
    }

    pub fn set_scroll_ancestor(&self, ancestor: Option<WidgetId>) {
        self.scroll_ancestor.set(ancestor);
    }

    // Readback -----------------------------------------------------------

    /// Write one solve's results into the reactive cells. This is the single
    /// feedback edge from the solver into the reactive graph.
    pub fn apply_readback(&self, readback: &LayoutReadback, scrollable: bool) {
        self.offset.set_value(readback.location);
        self.size.set_value(readback.size);
        self.border_inset.set_value(readback.border);
        self.padding_inset.set_value(readback.padding);
        self.content_size.set_value(readback.content_size);
        self.scrollable.set_value(scrollable);

        let max = (readback.content_size - readback.size).max(Vec2::ZERO);
        self.max_scroll.set_value(if scrollable { max } else { Vec2::ZERO });

        // Content shrank; keep the scroll position in range.
        let current = self.scroll_offset.get();
        let clamped = current.clamp(Vec2::ZERO, self.max_scroll());
        if clamped != current {
            self.scroll_offset.set(clamped);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
