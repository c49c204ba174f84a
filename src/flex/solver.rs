//! Layout solver bridge - integration with the taffy flexbox engine.
//!
//! Converts merged property bags to taffy styles, owns the persistent node
//! tree, and coalesces layout passes: any number of constraint writes within
//! one tick trigger at most one solve. Nodes live from widget mount to
//! unmount; teardown is idempotent and tolerates the parent having been
//! destroyed first.

use std::collections::HashSet;
use std::rc::Rc;

use glam::Vec2;
use taffy::prelude::{auto, length, percent};
use taffy::{
    AlignContent as TaffyAlignContent, AlignItems as TaffyAlignItems, AlignSelf as TaffyAlignSelf,
    AvailableSpace, Display, FlexDirection as TaffyFlexDirection, FlexWrap as TaffyFlexWrap,
    JustifyContent as TaffyJustifyContent, NodeId, Overflow as TaffyOverflow, Point,
    Position as TaffyPosition, Rect as TaffyRect, Size, Style, TaffyTree, TraversePartialTree,
};

use crate::error::{Result, UiError};
use crate::properties::{PropertyBag, PropertyKey};
use crate::types::{
    AlignContent, AlignItems, AlignSelf, Dimension, FlexDirection, FlexWrap, Inset,
    JustifyContent, Overflow, PositionType,
};

/// Content measure callback for leaf nodes (text). Supplied by the widget,
/// backed by the host's font system.
pub type MeasureFn = Rc<dyn Fn(Size<Option<f32>>, Size<AvailableSpace>) -> Size<f32>>;

// =============================================================================
// Conversions
// =============================================================================

fn to_solver_dimension(dim: Dimension) -> taffy::Dimension {
    match dim {
        Dimension::Auto => auto(),
        Dimension::Points(v) => length(v),
        Dimension::Percent(p) => percent(p / 100.0),
    }
}

fn to_solver_flex_direction(dir: FlexDirection) -> TaffyFlexDirection {
    match dir {
        FlexDirection::Column => TaffyFlexDirection::Column,
        FlexDirection::Row => TaffyFlexDirection::Row,
        FlexDirection::ColumnReverse => TaffyFlexDirection::ColumnReverse,
        FlexDirection::RowReverse => TaffyFlexDirection::RowReverse,
    }
}

fn to_solver_flex_wrap(wrap: FlexWrap) -> TaffyFlexWrap {
    match wrap {
        FlexWrap::NoWrap => TaffyFlexWrap::NoWrap,
        FlexWrap::Wrap => TaffyFlexWrap::Wrap,
        FlexWrap::WrapReverse => TaffyFlexWrap::WrapReverse,
    }
}

fn to_solver_justify_content(justify: JustifyContent) -> Option<TaffyJustifyContent> {
    Some(match justify {
        JustifyContent::FlexStart => TaffyJustifyContent::FlexStart,
        JustifyContent::Center => TaffyJustifyContent::Center,
        JustifyContent::FlexEnd => TaffyJustifyContent::FlexEnd,
        JustifyContent::SpaceBetween => TaffyJustifyContent::SpaceBetween,
        JustifyContent::SpaceAround => TaffyJustifyContent::SpaceAround,
        JustifyContent::SpaceEvenly => TaffyJustifyContent::SpaceEvenly,
    })
}

fn to_solver_align_items(align: AlignItems) -> Option<TaffyAlignItems> {
    Some(match align {
        AlignItems::Stretch => TaffyAlignItems::Stretch,
        AlignItems::FlexStart => TaffyAlignItems::FlexStart,
        AlignItems::Center => TaffyAlignItems::Center,
        AlignItems::FlexEnd => TaffyAlignItems::FlexEnd,
        AlignItems::Baseline => TaffyAlignItems::Baseline,
    })
}

fn to_solver_align_content(align: AlignContent) -> Option<TaffyAlignContent> {
    Some(match align {
        AlignContent::Stretch => TaffyAlignContent::Stretch,
        AlignContent::FlexStart => TaffyAlignContent::FlexStart,
        AlignContent::Center => TaffyAlignContent::Center,
        AlignContent::FlexEnd => TaffyAlignContent::FlexEnd,
        AlignContent::SpaceBetween => TaffyAlignContent::SpaceBetween,
        AlignContent::SpaceAround => TaffyAlignContent::SpaceAround,
    })
}

fn to_solver_align_self(align: AlignSelf) -> Option<TaffyAlignSelf> {
    match align {
        AlignSelf::Auto => None, // inherit from parent
        AlignSelf::Stretch => Some(TaffyAlignSelf::Stretch),
        AlignSelf::FlexStart => Some(TaffyAlignSelf::FlexStart),
        AlignSelf::Center => Some(TaffyAlignSelf::Center),
        AlignSelf::FlexEnd => Some(TaffyAlignSelf::FlexEnd),
        AlignSelf::Baseline => Some(TaffyAlignSelf::Baseline),
    }
}

fn to_solver_overflow(overflow: Overflow) -> TaffyOverflow {
    match overflow {
        Overflow::Visible => TaffyOverflow::Visible,
        Overflow::Hidden => TaffyOverflow::Clip,
        Overflow::Scroll => TaffyOverflow::Scroll,
    }
}

fn to_solver_position(pos: PositionType) -> TaffyPosition {
    match pos {
        PositionType::Relative => TaffyPosition::Relative,
        PositionType::Absolute => TaffyPosition::Absolute,
    }
}

// =============================================================================
// Style building
// =============================================================================

fn bag_dimension(bag: &PropertyBag, key: PropertyKey) -> Dimension {
    bag.get(key).and_then(|v| v.as_dimension()).unwrap_or_default()
}

fn bag_f32(bag: &PropertyBag, key: PropertyKey, fallback: f32) -> f32 {
    bag.get(key).and_then(|v| v.as_f32()).unwrap_or(fallback)
}

/// Build a taffy style from the layout-relevant keys of a merged bag.
fn build_style(bag: &PropertyBag) -> Style {
    let flex_direction = match bag.get(PropertyKey::FlexDirection) {
        Some(crate::properties::PropertyValue::FlexDirection(d)) => *d,
        _ => FlexDirection::default(),
    };
    let flex_wrap = match bag.get(PropertyKey::FlexWrap) {
        Some(crate::properties::PropertyValue::FlexWrap(w)) => *w,
        _ => FlexWrap::default(),
    };
    let justify = match bag.get(PropertyKey::JustifyContent) {
        Some(crate::properties::PropertyValue::JustifyContent(j)) => *j,
        _ => JustifyContent::default(),
    };
    let align_items = match bag.get(PropertyKey::AlignItems) {
        Some(crate::properties::PropertyValue::AlignItems(a)) => *a,
        _ => AlignItems::default(),
    };
    let align_content = match bag.get(PropertyKey::AlignContent) {
        Some(crate::properties::PropertyValue::AlignContent(a)) => *a,
        _ => AlignContent::default(),
    };
    let align_self = match bag.get(PropertyKey::AlignSelf) {
        Some(crate::properties::PropertyValue::AlignSelf(a)) => *a,
        _ => AlignSelf::default(),
    };
    let overflow = bag
        .get(PropertyKey::Overflow)
        .and_then(|v| v.as_overflow())
        .unwrap_or_default();
    let position = match bag.get(PropertyKey::Position) {
        Some(crate::properties::PropertyValue::Position(p)) => *p,
        _ => PositionType::default(),
    };

    let gap = bag_f32(bag, PropertyKey::Gap, 0.0);
    let row_gap = bag_f32(bag, PropertyKey::RowGap, gap);
    let column_gap = bag_f32(bag, PropertyKey::ColumnGap, gap);

    Style {
        display: Display::Flex,
        position: to_solver_position(position),

        flex_direction: to_solver_flex_direction(flex_direction),
        flex_wrap: to_solver_flex_wrap(flex_wrap),
        justify_content: to_solver_justify_content(justify),
        align_items: to_solver_align_items(align_items),
        align_content: to_solver_align_content(align_content),

        flex_grow: bag_f32(bag, PropertyKey::FlexGrow, 0.0),
        // Shrink is opt-in: a fixed-size child keeps its declared size and
        // overflows a Scroll container instead of being squeezed to fit.
        flex_shrink: bag_f32(bag, PropertyKey::FlexShrink, 0.0),
        flex_basis: to_solver_dimension(bag_dimension(bag, PropertyKey::FlexBasis)),
        align_self: to_solver_align_self(align_self),

        size: Size {
            width: to_solver_dimension(bag_dimension(bag, PropertyKey::Width)),
            height: to_solver_dimension(bag_dimension(bag, PropertyKey::Height)),
        },
        min_size: Size {
            width: to_solver_dimension(bag_dimension(bag, PropertyKey::MinWidth)),
            height: to_solver_dimension(bag_dimension(bag, PropertyKey::MinHeight)),
        },
        max_size: Size {
            width: to_solver_dimension(bag_dimension(bag, PropertyKey::MaxWidth)),
            height: to_solver_dimension(bag_dimension(bag, PropertyKey::MaxHeight)),
        },

        margin: TaffyRect {
            top: length(bag_f32(bag, PropertyKey::MarginTop, 0.0)),
            right: length(bag_f32(bag, PropertyKey::MarginRight, 0.0)),
            bottom: length(bag_f32(bag, PropertyKey::MarginBottom, 0.0)),
            left: length(bag_f32(bag, PropertyKey::MarginLeft, 0.0)),
        },
        padding: TaffyRect {
            top: length(bag_f32(bag, PropertyKey::PaddingTop, 0.0)),
            right: length(bag_f32(bag, PropertyKey::PaddingRight, 0.0)),
            bottom: length(bag_f32(bag, PropertyKey::PaddingBottom, 0.0)),
            left: length(bag_f32(bag, PropertyKey::PaddingLeft, 0.0)),
        },
        border: TaffyRect {
            top: length(bag_f32(bag, PropertyKey::BorderTop, 0.0)),
            right: length(bag_f32(bag, PropertyKey::BorderRight, 0.0)),
            bottom: length(bag_f32(bag, PropertyKey::BorderBottom, 0.0)),
            left: length(bag_f32(bag, PropertyKey::BorderLeft, 0.0)),
        },
        gap: Size {
            width: length(column_gap),
            height: length(row_gap),
        },

        overflow: Point {
            x: to_solver_overflow(overflow),
            y: to_solver_overflow(overflow),
        },

        ..Default::default()
    }
}

/// Reject contradictory constraints instead of silently clamping them.
fn validate_constraints(bag: &PropertyBag) -> Result<()> {
    let check_axis = |min_key, max_key, axis: &str| -> Result<()> {
        let min = bag_dimension(bag, min_key);
        let max = bag_dimension(bag, max_key);
        if let (Dimension::Points(lo), Dimension::Points(hi)) = (min, max) {
            if lo > hi {
                return Err(UiError::ConstraintConflict(format!(
                    "min-{axis} {lo} exceeds max-{axis} {hi}"
                )));
            }
        }
        Ok(())
    };
    check_axis(PropertyKey::MinWidth, PropertyKey::MaxWidth, "width")?;
    check_axis(PropertyKey::MinHeight, PropertyKey::MaxHeight, "height")?;

    for key in [
        PropertyKey::Width,
        PropertyKey::Height,
        PropertyKey::MinWidth,
        PropertyKey::MinHeight,
        PropertyKey::MaxWidth,
        PropertyKey::MaxHeight,
    ] {
        if let Dimension::Points(v) = bag_dimension(bag, key) {
            if v < 0.0 {
                return Err(UiError::ConstraintConflict(format!(
                    "negative size constraint {v} for {key:?}"
                )));
            }
        }
    }
    Ok(())
}

// =============================================================================
// Readback
// =============================================================================

/// One node's geometry after a solver pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutReadback {
    /// Offset from the parent's top-left, in UI points.
    pub location: Vec2,
    pub size: Vec2,
    pub content_size: Vec2,
    pub border: Inset,
    pub padding: Inset,
}

// =============================================================================
// LayoutSolver
// =============================================================================

/// Owns the persistent taffy tree and the coalesced-pass flag.
///
/// This is the entire surface the rest of the crate uses to talk to the
/// solver; taffy types do not leak past [`MeasureFn`] and [`NodeId`].
pub struct LayoutSolver {
    tree: TaffyTree<MeasureFn>,
    alive: HashSet<NodeId>,
    pass_requested: bool,
    passes: u64,
}

impl LayoutSolver {
    pub fn new() -> Self {
        // Fractional sizes are meaningful here (UI points scale into world
        // units), so whole-pixel rounding stays off.
        let mut tree = TaffyTree::new();
        tree.disable_rounding();
        Self {
            tree,
            alive: HashSet::new(),
            pass_requested: false,
            passes: 0,
        }
    }

    fn ensure_alive(&self, node: NodeId) -> Result<()> {
        if self.alive.contains(&node) {
            Ok(())
        } else {
            Err(UiError::invalid_state(format!(
                "solver node {node:?} is not bound"
            )))
        }
    }

    /// Create a node from the given constraints.
    pub fn create_node(&mut self, bag: &PropertyBag) -> Result<NodeId> {
        validate_constraints(bag)?;
        let node = self
            .tree
            .new_leaf(build_style(bag))
            .map_err(|e| UiError::ConstraintConflict(e.to_string()))?;
        self.alive.insert(node);
        Ok(node)
    }

    /// Create a node whose content size comes from a measure callback.
    pub fn create_measured_node(&mut self, bag: &PropertyBag, measure: MeasureFn) -> Result<NodeId> {
        validate_constraints(bag)?;
        let node = self
            .tree
            .new_leaf_with_context(build_style(bag), measure)
            .map_err(|e| UiError::ConstraintConflict(e.to_string()))?;
        self.alive.insert(node);
        Ok(node)
    }

    /// Destroy a node. Idempotent; a node whose parent was already destroyed
    /// is simply forgotten.
    pub fn destroy_node(&mut self, node: NodeId) {
        if self.alive.remove(&node) {
            let _ = self.tree.remove(node);
        }
    }

    /// Push updated constraints into a bound node.
    pub fn set_constraints(&mut self, node: NodeId, bag: &PropertyBag) -> Result<()> {
        self.ensure_alive(node)?;
        validate_constraints(bag)?;
        self.tree
            .set_style(node, build_style(bag))
            .map_err(|e| UiError::ConstraintConflict(e.to_string()))
    }

    /// Register `child` under `parent` at the given position among siblings.
    pub fn insert_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> Result<()> {
        self.ensure_alive(parent)?;
        self.ensure_alive(child)?;
        let count = self.tree.child_count(parent);
        self.tree
            .insert_child_at_index(parent, index.min(count), child)
            .map_err(|e| UiError::ConstraintConflict(e.to_string()))
    }

    /// Detach `child` from `parent`. Safe to call during teardown in any
    /// order; missing nodes are ignored.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.alive.contains(&parent) && self.alive.contains(&child) {
            let _ = self.tree.remove_child(parent, child);
        }
    }

    /// Invalidate cached measurements, e.g. after text content changes.
    pub fn invalidate(&mut self, node: NodeId) -> Result<()> {
        self.ensure_alive(node)?;
        self.tree
            .mark_dirty(node)
            .map_err(|e| UiError::ConstraintConflict(e.to_string()))?;
        self.pass_requested = true;
        Ok(())
    }

    /// Schedule a layout pass. Multiple requests within one tick coalesce
    /// into a single solve. Rejected for unbound nodes.
    pub fn request_layout(&mut self, node: NodeId) -> Result<()> {
        self.ensure_alive(node)?;
        self.pass_requested = true;
        Ok(())
    }

    /// Schedule a pass without naming a node, e.g. after a subtree teardown
    /// freed space siblings can now claim.
    pub fn schedule_pass(&mut self) {
        self.pass_requested = true;
    }

    pub fn pass_requested(&self) -> bool {
        self.pass_requested
    }

    /// Number of solves performed so far.
    pub fn pass_count(&self) -> u64 {
        self.passes
    }

    /// Run the scheduled pass for `root` within `available` space.
    /// Clears the request flag whether or not a pass was pending.
    pub fn compute(&mut self, root: NodeId, available: Vec2) -> Result<()> {
        self.ensure_alive(root)?;
        self.pass_requested = false;
        self.passes += 1;

        let space = Size {
            width: AvailableSpace::Definite(available.x),
            height: AvailableSpace::Definite(available.y),
        };
        self.tree
            .compute_layout_with_measure(
                root,
                space,
                |known, avail, _node, ctx: Option<&mut MeasureFn>, _style| match ctx {
                    Some(measure) => measure(known, avail),
                    None => Size::ZERO,
                },
            )
            .map_err(|e| UiError::ConstraintConflict(e.to_string()))
    }

    /// Read one node's geometry back after a pass.
    pub fn read_layout(&self, node: NodeId) -> Result<LayoutReadback> {
        self.ensure_alive(node)?;
        let layout = self
            .tree
            .layout(node)
            .map_err(|e| UiError::invalid_state(e.to_string()))?;
        Ok(LayoutReadback {
            location: Vec2::new(layout.location.x, layout.location.y),
            size: Vec2::new(layout.size.width, layout.size.height),
            content_size: Vec2::new(layout.content_size.width, layout.content_size.height),
            border: Inset::new(
                layout.border.top,
                layout.border.right,
                layout.border.bottom,
                layout.border.left,
            ),
            padding: Inset::new(
                layout.padding.top,
                layout.padding.right,
                layout.padding.bottom,
                layout.padding.left,
            ),
        })
    }
}

impl Default for LayoutSolver {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
