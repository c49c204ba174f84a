//! bind - attach one widget to the layout solver for its lifetime.
//!
//! Binding creates the solver node, inserts it among its siblings, and
//! registers two lifecycle entries: the node teardown first, then the
//! constraint-push effect. Reverse-order cleanup therefore stops the effect
//! before the node it writes to is destroyed.

use std::cell::RefCell;
use std::rc::Rc;

use spark_signals::effect;
use taffy::NodeId;

use super::node::FlexNodeState;
use super::solver::{LayoutSolver, MeasureFn};
use crate::error::Result;
use crate::lifecycle::{Cleanup, InitializerRegistry};
use crate::properties::MergedProperties;

/// Bind a widget to the solver.
///
/// `parent` is `None` for the root; `index` positions the node among its
/// siblings. `measure` turns the node into a measured leaf (text). The
/// returned state stays valid until the registry unmounts.
pub fn bind(
    solver: &Rc<RefCell<LayoutSolver>>,
    parent: Option<NodeId>,
    index: usize,
    merged: &MergedProperties,
    measure: Option<MeasureFn>,
    registry: &mut InitializerRegistry,
) -> Result<Rc<FlexNodeState>> {
    let layout_bag = merged.layout_bag();
    let node = {
        let mut solver = solver.borrow_mut();
        let node = match measure {
            Some(m) => solver.create_measured_node(&layout_bag, m)?,
            None => solver.create_node(&layout_bag)?,
        };
        if let Some(parent) = parent {
            if let Err(err) = solver.insert_child_at(parent, node, index) {
                solver.destroy_node(node);
                return Err(err);
            }
        }
        solver.schedule_pass();
        node
    };

    let state = Rc::new(FlexNodeState::new(node));

    register_teardown(solver, parent, node, &state, registry)?;
    register_constraint_push(solver, node, merged, registry)?;

    Ok(state)
}

fn register_teardown(
    solver: &Rc<RefCell<LayoutSolver>>,
    parent: Option<NodeId>,
    node: NodeId,
    state: &Rc<FlexNodeState>,
    registry: &mut InitializerRegistry,
) -> Result<()> {
    let solver = solver.clone();
    let state = state.clone();
    registry.register(Box::new(move || {
        Ok(Box::new(move || {
            let mut solver = solver.borrow_mut();
            state.mark_unbound();
            if let Some(parent) = parent {
                solver.remove_child(parent, node);
            }
            solver.destroy_node(node);
            // Siblings reflow into the freed space on the next tick.
            solver.schedule_pass();
        }) as Cleanup)
    }))
}

fn register_constraint_push(
    solver: &Rc<RefCell<LayoutSolver>>,
    node: NodeId,
    merged: &MergedProperties,
    registry: &mut InitializerRegistry,
) -> Result<()> {
    let solver = solver.clone();
    let merged = merged.clone();
    registry.register(Box::new(move || {
        let stop = effect(move || {
            let bag = merged.layout_bag();
            let mut solver = solver.borrow_mut();
            match solver.set_constraints(node, &bag) {
                Ok(()) => {
                    let _ = solver.request_layout(node);
                }
                Err(err) => log::warn!("constraint update rejected: {err}"),
            }
        });
        Ok(Box::new(stop) as Cleanup)
    }))
}

// =============================================================================
// Tests
// =============================================================================
