//! Flex Node Binder.
//!
//! Mirrors the widget tree into the external flex solver (taffy), feeds it
//! merged layout properties, and republishes solver output as reactive values.
//!
//! - [`solver`] - the taffy wrapper exposing the solver's external interface
//! - [`node`] - `FlexNodeState`, the per-widget reactive layout view
//! - [`binder`] - bind/unbind plus the constraint-push effect

pub mod binder;
pub mod node;
pub mod solver;

pub use binder::bind;
pub use node::FlexNodeState;
pub use solver::{LayoutReadback, LayoutSolver, MeasureFn};
