//! Order & clipping resolution.
//!
//! Walks the widget tree once per structural change and assigns every widget
//! a total paint order plus the clip rectangle its scrolling ancestors impose.
//! Both passes are pure functions over a flat snapshot of the tree, so they
//! are cheap to re-run and easy to test in isolation.

pub mod order_info;
pub mod resolver;

pub use order_info::OrderInfo;
pub use resolver::{assign_orders, is_culled, resolve_clips, ClipNode, OrderNode};
