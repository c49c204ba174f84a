//! Instanced batch management.
//!
//! Groups widgets that share a material, clip rectangle, and stacking layer
//! into single instanced draw calls, and tracks the minimal buffer ranges the
//! host must re-upload each tick.

pub mod instance;
pub mod manager;

pub use instance::{GroupKey, InstanceData, MaterialConfig, MaterialFlags, TextureId};
pub use manager::{BatchConfig, BatchManager, DirtyRange, DrawBatch, InstanceHandle};
