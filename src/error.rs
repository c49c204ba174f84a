//! Error types for strata-ui.
//!
//! Three failure kinds cross module boundaries:
//! - `InvalidState` - operation on an unmounted or not-yet-bound widget
//! - `ConstraintConflict` - the layout solver rejects contradictory constraints
//! - `GroupAllocationFailure` - instance buffer growth exceeded the configured cap
//!
//! Property merging and order/clip computation never fail; undefined inputs
//! resolve to documented fallbacks instead.

use thiserror::Error;

/// Result type alias for strata-ui operations.
pub type Result<T> = std::result::Result<T, UiError>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum UiError {
    /// Operation requires a mounted/bound widget and got something else.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The layout solver rejected contradictory constraints.
    /// Surfaced to the caller, never silently clamped.
    #[error("constraint conflict: {0}")]
    ConstraintConflict(String),

    /// Growing an instance group's buffer would exceed the configured cap.
    /// Fatal for that group; the widget falls back to the un-batched path.
    #[error("group {group:#018x}: requested {requested} instances, cap is {cap}")]
    GroupAllocationFailure {
        group: u64,
        requested: u32,
        cap: u32,
    },
}

impl UiError {
    /// Shorthand for `InvalidState` with a static message.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}
