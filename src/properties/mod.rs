//! Property Merge Engine.
//!
//! Combines a widget's declared style, inline properties, inherited defaults,
//! and state-conditional transformers (hover/active/responsive/theme) into one
//! prioritized, memoized effective-property view.
//!
//! - [`bag`] - the tagged key/value vocabulary and `PropertyBag`
//! - [`merge`] - `MergedProperties`, the reactive merge itself
//! - [`transformers`] - built-in state transformers and per-widget interaction
//!   state

pub mod bag;
pub mod merge;
pub mod transformers;

pub use bag::{PropertyBag, PropertyKey, PropertyValue};
pub use merge::{BagInput, MergedProperties, StateTransformer};
pub use transformers::{
    active_transformer, hover_transformer, responsive_transformer, theme_transformer, Breakpoint,
    WidgetInteraction,
};
