//! # strata-ui
//!
//! Retained-mode UI layer for 3D scenes.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! fine-grained reactivity and [taffy](https://github.com/DioxusLabs/taffy)
//! for flexbox layout.
//!
//! ## Architecture
//!
//! Widgets are records in an arena owned by a [`root::UiRoot`]. Styling flows
//! through a prioritized reactive merge, layout through a persistent solver
//! tree with coalesced passes, and rendering through instanced batch groups
//! keyed by material, clip, and stacking layer:
//!
//! ```text
//! Property merge → Flex binding → Order/Clip resolve → Batch sync → Frame
//! ```
//!
//! The host renderer consumes [`root::Frame`]: per-group dirty buffer ranges
//! plus an ordered draw list. Nothing here touches the GPU directly.
//!
//! ## Modules
//!
//! - [`types`] - Core value types (Dimension, Rgba, Rect, flex enums)
//! - [`properties`] - Property bags, the reactive merge, state transformers
//! - [`flex`] - Layout solver bridge and per-widget reactive layout state
//! - [`order`] - Paint-order and clip resolution
//! - [`batch`] - Instanced batch groups and slot allocation
//! - [`lifecycle`] - Mount/unmount initializer registries
//! - [`widgets`] - Container, text, and image constructors

pub mod batch;
pub mod error;
pub mod flex;
pub mod input;
pub mod lifecycle;
pub mod order;
pub mod properties;
pub mod root;
pub mod text;
pub mod theme;
pub mod tree;
pub mod types;
pub mod widgets;

// Re-export commonly used items
pub use types::*;

pub use error::{Result, UiError};

pub use properties::{
    active_transformer, hover_transformer, responsive_transformer, theme_transformer, BagInput,
    Breakpoint, MergedProperties, PropertyBag, PropertyKey, PropertyValue, StateTransformer,
    WidgetInteraction,
};

pub use flex::{FlexNodeState, LayoutReadback, LayoutSolver};

pub use order::OrderInfo;

pub use batch::{
    BatchConfig, BatchManager, DirtyRange, DrawBatch, GroupKey, InstanceData, InstanceHandle,
    MaterialConfig, MaterialFlags, TextureId,
};

pub use lifecycle::{Cleanup, Initializer, InitializerRegistry, LifecyclePhase, Subscriptions};

pub use input::{hit_test, PointerEvent, PointerEventKind, PointerHandler, PointerHandlers};

pub use root::{Frame, UiRoot, UiRootConfig};

pub use text::{FontMetrics, HeuristicMetrics, TextContent};

pub use theme::{Theme, ThemeMode};

pub use tree::{WidgetId, WidgetRecord, WidgetTree};

pub use widgets::{
    container, image, text as text_widget, ContainerProps, ImageProps, TextProps, TextWidget,
    WidgetStyle,
};
