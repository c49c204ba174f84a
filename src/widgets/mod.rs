//! Widget constructors: container, text, image.
//!
//! Each constructor wires the whole stack for one widget: property merge,
//! state transformers, flex binding, lifecycle registry, and tree insertion.
//! Mounting is immediate; the returned id stays valid until
//! [`UiRoot::unmount`](crate::root::UiRoot::unmount).

mod container;
mod image;
mod text;

pub use container::{container, ContainerProps};
pub use image::{image, ImageProps};
pub use text::{text, TextProps, TextWidget};

use spark_signals::effect;

use crate::batch::TextureId;
use crate::error::{Result, UiError};
use crate::flex::{bind, MeasureFn};
use crate::input::PointerHandlers;
use crate::lifecycle::{Cleanup, InitializerRegistry};
use crate::properties::{
    active_transformer, hover_transformer, responsive_transformer, theme_transformer, BagInput,
    Breakpoint, MergedProperties, PropertyBag, WidgetInteraction,
};
use crate::root::UiRoot;
use crate::text::TextContent;
use crate::theme::ThemeMode;
use crate::tree::{WidgetId, WidgetRecord};
use crate::types::ElementKind;

// =============================================================================
// WidgetStyle
// =============================================================================

/// Declarative styling for one widget: the base style and property layers
/// plus conditional override bags, in the priority the merge applies them.
pub struct WidgetStyle {
    /// Shared/base styling (lower priority).
    pub style: BagInput,
    /// Inline per-widget properties (higher priority).
    pub properties: BagInput,
    /// Applied while a pointer hovers the widget.
    pub hover: Option<PropertyBag>,
    /// Applied while a pointer is pressed on the widget.
    pub active: Option<PropertyBag>,
    /// Applied while the viewport is at least each breakpoint wide.
    pub responsive: Vec<(Breakpoint, PropertyBag)>,
    /// Applied while the root theme is dark.
    pub dark: Option<PropertyBag>,
}

impl Default for WidgetStyle {
    fn default() -> Self {
        Self {
            style: BagInput::default(),
            properties: BagInput::default(),
            hover: None,
            active: None,
            responsive: Vec::new(),
            dark: None,
        }
    }
}

/// Assemble the merge for one widget from its style declaration.
pub(crate) fn build_merged(
    root: &UiRoot,
    style: WidgetStyle,
    defaults: BagInput,
    interaction: &WidgetInteraction,
) -> MergedProperties {
    let WidgetStyle {
        style,
        properties,
        hover,
        active,
        responsive,
        dark,
    } = style;

    let mut transformers = Vec::new();
    if let Some(bag) = hover {
        transformers.push(hover_transformer(interaction, bag));
    }
    if let Some(bag) = active {
        transformers.push(active_transformer(interaction, bag));
    }
    for (breakpoint, bag) in responsive {
        transformers.push(responsive_transformer(
            root.viewport_width.clone(),
            breakpoint,
            bag,
        ));
    }
    if let Some(bag) = dark {
        transformers.push(theme_transformer(root.theme.clone(), ThemeMode::Dark, bag));
    }

    MergedProperties::new(defaults, style, properties, transformers)
}

// =============================================================================
// Mounting
// =============================================================================

pub(crate) struct MountArgs {
    pub kind: ElementKind,
    pub merged: MergedProperties,
    pub interaction: WidgetInteraction,
    pub measure: Option<MeasureFn>,
    pub texture: Option<TextureId>,
    pub text: Option<TextContent>,
    pub handlers: PointerHandlers,
}

pub(crate) fn mount(root: &UiRoot, parent: Option<WidgetId>, args: MountArgs) -> Result<WidgetId> {
    let (parent_node, index) = match parent {
        Some(parent_id) => {
            let tree = root.tree.borrow();
            let record = tree
                .get(parent_id)
                .ok_or_else(|| UiError::invalid_state("parent widget is not mounted"))?;
            (Some(record.flex.node()), record.children.len())
        }
        None => {
            if root.tree.borrow().root().is_some() {
                return Err(UiError::invalid_state("surface already has a root widget"));
            }
            (None, 0)
        }
    };

    let mut registry = InitializerRegistry::new();
    let flex = bind(
        &root.solver,
        parent_node,
        index,
        &args.merged,
        args.measure,
        &mut registry,
    )?;

    // Text re-measures when its content changes.
    if let Some(content) = args.text.as_ref().map(|t| t.content.clone()) {
        let solver = root.solver.clone();
        let node = flex.node();
        registry.register(Box::new(move || {
            let stop = effect(move || {
                let _ = content.get();
                if let Err(err) = solver.borrow_mut().invalidate(node) {
                    log::warn!("text invalidation failed: {err}");
                }
            });
            Ok(Box::new(stop) as Cleanup)
        }))?;
    }

    if let Err(err) = registry.mount() {
        // Partial mounts release whatever they acquired.
        registry.unmount();
        return Err(err);
    }

    let mut record = WidgetRecord::new(
        args.kind,
        args.merged,
        flex,
        args.interaction,
        registry,
        parent,
    );
    record.texture = args.texture;
    record.text = args.text;
    record.handlers = args.handlers;
    Ok(root.tree_mut().insert(record))
}
