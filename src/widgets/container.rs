//! Container widget - a flexbox panel that lays out children.
//!
//! # Example
//!
//! ```ignore
//! use strata_ui::properties::{PropertyBag, PropertyKey};
//! use strata_ui::root::UiRoot;
//! use strata_ui::types::{Dimension, Rgba};
//! use strata_ui::widgets::{container, ContainerProps, WidgetStyle};
//!
//! let root = UiRoot::default();
//! let panel = container(&root, None, ContainerProps {
//!     style: WidgetStyle {
//!         style: PropertyBag::new()
//!             .with(PropertyKey::Width, Dimension::Percent(100.0))
//!             .with(PropertyKey::BackgroundColor, Rgba::rgb8(30, 30, 40))
//!             .into(),
//!         hover: Some(PropertyBag::new()
//!             .with(PropertyKey::BackgroundColor, Rgba::rgb8(50, 50, 70))),
//!         ..WidgetStyle::default()
//!     },
//!     ..ContainerProps::default()
//! })?;
//! # Ok::<(), strata_ui::error::UiError>(())
//! ```

use super::{build_merged, mount, MountArgs, WidgetStyle};
use crate::error::Result;
use crate::input::PointerHandlers;
use crate::properties::{BagInput, WidgetInteraction};
use crate::root::UiRoot;
use crate::tree::WidgetId;
use crate::types::ElementKind;

pub struct ContainerProps {
    pub style: WidgetStyle,
    /// Pass a handle to observe or drive the widget's hover/active state.
    pub interaction: Option<WidgetInteraction>,
    /// Pointer callbacks, invoked by [`UiRoot::dispatch_pointer`](crate::root::UiRoot::dispatch_pointer).
    pub handlers: PointerHandlers,
}

impl Default for ContainerProps {
    fn default() -> Self {
        Self {
            style: WidgetStyle::default(),
            interaction: None,
            handlers: PointerHandlers::default(),
        }
    }
}

/// Mount a container under `parent`, or as the surface root when `parent` is
/// `None`.
pub fn container(root: &UiRoot, parent: Option<WidgetId>, props: ContainerProps) -> Result<WidgetId> {
    let interaction = props.interaction.unwrap_or_default();
    let merged = build_merged(root, props.style, BagInput::default(), &interaction);
    mount(
        root,
        parent,
        MountArgs {
            kind: ElementKind::Container,
            merged,
            interaction,
            measure: None,
            texture: None,
            text: None,
            handlers: props.handlers,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UiError;
    use crate::properties::{PropertyBag, PropertyKey};
    use crate::types::Dimension;

    #[test]
    fn test_second_root_rejected() {
        let root = UiRoot::default();
        container(&root, None, ContainerProps::default()).unwrap();
        assert!(matches!(
            container(&root, None, ContainerProps::default()),
            Err(UiError::InvalidState(_))
        ));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let root = UiRoot::default();
        let surface = container(&root, None, ContainerProps::default()).unwrap();
        root.unmount(surface);
        assert!(matches!(
            container(&root, Some(surface), ContainerProps::default()),
            Err(UiError::InvalidState(_))
        ));
    }

    #[test]
    fn test_contradictory_style_fails_mount() {
        let root = UiRoot::default();
        let result = container(
            &root,
            None,
            ContainerProps {
                style: WidgetStyle {
                    style: PropertyBag::new()
                        .with(PropertyKey::MinWidth, Dimension::Points(100.0))
                        .with(PropertyKey::MaxWidth, Dimension::Points(10.0))
                        .into(),
                    ..WidgetStyle::default()
                },
                ..ContainerProps::default()
            },
        );
        assert!(matches!(result, Err(UiError::ConstraintConflict(_))));
        assert_eq!(root.widget_count(), 0);
    }
}
