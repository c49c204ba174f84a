//! Image widget - a textured quad inside the flex layout.

use super::{build_merged, mount, MountArgs, WidgetStyle};
use crate::batch::TextureId;
use crate::error::Result;
use crate::input::PointerHandlers;
use crate::properties::{BagInput, WidgetInteraction};
use crate::root::UiRoot;
use crate::tree::WidgetId;
use crate::types::ElementKind;

pub struct ImageProps {
    pub style: WidgetStyle,
    pub interaction: Option<WidgetInteraction>,
    pub handlers: PointerHandlers,
}

impl Default for ImageProps {
    fn default() -> Self {
        Self {
            style: WidgetStyle::default(),
            interaction: None,
            handlers: PointerHandlers::default(),
        }
    }
}

/// Mount an image under `parent`. The texture is host-managed; a tint comes
/// from the `Color` property (white leaves the texture unmodified).
pub fn image(
    root: &UiRoot,
    parent: Option<WidgetId>,
    texture: TextureId,
    props: ImageProps,
) -> Result<WidgetId> {
    let interaction = props.interaction.unwrap_or_default();
    let merged = build_merged(root, props.style, BagInput::default(), &interaction);
    mount(
        root,
        parent,
        MountArgs {
            kind: ElementKind::Image,
            merged,
            interaction,
            measure: None,
            texture: Some(texture),
            text: None,
            handlers: props.handlers,
        },
    )
}
