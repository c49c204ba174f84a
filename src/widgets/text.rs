//! Text widget - a measured leaf whose size follows its content.

use std::rc::Rc;

use spark_signals::{signal, Signal};
use taffy::{AvailableSpace, Size};

use super::{build_merged, mount, MountArgs, WidgetStyle};
use crate::batch::TextureId;
use crate::error::Result;
use crate::flex::MeasureFn;
use crate::input::PointerHandlers;
use crate::properties::{BagInput, PropertyBag, PropertyKey, WidgetInteraction};
use crate::root::UiRoot;
use crate::text::{FontMetrics, HeuristicMetrics, TextContent};
use crate::tree::WidgetId;
use crate::types::ElementKind;

pub struct TextProps {
    pub style: WidgetStyle,
    pub interaction: Option<WidgetInteraction>,
    /// Measurement backend; defaults to [`HeuristicMetrics`].
    pub metrics: Option<Rc<dyn FontMetrics>>,
    /// Glyph atlas the host renders this text from.
    pub atlas: Option<TextureId>,
    pub handlers: PointerHandlers,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            style: WidgetStyle::default(),
            interaction: None,
            metrics: None,
            atlas: None,
            handlers: PointerHandlers::default(),
        }
    }
}

/// A mounted text widget. Setting `content` re-measures and re-lays-out on
/// the next tick.
pub struct TextWidget {
    pub id: WidgetId,
    pub content: Signal<String>,
}

/// Mount a text leaf under `parent`.
///
/// Font size and line height merge like any other property; the defaults
/// (16pt, 1.2 line height, theme text color) come from the root theme and
/// re-merge when the theme changes.
pub fn text(
    root: &UiRoot,
    parent: Option<WidgetId>,
    content: impl Into<String>,
    props: TextProps,
) -> Result<TextWidget> {
    let interaction = props.interaction.unwrap_or_default();
    let metrics = props
        .metrics
        .unwrap_or_else(|| Rc::new(HeuristicMetrics::default()) as Rc<dyn FontMetrics>);
    let content = signal(content.into());

    let theme = root.theme.clone();
    let defaults = BagInput::Getter(Rc::new(move || {
        PropertyBag::new()
            .with(PropertyKey::Color, theme.get().text)
            .with(PropertyKey::FontSize, 16.0f32)
            .with(PropertyKey::LineHeight, 1.2f32)
    }));
    let merged = build_merged(root, props.style, defaults, &interaction);

    let measure: MeasureFn = {
        let merged = merged.clone();
        let content = content.clone();
        let metrics = metrics.clone();
        Rc::new(move |known, available| {
            let font_size = merged.f32(PropertyKey::FontSize, 16.0);
            let line_height = merged.f32(PropertyKey::LineHeight, 1.2);
            let max_width = known.width.or(match available.width {
                AvailableSpace::Definite(w) => Some(w),
                _ => None,
            });
            let size = metrics.measure(&content.get(), font_size, line_height, max_width);
            Size {
                width: known.width.unwrap_or(size.x),
                height: known.height.unwrap_or(size.y),
            }
        })
    };

    let id = mount(
        root,
        parent,
        MountArgs {
            kind: ElementKind::Text,
            merged,
            interaction,
            measure: Some(measure),
            texture: props.atlas,
            text: Some(TextContent {
                content: content.clone(),
                metrics,
            }),
            handlers: props.handlers,
        },
    )?;
    Ok(TextWidget { id, content })
}
