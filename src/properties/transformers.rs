//! Built-in state transformers and per-widget interaction state.
//!
//! Each widget owns a [`WidgetInteraction`]: explicit reactive hover/active
//! sets passed by reference into the merge, never a global registry. The
//! transformer constructors here wire those sets (and the viewport/theme
//! signals) into activation predicates for [`StateTransformer`].

use spark_signals::{signal, Signal};

use super::bag::PropertyBag;
use super::merge::StateTransformer;
use crate::theme::{Theme, ThemeMode};

// =============================================================================
// Per-widget interaction state
// =============================================================================

/// Reactive pointer-interaction state for one widget.
///
/// Hover and active are sets of pointer ids, not booleans: with multiple
/// pointers (multitouch, XR controllers) the widget stays hovered until the
/// last pointer leaves.
#[derive(Clone)]
pub struct WidgetInteraction {
    hover: Signal<Vec<u32>>,
    active: Signal<Vec<u32>>,
}

impl WidgetInteraction {
    pub fn new() -> Self {
        Self {
            hover: signal(Vec::new()),
            active: signal(Vec::new()),
        }
    }

    /// True while any pointer is over the widget. Reactive.
    pub fn is_hovered(&self) -> bool {
        !self.hover.get().is_empty()
    }

    /// True while any pointer is pressed on the widget. Reactive.
    pub fn is_active(&self) -> bool {
        !self.active.get().is_empty()
    }

    pub fn pointer_enter(&self, pointer: u32) {
        let mut set = self.hover.get();
        if !set.contains(&pointer) {
            set.push(pointer);
            self.hover.set(set);
        }
    }

    pub fn pointer_leave(&self, pointer: u32) {
        let mut set = self.hover.get();
        if let Some(pos) = set.iter().position(|p| *p == pointer) {
            set.remove(pos);
            self.hover.set(set);
        }
    }

    pub fn pointer_press(&self, pointer: u32) {
        let mut set = self.active.get();
        if !set.contains(&pointer) {
            set.push(pointer);
            self.active.set(set);
        }
    }

    pub fn pointer_release(&self, pointer: u32) {
        let mut set = self.active.get();
        if let Some(pos) = set.iter().position(|p| *p == pointer) {
            set.remove(pos);
            self.active.set(set);
        }
    }

    /// Drop every pointer, e.g. on unmount mid-gesture.
    pub fn clear(&self) {
        if !self.hover.get().is_empty() {
            self.hover.set(Vec::new());
        }
        if !self.active.get().is_empty() {
            self.active.set(Vec::new());
        }
    }
}

impl Default for WidgetInteraction {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Breakpoints
// =============================================================================

/// Responsive breakpoints against the viewport width, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Breakpoint {
    Sm,
    Md,
    Lg,
    Xl,
}

impl Breakpoint {
    /// Minimum viewport width at which the breakpoint activates.
    pub fn min_width(self) -> f32 {
        match self {
            Breakpoint::Sm => 640.0,
            Breakpoint::Md => 768.0,
            Breakpoint::Lg => 1024.0,
            Breakpoint::Xl => 1280.0,
        }
    }
}

// =============================================================================
// Transformer constructors
// =============================================================================

/// Active while the widget's pointer-over set is non-empty.
pub fn hover_transformer(interaction: &WidgetInteraction, overrides: PropertyBag) -> StateTransformer {
    let interaction = interaction.clone();
    StateTransformer::from_bag("hover", move || interaction.is_hovered(), overrides)
}

/// Active while a pointer is pressed on the widget.
pub fn active_transformer(
    interaction: &WidgetInteraction,
    overrides: PropertyBag,
) -> StateTransformer {
    let interaction = interaction.clone();
    StateTransformer::from_bag("active", move || interaction.is_active(), overrides)
}

/// Active while the viewport is at least as wide as the breakpoint.
pub fn responsive_transformer(
    viewport_width: Signal<f32>,
    breakpoint: Breakpoint,
    overrides: PropertyBag,
) -> StateTransformer {
    let name = match breakpoint {
        Breakpoint::Sm => "sm",
        Breakpoint::Md => "md",
        Breakpoint::Lg => "lg",
        Breakpoint::Xl => "xl",
    };
    StateTransformer::from_bag(
        name,
        move || viewport_width.get() >= breakpoint.min_width(),
        overrides,
    )
}

/// Active while the root theme is in the given mode (usually dark overrides).
pub fn theme_transformer(
    theme: Signal<Theme>,
    mode: ThemeMode,
    overrides: PropertyBag,
) -> StateTransformer {
    let name = match mode {
        ThemeMode::Light => "light",
        ThemeMode::Dark => "dark",
    };
    StateTransformer::from_bag(name, move || theme.get().mode == mode, overrides)
}

// =============================================================================
// Tests
// =============================================================================
