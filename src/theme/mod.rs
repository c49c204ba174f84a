//! Theme state.
//!
//! A small reactive palette the theme transformer keys off. The root owns a
//! `Signal<Theme>`; swapping it re-runs every merge that declared theme
//! overrides.

use crate::types::Rgba;

// =============================================================================
// Theme
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
}

/// Base palette for widgets that read theme colors as defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub mode: ThemeMode,
    /// Panel/background surfaces.
    pub surface: Rgba,
    /// Foreground text.
    pub text: Rgba,
    /// Emphasis color (focus rings, highlights).
    pub accent: Rgba,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            mode: ThemeMode::Light,
            surface: Rgba::rgb8(245, 245, 245),
            text: Rgba::rgb8(24, 24, 24),
            accent: Rgba::rgb8(36, 99, 235),
        }
    }

    pub fn dark() -> Self {
        Self {
            mode: ThemeMode::Dark,
            surface: Rgba::rgb8(24, 24, 27),
            text: Rgba::rgb8(244, 244, 245),
            accent: Rgba::rgb8(96, 165, 250),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
