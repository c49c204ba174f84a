//! Text measurement.
//!
//! Glyph rasterization belongs to the host; the layer only needs sizes. The
//! [`FontMetrics`] trait is the seam: hosts plug their font system in, tests
//! and headless runs use [`HeuristicMetrics`].

use std::rc::Rc;

use glam::Vec2;
use spark_signals::Signal;

/// Measures text runs for layout.
pub trait FontMetrics {
    /// Size of `text` at `font_size`, wrapped at `max_width` when given.
    /// `line_height` is a multiple of the font size.
    fn measure(&self, text: &str, font_size: f32, line_height: f32, max_width: Option<f32>)
        -> Vec2;
}

/// Reactive text state carried by a text widget. The measure callback reads
/// `content` on every solve; content writes invalidate the solver node.
#[derive(Clone)]
pub struct TextContent {
    pub content: Signal<String>,
    pub metrics: Rc<dyn FontMetrics>,
}

// =============================================================================
// HeuristicMetrics
// =============================================================================

/// Width-estimate metrics: every glyph advances a fixed fraction of the font
/// size. Deterministic, which is what layout tests need.
pub struct HeuristicMetrics {
    advance_ratio: f32,
}

impl HeuristicMetrics {
    pub fn new(advance_ratio: f32) -> Self {
        Self { advance_ratio }
    }

    fn word_width(&self, word: &str, font_size: f32) -> f32 {
        word.chars().count() as f32 * font_size * self.advance_ratio
    }
}

impl Default for HeuristicMetrics {
    fn default() -> Self {
        Self::new(0.55)
    }
}

impl FontMetrics for HeuristicMetrics {
    fn measure(
        &self,
        text: &str,
        font_size: f32,
        line_height: f32,
        max_width: Option<f32>,
    ) -> Vec2 {
        if text.is_empty() {
            return Vec2::new(0.0, font_size * line_height);
        }
        let space = self.word_width(" ", font_size);

        // Greedy word wrap; a word wider than the limit takes its own line.
        let mut lines = 1u32;
        let mut line_width = 0.0f32;
        let mut widest = 0.0f32;
        for word in text.split_whitespace() {
            let width = self.word_width(word, font_size);
            let candidate = if line_width == 0.0 {
                width
            } else {
                line_width + space + width
            };
            match max_width {
                Some(limit) if candidate > limit && line_width > 0.0 => {
                    widest = widest.max(line_width);
                    lines += 1;
                    line_width = width;
                }
                _ => line_width = candidate,
            }
        }
        widest = widest.max(line_width);

        if let Some(limit) = max_width {
            widest = widest.min(limit);
        }
        Vec2::new(widest, lines as f32 * font_size * line_height)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_width_scales_with_font_size() {
        let metrics = HeuristicMetrics::default();
        let small = metrics.measure("hello", 10.0, 1.2, None);
        let large = metrics.measure("hello", 20.0, 1.2, None);
        assert_eq!(large.x, small.x * 2.0);
        assert_eq!(small.y, 12.0);
    }

    #[test]
    fn test_empty_text_still_one_line_tall() {
        let metrics = HeuristicMetrics::default();
        let size = metrics.measure("", 16.0, 1.5, None);
        assert_eq!(size, Vec2::new(0.0, 24.0));
    }

    #[test]
    fn test_wraps_at_max_width() {
        let metrics = HeuristicMetrics::new(0.5);
        // Each word: 4 chars * 10 * 0.5 = 20 wide. Limit fits two words plus
        // the space between them (45), not three.
        let size = metrics.measure("aaaa bbbb cccc dddd", 10.0, 1.0, Some(45.0));
        assert_eq!(size.y, 20.0, "two lines");
        assert!(size.x <= 45.0);
    }

    #[test]
    fn test_unbounded_never_wraps() {
        let metrics = HeuristicMetrics::new(0.5);
        let size = metrics.measure("aaaa bbbb cccc dddd", 10.0, 1.0, None);
        assert_eq!(size.y, 10.0);
    }

    #[test]
    fn test_overlong_word_takes_own_line() {
        let metrics = HeuristicMetrics::new(0.5);
        // 20-char word = 100 wide against a 45 limit.
        let size = metrics.measure("aa aaaaaaaaaaaaaaaaaaaa bb", 10.0, 1.0, Some(45.0));
        assert_eq!(size.y, 30.0, "three lines");
        assert_eq!(size.x, 45.0, "clamped to the wrap limit");
    }
}
