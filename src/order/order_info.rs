//! OrderInfo - the total paint order of one widget.

use crate::types::ElementKind;

/// Compact paint-order key. Compares lexicographically: stacking layer first,
/// then position within the layer, then element kind as the tiebreaker (text
/// above the panel it sits on).
///
/// Invariants upheld by the resolver:
/// - an ancestor always orders strictly before its descendants
/// - two widgets never compare equal unless they are the same widget and the
///   tree is unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OrderInfo {
    /// Stacking layer. A new layer opens at the root and at every widget with
    /// an explicit z-index; layers are numbered in tree visit order.
    pub major: u32,
    /// Visit position within the layer.
    pub minor: u32,
    /// Paint tiebreaker between co-located element kinds.
    pub kind: ElementKind,
}

impl OrderInfo {
    pub const fn new(major: u32, minor: u32, kind: ElementKind) -> Self {
        Self { major, minor, kind }
    }
}
