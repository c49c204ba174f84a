//! Property bags - tagged keys and values for widget styling.
//!
//! Properties use an explicit enumeration of supported keys rather than
//! open-ended string dispatch, so a typo is a compile error and merging stays
//! O(number of declared keys). A `PropertyBag` may be partial: transformers
//! return bags holding only the keys they override.

use std::collections::HashMap;

use crate::types::{
    AlignContent, AlignItems, AlignSelf, Dimension, FlexDirection, FlexWrap, JustifyContent,
    Overflow, PositionType, Rgba,
};

// =============================================================================
// Keys
// =============================================================================

/// Every property a widget can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    // Dimensions
    Width,
    Height,
    MinWidth,
    MinHeight,
    MaxWidth,
    MaxHeight,

    // Flex container
    FlexDirection,
    FlexWrap,
    JustifyContent,
    AlignItems,
    AlignContent,
    Gap,
    RowGap,
    ColumnGap,

    // Flex item
    FlexGrow,
    FlexShrink,
    FlexBasis,
    AlignSelf,

    // Spacing
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,

    // Border widths (layout-affecting)
    BorderTop,
    BorderRight,
    BorderBottom,
    BorderLeft,

    // Box behavior
    Overflow,
    Position,

    // Appearance (never layout-affecting; hidden widgets keep their space)
    Visible,
    BackgroundColor,
    BorderColor,
    BorderRadius,
    Color,
    Opacity,
    ZIndex,

    // Text
    FontSize,
    LineHeight,
}

impl PropertyKey {
    /// Whether a change to this key requires a new layout pass.
    ///
    /// Appearance keys update instance data without touching the solver.
    pub fn layout_relevant(self) -> bool {
        !matches!(
            self,
            PropertyKey::Visible
                | PropertyKey::BackgroundColor
                | PropertyKey::BorderColor
                | PropertyKey::BorderRadius
                | PropertyKey::Color
                | PropertyKey::Opacity
                | PropertyKey::ZIndex
        )
    }
}

// =============================================================================
// Values
// =============================================================================

/// A value for some [`PropertyKey`]. Typed accessors return `None` on a
/// mismatched variant; callers fall back to their documented default.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Dimension(Dimension),
    Float(f32),
    Int(i32),
    Bool(bool),
    Color(Rgba),
    FlexDirection(FlexDirection),
    FlexWrap(FlexWrap),
    JustifyContent(JustifyContent),
    AlignItems(AlignItems),
    AlignContent(AlignContent),
    AlignSelf(AlignSelf),
    Overflow(Overflow),
    Position(PositionType),
}

impl PropertyValue {
    pub fn as_dimension(&self) -> Option<Dimension> {
        match self {
            PropertyValue::Dimension(d) => Some(*d),
            // A bare number reads as absolute points.
            PropertyValue::Float(v) => Some(Dimension::Points(*v)),
            PropertyValue::Int(v) => Some(Dimension::Points(*v as f32)),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            PropertyValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_overflow(&self) -> Option<Overflow> {
        match self {
            PropertyValue::Overflow(o) => Some(*o),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for PropertyValue {
            fn from(v: $ty) -> Self {
                PropertyValue::$variant(v)
            }
        }
    };
}

value_from!(Dimension, Dimension);
value_from!(f32, Float);
value_from!(i32, Int);
value_from!(bool, Bool);
value_from!(Rgba, Color);
value_from!(FlexDirection, FlexDirection);
value_from!(FlexWrap, FlexWrap);
value_from!(JustifyContent, JustifyContent);
value_from!(AlignItems, AlignItems);
value_from!(AlignContent, AlignContent);
value_from!(AlignSelf, AlignSelf);
value_from!(Overflow, Overflow);
value_from!(PositionType, Position);

// =============================================================================
// PropertyBag
// =============================================================================

/// A (possibly partial) set of declared properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyBag {
    entries: HashMap<PropertyKey, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: PropertyKey, value: impl Into<PropertyValue>) -> Self {
        self.entries.insert(key, value.into());
        self
    }

    pub fn set(&mut self, key: PropertyKey, value: impl Into<PropertyValue>) {
        self.entries.insert(key, value.into());
    }

    pub fn get(&self, key: PropertyKey) -> Option<&PropertyValue> {
        self.entries.get(&key)
    }

    pub fn remove(&mut self, key: PropertyKey) -> Option<PropertyValue> {
        self.entries.remove(&key)
    }

    pub fn contains(&self, key: PropertyKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKey, &PropertyValue)> {
        self.entries.iter()
    }

    /// Overlay `other` on top of `self`; every key in `other` wins.
    pub fn apply(&mut self, other: &PropertyBag) {
        for (key, value) in other.entries.iter() {
            self.entries.insert(*key, value.clone());
        }
    }

    /// The subset of keys whose change requires a layout pass.
    pub fn layout_subset(&self) -> PropertyBag {
        let entries = self
            .entries
            .iter()
            .filter(|(k, _)| k.layout_relevant())
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        PropertyBag { entries }
    }
}

// =============================================================================
// Tests
// =============================================================================
