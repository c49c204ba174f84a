//! MergedProperties - the reactive, prioritized property merge.
//!
//! Sources merge in fixed priority: defaults < style < inline properties <
//! each active transformer in registration order. Last write per key wins.
//! The merge is a pure derivation over reactive inputs: reading any source or
//! activation predicate inside the derived registers a dependency, and the
//! result is memoized until a dependency actually changes value.
//!
//! # Example
//!
//! ```ignore
//! use strata_ui::properties::{BagInput, MergedProperties, PropertyBag, PropertyKey};
//! use strata_ui::types::Rgba;
//! use spark_signals::signal;
//!
//! let style = signal(PropertyBag::new().with(PropertyKey::BackgroundColor, Rgba::BLACK));
//!
//! let merged = MergedProperties::new(
//!     BagInput::Static(PropertyBag::new()),
//!     BagInput::Signal(style.clone()),
//!     BagInput::Static(PropertyBag::new()),
//!     Vec::new(),
//! );
//!
//! let bg = merged.color(PropertyKey::BackgroundColor, Rgba::TRANSPARENT);
//! ```

use std::rc::Rc;

use spark_signals::{derived, Derived, Signal};

use super::bag::{PropertyBag, PropertyKey, PropertyValue};
use crate::types::{Dimension, Overflow, Rgba};

// =============================================================================
// Inputs
// =============================================================================

/// A property-bag source: static, signal-backed, or computed by a getter.
#[derive(Clone)]
pub enum BagInput {
    Static(PropertyBag),
    Signal(Signal<PropertyBag>),
    Getter(Rc<dyn Fn() -> PropertyBag>),
}

impl BagInput {
    /// Read the current bag. Inside a derived this registers a dependency for
    /// the `Signal` and `Getter` variants.
    pub fn get(&self) -> PropertyBag {
        match self {
            BagInput::Static(bag) => bag.clone(),
            BagInput::Signal(sig) => sig.get(),
            BagInput::Getter(f) => f(),
        }
    }
}

impl Default for BagInput {
    fn default() -> Self {
        BagInput::Static(PropertyBag::new())
    }
}

impl From<PropertyBag> for BagInput {
    fn from(bag: PropertyBag) -> Self {
        BagInput::Static(bag)
    }
}

// =============================================================================
// State transformers
// =============================================================================

/// A named, state-conditional property override.
///
/// The override function has a fixed signature: it receives the raw merge of
/// defaults/style/properties and returns a partial bag of overrides. Inactive
/// transformers contribute nothing. The activation predicate reads reactive
/// state (a hover set, the viewport width, the theme signal) so activation
/// changes re-run the merge automatically.
#[derive(Clone)]
pub struct StateTransformer {
    name: &'static str,
    active: Rc<dyn Fn() -> bool>,
    overrides: Rc<dyn Fn(&PropertyBag) -> PropertyBag>,
}

impl StateTransformer {
    pub fn new(
        name: &'static str,
        active: impl Fn() -> bool + 'static,
        overrides: impl Fn(&PropertyBag) -> PropertyBag + 'static,
    ) -> Self {
        Self {
            name,
            active: Rc::new(active),
            overrides: Rc::new(overrides),
        }
    }

    /// Transformer that overlays a fixed bag while active - the common case.
    pub fn from_bag(
        name: &'static str,
        active: impl Fn() -> bool + 'static,
        bag: PropertyBag,
    ) -> Self {
        Self::new(name, active, move |_| bag.clone())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

// =============================================================================
// MergedProperties
// =============================================================================

type MergeDerived = Derived<PropertyBag>;

/// The effective-property view of one widget.
///
/// Cheap to clone (shares the underlying derived). Reads are memoized: absent
/// a dependency change, `read` returns the same value without re-merging.
#[derive(Clone)]
pub struct MergedProperties {
    merged: MergeDerived,
    layout: MergeDerived,
}

impl MergedProperties {
    pub fn new(
        defaults: BagInput,
        style: BagInput,
        properties: BagInput,
        transformers: Vec<StateTransformer>,
    ) -> Self {
        let merged: MergeDerived = derived(move || {
            let mut out = defaults.get();
            out.apply(&style.get());
            out.apply(&properties.get());

            if transformers.is_empty() {
                return out;
            }

            // Transformers see the raw (pre-transformer) merge; later
            // transformers override earlier ones.
            let raw = out.clone();
            for transformer in &transformers {
                if (transformer.active)() {
                    out.apply(&(transformer.overrides)(&raw));
                }
            }
            out
        });

        // Second memoization stage: appearance-only changes (hover recolor,
        // opacity) stop here instead of invalidating the solver constraints.
        let merged_for_layout = merged.clone();
        let layout: MergeDerived = derived(move || merged_for_layout.get().layout_subset());

        Self { merged, layout }
    }

    /// A merge with no declared properties at all - every read falls back.
    pub fn empty() -> Self {
        Self::new(
            BagInput::default(),
            BagInput::default(),
            BagInput::default(),
            Vec::new(),
        )
    }

    /// Read one key, or `fallback` when undeclared. Never fails.
    pub fn read(&self, key: PropertyKey, fallback: PropertyValue) -> PropertyValue {
        self.merged
            .get()
            .get(key)
            .cloned()
            .unwrap_or(fallback)
    }

    /// The full effective bag.
    pub fn bag(&self) -> PropertyBag {
        self.merged.get()
    }

    /// Only the layout-relevant keys, memoized separately so appearance
    /// changes do not ripple into the flex binder.
    pub fn layout_bag(&self) -> PropertyBag {
        self.layout.get()
    }

    // Typed accessors with fallbacks. A declared value of the wrong variant
    // reads as the fallback, same as an undeclared key.

    pub fn dimension(&self, key: PropertyKey, fallback: Dimension) -> Dimension {
        self.merged
            .get()
            .get(key)
            .and_then(|v| v.as_dimension())
            .unwrap_or(fallback)
    }

    pub fn f32(&self, key: PropertyKey, fallback: f32) -> f32 {
        self.merged
            .get()
            .get(key)
            .and_then(|v| v.as_f32())
            .unwrap_or(fallback)
    }

    pub fn i32(&self, key: PropertyKey, fallback: i32) -> i32 {
        self.merged
            .get()
            .get(key)
            .and_then(|v| v.as_i32())
            .unwrap_or(fallback)
    }

    pub fn bool(&self, key: PropertyKey, fallback: bool) -> bool {
        self.merged
            .get()
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(fallback)
    }

    pub fn color(&self, key: PropertyKey, fallback: Rgba) -> Rgba {
        self.merged
            .get()
            .get(key)
            .and_then(|v| v.as_color())
            .unwrap_or(fallback)
    }

    pub fn overflow(&self) -> Overflow {
        self.merged
            .get()
            .get(PropertyKey::Overflow)
            .and_then(|v| v.as_overflow())
            .unwrap_or_default()
    }

    /// Declared z-index, if any. `None` means "follow tree order".
    pub fn z_index(&self) -> Option<i32> {
        self.merged
            .get()
            .get(PropertyKey::ZIndex)
            .and_then(|v| v.as_i32())
    }
}

// =============================================================================
// Tests
// =============================================================================
