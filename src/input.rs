//! Pointer input: hit testing and hover/active dispatch.
//!
//! The host forwards raw pointer events (already projected from the 3D scene
//! into the root's 2D basis); this module finds the topmost widget under the
//! pointer and maintains each widget's hover/active sets. Transformer reads
//! are lazy, so a hover change is visible to the very next merge read without
//! waiting for a tick.

use std::rc::Rc;

use glam::Vec2;

use crate::properties::{PropertyKey, WidgetInteraction};
use crate::root::UiRoot;
use crate::tree::{WidgetId, WidgetTree};

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Move,
    Down,
    Up,
    /// Pointer left the surface entirely.
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer: u32,
    /// Position in UI points, root space.
    pub position: Vec2,
    pub kind: PointerEventKind,
}

impl PointerEvent {
    pub fn moved(pointer: u32, position: Vec2) -> Self {
        Self {
            pointer,
            position,
            kind: PointerEventKind::Move,
        }
    }

    pub fn down(pointer: u32, position: Vec2) -> Self {
        Self {
            pointer,
            position,
            kind: PointerEventKind::Down,
        }
    }

    pub fn up(pointer: u32, position: Vec2) -> Self {
        Self {
            pointer,
            position,
            kind: PointerEventKind::Up,
        }
    }

    pub fn leave(pointer: u32) -> Self {
        Self {
            pointer,
            position: Vec2::NAN,
            kind: PointerEventKind::Leave,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Widget-level pointer callback, invoked with the triggering event.
pub type PointerHandler = Rc<dyn Fn(&PointerEvent)>;

/// Optional per-widget pointer callbacks. Dispatch invokes these after the
/// widget's hover/active sets update, so a handler reading the merge already
/// sees the new state.
#[derive(Clone, Default)]
pub struct PointerHandlers {
    pub enter: Option<PointerHandler>,
    pub leave: Option<PointerHandler>,
    pub press: Option<PointerHandler>,
    pub release: Option<PointerHandler>,
    /// Release over the same widget the press started on.
    pub click: Option<PointerHandler>,
}

// =============================================================================
// Hit testing
// =============================================================================

/// Topmost visible widget containing `point`. A clipped-away region does not
/// hit, matching what is actually on screen.
pub fn hit_test(tree: &WidgetTree, point: Vec2) -> Option<WidgetId> {
    tree.attached_ids()
        .into_iter()
        .filter_map(|id| {
            let record = tree.get(id)?;
            if record.culled || !record.merged.bool(PropertyKey::Visible, true) {
                return None;
            }
            if !record.rect.contains(point) {
                return None;
            }
            if let Some(clip) = &record.clip {
                if !clip.contains(point) {
                    return None;
                }
            }
            Some((record.order, id))
        })
        .max_by_key(|(order, _)| *order)
        .map(|(_, id)| id)
}

// =============================================================================
// Dispatch
// =============================================================================

impl UiRoot {
    fn interaction_of(&self, id: WidgetId) -> Option<WidgetInteraction> {
        self.tree.borrow().get(id).map(|r| r.interaction.clone())
    }

    /// Run one of a widget's pointer callbacks, if registered. The tree
    /// borrow is dropped before the call so handlers may use the root freely.
    fn invoke_handler(
        &self,
        id: WidgetId,
        pick: impl Fn(&PointerHandlers) -> Option<PointerHandler>,
        event: &PointerEvent,
    ) {
        let handler = self.tree.borrow().get(id).and_then(|r| pick(&r.handlers));
        if let Some(handler) = handler {
            handler(event);
        }
    }

    /// Route one pointer event into widget hover/active state and invoke the
    /// affected widgets' handlers.
    pub fn dispatch_pointer(&self, event: PointerEvent) {
        let pointer = event.pointer;
        let target = match event.kind {
            PointerEventKind::Leave => None,
            _ => hit_test(&self.tree.borrow(), event.position),
        };
        let previous = self.hover_targets.borrow().get(&pointer).copied();

        if previous != target {
            {
                let mut hover = self.hover_targets.borrow_mut();
                match target {
                    Some(next) => {
                        hover.insert(pointer, next);
                    }
                    None => {
                        hover.remove(&pointer);
                    }
                }
            }
            if let Some(prev) = previous {
                if let Some(interaction) = self.interaction_of(prev) {
                    interaction.pointer_leave(pointer);
                }
                self.invoke_handler(prev, |h| h.leave.clone(), &event);
            }
            if let Some(next) = target {
                if let Some(interaction) = self.interaction_of(next) {
                    interaction.pointer_enter(pointer);
                }
                self.invoke_handler(next, |h| h.enter.clone(), &event);
            }
        }

        match event.kind {
            PointerEventKind::Down => {
                if let Some(next) = target {
                    self.press_targets.borrow_mut().insert(pointer, next);
                    if let Some(interaction) = self.interaction_of(next) {
                        interaction.pointer_press(pointer);
                    }
                    self.invoke_handler(next, |h| h.press.clone(), &event);
                }
            }
            PointerEventKind::Up | PointerEventKind::Leave => {
                if let Some(pressed) = self.press_targets.borrow_mut().remove(&pointer) {
                    if let Some(interaction) = self.interaction_of(pressed) {
                        interaction.pointer_release(pointer);
                    }
                    self.invoke_handler(pressed, |h| h.release.clone(), &event);
                    // A release over the press-origin widget is a click.
                    if event.kind == PointerEventKind::Up && target == Some(pressed) {
                        self.invoke_handler(pressed, |h| h.click.clone(), &event);
                    }
                }
            }
            PointerEventKind::Move => {}
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::properties::PropertyBag;
    use crate::root::UiRootConfig;
    use crate::types::{Dimension, FlexDirection, Rgba};
    use crate::widgets::{container, ContainerProps, WidgetStyle};

    fn sized(w: f32, h: f32) -> PropertyBag {
        PropertyBag::new()
            .with(PropertyKey::Width, Dimension::Points(w))
            .with(PropertyKey::Height, Dimension::Points(h))
            .with(PropertyKey::BackgroundColor, Rgba::rgb8(40, 40, 40))
    }

    fn two_panel_root() -> (UiRoot, WidgetId, WidgetId) {
        let root = UiRoot::new(UiRootConfig {
            viewport: Vec2::new(200.0, 100.0),
            ..UiRootConfig::default()
        });
        let surface = container(
            &root,
            None,
            ContainerProps {
                style: WidgetStyle {
                    style: sized(200.0, 100.0)
                        .with(PropertyKey::FlexDirection, FlexDirection::Row)
                        .into(),
                    ..WidgetStyle::default()
                },
                ..ContainerProps::default()
            },
        )
        .unwrap();
        let left = container(
            &root,
            Some(surface),
            ContainerProps {
                style: WidgetStyle {
                    style: sized(100.0, 100.0).into(),
                    ..WidgetStyle::default()
                },
                ..ContainerProps::default()
            },
        )
        .unwrap();
        let right = container(
            &root,
            Some(surface),
            ContainerProps {
                style: WidgetStyle {
                    style: sized(100.0, 100.0).into(),
                    ..WidgetStyle::default()
                },
                ..ContainerProps::default()
            },
        )
        .unwrap();
        root.tick().unwrap();
        (root, left, right)
    }

    fn hovered(root: &UiRoot, id: WidgetId) -> bool {
        root.tree.borrow().get(id).unwrap().interaction.is_hovered()
    }

    fn active(root: &UiRoot, id: WidgetId) -> bool {
        root.tree.borrow().get(id).unwrap().interaction.is_active()
    }

    #[test]
    fn test_hit_test_finds_topmost_child() {
        let (root, left, right) = two_panel_root();
        let tree = root.tree.borrow();
        assert_eq!(hit_test(&tree, Vec2::new(10.0, 10.0)), Some(left));
        assert_eq!(hit_test(&tree, Vec2::new(150.0, 10.0)), Some(right));
        assert_eq!(hit_test(&tree, Vec2::new(300.0, 10.0)), None);
    }

    #[test]
    fn test_move_updates_hover_sets() {
        let (root, left, right) = two_panel_root();

        root.dispatch_pointer(PointerEvent::moved(0, Vec2::new(10.0, 10.0)));
        assert!(hovered(&root, left));
        assert!(!hovered(&root, right));

        root.dispatch_pointer(PointerEvent::moved(0, Vec2::new(150.0, 10.0)));
        assert!(!hovered(&root, left));
        assert!(hovered(&root, right));

        root.dispatch_pointer(PointerEvent::leave(0));
        assert!(!hovered(&root, right));
    }

    #[test]
    fn test_press_release_tracks_origin_widget() {
        let (root, left, right) = two_panel_root();

        root.dispatch_pointer(PointerEvent::down(0, Vec2::new(10.0, 10.0)));
        assert!(active(&root, left));

        // Drag onto the other panel: release still clears the origin.
        root.dispatch_pointer(PointerEvent::moved(0, Vec2::new(150.0, 10.0)));
        root.dispatch_pointer(PointerEvent::up(0, Vec2::new(150.0, 10.0)));
        assert!(!active(&root, left));
        assert!(!active(&root, right));
    }

    #[test]
    fn test_two_pointers_keep_hover_until_both_leave() {
        let (root, left, _) = two_panel_root();

        root.dispatch_pointer(PointerEvent::moved(0, Vec2::new(10.0, 10.0)));
        root.dispatch_pointer(PointerEvent::moved(1, Vec2::new(20.0, 20.0)));
        assert!(hovered(&root, left));

        root.dispatch_pointer(PointerEvent::leave(0));
        assert!(hovered(&root, left));
        root.dispatch_pointer(PointerEvent::leave(1));
        assert!(!hovered(&root, left));
    }

    fn counting_handlers(counts: &Rc<RefCell<Counts>>) -> PointerHandlers {
        fn bump(
            counts: &Rc<RefCell<Counts>>,
            field: fn(&mut Counts) -> &mut u32,
        ) -> Option<PointerHandler> {
            let counts = counts.clone();
            Some(Rc::new(move |_event: &PointerEvent| {
                *field(&mut counts.borrow_mut()) += 1;
            }))
        }
        PointerHandlers {
            enter: bump(counts, |c| &mut c.enter),
            leave: bump(counts, |c| &mut c.leave),
            press: bump(counts, |c| &mut c.press),
            release: bump(counts, |c| &mut c.release),
            click: bump(counts, |c| &mut c.click),
        }
    }

    #[derive(Default)]
    struct Counts {
        enter: u32,
        leave: u32,
        press: u32,
        release: u32,
        click: u32,
    }

    fn handler_root(counts: &Rc<RefCell<Counts>>) -> UiRoot {
        let root = UiRoot::new(UiRootConfig {
            viewport: Vec2::new(200.0, 100.0),
            ..UiRootConfig::default()
        });
        container(
            &root,
            None,
            ContainerProps {
                style: WidgetStyle {
                    style: sized(200.0, 100.0).into(),
                    ..WidgetStyle::default()
                },
                handlers: counting_handlers(counts),
                ..ContainerProps::default()
            },
        )
        .unwrap();
        root.tick().unwrap();
        root
    }

    #[test]
    fn test_handlers_fire_through_a_click_gesture() {
        let counts = Rc::new(RefCell::new(Counts::default()));
        let root = handler_root(&counts);

        root.dispatch_pointer(PointerEvent::moved(0, Vec2::new(10.0, 10.0)));
        root.dispatch_pointer(PointerEvent::down(0, Vec2::new(10.0, 10.0)));
        root.dispatch_pointer(PointerEvent::up(0, Vec2::new(12.0, 10.0)));
        root.dispatch_pointer(PointerEvent::leave(0));

        let c = counts.borrow();
        assert_eq!(c.enter, 1);
        assert_eq!(c.press, 1);
        assert_eq!(c.release, 1);
        assert_eq!(c.click, 1, "release over the press origin is a click");
        assert_eq!(c.leave, 1);
    }

    #[test]
    fn test_release_off_widget_is_not_a_click() {
        let counts = Rc::new(RefCell::new(Counts::default()));
        let root = handler_root(&counts);

        root.dispatch_pointer(PointerEvent::down(0, Vec2::new(10.0, 10.0)));
        // Drag off the widget before releasing.
        root.dispatch_pointer(PointerEvent::moved(0, Vec2::new(300.0, 10.0)));
        root.dispatch_pointer(PointerEvent::up(0, Vec2::new(300.0, 10.0)));

        let c = counts.borrow();
        assert_eq!(c.press, 1);
        assert_eq!(c.release, 1, "the press origin still sees the release");
        assert_eq!(c.click, 0);
    }

    #[test]
    fn test_unmount_mid_gesture_clears_state() {
        let (root, left, _) = two_panel_root();
        root.dispatch_pointer(PointerEvent::down(0, Vec2::new(10.0, 10.0)));

        root.unmount(left);
        assert!(root.hover_targets.borrow().is_empty());
        assert!(root.press_targets.borrow().is_empty());
        // Further events for that pointer are harmless.
        root.dispatch_pointer(PointerEvent::up(0, Vec2::new(10.0, 10.0)));
    }
}
