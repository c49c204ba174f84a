//! End-to-end pipeline scenarios driven through the public surface:
//! mount widgets, tick, and inspect the frames the host would receive.

use glam::Vec2;

use strata_ui::properties::{PropertyBag, PropertyKey};
use strata_ui::root::{UiRoot, UiRootConfig};
use strata_ui::theme::Theme;
use strata_ui::tree::WidgetId;
use strata_ui::types::{Dimension, FlexDirection, Overflow, Rgba};
use strata_ui::widgets::{container, ContainerProps, WidgetStyle};
use strata_ui::{BagInput, BatchConfig, PointerEvent};

fn ui(w: f32, h: f32) -> UiRoot {
    UiRoot::new(UiRootConfig {
        viewport: Vec2::new(w, h),
        ..UiRootConfig::default()
    })
}

fn panel(root: &UiRoot, parent: Option<WidgetId>, bag: PropertyBag) -> WidgetId {
    styled_panel(root, parent, bag, WidgetStyle::default())
}

fn styled_panel(
    root: &UiRoot,
    parent: Option<WidgetId>,
    bag: PropertyBag,
    mut style: WidgetStyle,
) -> WidgetId {
    style.style = bag.into();
    container(
        root,
        parent,
        ContainerProps {
            style,
            ..ContainerProps::default()
        },
    )
    .unwrap()
}

fn sized(w: f32, h: f32) -> PropertyBag {
    PropertyBag::new()
        .with(PropertyKey::Width, Dimension::Points(w))
        .with(PropertyKey::Height, Dimension::Points(h))
}

const BASE: Rgba = Rgba::new(0.2, 0.2, 0.2, 1.0);

// =============================================================================
// Layout
// =============================================================================

#[test]
fn test_row_with_gap_distributes_growing_children() {
    let root = ui(100.0, 50.0);
    let surface = panel(
        &root,
        None,
        sized(100.0, 50.0)
            .with(PropertyKey::FlexDirection, FlexDirection::Row)
            .with(PropertyKey::Gap, 10.0f32),
    );
    let a = panel(
        &root,
        Some(surface),
        PropertyBag::new().with(PropertyKey::FlexGrow, 1.0f32),
    );
    let b = panel(
        &root,
        Some(surface),
        PropertyBag::new().with(PropertyKey::FlexGrow, 1.0f32),
    );

    let frame = root.tick().unwrap();
    assert!(frame.solved);
    assert_eq!(root.layout_of(a).unwrap().size(), Vec2::new(45.0, 50.0));
    assert_eq!(root.layout_of(b).unwrap().size(), Vec2::new(45.0, 50.0));
    assert_eq!(root.rect_of(b).unwrap().min, Vec2::new(55.0, 0.0));
}

#[test]
fn test_writes_within_one_tick_coalesce_into_one_pass() {
    let root = ui(200.0, 100.0);
    let style = spark_signals::signal(sized(200.0, 100.0));
    let surface = container(
        &root,
        None,
        ContainerProps {
            style: WidgetStyle {
                style: BagInput::Signal(style.clone()),
                ..WidgetStyle::default()
            },
            ..ContainerProps::default()
        },
    )
    .unwrap();
    root.tick().unwrap();

    // Several constraint writes, one solve.
    style.set(sized(180.0, 100.0));
    style.set(sized(160.0, 100.0));
    style.set(sized(140.0, 100.0));
    let frame = root.tick().unwrap();
    assert!(frame.solved);
    assert_eq!(root.layout_of(surface).unwrap().size().x, 140.0);

    // Quiet tick: no pass.
    let frame = root.tick().unwrap();
    assert!(!frame.solved);
}

// =============================================================================
// Batching
// =============================================================================

#[test]
fn test_identical_siblings_share_one_group() {
    let root = ui(300.0, 100.0);
    let surface = panel(
        &root,
        None,
        sized(300.0, 100.0).with(PropertyKey::FlexDirection, FlexDirection::Row),
    );
    for _ in 0..2 {
        panel(
            &root,
            Some(surface),
            sized(100.0, 100.0).with(PropertyKey::BackgroundColor, BASE),
        );
    }
    // Third sibling with a different background: its own group.
    panel(
        &root,
        Some(surface),
        sized(100.0, 100.0).with(PropertyKey::BackgroundColor, Rgba::new(0.8, 0.2, 0.2, 1.0)),
    );

    let frame = root.tick().unwrap();
    // The transparent surface draws nothing.
    assert_eq!(frame.draws.len(), 2);
}

#[test]
fn test_full_group_falls_back_to_unbatched_instance() {
    let root = UiRoot::new(UiRootConfig {
        viewport: Vec2::new(300.0, 100.0),
        batch: BatchConfig {
            initial_capacity: 1,
            max_capacity: 1,
            reclaim_after_ticks: 2,
        },
        ..UiRootConfig::default()
    });
    let surface = panel(
        &root,
        None,
        sized(300.0, 100.0).with(PropertyKey::FlexDirection, FlexDirection::Row),
    );
    for _ in 0..3 {
        panel(
            &root,
            Some(surface),
            sized(100.0, 100.0).with(PropertyKey::BackgroundColor, BASE),
        );
    }

    // Every widget still draws; overflow instances get dedicated groups.
    let frame = root.tick().unwrap();
    assert_eq!(frame.draws.len(), 3);
    let total: u32 = frame.draws.iter().map(|d| d.instance_count).sum();
    assert_eq!(total, 3);
}

#[test]
fn test_quiet_ticks_upload_nothing() {
    let root = ui(200.0, 100.0);
    let surface = panel(&root, None, sized(200.0, 100.0));
    panel(
        &root,
        Some(surface),
        sized(50.0, 50.0).with(PropertyKey::BackgroundColor, BASE),
    );

    let first = root.tick().unwrap();
    assert!(!first.dirty.is_empty());

    let second = root.tick().unwrap();
    assert!(second.dirty.is_empty());
    assert!(!second.solved);
}

// =============================================================================
// Hover transformer through the full pipeline
// =============================================================================

#[test]
fn test_hover_recolors_within_the_same_tick_and_reverts() {
    let hover_color = Rgba::new(0.4, 0.4, 0.8, 1.0);
    let root = ui(200.0, 100.0);
    let surface = panel(&root, None, sized(200.0, 100.0));
    styled_panel(
        &root,
        Some(surface),
        sized(100.0, 100.0).with(PropertyKey::BackgroundColor, BASE),
        WidgetStyle {
            hover: Some(PropertyBag::new().with(PropertyKey::BackgroundColor, hover_color)),
            ..WidgetStyle::default()
        },
    );
    root.tick().unwrap();

    let tints = |frame: &strata_ui::Frame| -> Vec<[u8; 4]> {
        frame.draws.iter().map(|d| d.material.tint).collect()
    };

    // Pointer enters: the same tick's frame already shows the hover color.
    root.dispatch_pointer(PointerEvent::moved(0, Vec2::new(50.0, 50.0)));
    let frame = root.tick().unwrap();
    assert!(tints(&frame).contains(&hover_color.quantize()));
    assert!(!tints(&frame).contains(&BASE.quantize()));

    // Pointer leaves: base color comes back.
    root.dispatch_pointer(PointerEvent::leave(0));
    let frame = root.tick().unwrap();
    assert!(tints(&frame).contains(&BASE.quantize()));
    assert!(!tints(&frame).contains(&hover_color.quantize()));
}

// =============================================================================
// Order and clipping
// =============================================================================

#[test]
fn test_orders_are_strict_and_z_index_lifts_siblings() {
    let root = ui(300.0, 100.0);
    let surface = panel(
        &root,
        None,
        sized(300.0, 100.0).with(PropertyKey::FlexDirection, FlexDirection::Row),
    );
    let first = panel(&root, Some(surface), sized(100.0, 100.0));
    let raised = panel(
        &root,
        Some(surface),
        sized(100.0, 100.0).with(PropertyKey::ZIndex, 1i32),
    );
    let last = panel(&root, Some(surface), sized(100.0, 100.0));
    root.tick().unwrap();

    let order = |id| root.order_of(id).unwrap();
    assert!(order(surface) < order(first));
    assert!(order(first) < order(last), "plain siblings keep tree order");
    assert!(order(last) < order(raised), "explicit z paints above them");
}

#[test]
fn test_clip_flows_from_scrolling_ancestors_only() {
    let root = ui(200.0, 100.0);
    let surface = panel(&root, None, sized(200.0, 100.0));
    let clipper = panel(
        &root,
        Some(surface),
        sized(100.0, 50.0).with(PropertyKey::Overflow, Overflow::Hidden),
    );
    let inner = panel(&root, Some(clipper), sized(300.0, 20.0));
    let leaf = panel(&root, Some(inner), sized(10.0, 10.0));
    root.tick().unwrap();

    // The plain surface clips nothing.
    assert_eq!(root.clip_of(clipper).unwrap(), None);

    let clipper_rect = root.rect_of(clipper).unwrap();
    let inner_clip = root.clip_of(inner).unwrap().expect("clipped");
    assert_eq!(inner_clip, clipper_rect);

    // Monotonic down the tree: the leaf's clip is within its parent's.
    let leaf_clip = root.clip_of(leaf).unwrap().expect("clipped");
    assert!(leaf_clip.subset_of(&inner_clip));
}

#[test]
fn test_scroll_moves_content_under_a_stable_clip() {
    let root = ui(100.0, 50.0);
    let surface = panel(
        &root,
        None,
        sized(100.0, 50.0).with(PropertyKey::Overflow, Overflow::Scroll),
    );
    let content = panel(&root, Some(surface), sized(80.0, 200.0));
    root.tick().unwrap();

    let layout = root.layout_of(surface).unwrap();
    assert!(layout.is_scrollable());
    assert_eq!(layout.max_scroll(), Vec2::new(0.0, 150.0));

    let before = root.rect_of(content).unwrap().min.y;
    root.scroll(surface, Vec2::new(0.0, 30.0));
    root.tick().unwrap();
    let after = root.rect_of(content).unwrap().min.y;
    assert_eq!(before - after, 30.0);

    // Clamped at the end of the range.
    root.scroll(surface, Vec2::new(0.0, 500.0));
    assert_eq!(layout.scroll_offset(), Vec2::new(0.0, 150.0));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_unmount_releases_draws_and_reflows_siblings() {
    let root = ui(100.0, 50.0);
    let surface = panel(
        &root,
        None,
        sized(100.0, 50.0).with(PropertyKey::FlexDirection, FlexDirection::Row),
    );
    let a = panel(
        &root,
        Some(surface),
        PropertyBag::new()
            .with(PropertyKey::FlexGrow, 1.0f32)
            .with(PropertyKey::BackgroundColor, BASE),
    );
    let b = panel(
        &root,
        Some(surface),
        PropertyBag::new()
            .with(PropertyKey::FlexGrow, 1.0f32)
            .with(PropertyKey::BackgroundColor, BASE),
    );
    root.tick().unwrap();
    assert_eq!(root.layout_of(b).unwrap().size().x, 50.0);

    root.unmount(a);
    assert_eq!(root.widget_count(), 2);
    // Idempotent.
    root.unmount(a);

    let frame = root.tick().unwrap();
    assert!(frame.solved, "teardown schedules a reflow");
    assert_eq!(root.layout_of(b).unwrap().size().x, 100.0);
    let total: u32 = frame.draws.iter().map(|d| d.instance_count).sum();
    assert!(total >= 1);
}

#[test]
fn test_unmounting_the_root_empties_the_surface() {
    let root = ui(100.0, 50.0);
    let surface = panel(&root, None, sized(100.0, 50.0));
    panel(
        &root,
        Some(surface),
        sized(10.0, 10.0).with(PropertyKey::BackgroundColor, BASE),
    );
    root.tick().unwrap();

    root.unmount(surface);
    assert_eq!(root.widget_count(), 0);
    assert_eq!(root.root_widget(), None);

    let frame = root.tick().unwrap();
    assert!(frame.draws.is_empty());
}

// =============================================================================
// Theme
// =============================================================================

#[test]
fn test_dark_override_follows_the_theme_signal() {
    let dark_bg = Rgba::new(0.1, 0.1, 0.12, 1.0);
    let root = ui(100.0, 50.0);
    styled_panel(
        &root,
        None,
        sized(100.0, 50.0).with(PropertyKey::BackgroundColor, BASE),
        WidgetStyle {
            dark: Some(PropertyBag::new().with(PropertyKey::BackgroundColor, dark_bg)),
            ..WidgetStyle::default()
        },
    );

    let frame = root.tick().unwrap();
    assert_eq!(frame.draws[0].material.tint, BASE.quantize());

    root.set_theme(Theme::dark());
    let frame = root.tick().unwrap();
    assert_eq!(frame.draws[0].material.tint, dark_bg.quantize());
}
