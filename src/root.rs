//! UiRoot - one UI surface and its per-tick pipeline.
//!
//! The root owns the layout solver, the widget tree, and the batch manager,
//! and drives them once per host frame via [`UiRoot::tick`]:
//!
//! 1. run the (coalesced) layout pass if one was requested
//! 2. read solver output back into each widget's reactive layout state
//! 3. refresh absolute rects, paint orders, and clips
//! 4. sync every widget's batch instance (acquire/release on group change,
//!    in-place update otherwise)
//! 5. hand the host the dirty buffer ranges and the ordered draw list
//!
//! Everything is instance-scoped: two roots in one process never share state.

use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;
use spark_signals::{signal, Signal};

use crate::batch::{
    BatchConfig, BatchManager, DirtyRange, DrawBatch, GroupKey, InstanceData, InstanceHandle,
    MaterialConfig, TextureId,
};
use crate::error::{Result, UiError};
use crate::flex::LayoutSolver;
use crate::order::OrderInfo;
use crate::properties::PropertyKey;
use crate::theme::Theme;
use crate::tree::{WidgetId, WidgetRecord, WidgetTree};
use crate::types::{ElementKind, Rect, Rgba};

// =============================================================================
// Configuration and frame output
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct UiRootConfig {
    pub batch: BatchConfig,
    /// World units per UI point; scales widget quads into the 3D scene.
    pub pixel_size: f32,
    /// Initial viewport size in UI points.
    pub viewport: Vec2,
}

impl Default for UiRootConfig {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            pixel_size: 0.01,
            viewport: Vec2::new(1280.0, 720.0),
        }
    }
}

/// What one tick asks of the host renderer.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Buffer spans to re-upload, per group.
    pub dirty: Vec<DirtyRange>,
    /// Draw calls in submission order.
    pub draws: Vec<DrawBatch>,
    /// Whether this tick ran a layout solve.
    pub solved: bool,
}

// =============================================================================
// UiRoot
// =============================================================================

pub struct UiRoot {
    pub(crate) solver: Rc<RefCell<LayoutSolver>>,
    pub(crate) tree: RefCell<WidgetTree>,
    pub(crate) batch: RefCell<BatchManager>,
    pub(crate) viewport: Signal<Vec2>,
    /// Width alone, for responsive transformers.
    pub(crate) viewport_width: Signal<f32>,
    pub(crate) pixel_size: Signal<f32>,
    pub(crate) theme: Signal<Theme>,
    /// Per-pointer hover target, for enter/leave dispatch.
    pub(crate) hover_targets: RefCell<HashMap<u32, WidgetId>>,
    /// Per-pointer press target, so a release reaches the widget the press
    /// started on even after the pointer moved off it.
    pub(crate) press_targets: RefCell<HashMap<u32, WidgetId>>,
}

impl UiRoot {
    pub fn new(config: UiRootConfig) -> Self {
        Self {
            solver: Rc::new(RefCell::new(LayoutSolver::new())),
            tree: RefCell::new(WidgetTree::new()),
            batch: RefCell::new(BatchManager::new(config.batch)),
            viewport: signal(config.viewport),
            viewport_width: signal(config.viewport.x),
            pixel_size: signal(config.pixel_size),
            theme: signal(Theme::default()),
            hover_targets: RefCell::new(HashMap::new()),
            press_targets: RefCell::new(HashMap::new()),
        }
    }

    // Host-facing state ---------------------------------------------------

    pub fn viewport(&self) -> Vec2 {
        self.viewport.get()
    }

    pub fn set_viewport(&self, size: Vec2) {
        if size != self.viewport.get() {
            self.viewport.set(size);
            self.viewport_width.set(size.x);
            self.solver.borrow_mut().schedule_pass();
        }
    }

    pub fn theme(&self) -> Signal<Theme> {
        self.theme.clone()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.theme.set(theme);
    }

    pub fn pixel_size(&self) -> f32 {
        self.pixel_size.get()
    }

    pub fn root_widget(&self) -> Option<WidgetId> {
        self.tree.borrow().root()
    }

    pub fn widget_count(&self) -> usize {
        self.tree.borrow().len()
    }

    pub(crate) fn tree_mut(&self) -> RefMut<'_, WidgetTree> {
        self.tree.borrow_mut()
    }

    /// Reactive layout state of a widget, if mounted.
    pub fn layout_of(&self, id: WidgetId) -> Option<Rc<crate::flex::FlexNodeState>> {
        self.tree.borrow().get(id).map(|r| r.flex.clone())
    }

    /// Paint order assigned on the last tick.
    pub fn order_of(&self, id: WidgetId) -> Option<OrderInfo> {
        self.tree.borrow().get(id).map(|r| r.order)
    }

    /// Clip rect from the last tick: `Some(None)` is mounted-but-unclipped.
    pub fn clip_of(&self, id: WidgetId) -> Option<Option<Rect>> {
        self.tree.borrow().get(id).map(|r| r.clip)
    }

    /// Absolute rect in root space from the last tick.
    pub fn rect_of(&self, id: WidgetId) -> Option<Rect> {
        self.tree.borrow().get(id).map(|r| r.rect)
    }

    /// Scroll a widget; clamped to its scrollable range, no-op otherwise.
    pub fn scroll(&self, id: WidgetId, offset: Vec2) {
        if let Some(record) = self.tree.borrow().get(id) {
            record.flex.set_scroll_offset(offset);
        }
    }

    // Unmount -------------------------------------------------------------

    /// Unmount a widget and its whole subtree, children first. Idempotent:
    /// unknown ids are ignored.
    pub fn unmount(&self, id: WidgetId) {
        let order = {
            let tree = self.tree.borrow();
            if !tree.contains(id) {
                return;
            }
            let mut post = Vec::new();
            collect_post_order(&tree, id, &mut post);
            post
        };

        for widget in order {
            let record = self.tree.borrow_mut().remove(widget);
            let Some(mut record) = record else { continue };
            record.interaction.clear();
            if let Some(handle) = record.instance.take() {
                if let Err(err) = self.batch.borrow_mut().release(handle) {
                    log::warn!("releasing instance of unmounted widget: {err}");
                }
            }
            record.registry.unmount();
            self.hover_targets
                .borrow_mut()
                .retain(|_, target| *target != widget);
            self.press_targets
                .borrow_mut()
                .retain(|_, target| *target != widget);
        }
    }

    // Tick ----------------------------------------------------------------

    /// Run one frame of the pipeline. See the module docs for the stages.
    pub fn tick(&self) -> Result<Frame> {
        let root = match self.tree.borrow().root() {
            Some(root) => root,
            None => {
                self.batch.borrow_mut().sweep();
                return Ok(Frame {
                    dirty: Vec::new(),
                    draws: Vec::new(),
                    solved: false,
                });
            }
        };

        let solved = self.solver.borrow().pass_requested();
        if solved {
            let root_node = self
                .tree
                .borrow()
                .get(root)
                .ok_or_else(|| UiError::invalid_state("root record vanished"))?
                .flex
                .node();
            self.solver
                .borrow_mut()
                .compute(root_node, self.viewport.get())?;
            self.read_back()?;
        }

        self.tree.borrow_mut().refresh();
        self.sync_instances()?;

        let mut batch = self.batch.borrow_mut();
        let dirty = batch.take_dirty();
        let draws = batch.draw_list();
        batch.sweep();

        Ok(Frame {
            dirty,
            draws,
            solved,
        })
    }

    fn read_back(&self) -> Result<()> {
        let tree = self.tree.borrow();
        let solver = self.solver.borrow();
        for id in tree.attached_ids() {
            let record = tree.get(id).expect("attached id");
            let readback = solver.read_layout(record.flex.node())?;
            let scrollable = record.merged.overflow().scrolls();
            record.flex.apply_readback(&readback, scrollable);
        }
        Ok(())
    }

    /// Bring every widget's batch instance in line with its current
    /// appearance, order, and clip.
    fn sync_instances(&self) -> Result<()> {
        let ids = self.tree.borrow().attached_ids();
        let pixel_size = self.pixel_size.get();

        for id in ids {
            let (desired, current, current_key) = {
                let tree = self.tree.borrow();
                let record = tree.get(id).expect("attached id");
                (desired_appearance(record), record.instance, record.instance_key)
            };

            match desired {
                None => {
                    // Nothing to draw; drop any previously held slot.
                    if let Some(handle) = current {
                        self.batch.borrow_mut().release(handle)?;
                        let mut tree = self.tree.borrow_mut();
                        let record = tree.get_mut(id).expect("attached id");
                        record.instance = None;
                        record.instance_key = None;
                    }
                }
                Some(appearance) => {
                    let key = GroupKey::compute(
                        &appearance.material,
                        appearance.clip.as_ref(),
                        appearance.layer,
                    );
                    let handle = match (current, current_key) {
                        (Some(handle), Some(existing)) if existing == key => handle,
                        _ => {
                            if let Some(stale) = current {
                                self.batch.borrow_mut().release(stale)?;
                            }
                            let handle = self.acquire_with_fallback(&appearance)?;
                            let mut tree = self.tree.borrow_mut();
                            let record = tree.get_mut(id).expect("attached id");
                            record.instance = Some(handle);
                            record.instance_key = Some(key);
                            handle
                        }
                    };
                    let data = appearance.instance_data(pixel_size);
                    self.batch.borrow_mut().update(handle, data)?;
                }
            }
        }
        Ok(())
    }

    fn acquire_with_fallback(&self, appearance: &Appearance) -> Result<InstanceHandle> {
        let mut batch = self.batch.borrow_mut();
        match batch.acquire(appearance.material, appearance.clip, appearance.layer) {
            Ok(handle) => Ok(handle),
            Err(err @ UiError::GroupAllocationFailure { .. }) => {
                log::warn!("{err}; falling back to an un-batched instance");
                Ok(batch.acquire_solo(appearance.material, appearance.clip, appearance.layer))
            }
            Err(err) => Err(err),
        }
    }
}

impl Default for UiRoot {
    fn default() -> Self {
        Self::new(UiRootConfig::default())
    }
}

fn collect_post_order(tree: &WidgetTree, id: WidgetId, out: &mut Vec<WidgetId>) {
    if let Some(record) = tree.get(id) {
        for &child in &record.children {
            collect_post_order(tree, child, out);
        }
        out.push(id);
    }
}

// =============================================================================
// Appearance extraction
// =============================================================================

struct Appearance {
    material: MaterialConfig,
    clip: Option<Rect>,
    layer: u32,
    rect: Rect,
    order: OrderInfo,
    color: Rgba,
    border_color: Rgba,
    border_width: [f32; 4],
    radius: f32,
    opacity: f32,
    visible: bool,
}

/// The batched appearance of one widget this tick, or `None` when there is
/// nothing to draw (e.g. a transparent, borderless container).
fn desired_appearance(record: &WidgetRecord) -> Option<Appearance> {
    let merged = &record.merged;
    let opacity = merged.f32(PropertyKey::Opacity, 1.0).clamp(0.0, 1.0);
    let declared_visible = merged.bool(PropertyKey::Visible, true);

    let border_width = [
        merged.f32(PropertyKey::BorderTop, 0.0),
        merged.f32(PropertyKey::BorderRight, 0.0),
        merged.f32(PropertyKey::BorderBottom, 0.0),
        merged.f32(PropertyKey::BorderLeft, 0.0),
    ];
    let has_border = border_width.iter().any(|w| *w > 0.0);
    let border_color = merged.color(PropertyKey::BorderColor, Rgba::TRANSPARENT);

    let (material, color) = match record.kind {
        ElementKind::Container | ElementKind::Custom => {
            let background = merged.color(PropertyKey::BackgroundColor, Rgba::TRANSPARENT);
            if background.a == 0.0 && !(has_border && border_color.a > 0.0) {
                return None;
            }
            (MaterialConfig::flat(background), background)
        }
        ElementKind::Image => {
            let texture = record.texture?;
            let tint = merged.color(PropertyKey::Color, Rgba::WHITE);
            (MaterialConfig::textured(texture, tint), tint)
        }
        ElementKind::Text => {
            let color = merged.color(PropertyKey::Color, Rgba::BLACK);
            let atlas = record.texture.unwrap_or(TextureId(0));
            (MaterialConfig::sdf_text(atlas, color), color)
        }
    };

    Some(Appearance {
        material,
        clip: record.clip,
        layer: record.order.major,
        rect: record.rect,
        order: record.order,
        color,
        border_color,
        border_width,
        radius: merged.f32(PropertyKey::BorderRadius, 0.0),
        opacity,
        visible: declared_visible && opacity > 0.0 && !record.culled,
    })
}

/// Flatten an [`OrderInfo`] into the shader's per-instance depth bias scalar.
fn order_scalar(order: OrderInfo) -> f32 {
    let kind = match order.kind {
        ElementKind::Container => 0.0,
        ElementKind::Image => 1.0,
        ElementKind::Text => 2.0,
        ElementKind::Custom => 3.0,
    };
    order.major as f32 * 65536.0 + order.minor as f32 * 4.0 + kind
}

impl Appearance {
    fn instance_data(&self, pixel_size: f32) -> InstanceData {
        let size = self.rect.size() * pixel_size;
        let pos = self.rect.min * pixel_size;

        // Column-major: scale the unit quad to the widget's rect.
        let transform = [
            [size.x, 0.0, 0.0, 0.0],
            [0.0, size.y, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [pos.x, pos.y, 0.0, 1.0],
        ];
        let clip = match self.clip {
            Some(rect) => [
                rect.min.x * pixel_size,
                rect.min.y * pixel_size,
                rect.max.x * pixel_size,
                rect.max.y * pixel_size,
            ],
            None => [0.0; 4],
        };
        InstanceData {
            transform,
            color: self.color.to_array(),
            border_color: self.border_color.to_array(),
            border_width: self.border_width,
            clip,
            params: [
                self.radius,
                self.opacity,
                if self.visible { 1.0 } else { 0.0 },
                order_scalar(self.order),
            ],
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
