//! WidgetTree - arena of mounted widgets.
//!
//! Records live in a slot vector with a free-index pool, so widget ids stay
//! cheap to copy and slots recycle across mount/unmount churn. The tree also
//! owns the per-tick order/clip refresh: it flattens itself into the resolver's
//! snapshot form, runs the pure passes, and writes results back onto records.

use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;

use crate::batch::{InstanceHandle, TextureId};
use crate::flex::FlexNodeState;
use crate::input::PointerHandlers;
use crate::lifecycle::InitializerRegistry;
use crate::order::{assign_orders, is_culled, resolve_clips, ClipNode, OrderInfo, OrderNode};
use crate::properties::{MergedProperties, WidgetInteraction};
use crate::text::TextContent;
use crate::types::{ElementKind, Rect};

/// Stable handle to one mounted widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u32);

impl WidgetId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// WidgetRecord
// =============================================================================

/// Everything the tree knows about one widget.
pub struct WidgetRecord {
    pub kind: ElementKind,
    pub merged: MergedProperties,
    pub flex: Rc<FlexNodeState>,
    pub interaction: WidgetInteraction,
    pub registry: InitializerRegistry,
    pub parent: Option<WidgetId>,
    pub children: Vec<WidgetId>,
    /// Mount sequence number; assigned by the tree.
    pub source_rank: u64,
    pub texture: Option<TextureId>,
    pub text: Option<TextContent>,
    pub handlers: PointerHandlers,

    // Written by the per-tick passes.
    pub instance: Option<InstanceHandle>,
    /// The computed (non-solo) group key behind `instance`; a mismatch with
    /// the freshly computed key forces a release/acquire.
    pub instance_key: Option<crate::batch::GroupKey>,
    pub order: OrderInfo,
    pub clip: Option<Rect>,
    /// Absolute rect in root space, from the last geometry refresh.
    pub rect: Rect,
    /// Fully outside its clip; skipped instead of drawn.
    pub culled: bool,
}

impl WidgetRecord {
    pub fn new(
        kind: ElementKind,
        merged: MergedProperties,
        flex: Rc<FlexNodeState>,
        interaction: WidgetInteraction,
        registry: InitializerRegistry,
        parent: Option<WidgetId>,
    ) -> Self {
        Self {
            kind,
            merged,
            flex,
            interaction,
            registry,
            parent,
            children: Vec::new(),
            source_rank: 0,
            texture: None,
            text: None,
            handlers: PointerHandlers::default(),
            instance: None,
            instance_key: None,
            order: OrderInfo::default(),
            clip: None,
            rect: Rect::ZERO,
            culled: false,
        }
    }
}

// =============================================================================
// WidgetTree
// =============================================================================

pub struct WidgetTree {
    records: Vec<Option<WidgetRecord>>,
    free: Vec<u32>,
    root: Option<WidgetId>,
    next_rank: u64,
    order_dirty: bool,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            free: Vec::new(),
            root: None,
            next_rank: 0,
            order_dirty: false,
        }
    }

    pub fn root(&self) -> Option<WidgetId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.records.iter().filter(|r| r.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a record, recycling a free slot when one exists. Links the
    /// widget under its parent (append order = sibling order) and marks the
    /// paint order stale.
    pub fn insert(&mut self, mut record: WidgetRecord) -> WidgetId {
        record.source_rank = self.next_rank;
        self.next_rank += 1;
        let parent = record.parent;

        let id = match self.free.pop() {
            Some(slot) => {
                self.records[slot as usize] = Some(record);
                WidgetId(slot)
            }
            None => {
                self.records.push(Some(record));
                WidgetId((self.records.len() - 1) as u32)
            }
        };

        match parent {
            Some(parent_id) => {
                if let Some(parent_record) = self.get_mut(parent_id) {
                    parent_record.children.push(id);
                }
            }
            None => self.root = Some(id),
        }

        self.order_dirty = true;
        id
    }

    /// Detach and take a record. The caller is responsible for having removed
    /// (or taking over) its children first.
    pub fn remove(&mut self, id: WidgetId) -> Option<WidgetRecord> {
        let record = self.records.get_mut(id.index())?.take()?;
        if let Some(parent_id) = record.parent {
            if let Some(parent_record) = self.get_mut(parent_id) {
                parent_record.children.retain(|c| *c != id);
            }
        }
        if self.root == Some(id) {
            self.root = None;
        }
        self.free.push(id.0);
        self.order_dirty = true;
        Some(record)
    }

    pub fn get(&self, id: WidgetId) -> Option<&WidgetRecord> {
        self.records.get(id.index())?.as_ref()
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut WidgetRecord> {
        self.records.get_mut(id.index())?.as_mut()
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.get(id).is_some()
    }

    /// Ids reachable from the root, in tree (pre-order) sequence.
    pub fn attached_ids(&self) -> Vec<WidgetId> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.collect(root, &mut out);
        }
        out
    }

    fn collect(&self, id: WidgetId, out: &mut Vec<WidgetId>) {
        if let Some(record) = self.get(id) {
            out.push(id);
            for &child in &record.children {
                self.collect(child, out);
            }
        }
    }

    pub fn mark_order_dirty(&mut self) {
        self.order_dirty = true;
    }

    pub fn order_dirty(&self) -> bool {
        self.order_dirty
    }

    // =========================================================================
    // Per-tick refresh
    // =========================================================================

    /// Recompute absolute rects and clips, and (when the structure changed)
    /// paint orders. Call after the layout readback each tick.
    pub fn refresh(&mut self) {
        let Some(root) = self.root else { return };
        let ids = self.attached_ids();
        let index_of: HashMap<WidgetId, usize> =
            ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        self.refresh_rects(root, Vec2::ZERO);

        let recompute_orders = self.order_dirty;
        self.order_dirty = false;

        let mut order_nodes = Vec::with_capacity(ids.len());
        let mut clip_nodes = Vec::with_capacity(ids.len());
        for id in &ids {
            let record = self.get(*id).expect("attached id");
            let children: Vec<usize> = record.children.iter().map(|c| index_of[c]).collect();
            if recompute_orders {
                order_nodes.push(OrderNode {
                    z_index: record.merged.z_index(),
                    kind: record.kind,
                    source_rank: record.source_rank,
                    children: children.clone(),
                });
            }
            clip_nodes.push(ClipNode {
                rect: record.rect,
                clips_children: record.merged.overflow().clips(),
                children,
            });
        }

        let root_idx = index_of[&root];
        if recompute_orders {
            let orders = assign_orders(&order_nodes, root_idx);
            for (id, order) in ids.iter().zip(&orders) {
                self.get_mut(*id).expect("attached id").order = *order;
            }
        }

        let clips = resolve_clips(&clip_nodes, root_idx);
        for (id, clip) in ids.iter().zip(&clips) {
            let record = self.get_mut(*id).expect("attached id");
            record.clip = *clip;
            record.culled = is_culled(&record.rect, clip.as_ref());
        }

        self.refresh_scroll_ancestors(root, None);
    }

    /// Absolute rects: each child's origin is its parent's content origin,
    /// shifted by the parent's scroll position.
    fn refresh_rects(&mut self, id: WidgetId, origin: Vec2) {
        let (rect, children, child_origin) = {
            let record = self.get(id).expect("attached id");
            let pos = origin + record.flex.offset();
            let rect = Rect::from_pos_size(pos, record.flex.size());
            let child_origin = pos - record.flex.scroll_offset();
            (rect, record.children.clone(), child_origin)
        };
        self.get_mut(id).expect("attached id").rect = rect;
        for child in children {
            self.refresh_rects(child, child_origin);
        }
    }

    fn refresh_scroll_ancestors(&mut self, id: WidgetId, nearest: Option<WidgetId>) {
        let (children, next) = {
            let record = self.get(id).expect("attached id");
            record.flex.set_scroll_ancestor(nearest);
            let next = if record.merged.overflow().scrolls() {
                Some(id)
            } else {
                nearest
            };
            (record.children.clone(), next)
        };
        for child in children {
            self.refresh_scroll_ancestors(child, next);
        }
    }
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::flex::{bind, LayoutSolver};
    use crate::properties::{BagInput, PropertyBag, PropertyKey};
    use crate::types::{Dimension, FlexDirection, Overflow};

    struct Fixture {
        solver: Rc<RefCell<LayoutSolver>>,
        tree: WidgetTree,
    }

    fn setup() -> Fixture {
        Fixture {
            solver: Rc::new(RefCell::new(LayoutSolver::new())),
            tree: WidgetTree::new(),
        }
    }

    impl Fixture {
        fn add(&mut self, parent: Option<WidgetId>, bag: PropertyBag) -> WidgetId {
            let merged = MergedProperties::new(
                BagInput::default(),
                bag.into(),
                BagInput::default(),
                Vec::new(),
            );
            let mut registry = InitializerRegistry::new();
            let parent_node = parent.map(|p| self.tree.get(p).unwrap().flex.node());
            let index = parent
                .map(|p| self.tree.get(p).unwrap().children.len())
                .unwrap_or(0);
            let flex = bind(
                &self.solver,
                parent_node,
                index,
                &merged,
                None,
                &mut registry,
            )
            .unwrap();
            registry.mount().unwrap();
            self.tree.insert(WidgetRecord::new(
                ElementKind::Container,
                merged,
                flex,
                WidgetInteraction::new(),
                registry,
                parent,
            ))
        }

        fn solve_and_read(&mut self, available: Vec2) {
            let root = self.tree.root().unwrap();
            let root_node = self.tree.get(root).unwrap().flex.node();
            self.solver.borrow_mut().compute(root_node, available).unwrap();
            for id in self.tree.attached_ids() {
                let record = self.tree.get(id).unwrap();
                let readback = self.solver.borrow().read_layout(record.flex.node()).unwrap();
                let scrollable = record.merged.overflow().scrolls();
                record.flex.apply_readback(&readback, scrollable);
            }
            self.tree.refresh();
        }
    }

    fn sized(w: f32, h: f32) -> PropertyBag {
        PropertyBag::new()
            .with(PropertyKey::Width, Dimension::Points(w))
            .with(PropertyKey::Height, Dimension::Points(h))
    }

    #[test]
    fn test_slot_reuse() {
        let mut fx = setup();
        let root = fx.add(None, sized(100.0, 100.0));
        let a = fx.add(Some(root), sized(10.0, 10.0));
        fx.tree.remove(a);
        let b = fx.add(Some(root), sized(10.0, 10.0));
        assert_eq!(a.index(), b.index(), "freed slot recycles");
        assert_eq!(fx.tree.len(), 2);
    }

    #[test]
    fn test_remove_unlinks_from_parent() {
        let mut fx = setup();
        let root = fx.add(None, sized(100.0, 100.0));
        let a = fx.add(Some(root), sized(10.0, 10.0));
        let b = fx.add(Some(root), sized(10.0, 10.0));
        fx.tree.remove(a);
        assert_eq!(fx.tree.get(root).unwrap().children, vec![b]);
    }

    #[test]
    fn test_refresh_computes_absolute_rects() {
        let mut fx = setup();
        let root = fx.add(
            None,
            sized(100.0, 50.0)
                .with(PropertyKey::FlexDirection, FlexDirection::Row)
                .with(PropertyKey::Gap, 10.0f32),
        );
        let a = fx.add(Some(root), PropertyBag::new().with(PropertyKey::FlexGrow, 1.0f32));
        let b = fx.add(Some(root), PropertyBag::new().with(PropertyKey::FlexGrow, 1.0f32));
        fx.solve_and_read(Vec2::new(100.0, 50.0));

        let ra = fx.tree.get(a).unwrap().rect;
        let rb = fx.tree.get(b).unwrap().rect;
        assert_eq!(ra.min, Vec2::ZERO);
        assert_eq!(ra.size(), Vec2::new(45.0, 50.0));
        assert_eq!(rb.min, Vec2::new(55.0, 0.0));
    }

    #[test]
    fn test_refresh_assigns_orders_and_clips() {
        let mut fx = setup();
        let root = fx.add(
            None,
            sized(100.0, 50.0).with(PropertyKey::Overflow, Overflow::Hidden),
        );
        let child = fx.add(Some(root), sized(200.0, 20.0));
        fx.solve_and_read(Vec2::new(100.0, 50.0));

        let root_rec = fx.tree.get(root).unwrap();
        let child_rec = fx.tree.get(child).unwrap();
        assert!(root_rec.order < child_rec.order);
        assert_eq!(root_rec.clip, None);
        assert_eq!(child_rec.clip, Some(root_rec.rect));
    }

    #[test]
    fn test_scroll_ancestor_tracking() {
        let mut fx = setup();
        let root = fx.add(
            None,
            sized(100.0, 50.0).with(PropertyKey::Overflow, Overflow::Scroll),
        );
        let mid = fx.add(Some(root), sized(80.0, 200.0));
        let leaf = fx.add(Some(mid), sized(10.0, 10.0));
        fx.solve_and_read(Vec2::new(100.0, 50.0));

        assert_eq!(fx.tree.get(root).unwrap().flex.scroll_ancestor(), None);
        assert_eq!(fx.tree.get(mid).unwrap().flex.scroll_ancestor(), Some(root));
        assert_eq!(fx.tree.get(leaf).unwrap().flex.scroll_ancestor(), Some(root));
    }

    #[test]
    fn test_scroll_offset_shifts_children() {
        let mut fx = setup();
        let root = fx.add(
            None,
            sized(100.0, 50.0).with(PropertyKey::Overflow, Overflow::Scroll),
        );
        let child = fx.add(Some(root), sized(80.0, 200.0));
        fx.solve_and_read(Vec2::new(100.0, 50.0));

        let before = fx.tree.get(child).unwrap().rect.min.y;
        fx.tree
            .get(root)
            .unwrap()
            .flex
            .set_scroll_offset(Vec2::new(0.0, 30.0));
        fx.tree.refresh();
        let after = fx.tree.get(child).unwrap().rect.min.y;
        assert_eq!(before - after, 30.0);
    }
}
