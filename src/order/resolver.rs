//! Order assignment and clip derivation over a flat tree snapshot.
//!
//! The widget tree flattens itself into `OrderNode`/`ClipNode` arrays before
//! calling in here; indices are positions in those arrays, not widget ids.

use super::order_info::OrderInfo;
use crate::types::{ElementKind, Rect};

// =============================================================================
// Order assignment
// =============================================================================

/// One widget's ordering inputs.
#[derive(Debug, Clone)]
pub struct OrderNode {
    /// Explicit stacking override. `None` follows tree order.
    pub z_index: Option<i32>,
    pub kind: ElementKind,
    /// Mount sequence number; stable tiebreaker among equal z siblings.
    pub source_rank: u64,
    /// Indices of children, in tree order.
    pub children: Vec<usize>,
}

/// Assign a total paint order to every node reachable from `root`.
///
/// Depth-first walk. A widget without a z-index joins its parent's stacking
/// layer right after the siblings visited before it; a widget with an
/// explicit z-index opens a fresh layer for its whole subtree. Layers stack
/// by their z value: negative z sinks the subtree below the base layer,
/// positive z raises it above, and equal-z layers keep visit order. The base
/// layer carries z 0 but always sorts before same-z lifted layers.
pub fn assign_orders(nodes: &[OrderNode], root: usize) -> Vec<OrderInfo> {
    // First pass: provisional (layer, minor) per node, layers in visit order.
    let mut layers: Vec<(i32, usize)> = vec![(0, 0)];
    let mut counters: Vec<u32> = vec![0];
    let mut provisional: Vec<(usize, u32)> = vec![(0, 0); nodes.len()];
    visit(nodes, root, 0, &mut layers, &mut counters, &mut provisional);

    // Second pass: majors follow the (z, creation order) sort of the layers.
    let mut by_z: Vec<usize> = (0..layers.len()).collect();
    by_z.sort_by_key(|&layer| layers[layer]);
    let mut major_of = vec![0u32; layers.len()];
    for (major, &layer) in by_z.iter().enumerate() {
        major_of[layer] = major as u32;
    }

    provisional
        .iter()
        .enumerate()
        .map(|(idx, &(layer, minor))| OrderInfo::new(major_of[layer], minor, nodes[idx].kind))
        .collect()
}

fn visit(
    nodes: &[OrderNode],
    idx: usize,
    layer: usize,
    layers: &mut Vec<(i32, usize)>,
    counters: &mut Vec<u32>,
    provisional: &mut [(usize, u32)],
) {
    let minor = counters[layer];
    counters[layer] += 1;
    provisional[idx] = (layer, minor);

    let mut order = nodes[idx].children.clone();
    order.sort_by_key(|&c| (nodes[c].z_index.unwrap_or(0), nodes[c].source_rank));

    for child in order {
        let child_layer = match nodes[child].z_index {
            Some(z) => {
                layers.push((z, layers.len()));
                counters.push(0);
                layers.len() - 1
            }
            None => layer,
        };
        visit(nodes, child, child_layer, layers, counters, provisional);
    }
}

// =============================================================================
// Clip derivation
// =============================================================================

/// One widget's clipping inputs. `rect` is in root space.
#[derive(Debug, Clone)]
pub struct ClipNode {
    pub rect: Rect,
    /// True for scroll-clipping widgets (overflow hidden/scroll); only these
    /// constrain descendants.
    pub clips_children: bool,
    pub children: Vec<usize>,
}

/// Derive each widget's clip rectangle: the intersection of all clipping
/// ancestors' rects. `None` means unclipped; `Some(Rect::ZERO)` means the
/// ancestor intersection is empty and the subtree is fully clipped.
///
/// By construction a child's clip is always a subset of its parent's.
pub fn resolve_clips(nodes: &[ClipNode], root: usize) -> Vec<Option<Rect>> {
    let mut out = vec![None; nodes.len()];
    clip_visit(nodes, root, None, &mut out);
    out
}

fn clip_visit(nodes: &[ClipNode], idx: usize, inherited: Option<Rect>, out: &mut [Option<Rect>]) {
    out[idx] = inherited;

    let node = &nodes[idx];
    let child_clip = if node.clips_children {
        Some(match inherited {
            Some(clip) => clip.intersect(&node.rect).unwrap_or(Rect::ZERO),
            None => node.rect,
        })
    } else {
        inherited
    };

    for &child in &node.children {
        clip_visit(nodes, child, child_clip, out);
    }
}

/// True when the widget's rect lies entirely outside its clip, so its
/// instance can be skipped instead of drawn at zero size.
pub fn is_culled(rect: &Rect, clip: Option<&Rect>) -> bool {
    match clip {
        Some(clip) => !rect.overlaps(clip),
        None => false,
    }
}

// =============================================================================
// Tests
// =============================================================================
