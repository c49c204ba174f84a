//! Per-instance GPU data and batch-group identity.
//!
//! Widgets sharing a material, clip rectangle, and stacking layer collapse
//! into one instanced draw call. `GroupKey` is the hash identity of such a
//! group; `InstanceData` is the exact per-instance layout uploaded to the
//! instance buffer.

use std::hash::{Hash, Hasher};

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use crate::types::{Rect, Rgba};

// =============================================================================
// Material
// =============================================================================

/// Handle to a host-managed texture (image widgets, glyph atlases).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

bitflags! {
    /// Pipeline-selecting material switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        /// Sample a bound texture instead of flat fill.
        const TEXTURED    = 1 << 0;
        /// Needs blending; drawn in the transparent pass.
        const TRANSPARENT = 1 << 1;
        /// Signed-distance-field glyph rendering.
        const SDF_TEXT    = 1 << 2;
    }
}

/// Everything that must match for two widgets to share a pipeline binding.
///
/// The tint is quantized to 8-bit channels so merely-epsilon-different colors
/// still batch together, while a visible recolor moves the widget to another
/// group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialConfig {
    pub flags: MaterialFlags,
    pub texture: Option<TextureId>,
    pub tint: [u8; 4],
}

impl MaterialConfig {
    pub fn flat(color: Rgba) -> Self {
        let tint = color.quantize();
        let mut flags = MaterialFlags::empty();
        if tint[3] != u8::MAX {
            flags |= MaterialFlags::TRANSPARENT;
        }
        Self {
            flags,
            texture: None,
            tint,
        }
    }

    pub fn textured(texture: TextureId, tint: Rgba) -> Self {
        Self {
            flags: MaterialFlags::TEXTURED | MaterialFlags::TRANSPARENT,
            texture: Some(texture),
            tint: tint.quantize(),
        }
    }

    pub fn sdf_text(atlas: TextureId, color: Rgba) -> Self {
        Self {
            flags: MaterialFlags::SDF_TEXT | MaterialFlags::TRANSPARENT,
            texture: Some(atlas),
            tint: color.quantize(),
        }
    }
}

// =============================================================================
// GroupKey
// =============================================================================

/// Identity of one batch group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(pub u64);

/// Clip coordinates quantize to 1/64 unit before hashing, so sub-pixel scroll
/// jitter does not shatter groups.
fn quantize_clip(v: f32) -> i32 {
    (v * 64.0).round() as i32
}

impl GroupKey {
    pub fn compute(material: &MaterialConfig, clip: Option<&Rect>, layer: u32) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        material.hash(&mut hasher);
        layer.hash(&mut hasher);
        match clip {
            Some(rect) => {
                1u8.hash(&mut hasher);
                quantize_clip(rect.min.x).hash(&mut hasher);
                quantize_clip(rect.min.y).hash(&mut hasher);
                quantize_clip(rect.max.x).hash(&mut hasher);
                quantize_clip(rect.max.y).hash(&mut hasher);
            }
            None => 0u8.hash(&mut hasher),
        }
        GroupKey(hasher.finish())
    }

    /// Key for a dedicated single-instance group, distinct from every batched
    /// key and from other solo keys.
    pub fn solo(salt: u64) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        u64::MAX.hash(&mut hasher);
        salt.hash(&mut hasher);
        GroupKey(hasher.finish())
    }
}

// =============================================================================
// InstanceData
// =============================================================================

/// Per-instance buffer layout. Matches the instanced quad shader's vertex
/// attributes; one 144-byte stride per widget (a 4x4 transform plus five
/// vec4 attributes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Column-major local-to-root transform of the widget's quad.
    pub transform: [[f32; 4]; 4],
    /// Fill color, linear premultiplied-alpha.
    pub color: [f32; 4],
    pub border_color: [f32; 4],
    /// Border widths: top, right, bottom, left.
    pub border_width: [f32; 4],
    /// Clip rect as min.xy / max.xy in root space; all zero when unclipped.
    pub clip: [f32; 4],
    /// x: corner radius, y: opacity, z: visibility (0 or 1), w: paint order.
    pub params: [f32; 4],
}

impl InstanceData {
    /// Invisible instance; the value free slots hold.
    pub fn hidden() -> Self {
        Self::zeroed()
    }

    pub fn is_visible(&self) -> bool {
        self.params[2] != 0.0
    }
}

impl Default for InstanceData {
    fn default() -> Self {
        Self::hidden()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_same_inputs_same_key() {
        let mat = MaterialConfig::flat(Rgba::rgb8(30, 30, 40));
        let clip = Rect::new(Vec2::ZERO, Vec2::new(100.0, 50.0));
        let a = GroupKey::compute(&mat, Some(&clip), 0);
        let b = GroupKey::compute(&mat, Some(&clip), 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_material_separates_groups() {
        let clip = Rect::new(Vec2::ZERO, Vec2::new(100.0, 50.0));
        let a = GroupKey::compute(&MaterialConfig::flat(Rgba::BLACK), Some(&clip), 0);
        let b = GroupKey::compute(&MaterialConfig::flat(Rgba::WHITE), Some(&clip), 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_layer_separates_groups() {
        let mat = MaterialConfig::flat(Rgba::BLACK);
        assert_ne!(
            GroupKey::compute(&mat, None, 0),
            GroupKey::compute(&mat, None, 1)
        );
    }

    #[test]
    fn test_subpixel_clip_jitter_keeps_key() {
        let mat = MaterialConfig::flat(Rgba::BLACK);
        let a = Rect::new(Vec2::ZERO, Vec2::new(100.0, 50.0));
        let b = Rect::new(Vec2::new(0.001, 0.0), Vec2::new(100.001, 50.0));
        assert_eq!(
            GroupKey::compute(&mat, Some(&a), 0),
            GroupKey::compute(&mat, Some(&b), 0)
        );
    }

    #[test]
    fn test_solo_keys_distinct() {
        assert_ne!(GroupKey::solo(0), GroupKey::solo(1));
    }

    #[test]
    fn test_instance_layout() {
        // The shader contract: 144-byte stride, tightly packed.
        assert_eq!(std::mem::size_of::<InstanceData>(), 144);
        assert!(!InstanceData::hidden().is_visible());
    }

    #[test]
    fn test_near_transparent_flat_material_is_transparent() {
        let mat = MaterialConfig::flat(Rgba::new(0.2, 0.2, 0.2, 0.5));
        assert!(mat.flags.contains(MaterialFlags::TRANSPARENT));
        let opaque = MaterialConfig::flat(Rgba::BLACK);
        assert!(!opaque.flags.contains(MaterialFlags::TRANSPARENT));
    }
}
