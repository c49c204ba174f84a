//! BatchManager - instanced draw-call grouping and slot allocation.
//!
//! One group per (material, clip, layer) key. Within a group, instances live
//! in a flat buffer: released slots go on a free list and are reused before
//! the buffer grows, growth doubles up to a hard cap, and groups that stay
//! empty are reclaimed only after a grace period so churny widgets do not
//! thrash allocations.

use std::collections::HashMap;

use super::instance::{GroupKey, InstanceData, MaterialConfig};
use crate::error::{Result, UiError};
use crate::types::Rect;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Slots a fresh group starts with.
    pub initial_capacity: u32,
    /// Hard per-group cap; hitting it fails the acquire.
    pub max_capacity: u32,
    /// Consecutive empty sweeps before an idle group's buffer is dropped.
    pub reclaim_after_ticks: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            max_capacity: 4096,
            reclaim_after_ticks: 120,
        }
    }
}

// =============================================================================
// Handles and outputs
// =============================================================================

/// Ticket for one slot in one group. Valid until released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceHandle {
    pub group: GroupKey,
    pub slot: u32,
}

/// One draw call, in submission order.
#[derive(Debug, Clone, Copy)]
pub struct DrawBatch {
    pub key: GroupKey,
    pub material: MaterialConfig,
    pub clip: Option<Rect>,
    pub layer: u32,
    /// Upper slot bound to draw; holes inside carry visibility 0.
    pub instance_count: u32,
}

/// Contiguous span of a group's buffer that changed since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRange {
    pub key: GroupKey,
    pub start: u32,
    /// Exclusive.
    pub end: u32,
}

// =============================================================================
// Group
// =============================================================================

struct Group {
    material: MaterialConfig,
    clip: Option<Rect>,
    layer: u32,
    /// Creation rank; breaks draw-order ties between equal layers.
    registration: u64,
    /// Length is the current capacity; free slots hold hidden instances.
    data: Vec<InstanceData>,
    free: Vec<u32>,
    /// Per-slot liveness; keeps release O(1) and idempotent.
    occupied: Vec<bool>,
    live: u32,
    high_water: u32,
    dirty: Option<(u32, u32)>,
    empty_sweeps: u32,
    solo: bool,
}

impl Group {
    fn new(
        material: MaterialConfig,
        clip: Option<Rect>,
        layer: u32,
        registration: u64,
        capacity: u32,
        solo: bool,
    ) -> Self {
        Self {
            material,
            clip,
            layer,
            registration,
            data: vec![InstanceData::hidden(); capacity as usize],
            free: (0..capacity).rev().collect(),
            occupied: vec![false; capacity as usize],
            live: 0,
            high_water: 0,
            dirty: None,
            empty_sweeps: 0,
            solo,
        }
    }

    fn capacity(&self) -> u32 {
        self.data.len() as u32
    }

    fn mark_dirty(&mut self, slot: u32) {
        self.dirty = Some(match self.dirty {
            Some((lo, hi)) => (lo.min(slot), hi.max(slot)),
            None => (slot, slot),
        });
    }
}

// =============================================================================
// BatchManager
// =============================================================================

pub struct BatchManager {
    config: BatchConfig,
    groups: HashMap<GroupKey, Group>,
    next_registration: u64,
    next_solo_salt: u64,
}

impl BatchManager {
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            groups: HashMap::new(),
            next_registration: 0,
            next_solo_salt: 0,
        }
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn live_count(&self, key: GroupKey) -> u32 {
        self.groups.get(&key).map(|g| g.live).unwrap_or(0)
    }

    /// Claim a slot in the group for (material, clip, layer), creating the
    /// group on first use. Free slots are reused before the buffer grows;
    /// growth doubles up to the configured cap, past which the acquire fails
    /// with [`UiError::GroupAllocationFailure`].
    pub fn acquire(
        &mut self,
        material: MaterialConfig,
        clip: Option<Rect>,
        layer: u32,
    ) -> Result<InstanceHandle> {
        let key = GroupKey::compute(&material, clip.as_ref(), layer);
        if !self.groups.contains_key(&key) {
            let registration = self.next_registration;
            self.next_registration += 1;
            self.groups.insert(
                key,
                Group::new(
                    material,
                    clip,
                    layer,
                    registration,
                    self.config.initial_capacity,
                    false,
                ),
            );
        }
        let max_capacity = self.config.max_capacity;
        let group = self.groups.get_mut(&key).expect("group just ensured");

        if group.free.is_empty() {
            let capacity = group.capacity();
            if capacity >= max_capacity {
                return Err(UiError::GroupAllocationFailure {
                    group: key.0,
                    requested: capacity + 1,
                    cap: max_capacity,
                });
            }
            let grown = (capacity * 2).min(max_capacity);
            group.data.resize(grown as usize, InstanceData::hidden());
            group.occupied.resize(grown as usize, false);
            group.free.extend((capacity..grown).rev());
            log::debug!("batch group {key:?} grew {capacity} -> {grown}");
        }

        let slot = group.free.pop().expect("free slot ensured");
        group.occupied[slot as usize] = true;
        group.live += 1;
        group.high_water = group.high_water.max(slot + 1);
        group.empty_sweeps = 0;
        group.mark_dirty(slot);
        Ok(InstanceHandle { group: key, slot })
    }

    /// Claim a dedicated single-instance group, bypassing the shared-group
    /// cap. Fallback path for widgets a full group cannot admit.
    pub fn acquire_solo(
        &mut self,
        material: MaterialConfig,
        clip: Option<Rect>,
        layer: u32,
    ) -> InstanceHandle {
        let key = GroupKey::solo(self.next_solo_salt);
        self.next_solo_salt += 1;
        let registration = self.next_registration;
        self.next_registration += 1;

        let mut group = Group::new(material, clip, layer, registration, 1, true);
        group.free.pop();
        group.occupied[0] = true;
        group.live = 1;
        group.high_water = 1;
        group.mark_dirty(0);
        self.groups.insert(key, group);
        InstanceHandle { group: key, slot: 0 }
    }

    /// Write new instance data in place. Unchanged writes are dropped, and
    /// repeated writes within one tick collapse into a single dirty range.
    pub fn update(&mut self, handle: InstanceHandle, data: InstanceData) -> Result<()> {
        let group = self.group_mut(handle)?;
        let slot = handle.slot as usize;
        if group.data[slot] != data {
            group.data[slot] = data;
            group.mark_dirty(handle.slot);
        }
        Ok(())
    }

    /// Return a slot to its group's free list. Idempotent. A solo group is
    /// dropped outright.
    pub fn release(&mut self, handle: InstanceHandle) -> Result<()> {
        let group = self.group_mut(handle)?;
        if group.solo {
            self.groups.remove(&handle.group);
            return Ok(());
        }
        if !group.occupied[handle.slot as usize] {
            return Ok(());
        }
        group.occupied[handle.slot as usize] = false;
        group.data[handle.slot as usize] = InstanceData::hidden();
        group.mark_dirty(handle.slot);
        group.free.push(handle.slot);
        group.live -= 1;
        Ok(())
    }

    fn group_mut(&mut self, handle: InstanceHandle) -> Result<&mut Group> {
        let group = self
            .groups
            .get_mut(&handle.group)
            .ok_or_else(|| UiError::invalid_state("instance handle to unknown group"))?;
        if handle.slot >= group.capacity() {
            return Err(UiError::invalid_state("instance slot out of range"));
        }
        Ok(group)
    }

    /// Drain the per-group dirty ranges accumulated since the last call.
    /// Each returned range is what the host must re-upload.
    pub fn take_dirty(&mut self) -> Vec<DirtyRange> {
        let mut ranges: Vec<DirtyRange> = self
            .groups
            .iter_mut()
            .filter_map(|(key, group)| {
                group.dirty.take().map(|(lo, hi)| DirtyRange {
                    key: *key,
                    start: lo,
                    end: hi + 1,
                })
            })
            .collect();
        ranges.sort_by_key(|r| r.key);
        ranges
    }

    /// The instance buffer of one group, for upload.
    pub fn group_data(&self, key: GroupKey) -> Option<&[InstanceData]> {
        self.groups.get(&key).map(|g| g.data.as_slice())
    }

    /// Raw bytes of one group's buffer.
    pub fn group_bytes(&self, key: GroupKey) -> Option<&[u8]> {
        self.group_data(key).map(bytemuck::cast_slice)
    }

    /// Non-empty groups in submission order: ascending layer, then group
    /// creation order.
    pub fn draw_list(&self) -> Vec<DrawBatch> {
        let mut batches: Vec<DrawBatch> = self
            .groups
            .iter()
            .filter(|(_, g)| g.live > 0)
            .map(|(key, g)| DrawBatch {
                key: *key,
                material: g.material,
                clip: g.clip,
                layer: g.layer,
                instance_count: g.high_water,
            })
            .collect();
        batches.sort_by_key(|b| {
            let reg = self.groups[&b.key].registration;
            (b.layer, reg)
        });
        batches
    }

    /// End-of-tick maintenance: count empty sweeps per group and drop groups
    /// idle past the configured grace period.
    pub fn sweep(&mut self) {
        let grace = self.config.reclaim_after_ticks;
        self.groups.retain(|key, group| {
            if group.live > 0 {
                group.empty_sweeps = 0;
                return true;
            }
            group.empty_sweeps += 1;
            if group.empty_sweeps >= grace {
                log::debug!("reclaiming idle batch group {key:?}");
                false
            } else {
                true
            }
        });
    }
}

impl Default for BatchManager {
    fn default() -> Self {
        Self::new(BatchConfig::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
