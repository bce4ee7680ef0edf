use crate::error::{LayerError, LayerResult};

/// Anything that remembers atlas slots and must follow when they move.
pub trait SlotHolder {
    /// Adds `delta` to every remembered slot for which `affected` holds.
    fn shift_slots(&mut self, affected: impl Fn(usize) -> bool, delta: isize) -> LayerResult<()>;
}

/// Sorted z-keys of the occupied cells; the position of a key is its slot in
/// the atlas buffer.
#[derive(Debug, Clone)]
pub struct AtlasIndex {
    keys: Option<Vec<usize>>,
}

impl Default for AtlasIndex {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl AtlasIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        AtlasIndex {
            keys: Some(Vec::with_capacity(capacity)),
        }
    }

    pub fn keys(&self) -> LayerResult<&[usize]> {
        self.keys.as_deref().ok_or(LayerError::ReleasedState)
    }

    fn keys_mut(&mut self) -> LayerResult<&mut Vec<usize>> {
        self.keys.as_mut().ok_or(LayerError::ReleasedState)
    }

    pub fn len(&self) -> LayerResult<usize> {
        Ok(self.keys()?.len())
    }

    pub fn is_released(&self) -> bool {
        self.keys.is_none()
    }

    /// Slot of a z-key that is known to be occupied.
    pub fn find_existing(&self, z: usize) -> LayerResult<usize> {
        let found = self.keys()?.binary_search(&z);
        debug_assert!(found.is_ok(), "atlas index has no slot for z={z}");
        found.map_err(|_| LayerError::AtlasIndexCorruption { z })
    }

    /// Slot a new z-key would take: the first key strictly greater than `z`.
    pub fn find_insertion_point(&self, z: usize) -> LayerResult<usize> {
        Ok(self.keys()?.partition_point(|&k| k <= z))
    }

    /// Pushes `z` at the end. Only valid when `z` exceeds every key, which
    /// holds while filling a grid in raster order.
    pub fn append_slot(&mut self, z: usize) -> LayerResult<usize> {
        let keys = self.keys_mut()?;
        debug_assert!(keys.last().map_or(true, |&last| last < z));
        keys.push(z);
        Ok(keys.len() - 1)
    }

    /// Inserts `z` keeping the keys sorted, and moves every holder slot at or
    /// after the insertion point one to the right.
    pub fn insert_slot(&mut self, z: usize, holders: &mut impl SlotHolder) -> LayerResult<usize> {
        let slot = self.find_insertion_point(z)?;
        self.keys_mut()?.insert(slot, z);
        holders.shift_slots(|s| s >= slot, 1)?;
        Ok(slot)
    }

    /// Removes `z` and moves every holder slot after it one to the left.
    pub fn remove_slot(&mut self, z: usize, holders: &mut impl SlotHolder) -> LayerResult<usize> {
        let slot = self.find_existing(z)?;
        self.keys_mut()?.remove(slot);
        holders.shift_slots(|s| s > slot, -1)?;
        Ok(slot)
    }

    pub fn release(&mut self) {
        self.keys = None;
    }
}
