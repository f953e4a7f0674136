//! Dense keys for lattice coordinates
//!
//! Coordinates are bounded by `[0, size]^3`, so the lattice's linear index
//! is a bijection onto `0..(size + 1)^3`. Deduplication uses that index to
//! address a flat slot table instead of hashing.

use glam::IVec3;

use crate::error::Result;
use crate::lattice::{check_size, linear_coord, linear_index};

/// Bijection between lattice coordinates and dense integer keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordKey {
    layers: i32,
}

impl CoordKey {
    /// Key space for a lattice of `size`
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if `size` is outside `[1, MAX_LATTICE_SIZE]`.
    pub fn new(size: i32) -> Result<Self> {
        check_size(size)?;
        Ok(Self { layers: size + 1 })
    }

    /// Number of distinct keys
    #[inline]
    pub fn len(&self) -> usize {
        (self.layers as usize).pow(3)
    }

    /// Whether the key space is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers <= 0
    }

    /// Key of an in-range coordinate
    #[inline]
    pub fn key(&self, coord: IVec3) -> usize {
        debug_assert!(coord.min_element() >= 0 && coord.max_element() < self.layers);
        linear_index(coord, self.layers)
    }

    /// Coordinate of a key
    #[inline]
    pub fn coord(&self, key: usize) -> IVec3 {
        linear_coord(key, self.layers)
    }
}

/// Direct-addressed map from coordinates to vertex slots
#[derive(Debug, Clone)]
pub(crate) struct SlotTable {
    keys: CoordKey,
    slots: Vec<Option<usize>>,
}

impl SlotTable {
    pub(crate) fn new(size: i32) -> Result<Self> {
        let keys = CoordKey::new(size)?;
        Ok(Self {
            keys,
            slots: vec![None; keys.len()],
        })
    }

    /// Slot already assigned to `coord`, or the one produced by `insert`
    pub(crate) fn get_or_insert_with(&mut self, coord: IVec3, insert: impl FnOnce() -> usize) -> usize {
        let slot = &mut self.slots[self.keys.key(coord)];
        *slot.get_or_insert_with(insert)
    }
}
