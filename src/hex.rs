//! Hexahedron corner tuples and the source cell
//!
//! Every 8-corner tuple in this crate follows the same convention: bit `d`
//! of corner index `i` tells whether axis `d` (x = bit 0, y = bit 1,
//! z = bit 2) sits at its maximum. Corner 0 is the all-min corner and
//! corner 7 the all-max corner.

use glam::{DVec3, IVec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Eight values, one per hexahedron corner
pub type HexVerts<T> = [T; 8];

/// Corners addressed by integer lattice coordinates
pub type HexCoords = HexVerts<IVec3>;

/// Corners in world space
pub type HexPoints = HexVerts<DVec3>;

/// Number of corners of a hexahedron
pub const CORNER_COUNT: usize = 8;

/// Coordinate axis
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    /// All three axes in order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index of this axis
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The two remaining axes, in cyclic order
    #[inline]
    pub const fn others(self) -> (Axis, Axis) {
        match self {
            Axis::X => (Axis::Y, Axis::Z),
            Axis::Y => (Axis::Z, Axis::X),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }
}

/// Whether corner `corner` sits at the maximum along `axis`
#[inline]
pub const fn corner_is_max(corner: usize, axis: usize) -> bool {
    corner & (1 << axis) != 0
}

/// Corner index whose per-axis extremes are given by `at_max`
#[inline]
pub fn corner_index(at_max: [bool; 3]) -> usize {
    at_max
        .iter()
        .enumerate()
        .fold(0, |acc, (d, &set)| if set { acc | (1 << d) } else { acc })
}

/// Largest coordinate component over all corners
///
/// This is the smallest lattice size able to represent the child.
pub fn hex_max_component(coords: &HexCoords) -> i32 {
    coords.iter().map(|c| c.max_element()).max().unwrap_or(0)
}

/// Whether any two corners share the same coordinate
pub fn has_duplicate_corners(coords: &HexCoords) -> bool {
    (0..CORNER_COUNT).any(|i| (i + 1..CORNER_COUNT).any(|j| coords[i] == coords[j]))
}

/// The deformed hexahedron being refined
///
/// Holds 8 world-space corners in the crate's corner-bit order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceCell {
    corners: HexPoints,
}

impl SourceCell {
    /// Wrap 8 corner positions
    pub fn new(corners: HexPoints) -> Self {
        Self { corners }
    }

    /// The unit cube `[0, 1]^3`
    pub fn unit_cube() -> Self {
        Self::from_box(DVec3::ZERO, DVec3::ONE)
    }

    /// Cube centered at the origin with the given half extent
    pub fn cube(half_extent: f64) -> Self {
        Self::from_box(DVec3::splat(-half_extent), DVec3::splat(half_extent))
    }

    /// Axis-aligned box between `min` and `max`
    pub fn from_box(min: DVec3, max: DVec3) -> Self {
        Self::new(crate::transform::cube_verts(min, max))
    }

    /// Corner `i` (0..8)
    #[inline]
    pub fn corner(&self, i: usize) -> DVec3 {
        self.corners[i]
    }

    /// All 8 corners
    #[inline]
    pub fn corners(&self) -> &HexPoints {
        &self.corners
    }

    /// Replace one corner
    pub fn set_corner(&mut self, i: usize, position: DVec3) {
        self.corners[i] = position;
    }
}

impl Default for SourceCell {
    fn default() -> Self {
        Self::unit_cube()
    }
}

impl From<HexPoints> for SourceCell {
    fn from(corners: HexPoints) -> Self {
        Self::new(corners)
    }
}
