//! Child records owned by a session

use glam::IVec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::hex::{has_duplicate_corners, hex_max_component, HexCoords};

/// One child hexahedron plus its editor flags
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    verts: HexCoords,
    valid: bool,
    max_size: i32,
    /// Shown when nothing is selected
    pub visible: bool,
    /// Part of the current selection
    pub selected: bool,
}

impl Child {
    /// Visible, unselected child with the given corners
    pub fn new(verts: HexCoords) -> Self {
        Self {
            verts,
            valid: !has_duplicate_corners(&verts),
            max_size: hex_max_component(&verts),
            visible: true,
            selected: false,
        }
    }

    /// Corner coordinates
    #[inline]
    pub fn verts(&self) -> &HexCoords {
        &self.verts
    }

    /// Replace the corners and refresh derived state
    pub fn set_verts(&mut self, verts: HexCoords) {
        self.verts = verts;
        self.valid = !has_duplicate_corners(&verts);
        self.max_size = hex_max_component(&verts);
    }

    /// No two corners coincide
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Smallest lattice size able to hold this child
    #[inline]
    pub fn max_size(&self) -> i32 {
        self.max_size
    }

    /// Whether every corner lies in `[min, max]`
    pub fn within(&self, min: IVec3, max: IVec3) -> bool {
        self.verts
            .iter()
            .all(|v| v.cmpge(min).all() && v.cmple(max).all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::cube_verts;

    #[test]
    fn test_derived_state() {
        let mut child = Child::new(cube_verts(IVec3::ZERO, IVec3::new(1, 2, 1)));
        assert!(child.is_valid());
        assert_eq!(child.max_size(), 2);
        assert!(child.visible);
        assert!(!child.selected);

        let mut verts = *child.verts();
        verts[3] = verts[2];
        child.set_verts(verts);
        assert!(!child.is_valid());
    }

    #[test]
    fn test_within() {
        let child = Child::new(cube_verts(IVec3::ONE, IVec3::splat(2)));
        assert!(child.within(IVec3::ZERO, IVec3::splat(2)));
        assert!(!child.within(IVec3::splat(2), IVec3::splat(3)));
    }
}
