//! Corner tuple transforms
//!
//! Pure functions that build and edit 8-corner tuples on the lattice.
//! Every function keeps the 8 corners on an axis-aligned box in
//! corner-bit order, so flips and rotations reorder corners as well as
//! moving them.
//!
//! Mirroring and rotation take a *doubled* midpoint: for a lattice of size
//! `n` the midpoint is `n / 2`, which is fractional for odd `n`. Passing
//! `n` instead keeps `new = n - old` integral.

use std::ops::{Add, Div, Index, IndexMut, Mul, Sub};

use glam::{DVec3, IVec3};

use crate::hex::{corner_is_max, Axis, HexVerts, CORNER_COUNT};

/// Corner ordering expected by cinolib-style consumers
pub const CINOLIB_HEX_INDICES: HexVerts<usize> = [0, 1, 3, 2, 4, 5, 7, 6];

/// Three-component vector usable as a hexahedron corner
pub trait CornerVec:
    Copy
    + PartialEq
    + Index<usize, Output = Self::Scalar>
    + IndexMut<usize>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// Component type
    type Scalar: Copy + PartialOrd + Sub<Output = Self::Scalar>;

    /// Component-wise minimum
    fn min_with(self, other: Self) -> Self;

    /// Component-wise maximum
    fn max_with(self, other: Self) -> Self;
}

impl CornerVec for IVec3 {
    type Scalar = i32;

    #[inline]
    fn min_with(self, other: Self) -> Self {
        self.min(other)
    }

    #[inline]
    fn max_with(self, other: Self) -> Self {
        self.max(other)
    }
}

impl CornerVec for DVec3 {
    type Scalar = f64;

    #[inline]
    fn min_with(self, other: Self) -> Self {
        self.min(other)
    }

    #[inline]
    fn max_with(self, other: Self) -> Self {
        self.max(other)
    }
}

/// The 8 corners of the axis-aligned box `[min, max]`
pub fn cube_verts<V: CornerVec>(min: V, max: V) -> HexVerts<V> {
    std::array::from_fn(|i| {
        let mut corner = min;
        for d in 0..3 {
            if corner_is_max(i, d) {
                corner[d] = max[d];
            }
        }
        corner
    })
}

/// The 8 corners of the lattice cube `[0, size]^3`
pub fn cube_verts_sized(size: i32) -> HexVerts<IVec3> {
    cube_verts(IVec3::ZERO, IVec3::splat(size))
}

/// Restore corner-bit order after an arbitrary reordering
///
/// The corners are assumed to span an axis-aligned box; the result is the
/// box's corners in canonical order.
pub fn sort_verts<V: CornerVec>(verts: &HexVerts<V>) -> HexVerts<V> {
    let (min, max) = verts[1..]
        .iter()
        .fold((verts[0], verts[0]), |(lo, hi), &v| (lo.min_with(v), hi.max_with(v)));
    cube_verts(min, max)
}

/// Reorder corners: output corner `i` is input corner `indices[i]`
pub fn index_verts<T: Copy>(verts: &HexVerts<T>, indices: &HexVerts<usize>) -> HexVerts<T> {
    std::array::from_fn(|i| verts[indices[i]])
}

/// Mirror the tuple along `axis` about `double_mid / 2`
pub fn flip_verts<V: CornerVec>(verts: &mut HexVerts<V>, axis: Axis, double_mid: V::Scalar) {
    let d = axis.index();
    for v in verts.iter_mut() {
        v[d] = double_mid - v[d];
    }
    // mirrored corners swap their bit along the flipped axis
    let bit = 1 << d;
    for i in 0..CORNER_COUNT {
        if i & bit == 0 {
            verts.swap(i, i | bit);
        }
    }
}

/// Rotate the tuple a quarter turn about `axis` through `double_mid / 2`
pub fn rotate_verts<V: CornerVec>(verts: &mut HexVerts<V>, axis: Axis, double_mid: V::Scalar) {
    let (a, b) = axis.others();
    let (a, b) = (a.index(), b.index());
    for v in verts.iter_mut() {
        let old_a = v[a];
        v[a] = double_mid - v[b];
        v[b] = old_a;
    }
    *verts = sort_verts(verts);
}

/// Multiply every corner component-wise by `scale`
pub fn scale_verts<V: CornerVec>(verts: &mut HexVerts<V>, scale: V) {
    for v in verts.iter_mut() {
        *v = *v * scale;
    }
}

/// Divide every corner component-wise by `scale`
pub fn inv_scale_verts<V: CornerVec>(verts: &mut HexVerts<V>, scale: V) {
    for v in verts.iter_mut() {
        *v = *v / scale;
    }
}

/// Offset every corner by `offset`
pub fn translate_verts<V: CornerVec>(verts: &mut HexVerts<V>, offset: V) {
    for v in verts.iter_mut() {
        *v = *v + offset;
    }
}
