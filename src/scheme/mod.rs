//! Scheme compilation
//!
//! Turns a set of child hexahedra, given as lattice coordinates, into a
//! [`CompiledScheme`]: a deduplicated table of vertices expressed through
//! the 8 source corners, plus one 8-tuple of vertex indices per child.
//!
//! Expressing vertices relative to the source corners rather than in world
//! space is what lets a scheme be replayed inside any other (deformed)
//! hexahedron. Children that share a face reference the same vertex slots,
//! so a consumer can stitch them without seams.

mod influence;
mod key;

pub use influence::{CompiledVertex, Influence};
pub use key::CoordKey;

use std::fmt::Write as _;

use glam::DVec3;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemeError};
use crate::hex::{HexCoords, HexPoints, HexVerts};
use crate::lattice::check_size;
pub(crate) use key::SlotTable;

/// Vertex indices of one compiled child
pub type HexIndices = HexVerts<usize>;

/// Deduplicated, corner-relative representation of a set of children
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawCompiledScheme"))]
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledScheme {
    size: i32,
    vertices: Vec<CompiledVertex>,
    indices: Vec<HexIndices>,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawCompiledScheme {
    size: i32,
    vertices: Vec<CompiledVertex>,
    indices: Vec<HexIndices>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawCompiledScheme> for CompiledScheme {
    type Error = SchemeError;

    fn try_from(raw: RawCompiledScheme) -> Result<Self> {
        check_size(raw.size)?;
        let len = raw.vertices.len();
        if let Some(&index) = raw.indices.iter().flatten().find(|&&i| i >= len) {
            return Err(SchemeError::OutOfRangeIndex { index, len });
        }
        Ok(Self {
            size: raw.size,
            vertices: raw.vertices,
            indices: raw.indices,
        })
    }
}

impl CompiledScheme {
    /// Compile `children` defined on a lattice of `size`
    ///
    /// Compiling zero children yields an empty scheme.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if `size` is outside `[1, MAX_LATTICE_SIZE]`, or
    /// `OutOfRangeCoordinate` for the first corner outside `[0, size]^3`.
    /// Validation happens before any table is allocated.
    pub fn build(children: &[HexCoords], size: i32) -> Result<Self> {
        check_size(size)?;
        if let Some(&coord) = children
            .iter()
            .flatten()
            .find(|c| c.min_element() < 0 || c.max_element() > size)
        {
            return Err(SchemeError::OutOfRangeCoordinate { coord, size });
        }

        let mut table = SlotTable::new(size)?;
        let mut vertices: Vec<CompiledVertex> = Vec::with_capacity(children.len() * 2);
        let mut indices = Vec::with_capacity(children.len());
        for child in children {
            let child_indices: HexIndices = std::array::from_fn(|i| {
                let coord = child[i];
                table.get_or_insert_with(coord, || {
                    vertices.push(CompiledVertex::for_coord_unchecked(coord, size));
                    vertices.len() - 1
                })
            });
            indices.push(child_indices);
        }
        vertices.shrink_to_fit();

        debug!(
            size,
            children = children.len(),
            vertices = vertices.len(),
            "compiled refinement scheme"
        );
        Ok(Self {
            size,
            vertices,
            indices,
        })
    }

    /// Lattice size the scheme was compiled for
    #[inline]
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Distinct vertices, in first-seen order
    #[inline]
    pub fn vertices(&self) -> &[CompiledVertex] {
        &self.vertices
    }

    /// One index tuple per child, in each child's original corner order
    #[inline]
    pub fn indices(&self) -> &[HexIndices] {
        &self.indices
    }

    /// Number of compiled children
    #[inline]
    pub fn child_count(&self) -> usize {
        self.indices.len()
    }

    /// Whether the scheme has no children
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Child corner positions when the scheme is replayed inside `corners`
    pub fn apply(&self, corners: &HexPoints) -> Vec<HexPoints> {
        let positions: Vec<DVec3> = self.vertices.iter().map(|v| v.evaluate(corners)).collect();
        self.indices
            .iter()
            .map(|child| child.map(|i| positions[i]))
            .collect()
    }

    /// Low-level influence table, one block per child
    ///
    /// Each corner line lists its `{corner, weight}` pairs; the text is meant
    /// to be pasted into a generated source table.
    pub fn cpp_code(&self) -> String {
        let mut out = String::from("{\n");
        for child in &self.indices {
            out.push_str("\t{\n");
            for &vert in child {
                out.push_str("\t\t{");
                for inf in self.vertices[vert].influences() {
                    let _ = write!(out, "{{{}, {}}},", inf.corner(), inf.weight());
                }
                out.push_str("},\n");
            }
            out.push_str("\n\t},\n");
        }
        out.push('}');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::SourceCell;
    use crate::transform::{cube_verts, cube_verts_sized};
    use approx::assert_relative_eq;
    use glam::IVec3;

    fn octant(min: IVec3) -> HexCoords {
        cube_verts(min, min + IVec3::ONE)
    }

    #[test]
    fn test_empty_export() {
        let scheme = CompiledScheme::build(&[], 3).unwrap();
        assert!(scheme.is_empty());
        assert!(scheme.vertices().is_empty());
        assert_eq!(scheme.cpp_code(), "{\n}");
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            CompiledScheme::build(&[octant(IVec3::ZERO)], 0),
            Err(SchemeError::InvalidSize { size: 0, .. })
        ));
        assert!(matches!(
            CompiledScheme::build(&[octant(IVec3::new(1, 0, 0))], 1),
            Err(SchemeError::OutOfRangeCoordinate { size: 1, .. })
        ));
    }

    #[test]
    fn test_size_upper_bound() {
        let whole = cube_verts_sized(1);
        assert_eq!(
            CompiledScheme::build(&[whole], i32::MAX),
            Err(SchemeError::InvalidSize {
                size: i32::MAX,
                max: crate::lattice::MAX_LATTICE_SIZE
            })
        );
        let max = crate::lattice::MAX_LATTICE_SIZE;
        let scheme = CompiledScheme::build(&[cube_verts_sized(max)], max).unwrap();
        assert_eq!(scheme.vertices().len(), 8);
    }

    #[test]
    fn test_whole_cell_is_identity() {
        let scheme = CompiledScheme::build(&[cube_verts_sized(1)], 1).unwrap();
        assert_eq!(scheme.vertices().len(), 8);
        assert_eq!(scheme.indices(), &[[0, 1, 2, 3, 4, 5, 6, 7]]);
        for (i, vert) in scheme.vertices().iter().enumerate() {
            assert_eq!(vert.influences(), &[Influence::new(i, 1.0)]);
        }
    }

    #[test]
    fn test_octant_scheme() {
        // half-size octant: corners at {0,1}^3 on a size-2 lattice, so only
        // the origin is a source corner and (1,1,1) is interior
        let child = octant(IVec3::ZERO);
        let scheme = CompiledScheme::build(&[child], 2).unwrap();
        assert_eq!(scheme.vertices().len(), 8);
        assert_eq!(scheme.indices(), &[[0, 1, 2, 3, 4, 5, 6, 7]]);
        assert_eq!(scheme.vertices()[0].len(), 1);
        assert_eq!(scheme.vertices()[7].len(), 8);
    }

    #[test]
    fn test_shared_face_dedup() {
        let left = octant(IVec3::ZERO);
        let right = octant(IVec3::new(1, 0, 0));
        let scheme = CompiledScheme::build(&[left, right], 2).unwrap();
        assert_eq!(scheme.vertices().len(), 12);

        let [a, b] = [scheme.indices()[0], scheme.indices()[1]];
        // right face of `left` (x = 1) is the left face of `right`
        for (l, r) in [(1, 0), (3, 2), (5, 4), (7, 6)] {
            assert_eq!(a[l], b[r]);
        }
    }

    #[test]
    fn test_full_subdivision_counts() {
        let size = 3;
        let mut children = Vec::new();
        for z in 0..size {
            for y in 0..size {
                for x in 0..size {
                    children.push(octant(IVec3::new(x, y, z)));
                }
            }
        }
        let scheme = CompiledScheme::build(&children, size).unwrap();
        assert_eq!(scheme.child_count(), 27);
        assert_eq!(scheme.vertices().len(), 64);
        for vert in scheme.vertices() {
            assert!(vert.influences().iter().all(|i| i.weight() > 0.0));
            assert_relative_eq!(vert.weight_sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_indices_keep_corner_order() {
        let mut child = octant(IVec3::ZERO);
        child.swap(0, 7);
        let scheme = CompiledScheme::build(&[child], 2).unwrap();
        // first-seen order follows the child's own corner order
        assert_eq!(scheme.indices()[0], [0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(scheme.vertices()[0].len(), 8);
        assert_eq!(scheme.vertices()[7].len(), 1);
    }

    #[test]
    fn test_apply_to_source_corners() {
        let scheme = CompiledScheme::build(&[cube_verts_sized(2)], 2).unwrap();
        let cell = SourceCell::cube(3.0);
        let children = scheme.apply(cell.corners());
        assert_eq!(children.len(), 1);
        assert_eq!(&children[0], cell.corners());
    }

    #[test]
    fn test_cpp_code() {
        let scheme = CompiledScheme::build(&[cube_verts_sized(1)], 1).unwrap();
        let code = scheme.cpp_code();
        assert!(code.starts_with("{\n\t{\n\t\t{{0, 1},},\n\t\t{{1, 1},},"));
        assert!(code.ends_with("\t\t{{7, 1},},\n\n\t},\n}"));
    }

    #[test]
    fn test_cpp_code_weights_round_trip() {
        let scheme = CompiledScheme::build(&[octant(IVec3::ONE)], 3).unwrap();
        let code = scheme.cpp_code();
        let mut parsed = Vec::new();
        for pair in code.split('{').filter(|s| s.contains(", ")) {
            let body = pair.split('}').next().unwrap();
            let (_, weight) = body.split_once(", ").unwrap();
            parsed.push(weight.parse::<f64>().unwrap());
        }
        let expected: Vec<f64> = scheme.indices()[0]
            .iter()
            .flat_map(|&v| scheme.vertices()[v].influences().iter().map(|i| i.weight()))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_scheme_serialization() {
        // edge midpoints only, so every weight is exactly 1 or 0.5
        let half = cube_verts(IVec3::ZERO, IVec3::new(1, 2, 2));
        let scheme = CompiledScheme::build(&[half], 2).unwrap();
        let json = serde_json::to_string(&scheme).unwrap();
        let restored: CompiledScheme = serde_json::from_str(&json).unwrap();
        assert_eq!(scheme, restored);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rejects_dangling_index() {
        let json = r#"{"size":1,"vertices":[],"indices":[[0,0,0,0,0,0,0,0]]}"#;
        assert!(serde_json::from_str::<CompiledScheme>(json).is_err());

        let empty_vertex = r#"{"size":1,"vertices":[{"influences":[]}],"indices":[[0,0,0,0,0,0,0,0]]}"#;
        assert!(serde_json::from_str::<CompiledScheme>(empty_vertex).is_err());

        let huge = r#"{"size":2147483647,"vertices":[],"indices":[]}"#;
        assert!(serde_json::from_str::<CompiledScheme>(huge).is_err());

        let ok = r#"{"size":1,"vertices":[{"influences":[{"corner":0,"weight":1.0}]}],"indices":[[0,0,0,0,0,0,0,0]]}"#;
        let scheme: CompiledScheme = serde_json::from_str(ok).unwrap();
        assert_eq!(scheme.apply(crate::hex::SourceCell::unit_cube().corners())[0][5], DVec3::ZERO);
    }
}
