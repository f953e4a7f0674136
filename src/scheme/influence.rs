//! Corner influences and per-vertex weight assignment

use glam::{DVec3, IVec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemeError};
use crate::hex::{corner_index, CORNER_COUNT};
use crate::lattice::check_size;

/// Fractional contribution of one source corner to a derived vertex
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawInfluence"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influence {
    corner: usize,
    weight: f64,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawInfluence {
    corner: usize,
    weight: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawInfluence> for Influence {
    type Error = SchemeError;

    fn try_from(raw: RawInfluence) -> Result<Self> {
        Influence::try_new(raw.corner, raw.weight)
    }
}

impl Influence {
    /// Create an influence, rejecting bad input
    ///
    /// # Errors
    ///
    /// Returns `InvalidInfluence` if `corner >= 8` or `weight` is not a
    /// finite positive number.
    pub fn try_new(corner: usize, weight: f64) -> Result<Self> {
        if corner >= CORNER_COUNT || !weight.is_finite() || weight <= 0.0 {
            return Err(SchemeError::InvalidInfluence { corner, weight });
        }
        Ok(Self { corner, weight })
    }

    /// Create an influence
    ///
    /// # Panics
    ///
    /// Panics if `corner >= 8` or `weight` is not a finite positive number.
    /// Inside the compiler such a value means the weight computation is
    /// broken, so it must never reach an exported scheme.
    pub fn new(corner: usize, weight: f64) -> Self {
        match Self::try_new(corner, weight) {
            Ok(influence) => influence,
            Err(err) => panic!("{err}"),
        }
    }

    /// Source corner index (0..8)
    #[inline]
    pub fn corner(&self) -> usize {
        self.corner
    }

    /// Weight of the corner
    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// A distinct lattice position expressed through the source corners
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawCompiledVertex"))]
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledVertex {
    influences: Vec<Influence>,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawCompiledVertex {
    influences: Vec<Influence>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawCompiledVertex> for CompiledVertex {
    type Error = SchemeError;

    fn try_from(raw: RawCompiledVertex) -> Result<Self> {
        CompiledVertex::from_influences(raw.influences)
    }
}

impl CompiledVertex {
    /// Weights for lattice coordinate `coord` on a lattice of `size`
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if `size` is outside `[1, MAX_LATTICE_SIZE]`
    /// and `OutOfRangeCoordinate` if `coord` is outside `[0, size]^3`.
    pub fn for_coord(coord: IVec3, size: i32) -> Result<Self> {
        check_size(size)?;
        if coord.min_element() < 0 || coord.max_element() > size {
            return Err(SchemeError::OutOfRangeCoordinate { coord, size });
        }
        Ok(Self::for_coord_unchecked(coord, size))
    }

    /// Weight assignment for a coordinate already known to be in range
    ///
    /// Axes where the coordinate sits at 0 or `size` are *extreme*; with `k`
    /// extreme axes, `2^(3 - k)` corners contribute: the cell corner itself,
    /// the two ends of an edge, the four corners of a face, or all eight.
    /// Each contributor is weighted by its lattice-space distance to
    /// `coord`, divided by the sum of those distances.
    pub(crate) fn for_coord_unchecked(coord: IVec3, size: i32) -> Self {
        let mut extreme = [None::<bool>; 3];
        for d in 0..3 {
            if coord[d] == 0 || coord[d] == size {
                extreme[d] = Some(coord[d] == size);
            }
        }
        let free_axes = extreme.iter().filter(|e| e.is_none()).count();
        let source_count = 1usize << free_axes;

        let point = coord.as_dvec3();
        let mut contributors = Vec::with_capacity(source_count);
        let mut dist_sum = 0.0;
        for i in 0..source_count {
            let mut at_max = [false; 3];
            let mut free_bit = 0;
            for (d, ext) in extreme.iter().enumerate() {
                at_max[d] = match ext {
                    Some(max) => *max,
                    None => {
                        let set = i & (1 << free_bit) != 0;
                        free_bit += 1;
                        set
                    }
                };
            }
            let corner = corner_index(at_max);
            let position =
                DVec3::from_array(at_max.map(|set| if set { f64::from(size) } else { 0.0 }));
            let dist = point.distance(position);
            dist_sum += dist;
            contributors.push((corner, dist));
        }

        let influences = if source_count > 1 {
            contributors
                .into_iter()
                .map(|(corner, dist)| Influence::new(corner, dist / dist_sum))
                .collect()
        } else {
            vec![Influence::new(contributors[0].0, 1.0)]
        };
        Self { influences }
    }

    /// Build from an explicit influence list
    ///
    /// # Errors
    ///
    /// Returns `InvalidInfluence` if the list is empty.
    pub fn from_influences(influences: Vec<Influence>) -> Result<Self> {
        if influences.is_empty() {
            return Err(SchemeError::InvalidInfluence {
                corner: CORNER_COUNT,
                weight: 0.0,
            });
        }
        Ok(Self { influences })
    }

    /// Contributing corners and their weights
    #[inline]
    pub fn influences(&self) -> &[Influence] {
        &self.influences
    }

    /// Number of contributing corners
    #[inline]
    pub fn len(&self) -> usize {
        self.influences.len()
    }

    /// Always false: every constructor requires at least one influence
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.influences.is_empty()
    }

    /// Sum of all weights
    pub fn weight_sum(&self) -> f64 {
        self.influences.iter().map(Influence::weight).sum()
    }

    /// Position of this vertex inside an arbitrary hexahedron
    pub fn evaluate(&self, corners: &[DVec3; 8]) -> DVec3 {
        self.influences
            .iter()
            .map(|inf| corners[inf.corner] * inf.weight)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_influence_validation() {
        assert!(Influence::try_new(7, 0.5).is_ok());
        assert!(Influence::try_new(8, 0.5).is_err());
        assert!(Influence::try_new(0, 0.0).is_err());
        assert!(Influence::try_new(0, -0.1).is_err());
        assert!(Influence::try_new(0, f64::NAN).is_err());
        assert!(Influence::try_new(0, f64::INFINITY).is_err());
    }

    #[test]
    #[should_panic(expected = "invalid influence")]
    fn test_influence_new_panics() {
        let _ = Influence::new(9, 1.0);
    }

    #[test]
    fn test_corner_single_influence() {
        for (i, coord) in crate::transform::cube_verts_sized(3).iter().enumerate() {
            let vert = CompiledVertex::for_coord(*coord, 3).unwrap();
            assert_eq!(vert.len(), 1);
            assert_eq!(vert.influences()[0].corner(), i);
            assert_eq!(vert.influences()[0].weight(), 1.0);
        }
    }

    #[test]
    fn test_edge_point() {
        // x free, y at 0, z at max
        let vert = CompiledVertex::for_coord(IVec3::new(1, 0, 3), 3).unwrap();
        let corners: Vec<usize> = vert.influences().iter().map(|i| i.corner()).collect();
        assert_eq!(corners, vec![4, 5]);
        // corner 4 is at distance 1, corner 5 at distance 2
        assert_relative_eq!(vert.influences()[0].weight(), 1.0 / 3.0);
        assert_relative_eq!(vert.influences()[1].weight(), 2.0 / 3.0);
    }

    #[test]
    fn test_face_point() {
        let vert = CompiledVertex::for_coord(IVec3::new(1, 1, 0), 2).unwrap();
        assert_eq!(vert.len(), 4);
        let mut corners: Vec<usize> = vert.influences().iter().map(|i| i.corner()).collect();
        corners.sort_unstable();
        assert_eq!(corners, vec![0, 1, 2, 3]);
        for inf in vert.influences() {
            assert!(inf.weight() > 0.0);
            assert_relative_eq!(inf.weight(), 0.25);
        }
        assert_relative_eq!(vert.weight_sum(), 1.0);
    }

    #[test]
    fn test_interior_point() {
        let vert = CompiledVertex::for_coord(IVec3::new(1, 1, 1), 4).unwrap();
        assert_eq!(vert.len(), 8);
        assert_relative_eq!(vert.weight_sum(), 1.0, epsilon = 1e-12);
        // the farthest corner carries the largest weight
        let heaviest = vert
            .influences()
            .iter()
            .max_by(|a, b| a.weight().total_cmp(&b.weight()))
            .unwrap();
        assert_eq!(heaviest.corner(), 7);
    }

    #[test]
    fn test_normalization_everywhere() {
        let size = 4;
        for z in 0..=size {
            for y in 0..=size {
                for x in 0..=size {
                    let vert = CompiledVertex::for_coord(IVec3::new(x, y, z), size).unwrap();
                    assert!(vert.influences().iter().all(|i| i.weight() > 0.0));
                    assert_relative_eq!(vert.weight_sum(), 1.0, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_out_of_domain() {
        assert!(matches!(
            CompiledVertex::for_coord(IVec3::new(0, 0, 5), 4),
            Err(SchemeError::OutOfRangeCoordinate { size: 4, .. })
        ));
        assert!(matches!(
            CompiledVertex::for_coord(IVec3::ZERO, 0),
            Err(SchemeError::InvalidSize { size: 0, .. })
        ));
        assert!(CompiledVertex::from_influences(Vec::new()).is_err());
        assert!(matches!(
            CompiledVertex::for_coord(IVec3::ZERO, i32::MAX),
            Err(SchemeError::InvalidSize { max: crate::lattice::MAX_LATTICE_SIZE, .. })
        ));
    }

    #[test]
    fn test_from_influences_keeps_order() {
        let list = vec![Influence::new(6, 0.25), Influence::new(1, 0.75)];
        let vert = CompiledVertex::from_influences(list.clone()).unwrap();
        assert_eq!(vert.influences(), list.as_slice());
        assert_relative_eq!(vert.weight_sum(), 1.0);
    }

    #[test]
    fn test_evaluate_corner() {
        let cell = crate::hex::SourceCell::cube(2.0);
        let vert = CompiledVertex::for_coord(IVec3::new(0, 5, 5), 5).unwrap();
        assert_eq!(vert.evaluate(cell.corners()), cell.corner(6));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_influence_serde_validates() {
        let ok: Influence = serde_json::from_str(r#"{"corner":3,"weight":0.5}"#).unwrap();
        assert_eq!(ok.corner(), 3);
        assert!(serde_json::from_str::<Influence>(r#"{"corner":3,"weight":-1.0}"#).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_vertex_serde_rejects_empty() {
        assert!(serde_json::from_str::<CompiledVertex>(r#"{"influences":[]}"#).is_err());
        let vert: CompiledVertex =
            serde_json::from_str(r#"{"influences":[{"corner":2,"weight":1.0}]}"#).unwrap();
        assert_eq!(vert.influences(), &[Influence::new(2, 1.0)]);
    }
}
