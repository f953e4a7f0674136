//! Deformable sampling lattice
//!
//! A [`Lattice`] stores one interpolated point per integer coordinate in
//! `[0, size]^3`, laid out with x varying fastest. Points are produced by
//! trilinear interpolation of the [`SourceCell`] corners and kept in single
//! precision; lookups widen them back to `f64`.
//!
//! The whole buffer is replaced on every [`Lattice::make`]. Indices and
//! coordinates obtained before a rebuild must not be reused afterwards,
//! since the coordinate/index mapping depends on the size.

use glam::{DVec3, IVec3, Vec2, Vec3};
use tracing::debug;

use crate::error::{Result, SchemeError};
use crate::hex::{HexCoords, HexPoints, HexVerts, SourceCell};

/// Largest lattice size accepted anywhere in the crate
///
/// The lattice and the deduplication table both hold `(size + 1)^3` entries.
pub const MAX_LATTICE_SIZE: i32 = 64;

/// Reject sizes outside `[1, MAX_LATTICE_SIZE]`
pub(crate) fn check_size(size: i32) -> Result<()> {
    if !(1..=MAX_LATTICE_SIZE).contains(&size) {
        return Err(SchemeError::InvalidSize {
            size,
            max: MAX_LATTICE_SIZE,
        });
    }
    Ok(())
}

/// Blend two endpoints
#[inline]
fn lerp1(src: [Vec3; 2], alpha: f32) -> Vec3 {
    src[0] * (1.0 - alpha) + src[1] * alpha
}

/// Blend a face's four corners (x then y)
#[inline]
fn lerp2(src: [Vec3; 4], alpha: Vec2) -> Vec3 {
    let y1 = lerp1([src[0], src[1]], alpha.x);
    let y2 = lerp1([src[2], src[3]], alpha.x);
    lerp1([y1, y2], alpha.y)
}

/// Blend the cell's eight corners (x, y, then z)
#[inline]
fn lerp3(src: &HexVerts<Vec3>, alpha: Vec3) -> Vec3 {
    let z1 = lerp2([src[0], src[1], src[2], src[3]], alpha.truncate());
    let z2 = lerp2([src[4], src[5], src[6], src[7]], alpha.truncate());
    lerp1([z1, z2], alpha.z)
}

/// Ray used for nearest-point queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayQuery {
    /// Ray origin
    pub origin: DVec3,
    /// Ray direction (need not be normalized)
    pub direction: DVec3,
    /// Ignore points whose closest approach lies behind the origin
    pub skip_behind: bool,
}

impl RayQuery {
    /// Ray that considers every point, including those behind the origin
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction,
            skip_behind: false,
        }
    }

    /// Toggle filtering of points behind the origin
    pub fn skip_behind(mut self, skip: bool) -> Self {
        self.skip_behind = skip;
        self
    }
}

/// Squared distance from a point to a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayDistance {
    /// Squared distance
    pub sqr_distance: f32,
    /// The point projects before the ray origin
    pub behind: bool,
}

/// Result of a nearest-to-ray query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Linear index of the closest point
    pub index: usize,
    /// Lattice coordinate of the closest point
    pub coord: IVec3,
    /// Squared distance from the point to the ray
    pub sqr_distance: f32,
    /// The closest approach lies behind the ray origin
    pub behind: bool,
}

/// Squared distance from `point` to the ray starting at `origin`
///
/// Points projecting before the origin measure to the origin itself and are
/// flagged as behind; all others use the perpendicular distance to the line.
pub fn ray_sqr_distance(origin: Vec3, direction: Vec3, point: Vec3) -> RayDistance {
    let to_point = point - origin;
    let dir_len_sq = direction.length_squared();
    if dir_len_sq <= 0.0 {
        return RayDistance {
            sqr_distance: to_point.length_squared(),
            behind: false,
        };
    }
    let t = to_point.dot(direction) / dir_len_sq;
    if t < 0.0 {
        RayDistance {
            sqr_distance: to_point.length_squared(),
            behind: true,
        }
    } else {
        RayDistance {
            sqr_distance: (to_point - direction * t).length_squared(),
            behind: false,
        }
    }
}

/// Regular grid of interpolated points inside a deformed hexahedron
#[derive(Debug, Clone, Default)]
pub struct Lattice {
    size: i32,
    points: Vec<Vec3>,
}

impl Lattice {
    /// Empty lattice; call [`Lattice::make`] before querying
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a lattice in one step
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if `size` is outside `[1, MAX_LATTICE_SIZE]`.
    pub fn build(size: i32, source: &SourceCell) -> Result<Self> {
        let mut lattice = Self::new();
        lattice.make(size, source)?;
        Ok(lattice)
    }

    /// Rebuild all `(size + 1)^3` points for `source`
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if `size` is outside `[1, MAX_LATTICE_SIZE]`.
    /// The lattice is left untouched.
    pub fn make(&mut self, size: i32, source: &SourceCell) -> Result<()> {
        check_size(size)?;
        let corners: HexVerts<Vec3> = source.corners().map(|c| c.as_vec3());
        let layers = size + 1;
        let scale = size as f32;

        let mut points = Vec::with_capacity((layers as usize).pow(3));
        for z in 0..layers {
            for y in 0..layers {
                for x in 0..layers {
                    // division keeps alpha exactly 1.0 on the max faces
                    let alpha = IVec3::new(x, y, z).as_vec3() / scale;
                    points.push(lerp3(&corners, alpha));
                }
            }
        }

        debug!(size, points = points.len(), "rebuilt lattice");
        self.size = size;
        self.points = points;
        Ok(())
    }

    /// Active subdivision size (0 before the first build)
    #[inline]
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Number of stored points
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the lattice has not been built yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether `coord` lies in `[0, size]^3`
    #[inline]
    pub fn contains(&self, coord: IVec3) -> bool {
        !self.is_empty() && coord.min_element() >= 0 && coord.max_element() <= self.size
    }

    /// Linear index of `coord`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRangeCoordinate` if `coord` is outside the lattice.
    pub fn index(&self, coord: IVec3) -> Result<usize> {
        if !self.contains(coord) {
            return Err(SchemeError::OutOfRangeCoordinate {
                coord,
                size: self.size,
            });
        }
        Ok(linear_index(coord, self.size + 1))
    }

    /// Lattice coordinate of linear index `index`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRangeIndex` if `index >= len()`.
    pub fn coord(&self, index: usize) -> Result<IVec3> {
        if index >= self.points.len() {
            return Err(SchemeError::OutOfRangeIndex {
                index,
                len: self.points.len(),
            });
        }
        Ok(linear_coord(index, self.size + 1))
    }

    /// Point at linear index `index`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRangeIndex` if `index >= len()`.
    pub fn point_at(&self, index: usize) -> Result<DVec3> {
        self.points
            .get(index)
            .map(|p| p.as_dvec3())
            .ok_or(SchemeError::OutOfRangeIndex {
                index,
                len: self.points.len(),
            })
    }

    /// Point at lattice coordinate `coord`
    ///
    /// # Errors
    ///
    /// Returns `OutOfRangeCoordinate` if `coord` is outside the lattice.
    pub fn point(&self, coord: IVec3) -> Result<DVec3> {
        let index = self.index(coord)?;
        Ok(self.points[index].as_dvec3())
    }

    /// World positions of a child's 8 corners
    ///
    /// # Errors
    ///
    /// Returns `OutOfRangeCoordinate` for the first corner outside the lattice.
    pub fn points_of(&self, coords: &HexCoords) -> Result<HexPoints> {
        let mut out = [DVec3::ZERO; 8];
        for (slot, &coord) in out.iter_mut().zip(coords) {
            *slot = self.point(coord)?;
        }
        Ok(out)
    }

    /// Internal single-precision buffer
    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Whole buffer widened to `f64`
    pub fn real_points(&self) -> Vec<DVec3> {
        self.points.iter().map(|p| p.as_dvec3()).collect()
    }

    /// Index of the point closest to the ray over the whole lattice
    ///
    /// Returns `None` if the lattice is empty, or if every point was
    /// filtered out by `skip_behind`.
    pub fn closest_to_ray(&self, ray: &RayQuery) -> Option<RayHit> {
        if self.is_empty() {
            return None;
        }
        self.closest_in(ray, IVec3::ZERO, IVec3::splat(self.size))
    }

    /// Index of the point closest to the ray within `[min, max]` (inclusive)
    ///
    /// # Errors
    ///
    /// Returns `InvalidBounds` if the box is inverted or leaves the lattice.
    pub fn closest_to_ray_within(
        &self,
        ray: &RayQuery,
        min: IVec3,
        max: IVec3,
    ) -> Result<Option<RayHit>> {
        if !self.contains(min) || !self.contains(max) || min.cmpgt(max).any() {
            return Err(SchemeError::InvalidBounds { min, max });
        }
        Ok(self.closest_in(ray, min, max))
    }

    fn closest_in(&self, ray: &RayQuery, min: IVec3, max: IVec3) -> Option<RayHit> {
        let origin = ray.origin.as_vec3();
        let direction = ray.direction.as_vec3();
        let layers = self.size + 1;

        let mut best: Option<RayHit> = None;
        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    let coord = IVec3::new(x, y, z);
                    let index = linear_index(coord, layers);
                    let dist = ray_sqr_distance(origin, direction, self.points[index]);
                    if ray.skip_behind && dist.behind {
                        continue;
                    }
                    if best.map_or(true, |b| dist.sqr_distance < b.sqr_distance) {
                        best = Some(RayHit {
                            index,
                            coord,
                            sqr_distance: dist.sqr_distance,
                            behind: dist.behind,
                        });
                    }
                }
            }
        }
        best
    }
}

/// `z * layers^2 + y * layers + x`
#[inline]
pub(crate) fn linear_index(coord: IVec3, layers: i32) -> usize {
    let layers = layers as usize;
    coord.z as usize * layers * layers + coord.y as usize * layers + coord.x as usize
}

/// Inverse of [`linear_index`]
#[inline]
pub(crate) fn linear_coord(index: usize, layers: i32) -> IVec3 {
    let layers = layers as usize;
    let x = index % layers;
    let rest = index / layers;
    IVec3::new(x as i32, (rest % layers) as i32, (rest / layers) as i32)
}
