//! Source cell, lattice size and clip box of a session

use glam::{DVec3, IVec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::{Result, SchemeError};
use crate::hex::{Axis, SourceCell};

/// Size, displacement and clip box being edited
///
/// The clip box `[clip_min, clip_max]` always satisfies
/// `0 <= clip_min <= clip_max <= size` component-wise.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SourceState {
    size: i32,
    max_size: i32,
    max_extent: f64,
    displacement: SourceCell,
    clip_min: IVec3,
    clip_max: IVec3,
}

impl SourceState {
    /// Initial state: configured size, full clip box and a centered cube
    /// of half extent `max_extent`
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            size: config.initial_size,
            max_size: config.max_size,
            max_extent: config.max_extent,
            displacement: SourceCell::cube(config.max_extent),
            clip_min: IVec3::ZERO,
            clip_max: IVec3::splat(config.initial_size),
        }
    }

    #[inline]
    pub fn size(&self) -> i32 {
        self.size
    }

    #[inline]
    pub fn max_size(&self) -> i32 {
        self.max_size
    }

    #[inline]
    pub fn displacement(&self) -> &SourceCell {
        &self.displacement
    }

    #[inline]
    pub fn clip_min(&self) -> IVec3 {
        self.clip_min
    }

    #[inline]
    pub fn clip_max(&self) -> IVec3 {
        self.clip_max
    }

    fn check_size(&self, size: i32) -> Result<()> {
        if size < 1 || size > self.max_size {
            return Err(SchemeError::InvalidSize {
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }

    /// Change the size and reset the clip box to the whole lattice
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if `size` is outside `[1, max_size]`
    pub fn set_size(&mut self, size: i32) -> Result<()> {
        self.check_size(size)?;
        self.size = size;
        self.reset_clip();
        Ok(())
    }

    /// Grow the size without touching the clip box
    pub(crate) fn grow_to(&mut self, size: i32) -> Result<()> {
        self.check_size(size)?;
        self.size = self.size.max(size);
        Ok(())
    }

    /// Double the size and the clip box
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if twice the size exceeds `max_size`
    pub fn double_size(&mut self) -> Result<()> {
        let doubled = self.size.saturating_mul(2);
        self.check_size(doubled)?;
        self.size = doubled;
        self.clip_min *= 2;
        self.clip_max *= 2;
        Ok(())
    }

    /// Replace the displacement cell, clamping corners to the extent
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a corner is not finite
    pub fn set_displacement(&mut self, cell: SourceCell) -> Result<()> {
        if let Some(corner) = cell.corners().iter().find(|c| !c.is_finite()) {
            return Err(SchemeError::InvalidConfig(format!(
                "source corner must be finite (got {})",
                corner
            )));
        }
        let limit = DVec3::splat(self.max_extent);
        self.displacement = SourceCell::new((*cell.corners()).map(|c| c.clamp(-limit, limit)));
        Ok(())
    }

    /// Set the clip box
    ///
    /// # Errors
    ///
    /// Returns `InvalidBounds` unless `0 <= min <= max <= size`
    pub fn set_clip(&mut self, min: IVec3, max: IVec3) -> Result<()> {
        let size = IVec3::splat(self.size);
        if min.cmplt(IVec3::ZERO).any() || min.cmpgt(max).any() || max.cmpgt(size).any() {
            return Err(SchemeError::InvalidBounds { min, max });
        }
        self.clip_min = min;
        self.clip_max = max;
        Ok(())
    }

    /// Clip box covering the whole lattice
    pub fn reset_clip(&mut self) {
        self.clip_min = IVec3::ZERO;
        self.clip_max = IVec3::splat(self.size);
    }

    /// Slide the clip box one step along `axis`
    ///
    /// Returns whether the box moved; it stops at the lattice boundary.
    pub fn translate_clip(&mut self, axis: Axis, advance: bool) -> bool {
        let d = axis.index();
        if advance && self.clip_max[d] < self.size {
            self.clip_min[d] += 1;
            self.clip_max[d] += 1;
            true
        } else if !advance && self.clip_min[d] > 0 {
            self.clip_min[d] -= 1;
            self.clip_max[d] -= 1;
            true
        } else {
            false
        }
    }

    /// Grow (`advance`) or shrink the clip box one step along `axis`
    ///
    /// The box changes on the side with more room: when the gap below is
    /// larger than the gap above, growing lowers the min and shrinking
    /// lowers the max; otherwise growing raises the max and shrinking
    /// raises the min. Returns whether the box changed.
    pub fn scale_clip(&mut self, axis: Axis, advance: bool) -> bool {
        let d = axis.index();
        let (min, max) = (self.clip_min[d], self.clip_max[d]);
        let (new_min, new_max) = if min > self.size - max {
            if advance {
                ((min - 1).max(0), max)
            } else {
                (min, (max - 1).max(min))
            }
        } else if advance {
            (min, (max + 1).min(self.size))
        } else {
            ((min + 1).min(max), max)
        };
        self.clip_min[d] = new_min;
        self.clip_max[d] = new_max;
        (new_min, new_max) != (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(size: i32) -> SourceState {
        let config = SessionConfig {
            initial_size: size,
            ..SessionConfig::default()
        };
        SourceState::new(&config)
    }

    #[test]
    fn test_initial_state() {
        let source = state(3);
        assert_eq!(source.size(), 3);
        assert_eq!(source.clip_min(), IVec3::ZERO);
        assert_eq!(source.clip_max(), IVec3::splat(3));
        assert_eq!(source.displacement().corner(0), DVec3::splat(-5.0));
        assert_eq!(source.displacement().corner(7), DVec3::splat(5.0));
    }

    #[test]
    fn test_set_size_resets_clip() {
        let mut source = state(3);
        source.set_clip(IVec3::ONE, IVec3::splat(2)).unwrap();
        source.set_size(5).unwrap();
        assert_eq!(source.clip_min(), IVec3::ZERO);
        assert_eq!(source.clip_max(), IVec3::splat(5));
        assert!(matches!(
            source.set_size(0),
            Err(SchemeError::InvalidSize { size: 0, max: 10 })
        ));
        assert!(source.set_size(11).is_err());
        assert_eq!(source.size(), 5);
    }

    #[test]
    fn test_double_size() {
        let mut source = state(3);
        source.set_clip(IVec3::new(1, 0, 2), IVec3::new(2, 3, 3)).unwrap();
        source.double_size().unwrap();
        assert_eq!(source.size(), 6);
        assert_eq!(source.clip_min(), IVec3::new(2, 0, 4));
        assert_eq!(source.clip_max(), IVec3::new(4, 6, 6));
        assert!(source.double_size().is_err());
        assert_eq!(source.size(), 6);
    }

    #[test]
    fn test_displacement_clamped() {
        let mut source = state(3);
        let cell = SourceCell::from_box(DVec3::new(-9.0, 0.0, 0.0), DVec3::new(1.0, 7.5, 1.0));
        source.set_displacement(cell).unwrap();
        assert_eq!(source.displacement().corner(0), DVec3::new(-5.0, 0.0, 0.0));
        assert_eq!(source.displacement().corner(7), DVec3::new(1.0, 5.0, 1.0));

        let mut bad = SourceCell::unit_cube();
        bad.set_corner(3, DVec3::new(f64::NAN, 0.0, 0.0));
        assert!(source.set_displacement(bad).is_err());
    }

    #[test]
    fn test_set_clip_validation() {
        let mut source = state(3);
        assert!(source.set_clip(IVec3::new(-1, 0, 0), IVec3::ONE).is_err());
        assert!(source.set_clip(IVec3::splat(2), IVec3::ONE).is_err());
        assert!(source.set_clip(IVec3::ZERO, IVec3::splat(4)).is_err());
        assert!(source.set_clip(IVec3::ONE, IVec3::ONE).is_ok());
    }

    #[test]
    fn test_translate_clip() {
        let mut source = state(3);
        source.set_clip(IVec3::ZERO, IVec3::new(2, 3, 3)).unwrap();
        assert!(source.translate_clip(Axis::X, true));
        assert_eq!(source.clip_min().x, 1);
        assert_eq!(source.clip_max().x, 3);
        // at the far boundary
        assert!(!source.translate_clip(Axis::X, true));
        assert!(!source.translate_clip(Axis::Y, false));
        assert!(source.translate_clip(Axis::X, false));
        assert_eq!(source.clip_min().x, 0);
    }

    #[test]
    fn test_scale_clip() {
        let mut source = state(4);
        source.set_clip(IVec3::new(0, 3, 0), IVec3::new(1, 4, 4)).unwrap();

        // more room above on x: grow raises the max, shrink raises the min
        assert!(source.scale_clip(Axis::X, true));
        assert_eq!((source.clip_min().x, source.clip_max().x), (0, 2));
        assert!(source.scale_clip(Axis::X, false));
        assert_eq!((source.clip_min().x, source.clip_max().x), (1, 2));

        // more room below on y: grow lowers the min, shrink lowers the max
        assert!(source.scale_clip(Axis::Y, true));
        assert_eq!((source.clip_min().y, source.clip_max().y), (2, 4));
        assert!(source.scale_clip(Axis::Y, false));
        assert_eq!((source.clip_min().y, source.clip_max().y), (2, 3));

        // full extent cannot grow
        assert!(!source.scale_clip(Axis::Z, true));
    }
}
