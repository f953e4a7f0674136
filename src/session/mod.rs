//! Editing session
//!
//! [`Session`] is the non-graphical core of a refinement-scheme editor. It
//! owns the source state, the lattice sampled from it, the children and the
//! active child. Every mutating operation returns a [`SessionDiff`] listing
//! what changed, so a front end can refresh exactly the affected items.
//!
//! Bulk edits act on the *shown* children: the selected ones, or every
//! visible child while nothing is selected.

mod arena;
mod child;
mod source;

pub use arena::{ChildArena, ChildHandle};
pub use child::Child;
pub use source::SourceState;

use glam::IVec3;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SchemeError};
use crate::export::CodeExporter;
use crate::hex::{hex_max_component, Axis, HexCoords, HexPoints, SourceCell};
use crate::lattice::{Lattice, RayHit, RayQuery};
use crate::scheme::CompiledScheme;
use crate::transform::{cube_verts, flip_verts, rotate_verts, scale_verts, translate_verts};

/// What an operation changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDiff {
    /// Children created, in creation order
    pub added: Vec<ChildHandle>,
    /// Children destroyed; their handles are now stale
    pub removed: Vec<ChildHandle>,
    /// Children whose corners, flags or shown state changed
    pub updated: Vec<ChildHandle>,
    /// Size or displacement changed and the lattice was rebuilt
    pub lattice_rebuilt: bool,
    /// Clip box changed
    pub clip_changed: bool,
    /// Active child changed
    pub active_changed: bool,
}

impl SessionDiff {
    /// Nothing changed
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.updated.is_empty()
            && !self.lattice_rebuilt
            && !self.clip_changed
            && !self.active_changed
    }

    fn touch(&mut self, handle: ChildHandle) {
        if !self.updated.contains(&handle) {
            self.updated.push(handle);
        }
    }
}

/// Refinement-scheme editing session
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    source: SourceState,
    lattice: Lattice,
    children: ChildArena<Child>,
    active: Option<ChildHandle>,
}

impl Session {
    /// Fresh session with no children
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if [`SessionConfig::validate`] rejects `config`
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let source = SourceState::new(&config);
        let lattice = Lattice::build(source.size(), source.displacement())?;
        debug!(size = source.size(), max_size = config.max_size, "created session");
        Ok(Self {
            config,
            source,
            lattice,
            children: ChildArena::new(),
            active: None,
        })
    }

    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    pub fn source(&self) -> &SourceState {
        &self.source
    }

    #[inline]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Current lattice size
    #[inline]
    pub fn size(&self) -> i32 {
        self.source.size()
    }

    /// Number of live children
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Live children in insertion order
    pub fn children(&self) -> impl Iterator<Item = (ChildHandle, &Child)> + '_ {
        self.children.iter()
    }

    /// Look up a child
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the child was removed
    pub fn child(&self, handle: ChildHandle) -> Result<&Child> {
        self.children
            .get(handle)
            .ok_or(SchemeError::StaleHandle(handle))
    }

    fn child_mut(&mut self, handle: ChildHandle) -> Result<&mut Child> {
        self.children
            .get_mut(handle)
            .ok_or(SchemeError::StaleHandle(handle))
    }

    #[inline]
    pub fn active(&self) -> Option<ChildHandle> {
        self.active
    }

    /// Smallest size every child fits in (at least 1)
    pub fn min_required_size(&self) -> i32 {
        self.children
            .iter()
            .map(|(_, c)| c.max_size())
            .fold(1, i32::max)
    }

    /// Whether any child is selected
    pub fn any_selected(&self) -> bool {
        self.children.iter().any(|(_, c)| c.selected)
    }

    /// Whether bulk edits currently act on this child
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the child was removed
    pub fn is_shown(&self, handle: ChildHandle) -> Result<bool> {
        let child = self.child(handle)?;
        Ok(shown(child, self.any_selected()))
    }

    /// Handles of the shown children in insertion order
    pub fn shown_handles(&self) -> Vec<ChildHandle> {
        let any_selected = self.any_selected();
        self.children
            .iter()
            .filter(|(_, c)| shown(c, any_selected))
            .map(|(h, _)| h)
            .collect()
    }

    fn rebuild_lattice(&mut self) -> Result<()> {
        self.lattice.make(self.source.size(), self.source.displacement())
    }

    /// Change the lattice size and reset the clip box
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if `size` is outside `[1, max_size]` or
    /// `SizeBelowChildren` if an existing child would not fit
    pub fn set_size(&mut self, size: i32) -> Result<SessionDiff> {
        let required = self.min_required_size();
        if size < required {
            return Err(SchemeError::SizeBelowChildren { size, required });
        }
        if size == self.size() {
            return Ok(SessionDiff::default());
        }
        self.source.set_size(size)?;
        self.rebuild_lattice()?;
        debug!(size, "resized lattice");
        Ok(SessionDiff {
            lattice_rebuilt: true,
            clip_changed: true,
            ..SessionDiff::default()
        })
    }

    /// Double the lattice size, scaling every child and the clip box by 2
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if twice the size exceeds `max_size`
    pub fn double_size(&mut self) -> Result<SessionDiff> {
        self.source.double_size()?;
        self.rebuild_lattice()?;
        let mut diff = SessionDiff {
            lattice_rebuilt: true,
            clip_changed: true,
            ..SessionDiff::default()
        };
        let handles = self.children.handles().to_vec();
        for handle in handles {
            let child = self.child_mut(handle)?;
            let mut verts = *child.verts();
            scale_verts(&mut verts, IVec3::splat(2));
            child.set_verts(verts);
            diff.updated.push(handle);
        }
        debug!(size = self.size(), children = diff.updated.len(), "doubled lattice");
        Ok(diff)
    }

    /// Replace the displacement cell and rebuild the lattice
    ///
    /// Corners are clamped to `[-max_extent, max_extent]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a corner is not finite
    pub fn set_source(&mut self, cell: SourceCell) -> Result<SessionDiff> {
        self.source.set_displacement(cell)?;
        self.rebuild_lattice()?;
        Ok(SessionDiff {
            lattice_rebuilt: true,
            ..SessionDiff::default()
        })
    }

    /// Set the clip box
    ///
    /// # Errors
    ///
    /// Returns `InvalidBounds` unless `0 <= min <= max <= size`
    pub fn set_clip(&mut self, min: IVec3, max: IVec3) -> Result<SessionDiff> {
        let changed = (min, max) != (self.source.clip_min(), self.source.clip_max());
        self.source.set_clip(min, max)?;
        Ok(SessionDiff {
            clip_changed: changed,
            ..SessionDiff::default()
        })
    }

    /// Slide the clip box one step along `axis`
    pub fn translate_clip(&mut self, axis: Axis, advance: bool) -> SessionDiff {
        SessionDiff {
            clip_changed: self.source.translate_clip(axis, advance),
            ..SessionDiff::default()
        }
    }

    /// Grow or shrink the clip box one step along `axis`
    pub fn scale_clip(&mut self, axis: Axis, advance: bool) -> SessionDiff {
        SessionDiff {
            clip_changed: self.source.scale_clip(axis, advance),
            ..SessionDiff::default()
        }
    }

    /// Grow the lattice so `verts` fits in it
    fn fit(&mut self, verts: &HexCoords, diff: &mut SessionDiff) -> Result<()> {
        let max_size = self.source.max_size();
        if let Some(&coord) = verts
            .iter()
            .find(|v| v.min_element() < 0 || v.max_element() > max_size)
        {
            return Err(SchemeError::OutOfRangeCoordinate {
                coord,
                size: max_size,
            });
        }
        let required = hex_max_component(verts);
        if required > self.size() {
            self.source.grow_to(required)?;
            self.rebuild_lattice()?;
            debug!(size = required, "grew lattice to fit child");
            diff.lattice_rebuilt = true;
        }
        Ok(())
    }

    /// Add a visible, unselected child
    ///
    /// The lattice grows when the child reaches past its current size.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRangeCoordinate` if a corner is negative or beyond
    /// `max_size`
    pub fn add_child(&mut self, verts: HexCoords) -> Result<SessionDiff> {
        let mut diff = SessionDiff::default();
        self.fit(&verts, &mut diff)?;
        let handle = self.children.insert(Child::new(verts));
        diff.added.push(handle);
        Ok(diff)
    }

    /// Add the axis-aligned box `[min, max]` as a child
    ///
    /// # Errors
    ///
    /// Returns `InvalidBounds` if the box is inverted, otherwise as
    /// [`Session::add_child`]
    pub fn add_child_box(&mut self, min: IVec3, max: IVec3) -> Result<SessionDiff> {
        if min.cmpgt(max).any() {
            return Err(SchemeError::InvalidBounds { min, max });
        }
        self.add_child(cube_verts(min, max))
    }

    /// Fill the clip box with unit cubes, x outermost and z innermost
    pub fn add_children_clip_grid(&mut self) -> SessionDiff {
        let (min, max) = (self.source.clip_min(), self.source.clip_max());
        let mut diff = SessionDiff::default();
        for x in min.x..max.x {
            for y in min.y..max.y {
                for z in min.z..max.z {
                    let a = IVec3::new(x, y, z);
                    diff.added
                        .push(self.children.insert(Child::new(cube_verts(a, a + IVec3::ONE))));
                }
            }
        }
        debug!(added = diff.added.len(), "filled clip box");
        diff
    }

    /// Remove one child
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the child was already removed
    pub fn remove_child(&mut self, handle: ChildHandle) -> Result<SessionDiff> {
        let before = self.shown_handles();
        self.children
            .remove(handle)
            .ok_or(SchemeError::StaleHandle(handle))?;
        let mut diff = SessionDiff {
            removed: vec![handle],
            ..SessionDiff::default()
        };
        if self.active == Some(handle) {
            self.active = None;
            diff.active_changed = true;
        }
        self.collect_shown_changes(&before, &mut diff);
        Ok(diff)
    }

    /// Remove every child
    pub fn clear_children(&mut self) -> SessionDiff {
        let removed = self.children.clear();
        let active_changed = self.active.take().is_some();
        debug!(removed = removed.len(), "cleared children");
        SessionDiff {
            removed,
            active_changed,
            ..SessionDiff::default()
        }
    }

    /// Replace a child's corners, growing the lattice if needed
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` for a removed child, otherwise as
    /// [`Session::add_child`]
    pub fn set_child_verts(&mut self, handle: ChildHandle, verts: HexCoords) -> Result<SessionDiff> {
        self.child(handle)?;
        let mut diff = SessionDiff::default();
        self.fit(&verts, &mut diff)?;
        let child = self.child_mut(handle)?;
        if *child.verts() != verts {
            child.set_verts(verts);
            diff.updated.push(handle);
        }
        Ok(diff)
    }

    /// Records children whose shown state differs from `before`
    fn collect_shown_changes(&self, before: &[ChildHandle], diff: &mut SessionDiff) {
        let after = self.shown_handles();
        for &handle in self.children.handles() {
            if before.contains(&handle) != after.contains(&handle) {
                diff.touch(handle);
            }
        }
    }

    fn update_flags(
        &mut self,
        handles: &[ChildHandle],
        mut edit: impl FnMut(&mut Child),
    ) -> Result<SessionDiff> {
        for &handle in handles {
            self.child(handle)?;
        }
        let before = self.shown_handles();
        let mut diff = SessionDiff::default();
        for &handle in handles {
            let child = self.child_mut(handle)?;
            let old = (child.visible, child.selected);
            edit(child);
            if old != (child.visible, child.selected) {
                diff.touch(handle);
            }
        }
        self.collect_shown_changes(&before, &mut diff);
        Ok(diff)
    }

    /// Show or hide a child
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the child was removed
    pub fn set_visible(&mut self, handle: ChildHandle, visible: bool) -> Result<SessionDiff> {
        self.update_flags(&[handle], |c| c.visible = visible)
    }

    /// Select or deselect a child
    ///
    /// The first selection hides every unselected child from bulk edits,
    /// so the diff may list children other than `handle`.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the child was removed
    pub fn set_selected(&mut self, handle: ChildHandle, selected: bool) -> Result<SessionDiff> {
        self.update_flags(&[handle], |c| c.selected = selected)
    }

    /// Select or deselect every child
    pub fn set_all_selected(&mut self, selected: bool) -> SessionDiff {
        let handles = self.children.handles().to_vec();
        // every handle was just read from the arena
        self.update_flags(&handles, |c| c.selected = selected)
            .unwrap_or_default()
    }

    /// Make a child active, or clear the active child with `None`
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the child was removed
    pub fn set_active(&mut self, handle: Option<ChildHandle>) -> Result<SessionDiff> {
        if let Some(handle) = handle {
            self.child(handle)?;
        }
        if self.active == handle {
            return Ok(SessionDiff::default());
        }
        let mut diff = SessionDiff {
            active_changed: true,
            ..SessionDiff::default()
        };
        diff.updated.extend(self.active);
        diff.updated.extend(handle);
        self.active = handle;
        Ok(diff)
    }

    /// Reshape the active child into the clip box
    pub fn cube_active(&mut self) -> SessionDiff {
        let mut diff = SessionDiff::default();
        let verts = cube_verts(self.source.clip_min(), self.source.clip_max());
        if let Some(child) = self.active.and_then(|h| self.children.get_mut(h)) {
            if *child.verts() != verts {
                child.set_verts(verts);
                diff.updated.extend(self.active);
            }
        }
        diff
    }

    fn edit_shown(&mut self, mut edit: impl FnMut(&mut HexCoords)) -> SessionDiff {
        let mut diff = SessionDiff::default();
        for handle in self.shown_handles() {
            if let Some(child) = self.children.get_mut(handle) {
                let mut verts = *child.verts();
                edit(&mut verts);
                child.set_verts(verts);
                diff.updated.push(handle);
            }
        }
        diff
    }

    /// Mirror the shown children along `axis` about the lattice center
    pub fn flip_shown(&mut self, axis: Axis) -> SessionDiff {
        let size = self.size();
        self.edit_shown(|verts| flip_verts(verts, axis, size))
    }

    /// Rotate the shown children a quarter turn about the lattice center
    pub fn rotate_shown(&mut self, axis: Axis) -> SessionDiff {
        let size = self.size();
        self.edit_shown(|verts| rotate_verts(verts, axis, size))
    }

    /// Move the shown children one step along `axis`
    ///
    /// Nothing moves if any shown child would leave the lattice.
    pub fn translate_shown(&mut self, axis: Axis, advance: bool) -> SessionDiff {
        let mut offset = IVec3::ZERO;
        offset[axis.index()] = if advance { 1 } else { -1 };
        // one step of room towards the moving side
        let min = IVec3::ZERO.max(-offset);
        let max = IVec3::splat(self.size()).min(IVec3::splat(self.size()) - offset);
        let blocked = self.shown_handles().into_iter().any(|handle| {
            self.children
                .get(handle)
                .is_some_and(|child| !child.within(min, max))
        });
        if blocked {
            debug!(?axis, advance, "translation blocked by lattice boundary");
            return SessionDiff::default();
        }
        self.edit_shown(|verts| translate_verts(verts, offset))
    }

    /// Append a copy of every shown child
    pub fn clone_shown(&mut self) -> SessionDiff {
        let mut diff = SessionDiff::default();
        for handle in self.shown_handles() {
            if let Some(child) = self.children.get(handle) {
                let copy = Child::new(*child.verts());
                diff.added.push(self.children.insert(copy));
            }
        }
        diff
    }

    /// Remove every shown child
    pub fn remove_shown(&mut self) -> SessionDiff {
        let before = self.shown_handles();
        let mut diff = SessionDiff::default();
        for handle in before.iter().copied() {
            if self.children.remove(handle).is_some() {
                diff.removed.push(handle);
            }
        }
        if self.active.is_some_and(|h| !self.children.contains(h)) {
            self.active = None;
            diff.active_changed = true;
        }
        // removing the last selected child reveals the rest
        self.collect_shown_changes(&before, &mut diff);
        diff
    }

    /// Lattice coordinate inside the clip box closest to a ray
    ///
    /// # Errors
    ///
    /// Returns `InvalidBounds` if the clip box leaves the lattice
    pub fn pick(&self, ray: &RayQuery) -> Result<Option<RayHit>> {
        self.lattice
            .closest_to_ray_within(ray, self.source.clip_min(), self.source.clip_max())
    }

    /// Children with two or more coincident corners, in insertion order
    pub fn invalid_children(&self) -> Vec<ChildHandle> {
        self.children
            .iter()
            .filter(|(_, child)| !child.is_valid())
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Compile every child in insertion order
    ///
    /// # Errors
    ///
    /// Returns `OutOfRangeCoordinate` if a child does not fit the lattice
    pub fn compile(&self) -> Result<CompiledScheme> {
        for handle in self.invalid_children() {
            warn!(?handle, "compiling child with coincident corners");
        }
        let children: Vec<HexCoords> = self.children.iter().map(|(_, c)| *c.verts()).collect();
        CompiledScheme::build(&children, self.size())
    }

    /// Children with coordinates divided by the lattice size
    pub fn normalized_children(&self) -> Vec<HexPoints> {
        let size = f64::from(self.size());
        self.children
            .iter()
            .map(|(_, c)| (*c.verts()).map(|v| v.as_dvec3() / size))
            .collect()
    }

    /// Render the normalized children with `exporter`
    pub fn export_code(&self, exporter: &CodeExporter) -> String {
        exporter.render_children(&self.normalized_children())
    }
}

fn shown(child: &Child, any_selected: bool) -> bool {
    if any_selected {
        child.selected
    } else {
        child.visible
    }
}
