//! Session and exporter configuration
//!
//! Both configurations are produced by builders that validate their input.
//! Since the fields are public, consumers ([`crate::Session::new`] and
//! [`crate::CodeExporter::new`]) run the same `validate` on whatever they are
//! handed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemeError};
use crate::hex::HexVerts;
use crate::lattice::MAX_LATTICE_SIZE;

/// Largest lattice size the editor allows by default
pub const DEFAULT_MAX_SIZE: i32 = 10;

/// Default half extent of the source cube
pub const DEFAULT_MAX_EXTENT: f64 = 5.0;

/// Corner permutation expected by the default export consumer
pub const DEFAULT_POLY_INDICES: HexVerts<usize> = [0, 2, 3, 1, 4, 6, 7, 5];

/// Limits and defaults for an editing session
///
/// # Example
///
/// ```rust
/// use hex_refinement_schemes::*;
///
/// let config = SessionConfigBuilder::new()
///     .max_size(16)
///     .unwrap()
///     .initial_size(4)
///     .unwrap()
///     .build()
///     .unwrap();
/// assert_eq!(config.initial_size, 4);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Lattice size when the session starts
    pub initial_size: i32,

    /// Largest lattice size the session accepts
    pub max_size: i32,

    /// Half extent of the initial source cube; source corners are clamped
    /// to `[-max_extent, max_extent]`
    pub max_extent: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_size: 3,
            max_size: DEFAULT_MAX_SIZE,
            max_extent: DEFAULT_MAX_EXTENT,
        }
    }
}

impl SessionConfig {
    /// Check every field and the relation between the two sizes
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if a size is outside `[1, MAX_LATTICE_SIZE]`,
    /// the initial size exceeds the max size, or the extent is not finite
    /// and positive.
    pub fn validate(&self) -> Result<()> {
        check_size("initial size", self.initial_size)?;
        check_size("max size", self.max_size)?;
        check_extent(self.max_extent)?;
        if self.initial_size > self.max_size {
            return Err(SchemeError::InvalidConfig(format!(
                "initial size {} exceeds max size {}",
                self.initial_size, self.max_size
            )));
        }
        Ok(())
    }
}

fn check_size(what: &str, size: i32) -> Result<()> {
    if !(1..=MAX_LATTICE_SIZE).contains(&size) {
        return Err(SchemeError::InvalidConfig(format!(
            "{} must be in [1, {}] (got {})",
            what, MAX_LATTICE_SIZE, size
        )));
    }
    Ok(())
}

fn check_extent(extent: f64) -> Result<()> {
    if !extent.is_finite() || extent <= 0.0 {
        return Err(SchemeError::InvalidConfig(format!(
            "max extent must be positive (got {})",
            extent
        )));
    }
    Ok(())
}

/// Builder for [`SessionConfig`]
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Start from the defaults (size 3, max size 10, extent 5)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the starting lattice size
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `size` is outside `[1, MAX_LATTICE_SIZE]`
    pub fn initial_size(mut self, size: i32) -> Result<Self> {
        check_size("initial size", size)?;
        self.config.initial_size = size;
        Ok(self)
    }

    /// Set the largest accepted lattice size
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `size` is outside `[1, MAX_LATTICE_SIZE]`
    pub fn max_size(mut self, size: i32) -> Result<Self> {
        check_size("max size", size)?;
        self.config.max_size = size;
        Ok(self)
    }

    /// Set the source half extent
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `extent` is not finite and positive
    pub fn max_extent(mut self, extent: f64) -> Result<Self> {
        check_extent(extent)?;
        self.config.max_extent = extent;
        Ok(self)
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if [`SessionConfig::validate`] fails
    pub fn build(self) -> Result<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Naming and layout of generated source tables
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Emit the declaration as `const`
    pub constant: bool,
    /// Declared symbol name
    pub name: String,
    /// Type of the whole table
    pub type_name: String,
    /// Type of one child's corner list (flat export)
    pub child_type: String,
    /// Type of one integer corner
    pub vert_type: String,
    /// Type of one real corner (flat export)
    pub real_vert_type: String,
    /// Type of the vertex list (deduplicated export)
    pub vert_list_type: String,
    /// Type of one child's index tuple
    pub inds_type: String,
    /// Type of the index tuple list
    pub inds_list_type: String,
    /// Output corner `i` is the child's corner `poly_indices[i]`
    pub poly_indices: HexVerts<usize>,
}

impl ExportConfig {
    /// Check the symbol name and the corner permutation
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the name is not an identifier or
    /// `poly_indices` is not a permutation of `0..8`
    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.name) {
            return Err(SchemeError::InvalidConfig(format!(
                "export name must be an identifier (got {:?})",
                self.name
            )));
        }
        let mut seen = [false; 8];
        for &i in &self.poly_indices {
            if i >= 8 || std::mem::replace(&mut seen[i], true) {
                return Err(SchemeError::InvalidConfig(format!(
                    "poly indices must be a permutation of 0..8 (got {:?})",
                    self.poly_indices
                )));
            }
        }
        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            constant: true,
            name: "generatedRefinement".to_string(),
            type_name: "Scheme".to_string(),
            child_type: "HexVerts".to_string(),
            vert_type: "IVec".to_string(),
            real_vert_type: "RVec".to_string(),
            vert_list_type: "std::vector<IVec>".to_string(),
            inds_type: "HexVertIs".to_string(),
            inds_list_type: "std::vector<HexVertIs>".to_string(),
            poly_indices: DEFAULT_POLY_INDICES,
        }
    }
}

/// Builder for [`ExportConfig`]
///
/// # Example
///
/// ```rust
/// use hex_refinement_schemes::*;
///
/// let config = ExportConfigBuilder::new()
///     .name("edgeAdapter")
///     .constant(false)
///     .poly_indices([0, 1, 3, 2, 4, 5, 7, 6])
///     .build()
///     .unwrap();
/// assert_eq!(config.name, "edgeAdapter");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    /// Start from the defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `const` or not
    pub fn constant(mut self, constant: bool) -> Self {
        self.config.constant = constant;
        self
    }

    /// Set the declared symbol name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the table type
    pub fn type_name(mut self, name: impl Into<String>) -> Self {
        self.config.type_name = name.into();
        self
    }

    /// Set the per-child corner list type
    pub fn child_type(mut self, name: impl Into<String>) -> Self {
        self.config.child_type = name.into();
        self
    }

    /// Set the real corner type used by the flat export
    pub fn real_vert_type(mut self, name: impl Into<String>) -> Self {
        self.config.real_vert_type = name.into();
        self
    }

    /// Set the integer corner and corner-list types
    pub fn vert_types(mut self, vert: impl Into<String>, list: impl Into<String>) -> Self {
        self.config.vert_type = vert.into();
        self.config.vert_list_type = list.into();
        self
    }

    /// Set the index tuple and index list types
    pub fn inds_types(mut self, inds: impl Into<String>, list: impl Into<String>) -> Self {
        self.config.inds_type = inds.into();
        self.config.inds_list_type = list.into();
        self
    }

    /// Set the corner permutation
    pub fn poly_indices(mut self, indices: HexVerts<usize>) -> Self {
        self.config.poly_indices = indices;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if [`ExportConfig::validate`] fails
    pub fn build(self) -> Result<ExportConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
