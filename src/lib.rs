//! Hexahedral refinement scheme compiler
//!
//! Authoring tool core for hex-mesh refinement schemes: a source hexahedron
//! is sampled on a regular lattice, children are drawn as integer corner
//! tuples on that lattice, and the result compiles into per-vertex corner
//! influences that any deformed hexahedron can be refined with.
//!
//! # Quick Start
//!
//! ```rust
//! use hex_refinement_schemes::*;
//!
//! // Split the unit cell in two along x
//! let left = cube_verts(IVec3::ZERO, IVec3::new(1, 2, 2));
//! let right = cube_verts(IVec3::new(1, 0, 0), IVec3::splat(2));
//! let scheme = CompiledScheme::build(&[left, right], 2).unwrap();
//! assert_eq!(scheme.child_count(), 2);
//!
//! // Refine an arbitrary source cell
//! let source = SourceCell::cube(1.0);
//! let children = scheme.apply(source.corners());
//! assert_eq!(children[1][7], DVec3::ONE);
//!
//! // Emit a source table
//! let code = CodeExporter::default().render_influences(&scheme);
//! assert!(code.starts_with("const Scheme generatedRefinement"));
//! ```
//!
//! # Features
//!
//! - `serde`: Enables serialization support for configuration, cells,
//!   compiled schemes and session state

// Modules
pub mod error;
pub mod config;
pub mod hex;
pub mod transform;
pub mod lattice;
pub mod scheme;
pub mod export;
pub mod session;

// Re-export core types for convenience
pub use error::{SchemeError, Result};
pub use config::{SessionConfig, SessionConfigBuilder, ExportConfig, ExportConfigBuilder};
pub use hex::{Axis, HexVerts, HexCoords, HexPoints, SourceCell, CORNER_COUNT};
pub use transform::{cube_verts, cube_verts_sized, sort_verts, index_verts, flip_verts, rotate_verts, scale_verts, inv_scale_verts, translate_verts, CINOLIB_HEX_INDICES};
pub use lattice::{Lattice, RayQuery, RayHit, MAX_LATTICE_SIZE};
pub use scheme::{CompiledScheme, CompiledVertex, Influence, CoordKey, HexIndices};
pub use export::{CodeExporter, symbol_name_from_path};
pub use session::{Session, SessionDiff, ChildHandle, Child, SourceState};

// Re-export glam vectors for convenience
pub use glam::{DVec3, IVec3};
