//! Source-table generation
//!
//! [`CodeExporter`] renders children as a constant-table declaration for an
//! external mesh-refinement library. The consumer enumerates hexahedron
//! corners differently from this crate, so every child's corners pass
//! through [`ExportConfig::poly_indices`] exactly once on the way out.

mod naming;

pub use naming::symbol_name_from_path;

use std::fmt::Write as _;

use tracing::debug;

use crate::config::ExportConfig;
use crate::error::{Result, SchemeError};
use crate::hex::{HexCoords, HexPoints};
use crate::lattice::check_size;
use crate::scheme::{CompiledScheme, HexIndices, SlotTable};
use crate::transform::index_verts;

/// Configuration-driven source text formatter
#[derive(Debug, Clone, Default)]
pub struct CodeExporter {
    config: ExportConfig,
}

impl CodeExporter {
    /// Exporter with the given configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` fails [`ExportConfig::validate`].
    pub fn new(config: ExportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    #[inline]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Declaration line: `[const ]type name <brace>`
    fn open(&self, brace: &str) -> String {
        let constant = if self.config.constant { "const " } else { "" };
        format!(
            "{}{} {} {}\n",
            constant, self.config.type_name, self.config.name, brace
        )
    }

    /// Render normalized per-child corner positions
    ///
    /// Each child becomes one `child_type{ real_vert_type{x, y, z}, ... }`
    /// row with its corners permuted by `poly_indices`.
    pub fn render_children(&self, children: &[HexPoints]) -> String {
        let mut out = self.open("{{");
        for child in children {
            let _ = write!(out, "\t{}{{ ", self.config.child_type);
            for vert in index_verts(child, &self.config.poly_indices) {
                let _ = write!(
                    out,
                    "{}{{{}, {}, {}}}, ",
                    self.config.real_vert_type, vert.x, vert.y, vert.z
                );
            }
            out.push_str(" },\n");
        }
        out.push_str("}};");
        debug!(children = children.len(), name = %self.config.name, "rendered flat export");
        out
    }

    /// Deduplicate integer children and render the vertex and index lists
    ///
    /// Coincident corners share one vertex entry, assigned in first-seen
    /// order; index tuples are permuted by `poly_indices`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSize` if `size` is outside `[1, MAX_LATTICE_SIZE]` or
    /// `OutOfRangeCoordinate` for the first corner outside `[0, size]^3`.
    /// Nothing is allocated before every corner has been checked.
    pub fn render_indexed(&self, size: i32, children: &[HexCoords]) -> Result<String> {
        check_size(size)?;
        if let Some(&coord) = children
            .iter()
            .flatten()
            .find(|c| c.min_element() < 0 || c.max_element() > size)
        {
            return Err(SchemeError::OutOfRangeCoordinate { coord, size });
        }

        let mut table = SlotTable::new(size)?;
        let mut verts = Vec::new();
        let mut inds: Vec<HexIndices> = Vec::with_capacity(children.len());
        for child in children {
            let child_inds: HexIndices = std::array::from_fn(|i| {
                let coord = child[i];
                table.get_or_insert_with(coord, || {
                    verts.push(coord);
                    verts.len() - 1
                })
            });
            inds.push(index_verts(&child_inds, &self.config.poly_indices));
        }

        let mut out = self.open("{");
        let _ = writeln!(out, "\t{},", size);
        let _ = writeln!(out, "\t{}{{", self.config.vert_list_type);
        for v in &verts {
            let _ = writeln!(out, "\t\t{}{{{}, {}, {}}},", self.config.vert_type, v.x, v.y, v.z);
        }
        out.push_str("\t},\n");
        let _ = writeln!(out, "\t{}{{", self.config.inds_list_type);
        for child in &inds {
            let list: Vec<String> = child.iter().map(usize::to_string).collect();
            let _ = writeln!(out, "\t\t{}{{{}}},", self.config.inds_type, list.join(", "));
        }
        out.push_str("\t}\n};");
        debug!(
            size,
            children = children.len(),
            vertices = verts.len(),
            name = %self.config.name,
            "rendered indexed export"
        );
        Ok(out)
    }

    /// Render a compiled scheme's influence lists with this exporter's
    /// naming and corner permutation
    pub fn render_influences(&self, scheme: &CompiledScheme) -> String {
        let mut out = self.open("{{");
        for child in scheme.indices() {
            out.push_str("\t{{\n");
            for vert in index_verts(child, &self.config.poly_indices) {
                out.push_str("\t\t{");
                for inf in scheme.vertices()[vert].influences() {
                    let _ = write!(out, "{{{}, {}}}, ", inf.corner(), inf.weight());
                }
                out.push_str("},\n");
            }
            out.push_str("\t}},\n");
        }
        out.push_str("}};");
        debug!(
            children = scheme.child_count(),
            name = %self.config.name,
            "rendered influence export"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfigBuilder;
    use crate::transform::{cube_verts, cube_verts_sized};
    use glam::{DVec3, IVec3};

    fn identity_exporter() -> CodeExporter {
        let config = ExportConfigBuilder::new()
            .name("test")
            .poly_indices([0, 1, 2, 3, 4, 5, 6, 7])
            .build()
            .unwrap();
        CodeExporter::new(config).unwrap()
    }

    #[test]
    fn test_render_children_empty() {
        let out = CodeExporter::default().render_children(&[]);
        assert_eq!(out, "const Scheme generatedRefinement {{\n}};");
    }

    #[test]
    fn test_render_children_permutes_once() {
        let child = cube_verts(DVec3::ZERO, DVec3::new(0.5, 1.0, 1.0));
        let original = child;
        let out = CodeExporter::default().render_children(&[child]);
        // default permutation [0, 2, 3, 1, 4, 6, 7, 5]
        let expected_order = [0, 2, 3, 1, 4, 6, 7, 5].map(|i| child[i]);
        let row: String = expected_order
            .iter()
            .map(|v| format!("RVec{{{}, {}, {}}}, ", v.x, v.y, v.z))
            .collect();
        assert!(out.contains(&format!("\tHexVerts{{ {} }},\n", row)));
        assert_eq!(child, original);
    }

    #[test]
    fn test_non_constant_header() {
        let config = ExportConfigBuilder::new()
            .constant(false)
            .type_name("Table")
            .name("t")
            .build()
            .unwrap();
        let exporter = CodeExporter::new(config).unwrap();
        assert!(exporter.render_children(&[]).starts_with("Table t {{\n"));
    }

    #[test]
    fn test_new_rejects_unchecked_config() {
        let config = ExportConfig {
            poly_indices: [0, 1, 2, 3, 4, 5, 6, 9],
            ..ExportConfig::default()
        };
        assert!(matches!(
            CodeExporter::new(config),
            Err(SchemeError::InvalidConfig(_))
        ));
        let config = ExportConfig {
            name: "two words".to_string(),
            ..ExportConfig::default()
        };
        assert!(CodeExporter::new(config).is_err());
        assert!(CodeExporter::new(ExportConfig::default()).is_ok());
    }

    #[test]
    fn test_headers_share_spacing() {
        let exporter = identity_exporter();
        let scheme = CompiledScheme::build(&[cube_verts_sized(1)], 1).unwrap();
        let outputs = [
            exporter.render_children(&[]),
            exporter.render_indexed(1, &[]).unwrap(),
            exporter.render_influences(&scheme),
        ];
        for out in &outputs {
            assert!(out.starts_with("const Scheme test {"), "{out}");
        }
    }

    #[test]
    fn test_render_indexed_dedups() {
        let left = cube_verts(IVec3::ZERO, IVec3::ONE);
        let right = cube_verts(IVec3::new(1, 0, 0), IVec3::new(2, 1, 1));
        let out = identity_exporter().render_indexed(2, &[left, right]).unwrap();
        assert_eq!(out.matches("IVec{").count(), 12);
        assert!(out.contains("HexVertIs{0, 1, 2, 3, 4, 5, 6, 7},"));
        assert!(out.contains("HexVertIs{1, 8, 3, 9, 5, 10, 7, 11},"));
        assert!(out.starts_with("const Scheme test {\n\t2,\n"));
    }

    #[test]
    fn test_render_indexed_permutation() {
        let out = CodeExporter::default()
            .render_indexed(1, &[cube_verts_sized(1)])
            .unwrap();
        assert!(out.contains("HexVertIs{0, 2, 3, 1, 4, 6, 7, 5},"));
    }

    #[test]
    fn test_render_indexed_errors() {
        let exporter = CodeExporter::default();
        assert!(exporter.render_indexed(0, &[]).is_err());
        assert!(matches!(
            exporter.render_indexed(1, &[cube_verts_sized(2)]),
            Err(SchemeError::OutOfRangeCoordinate { size: 1, .. })
        ));
        assert_eq!(
            exporter.render_indexed(i32::MAX, &[cube_verts_sized(1)]),
            Err(SchemeError::InvalidSize {
                size: i32::MAX,
                max: crate::lattice::MAX_LATTICE_SIZE
            })
        );
        // a bad corner in the last child is reported before any output
        let children = [cube_verts_sized(1), cube_verts(IVec3::ZERO, IVec3::new(1, 1, 4))];
        assert!(matches!(
            exporter.render_indexed(3, &children),
            Err(SchemeError::OutOfRangeCoordinate { size: 3, .. })
        ));
        let empty = exporter.render_indexed(3, &[]).unwrap();
        assert!(empty.contains("\t3,\n"));
    }

    #[test]
    fn test_render_influences() {
        let scheme = CompiledScheme::build(&[cube_verts_sized(1)], 1).unwrap();
        let out = CodeExporter::default().render_influences(&scheme);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "const Scheme generatedRefinement {{");
        assert_eq!(lines[2], "\t\t{{0, 1}, },");
        // second emitted corner is the child's corner 2
        assert_eq!(lines[3], "\t\t{{2, 1}, },");
        assert_eq!(*lines.last().unwrap(), "}};");
    }
}
