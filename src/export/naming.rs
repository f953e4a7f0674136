//! Symbol names derived from project files

use std::path::Path;

/// Identifier for a generated table, derived from a project file path
///
/// Strips the directory and extension, maps every character outside
/// `[A-Za-z0-9_]` to `_` and replaces a leading digit with `_`. Falls back
/// to `"unnamed"` when nothing is left.
pub fn symbol_name_from_path(path: impl AsRef<Path>) -> String {
    let stem = path
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.replace_range(..1, "_");
    }
    if name.is_empty() {
        name.push_str("unnamed");
    }
    name
}
