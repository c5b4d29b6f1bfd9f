//! Object key derivation.

use std::path::Path;

/// Derive the object key for a local file.
///
/// The base directory is stripped from the front of the path, then exactly
/// one leading separator is removed. An alias replaces the final path
/// component (used for directory-index uploads), and the prefix is prepended
/// last so it applies to aliases too.
pub fn build_key(path: &Path, base: &Path, prefix: Option<&str>, alias: Option<&str>) -> String {
    let path = path.to_string_lossy();
    let base = base.to_string_lossy();

    let stripped = path.strip_prefix(base.as_ref()).unwrap_or(&path);
    let mut key = stripped.strip_prefix('/').unwrap_or(stripped).to_string();

    if let Some(alias) = alias {
        key = match key.rfind('/') {
            Some(idx) => format!("{}/{}", &key[..idx], alias),
            None => alias.to_string(),
        };
    }

    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        key = format!("{prefix}/{key}");
    }

    key
}
