//! Directory-index alias expansion.

use std::path::Path;

/// Additional names a file should also be uploaded under.
///
/// When an index name is configured, every HTML file not already named like
/// the index gets one alias: the index name in the same directory. So with
/// `index.html` configured, `docs/page.html` is also served at
/// `docs/index.html`. Non-HTML files never qualify.
pub fn expand_aliases(path: &Path, index_name: Option<&str>) -> Vec<String> {
    let index = match index_name {
        Some(name) if !name.is_empty() => name,
        _ => return Vec::new(),
    };
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return Vec::new(),
    };
    if name == index || !is_indexable(name) {
        return Vec::new();
    }
    vec![index.to_string()]
}

fn is_indexable(name: &str) -> bool {
    matches!(
        Path::new(name).extension().and_then(|ext| ext.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm")
    )
}
