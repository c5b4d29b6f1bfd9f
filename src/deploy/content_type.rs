//! Content-Type resolution.

use std::path::Path;

/// Resolve the `Content-Type` header value for a file.
///
/// Lookup goes by the override extension when one is configured, otherwise
/// by the file path. The first hyphen of the media type is dropped and
/// `text/*` types are tagged as UTF-8; objects deployed by earlier releases
/// carry exactly this header shape.
pub fn resolve_content_type(path: &Path, ext_override: Option<&str>) -> String {
    let guess = match ext_override {
        Some(ext) => mime_guess::from_ext(ext.trim_start_matches('.')),
        None => mime_guess::from_path(path),
    };
    let mime = guess.first_or_octet_stream();

    let mut content_type = mime.essence_str().replacen('-', "", 1);
    if content_type.starts_with("text/") {
        content_type.push_str("; charset=UTF-8");
    }
    content_type
}
