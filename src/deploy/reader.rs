//! Local file loading.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::fs;

use crate::config::GzipMode;

/// A local file loaded and ready for key derivation and upload.
///
/// `contents` holds the bytes that will go over the wire, so compression has
/// already happened when `gzipped` is set.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub path: PathBuf,
    pub base: PathBuf,
    pub contents: Bytes,
    pub modified: SystemTime,
    pub gzipped: bool,
}

/// Load a file from disk, compressing it when the gzip policy says so.
///
/// Directories and vanished paths yield `Ok(None)`; glob expansion matches
/// directories too and those are silently skipped rather than failed.
pub async fn read_local_file(
    path: &Path,
    base: &Path,
    gzip: &GzipMode,
) -> std::io::Result<Option<LocalFile>> {
    let metadata = match fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    if !metadata.is_file() {
        return Ok(None);
    }
    let modified = metadata.modified()?;

    let raw = fs::read(path).await?;
    let (contents, gzipped) = if gzip.applies_to(path) {
        (Bytes::from(gzip_bytes(&raw)?), true)
    } else {
        (Bytes::from(raw), false)
    };

    Ok(Some(LocalFile {
        path: path.to_path_buf(),
        base: base.to_path_buf(),
        contents,
        modified,
        gzipped,
    }))
}

fn gzip_bytes(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
