//! Deploy configuration.
//!
//! A [`DeployConfig`] is assembled once from the command line and passed
//! immutably through the pipeline; per-file state never leaks into it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::store::ObjectAcl;

/// Metadata key that carries a caller-supplied ETag value.
pub const ETAG_METADATA_KEY: &str = "ETag";

/// Sentinel metadata value replaced at upload time with the base64 MD5 of
/// the object body.
pub const ETAG_FROM_CONTENT: &str = "<content-md5>";

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported signature version '{0}': only v4 is supported")]
    UnsupportedSignatureVersion(String),
}

// =============================================================================
// Gzip Policy
// =============================================================================

/// Which files get gzip-compressed before upload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GzipMode {
    #[default]
    Off,
    All,
    /// Compress only files whose final extension is in the list.
    Extensions(Vec<String>),
}

impl GzipMode {
    /// Parse the `--gzip` flag value. `None` means the flag was absent,
    /// a bare flag arrives as `"true"`, and `"false"` explicitly disables.
    pub fn parse(value: Option<&str>) -> GzipMode {
        match value {
            None | Some("false") => GzipMode::Off,
            Some("" | "true") => GzipMode::All,
            Some(list) => GzipMode::Extensions(
                list.split(',')
                    .map(|ext| ext.trim().trim_start_matches('.').to_string())
                    .filter(|ext| !ext.is_empty())
                    .collect(),
            ),
        }
    }

    /// Whether `path` should be compressed under this policy.
    ///
    /// Only the final extension counts: `app.js.map` is a map file, not a
    /// js file.
    pub fn applies_to(&self, path: &Path) -> bool {
        match self {
            GzipMode::Off => false,
            GzipMode::All => true,
            GzipMode::Extensions(extensions) => {
                match path.extension().and_then(|ext| ext.to_str()) {
                    Some(ext) if !ext.is_empty() => extensions.iter().any(|e| e == ext),
                    _ => false,
                }
            }
        }
    }
}

// =============================================================================
// Cache-Control
// =============================================================================

/// Assemble a `Cache-Control` header from the max-age and immutable flags.
pub fn cache_control_header(max_age: Option<u64>, immutable: bool) -> Option<String> {
    match (max_age, immutable) {
        (None, false) => None,
        (Some(age), false) => Some(format!("max-age={age}")),
        (None, true) => Some("immutable".to_string()),
        (Some(age), true) => Some(format!("max-age={age}, immutable")),
    }
}

// =============================================================================
// CDN Configuration
// =============================================================================

/// CloudFront invalidation settings.
#[derive(Debug, Clone)]
pub struct CdnConfig {
    pub distribution_id: String,
    pub paths: Vec<String>,
}

impl CdnConfig {
    /// Normalizes the invalidation paths: values may hold several
    /// whitespace-separated paths, every path gets a leading `/`, and an
    /// empty list falls back to invalidating everything.
    pub fn new(distribution_id: impl Into<String>, paths: &[String]) -> Self {
        let mut normalized: Vec<String> = paths
            .iter()
            .flat_map(|value| value.split_whitespace())
            .map(|path| {
                if path.starts_with('/') {
                    path.to_string()
                } else {
                    format!("/{path}")
                }
            })
            .collect();
        if normalized.is_empty() {
            normalized.push("/*".to_string());
        }
        Self {
            distribution_id: distribution_id.into(),
            paths: normalized,
        }
    }
}

// =============================================================================
// Deploy Configuration
// =============================================================================

/// Everything one deploy run needs to know.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub bucket: String,
    pub region: String,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
    /// Absolute directory stripped from file paths to form object keys.
    pub base_dir: PathBuf,
    /// Prefix prepended to every object key.
    pub key_prefix: Option<String>,
    pub gzip: GzipMode,
    pub cache_control: Option<String>,
    pub acl: ObjectAcl,
    /// Extension overriding content-type lookup for every file.
    pub ext_override: Option<String>,
    /// Refuse to overwrite remote objects that differ from the local file.
    pub prevent_updates: bool,
    /// Delete remote objects with no local counterpart after uploading.
    pub delete_removed: bool,
    /// Directory-index name used for alias uploads, e.g. `index.html`.
    pub index_name: Option<String>,
    /// Metadata attached to every upload.
    pub metadata: HashMap<String, String>,
    pub cdn: Option<CdnConfig>,
}

impl DeployConfig {
    pub fn new(bucket: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            bucket: bucket.into(),
            region: "us-east-1".to_string(),
            profile: None,
            endpoint_url: None,
            base_dir: base_dir.into(),
            key_prefix: None,
            gzip: GzipMode::Off,
            cache_control: None,
            acl: ObjectAcl::PublicRead,
            ext_override: None,
            prevent_updates: false,
            delete_removed: false,
            index_name: None,
            metadata: HashMap::new(),
            cdn: None,
        }
    }
}
